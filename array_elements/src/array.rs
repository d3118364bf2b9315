// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{collections::BTreeMap, rc::Rc};

use crate::{
    buffer::ElementBuffer,
    context::ArrayContext,
    error::ElementsResult,
    invariants::check_invariants,
    state::{ArrayState, IntegrityLevel},
    strategy::{ArrayStrategy, LazyArraySource},
    value::{ElementKind, Value},
};

/// Runs a mutating strategy operation against a record, storing the
/// strategy it returns.
fn update<R: HostArrayRecord + ?Sized>(
    record: &mut R,
    cx: &ArrayContext,
    operation: impl FnOnce(ArrayStrategy, &mut ArrayState) -> ElementsResult<ArrayStrategy>,
) -> ElementsResult<()> {
    let strategy = record.array_strategy();
    let next = operation(strategy, record.array_state_mut())?;
    record.set_array_strategy(next);
    if cx.options.check_invariants {
        check_invariants(next, record.array_state())?;
    }
    Ok(())
}

/// An object record holding array elements.
///
/// Implementors provide access to their [`ArrayState`] and current
/// [`ArrayStrategy`]; the provided methods implement the element operations
/// on top of them.
pub trait HostArrayRecord {
    fn array_state(&self) -> &ArrayState;
    fn array_state_mut(&mut self) -> &mut ArrayState;
    fn array_strategy(&self) -> ArrayStrategy;
    fn set_array_strategy(&mut self, strategy: ArrayStrategy);

    fn length(&self) -> u64 {
        self.array_state().length()
    }

    fn has_element(&self, index: u64) -> bool {
        self.array_strategy().has_element(self.array_state(), index)
    }

    fn get_element(&self, index: u64) -> Option<Value> {
        self.array_strategy().get_element(self.array_state(), index)
    }

    fn get_element_in_bounds(&self, index: u64) -> ElementsResult<Value> {
        self.array_strategy()
            .get_element_in_bounds(self.array_state(), index)
    }

    fn set_element(
        &mut self,
        cx: &ArrayContext,
        index: u64,
        value: Value,
        strict: bool,
    ) -> ElementsResult<()> {
        update(self, cx, |strategy, state| {
            strategy.set_element(cx, state, index, value, strict)
        })
    }

    fn set_element_in_bounds_fast(
        &mut self,
        cx: &ArrayContext,
        index: u64,
        value: Value,
    ) -> ElementsResult<()> {
        let strategy = self.array_strategy();
        strategy.set_element_in_bounds_fast(cx, self.array_state_mut(), index, value)
    }

    /// Deletes an element, returning `false` if the integrity level forbids
    /// it.
    fn delete_element(
        &mut self,
        cx: &ArrayContext,
        index: u64,
        strict: bool,
    ) -> ElementsResult<bool> {
        let deletable = self
            .array_strategy()
            .can_delete_element(self.array_state(), index, strict)?;
        if deletable {
            update(self, cx, |strategy, state| {
                strategy.delete_element(cx, state, index, strict)
            })?;
        }
        Ok(deletable)
    }

    fn set_length(&mut self, cx: &ArrayContext, length: u64, strict: bool) -> ElementsResult<()> {
        update(self, cx, |strategy, state| {
            strategy.set_length(cx, state, length, strict)
        })
    }

    fn insert_range(&mut self, cx: &ArrayContext, offset: u64, size: u64) -> ElementsResult<()> {
        update(self, cx, |strategy, state| {
            strategy.insert_range(cx, state, offset, size)
        })
    }

    fn remove_range(&mut self, cx: &ArrayContext, start: u64, end: u64) -> ElementsResult<()> {
        update(self, cx, |strategy, state| {
            strategy.remove_range(cx, state, start, end)
        })
    }

    fn shift_range(&mut self, cx: &ArrayContext, from: u64) -> ElementsResult<()> {
        update(self, cx, |strategy, state| strategy.shift_range(cx, state, from))
    }

    fn first_element_index(&self) -> Option<u64> {
        self.array_strategy().first_element_index(self.array_state())
    }

    fn last_element_index(&self) -> Option<u64> {
        self.array_strategy().last_element_index(self.array_state())
    }

    fn next_element_index(&self, index: u64) -> Option<u64> {
        self.array_strategy()
            .next_element_index(self.array_state(), index)
    }

    fn previous_element_index(&self, index: u64) -> Option<u64> {
        self.array_strategy()
            .previous_element_index(self.array_state(), index)
    }

    fn own_index_keys(&self) -> Vec<u64> {
        self.array_strategy().own_index_keys(self.array_state())
    }

    fn has_holes(&self) -> bool {
        self.array_strategy().has_holes(self.array_state())
    }

    fn integrity_level(&self) -> IntegrityLevel {
        self.array_strategy().integrity_level()
    }

    /// Raises the integrity level. Levels never decrease.
    fn set_integrity_level(&mut self, level: IntegrityLevel) {
        let level = level.max(self.integrity_level());
        let strategy = self.array_strategy().with_integrity_level(level);
        let state = self.array_state_mut();
        state.set_integrity_level(level);
        if level.is_frozen() {
            state.set_length_writable(false);
        }
        self.set_array_strategy(strategy);
    }
}

/// A standalone array record.
#[derive(Debug, Clone, Default)]
pub struct ArrayObject {
    state: ArrayState,
    strategy: ArrayStrategy,
}

impl HostArrayRecord for ArrayObject {
    #[inline]
    fn array_state(&self) -> &ArrayState {
        &self.state
    }

    #[inline]
    fn array_state_mut(&mut self) -> &mut ArrayState {
        &mut self.state
    }

    #[inline]
    fn array_strategy(&self) -> ArrayStrategy {
        self.strategy
    }

    #[inline]
    fn set_array_strategy(&mut self, strategy: ArrayStrategy) {
        self.strategy = strategy;
    }
}

impl ArrayObject {
    /// An empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// An array of `length` absent elements, as created by `new Array(n)`.
    pub fn with_length(length: u64) -> ElementsResult<Self> {
        let mut state = ArrayState::default();
        let strategy = ArrayStrategy::make_constant_empty(&mut state, length)?;
        Ok(Self { state, strategy })
    }

    /// An array sharing a literal's constant buffer.
    pub fn from_constant(buffer: Rc<ElementBuffer>) -> ElementsResult<Self> {
        let mut state = ArrayState::default();
        let strategy = ArrayStrategy::make_constant_packed(&mut state, buffer)?;
        Ok(Self { state, strategy })
    }

    /// An array holding `elements` in the narrowest element kind able to
    /// store all of them; `None` entries become holes.
    pub fn from_values(elements: &[Option<Value>]) -> ElementsResult<Self> {
        let mut state = ArrayState::default();
        let kind = elements
            .iter()
            .flatten()
            .map(ElementKind::of)
            .reduce(ElementKind::join);
        let strategy = match kind {
            None => ArrayStrategy::make_constant_empty(&mut state, elements.len() as u64)?,
            Some(kind) => {
                let buffer = ElementBuffer::from_elements(kind, elements)?;
                let length = elements.len();
                ArrayStrategy::make_holes(&mut state, buffer, length as u64, 0, 0, length as u32)?
            }
        };
        Ok(Self { state, strategy })
    }

    /// An array over a lazily materialized result.
    pub fn from_lazy(source: Rc<dyn LazyArraySource>) -> Self {
        let mut state = ArrayState::default();
        let strategy = ArrayStrategy::make_lazy(&mut state, source);
        Self { state, strategy }
    }

    pub fn from_sparse(map: BTreeMap<u64, Value>, length: u64) -> ElementsResult<Self> {
        let mut state = ArrayState::default();
        let strategy = ArrayStrategy::make_sparse(&mut state, map, length)?;
        Ok(Self { state, strategy })
    }

    #[inline]
    pub fn strategy(&self) -> ArrayStrategy {
        self.strategy
    }

    #[inline]
    pub fn state(&self) -> &ArrayState {
        &self.state
    }

    pub fn to_vec(&self) -> Vec<Option<Value>> {
        self.strategy.to_vec(&self.state)
    }

    pub fn prevent_extensions(&mut self) {
        self.set_integrity_level(IntegrityLevel::NonExtensible);
    }

    pub fn seal(&mut self) {
        self.set_integrity_level(IntegrityLevel::Sealed);
    }

    pub fn freeze(&mut self) {
        self.set_integrity_level(IntegrityLevel::Frozen);
    }

    pub fn set_length_not_writable(&mut self) {
        self.state.set_length_writable(false);
    }

    /// Verifies every storage invariant.
    pub fn check_invariants(&self) -> ElementsResult<()> {
        check_invariants(self.strategy, &self.state)
    }
}
