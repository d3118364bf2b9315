// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arrays over results that are cheaper to produce on demand, such as the
//! capture groups of a regular expression match.

use core::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::{
    buffer::ElementBuffer,
    error::{ElementsError, ElementsResult},
    state::{ArrayState, BackingStore},
    value::{ElementKind, Value},
};

use super::{ArrayLayout, ArrayStrategy};

/// Producer of the elements of a lazy array.
pub trait LazyArraySource: core::fmt::Debug {
    /// Number of elements the source produces.
    fn len(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produces the element at `index`, which is below [`len`](Self::len).
    fn materialize_group(&self, index: u32) -> Value;

    /// Produces every element at once.
    fn materialize_all(&self) -> Vec<Value>;
}

#[derive(Debug, Clone)]
pub struct LazyElements {
    source: Rc<dyn LazyArraySource>,
    cache: RefCell<AHashMap<u32, Value>>,
}

impl LazyElements {
    pub fn new(source: Rc<dyn LazyArraySource>) -> Self {
        Self {
            source,
            cache: RefCell::default(),
        }
    }

    pub fn len(&self) -> u32 {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Number of elements materialized so far.
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    fn get(&self, index: u32) -> Value {
        if let Some(value) = self.cache.borrow().get(&index) {
            return value.clone();
        }
        let value = self.source.materialize_group(index);
        self.cache.borrow_mut().insert(index, value.clone());
        value
    }
}

#[inline]
pub(crate) fn has_element(state: &ArrayState, index: u64) -> bool {
    index < state.used_length as u64
}

pub(crate) fn get_element(state: &ArrayState, index: u64) -> Option<Value> {
    match &state.backing_store {
        BackingStore::Lazy(lazy) if has_element(state, index) => Some(lazy.get(index as u32)),
        _ => None,
    }
}

/// Replaces the lazy source by a zero-based object buffer holding every
/// element. Elements that were already read keep the value they were read
/// as.
pub(crate) fn materialize(
    strategy: ArrayStrategy,
    state: &mut ArrayState,
) -> ElementsResult<ArrayStrategy> {
    let lazy = match core::mem::take(&mut state.backing_store) {
        BackingStore::Lazy(lazy) => lazy,
        other => {
            state.backing_store = other;
            return Err(ElementsError::InvariantViolation(
                "lazy layout without a lazy source".into(),
            ));
        }
    };
    let mut values = lazy.source.materialize_all();
    for (index, value) in lazy.cache.into_inner() {
        if let Some(slot) = values.get_mut(index as usize) {
            *slot = value;
        }
    }
    let used_length = values.len() as u32;
    let buffer = ElementBuffer::Object(values.into_iter().map(Some).collect());
    state.reset_layout(BackingStore::Dense(buffer));
    state.used_length = used_length;
    state.length = state.length.max(used_length as u64);
    Ok(strategy.with_layout(ArrayLayout::ZeroBased(ElementKind::Object)))
}
