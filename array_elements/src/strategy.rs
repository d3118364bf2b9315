// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Representation strategies
//!
//! An [`ArrayStrategy`] describes how the elements of one array are stored.
//! It holds no per-array data: all of that lives in the [`ArrayState`] each
//! operation is handed. Strategies are plain `Copy` values, so any number of
//! arrays of the same shape share the same strategy.
//!
//! Arrays move along the layouts in one direction,
//!
//! ```text
//! ConstantEmpty / ConstantPacked -> ZeroBased -> Contiguous -> Holes -> Sparse
//! ```
//!
//! with element kinds widening independently at any dense layout. A hole-free
//! `Holes` array compacts back to `Contiguous` (or `ZeroBased` when both
//! offsets are zero), and setting the length to zero resets the array to
//! `ConstantEmpty`.

pub(crate) mod constant;
pub(crate) mod dense;
mod lazy;
pub(crate) mod sparse;

use std::{collections::BTreeMap, rc::Rc};

use crate::{
    MAX_LENGTH,
    buffer::ElementBuffer,
    context::ArrayContext,
    error::{ElementsError, ElementsResult},
    holes,
    hooks::WriteMode,
    range,
    state::{ArrayState, BackingStore, IntegrityLevel},
    transition,
    value::{ElementKind, Value},
};

pub use lazy::{LazyArraySource, LazyElements};

/// Storage layout family, crossed with the element kind for dense layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayLayout {
    /// No backing store; every element is absent.
    ConstantEmpty,
    /// Shared, immutable literal buffer with `length == capacity`.
    ConstantPacked(ElementKind),
    /// Packed elements starting at slot 0 and index 0.
    ZeroBased(ElementKind),
    /// Packed elements anywhere in the buffer and the index space.
    Contiguous(ElementKind),
    /// Like `Contiguous`, but the occupied window may contain holes.
    Holes(ElementKind),
    /// Ordered map from index to value.
    Sparse,
    /// Read-through cache over a lazily materialized result.
    Lazy,
}

impl ArrayLayout {
    pub fn element_kind(self) -> Option<ElementKind> {
        match self {
            Self::ConstantPacked(kind)
            | Self::ZeroBased(kind)
            | Self::Contiguous(kind)
            | Self::Holes(kind) => Some(kind),
            Self::ConstantEmpty | Self::Sparse | Self::Lazy => None,
        }
    }

    /// Writable dense layouts.
    #[inline]
    pub fn is_dense(self) -> bool {
        matches!(self, Self::ZeroBased(_) | Self::Contiguous(_) | Self::Holes(_))
    }

    /// The simplest dense layout describing `state`.
    pub(crate) fn dense_for(state: &ArrayState, kind: ElementKind) -> Self {
        if state.hole_count > 0 {
            Self::Holes(kind)
        } else if state.index_offset == 0 && state.array_offset == 0 {
            Self::ZeroBased(kind)
        } else {
            Self::Contiguous(kind)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayStrategy {
    layout: ArrayLayout,
    integrity_level: IntegrityLevel,
}

impl Default for ArrayStrategy {
    fn default() -> Self {
        Self::constant_empty()
    }
}

#[inline]
fn reject<T>(strict: bool, error: ElementsError, fallback: T) -> ElementsResult<T> {
    if strict { Err(error) } else { Ok(fallback) }
}

impl ArrayStrategy {
    pub const fn new(layout: ArrayLayout, integrity_level: IntegrityLevel) -> Self {
        Self {
            layout,
            integrity_level,
        }
    }

    pub const fn constant_empty() -> Self {
        Self::new(ArrayLayout::ConstantEmpty, IntegrityLevel::Extensible)
    }

    #[inline]
    pub fn layout(self) -> ArrayLayout {
        self.layout
    }

    #[inline]
    pub fn integrity_level(self) -> IntegrityLevel {
        self.integrity_level
    }

    #[inline]
    pub fn element_kind(self) -> Option<ElementKind> {
        self.layout.element_kind()
    }

    /// The same layout under another integrity level. Never touches data.
    pub fn with_integrity_level(self, integrity_level: IntegrityLevel) -> Self {
        Self {
            integrity_level,
            ..self
        }
    }

    pub(crate) fn with_layout(self, layout: ArrayLayout) -> Self {
        Self { layout, ..self }
    }

    /// Reselects the dense layout after a mutation of `state`, reporting the
    /// transition if the layout changed.
    pub(crate) fn settle(
        self,
        cx: &ArrayContext,
        state: &ArrayState,
        kind: ElementKind,
        index: u64,
        value: Option<&Value>,
    ) -> Self {
        let next = self.with_layout(ArrayLayout::dense_for(state, kind));
        cx.notify_transition(self, next, index, value);
        next
    }

    /// Turns a constant or lazy array into a writable layout.
    pub(crate) fn writable(
        self,
        cx: &ArrayContext,
        state: &mut ArrayState,
        index: u64,
    ) -> ElementsResult<Self> {
        let next = match self.layout {
            ArrayLayout::ConstantPacked(_) => constant::unshare(self, state)?,
            ArrayLayout::Lazy => lazy::materialize(self, state)?,
            _ => return Ok(self),
        };
        cx.notify_transition(self, next, index, None);
        Ok(next)
    }

    // Factories

    /// An array of `length` absent elements without a backing store.
    pub fn make_constant_empty(state: &mut ArrayState, length: u64) -> ElementsResult<Self> {
        if length > MAX_LENGTH {
            return Err(ElementsError::InvalidLength(length));
        }
        state.reset_layout(BackingStore::Empty);
        state.length = length;
        Ok(Self::new(ArrayLayout::ConstantEmpty, state.integrity_level))
    }

    /// An array sharing an immutable literal buffer.
    pub fn make_constant_packed(
        state: &mut ArrayState,
        buffer: Rc<ElementBuffer>,
    ) -> ElementsResult<Self> {
        let capacity = buffer.capacity();
        if buffer.count_holes(0..capacity) > 0 {
            return Err(ElementsError::UnsupportedOperation(
                "constant buffers cannot contain holes",
            ));
        }
        let kind = buffer.kind();
        state.reset_layout(BackingStore::Constant(buffer));
        state.length = capacity as u64;
        state.used_length = capacity as u32;
        Ok(Self::new(ArrayLayout::ConstantPacked(kind), state.integrity_level))
    }

    /// A packed array whose first `used_length` slots are occupied.
    pub fn make_zero_based_packed(
        state: &mut ArrayState,
        buffer: ElementBuffer,
        length: u64,
        used_length: u32,
    ) -> ElementsResult<Self> {
        Self::make_contiguous(state, buffer, length, 0, 0, used_length)
    }

    /// A packed array occupying slots `array_offset..array_offset +
    /// used_length`, slot `s` holding index `index_offset + s`.
    pub fn make_contiguous(
        state: &mut ArrayState,
        buffer: ElementBuffer,
        length: u64,
        index_offset: i64,
        array_offset: u32,
        used_length: u32,
    ) -> ElementsResult<Self> {
        let strategy =
            Self::make_holes(state, buffer, length, index_offset, array_offset, used_length)?;
        if state.hole_count > 0 {
            return Err(ElementsError::UnsupportedOperation(
                "packed buffers cannot contain holes",
            ));
        }
        Ok(strategy)
    }

    /// A dense array whose occupied window may contain holes. The window is
    /// trimmed to its first and last element.
    pub fn make_holes(
        state: &mut ArrayState,
        mut buffer: ElementBuffer,
        length: u64,
        index_offset: i64,
        array_offset: u32,
        used_length: u32,
    ) -> ElementsResult<Self> {
        let capacity = buffer.capacity();
        let window_end = array_offset as usize + used_length as usize;
        if window_end > capacity {
            return Err(ElementsError::InvalidRange {
                start: array_offset as u64,
                end: window_end as u64,
                length: capacity as u64,
            });
        }
        let first_index = index_offset + array_offset as i64;
        if used_length > 0 && first_index < 0 {
            return Err(ElementsError::IndexOutOfRange(0));
        }
        if length > MAX_LENGTH
            || (used_length > 0 && (first_index + used_length as i64) as u64 > length)
        {
            return Err(ElementsError::InvalidLength(length));
        }
        buffer.fill_holes(0..array_offset as usize);
        buffer.fill_holes(window_end..capacity);
        let kind = buffer.kind();
        state.reset_layout(BackingStore::Dense(buffer));
        state.length = length;
        state.index_offset = index_offset;
        state.array_offset = array_offset;
        state.used_length = used_length;
        state.hole_count = holes::count(state);
        holes::trim_window(state);
        Ok(Self::new(ArrayLayout::dense_for(state, kind), state.integrity_level))
    }

    pub fn make_sparse(
        state: &mut ArrayState,
        map: BTreeMap<u64, Value>,
        length: u64,
    ) -> ElementsResult<Self> {
        let required = map.last_key_value().map_or(0, |(index, _)| index + 1);
        if length > MAX_LENGTH || length < required {
            return Err(ElementsError::InvalidLength(length));
        }
        state.reset_layout(BackingStore::Sparse(map));
        state.length = length;
        Ok(Self::new(ArrayLayout::Sparse, state.integrity_level))
    }

    pub fn make_lazy(state: &mut ArrayState, source: Rc<dyn LazyArraySource>) -> Self {
        let len = source.len();
        state.reset_layout(BackingStore::Lazy(LazyElements::new(source)));
        state.length = len as u64;
        state.used_length = len;
        Self::new(ArrayLayout::Lazy, state.integrity_level)
    }

    // Reads

    #[inline]
    pub fn length(self, state: &ArrayState) -> u64 {
        state.length
    }

    pub fn has_element(self, state: &ArrayState, index: u64) -> bool {
        match self.layout {
            ArrayLayout::ConstantEmpty => false,
            ArrayLayout::Sparse => sparse::has_element(state, index),
            ArrayLayout::Lazy => lazy::has_element(state, index),
            _ => dense::has_element(state, index),
        }
    }

    /// The element at `index`, or `None` if it is absent.
    pub fn get_element(self, state: &ArrayState, index: u64) -> Option<Value> {
        match self.layout {
            ArrayLayout::ConstantEmpty => None,
            ArrayLayout::Sparse => sparse::get_element(state, index),
            ArrayLayout::Lazy => lazy::get_element(state, index),
            _ => dense::get_element(state, index),
        }
    }

    /// True if `index` is an occupied slot reachable without any bookkeeping.
    pub fn is_in_bounds_fast(self, state: &ArrayState, index: u64) -> bool {
        match self.layout {
            ArrayLayout::ConstantEmpty | ArrayLayout::Sparse => false,
            ArrayLayout::Lazy => lazy::has_element(state, index),
            _ => dense::has_element(state, index),
        }
    }

    /// Reads an element on the in-bounds fast path.
    pub fn get_element_in_bounds(self, state: &ArrayState, index: u64) -> ElementsResult<Value> {
        if !self.is_in_bounds_fast(state, index) {
            return Err(ElementsError::OutOfBoundsFastAccess(index));
        }
        self.get_element(state, index)
            .ok_or(ElementsError::OutOfBoundsFastAccess(index))
    }

    /// True if any index below the length is absent.
    pub fn has_holes(self, state: &ArrayState) -> bool {
        match self.layout {
            ArrayLayout::ConstantEmpty => state.length > 0,
            ArrayLayout::Sparse => sparse::count(state) as u64 != state.length,
            ArrayLayout::Lazy => state.length != state.used_length as u64,
            _ => {
                state.hole_count > 0
                    || state.used_length as u64 != state.length
                    || (state.used_length > 0 && state.window_start() != 0)
            }
        }
    }

    pub fn first_element_index(self, state: &ArrayState) -> Option<u64> {
        self.next_index_from(state, 0)
    }

    pub fn last_element_index(self, state: &ArrayState) -> Option<u64> {
        match self.layout {
            ArrayLayout::ConstantEmpty => None,
            ArrayLayout::Sparse => sparse::last_element_index(state),
            ArrayLayout::Lazy => (state.used_length as u64).checked_sub(1),
            _ => dense::last_element_index(state),
        }
    }

    /// Smallest occupied index greater than `index`.
    pub fn next_element_index(self, state: &ArrayState, index: u64) -> Option<u64> {
        self.next_index_from(state, index.checked_add(1)?)
    }

    /// Largest occupied index smaller than `index`.
    pub fn previous_element_index(self, state: &ArrayState, index: u64) -> Option<u64> {
        let below = index.checked_sub(1)?;
        match self.layout {
            ArrayLayout::ConstantEmpty => None,
            ArrayLayout::Sparse => sparse::previous_index_from(state, below),
            ArrayLayout::Lazy => Some(below.min((state.used_length as u64).checked_sub(1)?)),
            _ => dense::previous_index_from(state, below),
        }
    }

    fn next_index_from(self, state: &ArrayState, from: u64) -> Option<u64> {
        match self.layout {
            ArrayLayout::ConstantEmpty => None,
            ArrayLayout::Sparse => sparse::next_index_from(state, from),
            ArrayLayout::Lazy => (from < state.used_length as u64).then_some(from),
            _ => dense::next_index_from(state, from),
        }
    }

    /// Occupied indices in ascending order.
    pub fn own_index_keys(self, state: &ArrayState) -> Vec<u64> {
        match self.layout {
            ArrayLayout::ConstantEmpty => Vec::new(),
            ArrayLayout::Sparse => sparse::own_index_keys(state),
            ArrayLayout::Lazy => (0..state.used_length as u64).collect(),
            _ => dense::own_index_keys(state),
        }
    }

    /// A copy of the backing store. Constant buffers and lazy sources stay
    /// shared.
    pub fn clone_backing_store(self, state: &ArrayState) -> BackingStore {
        state.backing_store.clone()
    }

    /// Every index below the length, `None` marking absent elements.
    pub fn to_vec(self, state: &ArrayState) -> Vec<Option<Value>> {
        (0..state.length).map(|index| self.get_element(state, index)).collect()
    }

    // Writes

    /// Writes `value` at `index`, returning the strategy the array uses
    /// afterwards.
    ///
    /// Writes forbidden by the integrity level are ignored, or fail with a
    /// `TypeError` kind of error when `strict` is set.
    pub fn set_element(
        self,
        cx: &ArrayContext,
        state: &mut ArrayState,
        index: u64,
        value: Value,
        strict: bool,
    ) -> ElementsResult<Self> {
        if index >= MAX_LENGTH {
            return Err(ElementsError::IndexOutOfRange(index));
        }
        let level = self.integrity_level;
        if level.is_frozen() {
            return reject(strict, ElementsError::FrozenElement(index), self);
        }
        if index >= state.length && !state.length_writable {
            return reject(strict, ElementsError::LengthNotWritable, self);
        }
        if !level.is_extensible() && !self.has_element(state, index) {
            return reject(strict, ElementsError::NotExtensible(index), self);
        }
        transition::set_element(cx, self, state, index, value)
    }

    /// Writes into an occupied slot without any bookkeeping or transition.
    ///
    /// Only valid on a writable dense layout, for an index inside the fast
    /// range and a value that fits the element kind; anything else is a
    /// caller error.
    pub fn set_element_in_bounds_fast(
        self,
        cx: &ArrayContext,
        state: &mut ArrayState,
        index: u64,
        value: Value,
    ) -> ElementsResult<()> {
        let Some(kind) = self.element_kind().filter(|_| self.layout.is_dense()) else {
            return Err(ElementsError::UnsupportedOperation(
                "in-bounds fast write on a layout without a writable buffer",
            ));
        };
        if self.integrity_level.is_frozen() {
            return Err(ElementsError::FrozenElement(index));
        }
        if !kind.can_store(&value) {
            return Err(ElementsError::UnsupportedOperation(
                "in-bounds fast write of a value that needs a wider element kind",
            ));
        }
        let slot = match state.window_slot(index) {
            Some(slot) if dense::has_element(state, index) => slot,
            _ => return Err(ElementsError::OutOfBoundsFastAccess(index)),
        };
        let Some(buffer) = state.dense_mut() else {
            return Err(ElementsError::OutOfBoundsFastAccess(index));
        };
        buffer.set(slot, &value)?;
        cx.notify_write(WriteMode::InBoundsFast, index, &value);
        Ok(())
    }

    /// Whether the element at `index` may be deleted.
    pub fn can_delete_element(
        self,
        state: &ArrayState,
        index: u64,
        strict: bool,
    ) -> ElementsResult<bool> {
        if self.integrity_level.is_sealed() && self.has_element(state, index) {
            return reject(strict, ElementsError::SealedElement(index), false);
        }
        Ok(true)
    }

    pub fn delete_element(
        self,
        cx: &ArrayContext,
        state: &mut ArrayState,
        index: u64,
        strict: bool,
    ) -> ElementsResult<Self> {
        if !self.has_element(state, index) {
            return Ok(self);
        }
        if self.integrity_level.is_sealed() {
            return reject(strict, ElementsError::SealedElement(index), self);
        }
        let strategy = self.writable(cx, state, index)?;
        match strategy.layout {
            ArrayLayout::Sparse => {
                sparse::delete_element(state, index);
                Ok(strategy)
            }
            layout => match layout.element_kind() {
                Some(kind) if layout.is_dense() => {
                    dense::delete_element(cx, strategy, kind, state, index)
                }
                _ => Ok(strategy),
            },
        }
    }

    /// Sets the length, deleting every element at or above it.
    ///
    /// Sealed arrays keep their elements: the length stops just above the
    /// last one, which is reported as an error in strict mode.
    pub fn set_length(
        self,
        cx: &ArrayContext,
        state: &mut ArrayState,
        length: u64,
        strict: bool,
    ) -> ElementsResult<Self> {
        if length > MAX_LENGTH {
            return Err(ElementsError::InvalidLength(length));
        }
        if length == state.length {
            return Ok(self);
        }
        if !state.length_writable {
            return reject(strict, ElementsError::LengthNotWritable, self);
        }
        let mut target = length;
        if self.integrity_level.is_sealed() && length < state.length {
            if let Some(last) = self.last_element_index(state).filter(|&last| last >= length) {
                target = last + 1;
            }
        }
        let strategy = if target == state.length {
            self
        } else if target == 0 {
            state.reset_layout(BackingStore::Empty);
            state.length = 0;
            let next = self.with_layout(ArrayLayout::ConstantEmpty);
            cx.notify_transition(self, next, 0, None);
            next
        } else {
            let strategy = self.writable(cx, state, target)?;
            match strategy.layout {
                ArrayLayout::Sparse => {
                    sparse::set_length(state, target);
                    strategy
                }
                layout => match layout.element_kind() {
                    Some(kind) if layout.is_dense() => {
                        dense::set_length(cx, strategy, kind, state, target)?
                    }
                    _ => {
                        state.length = target;
                        strategy
                    }
                },
            }
        };
        if target != length {
            return reject(strict, ElementsError::SealedElement(target - 1), strategy);
        }
        Ok(strategy)
    }

    /// Inserts `size` absent elements at `offset`, moving every later element
    /// up.
    pub fn insert_range(
        self,
        cx: &ArrayContext,
        state: &mut ArrayState,
        offset: u64,
        size: u64,
    ) -> ElementsResult<Self> {
        if !self.integrity_level.is_extensible() {
            return Err(ElementsError::RangeEditNotAllowed(self.integrity_level));
        }
        if !state.length_writable {
            return Err(ElementsError::LengthNotWritable);
        }
        if offset > state.length {
            return Err(ElementsError::InvalidRange {
                start: offset,
                end: offset,
                length: state.length,
            });
        }
        let length = state.length.saturating_add(size);
        if length > MAX_LENGTH {
            return Err(ElementsError::InvalidLength(length));
        }
        if size == 0 {
            return Ok(self);
        }
        range::insert_range(cx, self, state, offset, size)
    }

    /// Removes the elements in `start..end`, moving every later element down.
    pub fn remove_range(
        self,
        cx: &ArrayContext,
        state: &mut ArrayState,
        start: u64,
        end: u64,
    ) -> ElementsResult<Self> {
        self.check_removal(state, start, end)?;
        if start == end {
            return Ok(self);
        }
        range::remove_range(cx, self, state, start, end)
    }

    /// Removes the elements below `from`, moving the rest down to index 0.
    pub fn shift_range(
        self,
        cx: &ArrayContext,
        state: &mut ArrayState,
        from: u64,
    ) -> ElementsResult<Self> {
        self.check_removal(state, 0, from)?;
        if from == 0 {
            return Ok(self);
        }
        range::shift_range(cx, self, state, from)
    }

    fn check_removal(self, state: &ArrayState, start: u64, end: u64) -> ElementsResult<()> {
        if self.integrity_level.is_sealed() {
            return Err(ElementsError::RangeEditNotAllowed(self.integrity_level));
        }
        if !state.length_writable {
            return Err(ElementsError::LengthNotWritable);
        }
        if start > end || end > state.length {
            return Err(ElementsError::InvalidRange {
                start,
                end,
                length: state.length,
            });
        }
        Ok(())
    }
}
