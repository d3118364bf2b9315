// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{collections::BTreeMap, rc::Rc};

use crate::{buffer::ElementBuffer, strategy::LazyElements, value::Value};

/// Language-mandated restriction on structural mutation of an array.
///
/// Levels are ordered: every level implies the restrictions of the levels
/// before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum IntegrityLevel {
    #[default]
    Extensible,
    NonExtensible,
    Sealed,
    Frozen,
}

impl IntegrityLevel {
    #[inline]
    pub fn is_extensible(self) -> bool {
        self == Self::Extensible
    }

    #[inline]
    pub fn is_sealed(self) -> bool {
        self >= Self::Sealed
    }

    #[inline]
    pub fn is_frozen(self) -> bool {
        self == Self::Frozen
    }
}

impl core::fmt::Display for IntegrityLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Extensible => "extensible",
            Self::NonExtensible => "non-extensible",
            Self::Sealed => "sealed",
            Self::Frozen => "frozen",
        })
    }
}

/// Storage behind an array's elements.
#[derive(Debug, Clone, Default)]
pub enum BackingStore {
    /// No storage at all.
    #[default]
    Empty,
    /// Immutable buffer shared between array literals; copied on first write.
    Constant(Rc<ElementBuffer>),
    /// Buffer exclusively owned by this array.
    Dense(ElementBuffer),
    Sparse(BTreeMap<u64, Value>),
    Lazy(LazyElements),
}

/// Element storage fields of an array record.
///
/// The occupied window of a dense backing store is the slot range
/// `array_offset..array_offset + used_length`; backing slot `s` holds the
/// element at logical index `index_offset + s`.
#[derive(Debug, Clone)]
pub struct ArrayState {
    pub(crate) length: u64,
    pub(crate) used_length: u32,
    pub(crate) index_offset: i64,
    pub(crate) array_offset: u32,
    pub(crate) hole_count: u32,
    pub(crate) backing_store: BackingStore,
    pub(crate) integrity_level: IntegrityLevel,
    /// Array length property can be set to unwritable
    pub(crate) length_writable: bool,
    backing_store_writes: u64,
}

impl Default for ArrayState {
    fn default() -> Self {
        Self {
            length: 0,
            used_length: 0,
            index_offset: 0,
            array_offset: 0,
            hole_count: 0,
            backing_store: BackingStore::Empty,
            integrity_level: IntegrityLevel::Extensible,
            length_writable: true,
            backing_store_writes: 0,
        }
    }
}

impl ArrayState {
    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn set_length(&mut self, length: u64) {
        self.length = length;
    }

    #[inline]
    pub fn used_length(&self) -> u32 {
        self.used_length
    }

    #[inline]
    pub fn set_used_length(&mut self, used_length: u32) {
        self.used_length = used_length;
    }

    #[inline]
    pub fn index_offset(&self) -> i64 {
        self.index_offset
    }

    #[inline]
    pub fn set_index_offset(&mut self, index_offset: i64) {
        self.index_offset = index_offset;
    }

    #[inline]
    pub fn array_offset(&self) -> u32 {
        self.array_offset
    }

    #[inline]
    pub fn set_array_offset(&mut self, array_offset: u32) {
        self.array_offset = array_offset;
    }

    #[inline]
    pub fn hole_count(&self) -> u32 {
        self.hole_count
    }

    #[inline]
    pub fn set_hole_count(&mut self, hole_count: u32) {
        self.hole_count = hole_count;
    }

    #[inline]
    pub fn backing_store(&self) -> &BackingStore {
        &self.backing_store
    }

    pub fn set_backing_store(&mut self, backing_store: BackingStore) {
        self.backing_store = backing_store;
    }

    #[inline]
    pub fn integrity_level(&self) -> IntegrityLevel {
        self.integrity_level
    }

    #[inline]
    pub fn set_integrity_level(&mut self, integrity_level: IntegrityLevel) {
        self.integrity_level = integrity_level;
    }

    #[inline]
    pub fn length_writable(&self) -> bool {
        self.length_writable
    }

    #[inline]
    pub fn set_length_writable(&mut self, writable: bool) {
        self.length_writable = writable;
    }

    /// Number of times a dense backing store was borrowed for writing.
    pub fn backing_store_writes(&self) -> u64 {
        self.backing_store_writes
    }

    /// The dense or constant buffer, if any.
    #[inline]
    pub(crate) fn elements(&self) -> Option<&ElementBuffer> {
        match &self.backing_store {
            BackingStore::Dense(buffer) => Some(buffer),
            BackingStore::Constant(buffer) => Some(buffer),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn dense_mut(&mut self) -> Option<&mut ElementBuffer> {
        match &mut self.backing_store {
            BackingStore::Dense(buffer) => {
                self.backing_store_writes += 1;
                Some(buffer)
            }
            _ => None,
        }
    }

    /// Moves the dense buffer out of the state, leaving it empty.
    pub(crate) fn take_dense(&mut self) -> Option<ElementBuffer> {
        match core::mem::take(&mut self.backing_store) {
            BackingStore::Dense(buffer) => {
                self.backing_store_writes += 1;
                Some(buffer)
            }
            other => {
                self.backing_store = other;
                None
            }
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.elements().map_or(0, ElementBuffer::capacity)
    }

    /// Logical index of the first occupied slot.
    #[inline]
    pub(crate) fn window_start(&self) -> i64 {
        self.index_offset + self.array_offset as i64
    }

    /// Logical index one past the last occupied slot.
    #[inline]
    pub(crate) fn window_end(&self) -> i64 {
        self.window_start() + self.used_length as i64
    }

    /// Slot range of the occupied window.
    #[inline]
    pub(crate) fn window_slots(&self) -> core::ops::Range<usize> {
        let start = self.array_offset as usize;
        start..start + self.used_length as usize
    }

    /// Backing slot of a logical index, if it falls inside the occupied
    /// window.
    #[inline]
    pub(crate) fn window_slot(&self, index: u64) -> Option<usize> {
        let index = i64::try_from(index).ok()?;
        if index >= self.window_start() && index < self.window_end() {
            Some((index - self.index_offset) as usize)
        } else {
            None
        }
    }

    /// Forgets the dense layout fields, keeping length and integrity.
    pub(crate) fn reset_layout(&mut self, backing_store: BackingStore) {
        self.backing_store = backing_store;
        self.used_length = 0;
        self.index_offset = 0;
        self.array_offset = 0;
        self.hole_count = 0;
    }
}
