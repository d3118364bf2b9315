// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Homogeneous slot buffers backing dense arrays.
//!
//! Every buffer kind reserves one slot value as the hole marker: `i32::MIN`
//! for integers, a reserved NaN bit pattern for doubles and `None` for
//! references and arbitrary values. Slots outside an array's occupied window
//! always hold the hole marker, so that cleared reference slots never keep
//! objects alive.

use core::ops::Range;

use crate::{
    error::{ElementsError, ElementsResult},
    value::{ElementKind, ObjectHandle, Value},
};

pub(crate) const INT_HOLE: i32 = i32::MIN;
pub(crate) const DOUBLE_HOLE_BITS: u64 = 0x7FF8_0000_0000_0001;

#[inline]
fn double_hole() -> f64 {
    f64::from_bits(DOUBLE_HOLE_BITS)
}

#[inline]
fn is_double_hole(value: f64) -> bool {
    value.to_bits() == DOUBLE_HOLE_BITS
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementBuffer {
    Int(Vec<i32>),
    Double(Vec<f64>),
    Reference(Vec<Option<ObjectHandle>>),
    Object(Vec<Option<Value>>),
}

impl ElementBuffer {
    /// Creates a buffer of `capacity` hole slots.
    pub fn with_capacity(kind: ElementKind, capacity: usize) -> Self {
        match kind {
            ElementKind::Int => Self::Int(vec![INT_HOLE; capacity]),
            ElementKind::Double => Self::Double(vec![double_hole(); capacity]),
            ElementKind::Reference => Self::Reference(vec![None; capacity]),
            ElementKind::Object => Self::Object(vec![None; capacity]),
        }
    }

    /// Builds a buffer of the given kind from a list of elements, `None`
    /// marking holes.
    pub fn from_elements(kind: ElementKind, elements: &[Option<Value>]) -> ElementsResult<Self> {
        let mut buffer = Self::with_capacity(kind, elements.len());
        for (slot, element) in elements.iter().enumerate() {
            if let Some(value) = element {
                buffer.set(slot, value)?;
            }
        }
        Ok(buffer)
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Int(_) => ElementKind::Int,
            Self::Double(_) => ElementKind::Double,
            Self::Reference(_) => ElementKind::Reference,
            Self::Object(_) => ElementKind::Object,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        match self {
            Self::Int(slots) => slots.len(),
            Self::Double(slots) => slots.len(),
            Self::Reference(slots) => slots.len(),
            Self::Object(slots) => slots.len(),
        }
    }

    /// Reads a slot; `None` for holes and slots past the capacity.
    pub fn get(&self, slot: usize) -> Option<Value> {
        match self {
            Self::Int(slots) => match slots.get(slot) {
                Some(&value) if value != INT_HOLE => Some(Value::Integer(value)),
                _ => None,
            },
            Self::Double(slots) => match slots.get(slot) {
                Some(&value) if !is_double_hole(value) => Some(Value::Number(value)),
                _ => None,
            },
            Self::Reference(slots) => slots.get(slot).copied().flatten().map(Value::Object),
            Self::Object(slots) => slots.get(slot).cloned().flatten(),
        }
    }

    #[inline]
    pub fn is_hole(&self, slot: usize) -> bool {
        match self {
            Self::Int(slots) => slots[slot] == INT_HOLE,
            Self::Double(slots) => is_double_hole(slots[slot]),
            Self::Reference(slots) => slots[slot].is_none(),
            Self::Object(slots) => slots[slot].is_none(),
        }
    }

    /// Writes `value` into a slot. The value must fit the buffer's kind;
    /// widening is the caller's job.
    pub fn set(&mut self, slot: usize, value: &Value) -> ElementsResult<()> {
        match (self, value) {
            (Self::Int(slots), Value::Integer(v)) if *v != INT_HOLE => slots[slot] = *v,
            (Self::Double(slots), Value::Integer(v)) => slots[slot] = *v as f64,
            (Self::Double(slots), Value::Number(v)) => {
                // Any NaN payload could collide with the hole marker.
                slots[slot] = if v.is_nan() { f64::NAN } else { *v }
            }
            (Self::Reference(slots), Value::Object(handle)) => slots[slot] = Some(*handle),
            (Self::Object(slots), value) => slots[slot] = Some(value.clone()),
            _ => {
                return Err(ElementsError::UnsupportedOperation(
                    "value does not fit the element kind of the buffer",
                ));
            }
        }
        Ok(())
    }

    pub fn set_hole(&mut self, slot: usize) {
        self.fill_holes(slot..slot + 1);
    }

    /// Resets a range of slots to the hole marker.
    pub fn fill_holes(&mut self, range: Range<usize>) {
        match self {
            Self::Int(slots) => slots[range].fill(INT_HOLE),
            Self::Double(slots) => slots[range].fill(double_hole()),
            Self::Reference(slots) => slots[range].fill(None),
            Self::Object(slots) => slots[range].fill(None),
        }
    }

    pub fn count_holes(&self, range: Range<usize>) -> u32 {
        range.filter(|&slot| self.is_hole(slot)).count() as u32
    }

    /// Moves the slots in `src` so that they start at `dest`. Slots left
    /// behind keep their old contents; callers clear them as needed.
    pub fn copy_within(&mut self, src: Range<usize>, dest: usize) {
        match self {
            Self::Int(slots) => slots.copy_within(src, dest),
            Self::Double(slots) => slots.copy_within(src, dest),
            Self::Reference(slots) => slots.copy_within(src, dest),
            Self::Object(slots) => {
                let len = src.len();
                if dest <= src.start {
                    for i in 0..len {
                        slots[dest + i] = slots[src.start + i].take();
                    }
                } else {
                    for i in (0..len).rev() {
                        slots[dest + i] = slots[src.start + i].take();
                    }
                }
            }
        }
    }

    /// Returns a buffer of `capacity` slots holding the slots of `window`
    /// relocated to start at `dest`. Every other slot is a hole.
    pub fn relocated(self, capacity: usize, window: Range<usize>, dest: usize) -> Self {
        fn relocate<T: Clone>(
            slots: Vec<T>,
            hole: T,
            capacity: usize,
            window: Range<usize>,
            dest: usize,
        ) -> Vec<T> {
            let mut result = vec![hole.clone(); dest];
            result.extend(slots.into_iter().skip(window.start).take(window.len()));
            result.resize(capacity, hole);
            result
        }
        match self {
            Self::Int(slots) => Self::Int(relocate(slots, INT_HOLE, capacity, window, dest)),
            Self::Double(slots) => {
                Self::Double(relocate(slots, double_hole(), capacity, window, dest))
            }
            Self::Reference(slots) => {
                Self::Reference(relocate(slots, None, capacity, window, dest))
            }
            Self::Object(slots) => Self::Object(relocate(slots, None, capacity, window, dest)),
        }
    }

    /// Converts the buffer to a wider element kind, keeping holes as holes.
    pub fn widened(self, kind: ElementKind) -> ElementsResult<Self> {
        if self.kind() == kind {
            return Ok(self);
        }
        if !kind.is_wider_or_equal(self.kind()) {
            return Err(ElementsError::UnsupportedOperation(
                "element kinds can only be widened",
            ));
        }
        Ok(match (self, kind) {
            (Self::Int(slots), ElementKind::Double) => Self::Double(
                slots
                    .into_iter()
                    .map(|v| if v == INT_HOLE { double_hole() } else { v as f64 })
                    .collect(),
            ),
            (buffer, _) => {
                let capacity = buffer.capacity();
                Self::Object((0..capacity).map(|slot| buffer.get(slot)).collect())
            }
        })
    }

    pub(crate) fn iter_window(
        &self,
        window: Range<usize>,
    ) -> impl Iterator<Item = (usize, Value)> + '_ {
        window.filter_map(move |slot| self.get(slot).map(|value| (slot, value)))
    }
}
