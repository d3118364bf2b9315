// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::rc::Rc;

/// Handle to a heap object owned by the surrounding object model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(u32);

impl ObjectHandle {
    pub const fn from_u32(index: u32) -> Self {
        Self(index)
    }

    pub const fn into_u32(self) -> u32 {
        self.0
    }
}

/// A language value as stored in array elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Integer(i32),
    Number(f64),
    String(Rc<str>),
    Object(ObjectHandle),
}

impl Value {
    /// Numeric view of the value, if it is a number of either
    /// representation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// SameValueZero comparison: integers and doubles of equal magnitude are
    /// equal, as are NaNs and the two zeroes.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b || (a.is_nan() && b.is_nan()),
            (None, None) => self == other,
            _ => false,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<ObjectHandle> for Value {
    fn from(value: ObjectHandle) -> Self {
        Value::Object(value)
    }
}

/// Value-type homogeneity of a dense element buffer.
///
/// Kinds form a small lattice: `Int < Double < Object` and
/// `Reference < Object`. Buffers only ever widen along it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Packed `i32` values.
    Int,
    /// Packed `f64` values.
    Double,
    /// Object references only.
    Reference,
    /// Any value.
    Object,
}

impl ElementKind {
    /// The narrowest kind able to hold `value`.
    ///
    /// `i32::MIN` doubles as the integer hole marker, so it is classified as
    /// a double.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Integer(i) if *i != i32::MIN => ElementKind::Int,
            Value::Integer(_) | Value::Number(_) => ElementKind::Double,
            Value::Object(_) => ElementKind::Reference,
            _ => ElementKind::Object,
        }
    }

    /// Least upper bound of two kinds.
    pub fn join(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (ElementKind::Int, ElementKind::Double) | (ElementKind::Double, ElementKind::Int) => {
                ElementKind::Double
            }
            _ => ElementKind::Object,
        }
    }

    #[inline]
    pub fn can_store(self, value: &Value) -> bool {
        self.join(Self::of(value)) == self
    }

    /// True if `self` is reachable from `other` by widening.
    pub fn is_wider_or_equal(self, other: Self) -> bool {
        other.join(self) == self
    }
}
