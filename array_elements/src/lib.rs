// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Array element storage
//!
//! Backing storage for the indexed elements of array-like objects. An array's
//! elements live in an [`ArrayState`] owned by the array record, and are
//! accessed through an [`ArrayStrategy`]: a small `Copy` value describing the
//! current storage layout (constant, zero-based, contiguous, holes, sparse or
//! lazy), the element kind of a dense buffer and the array's integrity level.
//!
//! Every mutating operation returns the strategy the array should use from
//! then on. Records that implement [`HostArrayRecord`] get the bookkeeping for
//! free; [`ArrayObject`] is the plain implementation of such a record.

mod array;
mod buffer;
mod capacity;
mod context;
mod error;
mod holes;
mod hooks;
mod invariants;
mod options;
mod range;
mod state;
mod strategy;
mod transition;
mod value;

pub use array::{ArrayObject, HostArrayRecord};
pub use buffer::ElementBuffer;
pub use capacity::{initial_capacity, next_capacity, next_power_capacity};
pub use context::ArrayContext;
pub use error::{ElementsError, ElementsResult, ExceptionType};
pub use hooks::{ArrayHooks, DefaultArrayHooks, TracingArrayHooks, WriteMode};
pub use invariants::check_invariants;
pub use options::Options;
pub use state::{ArrayState, BackingStore, IntegrityLevel};
pub use strategy::{ArrayLayout, ArrayStrategy, LazyArraySource, LazyElements};
pub use value::{ElementKind, ObjectHandle, Value};

/// Largest valid array length, `2^53 - 1`.
pub const MAX_LENGTH: u64 = (1 << 53) - 1;
