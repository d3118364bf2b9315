// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::fmt::Debug;

use crate::{strategy::ArrayStrategy, value::Value};

/// How a single element write was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Direct write into an occupied slot.
    InBoundsFast,
    /// Write into an existing slot outside the occupied window, or into a
    /// hole.
    InBounds,
    /// Write that needed the backing store to grow.
    Supported,
    /// Write into a sparse map.
    Sparse,
}

/// Diagnostic hooks fired by the element storage layer.
///
/// Hooks only observe: nothing they do can change the outcome of the
/// operation that fired them, and a panicking hook is caught and logged.
pub trait ArrayHooks: Debug {
    /// A strategy transition happened while writing `value` at `index`.
    #[allow(unused_variables)]
    fn on_transition(
        &self,
        old: ArrayStrategy,
        new: ArrayStrategy,
        index: u64,
        value: Option<&Value>,
    ) {
    }

    /// An element was written.
    #[allow(unused_variables)]
    fn on_write(&self, mode: WriteMode, index: u64, value: &Value) {}
}

#[derive(Debug, Default)]
pub struct DefaultArrayHooks;

impl ArrayHooks for DefaultArrayHooks {}

/// Hooks that forward every event to `tracing` at the trace level.
#[derive(Debug, Default)]
pub struct TracingArrayHooks;

impl ArrayHooks for TracingArrayHooks {
    fn on_transition(
        &self,
        old: ArrayStrategy,
        new: ArrayStrategy,
        index: u64,
        value: Option<&Value>,
    ) {
        tracing::trace!(?old, ?new, index, ?value, "array transition");
    }

    fn on_write(&self, mode: WriteMode, index: u64, value: &Value) {
        tracing::trace!(?mode, index, ?value, "array write");
    }
}
