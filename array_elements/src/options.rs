// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Tunables of the element storage layer.
#[derive(Debug, Clone)]
pub struct Options {
    /// Capacity of the first dense backing store of an empty array.
    pub initial_array_size: u32,
    /// Largest gap of holes a dense array may grow by in a single write
    /// before it degrades to sparse storage.
    pub max_array_hole_size: u32,
    /// Largest length used to presize the first dense backing store of a
    /// preallocated array.
    pub max_flat_array_size: u32,
    /// Soft maximum capacity of any dense backing store.
    pub max_array_size: u32,
    /// Fire [`ArrayHooks::on_transition`](crate::ArrayHooks::on_transition).
    pub trace_array_transitions: bool,
    /// Fire [`ArrayHooks::on_write`](crate::ArrayHooks::on_write).
    pub trace_array_writes: bool,
    /// Re-derive and verify all storage invariants after every mutation.
    pub check_invariants: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            initial_array_size: 8,
            max_array_hole_size: 5000,
            max_flat_array_size: 1_000_000,
            max_array_size: i32::MAX as u32 - 8,
            trace_array_transitions: false,
            trace_array_writes: false,
            check_invariants: cfg!(any(debug_assertions, feature = "check-invariants")),
        }
    }
}
