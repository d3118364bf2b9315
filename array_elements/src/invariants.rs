// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ground-truth audit of an array's storage.

use crate::{
    error::{ElementsError, ElementsResult},
    holes,
    state::{ArrayState, BackingStore},
    strategy::{ArrayLayout, ArrayStrategy},
};

macro_rules! ensure {
    ($condition:expr, $($message:tt)+) => {
        if !$condition {
            return Err(ElementsError::InvariantViolation(format!($($message)+)));
        }
    };
}

/// Re-derives every storage invariant of `state` under `strategy` from
/// scratch. Runs in time linear in the capacity of the backing store.
pub fn check_invariants(strategy: ArrayStrategy, state: &ArrayState) -> ElementsResult<()> {
    ensure!(
        strategy.integrity_level() == state.integrity_level,
        "strategy is {} but the array is {}",
        strategy.integrity_level(),
        state.integrity_level
    );
    if state.integrity_level.is_frozen() {
        ensure!(!state.length_writable, "frozen array with a writable length");
    }

    let layout = strategy.layout();
    match (layout, &state.backing_store) {
        (ArrayLayout::ConstantEmpty, BackingStore::Empty) => {
            ensure!(
                state.used_length == 0 && state.hole_count == 0,
                "constant empty array with occupied slots"
            );
            Ok(())
        }
        (ArrayLayout::Sparse, BackingStore::Sparse(map)) => {
            if let Some((&last, _)) = map.last_key_value() {
                ensure!(
                    last < state.length,
                    "sparse element {last} at or above length {}",
                    state.length
                );
            }
            Ok(())
        }
        (ArrayLayout::Lazy, BackingStore::Lazy(lazy)) => {
            ensure!(
                state.used_length == lazy.len() && state.length >= lazy.len() as u64,
                "lazy array of {} elements with used length {} and length {}",
                lazy.len(),
                state.used_length,
                state.length
            );
            Ok(())
        }
        (ArrayLayout::ConstantPacked(kind), BackingStore::Constant(buffer)) => {
            ensure!(buffer.kind() == kind, "constant buffer of the wrong kind");
            ensure!(
                state.index_offset == 0
                    && state.array_offset == 0
                    && state.used_length as usize == buffer.capacity()
                    && state.length == buffer.capacity() as u64,
                "constant array not spanning its whole buffer"
            );
            check_dense(strategy, state)
        }
        (
            ArrayLayout::ZeroBased(kind) | ArrayLayout::Contiguous(kind) | ArrayLayout::Holes(kind),
            BackingStore::Dense(buffer),
        ) => {
            ensure!(
                buffer.kind() == kind,
                "{layout:?} over a {:?} buffer",
                buffer.kind()
            );
            if let ArrayLayout::ZeroBased(_) = layout {
                ensure!(
                    state.index_offset == 0 && state.array_offset == 0,
                    "zero based array with index offset {} and array offset {}",
                    state.index_offset,
                    state.array_offset
                );
            }
            check_dense(strategy, state)
        }
        (layout, store) => Err(ElementsError::InvariantViolation(format!(
            "{layout:?} layout over {} backing store",
            match store {
                BackingStore::Empty => "an empty",
                BackingStore::Constant(_) => "a constant",
                BackingStore::Dense(_) => "a dense",
                BackingStore::Sparse(_) => "a sparse",
                BackingStore::Lazy(_) => "a lazy",
            }
        ))),
    }
}

fn check_dense(strategy: ArrayStrategy, state: &ArrayState) -> ElementsResult<()> {
    let Some(buffer) = state.elements() else {
        return Err(ElementsError::InvariantViolation("dense layout without a buffer".into()));
    };
    let capacity = buffer.capacity();
    let window = state.window_slots();
    ensure!(
        window.end <= capacity,
        "occupied window {window:?} exceeds capacity {capacity}"
    );
    ensure!(
        (0..window.start).chain(window.end..capacity).all(|slot| buffer.is_hole(slot)),
        "slots outside the occupied window are not cleared"
    );
    if window.is_empty() {
        ensure!(state.hole_count == 0, "empty window with {} holes", state.hole_count);
        return Ok(());
    }

    ensure!(state.window_start() >= 0, "window maps below index 0");
    let last = state.window_end() as u64 - 1;
    ensure!(
        state.length > last,
        "length {} does not cover element {last}",
        state.length
    );
    ensure!(
        !buffer.is_hole(window.start) && !buffer.is_hole(window.end - 1),
        "occupied window {window:?} starts or ends with a hole"
    );
    match strategy.layout() {
        ArrayLayout::Holes(_) => {
            holes::verify(state)?;
            ensure!(state.hole_count > 0, "holes array without holes");
        }
        _ => ensure!(
            state.hole_count == 0 && buffer.count_holes(window.clone()) == 0,
            "packed array holding holes in {window:?}"
        ),
    }
    Ok(())
}
