// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Write classification and layout transitions
//!
//! Every element write is carried out in the cheapest mode that applies:
//!
//! 1. in-bounds-fast: the index is an occupied slot of the window;
//! 2. in-bounds: the slot exists but lies outside the window or is a hole;
//! 3. supported: the buffer has to grow, but the layout family stays;
//! 4. unsupported: the layout has to change first. A value that does not fit
//!    the element kind widens the buffer; an index within the hole budget of
//!    the window turns the array into a holes array; anything further away
//!    moves the array to sparse storage.
//!
//! A transition migrates the backing store in one step and then retries the
//! write against the new strategy.

use crate::{
    capacity,
    context::ArrayContext,
    error::ElementsResult,
    holes,
    hooks::WriteMode,
    state::{ArrayState, BackingStore},
    strategy::{ArrayLayout, ArrayStrategy, constant, sparse},
    value::{ElementKind, Value},
};

/// Where a write outside the occupied window lands.
enum Placement {
    /// Re-anchor an empty window at the index.
    Anchor,
    /// Extend the window to the right, leaving `gap` holes behind it.
    Append { gap: u64 },
    /// Extend the window to the left, leaving `gap` holes after the index.
    Prepend { gap: u64 },
    /// Too far away for a buffer.
    Sparse,
}

fn classify(cx: &ArrayContext, state: &ArrayState, index: i64) -> Placement {
    let options = &cx.options;
    let hole_budget = options.max_array_hole_size as i64;
    let max_slots = options.max_array_size as i64;
    if index >= max_slots {
        return Placement::Sparse;
    }
    if state.used_length == 0 {
        let capacity = state.capacity() as i64;
        let slot = index - state.index_offset;
        let presized = (0..capacity).contains(&slot) || index < capacity;
        return if index <= hole_budget || presized {
            Placement::Anchor
        } else {
            Placement::Sparse
        };
    }
    let start = state.window_start();
    let end = state.window_end();
    let slot = index - state.index_offset;
    let (placement, gap, slots_needed) = if index >= end {
        let gap = index - end;
        (Placement::Append { gap: gap as u64 }, gap, slot + 1)
    } else {
        let gap = start - index - 1;
        let capacity = state.capacity() as i64;
        (Placement::Prepend { gap: gap as u64 }, gap, capacity - slot.min(0))
    };
    if gap > hole_budget || slots_needed > max_slots {
        Placement::Sparse
    } else {
        placement
    }
}

/// Writes `value` at `index` once integrity checks have passed.
pub(crate) fn set_element(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    state: &mut ArrayState,
    index: u64,
    value: Value,
) -> ElementsResult<ArrayStrategy> {
    match strategy.layout() {
        ArrayLayout::ConstantEmpty => {
            // A preallocated length within the flat size gets a presized
            // buffer even when the first write lands far from index 0.
            let presized =
                index < state.length && state.length <= cx.options.max_flat_array_size as u64;
            let placement = if presized {
                Placement::Anchor
            } else {
                classify(cx, state, index as i64)
            };
            let next = match placement {
                Placement::Sparse => sparse::degrade(cx, strategy, state, index, Some(&value)),
                _ => {
                    let next =
                        constant::allocate_empty(cx, strategy, state, ElementKind::of(&value));
                    cx.notify_transition(strategy, next, index, Some(&value));
                    next
                }
            };
            set_element(cx, next, state, index, value)
        }
        ArrayLayout::ConstantPacked(_) | ArrayLayout::Lazy => {
            let next = strategy.writable(cx, state, index)?;
            set_element(cx, next, state, index, value)
        }
        ArrayLayout::Sparse => {
            sparse::set_element(cx, state, index, value);
            Ok(strategy)
        }
        ArrayLayout::ZeroBased(kind) | ArrayLayout::Contiguous(kind) | ArrayLayout::Holes(kind) => {
            set_dense_element(cx, strategy, kind, state, index, value)
        }
    }
}

fn set_dense_element(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    kind: ElementKind,
    state: &mut ArrayState,
    index: u64,
    value: Value,
) -> ElementsResult<ArrayStrategy> {
    if !kind.can_store(&value) {
        let wider = kind.join(ElementKind::of(&value));
        let next = widen(strategy, state, wider)?;
        cx.notify_transition(strategy, next, index, Some(&value));
        return set_dense_element(cx, next, wider, state, index, value);
    }

    if let Some(slot) = state.window_slot(index) {
        let Some(buffer) = state.dense_mut() else {
            return Ok(strategy);
        };
        let filled_hole = buffer.is_hole(slot);
        buffer.set(slot, &value)?;
        if filled_hole {
            holes::apply_delta(state, -1)?;
            cx.notify_write(WriteMode::InBounds, index, &value);
            return Ok(strategy.settle(cx, state, kind, index, Some(&value)));
        }
        cx.notify_write(WriteMode::InBoundsFast, index, &value);
        return Ok(strategy);
    }

    let logical = index as i64;
    let current_capacity = state.capacity();
    match classify(cx, state, logical) {
        Placement::Sparse => {
            let next = sparse::degrade(cx, strategy, state, index, Some(&value));
            sparse::set_element(cx, state, index, value);
            return Ok(next);
        }
        Placement::Anchor => {
            let slot = logical - state.index_offset;
            if slot >= 0 && (slot as usize) < current_capacity {
                state.array_offset = slot as u32;
            } else if (logical as usize) < current_capacity {
                state.index_offset = 0;
                state.array_offset = logical as u32;
            } else {
                state.index_offset = logical;
                state.array_offset = 0;
                capacity::grow_right(cx, state, 1)?;
            }
            state.used_length = 1;
            state.hole_count = 0;
        }
        Placement::Append { gap } => {
            let slot = (logical - state.index_offset) as usize;
            capacity::grow_right(cx, state, slot + 1)?;
            state.used_length = (logical + 1 - state.window_start()) as u32;
            holes::apply_delta(state, gap as i64)?;
        }
        Placement::Prepend { gap } => {
            let end = state.window_end();
            let slot = logical - state.index_offset;
            if slot < 0 {
                capacity::grow_left(cx, state, slot.unsigned_abs() as usize)?;
            }
            state.array_offset = (logical - state.index_offset) as u32;
            state.used_length = (end - logical) as u32;
            holes::apply_delta(state, gap as i64)?;
        }
    }

    let slot = (logical - state.index_offset) as usize;
    if let Some(buffer) = state.dense_mut() {
        buffer.set(slot, &value)?;
    }
    let mode = if state.capacity() > current_capacity {
        WriteMode::Supported
    } else {
        WriteMode::InBounds
    };
    cx.notify_write(mode, index, &value);
    state.length = state.length.max(index + 1);
    Ok(strategy.settle(cx, state, kind, index, Some(&value)))
}

/// Converts the dense buffer to a wider element kind.
fn widen(
    strategy: ArrayStrategy,
    state: &mut ArrayState,
    kind: ElementKind,
) -> ElementsResult<ArrayStrategy> {
    if let Some(buffer) = state.take_dense() {
        state.backing_store = BackingStore::Dense(buffer.widened(kind)?);
    }
    let layout = match strategy.layout() {
        ArrayLayout::ZeroBased(_) => ArrayLayout::ZeroBased(kind),
        ArrayLayout::Contiguous(_) => ArrayLayout::Contiguous(kind),
        _ => ArrayLayout::Holes(kind),
    };
    Ok(strategy.with_layout(layout))
}
