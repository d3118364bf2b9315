// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Insertion and removal of index ranges, as needed by `splice`, `shift`
//! and `unshift`.
//!
//! Edits in front of the occupied window only move the index offset. Edits
//! that split the window move the elements behind the split point.

use crate::{
    capacity,
    context::ArrayContext,
    error::{ElementsError, ElementsResult},
    holes,
    state::{ArrayState, BackingStore},
    strategy::{ArrayLayout, ArrayStrategy, dense, sparse},
    value::ElementKind,
};

#[inline]
fn dense_kind(strategy: ArrayStrategy) -> Option<ElementKind> {
    strategy.element_kind().filter(|_| strategy.layout().is_dense())
}

fn splits_window(state: &ArrayState, index: u64) -> bool {
    let index = index as i64;
    state.used_length > 0 && index > state.window_start() && index < state.window_end()
}

pub(crate) fn insert_range(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    state: &mut ArrayState,
    offset: u64,
    size: u64,
) -> ElementsResult<ArrayStrategy> {
    let buffered = !matches!(
        strategy.layout(),
        ArrayLayout::ConstantEmpty | ArrayLayout::Sparse
    );
    let split = buffered && splits_window(state, offset);
    let to_sparse = split && size > cx.options.max_array_hole_size as u64;
    if split && !to_sparse {
        let slots = state.capacity().max(state.window_slots().end) as u64 + size;
        if slots > cx.options.max_array_size as u64 {
            return Err(ElementsError::OutOfMemory {
                requested: slots,
                limit: cx.options.max_array_size as u64,
            });
        }
    }

    let strategy = strategy.writable(cx, state, offset)?;
    let Some(kind) = dense_kind(strategy) else {
        if strategy.layout() == ArrayLayout::Sparse {
            sparse::insert_range(state, offset, size);
        } else {
            state.length += size;
        }
        return Ok(strategy);
    };
    if to_sparse {
        let next = sparse::degrade(cx, strategy, state, offset, None);
        sparse::insert_range(state, offset, size);
        return Ok(next);
    }

    let offset_index = offset as i64;
    if state.used_length == 0 || offset_index >= state.window_end() {
        state.length += size;
        return Ok(strategy);
    }
    if offset_index <= state.window_start() {
        state.index_offset += size as i64;
        state.length += size;
        return Ok(strategy.settle(cx, state, kind, offset, None));
    }

    let window = state.window_slots();
    let at = window.start + (offset_index - state.window_start()) as usize;
    let gap = size as usize;
    let current = state.capacity();
    if window.end + gap > current {
        let grown = capacity::next_power_capacity(current + gap, &cx.options)?;
        if let Some(buffer) = state.take_dense() {
            tracing::debug!(current, capacity = grown, "growing array backing store for insertion");
            state.backing_store =
                BackingStore::Dense(buffer.relocated(grown, window.clone(), window.start));
        }
    }
    if let Some(buffer) = state.dense_mut() {
        buffer.copy_within(at..window.end, at + gap);
        buffer.fill_holes(at..at + gap);
    }
    state.used_length += size as u32;
    holes::apply_delta(state, size as i64)?;
    state.length += size;
    Ok(strategy.settle(cx, state, kind, offset, None))
}

pub(crate) fn remove_range(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    state: &mut ArrayState,
    start: u64,
    end: u64,
) -> ElementsResult<ArrayStrategy> {
    let strategy = strategy.writable(cx, state, start)?;
    let removed = end - start;
    let Some(kind) = dense_kind(strategy) else {
        if strategy.layout() == ArrayLayout::Sparse {
            sparse::remove_range(state, start, end);
        } else {
            state.length -= removed;
        }
        return Ok(strategy);
    };

    let (start_index, end_index) = (start as i64, end as i64);
    let window_start = state.window_start();
    let window_end = state.window_end();
    if state.used_length == 0 || start_index >= window_end {
        state.length -= removed;
        return Ok(strategy);
    }
    if end_index <= window_start {
        state.index_offset -= removed as i64;
    } else if start_index <= window_start {
        let cut = (end_index.min(window_end) - window_start) as usize;
        drop_window_prefix(state, cut, start_index)?;
    } else {
        let window = state.window_slots();
        let at = window.start + (start_index - window_start) as usize;
        let cut = (end_index.min(window_end) - start_index) as usize;
        let Some(buffer) = state.dense_mut() else {
            return Ok(strategy);
        };
        let cut_holes = buffer.count_holes(at..at + cut);
        buffer.copy_within(at + cut..window.end, at);
        buffer.fill_holes(window.end - cut..window.end);
        state.used_length -= cut as u32;
        holes::apply_delta(state, -(cut_holes as i64))?;
        holes::trim_window(state);
    }
    state.length -= removed;
    Ok(strategy.settle(cx, state, kind, start, None))
}

pub(crate) fn shift_range(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    state: &mut ArrayState,
    from: u64,
) -> ElementsResult<ArrayStrategy> {
    let kind = match strategy.layout() {
        ArrayLayout::ZeroBased(kind) | ArrayLayout::Contiguous(kind) => kind,
        _ => return remove_range(cx, strategy, state, 0, from),
    };
    let from_index = from as i64;
    if state.used_length > 0 {
        let window_start = state.window_start();
        if from_index <= window_start {
            state.index_offset -= from_index;
        } else {
            let cut = (from_index.min(state.window_end()) - window_start) as usize;
            drop_window_prefix(state, cut, 0)?;
        }
    }
    state.length -= from;
    Ok(strategy.settle(cx, state, kind, 0, None))
}

/// Drops the first `cut` slots of the window without moving any element,
/// and re-anchors what is left at logical index `first_index`.
fn drop_window_prefix(state: &mut ArrayState, cut: usize, first_index: i64) -> ElementsResult<()> {
    let window = state.window_slots();
    dense::clear_slots(state, window.start..window.start + cut)?;
    state.array_offset += cut as u32;
    state.used_length -= cut as u32;
    state.index_offset = first_index - state.array_offset as i64;
    holes::trim_window(state);
    Ok(())
}
