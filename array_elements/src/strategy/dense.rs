// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reads and shrinking operations shared by every buffer-backed layout.

use core::ops::Range;

use crate::{
    context::ArrayContext,
    error::ElementsResult,
    holes,
    state::ArrayState,
    value::{ElementKind, Value},
};

use super::ArrayStrategy;

#[inline]
fn index_of(state: &ArrayState, slot: usize) -> u64 {
    (state.index_offset + slot as i64) as u64
}

#[inline]
pub(crate) fn has_element(state: &ArrayState, index: u64) -> bool {
    match (state.elements(), state.window_slot(index)) {
        (Some(buffer), Some(slot)) => !buffer.is_hole(slot),
        _ => false,
    }
}

#[inline]
pub(crate) fn get_element(state: &ArrayState, index: u64) -> Option<Value> {
    let slot = state.window_slot(index)?;
    state.elements()?.get(slot)
}

/// Smallest occupied index at or above `from`.
pub(crate) fn next_index_from(state: &ArrayState, from: u64) -> Option<u64> {
    let buffer = state.elements()?;
    let window = state.window_slots();
    let from = i64::try_from(from).ok()?;
    let first = (from - state.index_offset).max(window.start as i64);
    if first >= window.end as i64 {
        return None;
    }
    (first as usize..window.end)
        .find(|&slot| !buffer.is_hole(slot))
        .map(|slot| index_of(state, slot))
}

/// Largest occupied index at or below `from`.
pub(crate) fn previous_index_from(state: &ArrayState, from: u64) -> Option<u64> {
    let buffer = state.elements()?;
    let window = state.window_slots();
    let from = i64::try_from(from).unwrap_or(i64::MAX);
    let last = from
        .saturating_sub(state.index_offset)
        .min(window.end as i64 - 1);
    if last < window.start as i64 {
        return None;
    }
    (window.start..=last as usize)
        .rev()
        .find(|&slot| !buffer.is_hole(slot))
        .map(|slot| index_of(state, slot))
}

pub(crate) fn last_element_index(state: &ArrayState) -> Option<u64> {
    previous_index_from(state, u64::MAX)
}

pub(crate) fn own_index_keys(state: &ArrayState) -> Vec<u64> {
    let Some(buffer) = state.elements() else {
        return Vec::new();
    };
    state
        .window_slots()
        .filter(|&slot| !buffer.is_hole(slot))
        .map(|slot| index_of(state, slot))
        .collect()
}

/// Resets `slots` to holes and drops the holes among them from the hole
/// count. The caller shrinks the window over them.
pub(crate) fn clear_slots(state: &mut ArrayState, slots: Range<usize>) -> ElementsResult<()> {
    if slots.is_empty() {
        return Ok(());
    }
    let Some(buffer) = state.dense_mut() else {
        return Ok(());
    };
    let cleared_holes = buffer.count_holes(slots.clone());
    buffer.fill_holes(slots);
    holes::apply_delta(state, -(cleared_holes as i64))
}

pub(crate) fn delete_element(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    kind: ElementKind,
    state: &mut ArrayState,
    index: u64,
) -> ElementsResult<ArrayStrategy> {
    let Some(slot) = state.window_slot(index) else {
        return Ok(strategy);
    };
    let Some(buffer) = state.dense_mut() else {
        return Ok(strategy);
    };
    if buffer.is_hole(slot) {
        return Ok(strategy);
    }
    buffer.set_hole(slot);
    holes::apply_delta(state, 1)?;
    // Deleting an edge element shrinks the window past any holes behind it.
    holes::trim_window(state);
    Ok(strategy.settle(cx, state, kind, index, None))
}

pub(crate) fn set_length(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    kind: ElementKind,
    state: &mut ArrayState,
    length: u64,
) -> ElementsResult<ArrayStrategy> {
    let target = i64::try_from(length).unwrap_or(i64::MAX);
    if target < state.window_end() {
        let window = state.window_slots();
        let keep = (target - state.window_start()).max(0) as usize;
        clear_slots(state, window.start + keep..window.end)?;
        state.used_length = keep as u32;
        holes::trim_window(state);
    }
    state.length = length;
    Ok(strategy.settle(cx, state, kind, length, None))
}
