// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hole count bookkeeping for dense layouts.
//!
//! `hole_count` caches the number of hole slots inside the occupied window.
//! Mutations keep it current with signed deltas; [`verify`] re-derives it.

use crate::{
    error::{ElementsError, ElementsResult},
    state::ArrayState,
};

/// Counts the hole slots of the occupied window.
pub(crate) fn count(state: &ArrayState) -> u32 {
    state
        .elements()
        .map_or(0, |buffer| buffer.count_holes(state.window_slots()))
}

pub(crate) fn apply_delta(state: &mut ArrayState, delta: i64) -> ElementsResult<()> {
    let count = u32::try_from(state.hole_count as i64 + delta).map_err(|_| {
        ElementsError::InvariantViolation(format!(
            "hole count {} cannot change by {delta}",
            state.hole_count
        ))
    })?;
    state.hole_count = count;
    Ok(())
}

pub(crate) fn verify(state: &ArrayState) -> ElementsResult<()> {
    let actual = count(state);
    if actual != state.hole_count {
        return Err(ElementsError::InvariantViolation(format!(
            "hole count is {} but the occupied window holds {actual} holes",
            state.hole_count
        )));
    }
    Ok(())
}

/// Shrinks the occupied window inward until both of its edge slots hold
/// elements, or the window is empty.
pub(crate) fn trim_window(state: &mut ArrayState) {
    let Some(buffer) = state.elements() else {
        return;
    };
    let window = state.window_slots();
    let mut start = window.start;
    let mut end = window.end;
    while start < end && buffer.is_hole(start) {
        start += 1;
    }
    while end > start && buffer.is_hole(end - 1) {
        end -= 1;
    }
    let trimmed = (window.len() - (end - start)) as u32;
    if trimmed == 0 {
        return;
    }
    state.array_offset = start as u32;
    state.used_length = (end - start) as u32;
    state.hole_count = if start == end {
        0
    } else {
        state.hole_count.saturating_sub(trimmed)
    };
}
