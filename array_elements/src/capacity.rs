// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Growth arithmetic shared by all dense layouts.

use crate::{
    buffer::ElementBuffer,
    context::ArrayContext,
    error::{ElementsError, ElementsResult},
    options::Options,
    state::{ArrayState, BackingStore},
    value::ElementKind,
};

#[cold]
fn capacity_overflow(requested: usize, options: &Options) -> ElementsError {
    ElementsError::OutOfMemory {
        requested: requested as u64,
        limit: options.max_array_size as u64,
    }
}

/// Capacity to grow a buffer of `current` slots to so that it holds at least
/// `minimum` slots.
///
/// Growth is by half the current capacity at a time, never below the initial
/// array size, and clamped to the soft maximum array size.
pub fn next_capacity(current: usize, minimum: usize, options: &Options) -> ElementsResult<usize> {
    let limit = options.max_array_size as usize;
    if minimum > limit {
        return Err(capacity_overflow(minimum, options));
    }
    let cap = current.saturating_add(current / 2);
    let cap = cap.max(minimum).max(options.initial_array_size as usize);
    Ok(cap.min(limit))
}

/// Smallest power of two holding `minimum` slots, never below the initial
/// array size.
pub fn next_power_capacity(minimum: usize, options: &Options) -> ElementsResult<usize> {
    let limit = options.max_array_size as usize;
    if minimum > limit {
        return Err(capacity_overflow(minimum, options));
    }
    let cap = minimum
        .checked_next_power_of_two()
        .unwrap_or(limit)
        .max(options.initial_array_size as usize);
    Ok(cap.min(limit))
}

/// Capacity of the first dense buffer of an array that currently has no
/// backing store.
///
/// A preallocated length is honored up to the flat array size; anything
/// larger starts from the initial size instead so that one huge length does
/// not allocate eagerly.
pub fn initial_capacity(length: u64, options: &Options) -> usize {
    if length == 0 || length > options.max_flat_array_size as u64 {
        options.initial_array_size as usize
    } else {
        length as usize
    }
}

/// Makes sure the dense buffer has at least `minimum` slots, keeping every
/// slot at its position.
pub(crate) fn grow_right(
    cx: &ArrayContext,
    state: &mut ArrayState,
    minimum: usize,
) -> ElementsResult<()> {
    let current = state.capacity();
    if current >= minimum {
        return Ok(());
    }
    let capacity = next_capacity(current, minimum, &cx.options)?;
    let window = state.window_slots();
    let start = window.start;
    let Some(buffer) = state.take_dense() else {
        return Err(ElementsError::UnsupportedOperation("grow without a dense backing store"));
    };
    tracing::debug!(current, capacity, "growing array backing store");
    state.backing_store = BackingStore::Dense(buffer.relocated(capacity, window, start));
    Ok(())
}

/// Makes room for at least `additional` slots before slot 0 of the dense
/// buffer. The new slack is placed on the left as far as the index offset
/// allows, so the buffer never maps a slot below logical index 0.
pub(crate) fn grow_left(
    cx: &ArrayContext,
    state: &mut ArrayState,
    additional: usize,
) -> ElementsResult<()> {
    let current = state.capacity();
    let minimum = current
        .checked_add(additional)
        .ok_or_else(|| capacity_overflow(usize::MAX, &cx.options))?;
    let capacity = next_capacity(current, minimum, &cx.options)?;
    let extra = capacity - current;
    let room = usize::try_from(state.index_offset.max(0)).unwrap_or(usize::MAX);
    let shift = additional.max(extra.min(room));
    let window = state.window_slots();
    let dest = window.start + shift;
    let Some(buffer) = state.take_dense() else {
        return Err(ElementsError::UnsupportedOperation("grow without a dense backing store"));
    };
    tracing::debug!(current, capacity, shift, "growing array backing store to the left");
    state.backing_store = BackingStore::Dense(buffer.relocated(capacity, window, dest));
    state.array_offset += shift as u32;
    state.index_offset -= shift as i64;
    Ok(())
}

/// Fresh buffer for an array migrating out of a storage-less layout.
pub(crate) fn allocate(cx: &ArrayContext, state: &ArrayState, kind: ElementKind) -> ElementBuffer {
    ElementBuffer::with_capacity(kind, initial_capacity(state.length, &cx.options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_amortized() {
        let options = Options::default();
        assert_eq!(next_capacity(0, 1, &options).unwrap(), 8);
        assert_eq!(next_capacity(8, 9, &options).unwrap(), 12);
        assert_eq!(next_capacity(100, 101, &options).unwrap(), 150);
        assert_eq!(next_capacity(100, 400, &options).unwrap(), 400);
    }

    #[test]
    fn growth_is_clamped() {
        let options = Options {
            max_array_size: 100,
            ..Default::default()
        };
        assert_eq!(next_capacity(90, 91, &options).unwrap(), 100);
        assert_eq!(
            next_capacity(90, 101, &options),
            Err(ElementsError::OutOfMemory {
                requested: 101,
                limit: 100
            })
        );
        assert!(next_power_capacity(101, &options).is_err());
        assert_eq!(next_power_capacity(70, &options).unwrap(), 100);
    }

    #[test]
    fn power_of_two_capacity() {
        let options = Options::default();
        assert_eq!(next_power_capacity(3, &options).unwrap(), 8);
        assert_eq!(next_power_capacity(17, &options).unwrap(), 32);
        assert_eq!(next_power_capacity(64, &options).unwrap(), 64);
    }

    #[test]
    fn initial_capacity_bounds_preallocation() {
        let options = Options::default();
        assert_eq!(initial_capacity(0, &options), 8);
        assert_eq!(initial_capacity(100, &options), 100);
        assert_eq!(initial_capacity(1_000_000, &options), 1_000_000);
        assert_eq!(initial_capacity(1_000_001, &options), 8);
    }
}
