// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered-map storage for arrays too sparse or too large for a buffer.
//!
//! A missing key is an absent element, so this layout has no notion of
//! holes. Arrays never leave it.

use std::collections::BTreeMap;

use crate::{
    context::ArrayContext,
    hooks::WriteMode,
    state::{ArrayState, BackingStore},
    value::Value,
};

use super::{ArrayLayout, ArrayStrategy};

#[inline]
fn map(state: &ArrayState) -> Option<&BTreeMap<u64, Value>> {
    match &state.backing_store {
        BackingStore::Sparse(map) => Some(map),
        _ => None,
    }
}

#[inline]
fn map_mut(state: &mut ArrayState) -> Option<&mut BTreeMap<u64, Value>> {
    match &mut state.backing_store {
        BackingStore::Sparse(map) => Some(map),
        _ => None,
    }
}

pub(crate) fn count(state: &ArrayState) -> usize {
    map(state).map_or(0, BTreeMap::len)
}

pub(crate) fn has_element(state: &ArrayState, index: u64) -> bool {
    map(state).is_some_and(|map| map.contains_key(&index))
}

pub(crate) fn get_element(state: &ArrayState, index: u64) -> Option<Value> {
    map(state)?.get(&index).cloned()
}

pub(crate) fn next_index_from(state: &ArrayState, from: u64) -> Option<u64> {
    map(state)?.range(from..).next().map(|(&index, _)| index)
}

pub(crate) fn previous_index_from(state: &ArrayState, from: u64) -> Option<u64> {
    map(state)?.range(..=from).next_back().map(|(&index, _)| index)
}

pub(crate) fn last_element_index(state: &ArrayState) -> Option<u64> {
    map(state)?.last_key_value().map(|(&index, _)| index)
}

pub(crate) fn own_index_keys(state: &ArrayState) -> Vec<u64> {
    map(state).map_or_else(Vec::new, |map| map.keys().copied().collect())
}

pub(crate) fn set_element(cx: &ArrayContext, state: &mut ArrayState, index: u64, value: Value) {
    cx.notify_write(WriteMode::Sparse, index, &value);
    if let Some(map) = map_mut(state) {
        map.insert(index, value);
    }
    state.length = state.length.max(index + 1);
}

pub(crate) fn delete_element(state: &mut ArrayState, index: u64) {
    if let Some(map) = map_mut(state) {
        map.remove(&index);
    }
}

pub(crate) fn set_length(state: &mut ArrayState, length: u64) {
    if let Some(map) = map_mut(state) {
        drop(map.split_off(&length));
    }
    state.length = length;
}

pub(crate) fn insert_range(state: &mut ArrayState, offset: u64, size: u64) {
    if let Some(map) = map_mut(state) {
        let tail = map.split_off(&offset);
        map.extend(tail.into_iter().map(|(index, value)| (index + size, value)));
    }
    state.length += size;
}

pub(crate) fn remove_range(state: &mut ArrayState, start: u64, end: u64) {
    let removed = end - start;
    if let Some(map) = map_mut(state) {
        let mut tail = map.split_off(&start);
        let rest = tail.split_off(&end);
        map.extend(rest.into_iter().map(|(index, value)| (index - removed, value)));
    }
    state.length -= removed;
}

/// Moves every element of a buffer-backed or storage-less array into a
/// sparse map.
pub(crate) fn degrade(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    state: &mut ArrayState,
    index: u64,
    value: Option<&Value>,
) -> ArrayStrategy {
    let map: BTreeMap<u64, Value> = match state.elements() {
        Some(buffer) => buffer
            .iter_window(state.window_slots())
            .map(|(slot, value)| ((state.index_offset + slot as i64) as u64, value))
            .collect(),
        None => BTreeMap::new(),
    };
    tracing::debug!(
        elements = map.len(),
        length = state.length,
        index,
        "array degraded to sparse storage"
    );
    state.reset_layout(BackingStore::Sparse(map));
    let next = strategy.with_layout(ArrayLayout::Sparse);
    cx.notify_transition(strategy, next, index, value);
    next
}
