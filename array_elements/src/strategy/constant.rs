// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use crate::{
    capacity,
    context::ArrayContext,
    error::{ElementsError, ElementsResult},
    state::{ArrayState, BackingStore},
    value::ElementKind,
};

use super::{ArrayLayout, ArrayStrategy};

/// Gives a storage-less array its first dense buffer.
pub(crate) fn allocate_empty(
    cx: &ArrayContext,
    strategy: ArrayStrategy,
    state: &mut ArrayState,
    kind: ElementKind,
) -> ArrayStrategy {
    let buffer = capacity::allocate(cx, state, kind);
    state.reset_layout(BackingStore::Dense(buffer));
    strategy.with_layout(ArrayLayout::ZeroBased(kind))
}

/// Copies a shared literal buffer into storage owned by this array.
pub(crate) fn unshare(
    strategy: ArrayStrategy,
    state: &mut ArrayState,
) -> ElementsResult<ArrayStrategy> {
    let buffer = match core::mem::take(&mut state.backing_store) {
        BackingStore::Constant(buffer) => buffer,
        other => {
            state.backing_store = other;
            return Err(ElementsError::InvariantViolation(
                "constant layout without a constant buffer".into(),
            ));
        }
    };
    let buffer = Rc::unwrap_or_clone(buffer);
    let kind = buffer.kind();
    state.backing_store = BackingStore::Dense(buffer);
    Ok(strategy.with_layout(ArrayLayout::ZeroBased(kind)))
}
