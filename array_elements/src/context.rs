// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    rc::Rc,
};

use crate::{
    hooks::{ArrayHooks, DefaultArrayHooks, WriteMode},
    options::Options,
    strategy::ArrayStrategy,
    value::Value,
};

/// Shared configuration passed to every mutating element operation.
#[derive(Debug, Clone)]
pub struct ArrayContext {
    pub options: Options,
    hooks: Rc<dyn ArrayHooks>,
}

impl Default for ArrayContext {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl ArrayContext {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            hooks: Rc::new(DefaultArrayHooks),
        }
    }

    pub fn with_hooks(options: Options, hooks: Rc<dyn ArrayHooks>) -> Self {
        Self { options, hooks }
    }

    pub fn hooks(&self) -> &dyn ArrayHooks {
        self.hooks.as_ref()
    }

    pub(crate) fn notify_transition(
        &self,
        old: ArrayStrategy,
        new: ArrayStrategy,
        index: u64,
        value: Option<&Value>,
    ) {
        if !self.options.trace_array_transitions || old == new {
            return;
        }
        let result = catch_unwind(AssertUnwindSafe(|| {
            self.hooks().on_transition(old, new, index, value)
        }));
        if result.is_err() {
            tracing::warn!(?old, ?new, index, "array transition hook panicked");
        }
    }

    pub(crate) fn notify_write(&self, mode: WriteMode, index: u64, value: &Value) {
        if !self.options.trace_array_writes {
            return;
        }
        let result = catch_unwind(AssertUnwindSafe(|| self.hooks().on_write(mode, index, value)));
        if result.is_err() {
            tracing::warn!(?mode, index, "array write hook panicked");
        }
    }
}
