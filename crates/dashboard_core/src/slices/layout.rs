//! crates/dashboard_core/src/slices/layout.rs

use serde::{Deserialize, Serialize};

use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutState {
    pub is_extra_column: bool,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            is_extra_column: true,
        }
    }
}

pub struct LayoutSlice<'a> {
    store: &'a Store,
}

impl<'a> LayoutSlice<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn toggle_extra_column(&self) {
        self.store
            .update(|s| s.layout.is_extra_column = !s.layout.is_extra_column);
    }
}
