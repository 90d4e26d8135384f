//! crates/dashboard_core/src/slices/mod.rs
//!
//! Feature slices. Each slice owns one partition of [`DashboardState`] and
//! exposes its actions through a short-lived handle borrowed from the store,
//! e.g. `store.air_quality().fetch().await`.
//!
//! Fetch actions share one shape: an in-flight guard checked and set in a
//! single synchronous store update, exactly one collaborator call, then either
//! a state merge or an error flag. Failures never cross the action boundary as
//! anything other than a [`FetchOutcome`] or an [`ActionResult`].
//!
//! [`DashboardState`]: crate::store::DashboardState

pub mod air_quality;
pub mod facts;
pub mod layout;
pub mod light;
pub mod news;
pub mod notes;
pub mod player;

pub use air_quality::{AirQualitySlice, AirQualityState};
pub use facts::{FactsSlice, FactsState, FACT_PAGE_SIZE};
pub use layout::{LayoutSlice, LayoutState};
pub use light::{LightSlice, LightState};
pub use news::{NewsSlice, NewsState};
pub use notes::{NotesSlice, NotesState};
pub use player::{PlayerError, PlayerSlice, PlayerState, DEFAULT_VOLUME};

use crate::ports::PortError;

/// Result of a cache-filling fetch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The collaborator answered and the cache was updated.
    Fetched,
    /// The same action was already in flight; nothing was done.
    Skipped,
    /// The call failed or was rejected; the slice's error flag is set.
    Failed,
}

impl FetchOutcome {
    /// `Fetched` and `Skipped` both count as success for the caller.
    pub fn succeeded(self) -> bool {
        !matches!(self, FetchOutcome::Failed)
    }
}

/// Failure of a note or folder mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// A required identifier or payload was missing; no call was made.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Port(#[from] PortError),
}

impl ActionError {
    pub(crate) fn validation(message: &str) -> Self {
        ActionError::Validation(message.to_string())
    }

    /// Text for a transient notification, falling back to `fallback` when the
    /// collaborator did not describe the failure.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ActionError::Validation(message) => message.clone(),
            ActionError::Port(e) => e.message().unwrap_or(fallback).to_string(),
        }
    }
}

pub type ActionResult<T> = Result<T, ActionError>;
