//! crates/dashboard_core/src/ports.rs
//!
//! Defines the collaborator contracts (traits) consumed by the slices.
//! These traits form the boundary of the hexagonal architecture: the store
//! only ever sees the `PortResult` envelope, never transport details such as
//! status codes or headers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Fact, FactId, Folder, FolderId, FolderListing, FolderUpdate, HackerNewsArticle, LightData,
    NewsDataPage, Note, NoteId, NoteUpdate, SensorReading, UserId,
};
use crate::persist::Snapshot;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// A bounded sub-operation exceeded its time budget.
    #[error("Operation timed out: {0}")]
    Timeout(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl PortError {
    /// The description carried by the failure envelope, if any.
    pub fn message(&self) -> Option<&str> {
        let message = match self {
            PortError::NotFound(m)
            | PortError::Unexpected(m)
            | PortError::Timeout(m)
            | PortError::InvalidData(m) => m.as_str(),
            PortError::Unauthorized => "Unauthorized",
        };
        if message.trim().is_empty() {
            None
        } else {
            Some(message)
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AirQualityService: Send + Sync {
    /// Returns the most recent sensor concentrations.
    async fn latest_reading(&self) -> PortResult<SensorReading>;
}

#[async_trait]
pub trait FactService: Send + Sync {
    /// Returns up to `limit` fact ids starting at `offset`.
    async fn fact_id_page(&self, offset: usize, limit: usize) -> PortResult<Vec<FactId>>;

    async fn get_fact(&self, id: &FactId) -> PortResult<Fact>;
}

#[async_trait]
pub trait LightService: Send + Sync {
    /// Retrieves the current power-outage schedule. Implementations may retry
    /// internally; the slice treats the call as a single attempt.
    async fn fetch_schedule(&self) -> PortResult<LightData>;
}

#[async_trait]
pub trait NewsService: Send + Sync {
    /// Fetches NewsData.io articles starting at the given cursor.
    async fn news_data_page(&self, next_page: Option<&str>) -> PortResult<NewsDataPage>;

    async fn hacker_news(&self, limit: usize) -> PortResult<Vec<HackerNewsArticle>>;
}

#[async_trait]
pub trait NotesService: Send + Sync {
    // --- Folders ---
    async fn list_folders(&self, user_id: &UserId) -> PortResult<FolderListing>;

    async fn create_folder(&self, user_id: &UserId) -> PortResult<Folder>;

    async fn update_folder(
        &self,
        folder_id: &FolderId,
        user_id: &UserId,
        update: &FolderUpdate,
    ) -> PortResult<Folder>;

    async fn delete_folder(&self, folder_id: &FolderId, user_id: &UserId) -> PortResult<()>;

    // --- Notes ---
    // Every note call is scoped to `user_id`; rows owned by anyone else are
    // reported as `NotFound`.
    async fn list_folder_notes(&self, folder_id: &FolderId, user_id: &UserId)
        -> PortResult<Vec<Note>>;

    async fn get_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<Note>;

    async fn create_note(&self, folder_id: &FolderId, user_id: &UserId) -> PortResult<Note>;

    async fn update_note(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        update: &NoteUpdate,
    ) -> PortResult<Note>;

    /// Fails with `NotFound` unless both the note and the target folder
    /// belong to `user_id`.
    async fn move_note(
        &self,
        note_id: &NoteId,
        folder_id: &FolderId,
        user_id: &UserId,
    ) -> PortResult<Note>;

    async fn delete_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<()>;

    async fn set_note_favorite(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        favorite: bool,
    ) -> PortResult<Note>;

    // --- Encryption ---
    async fn encrypt_note(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        content: &str,
        title: Option<&str>,
    ) -> PortResult<Note>;

    /// Returns the decrypted content without changing the stored note.
    async fn decrypt_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<String>;

    /// Stores the note decrypted and returns it.
    async fn decrypt_note_in_store(&self, note_id: &NoteId, user_id: &UserId)
        -> PortResult<Note>;
}

/// Persists and restores the store snapshot. Synchronous so that restoration
/// is complete before anything reads the store.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> PortResult<Option<Snapshot>>;

    fn save(&self, snapshot: &Snapshot) -> PortResult<()>;
}

/// Source of "now" for timestamps and staleness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
