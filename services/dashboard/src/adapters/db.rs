//! services/dashboard/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `FactService` and `NotesService` ports from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashboard_core::domain::{
    Fact, FactId, Folder, FolderColor, FolderId, FolderListing, FolderUpdate, Note, NoteId,
    NoteUpdate, UserId,
};
use dashboard_core::ports::{FactService, NotesService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::adapters::cipher::NoteCipher;

pub const DEFAULT_FOLDER_TITLE: &str = "New folder";
pub const DEFAULT_NOTE_TITLE: &str = "Untitled";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `FactService` and `NotesService` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    cipher: NoteCipher,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool, cipher: NoteCipher) -> Self {
        Self { pool, cipher }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn note_record(&self, id: Uuid, user_id: &UserId) -> PortResult<NoteRecord> {
        sqlx::query_as::<_, NoteRecord>(
            "SELECT id, folder_id, title, content, tags, encrypted, favorite, updated_at
             FROM notes WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Note", id))
    }

    /// Key derivation is CPU-bound, so it runs on the blocking pool.
    async fn seal(&self, plaintext: String) -> PortResult<String> {
        let cipher = self.cipher.clone();
        tokio::task::spawn_blocking(move || cipher.encrypt(&plaintext))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn open(&self, envelope: String) -> PortResult<String> {
        let cipher = self.cipher.clone();
        tokio::task::spawn_blocking(move || cipher.decrypt(&envelope))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .map_err(|e| PortError::InvalidData(e.to_string()))
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct FactRecord {
    id: Uuid,
    category: String,
    title: String,
}
impl FactRecord {
    fn to_domain(self) -> Fact {
        Fact {
            id: FactId::new(self.id.to_string()),
            category: self.category,
            title: self.title,
        }
    }
}

#[derive(FromRow)]
struct FolderRecord {
    id: Uuid,
    title: String,
    color: String,
    tags: Vec<String>,
    updated_at: DateTime<Utc>,
}
impl FolderRecord {
    fn to_domain(self) -> Folder {
        Folder {
            id: FolderId::new(self.id.to_string()),
            title: self.title,
            color: FolderColor::parse(&self.color).unwrap_or_default(),
            tags: self.tags,
            timestamp: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    folder_id: Uuid,
    title: String,
    content: String,
    tags: Vec<String>,
    encrypted: bool,
    favorite: bool,
    updated_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: NoteId::new(self.id.to_string()),
            title: self.title,
            content: self.content,
            folder_id: FolderId::new(self.folder_id.to_string()),
            tags: self.tags,
            timestamp: self.updated_at,
            encrypted: self.encrypted,
            favorite: self.favorite,
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Ids are UUIDs in the database; anything else cannot name a stored row.
fn parse_id(kind: &str, id: &str) -> PortResult<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| PortError::NotFound(format!("{} {} not found", kind, id)))
}

fn not_found_or_unexpected(e: sqlx::Error, kind: &str, id: Uuid) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} {} not found", kind, id)),
        other => PortError::Unexpected(other.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl FactService for DbAdapter {
    async fn fact_id_page(&self, offset: usize, limit: usize) -> PortResult<Vec<FactId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM facts ORDER BY created_at ASC, id ASC OFFSET $1 LIMIT $2",
        )
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(ids.into_iter().map(|id| FactId::new(id.to_string())).collect())
    }

    async fn get_fact(&self, id: &FactId) -> PortResult<Fact> {
        let id = parse_id("Fact", id.as_str())?;
        let record = sqlx::query_as::<_, FactRecord>(
            "SELECT id, category, title FROM facts WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Fact", id))?;
        Ok(record.to_domain())
    }
}

#[async_trait]
impl NotesService for DbAdapter {
    async fn list_folders(&self, user_id: &UserId) -> PortResult<FolderListing> {
        let folders = sqlx::query_as::<_, FolderRecord>(
            "SELECT id, title, color, tags, updated_at FROM folders
             WHERE user_id = $1 ORDER BY lower(title) ASC, id ASC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let favorite_notes = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, folder_id, title, content, tags, encrypted, favorite, updated_at
             FROM notes WHERE user_id = $1 AND favorite ORDER BY title ASC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(FolderListing {
            folders: folders.into_iter().map(|r| r.to_domain()).collect(),
            favorite_notes: favorite_notes.into_iter().map(|r| r.to_domain()).collect(),
        })
    }

    async fn create_folder(&self, user_id: &UserId) -> PortResult<Folder> {
        let record = sqlx::query_as::<_, FolderRecord>(
            "INSERT INTO folders (id, user_id, title) VALUES ($1, $2, $3)
             RETURNING id, title, color, tags, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id.as_str())
        .bind(DEFAULT_FOLDER_TITLE)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn update_folder(
        &self,
        folder_id: &FolderId,
        user_id: &UserId,
        update: &FolderUpdate,
    ) -> PortResult<Folder> {
        let id = parse_id("Folder", folder_id.as_str())?;
        let record = sqlx::query_as::<_, FolderRecord>(
            "UPDATE folders
             SET title = COALESCE($3, title), color = COALESCE($4, color), updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING id, title, color, tags, updated_at",
        )
        .bind(id)
        .bind(user_id.as_str())
        .bind(update.title.as_deref())
        .bind(update.color.map(FolderColor::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Folder", id))?;
        Ok(record.to_domain())
    }

    async fn delete_folder(&self, folder_id: &FolderId, user_id: &UserId) -> PortResult<()> {
        let id = parse_id("Folder", folder_id.as_str())?;
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Folder {} not found", id)));
        }
        Ok(())
    }

    async fn list_folder_notes(
        &self,
        folder_id: &FolderId,
        user_id: &UserId,
    ) -> PortResult<Vec<Note>> {
        let id = parse_id("Folder", folder_id.as_str())?;
        let records = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, folder_id, title, content, tags, encrypted, favorite, updated_at
             FROM notes WHERE folder_id = $1 AND user_id = $2 ORDER BY updated_at DESC",
        )
        .bind(id)
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<Note> {
        let id = parse_id("Note", note_id.as_str())?;
        Ok(self.note_record(id, user_id).await?.to_domain())
    }

    async fn create_note(&self, folder_id: &FolderId, user_id: &UserId) -> PortResult<Note> {
        let folder = parse_id("Folder", folder_id.as_str())?;
        // Only inserts when the folder exists and belongs to the user.
        let record = sqlx::query_as::<_, NoteRecord>(
            "INSERT INTO notes (id, user_id, folder_id, title)
             SELECT $1, f.user_id, f.id, $4 FROM folders f WHERE f.id = $2 AND f.user_id = $3
             RETURNING id, folder_id, title, content, tags, encrypted, favorite, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(folder)
        .bind(user_id.as_str())
        .bind(DEFAULT_NOTE_TITLE)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Folder {} not found", folder)))?;
        Ok(record.to_domain())
    }

    async fn update_note(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        update: &NoteUpdate,
    ) -> PortResult<Note> {
        let id = parse_id("Note", note_id.as_str())?;
        let current = self.note_record(id, user_id).await?;

        // Encrypted notes stay encrypted when their content is edited.
        let content = match update.content.clone() {
            Some(content) if current.encrypted => Some(self.seal(content).await?),
            other => other,
        };

        let record = sqlx::query_as::<_, NoteRecord>(
            "UPDATE notes
             SET title = COALESCE($3, title), content = COALESCE($4, content), updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING id, folder_id, title, content, tags, encrypted, favorite, updated_at",
        )
        .bind(id)
        .bind(user_id.as_str())
        .bind(update.title.as_deref())
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Note", id))?;
        Ok(record.to_domain())
    }

    async fn move_note(
        &self,
        note_id: &NoteId,
        folder_id: &FolderId,
        user_id: &UserId,
    ) -> PortResult<Note> {
        let id = parse_id("Note", note_id.as_str())?;
        let folder = parse_id("Folder", folder_id.as_str())?;
        // The target folder must belong to the same user as the note.
        let record = sqlx::query_as::<_, NoteRecord>(
            "UPDATE notes n SET folder_id = f.id, updated_at = now()
             FROM folders f
             WHERE n.id = $1 AND n.user_id = $3 AND f.id = $2 AND f.user_id = $3
             RETURNING n.id, n.folder_id, n.title, n.content, n.tags, n.encrypted, n.favorite,
                       n.updated_at",
        )
        .bind(id)
        .bind(folder)
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Note", id))?;
        Ok(record.to_domain())
    }

    async fn delete_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<()> {
        let id = parse_id("Note", note_id.as_str())?;
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Note {} not found", id)));
        }
        Ok(())
    }

    async fn set_note_favorite(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        favorite: bool,
    ) -> PortResult<Note> {
        let id = parse_id("Note", note_id.as_str())?;
        let record = sqlx::query_as::<_, NoteRecord>(
            "UPDATE notes SET favorite = $3 WHERE id = $1 AND user_id = $2
             RETURNING id, folder_id, title, content, tags, encrypted, favorite, updated_at",
        )
        .bind(id)
        .bind(user_id.as_str())
        .bind(favorite)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Note", id))?;
        Ok(record.to_domain())
    }

    async fn encrypt_note(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        content: &str,
        title: Option<&str>,
    ) -> PortResult<Note> {
        let id = parse_id("Note", note_id.as_str())?;
        if self.note_record(id, user_id).await?.encrypted {
            return Err(PortError::InvalidData("Note is already encrypted".to_string()));
        }

        let envelope = self.seal(content.to_string()).await?;
        let record = sqlx::query_as::<_, NoteRecord>(
            "UPDATE notes
             SET content = $3, title = COALESCE($4, title), encrypted = TRUE, updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING id, folder_id, title, content, tags, encrypted, favorite, updated_at",
        )
        .bind(id)
        .bind(user_id.as_str())
        .bind(envelope)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Note", id))?;
        Ok(record.to_domain())
    }

    async fn decrypt_note(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<String> {
        let id = parse_id("Note", note_id.as_str())?;
        let record = self.note_record(id, user_id).await?;
        if !record.encrypted {
            return Ok(record.content);
        }
        self.open(record.content).await
    }

    async fn decrypt_note_in_store(&self, note_id: &NoteId, user_id: &UserId) -> PortResult<Note> {
        let id = parse_id("Note", note_id.as_str())?;
        let record = self.note_record(id, user_id).await?;
        if !record.encrypted {
            return Ok(record.to_domain());
        }

        let plaintext = self.open(record.content).await?;
        let record = sqlx::query_as::<_, NoteRecord>(
            "UPDATE notes SET content = $3, encrypted = FALSE, updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING id, folder_id, title, content, tags, encrypted, favorite, updated_at",
        )
        .bind(id)
        .bind(user_id.as_str())
        .bind(plaintext)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, "Note", id))?;
        Ok(record.to_domain())
    }
}
