//! crates/dashboard_core/src/slices/notes.rs
//!
//! Folders and notes of the signed-in user. Two caches hold notes: the notes
//! of the open folder and the user's favorites. A note present in both must
//! be identical in both after every action that returns it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, error, info};

use crate::domain::{Folder, FolderId, FolderUpdate, Note, NoteId, NoteUpdate, UserId};
use crate::messages::{
    CREATE_FOLDER_ERROR, CREATE_NOTE_ERROR, DATA_ERROR, DECRYPT_NOTE_ERROR, DELETE_FOLDER_ERROR,
    DELETE_NOTE_ERROR, ENCRYPT_NOTE_ERROR, GET_NOTES_ERROR, MISSING_DATA, MISSING_FOLDER_ID,
    MISSING_NOTE_ID, MOVE_NOTE_ERROR, UNAUTHORIZED, UPDATE_FOLDER_ERROR, UPDATE_NOTE_ERROR,
};
use crate::ports::PortResult;
use crate::slices::{ActionError, ActionResult, FetchOutcome};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesState {
    pub is_error: bool,
    pub is_initialized: bool,
    pub timestamp: Option<DateTime<Utc>>,

    // Notes
    pub is_folder_notes_error: bool,
    pub is_folder_notes_fetching: bool,
    pub favorite_notes: Vec<Note>,
    pub folder_notes: Vec<Note>,
    pub creating_note: bool,
    pub moving_note: bool,
    pub removing_note: bool,
    pub updating_note: bool,
    /// Set when the last note or folder mutation failed.
    pub is_action_error: bool,

    // Folders
    pub folder_id: Option<FolderId>,
    pub folders: Vec<Folder>,
    pub fetching_folders: bool,
    pub creating_folder: bool,
    pub removing_folder: bool,
    pub updating_folder: bool,
}

/// Per-mutation busy flags.
#[derive(Debug, Clone, Copy)]
enum Busy {
    CreatingNote,
    UpdatingNote,
    MovingNote,
    RemovingNote,
    CreatingFolder,
    UpdatingFolder,
    RemovingFolder,
}

impl Busy {
    fn flag(self, notes: &mut NotesState) -> &mut bool {
        match self {
            Busy::CreatingNote => &mut notes.creating_note,
            Busy::UpdatingNote => &mut notes.updating_note,
            Busy::MovingNote => &mut notes.moving_note,
            Busy::RemovingNote => &mut notes.removing_note,
            Busy::CreatingFolder => &mut notes.creating_folder,
            Busy::UpdatingFolder => &mut notes.updating_folder,
            Busy::RemovingFolder => &mut notes.removing_folder,
        }
    }
}

//=========================================================================================
// Cache helpers
//=========================================================================================

/// Replaces the note with the same id. A note absent from `notes` is not added.
fn replace_note(notes: &mut [Note], note: &Note) -> bool {
    match notes.iter_mut().find(|n| n.id == note.id) {
        Some(slot) => {
            *slot = note.clone();
            true
        }
        None => false,
    }
}

fn sort_by_title(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title))
    });
}

impl NotesState {
    /// Writes `note` into whichever caches already hold it.
    fn sync_note(&mut self, note: &Note) {
        replace_note(&mut self.folder_notes, note);
        replace_note(&mut self.favorite_notes, note);
    }

    fn remove_note(&mut self, id: &NoteId) {
        self.folder_notes.retain(|n| &n.id != id);
        self.favorite_notes.retain(|n| &n.id != id);
    }
}

fn require_user(user_id: &UserId) -> ActionResult<()> {
    if user_id.is_empty() {
        return Err(ActionError::validation(UNAUTHORIZED));
    }
    Ok(())
}

fn require_note(note_id: &NoteId) -> ActionResult<()> {
    if note_id.is_empty() {
        return Err(ActionError::validation(MISSING_NOTE_ID));
    }
    Ok(())
}

fn require_folder(folder_id: &FolderId) -> ActionResult<()> {
    if folder_id.is_empty() {
        return Err(ActionError::validation(MISSING_FOLDER_ID));
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

//=========================================================================================
// Slice
//=========================================================================================

pub struct NotesSlice<'a> {
    store: &'a Store,
}

impl<'a> NotesSlice<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Runs one collaborator call with `busy` raised, then merges the result
    /// into the caches in the same update that lowers the flag. A failure
    /// raises `is_action_error` until the next mutation starts.
    async fn mutate<T, Fut>(
        &self,
        action: &str,
        fallback: &str,
        busy: Busy,
        call: Fut,
        apply: impl FnOnce(&mut NotesState, &T),
    ) -> ActionResult<T>
    where
        Fut: Future<Output = PortResult<T>>,
    {
        self.store.update(|s| {
            *busy.flag(&mut s.notes) = true;
            s.notes.is_action_error = false;
        });

        match call.await {
            Ok(value) => {
                self.store.update(|s| {
                    apply(&mut s.notes, &value);
                    *busy.flag(&mut s.notes) = false;
                });
                Ok(value)
            }
            Err(e) => {
                error!("{}: {}", action, e.message().unwrap_or(fallback));
                self.store.update(|s| {
                    *busy.flag(&mut s.notes) = false;
                    s.notes.is_action_error = true;
                });
                Err(ActionError::Port(e))
            }
        }
    }

    //=====================================================================================
    // Folders
    //=====================================================================================

    /// Loads the folder list and favorites once per initialization.
    pub async fn fetch_folders(&self, user_id: &UserId) -> FetchOutcome {
        let started = self.store.update(|s| {
            let notes = &mut s.notes;
            if notes.fetching_folders {
                return Some(false);
            }
            if user_id.is_empty() || notes.is_initialized {
                return None;
            }
            notes.fetching_folders = true;
            notes.is_error = false;
            notes.is_initialized = true;
            Some(true)
        });
        match started {
            Some(true) => {}
            Some(false) => {
                debug!("fetch_folders already in flight");
                return FetchOutcome::Skipped;
            }
            None => return FetchOutcome::Failed,
        }

        let services = self.store.services();
        match services.notes.list_folders(user_id).await {
            Ok(listing) => {
                let now = services.clock.now();
                info!("Loaded {} folders", listing.folders.len());
                self.store.update(|s| {
                    let notes = &mut s.notes;
                    notes.folders = listing.folders;
                    notes.favorite_notes = listing.favorite_notes;
                    notes.timestamp = Some(now);
                    notes.fetching_folders = false;
                    notes.is_error = false;
                });
                FetchOutcome::Fetched
            }
            Err(e) => {
                error!("fetch_folders: {}", e.message().unwrap_or(DATA_ERROR));
                self.store.update(|s| {
                    let notes = &mut s.notes;
                    notes.fetching_folders = false;
                    notes.is_error = true;
                    notes.is_initialized = false;
                });
                FetchOutcome::Failed
            }
        }
    }

    pub async fn create_folder(&self, user_id: &UserId) -> ActionResult<Folder> {
        require_user(user_id)?;

        let services = self.store.services();
        self.mutate(
            "create_folder",
            CREATE_FOLDER_ERROR,
            Busy::CreatingFolder,
            services.notes.create_folder(user_id),
            |notes, folder| notes.folders.push(folder.clone()),
        )
        .await
    }

    pub async fn update_folder(
        &self,
        folder_id: &FolderId,
        user_id: &UserId,
        update: FolderUpdate,
    ) -> ActionResult<Folder> {
        require_user(user_id)?;
        require_folder(folder_id)?;
        if update.color.is_none() && is_blank(update.title.as_deref()) {
            return Err(ActionError::validation(MISSING_DATA));
        }

        let services = self.store.services();
        self.mutate(
            "update_folder",
            UPDATE_FOLDER_ERROR,
            Busy::UpdatingFolder,
            services.notes.update_folder(folder_id, user_id, &update),
            |notes, folder| {
                if let Some(slot) = notes.folders.iter_mut().find(|f| f.id == folder.id) {
                    *slot = folder.clone();
                }
            },
        )
        .await
    }

    /// Deletes a folder. Cached notes of that folder are left alone.
    pub async fn remove_folder(&self, folder_id: &FolderId, user_id: &UserId) -> ActionResult<()> {
        require_user(user_id)?;
        require_folder(folder_id)?;

        let services = self.store.services();
        self.mutate(
            "remove_folder",
            DELETE_FOLDER_ERROR,
            Busy::RemovingFolder,
            services.notes.delete_folder(folder_id, user_id),
            |notes, _| notes.folders.retain(|f| &f.id != folder_id),
        )
        .await
    }

    pub fn set_folder_id(&self, folder_id: Option<FolderId>) {
        self.store.update(|s| s.notes.folder_id = folder_id);
    }

    pub fn reset_initialized(&self) {
        self.store.update(|s| s.notes.is_initialized = false);
    }

    //=====================================================================================
    // Notes
    //=====================================================================================

    /// Replaces the folder-notes cache with the notes of `folder_id`.
    pub async fn fetch_folder_notes(&self, folder_id: &FolderId, user_id: &UserId) -> FetchOutcome {
        let started = self.store.update(|s| {
            let notes = &mut s.notes;
            if notes.is_folder_notes_fetching {
                return Some(false);
            }
            if folder_id.is_empty() || user_id.is_empty() {
                return None;
            }
            notes.is_folder_notes_fetching = true;
            notes.is_folder_notes_error = false;
            Some(true)
        });
        match started {
            Some(true) => {}
            Some(false) => return FetchOutcome::Skipped,
            None => return FetchOutcome::Failed,
        }

        let services = self.store.services();
        match services.notes.list_folder_notes(folder_id, user_id).await {
            Ok(folder_notes) => {
                self.store.update(|s| {
                    s.notes.folder_notes = folder_notes;
                    s.notes.is_folder_notes_fetching = false;
                });
                FetchOutcome::Fetched
            }
            Err(e) => {
                error!("fetch_folder_notes: {}", e.message().unwrap_or(GET_NOTES_ERROR));
                self.store.update(|s| {
                    s.notes.is_folder_notes_error = true;
                    s.notes.is_folder_notes_fetching = false;
                });
                FetchOutcome::Failed
            }
        }
    }

    /// Reads a single note without touching the caches.
    pub async fn fetch_note(&self, note_id: &NoteId, user_id: &UserId) -> ActionResult<Note> {
        require_user(user_id)?;
        require_note(note_id)?;
        let services = self.store.services();
        services.notes.get_note(note_id, user_id).await.map_err(|e| {
            error!("fetch_note: {}", e.message().unwrap_or(DATA_ERROR));
            ActionError::Port(e)
        })
    }

    pub async fn create_note(&self, folder_id: &FolderId, user_id: &UserId) -> ActionResult<Note> {
        require_user(user_id)?;
        require_folder(folder_id)?;

        let services = self.store.services();
        self.mutate(
            "create_note",
            CREATE_NOTE_ERROR,
            Busy::CreatingNote,
            services.notes.create_note(folder_id, user_id),
            |notes, note| notes.folder_notes.push(note.clone()),
        )
        .await
    }

    pub async fn update_note(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        update: NoteUpdate,
    ) -> ActionResult<Note> {
        require_user(user_id)?;
        require_note(note_id)?;
        if is_blank(update.title.as_deref()) && is_blank(update.content.as_deref()) {
            return Err(ActionError::validation(MISSING_DATA));
        }

        let services = self.store.services();
        self.mutate(
            "update_note",
            UPDATE_NOTE_ERROR,
            Busy::UpdatingNote,
            services.notes.update_note(note_id, user_id, &update),
            |notes, note| notes.sync_note(note),
        )
        .await
    }

    /// Moves a note out of the open folder. The favorites copy stays and picks
    /// up its new folder id.
    pub async fn move_note(
        &self,
        note_id: &NoteId,
        folder_id: &FolderId,
        user_id: &UserId,
    ) -> ActionResult<Note> {
        require_user(user_id)?;
        require_note(note_id)?;
        require_folder(folder_id)?;

        let services = self.store.services();
        self.mutate(
            "move_note",
            MOVE_NOTE_ERROR,
            Busy::MovingNote,
            services.notes.move_note(note_id, folder_id, user_id),
            |notes, moved| {
                notes.folder_notes.retain(|n| &n.id != note_id);
                if let Some(favorite) = notes.favorite_notes.iter_mut().find(|n| &n.id == note_id) {
                    *favorite = moved.clone();
                    favorite.folder_id = folder_id.clone();
                }
            },
        )
        .await
    }

    /// Marks or unmarks a favorite. Favorites stay sorted by title.
    pub async fn set_note_favorite(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        favorite: bool,
    ) -> ActionResult<Note> {
        require_user(user_id)?;
        require_note(note_id)?;

        let services = self.store.services();
        self.mutate(
            "set_note_favorite",
            UPDATE_NOTE_ERROR,
            Busy::UpdatingNote,
            services.notes.set_note_favorite(note_id, user_id, favorite),
            |notes, note| {
                replace_note(&mut notes.folder_notes, note);
                if favorite {
                    if !replace_note(&mut notes.favorite_notes, note) {
                        notes.favorite_notes.push(note.clone());
                        sort_by_title(&mut notes.favorite_notes);
                    }
                } else {
                    notes.favorite_notes.retain(|n| &n.id != note_id);
                }
            },
        )
        .await
    }

    pub async fn remove_note(&self, note_id: &NoteId, user_id: &UserId) -> ActionResult<()> {
        require_user(user_id)?;
        require_note(note_id)?;

        let services = self.store.services();
        self.mutate(
            "remove_note",
            DELETE_NOTE_ERROR,
            Busy::RemovingNote,
            services.notes.delete_note(note_id, user_id),
            |notes, _| notes.remove_note(note_id),
        )
        .await
    }

    pub async fn encrypt_note(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
        content: &str,
        title: Option<&str>,
    ) -> ActionResult<Note> {
        require_user(user_id)?;
        require_note(note_id)?;
        if content.is_empty() {
            return Err(ActionError::validation(MISSING_DATA));
        }

        let services = self.store.services();
        self.mutate(
            "encrypt_note",
            ENCRYPT_NOTE_ERROR,
            Busy::UpdatingNote,
            services.notes.encrypt_note(note_id, user_id, content, title),
            |notes, note| notes.sync_note(note),
        )
        .await
    }

    /// Returns the plain-text content; the stored note stays encrypted.
    pub async fn decrypt_note(&self, note_id: &NoteId, user_id: &UserId) -> ActionResult<String> {
        require_user(user_id)?;
        require_note(note_id)?;

        let services = self.store.services();
        self.mutate(
            "decrypt_note",
            DECRYPT_NOTE_ERROR,
            Busy::UpdatingNote,
            services.notes.decrypt_note(note_id, user_id),
            |_, _| {},
        )
        .await
    }

    /// Permanently decrypts the stored note.
    pub async fn decrypt_note_in_store(
        &self,
        note_id: &NoteId,
        user_id: &UserId,
    ) -> ActionResult<Note> {
        require_user(user_id)?;
        require_note(note_id)?;

        let services = self.store.services();
        self.mutate(
            "decrypt_note_in_store",
            DECRYPT_NOTE_ERROR,
            Busy::UpdatingNote,
            services.notes.decrypt_note_in_store(note_id, user_id),
            |notes, note| notes.sync_note(note),
        )
        .await
    }

    /// Refreshes the favorites copy of `note`, e.g. after an edit made
    /// elsewhere. Notes that are not favorites are ignored.
    pub fn mirror_favorite(&self, note: &Note) {
        self.store
            .update(|s| replace_note(&mut s.notes.favorite_notes, note));
    }
}
