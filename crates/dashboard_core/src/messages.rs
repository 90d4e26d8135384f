//! User-facing fallback messages, shown when a collaborator failure carries
//! no description of its own.

pub const DATA_ERROR: &str = "Unable to retrieve data";
pub const FACT_ERROR: &str = "Unable to retrieve fact";
pub const FACTS_INIT_ERROR: &str = "Unable to initialize facts";
pub const GET_NOTES_ERROR: &str = "Unable to retrieve notes";
pub const CREATE_NOTE_ERROR: &str = "Unable to create note";
pub const UPDATE_NOTE_ERROR: &str = "Unable to update note";
pub const MOVE_NOTE_ERROR: &str = "Unable to move note";
pub const DELETE_NOTE_ERROR: &str = "Unable to delete note";
pub const ENCRYPT_NOTE_ERROR: &str = "Unable to encrypt note";
pub const DECRYPT_NOTE_ERROR: &str = "Unable to decrypt note";
pub const CREATE_FOLDER_ERROR: &str = "Unable to create folder";
pub const UPDATE_FOLDER_ERROR: &str = "Unable to update folder";
pub const DELETE_FOLDER_ERROR: &str = "Unable to delete folder";

// Validation failures raised before any collaborator call.
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const MISSING_NOTE_ID: &str = "Missing note id";
pub const MISSING_FOLDER_ID: &str = "Missing folder id";
pub const MISSING_DATA: &str = "Missing required data";
