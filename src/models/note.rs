use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::NoteType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub user_id: Uuid,
    pub note_text: String,
    pub note_type: NoteType,
    pub created_at: String,
}
