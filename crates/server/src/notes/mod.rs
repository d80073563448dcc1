//! Per-user note persistence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub mod store;

pub use store::SeaOrmNoteStore;

/// OpenAPI tag for note endpoints
pub const NOTES_TAG: &str = "Notes";

/// A single note, owned by exactly one user id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    /// Unix milliseconds
    pub created_at: i64,
    /// Unix milliseconds
    pub updated_at: i64,
}

impl Note {
    /// Case-insensitive substring match over title and content.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.content.to_lowercase().contains(&needle)
    }
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct NoteUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Error)]
pub enum NoteStoreError {
    /// Absent, or owned by someone else.
    #[error("note not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Notes owned by `user_id`, newest first, optionally filtered by `query`.
    async fn list(&self, user_id: &str, query: Option<&str>) -> Result<Vec<Note>, NoteStoreError>;

    async fn get(&self, id: &str, user_id: &str) -> Result<Note, NoteStoreError>;

    async fn create(&self, user_id: &str, title: &str, content: &str)
    -> Result<Note, NoteStoreError>;

    async fn update(
        &self,
        id: &str,
        user_id: &str,
        update: NoteUpdate,
    ) -> Result<Note, NoteStoreError>;

    async fn delete(&self, id: &str, user_id: &str) -> Result<(), NoteStoreError>;
}

pub(crate) fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_ignores_case_and_checks_both_fields() {
        let note = Note {
            id: "n1".into(),
            user_id: "u1".into(),
            title: "Shopping List".into(),
            content: "Milk, eggs and BREAD".into(),
            created_at: 0,
            updated_at: 0,
        };
        assert!(note.matches("shopping"));
        assert!(note.matches("bread"));
        assert!(!note.matches("cheese"));
    }

    #[test]
    fn note_serializes_camel_case() {
        let note = Note {
            id: "n1".into(),
            user_id: "u1".into(),
            title: "t".into(),
            content: String::new(),
            created_at: 1,
            updated_at: 2,
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["createdAt"], 1);
        assert_eq!(json["updatedAt"], 2);
    }
}
