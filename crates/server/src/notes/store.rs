use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

use super::{Note, NoteStore, NoteStoreError, NoteUpdate, now_millis};
use crate::entity::note;

pub struct SeaOrmNoteStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmNoteStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_owned(&self, id: &str, user_id: &str) -> Result<note::Model, NoteStoreError> {
        note::Entity::find_by_id(id)
            .filter(note::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(NoteStoreError::NotFound)
    }
}

#[async_trait]
impl NoteStore for SeaOrmNoteStore {
    #[tracing::instrument(skip(self, query))]
    async fn list(&self, user_id: &str, query: Option<&str>) -> Result<Vec<Note>, NoteStoreError> {
        let rows = note::Entity::find()
            .filter(note::Column::UserId.eq(user_id))
            .order_by_desc(note::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        let query = query.map(str::trim).filter(|q| !q.is_empty());
        Ok(rows
            .into_iter()
            .map(Note::from)
            .filter(|n| query.is_none_or(|q| n.matches(q)))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: &str, user_id: &str) -> Result<Note, NoteStoreError> {
        self.find_owned(id, user_id).await.map(Note::from)
    }

    #[tracing::instrument(skip(self, title, content))]
    async fn create(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Note, NoteStoreError> {
        let now = now_millis();
        let model = note::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(self.db.as_ref()).await?;
        tracing::debug!(note_id = %created.id, "Created note");
        Ok(created.into())
    }

    #[tracing::instrument(skip(self, update))]
    async fn update(
        &self,
        id: &str,
        user_id: &str,
        update: NoteUpdate,
    ) -> Result<Note, NoteStoreError> {
        let existing = self.find_owned(id, user_id).await?;
        let mut model: note::ActiveModel = existing.into();
        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(content) = update.content {
            model.content = Set(content);
        }
        model.updated_at = Set(now_millis());
        Ok(model.update(self.db.as_ref()).await?.into())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &str, user_id: &str) -> Result<(), NoteStoreError> {
        let result = note::Entity::delete_many()
            .filter(note::Column::Id.eq(id))
            .filter(note::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(NoteStoreError::NotFound);
        }
        Ok(())
    }
}
