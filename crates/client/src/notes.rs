use reqwest::Method;
use serde_json::{Value, json};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::model::{Note, NoteUpdate};

/// Typed access to `/api/notes`. Every call goes through the refresh interceptor.
#[derive(Clone)]
pub struct NotesApi {
    api: ApiClient,
}

impl NotesApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Note>, ClientError> {
        self.api
            .send_json(self.api.request(Method::GET, "/api/notes")?)
            .await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Note>, ClientError> {
        let builder = self
            .api
            .request(Method::GET, "/api/notes")?
            .query(&[("q", query)]);
        self.api.send_json(builder).await
    }

    pub async fn get(&self, id: &str) -> Result<Note, ClientError> {
        self.api
            .send_json(self.api.request(Method::GET, &format!("/api/notes/{id}"))?)
            .await
    }

    pub async fn create(&self, title: &str, content: &str) -> Result<Note, ClientError> {
        let builder = self
            .api
            .request(Method::POST, "/api/notes")?
            .json(&json!({ "title": title, "content": content }));
        self.api.send_json(builder).await
    }

    pub async fn update(&self, id: &str, update: &NoteUpdate) -> Result<Note, ClientError> {
        let builder = self
            .api
            .request(Method::PUT, &format!("/api/notes/{id}"))?
            .json(update);
        self.api.send_json(builder).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let builder = self
            .api
            .request(Method::DELETE, &format!("/api/notes/{id}"))?;
        self.api.send_json::<Value>(builder).await.map(|_| ())
    }
}
