use goose::prelude::*;
use serde_json::{Value, json};
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

const PASSWORD: &str = "loadtest-password";

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

/// Each simulated user registers its own account; goose keeps the session cookies.
async fn register(user: &mut GooseUser) -> TransactionResult {
    let run = env::var("RUN_ID").unwrap_or_else(|_| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_default()
    });
    let email = format!("loadtest-{run}-{}@example.com", user.weighted_users_index);
    let body = json!({ "email": email, "password": PASSWORD });
    let _goose_metrics = user.post_json("/api/register", &body).await?;
    Ok(())
}

async fn list_notes(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/notes").await?;
    Ok(())
}

async fn search_notes(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/notes?q=load").await?;
    Ok(())
}

async fn note_lifecycle(user: &mut GooseUser) -> TransactionResult {
    let body = json!({ "title": "load test note", "content": "created by goose" });
    let goose = user.post_json("/api/notes", &body).await?;
    let Ok(response) = goose.response else {
        return Ok(());
    };
    let Ok(note) = response.json::<Value>().await else {
        return Ok(());
    };
    let Some(id) = note["id"].as_str().map(str::to_string) else {
        return Ok(());
    };
    let path = format!("/api/notes/{id}");

    let request_builder = user
        .get_request_builder(&GooseMethod::Put, &path)?
        .json(&json!({ "content": "updated by goose" }));
    let goose_request = GooseRequest::builder()
        .method(GooseMethod::Put)
        .path(path.as_str())
        .set_request_builder(request_builder)
        .build();
    let _goose_metrics = user.request(goose_request).await?;

    let _goose_metrics = user.delete(&path).await?;
    Ok(())
}

async fn refresh_session(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.post("/api/refresh-token", "").await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("NotesSession")
                .register_transaction(transaction!(register).set_on_start())
                .register_transaction(transaction!(list_notes).set_weight(4)?)
                .register_transaction(transaction!(search_notes).set_weight(2)?)
                .register_transaction(transaction!(note_lifecycle).set_weight(2)?)
                .register_transaction(transaction!(refresh_session)),
        )
        .execute()
        .await?;

    Ok(())
}
