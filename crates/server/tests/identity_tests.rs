mod common;

use notes_server::config::{IdentityConfig, IdentityProviderKind};
use notes_server::identity::{
    IdentityError, IdentityProvider, LocalIdentityProvider, RemoteIdentityProvider,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Local provider
// =============================================================================

#[tokio::test]
async fn local_provider_round_trip() {
    let provider = LocalIdentityProvider::new(common::test_db().await);

    let created = provider
        .create_account("  Alice@Example.com ", "pw123456")
        .await
        .unwrap();
    assert_eq!(created.email, "alice@example.com");

    let verified = provider
        .verify_password("alice@example.com", "pw123456")
        .await
        .unwrap();
    assert_eq!(verified, created);

    let fetched = provider.get_user(&created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn local_provider_rejections() {
    let provider = LocalIdentityProvider::new(common::test_db().await);
    provider
        .create_account("a@b.com", "pw123456")
        .await
        .unwrap();

    assert!(matches!(
        provider.create_account("a@b.com", "pw123456").await,
        Err(IdentityError::EmailTaken)
    ));
    assert!(matches!(
        provider.create_account("c@d.com", "12345").await,
        Err(IdentityError::WeakPassword)
    ));
    assert!(matches!(
        provider.verify_password("a@b.com", "nope-nope").await,
        Err(IdentityError::InvalidCredentials(_))
    ));
    assert!(matches!(
        provider.verify_password("x@y.com", "pw123456").await,
        Err(IdentityError::InvalidCredentials(_))
    ));
    assert!(matches!(
        provider.get_user("missing").await,
        Err(IdentityError::UnknownUser)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_registrations_of_one_email() {
    let provider = LocalIdentityProvider::new(common::test_db().await);

    let (first, second) = tokio::join!(
        provider.create_account("dup@example.com", "pw123456"),
        provider.create_account("dup@example.com", "pw123456"),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, IdentityError::EmailTaken)),
        "unexpected results: {results:?}"
    );
}

// =============================================================================
// Remote provider
// =============================================================================

fn remote_config(server: &MockServer) -> IdentityConfig {
    IdentityConfig {
        provider: IdentityProviderKind::Remote,
        api_key: Some("test-api-key".into()),
        base_url: server.uri(),
        service_token: Some("service-token".into()),
    }
}

#[tokio::test]
async fn remote_sign_up_returns_local_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .and(query_param("key", "test-api-key"))
        .and(body_partial_json(json!({ "email": "a@b.com", "password": "pw123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-1",
            "email": "a@b.com",
            "idToken": "provider-id-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = RemoteIdentityProvider::new(&remote_config(&server)).unwrap();
    let identity = provider
        .create_account("a@b.com", "pw123456")
        .await
        .unwrap();
    assert_eq!(identity.id, "uid-1");
    assert_eq!(identity.email, "a@b.com");
}

#[tokio::test]
async fn remote_sign_up_propagates_provider_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "EMAIL_EXISTS" }
        })))
        .mount(&server)
        .await;

    let provider = RemoteIdentityProvider::new(&remote_config(&server)).unwrap();
    assert!(matches!(
        provider.create_account("a@b.com", "pw123456").await,
        Err(IdentityError::EmailTaken)
    ));
}

#[tokio::test]
async fn remote_login_resolves_identity_through_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-1",
            "email": "a@b.com",
            "idToken": "provider-id-token"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .and(body_partial_json(json!({ "idToken": "provider-id-token" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "localId": "uid-1", "email": "a@b.com" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = RemoteIdentityProvider::new(&remote_config(&server)).unwrap();
    let identity = provider
        .verify_password("a@b.com", "pw123456")
        .await
        .unwrap();
    assert_eq!(identity.id, "uid-1");
}

#[tokio::test]
async fn remote_login_with_bad_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_PASSWORD" }
        })))
        .mount(&server)
        .await;

    let provider = RemoteIdentityProvider::new(&remote_config(&server)).unwrap();
    match provider.verify_password("a@b.com", "wrong").await {
        Err(IdentityError::InvalidCredentials(reason)) => assert_eq!(reason, "INVALID_PASSWORD"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn remote_profile_lookup_uses_service_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .and(header("authorization", "Bearer service-token"))
        .and(body_partial_json(json!({ "localId": ["uid-1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "localId": "uid-1", "email": "a@b.com" }]
        })))
        .mount(&server)
        .await;

    let provider = RemoteIdentityProvider::new(&remote_config(&server)).unwrap();
    assert_eq!(provider.get_user("uid-1").await.unwrap().email, "a@b.com");
}

#[tokio::test]
async fn remote_profile_lookup_for_unknown_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let provider = RemoteIdentityProvider::new(&remote_config(&server)).unwrap();
    assert!(matches!(
        provider.get_user("ghost").await,
        Err(IdentityError::UnknownUser)
    ));
}

#[tokio::test]
async fn remote_server_errors_are_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = RemoteIdentityProvider::new(&remote_config(&server)).unwrap();
    assert!(matches!(
        provider.verify_password("a@b.com", "pw123456").await,
        Err(IdentityError::Unavailable(_))
    ));
}

#[tokio::test]
async fn unreachable_provider_surfaces_as_503() {
    use notes_server::auth::SessionManager;
    use notes_server::error::ApiError;
    use std::sync::Arc;

    // Nothing listens on this port once the mock server is dropped
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let config = IdentityConfig {
        provider: IdentityProviderKind::Remote,
        api_key: Some("k".into()),
        base_url: uri,
        service_token: None,
    };
    let provider = Arc::new(RemoteIdentityProvider::new(&config).unwrap());
    let sessions = SessionManager::from_config(&common::test_config().auth, provider).unwrap();

    let err = sessions.login("a@b.com", "pw123456").await.unwrap_err();
    assert!(matches!(err, ApiError::UpstreamUnavailable(_)));
    assert_eq!(err.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
}
