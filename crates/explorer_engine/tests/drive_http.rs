use std::sync::Arc;
use std::time::Duration;

use explorer_engine::{
    DriveApi, DriveSettings, FailureKind, ListingClient, ManualClock, MemoryStore,
    ReqwestDriveApi, TieredCache, RATE_LIMITED_MESSAGE,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn api(server: &MockServer) -> ReqwestDriveApi {
    common::init_logging();
    ReqwestDriveApi::new(DriveSettings {
        files_endpoint: format!("{}/drive/v3/files", server.uri()),
        api_key: "test-key".to_string(),
        request_timeout: Duration::from_secs(5),
        ..DriveSettings::default()
    })
    .expect("client")
}

fn listing(api: ReqwestDriveApi) -> ListingClient {
    let cache = TieredCache::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        Duration::from_secs(1800),
        Arc::new(ManualClock::at(0)),
    );
    ListingClient::new(Arc::new(api), Arc::new(cache))
}

#[tokio::test]
async fn metadata_request_carries_key_and_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/root-1"))
        .and(query_param("key", "test-key"))
        .and(query_param("fields", "id,name,mimeType"))
        .and(query_param("supportsAllDrives", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":"root-1","name":"Course","mimeType":"application/vnd.google-apps.folder"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let entry = api(&server).metadata("root-1").await.expect("metadata");
    assert_eq!(entry.name, "Course");
    assert!(entry.is_container());
}

#[tokio::test]
async fn listing_follows_continuation_tokens_and_caches_the_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", "'root-1' in parents and trashed=false"))
        .and(query_param("pageSize", "1000"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"files":[{"id":"a","name":"a.json","mimeType":"application/json"}],"nextPageToken":"t2"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageToken", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"files":[{"id":"b","name":"B","mimeType":"application/vnd.google-apps.folder"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = listing(api(&server));
    let first = client.get_children("root-1").await.expect("children");
    let ids: Vec<&str> = first.iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    // Served from the durable tier; the mocks' expectations stay at one call each.
    let second = client.get_children("root-1").await.expect("cached children");
    assert_eq!(second, first);
}

#[tokio::test]
async fn rate_limit_statuses_share_one_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/busy"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error":{"code":429,"message":"Rate Limit Exceeded"}}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/quota"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let api = api(&server);
    let busy = api.metadata("busy").await.unwrap_err();
    assert_eq!(busy.kind, FailureKind::RateLimited);
    assert_eq!(busy.message, "429 Rate Limit Exceeded");
    assert_eq!(busy.user_message(), RATE_LIMITED_MESSAGE);

    let quota = api.fetch_document("quota").await.unwrap_err();
    assert_eq!(quota.kind, FailureKind::RateLimited);
    assert_eq!(quota.user_message(), RATE_LIMITED_MESSAGE);
}

#[tokio::test]
async fn failed_page_fails_the_listing_and_caches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"files":[{"id":"a","name":"a.json"}],"nextPageToken":"t2"}"#,
        ))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageToken", "t2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let client = listing(api(&server));
    for _ in 0..2 {
        let err = client.get_children("root-1").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::TransientNetwork);
    }
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/gone"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            r#"{"error":{"code":404,"message":"File not found: gone."}}"#,
        ))
        .mount(&server)
        .await;

    let err = api(&server).fetch_document("gone").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::NotFound);
    assert_eq!(err.message, "404 File not found: gone.");
}

#[tokio::test]
async fn unparseable_listing_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = api(&server).list_page("root-1", None).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Malformed);
}

#[tokio::test]
async fn oversized_document_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/big"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
        .mount(&server)
        .await;

    let api = ReqwestDriveApi::new(DriveSettings {
        files_endpoint: format!("{}/drive/v3/files", server.uri()),
        max_document_bytes: 16,
        ..DriveSettings::default()
    })
    .expect("client");
    let err = api.fetch_document("big").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Malformed);
    assert!(err.message.contains("too large"), "{}", err.message);
}
