use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use confedit_core::{
    BoundConfiguration, ConfigurationIdentity, EditorMode, EditorSettings, InMemoryStore,
    LookupSettings, StateStore,
};
use confedit_editor::{
    BufferSurfaceFactory, Delivery, EditorError, HttpResourceResolver, ResourceResolver,
    ResourceSelection, SessionHost,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

async fn by_name(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let env = params.get("env").map(String::as_str);
    let zone = params.get("zoneCode").map(String::as_str);
    let name = params.get("name").map(String::as_str);

    match (env, zone, name) {
        (Some("prod"), Some("z1"), Some("cache.conf")) => {
            Json(json!({"code": 0, "msg": "", "data": "timeout=30"}))
        }
        (Some("prod"), Some("z1"), Some("object.conf")) => Json(json!({
            "code": 0,
            "msg": "",
            "data": {"name": "object.conf", "content": "retries=3"}
        })),
        _ => Json(json!({"code": 1, "msg": "resource not found", "data": null})),
    }
}

async fn detail(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    if let Some(auth) = headers.get("authorization") {
        if auth.to_str().ok() != Some("Bearer secret") {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    match params.get("resource").map(String::as_str) {
        Some("cache.conf@v2") => Json(json!({"code": 0, "msg": "", "data": "timeout=30"}))
            .into_response(),
        Some("broken@v1") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some("garbled@v1") => (StatusCode::OK, "not json").into_response(),
        _ => Json(json!({"code": 1, "msg": "resource not found", "data": null}))
            .into_response(),
    }
}

/// Start a fake lookup service and return its base URL
async fn spawn_lookup_service() -> String {
    let app = Router::new()
        .route("/api/admin/resource/detail", get(by_name))
        .route("/api/admin/resource/version/detail", get(detail));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/", addr)
}

fn settings(base_url: String, token: Option<&str>) -> LookupSettings {
    LookupSettings {
        base_url,
        timeout_secs: 5,
        token: token.map(str::to_string),
    }
}

#[tokio::test]
async fn test_resolve_by_name_version() {
    let base = spawn_lookup_service().await;
    let resolver = HttpResourceResolver::new(&settings(base, None)).unwrap();
    assert!(!resolver.base_url().ends_with('/'));

    let content = resolver
        .resolve_by_name_version("prod", "z1", "cache.conf")
        .await
        .unwrap();
    assert_eq!(content, "timeout=30");

    let content = resolver
        .resolve_by_name_version("prod", "z1", "object.conf")
        .await
        .unwrap();
    assert_eq!(content, "retries=3");
}

#[tokio::test]
async fn test_non_zero_code_is_not_found() {
    let base = spawn_lookup_service().await;
    let resolver = HttpResourceResolver::new(&settings(base, None)).unwrap();

    let result = resolver
        .resolve_by_name_version("prod", "z2", "cache.conf")
        .await;
    match result {
        Err(EditorError::NotFound { code, message }) => {
            assert_eq!(code, 1);
            assert_eq!(message, "resource not found");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_failures() {
    let base = spawn_lookup_service().await;
    let resolver = HttpResourceResolver::new(&settings(base, None)).unwrap();

    let result = resolver.resolve_detail("broken@v1").await;
    assert!(matches!(result, Err(EditorError::Transport(_))));

    let result = resolver.resolve_detail("garbled@v1").await;
    assert!(matches!(result, Err(EditorError::Transport(_))));

    let unreachable =
        HttpResourceResolver::new(&settings("http://127.0.0.1:1".to_string(), None)).unwrap();
    let result = unreachable.resolve_detail("cache.conf@v2").await;
    assert!(result.unwrap_err().is_lookup_failure());
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let base = spawn_lookup_service().await;

    let good = HttpResourceResolver::new(&settings(base.clone(), Some("secret"))).unwrap();
    assert_eq!(good.resolve_detail("cache.conf@v2").await.unwrap(), "timeout=30");

    let bad = HttpResourceResolver::new(&settings(base, Some("wrong"))).unwrap();
    assert!(matches!(
        bad.resolve_detail("cache.conf@v2").await,
        Err(EditorError::Transport(_))
    ));
}

#[tokio::test]
async fn test_host_inserts_resource_from_service() {
    let base = spawn_lookup_service().await;
    let resolver = Arc::new(HttpResourceResolver::new(&settings(base, None)).unwrap());
    let store = Arc::new(InMemoryStore::new());
    let factory = Arc::new(BufferSurfaceFactory::new());
    let mut host = SessionHost::new(
        store.clone(),
        factory.clone(),
        resolver,
        EditorSettings::default(),
    );

    let identity = ConfigurationIdentity::new("prod", "z1", "svc", "config.toml");
    host.sync(
        EditorMode::Code,
        Some(BoundConfiguration::new(identity, "[cache]\n")),
    )
    .await
    .unwrap();

    let handle = factory.last_handle().unwrap();
    assert!(matches!(
        handle.load_resource_detail("cache.conf@").await,
        Err(EditorError::InvalidReference(_))
    ));
    assert_eq!(
        handle.load_resource_detail("cache.conf@v9").await.unwrap(),
        "timeout=30"
    );

    handle.request_insert_resource();
    host.pump().await.unwrap();

    let delivery = host
        .confirm_insertion(ResourceSelection::new("cache.conf@v2"))
        .await
        .unwrap();
    assert!(matches!(delivery, Delivery::Delivered { bytes: 10, .. }));
    assert_eq!(handle.value(), "[cache]\ntimeout=30");
    assert_eq!(store.snapshot().await.current_content, "[cache]\ntimeout=30");
}
