//! Tests for request handling.
//!
//! Each test builds a throwaway project directory with an in-memory schema and
//! drives `respond` directly.

use super::*;
use crate::bootstrap;
use crate::config::ProjectConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode};
use pont_mocks_core::SchemaSnapshot;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

const SCHEMA: &str = r#"{
    "mods": [{ "name": "User", "interfaces": [
        { "name": "getUser", "path": "/users/{id}", "method": "GET",
          "response": { "typeName": "User", "isDefsType": true } },
        { "name": "create", "path": "/users", "method": "POST",
          "response": { "typeName": "boolean" } }
    ]}],
    "baseClasses": [{ "name": "User", "properties": [
        { "name": "id", "dataType": { "typeName": "number" } },
        { "name": "name", "dataType": { "typeName": "string" } }
    ]}]
}"#;

fn context_with(dir: &Path, mocks_file: &str, resolve: bool) -> MockContext {
    let mut config = ProjectConfig::default();
    config.mocks_path = dir.join(mocks_file);
    config.mocks.resolve_templates = resolve;
    MockContext::with_schema(config, SchemaSnapshot::from_json_str(SCHEMA).unwrap()).unwrap()
}

fn bootstrapped(mocks_file: &str) -> (TempDir, MockContext) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_with(dir.path(), mocks_file, true);
    bootstrap::ensure(&ctx.snapshot().schema, ctx.config()).unwrap();
    (dir, ctx)
}

async fn body_text(resp: Response<Full<Bytes>>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_matched_interface_is_served() {
    let (_dir, ctx) = bootstrapped("mocks.rhai");

    let resp = respond(&ctx, "GET", "/users/7").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("Content-Type").unwrap(), MOCK_CONTENT_TYPE);
    assert_eq!(resp.headers().get(INTERFACE_HEADER).unwrap(), "User.getUser");

    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "");
    assert!(body["data"]["id"].is_number());
    assert!(body["data"]["name"].is_string());
}

#[tokio::test]
async fn test_json_artifact_is_served() {
    let (_dir, ctx) = bootstrapped("mocks.json");

    let resp = respond(&ctx, "post", "/users").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(body["data"], true);
}

#[tokio::test]
async fn test_unmatched_request_is_404() {
    let (_dir, ctx) = bootstrapped("mocks.rhai");

    for (method, path) in [("GET", "/nothing"), ("GET", "/users/7/more"), ("DELETE", "/users/7")] {
        let resp = respond(&ctx, method, path).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method} {path}");
        assert_eq!(body_text(resp).await, "");
    }
}

#[tokio::test]
async fn test_broken_artifact_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_with(dir.path(), "mocks.rhai", true);
    std::fs::write(ctx.mocks_path(), "#{ \"User\": ").unwrap();

    let resp = respond(&ctx, "GET", "/users/7").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get(ERROR_HEADER).unwrap(), "true");
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("compile"));
    assert_eq!(body["interface"], "User.getUser");
}

#[tokio::test]
async fn test_missing_artifact_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_with(dir.path(), "mocks.rhai", true);

    let resp = respond(&ctx, "GET", "/users/7").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_interface_missing_from_artifact_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_with(dir.path(), "mocks.json", true);
    std::fs::write(ctx.mocks_path(), r#"{ "User": { "create": true } }"#).unwrap();

    let resp = respond(&ctx, "GET", "/users/1").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("User.getUser"));
}

#[tokio::test]
async fn test_artifact_edits_apply_without_restart() {
    let (_dir, ctx) = bootstrapped("mocks.json");
    std::fs::write(ctx.mocks_path(), r#"{ "User": { "create": "edited" } }"#).unwrap();

    let resp = respond(&ctx, "POST", "/users").await;
    assert_eq!(body_text(resp).await, r#""edited""#);
}

#[tokio::test]
async fn test_templates_resolved_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let raw = r#"{ "User": { "create": { "tags|2": ["@@x"], "who": "@name" } } }"#;

    let ctx = context_with(dir.path(), "mocks.json", true);
    std::fs::write(ctx.mocks_path(), raw).unwrap();
    let body: Value = serde_json::from_str(&body_text(respond(&ctx, "POST", "/users").await).await).unwrap();
    assert_eq!(body["tags"], serde_json::json!(["@x", "@x"]));
    assert_ne!(body["who"], "@name");

    let ctx = context_with(dir.path(), "mocks.json", false);
    let body: Value = serde_json::from_str(&body_text(respond(&ctx, "POST", "/users").await).await).unwrap();
    assert_eq!(body["tags|2"], serde_json::json!(["@@x"]));
    assert_eq!(body["who"], "@name");
}

#[tokio::test]
async fn test_server_requires_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_with(dir.path(), "mocks.rhai", true);
    let server = MockServer::new("127.0.0.1:0".parse().unwrap(), Arc::new(ctx));

    assert!(matches!(server.bind().await, Err(ServerError::MissingArtifact(_))));
}
