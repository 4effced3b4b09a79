// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use smartsplit::{app::build_app, state::AppState, store::Store};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

/// A full application router over a scratch store. The temp dir lives as
/// long as the app so the database file survives between requests.
pub struct TestApp {
    router: Router,
    _temp: TempDir,
}

pub async fn test_app() -> TestApp {
    let temp = TempDir::new().expect("create temp dir");
    let store = Store::new(temp.path().join("db.json"));
    let state = AppState::fake(store);
    TestApp {
        router: build_app(state),
        _temp: temp,
    }
}

/// A registered user's id and bearer token.
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
    pub email: String,
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("DELETE", uri, token, None).await
    }

    /// Register a user and hand back their id and token.
    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "name": name,
                    "email": email,
                    "password": "correct-horse-battery",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        TestUser {
            id: parse_uuid(&body["user"]["id"]),
            token: body["token"].as_str().expect("token").to_string(),
            email: body["user"]["email"].as_str().expect("email").to_string(),
        }
    }
}

pub fn parse_uuid(value: &Value) -> Uuid {
    Uuid::parse_str(value.as_str().expect("uuid string")).expect("valid uuid")
}

/// Find the balance entry against one counterparty in a balances response.
pub fn entry_for<'a>(body: &'a Value, counterparty: Uuid) -> Option<&'a Value> {
    let needle = counterparty.to_string();
    body["balances"]
        .as_array()
        .expect("balances array")
        .iter()
        .find(|entry| entry["user2"].as_str() == Some(needle.as_str()))
}
