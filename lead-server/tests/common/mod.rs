//! Shared integration test harness
//!
//! Boots the full server state over a throwaway work dir and drives the
//! router through oneshot calls, no TCP listener involved.

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;

use lead_server::auth::{JwtConfig, Role};
use lead_server::core::{Config, ServerState};
use lead_server::routes::{OneshotRouter, build_app};

pub struct TestServer {
    pub state: ServerState,
    app: Router<ServerState>,
    _work_dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let work_dir = tempfile::tempdir().expect("create temp work dir");
        let mut config =
            Config::with_overrides(work_dir.path().to_str().expect("utf-8 temp path"), 0);
        config.jwt = JwtConfig {
            secret: "integration-test-secret-key-0123456789".to_string(),
            expiration_minutes: 60,
            issuer: "lead-server".to_string(),
            audience: "dashboard-clients".to_string(),
        };
        config.cache_coalesce_ms = 20;

        let state = ServerState::initialize(&config).await;
        state.start_background_tasks();
        let app = build_app(&state);

        Self {
            state,
            app,
            _work_dir: work_dir,
        }
    }

    /// Mint a token the way the external identity service would
    pub fn token(&self, id: &str, email: &str, full_name: &str, role: Role) -> String {
        self.state
            .get_jwt_service()
            .generate_token(id, email, full_name, role)
            .expect("generate test token")
    }

    pub fn admin_token(&self) -> String {
        self.token(
            "app_user:admin",
            "admin@example.com",
            "Site Admin",
            Role::Admin,
        )
    }

    pub async fn request(
        &mut self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        let response = self
            .app
            .oneshot(&self.state, request)
            .await
            .expect("oneshot call");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response is JSON")
        };
        (status, json)
    }

    pub async fn get(&mut self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&mut self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn patch(&mut self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(token), None).await
    }

    /// Create a lead as admin, returning its id ("lead:...")
    pub async fn seed_lead(&mut self, body: Value) -> String {
        let admin = self.admin_token();
        let (status, response) = self.post("/api/leads", &admin, body).await;
        assert_eq!(status, StatusCode::OK, "seed lead failed: {}", response);
        response["data"]["id"]
            .as_str()
            .expect("created lead has an id")
            .to_string()
    }
}

/// Minimal valid lead payload with the given attribution
pub fn lead_payload(customer: &str, account_manager: Option<&str>, field_rep: Option<&str>) -> Value {
    json!({
        "customer_name": customer,
        "customer_tel": "07700 900123",
        "first_line_of_address": "1 Solar Way",
        "postcode": "LS1 4AB",
        "account_manager": account_manager,
        "field_rep": field_rep,
    })
}

/// RFC 3339 range covering the last week, Z-suffixed so the query string
/// needs no percent escapes
pub fn week_range_query() -> String {
    use chrono::{Duration, SecondsFormat, Utc};
    let from = (Utc::now() - Duration::days(7)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let to = (Utc::now() + Duration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
    format!("from={}&to={}", from, to)
}
