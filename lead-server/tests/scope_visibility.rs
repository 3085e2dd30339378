//! Role scoping end to end: every read path filters by the caller's
//! attribution, and out-of-scope records are indistinguishable from
//! missing ones.

mod common;

use common::{TestServer, lead_payload};
use http::StatusCode;
use lead_server::auth::Role;

#[tokio::test]
async fn field_rep_sees_only_own_leads() {
    let mut server = TestServer::spawn().await;

    server
        .seed_lead(lead_payload("Mrs Jones", Some("Alice"), Some("Bob")))
        .await;
    server
        .seed_lead(lead_payload("Mr Patel", Some("Alice"), Some("Carol")))
        .await;
    server
        .seed_lead(lead_payload("Ms Green", Some("Dave"), None))
        .await;

    let bob = server.token("app_user:bob", "bob@example.com", "Bob", Role::FieldRep);
    let (status, body) = server.get("/api/leads", &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    let items = body["data"]["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["customer_name"], "Mrs Jones");
    assert_eq!(items[0]["field_rep"], "Bob");

    // Account manager scope covers both of her reps' leads
    let alice = server.token(
        "app_user:alice",
        "alice@example.com",
        "Alice",
        Role::AccountManager,
    );
    let (status, body) = server.get("/api/leads", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);

    // Admin sees everything
    let admin = server.admin_token();
    let (status, body) = server.get("/api/leads", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
}

#[tokio::test]
async fn caller_filters_narrow_but_never_widen_scope() {
    let mut server = TestServer::spawn().await;

    server
        .seed_lead(lead_payload("Mrs Jones", Some("Alice"), Some("Bob")))
        .await;
    server
        .seed_lead(lead_payload("Mr Patel", Some("Alice"), Some("Carol")))
        .await;

    // Bob asking for Carol's leads by filter gets nothing, not Carol's rows
    let bob = server.token("app_user:bob", "bob@example.com", "Bob", Role::FieldRep);
    let (status, body) = server.get("/api/leads?field_rep=Carol", &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    // The same filter from admin works as a plain filter
    let admin = server.admin_token();
    let (status, body) = server.get("/api/leads?field_rep=Carol", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn out_of_scope_get_is_indistinguishable_from_missing() {
    let mut server = TestServer::spawn().await;

    let carols_lead = server
        .seed_lead(lead_payload("Mr Patel", Some("Alice"), Some("Carol")))
        .await;

    let bob = server.token("app_user:bob", "bob@example.com", "Bob", Role::FieldRep);

    // Existing but out of scope
    let (status, out_of_scope) = server
        .get(&format!("/api/leads/{}", carols_lead), &bob)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(out_of_scope["code"], "E0003");

    // Genuinely missing after the admin deletes it
    let admin = server.admin_token();
    let (status, _) = server
        .delete(&format!("/api/leads/{}", carols_lead), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, missing) = server
        .get(&format!("/api/leads/{}", carols_lead), &bob)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Same status, same code, same message: existence leaks nothing
    assert_eq!(out_of_scope["code"], missing["code"]);
    assert_eq!(out_of_scope["message"], missing["message"]);
}

#[tokio::test]
async fn installer_scope_follows_installer_attribution() {
    let mut server = TestServer::spawn().await;

    let admin = server.admin_token();
    let (status, response) = server
        .post(
            "/api/leads",
            &admin,
            serde_json::json!({
                "customer_name": "Mr Solar",
                "customer_tel": "07700 900555",
                "first_line_of_address": "9 Panel Close",
                "postcode": "YO1 7HH",
                "installer": "Ian",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "seed failed: {}", response);

    server
        .seed_lead(lead_payload("Mrs Jones", Some("Alice"), Some("Bob")))
        .await;

    let ian = server.token("app_user:ian", "ian@example.com", "Ian", Role::Installer);
    let (status, body) = server.get("/api/leads", &ian).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["installer"], "Ian");
}

#[tokio::test]
async fn api_rejects_missing_and_invalid_tokens() {
    let mut server = TestServer::spawn().await;

    let (status, body) = server.request("GET", "/api/leads", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3001");

    let (status, body) = server
        .request("GET", "/api/leads", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3002");

    // Health stays public
    let (status, body) = server.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn expired_tokens_get_their_own_error_code() {
    use lead_server::auth::{JwtConfig, JwtService};

    let mut server = TestServer::spawn().await;

    // Same secret, expiry already in the past
    let stale_issuer = JwtService::with_config(JwtConfig {
        secret: "integration-test-secret-key-0123456789".to_string(),
        expiration_minutes: -10,
        issuer: "lead-server".to_string(),
        audience: "dashboard-clients".to_string(),
    });
    let expired = stale_issuer
        .generate_token("app_user:bob", "bob@example.com", "Bob", Role::FieldRep)
        .expect("generate expired token");

    let (status, body) = server
        .request("GET", "/api/leads", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3003");
}

#[tokio::test]
async fn profile_echoes_the_token_identity() {
    let mut server = TestServer::spawn().await;

    let bob = server.token("app_user:bob", "bob@example.com", "Bob", Role::FieldRep);
    let (status, body) = server.get("/api/profile", &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "app_user:bob");
    assert_eq!(body["data"]["email"], "bob@example.com");
    assert_eq!(body["data"]["full_name"], "Bob");
    assert_eq!(body["data"]["role"], "field_rep");
}

#[tokio::test]
async fn search_matches_case_insensitively_inside_scope() {
    let mut server = TestServer::spawn().await;

    server
        .seed_lead(lead_payload("Mrs Jones", Some("Alice"), Some("Bob")))
        .await;
    server
        .seed_lead(lead_payload("Mr Patel", Some("Alice"), Some("Carol")))
        .await;

    let admin = server.admin_token();
    let (status, body) = server.get("/api/leads?search=jones", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["customer_name"], "Mrs Jones");

    // Postcode matches through the same OR clause
    let (status, body) = server.get("/api/leads?search=ls1", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);

    // Search never widens scope: Carol's lead stays invisible to Bob
    let bob = server.token("app_user:bob", "bob@example.com", "Bob", Role::FieldRep);
    let (status, body) = server.get("/api/leads?search=patel", &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn pagination_is_validated_and_stable() {
    let mut server = TestServer::spawn().await;

    for i in 0..3 {
        server
            .seed_lead(lead_payload(
                &format!("Customer {}", i),
                Some("Alice"),
                None,
            ))
            .await;
    }

    let admin = server.admin_token();

    let (status, body) = server
        .get("/api/leads?page=1&page_size=25", &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 1);

    // Page size outside the allow-list
    let (status, body) = server
        .get("/api/leads?page=1&page_size=33", &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");

    // Zero page
    let (status, _) = server.get("/api/leads?page=0&page_size=25", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown sort column stays out of the ORDER BY clause entirely
    let (status, _) = server
        .get("/api/leads?sort_by=lead_cost&sort_dir=asc", &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
