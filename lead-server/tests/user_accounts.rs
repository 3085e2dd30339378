//! Account administration: the admin-only gate, manager attribution
//! rules, duplicate emails, and soft deactivation.

mod common;

use common::TestServer;
use http::StatusCode;
use lead_server::auth::Role;
use serde_json::{Value, json};

fn rep_payload(email: &str, name: &str, manager: &str) -> Value {
    json!({
        "email": email,
        "full_name": name,
        "role": "field_rep",
        "account_manager_name": manager,
    })
}

#[tokio::test]
async fn account_routes_are_admin_only() {
    let mut server = TestServer::spawn().await;

    let alice = server.token(
        "app_user:alice",
        "alice@example.com",
        "Alice",
        Role::AccountManager,
    );
    let (status, body) = server.get("/api/users", &alice).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E2001");

    let bob = server.token("app_user:bob", "bob@example.com", "Bob", Role::FieldRep);
    let (status, _) = server
        .post("/api/users", &bob, rep_payload("x@example.com", "X", "Alice"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = server.admin_token();
    let (status, _) = server.get("/api/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn manager_attribution_is_required_for_reps_and_refused_elsewhere() {
    let mut server = TestServer::spawn().await;
    let admin = server.admin_token();

    let (status, body) = server
        .post(
            "/api/users",
            &admin,
            rep_payload("bob@example.com", "Bob", "Alice"),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "rep create failed: {}", body);
    assert_eq!(body["data"]["role"], "field_rep");
    assert_eq!(body["data"]["account_manager_name"], "Alice");
    assert_eq!(body["data"]["is_active"], true);
    assert!(
        body["data"]["id"]
            .as_str()
            .expect("user id")
            .starts_with("app_user:")
    );

    // A rep with no manager attribution cannot exist
    let (status, body) = server
        .post(
            "/api/users",
            &admin,
            json!({
                "email": "carol@example.com",
                "full_name": "Carol",
                "role": "field_rep",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");

    // And nobody else may carry one
    let (status, _) = server
        .post(
            "/api/users",
            &admin,
            json!({
                "email": "dave@example.com",
                "full_name": "Dave",
                "role": "account_manager",
                "account_manager_name": "Alice",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post(
            "/api/users",
            &admin,
            json!({
                "email": "ian@example.com",
                "full_name": "Ian",
                "role": "installer",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("account_manager_name").is_none());
}

#[tokio::test]
async fn emails_are_validated_and_unique() {
    let mut server = TestServer::spawn().await;
    let admin = server.admin_token();

    let (status, _) = server
        .post(
            "/api/users",
            &admin,
            json!({
                "email": "not-an-email",
                "full_name": "Bob",
                "role": "installer",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post(
            "/api/users",
            &admin,
            json!({
                "email": "bob@example.com",
                "full_name": "   ",
                "role": "installer",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post("/api/users", &admin, rep_payload("bob@example.com", "Bob", "Alice"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .post(
            "/api/users",
            &admin,
            rep_payload("bob@example.com", "Robert", "Alice"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E0004");

    // The same uniqueness check guards email changes
    let (status, body) = server
        .post(
            "/api/users",
            &admin,
            rep_payload("carol@example.com", "Carol", "Alice"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let carol_id = body["data"]["id"].as_str().expect("user id").to_string();
    let (status, _) = server
        .patch(
            &format!("/api/users/{}", carol_id),
            &admin,
            json!({ "email": "bob@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn deactivation_is_soft_and_never_self_inflicted() {
    let mut server = TestServer::spawn().await;
    let admin = server.admin_token();

    let (_, body) = server
        .post("/api/users", &admin, rep_payload("bob@example.com", "Bob", "Alice"))
        .await;
    let bob_id = body["data"]["id"].as_str().expect("user id").to_string();

    // The admin token carries app_user:admin as its subject
    let (status, body) = server.delete("/api/users/app_user:admin", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot deactivate your own account");

    let (status, body) = server
        .delete(&format!("/api/users/{}", bob_id), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    // Still listed, attribution history keeps resolving
    let (status, body) = server.get("/api/users", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"]
        .as_array()
        .expect("user list")
        .iter()
        .find(|u| u["email"] == "bob@example.com")
        .expect("deactivated account still listed");
    assert_eq!(listed["is_active"], false);
}

#[tokio::test]
async fn leaving_the_rep_role_clears_manager_attribution() {
    let mut server = TestServer::spawn().await;
    let admin = server.admin_token();

    let (_, body) = server
        .post("/api/users", &admin, rep_payload("bob@example.com", "Bob", "Alice"))
        .await;
    let bob_id = body["data"]["id"].as_str().expect("user id").to_string();

    let (status, body) = server
        .patch(
            &format!("/api/users/{}", bob_id),
            &admin,
            json!({ "role": "account_manager" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "account_manager");
    assert!(body["data"].get("account_manager_name").is_none());
}

#[tokio::test]
async fn missing_users_return_not_found() {
    let mut server = TestServer::spawn().await;
    let admin = server.admin_token();

    let (status, body) = server.get("/api/users/app_user:zzzzzz", &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");

    let (status, _) = server
        .patch(
            "/api/users/app_user:zzzzzz",
            &admin,
            json!({ "full_name": "Ghost" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
