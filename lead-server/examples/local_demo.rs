//! Local Demo - 在同进程内驱动 lead-server
//!
//! 这个示例展示不经过网络栈直接调用路由:
//! 1. HTTP API 调用 (通过 Tower oneshot，零网络开销)
//! 2. 角色作用域: 同一个列表接口，不同角色看到不同子集
//! 3. 字段级写权限矩阵: 越权字段整单拒绝
//!
//! 适用场景:
//! - 服务器内部测试
//! - 演示角色可见性规则
//!
//! 运行: cargo run -p lead-server --example local_demo

use axum::body::Body;
use http::{Request, StatusCode};
use lead_server::auth::Role;
use lead_server::core::{Config, ServerState};
use lead_server::routes::{OneshotRouter, build_app};
use serde_json::{Value, json};

async fn call(
    app: &mut axum::Router<ServerState>,
    state: &ServerState,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value), Box<dyn std::error::Error>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));
    let request = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(body.to_string()))?
        }
        None => builder.body(Body::empty())?,
    };

    let response = app.oneshot(state, request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes)?;
    Ok((status, value))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Lead Server Local Demo ===\n");

    // === 1. 初始化 ServerState ===
    println!("1. Initializing ServerState...");

    // 每次运行用干净的工作目录，计数从零开始
    let temp_dir = std::env::temp_dir().join("lead-server-local-demo");
    let _ = std::fs::remove_dir_all(&temp_dir);
    std::fs::create_dir_all(&temp_dir)?;

    let config = Config::with_overrides(temp_dir.to_string_lossy(), 0);
    let state = ServerState::initialize(&config).await;
    state.start_background_tasks();

    let mut app = build_app(&state);
    println!("   ServerState initialized.\n");

    // === 2. 铸造令牌 (模拟外部身份服务) ===
    println!("2. Minting tokens...");
    let jwt = state.get_jwt_service();
    let admin = jwt.generate_token("app_user:admin", "admin@example.com", "Site Admin", Role::Admin)?;
    let bob = jwt.generate_token("app_user:bob", "bob@example.com", "Bob", Role::FieldRep)?;
    println!("   admin + field rep tokens ready.\n");

    // === 3. 管理员录入两条 lead ===
    println!("3. Seeding leads as admin...");
    for (customer, rep) in [("Mrs Jones", Some("Bob")), ("Mr Patel", Some("Carol"))] {
        let (status, response) = call(
            &mut app,
            &state,
            "POST",
            "/api/leads",
            &admin,
            Some(json!({
                "customer_name": customer,
                "customer_tel": "07700 900123",
                "first_line_of_address": "1 Solar Way",
                "postcode": "LS1 4AB",
                "account_manager": "Alice",
                "field_rep": rep,
            })),
        )
        .await?;
        println!(
            "   POST /api/leads [{}] -> {} ({})",
            customer, status, response["code"]
        );
    }
    println!();

    // === 4. 同一个列表，两种视角 ===
    println!("4. Listing leads per role...");
    let (_, body) = call(&mut app, &state, "GET", "/api/leads", &admin, None).await?;
    println!("   admin sees {} lead(s)", body["data"]["total"]);
    let (_, body) = call(&mut app, &state, "GET", "/api/leads", &bob, None).await?;
    println!("   Bob (field rep) sees {} lead(s)", body["data"]["total"]);
    let bob_lead_id = body["data"]["items"][0]["id"]
        .as_str()
        .expect("Bob has one lead")
        .to_string();
    println!();

    // === 5. 字段级写权限: notes 可以，lead_cost 整单被拒 ===
    println!("5. Exercising the write matrix as Bob...");
    let (status, _) = call(
        &mut app,
        &state,
        "PATCH",
        &format!("/api/leads/{}", bob_lead_id),
        &bob,
        Some(json!({"notes": "spoke to customer, wants a survey"})),
    )
    .await?;
    println!("   PATCH notes -> {}", status);

    let (status, response) = call(
        &mut app,
        &state,
        "PATCH",
        &format!("/api/leads/{}", bob_lead_id),
        &bob,
        Some(json!({"notes": "also tweak the price", "lead_cost": 5.0})),
    )
    .await?;
    println!(
        "   PATCH notes + lead_cost -> {} ({})",
        status, response["message"]
    );
    println!();

    // === 6. 仪表盘指标 (管理员视角) ===
    println!("6. Dashboard metrics as admin...");
    let week = {
        use chrono::{Duration, SecondsFormat, Utc};
        let from = (Utc::now() - Duration::days(7)).to_rfc3339_opts(SecondsFormat::Secs, true);
        let to = (Utc::now() + Duration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
        format!("from={}&to={}", from, to)
    };
    let (_, body) = call(
        &mut app,
        &state,
        "GET",
        &format!("/api/metrics/dashboard?{}", week),
        &admin,
        None,
    )
    .await?;
    println!(
        "   total_leads={} surveys_booked={} conversion_leads_to_surveys={}",
        body["data"]["total_leads"],
        body["data"]["surveys_booked"],
        body["data"]["conversion_leads_to_surveys"]
    );

    println!("\nDone.");
    Ok(())
}
