use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use platform_db::DbPool;
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement, Value as DbValue,
};
use serde_json::Value;
use server::config::AppConfig;
use server::http::{AppState, build_router};
use tower::ServiceExt;
use uuid::Uuid;

pub async fn test_env() -> (Router, DbPool) {
    test_env_with(|_| {}).await
}

/// Build a router over a fresh in-memory SQLite schema. The closure can
/// flip config switches before the router is constructed.
pub async fn test_env_with(tweak: impl FnOnce(&mut AppConfig)) -> (Router, DbPool) {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    bootstrap_sqlite(&conn).await;
    let mut config = AppConfig {
        jwt_secret: "test-secret".into(),
        local_auth_enabled: true,
        admin_api_enabled: true,
        session_ttl_minutes: 15,
        cors_allowed_origins: vec![],
    };
    tweak(&mut config);
    let auth = Arc::new(config.auth());
    let state = AppState {
        pool: conn.clone(),
        config: Arc::new(config),
        auth,
    };
    (build_router(state), conn)
}

pub async fn bootstrap_sqlite(db: &DatabaseConnection) {
    let statements = [
        "PRAGMA foreign_keys = ON;",
        r#"
        CREATE TABLE "user" (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            role TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT 0,
            phone TEXT,
            department TEXT,
            shift TEXT,
            employee_code TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
        r#"
        CREATE TABLE user_identity (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
            provider TEXT NOT NULL,
            subject TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (provider, subject)
        );
        "#,
        r#"
        CREATE TABLE user_secret (
            user_id TEXT PRIMARY KEY REFERENCES "user"(id) ON DELETE CASCADE,
            password_hash TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
        r#"
        CREATE TABLE product (
            id TEXT PRIMARY KEY,
            sku TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            price_cents INTEGER NOT NULL DEFAULT 0,
            stock_qty INTEGER NOT NULL DEFAULT 0,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ];
    for sql in statements {
        db.execute(Statement::from_string(DatabaseBackend::Sqlite, sql))
            .await
            .unwrap();
    }
}

pub async fn insert_product(
    db: &DatabaseConnection,
    sku: &str,
    name: &str,
    category: &str,
    price_cents: i64,
    is_active: bool,
) {
    let now = Utc::now().to_rfc3339();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO product (id, sku, name, category, price_cents, stock_qty, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            Uuid::new_v4().into(),
            sku.into(),
            name.into(),
            category.into(),
            price_cents.into(),
            10_i32.into(),
            is_active.into(),
            now.clone().into(),
            DbValue::from(now),
        ],
    ))
    .await
    .unwrap();
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_string))
        .collect();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        set_cookies,
        body,
    }
}

/// SQLite hands booleans back as integers through the generic JSON reader.
pub fn is_truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true)) || value.as_i64() == Some(1)
}

pub async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let result = db
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT COUNT(*) AS n FROM \"{table}\""),
        ))
        .await
        .unwrap()
        .unwrap();
    result.try_get::<i64>("", "n").unwrap()
}
