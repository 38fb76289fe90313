use entity::user::Role;
use platform_db::{NewUser, UserChanges, is_unique_violation};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use serde_json::json;
use uuid::Uuid;

async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
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
    ];
    for sql in statements {
        db.execute(Statement::from_string(DatabaseBackend::Sqlite, sql))
            .await
            .unwrap();
    }
    db
}

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.into(),
        email: email.into(),
        display_name: username.into(),
        role: Role::Cashier,
        password_hash: "argon2-hash-placeholder".into(),
        is_active: false,
        phone: None,
        department: None,
        shift: None,
        employee_code: None,
    }
}

async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    let rows = platform_db::execute_raw(db, &format!("SELECT COUNT(*) AS n FROM \"{table}\""))
        .await
        .unwrap();
    rows[0]["n"].as_i64().unwrap()
}

#[tokio::test]
async fn creation_writes_profile_identity_and_secret_together() {
    let db = setup().await;

    let created = platform_db::create_user(&db, new_user("cashier_jane", "jane@example.test"))
        .await
        .unwrap();
    assert_eq!(created.username, "cashier_jane");
    assert!(!created.is_active);
    assert_eq!(count(&db, "user").await, 1);
    assert_eq!(count(&db, "user_identity").await, 1);
    assert_eq!(count(&db, "user_secret").await, 1);
}

#[tokio::test]
async fn duplicate_creation_fails_without_orphan_rows() {
    let db = setup().await;

    platform_db::create_user(&db, new_user("cashier_jane", "jane@example.test"))
        .await
        .unwrap();
    // Same username, different email: the profile insert fails and the
    // transaction rolls back, so no second identity row can be left behind.
    let err = platform_db::create_user(&db, new_user("cashier_jane", "other@example.test"))
        .await
        .unwrap_err();
    assert!(is_unique_violation(&err));
    assert_eq!(count(&db, "user").await, 1);
    assert_eq!(count(&db, "user_identity").await, 1);
    assert_eq!(count(&db, "user_secret").await, 1);
}

#[tokio::test]
async fn updates_flip_activation_and_role() {
    let db = setup().await;

    let created = platform_db::create_user(&db, new_user("floor_lee", "lee@example.test"))
        .await
        .unwrap();

    let updated = platform_db::update_user(
        &db,
        created.id,
        UserChanges {
            is_active: Some(true),
            role: Some(Role::Manager),
            display_name: Some("Lee M.".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .expect("user exists");
    assert!(updated.is_active);
    assert_eq!(updated.role, Role::Manager);
    assert_eq!(updated.display_name, "Lee M.");

    let missing = platform_db::update_user(
        &db,
        Uuid::new_v4(),
        UserChanges {
            is_active: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn password_updates_replace_the_secret() {
    let db = setup().await;

    let created = platform_db::create_user(&db, new_user("till_amy", "amy@example.test"))
        .await
        .unwrap();
    platform_db::update_user(
        &db,
        created.id,
        UserChanges {
            password_hash: Some("fresh-hash".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let rows = platform_db::execute_raw(&db, "SELECT password_hash FROM user_secret")
        .await
        .unwrap();
    assert_eq!(rows[0]["password_hash"], json!("fresh-hash"));
}

#[tokio::test]
async fn deletion_cascades_to_identity_and_secret() {
    let db = setup().await;

    let created = platform_db::create_user(&db, new_user("stock_kim", "kim@example.test"))
        .await
        .unwrap();
    assert!(platform_db::delete_user(&db, created.id).await.unwrap());
    assert_eq!(count(&db, "user").await, 0);
    assert_eq!(count(&db, "user_identity").await, 0);
    assert_eq!(count(&db, "user_secret").await, 0);

    // Deleting again reports nothing removed.
    assert!(!platform_db::delete_user(&db, created.id).await.unwrap());
}
