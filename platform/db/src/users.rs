//! User-record operations. Creation writes the profile, identity and secret
//! rows in one transaction so a partial failure cannot leave an orphaned
//! identity behind.

use chrono::Utc;
use entity::{user, user_identity, user_secret};
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, EntityTrait, TransactionTrait};
use uuid::Uuid;

use crate::{DbError, DbPool, DbResult, log_failure};

pub const LOCAL_PROVIDER: &str = "local";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: user::Role,
    pub password_hash: String,
    pub is_active: bool,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub shift: Option<String>,
    pub employee_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub display_name: Option<String>,
    pub role: Option<user::Role>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
    pub phone: Option<Option<String>>,
    pub department: Option<Option<String>>,
    pub shift: Option<Option<String>>,
    pub employee_code: Option<Option<String>>,
}

pub async fn create_user(pool: &DbPool, input: NewUser) -> DbResult<user::Model> {
    log_failure("create_user", create_user_inner(pool, input).await)
}

async fn create_user_inner(pool: &DbPool, input: NewUser) -> DbResult<user::Model> {
    let txn = pool.begin().await?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let user_id = Uuid::new_v4();
    let model = user::ActiveModel {
        id: Set(user_id),
        username: Set(input.username),
        email: Set(input.email.clone()),
        display_name: Set(input.display_name),
        role: Set(input.role),
        is_active: Set(input.is_active),
        phone: Set(input.phone),
        department: Set(input.department),
        shift: Set(input.shift),
        employee_code: Set(input.employee_code),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    user_identity::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        provider: Set(LOCAL_PROVIDER.into()),
        subject: Set(input.email),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;
    user_secret::ActiveModel {
        user_id: Set(user_id),
        password_hash: Set(input.password_hash),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    Ok(model)
}

/// Apply the given changes; returns `None` when no such user exists.
pub async fn update_user(
    pool: &DbPool,
    user_id: Uuid,
    changes: UserChanges,
) -> DbResult<Option<user::Model>> {
    log_failure("update_user", update_user_inner(pool, user_id, changes).await)
}

async fn update_user_inner(
    pool: &DbPool,
    user_id: Uuid,
    changes: UserChanges,
) -> DbResult<Option<user::Model>> {
    let Some(existing) = user::Entity::find_by_id(user_id).one(pool).await? else {
        return Ok(None);
    };
    let now: DateTimeWithTimeZone = Utc::now().into();
    let txn = pool.begin().await?;
    let mut active: user::ActiveModel = existing.into();
    if let Some(display_name) = changes.display_name {
        active.display_name = Set(display_name);
    }
    if let Some(role) = changes.role {
        active.role = Set(role);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(phone) = changes.phone {
        active.phone = Set(phone);
    }
    if let Some(department) = changes.department {
        active.department = Set(department);
    }
    if let Some(shift) = changes.shift {
        active.shift = Set(shift);
    }
    if let Some(employee_code) = changes.employee_code {
        active.employee_code = Set(employee_code);
    }
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;
    if let Some(password_hash) = changes.password_hash {
        let secret = user_secret::ActiveModel {
            user_id: Set(user_id),
            password_hash: Set(password_hash),
            updated_at: Set(now),
        };
        user_secret::Entity::update(secret).exec(&txn).await?;
    }
    txn.commit().await?;
    Ok(Some(updated))
}

/// Delete the user record; identity and secret rows cascade with it.
pub async fn delete_user(pool: &DbPool, user_id: Uuid) -> DbResult<bool> {
    log_failure(
        "delete_user",
        async {
            let result = user::Entity::delete_by_id(user_id).exec(pool).await?;
            Ok(result.rows_affected > 0)
        }
        .await,
    )
}

/// Duplicate-key detection for friendlier registration errors. Backends word
/// the violation differently, so this matches on the message text.
pub fn is_unique_violation(err: &DbError) -> bool {
    match err {
        DbError::Db(inner) => {
            let text = inner.to_string().to_lowercase();
            text.contains("unique") || text.contains("duplicate key")
        }
        _ => false,
    }
}
