pub mod admin;
pub mod auth;
pub mod products;

use entity::user;
use platform_api::ApiError;
use platform_authn::Role;
use platform_db::DbError;
use sea_orm::DbErr;
use serde::Serialize;
use uuid::Uuid;

/// User shape returned by auth and admin endpoints. Never carries the
/// password hash or identity rows.
#[derive(Debug, Clone, Serialize)]
pub struct UserPayload {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: &'static str,
    pub is_active: bool,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub shift: Option<String>,
    pub employee_code: Option<String>,
}

impl From<user::Model> for UserPayload {
    fn from(model: user::Model) -> Self {
        let role: Role = model.role.into();
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            display_name: model.display_name,
            role: role.as_str(),
            is_active: model.is_active,
            phone: model.phone,
            department: model.department,
            shift: model.shift,
            employee_code: model.employee_code,
        }
    }
}

/// Errors reported by the data-access layer surface as 400s with the
/// helper's message; anything the routes hit directly is an internal 500.
pub(crate) fn helper_error(err: DbError) -> ApiError {
    ApiError::InvalidInput(err.to_string())
}

pub(crate) fn db_error(err: DbErr) -> ApiError {
    ApiError::internal(err.into())
}
