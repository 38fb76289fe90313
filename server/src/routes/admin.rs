//! Admin surface: generic table reads and user management. These routes do
//! no caller authorization of their own; they are gated only on the admin
//! capability being configured at all.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use platform_api::{ApiError, ApiResult};
use platform_authn::{Role, hash_password};
use platform_db::{NewUser, TableQuery, UserChanges};
use sea_orm::JsonValue;
use serde::Deserialize;
use uuid::Uuid;

use super::{UserPayload, helper_error};
use crate::http::AppState;

#[derive(Debug, Deserialize)]
pub struct TableParams {
    pub limit: Option<u64>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub ascending: Option<bool>,
}

pub async fn read_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<TableParams>,
) -> ApiResult<Json<Vec<JsonValue>>> {
    ensure_admin_api(&state)?;
    let mut query = TableQuery::new();
    if let Some(column) = params.order_by {
        query = query.order_by(column, params.ascending.unwrap_or(true));
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    let rows = platform_db::fetch_rows(&state.pool, &table, &query)
        .await
        .map_err(helper_error)?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserMetadata {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub shift: Option<String>,
    pub employee_code: Option<String>,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<Response> {
    ensure_admin_api(&state)?;
    let email = required_field(body.email, "email")?.to_lowercase();
    let password = required_field(body.password, "password")?;
    let metadata = body.metadata;

    let role = parse_role(metadata.role.as_deref())?.unwrap_or(Role::Employee);
    let username = metadata
        .username
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let display_name = metadata
        .display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| username.clone());
    let password_hash = hash_password(&password).map_err(|err| ApiError::internal(err.into()))?;

    let created = platform_db::create_user(
        &state.pool,
        NewUser {
            username,
            email,
            display_name,
            role: role.into(),
            password_hash,
            // Admin-created accounts skip the approval queue unless asked
            // otherwise.
            is_active: metadata.is_active.unwrap_or(true),
            phone: metadata.phone,
            department: metadata.department,
            shift: metadata.shift,
            employee_code: metadata.employee_code,
        },
    )
    .await
    .map_err(helper_error)?;

    Ok((StatusCode::CREATED, Json(UserPayload::from(created))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub shift: Option<String>,
    pub employee_code: Option<String>,
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserPayload>> {
    ensure_admin_api(&state)?;
    let role = parse_role(body.role.as_deref())?;
    let password_hash = match body.password {
        Some(password) => {
            Some(hash_password(&password).map_err(|err| ApiError::internal(err.into()))?)
        }
        None => None,
    };
    let changes = UserChanges {
        display_name: body.display_name,
        role: role.map(Into::into),
        is_active: body.is_active,
        password_hash,
        phone: body.phone.map(Some),
        department: body.department.map(Some),
        shift: body.shift.map(Some),
        employee_code: body.employee_code.map(Some),
    };
    let updated = platform_db::update_user(&state.pool, id, changes)
        .await
        .map_err(helper_error)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(UserPayload::from(updated)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ensure_admin_api(&state)?;
    let deleted = platform_db::delete_user(&state.pool, id)
        .await
        .map_err(helper_error)?;
    if !deleted {
        return Err(ApiError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_admin_api(state: &AppState) -> ApiResult<()> {
    if state.config.admin_api_enabled {
        Ok(())
    } else {
        Err(ApiError::Unavailable("admin API"))
    }
}

fn required_field(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidInput(format!("{name} is required")))
}

fn parse_role(value: Option<&str>) -> ApiResult<Option<Role>> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let upper = raw.trim().to_uppercase();
            Role::from_str(&upper)
                .map(Some)
                .ok_or_else(|| ApiError::InvalidInput(format!("Unknown role {raw}")))
        }
    }
}
