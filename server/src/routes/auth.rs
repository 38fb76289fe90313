//! Portal authentication: login, registration, logout and session
//! introspection. Each portal is one role; a profile may only enter the
//! portal matching its role, and only once an administrator has activated it.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use entity::{user, user_secret};
use platform_api::{ApiError, ApiResult, ErrorBody};
use platform_authn::{
    Role, SESSION_COOKIE, decode_token, hash_password, issue_token, validate_signup,
    verify_password,
};
use platform_db::{NewUser, is_unique_violation};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{UserPayload, db_error};
use crate::http::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub shift: Option<String>,
    pub employee_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserPayload,
}

pub async fn login(
    State(state): State<AppState>,
    Path(portal): Path<String>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    let portal = parse_portal(&portal)?;
    if !state.config.local_auth_enabled {
        return Err(ApiError::Unavailable("local authentication"));
    }

    let lookup = body.username.trim();
    let record = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(lookup))
                .add(user::Column::Email.eq(lookup.to_lowercase())),
        )
        .one(&state.pool)
        .await
        .map_err(db_error)?;
    // A missing profile row is indistinguishable from bad credentials.
    let Some(record) = record else {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };
    let secret = user_secret::Entity::find_by_id(record.id)
        .one(&state.pool)
        .await
        .map_err(db_error)?;
    let Some(secret) = secret else {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };
    let verified = verify_password(&body.password, &secret.password_hash)
        .map_err(|err| ApiError::internal(err.into()))?;
    if !verified {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }
    if !record.is_active {
        return Err(ApiError::Forbidden(
            "Your account is pending approval by an administrator".into(),
        ));
    }
    let role: Role = record.role.into();
    if role != portal {
        // Revoke whatever session came along with the request; the wrong
        // portal must not keep an authenticated cookie around.
        let jar = jar.remove(clear_cookie());
        let message = format!(
            "This account cannot sign in to the {} portal",
            portal.portal_slug()
        );
        return Ok((StatusCode::FORBIDDEN, jar, Json(ErrorBody::new(message))).into_response());
    }

    let token = issue_token(record.id, role, &state.auth)
        .map_err(|err| ApiError::internal(err.into()))?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(state.auth.session_ttl_minutes))
        .build();
    let jar = jar.add(cookie);
    info!(user = %record.username, portal = portal.portal_slug(), "portal login");
    Ok((jar, Json(UserPayload::from(record))).into_response())
}

pub async fn register(
    State(state): State<AppState>,
    Path(portal): Path<String>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let portal = parse_portal(&portal)?;
    if !state.config.local_auth_enabled {
        return Err(ApiError::Unavailable("local authentication"));
    }

    // All field checks run before any database work; the first failing
    // field rejects the submission.
    let (username, email) = validate_signup(
        &body.username,
        &body.email,
        &body.password,
        &body.confirm_password,
    )
    .map_err(|err| ApiError::InvalidInput(err.to_string()))?;

    let password_hash =
        hash_password(&body.password).map_err(|err| ApiError::internal(err.into()))?;
    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&username)
        .to_string();

    let created = platform_db::create_user(
        &state.pool,
        NewUser {
            username,
            email,
            display_name,
            role: portal.into(),
            password_hash,
            // New registrations stay inactive until an administrator
            // approves them.
            is_active: false,
            phone: body.phone,
            department: body.department,
            shift: body.shift,
            employee_code: body.employee_code,
        },
    )
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            ApiError::Conflict("That username or email is already registered".into())
        } else {
            ApiError::internal(err.into())
        }
    })?;

    info!(user = %created.username, portal = portal.portal_slug(), "registration pending approval");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration received; your account is pending approval.",
            user: UserPayload::from(created),
        }),
    )
        .into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(clear_cookie()), StatusCode::NO_CONTENT)
}

/// Session validity check. A stale token for a deactivated or deleted user
/// is rejected here rather than trusted.
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> ApiResult<Json<UserPayload>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Err(ApiError::Unauthorized("Not signed in".into()));
    };
    let claims = decode_token(cookie.value(), &state.auth)
        .map_err(|_| ApiError::Unauthorized("Session is no longer valid".into()))?;
    let record = user::Entity::find_by_id(claims.sub)
        .one(&state.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::Unauthorized("Session is no longer valid".into()))?;
    if !record.is_active {
        return Err(ApiError::Unauthorized("Session is no longer valid".into()));
    }
    Ok(Json(UserPayload::from(record)))
}

fn parse_portal(slug: &str) -> ApiResult<Role> {
    Role::from_portal_slug(slug).ok_or(ApiError::NotFound)
}

fn clear_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
