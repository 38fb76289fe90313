//! Portal authentication primitives: the role set, credential validation
//! rules, argon2 password hashing and JWT session tokens.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "lanepoint_session";

/// Every portal corresponds to exactly one role; a profile may only enter
/// the portal matching its role.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Cashier,
    Supplier,
    Customer,
}

pub const ALL_ROLES: [Role; 6] = [
    Role::Admin,
    Role::Manager,
    Role::Employee,
    Role::Cashier,
    Role::Supplier,
    Role::Customer,
];

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
            Role::Cashier => "CASHIER",
            Role::Supplier => "SUPPLIER",
            Role::Customer => "CUSTOMER",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Role::Admin),
            "MANAGER" => Some(Role::Manager),
            "EMPLOYEE" => Some(Role::Employee),
            "CASHIER" => Some(Role::Cashier),
            "SUPPLIER" => Some(Role::Supplier),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }

    /// URL path segment naming the portal, e.g. `/api/auth/cashier/login`.
    pub fn portal_slug(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
            Role::Cashier => "cashier",
            Role::Supplier => "supplier",
            Role::Customer => "customer",
        }
    }

    pub fn from_portal_slug(slug: &str) -> Option<Self> {
        ALL_ROLES.into_iter().find(|role| role.portal_slug() == slug)
    }
}

impl From<entity::user::Role> for Role {
    fn from(value: entity::user::Role) -> Self {
        match value {
            entity::user::Role::Admin => Role::Admin,
            entity::user::Role::Manager => Role::Manager,
            entity::user::Role::Employee => Role::Employee,
            entity::user::Role::Cashier => Role::Cashier,
            entity::user::Role::Supplier => Role::Supplier,
            entity::user::Role::Customer => Role::Customer,
        }
    }
}

impl From<Role> for entity::user::Role {
    fn from(value: Role) -> Self {
        match value {
            Role::Admin => entity::user::Role::Admin,
            Role::Manager => entity::user::Role::Manager,
            Role::Employee => entity::user::Role::Employee,
            Role::Cashier => entity::user::Role::Cashier,
            Role::Supplier => entity::user::Role::Supplier,
            Role::Customer => entity::user::Role::Customer,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub local_auth_enabled: bool,
    pub session_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn issue_token(
    user_id: Uuid,
    role: Role,
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.session_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = SessionClaims {
        sub: user_id,
        role: role.as_str().to_string(),
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(
    token: &str,
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<SessionClaims> {
    jsonwebtoken::decode::<SessionClaims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password")]
    Hash,
    #[error("stored password hash is invalid")]
    BadStoredHash,
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::BadStoredHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Field-level registration failure. The message names the field so the
/// caller can surface it inline; the first failing field wins.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum SignupError {
    #[error("username must be at least 3 characters using letters, digits or underscore")]
    Username,
    #[error("invalid email address")]
    Email,
    #[error("password must be at least 8 characters")]
    Password,
    #[error("passwords do not match")]
    Confirmation,
}

pub fn validate_username(value: &str) -> Result<&str, SignupError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < 3 {
        return Err(SignupError::Username);
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(SignupError::Username);
    }
    Ok(trimmed)
}

pub fn normalize_email(value: &str) -> Result<String, SignupError> {
    let trimmed = value.trim().to_lowercase();
    let mut parts = trimmed.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None)
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') =>
        {
            Ok(trimmed)
        }
        _ => Err(SignupError::Email),
    }
}

pub fn validate_password(password: &str, confirmation: &str) -> Result<(), SignupError> {
    if password.chars().count() < 8 {
        return Err(SignupError::Password);
    }
    if password != confirmation {
        return Err(SignupError::Confirmation);
    }
    Ok(())
}

/// Runs all field checks in page order and stops at the first failure.
/// Must be called before any database work on the registration path.
pub fn validate_signup(
    username: &str,
    email: &str,
    password: &str,
    confirmation: &str,
) -> Result<(String, String), SignupError> {
    let username = validate_username(username)?.to_string();
    let email = normalize_email(email)?;
    validate_password(password, confirmation)?;
    Ok((username, email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in ALL_ROLES {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
            assert_eq!(Role::from_portal_slug(role.portal_slug()), Some(role));
        }
        assert_eq!(Role::from_str("OWNER"), None);
        assert_eq!(Role::from_portal_slug("warehouse"), None);
    }

    #[test]
    fn username_rules() {
        assert_eq!(validate_username("cashier_jane"), Ok("cashier_jane"));
        assert_eq!(validate_username("  abc  "), Ok("abc"));
        assert_eq!(validate_username("ab"), Err(SignupError::Username));
        assert_eq!(validate_username("has space"), Err(SignupError::Username));
        assert_eq!(validate_username("nope!"), Err(SignupError::Username));
    }

    #[test]
    fn email_rules() {
        assert_eq!(
            normalize_email(" Jane@Example.COM "),
            Ok("jane@example.com".to_string())
        );
        assert_eq!(normalize_email("notanemail"), Err(SignupError::Email));
        assert_eq!(normalize_email("a@b"), Err(SignupError::Email));
        assert_eq!(normalize_email("two@at@signs.com"), Err(SignupError::Email));
        assert_eq!(normalize_email("@nodomain.com"), Err(SignupError::Email));
    }

    #[test]
    fn password_rules() {
        assert_eq!(validate_password("longenough", "longenough"), Ok(()));
        assert_eq!(
            validate_password("short", "short"),
            Err(SignupError::Password)
        );
        assert_eq!(
            validate_password("longenough", "different1"),
            Err(SignupError::Confirmation)
        );
    }

    #[test]
    fn first_failing_field_wins() {
        // Bad username and bad password together: username reports first.
        assert_eq!(
            validate_signup("x", "bad-email", "short", "short"),
            Err(SignupError::Username)
        );
        assert_eq!(
            validate_signup("jane", "bad-email", "short", "short"),
            Err(SignupError::Email)
        );
    }

    #[test]
    fn token_round_trip() {
        let config = AuthConfig {
            jwt_secret: "test-secret".into(),
            local_auth_enabled: true,
            session_ttl_minutes: 15,
        };
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, Role::Cashier, &config).unwrap();
        let claims = decode_token(&token, &config).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "CASHIER");
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }
}
