use anyhow::Result;
use platform_authn::AuthConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub local_auth_enabled: bool,
    pub admin_api_enabled: bool,
    pub session_ttl_minutes: i64,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let jwt_secret = std::env::var("AUTH_SECRET").unwrap_or_else(|_| "dev-secret".into());
        let local_auth_enabled = env_bool("LOCAL_AUTH_ENABLED", true);
        let admin_api_enabled = env_bool("ADMIN_API_ENABLED", true);
        let session_ttl_minutes = std::env::var("SESSION_TTL_MINUTES")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(60);
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .filter_map(|origin| {
                let trimmed = origin.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            jwt_secret,
            local_auth_enabled,
            admin_api_enabled,
            session_ttl_minutes,
            cors_allowed_origins,
        })
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            local_auth_enabled: self.local_auth_enabled,
            session_ttl_minutes: self.session_ttl_minutes,
        }
    }
}

fn env_bool(var: &str, default: bool) -> bool {
    std::env::var(var)
        .ok()
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}
