use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// How strictly USNs and study years are checked at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsnValidation {
    /// Role-specific USN shape and role/study-year consistency.
    Strict,
    /// Deprecated: any 10-character USN, study year only range-checked.
    Legacy,
}

impl UsnValidation {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "legacy" => Ok(Self::Legacy),
            other => anyhow::bail!("USN_VALIDATION must be strict or legacy, got {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub usn_prefix: String,
    pub usn_validation: UsnValidation,
    pub access_policy_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub identity: IdentityConfig,
    pub chat: ChatConfig,
    pub directory_path: Option<PathBuf>,
    pub cors_origins: Vec<String>,
}

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = non_empty_var("DATABASE_URL");
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "campusgpt".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "campusgpt-users".into()),
            ttl_minutes: parsed_var("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: parsed_var("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let identity = IdentityConfig {
            usn_prefix: std::env::var("USN_PREFIX")
                .map(|p| p.trim().to_lowercase())
                .unwrap_or_else(|_| "4cb".into()),
            usn_validation: match std::env::var("USN_VALIDATION") {
                Ok(raw) => UsnValidation::parse(&raw)?,
                Err(_) => UsnValidation::Strict,
            },
            access_policy_path: non_empty_var("ACCESS_POLICY_PATH").map(PathBuf::from),
        };
        let chat = ChatConfig {
            api_key: non_empty_var("GEMINI_API_KEY"),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.into()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into()),
            timeout_secs: parsed_var("GEMINI_TIMEOUT_SECS").unwrap_or(30),
            temperature: parsed_var("GEMINI_TEMPERATURE").unwrap_or(0.4),
        };
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            jwt,
            identity,
            chat,
            directory_path: non_empty_var("CAMPUS_DIRECTORY_PATH").map(PathBuf::from),
            cors_origins,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        },
        identity: IdentityConfig {
            usn_prefix: "4cb".into(),
            usn_validation: UsnValidation::Strict,
            access_policy_path: None,
        },
        chat: ChatConfig {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.into(),
            model: "gemini-2.5-flash".into(),
            timeout_secs: 5,
            temperature: 0.4,
        },
        directory_path: None,
        cors_origins: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usn_validation_parses_case_insensitively() {
        assert_eq!(UsnValidation::parse("STRICT").unwrap(), UsnValidation::Strict);
        assert_eq!(UsnValidation::parse(" legacy ").unwrap(), UsnValidation::Legacy);
        assert!(UsnValidation::parse("loose").is_err());
    }
}
