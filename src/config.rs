use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

/// Errors raised while assembling configuration or loading key material.
///
/// Any of these aborts process startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("unsupported token algorithm {0:?}, an asymmetric algorithm is required")]
    UnsupportedAlgorithm(String),
    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {kind} key: {reason}")]
    MalformedKey { kind: &'static str, reason: String },
}

/// Token signing and lifetime settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub algorithm: Algorithm,
    pub access_token_ttl: chrono::Duration,
    pub refresh_token_ttl: chrono::Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            private_key_path: PathBuf::from("certs/private_key.pem"),
            public_key_path: PathBuf::from("certs/public_key.pem"),
            algorithm: Algorithm::RS256,
            access_token_ttl: chrono::Duration::days(1),
            refresh_token_ttl: chrono::Duration::days(7),
        }
    }
}

/// Lowest bcrypt work factor the `bcrypt` crate accepts.
pub const MIN_BCRYPT_COST: u32 = 4;
/// Highest bcrypt work factor the `bcrypt` crate accepts.
pub const MAX_BCRYPT_COST: u32 = 31;
/// bcrypt only reads this many bytes of a password and drops the rest.
pub const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

/// Password hashing settings.
#[derive(Debug, Clone, Copy)]
pub struct PasswordConfig {
    pub bcrypt_cost: u32,
    /// Longest plaintext, in bytes, the credential store accepts.
    /// bcrypt ignores everything past 72 bytes.
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_length: BCRYPT_MAX_PASSWORD_BYTES,
        }
    }
}

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = JwtConfig::default();

        let jwt = JwtConfig {
            private_key_path: env::var("JWT_PRIVATE_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.private_key_path),
            public_key_path: env::var("JWT_PUBLIC_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_key_path),
            algorithm: match env::var("JWT_ALGORITHM") {
                Ok(raw) => parse_algorithm(&raw)?,
                Err(_) => defaults.algorithm,
            },
            access_token_ttl: ttl_var("ACCESS_TOKEN_TTL_SECONDS", defaults.access_token_ttl)?,
            refresh_token_ttl: ttl_var("REFRESH_TOKEN_TTL_SECONDS", defaults.refresh_token_ttl)?,
        };

        let password_defaults = PasswordConfig::default();
        let bcrypt_cost: u32 = parsed_var("BCRYPT_COST", password_defaults.bcrypt_cost)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: format!("must be between {} and {}", MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            });
        }
        let max_length: usize = parsed_var("PASSWORD_MAX_LENGTH", password_defaults.max_length)?;
        if max_length == 0 || max_length > BCRYPT_MAX_PASSWORD_BYTES {
            return Err(ConfigError::Invalid {
                name: "PASSWORD_MAX_LENGTH",
                value: max_length.to_string(),
                reason: format!("must be between 1 and {}", BCRYPT_MAX_PASSWORD_BYTES),
            });
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            server_port: parsed_var("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt,
            password: PasswordConfig {
                bcrypt_cost,
                max_length,
            },
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Parses an algorithm name, accepting only asymmetric schemes.
pub fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(raw.trim())
        .map_err(|_| ConfigError::UnsupportedAlgorithm(raw.to_string()))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(ConfigError::UnsupportedAlgorithm(raw.to_string()))
        }
        other => Ok(other),
    }
}

fn parsed_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn ttl_var(name: &'static str, default: chrono::Duration) -> Result<chrono::Duration, ConfigError> {
    let seconds: i64 = parsed_var(name, default.num_seconds())?;
    if seconds <= 0 {
        return Err(ConfigError::Invalid {
            name,
            value: seconds.to_string(),
            reason: "must be positive".into(),
        });
    }
    Ok(chrono::Duration::seconds(seconds))
}
