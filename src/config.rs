// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, default values and the startup loader.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding `coursify.redb` | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `4000` |
//! | `JWT_SECRET` | HS256 signing secret (at least 32 bytes) | Required (dev builds fall back) |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime | `900` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token lifetime | `604800` |
//! | `LOGIN_RATE_LIMIT` | Login attempts per 15 minutes per IP | `5` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | Unset (plain HTTP) |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated allowed origins | Unset (permissive) |
//! | `SEED_ADMIN_EMAIL` / `SEED_ADMIN_PASSWORD` | Admin account created at startup | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Password reset tokens are logged only at `debug` under the
//! `coursify_server::auth::identity` target. Keep that target at `info` or
//! above in production, since a logged token is a live credential.

use std::env;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const REFRESH_TOKEN_TTL_ENV: &str = "REFRESH_TOKEN_TTL_SECS";
pub const LOGIN_RATE_LIMIT_ENV: &str = "LOGIN_RATE_LIMIT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DATABASE_FILE: &str = "coursify.redb";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_LOGIN_RATE_LIMIT: u32 = 5;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Minimum accepted length of `JWT_SECRET`.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

/// PEM files for HTTPS.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Admin account created at startup when both variables are set.
#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Everything the server needs at startup.
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub login_rate_limit: NonZeroU32,
    pub tls: Option<TlsPaths>,
    pub cors_allowed_origins: Vec<String>,
    pub seed_admin: Option<SeedAdmin>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;
        let bind_addr: SocketAddr = format!("{host}:{port}").parse().map_err(|_| ConfigError::Invalid {
            name: HOST_ENV,
            value: host.clone(),
        })?;

        let jwt_secret = match var(JWT_SECRET_ENV) {
            Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => return Err(ConfigError::WeakSecret),
            Some(secret) => secret.into_bytes(),
            None => dev_secret()?,
        };

        let access_token_ttl_secs = parse_or(
            var(ACCESS_TOKEN_TTL_ENV),
            ACCESS_TOKEN_TTL_ENV,
            DEFAULT_ACCESS_TOKEN_TTL_SECS,
        )?;
        let refresh_token_ttl_secs = parse_or(
            var(REFRESH_TOKEN_TTL_ENV),
            REFRESH_TOKEN_TTL_ENV,
            DEFAULT_REFRESH_TOKEN_TTL_SECS,
        )?;
        if access_token_ttl_secs <= 0 || refresh_token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: ACCESS_TOKEN_TTL_ENV,
                value: format!("{access_token_ttl_secs}/{refresh_token_ttl_secs}"),
            });
        }

        let attempts = parse_or(var(LOGIN_RATE_LIMIT_ENV), LOGIN_RATE_LIMIT_ENV, DEFAULT_LOGIN_RATE_LIMIT)?;
        let login_rate_limit = NonZeroU32::new(attempts).ok_or(ConfigError::Invalid {
            name: LOGIN_RATE_LIMIT_ENV,
            value: attempts.to_string(),
        })?;

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        let cors_allowed_origins = var(CORS_ALLOWED_ORIGINS_ENV)
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let seed_admin = match (var(SEED_ADMIN_EMAIL_ENV), var(SEED_ADMIN_PASSWORD_ENV)) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            _ => None,
        };

        Ok(Self {
            data_dir,
            bind_addr,
            jwt_secret,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
            login_rate_limit,
            tls,
            cors_allowed_origins,
            seed_admin,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// Random per-process secret for local development. Tokens do not survive
/// a restart.
#[cfg(feature = "dev")]
fn dev_secret() -> Result<Vec<u8>, ConfigError> {
    tracing::warn!("JWT_SECRET not set; using an ephemeral development secret");
    Ok(format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple()).into_bytes())
}

#[cfg(not(feature = "dev"))]
fn dev_secret() -> Result<Vec<u8>, ConfigError> {
    Err(ConfigError::Missing(JWT_SECRET_ENV))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[(JWT_SECRET_ENV, SECRET)]).unwrap();
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.access_token_ttl_secs, 900);
        assert_eq!(config.refresh_token_ttl_secs, 604800);
        assert_eq!(config.login_rate_limit.get(), 5);
        assert!(config.tls.is_none());
        assert!(config.cors_allowed_origins.is_empty());
        assert!(config.database_path().ends_with(DATABASE_FILE));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(load(&[(JWT_SECRET_ENV, "short")]), Err(ConfigError::WeakSecret)));
    }

    #[cfg(not(feature = "dev"))]
    #[test]
    fn secret_is_required_outside_dev() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn tls_paths_come_in_pairs() {
        let err = load(&[(JWT_SECRET_ENV, SECRET), (TLS_CERT_PATH_ENV, "/tmp/cert.pem")]);
        assert!(matches!(err, Err(ConfigError::PartialTls)));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = load(&[
            (JWT_SECRET_ENV, SECRET),
            (CORS_ALLOWED_ORIGINS_ENV, "https://a.example, https://b.example,"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn invalid_numbers_are_reported() {
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, SECRET), (PORT_ENV, "eighty")]),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, SECRET), (LOGIN_RATE_LIMIT_ENV, "0")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
