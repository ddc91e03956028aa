// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Startup configuration validation.
//!
//! [`validate`] is the only way to obtain a [`ValidatedConfig`]. It runs
//! before anything else is wired, so a misconfigured process exits without
//! touching the database or binding a listener.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use super::{
    ConfigView, EnvironmentMode, CONNECTION_STRING_KEY, CORS_ALLOWED_ORIGINS_KEY,
    DEFAULT_HOST, DEFAULT_JWT_EXPIRATION_MINUTES, DEFAULT_PORT, HOST_KEY,
    JWT_AUDIENCE_KEY, JWT_EXPIRATION_KEY, JWT_ISSUER_KEY, JWT_SECRET_KEY, PORT_KEY,
    TLS_CERT_PATH_KEY, TLS_KEY_PATH_KEY,
};
use crate::variant::Capabilities;

/// Minimum HS256 secret length in bytes (256 bits).
pub const MIN_SECRET_KEY_BYTES: usize = 32;

const REDB_SCHEME: &str = "redb://";

/// A single problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigIssue {
    #[error("{key} is required")]
    Missing { key: &'static str },

    #[error("{key} is malformed: {reason}")]
    Malformed { key: &'static str, reason: String },
}

impl ConfigIssue {
    pub fn key(&self) -> &'static str {
        match self {
            ConfigIssue::Missing { key } | ConfigIssue::Malformed { key, .. } => key,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("invalid configuration for the {service} service: {}", join_issues(.issues))]
    Invalid {
        service: &'static str,
        issues: Vec<ConfigIssue>,
    },
}

impl ConfigError {
    pub(crate) fn unreadable(path: &Path, reason: impl fmt::Display) -> Self {
        ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Issues reported by validation (empty for read failures).
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            ConfigError::Invalid { issues, .. } => issues,
            ConfigError::Unreadable { .. } => &[],
        }
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Location of the embedded database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl DatabaseSettings {
    /// Accepts `redb://<path>` or a bare filesystem path.
    pub fn parse(connection_string: &str) -> Result<Self, String> {
        let raw = connection_string.trim();
        let path = match raw.strip_prefix(REDB_SCHEME) {
            Some(rest) => rest,
            None if raw.contains("://") => {
                let scheme = raw.split("://").next().unwrap_or_default();
                return Err(format!("unsupported scheme '{scheme}', expected redb://"));
            }
            None if raw.contains(';') && raw.contains('=') => {
                return Err("key=value connection strings are not supported".to_string());
            }
            None => raw,
        };

        if path.is_empty() {
            return Err("database path is empty".to_string());
        }

        Ok(Self {
            path: PathBuf::from(path),
        })
    }
}

/// Token signing and validation settings.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtSettings {
    pub secret_key: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_minutes: u32,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_minutes", &self.expiration_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsSettings>,
}

/// Configuration that passed validation for a specific variant.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    environment: EnvironmentMode,
    database: DatabaseSettings,
    jwt: Option<JwtSettings>,
    allowed_origins: Vec<String>,
    server: ServerSettings,
}

impl ValidatedConfig {
    pub fn environment(&self) -> EnvironmentMode {
        self.environment
    }

    pub fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    /// Always present for variants that require authentication.
    pub fn jwt(&self) -> Option<&JwtSettings> {
        self.jwt.as_ref()
    }

    /// Origins for the `AllowFrontend` policy; empty means any origin.
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn server(&self) -> &ServerSettings {
        &self.server
    }
}

/// Check every key the variant needs and collect all issues.
pub fn validate(view: &ConfigView, caps: &Capabilities) -> Result<ValidatedConfig, ConfigError> {
    let mut issues = Vec::new();

    let database = validate_database(view, &mut issues);

    let jwt = if caps.requires_authentication {
        validate_jwt(view, &mut issues)
    } else {
        // Not needed by this variant: accept it only if it is complete and sound.
        let mut ignored = Vec::new();
        validate_jwt(view, &mut ignored).filter(|_| ignored.is_empty())
    };

    let allowed_origins = validate_origins(view, &mut issues);
    let server = validate_server(view, &mut issues);

    if !issues.is_empty() {
        return Err(ConfigError::Invalid {
            service: caps.name,
            issues,
        });
    }

    match (database, server) {
        (Some(database), Some(server)) => Ok(ValidatedConfig {
            environment: view.environment_mode(),
            database,
            jwt,
            allowed_origins,
            server,
        }),
        // Every `None` above records an issue.
        _ => Err(ConfigError::Invalid {
            service: caps.name,
            issues,
        }),
    }
}

fn validate_database(view: &ConfigView, issues: &mut Vec<ConfigIssue>) -> Option<DatabaseSettings> {
    let Some(raw) = view.get_non_empty(CONNECTION_STRING_KEY) else {
        issues.push(ConfigIssue::Missing {
            key: CONNECTION_STRING_KEY,
        });
        return None;
    };

    match DatabaseSettings::parse(raw) {
        Ok(settings) => Some(settings),
        Err(reason) => {
            issues.push(ConfigIssue::Malformed {
                key: CONNECTION_STRING_KEY,
                reason,
            });
            None
        }
    }
}

fn validate_jwt(view: &ConfigView, issues: &mut Vec<ConfigIssue>) -> Option<JwtSettings> {
    let mut required = |key: &'static str| {
        let value = view.get_non_empty(key).map(str::to_string);
        if value.is_none() {
            issues.push(ConfigIssue::Missing { key });
        }
        value
    };

    let secret_key = required(JWT_SECRET_KEY);
    let issuer = required(JWT_ISSUER_KEY);
    let audience = required(JWT_AUDIENCE_KEY);

    if let Some(secret) = &secret_key {
        if secret.len() < MIN_SECRET_KEY_BYTES {
            issues.push(ConfigIssue::Malformed {
                key: JWT_SECRET_KEY,
                reason: format!("must be at least {MIN_SECRET_KEY_BYTES} bytes"),
            });
        }
    }

    let expiration_minutes = match view.get_non_empty(JWT_EXPIRATION_KEY) {
        None => DEFAULT_JWT_EXPIRATION_MINUTES,
        Some(raw) => match raw.parse::<u32>() {
            Ok(minutes) if minutes > 0 => minutes,
            _ => {
                issues.push(ConfigIssue::Malformed {
                    key: JWT_EXPIRATION_KEY,
                    reason: format!("'{raw}' is not a positive number of minutes"),
                });
                DEFAULT_JWT_EXPIRATION_MINUTES
            }
        },
    };

    Some(JwtSettings {
        secret_key: secret_key?,
        issuer: issuer?,
        audience: audience?,
        expiration_minutes,
    })
    .filter(|jwt| jwt.secret_key.len() >= MIN_SECRET_KEY_BYTES)
}

fn validate_origins(view: &ConfigView, issues: &mut Vec<ConfigIssue>) -> Vec<String> {
    let Some(raw) = view.get_non_empty(CORS_ALLOWED_ORIGINS_KEY) else {
        return Vec::new();
    };

    let mut origins = Vec::new();
    for candidate in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match Url::parse(candidate) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
                origins.push(url.origin().ascii_serialization());
            }
            _ => issues.push(ConfigIssue::Malformed {
                key: CORS_ALLOWED_ORIGINS_KEY,
                reason: format!("'{candidate}' is not an http(s) origin"),
            }),
        }
    }
    origins
}

fn validate_server(view: &ConfigView, issues: &mut Vec<ConfigIssue>) -> Option<ServerSettings> {
    let host = view.get_non_empty(HOST_KEY).unwrap_or(DEFAULT_HOST).to_string();

    let port = match view.get_non_empty(PORT_KEY) {
        None => Some(DEFAULT_PORT),
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                issues.push(ConfigIssue::Malformed {
                    key: PORT_KEY,
                    reason: format!("'{raw}' is not a valid port"),
                });
                None
            }
        },
    };

    let tls = match (
        view.get_non_empty(TLS_CERT_PATH_KEY),
        view.get_non_empty(TLS_KEY_PATH_KEY),
    ) {
        (Some(cert), Some(key)) => Some(TlsSettings {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        }),
        (None, None) => None,
        (Some(_), None) => {
            issues.push(ConfigIssue::Missing {
                key: TLS_KEY_PATH_KEY,
            });
            None
        }
        (None, Some(_)) => {
            issues.push(ConfigIssue::Missing {
                key: TLS_CERT_PATH_KEY,
            });
            None
        }
    };

    Some(ServerSettings {
        host,
        port: port?,
        tls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn view(items: &[(&str, &str)]) -> ConfigView {
        ConfigView::from_layers(
            Vec::new(),
            items.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    fn user_view() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ConnectionStrings__DefaultConnection", "redb:///tmp/app.redb"),
            ("Jwt__SecretKey", SECRET),
            ("Jwt__Issuer", "recipe-app"),
            ("Jwt__Audience", "recipe-app-clients"),
        ]
    }

    #[test]
    fn recipe_needs_only_connection_string() {
        let config = validate(
            &view(&[("ConnectionStrings__DefaultConnection", "/tmp/app.redb")]),
            &Variant::Recipe.capabilities(),
        )
        .unwrap();
        assert_eq!(config.database().path, PathBuf::from("/tmp/app.redb"));
        assert!(config.jwt().is_none());
        assert_eq!(config.server().port, DEFAULT_PORT);
        assert_eq!(config.environment(), EnvironmentMode::Production);
    }

    #[test]
    fn database_url_alias_is_accepted() {
        let config = validate(
            &view(&[("DATABASE_URL", "redb://data/app.redb")]),
            &Variant::Recipe.capabilities(),
        )
        .unwrap();
        assert_eq!(config.database().path, PathBuf::from("data/app.redb"));
    }

    #[test]
    fn missing_connection_string_is_reported() {
        let err = validate(&view(&[]), &Variant::Recipe.capabilities()).unwrap_err();
        assert_eq!(
            err.issues(),
            &[ConfigIssue::Missing {
                key: CONNECTION_STRING_KEY
            }]
        );
        assert!(err.to_string().contains("recipe service"));
    }

    #[test]
    fn foreign_connection_strings_are_malformed() {
        for raw in [
            "mysql://localhost/recipes",
            "Server=localhost;Database=recipes;",
            "redb://",
        ] {
            let err = validate(
                &view(&[("ConnectionStrings__DefaultConnection", raw)]),
                &Variant::Recipe.capabilities(),
            )
            .unwrap_err();
            assert!(
                matches!(err.issues(), [ConfigIssue::Malformed { key, .. }] if *key == CONNECTION_STRING_KEY),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn user_requires_all_jwt_keys() {
        let err = validate(
            &view(&[("ConnectionStrings__DefaultConnection", "/tmp/app.redb")]),
            &Variant::User.capabilities(),
        )
        .unwrap_err();
        let keys: Vec<_> = err.issues().iter().map(ConfigIssue::key).collect();
        assert_eq!(keys, vec![JWT_SECRET_KEY, JWT_ISSUER_KEY, JWT_AUDIENCE_KEY]);
    }

    #[test]
    fn user_rejects_weak_secret() {
        let mut items = user_view();
        items[1] = ("Jwt__SecretKey", "short");
        let err = validate(&view(&items), &Variant::User.capabilities()).unwrap_err();
        assert!(matches!(
            err.issues(),
            [ConfigIssue::Malformed { key, .. }] if *key == JWT_SECRET_KEY
        ));
    }

    #[test]
    fn user_config_carries_jwt_settings() {
        let config = validate(&view(&user_view()), &Variant::User.capabilities()).unwrap();
        let jwt = config.jwt().unwrap();
        assert_eq!(jwt.issuer, "recipe-app");
        assert_eq!(jwt.audience, "recipe-app-clients");
        assert_eq!(jwt.expiration_minutes, DEFAULT_JWT_EXPIRATION_MINUTES);
        assert!(!format!("{jwt:?}").contains(SECRET));
    }

    #[test]
    fn recipe_ignores_incomplete_jwt_settings() {
        let config = validate(
            &view(&[
                ("ConnectionStrings__DefaultConnection", "/tmp/app.redb"),
                ("Jwt__Issuer", "recipe-app"),
            ]),
            &Variant::Recipe.capabilities(),
        )
        .unwrap();
        assert!(config.jwt().is_none());
    }

    #[test]
    fn optional_keys_are_checked_when_present() {
        let mut items = user_view();
        items.push(("PORT", "eighty"));
        items.push(("Jwt__ExpirationMinutes", "0"));
        items.push(("Cors__AllowedOrigins", "https://app.example.com, not-a-url"));
        items.push(("TLS_CERT_PATH", "/etc/tls/cert.pem"));

        let err = validate(&view(&items), &Variant::User.capabilities()).unwrap_err();
        let keys: Vec<_> = err.issues().iter().map(ConfigIssue::key).collect();
        assert_eq!(
            keys,
            vec![
                JWT_EXPIRATION_KEY,
                CORS_ALLOWED_ORIGINS_KEY,
                PORT_KEY,
                TLS_KEY_PATH_KEY
            ]
        );
    }

    #[test]
    fn allowed_origins_are_normalized() {
        let mut items = user_view();
        items.push((
            "Cors__AllowedOrigins",
            "https://app.example.com/, http://localhost:3000",
        ));
        let config = validate(&view(&items), &Variant::User.capabilities()).unwrap();
        assert_eq!(
            config.allowed_origins(),
            &[
                "https://app.example.com".to_string(),
                "http://localhost:3000".to_string()
            ]
        );
    }
}
