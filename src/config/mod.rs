// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once at startup from two layers: an optional local
//! `.env` file and the process environment. The environment wins on conflict.
//! Keys are namespaced with `:` (`Jwt:SecretKey`); environment variables use
//! `__` as the separator (`Jwt__SecretKey`). Lookups are case-insensitive.
//!
//! ## Keys
//!
//! | Key | Description | Default |
//! |-----|-------------|---------|
//! | `ConnectionStrings:DefaultConnection` | Database location (`redb://<path>` or a path) | Required |
//! | `DATABASE_URL` | Alias for the connection string | - |
//! | `Jwt:SecretKey` | HS256 signing secret (>= 32 bytes) | Required for the User service |
//! | `Jwt:Issuer` | Expected token issuer | Required for the User service |
//! | `Jwt:Audience` | Expected token audience | Required for the User service |
//! | `Jwt:ExpirationMinutes` | Lifetime of issued tokens | `60` |
//! | `Cors:AllowedOrigins` | Comma separated origins for `AllowFrontend` | Any origin |
//! | `APP_ENVIRONMENT` | `Development` or `Production` | `Production` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files, enables HTTPS | Unset |
//! | `ENV_FILE` | Override source path | `.env` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

pub mod validation;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

pub use validation::{
    validate, ConfigError, ConfigIssue, DatabaseSettings, JwtSettings, ServerSettings,
    ValidatedConfig,
};

/// Primary database connection string key.
pub const CONNECTION_STRING_KEY: &str = "ConnectionStrings:DefaultConnection";

/// Alias accepted for the connection string.
pub const DATABASE_URL_KEY: &str = "DATABASE_URL";

pub const JWT_SECRET_KEY: &str = "Jwt:SecretKey";
pub const JWT_ISSUER_KEY: &str = "Jwt:Issuer";
pub const JWT_AUDIENCE_KEY: &str = "Jwt:Audience";
pub const JWT_EXPIRATION_KEY: &str = "Jwt:ExpirationMinutes";

/// Comma separated list of origins admitted by the `AllowFrontend` policy.
pub const CORS_ALLOWED_ORIGINS_KEY: &str = "Cors:AllowedOrigins";

/// Selects development or production behavior.
pub const ENVIRONMENT_KEY: &str = "APP_ENVIRONMENT";

pub const HOST_KEY: &str = "HOST";
pub const PORT_KEY: &str = "PORT";
pub const TLS_CERT_PATH_KEY: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_KEY: &str = "TLS_KEY_PATH";

/// Path of the local override file.
pub const ENV_FILE_KEY: &str = "ENV_FILE";
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const LOG_FORMAT_KEY: &str = "LOG_FORMAT";
pub const LOG_FILTER_KEY: &str = "RUST_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_JWT_EXPIRATION_MINUTES: u32 = 60;

/// Runtime environment mode.
///
/// Only `Development` (case-insensitive, `dev` accepted) enables development
/// behavior; every other value, including an absent one, is production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentMode {
    Development,
    Production,
}

impl EnvironmentMode {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "development" || v == "dev" => EnvironmentMode::Development,
            _ => EnvironmentMode::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == EnvironmentMode::Development
    }
}

impl fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentMode::Development => write!(f, "Development"),
            EnvironmentMode::Production => write!(f, "Production"),
        }
    }
}

/// Normalize a key or environment variable name for lookup.
///
/// `Jwt__SecretKey`, `JWT:SECRETKEY` and `jwt:secretkey` all map to the same
/// entry.
fn normalize_key(key: &str) -> String {
    key.trim().replace("__", ":").to_ascii_lowercase()
}

/// Alternate names folded into their canonical key, `(alias, canonical)`.
const KEY_ALIASES: &[(&str, &str)] = &[(DATABASE_URL_KEY, CONNECTION_STRING_KEY)];

/// Normalize one layer and fold aliases into canonical keys.
///
/// Within a layer the canonical key beats its alias; across layers the
/// higher layer wins regardless of which name it used.
fn normalize_layer<L>(layer: L) -> BTreeMap<String, String>
where
    L: IntoIterator<Item = (String, String)>,
{
    let mut values: BTreeMap<String, String> = layer
        .into_iter()
        .map(|(key, value)| (normalize_key(&key), value))
        .collect();

    for (alias, canonical) in KEY_ALIASES {
        let Some(value) = values
            .remove(&normalize_key(alias))
            .filter(|v| !v.trim().is_empty())
        else {
            continue;
        };
        let canonical = normalize_key(canonical);
        let canonical_set = values.get(&canonical).is_some_and(|v| !v.trim().is_empty());
        if !canonical_set {
            values.insert(canonical, value);
        }
    }
    values
}

/// Keep the UTF-8 entries of the process environment.
///
/// A variable whose name or value is not valid UTF-8 cannot hold any of our
/// keys, so it is skipped instead of aborting startup.
fn environment_layer<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                let name = match &key {
                    Ok(name) => name.clone(),
                    Err(raw) => raw.to_string_lossy().into_owned(),
                };
                tracing::warn!(variable = %name, "Skipping environment variable that is not valid UTF-8");
                None
            }
        })
        .collect()
}

/// Immutable, merged configuration view.
#[derive(Clone, Default)]
pub struct ConfigView {
    values: BTreeMap<String, String>,
}

// Values may hold secrets; only keys are printed.
impl fmt::Debug for ConfigView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl ConfigView {
    /// Layer `overrides` (the local file) under `environment`.
    pub fn from_layers<F, E>(overrides: F, environment: E) -> Self
    where
        F: IntoIterator<Item = (String, String)>,
        E: IntoIterator<Item = (String, String)>,
    {
        let mut values = normalize_layer(overrides);
        values.extend(normalize_layer(environment));
        Self { values }
    }

    /// Process environment only, without the override file.
    pub fn from_environment() -> Self {
        Self::from_layers(Vec::new(), environment_layer(std::env::vars_os()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Like [`ConfigView::get`] but treats blank values as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        EnvironmentMode::parse(self.get(ENVIRONMENT_KEY))
    }

}

/// Builds a [`ConfigView`] from the `.env` file and the process environment.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    env_file: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Read both layers.
    ///
    /// A missing override file is not an error; a malformed one is.
    pub fn load(&self) -> Result<ConfigView, ConfigError> {
        let environment = environment_layer(std::env::vars_os());

        let path = self
            .env_file
            .clone()
            .or_else(|| {
                environment
                    .iter()
                    .find(|(k, _)| k == ENV_FILE_KEY)
                    .map(|(_, v)| PathBuf::from(v))
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));

        let overrides = read_env_file(&path)?;
        if !overrides.is_empty() {
            tracing::debug!(
                path = %path.display(),
                entries = overrides.len(),
                "Loaded local configuration overrides"
            );
        }

        Ok(ConfigView::from_layers(overrides, environment))
    }
}

/// Parse a dotenv file without touching the process environment.
fn read_env_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(dotenvy::Error::Io(_)) => return Ok(Vec::new()),
        Err(e) => return Err(ConfigError::unreadable(path, e)),
    };

    iter.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::unreadable(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn environment_wins_over_file() {
        let view = ConfigView::from_layers(
            pairs(&[("Jwt__Issuer", "from-file"), ("Jwt__Audience", "file-aud")]),
            pairs(&[("Jwt__Issuer", "from-env")]),
        );
        assert_eq!(view.get(JWT_ISSUER_KEY), Some("from-env"));
        assert_eq!(view.get(JWT_AUDIENCE_KEY), Some("file-aud"));
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let view = ConfigView::from_layers(
            Vec::new(),
            pairs(&[("CONNECTIONSTRINGS__DEFAULTCONNECTION", "redb:///tmp/a.redb")]),
        );
        assert_eq!(view.get(CONNECTION_STRING_KEY), Some("redb:///tmp/a.redb"));
    }

    #[test]
    fn blank_values_are_absent() {
        let view = ConfigView::from_layers(Vec::new(), pairs(&[("Jwt__Issuer", "   ")]));
        assert_eq!(view.get(JWT_ISSUER_KEY), Some("   "));
        assert_eq!(view.get_non_empty(JWT_ISSUER_KEY), None);
    }

    #[test]
    fn environment_mode_defaults_to_production() {
        assert_eq!(EnvironmentMode::parse(None), EnvironmentMode::Production);
        assert_eq!(
            EnvironmentMode::parse(Some("Staging")),
            EnvironmentMode::Production
        );
        assert_eq!(
            EnvironmentMode::parse(Some("Development")),
            EnvironmentMode::Development
        );
        assert_eq!(EnvironmentMode::parse(Some("dev")), EnvironmentMode::Development);
    }

    #[test]
    fn environment_url_beats_file_connection_string() {
        let view = ConfigView::from_layers(
            pairs(&[("ConnectionStrings__DefaultConnection", "/file/app.redb")]),
            pairs(&[("DATABASE_URL", "redb:///env/app.redb")]),
        );
        assert_eq!(view.get(CONNECTION_STRING_KEY), Some("redb:///env/app.redb"));
    }

    #[test]
    fn connection_string_beats_alias_in_same_layer() {
        let view = ConfigView::from_layers(
            Vec::new(),
            pairs(&[
                ("DATABASE_URL", "/alias/app.redb"),
                ("ConnectionStrings__DefaultConnection", "/primary/app.redb"),
            ]),
        );
        assert_eq!(view.get(CONNECTION_STRING_KEY), Some("/primary/app.redb"));
    }

    #[test]
    fn alias_fills_blank_connection_string() {
        let view = ConfigView::from_layers(
            Vec::new(),
            pairs(&[
                ("ConnectionStrings__DefaultConnection", ""),
                ("DATABASE_URL", "/alias/app.redb"),
            ]),
        );
        assert_eq!(view.get_non_empty(CONNECTION_STRING_KEY), Some("/alias/app.redb"));
    }

    #[test]
    fn blank_environment_alias_keeps_file_connection_string() {
        let view = ConfigView::from_layers(
            pairs(&[("ConnectionStrings__DefaultConnection", "/file/app.redb")]),
            pairs(&[("DATABASE_URL", "  ")]),
        );
        assert_eq!(view.get(CONNECTION_STRING_KEY), Some("/file/app.redb"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_environment_entries_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("Jwt__Issuer"), OsString::from("recipe-app")),
            (OsString::from("BROKEN"), OsString::from_vec(vec![0xff, 0xfe])),
            (OsString::from_vec(vec![0xc3, 0x28]), OsString::from("value")),
        ];

        let layer = environment_layer(vars);
        assert_eq!(layer, pairs(&[("Jwt__Issuer", "recipe-app")]));
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = read_env_file(&dir.path().join("absent.env")).unwrap();
        assert!(overrides.is_empty());
    }

    #[test]
    fn env_file_entries_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Jwt__Issuer=recipe-app").unwrap();
        writeln!(file, "APP_ENVIRONMENT=Development").unwrap();

        let overrides = read_env_file(&path).unwrap();
        let view = ConfigView::from_layers(overrides, Vec::new());
        assert_eq!(view.get(JWT_ISSUER_KEY), Some("recipe-app"));
        assert_eq!(view.environment_mode(), EnvironmentMode::Development);
    }
}
