// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ConfigView, DEFAULT_LOG_FILTER, LOG_FILTER_KEY, LOG_FORMAT_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// `json` selects structured output; anything else is human readable.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging settings taken from the merged configuration, so values from the
/// `.env` file apply as well as the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingSettings {
    pub format: LogFormat,
    pub filter: String,
}

impl TracingSettings {
    pub fn from_view(view: &ConfigView) -> Self {
        Self {
            format: LogFormat::parse(view.get(LOG_FORMAT_KEY)),
            filter: view
                .get_non_empty(LOG_FILTER_KEY)
                .unwrap_or(DEFAULT_LOG_FILTER)
                .to_string(),
        }
    }
}

/// Install the global subscriber.
///
/// An unparsable filter falls back to `info,tower_http=debug`. Calling it
/// twice leaves the first subscriber in place.
pub fn init_tracing(settings: &TracingSettings) {
    let (filter, rejected) = match EnvFilter::try_new(&settings.filter) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_LOG_FILTER), Some(e)),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };

    if result.is_ok() {
        if let Some(e) = rejected {
            tracing::warn!(filter = %settings.filter, error = %e, "Invalid RUST_LOG, using default filter");
        }
        tracing::debug!(format = ?settings.format, "Tracing initialized");
    }
}
