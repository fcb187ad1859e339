// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Editor configuration loaded from environment variables.
//!
//! Every setting has a default so an editor can start with zero configuration.

use std::time::Duration;

use url::Url;

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::model::asset::DEFAULT_ASSET_NAMESPACE;
use crate::persist::DEFAULT_SAVE_DEBOUNCE;
use crate::resolve::DEFAULT_REFINEMENT_MEMORY;

pub const DEFAULT_ASSET_BASE_URL: &str = "http://127.0.0.1:27436/assets";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: expected a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key}: expected true/false, got '{value}'")]
    InvalidFlag { key: &'static str, value: String },
    #[error("{key}: invalid value '{value}': {reason}")]
    InvalidValue { key: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Undo depth.
    /// Env: `BLUEPRINT_HISTORY_LIMIT`
    pub history_limit: usize,

    /// Quiet period before an autosave.
    /// Env: `BLUEPRINT_SAVE_DEBOUNCE_MS`
    pub save_debounce: Duration,

    /// Instructions remembered for follow-ups like "change it back".
    /// Env: `BLUEPRINT_REFINEMENT_MEMORY`
    pub refinement_memory: usize,

    /// Whether an autosave may create the remote record (explicit saves always may).
    /// Env: `BLUEPRINT_AUTOSAVE_CREATES`
    pub autosave_creates: bool,

    /// Path segment that marks uploaded assets as owned by a blueprint.
    /// Env: `BLUEPRINT_ASSET_NAMESPACE`
    pub asset_namespace: String,

    /// Public URL prefix of the asset storage.
    /// Env: `BLUEPRINT_ASSET_BASE_URL`
    pub asset_base_url: Url,

    /// fsync records and assets before reporting a save.
    /// Env: `BLUEPRINT_DURABLE_WRITES`
    pub durable_writes: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            save_debounce: DEFAULT_SAVE_DEBOUNCE,
            refinement_memory: DEFAULT_REFINEMENT_MEMORY,
            autosave_creates: false,
            asset_namespace: DEFAULT_ASSET_NAMESPACE.to_owned(),
            asset_base_url: default_asset_base_url(),
            durable_writes: false,
        }
    }
}

fn default_asset_base_url() -> Url {
    // Constant input; parsing cannot fail.
    Url::parse(DEFAULT_ASSET_BASE_URL).unwrap_or_else(|err| panic!("default asset url: {err}"))
}

impl EditorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from a key lookup, falling back to defaults for missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("BLUEPRINT_HISTORY_LIMIT") {
            config.history_limit = parse_positive("BLUEPRINT_HISTORY_LIMIT", &value)?;
        }
        if let Some(value) = lookup("BLUEPRINT_SAVE_DEBOUNCE_MS") {
            let millis = parse_positive("BLUEPRINT_SAVE_DEBOUNCE_MS", &value)?;
            config.save_debounce = Duration::from_millis(millis as u64);
        }
        if let Some(value) = lookup("BLUEPRINT_REFINEMENT_MEMORY") {
            config.refinement_memory = parse_positive("BLUEPRINT_REFINEMENT_MEMORY", &value)?;
        }
        if let Some(value) = lookup("BLUEPRINT_AUTOSAVE_CREATES") {
            config.autosave_creates = parse_flag("BLUEPRINT_AUTOSAVE_CREATES", &value)?;
        }
        if let Some(value) = lookup("BLUEPRINT_ASSET_NAMESPACE") {
            let segment = value.trim().trim_matches('/');
            if segment.is_empty() || segment.contains('/') {
                return Err(ConfigError::InvalidValue {
                    key: "BLUEPRINT_ASSET_NAMESPACE",
                    value,
                    reason: "expected a single path segment".to_owned(),
                });
            }
            config.asset_namespace = segment.to_owned();
        }
        if let Some(value) = lookup("BLUEPRINT_ASSET_BASE_URL") {
            config.asset_base_url = Url::parse(value.trim()).map_err(|err| {
                ConfigError::InvalidValue {
                    key: "BLUEPRINT_ASSET_BASE_URL",
                    value: value.clone(),
                    reason: err.to_string(),
                }
            })?;
        }
        if let Some(value) = lookup("BLUEPRINT_DURABLE_WRITES") {
            config.durable_writes = parse_flag("BLUEPRINT_DURABLE_WRITES", &value)?;
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber { key, value: value.to_owned() }),
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key, value: value.to_owned() }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{ConfigError, EditorConfig, DEFAULT_ASSET_BASE_URL};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = EditorConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.save_debounce, Duration::from_millis(1500));
        assert_eq!(config.refinement_memory, 5);
        assert!(!config.autosave_creates);
        assert_eq!(config.asset_namespace, "blueprint-assets");
        assert_eq!(config.asset_base_url.as_str(), DEFAULT_ASSET_BASE_URL);
    }

    #[test]
    fn overrides() {
        let config = EditorConfig::from_lookup(lookup(&[
            ("BLUEPRINT_HISTORY_LIMIT", "50"),
            ("BLUEPRINT_SAVE_DEBOUNCE_MS", "250"),
            ("BLUEPRINT_AUTOSAVE_CREATES", "yes"),
            ("BLUEPRINT_ASSET_NAMESPACE", "/site-media/"),
            ("BLUEPRINT_ASSET_BASE_URL", "https://cdn.example.com/files"),
            ("BLUEPRINT_DURABLE_WRITES", "1"),
        ]))
        .expect("config");

        assert_eq!(config.history_limit, 50);
        assert_eq!(config.save_debounce, Duration::from_millis(250));
        assert!(config.autosave_creates);
        assert_eq!(config.asset_namespace, "site-media");
        assert_eq!(config.asset_base_url.host_str(), Some("cdn.example.com"));
        assert!(config.durable_writes);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert_eq!(
            EditorConfig::from_lookup(lookup(&[("BLUEPRINT_HISTORY_LIMIT", "0")])).unwrap_err(),
            ConfigError::InvalidNumber { key: "BLUEPRINT_HISTORY_LIMIT", value: "0".to_owned() }
        );
        assert!(matches!(
            EditorConfig::from_lookup(lookup(&[("BLUEPRINT_DURABLE_WRITES", "maybe")])),
            Err(ConfigError::InvalidFlag { .. })
        ));
        assert!(matches!(
            EditorConfig::from_lookup(lookup(&[("BLUEPRINT_ASSET_BASE_URL", "not a url")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            EditorConfig::from_lookup(lookup(&[("BLUEPRINT_ASSET_NAMESPACE", "a/b")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
