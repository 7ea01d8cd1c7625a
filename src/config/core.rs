use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use std::path::{Path, PathBuf};

use super::GateConfig;

// Embed the default config at compile time
pub const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Repository configuration files, lowest priority first
const REPO_CONFIG_FILES: &[&str] = &[
    "gatecheck.toml",
    "gatecheck.json",
    "gatecheck.yaml",
    "gatecheck.yml",
];

impl GateConfig {
    /// Load the layered configuration.
    ///
    /// Priority, lowest first: embedded defaults, then either the custom
    /// config file or the user and repository files, then `GATECHECK_`
    /// environment variables (`__` separates nested keys).
    pub fn load(custom_config: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(custom_config)?;
        Self::extract(figment)
    }

    /// Build the figment without extracting it
    pub fn figment(custom_config: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            if !custom_path.is_file() {
                bail!("Config file not found: {}", custom_path.display());
            }
            tracing::debug!("Loading custom config {}", custom_path.display());
            figment = merge_file(figment, custom_path);
        } else {
            if let Some(user_path) = Self::user_config_path() {
                figment = figment.merge(Toml::file(user_path));
            }
            for name in REPO_CONFIG_FILES {
                figment = merge_file(figment, Path::new(name));
            }
        }

        // Environment variables always have highest priority
        Ok(figment.merge(Env::prefixed("GATECHECK_").split("__")))
    }

    /// Extract a typed configuration from a figment
    pub fn extract(figment: Figment) -> Result<Self> {
        let mut config: GateConfig = figment
            .extract()
            .context("Failed to parse configuration")?;
        config.normalize();
        tracing::trace!(
            "Loaded config: {} hooks, {} checks",
            config.hooks.len(),
            config.checks.len()
        );
        Ok(config)
    }

    /// The embedded defaults alone
    pub fn defaults() -> Result<Self> {
        Self::extract(Figment::new().merge(Toml::string(DEFAULT_CONFIG)))
    }

    fn user_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config/gatecheck/config.toml"))
    }
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}
