//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{defaults, paths, schema::Config};
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Context-specific config
    /// 3. Root config
    /// 4. Built-in defaults
    pub fn load(context: Option<&str>) -> Result<Config> {
        let mut layers = vec![paths::root_config_path()];
        if let Some(context_name) = context {
            layers.push(paths::context_config_path(context_name));
        }

        let config = Self::load_layers(&layers)?;
        Ok(Self::apply_env_overrides(config))
    }

    /// Merge the given files over the defaults, later files winning.
    ///
    /// Missing files are skipped; unreadable or malformed files are errors.
    pub fn load_layers(layers: &[PathBuf]) -> Result<Config> {
        let mut merged = serde_yaml::to_value(Self::load_defaults())
            .context("Failed to serialize default configuration")?;

        for path in layers.iter().filter(|p| p.exists()) {
            tracing::debug!("Merging config layer {}", path.display());
            merge_values(&mut merged, Self::load_value(path)?);
        }

        serde_yaml::from_value(merged).context("Failed to build merged configuration")
    }

    /// Load configuration from a single file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn load_value(path: &Path) -> Result<Value> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let value: Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(value)
    }

    /// Validate every existing layer on its own, then the merged result
    pub fn validate(context: Option<&str>) -> Result<()> {
        let mut layers = vec![paths::root_config_path()];
        if let Some(context_name) = context {
            layers.push(paths::context_config_path(context_name));
        }

        for path in layers.iter().filter(|p| p.exists()) {
            let config = Self::load_file(path)?;
            url::Url::parse(&config.prometheus.url).with_context(|| {
                format!(
                    "Invalid prometheus.url '{}' in {}",
                    config.prometheus.url,
                    path.display()
                )
            })?;
        }

        let _ = Self::load(context).context("Failed to load merged configuration")?;

        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        if let Ok(url) = std::env::var("MESHSCOPE_PROMETHEUS_URL") {
            config.prometheus.url = url;
        }

        if let Ok(namespace) = std::env::var("MESHSCOPE_ISTIO_NAMESPACE") {
            config.istio_namespace = namespace;
        }

        if let Ok(label) = std::env::var("MESHSCOPE_APP_LABEL") {
            config.istio_labels.app_label_name = label;
        }

        if let Ok(read_only) = std::env::var("MESHSCOPE_READ_ONLY") {
            if let Ok(val) = read_only.parse::<bool>() {
                config.read_only = val;
            }
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Save root configuration
    pub fn save_root(config: &Config) -> Result<()> {
        Self::save(config, &paths::root_config_path())
    }

    /// Save kube-context specific configuration
    pub fn save_context(config: &Config, context: &str) -> Result<()> {
        Self::save(config, &paths::context_config_path(context))
    }
}

/// Deep-merge `overlay` into `base`: mappings merge key by key, anything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}
