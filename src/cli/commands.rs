//! CLI command handlers

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::{ConfigLoader, paths};

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Get configuration value
    Get {
        /// Configuration key (e.g., "readOnly", "prometheus.url")
        key: Option<String>,
    },
    /// Set configuration value
    Set {
        /// Configuration key (e.g., "readOnly", "prometheus.url")
        key: String,
        /// Configuration value
        value: String,
        /// Save to the config of this kubeconfig context instead of the root config
        #[arg(long = "for-context")]
        for_context: Option<String>,
    },
    /// List all configuration
    List,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

/// Handle configuration subcommands.
///
/// `context` is the active kubeconfig context; its config layer is merged
/// over the root config when reading.
pub async fn handle_config_command(cmd: ConfigSubcommand, context: Option<&str>) -> Result<()> {
    match cmd {
        ConfigSubcommand::Get { key } => {
            let config = ConfigLoader::load(context).context("Failed to load configuration")?;

            if let Some(key) = key {
                let value = crate::config::get_config_value(&config, &key)?;
                println!("{}", value);
            } else {
                let yaml =
                    serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
                print!("{}", yaml);
            }
        }
        ConfigSubcommand::Set {
            key,
            value,
            for_context,
        } => {
            let mut config = ConfigLoader::load(for_context.as_deref())
                .unwrap_or_else(|_| ConfigLoader::load_defaults());

            crate::config::set_config_value(&mut config, &key, &value)
                .with_context(|| format!("Failed to set {} = {}", key, value))?;

            if let Some(context_name) = for_context {
                ConfigLoader::save_context(&config, &context_name)
                    .context("Failed to save context configuration")?;
                println!("Configuration saved for context: {}", context_name);
            } else {
                ConfigLoader::save_root(&config).context("Failed to save configuration")?;
                println!("Configuration saved");
            }
        }
        ConfigSubcommand::List => {
            let config = ConfigLoader::load(context).context("Failed to load configuration")?;

            let yaml =
                serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        ConfigSubcommand::Path => {
            println!("{}", paths::root_config_path().display());
            if let Some(context_name) = context {
                println!("{}", paths::context_config_path(context_name).display());
            }
        }
        ConfigSubcommand::Validate => match ConfigLoader::validate(context) {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {:#}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
