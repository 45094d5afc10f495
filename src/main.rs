//! meshscope - service views for Istio service-mesh clusters
//!
//! Prints the service list of a namespace or the composite details of one
//! service, aggregated from the cluster, the mesh and Prometheus.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use meshscope::cli::{self, ConfigSubcommand, OutputFormat};
use meshscope::config::ConfigLoader;

/// meshscope - service views for Istio service-mesh clusters
#[derive(Parser, Debug)]
#[command(name = "meshscope")]
#[command(about = "Concurrent multi-source service views for Istio service-mesh clusters", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Kubeconfig context to use (defaults to the current context)
    #[arg(long, global = true)]
    context: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// List the services of a namespace
    Services {
        namespace: String,
        #[arg(long, short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },
    /// Show the details of one service
    Service {
        namespace: String,
        name: String,
        /// Health rate interval (Prometheus duration, e.g. "10m")
        #[arg(long)]
        interval: Option<String>,
        #[arg(long, short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Show version information
    Version,
}

/// Cancel `token` on Ctrl-C so in-flight fetches are abandoned
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("captured ctrl_c signal, cancelling");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    cli::init_logging(args.debug, args.log_file.as_deref())?;
    tracing::debug!("Debug logging enabled");

    let context = meshscope::kube::current_context(args.context.as_deref());

    match args.command {
        Command::Version => {
            cli::display_version();
            Ok(())
        }
        Command::Config { subcommand } => {
            cli::handle_config_command(subcommand, context.as_deref()).await
        }
        Command::Services { namespace, output } => {
            let config =
                ConfigLoader::load(context.as_deref()).context("Failed to load configuration")?;
            let aggregator = cli::build_aggregator(&config, args.context.as_deref()).await?;

            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            cli::run_services(&aggregator, &namespace, output, cancel).await
        }
        Command::Service {
            namespace,
            name,
            interval,
            output,
        } => {
            let config =
                ConfigLoader::load(context.as_deref()).context("Failed to load configuration")?;
            let interval = interval.unwrap_or_else(|| config.health.rate_interval.clone());
            tracing::debug!(
                read_only = config.read_only,
                prometheus = %config.prometheus.url,
                "Configuration loaded"
            );
            let aggregator = cli::build_aggregator(&config, args.context.as_deref()).await?;

            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            cli::run_service(&aggregator, &namespace, &name, &interval, output, cancel).await
        }
    }
}
