//! chartgate CLI - resolve, fetch and inspect Helm chart references

use chartgate_install::InstallerConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use crate::error::{CliError, Result};

#[derive(Parser)]
#[command(name = "chartgate")]
#[command(version)]
#[command(about = "Resolve, fetch and inspect Helm chart references", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file (default: ~/.config/chartgate/config.yaml)
    #[arg(long, global = true, env = "CHARTGATE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a chart reference offline
    Inspect {
        /// Chart reference (oci://... or http(s)://.../*.tgz)
        reference: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find the registered repository serving a chart reference
    Resolve {
        /// Chart reference
        reference: String,

        /// Namespace whose repositories are searched after cluster-scoped ones
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Pre-resolved catalog entry (<chart>--<repository>)
        #[arg(long)]
        index_entry: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a chart archive
    #[command(disable_version_flag = true)]
    Pull {
        /// Chart reference
        reference: String,

        /// Namespace whose repositories are searched after cluster-scoped ones
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Chart version, when the reference carries none
        #[arg(long)]
        version: Option<String>,

        /// Pre-resolved catalog entry (<chart>--<repository>)
        #[arg(long)]
        index_entry: Option<String>,

        /// Output file (default: <chart>-<version>.tgz)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fetch the URL directly, without repository lookup or credentials
        #[arg(long)]
        direct: bool,
    },

    /// Show the install status object of a release
    Status {
        /// Release name
        name: String,

        /// Release namespace
        #[arg(short, long, default_value = "default")]
        namespace: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> miette::Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_directive = if debug { "chartgate=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<InstallerConfig> {
    let config = match path {
        Some(path) => InstallerConfig::load_from(path)?,
        None => InstallerConfig::load()?,
    };
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    // Offline commands never need a runtime or configuration
    if let Commands::Inspect { reference, json } = &cli.command {
        return commands::inspect::run(reference, *json);
    }

    let config = load_config(cli.config.as_ref())?;
    let runtime = tokio::runtime::Runtime::new().map_err(CliError::from)?;

    runtime.block_on(async {
        match cli.command {
            Commands::Inspect { .. } => Ok(()),

            Commands::Resolve {
                reference,
                namespace,
                index_entry,
                json,
            } => commands::resolve::run(&reference, &namespace, index_entry.as_deref(), json).await,

            Commands::Pull {
                reference,
                namespace,
                version,
                index_entry,
                output,
                direct,
            } => {
                let args = commands::pull::PullArgs {
                    reference: &reference,
                    namespace: &namespace,
                    version: version.as_deref(),
                    index_entry: index_entry.as_deref(),
                    output: output.as_deref(),
                    direct,
                };
                commands::pull::run(&config, args).await
            }

            Commands::Status {
                name,
                namespace,
                json,
            } => commands::status::run(&name, &namespace, json).await,
        }
    })
}
