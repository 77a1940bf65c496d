mod config;
mod inspect_cmd;
mod ping_cmd;
#[cfg(test)]
mod test_util;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use esconn_core::LogLevel;

use config::{CliOverrides, EsconnConfig};

#[derive(Parser)]
#[command(name = "esconn", about = "Elasticsearch connector toolkit")]
struct Cli {
    /// Node host (overrides ESCONN_HOST env var)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Node HTTP port (overrides ESCONN_PORT env var)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Index name (overrides ESCONN_INDEX env var)
    #[arg(long, global = true)]
    index: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an esconn config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
        /// Default document type
        #[arg(long = "type")]
        doc_type: Option<String>,
        /// Client log level (error, warning, info, debug, trace)
        #[arg(long)]
        log: Option<String>,
    },
    /// Check that the node is reachable
    Ping,
    /// Show node and cluster identity
    Info,
    /// List the connector's capability tags
    Capabilities,
    /// Show the resolved configuration
    Config,
    /// Show the index and document type requests for a model go to
    Target {
        /// Model name (omit to use the configured document type)
        model: Option<String>,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Execute the `esconn init` command: write config file.
fn cmd_init(
    cli: &CliOverrides,
    doc_type: Option<String>,
    log: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(level) = &log {
        level.parse::<LogLevel>().context("invalid --log value")?;
    }

    let cfg = config::ConfigFile {
        elasticsearch: config::ElasticsearchSection {
            host: cli.host.clone(),
            port: cli.port,
            log,
            index: cli.index.clone(),
            doc_type,
            request_timeout_ms: None,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!();
    println!("Next: run `esconn ping` to check the node.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = CliOverrides {
        host: cli.host,
        port: cli.port,
        index: cli.index,
    };

    let result = match cli.command {
        Commands::Init {
            force,
            doc_type,
            log,
        } => cmd_init(&overrides, doc_type, log, force),
        Commands::Ping => match EsconnConfig::resolve(&overrides) {
            Ok(resolved) => ping_cmd::run_ping(&resolved).await,
            Err(e) => Err(e),
        },
        Commands::Info => match EsconnConfig::resolve(&overrides) {
            Ok(resolved) => ping_cmd::run_info(&resolved).await,
            Err(e) => Err(e),
        },
        Commands::Capabilities => EsconnConfig::resolve(&overrides)
            .map(|resolved| inspect_cmd::run_capabilities(&resolved)),
        Commands::Config => {
            EsconnConfig::resolve(&overrides).map(|resolved| inspect_cmd::run_config(&resolved))
        }
        Commands::Target { model } => EsconnConfig::resolve(&overrides)
            .and_then(|resolved| inspect_cmd::run_target(&resolved, model.as_deref())),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "esconn", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}
