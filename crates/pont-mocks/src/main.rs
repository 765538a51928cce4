//! pont-mocks CLI
//!
//! Usage:
//!   pont-mocks [--root DIR] [--config FILE] serve [--host ADDR]
//!   pont-mocks ensure
//!   pont-mocks generate [--format rhai|json] [--output FILE]

use anyhow::Context;
use clap::{Parser, Subcommand};
use pont_mocks::bootstrap::{self, BootstrapOutcome};
use pont_mocks::{ArtifactFormat, MockContext, MockServer, ProjectConfig};
use pont_mocks_core::SchemaSnapshot;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Mock server for API schemas
#[derive(Parser, Debug)]
#[command(name = "pont-mocks")]
#[command(author, version, about = "Serve schema-driven mock data over HTTP")]
struct Cli {
    /// Project root; relative paths in the config resolve against it
    #[arg(long, env = "PONT_MOCKS_ROOT", default_value = ".")]
    root: PathBuf,

    /// Config file (default: <root>/pont-mocks.yaml when present)
    #[arg(short, long, env = "PONT_MOCKS_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `pont_mocks=trace` (overrides RUST_LOG)
    #[arg(long, env = "PONT_MOCKS_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the mock artifact if missing, then serve it
    Serve {
        /// Listen address (`127.0.0.1:8080`, `8080`, `localhost:8080`)
        #[arg(long, env = "PONT_MOCKS_HOST")]
        host: Option<String>,
    },
    /// Generate the mock artifact if missing
    Ensure,
    /// Print or write a freshly generated artifact, ignoring any existing one
    Generate {
        /// Output format (default: from the output or mocksPath extension)
        #[arg(short, long, value_enum)]
        format: Option<ArtifactFormat>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = ProjectConfig::load(&cli.root, cli.config.as_deref())?;

    match cli.command {
        Command::Serve { host } => serve(config, host).await,
        Command::Ensure => ensure(config),
        Command::Generate { format, output } => generate(config, format, output),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_schema(config: &ProjectConfig) -> anyhow::Result<SchemaSnapshot> {
    SchemaSnapshot::from_file(&config.schema_path)
        .with_context(|| format!("Failed to load schema {}", config.schema_path.display()))
}

async fn serve(mut config: ProjectConfig, host: Option<String>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.mocks.host = host;
        config.validate()?;
    }
    let addr = config.listen_addr()?;

    let context = MockContext::new(config)
        .context("Failed to initialize mock context")?;
    let outcome = bootstrap::ensure(&context.snapshot().schema, context.config())?;
    if outcome == BootstrapOutcome::Existing {
        info!("Using mock artifact {}", context.mocks_path().display());
    }

    let server = MockServer::new(addr, Arc::new(context));
    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down mock server"),
    }
    Ok(())
}

fn ensure(config: ProjectConfig) -> anyhow::Result<()> {
    let schema = load_schema(&config)?;
    match bootstrap::ensure(&schema, &config)? {
        BootstrapOutcome::Created => println!("Created {}", config.mocks_path.display()),
        BootstrapOutcome::Existing => println!("{} already exists", config.mocks_path.display()),
    }
    Ok(())
}

fn generate(
    config: ProjectConfig,
    format: Option<ArtifactFormat>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let schema = load_schema(&config)?;
    let wrapper = config.wrapper()?;
    let format = format.unwrap_or_else(|| {
        ArtifactFormat::from_path(output.as_deref().unwrap_or(&config.mocks_path))
    });
    let source = bootstrap::render(&schema, &wrapper, &config.mocks, format);

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, source)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{source}"),
    }
    Ok(())
}
