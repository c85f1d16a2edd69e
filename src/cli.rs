use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::app_state::AppState;
use crate::backend::{JsonFileBackend, LogBackend, MemoryBackend};
use crate::config_loader::{load_config, SinkConfig};
use crate::ingest_server::{bind, build_router, run_server};
use crate::log_store::LogStore;
use crate::logging::init_tracing;
use crate::netinfo::ingest_endpoint;
use crate::record::Record;

/// Top-level CLI interface
#[derive(Parser)]
#[command(
    name = "telemetry_sink",
    version,
    about = "Bounded telemetry log sink with a live dashboard"
)]
pub struct Cli {
    /// TOML configuration file (defaults to $SINK_CONFIG_PATH or sink.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the ingestion endpoint, the raw log and the dashboard
    Serve {
        /// Host/IP to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
        /// Durable log file
        #[arg(long)]
        log_file: Option<PathBuf>,
        /// Keep the log in memory only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Print the durable log as pretty JSON
    Dump {
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Print the newest records, newest first
    Tail {
        #[arg(long)]
        log_file: Option<PathBuf>,
        #[arg(short = 'n', long, default_value_t = 50)]
        count: usize,
    },
}

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            log_file,
            ephemeral,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(log_file) = log_file {
                config.log_file = log_file;
            }
            config.validate()?;
            serve(config, ephemeral)
        }
        Commands::Dump { log_file } => {
            let records = read_durable(log_file.unwrap_or(config.log_file))?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        Commands::Tail { log_file, count } => {
            let records = read_durable(log_file.unwrap_or(config.log_file))?;
            if records.is_empty() {
                println!("(no records)");
            }
            for line in tail_lines(&records, count) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn serve(config: SinkConfig, ephemeral: bool) -> anyhow::Result<()> {
    init_tracing(&config.log_level)?;

    let opened = if ephemeral {
        LogStore::open(MemoryBackend::new(), config.capacity, config.on_corrupt)
    } else {
        LogStore::open(
            JsonFileBackend::new(&config.log_file),
            config.capacity,
            config.on_corrupt,
        )
    };
    let store = opened.context("failed to open telemetry log")?;
    let app = build_router(Arc::new(AppState::new(Arc::new(store))));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")?;

    rt.block_on(async move {
        let (listener, local) = bind(&config.bind_addr()).await?;
        println!("Server started at http://localhost:{}", local.port());
        println!("CRITICAL: Use HTTP only. HTTPS is NOT supported.");
        println!(
            "Remote End Point: {}",
            ingest_endpoint(&config.probe_addr, local).await
        );
        run_server(listener, app).await
    })
}

fn read_durable(path: PathBuf) -> anyhow::Result<Vec<Record>> {
    let backend = JsonFileBackend::new(&path);
    Ok(backend
        .load()
        .with_context(|| format!("failed to read {}", path.display()))?
        .unwrap_or_default())
}

/// The newest `count` records rendered one per line, newest first.
pub fn tail_lines(records: &[Record], count: usize) -> Vec<String> {
    records
        .iter()
        .rev()
        .take(count)
        .map(Record::summary_line)
        .collect()
}
