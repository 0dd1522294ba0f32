// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! BDA command line entry point

use anyhow::Context;
use bda_client::{transfer, BlobStore, MockQueryService, ObjectStoreBlobStore};
use bda_common::Config;
use bda_qe::QueryEngine;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "conf/bda.toml")]
    config: PathBuf,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a local file; the object key is the path as given
    Upload {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Upload a literal string
    UploadString {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        body: String,
    },
    /// Download an object to a local file
    Download {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        /// Defaults to the key
        #[arg(long)]
        dest: Option<PathBuf>,
    },
    /// Run a query and print rows as JSON lines
    Query {
        /// Logical database name from the configuration
        #[arg(long)]
        database: String,
        #[arg(long)]
        sql: String,
        /// JSON script answered by the scripted query service
        #[arg(long)]
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    config.apply_env_overrides();
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    init_logging(&config.log_level)?;
    info!("BDA {}", env!("CARGO_PKG_VERSION"));

    config.validate()?;

    match args.command {
        Command::Upload { bucket, file } => {
            let store = blob_store(&config);
            let key = transfer::upload_file(store.as_ref(), &bucket, &file).await?;
            println!("uploaded {} to {}/{}", file.display(), bucket, key);
        }
        Command::UploadString { bucket, key, body } => {
            let store = blob_store(&config);
            transfer::upload_string(store.as_ref(), &bucket, &key, &body).await?;
            println!("uploaded {} bytes to {}/{}", body.len(), bucket, key);
        }
        Command::Download { bucket, key, dest } => {
            let store = blob_store(&config);
            let path =
                transfer::download_to_file(store.as_ref(), &bucket, &key, dest.as_deref()).await?;
            println!("downloaded {}/{} to {}", bucket, key, path.display());
        }
        Command::Query {
            database,
            sql,
            script,
        } => {
            run_query(&config, &database, &sql, &script).await?;
        }
    }

    Ok(())
}

async fn run_query(config: &Config, database: &str, sql: &str, script: &Path) -> anyhow::Result<()> {
    let service = MockQueryService::from_json_file(script)
        .with_context(|| format!("Failed to load query script {}", script.display()))?;
    let engine = QueryEngine::from_config(Arc::new(service), config)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, cancelling query");
            on_ctrl_c.cancel();
        }
    });

    let rows = engine.execute_with_cancel(database, sql, &cancel).await?;
    info!("Result length: {}", rows.len());

    for row in &rows {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}

fn blob_store(config: &Config) -> Arc<dyn BlobStore> {
    Arc::new(ObjectStoreBlobStore::from_config(&config.store))
}

/// Initialize logging
fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration from file
fn load_config(config_path: &Path) -> anyhow::Result<Config> {
    if config_path.exists() {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))
    } else {
        eprintln!("Config file not found: {}, using defaults", config_path.display());
        Ok(Config::default())
    }
}
