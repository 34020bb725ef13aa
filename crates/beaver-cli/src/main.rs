//! Beaver CLI
//!
//! Synchronizes the architecture catalogue's relational store into Neo4j and
//! reconciles the two.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Cli;

/// Info level for the binary and every workspace crate.
const DEFAULT_LOG_FILTER: &str = "beaver=info,beaver_core=info,beaver_db=info,beaver_graph=info";

/// Initialize tracing, optionally mirrored to a log file.
///
/// The returned guard flushes the file writer and must outlive `main`'s work.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path {}", path.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    cli.execute().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_workspace_crates() {
        for target in ["beaver", "beaver_core", "beaver_db", "beaver_graph"] {
            assert!(
                DEFAULT_LOG_FILTER.split(',').any(|d| d == format!("{target}=info")),
                "{target}"
            );
        }
        assert!(DEFAULT_LOG_FILTER
            .parse::<tracing_subscriber::EnvFilter>()
            .is_ok());
    }
}
