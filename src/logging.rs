use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "quotation_client=info,quotation=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

fn json_format() -> bool {
    std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false)
}

/// Log to stderr. Used by the one-shot CLI commands.
pub fn init_stderr() {
    let registry = tracing_subscriber::registry().with(env_filter());
    if json_format() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

/// Log to a file. The TUI owns the terminal, so nothing may be written to it.
pub fn init_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let writer = Mutex::new(file);

    let registry = tracing_subscriber::registry().with(env_filter());
    if json_format() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
            .init();
    }
    Ok(())
}
