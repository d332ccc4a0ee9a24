//! Tracing setup.
//!
//! Storage events are emitted under the `dreamboard` target. sqlx logs every
//! statement at `info`, which drowns everything else, so statement logging is
//! held to `warn` unless `logging.log_statements` is set.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

const SQLX_QUIET: &str = "sqlx::query=warn";

fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// Filter for the configured level. `RUST_LOG` directives still apply.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let filter = EnvFilter::from_default_env().add_directive(parse_level(&config.level).into());
    if config.log_statements {
        return filter;
    }
    match SQLX_QUIET.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the global subscriber.
///
/// Writes to stdout, and also appends to `config.file` when it is set.
/// Fails if the log file cannot be created or a subscriber is already
/// installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config);
    let layer = tracing_subscriber::fmt::layer().with_target(true);

    if config.file.trim().is_empty() {
        tracing_subscriber::registry()
            .with(layer.with_writer(std::io::stdout))
            .with(filter)
            .try_init()
            .map_err(|e| crate::DreamboardError::Config(format!("logging: {e}")))?;
        return Ok(());
    }

    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let log_file = Arc::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)?,
    );

    tracing_subscriber::registry()
        .with(
            layer
                .with_ansi(false)
                .with_writer(std::io::stdout.and(log_file)),
        )
        .with(filter)
        .try_init()
        .map_err(|e| crate::DreamboardError::Config(format!("logging: {e}")))?;
    Ok(())
}

/// Console logging at `level`, used when [`init`] fails.
pub fn init_console_only(level: &str) {
    let filter = build_filter(&LoggingConfig {
        level: level.to_string(),
        ..LoggingConfig::default()
    });
    // A subscriber may already be installed; keep it.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level(" warn "), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("loud"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_statement_logging_is_quiet_by_default() {
        let filter = build_filter(&LoggingConfig::default());
        assert!(filter.to_string().contains(SQLX_QUIET));
    }

    #[test]
    fn test_statement_logging_enabled() {
        let config = LoggingConfig {
            log_statements: true,
            ..LoggingConfig::default()
        };
        assert!(!build_filter(&config).to_string().contains("sqlx"));
    }
}
