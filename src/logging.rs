use crate::config::LoggingConfig;
use anyhow::Context;
use std::fs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
///
/// When the log directory cannot be used, logging continues on the console
/// only and the problem is reported on stderr.
pub fn init_logging(config: &LoggingConfig) {
    let file_layer = match file_appender(config) {
        Ok(appender) => {
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(appender);
            // Keep the guard alive for the whole process so logs flush on exit
            std::mem::forget(guard);
            Some(fmt::layer().json().with_writer(non_blocking_writer))
        }
        Err(e) => {
            // The subscriber is not up yet
            eprintln!("Warning: file logging disabled: {:#}", e);
            None
        }
    };
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    // Respect RUST_LOG if set; otherwise use the configured default
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();
}

/// Daily rolling JSON log file under the configured directory.
fn file_appender(config: &LoggingConfig) -> anyhow::Result<RollingFileAppender> {
    fs::create_dir_all(&config.directory).with_context(|| {
        format!(
            "cannot create log directory {}",
            config.directory.display()
        )
    })?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .build(&config.directory)
        .with_context(|| format!("cannot open log files in {}", config.directory.display()))
}
