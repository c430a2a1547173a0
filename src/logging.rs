//! `log` facade wiring via `env_logger`, with a `text`/`json` line format.

use crate::config::{LogFormat, LogLevel};
use std::io::Write;

fn level_filter(level: LogLevel) -> log::LevelFilter {
    match level {
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Error => log::LevelFilter::Error,
    }
}

/// Initializes the global logger. Safe to call once per process; a second
/// call is a no-op save for a log message, matching `env_logger`'s own
/// behavior.
pub fn init(level: LogLevel, format: LogFormat) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_filter(level));

    match format {
        LogFormat::Text => {
            builder.format(|buf, record| {
                writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
            });
        }
        LogFormat::Json => {
            builder.format(|buf, record| {
                let ts = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                let escaped = record.args().to_string().replace('"', "\\\"");
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"message\":\"{}\"}}",
                    ts,
                    record.level(),
                    record.target(),
                    escaped
                )
            });
        }
    }

    let _ = builder.try_init();
}
