//! CLI surface for the `server` binary, `clap` 2.x builder API.

use crate::config::{CliOverrides, LogFormat, LogLevel};
use clap::{crate_version, App, Arg};
use std::path::PathBuf;

#[must_use]
pub fn build_app() -> App<'static, 'static> {
    App::new("server")
        .version(crate_version!())
        .about("An HTTP/2 server that also speaks HTTP/1.1 on the same port")
        .arg(Arg::with_name("config").long("config").takes_value(true).value_name("PATH"))
        .arg(Arg::with_name("host").long("host").takes_value(true).value_name("ADDR"))
        .arg(Arg::with_name("port").long("port").takes_value(true).value_name("N"))
        .arg(Arg::with_name("tls-enabled").long("tls-enabled"))
        .arg(Arg::with_name("tls-cert-file").long("tls-cert-file").takes_value(true).value_name("PATH"))
        .arg(Arg::with_name("tls-key-file").long("tls-key-file").takes_value(true).value_name("PATH"))
        .arg(Arg::with_name("max-body-size").long("max-body-size").takes_value(true).value_name("BYTES"))
        .arg(Arg::with_name("max-headers-size").long("max-headers-size").takes_value(true).value_name("BYTES"))
        .arg(Arg::with_name("timeout").long("timeout").takes_value(true).value_name("SECONDS"))
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .takes_value(true)
                .possible_values(&["debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::with_name("log-format")
                .long("log-format")
                .takes_value(true)
                .possible_values(&["text", "json"]),
        )
}

pub struct Parsed {
    pub config_path: Option<PathBuf>,
    pub overrides: CliOverrides,
}

/// Parses `std::env::args()` into a config path plus CLI overrides. `clap`
/// handles `--help`/`--version` and malformed-argument exits itself.
#[must_use]
pub fn parse() -> Parsed {
    let matches = build_app().get_matches();

    let overrides = CliOverrides {
        host: matches.value_of("host").map(str::to_string),
        port: matches.value_of("port").and_then(|v| v.parse().ok()),
        tls_enabled: if matches.is_present("tls-enabled") { Some(true) } else { None },
        tls_cert_file: matches.value_of("tls-cert-file").map(str::to_string),
        tls_key_file: matches.value_of("tls-key-file").map(str::to_string),
        max_body_size: matches.value_of("max-body-size").and_then(|v| v.parse().ok()),
        max_headers_size: matches.value_of("max-headers-size").and_then(|v| v.parse().ok()),
        timeout_seconds: matches.value_of("timeout").and_then(|v| v.parse().ok()),
        log_level: matches.value_of("log-level").map(|v| match v {
            "debug" => LogLevel::Debug,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }),
        log_format: matches.value_of("log-format").map(|v| match v {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }),
    };

    Parsed {
        config_path: matches.value_of("config").map(PathBuf::from),
        overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_flag_parses_to_u16() {
        let matches = build_app().get_matches_from(vec!["server", "--port", "9090"]);
        assert_eq!(matches.value_of("port"), Some("9090"));
    }

    #[test]
    fn tls_enabled_is_a_boolean_flag() {
        let matches = build_app().get_matches_from(vec!["server", "--tls-enabled"]);
        assert!(matches.is_present("tls-enabled"));
    }
}
