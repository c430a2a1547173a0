use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use h2srv::config::Config;
use h2srv::router::StaticFileRouter;
use h2srv::{cli, logging, server, tls};

fn main() -> ExitCode {
    let parsed = cli::parse();

    let config = match Config::load(parsed.config_path.as_deref(), parsed.overrides) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.logging.level, config.logging.format);

    let tls_config = if config.server.tls.enabled {
        let cert = config.server.tls.cert_file.as_deref().expect("validated non-empty");
        let key = config.server.tls.key_file.as_deref().expect("validated non-empty");
        match tls::load_server_config(&PathBuf::from(cert), &PathBuf::from(key)) {
            Ok(config) => Some(config),
            Err(err) => {
                log::error!("failed to load TLS material: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let router = Arc::new(StaticFileRouter::new("."));

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server::run(config, router, tls_config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("server exited: {err}");
            ExitCode::FAILURE
        }
    }
}
