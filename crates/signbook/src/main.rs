use std::sync::Arc;

use log::{error, info};

use signbook::config::{config_path, load_config, LoggingConfig};
use signbook::error::WorkerError;
use signbook::{logging, Service};

fn main() {
    let path = config_path();
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init(&LoggingConfig::default());
            error!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config: signbook::Config) -> signbook::Result<()> {
    info!("Starting signbook-processor v{}", env!("CARGO_PKG_VERSION"));

    let service = Arc::new(Service::from_config(&config)?);
    service.log_backlog();

    let for_signal = Arc::clone(&service);
    ctrlc::set_handler(move || {
        info!("Shutdown requested, finishing current cycle");
        for_signal.shutdown();
    })
    .map_err(|e| WorkerError::SignalHandler(e.to_string()))?;

    let handle = service.start()?;

    if handle.join().is_err() {
        error!("Scheduler thread panicked");
    }

    info!("signbook-processor stopped");
    Ok(())
}
