use dotenv::dotenv;
use counter_service::config::ServiceConfig;
use counter_service::instance;
use counter_service::{init_logging, lifecycle};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    instance::mark_process_start();
    let dotenv_loaded = dotenv().is_ok();
    init_logging();
    info!("Counter service starting up");

    if dotenv_loaded {
        debug!("Loaded environment variables from .env file");
    }

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    debug!(?config, "Configuration loaded");

    if let Err(e) = lifecycle::run(config).await {
        error!("Counter service stopped with an error: {}", e);
        std::process::exit(1);
    }
}
