use log::{error, info};
use wira_probe::configuration::config::{Args, SessionConfig};
use wira_probe::connection::lifecycle::ConnectionManager;
use wira_probe::connection::transport::WsConnector;

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    println!(
        "
============================================================
        WebSocket Test Client for the Wira Detail API
============================================================
"
    );

    // Invalid flags (e.g. an unknown --status) exit here, before any connection
    let args = Args::from_args();
    let config = SessionConfig::from(args);

    let connector = WsConnector::new(&config).unwrap_or_else(|e| {
        error!("Unexpected error: {}", e);
        std::process::exit(1);
    });

    let mut manager = ConnectionManager::new(config, connector);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for the interrupt signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match manager.run(shutdown).await {
        Ok(summary) => {
            info!(
                "Stopped after {} connection attempt(s), {} message(s)",
                summary.attempts, summary.messages
            );
            std::process::exit(0);
        }
        Err(e) => {
            error!("Unexpected error: {}", e);
            std::process::exit(1);
        }
    }
}
