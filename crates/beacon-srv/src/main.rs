use std::path::PathBuf;

use clap::Parser;

use beacon_srv::{Server, ServerConfig};

#[derive(Parser)]
#[command(name = "beacon-srv", about = "Path-aware inter-domain beacon server")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/beacon-srv/config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ServerConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config from {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        beacon_srv::logging::init_json(&config.logging.level);
    } else {
        beacon_srv::logging::init(&config.logging.level);
    }

    let mut server = match Server::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("failed to initialize beacon server: {e}");
            std::process::exit(1);
        }
    };
    let handle = server.shutdown_handle();

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received SIGINT, shutting down");
        handle.shutdown();
    });

    if let Err(e) = server.start().await {
        tracing::error!("failed to start beacon server: {e}");
        std::process::exit(1);
    }

    server.wait_for_shutdown().await;
    server.shutdown().await;
}
