//! chatgate HTTP server
//!
//! Starts an Axum web server exposing POST /api/chat.

use chatgate::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        match output {
            Some(path) => {
                std::fs::write(&path, generate_config_template())?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", generate_config_template()),
        }
        return Ok(());
    }

    // Load configuration (defaults when the file does not exist)
    let config_exists = Path::new(&cli.config).exists();
    let config = if config_exists {
        Config::from_file(&cli.config)?
    } else {
        Config::default()
    };

    telemetry::init(&config.observability.log_level);

    if config_exists {
        tracing::info!(path = %cli.config, "Loaded configuration");
    } else {
        tracing::info!(path = %cli.config, "Configuration file not found, using defaults");
    }

    tracing::info!(
        "Starting chatgate server on {}:{}",
        config.server.host,
        config.server.port
    );

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Chat endpoint available at http://{}/api/chat", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
