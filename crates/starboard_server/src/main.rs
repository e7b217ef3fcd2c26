//! Starboard server - OAuth token-exchange relay for the starboard app.

mod config;
mod relay;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use starboard::http::ReqwestTransport;

use crate::relay::{AppState, GITHUB_TOKEN_URL};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "starboard-server")]
#[command(version)]
#[command(about = "OAuth token-exchange relay for the starboard app")]
#[command(
    long_about = "Runs the same-origin relay the starboard frontend exchanges GitHub OAuth \
authorization codes against. The relay is the only component that holds the \
OAuth client secret."
)]
#[command(after_long_help = r#"CONFIGURATION
    The server reads configuration from:
      1. ~/.config/starboard/config.toml (or $XDG_CONFIG_HOME/starboard/config.toml)
      2. ./starboard.toml
      3. Environment variables (STARBOARD_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    STARBOARD_SERVER_PORT            Port to listen on (default: 3001)
    STARBOARD_GITHUB_CLIENT_ID       GitHub OAuth app client id
    STARBOARD_GITHUB_CLIENT_SECRET   GitHub OAuth app client secret
"#)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("starboard=info,starboard_server=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = config::Config::load();
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let client_id = config
        .github
        .client_id
        .clone()
        .ok_or("GitHub client id not configured (STARBOARD_GITHUB_CLIENT_ID)")?;
    let client_secret = config
        .github
        .client_secret
        .clone()
        .ok_or("GitHub client secret not configured (STARBOARD_GITHUB_CLIENT_SECRET)")?;

    let state = AppState {
        transport: Arc::new(ReqwestTransport::with_timeout(REQUEST_TIMEOUT)?),
        client_id,
        client_secret,
        token_url: GITHUB_TOKEN_URL.to_string(),
    };

    let app = relay::router(state);
    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://localhost:{}", config.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
