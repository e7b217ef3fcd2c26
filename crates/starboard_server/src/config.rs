//! Configuration file support for the starboard server.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STARBOARD_`, e.g.,
//!    `STARBOARD_GITHUB_CLIENT_ID`)
//! 3. Config file (~/.config/starboard/config.toml or ./starboard.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [server]
//! port = 3001
//! origin = "http://localhost:3001"  # optional, derived from port
//!
//! [github]
//! client_id = "Iv1..."      # or STARBOARD_GITHUB_CLIENT_ID
//! client_secret = "..."     # or STARBOARD_GITHUB_CLIENT_SECRET
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

/// Default port for the relay server.
pub const DEFAULT_PORT: u16 = 3001;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// GitHub OAuth app configuration.
    pub github: GitHubConfig,
}

/// HTTP server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Application origin used in OAuth redirects.
    /// Defaults to `http://localhost:{port}`.
    pub origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            origin: None,
        }
    }
}

/// GitHub OAuth app credentials.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// OAuth app client id.
    /// Can also be set via STARBOARD_GITHUB_CLIENT_ID.
    pub client_id: Option<String>,
    /// OAuth app client secret. Never leaves this process.
    /// Can also be set via STARBOARD_GITHUB_CLIENT_SECRET.
    pub client_secret: Option<String>,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/starboard/config.toml)
    /// 3. Local config file (./starboard.toml)
    /// 4. Environment variables with STARBOARD_ prefix
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}", e);
                Config::default()
            }
        }
    }

    fn try_load() -> Result<Self, config::ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "starboard") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Local config file (higher priority than XDG)
        let local_config = PathBuf::from("starboard.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./starboard.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., STARBOARD_SERVER_PORT -> server.port
        builder = builder.add_source(
            Environment::with_prefix("STARBOARD")
                .separator("_")
                .try_parsing(true),
        );

        // Keys whose leaf name contains an underscore cannot be reached
        // through the prefixed source (the separator splits
        // STARBOARD_GITHUB_CLIENT_ID into github.client.id), so the
        // documented variables are wired up explicitly.
        for (var, key) in [
            ("STARBOARD_GITHUB_CLIENT_ID", "github.client_id"),
            ("STARBOARD_GITHUB_CLIENT_SECRET", "github.client_secret"),
        ] {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize::<Config>()
    }

    /// The application origin, derived from the port when not configured.
    #[must_use]
    pub fn origin(&self) -> String {
        self.server
            .origin
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_defaults_to_localhost_on_the_configured_port() {
        let config = Config::default();
        assert_eq!(config.origin(), "http://localhost:3001");
    }

    #[test]
    fn documented_env_vars_reach_their_config_keys() {
        std::env::set_var("STARBOARD_GITHUB_CLIENT_ID", "id123");
        std::env::set_var("STARBOARD_GITHUB_CLIENT_SECRET", "secret456");
        std::env::set_var("STARBOARD_SERVER_PORT", "4000");

        let config = Config::load();

        std::env::remove_var("STARBOARD_GITHUB_CLIENT_ID");
        std::env::remove_var("STARBOARD_GITHUB_CLIENT_SECRET");
        std::env::remove_var("STARBOARD_SERVER_PORT");

        assert_eq!(config.github.client_id.as_deref(), Some("id123"));
        assert_eq!(config.github.client_secret.as_deref(), Some("secret456"));
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn explicit_origin_wins() {
        let config = Config {
            server: ServerConfig {
                port: 8080,
                origin: Some("https://stars.example.com".to_string()),
            },
            github: GitHubConfig::default(),
        };
        assert_eq!(config.origin(), "https://stars.example.com");
    }
}
