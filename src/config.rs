use anyhow::{Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL credential store.
    pub database_url: String,
    /// The address the server binds to.
    pub host: IpAddr,
    /// The port the server listens on.
    pub port: u16,
    /// How long a session (and its cookie) stays valid, in seconds.
    pub session_max_age_secs: i64,
    /// How often the expired-session sweep runs, in seconds.
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string())
                .parse()
                .context("Invalid HOST")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3333".to_string())
                .parse()
                .context("Invalid PORT")?,
            session_max_age_secs: env::var("SESSION_MAX_AGE_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid SESSION_MAX_AGE_SECS")?,
            sweep_interval_secs: env::var("SESSION_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid SESSION_SWEEP_INTERVAL_SECS")?,
        })
    }

    /// Returns the socket address the server listens on.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
