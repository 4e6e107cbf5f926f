//! HTTP server configuration

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SERVER_HOST`: Bind address (default: "0.0.0.0")
    /// - `SERVER_PORT`: Bind port (default: 8080)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = match env::var("SERVER_HOST") {
            Ok(host) => host
                .parse()
                .with_context(|| format!("Invalid SERVER_HOST {:?}", host))?,
            Err(_) => defaults.host,
        };

        let port = match env::var("SERVER_PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("Invalid SERVER_PORT {:?}", port))?,
            Err(_) => defaults.port,
        };

        Ok(Self { host, port })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
