//! Server configuration.
//!
//! Every option can be given on the command line or through the environment.
//! `ServerArgs` is the raw clap view; `ServerConfig` is the validated form the
//! runner consumes.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use thiserror::Error;

use crate::{
    infrastructure::repository::inmemory::{DEFAULT_SESSION_TTL, DEFAULT_SWEEP_INTERVAL},
    realtime::{ConnectionSettings, hub::DEFAULT_HUB_CHANNEL_CAPACITY},
};

/// Realtime location sharing server
#[derive(Parser, Debug, Clone)]
#[command(name = "mapshare-server", version, about)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "MAPSHARE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind (0 for auto-assign)
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory with the built frontend. Unknown paths fall back to its index.html.
    #[arg(long, env = "MAPSHARE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Seconds of inactivity after which a session expires
    #[arg(long, env = "MAPSHARE_SESSION_TTL_SECS", default_value_t = DEFAULT_SESSION_TTL.as_secs())]
    pub session_ttl_secs: u64,

    /// Seconds between two expiry sweeps
    #[arg(
        long,
        env = "MAPSHARE_SWEEP_INTERVAL_SECS",
        default_value_t = DEFAULT_SWEEP_INTERVAL.as_secs()
    )]
    pub sweep_interval_secs: u64,

    /// Seconds a connection may stay silent before it is dropped
    #[arg(long, env = "MAPSHARE_IDLE_TIMEOUT_SECS", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// Seconds a single outbound write may take
    #[arg(long, env = "MAPSHARE_WRITE_TIMEOUT_SECS", default_value_t = 10)]
    pub write_timeout_secs: u64,

    /// Seconds between keepalive pings; must be below the idle timeout
    #[arg(long, env = "MAPSHARE_KEEPALIVE_SECS", default_value_t = 54)]
    pub keepalive_secs: u64,

    /// Largest inbound frame accepted, in bytes
    #[arg(long, env = "MAPSHARE_MAX_FRAME_BYTES", default_value_t = 512)]
    pub max_frame_bytes: usize,

    /// Frames buffered per connection before it is considered too slow
    #[arg(long, env = "MAPSHARE_OUTBOUND_CAPACITY", default_value_t = 256)]
    pub outbound_capacity: usize,

    /// Capacity of each hub input channel
    #[arg(long, env = "MAPSHARE_HUB_CAPACITY", default_value_t = DEFAULT_HUB_CHANNEL_CAPACITY)]
    pub hub_capacity: usize,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "MAPSHARE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("keepalive interval ({keepalive:?}) must be shorter than the idle timeout ({idle:?})")]
    KeepaliveNotBelowIdle { keepalive: Duration, idle: Duration },

    #[error("sweep interval ({sweep:?}) must be shorter than the session TTL ({ttl:?})")]
    SweepNotBelowTtl { sweep: Duration, ttl: Duration },
}

/// Validated runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub hub_capacity: usize,
    pub connection: ConnectionSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: None,
            session_ttl: DEFAULT_SESSION_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            hub_capacity: DEFAULT_HUB_CHANNEL_CAPACITY,
            connection: ConnectionSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let connection = &self.connection;
        let non_zero = [
            ("session TTL", self.session_ttl.is_zero()),
            ("sweep interval", self.sweep_interval.is_zero()),
            ("idle timeout", connection.idle_timeout.is_zero()),
            ("write timeout", connection.write_timeout.is_zero()),
            ("keepalive interval", connection.keepalive_interval.is_zero()),
            ("max frame size", connection.max_frame_bytes == 0),
            ("outbound capacity", connection.outbound_capacity == 0),
            ("hub capacity", self.hub_capacity == 0),
        ];
        if let Some((name, _)) = non_zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(ConfigError::Zero(*name));
        }

        if connection.keepalive_interval >= connection.idle_timeout {
            return Err(ConfigError::KeepaliveNotBelowIdle {
                keepalive: connection.keepalive_interval,
                idle: connection.idle_timeout,
            });
        }
        if self.sweep_interval >= self.session_ttl {
            return Err(ConfigError::SweepNotBelowTtl {
                sweep: self.sweep_interval,
                ttl: self.session_ttl,
            });
        }
        Ok(())
    }
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        let config = Self {
            host: args.host,
            port: args.port,
            static_dir: args.static_dir,
            session_ttl: Duration::from_secs(args.session_ttl_secs),
            sweep_interval: Duration::from_secs(args.sweep_interval_secs),
            hub_capacity: args.hub_capacity,
            connection: ConnectionSettings {
                max_frame_bytes: args.max_frame_bytes,
                idle_timeout: Duration::from_secs(args.idle_timeout_secs),
                write_timeout: Duration::from_secs(args.write_timeout_secs),
                keepalive_interval: Duration::from_secs(args.keepalive_secs),
                outbound_capacity: args.outbound_capacity,
            },
        };
        config.validate()?;
        Ok(config)
    }
}
