//! Configuration file loading and parsing.
//!
//! A store directory may carry a `config.toml`. If no config file exists,
//! the system falls back to sensible defaults.
//!
//! ```toml
//! [tickets]
//! default_status = "new"
//!
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [logging]
//! filter = "taskgraph=debug,info"
//!
//! [[access.members]]
//! project = 1
//! user = 1
//! ```

use crate::domain::{ProjectId, UserId};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// File name looked up inside a store directory
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_STATUS: &str = "new";
const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_LOG_FILTER: &str = "info";

/// Root configuration structure loaded from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskgraphConfig {
    /// Ticket defaults (optional).
    pub tickets: Option<TicketsConfig>,
    /// HTTP server settings (optional).
    pub server: Option<ServerConfig>,
    /// Logging settings (optional).
    pub logging: Option<LoggingConfig>,
    /// Project memberships to seed into the store (optional).
    pub access: Option<AccessConfig>,
}

/// Ticket defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketsConfig {
    /// Status assigned to newly created tickets (default: "new").
    pub default_status: Option<String>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on (default: "0.0.0.0:3000").
    pub bind: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` env-filter directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

/// Membership seed list.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MemberConfig {
    pub project: ProjectId,
    pub user: UserId,
}

impl TaskgraphConfig {
    /// Load configuration from a file path.
    ///
    /// Returns the default configuration if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `config.toml` from a store directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(CONFIG_FILE))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid TOML configuration")
    }

    /// Status given to new tickets.
    pub fn default_status(&self) -> String {
        self.tickets
            .as_ref()
            .and_then(|t| t.default_status.clone())
            .unwrap_or_else(|| DEFAULT_STATUS.to_string())
    }

    /// Socket address for the HTTP server.
    pub fn bind_address(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    /// Default log filter directive.
    pub fn log_filter(&self) -> String {
        self.logging
            .as_ref()
            .and_then(|l| l.filter.clone())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }

    /// Memberships to seed at startup.
    pub fn members(&self) -> &[MemberConfig] {
        self.access
            .as_ref()
            .map(|a| a.members.as_slice())
            .unwrap_or(&[])
    }
}
