/*
[INPUT]:  YAML configuration file and CLI overrides
[OUTPUT]: Parsed stream configuration
[POS]:    Configuration layer - session setup
[UPDATE]: When adding new configuration options
*/

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use deribit_book_adapter::SessionConfig;

/// Top-level configuration for the stream runner
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Instrument to subscribe to (e.g., "BTC-PERPETUAL"); prompted for when absent
    #[serde(default)]
    pub instrument: Option<String>,
    /// Connection parameters
    #[serde(default)]
    pub session: SessionConfig,
}

/// Command line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub instrument: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub testnet: bool,
}

impl StreamConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("parse config yaml")
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(instrument) = overrides.instrument {
            self.instrument = Some(instrument);
        }
        if overrides.testnet {
            self.session.host = deribit_book_adapter::TESTNET_HOST.to_string();
        }
        if let Some(host) = overrides.host {
            self.session.host = host;
        }
        if let Some(port) = overrides.port {
            self.session.port = port;
        }
    }
}

/// Trim the operator's input and refuse an empty instrument
pub fn validate_instrument(raw: &str) -> Result<String> {
    let instrument = raw.trim();
    if instrument.is_empty() {
        anyhow::bail!("Instrument name cannot be empty");
    }
    Ok(instrument.to_string())
}
