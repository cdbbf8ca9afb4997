// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Connector configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PrintlinkError, Result};

/// Cloud protocol version this connector publishes.
pub const DEFAULT_CLOUD_VERSION: &str = "2.0";

/// Settings that shape how local printers are published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Keep raw queues out of the cloud.
    pub ignore_raw_printers: bool,
    /// Use the queue's `printer-info` as its display name when present.
    pub copy_printer_info_to_display_name: bool,
    /// Prepended to every display name.
    pub display_name_prefix: String,
    /// Reported to the cloud as the printer firmware string.
    pub connector_version: String,
    pub cloud_version: String,
    /// Directory of `<printer>.ppd` files.
    pub ppd_directory: Option<PathBuf>,
    /// Where capability cache backing files live (system temp dir if unset).
    pub cache_directory: Option<PathBuf>,
    /// Fallback log filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            ignore_raw_printers: true,
            copy_printer_info_to_display_name: true,
            display_name_prefix: String::new(),
            connector_version: env!("CARGO_PKG_VERSION").to_string(),
            cloud_version: DEFAULT_CLOUD_VERSION.to_string(),
            ppd_directory: None,
            cache_directory: None,
            log_level: "info".to_string(),
        }
    }
}

impl ConnectorConfig {
    /// Read a JSON config file.  Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(path = %path.as_ref().display(), "loaded connector configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cloud_version.trim().is_empty() {
            return Err(PrintlinkError::Config("cloud_version must not be empty".into()));
        }
        Ok(())
    }
}
