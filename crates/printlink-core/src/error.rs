// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printlink.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Printlink operations.
#[derive(Debug, Error)]
pub enum PrintlinkError {
    // -- Capability lookup --
    #[error("capability source failed: {0}")]
    CapabilitySource(String),

    #[error("printer not found: {0}")]
    PrinterNotFound(String),

    #[error("failed to translate capability document: {0}")]
    Translation(String),

    // -- Reconciliation --
    /// The cloud claims a newer version than this connector produces.
    /// Retrying cannot fix this; the connector must stop.
    #[error(
        "cloud version cannot be downgraded for printer {printer} \
         (local {local}, cloud {remote}); delete the cloud printers"
    )]
    VersionDowngrade {
        printer: String,
        local: String,
        remote: String,
    },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a caller should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Try again on the next polling cycle.
    Transient,
    /// Retrying the same input will fail the same way.
    Permanent,
    /// Halt the whole connector.
    Fatal,
}

impl PrintlinkError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::CapabilitySource(_) | Self::Translation(_) | Self::Io(_) => {
                ErrorClass::Transient
            }
            Self::PrinterNotFound(_) | Self::Config(_) | Self::Serialization(_) => {
                ErrorClass::Permanent
            }
            Self::VersionDowngrade { .. } => ErrorClass::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintlinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downgrade_is_fatal() {
        let err = PrintlinkError::VersionDowngrade {
            printer: "office".into(),
            local: "1.0".into(),
            remote: "2.0".into(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("office"));
    }

    #[test]
    fn lookup_failures_are_transient() {
        let io = PrintlinkError::from(std::io::Error::other("disk gone"));
        assert_eq!(io.class(), ErrorClass::Transient);
        assert_eq!(
            PrintlinkError::Translation("no model".into()).class(),
            ErrorClass::Transient
        );
        assert!(!PrintlinkError::PrinterNotFound("x".into()).is_fatal());
    }
}
