// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink: Core printer types, capability descriptions, and error
// definitions shared across all crates.

pub mod capability;
pub mod config;
pub mod error;
pub mod integrity;
pub mod types;

pub use capability::{PrinterDescriptionSection, PrinterStateSection};
pub use config::ConnectorConfig;
pub use error::{ErrorClass, PrintlinkError};
pub use types::*;
