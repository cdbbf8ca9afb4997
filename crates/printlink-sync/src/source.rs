// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Where capability documents come from.
//
// The local print system only answers two questions about a printer's
// capability document: "has it changed since this stamp?" and "give me the
// new copy".  `CapabilitySource` models exactly that so the cache can be
// driven by a real spooler, a directory of PPD files, or a test fake.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use printlink_core::error::{PrintlinkError, Result};
use printlink_core::types::ModStamp;

/// Answer from a capability source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityFetch {
    /// The document has not changed since the stamp the caller passed.
    Unchanged,
    /// A newer document, and the stamp to pass next time.
    Changed { document: Vec<u8>, stamp: ModStamp },
}

/// The local print system, as seen by the capability cache.
///
/// Implementations may block on I/O.  They are called with only the
/// per-printer cache lock held.
pub trait CapabilitySource: Send + Sync {
    fn fetch(&self, printer: &str, since: ModStamp) -> Result<CapabilityFetch>;
}

/// Reads `<dir>/<printer>.ppd`, the layout CUPS keeps under `/etc/cups/ppd`.
///
/// The file's mtime is the stamp, so change detection is as fine as the
/// filesystem's timestamps.
#[derive(Debug, Clone)]
pub struct PpdDirectory {
    dir: PathBuf,
}

impl PpdDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ppd_path(&self, printer: &str) -> Result<PathBuf> {
        // Queue names become file names; refuse anything that would escape.
        if printer.is_empty() || printer.contains(['/', '\\']) || printer.starts_with('.') {
            return Err(PrintlinkError::PrinterNotFound(printer.to_string()));
        }
        Ok(self.dir.join(format!("{printer}.ppd")))
    }
}

impl CapabilitySource for PpdDirectory {
    fn fetch(&self, printer: &str, since: ModStamp) -> Result<CapabilityFetch> {
        let path = self.ppd_path(printer)?;

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PrintlinkError::PrinterNotFound(printer.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let stamp = ModStamp::from_system_time(metadata.modified()?);

        if !since.is_zero() && stamp <= since {
            debug!(printer, %stamp, "PPD unchanged");
            return Ok(CapabilityFetch::Unchanged);
        }

        let document = std::fs::read(&path)?;
        debug!(printer, %stamp, bytes = document.len(), "PPD changed");
        Ok(CapabilityFetch::Changed { document, stamp })
    }
}
