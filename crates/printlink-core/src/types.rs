// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Printlink connector.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::capability::{PrinterDescriptionSection, PrinterStateSection};
use crate::integrity::hash_tags;

/// Well-known printer tag names and values.
pub mod tags {
    /// Where the local print system sends jobs, e.g. `ipp://host:631/ipp/print`.
    pub const DEVICE_URI: &str = "device-uri";
    pub const MAKE_AND_MODEL: &str = "printer-make-and-model";
    /// Free-text description an administrator gave the queue.
    pub const PRINTER_INFO: &str = "printer-info";
    pub const PRINTER_UUID: &str = "printer-uuid";
    /// Precomputed hash of every other tag.
    pub const TAGS_HASH: &str = "tagshash";

    /// `printer-make-and-model` of a local queue that passes jobs through untouched.
    pub const RAW_PRINTER_SENTINEL: &str = "Local Raw Printer";
}

/// Limits how many jobs may be submitted to one local queue at a time.
///
/// Owned by whoever spools jobs; the connector only carries it around so
/// that re-diffing a printer keeps the same limiter.
pub type JobLimiter = Arc<Semaphore>;

/// Device-URI schemes that name a network host.
static DEVICE_URI_HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:socket|http|https|ipp|ipps|lpd)://([a-z][a-z0-9.-]*)")
        .expect("device-uri hostname pattern is valid")
});

/// One printer as known by one side (local or cloud) at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Printer {
    /// Cloud-assigned id; empty until the printer is registered.
    pub cloud_id: String,
    /// Local queue name.  Key for matching local and cloud records.
    pub name: String,
    pub default_display_name: String,
    pub uuid: String,
    pub manufacturer: String,
    pub model: String,
    /// Cloud protocol version this record was published with.
    pub cloud_version: String,
    pub setup_url: String,
    pub support_url: String,
    pub update_url: String,
    /// Published as the printer's firmware string.
    pub connector_version: String,
    pub state: Option<PrinterStateSection>,
    pub description: Option<PrinterDescriptionSection>,
    /// Hash of the capability document the description came from.
    pub caps_hash: String,
    pub tags: HashMap<String, String>,
    #[serde(skip)]
    pub job_limiter: Option<JobLimiter>,
}

impl Printer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Network hostname parsed from the `device-uri` tag.
    ///
    /// Returns `None` when the tag is missing or its scheme does not address
    /// a network host (e.g. `usb://`).
    pub fn hostname(&self) -> Option<&str> {
        let device_uri = self.tags.get(tags::DEVICE_URI)?;
        DEVICE_URI_HOSTNAME
            .captures(device_uri)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Whether this is a raw queue that should not be published.
    pub fn is_raw(&self) -> bool {
        self.tags.get(tags::MAKE_AND_MODEL).map(String::as_str)
            == Some(tags::RAW_PRINTER_SENTINEL)
    }

    pub fn tags_hash(&self) -> Option<&str> {
        self.tags.get(tags::TAGS_HASH).map(String::as_str)
    }

    /// Recompute the `tagshash` tag from the current tags.
    pub fn refresh_tags_hash(&mut self) {
        let hash = hash_tags(&self.tags);
        self.tags.insert(tags::TAGS_HASH.to_string(), hash);
    }
}

/// What to do with one cloud printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterDiffOperation {
    Register,
    Update,
    Delete,
    NoChange,
}

/// Which field groups differ between the local and cloud record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterChanges {
    pub default_display_name: bool,
    pub manufacturer: bool,
    pub model: bool,
    pub cloud_version: bool,
    pub setup_url: bool,
    pub support_url: bool,
    pub update_url: bool,
    pub connector_version: bool,
    pub state: bool,
    pub description: bool,
    pub caps_hash: bool,
    pub tags: bool,
}

impl PrinterChanges {
    pub fn any(&self) -> bool {
        self.default_display_name
            || self.manufacturer
            || self.model
            || self.cloud_version
            || self.setup_url
            || self.support_url
            || self.update_url
            || self.connector_version
            || self.state
            || self.description
            || self.caps_hash
            || self.tags
    }
}

/// One instruction for bringing a cloud printer in line with the local one.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterDiff {
    pub operation: PrinterDiffOperation,
    /// The record to apply.  For `NoChange` this is the cloud's record.
    pub printer: Printer,
    /// Only ever set for `Update`.
    pub changes: PrinterChanges,
}

impl PrinterDiff {
    pub fn register(printer: Printer) -> Self {
        Self {
            operation: PrinterDiffOperation::Register,
            printer,
            changes: PrinterChanges::default(),
        }
    }

    pub fn delete(printer: Printer) -> Self {
        Self {
            operation: PrinterDiffOperation::Delete,
            printer,
            changes: PrinterChanges::default(),
        }
    }

    pub fn no_change(printer: Printer) -> Self {
        Self {
            operation: PrinterDiffOperation::NoChange,
            printer,
            changes: PrinterChanges::default(),
        }
    }
}

/// Modification stamp of a capability document, in nanoseconds since the
/// Unix epoch.  Zero means "never fetched".
///
/// Nanoseconds so that a document rewritten twice within one second still
/// reads as changed on filesystems with sub-second mtimes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModStamp(pub i64);

const NANOS_PER_SECOND: i64 = 1_000_000_000;

impl ModStamp {
    pub const ZERO: ModStamp = ModStamp(0);

    /// Saturates at whole-second precision outside the nanosecond range
    /// (years 1677 to 2262).
    pub fn from_system_time(time: SystemTime) -> Self {
        let dt = DateTime::<Utc>::from(time);
        Self(
            dt.timestamp_nanos_opt()
                .unwrap_or_else(|| dt.timestamp().saturating_mul(NANOS_PER_SECOND)),
        )
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ModStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", DateTime::<Utc>::from_timestamp_nanos(self.0).to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn with_tag(key: &str, value: &str) -> Printer {
        let mut p = Printer::new("office");
        p.tags.insert(key.into(), value.into());
        p
    }

    #[test]
    fn hostname_from_ipp_uri() {
        let p = with_tag(tags::DEVICE_URI, "ipp://printer.local:631/ipp/print");
        assert_eq!(p.hostname(), Some("printer.local"));
    }

    #[test]
    fn hostname_scheme_is_case_insensitive() {
        let p = with_tag(tags::DEVICE_URI, "SOCKET://Lab-Printer.example.com:9100");
        assert_eq!(p.hostname(), Some("Lab-Printer.example.com"));
    }

    #[test]
    fn hostname_not_found_for_usb() {
        let p = with_tag(tags::DEVICE_URI, "usb://Vendor/Model");
        assert_eq!(p.hostname(), None);
    }

    #[test]
    fn hostname_not_found_without_tag() {
        assert_eq!(Printer::new("office").hostname(), None);
    }

    #[test]
    fn raw_detection_uses_exact_sentinel() {
        assert!(with_tag(tags::MAKE_AND_MODEL, "Local Raw Printer").is_raw());
        assert!(!with_tag(tags::MAKE_AND_MODEL, "local raw printer").is_raw());
        assert!(!Printer::new("office").is_raw());
    }

    #[test]
    fn refresh_tags_hash_is_stable() {
        let mut p = with_tag(tags::PRINTER_INFO, "Front desk");
        p.refresh_tags_hash();
        let first = p.tags_hash().map(str::to_owned);
        p.refresh_tags_hash();
        assert_eq!(p.tags_hash().map(str::to_owned), first);
        assert!(first.is_some());
    }

    #[test]
    fn changes_any() {
        assert!(!PrinterChanges::default().any());
        let changes = PrinterChanges {
            tags: true,
            ..Default::default()
        };
        assert!(changes.any());
    }

    #[test]
    fn job_limiter_is_not_serialized() {
        let mut p = Printer::new("office");
        p.job_limiter = Some(Arc::new(Semaphore::new(3)));
        let json = serde_json::to_string(&p).expect("serialize printer");
        let back: Printer = serde_json::from_str(&json).expect("deserialize printer");
        assert!(back.job_limiter.is_none());
        assert_eq!(back.name, "office");
    }

    #[test]
    fn mod_stamp_from_system_time() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let stamp = ModStamp::from_system_time(t);
        assert_eq!(stamp, ModStamp(1_700_000_000 * NANOS_PER_SECOND));
        assert!(!stamp.is_zero());
        assert!(ModStamp::ZERO.is_zero());
        assert_eq!(stamp.to_string(), "2023-11-14T22:13:20+00:00");
    }

    #[test]
    fn mod_stamp_keeps_sub_second_order() {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let early = ModStamp::from_system_time(base + Duration::from_millis(100));
        let late = ModStamp::from_system_time(base + Duration::from_millis(600));
        assert!(early < late);
    }
}
