// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-printer cache of translated capability documents.
//
// Fetching a capability document from the local print system is expensive
// and may rewrite a temporary file, so each printer keeps:
//   - the modification stamp of the last document seen, so the source can
//     answer "unchanged" cheaply,
//   - a private backing file holding a copy of that document,
//   - the translated description, manufacturer and model.
//
// Locking is two-tier.  A cache-wide `RwLock` guards which entries exist;
// each entry has its own `Mutex` guarding its fields.  Fetching and copying
// a document holds only the entry lock, so one slow printer never blocks
// lookups for the others.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::Serialize;
use tempfile::TempPath;
use tracing::{debug, info, instrument, warn};

use printlink_core::capability::PrinterDescriptionSection;
use printlink_core::error::{PrintlinkError, Result};
use printlink_core::integrity::hash_bytes;
use printlink_core::types::ModStamp;

use crate::source::{CapabilityFetch, CapabilitySource};
use crate::translator::CapabilityTranslator;

/// Prefix for backing file names.
const BACKING_FILE_PREFIX: &str = "printlink-ppd-";

/// Capabilities of one printer, as last translated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedCapabilities {
    pub description: PrinterDescriptionSection,
    pub manufacturer: String,
    pub model: String,
    /// SHA-256 of the document these were translated from.
    pub caps_hash: String,
}

/// Capability cache keyed by printer name.
pub struct CapabilityCache {
    source: Arc<dyn CapabilitySource>,
    translator: Arc<dyn CapabilityTranslator>,
    /// Where backing files are created.  System temp dir when `None`.
    scratch_dir: Option<PathBuf>,
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
}

impl CapabilityCache {
    pub fn new(
        source: Arc<dyn CapabilitySource>,
        translator: Arc<dyn CapabilityTranslator>,
    ) -> Self {
        Self {
            source,
            translator,
            scratch_dir: None,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create backing files in `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Current capabilities for `printer`, refreshed from the source.
    ///
    /// Any failure evicts the printer's entry, so the next lookup starts
    /// from scratch instead of trusting a half-updated entry.
    #[instrument(skip(self))]
    pub fn lookup(&self, printer: &str) -> Result<CachedCapabilities> {
        let existing = self.read_entries().get(printer).cloned();

        match existing {
            Some(entry) => match entry.refresh(self.source.as_ref(), self.translator.as_ref()) {
                Ok(caps) => Ok(caps),
                // A concurrent evict or shutdown released the entry under us.
                Err(e) if entry.is_released() => {
                    debug!(printer, error = %e, "cache entry released during lookup; recreating");
                    self.evict_entry(printer, &entry);
                    self.create_entry(printer)
                }
                Err(e) => {
                    warn!(printer, error = %e, "capability refresh failed; evicting");
                    self.evict_entry(printer, &entry);
                    Err(e)
                }
            },
            None => self.create_entry(printer),
        }
    }

    /// Drop a printer's entry and delete its backing file.  No-op when the
    /// printer is not cached.
    pub fn evict(&self, printer: &str) {
        let removed = self.write_entries().remove(printer);
        if let Some(entry) = removed {
            info!(printer, "evicted capability cache entry");
            entry.release();
        }
    }

    /// Drop every entry.  The cache stays usable and behaves as cold.
    pub fn shutdown(&self) {
        let drained: Vec<Arc<CacheEntry>> = {
            let mut entries = self.write_entries();
            entries.drain().map(|(_, entry)| entry).collect()
        };
        info!(count = drained.len(), "capability cache shut down");
        for entry in drained {
            entry.release();
        }
    }

    pub fn contains(&self, printer: &str) -> bool {
        self.read_entries().contains_key(printer)
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    /// Path of the backing file currently installed for `printer`.
    pub fn backing_path(&self, printer: &str) -> Option<PathBuf> {
        let entry = self.read_entries().get(printer).cloned()?;
        entry.backing_path()
    }

    // -- internal helpers ---------------------------------------------------

    /// Build, fill and install an entry for a printer not yet cached.
    fn create_entry(&self, printer: &str) -> Result<CachedCapabilities> {
        let entry = Arc::new(CacheEntry::create(printer, self.scratch_dir.as_deref())?);

        let caps = match entry.refresh(self.source.as_ref(), self.translator.as_ref()) {
            Ok(caps) => caps,
            Err(e) => {
                warn!(printer, error = %e, "initial capability fetch failed");
                entry.release();
                return Err(e);
            }
        };

        // Last writer wins if another lookup installed an entry meanwhile.
        let displaced = self
            .write_entries()
            .insert(printer.to_string(), Arc::clone(&entry));

        match displaced {
            Some(old) => {
                debug!(printer, "replaced concurrently created cache entry");
                release_in_background(old);
            }
            None => info!(printer, "created capability cache entry"),
        }

        Ok(caps)
    }

    /// Remove `entry` if it is still the one installed, then release it.
    fn evict_entry(&self, printer: &str, entry: &Arc<CacheEntry>) {
        {
            let mut entries = self.write_entries();
            if entries.get(printer).is_some_and(|e| Arc::ptr_eq(e, entry)) {
                entries.remove(printer);
            }
        }
        entry.release();
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<CacheEntry>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<CacheEntry>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CapabilityCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Release a displaced entry off the caller's thread.
fn release_in_background(entry: Arc<CacheEntry>) {
    let for_thread = Arc::clone(&entry);
    let spawned = std::thread::Builder::new()
        .name("printlink-cache-release".into())
        .spawn(move || for_thread.release());

    if let Err(e) = spawned {
        warn!(printer = %entry.printer, error = %e, "could not spawn release thread");
        entry.release();
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

struct CacheEntry {
    printer: String,
    state: Mutex<EntryState>,
}

struct EntryState {
    stamp: ModStamp,
    /// Deleted from disk when taken and closed, or when dropped.
    backing: Option<TempPath>,
    capabilities: Option<CachedCapabilities>,
}

impl CacheEntry {
    /// A fresh entry with an empty backing file and a zero stamp.
    fn create(printer: &str, scratch_dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(BACKING_FILE_PREFIX);
        let file = match scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| {
            PrintlinkError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create capability cache file: {e}"),
            ))
        })?;

        Ok(Self {
            printer: printer.to_string(),
            state: Mutex::new(EntryState {
                stamp: ModStamp::ZERO,
                backing: Some(file.into_temp_path()),
                capabilities: None,
            }),
        })
    }

    /// Ask the source for a newer document and re-translate if there is one.
    fn refresh(
        &self,
        source: &dyn CapabilitySource,
        translator: &dyn CapabilityTranslator,
    ) -> Result<CachedCapabilities> {
        let mut state = self.lock_state();
        if state.backing.is_none() {
            return Err(self.released_error());
        }

        let (document, stamp) = match source.fetch(&self.printer, state.stamp)? {
            CapabilityFetch::Unchanged => {
                debug!(printer = %self.printer, "capability cache hit");
                return state.capabilities.clone().ok_or_else(|| {
                    PrintlinkError::CapabilitySource(format!(
                        "{}: source reported no change but nothing is cached",
                        self.printer
                    ))
                });
            }
            CapabilityFetch::Changed { document, stamp } => (document, stamp),
        };

        debug!(printer = %self.printer, %stamp, "capability cache miss");
        state.capabilities = None;

        let backing = state.backing.as_ref().ok_or_else(|| self.released_error())?;
        std::fs::write(backing, &document)?;

        let translated = translator.translate(&String::from_utf8_lossy(&document))?;
        if translated.manufacturer.is_empty()
            || translated.model.is_empty()
            || translated.description == PrinterDescriptionSection::default()
        {
            return Err(PrintlinkError::Translation(format!(
                "{}: incomplete capability description",
                self.printer
            )));
        }

        let caps = CachedCapabilities {
            description: translated.description,
            manufacturer: translated.manufacturer,
            model: translated.model,
            caps_hash: hash_bytes(&document),
        };
        state.capabilities = Some(caps.clone());
        state.stamp = stamp;
        Ok(caps)
    }

    fn is_released(&self) -> bool {
        self.lock_state().backing.is_none()
    }

    fn released_error(&self) -> PrintlinkError {
        PrintlinkError::CapabilitySource(format!(
            "{}: cache entry was released by a concurrent eviction",
            self.printer
        ))
    }

    fn backing_path(&self) -> Option<PathBuf> {
        self.lock_state().backing.as_ref().map(|p| p.to_path_buf())
    }

    /// Delete the backing file and forget the cached data.  Idempotent.
    fn release(&self) {
        let mut state = self.lock_state();
        state.capabilities = None;
        if let Some(backing) = state.backing.take() {
            let path = backing.to_path_buf();
            if let Err(e) = backing.close() {
                warn!(printer = %self.printer, path = %path.display(), error = %e, "failed to remove cache file");
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
