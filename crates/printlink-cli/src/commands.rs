// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{info, warn};

use printlink_core::config::ConnectorConfig;
use printlink_core::error::Result;
use printlink_core::types::{Printer, tags};
use printlink_sync::{
    CapabilityCache, PpdDirectory, PpdTranslator, diff_printers, prepare_local_snapshot,
};

/// Read a JSON array of printers.
pub fn read_printers(path: &Path) -> Result<Vec<Printer>> {
    let raw = std::fs::read_to_string(path)?;
    let printers: Vec<Printer> = serde_json::from_str(&raw)?;
    info!(path = %path.display(), count = printers.len(), "read printer snapshot");
    Ok(printers)
}

/// A PPD-directory backed cache honouring the configured scratch dir.
pub fn build_cache(ppd_dir: PathBuf, config: &ConnectorConfig) -> CapabilityCache {
    let cache = CapabilityCache::new(
        Arc::new(PpdDirectory::new(ppd_dir)),
        Arc::new(PpdTranslator),
    );
    match &config.cache_directory {
        Some(dir) => cache.with_scratch_dir(dir.clone()),
        None => cache,
    }
}

pub fn diff(
    local: &Path,
    remote: &Path,
    ppd_dir: Option<PathBuf>,
    config: &ConnectorConfig,
) -> Result<ExitCode> {
    let local = read_printers(local)?;
    let remote = read_printers(remote)?;

    let cache = ppd_dir
        .or_else(|| config.ppd_directory.clone())
        .map(|dir| build_cache(dir, config));
    let local = prepare_local_snapshot(local, cache.as_ref(), config);

    let diffs = diff_printers(&local, &remote)?;
    println!("{}", serde_json::to_string_pretty(&diffs)?);
    Ok(ExitCode::SUCCESS)
}

pub fn capabilities(
    ppd_dir: PathBuf,
    printers: &[String],
    config: &ConnectorConfig,
) -> Result<ExitCode> {
    let cache = build_cache(ppd_dir, config);

    let mut found = BTreeMap::new();
    let mut failed = 0usize;
    for printer in printers {
        match cache.lookup(printer) {
            Ok(caps) => {
                found.insert(printer.clone(), caps);
            }
            Err(e) => {
                warn!(printer = %printer, error = %e, "capability lookup failed");
                failed += 1;
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn hostname(device_uri: &str) -> ExitCode {
    let mut printer = Printer::default();
    printer
        .tags
        .insert(tags::DEVICE_URI.to_string(), device_uri.to_string());

    match printer.hostname() {
        Some(host) => {
            println!("{host}");
            ExitCode::SUCCESS
        }
        None => {
            warn!(device_uri, "device URI does not name a network host");
            ExitCode::FAILURE
        }
    }
}
