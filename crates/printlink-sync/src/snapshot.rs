// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Turning raw local queue records into publishable printers.

use tracing::{debug, info, warn};

use printlink_core::config::ConnectorConfig;
use printlink_core::types::{Printer, tags};

use crate::cache::CapabilityCache;
use crate::reconcile::filter_raw_printers;

/// Fill in everything the cloud needs for each local printer.
///
/// Raw queues are dropped first when the config says so.  With a cache,
/// each printer's description, manufacturer, model and capability hash come
/// from its translated capability document; a printer whose lookup fails is
/// left out of this cycle (the cache has already forgotten it).
pub fn prepare_local_snapshot(
    printers: Vec<Printer>,
    cache: Option<&CapabilityCache>,
    config: &ConnectorConfig,
) -> Vec<Printer> {
    let printers = if config.ignore_raw_printers {
        let (not_raw, raw) = filter_raw_printers(printers);
        if !raw.is_empty() {
            debug!(count = raw.len(), "ignoring raw printers");
        }
        not_raw
    } else {
        printers
    };

    let total = printers.len();
    let prepared: Vec<Printer> = printers
        .into_iter()
        .filter_map(|mut printer| {
            if let Some(cache) = cache {
                match cache.lookup(&printer.name) {
                    Ok(caps) => {
                        printer.description = Some(caps.description);
                        printer.manufacturer = caps.manufacturer;
                        printer.model = caps.model;
                        printer.caps_hash = caps.caps_hash;
                    }
                    Err(e) => {
                        warn!(
                            printer = %printer.name,
                            error = %e,
                            "skipping printer without capabilities"
                        );
                        return None;
                    }
                }
            }
            apply_config(&mut printer, config);
            Some(printer)
        })
        .collect();

    info!(prepared = prepared.len(), total, "prepared local printers");
    prepared
}

fn apply_config(printer: &mut Printer, config: &ConnectorConfig) {
    let base_name = printer
        .tags
        .get(tags::PRINTER_INFO)
        .filter(|info| config.copy_printer_info_to_display_name && !info.is_empty())
        .unwrap_or(&printer.name);
    printer.default_display_name = format!("{}{}", config.display_name_prefix, base_name);

    if printer.uuid.is_empty() {
        if let Some(uuid) = printer.tags.get(tags::PRINTER_UUID) {
            printer.uuid = uuid.clone();
        }
    }

    printer.connector_version = config.connector_version.clone();
    printer.cloud_version = config.cloud_version.clone();
    printer.refresh_tags_hash();
}
