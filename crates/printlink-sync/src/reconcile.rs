// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer reconciliation.
//
// Compares the local print system's printers (the truth) with the printers
// the cloud last saw, and works out which cloud printers to register,
// update or delete.  Pure computation: no I/O, no shared state.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info};

use printlink_core::error::{PrintlinkError, Result};
use printlink_core::types::{Printer, PrinterChanges, PrinterDiff, PrinterDiffOperation};

/// Diff the local printers against the cloud printers.
///
/// Returns an empty list when every printer is unchanged.  When anything
/// changed, the list also carries a `NoChange` entry for each matched
/// printer that did not.
///
/// The cloud may hold several printers under one name; only the first is
/// matched and every later one is deleted.
///
/// Fails with [`PrintlinkError::VersionDowngrade`] when a cloud printer
/// claims a newer cloud version than the local record.  That error is
/// fatal: the caller should stop the connector rather than skip a printer.
pub fn diff_printers(local: &[Printer], remote: &[Printer]) -> Result<Vec<PrinterDiff>> {
    let mut dirty = false;
    let mut diffs = Vec::with_capacity(remote.len().max(local.len()));
    let mut considered: HashSet<&str> = HashSet::with_capacity(local.len());

    let local_by_name: HashMap<&str, &Printer> =
        local.iter().map(|p| (p.name.as_str(), p)).collect();

    for cloud in remote {
        if !considered.insert(cloud.name.as_str()) {
            debug!(printer = %cloud.name, cloud_id = %cloud.cloud_id, "duplicate cloud printer");
            diffs.push(PrinterDiff::delete(cloud.clone()));
            dirty = true;
            continue;
        }

        match local_by_name.get(cloud.name.as_str()) {
            Some(local_printer) => {
                let mut local_printer = (*local_printer).clone();
                // Only the cloud knows the id; only the spooler side owns the limiter.
                local_printer.cloud_id = cloud.cloud_id.clone();
                local_printer.job_limiter = cloud.job_limiter.clone();

                let diff = diff_printer(local_printer, cloud)?;
                if diff.operation != PrinterDiffOperation::NoChange {
                    dirty = true;
                }
                diffs.push(diff);
            }
            None => {
                debug!(printer = %cloud.name, "cloud printer no longer exists locally");
                diffs.push(PrinterDiff::delete(cloud.clone()));
                dirty = true;
            }
        }
    }

    for printer in local {
        if !considered.contains(printer.name.as_str()) {
            debug!(printer = %printer.name, "new local printer");
            diffs.push(PrinterDiff::register(printer.clone()));
            dirty = true;
        }
    }

    if !dirty {
        debug!(count = diffs.len(), "no printer changes");
        return Ok(Vec::new());
    }

    info!(
        register = count(&diffs, PrinterDiffOperation::Register),
        update = count(&diffs, PrinterDiffOperation::Update),
        delete = count(&diffs, PrinterDiffOperation::Delete),
        unchanged = count(&diffs, PrinterDiffOperation::NoChange),
        "computed printer diffs"
    );
    Ok(diffs)
}

/// Diff one local printer (`local`, already carrying the cloud id) against
/// its cloud counterpart.
fn diff_printer(local: Printer, cloud: &Printer) -> Result<PrinterDiff> {
    if local.cloud_version != cloud.cloud_version
        && compare_versions(&local.cloud_version, &cloud.cloud_version) == Ordering::Less
    {
        error!(
            printer = %local.name,
            local = %local.cloud_version,
            cloud = %cloud.cloud_version,
            "cloud printer has a newer version than this connector"
        );
        return Err(PrintlinkError::VersionDowngrade {
            printer: local.name.clone(),
            local: local.cloud_version.clone(),
            remote: cloud.cloud_version.clone(),
        });
    }

    let changes = PrinterChanges {
        default_display_name: local.default_display_name != cloud.default_display_name,
        manufacturer: local.manufacturer != cloud.manufacturer,
        model: local.model != cloud.model,
        cloud_version: local.cloud_version != cloud.cloud_version,
        setup_url: local.setup_url != cloud.setup_url,
        support_url: local.support_url != cloud.support_url,
        update_url: local.update_url != cloud.update_url,
        connector_version: local.connector_version != cloud.connector_version,
        state: local.state != cloud.state,
        description: local.description != cloud.description,
        caps_hash: local.caps_hash != cloud.caps_hash,
        tags: !tags_match(&local, cloud),
    };

    if !changes.any() {
        debug!(printer = %local.name, "printer unchanged");
        return Ok(PrinterDiff::no_change(cloud.clone()));
    }

    debug!(printer = %local.name, ?changes, "printer changed");
    Ok(PrinterDiff {
        operation: PrinterDiffOperation::Update,
        printer: local,
        changes,
    })
}

/// Tags are compared through their precomputed hash only.  A missing hash
/// on either side counts as a difference.
fn tags_match(local: &Printer, cloud: &Printer) -> bool {
    match (local.tags_hash(), cloud.tags_hash()) {
        (Some(l), Some(c)) => l == c,
        _ => false,
    }
}

/// Order two version strings.
///
/// Dotted numeric versions ("2.0", "10.1") compare component by component,
/// missing components counting as zero.  Anything else falls back to plain
/// string ordering.
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (numeric_components(a), numeric_components(b)) {
        (Some(a), Some(b)) => {
            let len = a.len().max(b.len());
            (0..len)
                .map(|i| {
                    let x = a.get(i).copied().unwrap_or(0);
                    let y = b.get(i).copied().unwrap_or(0);
                    x.cmp(&y)
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }
        _ => a.cmp(b),
    }
}

fn numeric_components(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

fn count(diffs: &[PrinterDiff], operation: PrinterDiffOperation) -> usize {
    diffs.iter().filter(|d| d.operation == operation).count()
}

/// Split printers into `(not_raw, raw)`.  Order within each half is kept.
pub fn filter_raw_printers(printers: Vec<Printer>) -> (Vec<Printer>, Vec<Printer>) {
    printers.into_iter().partition(|p| !p.is_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use printlink_core::capability::{
        CloudDeviceState, CopiesCapability, PrinterDescriptionSection, PrinterStateSection,
    };
    use printlink_core::types::tags;
    use tokio::sync::Semaphore;

    /// Helper: a fully populated local printer.
    fn printer(name: &str) -> Printer {
        let mut p = Printer::new(name);
        p.default_display_name = format!("{name} display");
        p.uuid = format!("urn:uuid:{name}");
        p.manufacturer = "Acme".into();
        p.model = "LaserJet 9000".into();
        p.cloud_version = "2.0".into();
        p.connector_version = "0.3.0".into();
        p.state = Some(PrinterStateSection::new(CloudDeviceState::Idle));
        p.description = Some(PrinterDescriptionSection {
            copies: Some(CopiesCapability { default: 1, max: 99 }),
            ..Default::default()
        });
        p.caps_hash = "caps".into();
        p.tags
            .insert(tags::DEVICE_URI.into(), format!("ipp://{name}.local/ipp/print"));
        p.refresh_tags_hash();
        p
    }

    /// Helper: the cloud's copy of a local printer.
    fn published(local: &Printer, cloud_id: &str) -> Printer {
        let mut p = local.clone();
        p.cloud_id = cloud_id.into();
        p
    }

    fn ops(diffs: &[PrinterDiff]) -> Vec<(String, PrinterDiffOperation)> {
        diffs
            .iter()
            .map(|d| (d.printer.name.clone(), d.operation))
            .collect()
    }

    #[test]
    fn identical_snapshots_yield_nothing() {
        let local = vec![printer("a"), printer("b")];
        let remote = vec![published(&local[0], "id-a"), published(&local[1], "id-b")];

        let diffs = diff_printers(&local, &remote).expect("diff");
        assert!(diffs.is_empty());
    }

    #[test]
    fn empty_snapshots_yield_nothing() {
        assert!(diff_printers(&[], &[]).expect("diff").is_empty());
    }

    #[test]
    fn local_only_registers_and_remote_only_deletes() {
        let local = vec![printer("new")];
        let remote = vec![published(&printer("gone"), "id-gone")];

        let diffs = diff_printers(&local, &remote).expect("diff");
        assert_eq!(
            ops(&diffs),
            vec![
                ("gone".to_string(), PrinterDiffOperation::Delete),
                ("new".to_string(), PrinterDiffOperation::Register),
            ]
        );
        assert_eq!(diffs[0].printer.cloud_id, "id-gone");
    }

    #[test]
    fn duplicate_cloud_printers_are_deleted() {
        let remote = vec![
            published(&printer("A"), "id-1"),
            published(&printer("A"), "id-2"),
        ];

        let diffs = diff_printers(&[], &remote).expect("diff");
        assert_eq!(diffs.len(), 2);
        assert!(diffs.iter().all(|d| d.operation == PrinterDiffOperation::Delete));
        assert_eq!(diffs[1].printer.cloud_id, "id-2");
    }

    #[test]
    fn duplicate_is_deleted_even_when_it_matches_local() {
        let local = vec![printer("A")];
        let remote = vec![published(&local[0], "id-1"), published(&local[0], "id-2")];

        let diffs = diff_printers(&local, &remote).expect("diff");
        assert_eq!(
            ops(&diffs),
            vec![
                ("A".to_string(), PrinterDiffOperation::NoChange),
                ("A".to_string(), PrinterDiffOperation::Delete),
            ]
        );
        assert_eq!(diffs[0].printer.cloud_id, "id-1");
        assert_eq!(diffs[1].printer.cloud_id, "id-2");
    }

    #[test]
    fn duplicate_local_names_register_each() {
        let diffs = diff_printers(&[printer("x"), printer("x")], &[]).expect("diff");
        assert_eq!(
            ops(&diffs),
            vec![
                ("x".to_string(), PrinterDiffOperation::Register),
                ("x".to_string(), PrinterDiffOperation::Register),
            ]
        );
    }

    #[test]
    fn duplicate_local_names_diff_the_last_record() {
        let first = printer("x");
        let mut last = printer("x");
        last.default_display_name = "x renamed".into();
        let remote = vec![published(&first, "id-x")];

        let diffs = diff_printers(&[first, last], &remote).expect("diff");
        assert_eq!(ops(&diffs), vec![("x".to_string(), PrinterDiffOperation::Update)]);
        assert_eq!(diffs[0].printer.default_display_name, "x renamed");
        assert_eq!(diffs[0].printer.cloud_id, "id-x");
        assert!(diffs[0].changes.default_display_name);
    }

    #[test]
    fn unchanged_printers_ride_along_with_changes() {
        let local = vec![printer("same"), printer("changed")];
        let mut stale = published(&local[1], "id-changed");
        stale.model = "Old Model".into();
        let remote = vec![published(&local[0], "id-same"), stale];

        let diffs = diff_printers(&local, &remote).expect("diff");
        assert_eq!(
            ops(&diffs),
            vec![
                ("same".to_string(), PrinterDiffOperation::NoChange),
                ("changed".to_string(), PrinterDiffOperation::Update),
            ]
        );
    }

    #[test]
    fn single_field_change_sets_single_flag() {
        let local = vec![printer("a")];
        let mut remote = published(&local[0], "id-a");
        remote.default_display_name = "Old name".into();

        let diffs = diff_printers(&local, &[remote]).expect("diff");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].operation, PrinterDiffOperation::Update);
        assert_eq!(
            diffs[0].changes,
            PrinterChanges {
                default_display_name: true,
                ..Default::default()
            }
        );
        assert_eq!(diffs[0].printer.default_display_name, "a display");
    }

    #[test]
    fn update_carries_cloud_id_and_limiter() {
        let local = vec![printer("a")];
        let limiter = Arc::new(Semaphore::new(2));
        let mut remote = published(&local[0], "id-a");
        remote.caps_hash = "older".into();
        remote.job_limiter = Some(Arc::clone(&limiter));

        let diffs = diff_printers(&local, &[remote]).expect("diff");
        let diff = &diffs[0];
        assert_eq!(diff.operation, PrinterDiffOperation::Update);
        assert!(diff.changes.caps_hash);
        assert_eq!(diff.printer.cloud_id, "id-a");
        let carried = diff.printer.job_limiter.as_ref().expect("limiter carried over");
        assert!(Arc::ptr_eq(carried, &limiter));
    }

    #[test]
    fn no_change_keeps_cloud_record() {
        let local = vec![printer("a"), printer("b")];
        let limiter = Arc::new(Semaphore::new(1));
        let mut same = published(&local[0], "id-a");
        same.job_limiter = Some(Arc::clone(&limiter));
        let mut changed = published(&local[1], "id-b");
        changed.setup_url = "http://old/".into();

        let diffs = diff_printers(&local, &[same, changed]).expect("diff");
        let unchanged = &diffs[0];
        assert_eq!(unchanged.operation, PrinterDiffOperation::NoChange);
        assert_eq!(unchanged.printer.cloud_id, "id-a");
        assert!(Arc::ptr_eq(
            unchanged.printer.job_limiter.as_ref().expect("limiter"),
            &limiter
        ));
        assert!(diffs[1].changes.setup_url);
    }

    #[test]
    fn missing_tags_hash_counts_as_change() {
        let mut local = printer("a");
        local.tags.remove(tags::TAGS_HASH);
        let remote = published(&printer("a"), "id-a");

        let diffs = diff_printers(&[local], &[remote]).expect("diff");
        assert_eq!(
            diffs[0].changes,
            PrinterChanges {
                tags: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn tags_compared_by_hash_only() {
        let local = printer("a");
        let mut remote = published(&local, "id-a");
        // Same hash, different map: treated as equal.
        remote.tags.insert("printer-location".into(), "Floor 2".into());

        assert!(diff_printers(&[local], &[remote]).expect("diff").is_empty());
    }

    #[test]
    fn state_and_description_compare_by_value() {
        let local = printer("a");
        let mut remote = published(&local, "id-a");
        remote.state = Some(PrinterStateSection::new(CloudDeviceState::Stopped));
        remote.description = None;

        let diffs = diff_printers(&[local], &[remote]).expect("diff");
        assert!(diffs[0].changes.state);
        assert!(diffs[0].changes.description);
        assert!(!diffs[0].changes.model);
    }

    #[test]
    fn version_downgrade_is_fatal() {
        let mut local = printer("a");
        local.cloud_version = "1.0".into();
        let mut remote = published(&printer("a"), "id-a");
        remote.cloud_version = "2.0".into();

        let err = diff_printers(&[local], &[remote]).expect_err("downgrade");
        assert!(err.is_fatal());
        assert!(matches!(err, PrintlinkError::VersionDowngrade { .. }));
    }

    #[test]
    fn version_upgrade_is_an_update() {
        let mut local = printer("a");
        local.cloud_version = "2.0".into();
        let mut remote = published(&printer("a"), "id-a");
        remote.cloud_version = "1.0".into();

        let diffs = diff_printers(&[local], &[remote]).expect("diff");
        assert_eq!(diffs[0].operation, PrinterDiffOperation::Update);
        assert_eq!(
            diffs[0].changes,
            PrinterChanges {
                cloud_version: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn versions_compare_numerically() {
        assert_eq!(compare_versions("2.0", "10.0"), Ordering::Less);
        assert_eq!(compare_versions("2", "2.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.1", "2.0.9"), Ordering::Greater);
        assert_eq!(compare_versions("beta", "alpha"), Ordering::Greater);
    }

    #[test]
    fn raw_printers_are_partitioned() {
        let mut raw = printer("raw");
        raw.tags
            .insert(tags::MAKE_AND_MODEL.into(), tags::RAW_PRINTER_SENTINEL.into());
        let mut laser = printer("laser");
        laser
            .tags
            .insert(tags::MAKE_AND_MODEL.into(), "Acme LaserJet 9000".into());

        let (not_raw, raw) = filter_raw_printers(vec![raw, laser, printer("plain")]);
        let names = |ps: &[Printer]| ps.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&not_raw), vec!["laser", "plain"]);
        assert_eq!(names(&raw), vec!["raw"]);
    }
}
