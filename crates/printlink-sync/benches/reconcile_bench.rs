// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for printer reconciliation and PPD translation in the
// printlink-sync crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use printlink_core::capability::{CloudDeviceState, PrinterStateSection};
use printlink_core::types::{Printer, tags};
use printlink_sync::{CapabilityTranslator, PpdTranslator, diff_printers};

/// Number of printers on each side of the benchmark snapshots.
const FLEET_SIZE: usize = 500;

/// Build a local fleet and the cloud's copy of it.
fn fleet() -> (Vec<Printer>, Vec<Printer>) {
    let local: Vec<Printer> = (0..FLEET_SIZE)
        .map(|i| {
            let mut p = Printer::new(format!("queue-{i}"));
            p.default_display_name = format!("Queue {i}");
            p.manufacturer = "Acme".into();
            p.model = "LaserJet 9000".into();
            p.cloud_version = "2.0".into();
            p.state = Some(PrinterStateSection::new(CloudDeviceState::Idle));
            p.tags
                .insert(tags::DEVICE_URI.into(), format!("ipp://queue-{i}.local/ipp/print"));
            p.refresh_tags_hash();
            p
        })
        .collect();

    let remote = local
        .iter()
        .map(|p| {
            let mut c = p.clone();
            c.cloud_id = format!("cloud-{}", p.name);
            c
        })
        .collect();

    (local, remote)
}

/// Benchmark reconciling identical snapshots (the steady-state case) and
/// snapshots where every tenth printer changed.
fn bench_diff_printers(c: &mut Criterion) {
    let (local, remote) = fleet();

    c.bench_function("diff_printers (500 unchanged)", |b| {
        b.iter(|| {
            let diffs = diff_printers(black_box(&local), black_box(&remote));
            assert!(diffs.is_ok());
        });
    });

    let mut changed = local.clone();
    for p in changed.iter_mut().step_by(10) {
        p.default_display_name.push_str(" (moved)");
    }

    c.bench_function("diff_printers (500, 10% changed)", |b| {
        b.iter(|| {
            let diffs = diff_printers(black_box(&changed), black_box(&remote));
            assert!(diffs.is_ok());
        });
    });
}

/// Benchmark translating a small PPD (the cache-miss path).
fn bench_translate_ppd(c: &mut Criterion) {
    let mut ppd = String::from(
        "*PPD-Adobe: \"4.3\"\n*Manufacturer: \"Acme\"\n*ModelName: \"Acme LaserJet 9000\"\n\
         *ColorDevice: True\n*OpenUI *PageSize/Media Size: PickOne\n*DefaultPageSize: A4\n",
    );
    for i in 0..50 {
        ppd.push_str(&format!("*PageSize Size{i}/Size {i}: \"\"\n"));
    }
    ppd.push_str("*CloseUI: *PageSize\n");
    for i in 0..50 {
        ppd.push_str(&format!("*PaperDimension Size{i}/Size {i}: \"{} 842\"\n", 500 + i));
    }

    c.bench_function("translate_ppd (50 media sizes)", |b| {
        b.iter(|| {
            let result = PpdTranslator.translate(black_box(&ppd));
            assert!(result.is_ok());
        });
    });
}

criterion_group!(benches, bench_diff_printers, bench_translate_ppd);
criterion_main!(benches);
