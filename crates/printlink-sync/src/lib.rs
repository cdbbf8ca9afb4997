// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printlink Sync: keeps the cloud's printer list in step with the local
// print system.  Reconciliation computes what to register, update and
// delete; the capability cache keeps translated PPD data fresh without
// re-fetching it every polling cycle.

pub mod cache;
pub mod reconcile;
pub mod snapshot;
pub mod source;
pub mod translator;

pub use cache::{CachedCapabilities, CapabilityCache};
pub use reconcile::{diff_printers, filter_raw_printers};
pub use snapshot::prepare_local_snapshot;
pub use source::{CapabilityFetch, CapabilitySource, PpdDirectory};
pub use translator::{CapabilityTranslator, PpdTranslator, TranslatedCapabilities};
