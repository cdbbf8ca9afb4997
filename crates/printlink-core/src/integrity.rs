// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content hashing for fast change detection.
//
// Capability documents and tag maps are fingerprinted with SHA-256 so the
// reconciliation engine can compare one short string instead of a whole
// document or map.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::types::tags;

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a tag map independent of iteration order.
///
/// Tags are fed to the hasher sorted by key as `key=value\n`.  The
/// `tagshash` tag itself is skipped so that storing the result does not
/// change it.
pub fn hash_tags(tags: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = tags.keys().filter(|k| *k != tags::TAGS_HASH).collect();
    keys.sort();

    let mut hasher = Sha256::new();
    for key in keys {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(tags[key].as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
