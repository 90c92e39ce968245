//! Generation Helpers
//!
//! Derives generation checksums from versioned status attributes and builds
//! the page cache keys that rendering code stores under.

use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};

// == Status Checksum ==
/// Hex encoded SHA-256 over the observed generation followed by every
/// attribute key and value in ascending key order.
///
/// The result only depends on the content, never on map iteration order.
pub fn status_checksum(observed_generation: i64, attributes: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<&String, &String> = attributes.iter().collect();

    let mut hasher = Sha256::new();
    hasher.update(observed_generation.to_string().as_bytes());
    for (key, value) in sorted {
        hasher.update(key.as_bytes());
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}

// == Cache Key ==
/// Key for one rendered artifact: `name:checksum:locale`.
pub fn cache_key(name: &str, checksum: &str, locale: &str) -> String {
    format!("{name}:{checksum}:{locale}")
}
