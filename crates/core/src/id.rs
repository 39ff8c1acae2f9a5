// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation for issues, sprints, and projects.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Generate an ID from a project key, a name, and a timestamp.
/// Format: {key}-{hash} where hash is the first 8 hex chars of SHA256(name + timestamp)
pub fn generate_id(key: &str, name: &str, created_at: &DateTime<Utc>) -> String {
    let input = format!("{}{}", name, created_at.to_rfc3339());
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]); // First 8 hex chars (4 bytes)
    format!("{}-{}", key, short_hash)
}

/// Generate a unique ID, handling collisions by appending an incrementing suffix.
pub fn generate_unique_id<F>(
    key: &str,
    name: &str,
    created_at: &DateTime<Utc>,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_id(key, name, created_at);

    if !exists(&base_id) {
        return base_id;
    }

    // Handle collision with incrementing suffix
    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

/// Validate that a project key is usable as an ID prefix
/// (2+ lowercase alphanumeric with at least one letter).
pub fn validate_key(key: &str) -> bool {
    key.len() >= 2
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && key.chars().any(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
