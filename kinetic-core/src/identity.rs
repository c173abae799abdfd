//! Identity types and hashing helpers for KINETIC entities

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Equipment tag meaning "no external equipment needed".
pub const BODYWEIGHT: &str = "bodyweight";

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Normalize an equipment list into a sorted, de-duplicated set of
/// lowercase tags. Blank tags are dropped.
pub fn normalize_equipment<S: AsRef<str>>(equipment: &[S]) -> Vec<String> {
    let mut tags: Vec<String> = equipment
        .iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Raw digest of an equipment set. Input order never affects the result.
pub fn equipment_digest<S: AsRef<str>>(equipment: &[S]) -> ContentHash {
    compute_content_hash(normalize_equipment(equipment).join(",").as_bytes())
}

/// Hex-encoded digest of an equipment set, as stored in the cache table.
pub fn equipment_hash<S: AsRef<str>>(equipment: &[S]) -> String {
    hex::encode(equipment_digest(equipment))
}
