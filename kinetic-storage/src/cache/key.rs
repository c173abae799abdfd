//! Tenant-scoped cache key for alternatives lists.
//!
//! The natural key of a cache row is (exercise id, equipment hash,
//! difficulty filter). Rows live in tenant-scoped storage, so the key also
//! carries the tenant; the private constructor makes it impossible to build
//! a key without one.

use kinetic_core::{equipment_digest, ContentHash, Difficulty, EntityId};
use uuid::Uuid;

/// Separator byte between tenant_id and the rest of the key.
const SEPARATOR: u8 = 0xFF;

/// Byte used for "no difficulty filter".
const NO_DIFFICULTY: u8 = 0;

/// Encoded key length in bytes.
pub const ENCODED_KEY_LEN: usize = 66;

/// A cache key scoped to a tenant.
///
/// # Binary Format
///
/// The key encodes to a fixed 66-byte array:
/// - Bytes 0-15: tenant_id
/// - Byte 16: separator (0xFF)
/// - Bytes 17-32: exercise_id
/// - Byte 33: difficulty filter (0 = none)
/// - Bytes 34-65: SHA-256 of the normalized equipment set
///
/// Keys sort by tenant first, then by exercise, so LMDB range scans can
/// walk one tenant or one exercise efficiently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlternativesCacheKey {
    inner: KeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeyInner {
    tenant_id: EntityId,
    exercise_id: EntityId,
    equipment_hash: ContentHash,
    difficulty_filter: Option<Difficulty>,
}

impl AlternativesCacheKey {
    /// Create a key from the request's raw equipment list. The list is
    /// normalized and sorted before hashing, so its order never matters.
    pub fn new<S: AsRef<str>>(
        tenant_id: EntityId,
        exercise_id: EntityId,
        equipment: &[S],
        difficulty_filter: Option<Difficulty>,
    ) -> Self {
        Self {
            inner: KeyInner {
                tenant_id,
                exercise_id,
                equipment_hash: equipment_digest(equipment),
                difficulty_filter,
            },
        }
    }

    pub fn tenant_id(&self) -> EntityId {
        self.inner.tenant_id
    }

    pub fn exercise_id(&self) -> EntityId {
        self.inner.exercise_id
    }

    pub fn difficulty_filter(&self) -> Option<Difficulty> {
        self.inner.difficulty_filter
    }

    /// Hex form of the equipment hash, as stored in the cache table.
    pub fn equipment_hash(&self) -> String {
        hex::encode(self.inner.equipment_hash)
    }

    /// Encode this key to a fixed-size byte array for LMDB storage.
    pub fn encode(&self) -> [u8; ENCODED_KEY_LEN] {
        let mut bytes = [0u8; ENCODED_KEY_LEN];
        bytes[0..16].copy_from_slice(self.inner.tenant_id.as_bytes());
        bytes[16] = SEPARATOR;
        bytes[17..33].copy_from_slice(self.inner.exercise_id.as_bytes());
        bytes[33] = self
            .inner
            .difficulty_filter
            .map(|d| d.as_byte())
            .unwrap_or(NO_DIFFICULTY);
        bytes[34..66].copy_from_slice(&self.inner.equipment_hash);
        bytes
    }

    /// Decode a key from bytes.
    ///
    /// Returns `None` on a wrong length, missing separator or unknown
    /// difficulty byte.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != ENCODED_KEY_LEN || bytes[16] != SEPARATOR {
            return None;
        }

        let tenant_id = Uuid::from_slice(&bytes[0..16]).ok()?;
        let exercise_id = Uuid::from_slice(&bytes[17..33]).ok()?;
        let difficulty_filter = match bytes[33] {
            NO_DIFFICULTY => None,
            other => Some(Difficulty::from_byte(other)?),
        };
        let mut equipment_hash = [0u8; 32];
        equipment_hash.copy_from_slice(&bytes[34..66]);

        Some(Self {
            inner: KeyInner {
                tenant_id,
                exercise_id,
                equipment_hash,
                difficulty_filter,
            },
        })
    }

    /// Prefix covering every key of a tenant.
    pub fn tenant_prefix(tenant_id: EntityId) -> [u8; 17] {
        let mut prefix = [0u8; 17];
        prefix[0..16].copy_from_slice(tenant_id.as_bytes());
        prefix[16] = SEPARATOR;
        prefix
    }

    /// Prefix covering every key of one exercise within a tenant.
    pub fn exercise_prefix(tenant_id: EntityId, exercise_id: EntityId) -> [u8; 33] {
        let mut prefix = [0u8; 33];
        prefix[0..17].copy_from_slice(&Self::tenant_prefix(tenant_id));
        prefix[17..33].copy_from_slice(exercise_id.as_bytes());
        prefix
    }
}

impl std::fmt::Display for AlternativesCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.inner.tenant_id,
            self.inner.exercise_id,
            &self.equipment_hash()[..12],
            self.inner
                .difficulty_filter
                .map(|d| d.as_db_str())
                .unwrap_or("any")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_core::equipment_hash;

    #[test]
    fn test_key_encode_decode() {
        let key = AlternativesCacheKey::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            &["barbell", "bench"],
            Some(Difficulty::Intermediate),
        );
        let encoded = key.encode();
        assert_eq!(encoded.len(), ENCODED_KEY_LEN);
        assert_eq!(AlternativesCacheKey::decode(&encoded), Some(key));
    }

    #[test]
    fn test_key_without_difficulty_roundtrips() {
        let empty: [&str; 0] = [];
        let key = AlternativesCacheKey::new(Uuid::now_v7(), Uuid::now_v7(), &empty, None);
        let decoded = AlternativesCacheKey::decode(&key.encode()).unwrap();
        assert_eq!(decoded.difficulty_filter(), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(AlternativesCacheKey::decode(&[0u8; 10]).is_none());

        let key = AlternativesCacheKey::new(Uuid::now_v7(), Uuid::now_v7(), &["a"], None);
        let mut bytes = key.encode();
        bytes[16] = 0x00;
        assert!(AlternativesCacheKey::decode(&bytes).is_none());

        let mut bytes = key.encode();
        bytes[33] = 9;
        assert!(AlternativesCacheKey::decode(&bytes).is_none());
    }

    #[test]
    fn test_equipment_order_does_not_change_key() {
        let tenant = Uuid::now_v7();
        let exercise = Uuid::now_v7();
        let a = AlternativesCacheKey::new(tenant, exercise, &["dumbbell", "bench"], None);
        let b = AlternativesCacheKey::new(tenant, exercise, &["bench", "dumbbell"], None);
        assert_eq!(a, b);
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn test_equipment_hash_matches_core_helper() {
        let key = AlternativesCacheKey::new(Uuid::now_v7(), Uuid::now_v7(), &["b", "a"], None);
        assert_eq!(key.equipment_hash(), equipment_hash(&["a", "b"]));
    }

    #[test]
    fn test_difficulty_filter_distinguishes_keys() {
        let tenant = Uuid::now_v7();
        let exercise = Uuid::now_v7();
        let any = AlternativesCacheKey::new(tenant, exercise, &["a"], None);
        let beginner =
            AlternativesCacheKey::new(tenant, exercise, &["a"], Some(Difficulty::Beginner));
        assert_ne!(any, beginner);
    }

    #[test]
    fn test_prefixes() {
        let tenant = Uuid::now_v7();
        let exercise = Uuid::now_v7();
        let key = AlternativesCacheKey::new(tenant, exercise, &["a"], None);
        let encoded = key.encode();
        assert!(encoded.starts_with(&AlternativesCacheKey::tenant_prefix(tenant)));
        assert!(encoded.starts_with(&AlternativesCacheKey::exercise_prefix(tenant, exercise)));
        assert!(!encoded.starts_with(&AlternativesCacheKey::tenant_prefix(Uuid::now_v7())));
    }
}
