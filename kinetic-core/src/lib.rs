//! KINETIC Core - Entity Types
//!
//! Pure data structures shared by every KINETIC crate: catalog entities,
//! pipeline value objects, identity helpers, errors and configuration.
//! This crate contains no I/O.

use serde::{Deserialize, Serialize};

pub mod alternatives;
pub mod config;
pub mod error;
pub mod exercise;
pub mod identity;

pub use alternatives::{
    AlternativesRequest, AlternativesResult, CandidateFilters, CandidateQuery, Locale,
    ScoredAlternative, MAX_SCORE,
};
pub use config::{
    AlternativesConfig, DEFAULT_CACHE_TTL, DEFAULT_CACHE_WIDTH, DEFAULT_CANDIDATE_LIMIT,
    DEFAULT_RESULT_LIMIT,
};
pub use error::{ConfigError, KineticError, KineticResult, LlmError, StorageError};
pub use exercise::{Difficulty, DifficultyParseError, Exercise, ExerciseMedia};
pub use identity::{
    compute_content_hash, equipment_digest, equipment_hash, normalize_equipment,
    ContentHash, EntityId, Timestamp, BODYWEIGHT,
};

/// Entity type discriminator used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Exercise,
    AlternativesCacheEntry,
}
