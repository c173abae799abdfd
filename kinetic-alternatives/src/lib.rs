//! KINETIC Alternatives - Exercise Alternatives Engine
//!
//! Ranks replacement exercises for a source exercise:
//! - [`candidates`]: catalog search with hard filters and the equipment check
//! - [`scoring`]: deterministic weighted similarity score
//! - [`reason`]: localized explanation strings
//! - [`engine`]: the cache-aside pipeline tying them together, with optional
//!   external ranking and full deterministic fallback

pub mod candidates;
pub mod engine;
pub mod reason;
pub mod scoring;

pub use candidates::{candidate_query, find_candidates, passes_equipment_filter};
pub use engine::{
    merge_rankings, score_deterministically, sort_by_score, AlternativesEngine, MergedRanking,
};
pub use reason::{generate_reason, generic_reason};
pub use scoring::{calculate_score, ratio_points, ScoreBreakdown};
