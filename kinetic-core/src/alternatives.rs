//! Value objects flowing through the alternatives pipeline.

use crate::{Difficulty, EntityId, Exercise};
use serde::{Deserialize, Serialize};

/// Highest score the deterministic scorer or an external ranker may assign.
pub const MAX_SCORE: u8 = 100;

/// Language used for human-readable reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    /// Parse a locale tag such as `es`, `es-MX` or `en_US`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        match lang.as_str() {
            "es" => Some(Self::Es),
            "en" => Some(Self::En),
            _ => None,
        }
    }

    /// Whether names should use the localized column.
    pub fn prefers_localized_names(&self) -> bool {
        matches!(self, Self::Es)
    }
}

/// A candidate exercise with its similarity score and explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoredAlternative {
    pub exercise: Exercise,
    /// Similarity score in `0..=100`.
    pub score: u8,
    pub reason: String,
}

/// Per-request inputs to the candidate finder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilters {
    pub source: Exercise,
    pub tenant_id: EntityId,
    pub available_equipment: Vec<String>,
    pub difficulty_filter: Option<Difficulty>,
}

/// Hard filters pushed down to the catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub tenant_id: EntityId,
    pub exclude_id: EntityId,
    pub movement_pattern: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub limit: usize,
}

/// Caller-facing request for alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlternativesRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub exercise_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub tenant_id: EntityId,
    #[serde(default)]
    pub available_equipment: Vec<String>,
    #[serde(default)]
    pub difficulty_filter: Option<Difficulty>,
    /// Number of alternatives to return. `None` uses the configured default.
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub ai_enabled: bool,
    #[serde(default)]
    pub locale: Option<Locale>,
}

impl AlternativesRequest {
    /// Request with defaults: no equipment, no filter, deterministic ranking.
    pub fn new(exercise_id: EntityId, tenant_id: EntityId) -> Self {
        Self {
            exercise_id,
            tenant_id,
            available_equipment: Vec::new(),
            difficulty_filter: None,
            limit: None,
            ai_enabled: false,
            locale: None,
        }
    }

    pub fn with_equipment<S: Into<String>>(
        mut self,
        equipment: impl IntoIterator<Item = S>,
    ) -> Self {
        self.available_equipment = equipment.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty_filter = Some(difficulty);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_ai(mut self, enabled: bool) -> Self {
        self.ai_enabled = enabled;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }
}

/// Outcome of one `get_alternatives` call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlternativesResult {
    pub alternatives: Vec<ScoredAlternative>,
    pub was_cached: bool,
    /// Heuristic token estimate for the external ranker, 0 when unused.
    pub tokens_used: u64,
}

impl AlternativesResult {
    /// Empty, non-cached result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ids of the returned alternatives in rank order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.alternatives.iter().map(|a| a.exercise.id).collect()
    }
}
