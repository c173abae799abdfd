//! KINETIC LLM - External Ranker Layer
//!
//! Provider-agnostic trait for ranking exercise alternatives with a language
//! model, plus the concrete OpenAI provider and test doubles.
//!
//! Rankers report failure through [`LlmError`]. Callers are expected to
//! treat any error as "no AI output" and fall back to deterministic scoring.

pub mod providers;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kinetic_core::{Difficulty, EntityId, Exercise, LlmError, Locale};
use serde::{Deserialize, Serialize};

pub use providers::{OpenAIClient, OpenAIRanker, OpenAIRankerConfig};

// ============================================================================
// RANKING TYPES
// ============================================================================

/// Compact view of an exercise sent to the ranker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingCandidate {
    pub id: EntityId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_pattern: Option<String>,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub difficulty: Difficulty,
}

impl RankingCandidate {
    /// Project an exercise, naming it the way the locale's users know it.
    pub fn new(exercise: &Exercise, locale: Locale) -> Self {
        Self {
            id: exercise.id,
            name: exercise
                .display_name(locale.prefers_localized_names())
                .to_string(),
            category: exercise.category.clone(),
            movement_pattern: exercise.movement_pattern.clone(),
            muscle_groups: exercise.muscle_groups.clone(),
            equipment: exercise.equipment.clone(),
            difficulty: exercise.difficulty,
        }
    }
}

/// Everything a ranker gets to see for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRequest {
    pub source: RankingCandidate,
    pub candidates: Vec<RankingCandidate>,
    pub available_equipment: Vec<String>,
    /// Language the reasons should be written in.
    pub locale: Locale,
}

impl RankingRequest {
    pub fn new(
        source: &Exercise,
        candidates: &[Exercise],
        available_equipment: &[String],
        locale: Locale,
    ) -> Self {
        Self {
            source: RankingCandidate::new(source, locale),
            candidates: candidates
                .iter()
                .map(|candidate| RankingCandidate::new(candidate, locale))
                .collect(),
            available_equipment: available_equipment.to_vec(),
            locale,
        }
    }
}

/// One ranked candidate as returned by a ranker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiRanking {
    pub id: EntityId,
    /// Suitability score, clamped to 0..=100.
    pub score: u8,
    pub reason: String,
}

/// Ranker output. May cover only part of the candidates, and may contain
/// ids that were never sent; callers must match by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingResponse {
    pub rankings: Vec<AiRanking>,
    /// Heuristic token estimate for cost accounting.
    pub tokens_used: u64,
}

// ============================================================================
// RANKER TRAIT
// ============================================================================

/// Trait for external alternative rankers.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// let ranker = OpenAIRanker::new(OpenAIRankerConfig::from_env()?);
/// let request = RankingRequest::new(&source, &candidates, &equipment, Locale::Es);
/// let response = ranker.rank(&request).await?;
/// ```
#[async_trait]
pub trait AlternativeRanker: Send + Sync {
    /// Rank the request's candidates against its source exercise.
    ///
    /// # Returns
    /// * `Ok(RankingResponse)` - Rankings for some or all candidates
    /// * `Err(LlmError)` - Provider, transport or parse failure
    async fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, LlmError>;

    /// Identifier for logs (e.g. the model name).
    fn name(&self) -> &str;
}

/// Rough token count: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

// ============================================================================
// TEST DOUBLES
// ============================================================================

/// Ranker returning a fixed response.
#[derive(Debug, Default)]
pub struct MockRanker {
    response: RankingResponse,
    calls: AtomicUsize,
}

impl MockRanker {
    pub fn new(response: RankingResponse) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    /// Build a mock from `(id, score, reason)` triples.
    pub fn with_rankings<'a>(
        rankings: impl IntoIterator<Item = (EntityId, u8, &'a str)>,
        tokens_used: u64,
    ) -> Self {
        Self::new(RankingResponse {
            rankings: rankings
                .into_iter()
                .map(|(id, score, reason)| AiRanking {
                    id,
                    score,
                    reason: reason.to_string(),
                })
                .collect(),
            tokens_used,
        })
    }

    /// Number of times `rank` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlternativeRanker for MockRanker {
    async fn rank(&self, _request: &RankingRequest) -> Result<RankingResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Ranker that always fails with the configured error.
#[derive(Debug)]
pub struct FailingRanker {
    error: LlmError,
    calls: AtomicUsize,
}

impl FailingRanker {
    pub fn new(error: LlmError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FailingRanker {
    fn default() -> Self {
        Self::new(LlmError::InvalidResponse {
            provider: "failing".to_string(),
            reason: "malformed ranking payload".to_string(),
        })
    }
}

#[async_trait]
impl AlternativeRanker for FailingRanker {
    async fn rank(&self, _request: &RankingRequest) -> Result<RankingResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_core::ExerciseMedia;

    fn exercise(name: &str, equipment: &[&str]) -> Exercise {
        Exercise {
            id: uuid::Uuid::now_v7(),
            tenant_id: None,
            name: name.to_string(),
            name_localized: None,
            category: Some("strength".to_string()),
            movement_pattern: Some("hinge".to_string()),
            muscle_groups: vec!["hamstrings".to_string()],
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
            difficulty: Difficulty::Intermediate,
            media: ExerciseMedia::default(),
            is_active: true,
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        // Counts characters, not bytes.
        assert_eq!(estimate_tokens("ñññññññ"), 2);
    }

    #[test]
    fn test_request_projects_exercises() {
        let source = exercise("Romanian Deadlift", &["barbell"]);
        let candidates = vec![
            exercise("Good Morning", &["barbell"]),
            exercise("Hip Hinge", &[]),
        ];
        let equipment = vec!["barbell".to_string()];

        let request = RankingRequest::new(&source, &candidates, &equipment, Locale::En);

        assert_eq!(request.source.id, source.id);
        assert_eq!(request.candidates.len(), 2);
        assert_eq!(request.candidates[1].name, "Hip Hinge");
        assert_eq!(request.available_equipment, equipment);

        let json = serde_json::to_value(&request.candidates[0]).unwrap();
        assert_eq!(json["difficulty"], "intermediate");
    }

    #[test]
    fn test_candidate_names_follow_locale() {
        let mut source = exercise("Romanian Deadlift", &["barbell"]);
        source.name_localized = Some("Peso muerto rumano".to_string());
        let untranslated = exercise("Good Morning", &["barbell"]);
        let candidates = vec![untranslated];

        let es = RankingRequest::new(&source, &candidates, &[], Locale::Es);
        assert_eq!(es.source.name, "Peso muerto rumano");
        assert_eq!(es.candidates[0].name, "Good Morning");

        let en = RankingRequest::new(&source, &candidates, &[], Locale::En);
        assert_eq!(en.source.name, "Romanian Deadlift");
    }

    #[tokio::test]
    async fn test_mock_ranker_returns_fixed_response() {
        let id = uuid::Uuid::now_v7();
        let ranker = MockRanker::with_rankings([(id, 88, "close match")], 120);
        let source = exercise("A", &[]);
        let request = RankingRequest::new(&source, &[], &[], Locale::Es);

        let response = ranker.rank(&request).await.unwrap();
        assert_eq!(response.tokens_used, 120);
        assert_eq!(response.rankings[0].id, id);
        assert_eq!(ranker.calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_ranker_always_errors() {
        let ranker = FailingRanker::new(LlmError::RateLimited {
            provider: "openai".to_string(),
            retry_after_ms: 1000,
        });
        let source = exercise("A", &[]);
        let request = RankingRequest::new(&source, &[], &[], Locale::Es);

        assert!(matches!(
            ranker.rank(&request).await,
            Err(LlmError::RateLimited { .. })
        ));
        assert!(ranker.rank(&request).await.is_err());
        assert_eq!(ranker.calls(), 2);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_estimate_tokens_is_ceil_quarter(text in ".{0,200}") {
            let chars = text.chars().count() as u64;
            let tokens = estimate_tokens(&text);
            prop_assert!(tokens * 4 >= chars);
            prop_assert!(tokens * 4 < chars + 4);
        }
    }
}
