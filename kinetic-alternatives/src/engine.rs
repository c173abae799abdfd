//! The alternatives pipeline.
//!
//! One straight pass per request: cache check, source lookup, candidate
//! search, scoring (external ranker or deterministic), sort, cache write,
//! truncate. Nothing is retried. The only hard failure is a missing source
//! exercise; cache and ranker failures degrade silently.

use std::collections::HashMap;
use std::sync::Arc;

use kinetic_core::{
    AlternativesConfig, AlternativesRequest, AlternativesResult, CandidateFilters, EntityId,
    EntityType, Exercise, KineticError, KineticResult, LlmError, Locale, ScoredAlternative,
    StorageError, MAX_SCORE,
};
use kinetic_llm::{AiRanking, AlternativeRanker, RankingRequest, RankingResponse};
use kinetic_storage::{
    AlternativesCache, AlternativesCacheBackend, AlternativesCacheKey, ExerciseCatalog,
};
use tracing::{debug, info, warn};

use crate::candidates;
use crate::reason::generate_reason;
use crate::scoring::calculate_score;

/// Scored candidates plus the tokens spent producing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRanking {
    pub alternatives: Vec<ScoredAlternative>,
    /// Zero unless an external ranking was used.
    pub tokens_used: u64,
    pub ai_used: bool,
}

/// Score every candidate with the deterministic scorer.
pub fn score_deterministically(
    source: &Exercise,
    candidates: Vec<Exercise>,
    available_equipment: &[String],
    locale: Locale,
) -> Vec<ScoredAlternative> {
    candidates
        .into_iter()
        .map(|candidate| {
            let score = calculate_score(source, &candidate, available_equipment);
            let reason = generate_reason(source, &candidate, available_equipment, locale);
            ScoredAlternative {
                exercise: candidate,
                score,
                reason,
            }
        })
        .collect()
}

/// Combine a ranker outcome with deterministic scores.
///
/// `Ok` uses the ranker's score and reason for every candidate it covered
/// and deterministic values for the rest; rankings for unknown ids are
/// ignored and the first ranking per id wins. `Err` discards the ranker
/// entirely and scores every candidate deterministically.
pub fn merge_rankings(
    source: &Exercise,
    candidates: Vec<Exercise>,
    available_equipment: &[String],
    locale: Locale,
    outcome: Result<RankingResponse, LlmError>,
) -> MergedRanking {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            warn!(
                exercise_id = %source.id,
                error = %e,
                "external ranking failed, using deterministic scores"
            );
            return MergedRanking {
                alternatives: score_deterministically(
                    source,
                    candidates,
                    available_equipment,
                    locale,
                ),
                tokens_used: 0,
                ai_used: false,
            };
        }
    };

    let mut by_id: HashMap<EntityId, AiRanking> = HashMap::with_capacity(response.rankings.len());
    for ranking in response.rankings {
        by_id.entry(ranking.id).or_insert(ranking);
    }

    let mut covered = 0usize;
    let alternatives = candidates
        .into_iter()
        .map(|candidate| match by_id.remove(&candidate.id) {
            Some(ai) => {
                covered += 1;
                let reason = if ai.reason.is_empty() {
                    generate_reason(source, &candidate, available_equipment, locale)
                } else {
                    ai.reason
                };
                ScoredAlternative {
                    exercise: candidate,
                    score: ai.score.min(MAX_SCORE),
                    reason,
                }
            }
            None => {
                let score = calculate_score(source, &candidate, available_equipment);
                let reason = generate_reason(source, &candidate, available_equipment, locale);
                ScoredAlternative {
                    exercise: candidate,
                    score,
                    reason,
                }
            }
        })
        .collect::<Vec<_>>();

    debug!(
        exercise_id = %source.id,
        covered,
        ignored = by_id.len(),
        "external ranking merged"
    );

    MergedRanking {
        alternatives,
        tokens_used: response.tokens_used,
        ai_used: true,
    }
}

/// Sort best first. Ties keep candidate order.
pub fn sort_by_score(alternatives: &mut [ScoredAlternative]) {
    alternatives.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Exercise alternatives engine.
///
/// # Example
///
/// ```ignore
/// let engine = AlternativesEngine::new(catalog, Arc::new(InMemoryCacheBackend::new()), config)?
///     .with_ranker(Arc::new(OpenAIRanker::new(OpenAIRankerConfig::from_env()?)));
///
/// let result = engine
///     .get_alternatives(&AlternativesRequest::new(exercise_id, tenant_id).with_ai(true))
///     .await?;
/// ```
pub struct AlternativesEngine<C, B>
where
    C: ExerciseCatalog,
    B: AlternativesCacheBackend + 'static,
{
    catalog: Arc<C>,
    cache: AlternativesCache<B>,
    ranker: Option<Arc<dyn AlternativeRanker>>,
    config: AlternativesConfig,
}

impl<C, B> AlternativesEngine<C, B>
where
    C: ExerciseCatalog,
    B: AlternativesCacheBackend + 'static,
{
    /// Create an engine without an external ranker.
    ///
    /// Fails when the config does not validate.
    pub fn new(
        catalog: Arc<C>,
        cache_backend: Arc<B>,
        config: AlternativesConfig,
    ) -> KineticResult<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            cache: AlternativesCache::from_config(cache_backend, &config),
            ranker: None,
            config,
        })
    }

    /// Register the external ranker used for AI-enabled requests.
    pub fn with_ranker(mut self, ranker: Arc<dyn AlternativeRanker>) -> Self {
        self.ranker = Some(ranker);
        self
    }

    pub fn config(&self) -> &AlternativesConfig {
        &self.config
    }

    pub fn cache(&self) -> &AlternativesCache<B> {
        &self.cache
    }

    pub fn has_ranker(&self) -> bool {
        self.ranker.is_some()
    }

    /// Candidate search exposed on its own, capped by the configured
    /// candidate limit.
    pub async fn find_candidates(
        &self,
        filters: &CandidateFilters,
    ) -> KineticResult<Vec<Exercise>> {
        candidates::find_candidates(self.catalog.as_ref(), filters, self.config.candidate_limit)
            .await
    }

    /// Return ranked alternatives for the requested exercise.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` when the source exercise is missing or not
    /// visible to the tenant, and catalog query failures. Cache and ranker
    /// failures never surface.
    pub async fn get_alternatives(
        &self,
        request: &AlternativesRequest,
    ) -> KineticResult<AlternativesResult> {
        let limit = self.config.effective_limit(request.limit);
        let locale = request.locale.unwrap_or(self.config.default_locale);
        let key = AlternativesCacheKey::new(
            request.tenant_id,
            request.exercise_id,
            &request.available_equipment,
            request.difficulty_filter,
        );

        if let Some(mut cached) = self.cache.check_cache(&key).await {
            cached.truncate(limit);
            info!(
                exercise_id = %request.exercise_id,
                tenant_id = %request.tenant_id,
                returned = cached.len(),
                was_cached = true,
                "alternatives served"
            );
            return Ok(AlternativesResult {
                alternatives: cached,
                was_cached: true,
                tokens_used: 0,
            });
        }

        let source = self
            .catalog
            .get_exercise(request.exercise_id, request.tenant_id)
            .await?
            .ok_or_else(|| {
                KineticError::Storage(StorageError::NotFound {
                    entity_type: EntityType::Exercise,
                    id: request.exercise_id,
                })
            })?;

        let filters = CandidateFilters {
            source,
            tenant_id: request.tenant_id,
            available_equipment: request.available_equipment.clone(),
            difficulty_filter: request.difficulty_filter,
        };
        let candidates = self.find_candidates(&filters).await?;

        if candidates.is_empty() {
            info!(
                exercise_id = %request.exercise_id,
                tenant_id = %request.tenant_id,
                candidates = 0,
                "no alternatives found"
            );
            return Ok(AlternativesResult::empty());
        }
        let candidate_count = candidates.len();

        let merged = if request.ai_enabled {
            let outcome = self.rank_externally(&filters, &candidates, locale).await;
            merge_rankings(
                &filters.source,
                candidates,
                &filters.available_equipment,
                locale,
                outcome,
            )
        } else {
            MergedRanking {
                alternatives: score_deterministically(
                    &filters.source,
                    candidates,
                    &filters.available_equipment,
                    locale,
                ),
                tokens_used: 0,
                ai_used: false,
            }
        };

        let mut alternatives = merged.alternatives;
        sort_by_score(&mut alternatives);

        let to_cache: Vec<ScoredAlternative> = alternatives
            .iter()
            .take(self.config.cache_width)
            .cloned()
            .collect();
        self.cache.save_to_cache(&key, to_cache).await;

        alternatives.truncate(limit);

        info!(
            exercise_id = %request.exercise_id,
            tenant_id = %request.tenant_id,
            candidates = candidate_count,
            returned = alternatives.len(),
            ai_used = merged.ai_used,
            tokens_used = merged.tokens_used,
            was_cached = false,
            "alternatives served"
        );

        Ok(AlternativesResult {
            alternatives,
            was_cached: false,
            tokens_used: merged.tokens_used,
        })
    }

    async fn rank_externally(
        &self,
        filters: &CandidateFilters,
        candidates: &[Exercise],
        locale: Locale,
    ) -> Result<RankingResponse, LlmError> {
        let ranker = self.ranker.as_ref().ok_or(LlmError::ProviderNotConfigured)?;
        let request = RankingRequest::new(
            &filters.source,
            candidates,
            &filters.available_equipment,
            locale,
        );
        debug!(
            ranker = ranker.name(),
            candidates = candidates.len(),
            "requesting external ranking"
        );
        ranker.rank(&request).await
    }
}

impl<C, B> std::fmt::Debug for AlternativesEngine<C, B>
where
    C: ExerciseCatalog,
    B: AlternativesCacheBackend + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlternativesEngine")
            .field("config", &self.config)
            .field("ranker", &self.ranker.as_ref().map(|r| r.name().to_string()))
            .finish()
    }
}
