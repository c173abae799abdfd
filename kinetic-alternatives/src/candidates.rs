//! Candidate finder.
//!
//! Hard filters (visibility, activity, movement pattern, difficulty, row cap)
//! are pushed down to the catalog; the equipment check runs afterwards on
//! the returned rows. Catalog order is preserved.

use std::collections::BTreeSet;

use kinetic_core::{normalize_equipment, CandidateFilters, CandidateQuery, Exercise, KineticResult};
use kinetic_storage::ExerciseCatalog;
use tracing::debug;

/// Whether a candidate is usable with the caller's equipment.
///
/// Passes when the candidate needs no equipment, lists bodyweight, or needs
/// at least one tag the caller has.
pub fn passes_equipment_filter<S: AsRef<str>>(candidate: &Exercise, available: &[S]) -> bool {
    if candidate.requires_no_equipment() || candidate.allows_bodyweight() {
        return true;
    }
    let available: BTreeSet<String> = normalize_equipment(available).into_iter().collect();
    normalize_equipment(&candidate.equipment)
        .iter()
        .any(|tag| available.contains(tag))
}

/// Build the catalog query for a set of filters.
pub fn candidate_query(filters: &CandidateFilters, limit: usize) -> CandidateQuery {
    CandidateQuery {
        tenant_id: filters.tenant_id,
        exclude_id: filters.source.id,
        movement_pattern: filters
            .source
            .movement_pattern
            .clone()
            .filter(|pattern| !pattern.is_empty()),
        difficulty: filters.difficulty_filter,
        limit,
    }
}

/// Find alternatives for the filters' source exercise.
///
/// Returns at most `limit` exercises, possibly none. Catalog failures
/// propagate.
pub async fn find_candidates<C: ExerciseCatalog + ?Sized>(
    catalog: &C,
    filters: &CandidateFilters,
    limit: usize,
) -> KineticResult<Vec<Exercise>> {
    let query = candidate_query(filters, limit);
    let rows = catalog.query_candidates(&query).await?;
    let fetched = rows.len();

    let candidates: Vec<Exercise> = rows
        .into_iter()
        .filter(|candidate| passes_equipment_filter(candidate, &filters.available_equipment))
        .collect();

    debug!(
        exercise_id = %filters.source.id,
        tenant_id = %filters.tenant_id,
        fetched,
        candidates = candidates.len(),
        "candidates filtered"
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kinetic_core::{Difficulty, ExerciseMedia};
    use kinetic_storage::InMemoryExerciseCatalog;
    use uuid::Uuid;

    fn exercise(pattern: &str, equipment: &[&str], difficulty: Difficulty) -> Exercise {
        Exercise {
            id: Uuid::now_v7(),
            tenant_id: None,
            name: format!("{} {:?}", pattern, equipment),
            name_localized: None,
            category: None,
            movement_pattern: Some(pattern.to_string()),
            muscle_groups: vec![],
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
            difficulty,
            media: ExerciseMedia::default(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn filters(source: &Exercise, tenant_id: Uuid, available: &[&str]) -> CandidateFilters {
        CandidateFilters {
            source: source.clone(),
            tenant_id,
            available_equipment: available.iter().map(|s| s.to_string()).collect(),
            difficulty_filter: None,
        }
    }

    #[test]
    fn test_equipment_filter_rules() {
        let barbell = exercise("squat", &["barbell"], Difficulty::Beginner);
        let free = exercise("squat", &[], Difficulty::Beginner);
        let bodyweight = exercise("squat", &["Bodyweight", "box"], Difficulty::Beginner);

        assert!(!passes_equipment_filter(&barbell, &["dumbbell"]));
        assert!(passes_equipment_filter(&barbell, &["barbell"]));
        assert!(passes_equipment_filter(&barbell, &[" BARBELL"]));
        assert!(passes_equipment_filter(&free, &["dumbbell"]));
        assert!(passes_equipment_filter(&free, &[] as &[&str]));
        assert!(passes_equipment_filter(&bodyweight, &[] as &[&str]));

        let combo = exercise("squat", &["barbell", "rack"], Difficulty::Beginner);
        assert!(passes_equipment_filter(&combo, &["rack"]));
    }

    #[test]
    fn test_query_narrows_by_source_pattern() {
        let source = exercise("hinge", &[], Difficulty::Beginner);
        let tenant = Uuid::now_v7();
        let mut f = filters(&source, tenant, &[]);
        f.difficulty_filter = Some(Difficulty::Advanced);

        let query = candidate_query(&f, 50);
        assert_eq!(query.exclude_id, source.id);
        assert_eq!(query.movement_pattern.as_deref(), Some("hinge"));
        assert_eq!(query.difficulty, Some(Difficulty::Advanced));
        assert_eq!(query.limit, 50);

        let mut patternless = source.clone();
        patternless.movement_pattern = None;
        assert_eq!(candidate_query(&filters(&patternless, tenant, &[]), 10).movement_pattern, None);
    }

    #[tokio::test]
    async fn test_find_candidates_applies_post_filter_in_catalog_order() {
        let source = exercise("squat", &["barbell"], Difficulty::Intermediate);
        let front_squat = exercise("squat", &["barbell"], Difficulty::Advanced);
        let goblet = exercise("squat", &["dumbbell"], Difficulty::Beginner);
        let air_squat = exercise("squat", &[], Difficulty::Beginner);
        let deadlift = exercise("hinge", &["barbell"], Difficulty::Intermediate);

        let catalog = InMemoryExerciseCatalog::with_exercises(vec![
            source.clone(),
            front_squat.clone(),
            goblet,
            air_squat.clone(),
            deadlift,
        ]);

        let found = find_candidates(&catalog, &filters(&source, Uuid::now_v7(), &["barbell"]), 50)
            .await
            .unwrap();
        let ids: Vec<Uuid> = found.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![front_squat.id, air_squat.id]);
    }

    #[tokio::test]
    async fn test_find_candidates_can_be_empty() {
        let source = exercise("carry", &[], Difficulty::Beginner);
        let catalog = InMemoryExerciseCatalog::with_exercises(vec![source.clone()]);

        let found = find_candidates(&catalog, &filters(&source, Uuid::now_v7(), &[]), 50)
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
