//! Exercise catalog access.
//!
//! The catalog is owned by an external service. The engine only needs two
//! reads from it: a tenant-visible lookup by id and a filtered candidate
//! query.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use kinetic_core::{
    CandidateQuery, EntityId, EntityType, Exercise, KineticError, KineticResult, StorageError,
};

/// Read access to the exercise catalog.
///
/// Implementations must scope every read to the tenant: an exercise is
/// visible when it is global (`tenant_id == None`) or owned by the tenant.
#[async_trait]
pub trait ExerciseCatalog: Send + Sync {
    /// Get a visible exercise by ID.
    async fn get_exercise(
        &self,
        id: EntityId,
        tenant_id: EntityId,
    ) -> KineticResult<Option<Exercise>>;

    /// Return active, visible exercises matching the query's hard filters.
    ///
    /// The source exercise is excluded, `movement_pattern` and `difficulty`
    /// match exactly when set, and at most `limit` rows are returned in
    /// catalog order.
    async fn query_candidates(&self, query: &CandidateQuery) -> KineticResult<Vec<Exercise>>;
}

/// Whether an exercise satisfies the hard filters of a candidate query.
pub fn matches_query(exercise: &Exercise, query: &CandidateQuery) -> bool {
    if exercise.id == query.exclude_id || !exercise.is_active {
        return false;
    }
    if !exercise.is_visible_to(query.tenant_id) {
        return false;
    }
    if let Some(pattern) = &query.movement_pattern {
        if exercise.movement_pattern.as_deref() != Some(pattern.as_str()) {
            return false;
        }
    }
    if let Some(difficulty) = query.difficulty {
        if exercise.difficulty != difficulty {
            return false;
        }
    }
    true
}

/// In-memory catalog preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExerciseCatalog {
    exercises: Arc<RwLock<Vec<Exercise>>>,
}

impl InMemoryExerciseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of exercises.
    pub fn with_exercises(exercises: impl IntoIterator<Item = Exercise>) -> Self {
        Self {
            exercises: Arc::new(RwLock::new(exercises.into_iter().collect())),
        }
    }

    /// Insert or replace an exercise (replacement keeps its position).
    pub fn insert(&self, exercise: Exercise) -> KineticResult<()> {
        let mut exercises = self
            .exercises
            .write()
            .map_err(|_| KineticError::Storage(StorageError::LockPoisoned))?;
        match exercises.iter_mut().find(|e| e.id == exercise.id) {
            Some(existing) => *existing = exercise,
            None => exercises.push(exercise),
        }
        Ok(())
    }

    /// Number of exercises, active or not.
    pub fn len(&self) -> usize {
        self.exercises.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ExerciseCatalog for InMemoryExerciseCatalog {
    async fn get_exercise(
        &self,
        id: EntityId,
        tenant_id: EntityId,
    ) -> KineticResult<Option<Exercise>> {
        let exercises = self
            .exercises
            .read()
            .map_err(|_| KineticError::Storage(StorageError::LockPoisoned))?;
        Ok(exercises
            .iter()
            .find(|e| e.id == id && e.is_visible_to(tenant_id))
            .cloned())
    }

    async fn query_candidates(&self, query: &CandidateQuery) -> KineticResult<Vec<Exercise>> {
        let exercises = self.exercises.read().map_err(|_| {
            KineticError::Storage(StorageError::QueryFailed {
                entity_type: EntityType::Exercise,
                reason: "catalog lock poisoned".to_string(),
            })
        })?;
        Ok(exercises
            .iter()
            .filter(|e| matches_query(e, query))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kinetic_core::{Difficulty, ExerciseMedia};
    use uuid::Uuid;

    fn exercise(pattern: &str, difficulty: Difficulty, tenant_id: Option<Uuid>) -> Exercise {
        Exercise {
            id: Uuid::now_v7(),
            tenant_id,
            name: format!("{} movement", pattern),
            name_localized: None,
            category: Some("strength".to_string()),
            movement_pattern: Some(pattern.to_string()),
            muscle_groups: vec![],
            equipment: vec![],
            difficulty,
            media: ExerciseMedia::default(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn query(tenant_id: Uuid, exclude_id: Uuid) -> CandidateQuery {
        CandidateQuery {
            tenant_id,
            exclude_id,
            movement_pattern: None,
            difficulty: None,
            limit: 50,
        }
    }

    #[tokio::test]
    async fn test_get_exercise_respects_visibility() {
        let tenant = Uuid::now_v7();
        let other = Uuid::now_v7();
        let global = exercise("squat", Difficulty::Beginner, None);
        let owned = exercise("squat", Difficulty::Beginner, Some(tenant));
        let foreign = exercise("squat", Difficulty::Beginner, Some(other));
        let catalog = InMemoryExerciseCatalog::with_exercises(vec![
            global.clone(),
            owned.clone(),
            foreign.clone(),
        ]);

        assert!(catalog.get_exercise(global.id, tenant).await.unwrap().is_some());
        assert!(catalog.get_exercise(owned.id, tenant).await.unwrap().is_some());
        assert!(catalog.get_exercise(foreign.id, tenant).await.unwrap().is_none());
        assert!(catalog.get_exercise(Uuid::now_v7(), tenant).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_applies_hard_filters() {
        let tenant = Uuid::now_v7();
        let source = exercise("squat", Difficulty::Intermediate, None);
        let same = exercise("squat", Difficulty::Intermediate, None);
        let harder = exercise("squat", Difficulty::Advanced, None);
        let hinge = exercise("hinge", Difficulty::Intermediate, None);
        let mut inactive = exercise("squat", Difficulty::Intermediate, None);
        inactive.is_active = false;
        let foreign = exercise("squat", Difficulty::Intermediate, Some(Uuid::now_v7()));

        let catalog = InMemoryExerciseCatalog::with_exercises(vec![
            source.clone(),
            same.clone(),
            harder.clone(),
            hinge,
            inactive,
            foreign,
        ]);

        let mut q = query(tenant, source.id);
        q.movement_pattern = Some("squat".to_string());
        let ids: Vec<Uuid> = catalog
            .query_candidates(&q)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![same.id, harder.id]);

        q.difficulty = Some(Difficulty::Advanced);
        let ids: Vec<Uuid> = catalog
            .query_candidates(&q)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![harder.id]);
    }

    #[tokio::test]
    async fn test_query_caps_rows() {
        let tenant = Uuid::now_v7();
        let catalog = InMemoryExerciseCatalog::new();
        for _ in 0..10 {
            catalog
                .insert(exercise("push", Difficulty::Beginner, None))
                .unwrap();
        }
        let mut q = query(tenant, Uuid::now_v7());
        q.limit = 4;
        assert_eq!(catalog.query_candidates(&q).await.unwrap().len(), 4);
        assert_eq!(catalog.len(), 10);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let catalog = InMemoryExerciseCatalog::new();
        let mut e = exercise("push", Difficulty::Beginner, None);
        catalog.insert(e.clone()).unwrap();
        e.name = "Renamed".to_string();
        catalog.insert(e).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
