//! KINETIC Test Utilities
//!
//! Centralized test infrastructure for the KINETIC workspace:
//! - Proptest generators for catalog entities
//! - Test fixtures for common scenarios
//! - Custom assertions for KINETIC-specific validation
//! - Tracing setup for tests

// Re-export test doubles from their source crates
pub use kinetic_llm::{FailingRanker, MockRanker};
pub use kinetic_storage::{InMemoryCacheBackend, InMemoryExerciseCatalog};

// Re-export core types for convenience
pub use kinetic_core::{
    AlternativesConfig, AlternativesRequest, AlternativesResult, Difficulty, EntityId, EntityType,
    Exercise, ExerciseMedia, KineticError, KineticResult, LlmError, Locale, ScoredAlternative,
    StorageError,
};

use chrono::Utc;
use uuid::Uuid;

// ============================================================================
// TRACING
// ============================================================================

/// Install a fmt subscriber honoring `RUST_LOG`, once per process.
///
/// Safe to call from every test; later calls are no-ops.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating test data.

    use super::*;
    use proptest::prelude::*;

    /// Generate a v4 UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(|bytes| uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    pub fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
        prop_oneof![
            Just(Difficulty::Beginner),
            Just(Difficulty::Intermediate),
            Just(Difficulty::Advanced),
        ]
    }

    pub fn arb_locale() -> impl Strategy<Value = Locale> {
        prop_oneof![Just(Locale::Es), Just(Locale::En)]
    }

    /// Generate an equipment tag, including the bodyweight marker and
    /// casing/whitespace variants.
    pub fn arb_equipment_tag() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "barbell",
            "dumbbell",
            "kettlebell",
            "bench",
            "cable",
            "bodyweight",
            "Barbell",
            " dumbbell ",
        ])
        .prop_map(str::to_string)
    }

    pub fn arb_equipment_set() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(arb_equipment_tag(), 0..5)
    }

    pub fn arb_muscle_group() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "quadriceps",
            "glutes",
            "hamstrings",
            "chest",
            "triceps",
            "lats",
            "core",
        ])
        .prop_map(str::to_string)
    }

    pub fn arb_movement_pattern() -> impl Strategy<Value = Option<String>> {
        prop::option::of(
            prop::sample::select(vec!["squat", "hinge", "push", "pull", "carry"])
                .prop_map(str::to_string),
        )
    }

    /// Generate an active, global exercise.
    pub fn arb_exercise() -> impl Strategy<Value = Exercise> {
        (
            arb_uuid(),
            arb_movement_pattern(),
            prop::collection::vec(arb_muscle_group(), 0..4),
            arb_equipment_set(),
            arb_difficulty(),
            prop::option::of(prop::sample::select(vec!["strength", "cardio", "mobility"])),
        )
            .prop_map(
                |(id, movement_pattern, muscle_groups, equipment, difficulty, category)| Exercise {
                    id,
                    tenant_id: None,
                    name: format!("exercise-{}", &id.simple().to_string()[..8]),
                    name_localized: None,
                    category: category.map(str::to_string),
                    movement_pattern,
                    muscle_groups,
                    equipment,
                    difficulty,
                    media: ExerciseMedia::default(),
                    is_active: true,
                    created_at: Utc::now(),
                },
            )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Equipment of a gym that stocks every squat variant in [`squat_catalog`].
    pub const FULL_GYM: [&str; 3] = ["barbell", "dumbbell", "kettlebell"];

    /// Build an active, global exercise.
    pub fn exercise(
        name: &str,
        movement_pattern: Option<&str>,
        muscle_groups: &[&str],
        equipment: &[&str],
        difficulty: Difficulty,
        category: Option<&str>,
    ) -> Exercise {
        Exercise {
            id: Uuid::now_v7(),
            tenant_id: None,
            name: name.to_string(),
            name_localized: None,
            category: category.map(str::to_string),
            movement_pattern: movement_pattern.map(str::to_string),
            muscle_groups: muscle_groups.iter().map(|s| s.to_string()).collect(),
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
            difficulty,
            media: ExerciseMedia::default(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Barbell back squat: quadriceps and glutes, intermediate strength.
    pub fn back_squat() -> Exercise {
        let mut squat = exercise(
            "Barbell Back Squat",
            Some("squat"),
            &["quadriceps", "glutes"],
            &["barbell"],
            Difficulty::Intermediate,
            Some("strength"),
        );
        squat.name_localized = Some("Sentadilla trasera con barra".to_string());
        squat
    }

    /// Bodyweight squat that scores exactly 80 against [`back_squat`] with
    /// `["bodyweight"]` available.
    pub fn bodyweight_squat() -> Exercise {
        let mut squat = exercise(
            "Bodyweight Squat",
            Some("squat"),
            &["quadriceps", "hamstrings"],
            &["bodyweight"],
            Difficulty::Intermediate,
            Some("strength"),
        );
        squat.name_localized = Some("Sentadilla libre".to_string());
        squat
    }

    /// A squat catalog around [`back_squat`].
    ///
    /// Returns the source and a catalog holding it, four squat variants, one
    /// hinge, and one inactive squat. With [`FULL_GYM`] available the squat
    /// variants score 90, 80, 95 and 55 in catalog order.
    pub fn squat_catalog() -> (Exercise, InMemoryExerciseCatalog) {
        let source = back_squat();
        let mut retired = exercise(
            "Smith Machine Squat",
            Some("squat"),
            &["quadriceps", "glutes"],
            &["smith machine"],
            Difficulty::Intermediate,
            Some("strength"),
        );
        retired.is_active = false;

        let catalog = InMemoryExerciseCatalog::with_exercises(vec![
            source.clone(),
            // 40 + 30 + 15 + 0 + 5 = 90
            exercise(
                "Front Squat",
                Some("squat"),
                &["quadriceps", "glutes"],
                &["barbell"],
                Difficulty::Advanced,
                Some("strength"),
            ),
            bodyweight_squat(),
            // 40 + 30 + 15 + 10 + 0 = 95.
            exercise(
                "Goblet Squat",
                Some("squat"),
                &["glutes", "quadriceps"],
                &["dumbbell", "kettlebell"],
                Difficulty::Intermediate,
                None,
            ),
            // 40 + 0 + 15 + 0 + 0 = 55.
            exercise(
                "Wall Sit",
                Some("squat"),
                &["core"],
                &[],
                Difficulty::Beginner,
                None,
            ),
            exercise(
                "Romanian Deadlift",
                Some("hinge"),
                &["hamstrings", "glutes"],
                &["barbell"],
                Difficulty::Intermediate,
                Some("strength"),
            ),
            retired,
        ]);
        (source, catalog)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for KINETIC-specific validation.

    use super::*;

    /// Assert that a KineticResult is a NotFound storage error.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(
        result: &KineticResult<T>,
        entity_type: EntityType,
    ) {
        match result {
            Err(KineticError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    /// Assert that alternatives are ordered by non-increasing score.
    #[track_caller]
    pub fn assert_sorted_by_score(alternatives: &[ScoredAlternative]) {
        for pair in alternatives.windows(2) {
            assert!(
                pair[0].score >= pair[1].score,
                "Alternatives out of order: {} ({}) before {} ({})",
                pair[0].exercise.name,
                pair[0].score,
                pair[1].exercise.name,
                pair[1].score
            );
        }
    }

    /// Assert that every score is within the valid range.
    #[track_caller]
    pub fn assert_scores_bounded(alternatives: &[ScoredAlternative]) {
        for alternative in alternatives {
            assert!(
                alternative.score <= kinetic_core::MAX_SCORE,
                "Score out of range for {}: {}",
                alternative.exercise.name,
                alternative.score
            );
        }
    }
}
