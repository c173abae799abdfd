//! Deterministic similarity scoring.
//!
//! The score is a weighted sum of five independent dimensions:
//!
//! | Dimension        | Max | Rule                                          |
//! |------------------|-----|-----------------------------------------------|
//! | Movement pattern | 40  | patterns equal and present                    |
//! | Muscle overlap   | 30  | `round(30 * |A ∩ B| / |A ∪ B|)`, 0 if A ∪ B = ∅ |
//! | Equipment        | 15  | `round(15 * matched / required)`              |
//! | Difficulty       | 10  | equal tiers                                   |
//! | Category         | 5   | categories equal and present                  |
//!
//! Candidates that need no equipment, or list bodyweight, always get the
//! full equipment points.
//!
//! Every term is rounded half-up on its own, so cached lists computed by any
//! implementation of these rules stay comparable.

use std::collections::BTreeSet;

use kinetic_core::{normalize_equipment, Exercise, MAX_SCORE};
use serde::{Deserialize, Serialize};

pub const MOVEMENT_PATTERN_POINTS: u8 = 40;
pub const MUSCLE_OVERLAP_POINTS: u8 = 30;
pub const EQUIPMENT_POINTS: u8 = 15;
pub const DIFFICULTY_POINTS: u8 = 10;
pub const CATEGORY_POINTS: u8 = 5;

/// Points awarded per dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub movement_pattern: u8,
    pub muscle_overlap: u8,
    pub equipment: u8,
    pub difficulty: u8,
    pub category: u8,
}

impl ScoreBreakdown {
    /// Compute every dimension for a source/candidate pair.
    pub fn compute<S: AsRef<str>>(
        source: &Exercise,
        candidate: &Exercise,
        available_equipment: &[S],
    ) -> Self {
        Self {
            movement_pattern: points_if(
                same_present(&source.movement_pattern, &candidate.movement_pattern),
                MOVEMENT_PATTERN_POINTS,
            ),
            muscle_overlap: muscle_overlap_points(source, candidate),
            equipment: equipment_points(candidate, available_equipment),
            difficulty: points_if(source.difficulty == candidate.difficulty, DIFFICULTY_POINTS),
            category: points_if(
                same_present(&source.category, &candidate.category),
                CATEGORY_POINTS,
            ),
        }
    }

    /// Sum of all dimensions, never above [`MAX_SCORE`].
    pub fn total(&self) -> u8 {
        let sum = self.movement_pattern as u16
            + self.muscle_overlap as u16
            + self.equipment as u16
            + self.difficulty as u16
            + self.category as u16;
        sum.min(MAX_SCORE as u16) as u8
    }
}

/// Similarity of `candidate` to `source` in `0..=100`.
pub fn calculate_score<S: AsRef<str>>(
    source: &Exercise,
    candidate: &Exercise,
    available_equipment: &[S],
) -> u8 {
    ScoreBreakdown::compute(source, candidate, available_equipment).total()
}

/// `round(max * numerator / denominator)` with halves rounded up, in
/// integer arithmetic. A zero denominator yields zero; the result never
/// exceeds `max`.
pub fn ratio_points(numerator: usize, denominator: usize, max: u8) -> u8 {
    if denominator == 0 {
        return 0;
    }
    let numerator = numerator.min(denominator) as u64;
    let denominator = denominator as u64;
    let points = (2 * numerator * u64::from(max) + denominator) / (2 * denominator);
    u8::try_from(points).unwrap_or(max)
}

fn points_if(condition: bool, points: u8) -> u8 {
    if condition {
        points
    } else {
        0
    }
}

fn same_present(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}

/// Normalized muscle-group set of an exercise. Muscle tags share the
/// equipment tag normalization (trimmed, lowercased, deduplicated).
pub(crate) fn muscle_set(exercise: &Exercise) -> BTreeSet<String> {
    normalize_equipment(&exercise.muscle_groups)
        .into_iter()
        .collect()
}

fn muscle_overlap_points(source: &Exercise, candidate: &Exercise) -> u8 {
    let a = muscle_set(source);
    let b = muscle_set(candidate);
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    ratio_points(intersection, union, MUSCLE_OVERLAP_POINTS)
}

fn equipment_points<S: AsRef<str>>(candidate: &Exercise, available_equipment: &[S]) -> u8 {
    if candidate.requires_no_equipment() || candidate.allows_bodyweight() {
        return EQUIPMENT_POINTS;
    }
    let required = normalize_equipment(&candidate.equipment);
    let available: BTreeSet<String> =
        normalize_equipment(available_equipment).into_iter().collect();
    let matched = required.iter().filter(|tag| available.contains(*tag)).count();
    ratio_points(matched, required.len(), EQUIPMENT_POINTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kinetic_core::{Difficulty, ExerciseMedia};
    use uuid::Uuid;

    fn exercise(
        pattern: Option<&str>,
        muscles: &[&str],
        equipment: &[&str],
        difficulty: Difficulty,
        category: Option<&str>,
    ) -> Exercise {
        Exercise {
            id: Uuid::now_v7(),
            tenant_id: None,
            name: "test".to_string(),
            name_localized: None,
            category: category.map(str::to_string),
            movement_pattern: pattern.map(str::to_string),
            muscle_groups: muscles.iter().map(|s| s.to_string()).collect(),
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
            difficulty,
            media: ExerciseMedia::default(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_worked_example_scores_80() {
        let source = exercise(
            Some("squat"),
            &["quadriceps", "glutes"],
            &["barbell"],
            Difficulty::Intermediate,
            Some("strength"),
        );
        let candidate = exercise(
            Some("squat"),
            &["quadriceps", "hamstrings"],
            &["bodyweight"],
            Difficulty::Intermediate,
            Some("strength"),
        );

        let breakdown = ScoreBreakdown::compute(&source, &candidate, &["bodyweight"]);
        assert_eq!(
            breakdown,
            ScoreBreakdown {
                movement_pattern: 40,
                muscle_overlap: 10,
                equipment: 15,
                difficulty: 10,
                category: 5,
            }
        );
        assert_eq!(calculate_score(&source, &candidate, &["bodyweight"]), 80);
    }

    #[test]
    fn test_identical_exercise_scores_100() {
        let source = exercise(
            Some("push"),
            &["chest", "triceps"],
            &["barbell", "bench"],
            Difficulty::Advanced,
            Some("strength"),
        );
        assert_eq!(calculate_score(&source, &source, &["bench", "barbell"]), 100);
    }

    #[test]
    fn test_missing_patterns_and_categories_score_nothing() {
        let a = exercise(None, &[], &[], Difficulty::Beginner, None);
        let b = exercise(None, &[], &[], Difficulty::Advanced, None);
        let breakdown = ScoreBreakdown::compute(&a, &b, &[] as &[&str]);
        assert_eq!(breakdown.movement_pattern, 0);
        assert_eq!(breakdown.category, 0);
        assert_eq!(breakdown.muscle_overlap, 0);
        // No equipment needed still earns the equipment points.
        assert_eq!(breakdown.equipment, 15);
        assert_eq!(breakdown.total(), 15);
    }

    #[test]
    fn test_partial_equipment_rounds_half_up() {
        let source = exercise(None, &[], &[], Difficulty::Beginner, None);
        // 1 of 2 required tags available: round(7.5) = 8.
        let candidate = exercise(None, &[], &["barbell", "rack"], Difficulty::Beginner, None);
        let breakdown = ScoreBreakdown::compute(&source, &candidate, &["Barbell "]);
        assert_eq!(breakdown.equipment, 8);

        let breakdown = ScoreBreakdown::compute(&source, &candidate, &["dumbbell"]);
        assert_eq!(breakdown.equipment, 0);
    }

    #[test]
    fn test_muscle_overlap_is_case_insensitive() {
        let source = exercise(None, &["Chest", "triceps"], &[], Difficulty::Beginner, None);
        let candidate = exercise(None, &["chest", "Triceps "], &[], Difficulty::Beginner, None);
        assert_eq!(
            ScoreBreakdown::compute(&source, &candidate, &[] as &[&str]).muscle_overlap,
            30
        );
    }

    #[test]
    fn test_ratio_points() {
        assert_eq!(ratio_points(1, 3, 30), 10);
        assert_eq!(ratio_points(2, 3, 30), 20);
        assert_eq!(ratio_points(1, 2, 15), 8);
        assert_eq!(ratio_points(1, 4, 15), 4); // 3.75
        assert_eq!(ratio_points(1, 8, 15), 2); // 1.875
        assert_eq!(ratio_points(0, 0, 30), 0);
        assert_eq!(ratio_points(5, 5, 30), 30);
    }

    #[test]
    fn test_ratio_points_full_range() {
        assert_eq!(ratio_points(1, 1, u8::MAX), u8::MAX);
        assert_eq!(ratio_points(7, 3, u8::MAX), u8::MAX);
        assert_eq!(ratio_points(1, 2, u8::MAX), 128);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use kinetic_test_utils::generators::{arb_equipment_set, arb_exercise};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_score_is_bounded(
            source in arb_exercise(),
            candidate in arb_exercise(),
            available in arb_equipment_set(),
        ) {
            let score = calculate_score(&source, &candidate, &available);
            prop_assert!(score <= MAX_SCORE);
        }

        #[test]
        fn prop_score_is_deterministic(
            source in arb_exercise(),
            candidate in arb_exercise(),
            available in arb_equipment_set(),
        ) {
            let first = calculate_score(&source, &candidate, &available);
            let second = calculate_score(&source, &candidate, &available);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_equipment_order_does_not_matter(
            source in arb_exercise(),
            candidate in arb_exercise(),
            mut available in arb_equipment_set(),
        ) {
            let forward = calculate_score(&source, &candidate, &available);
            available.reverse();
            prop_assert_eq!(forward, calculate_score(&source, &candidate, &available));
        }

        #[test]
        fn prop_self_score_is_at_least_difficulty_points(exercise in arb_exercise()) {
            let breakdown = ScoreBreakdown::compute(&exercise, &exercise, &exercise.equipment);
            prop_assert_eq!(breakdown.difficulty, DIFFICULTY_POINTS);
            prop_assert_eq!(breakdown.equipment, EQUIPMENT_POINTS);
        }

        #[test]
        fn prop_ratio_points_within_max(n in 0usize..100, d in 0usize..100, max in any::<u8>()) {
            prop_assert!(ratio_points(n, d, max) <= max);
        }
    }
}
