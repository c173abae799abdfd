//! Human-readable reasons for a suggested alternative.
//!
//! Presentation only: reasons never feed back into scoring.

use kinetic_core::{normalize_equipment, Exercise, Locale};

use crate::scoring::muscle_set;

/// Clauses kept per reason.
const MAX_CLAUSES: usize = 2;

/// Shared muscles named in the overlap clause.
const MAX_NAMED_MUSCLES: usize = 2;

/// Explain why `candidate` can replace `source`.
///
/// Signals are checked in order (movement pattern, muscle overlap,
/// equipment, difficulty) and the first two that fire are joined. When none
/// fires a generic "similar exercise" reason is returned.
pub fn generate_reason<S: AsRef<str>>(
    source: &Exercise,
    candidate: &Exercise,
    available_equipment: &[S],
    locale: Locale,
) -> String {
    let mut clauses: Vec<String> = Vec::with_capacity(MAX_CLAUSES);

    if let (Some(a), Some(b)) = (&source.movement_pattern, &candidate.movement_pattern) {
        if !a.is_empty() && a == b {
            clauses.push(match locale {
                Locale::Es => format!("Mismo patrón de movimiento ({})", a),
                Locale::En => format!("Same movement pattern ({})", a),
            });
        }
    }

    // Shared muscles are named in alphabetical order.
    let candidate_muscles = muscle_set(candidate);
    let shared: Vec<String> = normalize_equipment(&source.muscle_groups)
        .into_iter()
        .filter(|muscle| candidate_muscles.contains(muscle))
        .take(MAX_NAMED_MUSCLES)
        .collect();
    if !shared.is_empty() {
        let muscles = join_list(&shared, locale);
        clauses.push(match locale {
            Locale::Es => format!("Trabaja {}", muscles),
            Locale::En => format!("Works the {}", muscles),
        });
    }

    if let Some(clause) = equipment_clause(candidate, available_equipment, locale) {
        clauses.push(clause);
    }

    if source.difficulty == candidate.difficulty {
        clauses.push(match locale {
            Locale::Es => "Misma dificultad".to_string(),
            Locale::En => "Same difficulty".to_string(),
        });
    }

    if clauses.is_empty() {
        return generic_reason(locale).to_string();
    }

    clauses.truncate(MAX_CLAUSES);
    clauses.join(". ")
}

/// Reason used when no signal fires, and for external rankings without one.
pub fn generic_reason(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => "Ejercicio similar",
        Locale::En => "Similar exercise",
    }
}

fn equipment_clause<S: AsRef<str>>(
    candidate: &Exercise,
    available_equipment: &[S],
    locale: Locale,
) -> Option<String> {
    if candidate.requires_no_equipment() || candidate.allows_bodyweight() {
        return Some(match locale {
            Locale::Es => "No requiere equipamiento".to_string(),
            Locale::En => "No equipment needed".to_string(),
        });
    }

    let available = normalize_equipment(available_equipment);
    let all_available = normalize_equipment(&candidate.equipment)
        .iter()
        .all(|tag| available.contains(tag));
    all_available.then(|| match locale {
        Locale::Es => "Usa tu equipamiento disponible".to_string(),
        Locale::En => "Uses your available equipment".to_string(),
    })
}

fn join_list(items: &[String], locale: Locale) -> String {
    let conjunction = match locale {
        Locale::Es => " y ",
        Locale::En => " and ",
    };
    items.join(conjunction)
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
    ) -> Exercise {
        Exercise {
            id: Uuid::now_v7(),
            tenant_id: None,
            name: "test".to_string(),
            name_localized: None,
            category: None,
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
    fn test_two_clauses_in_priority_order() {
        let source = exercise(
            Some("squat"),
            &["quadriceps", "glutes"],
            &["barbell"],
            Difficulty::Intermediate,
        );
        let candidate = exercise(
            Some("squat"),
            &["quadriceps", "glutes"],
            &["bodyweight"],
            Difficulty::Intermediate,
        );

        assert_eq!(
            generate_reason(&source, &candidate, &["bodyweight"], Locale::Es),
            "Mismo patrón de movimiento (squat). Trabaja glutes y quadriceps"
        );
        assert_eq!(
            generate_reason(&source, &candidate, &["bodyweight"], Locale::En),
            "Same movement pattern (squat). Works the glutes and quadriceps"
        );
    }

    #[test]
    fn test_lower_priority_signals_fill_in() {
        let source = exercise(Some("hinge"), &["hamstrings"], &[], Difficulty::Beginner);
        let candidate = exercise(Some("pull"), &["lats"], &["dumbbell"], Difficulty::Beginner);

        assert_eq!(
            generate_reason(&source, &candidate, &["dumbbell"], Locale::En),
            "Uses your available equipment. Same difficulty"
        );
    }

    #[test]
    fn test_generic_fallback() {
        let source = exercise(Some("hinge"), &["hamstrings"], &[], Difficulty::Beginner);
        let candidate = exercise(Some("pull"), &["lats"], &["cable"], Difficulty::Advanced);

        assert_eq!(
            generate_reason(&source, &candidate, &["dumbbell"], Locale::Es),
            "Ejercicio similar"
        );
        assert_eq!(
            generate_reason(&source, &candidate, &[] as &[&str], Locale::En),
            "Similar exercise"
        );
    }

    #[test]
    fn test_never_more_than_two_clauses() {
        let source = exercise(Some("push"), &["chest"], &[], Difficulty::Advanced);
        let reason = generate_reason(&source, &source, &[] as &[&str], Locale::En);
        assert_eq!(reason.matches(". ").count(), 1);
    }
}
