//! Exercise catalog entity.
//!
//! Exercises are owned by the catalog service; the alternatives engine only
//! ever reads them.

use crate::identity::{normalize_equipment, BODYWEIGHT};
use crate::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Difficulty tier of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, DifficultyParseError> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(DifficultyParseError(s.to_string())),
        }
    }

    /// Single-byte discriminant used in binary cache keys. Zero is reserved
    /// for "no difficulty filter".
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
        }
    }

    /// Inverse of [`Difficulty::as_byte`].
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Beginner),
            2 => Some(Self::Intermediate),
            3 => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error parsing Difficulty from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyParseError(pub String);

impl std::fmt::Display for DifficultyParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid difficulty: {}", self.0)
    }
}

impl std::error::Error for DifficultyParseError {}

/// Media references attached to an exercise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExerciseMedia {
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Exercise - one row of the exercise catalog.
///
/// `tenant_id == None` marks a global entry visible to every tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Exercise {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub tenant_id: Option<EntityId>,
    pub name: String,
    pub name_localized: Option<String>,
    pub category: Option<String>,
    pub movement_pattern: Option<String>,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub media: ExerciseMedia,
    pub is_active: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Exercise {
    /// Whether the given tenant may see this exercise.
    pub fn is_visible_to(&self, tenant_id: EntityId) -> bool {
        match self.tenant_id {
            None => true,
            Some(owner) => owner == tenant_id,
        }
    }

    /// True when the exercise needs no equipment at all.
    pub fn requires_no_equipment(&self) -> bool {
        normalize_equipment(&self.equipment).is_empty()
    }

    /// True when the exercise lists the bodyweight tag.
    pub fn allows_bodyweight(&self) -> bool {
        self.equipment
            .iter()
            .any(|tag| tag.trim().eq_ignore_ascii_case(BODYWEIGHT))
    }

    /// Display name for a locale, falling back to the canonical name.
    pub fn display_name(&self, localized: bool) -> &str {
        match (&self.name_localized, localized) {
            (Some(name), true) if !name.is_empty() => name,
            _ => &self.name,
        }
    }
}
