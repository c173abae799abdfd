//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lifetime of a cached alternatives list (7 days).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Number of ranked alternatives stored per cache entry.
pub const DEFAULT_CACHE_WIDTH: usize = 20;

/// Hard cap on rows fetched from the catalog per request.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 50;

/// Alternatives returned when the caller does not ask for a count.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlternativesConfig {
    /// Cache entry lifetime, serialized as `{ "secs": .., "nanos": .. }`
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub cache_ttl: Duration,
    pub cache_width: usize,
    pub candidate_limit: usize,
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_locale: Locale,
}

impl Default for AlternativesConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_width: DEFAULT_CACHE_WIDTH,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            default_limit: DEFAULT_RESULT_LIMIT,
            max_limit: DEFAULT_CACHE_WIDTH,
            default_locale: Locale::Es,
        }
    }
}

impl AlternativesConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `KINETIC_CACHE_TTL_SECS`: Cache entry lifetime (default: 604800)
    /// - `KINETIC_CACHE_WIDTH`: Alternatives stored per entry (default: 20)
    /// - `KINETIC_CANDIDATE_LIMIT`: Catalog rows per request (default: 50)
    /// - `KINETIC_DEFAULT_LIMIT`: Alternatives returned by default (default: 5)
    /// - `KINETIC_MAX_LIMIT`: Largest accepted limit (default: 20)
    /// - `KINETIC_DEFAULT_LOCALE`: `es` or `en` (default: es)
    ///
    /// Unparseable values fall back to the defaults; call [`validate`] on the
    /// result before use.
    ///
    /// [`validate`]: AlternativesConfig::validate
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_ttl = env_parse::<u64>("KINETIC_CACHE_TTL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);
        let cache_width = env_parse("KINETIC_CACHE_WIDTH").unwrap_or(defaults.cache_width);
        let candidate_limit =
            env_parse("KINETIC_CANDIDATE_LIMIT").unwrap_or(defaults.candidate_limit);
        let default_limit = env_parse("KINETIC_DEFAULT_LIMIT").unwrap_or(defaults.default_limit);
        let max_limit = env_parse("KINETIC_MAX_LIMIT").unwrap_or(defaults.max_limit);
        let default_locale = std::env::var("KINETIC_DEFAULT_LOCALE")
            .ok()
            .and_then(|tag| Locale::from_tag(&tag))
            .unwrap_or(defaults.default_locale);

        Self {
            cache_ttl,
            cache_width,
            candidate_limit,
            default_limit,
            max_limit,
            default_locale,
        }
    }

    /// Set the cache entry lifetime.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set how many alternatives each cache entry stores.
    pub fn with_cache_width(mut self, width: usize) -> Self {
        self.cache_width = width;
        self
    }

    /// Set the catalog row cap.
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    /// Set the default and maximum result sizes.
    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Set the locale used when a request carries none.
    pub fn with_default_locale(mut self, locale: Locale) -> Self {
        self.default_locale = locale;
        self
    }

    /// Resolve the effective result size for a request.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - cache_ttl is positive
    /// - cache_width, candidate_limit and max_limit are positive
    /// - default_limit <= max_limit <= cache_width
    pub fn validate(&self) -> KineticResult<()> {
        if self.cache_ttl.is_zero() {
            return Err(invalid(
                "cache_ttl",
                format!("{:?}", self.cache_ttl),
                "cache_ttl must be positive",
            ));
        }

        if self.cache_width == 0 {
            return Err(invalid("cache_width", "0", "cache_width must be greater than 0"));
        }

        if self.candidate_limit == 0 {
            return Err(invalid(
                "candidate_limit",
                "0",
                "candidate_limit must be greater than 0",
            ));
        }

        if self.max_limit == 0 {
            return Err(invalid("max_limit", "0", "max_limit must be greater than 0"));
        }

        // A smaller-limit request must be answerable from the cached list.
        if self.max_limit > self.cache_width {
            return Err(invalid(
                "max_limit",
                self.max_limit.to_string(),
                "max_limit must not exceed cache_width",
            ));
        }

        if self.default_limit > self.max_limit {
            return Err(invalid(
                "default_limit",
                self.default_limit.to_string(),
                "default_limit must not exceed max_limit",
            ));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

fn invalid(field: &str, value: impl Into<String>, reason: &str) -> KineticError {
    KineticError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.into(),
        reason: reason.to_string(),
    })
}
