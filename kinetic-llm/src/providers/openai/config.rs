//! OpenAI ranker configuration

use kinetic_core::ConfigError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Settings for [`OpenAIRanker`](super::OpenAIRanker).
#[derive(Clone, PartialEq)]
pub struct OpenAIRankerConfig {
    pub api_key: String,
    pub model: String,
    pub requests_per_minute: u32,
    pub base_url: String,
    /// Completion budget for the ranking reply.
    pub max_tokens: i32,
    pub temperature: f32,
}

impl OpenAIRankerConfig {
    /// Create a config with default model and limits.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: 1500,
            temperature: 0.2,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `OPENAI_API_KEY`: API key (required)
    /// - `OPENAI_MODEL`: Model name (default: gpt-4o-mini)
    /// - `OPENAI_REQUESTS_PER_MINUTE`: Client-side rate limit (default: 60)
    /// - `OPENAI_BASE_URL`: API root (default: https://api.openai.com/v1)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "OPENAI_API_KEY".to_string(),
            })?;

        let mut config = Self::new(api_key);

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }
        if let Ok(raw) = std::env::var("OPENAI_REQUESTS_PER_MINUTE") {
            config.requests_per_minute =
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "OPENAI_REQUESTS_PER_MINUTE".to_string(),
                    value: raw.clone(),
                    reason: "must be a positive integer".to_string(),
                })?;
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = rpm;
        self
    }

    /// Check that the config can be used to build a client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "api_key".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(invalid("model", &self.model, "must not be empty"));
        }
        if self.requests_per_minute == 0 {
            return Err(invalid("requests_per_minute", "0", "must be positive"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(invalid("base_url", &self.base_url, "must be an http(s) URL"));
        }
        if self.max_tokens <= 0 {
            return Err(invalid(
                "max_tokens",
                &self.max_tokens.to_string(),
                "must be positive",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl std::fmt::Debug for OpenAIRankerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIRankerConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = OpenAIRankerConfig::new("sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            OpenAIRankerConfig::new("  ").validate(),
            Err(ConfigError::MissingRequired { .. })
        ));
        assert!(OpenAIRankerConfig::new("k")
            .with_requests_per_minute(0)
            .validate()
            .is_err());
        assert!(OpenAIRankerConfig::new("k")
            .with_base_url("api.openai.com")
            .validate()
            .is_err());
        assert!(OpenAIRankerConfig::new("k").with_model("").validate().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", OpenAIRankerConfig::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
