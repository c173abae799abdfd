//! OpenAI alternative ranker implementation

use super::client::OpenAIClient;
use super::config::OpenAIRankerConfig;
use super::types::{CompletionRequest, CompletionResponse, Message, ResponseFormat};
use crate::providers::invalid_response;
use crate::{estimate_tokens, AiRanking, AlternativeRanker, RankingRequest, RankingResponse};
use async_trait::async_trait;
use kinetic_core::{EntityId, LlmError, Locale, MAX_SCORE};
use serde::Deserialize;
use tracing::debug;

/// Ranks alternatives with a GPT chat model.
pub struct OpenAIRanker {
    client: OpenAIClient,
    model: String,
    max_tokens: i32,
    temperature: f32,
}

impl OpenAIRanker {
    pub fn new(config: OpenAIRankerConfig) -> Self {
        Self {
            client: OpenAIClient::from_config(&config),
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Create ranker with default gpt-4o-mini model.
    pub fn with_default_model(api_key: impl Into<String>) -> Self {
        Self::new(OpenAIRankerConfig::new(api_key))
    }

    fn build_system_prompt(locale: Locale) -> String {
        let language = match locale {
            Locale::Es => "Spanish",
            Locale::En => "English",
        };
        format!(
            "You are a strength and conditioning coach. \
             Rank replacement exercises for a source exercise. \
             Only use ids from the candidate list. \
             Prefer candidates with the same movement pattern and muscles, \
             usable with the available equipment and at a similar difficulty. \
             Score each candidate from 0 to 100. \
             Write each reason as one short sentence in {}. \
             Respond with ONLY a JSON object: \
             {{\"rankings\": [{{\"id\": \"<candidate id>\", \"score\": 0, \"reason\": \"...\"}}]}}",
            language
        )
    }

    fn build_user_prompt(request: &RankingRequest) -> Result<String, LlmError> {
        let source = serde_json::to_string(&request.source)
            .map_err(|e| invalid_response("openai", format!("Failed to encode source: {}", e)))?;
        let candidates = serde_json::to_string(&request.candidates).map_err(|e| {
            invalid_response("openai", format!("Failed to encode candidates: {}", e))
        })?;
        let equipment = if request.available_equipment.is_empty() {
            "none".to_string()
        } else {
            request.available_equipment.join(", ")
        };

        Ok(format!(
            "Source exercise:\n{}\n\nAvailable equipment: {}\n\nCandidates:\n{}",
            source, equipment, candidates
        ))
    }
}

#[derive(Deserialize)]
struct RankingsPayload {
    rankings: Vec<RawRanking>,
}

#[derive(Deserialize)]
struct RawRanking {
    id: String,
    score: f64,
    #[serde(default)]
    reason: String,
}

/// Parse a model reply into rankings.
///
/// Accepts the bare JSON object or one wrapped in a fenced code block.
/// Entries whose id is not a UUID are skipped; scores are rounded and
/// clamped to `0..=MAX_SCORE`.
pub fn parse_rankings(reply: &str) -> Result<Vec<AiRanking>, LlmError> {
    let payload: RankingsPayload = serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| invalid_response("openai", format!("Malformed rankings: {}", e)))?;

    Ok(payload
        .rankings
        .into_iter()
        .filter_map(|raw| {
            let id = match raw.id.trim().parse::<EntityId>() {
                Ok(id) => id,
                Err(_) => {
                    debug!(id = %raw.id, "skipping ranking with invalid id");
                    return None;
                }
            };
            Some(AiRanking {
                id,
                score: clamp_score(raw.score),
                reason: raw.reason.trim().to_string(),
            })
        })
        .collect())
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, MAX_SCORE as f64) as u8
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

#[async_trait]
impl AlternativeRanker for OpenAIRanker {
    async fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, LlmError> {
        let system_prompt = Self::build_system_prompt(request.locale);
        let user_prompt = Self::build_user_prompt(request)?;
        let prompt_tokens = estimate_tokens(&system_prompt) + estimate_tokens(&user_prompt);

        let completion = CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system_prompt), Message::user(user_prompt)],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            response_format: Some(ResponseFormat::json_object()),
        };

        let response: CompletionResponse =
            self.client.request("chat/completions", completion).await?;

        let reply = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| invalid_response("openai", "No completion in response"))?;

        let rankings = parse_rankings(&reply)?;
        debug!(
            model = %self.model,
            candidates = request.candidates.len(),
            ranked = rankings.len(),
            "openai ranking parsed"
        );

        Ok(RankingResponse {
            rankings,
            tokens_used: prompt_tokens + estimate_tokens(&reply),
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAIRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIRanker")
            .field("model", &self.model)
            .finish()
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_clamped_score_within_bounds(score in proptest::num::f64::ANY) {
            prop_assert!(clamp_score(score) <= MAX_SCORE);
        }

        #[test]
        fn prop_fence_stripping_preserves_payload(body in "[a-z{}\":, ]{0,40}") {
            let fenced = format!("```json\n{}\n```", body);
            prop_assert_eq!(strip_code_fence(&fenced), body.trim());
        }
    }
}
