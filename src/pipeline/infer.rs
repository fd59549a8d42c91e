//! Table inference: one LLM round trip from document text to `{headers, rows}`.
//!
//! The request is a system prompt (see [`crate::prompts`]) plus one user
//! message carrying the schema and the whole document text. There is no
//! retry loop: a failed call is classified and surfaced, and the user decides
//! whether to retry the whole pipeline.

use crate::config::WorkflowConfig;
use crate::error::PipelineError;
use crate::pipeline::TableInference;
use crate::prompts::{table_request, DEFAULT_SYSTEM_PROMPT};
use crate::table::Table;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// [`TableInference`] over any `edgequake-llm` provider.
pub struct LlmTableInference {
    config: WorkflowConfig,
}

impl LlmTableInference {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl TableInference for LlmTableInference {
    async fn infer(&self, text: &str) -> Result<Table, PipelineError> {
        let start = Instant::now();
        let provider = resolve_provider(&self.config)?;

        let system_prompt = self
            .config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(table_request(text)),
        ];
        let options = build_options(&self.config);

        let secs = self.config.api_timeout_secs;
        let call = provider.chat(&messages, Some(&options));
        let response = match timeout(Duration::from_secs(secs), call).await {
            Err(_) => {
                warn!("Table inference timed out after {}s", secs);
                return Err(PipelineError::Network {
                    detail: format!("no response after {}s", secs),
                });
            }
            Ok(Err(e)) => {
                let err = classify_provider_error(&e);
                warn!("Table inference failed: {}", err);
                return Err(err);
            }
            Ok(Ok(response)) => response,
        };

        debug!(
            "Inference: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        let table = parse_table(&response.content)?;
        info!(
            "Inferred table: {} columns, {} rows",
            table.headers.len(),
            table.rows.len()
        );
        Ok(table)
    }
}

/// Build `CompletionOptions` from the workflow config.
fn build_options(config: &WorkflowConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`)
/// 2. **Named provider + model** (`config.provider_name`)
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
/// 4. **OpenAI** when `OPENAI_API_KEY` is set
/// 5. **Full auto-detection** (`ProviderFactory::from_env`)
///
/// A provider that cannot be built is a credential problem from the user's
/// point of view, so failures surface as [`PipelineError::Auth`].
fn resolve_provider(config: &WorkflowConfig) -> Result<Arc<dyn LLMProvider>, PipelineError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PipelineError::Auth {
            detail: format!(
                "No LLM provider could be auto-detected from environment. \
                 Set OPENAI_API_KEY, ANTHROPIC_API_KEY or GEMINI_API_KEY. Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PipelineError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| PipelineError::Auth {
        detail: format!("provider '{}' is not configured: {}", provider_name, e),
    })
}

static RE_STATUS_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([45]\d\d)\b").unwrap());

/// Sort a provider error into the failure taxonomy.
///
/// Typed variants decide on their own. `ApiError` carries only the
/// provider's message, so its HTTP status is read from the text.
pub(crate) fn classify_provider_error(error: &LlmError) -> PipelineError {
    let detail = error.to_string();
    match error {
        LlmError::AuthError(_) => PipelineError::Auth { detail },
        LlmError::NetworkError(_) | LlmError::Timeout | LlmError::RateLimited(_) => {
            PipelineError::Network { detail }
        }
        LlmError::SerializationError(_) => PipelineError::MalformedResponse { detail },
        LlmError::ApiError(message) => classify_api_status(message, detail),
        _ => PipelineError::Unknown { detail },
    }
}

fn classify_api_status(message: &str, detail: String) -> PipelineError {
    let status = RE_STATUS_CODE
        .captures(message)
        .and_then(|caps| caps[1].parse::<u16>().ok());
    let lower = message.to_ascii_lowercase();

    match status {
        Some(401) | Some(403) => PipelineError::Auth { detail },
        Some(429) | Some(500..=599) => PipelineError::Network { detail },
        _ if lower.contains("unauthorized") || lower.contains("forbidden") => {
            PipelineError::Auth { detail }
        }
        _ => PipelineError::Unknown { detail },
    }
}

#[derive(Deserialize)]
struct TableResponse {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

static RE_JSON_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*)\n```\s*$").unwrap());

/// Parse the model's answer into a [`Table`].
///
/// Models sometimes wrap JSON in fences or add a sentence around it despite
/// the prompt; both are stripped before parsing. Cells must be strings.
pub fn parse_table(raw: &str) -> Result<Table, PipelineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::MalformedResponse {
            detail: "empty response".into(),
        });
    }

    let unfenced = match RE_JSON_FENCES.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    };
    let json = match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    };

    let parsed: TableResponse =
        serde_json::from_str(json).map_err(|e| PipelineError::MalformedResponse {
            detail: e.to_string(),
        })?;

    Ok(Table::new(parsed.headers, parsed.rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = WorkflowConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn parse_plain_json() {
        let t = parse_table(r#"{"headers":["A","B"],"rows":[["1","2"]]}"#).unwrap();
        assert_eq!(t.headers, vec!["A", "B"]);
        assert_eq!(t.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn parse_fenced_json() {
        let raw = "```json\n{\"headers\":[\"Item\"],\"rows\":[[\"Bolt\"]]}\n```";
        let t = parse_table(raw).unwrap();
        assert_eq!(t.headers, vec!["Item"]);
    }

    #[test]
    fn parse_json_with_surrounding_prose() {
        let raw = "Here is the table:\n{\"headers\":[\"X\"],\"rows\":[]}\nHope this helps.";
        let t = parse_table(raw).unwrap();
        assert!(t.rows.is_empty());
    }

    #[test]
    fn missing_rows_is_malformed() {
        assert!(matches!(
            parse_table(r#"{"headers":["A"]}"#),
            Err(PipelineError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn numeric_cells_are_malformed() {
        assert!(matches!(
            parse_table(r#"{"headers":["A"],"rows":[[1]]}"#),
            Err(PipelineError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn empty_response_is_malformed() {
        assert!(matches!(
            parse_table("   "),
            Err(PipelineError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn mismatched_rows_still_parse() {
        // Width is checked by the engine, not the parser.
        let t = parse_table(r#"{"headers":["A","B"],"rows":[["x"]]}"#).unwrap();
        assert_eq!(t.rows[0].len(), 1);
    }

    #[test]
    fn auth_error_is_auth() {
        let e = classify_provider_error(&LlmError::AuthError("invalid x-api-key".into()));
        assert!(matches!(e, PipelineError::Auth { .. }));
    }

    #[test]
    fn transport_errors_are_network() {
        for err in [
            LlmError::NetworkError("connection refused".into()),
            LlmError::Timeout,
            LlmError::RateLimited("retry after 20s".into()),
        ] {
            let e = classify_provider_error(&err);
            assert!(matches!(e, PipelineError::Network { .. }), "{err} -> {e:?}");
        }
    }

    #[test]
    fn serialization_error_is_malformed() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = classify_provider_error(&LlmError::SerializationError(json_err));
        assert!(matches!(e, PipelineError::MalformedResponse { .. }));
    }

    #[test]
    fn token_limit_is_not_auth() {
        let e = classify_provider_error(&LlmError::TokenLimitExceeded {
            max: 8192,
            got: 14012,
        });
        assert!(matches!(e, PipelineError::Unknown { .. }), "{e:?}");
    }

    #[test]
    fn api_error_server_statuses_are_network() {
        for msg in [
            "500 Internal Server Error",
            "502 Bad Gateway",
            "status 503: overloaded",
            "504 Gateway Timeout",
            "429 Too Many Requests",
        ] {
            let e = classify_provider_error(&LlmError::ApiError(msg.into()));
            assert!(matches!(e, PipelineError::Network { .. }), "{msg} -> {e:?}");
        }
    }

    #[test]
    fn api_error_auth_statuses_are_auth() {
        let e = classify_provider_error(&LlmError::ApiError("401 Unauthorized".into()));
        assert!(matches!(e, PipelineError::Auth { .. }));
        let e = classify_provider_error(&LlmError::ApiError("403 Forbidden".into()));
        assert!(matches!(e, PipelineError::Auth { .. }));
    }

    #[test]
    fn other_errors_are_unknown() {
        for err in [
            LlmError::ApiError("400 Bad Request: unsupported parameter".into()),
            LlmError::ModelNotFound("gpt-9".into()),
            LlmError::InvalidRequest("messages must not be empty".into()),
            LlmError::Unknown("model exploded".into()),
        ] {
            let e = classify_provider_error(&err);
            assert!(matches!(e, PipelineError::Unknown { .. }), "{err} -> {e:?}");
        }
    }
}
