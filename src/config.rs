//! Configuration for the workflow engine and its production collaborators.
//!
//! Every knob lives in [`WorkflowConfig`], built via its
//! [`WorkflowConfigBuilder`]. The engine itself only needs the locale; the
//! rest configures the pdfium, LLM and spreadsheet collaborators that
//! [`crate::WorkflowEngine::from_config`] wires up.

use crate::messages::Locale;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Builder validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Configuration for a [`crate::WorkflowEngine`].
///
/// # Example
/// ```rust
/// use pdf2xlsx::{Locale, WorkflowConfig};
///
/// let config = WorkflowConfig::builder()
///     .model("gpt-4.1-mini")
///     .locale(Locale::Fa)
///     .build()
///     .unwrap();
/// assert_eq!(config.sheet_name, "Sheet1");
/// ```
#[derive(Clone)]
pub struct WorkflowConfig {
    /// LLM model identifier. If None, uses `gpt-4.1-nano`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "gemini", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for table inference. Default: 0.1.
    ///
    /// Extraction must copy what is in the text, not invent it.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate for the table JSON. Default: 8192.
    ///
    /// Large tables serialise to many tokens; a truncated answer is not valid
    /// JSON and fails as a malformed response.
    pub max_tokens: usize,

    /// Timeout for the single inference round trip, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in extraction prompt.
    pub system_prompt: Option<String>,

    /// Language of the messages carried by the failed state. Default: English.
    pub locale: Locale,

    /// Worksheet name in the produced workbook. Default: "Sheet1".
    pub sheet_name: String,

    /// Where the conversion counter is persisted. If None, the platform data
    /// directory is used; if that is unavailable the counter is in-memory.
    pub counter_path: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 8192,
            api_timeout_secs: 60,
            system_prompt: None,
            locale: Locale::default(),
            sheet_name: "Sheet1".to_string(),
            counter_path: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("locale", &self.locale)
            .field("sheet_name", &self.sheet_name)
            .field("counter_path", &self.counter_path)
            .finish()
    }
}

impl WorkflowConfig {
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.sheet_name = name.into();
        self
    }

    pub fn counter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.counter_path = Some(path.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WorkflowConfig, ConfigError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ConfigError("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(ConfigError("API timeout must be ≥ 1 second".into()));
        }
        // Excel limits: 1–31 chars, none of : \ / ? * [ ]
        let name = c.sheet_name.as_str();
        if name.is_empty() || name.chars().count() > 31 {
            return Err(ConfigError(format!(
                "sheet name must be 1–31 characters, got {:?}",
                name
            )));
        }
        if name.contains([':', '\\', '/', '?', '*', '[', ']']) {
            return Err(ConfigError(format!(
                "sheet name {:?} contains a character Excel forbids",
                name
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = WorkflowConfig::default();
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_tokens, 8192);
        assert_eq!(c.locale, Locale::En);
        assert_eq!(c.sheet_name, "Sheet1");
    }

    #[test]
    fn temperature_is_clamped() {
        let c = WorkflowConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_max_tokens_rejected() {
        assert!(WorkflowConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn invalid_sheet_names_rejected() {
        assert!(WorkflowConfig::builder().sheet_name("").build().is_err());
        assert!(WorkflowConfig::builder().sheet_name("a/b").build().is_err());
        assert!(WorkflowConfig::builder()
            .sheet_name("x".repeat(32))
            .build()
            .is_err());
        assert!(WorkflowConfig::builder().sheet_name("Invoices").build().is_ok());
    }

    #[test]
    fn debug_hides_provider() {
        let dbg = format!("{:?}", WorkflowConfig::default());
        assert!(dbg.contains("provider: None"), "got: {dbg}");
    }
}
