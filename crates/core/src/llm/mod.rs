pub mod error;
pub mod json;
pub mod openai;

use anyhow::{ensure, Context};
use serde::Serialize;

pub const DEFAULT_MODEL: &str = "deepseek-reasoner";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Completion model identifier.
    pub model: String,

    /// Sampling randomness, must be within [0, 1].
    pub temperature: f64,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl CompletionOptions {
    /// Reads `LLM_MODEL` and `LLM_TEMPERATURE`, falling back to the defaults when unset.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(
            std::env::var("LLM_MODEL").ok(),
            std::env::var("LLM_TEMPERATURE").ok(),
        )
    }

    /// A blank value counts as unset. A temperature that is not a number is an error.
    pub fn from_vars(model: Option<String>, temperature: Option<String>) -> anyhow::Result<Self> {
        let mut out = Self::default();

        if let Some(s) = model.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            out.model = s.to_string();
        }

        if let Some(s) = temperature.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            out.temperature = s
                .parse::<f64>()
                .with_context(|| format!("LLM_TEMPERATURE must be a number (got {s:?})"))?;
        }

        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.model.trim().is_empty(), "model must be non-empty");
        ensure!(
            (0.0..=1.0).contains(&self.temperature),
            "temperature must be between 0 and 1 (got {})",
            self.temperature
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f64,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Two-turn conversation: system instruction, then the user message.
    pub fn system_then_user(options: &CompletionOptions, system: String, user: String) -> Self {
        Self {
            model: options.model.clone(),
            temperature: options.temperature,
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: system,
                },
                ChatMessage {
                    role: Role::User,
                    content: user,
                },
            ],
        }
    }
}

/// Chat-style completion endpoint. Returns the reply text of the first choice.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let opts = CompletionOptions::default();
        assert_eq!(opts.model, "deepseek-reasoner");
        assert_eq!(opts.temperature, 0.7);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let opts = CompletionOptions {
            temperature: 1.5,
            ..Default::default()
        };
        assert!(opts.validate().is_err());

        let opts = CompletionOptions {
            temperature: -0.1,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn rejects_blank_model() {
        let opts = CompletionOptions {
            model: "  ".to_string(),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn vars_override_defaults() {
        let opts =
            CompletionOptions::from_vars(Some(" gpt-4o-mini ".into()), Some("0.2".into())).unwrap();
        assert_eq!(opts.model, "gpt-4o-mini");
        assert_eq!(opts.temperature, 0.2);

        assert_eq!(
            CompletionOptions::from_vars(None, None).unwrap(),
            CompletionOptions::default()
        );
        assert_eq!(
            CompletionOptions::from_vars(Some("".into()), Some("  ".into())).unwrap(),
            CompletionOptions::default()
        );
    }

    #[test]
    fn unparseable_temperature_is_an_error() {
        for raw in ["0,5", "warm", "0.5.1"] {
            let err = CompletionOptions::from_vars(None, Some(raw.into())).unwrap_err();
            assert!(
                format!("{err:#}").contains("LLM_TEMPERATURE must be a number"),
                "raw: {raw:?}"
            );
        }
    }

    #[test]
    fn out_of_range_temperature_from_vars_is_an_error() {
        assert!(CompletionOptions::from_vars(None, Some("1.5".into())).is_err());
    }

    #[test]
    fn request_serializes_roles_in_order() {
        let req = CompletionRequest::system_then_user(
            &CompletionOptions::default(),
            "sys".to_string(),
            "usr".to_string(),
        );
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "deepseek-reasoner",
                "temperature": 0.7,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "usr"},
                ],
            })
        );
    }
}
