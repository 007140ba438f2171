use crate::config::Settings;
use crate::llm::error::CompletionDiagnosticsError;
use crate::llm::{CompletionProvider, CompletionRequest};
use anyhow::Context;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER_NAME: &str = "openai";
// The default model is DeepSeek's, served through its OpenAI-compatible endpoint.
const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url = settings
            .openai_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn create_chat_completion(
        &self,
        req: &CompletionRequest,
    ) -> anyhow::Result<ChatCompletionResponse> {
        let res = self
            .http
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await
            .context("chat completion request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read chat completion response body")?;
        Self::decode_response(status, &text)
    }

    fn decode_response(status: StatusCode, text: &str) -> anyhow::Result<ChatCompletionResponse> {
        if !status.is_success() {
            return Err(CompletionDiagnosticsError {
                provider: PROVIDER_NAME,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text.to_string()),
            }
            .into());
        }

        serde_json::from_str::<ChatCompletionResponse>(text).map_err(|err| {
            CompletionDiagnosticsError {
                provider: PROVIDER_NAME,
                stage: "decode",
                detail: format!("invalid chat completion body: {err}"),
                raw_output: Some(text.to_string()),
            }
            .into()
        })
    }

    /// Content of the first choice. An empty string is a valid reply and is returned as-is;
    /// only a missing choice or a null content is an error.
    fn response_text(res: ChatCompletionResponse) -> anyhow::Result<String> {
        let content = res
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        content.ok_or_else(|| {
            CompletionDiagnosticsError {
                provider: PROVIDER_NAME,
                stage: "response",
                detail: "first choice has no message content".to_string(),
                raw_output: None,
            }
            .into()
        })
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        let t0 = std::time::Instant::now();
        let res = self.create_chat_completion(request).await?;
        tracing::debug!(
            model = %request.model,
            choices = res.choices.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "chat completion received"
        );
        Self::response_text(res)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(v: serde_json::Value) -> ChatCompletionResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn takes_first_choice_content() {
        let res = decode(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "[]", "reasoning_content": "hmm"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}},
            ],
        }));
        assert_eq!(OpenAiClient::response_text(res).unwrap(), "[]");
    }

    #[test]
    fn missing_content_is_a_response_stage_error() {
        let res = decode(json!({"choices": [{"message": {"role": "assistant", "content": null}}]}));
        let err = OpenAiClient::response_text(res).unwrap_err();
        let diag = err.downcast_ref::<CompletionDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "response");

        let res = decode(json!({"choices": []}));
        assert!(OpenAiClient::response_text(res).is_err());
    }

    #[test]
    fn empty_content_is_returned_not_rejected() {
        let res = decode(json!({"choices": [{"message": {"role": "assistant", "content": ""}}]}));
        assert_eq!(OpenAiClient::response_text(res).unwrap(), "");

        let res = decode(json!({"choices": [{"message": {"role": "assistant", "content": "   \n"}}]}));
        assert_eq!(OpenAiClient::response_text(res).unwrap(), "   \n");
    }

    #[test]
    fn non_success_status_keeps_body() {
        let body = json!({"error": {"message": "invalid api key", "type": "authentication_error"}});
        let err = OpenAiClient::decode_response(StatusCode::UNAUTHORIZED, &body.to_string())
            .unwrap_err();

        let diag = err.downcast_ref::<CompletionDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "http");
        assert_eq!(diag.raw_output.as_deref(), Some(body.to_string().as_str()));
        assert!(format!("{err:#}").contains("invalid api key"));
    }

    #[test]
    fn success_status_with_unexpected_body_is_a_decode_stage_error() {
        let err = OpenAiClient::decode_response(StatusCode::OK, "<html>gateway</html>").unwrap_err();
        let diag = err.downcast_ref::<CompletionDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "decode");
        assert_eq!(diag.raw_output.as_deref(), Some("<html>gateway</html>"));

        let body = json!({"choices": [{"message": {"role": "assistant", "content": 7}}]});
        let err = OpenAiClient::decode_response(StatusCode::OK, &body.to_string()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CompletionDiagnosticsError>().unwrap().stage,
            "decode"
        );
    }

    #[test]
    fn success_status_decodes_choices() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "[]"}}]});
        let res = OpenAiClient::decode_response(StatusCode::OK, &body.to_string()).unwrap();
        assert_eq!(OpenAiClient::response_text(res).unwrap(), "[]");
    }

    #[test]
    fn url_joins_base_without_double_slash() {
        let settings = Settings {
            database_url: None,
            openai_api_key: Some("sk-test".to_string()),
            openai_base_url: Some("https://llm.example.com/v1/".to_string()),
            sentry_dsn: None,
        };
        let client = OpenAiClient::from_settings(&settings).unwrap();
        assert_eq!(client.url(), "https://llm.example.com/v1/chat/completions");
    }

    #[test]
    fn requires_api_key() {
        let settings = Settings {
            database_url: None,
            openai_api_key: None,
            openai_base_url: None,
            sentry_dsn: None,
        };
        assert!(OpenAiClient::from_settings(&settings).is_err());
    }
}
