//! Anthropic Messages API gateway.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http::{anthropic_headers, shared_client, status_to_error};
use super::ModelGateway;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::tools::ToolCatalog;
use crate::types::{AssistantResponse, ContentBlock, Role, Transcript, TurnContent};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicGateway {
    model: String,
    max_tokens: u32,
    api_key: String,
    base_url: String,
}

impl AnthropicGateway {
    pub fn new(
        model: impl Into<String>,
        max_tokens: u32,
        api_key: String,
        base_url: Option<String>,
    ) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            api_key,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Build a gateway from loaded configuration; the API key is required
    /// and must be usable as an HTTP header value.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let api_key = config.require_api_key()?.to_string();
        if reqwest::header::HeaderValue::from_str(&api_key).is_err() {
            return Err(RelayError::Configuration(
                "ANTHROPIC_API_KEY contains characters not allowed in an HTTP header".into(),
            ));
        }
        Ok(Self::new(
            config.model.clone(),
            config.max_tokens,
            api_key,
            config.base_url.clone(),
        ))
    }

    fn build_request_body(&self, transcript: &Transcript, catalog: &ToolCatalog) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = transcript
            .turns()
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                let content = match &turn.content {
                    TurnContent::Text(text) => serde_json::Value::String(text.clone()),
                    TurnContent::Blocks(blocks) => {
                        serde_json::Value::Array(blocks.iter().filter_map(encode_block).collect())
                    }
                };
                serde_json::json!({ "role": role, "content": content })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": messages,
        });

        if !catalog.is_empty() {
            let tool_defs: Vec<serde_json::Value> = catalog
                .tools()
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.input_schema,
                    })
                })
                .collect();
            body["tools"] = tool_defs.into();
        }

        body
    }
}

#[async_trait]
impl ModelGateway for AnthropicGateway {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        transcript: &Transcript,
        catalog: &ToolCatalog,
    ) -> Result<AssistantResponse, RelayError> {
        let body = self.build_request_body(transcript, catalog);
        let url = format!("{}/messages", self.base_url);

        debug!(
            model = %self.model,
            turns = transcript.len(),
            tools = catalog.len(),
            "Anthropic complete"
        );

        let resp = shared_client()
            .post(&url)
            .headers(anthropic_headers(&self.api_key, API_VERSION))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body_text = resp.text().await?;
        if status != 200 {
            return Err(status_to_error(status, &body_text));
        }

        parse_response(&body_text)
    }
}

fn encode_block(block: &ContentBlock) -> Option<serde_json::Value> {
    match block {
        ContentBlock::Text { text } if text.is_empty() => None,
        ContentBlock::Text { text } => Some(serde_json::json!({"type": "text", "text": text})),
        ContentBlock::ToolUse { id, name, input } => Some(serde_json::json!({
            "type": "tool_use",
            "id": id,
            "name": name,
            "input": input,
        })),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
        } => {
            let content = match content {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Some(serde_json::json!({
                "type": "tool_result",
                "tool_use_id": tool_use_id,
                "content": content,
            }))
        }
    }
}

fn parse_response(body: &str) -> Result<AssistantResponse, RelayError> {
    let data: AnthropicResponse = serde_json::from_str(body)
        .map_err(|e| RelayError::Model(format!("malformed Anthropic response: {e}")))?;

    let blocks = data
        .content
        .into_iter()
        .enumerate()
        .map(|(index, block)| block.into_content_block(index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AssistantResponse {
        blocks,
        stop_reason: data.stop_reason,
    })
}

// Internal Anthropic response types

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    r#type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

impl AnthropicContentBlock {
    fn into_content_block(self, index: usize) -> Result<ContentBlock, RelayError> {
        let missing = |field: &str| {
            RelayError::Model(format!(
                "content block {index} of type '{}' is missing '{field}'",
                self.r#type
            ))
        };
        match self.r#type.as_str() {
            "text" => {
                let text = self.text.clone().ok_or_else(|| missing("text"))?;
                Ok(ContentBlock::Text { text })
            }
            "tool_use" => {
                let id = self.id.clone().ok_or_else(|| missing("id"))?;
                let name = self.name.clone().ok_or_else(|| missing("name"))?;
                let input = self.input.clone().ok_or_else(|| missing("input"))?;
                Ok(ContentBlock::ToolUse { id, name, input })
            }
            other => Err(RelayError::Model(format!(
                "content block {index} has unsupported type '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::tools::ToolDescriptor;
    use crate::types::Turn;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn gateway() -> AnthropicGateway {
        AnthropicGateway::new("claude-3-5-sonnet-20241022", 1000, "test-key".into(), None)
    }

    #[test]
    fn request_body_encodes_turns_and_tools() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("List me transactions"));
        transcript.push(Turn::assistant(vec![
            ContentBlock::text("Checking."),
            ContentBlock::tool_use("t1", "get_transactions", json!({"description": "market"})),
        ]));
        transcript.push(Turn::tool_result("t1", json!({"rows": [1, 2]})));
        let catalog = ToolCatalog::new(vec![ToolDescriptor::new(
            "get_transactions",
            "Retrieve transactions",
            json!({"type": "object"}),
        )]);

        let body = gateway().build_request_body(&transcript, &catalog);

        assert_eq!(
            body,
            json!({
                "model": "claude-3-5-sonnet-20241022",
                "max_tokens": 1000,
                "messages": [
                    { "role": "user", "content": "List me transactions" },
                    { "role": "assistant", "content": [
                        { "type": "text", "text": "Checking." },
                        { "type": "tool_use", "id": "t1", "name": "get_transactions",
                          "input": { "description": "market" } }
                    ]},
                    { "role": "user", "content": [
                        { "type": "tool_result", "tool_use_id": "t1",
                          "content": "{\"rows\":[1,2]}" }
                    ]}
                ],
                "tools": [{
                    "name": "get_transactions",
                    "description": "Retrieve transactions",
                    "input_schema": { "type": "object" }
                }]
            })
        );
    }

    #[test]
    fn request_body_omits_empty_catalog_and_empty_text() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("hi"));
        transcript.push(Turn::assistant(vec![
            ContentBlock::text(""),
            ContentBlock::tool_use("t", "x", json!({})),
        ]));
        transcript.push(Turn::tool_result("t", json!("plain text result")));

        let body = gateway().build_request_body(&transcript, &ToolCatalog::default());
        assert!(body.get("tools").is_none());
        assert_eq!(body["messages"][1]["content"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][2]["content"][0]["content"], "plain text result");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = AnthropicGateway::new("m", 1, "k".into(), Some("http://h/v1/".into()));
        assert_eq!(gateway.base_url, "http://h/v1");
    }

    #[test]
    fn parse_response_keeps_block_order() {
        let response = parse_response(
            &json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "text", "text": "Let me look." },
                    { "type": "tool_use", "id": "toolu_1", "name": "get_transactions",
                      "input": { "description": "Şok Market" } }
                ],
                "stop_reason": "tool_use",
                "usage": { "input_tokens": 10, "output_tokens": 5 }
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(
            response.blocks,
            vec![
                ContentBlock::text("Let me look."),
                ContentBlock::tool_use(
                    "toolu_1",
                    "get_transactions",
                    json!({ "description": "Şok Market" })
                ),
            ]
        );
        assert_eq!(response.stop_reason.as_deref(), Some("tool_use"));
    }

    #[test]
    fn parse_response_rejects_missing_fields() {
        let err = parse_response(
            &json!({ "content": [{ "type": "tool_use", "name": "x", "input": {} }] }).to_string(),
        )
        .expect_err("tool_use without id");
        assert_eq!(err.category(), ErrorCategory::Model);
        assert!(err.to_string().contains("missing 'id'"));

        let err = parse_response(&json!({ "content": [{ "type": "text" }] }).to_string())
            .expect_err("text without text");
        assert!(err.to_string().contains("missing 'text'"));
    }

    #[test]
    fn parse_response_rejects_unknown_block_types() {
        let err = parse_response(
            &json!({ "content": [{ "type": "thinking", "thinking": "..." }] }).to_string(),
        )
        .expect_err("unknown block type");
        assert!(matches!(err, RelayError::Model(msg) if msg.contains("unsupported type 'thinking'")));
    }

    #[test]
    fn parse_response_rejects_non_message_bodies() {
        let err = parse_response("not json").expect_err("garbage");
        assert_eq!(err.category(), ErrorCategory::Model);
        let err = parse_response("{}").expect_err("no content");
        assert_eq!(err.category(), ErrorCategory::Model);
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = match AnthropicGateway::from_config(&RelayConfig::default()) {
            Ok(_) => panic!("missing key must fail"),
            Err(err) => err,
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn from_config_rejects_key_unusable_as_header() {
        let config = RelayConfig {
            api_key: Some("sk-ant\nInjected: 1".into()),
            ..Default::default()
        };
        let err = match AnthropicGateway::from_config(&config) {
            Ok(_) => panic!("newline in key must fail"),
            Err(err) => err,
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));

        let config = RelayConfig {
            api_key: Some("sk-ant-valid".into()),
            ..Default::default()
        };
        assert!(AnthropicGateway::from_config(&config).is_ok());
    }
}
