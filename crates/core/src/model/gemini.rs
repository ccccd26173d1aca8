//! Gemini HTTP API client
//!
//! Calls the `generateContent` REST endpoint and maps between the
//! conversation model and the Gemini wire format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conversation::{ConversationTurn, Part, Role, ToolCallRequest, ToolOutcome};
use crate::error::Error;
use crate::model::{FunctionDeclaration, ModelClient, ModelReply};
use crate::Result;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a new client for the given model
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        history: &[ConversationTurn],
        tools: &[FunctionDeclaration],
    ) -> Result<ModelReply> {
        let request = GenerateContentRequest::new(system_instruction, history, tools);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!("Calling {} with {} turns", self.model, history.len());

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::model_call(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::model_call(format!("HTTP {status}: {body}")));
        }

        let response: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| Error::model_call(format!("invalid response body: {e}")))?;

        response.into_reply()
    }
}

// ============ Wire format ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    system_instruction: WireSystemInstruction,
    tools: Vec<WireToolGroup>,
}

#[derive(Debug, Serialize)]
struct WireSystemInstruction {
    parts: Vec<WireTextPart>,
}

#[derive(Debug, Serialize)]
struct WireTextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireToolGroup {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    role: String,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: WireFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: WireFunctionResponse,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: serde_json::Value,
}

impl GenerateContentRequest {
    fn new(
        system_instruction: &str,
        history: &[ConversationTurn],
        tools: &[FunctionDeclaration],
    ) -> Self {
        Self {
            contents: history.iter().map(WireContent::from).collect(),
            system_instruction: WireSystemInstruction {
                parts: vec![WireTextPart {
                    text: system_instruction.to_string(),
                }],
            },
            tools: vec![WireToolGroup {
                function_declarations: tools.to_vec(),
            }],
        }
    }
}

impl From<&ConversationTurn> for WireContent {
    fn from(turn: &ConversationTurn) -> Self {
        let role = match turn.role {
            Role::User => "user",
            Role::Model => "model",
        };

        let parts = turn
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => WirePart::Text { text: text.clone() },
                Part::ToolCall(call) => WirePart::FunctionCall {
                    function_call: WireFunctionCall {
                        name: call.name.clone(),
                        args: call.args.clone(),
                    },
                },
                Part::ToolResult(result) => {
                    let (success, text) = match &result.outcome {
                        ToolOutcome::Success { output } => (true, output.clone()),
                        ToolOutcome::Failure { message } => (false, message.clone()),
                    };
                    WirePart::FunctionResponse {
                        function_response: WireFunctionResponse {
                            name: result.name.clone(),
                            response: serde_json::json!({
                                "success": success,
                                "result": text,
                            }),
                        },
                    }
                }
            })
            .collect();

        Self {
            role: role.to_string(),
            parts,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

impl GenerateContentResponse {
    fn into_reply(self) -> Result<ModelReply> {
        let content = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| Error::model_call("response contains no candidates"))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in content.parts {
            match part {
                WirePart::Text { text: chunk } => text.push_str(&chunk),
                WirePart::FunctionCall { function_call } => {
                    tool_calls.push(ToolCallRequest::new(function_call.name, function_call.args));
                }
                WirePart::FunctionResponse { .. } => {}
            }
        }

        Ok(ModelReply {
            text: if text.is_empty() { None } else { Some(text) },
            tool_calls,
        })
    }
}
