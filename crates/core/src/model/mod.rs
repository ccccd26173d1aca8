//! Model API boundary
//!
//! The agent loop talks to the hosted model through [`ModelClient`] so it
//! can be driven by a scripted implementation in tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::conversation::{ConversationTurn, ToolCallRequest};
use crate::Result;

pub mod gemini;

pub use gemini::GeminiClient;

/// Declaration of a callable tool, in the model API's schema dialect
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One model response: free text, tool-call requests, or both
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// Client for a "generate content" style model API
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the full history plus the system instruction and tool
    /// declarations, returning the model's next reply.
    async fn generate(
        &self,
        system_instruction: &str,
        history: &[ConversationTurn],
        tools: &[FunctionDeclaration],
    ) -> Result<ModelReply>;
}
