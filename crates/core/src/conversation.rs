//! Conversation history model
//!
//! One run of the agent loop owns an ordered list of turns. A tool-call
//! request turn is always followed by exactly one tool-call result turn
//! before the model is invoked again. History lives for a single run and
//! is never persisted.

use serde::{Deserialize, Serialize};

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Tool name; must match the single registered tool
    pub name: String,
    /// Tool arguments as sent by the model
    #[serde(default)]
    pub args: serde_json::Value,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The required `command` argument, if present and a string
    pub fn command(&self) -> Option<&str> {
        self.args.get("command").and_then(|v| v.as_str())
    }
}

/// Outcome of dispatching a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success { output: String },
    Failure { message: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The text fed back to the model
    pub fn text(&self) -> &str {
        match self {
            Self::Success { output } => output,
            Self::Failure { message } => message,
        }
    }
}

/// Result of a dispatched tool call, echoing the request name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub name: String,
    pub outcome: ToolOutcome,
}

impl ToolCallResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: ToolOutcome::Success {
                output: output.into(),
            },
        }
    }

    pub fn failure(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: ToolOutcome::Failure {
                message: message.into(),
            },
        }
    }
}

/// One part of a conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Part {
    Text(String),
    ToolCall(ToolCallRequest),
    ToolResult(ToolCallResult),
}

/// One entry in the ordered history sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ConversationTurn {
    /// Initial user turn carrying the problem statement
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Model turn carrying free text
    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Model turn carrying a tool-call request
    pub fn model_call(call: ToolCallRequest) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::ToolCall(call)],
        }
    }

    /// User turn carrying a tool-call result
    pub fn tool_result(result: ToolCallResult) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::ToolResult(result)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_argument_extraction() {
        let call = ToolCallRequest::new("executeCommand", json!({ "command": "mkdir site" }));
        assert_eq!(call.command(), Some("mkdir site"));

        let missing = ToolCallRequest::new("executeCommand", json!({}));
        assert_eq!(missing.command(), None);

        let wrong_type = ToolCallRequest::new("executeCommand", json!({ "command": 3 }));
        assert_eq!(wrong_type.command(), None);
    }

    #[test]
    fn test_turn_constructors() {
        let turn = ConversationTurn::user_text("build a site");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.parts, vec![Part::Text("build a site".to_string())]);

        let result = ToolCallResult::success("executeCommand", "ok");
        let turn = ConversationTurn::tool_result(result.clone());
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.parts, vec![Part::ToolResult(result)]);
    }

    #[test]
    fn test_outcome_text() {
        let ok = ToolOutcome::Success {
            output: "done".to_string(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.text(), "done");

        let err = ToolOutcome::Failure {
            message: "no such file".to_string(),
        };
        assert!(!err.is_success());
        assert_eq!(err.text(), "no such file");
    }
}
