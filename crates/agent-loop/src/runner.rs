//! The agent loop
//!
//! One run takes a user problem statement, alternates between invoking
//! the model and executing the single tool it may request, and ends with
//! either the model's free-text answer or an error. Every step is
//! mirrored to the transport as a [`SessionEvent`].

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use sitesmith_core::config::Config;
use sitesmith_core::conversation::{ConversationTurn, ToolCallRequest, ToolCallResult};
use sitesmith_core::model::{FunctionDeclaration, ModelClient};

use crate::error::{AgentError, Result};
use crate::event::SessionEvent;
use crate::interpreter::{CommandInterpreter, ToolOutput};

/// The single tool the model may call
pub const TOOL_NAME: &str = "executeCommand";

/// Record of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Full conversation history, discarded with the report
    pub history: Vec<ConversationTurn>,
    /// The model's final free-text answer
    pub summary: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Drives runs against a model client and a command interpreter.
///
/// The runner itself holds no per-run state; history lives inside each
/// `run` call and is dropped when it returns.
pub struct AgentRunner {
    model: Arc<dyn ModelClient>,
    interpreter: CommandInterpreter,
    system_instruction: String,
    max_turns: u32,
}

impl AgentRunner {
    /// Create a runner from the service configuration
    pub fn new(model: Arc<dyn ModelClient>, config: &Config) -> Self {
        Self {
            model,
            interpreter: CommandInterpreter::new(&config.output_dir, &config.shell),
            system_instruction: system_instruction(&config.output_dir),
            max_turns: config.max_turns,
        }
    }

    /// Execute one full run.
    ///
    /// All errors are caught here and converted into a terminal `error`
    /// event; `done` and `error` are mutually exclusive and always last.
    pub async fn run(
        &self,
        problem: String,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<RunReport> {
        match self.drive(problem, &events).await {
            Ok(report) => {
                info!(
                    "Run completed in {}ms ({} turns)",
                    report.duration_ms,
                    report.history.len()
                );
                Ok(report)
            }
            Err(e) => {
                error!("Run failed: {e}");
                let _ = events.send(SessionEvent::Error(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        problem: String,
        events: &mpsc::Sender<SessionEvent>,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let tools = [execute_command_declaration()];
        let mut history = vec![ConversationTurn::user_text(problem)];
        let mut turn: u32 = 0;

        loop {
            if self.max_turns > 0 && turn >= self.max_turns {
                return Err(AgentError::TurnLimitExceeded {
                    limit: self.max_turns,
                });
            }
            turn += 1;

            let reply = self
                .model
                .generate(&self.system_instruction, &history, &tools)
                .await?;

            let mut calls = reply.tool_calls.into_iter();
            let Some(call) = calls.next() else {
                let summary = reply.text.unwrap_or_default();
                history.push(ConversationTurn::model_text(summary.clone()));
                let _ = events.send(SessionEvent::Done(summary.clone())).await;

                let duration_ms = Utc::now()
                    .signed_duration_since(started_at)
                    .num_milliseconds()
                    .max(0) as u64;

                return Ok(RunReport {
                    history,
                    summary,
                    started_at,
                    duration_ms,
                });
            };

            // Only the first tool call in a response is honored.
            let discarded = calls.count();
            if discarded > 0 {
                debug!("Discarding {discarded} extra tool calls in one response");
            }

            if call.name != TOOL_NAME {
                return Err(AgentError::command(format!(
                    "model requested unknown tool: {}",
                    call.name
                )));
            }

            history.push(ConversationTurn::model_call(call.clone()));
            let result = self.dispatch(&call, events).await;
            history.push(ConversationTurn::tool_result(result));
        }
    }

    /// Execute one tool call and mirror it to the transport.
    ///
    /// Command and file-write failures become `Failure` outcomes fed back
    /// to the model; they do not terminate the run.
    async fn dispatch(
        &self,
        call: &ToolCallRequest,
        events: &mpsc::Sender<SessionEvent>,
    ) -> ToolCallResult {
        let command = match call.command() {
            Some(command) if !command.is_empty() => command.to_string(),
            _ => {
                warn!("Tool call without a usable command argument");
                return ToolCallResult::failure(
                    &call.name,
                    "the command argument must be a non-empty string",
                );
            }
        };

        info!("Executing command: {command}");
        let _ = events.send(SessionEvent::Command(command.clone())).await;

        match self.interpreter.execute(&command).await {
            Ok(ToolOutput::FileWritten { path }) => {
                let path = path.to_string_lossy().to_string();
                let _ = events
                    .send(SessionEvent::FileUpdate { path: path.clone() })
                    .await;
                ToolCallResult::success(&call.name, format!("File written to {path}"))
            }
            Ok(ToolOutput::CommandOutput { stdout }) => {
                let _ = events
                    .send(SessionEvent::CommandResult(stdout.clone()))
                    .await;
                ToolCallResult::success(&call.name, stdout)
            }
            Err(e) => {
                warn!("Tool dispatch failed: {e}");
                ToolCallResult::failure(&call.name, e.to_string())
            }
        }
    }
}

/// The fixed instruction sent with every model invocation
fn system_instruction(output_dir: &Path) -> String {
    let dir = output_dir.display();
    format!(
        "You are a website-building expert. Your job is to help the user build a \
         frontend website step by step using terminal commands.\n\
         \n\
         Rules:\n\
         - ALL generated files (HTML, CSS, JS, images) MUST be placed inside the \
         '{dir}/' directory, and every file operation must use the full path. \
         Example: cat <<EOF > {dir}/index.html\n\
         - Create files directly inside '{dir}/'; only create sub-folders when the \
         website structure itself needs them.\n\
         - Write file contents using the heredoc format shown above.\n\
         - Use only one shell command at a time, through the '{tool}' tool.\n\
         \n\
         Environment:\n\
         - The host operating system is: {os}\n\
         - Assume a Unix-like shell.",
        tool = TOOL_NAME,
        os = std::env::consts::OS,
    )
}

/// Declaration of the `executeCommand` tool in the model API's schema
fn execute_command_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: TOOL_NAME.to_string(),
        description: "Execute a single terminal/shell command. A command can create a \
                      folder or file, write to a file, or edit and delete files."
            .to_string(),
        parameters: serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "command": {
                    "type": "STRING",
                    "description": "A single terminal command. Ex: \"mkdir calculator\""
                }
            },
            "required": ["command"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sitesmith_core::conversation::{Part, Role, ToolOutcome};
    use sitesmith_core::model::ModelReply;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Model client that replays a fixed response script
    struct ScriptedModel {
        replies: Mutex<VecDeque<sitesmith_core::Result<ModelReply>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<sitesmith_core::Result<ModelReply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn generate(
            &self,
            _system_instruction: &str,
            _history: &[ConversationTurn],
            _tools: &[FunctionDeclaration],
        ) -> sitesmith_core::Result<ModelReply> {
            *self.calls.lock().unwrap() += 1;
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("model script exhausted")
        }
    }

    /// Model client that issues the same tool call forever
    struct LoopingModel {
        command: String,
    }

    #[async_trait]
    impl ModelClient for LoopingModel {
        async fn generate(
            &self,
            _system_instruction: &str,
            _history: &[ConversationTurn],
            _tools: &[FunctionDeclaration],
        ) -> sitesmith_core::Result<ModelReply> {
            Ok(ModelReply {
                text: None,
                tool_calls: vec![tool_call(&self.command)],
            })
        }
    }

    fn tool_call(command: &str) -> ToolCallRequest {
        ToolCallRequest::new(TOOL_NAME, serde_json::json!({ "command": command }))
    }

    fn tool_reply(command: &str) -> ModelReply {
        ModelReply {
            text: None,
            tool_calls: vec![tool_call(command)],
        }
    }

    fn text_reply(text: &str) -> ModelReply {
        ModelReply {
            text: Some(text.to_string()),
            tool_calls: vec![],
        }
    }

    fn runner_in(root: PathBuf, model: Arc<dyn ModelClient>, max_turns: u32) -> AgentRunner {
        let config = Config {
            api_key: "test-key".to_string(),
            model: "scripted".to_string(),
            output_dir: root,
            shell: PathBuf::from("/bin/bash"),
            max_turns,
            port: 0,
        };
        AgentRunner::new(model, &config)
    }

    async fn drain(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_scripted_run_emits_events_in_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("site");

        let heredoc = format!("cat <<EOF > {}/index.html\n<h1>Hi</h1>\nEOF", root.display());
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(tool_reply(&format!("mkdir -p {}", root.display()))),
            Ok(tool_reply(&heredoc)),
            Ok(text_reply("Done")),
        ]));

        let runner = runner_in(root.clone(), model, 50);
        let (tx, mut rx) = mpsc::channel(100);

        let report = runner.run("build a site".to_string(), tx).await.unwrap();

        let index_path = root.join("index.html").to_string_lossy().to_string();
        let events = drain(&mut rx).await;
        assert_eq!(
            events,
            vec![
                SessionEvent::Command(format!("mkdir -p {}", root.display())),
                SessionEvent::CommandResult(String::new()),
                SessionEvent::Command(heredoc),
                SessionEvent::FileUpdate { path: index_path },
                SessionEvent::Done("Done".to_string()),
            ]
        );

        // 1 initial + 2 x (model call + tool result) + 1 final model turn
        assert_eq!(report.history.len(), 7);
        assert_eq!(report.summary, "Done");
        assert_eq!(report.history[0].role, Role::User);
        assert_eq!(report.history[6].role, Role::Model);

        let written = std::fs::read_to_string(root.join("index.html")).unwrap();
        assert_eq!(written, "<h1>Hi</h1>");
    }

    #[tokio::test]
    async fn test_model_failure_emits_single_error_event() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![Err(
            sitesmith_core::Error::model_call("connection refused"),
        )]));

        let runner = runner_in(dir.path().join("site"), Arc::clone(&model), 50);
        let (tx, mut rx) = mpsc::channel(100);

        let result = runner.run("build a site".to_string(), tx).await;
        assert!(matches!(result, Err(AgentError::Model(_))));

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Error(_)));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_command_feeds_failure_back_and_continues() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(tool_reply("definitely-not-a-real-command-xyz")),
            Ok(text_reply("Recovered")),
        ]));

        let runner = runner_in(dir.path().join("site"), model, 50);
        let (tx, mut rx) = mpsc::channel(100);

        let report = runner.run("build a site".to_string(), tx).await.unwrap();
        assert_eq!(report.history.len(), 4);

        // The failure outcome went back to the model, no result event was sent.
        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SessionEvent::Command(_)));
        assert_eq!(events[1], SessionEvent::Done("Recovered".to_string()));

        match &report.history[2].parts[0] {
            Part::ToolResult(result) => {
                assert!(matches!(result.outcome, ToolOutcome::Failure { .. }));
            }
            other => panic!("expected tool result part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_only_first_tool_call_is_honored() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(ModelReply {
                text: None,
                tool_calls: vec![tool_call("echo one"), tool_call("echo two")],
            }),
            Ok(text_reply("Done")),
        ]));

        let runner = runner_in(dir.path().join("site"), model, 50);
        let (tx, mut rx) = mpsc::channel(100);

        runner.run("build".to_string(), tx).await.unwrap();

        let events = drain(&mut rx).await;
        assert_eq!(events[0], SessionEvent::Command("echo one".to_string()));
        assert_eq!(events[1], SessionEvent::CommandResult("one\n".to_string()));
        assert_eq!(events[2], SessionEvent::Done("Done".to_string()));
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_terminates_the_run() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![Ok(ModelReply {
            text: None,
            tool_calls: vec![ToolCallRequest::new(
                "launchMissiles",
                serde_json::json!({ "command": "rm -rf /" }),
            )],
        })]));

        let runner = runner_in(dir.path().join("site"), model, 50);
        let (tx, mut rx) = mpsc::channel(100);

        let result = runner.run("build".to_string(), tx).await;
        assert!(matches!(result, Err(AgentError::Command { .. })));

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_missing_command_argument_is_fed_back() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(ModelReply {
                text: None,
                tool_calls: vec![ToolCallRequest::new(TOOL_NAME, serde_json::json!({}))],
            }),
            Ok(text_reply("Done")),
        ]));

        let runner = runner_in(dir.path().join("site"), model, 50);
        let (tx, mut rx) = mpsc::channel(100);

        let report = runner.run("build".to_string(), tx).await.unwrap();
        assert_eq!(report.history.len(), 4);

        // No command event: the call never reached the interpreter.
        let events = drain(&mut rx).await;
        assert_eq!(events, vec![SessionEvent::Done("Done".to_string())]);
    }

    #[tokio::test]
    async fn test_turn_limit_exceeded() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(LoopingModel {
            command: "echo again".to_string(),
        });

        let runner = runner_in(dir.path().join("site"), model, 3);
        let (tx, mut rx) = mpsc::channel(100);

        let result = runner.run("build".to_string(), tx).await;
        assert!(matches!(
            result,
            Err(AgentError::TurnLimitExceeded { limit: 3 })
        ));

        let events = drain(&mut rx).await;
        assert_eq!(events.last(), Some(&SessionEvent::Error("Turn limit of 3 exceeded".to_string())));
        // Three command/result pairs, then the terminal error.
        assert_eq!(events.len(), 7);
    }
}
