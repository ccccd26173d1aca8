//! Session events relayed to the transport
//!
//! Events serialize to the wire shape the browser client expects:
//! `{"type": "...", "data": ...}` with `data` a string, or `{path}` for
//! file updates. They live for a single run and are never persisted.

use serde::{Deserialize, Serialize};

/// Events emitted while a run is in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A command is about to be executed
    Command(String),

    /// A shell command produced output
    CommandResult(String),

    /// A file was written under the output directory
    FileUpdate { path: String },

    /// The run finished with the model's final answer
    Done(String),

    /// The run failed; always the last event of a failed run
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_shape() {
        let event = SessionEvent::Command("mkdir site".to_string());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({ "type": "command", "data": "mkdir site" }));
    }

    #[test]
    fn test_command_result_wire_shape() {
        let event = SessionEvent::CommandResult("ok\n".to_string());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({ "type": "command-result", "data": "ok\n" }));
    }

    #[test]
    fn test_file_update_wire_shape() {
        let event = SessionEvent::FileUpdate {
            path: "generated-site/index.html".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({ "type": "file-update", "data": { "path": "generated-site/index.html" } })
        );
    }

    #[test]
    fn test_done_and_error_wire_shapes() {
        let done = serde_json::to_value(SessionEvent::Done("Done".to_string())).unwrap();
        assert_eq!(done, json!({ "type": "done", "data": "Done" }));

        let error = serde_json::to_value(SessionEvent::Error("boom".to_string())).unwrap();
        assert_eq!(error, json!({ "type": "error", "data": "boom" }));
    }

    #[test]
    fn test_round_trip() {
        let event = SessionEvent::FileUpdate {
            path: "site/a.css".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
