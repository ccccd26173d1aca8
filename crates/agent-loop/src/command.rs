//! Command classification
//!
//! The model issues opaque shell command strings. One idiom is recognized
//! and handled without a subprocess: redirecting a heredoc block into a
//! target path. Classification is a pure function so detection can be
//! tested apart from execution.

const HEREDOC_OPEN: &str = "cat <<EOF > ";
const HEREDOC_TERMINATOR: &str = "\nEOF";

/// A classified command, ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Write `content` to `path` directly
    WriteFile { path: String, content: String },

    /// Run the string through the shell, unmodified
    Shell { command: String },
}

/// Classify a single command string.
///
/// The heredoc form is `cat <<EOF > <path>`, a newline, an arbitrary
/// content block, and a final line containing only `EOF`. The content is
/// extracted byte-for-byte; the path is trimmed. A matched command whose
/// path trims to empty still classifies as a file write so it fails as
/// one instead of reaching the shell.
pub fn classify(command: &str) -> CommandAction {
    let trimmed = command.trim();

    if let Some(rest) = trimmed.strip_prefix(HEREDOC_OPEN) {
        if let Some((path_line, body)) = rest.split_once('\n') {
            if !path_line.is_empty() {
                if let Some(content) = body.strip_suffix(HEREDOC_TERMINATOR) {
                    return CommandAction::WriteFile {
                        path: path_line.trim().to_string(),
                        content: content.to_string(),
                    };
                }
            }
        }
    }

    CommandAction::Shell {
        command: command.to_string(),
    }
}
