//! Command interpretation and dispatch

use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::command::{classify, CommandAction};
use crate::error::{AgentError, Result};
use crate::shell::ShellExecutor;

/// What a dispatched command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// A file was written directly (heredoc idiom)
    FileWritten { path: PathBuf },

    /// A subprocess ran and produced stdout
    CommandOutput { stdout: String },
}

/// Executes classified commands: file writes directly, everything else
/// through the shell.
pub struct CommandInterpreter {
    output_root: PathBuf,
    shell: ShellExecutor,
}

impl CommandInterpreter {
    pub fn new(output_root: impl Into<PathBuf>, shell: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            shell: ShellExecutor::new(shell),
        }
    }

    /// Execute a single command string
    pub async fn execute(&self, command: &str) -> Result<ToolOutput> {
        match classify(command) {
            CommandAction::WriteFile { path, content } => self.write_file(&path, &content).await,
            CommandAction::Shell { command } => {
                let stdout = self.shell.run(&command).await?;
                Ok(ToolOutput::CommandOutput { stdout })
            }
        }
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<ToolOutput> {
        if path.is_empty() {
            return Err(AgentError::file_write("heredoc target path is empty"));
        }

        let resolved = resolve_within(&self.output_root, path)?;

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AgentError::file_write(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        tokio::fs::write(&resolved, content).await.map_err(|e| {
            AgentError::file_write(format!("failed to write {}: {e}", resolved.display()))
        })?;

        info!("Wrote file {}", resolved.display());

        Ok(ToolOutput::FileWritten { path: resolved })
    }
}

/// Lexically normalize `raw` and require it to resolve under `root`.
///
/// `.` components are dropped and `..` pops the previous component;
/// popping past the start and any result outside `root` are rejected.
/// Symlinks are not resolved.
fn resolve_within(root: &Path, raw: &str) -> Result<PathBuf> {
    let target = Path::new(raw);

    if target.is_absolute() && !root.is_absolute() {
        return Err(AgentError::path_escape(raw));
    }

    let resolved = normalize(target).ok_or_else(|| AgentError::path_escape(raw))?;
    let root = normalize(root).ok_or_else(|| AgentError::path_escape(raw))?;

    if !resolved.starts_with(&root) {
        return Err(AgentError::path_escape(raw));
    }

    Ok(resolved)
}

fn normalize(path: &Path) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(_) | Component::RootDir | Component::Prefix(_) => {
                resolved.push(component.as_os_str());
            }
            Component::ParentDir => match resolved.components().next_back() {
                Some(Component::Normal(_)) => {
                    resolved.pop();
                }
                _ => return None,
            },
        }
    }

    Some(resolved)
}
