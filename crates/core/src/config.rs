//! Server configuration
//!
//! All settings come from the environment with sensible defaults; only the
//! Gemini API key is required.

use std::path::PathBuf;

use crate::error::Error;
use crate::Result;

/// Runtime configuration for the agent service
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key
    pub api_key: String,
    /// Model identifier, e.g. "gemini-1.5-flash"
    pub model: String,
    /// Directory all generated files are expected to land in,
    /// relative to the server working directory
    pub output_dir: PathBuf,
    /// Shell interpreter used for command execution
    pub shell: PathBuf,
    /// Maximum model turns per run (0 = unbounded)
    pub max_turns: u32,
    /// Port for the HTTP/WebSocket server
    pub port: u16,
}

impl Config {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| Error::config("GOOGLE_API_KEY is not set"))?;

        let model =
            std::env::var("SITESMITH_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        let output_dir = std::env::var("SITESMITH_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("generated-site"));

        let shell = std::env::var("SITESMITH_SHELL")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/bin/bash"));

        let max_turns = match std::env::var("SITESMITH_MAX_TURNS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::config(format!("SITESMITH_MAX_TURNS is not a number: {raw}")))?,
            Err(_) => 50,
        };

        let port = match std::env::var("SITESMITH_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::config(format!("SITESMITH_PORT is not a port: {raw}")))?,
            Err(_) => 3000,
        };

        Ok(Self {
            api_key,
            model,
            output_dir,
            shell,
            max_turns,
            port,
        })
    }
}
