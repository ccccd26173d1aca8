//! Core library for Sitesmith
//!
//! This crate contains the pieces shared by the agent loop and the server:
//! - Conversation data model (turns, tool calls, tool results)
//! - Model API boundary (trait + Gemini implementation)
//! - Configuration

pub mod config;
pub mod conversation;
pub mod error;
pub mod model;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
