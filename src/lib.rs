//! Word illustration server
//!
//! This library provides the core of the word-image-gen MCP server: a
//! background batch runner that generates one image per word through
//! DALL-E or Stability AI, an in-memory job registry for progress tracking,
//! and the tool surface exposed over stdio.

pub mod app_state;
pub mod config;
pub mod models;
pub mod protocol;
pub mod services;
pub mod tools;
