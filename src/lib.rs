//! Anki MCP Server Library
//!
//! This crate provides two things:
//! - a Docling ingestion pipeline that turns Docling layout JSON into
//!   hierarchical section documents (`docling`)
//! - an MCP server exposing AnkiConnect deck, note type and note management
//!   as tools and resources (`anki`, `server`)

pub mod anki;
pub mod docling;
pub mod error;
pub mod server;

pub use error::{Error, Result};
pub use server::{run_server, run_server_with_config, AnkiServer, ServerConfig};
