//! AnkiConnect access layer

pub mod cache;
pub mod client;

pub use cache::ResourceCache;
pub use client::{
    local_url, AnkiClient, CardTemplate, ModelStyling, NoteOptions, NoteSpec, DEFAULT_PORT,
    DEFAULT_TIMEOUT,
};
