//! Docling ingestion pipeline
//!
//! Converts the flat, labeled token stream of a Docling layout analysis into a
//! hierarchical section document used for flashcard authoring.

pub mod convert;
pub mod document;
pub mod hierarchy;
pub mod tokens;

pub use convert::{
    base_name, collect_inputs, require_inputs, BatchSummary, ConvertedDoc, DoclingConverter,
    DEFAULT_OUTPUT_DIR,
};
pub use document::{assemble, DocStats, HierarchicalDoc, Provenance};
pub use hierarchy::{extract, extract_chapter_info, slide_image_path, Section, SectionNumber};
pub use tokens::{parse_tokens, read_tokens, PageRef, Token, TokenLabel};
