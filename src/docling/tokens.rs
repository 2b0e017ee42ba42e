//! Layout token reader for Docling raw JSON

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Semantic label attached to a token by the layout analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenLabel {
    SectionHeader,
    Text,
    /// Any other Docling label (page_header, list_item, caption, ...)
    #[serde(other)]
    Other,
}

/// Page provenance of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    pub page_number: u32,
}

/// One classified unit of extracted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text; `None` when the analyzer emitted no text field
    pub text: Option<String>,
    pub label: TokenLabel,
    pub level: Option<u32>,
    pub page_references: Vec<PageRef>,
}

impl Token {
    /// Token text, or an empty string when absent
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// First page reference, if any
    pub fn first_page(&self) -> Option<u32> {
        self.page_references.first().map(|p| p.page_number)
    }

    pub fn is_heading(&self) -> bool {
        self.label == TokenLabel::SectionHeader
    }
}

// Raw artifact shape. Only the fields the pipeline reads are declared; serde
// ignores the rest of the Docling document.

#[derive(Debug, Deserialize)]
struct RawArtifact {
    texts: Vec<RawText>,
}

#[derive(Debug, Deserialize)]
struct RawText {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    label: Option<TokenLabel>,
    #[serde(default)]
    level: Option<u32>,
    #[serde(default)]
    prov: Vec<RawProv>,
}

#[derive(Debug, Deserialize)]
struct RawProv {
    #[serde(default)]
    page_no: Option<u32>,
}

impl From<RawText> for Token {
    fn from(raw: RawText) -> Self {
        // Only the leading provenance entries that carry a page count as references,
        // so `first_page` is exactly `prov[0].page_no`.
        let page_references = raw
            .prov
            .iter()
            .map_while(|p| p.page_no)
            .map(|page_number| PageRef { page_number })
            .collect();

        Token {
            text: raw.text,
            label: raw.label.unwrap_or(TokenLabel::Other),
            level: raw.level,
            page_references,
        }
    }
}

/// Parse a raw Docling artifact into its ordered token sequence.
///
/// `origin` names the artifact in error messages.
pub fn parse_tokens(data: &[u8], origin: &str) -> Result<Vec<Token>> {
    let artifact: RawArtifact =
        serde_json::from_slice(data).map_err(|e| Error::MalformedInput {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;

    Ok(artifact.texts.into_iter().map(Token::from).collect())
}

/// Read and parse a Docling artifact from disk
pub fn read_tokens<P: AsRef<Path>>(path: P) -> Result<Vec<Token>> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(Error::InputNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path).map_err(Error::Io)?;
    let tokens = parse_tokens(&data, &path.display().to_string())?;

    tracing::debug!(path = %path.display(), tokens = tokens.len(), "read layout tokens");

    Ok(tokens)
}
