//! Hierarchical document record and its on-disk JSON form

use crate::docling::hierarchy::Section;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Provenance of a converted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Producer of the raw artifact (always "docling")
    pub source: String,
    /// Path of the raw artifact the document was built from
    pub docling_file: String,
    pub base_name: String,
}

impl Provenance {
    pub fn docling(docling_file: impl Into<String>, base_name: impl Into<String>) -> Self {
        Self {
            source: "docling".to_string(),
            docling_file: docling_file.into(),
            base_name: base_name.into(),
        }
    }
}

/// A converted document with its section hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalDoc {
    /// Reference to the source PDF
    pub file_path: String,
    pub sections: Vec<Section>,
    /// Table records; this pipeline does not extract tables
    pub tables: Vec<serde_json::Value>,
    pub metadata: Provenance,
}

/// Counts recorded at the end of a serialized document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocStats {
    pub total_sections: usize,
    pub total_tables: usize,
}

#[derive(Serialize)]
struct DocRecordRef<'a> {
    file_path: &'a str,
    metadata: &'a Provenance,
    sections: &'a [Section],
    tables: &'a [serde_json::Value],
    stats: DocStats,
}

#[derive(Deserialize)]
struct DocRecord {
    file_path: String,
    metadata: Provenance,
    sections: Vec<Section>,
    #[serde(default)]
    tables: Vec<serde_json::Value>,
}

/// Wrap extracted sections into a document
pub fn assemble(
    sections: Vec<Section>,
    file_path: impl Into<String>,
    metadata: Provenance,
) -> HierarchicalDoc {
    HierarchicalDoc {
        file_path: file_path.into(),
        sections,
        tables: Vec::new(),
        metadata,
    }
}

impl HierarchicalDoc {
    pub fn stats(&self) -> DocStats {
        DocStats {
            total_sections: self.sections.len(),
            total_tables: self.tables.len(),
        }
    }

    /// Render as pretty JSON: file_path, metadata, sections, tables, stats.
    /// Optional section fields are written as explicit nulls.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let record = DocRecordRef {
            file_path: &self.file_path,
            metadata: &self.metadata,
            sections: &self.sections,
            tables: &self.tables,
            stats: self.stats(),
        };
        Ok(serde_json::to_vec_pretty(&record)?)
    }

    /// Parse a document previously written by [`HierarchicalDoc::to_json`].
    /// The stats block is derived data and is not read back.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let record: DocRecord = serde_json::from_slice(data)?;
        Ok(Self {
            file_path: record.file_path,
            sections: record.sections,
            tables: record.tables,
            metadata: record.metadata,
        })
    }

    /// Write the document so readers never observe a partial file:
    /// the JSON goes to a sibling temporary file which is then renamed.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&temp_path, &json) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }
}
