//! Docling raw JSON to structured document conversion
//!
//! Runs the reader, extractor and assembler for one artifact, and drives
//! batches where a failing file never stops its siblings.

use crate::docling::document::{assemble, Provenance};
use crate::docling::{hierarchy, tokens};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Naming suffix of raw Docling artifacts
pub const DOCLING_SUFFIX: &str = "_docling";

/// Default output directory of the batch converter
pub const DEFAULT_OUTPUT_DIR: &str = "data/intermediate";

/// Directory pattern for raw Docling artifacts
const DOCLING_FILE_PATTERN: &str = "*_docling.json";

/// Outcome of one successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDoc {
    pub source: PathBuf,
    pub output_file: PathBuf,
    pub sections: usize,
}

/// Document basename: the file stem without the `_docling` marker
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(DOCLING_SUFFIX, ""))
        .unwrap_or_default()
}

/// Converter writing structured documents into one output directory
#[derive(Debug, Clone)]
pub struct DoclingConverter {
    output_dir: PathBuf,
}

impl DoclingConverter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Convert one raw artifact into `{output_dir}/{base}.json`.
    ///
    /// Zero extracted sections yields [`Error::EmptyExtraction`] and writes
    /// nothing.
    pub fn convert_file(&self, docling_path: &Path) -> Result<ConvertedDoc> {
        let tokens = tokens::read_tokens(docling_path)?;
        let base = base_name(docling_path);
        let source = docling_path.display().to_string();

        tracing::info!(source = %source, base_name = %base, "converting");

        let sections = hierarchy::extract(&tokens, &base);
        if sections.is_empty() {
            return Err(Error::EmptyExtraction { path: source });
        }
        let section_count = sections.len();

        let doc = assemble(
            sections,
            format!("data/pdfs/{}.pdf", base),
            Provenance::docling(source.clone(), base.clone()),
        );

        let output_file = self.output_dir.join(format!("{}.json", base));
        doc.write_atomic(&output_file)?;

        tracing::info!(
            source = %source,
            output = %output_file.display(),
            sections = section_count,
            "converted"
        );

        Ok(ConvertedDoc {
            source: docling_path.to_path_buf(),
            output_file,
            sections: section_count,
        })
    }

    /// Convert every input, recording failures instead of stopping
    pub fn convert_all(&self, inputs: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for input in inputs {
            match self.convert_file(input) {
                Ok(converted) => summary.converted.push(converted),
                Err(e) if e.is_skip() => {
                    tracing::warn!(file = %input.display(), "no sections found, skipping");
                    summary.skipped.push(input.clone());
                }
                Err(e) => {
                    tracing::error!(file = %input.display(), error = %e, "conversion failed");
                    summary.failed.push((input.clone(), e.to_string()));
                }
            }
        }

        summary
    }
}

impl Default for DoclingConverter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

/// Result of a batch conversion
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub converted: Vec<ConvertedDoc>,
    /// Inputs that yielded no sections
    pub skipped: Vec<PathBuf>,
    /// Inputs that failed, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.converted.len() + self.skipped.len() + self.failed.len()
    }

    /// Human readable report naming every input that was not converted
    pub fn report(&self) -> String {
        let mut lines = vec![format!("Converted: {} files", self.converted.len())];

        if !self.skipped.is_empty() {
            lines.push(format!("Skipped:   {} files (no sections)", self.skipped.len()));
            lines.extend(self.skipped.iter().map(|p| format!("   - {}", display_name(p))));
        }
        if !self.failed.is_empty() {
            lines.push(format!("Failed:    {} files", self.failed.len()));
            lines.extend(
                self.failed
                    .iter()
                    .map(|(p, reason)| format!("   - {}: {}", display_name(p), reason)),
            );
        }

        lines.join("\n")
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Expand CLI sources into the list of artifacts to convert.
///
/// Files with a `.json` extension are taken as given; directories contribute
/// their `*_docling.json` entries (not recursive, sorted by path). Anything
/// else is logged and ignored.
pub fn collect_inputs(sources: &[PathBuf]) -> Vec<PathBuf> {
    let pattern = glob::Pattern::new(DOCLING_FILE_PATTERN).ok();
    let mut inputs = Vec::new();

    for source in sources {
        if source.is_file() && source.extension().is_some_and(|ext| ext == "json") {
            inputs.push(source.clone());
        } else if source.is_dir() {
            match collect_docling_files(source, &pattern) {
                Ok(mut found) => {
                    tracing::debug!(dir = %source.display(), files = found.len(), "scanned directory");
                    inputs.append(&mut found);
                }
                Err(e) => {
                    tracing::warn!(dir = %source.display(), error = %e, "cannot read directory, skipping");
                }
            }
        } else {
            tracing::warn!(source = %source.display(), "not a JSON file or directory, skipping");
        }
    }

    inputs
}

/// Like [`collect_inputs`], but an empty result is an error.
///
/// The batch CLI exits non-zero on this error only; per-file failures never
/// change its exit status.
pub fn require_inputs(sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let inputs = collect_inputs(sources);
    if inputs.is_empty() {
        return Err(Error::NoInputs {
            sources: sources
                .iter()
                .map(|s| s.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(inputs)
}

fn collect_docling_files(dir: &Path, pattern: &Option<glob::Pattern>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(Error::Io)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let matches = match pattern {
            Some(pat) => pat.matches(&name),
            None => name.ends_with("_docling.json"),
        };
        if matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
