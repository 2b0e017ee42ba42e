//! Integration tests for the Docling conversion pipeline

use anki_mcp_server::docling::{
    collect_inputs, read_tokens, require_inputs, DoclingConverter, HierarchicalDoc,
    SectionNumber,
};
use anki_mcp_server::Error;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn convert(name: &str) -> (tempfile::TempDir, HierarchicalDoc, Value) {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let converter = DoclingConverter::new(output.path());

    let converted = converter
        .convert_file(&fixture_path(name))
        .expect("Failed to convert fixture");
    let data = std::fs::read(&converted.output_file).expect("Failed to read output");

    let doc = HierarchicalDoc::from_json(&data).expect("Failed to parse output");
    let raw: Value = serde_json::from_slice(&data).expect("Output is not JSON");
    (output, doc, raw)
}

#[test]
fn test_read_lecture_tokens() {
    let tokens = read_tokens(fixture_path("lecture09_docling.json")).expect("Failed to read");

    assert_eq!(tokens.len(), 13);
    assert_eq!(tokens.iter().filter(|t| t.is_heading()).count(), 5);
    assert_eq!(tokens[1].first_page(), Some(1));
}

#[test]
fn test_lecture_hierarchy() {
    let (_dir, doc, _) = convert("lecture09_docling.json");

    assert_eq!(doc.file_path, "data/pdfs/lecture09.pdf");
    assert_eq!(doc.metadata.source, "docling");
    assert_eq!(doc.metadata.base_name, "lecture09");

    let ids: Vec<&str> = doc.sections.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "lecture09_sec_0",
            "lecture09_sec_1",
            "lecture09_sec_2",
            "lecture09_sec_3",
            "lecture09_sec_4"
        ]
    );

    let parents: Vec<Option<&str>> = doc
        .sections
        .iter()
        .map(|s| s.parent_id.as_deref())
        .collect();
    assert_eq!(
        parents,
        [
            None,
            Some("lecture09_sec_0"),
            Some("lecture09_sec_0"),
            Some("lecture09_sec_2"),
            None
        ]
    );

    let gibbs = &doc.sections[3];
    assert_eq!(gibbs.level, 3);
    assert_eq!(gibbs.chapter.as_deref(), Some("9"));
    assert_eq!(gibbs.section_number, Some(SectionNumber::from("9.2.1")));
    assert_eq!(gibbs.page, Some(3));
    assert_eq!(
        gibbs.image_path.as_deref(),
        Some("data/intermediate/slide_images/lecture09/pgm_lecture09_slide_3.png")
    );

    // Summary carries no number but inherits the running chapter
    let summary = &doc.sections[4];
    assert_eq!(summary.section_number, None);
    assert_eq!(summary.chapter.as_deref(), Some("9"));
}

#[test]
fn test_lecture_content_uses_body_text_only() {
    let (_dir, doc, _) = convert("lecture09_docling.json");

    assert_eq!(
        doc.sections[0].content,
        "## Chapter 9 Markov Random Fields\n\n\nUndirected graphical models."
    );
    assert_eq!(
        doc.sections[1].content,
        "## 9.1 Conditional Independence\n\n\nSeparation in the graph."
    );
}

#[test]
fn test_output_layout() {
    let (_dir, _, raw) = convert("lecture09_docling.json");

    let keys: Vec<&str> = raw
        .as_object()
        .expect("top level object")
        .keys()
        .map(String::as_str)
        .collect();
    assert!(keys.contains(&"file_path"));
    assert!(keys.contains(&"metadata"));
    assert_eq!(raw["stats"]["total_sections"], 5);
    assert_eq!(raw["stats"]["total_tables"], 0);
    assert_eq!(raw["tables"], Value::Array(vec![]));

    // optional fields are explicit nulls
    assert_eq!(raw["sections"][0]["content_de"], Value::Null);
    assert_eq!(raw["sections"][0]["parent_id"], Value::Null);
    assert_eq!(raw["sections"][0]["section_number"], "9");
}

#[test]
fn test_homework_task_split() {
    let (_dir, doc, raw) = convert("homework3_docling.json");

    assert_eq!(doc.sections.len(), 3);
    let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(
        titles,
        [
            "homework3 - Task 1",
            "homework3 - Task 2",
            "homework3 - Task 3"
        ]
    );

    let pages: Vec<Option<u32>> = doc.sections.iter().map(|s| s.page).collect();
    assert_eq!(pages, [Some(1), Some(2), Some(3)]);

    assert_eq!(
        doc.sections[1].content,
        "## Task 2\n\nShow that the graph is a tree."
    );
    assert!(doc.sections.iter().all(|s| s.parent_id.is_none()));

    // task numbers are integers on the wire
    assert_eq!(raw["sections"][0]["section_number"], 1);
}

#[test]
fn test_whole_document_fallback() {
    let (_dir, doc, _) = convert("notes_docling.json");

    assert_eq!(doc.sections.len(), 1);
    let section = &doc.sections[0];
    assert_eq!(section.id, "notes_sec_0");
    assert_eq!(section.title, "notes");
    assert_eq!(section.content, "Some loose notes.\nMore notes.");
    assert_eq!(section.page, Some(1));
    assert_eq!(section.level, 1);
}

#[test]
fn test_empty_document_yields_one_section() {
    let (_dir, doc, raw) = convert("empty_docling.json");

    assert_eq!(doc.sections.len(), 1);
    let section = &doc.sections[0];
    assert_eq!(section.id, "empty_sec_0");
    assert_eq!(section.title, "empty");
    assert_eq!(section.content, "");
    assert_eq!(section.page, Some(1));
    assert_eq!(
        section.image_path.as_deref(),
        Some("data/intermediate/slide_images/empty/pgm_empty_slide_1.png")
    );
    assert_eq!(raw["stats"]["total_sections"], 1);
}

#[test]
fn test_collect_inputs_from_fixture_dir() {
    let inputs = collect_inputs(&[fixtures_dir()]);
    let names: Vec<String> = inputs
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();

    assert_eq!(
        names,
        [
            "empty_docling.json",
            "homework3_docling.json",
            "lecture09_docling.json",
            "notes_docling.json"
        ]
    );
}

#[test]
fn test_no_inputs_is_an_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let result = require_inputs(&[dir.path().to_path_buf(), dir.path().join("absent.json")]);
    assert!(matches!(result, Err(Error::NoInputs { .. })));

    // unconvertible inputs still count as found
    let broken = dir.path().join("broken_docling.json");
    std::fs::write(&broken, "{").expect("Failed to write");
    let inputs = require_inputs(&[dir.path().to_path_buf()]).expect("inputs found");
    assert_eq!(inputs, vec![broken]);
}

#[test]
fn test_batch_conversion() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let broken = output.path().join("broken_docling.json");
    std::fs::write(&broken, "{ not json").expect("Failed to write");

    let mut inputs = collect_inputs(&[fixtures_dir()]);
    inputs.push(broken);
    inputs.push(output.path().join("missing_docling.json"));

    let converter = DoclingConverter::new(output.path().join("out"));
    let summary = converter.convert_all(&inputs);

    assert_eq!(summary.converted.len(), 4);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.failed.len(), 2);
    assert_eq!(summary.total(), 6);

    for name in ["empty.json", "lecture09.json", "homework3.json", "notes.json"] {
        assert!(output.path().join("out").join(name).exists(), "{}", name);
    }

    let report = summary.report();
    assert!(report.contains("Converted: 4 files"));
    assert!(report.contains("broken_docling.json"));
    assert!(report.contains("missing_docling.json"));
}

#[test]
fn test_reconversion_overwrites() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let converter = DoclingConverter::new(output.path());
    let source = fixture_path("notes_docling.json");

    let first = converter.convert_file(&source).expect("first conversion");
    let first_bytes = std::fs::read(&first.output_file).expect("read first");
    let second = converter.convert_file(&source).expect("second conversion");
    let second_bytes = std::fs::read(&second.output_file).expect("read second");

    assert_eq!(first_bytes, second_bytes);
    assert!(!output.path().join("notes.json.tmp").exists());
}
