//! Performance benchmarks for the Docling extraction pipeline
//!
//! Run with: `cargo bench`

use anki_mcp_server::docling::{assemble, extract, parse_tokens, Provenance};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

fn load_fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).expect("Failed to read fixture")
}

/// Synthetic lecture with `chapters` chapters of three nested headings each
fn synthetic_lecture(chapters: usize) -> Vec<u8> {
    let mut texts = Vec::new();
    for chapter in 1..=chapters {
        let page = chapter as u32;
        texts.push(json!({"label": "section_header", "level": 1,
            "text": format!("Chapter {} Topic", chapter), "prov": [{"page_no": page}]}));
        for section in 1..=3 {
            texts.push(json!({"label": "section_header", "level": 2,
                "text": format!("{}.{} Part", chapter, section), "prov": [{"page_no": page}]}));
            for line in 0..5 {
                texts.push(json!({"label": "text",
                    "text": format!("Body line {} of {}.{}", line, chapter, section),
                    "prov": [{"page_no": page}]}));
            }
        }
    }
    serde_json::to_vec(&json!({ "texts": texts })).expect("serializable")
}

/// Benchmark parsing plus hierarchy extraction of the fixtures
fn bench_fixture_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixture_extraction");

    for (name, base) in [
        ("lecture09_docling.json", "lecture09"),
        ("homework3_docling.json", "homework3"),
    ] {
        let data = load_fixture(name);
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_function(base, |b| {
            b.iter(|| {
                let tokens = parse_tokens(black_box(&data), name).unwrap();
                extract(&tokens, base)
            });
        });
    }

    group.finish();
}

/// Benchmark extraction scaling with document size
fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction_scaling");

    for chapters in [1, 10, 100] {
        let data = synthetic_lecture(chapters);
        let tokens = parse_tokens(&data, "synthetic").unwrap();
        group.throughput(Throughput::Elements(tokens.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("extract", chapters),
            &tokens,
            |b, tokens| b.iter(|| extract(black_box(tokens), "synthetic")),
        );
    }

    group.finish();
}

/// Benchmark rendering the output document
fn bench_serialization(c: &mut Criterion) {
    let data = synthetic_lecture(20);
    let tokens = parse_tokens(&data, "synthetic").unwrap();
    let sections = extract(&tokens, "synthetic");
    let doc = assemble(
        sections,
        "data/pdfs/synthetic.pdf",
        Provenance::docling("synthetic_docling.json", "synthetic"),
    );

    c.bench_function("to_json_20_chapters", |b| {
        b.iter(|| black_box(&doc).to_json().unwrap())
    });
}

criterion_group!(
    benches,
    bench_fixture_extraction,
    bench_scaling,
    bench_serialization
);
criterion_main!(benches);
