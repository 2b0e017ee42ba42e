//! Hierarchy extraction: flat layout tokens to an ordered section tree
//!
//! Sections form an implicit tree through `parent_id`. Headings drive section
//! creation; documents without any heading go through a fallback that either
//! splits numbered tasks (homework sheets) or emits one whole-document section.

use crate::docling::tokens::{Token, TokenLabel};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `Chapter 9 ...` / `Kapitel 9 ...`
static CHAPTER_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Chapter|Kapitel)\s+(\d+)").expect("valid chapter word regex")
});

/// `9 ...`, `9.2 ...`, `9.2.1 ...`
static DOTTED_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)\s+").expect("valid dotted number regex")
});

/// `9. ...`, only consulted for level 1 headings
static NUMBERED_CHAPTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s+").expect("valid numbered chapter regex"));

/// Task numbers at line starts in heading-less homework sheets
static TASK_SPLIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\d+)\.\s+").expect("valid task split regex"));

/// Basename keyword selecting the task-splitting fallback
const TASK_DOCUMENT_KEYWORD: &str = "homework";

/// Characters of a task body used to locate its page
const PAGE_MATCH_PREFIX_CHARS: usize = 50;

/// Page assumed when nothing better is known
const DEFAULT_PAGE: u32 = 1;

/// Slide image rendered for a section's page
pub fn slide_image_path(base_name: &str, page: u32) -> String {
    format!(
        "data/intermediate/slide_images/{base}/pgm_{base}_slide_{page}.png",
        base = base_name,
        page = page
    )
}

/// Section number as found in the source.
///
/// Headings carry a dotted string (`"9.2"`); heading-less task sheets carry a
/// plain task number. The two serialize as a JSON string and a JSON integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionNumber {
    Task(u64),
    Dotted(String),
}

impl From<&str> for SectionNumber {
    fn from(s: &str) -> Self {
        SectionNumber::Dotted(s.to_string())
    }
}

/// One node of the extracted document hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Translated content, filled by a later pipeline step
    pub content_de: Option<String>,
    pub level: u32,
    pub page: Option<u32>,
    pub parent_id: Option<String>,
    pub chapter: Option<String>,
    pub section_number: Option<SectionNumber>,
    pub image_path: Option<String>,
}

fn section_id(base_name: &str, index: usize) -> String {
    format!("{}_sec_{}", base_name, index)
}

/// Open ancestor during heading traversal
struct OpenSection {
    id: String,
    level: u32,
}

/// Extract the section list from a token stream.
///
/// A stream without headings always yields at least one section.
pub fn extract(tokens: &[Token], base_name: &str) -> Vec<Section> {
    let heading_indices: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_heading())
        .map(|(i, _)| i)
        .collect();

    if heading_indices.is_empty() {
        return extract_fallback(tokens, base_name);
    }

    let mut sections = Vec::with_capacity(heading_indices.len());
    let mut parent_stack: Vec<OpenSection> = Vec::new();
    let mut current_chapter: Option<String> = None;

    for (position, &token_index) in heading_indices.iter().enumerate() {
        let heading = &tokens[token_index];
        let index = sections.len();

        let level = heading.level.unwrap_or(1).max(1);
        let title = heading
            .text
            .clone()
            .unwrap_or_else(|| format!("Section {}", index));

        let (chapter, section_number) = extract_chapter_info(&title, level);
        if level == 1 && chapter.is_some() {
            current_chapter = chapter.clone();
        }

        while parent_stack.last().is_some_and(|open| open.level >= level) {
            parent_stack.pop();
        }
        let parent_id = parent_stack.last().map(|open| open.id.clone());

        let id = section_id(base_name, index);
        let page = heading.first_page();
        let image_path = page.map(|p| slide_image_path(base_name, p));

        let span_end = heading_indices
            .get(position + 1)
            .copied()
            .unwrap_or(tokens.len());
        let content = render_content(&title, &tokens[token_index + 1..span_end]);

        parent_stack.push(OpenSection {
            id: id.clone(),
            level,
        });

        sections.push(Section {
            id,
            title,
            content,
            content_de: None,
            level,
            page,
            parent_id,
            chapter: chapter.or_else(|| current_chapter.clone()),
            section_number: section_number.map(SectionNumber::Dotted),
            image_path,
        });
    }

    sections
}

/// Heading marker followed by the trimmed body texts of the span
fn render_content(title: &str, span: &[Token]) -> String {
    let mut parts = vec![format!("## {}\n\n", title)];
    parts.extend(
        span.iter()
            .filter(|t| t.label == TokenLabel::Text)
            .map(|t| t.text().trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string),
    );
    parts.join("\n")
}

/// Extract `(chapter, section_number)` from a heading title.
///
/// Rules are tried in order and the first match wins:
/// `Chapter N` / `Kapitel N`, then a dotted prefix such as `9.2`, then (level 1
/// only) `N.` followed by whitespace.
pub fn extract_chapter_info(title: &str, level: u32) -> (Option<String>, Option<String>) {
    if let Some(caps) = CHAPTER_WORD_REGEX.captures(title) {
        let chapter = caps[1].to_string();
        return (Some(chapter.clone()), Some(chapter));
    }

    if let Some(caps) = DOTTED_NUMBER_REGEX.captures(title) {
        let number = caps[1].to_string();
        let chapter = number.split('.').next().unwrap_or_default().to_string();
        return (Some(chapter), Some(number));
    }

    if level == 1 {
        if let Some(caps) = NUMBERED_CHAPTER_REGEX.captures(title) {
            let chapter = caps[1].to_string();
            return (Some(chapter.clone()), Some(chapter));
        }
    }

    (None, None)
}

/// Extraction for documents without any heading token
fn extract_fallback(tokens: &[Token], base_name: &str) -> Vec<Section> {
    let full_text = tokens
        .iter()
        .map(Token::text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if base_name.to_lowercase().contains(TASK_DOCUMENT_KEYWORD) {
        let tasks = split_tasks(&full_text);
        if tasks.len() >= 2 {
            return tasks
                .into_iter()
                .enumerate()
                .map(|(index, (number, body))| task_section(tokens, base_name, index, number, body))
                .collect();
        }
        tracing::debug!(
            base_name,
            tasks = tasks.len(),
            "too few numbered tasks, using whole document"
        );
    }

    vec![Section {
        id: section_id(base_name, 0),
        title: base_name.to_string(),
        content: full_text,
        content_de: None,
        level: 1,
        page: Some(DEFAULT_PAGE),
        parent_id: None,
        chapter: None,
        section_number: None,
        image_path: Some(slide_image_path(base_name, DEFAULT_PAGE)),
    }]
}

/// Split text on `N. ` at line starts into `(N, body)` pairs with non-empty bodies.
/// Text before the first task number is dropped.
fn split_tasks(full_text: &str) -> Vec<(&str, &str)> {
    let matches: Vec<_> = TASK_SPLIT_REGEX.captures_iter(full_text).collect();
    let mut tasks = Vec::new();

    for (i, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let body_end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(full_text.len());
        let body = full_text[whole.end()..body_end].trim();
        if !body.is_empty() {
            tasks.push((number.as_str(), body));
        }
    }

    tasks
}

fn task_section(
    tokens: &[Token],
    base_name: &str,
    index: usize,
    number: &str,
    body: &str,
) -> Section {
    let page = locate_page(tokens, body).unwrap_or(DEFAULT_PAGE);
    let section_number = number
        .parse::<u64>()
        .map(SectionNumber::Task)
        .unwrap_or_else(|_| SectionNumber::from(number));

    Section {
        id: section_id(base_name, index),
        title: format!("{} - Task {}", base_name, number),
        content: format!("## Task {}\n\n{}", number, body),
        content_de: None,
        level: 1,
        page: Some(page),
        parent_id: None,
        chapter: None,
        section_number: Some(section_number),
        image_path: Some(slide_image_path(base_name, page)),
    }
}

/// Page of the first token containing the beginning of `body`.
///
/// Best effort: repeated or near-duplicate text resolves to the first
/// occurrence.
fn locate_page(tokens: &[Token], body: &str) -> Option<u32> {
    let prefix_end = body
        .char_indices()
        .nth(PAGE_MATCH_PREFIX_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    let prefix = &body[..prefix_end];

    tokens
        .iter()
        .filter(|t| t.text().contains(prefix))
        .find_map(Token::first_page)
}
