//! Heading extraction and outline construction.
//!
//! A loaded document is scanned once for headings, each heading gets a
//! stable anchor id derived from its text, and the level 1-3 headings are
//! linked into a nested table of contents. Deeper levels are rendered in
//! the document but never appear in the outline.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// One entry of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
    pub id: String,
    pub text: String,
    pub level: u8,
    pub children: Vec<HeadingNode>,
}

impl HeadingNode {
    fn new(level: u8, text: &str) -> Self {
        HeadingNode {
            id: anchor_id(text),
            text: text.to_string(),
            level,
            children: Vec::new(),
        }
    }
}

fn parser_options() -> Options {
    Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

/// Collect `(level, text)` for every heading in document order.
///
/// Text is the concatenated plain text of the heading, inline code
/// included, inline markup dropped. Headings inside fenced code blocks do
/// not count. Input without headings yields an empty vector.
pub fn extract_headings(markdown: &str) -> Vec<(u8, String)> {
    let parser = Parser::new_ext(markdown, parser_options());
    let mut headings = Vec::new();
    let mut in_heading = false;
    let mut current_level = 0u8;
    let mut current_text = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                in_heading = true;
                current_level = match level {
                    HeadingLevel::H1 => 1,
                    HeadingLevel::H2 => 2,
                    HeadingLevel::H3 => 3,
                    HeadingLevel::H4 => 4,
                    HeadingLevel::H5 => 5,
                    HeadingLevel::H6 => 6,
                };
                current_text.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                if in_heading && !current_text.is_empty() {
                    headings.push((current_level, current_text.clone()));
                }
                in_heading = false;
            }
            Event::Text(text) if in_heading => {
                current_text.push_str(&text);
            }
            Event::Code(code) if in_heading => {
                current_text.push_str(&code);
            }
            _ => {}
        }
    }

    headings
}

/// Derive the anchor id for a heading text: lowercase, runs of whitespace
/// become a single hyphen. No other normalization happens, so two headings
/// with the same text share the same id.
pub fn anchor_id(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Link raw headings into the three-tier outline.
///
/// Level 1 starts a new top-level entry. Level 2 goes under the most
/// recent level 1; level 3 under the most recent level 2 of the most
/// recent level 1. A heading whose parent slot is empty is dropped, as are
/// levels 4-6.
pub fn build_outline(headings: &[(u8, String)]) -> Vec<HeadingNode> {
    let mut outline: Vec<HeadingNode> = Vec::new();

    for (level, text) in headings {
        match level {
            1 => outline.push(HeadingNode::new(1, text)),
            2 => {
                if let Some(parent) = outline.last_mut() {
                    parent.children.push(HeadingNode::new(2, text));
                }
            }
            3 => {
                if let Some(parent) = outline.last_mut() {
                    if let Some(section) = parent.children.last_mut() {
                        section.children.push(HeadingNode::new(3, text));
                    }
                }
            }
            _ => {}
        }
    }

    outline
}

/// Extract headings and build the outline in one step.
pub fn outline_of(markdown: &str) -> Vec<HeadingNode> {
    build_outline(&extract_headings(markdown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_document_gives_flat_outline() {
        let outline = outline_of("# One\n\ntext\n\n# Two\n\n# Three\n");
        let texts: Vec<&str> = outline.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, ["One", "Two", "Three"]);
        assert!(outline.iter().all(|n| n.children.is_empty()));
        assert!(outline.iter().all(|n| n.level == 1));
    }

    #[test]
    fn three_tier_nesting() {
        let outline = outline_of("# A\n## B\n### C\n## D");
        assert_eq!(outline.len(), 1);
        let a = &outline[0];
        assert_eq!(a.text, "A");
        assert_eq!(a.children.len(), 2);
        assert_eq!(a.children[0].text, "B");
        assert_eq!(a.children[0].children.len(), 1);
        assert_eq!(a.children[0].children[0].text, "C");
        assert_eq!(a.children[1].text, "D");
        assert!(a.children[1].children.is_empty());
    }

    #[test]
    fn orphan_level_two_is_dropped() {
        let outline = outline_of("## Orphan\n# A");
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].text, "A");
        assert!(outline[0].children.is_empty());
    }

    #[test]
    fn orphan_level_three_is_dropped() {
        // Level 1 exists but no level 2 under it.
        let outline = outline_of("# A\n### Deep");
        assert_eq!(outline.len(), 1);
        assert!(outline[0].children.is_empty());
    }

    #[test]
    fn levels_past_three_stay_out_of_the_outline() {
        let outline = outline_of("# A\n## B\n### C\n#### D\n##### E");
        let c = &outline[0].children[0].children[0];
        assert_eq!(c.text, "C");
        assert!(c.children.is_empty());
    }

    #[test]
    fn anchor_id_is_deterministic() {
        assert_eq!(anchor_id("Hello World"), "hello-world");
        assert_eq!(anchor_id("Hello World"), anchor_id("Hello World"));
        assert_eq!(anchor_id("Tabs\tand  spaces"), "tabs-and-spaces");
        // Punctuation survives untouched.
        assert_eq!(anchor_id("Don't Panic!"), "don't-panic!");
    }

    #[test]
    fn duplicate_texts_share_an_id_but_stay_distinct_nodes() {
        let outline = outline_of("# Setup\n# Setup");
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].id, outline[1].id);
        assert_eq!(outline[0].id, "setup");
    }

    #[test]
    fn heading_free_input_is_empty_not_an_error() {
        assert!(extract_headings("just a paragraph\n\nanother one").is_empty());
        assert!(extract_headings("").is_empty());
        assert!(outline_of("no headings here").is_empty());
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        assert!(extract_headings("#not-a-heading").is_empty());
    }

    #[test]
    fn fenced_code_headings_are_ignored() {
        let md = "# Real\n\n```\n# not a heading\n```\n";
        let headings = extract_headings(md);
        assert_eq!(headings, vec![(1, "Real".to_string())]);
    }

    #[test]
    fn inline_markup_collapses_to_plain_text() {
        let headings = extract_headings("# Using `cargo` **here**");
        assert_eq!(headings, vec![(1, "Using cargo here".to_string())]);
        assert_eq!(anchor_id(&headings[0].1), "using-cargo-here");
    }
}
