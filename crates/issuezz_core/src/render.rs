//! crates/issuezz_core/src/render.rs
//!
//! Turns chat message text into structured rich content. A single markdown parser
//! backs both chat surfaces; `RenderMode` decides whether block structure survives.

use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{markdown_to_html, parse_document, Arena, ComrakOptions};
use once_cell::sync::Lazy;
use serde::Serialize;

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.autolink = true;
    options.extension.strikethrough = true;
    options
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Headings, lists, quotes and code blocks are kept.
    #[default]
    Markdown,
    /// Only links and inline emphasis; blocks collapse into paragraphs.
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Link { url: String, children: Vec<Inline> },
    Code(String),
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    List { ordered: bool, items: Vec<Vec<Block>> },
    CodeBlock { language: Option<String>, code: String },
    Quote(Vec<Block>),
    Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RichContent {
    pub blocks: Vec<Block>,
}

impl RichContent {
    /// Every link target, in document order.
    pub fn links(&self) -> Vec<&str> {
        let mut urls = Vec::new();
        for block in &self.blocks {
            collect_block_links(block, &mut urls);
        }
        urls
    }
}

fn collect_block_links<'a>(block: &'a Block, urls: &mut Vec<&'a str>) {
    match block {
        Block::Paragraph(inlines) | Block::Heading { content: inlines, .. } => {
            collect_inline_links(inlines, urls)
        }
        Block::List { items, .. } => items
            .iter()
            .flatten()
            .for_each(|b| collect_block_links(b, urls)),
        Block::Quote(blocks) => blocks.iter().for_each(|b| collect_block_links(b, urls)),
        Block::CodeBlock { .. } | Block::Rule => {}
    }
}

fn collect_inline_links<'a>(inlines: &'a [Inline], urls: &mut Vec<&'a str>) {
    for inline in inlines {
        match inline {
            Inline::Link { url, children } => {
                urls.push(url.as_str());
                collect_inline_links(children, urls);
            }
            Inline::Strong(children) | Inline::Emphasis(children) => {
                collect_inline_links(children, urls)
            }
            _ => {}
        }
    }
}

//=========================================================================================
// Renderer
//=========================================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    mode: RenderMode,
}

impl Renderer {
    pub fn new(mode: RenderMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Parses `content`. Unmatched markers are kept as literal text.
    pub fn render(&self, content: &str) -> RichContent {
        let arena = Arena::new();
        let root = parse_document(&arena, content, &MARKDOWN_OPTIONS);
        let mut blocks = Vec::new();
        for node in root.children() {
            self.push_block(node, &mut blocks);
        }
        RichContent { blocks }
    }

    /// HTML for surfaces that display markup directly.
    pub fn to_html(&self, content: &str) -> String {
        markdown_to_html(content, &MARKDOWN_OPTIONS)
    }

    fn push_block<'a>(&self, node: &'a AstNode<'a>, out: &mut Vec<Block>) {
        let value = node.data.borrow().value.clone();
        let flatten = self.mode == RenderMode::Inline;
        match value {
            NodeValue::Paragraph => out.push(Block::Paragraph(inlines_of(node))),
            NodeValue::Heading(heading) if !flatten => out.push(Block::Heading {
                level: heading.level,
                content: inlines_of(node),
            }),
            NodeValue::Heading(_) => out.push(Block::Paragraph(inlines_of(node))),
            NodeValue::List(list) if !flatten => {
                let items = node
                    .children()
                    .map(|item| {
                        let mut blocks = Vec::new();
                        for child in item.children() {
                            self.push_block(child, &mut blocks);
                        }
                        blocks
                    })
                    .collect();
                out.push(Block::List {
                    ordered: list.list_type == ListType::Ordered,
                    items,
                });
            }
            NodeValue::BlockQuote if !flatten => {
                let mut blocks = Vec::new();
                for child in node.children() {
                    self.push_block(child, &mut blocks);
                }
                out.push(Block::Quote(blocks));
            }
            NodeValue::CodeBlock(code) if !flatten => {
                let info = code.info.trim();
                out.push(Block::CodeBlock {
                    language: (!info.is_empty()).then(|| info.to_string()),
                    code: code.literal,
                });
            }
            NodeValue::CodeBlock(code) => {
                out.push(Block::Paragraph(vec![Inline::Code(code.literal)]))
            }
            NodeValue::HtmlBlock(html) => {
                out.push(Block::Paragraph(vec![Inline::Text(html.literal)]))
            }
            NodeValue::ThematicBreak if !flatten => out.push(Block::Rule),
            NodeValue::ThematicBreak => {}
            _ => {
                // Lists, quotes and anything unrecognised: recurse into children.
                for child in node.children() {
                    self.push_block(child, out);
                }
            }
        }
    }
}

fn inlines_of<'a>(node: &'a AstNode<'a>) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in node.children() {
        push_inline(child, &mut out);
    }
    out
}

fn push_inline<'a>(node: &'a AstNode<'a>, out: &mut Vec<Inline>) {
    let value = node.data.borrow().value.clone();
    match value {
        NodeValue::Text(text) => push_text(out, &text),
        NodeValue::SoftBreak => push_text(out, "\n"),
        NodeValue::LineBreak => out.push(Inline::LineBreak),
        NodeValue::Code(code) => out.push(Inline::Code(code.literal)),
        NodeValue::HtmlInline(html) => push_text(out, &html),
        NodeValue::Strong => out.push(Inline::Strong(inlines_of(node))),
        NodeValue::Emph => out.push(Inline::Emphasis(inlines_of(node))),
        NodeValue::Link(link) | NodeValue::Image(link) => out.push(Inline::Link {
            url: link.url,
            children: inlines_of(node),
        }),
        _ => {
            for child in node.children() {
                push_inline(child, out);
            }
        }
    }
}

/// Appends text, merging with a preceding text run.
fn push_text(out: &mut Vec<Inline>, text: &str) {
    if let Some(Inline::Text(existing)) = out.last_mut() {
        existing.push_str(text);
    } else {
        out.push(Inline::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn links_and_bold_in_order() {
        let content = Renderer::default().render("Check https://example.com/x and **bold** text");
        assert_eq!(
            content.blocks,
            vec![Block::Paragraph(vec![
                text("Check "),
                Inline::Link {
                    url: "https://example.com/x".to_string(),
                    children: vec![text("https://example.com/x")],
                },
                text(" and "),
                Inline::Strong(vec![text("bold")]),
                text(" text"),
            ])]
        );
    }

    #[test]
    fn plain_text_without_urls() {
        let content = Renderer::default().render("nothing special here");
        assert_eq!(content.blocks, vec![Block::Paragraph(vec![text("nothing special here")])]);
        assert!(content.links().is_empty());
    }

    #[test]
    fn many_urls() {
        let content = Renderer::new(RenderMode::Inline)
            .render("a https://one.example/a b http://two.example/b c https://three.example");
        assert_eq!(
            content.links(),
            vec![
                "https://one.example/a",
                "http://two.example/b",
                "https://three.example"
            ]
        );
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        let content = Renderer::default().render("**unclosed and *half");
        assert_eq!(
            content.blocks,
            vec![Block::Paragraph(vec![text("**unclosed and *half")])]
        );
    }

    #[test]
    fn italic_inside_bold() {
        let content = Renderer::default().render("**very *nested* words**");
        assert_eq!(
            content.blocks,
            vec![Block::Paragraph(vec![Inline::Strong(vec![
                text("very "),
                Inline::Emphasis(vec![text("nested")]),
                text(" words"),
            ])])]
        );
    }

    #[test]
    fn markdown_mode_keeps_structure() {
        let content = Renderer::new(RenderMode::Markdown).render("# Title\n\n- one\n- two\n");
        assert_eq!(content.blocks.len(), 2);
        assert!(matches!(&content.blocks[0], Block::Heading { level: 1, .. }));
        match &content.blocks[1] {
            Block::List { ordered, items } => {
                assert!(!ordered);
                assert_eq!(items.len(), 2);
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[test]
    fn inline_mode_flattens_blocks() {
        let content = Renderer::new(RenderMode::Inline).render("# Title\n\n- one\n- two\n");
        assert_eq!(
            content.blocks,
            vec![
                Block::Paragraph(vec![text("Title")]),
                Block::Paragraph(vec![text("one")]),
                Block::Paragraph(vec![text("two")]),
            ]
        );
    }

    #[test]
    fn html_output_links_urls() {
        let html = Renderer::default().to_html("see https://example.com");
        assert!(html.contains("<a href=\"https://example.com\">"));
    }
}
