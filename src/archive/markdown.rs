//! Markdown projection
//!
//! Lossy one-way mapping between pages and Markdown text. Export walks
//! only the top-level paragraph and heading nodes of the document;
//! nested structure, marks and canvas elements do not survive the trip.

use crate::database::DocNode;

/// Render a page title and document as a Markdown string
pub fn page_to_markdown(title: &str, content: &DocNode) -> String {
    let mut blocks = vec![format!("# {}", title)];

    for node in &content.content {
        match node.node_type.as_str() {
            "paragraph" => {
                let text = collect_text(node);
                if !text.is_empty() {
                    blocks.push(text);
                }
            }
            "heading" => {
                let level = heading_level(node);
                let text = collect_text(node);
                if !text.is_empty() {
                    blocks.push(format!("{} {}", "#".repeat(level), text));
                }
            }
            // Lists, code blocks and the rest are dropped
            _ => {}
        }
    }

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

/// Parse Markdown text into a page title and document.
///
/// A leading `# ` line becomes the title; everything else lands in the
/// document as one paragraph per non-empty line. `fallback_title` is
/// used when the text carries no heading.
pub fn markdown_to_page(text: &str, fallback_title: &str) -> (String, DocNode) {
    let mut lines = text.lines().peekable();

    // Skip leading blank lines before looking for the title
    while matches!(lines.peek(), Some(l) if l.trim().is_empty()) {
        lines.next();
    }

    let title = match lines.peek() {
        Some(first) if first.starts_with("# ") => {
            let title = first[2..].trim().to_string();
            lines.next();
            title
        }
        _ => fallback_title.to_string(),
    };

    let paragraphs: Vec<DocNode> = lines
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(DocNode::paragraph)
        .collect();

    (title, DocNode::container("doc", paragraphs))
}

/// Concatenated text of a node's leaf descendants
fn collect_text(node: &DocNode) -> String {
    let mut out = String::new();
    push_text(node, &mut out);
    out
}

fn push_text(node: &DocNode, out: &mut String) {
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for child in &node.content {
        push_text(child, out);
    }
}

/// Heading level from `attrs.level`, clamped to the Markdown range
fn heading_level(node: &DocNode) -> usize {
    node.attrs
        .as_ref()
        .and_then(|attrs| attrs.get("level"))
        .and_then(|level| level.as_u64())
        .map(|level| level.clamp(1, 6) as usize)
        .unwrap_or(1)
}
