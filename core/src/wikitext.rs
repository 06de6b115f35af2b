use parse_wiki_text::{Configuration, Node};
use tracing::debug;

/// Converts MediaWiki markup into plain text.
///
/// Returns the abstract (lead-section text with newlines stripped) and the full
/// body text. Templates, tables, images, and category links contribute nothing;
/// link text is kept, link targets are not.
pub fn render(title: &str, wikitext: &str) -> (String, String) {
    let parsed = Configuration::default().parse(wikitext);
    if !parsed.warnings.is_empty() {
        debug!(title, warnings = parsed.warnings.len(), "wikitext parsed with warnings");
    }

    let mut body = String::new();
    let mut lead_end = None;
    for node in &parsed.nodes {
        if lead_end.is_none() {
            if let Node::Heading { .. } = node {
                lead_end = Some(body.len());
            }
        }
        append_text(node, &mut body);
    }

    let lead = &body[..lead_end.unwrap_or(body.len())];
    let abstract_ = lead.replace('\n', "").trim().to_string();
    (abstract_, body.trim().to_string())
}

fn append_all(nodes: &[Node], out: &mut String) {
    for node in nodes {
        append_text(node, out);
    }
}

fn append_text(node: &Node, out: &mut String) {
    match node {
        Node::Text { value, .. } => out.push_str(value),
        Node::CharacterEntity { character, .. } => out.push(*character),
        Node::Link { text, .. } => append_all(text, out),
        Node::ExternalLink { nodes, .. } => append_all(nodes, out),
        Node::Heading { nodes, .. } => {
            out.push_str("\n\n");
            append_all(nodes, out);
            out.push_str("\n\n");
        }
        Node::ParagraphBreak { .. } => out.push_str("\n\n"),
        Node::UnorderedList { items, .. } | Node::OrderedList { items, .. } => {
            for item in items {
                out.push('\n');
                append_all(&item.nodes, out);
            }
            out.push('\n');
        }
        Node::DefinitionList { items, .. } => {
            for item in items {
                out.push('\n');
                append_all(&item.nodes, out);
            }
            out.push('\n');
        }
        Node::Preformatted { nodes, .. } => {
            append_all(nodes, out);
            out.push('\n');
        }
        // Templates, tables, images, categories, comments, html tags, and
        // formatting toggles carry no article prose.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let (abstract_, body) = render("T", "hello world");
        assert_eq!(abstract_, "hello world");
        assert_eq!(body, "hello world");
    }

    #[test]
    fn link_text_survives_markup() {
        let (_, body) = render("T", "see [[Rust (programming language)|Rust]] for details");
        assert!(body.contains("Rust"));
        assert!(!body.contains("[["));
    }

    #[test]
    fn templates_are_dropped() {
        let (_, body) = render("T", "{{Infobox|name=x}}plain tail");
        assert!(body.contains("plain tail"));
        assert!(!body.contains("Infobox"));
    }

    #[test]
    fn abstract_stops_at_first_heading() {
        let text = "Lead paragraph here.\n\n== History ==\n\nLater section.";
        let (abstract_, body) = render("T", text);
        assert!(abstract_.contains("Lead paragraph"));
        assert!(!abstract_.contains("Later section"));
        assert!(body.contains("Later section"));
    }

    #[test]
    fn abstract_is_newline_free() {
        let (abstract_, _) = render("T", "first line\n\nsecond line\n\n== H ==\nrest");
        assert!(!abstract_.contains('\n'));
        assert!(abstract_.contains("first line"));
    }
}
