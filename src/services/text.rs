use scraper::{Html, Node};

fn is_hidden(name: &str) -> bool {
    matches!(name, "script" | "style")
}

/// Text content of an HTML fragment with entities decoded. Script and style bodies
/// are dropped.
pub(crate) fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();
    for node in fragment.root_element().descendants() {
        let Node::Text(chunk) = node.value() else { continue };
        let hidden = node.ancestors().any(|ancestor| {
            matches!(ancestor.value(), Node::Element(element) if is_hidden(element.name()))
        });
        if !hidden {
            text.push_str(chunk);
        }
    }
    text.trim().to_string()
}

pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
