//! Extracts question anchors from an HTML listening transcript.
//!
//! Question numbers are written in bold (`<strong>` or `<b>`). Each anchor is bound to
//! the plain text of the nearest enclosing `<p>`, `<div>` or `<td>`.

use scraper::{ElementRef, Html};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuestionContext {
    pub(crate) number: Option<u32>,
    /// 1 for numbered gaps; 2 or 3 for "Choose TWO/THREE" groups.
    pub(crate) required_choices: u8,
    pub(crate) context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Numbered(u32),
    Choose(u8),
}

fn is_block(tag: &str) -> bool {
    matches!(tag, "p" | "div" | "td")
}

fn is_bold(tag: &str) -> bool {
    matches!(tag, "strong" | "b")
}

/// Trimmed, with inner whitespace runs (newlines, `&nbsp;`) folded to one space.
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn classify(bold_text: &str) -> Option<Marker> {
    let trimmed = bold_text.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse().ok().map(Marker::Numbered);
    }
    if trimmed.contains("THREE") {
        return Some(Marker::Choose(3));
    }
    if trimmed.contains("TWO") {
        return Some(Marker::Choose(2));
    }
    None
}

fn ancestor_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.ancestors().filter_map(ElementRef::wrap)
}

/// Question contexts in document order. Comments never contribute anchors.
pub(crate) fn parse_question_contexts(html: &str) -> Vec<QuestionContext> {
    let document = Html::parse_fragment(html);

    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| is_bold(element.value().name()))
        // Nested bold runs are read once, through the outermost one.
        .filter(|element| !ancestor_elements(*element).any(|a| is_bold(a.value().name())))
        .filter_map(|element| {
            let marker = classify(&element.text().collect::<String>())?;
            let block = ancestor_elements(element).find(|a| is_block(a.value().name()))?;
            Some((marker, collapse(&block.text().collect::<String>())))
        })
        .flat_map(|(marker, context)| expand(marker, context))
        .collect()
}

fn expand(marker: Marker, context: String) -> Vec<QuestionContext> {
    match marker {
        Marker::Numbered(number) => {
            vec![QuestionContext { number: Some(number), required_choices: 1, context }]
        }
        Marker::Choose(count) => (0..count)
            .map(|_| QuestionContext {
                number: None,
                required_choices: count,
                context: context.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_gaps_bind_to_their_paragraph() {
        let html = "<p>Name: <strong>1</strong> ________</p>\
                    <p>Phone: <b>2</b>&nbsp;____</p>";

        let contexts = parse_question_contexts(html);

        assert_eq!(
            contexts,
            vec![
                QuestionContext {
                    number: Some(1),
                    required_choices: 1,
                    context: "Name: 1 ________".to_string()
                },
                QuestionContext {
                    number: Some(2),
                    required_choices: 1,
                    context: "Phone: 2 ____".to_string()
                },
            ]
        );
    }

    #[test]
    fn choose_groups_expand_to_multiple_contexts() {
        let html = "<div>Choose <strong>TWO</strong> letters, A-E.</div>\
                    <p>Which <strong>THREE</strong> facilities?</p>";

        let contexts = parse_question_contexts(html);

        assert_eq!(contexts.len(), 5);
        assert!(contexts[..2].iter().all(|c| c.required_choices == 2 && c.number.is_none()));
        assert!(contexts[2..].iter().all(|c| c.required_choices == 3));
        assert_eq!(contexts[0].context, "Choose TWO letters, A-E.");
        assert_eq!(contexts[4].context, "Which THREE facilities?");
    }

    #[test]
    fn nested_block_wins_and_order_is_preserved() {
        let html = "<div>Table <table><tr><td>Cost: <b>3</b></td><td>Day: <b>4</b></td></tr></table>\
                    <strong>5</strong> after</div>";

        let contexts = parse_question_contexts(html);
        let numbers: Vec<_> = contexts.iter().map(|c| c.number).collect();

        assert_eq!(numbers, vec![Some(3), Some(4), Some(5)]);
        assert_eq!(contexts[0].context, "Cost: 3");
        assert_eq!(contexts[1].context, "Day: 4");
        assert!(contexts[2].context.starts_with("Table"));
        assert!(contexts[2].context.ends_with("5 after"));
    }

    #[test]
    fn unrelated_bold_and_orphans_are_ignored() {
        let html = "<strong>7</strong><p><strong>Note</strong> listen carefully</p>";

        assert!(parse_question_contexts(html).is_empty());
    }

    #[test]
    fn unclosed_blocks_still_resolve() {
        let contexts = parse_question_contexts("<p>Street: <strong>10</strong> Road");

        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].number, Some(10));
        assert_eq!(contexts[0].context, "Street: 10 Road");
    }

    #[test]
    fn conditional_comments_do_not_add_anchors() {
        let html = "<!--[if gte mso 9]><p>draft <b>9</b></p><![endif]-->\
                    <p>Name: <strong>1</strong></p>";

        let contexts = parse_question_contexts(html);

        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].number, Some(1));
        assert_eq!(contexts[0].context, "Name: 1");
    }

    #[test]
    fn quoted_attributes_and_entities_are_handled() {
        let html = "<p title=\"a>b\" class='gap'>Name: <strong>1</strong></p>\
                    <p>The visitor&rsquo;s pass &#8217; <b>2</b></p>";

        let contexts = parse_question_contexts(html);

        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].context, "Name: 1");
        assert_eq!(contexts[1].context, "The visitor\u{2019}s pass \u{2019} 2");
    }

    #[test]
    fn nested_bold_is_read_once() {
        let contexts = parse_question_contexts("<p>Date: <b><strong>6</strong></b></p>");

        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].number, Some(6));
    }
}
