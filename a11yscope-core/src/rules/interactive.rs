use super::registry::{Rule, ValidationContext};
use super::selector::Selector;
use crate::heuristics::AccessibleText;
use crate::types::{ComplianceLevel, Element, Severity, Violation};
use anyhow::Result;

/// Link text that makes no sense out of context
pub const GENERIC_LINK_TEXT: &[&str] = &[
    "click here",
    "click",
    "here",
    "read more",
    "more",
    "learn more",
    "link",
    "this link",
    "details",
];

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::element(
            "button-text",
            "Button accessible name",
            Severity::Error,
            Selector::any().when(is_button),
            validate_button_text,
        )
        .describe("Buttons must have discernible text; icon-only buttons need an explicit label")
        .wcag(ComplianceLevel::A, "4.1.2"),
        Rule::element(
            "link-text",
            "Link accessible name",
            Severity::Error,
            Selector::tag("a").any_of(&["href", "to"]),
            validate_link_text,
        )
        .describe("Links must have discernible text; icon-only links need an explicit label")
        .wcag(ComplianceLevel::A, "2.4.4"),
        Rule::element(
            "link-text-meaningful",
            "Link purpose",
            Severity::Warning,
            Selector::tag("a").any_of(&["href", "to"]),
            validate_link_purpose,
        )
        .describe("Link text should describe its destination on its own")
        .wcag(ComplianceLevel::AAA, "2.4.9"),
    ]
}

fn is_button(element: &Element) -> bool {
    element.tag == "button"
        || element
            .get_literal("role")
            .is_some_and(|role| role.trim() == "button")
}

/// Shared by buttons and links. Icon-only controls need an explicit label;
/// everything else passes on confirmed or inferred text.
fn validate_accessible_name(ctx: &ValidationContext<'_>, noun: &str) -> Result<Option<Violation>> {
    let element = ctx.element;
    if ctx.context.is_icon_only(element, ctx.text) {
        if ctx.context.has_explicit_label(element) {
            return Ok(None);
        }
        return Ok(Some(ctx.violation_with(
            ctx.severity(),
            format!("Icon-only {noun} needs aria-label, aria-labelledby or title"),
        )));
    }

    match ctx.text.accessible_text(element) {
        AccessibleText::Confirmed(_) | AccessibleText::Inferred => Ok(None),
        AccessibleText::Absent => Ok(Some(ctx.violation_with(
            ctx.severity(),
            format!("{noun} has no accessible text"),
        ))),
    }
}

fn validate_button_text(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    validate_accessible_name(ctx, "button")
}

fn validate_link_text(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    validate_accessible_name(ctx, "link")
}

fn validate_link_purpose(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let AccessibleText::Confirmed(text) = ctx.text.accessible_text(ctx.element) else {
        return Ok(None);
    };
    let normalized = text
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c == '…')
        .to_lowercase();
    if GENERIC_LINK_TEXT.contains(&normalized.as_str()) {
        return Ok(Some(ctx.violation(format!(
            "Link text \"{text}\" does not describe the destination"
        ))));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::check;

    #[test]
    fn aria_label_names_an_empty_button() {
        let tree = vec![Element::new("button").with_attr("aria-label", "Submit")];
        assert!(check("button-text", tree).is_empty());
    }

    #[test]
    fn icon_only_button_without_label() {
        let tree = vec![Element::new("button").with_child(Element::new("svg"))];
        let violations = check("button-text", tree);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Error);
        assert!(violations[0].message.starts_with("Icon-only"));
    }

    #[test]
    fn icon_only_button_with_title() {
        let tree = vec![Element::new("button")
            .with_attr("title", "Close")
            .with_child(Element::new("i").with_attr("class", "fa fa-times"))];
        assert!(check("button-text", tree).is_empty());
    }

    #[test]
    fn inferred_text_suppresses_the_error() {
        let tree = vec![
            Element::new("button").with_child(Element::expression_node("t('save')")),
            Element::new("button").with_child(Element::expression_node("props.children")),
        ];
        assert!(check("button-text", tree).is_empty());
    }

    #[test]
    fn role_button_is_checked() {
        let tree = vec![Element::new("div").with_attr("role", "button")];
        assert_eq!(check("button-text", tree).len(), 1);
    }

    #[test]
    fn empty_link_and_link_without_href() {
        let tree = vec![
            Element::new("a").with_attr("href", "/home"),
            Element::new("a").with_attr("name", "anchor"),
            Element::new("a")
                .with_attr("to", "/about")
                .with_child(Element::text_node("About us")),
        ];
        let violations = check("link-text", tree);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].element_index, 0);
    }

    #[test]
    fn generic_link_text() {
        let tree = vec![
            Element::new("a")
                .with_attr("href", "/docs")
                .with_child(Element::text_node("Read more…")),
            Element::new("a")
                .with_attr("href", "/pricing")
                .with_child(Element::text_node("See pricing plans")),
        ];
        let violations = check("link-text-meaningful", tree);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
    }
}
