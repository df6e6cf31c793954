use super::registry::{Rule, ValidationContext};
use super::selector::Selector;
use crate::heuristics::Candidate;
use crate::types::{ComplianceLevel, Element, PropertyValue, Severity, Violation};
use anyhow::Result;

/// Concrete WAI-ARIA roles authors may use
pub const VALID_ARIA_ROLES: &[&str] = &[
    // widget
    "alert", "alertdialog", "button", "checkbox", "dialog", "gridcell", "link", "log", "marquee",
    "menuitem", "menuitemcheckbox", "menuitemradio", "option", "progressbar", "radio",
    "scrollbar", "searchbox", "slider", "spinbutton", "status", "switch", "tab", "tabpanel",
    "textbox", "timer", "tooltip", "treeitem",
    // composite
    "combobox", "grid", "listbox", "menu", "menubar", "radiogroup", "tablist", "tree",
    "treegrid",
    // document structure
    "application", "article", "blockquote", "caption", "cell", "code", "columnheader",
    "definition", "deletion", "directory", "document", "emphasis", "feed", "figure", "generic",
    "group", "heading", "img", "insertion", "list", "listitem", "math", "meter", "none", "note",
    "paragraph", "presentation", "row", "rowgroup", "rowheader", "separator", "strong",
    "subscript", "superscript", "table", "term", "time", "toolbar",
    // landmarks
    "banner", "complementary", "contentinfo", "form", "main", "navigation", "region", "search",
    // ARIA 1.3
    "comment", "mark", "suggestion",
];

const BOOLEAN: &[&str] = &["true", "false"];
const TRISTATE: &[&str] = &["true", "false", "mixed"];
const BOOLEAN_OR_UNDEFINED: &[&str] = &["true", "false", "undefined"];

/// Enumerated ARIA attributes and the values they accept
pub const ARIA_ATTRIBUTE_VALUES: &[(&str, &[&str])] = &[
    ("aria-atomic", BOOLEAN),
    ("aria-autocomplete", &["inline", "list", "both", "none"]),
    ("aria-busy", BOOLEAN),
    ("aria-checked", TRISTATE),
    (
        "aria-current",
        &["page", "step", "location", "date", "time", "true", "false"],
    ),
    ("aria-disabled", BOOLEAN),
    ("aria-expanded", BOOLEAN_OR_UNDEFINED),
    (
        "aria-haspopup",
        &["false", "true", "menu", "listbox", "tree", "grid", "dialog"],
    ),
    ("aria-hidden", BOOLEAN_OR_UNDEFINED),
    ("aria-invalid", &["grammar", "false", "spelling", "true"]),
    ("aria-live", &["assertive", "off", "polite"]),
    ("aria-modal", BOOLEAN),
    ("aria-multiline", BOOLEAN),
    ("aria-multiselectable", BOOLEAN),
    (
        "aria-orientation",
        &["horizontal", "undefined", "vertical"],
    ),
    ("aria-pressed", TRISTATE),
    ("aria-readonly", BOOLEAN),
    ("aria-relevant", &["additions", "all", "removals", "text"]),
    ("aria-required", BOOLEAN),
    ("aria-selected", BOOLEAN_OR_UNDEFINED),
    ("aria-sort", &["ascending", "descending", "none", "other"]),
];

/// Space-separated token lists
const TOKEN_LIST_ATTRIBUTES: &[&str] = &["aria-relevant"];

const FOCUSABLE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::element(
            "aria-role",
            "Valid ARIA role",
            Severity::Error,
            Selector::any().requires(&["role"]),
            validate_role,
        )
        .describe("ARIA role values must be valid, non-abstract roles")
        .wcag(ComplianceLevel::A, "4.1.2"),
        Rule::element(
            "aria-valid-attr-value",
            "Valid ARIA attribute value",
            Severity::Error,
            Selector::any().when(has_enumerated_aria_attribute),
            validate_attribute_values,
        )
        .describe("Enumerated ARIA attributes must use one of their allowed values")
        .wcag(ComplianceLevel::A, "4.1.2"),
        Rule::element(
            "aria-hidden-focusable",
            "Focusable content hidden from assistive technology",
            Severity::Warning,
            Selector::any().requires(&["aria-hidden"]).when(is_focusable),
            validate_hidden_focusable,
        )
        .describe("Elements with aria-hidden=\"true\" must not be keyboard focusable")
        .wcag(ComplianceLevel::A, "4.1.2"),
    ]
}

pub fn is_valid_role(role: &str) -> bool {
    VALID_ARIA_ROLES.contains(&role)
}

/// Every role token the property can take. Expression branches are expanded;
/// branches that are not literals cannot be checked and are skipped.
fn role_tokens(ctx: &ValidationContext<'_>, value: &PropertyValue) -> Vec<String> {
    let literals: Vec<String> = match value {
        PropertyValue::Expression { raw_value } => ctx
            .text
            .expressions()
            .literal_candidates(raw_value)
            .into_iter()
            .filter_map(|candidate| match candidate {
                Candidate::Literal(text) => Some(text),
                Candidate::Opaque => None,
            })
            .collect(),
        other => other.literal().into_iter().collect(),
    };

    literals
        .iter()
        .flat_map(|text| text.split_whitespace())
        .map(str::to_lowercase)
        .collect()
}

fn validate_role(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let Some(value) = ctx.element.property("role") else {
        return Ok(None);
    };

    let mut invalid: Vec<String> = Vec::new();
    for token in role_tokens(ctx, value) {
        if !is_valid_role(&token) && !invalid.contains(&token) {
            invalid.push(token);
        }
    }

    if invalid.is_empty() {
        return Ok(None);
    }
    Ok(Some(ctx.violation_with(
        ctx.severity(),
        format!("Invalid ARIA role: {}", invalid.join(", ")),
    )))
}

fn allowed_values(attribute: &str) -> Option<&'static [&'static str]> {
    ARIA_ATTRIBUTE_VALUES
        .iter()
        .find(|(name, _)| *name == attribute)
        .map(|(_, values)| *values)
}

fn has_enumerated_aria_attribute(element: &Element) -> bool {
    element
        .properties
        .keys()
        .any(|name| allowed_values(name).is_some())
}

fn is_allowed(attribute: &str, value: &str, allowed: &[&str]) -> bool {
    let value = value.trim().to_lowercase();
    if TOKEN_LIST_ATTRIBUTES.contains(&attribute) {
        let mut tokens = value.split_whitespace().peekable();
        tokens.peek().is_some() && tokens.all(|token| allowed.contains(&token))
    } else {
        allowed.contains(&value.as_str())
    }
}

/// Values that can be checked statically. Identifiers, boolean
/// expressions and member access are unknown and pass.
fn checkable_values(ctx: &ValidationContext<'_>, value: &PropertyValue) -> Vec<String> {
    match value {
        PropertyValue::Expression { raw_value } => ctx
            .text
            .expressions()
            .literal_candidates(raw_value)
            .into_iter()
            .filter_map(|candidate| match candidate {
                Candidate::Literal(text) => Some(text),
                Candidate::Opaque => None,
            })
            .collect(),
        PropertyValue::Undefined => Vec::new(),
        other => other.literal().into_iter().collect(),
    }
}

fn validate_attribute_values(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let mut problems = Vec::new();
    for (attribute, value) in &ctx.element.properties {
        let Some(allowed) = allowed_values(attribute) else {
            continue;
        };
        for candidate in checkable_values(ctx, value) {
            if !is_allowed(attribute, &candidate, allowed) {
                problems.push(format!(
                    "{attribute}=\"{candidate}\" (expected one of: {})",
                    allowed.join(", ")
                ));
            }
        }
    }

    if problems.is_empty() {
        return Ok(None);
    }
    Ok(Some(ctx.violation_with(
        ctx.severity(),
        format!("Invalid ARIA attribute value: {}", problems.join("; ")),
    )))
}

fn is_focusable(element: &Element) -> bool {
    let tabindex = element.get_literal("tabindex").or_else(|| element.get_literal("tabIndex"));
    if let Some(tabindex) = tabindex {
        return tabindex.trim().parse::<i64>().map_or(false, |t| t >= 0);
    }
    if element.has_property("disabled") {
        return false;
    }
    match element.tag.as_str() {
        "a" => element.has_any_property(&["href", "to"]),
        "input" => !element
            .get_literal("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden")),
        tag => FOCUSABLE_TAGS.contains(&tag),
    }
}

fn validate_hidden_focusable(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let hidden = ctx
        .element
        .get_literal("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
    if !hidden {
        return Ok(None);
    }
    Ok(Some(ctx.violation(format!(
        "Focusable <{}> is hidden with aria-hidden=\"true\"; add tabindex=\"-1\" or remove it from the tab order",
        ctx.element.tag
    ))))
}
