use super::registry::{Rule, ValidationContext};
use super::selector::Selector;
use crate::heuristics::Candidate;
use crate::types::{ComplianceLevel, Element, PropertyValue, Severity, Violation};
use anyhow::Result;
use std::collections::BTreeMap;

pub const HEADING_HIERARCHY_START: &str = "heading-hierarchy-start";
pub const HEADING_HIERARCHY_SKIP: &str = "heading-hierarchy-skip";
pub const DUPLICATE_ID: &str = "duplicate-id";

/// Expression fragments that suggest a value comes from the active locale
const LOCALE_HINTS: &[&str] = &["locale", "lang", "language", "i18n", "intl"];

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::element(
            "fieldset-legend",
            "Fieldset legend",
            Severity::Warning,
            Selector::tag("fieldset"),
            validate_fieldset_legend,
        )
        .describe("Fieldsets should be captioned by a <legend> as their first child")
        .wcag(ComplianceLevel::A, "1.3.1"),
        Rule::element(
            "html-has-lang",
            "Document language",
            Severity::Error,
            Selector::tag("html"),
            validate_html_has_lang,
        )
        .describe("The <html> element must declare the page language")
        .wcag(ComplianceLevel::A, "3.1.1"),
        Rule::element(
            "html-lang-valid",
            "Valid document language",
            Severity::Error,
            Selector::tag("html").requires(&["lang"]),
            validate_html_lang,
        )
        .describe("The lang attribute must be a well-formed language tag such as \"en\" or \"pt-BR\"")
        .wcag(ComplianceLevel::A, "3.1.1"),
        Rule::multi_element(HEADING_HIERARCHY_START, "Heading hierarchy start", Severity::Warning)
            .describe("The first heading on the page should be a level-one heading")
            .wcag(ComplianceLevel::AA, "2.4.6"),
        Rule::multi_element(HEADING_HIERARCHY_SKIP, "Heading hierarchy skip", Severity::Warning)
            .describe("Heading levels should increase by one; do not skip levels")
            .wcag(ComplianceLevel::AA, "2.4.6"),
        Rule::multi_element(DUPLICATE_ID, "Unique ids", Severity::Error)
            .describe("id attribute values must be unique within a component")
            .wcag(ComplianceLevel::A, "4.1.1"),
    ]
}

// ===== SINGLE-ELEMENT CHECKS =====

fn validate_fieldset_legend(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    if ctx.element.element_children().any(|child| child.tag == "legend") {
        return Ok(None);
    }
    if ctx.context.has_explicit_label(ctx.element) {
        return Ok(Some(ctx.violation_with(
            Severity::Info,
            "Fieldset is labeled with ARIA instead of a <legend>",
        )));
    }
    Ok(Some(ctx.violation_with(ctx.severity(), "Fieldset has no <legend>")))
}

fn validate_html_has_lang(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let declared = ["lang", "xml:lang"].iter().any(|name| match ctx.element.property(name) {
        None | Some(PropertyValue::Undefined) => false,
        Some(PropertyValue::Expression { raw_value }) => !raw_value.trim().is_empty(),
        Some(other) => other.literal().is_some_and(|v| !v.trim().is_empty()),
    });
    if declared {
        return Ok(None);
    }
    Ok(Some(ctx.violation_with(
        ctx.severity(),
        "<html> element has no lang attribute",
    )))
}

fn validate_html_lang(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let Some(value) = ctx.element.property("lang") else {
        return Ok(None);
    };

    match value {
        PropertyValue::Expression { raw_value } => {
            let mut opaque = false;
            let mut invalid = Vec::new();
            for candidate in ctx.text.expressions().literal_candidates(raw_value) {
                match candidate {
                    Candidate::Literal(tag) if !is_valid_language_tag(&tag) => invalid.push(tag),
                    Candidate::Literal(_) => {}
                    Candidate::Opaque => opaque = true,
                }
            }
            if !invalid.is_empty() {
                return Ok(Some(ctx.violation_with(
                    ctx.severity(),
                    format!("Invalid lang value: {}", invalid.join(", ")),
                )));
            }
            if opaque && !looks_locale_derived(raw_value) {
                return Ok(Some(ctx.violation_with(
                    ctx.severity().demoted(),
                    format!("lang is set from `{}`, which cannot be verified", raw_value.trim()),
                )));
            }
            Ok(None)
        }
        other => {
            let Some(lang) = other.literal() else {
                return Ok(None);
            };
            // empty values are reported by html-has-lang
            if lang.trim().is_empty() || is_valid_language_tag(&lang) {
                return Ok(None);
            }
            Ok(Some(ctx.violation_with(
                ctx.severity(),
                format!("Invalid lang value: {lang}"),
            )))
        }
    }
}

/// Shape check: a 2-3 letter primary subtag followed by 2-8 character
/// alphanumeric subtags (`en`, `en-US`, `zh-Hant-TW`).
pub fn is_valid_language_tag(tag: &str) -> bool {
    let mut subtags = tag.trim().split('-');
    let primary_ok = subtags
        .next()
        .is_some_and(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()));
    primary_ok
        && subtags.all(|s| (2..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn looks_locale_derived(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    LOCALE_HINTS.iter().any(|hint| lower.contains(hint))
}

// ===== MULTI-ELEMENT CHECKS =====

/// Heading level from `h1`-`h6`, or from `role="heading"` with a static
/// numeric `aria-level`.
pub fn heading_level(element: &Element) -> Option<u8> {
    let tag = element.tag.as_str();
    if let Some(digit) = tag.strip_prefix('h') {
        if let Ok(level @ 1..=6) = digit.parse::<u8>() {
            return Some(level);
        }
    }
    if element.get_literal("role").is_some_and(|r| r.trim() == "heading") {
        return element
            .get_literal("aria-level")
            .and_then(|level| level.trim().parse::<u8>().ok())
            .filter(|level| *level >= 1);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingIssueKind {
    /// First heading is not level one
    Start,
    /// Level jumps more than one step past the previous heading
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingIssue {
    pub kind: HeadingIssueKind,
    pub index: usize,
    pub level: u8,
    pub previous: Option<u8>,
}

/// Walk headings in document order, independent of nesting depth.
pub fn heading_issues(elements: &[&Element]) -> Vec<HeadingIssue> {
    let mut issues = Vec::new();
    let mut previous: Option<u8> = None;

    for (index, element) in elements.iter().enumerate() {
        let Some(level) = heading_level(element) else {
            continue;
        };
        match previous {
            None if level != 1 => issues.push(HeadingIssue {
                kind: HeadingIssueKind::Start,
                index,
                level,
                previous,
            }),
            Some(prev) if level > prev.saturating_add(1) => issues.push(HeadingIssue {
                kind: HeadingIssueKind::Skip,
                index,
                level,
                previous,
            }),
            _ => {}
        }
        previous = Some(level);
    }
    issues
}

pub fn heading_violations(rule: &Rule, elements: &[&Element], kind: HeadingIssueKind) -> Vec<Violation> {
    heading_issues(elements)
        .into_iter()
        .filter(|issue| issue.kind == kind)
        .map(|issue| {
            let message = match (issue.kind, issue.previous) {
                (HeadingIssueKind::Skip, Some(prev)) => format!(
                    "Heading level {} follows level {}; expected level {} or lower",
                    issue.level,
                    prev,
                    prev.saturating_add(1)
                ),
                _ => format!(
                    "First heading is level {}; the page should start with a level-one heading",
                    issue.level
                ),
            };
            rule.violation(message, elements[issue.index], issue.index)
        })
        .collect()
}

pub fn duplicate_id_violations(rule: &Rule, elements: &[&Element]) -> Vec<Violation> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, element) in elements.iter().enumerate() {
        if let Some(id) = element.get_literal("id") {
            let id = id.trim();
            if !id.is_empty() {
                groups.entry(id.to_string()).or_default().push(index);
            }
        }
    }

    let mut violations: Vec<Violation> = groups
        .iter()
        .filter(|(_, members)| members.len() > 1)
        .flat_map(|(id, members)| {
            let total = members.len();
            members.iter().enumerate().map(move |(occurrence, &index)| {
                rule.violation(
                    format!(
                        "Duplicate id \"{id}\" (occurrence {} of {total})",
                        occurrence + 1
                    ),
                    elements[index],
                    index,
                )
            })
        })
        .collect();
    violations.sort_by_key(|v| v.element_index);
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::check;

    fn headings(tags: &[&str]) -> Vec<Element> {
        vec![tags
            .iter()
            .fold(Element::new("main"), |main, tag| main.with_child(Element::new(tag)))]
    }

    #[test]
    fn heading_cases() {
        assert_eq!(check(HEADING_HIERARCHY_SKIP, headings(&["h1", "h3"])).len(), 1);
        assert!(check(HEADING_HIERARCHY_START, headings(&["h1", "h3"])).is_empty());

        assert_eq!(check(HEADING_HIERARCHY_START, headings(&["h2"])).len(), 1);
        assert!(check(HEADING_HIERARCHY_SKIP, headings(&["h2"])).is_empty());

        assert!(check(HEADING_HIERARCHY_START, headings(&["h1", "h2", "h3"])).is_empty());
        assert!(check(HEADING_HIERARCHY_SKIP, headings(&["h1", "h2", "h3"])).is_empty());
    }

    #[test]
    fn going_back_up_is_fine() {
        assert!(check(HEADING_HIERARCHY_SKIP, headings(&["h1", "h2", "h3", "h2", "h3", "h1"])).is_empty());
    }

    #[test]
    fn nesting_depth_is_ignored() {
        let tree = vec![Element::new("div")
            .with_child(Element::new("section").with_child(Element::new("h1")))
            .with_child(Element::new("h4"))];
        let violations = check(HEADING_HIERARCHY_SKIP, tree);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].element_tag, "h4");
    }

    #[test]
    fn role_headings_participate() {
        let tree = vec![Element::new("div")
            .with_child(Element::new("h1"))
            .with_child(
                Element::new("div")
                    .with_attr("role", "heading")
                    .with_attr("aria-level", "3"),
            )];
        assert_eq!(check(HEADING_HIERARCHY_SKIP, tree).len(), 1);
        assert_eq!(heading_level(&Element::new("header")), None);
        assert_eq!(heading_level(&Element::new("h7")), None);
    }

    #[test]
    fn duplicate_ids_name_each_occurrence() {
        let tree = vec![Element::new("div")
            .with_child(Element::new("span").with_attr("id", "x"))
            .with_child(Element::new("p").with_attr("id", "y"))
            .with_child(Element::new("span").with_attr("id", "x"))
            .with_child(Element::new("div").with_expr("id", "itemId"))
            .with_child(Element::new("div").with_expr("id", "itemId"))];
        let violations = check(DUPLICATE_ID, tree);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].message.contains("occurrence 1 of 2"));
        assert!(violations[1].message.contains("occurrence 2 of 2"));
        assert!(violations.iter().all(|v| v.severity == Severity::Error));
    }

    #[test]
    fn fieldset_legend() {
        let tree = vec![
            Element::new("fieldset").with_child(Element::new("legend")),
            Element::new("fieldset"),
            Element::new("fieldset").with_attr("aria-labelledby", "shipping-title"),
        ];
        let violations = check("fieldset-legend", tree);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!(violations[1].severity, Severity::Info);
    }

    #[test]
    fn html_lang() {
        assert_eq!(check("html-has-lang", vec![Element::new("html")]).len(), 1);
        assert_eq!(check("html-has-lang", vec![Element::new("html").with_attr("lang", " ")]).len(), 1);
        assert!(check("html-has-lang", vec![Element::new("html").with_attr("lang", "en")]).is_empty());

        assert!(check("html-lang-valid", vec![Element::new("html").with_attr("lang", "pt-BR")]).is_empty());
        assert_eq!(check("html-lang-valid", vec![Element::new("html").with_attr("lang", "english")]).len(), 1);
        assert!(check("html-lang-valid", vec![Element::new("html").with_expr("lang", "locale.code")]).is_empty());
        assert!(check("html-lang-valid", vec![Element::new("html").with_expr("lang", "rtl ? 'ar' : 'en'")]).is_empty());

        let unknown = check("html-lang-valid", vec![Element::new("html").with_expr("lang", "settings.value")]);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].severity, Severity::Warning);
    }

    #[test]
    fn language_tag_shape() {
        assert!(is_valid_language_tag("en"));
        assert!(is_valid_language_tag("zh-Hant-TW"));
        assert!(is_valid_language_tag("es-419"));
        assert!(!is_valid_language_tag("e"));
        assert!(!is_valid_language_tag("en_US"));
        assert!(!is_valid_language_tag("en-"));
    }
}
