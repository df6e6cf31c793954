use super::expression::ExpressionResolver;
use crate::config::HeuristicsConfig;
use crate::types::{Element, PropertyValue};
use anyhow::Result;

/// ARIA labeling properties, in resolution order
pub const ARIA_TEXT_PROPERTIES: &[&str] = &[
    "aria-label",
    "aria-labelledby",
    "aria-describedby",
    "aria-description",
    "title",
];

/// Properties that commonly carry an element's visible content
const TEXT_BEARING_PROPERTIES: &[&str] = &["children", "label", "text", "content"];

const DECORATIVE_TAGS: &[&str] = &["svg", "icon", "loader", "spinner"];

/// Suffixes that mark an icon or spinner component (`SearchIcon`,
/// `LoadingSpinner`). `loader` is left out: `Uploader` and `Downloader` are
/// interactive widgets.
const DECORATIVE_COMPONENT_SUFFIXES: &[&str] = &["icon", "spinner"];

/// Ordinary words that happen to end in a decorative suffix
const NON_DECORATIVE_WORDS: &[&str] = &["lexicon", "silicon", "rubicon"];

/// Three-valued answer to "would assistive technology announce text here?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessibleText {
    /// No text could be found or inferred
    Absent,
    /// Text is very likely present at runtime, content unknown
    Inferred,
    /// Text resolved statically
    Confirmed(String),
}

impl AccessibleText {
    /// Confirmed text, or `Absent` when the text is blank.
    pub fn confirmed(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            AccessibleText::Absent
        } else {
            AccessibleText::Confirmed(trimmed.to_string())
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AccessibleText::Absent)
    }

    /// Only statically resolved text counts
    pub fn is_confirmed(&self) -> bool {
        matches!(self, AccessibleText::Confirmed(_))
    }

    /// Confirmed or inferred text
    pub fn is_likely(&self) -> bool {
        !self.is_absent()
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            AccessibleText::Confirmed(text) => Some(text),
            AccessibleText::Absent | AccessibleText::Inferred => None,
        }
    }
}

/// Resolves accessible text from ARIA properties, static content and
/// embedded expressions, first success wins.
pub struct TextExtractor {
    expressions: ExpressionResolver,
    screen_reader_classes: Vec<String>,
}

impl TextExtractor {
    pub fn new(config: &HeuristicsConfig) -> Result<Self> {
        Ok(Self {
            expressions: ExpressionResolver::new(config)?,
            screen_reader_classes: config.screen_reader_classes.clone(),
        })
    }

    pub fn expressions(&self) -> &ExpressionResolver {
        &self.expressions
    }

    pub fn accessible_text(&self, element: &Element) -> AccessibleText {
        let aria = self.aria_text(element);
        if aria.is_confirmed() {
            return aria;
        }

        let content = self.content_text(element);
        if !content.is_empty() {
            return AccessibleText::confirmed(content);
        }

        let dynamic = self.expression_text(element);
        if dynamic.is_confirmed() {
            return dynamic;
        }

        if aria.is_likely() || dynamic.is_likely() {
            AccessibleText::Inferred
        } else {
            AccessibleText::Absent
        }
    }

    pub fn has_accessible_text(&self, element: &Element) -> bool {
        self.accessible_text(element).is_confirmed()
    }

    pub fn likely_has_accessible_text(&self, element: &Element) -> bool {
        self.accessible_text(element).is_likely()
    }

    /// Text from ARIA labeling properties only.
    pub fn aria_text(&self, element: &Element) -> AccessibleText {
        let mut inferred = false;
        for name in ARIA_TEXT_PROPERTIES {
            match self.resolve_property(element.property(name)) {
                AccessibleText::Confirmed(text) => return AccessibleText::Confirmed(text),
                AccessibleText::Inferred => inferred = true,
                AccessibleText::Absent => {}
            }
        }
        if inferred {
            AccessibleText::Inferred
        } else {
            AccessibleText::Absent
        }
    }

    /// Static text of the element and its non-decorative descendants,
    /// whitespace-normalized.
    pub fn content_text(&self, element: &Element) -> String {
        let mut parts = Vec::new();
        if let Some(text) = &element.text {
            parts.push(text.clone());
        }
        for child in &element.children {
            self.collect_text(child, &mut parts);
        }
        normalize_whitespace(&parts.join(" "))
    }

    fn collect_text(&self, element: &Element, parts: &mut Vec<String>) {
        if element.is_text_node() {
            if let Some(text) = &element.text {
                parts.push(text.clone());
            }
            return;
        }
        if element.is_expression_node() || self.is_excluded(element) {
            return;
        }
        if element.tag == "img" {
            if let Some(alt) = element.get_literal("alt") {
                parts.push(alt);
            }
            return;
        }
        if let Some(label) = element.get_literal("aria-label") {
            parts.push(label);
            return;
        }
        if let Some(text) = &element.text {
            parts.push(text.clone());
        }
        for child in &element.children {
            self.collect_text(child, parts);
        }
    }

    /// Best result from embedded expression children and text-bearing props.
    fn expression_text(&self, element: &Element) -> AccessibleText {
        let mut inferred = false;
        let mut consider = |result: AccessibleText| -> Option<AccessibleText> {
            match result {
                AccessibleText::Confirmed(_) => Some(result),
                AccessibleText::Inferred => {
                    inferred = true;
                    None
                }
                AccessibleText::Absent => None,
            }
        };

        for name in TEXT_BEARING_PROPERTIES {
            if let Some(found) = consider(self.resolve_property(element.property(name))) {
                return found;
            }
        }

        let mut sources = Vec::new();
        self.collect_expressions(element, &mut sources);
        for raw in sources {
            if let Some(found) = consider(self.expressions.resolve(raw)) {
                return found;
            }
        }

        if inferred {
            AccessibleText::Inferred
        } else {
            AccessibleText::Absent
        }
    }

    fn collect_expressions<'a>(&self, element: &'a Element, out: &mut Vec<&'a str>) {
        for child in &element.children {
            if let Some(raw) = child.expression_source() {
                out.push(raw);
            } else if !child.is_text_node() && !self.is_excluded(child) {
                self.collect_expressions(child, out);
            }
        }
    }

    fn resolve_property(&self, value: Option<&PropertyValue>) -> AccessibleText {
        match value {
            Some(PropertyValue::Expression { raw_value }) => self.expressions.resolve(raw_value),
            Some(other) => other
                .literal()
                .map(AccessibleText::confirmed)
                .unwrap_or(AccessibleText::Absent),
            None => AccessibleText::Absent,
        }
    }

    fn is_excluded(&self, element: &Element) -> bool {
        !self.is_screen_reader_only(element) && self.is_decorative(element)
    }

    /// Structurally non-text: hidden from assistive technology, presentational,
    /// a decorative tag, or an image with empty alt.
    pub fn is_decorative(&self, element: &Element) -> bool {
        if element
            .get_literal("aria-hidden")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return true;
        }
        if element
            .get_literal("role")
            .is_some_and(|role| matches!(role.trim(), "presentation" | "none"))
        {
            return true;
        }
        if is_decorative_tag(&element.tag) {
            return true;
        }
        element.tag == "img" && element.get_literal("alt").is_some_and(|alt| alt.trim().is_empty())
    }

    /// Visually hidden but still announced
    pub fn is_screen_reader_only(&self, element: &Element) -> bool {
        class_tokens(element).any(|token| {
            self.screen_reader_classes
                .iter()
                .any(|class| class == token)
        })
    }
}

/// `svg`, `icon`, `loader`, `spinner`; a namespaced or hyphenated form of
/// one (`mdi-icon`, `page-loader`); or an icon/spinner component name
/// (`SearchIcon` arrives lowercased as `searchicon`).
pub fn is_decorative_tag(tag: &str) -> bool {
    if DECORATIVE_TAGS.contains(&tag) {
        return true;
    }
    let separated = DECORATIVE_TAGS.iter().any(|decorative| {
        tag.strip_suffix(decorative)
            .is_some_and(|stem| stem.ends_with(['-', '_', '.', ':']))
    });
    if separated {
        return true;
    }
    !NON_DECORATIVE_WORDS.contains(&tag)
        && DECORATIVE_COMPONENT_SUFFIXES
            .iter()
            .any(|suffix| tag.len() > suffix.len() && tag.ends_with(suffix))
}

/// Static class tokens from `class` or `className`.
pub fn class_tokens(element: &Element) -> impl Iterator<Item = &str> {
    ["class", "className", "classname"]
        .into_iter()
        .filter_map(|name| match element.property(name) {
            Some(PropertyValue::String { value }) => Some(value.as_str()),
            _ => None,
        })
        .flat_map(str::split_whitespace)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
