//! Labeling and association semantics that need more than one element.

use crate::config::HeuristicsConfig;
use crate::heuristics::text::{class_tokens, TextExtractor};
use crate::types::{Element, PropertyValue, Severity};
use anyhow::Result;
use regex::Regex;

/// Input types that never need a label
pub const EXEMPT_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];

/// Component props that usually forward a label to the rendered control
const PASS_THROUGH_LABEL_PROPS: &[&str] = &[
    "label",
    "labelText",
    "description",
    "hint",
    "helperText",
    "helpText",
];

const HIDDEN_CLASSES: &[&str] = &["hidden", "d-none", "invisible", "is-hidden"];

/// Explicit labels: the only thing that satisfies an icon-only control
const EXPLICIT_LABEL_PROPS: &[&str] = &["aria-label", "aria-labelledby", "title"];

/// How a form control got (or failed to get) its label. Variants are listed
/// in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelResolution {
    Exempt,
    Hidden,
    AriaLabel,
    AssociatedLabel,
    /// Weak signal: suppresses the error, but callers should still warn
    Placeholder,
    PassThrough,
    Unlabeled,
}

impl LabelResolution {
    pub fn is_labeled(self) -> bool {
        self != LabelResolution::Unlabeled
    }
}

pub struct ContextAnalyzer {
    icon_classes: Vec<Regex>,
    icon_invocation: Regex,
    hidden_style: Regex,
}

impl ContextAnalyzer {
    pub fn new(config: &HeuristicsConfig) -> Result<Self> {
        let mut icon_classes = vec![Regex::new(
            r"^(?:fa[srbl]?|fa-[\w-]+|bi|bi-[\w-]+|glyphicon(?:-[\w-]+)?|material-icons(?:-[\w-]+)?|material-symbols(?:-[\w-]+)?|icon|icon-[\w-]+|mdi|mdi-[\w-]+|ti|ti-[\w-]+)$",
        )?];
        for pattern in &config.icon_class_patterns {
            icon_classes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            icon_classes,
            icon_invocation: Regex::new(
                r"(?i)<\s*[\w.]*IconButton\b|\bicon\s*=\s*\{\s*<|\bicon-only\b|\biconOnly\b",
            )?,
            hidden_style: Regex::new(
                r#"(?i)display\s*:\s*['"]?none|visibility\s*:\s*['"]?hidden"#,
            )?,
        })
    }

    /// Resolve a form control's label against every element of its component.
    pub fn resolve_label(
        &self,
        control: &Element,
        elements: &[&Element],
        text: &TextExtractor,
    ) -> LabelResolution {
        if self.is_exempt_control(control) {
            return LabelResolution::Exempt;
        }
        if self.is_hidden(control) {
            return LabelResolution::Hidden;
        }
        if text.aria_text(control).is_likely() {
            return LabelResolution::AriaLabel;
        }
        if self.has_associated_label(control, elements) {
            return LabelResolution::AssociatedLabel;
        }
        if control
            .get_string_value("placeholder")
            .is_some_and(|p| !p.trim().is_empty())
        {
            return LabelResolution::Placeholder;
        }
        if control.has_any_property(PASS_THROUGH_LABEL_PROPS) {
            return LabelResolution::PassThrough;
        }
        LabelResolution::Unlabeled
    }

    fn is_exempt_control(&self, control: &Element) -> bool {
        control.tag == "input"
            && control
                .get_literal("type")
                .is_some_and(|t| EXEMPT_INPUT_TYPES.contains(&t.to_lowercase().as_str()))
    }

    /// Hidden via type, ARIA, the `hidden` attribute, a class, or inline style.
    pub fn is_hidden(&self, element: &Element) -> bool {
        if element
            .get_literal("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        {
            return true;
        }
        if element
            .get_literal("aria-hidden")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return true;
        }
        match element.property("hidden") {
            Some(PropertyValue::Boolean { value: false }) => {}
            Some(PropertyValue::String { value }) if value.eq_ignore_ascii_case("false") => {}
            Some(PropertyValue::Expression { .. }) | None => {}
            Some(_) => return true,
        }
        if class_tokens(element).any(|token| HIDDEN_CLASSES.contains(&token)) {
            return true;
        }
        element
            .get_string_value("style")
            .is_some_and(|style| self.hidden_style.is_match(&style))
    }

    /// A `<label>` whose `for`/`htmlFor` names the control's id, or one that
    /// wraps the control.
    pub fn has_associated_label(&self, control: &Element, elements: &[&Element]) -> bool {
        let id = control.get_string_value("id").filter(|id| !id.is_empty());
        elements.iter().filter(|e| e.tag == "label").any(|label| {
            let target = label
                .get_string_value("htmlFor")
                .or_else(|| label.get_string_value("for"));
            let by_reference = matches!((&id, &target), (Some(id), Some(target)) if id == target);
            by_reference || label.contains(control)
        })
    }

    /// Spread props (`{...props}`) may carry accessibility attributes at runtime.
    pub fn has_spread_props(&self, element: &Element) -> bool {
        element.properties.keys().any(|name| name.starts_with("..."))
    }

    /// Base severity when there is no mitigating evidence, one step lower when
    /// spread props could supply the missing attribute.
    pub fn determine_severity(&self, base: Severity, element: &Element) -> Severity {
        if self.has_spread_props(element) {
            base.demoted()
        } else {
            base
        }
    }

    pub fn has_explicit_label(&self, element: &Element) -> bool {
        EXPLICIT_LABEL_PROPS.iter().any(|name| {
            element
                .get_string_value(name)
                .is_some_and(|value| !value.trim().is_empty())
        })
    }

    pub fn is_icon_class(&self, element: &Element) -> bool {
        class_tokens(element).any(|token| self.icon_classes.iter().any(|re| re.is_match(token)))
    }

    /// Icon-like child: decorative, an icon-class element, or a bare `<i>`.
    fn is_icon_like(&self, element: &Element, text: &TextExtractor) -> bool {
        text.is_decorative(element)
            || self.is_icon_class(element)
            || (element.tag == "i" && text.content_text(element).is_empty())
    }

    /// Renders nothing but an icon. Elements with static text never qualify.
    pub fn is_icon_only(&self, element: &Element, text: &TextExtractor) -> bool {
        if !text.content_text(element).is_empty() {
            return false;
        }
        if element.children.iter().any(|c| c.is_expression_node()) {
            return false;
        }

        let mut children = element.element_children().peekable();
        if children.peek().is_some() && children.all(|child| self.is_icon_like(child, text)) {
            return true;
        }
        if self.is_icon_class(element) {
            return true;
        }
        element
            .source_context
            .as_deref()
            .is_some_and(|source| self.icon_invocation.is_match(source))
    }
}
