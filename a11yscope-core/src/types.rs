use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ===== ELEMENT MODEL =====
// Elements arrive from an upstream markup parser. The engine never re-parses
// source text beyond the bounded heuristics in `heuristics` and `context`.

/// Tag used for static text children.
pub const TEXT_NODE_TAG: &str = "#text";
/// Tag used for embedded dynamic expressions (`{expr}` children).
pub const EXPRESSION_NODE_TAG: &str = "#expression";
/// Property on an expression node holding its raw source.
pub const EXPRESSION_PROPERTY: &str = "expression";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// Typed property value. `Expression` keeps the unevaluated source since its
/// runtime value is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyValue {
    String { value: String },
    Number { value: f64 },
    Boolean { value: bool },
    Expression { raw_value: String },
    Undefined,
}

impl PropertyValue {
    pub fn string(value: impl Into<String>) -> Self {
        PropertyValue::String {
            value: value.into(),
        }
    }

    pub fn expression(raw_value: impl Into<String>) -> Self {
        PropertyValue::Expression {
            raw_value: raw_value.into(),
        }
    }

    /// Best-effort string coalescing. Expressions yield their raw source,
    /// which may be syntactically incomplete.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PropertyValue::String { value } => Some(value.clone()),
            PropertyValue::Number { value } => Some(format_number(*value)),
            PropertyValue::Boolean { value } => Some(value.to_string()),
            PropertyValue::Expression { raw_value } => Some(raw_value.clone()),
            PropertyValue::Undefined => None,
        }
    }

    /// Value for literal variants only (string, number, boolean).
    pub fn literal(&self) -> Option<String> {
        match self {
            PropertyValue::Expression { .. } | PropertyValue::Undefined => None,
            other => other.as_text(),
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, PropertyValue::Expression { .. })
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(deserialize_with = "deserialize_tag")]
    pub tag: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub children: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_context: Option<String>,
}

fn deserialize_tag<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let tag = String::deserialize(deserializer)?;
    Ok(tag.to_lowercase())
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            text: None,
            location: None,
            source_context: None,
        }
    }

    pub fn text_node(text: &str) -> Self {
        let mut node = Self::new(TEXT_NODE_TAG);
        node.text = Some(text.to_string());
        node
    }

    pub fn expression_node(raw: &str) -> Self {
        Self::new(EXPRESSION_NODE_TAG).with_property(EXPRESSION_PROPERTY, PropertyValue::expression(raw))
    }

    pub fn with_property(mut self, name: &str, value: PropertyValue) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.with_property(name, PropertyValue::string(value))
    }

    pub fn with_expr(self, name: &str, raw: &str) -> Self {
        self.with_property(name, PropertyValue::expression(raw))
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = Some(SourceLocation { line, column });
        self
    }

    pub fn with_source_context(mut self, context: &str) -> Self {
        self.source_context = Some(context.to_string());
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Coalesces any defined property into a string. `Undefined` is absent.
    pub fn get_string_value(&self, name: &str) -> Option<String> {
        self.properties.get(name).and_then(PropertyValue::as_text)
    }

    /// Static (non-expression) value of a property.
    pub fn get_literal(&self, name: &str) -> Option<String> {
        self.properties.get(name).and_then(PropertyValue::literal)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn has_any_property(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.properties.contains_key(*name))
    }

    pub fn is_text_node(&self) -> bool {
        self.tag == TEXT_NODE_TAG
    }

    pub fn is_expression_node(&self) -> bool {
        self.tag == EXPRESSION_NODE_TAG
    }

    /// Raw source of an embedded expression node.
    pub fn expression_source(&self) -> Option<&str> {
        if !self.is_expression_node() {
            return None;
        }
        match self.properties.get(EXPRESSION_PROPERTY) {
            Some(PropertyValue::Expression { raw_value }) => Some(raw_value.as_str()),
            Some(PropertyValue::String { value }) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Markup elements only: text and expression nodes are skipped.
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children
            .iter()
            .filter(|child| !child.is_text_node() && !child.is_expression_node())
    }

    /// True when `other` is this element or one of its descendants (by identity).
    pub fn contains(&self, other: &Element) -> bool {
        std::ptr::eq(self, other) || self.children.iter().any(|child| child.contains(other))
    }
}

/// Flatten a forest into document (pre-)order, skipping text and expression
/// nodes. The index in the returned list is the element's identity within
/// its component.
pub fn flatten_elements(roots: &[Element]) -> Vec<&Element> {
    fn visit<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
        if !element.is_text_node() && !element.is_expression_node() {
            out.push(element);
        }
        for child in &element.children {
            visit(child, out);
        }
    }

    let mut out = Vec::new();
    for root in roots {
        visit(root, &mut out);
    }
    out
}

// ===== RULE METADATA =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// One step less severe. Info is the floor.
    pub fn demoted(self) -> Self {
        match self {
            Severity::Error => Severity::Warning,
            Severity::Warning | Severity::Info => Severity::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplianceLevel {
    A,
    AA,
    AAA,
}

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceLevel::A => write!(f, "A"),
            ComplianceLevel::AA => write!(f, "AA"),
            ComplianceLevel::AAA => write!(f, "AAA"),
        }
    }
}

/// Derived verdict for a whole analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceVerdict {
    #[serde(rename = "AAA")]
    Aaa,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "none")]
    None,
}

// ===== VIOLATIONS =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub element_tag: String,
    /// Document-order index of the element within its component
    pub element_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_context: Option<String>,
}

/// Dedup identity: (rule, tag, line, column) when the element has a
/// location, otherwise (rule, element index). Distinct elements sharing a
/// line stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationIdentity {
    Located {
        rule_id: String,
        element_tag: String,
        line: u32,
        column: u32,
    },
    Indexed {
        rule_id: String,
        element_index: usize,
    },
}

impl Violation {
    pub fn new(
        rule_id: &str,
        severity: Severity,
        message: impl Into<String>,
        element: &Element,
        element_index: usize,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            element_tag: element.tag.clone(),
            element_index,
            location: element.location,
            source_context: element.source_context.clone(),
        }
    }

    pub fn identity(&self) -> ViolationIdentity {
        match self.location {
            Some(location) => ViolationIdentity::Located {
                rule_id: self.rule_id.clone(),
                element_tag: self.element_tag.clone(),
                line: location.line,
                column: location.column,
            },
            None => ViolationIdentity::Indexed {
                rule_id: self.rule_id.clone(),
                element_index: self.element_index,
            },
        }
    }
}

// ===== ANALYSIS INPUT / OUTPUT =====

/// One unit of UI code handed over by the upstream parser. An empty
/// `elements` list is how a parse failure arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSource {
    pub component_id: String,
    pub path: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl ComponentSource {
    pub fn new(component_id: &str, path: &str, elements: Vec<Element>) -> Self {
        Self {
            component_id: component_id.to_string(),
            path: path.to_string(),
            elements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub component_id: String,
    pub path: String,
    /// Number of markup elements analyzed
    pub elements: usize,
    pub violations: Vec<Violation>,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_components: usize,
    pub total_elements: usize,
    pub total_violations: usize,
    pub components_with_violations: usize,
    pub severity_counts: SeverityCounts,
    pub overall_score: f64,
    pub ruleset_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBreakdown {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub count: usize,
    pub affected_components: Vec<String>,
    pub compliance_level: Option<ComplianceLevel>,
    pub criterion_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub path: String,
    pub violation_count: usize,
    pub score: f64,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFrequency {
    pub rule_id: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationPatterns {
    pub top_rules: Vec<RuleFrequency>,
    pub by_directory: BTreeMap<String, usize>,
    pub by_severity: SeverityCounts,
    pub compliance_level: ComplianceVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: AnalysisSummary,
    pub rule_breakdown: BTreeMap<String, RuleBreakdown>,
    pub component_breakdown: BTreeMap<String, ComponentBreakdown>,
    pub patterns: ViolationPatterns,
}

impl AnalysisResult {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_value_coalesces_every_variant() {
        let element = Element::new("INPUT")
            .with_attr("name", "email")
            .with_property("size", PropertyValue::Number { value: 20.0 })
            .with_property("required", PropertyValue::Boolean { value: true })
            .with_expr("placeholder", "t('email')")
            .with_property("value", PropertyValue::Undefined);

        assert_eq!(element.tag, "input");
        assert_eq!(element.get_string_value("name").as_deref(), Some("email"));
        assert_eq!(element.get_string_value("size").as_deref(), Some("20"));
        assert_eq!(element.get_string_value("required").as_deref(), Some("true"));
        assert_eq!(
            element.get_string_value("placeholder").as_deref(),
            Some("t('email')")
        );
        assert_eq!(element.get_string_value("value"), None);
        assert_eq!(element.get_string_value("missing"), None);
        assert_eq!(element.get_literal("placeholder"), None);
    }

    #[test]
    fn flatten_keeps_document_order_and_skips_text() {
        let tree = vec![Element::new("main")
            .with_child(Element::new("h1").with_child(Element::text_node("Title")))
            .with_child(
                Element::new("section")
                    .with_child(Element::new("h2"))
                    .with_child(Element::expression_node("items.map(render)")),
            )];

        let tags: Vec<&str> = flatten_elements(&tree).iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["main", "h1", "section", "h2"]);
    }

    #[test]
    fn identity_falls_back_to_index_without_location() {
        let element = Element::new("div");
        let a = Violation::new("duplicate-id", Severity::Error, "dup", &element, 0);
        let b = Violation::new("duplicate-id", Severity::Error, "dup", &element, 1);
        assert_ne!(a.identity(), b.identity());

        let located = element.at(3, 1);
        let c = Violation::new("duplicate-id", Severity::Error, "dup", &located, 4);
        let d = Violation::new("duplicate-id", Severity::Error, "dup", &located, 5);
        assert_eq!(c.identity(), d.identity());

        let same_line = Element::new("div").at(3, 30);
        let e = Violation::new("duplicate-id", Severity::Error, "dup", &same_line, 6);
        assert_ne!(c.identity(), e.identity());
    }

    #[test]
    fn property_value_json_shape() {
        let json = serde_json::to_string(&PropertyValue::expression("a ? b : c")).unwrap();
        assert_eq!(json, r#"{"type":"expression","raw_value":"a ? b : c"}"#);
        let parsed: PropertyValue = serde_json::from_str(r#"{"type":"undefined"}"#).unwrap();
        assert_eq!(parsed, PropertyValue::Undefined);
    }
}
