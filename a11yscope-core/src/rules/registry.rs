use super::selector::Selector;
use super::{aria, forms, images, interactive, structure};
use crate::config::RuleConfig;
use crate::context::ContextAnalyzer;
use crate::error::RegistryError;
use crate::heuristics::TextExtractor;
use crate::types::{ComplianceLevel, Element, Severity, Violation};
use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type ValidateFn =
    Arc<dyn Fn(&ValidationContext<'_>) -> Result<Option<Violation>> + Send + Sync>;

/// How a rule is evaluated
#[derive(Clone)]
pub enum RuleCheck {
    /// Called once per matching element
    Element(ValidateFn),
    /// Exempt from per-element dispatch; a whole-component pass keyed by the
    /// rule id produces its violations
    MultiElement,
}

impl RuleCheck {
    pub fn kind(&self) -> &'static str {
        match self {
            RuleCheck::Element(_) => "element",
            RuleCheck::MultiElement => "multi-element",
        }
    }
}

#[derive(Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub compliance_level: Option<ComplianceLevel>,
    pub criterion_id: Option<String>,
    pub selector: Selector,
    pub check: RuleCheck,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("severity", &self.severity)
            .field("compliance_level", &self.compliance_level)
            .field("criterion_id", &self.criterion_id)
            .field("selector", &self.selector)
            .field("check", &self.check.kind())
            .finish()
    }
}

impl Rule {
    pub fn element<F>(id: &str, name: &str, severity: Severity, selector: Selector, validate: F) -> Self
    where
        F: Fn(&ValidationContext<'_>) -> Result<Option<Violation>> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            severity,
            compliance_level: None,
            criterion_id: None,
            selector,
            check: RuleCheck::Element(Arc::new(validate)),
        }
    }

    pub fn multi_element(id: &str, name: &str, severity: Severity) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            severity,
            compliance_level: None,
            criterion_id: None,
            selector: Selector::any(),
            check: RuleCheck::MultiElement,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn wcag(mut self, level: ComplianceLevel, criterion_id: &str) -> Self {
        self.compliance_level = Some(level);
        self.criterion_id = Some(criterion_id.to_string());
        self
    }

    pub fn is_multi_element(&self) -> bool {
        matches!(self.check, RuleCheck::MultiElement)
    }

    /// Violation at this rule's configured severity
    pub fn violation(&self, message: impl Into<String>, element: &Element, index: usize) -> Violation {
        Violation::new(&self.id, self.severity, message, element, index)
    }
}

/// Everything a single-element validator may consult.
pub struct ValidationContext<'a> {
    pub element: &'a Element,
    /// Document-order index of `element`
    pub index: usize,
    /// Every element of the component, in document order
    pub elements: &'a [&'a Element],
    pub rule: &'a Rule,
    pub text: &'a TextExtractor,
    pub context: &'a ContextAnalyzer,
}

impl<'a> ValidationContext<'a> {
    pub fn violation(&self, message: impl Into<String>) -> Violation {
        self.rule.violation(message, self.element, self.index)
    }

    pub fn violation_with(&self, severity: Severity, message: impl Into<String>) -> Violation {
        Violation::new(&self.rule.id, severity, message, self.element, self.index)
    }

    /// The rule's severity, demoted when spread props could supply the fix.
    pub fn severity(&self) -> Severity {
        self.context.determine_severity(self.rule.severity, self.element)
    }
}

/// An explicit, constructed rule catalog. Iteration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in catalog
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        let rules = images::rules()
            .into_iter()
            .chain(forms::rules())
            .chain(interactive::rules())
            .chain(aria::rules())
            .chain(structure::rules());
        for rule in rules {
            if let Err(e) = registry.register(rule) {
                tracing::warn!("⚠️  Skipping built-in rule: {}", e);
            }
        }
        registry
    }

    pub fn register(&mut self, rule: Rule) -> Result<(), RegistryError> {
        if self.index.contains_key(&rule.id) {
            return Err(RegistryError::DuplicateRule(rule.id));
        }
        self.index.insert(rule.id.clone(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// Disable rules or replace their base severity. Unknown names are skipped.
    pub fn apply_overrides(&mut self, overrides: &[RuleConfig]) {
        let mut disabled = Vec::new();
        for rule_config in overrides {
            let Some(&position) = self.index.get(&rule_config.name) else {
                tracing::warn!("⚠️  Unknown rule in config: {}. Skipping...", rule_config.name);
                continue;
            };
            if !rule_config.enabled {
                tracing::info!("⏭️  Disabling rule: {}", rule_config.name);
                disabled.push(rule_config.name.clone());
                continue;
            }
            if let Some(severity) = rule_config.severity {
                self.rules[position].severity = severity;
            }
        }

        if !disabled.is_empty() {
            self.rules.retain(|rule| !disabled.contains(&rule.id));
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .rules
            .iter()
            .enumerate()
            .map(|(position, rule)| (rule.id.clone(), position))
            .collect();
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&position| &self.rules[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn element_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| !rule.is_multi_element())
    }

    pub fn multi_element_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.is_multi_element())
    }
}
