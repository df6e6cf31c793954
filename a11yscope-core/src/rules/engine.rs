use super::registry::{Rule, RuleCheck, RuleRegistry, ValidationContext};
use super::selector::{match_all, Selector};
use super::structure::{self, HeadingIssueKind};
use crate::config::HeuristicsConfig;
use crate::context::ContextAnalyzer;
use crate::error::ValidationError;
use crate::heuristics::TextExtractor;
use crate::types::{flatten_elements, Element, Violation};
use anyhow::Result;
use regex::Regex;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

// Debug configuration for rule tracing
#[derive(Debug, Clone, Default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub filter_patterns: Vec<String>,
}

impl DebugConfig {
    pub fn new(enabled: bool, filter_patterns: Vec<String>) -> Self {
        Self {
            enabled,
            filter_patterns,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Regex first, plain substring when the pattern does not compile
    pub fn matches(&self, haystack: &str) -> bool {
        self.filter_patterns.iter().any(|pattern| match Regex::new(pattern) {
            Ok(regex) => regex.is_match(haystack),
            Err(_) => haystack.contains(pattern.as_str()),
        })
    }
}

/// Trace the violations a rule produced whose id or message matches a filter
pub fn debug_violations(rule_id: &str, violations: &[Violation], debug_config: &DebugConfig) {
    if !debug_config.enabled || debug_config.filter_patterns.is_empty() {
        return;
    }

    let matching: Vec<&Violation> = violations
        .iter()
        .filter(|v| v.rule_id == rule_id)
        .filter(|v| debug_config.matches(&v.rule_id) || debug_config.matches(&v.message))
        .collect();

    if matching.is_empty() {
        return;
    }
    tracing::debug!("🔍 [{}] {} matching violations:", rule_id, matching.len());
    for violation in matching {
        let message_preview = if violation.message.chars().count() > 60 {
            format!("{}...", violation.message.chars().take(57).collect::<String>())
        } else {
            violation.message.clone()
        };
        tracing::debug!(
            "  Element {} <{}> ({}, line {:?}): \"{}\"",
            violation.element_index,
            violation.element_tag,
            violation.severity,
            violation.location.map(|l| l.line),
            message_preview
        );
    }
}

/// Runs a registry over one component's element tree.
pub struct RuleEngine {
    registry: RuleRegistry,
    text: TextExtractor,
    context: ContextAnalyzer,
    debug_config: DebugConfig,
}

impl RuleEngine {
    pub fn new(registry: RuleRegistry, heuristics: &HeuristicsConfig) -> Result<Self> {
        Ok(Self {
            registry,
            text: TextExtractor::new(heuristics)?,
            context: ContextAnalyzer::new(heuristics)?,
            debug_config: DebugConfig::disabled(),
        })
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.debug_config = debug_config;
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn text_extractor(&self) -> &TextExtractor {
        &self.text
    }

    pub fn context_analyzer(&self) -> &ContextAnalyzer {
        &self.context
    }

    /// Every violation in the tree, ordered by element. Single-element
    /// findings are deduplicated; multi-element passes report every member
    /// as-is. Never fails: a broken validator only loses its own findings.
    pub fn evaluate(&self, roots: &[Element]) -> Vec<Violation> {
        let elements = flatten_elements(roots);
        if elements.is_empty() {
            return Vec::new();
        }
        tracing::debug!(
            "⚙️  Evaluating {} elements against {} rules",
            elements.len(),
            self.registry.len()
        );

        let mut violations = dedupe(self.apply_element_rules(&elements));
        for rule in self.registry.multi_element_rules() {
            violations.extend(self.apply_multi_element_rule(rule, &elements));
        }
        violations.sort_by_key(|violation| violation.element_index);

        if self.debug_config.enabled {
            for rule in self.registry.iter() {
                debug_violations(&rule.id, &violations, &self.debug_config);
            }
        }
        violations
    }

    fn apply_element_rules(&self, elements: &[&Element]) -> Vec<Violation> {
        let rules: Vec<&Rule> = self.registry.element_rules().collect();
        let selectors: Vec<&Selector> = rules.iter().map(|rule| &rule.selector).collect();
        let matches = match_all(&selectors, elements);
        tracing::debug!("   🎯 {} (rule, element) matches", matches.len());

        let mut violations = Vec::new();
        for (rule_index, element_index) in matches {
            let rule = rules[rule_index];
            let RuleCheck::Element(validate) = &rule.check else {
                continue;
            };
            let element = elements[element_index];
            let ctx = ValidationContext {
                element,
                index: element_index,
                elements,
                rule,
                text: &self.text,
                context: &self.context,
            };

            match isolate(&rule.id, &element.tag, || validate(&ctx)) {
                Ok(Some(violation)) => violations.push(violation),
                Ok(None) => {}
                Err(e) => tracing::warn!("⚠️  {}. Treating as no violation", e),
            }
        }
        violations
    }

    fn apply_multi_element_rule(&self, rule: &Rule, elements: &[&Element]) -> Vec<Violation> {
        let result = isolate(&rule.id, "*", || {
            let violations = match rule.id.as_str() {
                structure::HEADING_HIERARCHY_START => {
                    structure::heading_violations(rule, elements, HeadingIssueKind::Start)
                }
                structure::HEADING_HIERARCHY_SKIP => {
                    structure::heading_violations(rule, elements, HeadingIssueKind::Skip)
                }
                structure::DUPLICATE_ID => structure::duplicate_id_violations(rule, elements),
                _ => {
                    tracing::warn!("⚠️  Unknown multi-element rule: {}. Skipping...", rule.id);
                    Vec::new()
                }
            };
            Ok(violations)
        });

        result.unwrap_or_else(|e| {
            tracing::warn!("⚠️  {}. Treating as no violation", e);
            Vec::new()
        })
    }
}

/// Run one validator so that neither an `Err` nor a panic escapes.
fn isolate<T>(
    rule_id: &str,
    element_tag: &str,
    validate: impl FnOnce() -> Result<T>,
) -> Result<T, ValidationError> {
    match catch_unwind(AssertUnwindSafe(validate)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(ValidationError::Failed {
            rule_id: rule_id.to_string(),
            element_tag: element_tag.to_string(),
            source,
        }),
        Err(payload) => Err(ValidationError::Panicked {
            rule_id: rule_id.to_string(),
            element_tag: element_tag.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Keep the first violation per identity, then order by element index.
/// The sort is stable, so rule order is preserved within an element.
pub fn dedupe(violations: Vec<Violation>) -> Vec<Violation> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Violation> = violations
        .into_iter()
        .filter(|violation| seen.insert(violation.identity()))
        .collect();
    unique.sort_by_key(|violation| violation.element_index);
    unique
}
