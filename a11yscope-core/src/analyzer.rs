use crate::config::AnalyzerConfig;
use crate::fingerprint::ruleset_fingerprint;
use crate::rules::{DebugConfig, RuleEngine, RuleRegistry};
use crate::scoring::{component_score, compliance_verdict, overall_score, percentage};
use crate::types::*;
use anyhow::Result;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

pub struct AccessibilityAnalyzer {
    rule_engine: RuleEngine,
    config: AnalyzerConfig,
}

impl AccessibilityAnalyzer {
    /// Built-in rules with the config's overrides applied
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        Self::with_registry(RuleRegistry::builtin(), config)
    }

    /// Alternate rule set. Config overrides still apply.
    pub fn with_registry(mut registry: RuleRegistry, config: AnalyzerConfig) -> Result<Self> {
        registry.apply_overrides(&config.rules);
        Ok(Self {
            rule_engine: RuleEngine::new(registry, &config.heuristics)?,
            config,
        })
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.rule_engine.set_debug_config(debug_config);
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.rule_engine.registry()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn rule_engine(&self) -> &RuleEngine {
        &self.rule_engine
    }

    /// Analyze one component. An empty tree (the upstream parser's failure
    /// signal) yields zero violations and a score of 100.
    pub fn analyze_component(&self, source: &ComponentSource) -> ComponentReport {
        let element_count = flatten_elements(&source.elements).len();
        let violations = self.rule_engine.evaluate(&source.elements);
        let score = component_score(element_count, &violations, &self.config.scoring);

        tracing::debug!(
            "   ✅ {}: {} elements, {} violations, score {}",
            source.component_id,
            element_count,
            violations.len(),
            score
        );

        ComponentReport {
            component_id: source.component_id.clone(),
            path: source.path.clone(),
            elements: element_count,
            violations,
            score,
        }
    }

    /// Analyze every component and aggregate. Components are independent, so
    /// with `parallel` they run on the rayon pool; results keep input order.
    pub fn analyze(&self, sources: &[ComponentSource]) -> AnalysisResult {
        let mut seen = HashSet::new();
        let unique: Vec<&ComponentSource> = sources
            .iter()
            .filter(|source| {
                let first = seen.insert(source.component_id.as_str());
                if !first {
                    tracing::warn!(
                        "⚠️  Duplicate component id {} ({}). Keeping the first occurrence",
                        source.component_id,
                        source.path
                    );
                }
                first
            })
            .collect();

        tracing::info!(
            "🚀 Analyzing {} components with {} rules{}",
            unique.len(),
            self.registry().len(),
            if self.config.parallel { " (parallel)" } else { "" }
        );

        let reports: Vec<ComponentReport> = if self.config.parallel {
            unique
                .par_iter()
                .map(|source| self.analyze_component(source))
                .collect()
        } else {
            unique
                .iter()
                .map(|source| self.analyze_component(source))
                .collect()
        };

        let result = self.aggregate(reports);
        tracing::info!(
            "📊 {} violations across {} components, overall score {:.1}, compliance {:?}",
            result.summary.total_violations,
            result.summary.total_components,
            result.summary.overall_score,
            result.patterns.compliance_level
        );
        result
    }

    /// Build the report from per-component results.
    pub fn aggregate(&self, reports: Vec<ComponentReport>) -> AnalysisResult {
        let registry = self.registry();

        let mut severity_counts = SeverityCounts::default();
        let mut rule_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut rule_components: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut by_directory: BTreeMap<String, usize> = BTreeMap::new();

        for report in &reports {
            for violation in &report.violations {
                severity_counts.record(violation.severity);
                *rule_counts.entry(violation.rule_id.clone()).or_insert(0) += 1;
                rule_components
                    .entry(violation.rule_id.clone())
                    .or_default()
                    .insert(report.component_id.clone());
            }
            if !report.violations.is_empty() {
                *by_directory.entry(directory_of(&report.path)).or_insert(0) += report.violations.len();
            }
        }

        let total_violations: usize = rule_counts.values().sum();

        // Rules missing from the registry are left out of rule-keyed views
        let rule_breakdown: BTreeMap<String, RuleBreakdown> = rule_counts
            .iter()
            .filter_map(|(rule_id, &count)| {
                let rule = registry.get(rule_id)?;
                Some((
                    rule_id.clone(),
                    RuleBreakdown {
                        name: rule.name.clone(),
                        severity: rule.severity,
                        description: rule.description.clone(),
                        count,
                        affected_components: rule_components
                            .get(rule_id)
                            .map(|components| components.iter().cloned().collect())
                            .unwrap_or_default(),
                        compliance_level: rule.compliance_level,
                        criterion_id: rule.criterion_id.clone(),
                    },
                ))
            })
            .collect();

        let mut top_rules: Vec<RuleFrequency> = rule_counts
            .iter()
            .map(|(rule_id, &count)| RuleFrequency {
                rule_id: rule_id.clone(),
                count,
                percentage: percentage(count, total_violations),
            })
            .collect();
        top_rules.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.rule_id.cmp(&b.rule_id)));
        top_rules.truncate(self.config.patterns.top_n);

        let compliance_level = compliance_verdict(
            reports.iter().flat_map(|report| report.violations.iter()),
            |rule_id| registry.get(rule_id).and_then(|rule| rule.compliance_level),
        );

        let scores: Vec<f64> = reports.iter().map(|report| report.score).collect();
        let summary = AnalysisSummary {
            total_components: reports.len(),
            total_elements: reports.iter().map(|report| report.elements).sum(),
            total_violations,
            components_with_violations: reports
                .iter()
                .filter(|report| !report.violations.is_empty())
                .count(),
            severity_counts: severity_counts.clone(),
            overall_score: overall_score(&scores),
            ruleset_fingerprint: ruleset_fingerprint(registry, &self.config.scoring),
        };

        let component_breakdown: BTreeMap<String, ComponentBreakdown> = reports
            .into_iter()
            .map(|report| {
                (
                    report.component_id,
                    ComponentBreakdown {
                        path: report.path,
                        violation_count: report.violations.len(),
                        score: report.score,
                        violations: report.violations,
                    },
                )
            })
            .collect();

        AnalysisResult {
            summary,
            rule_breakdown,
            component_breakdown,
            patterns: ViolationPatterns {
                top_rules,
                by_directory,
                by_severity: severity_counts,
                compliance_level,
            },
        }
    }
}

/// Parent directory of a component path, `"."` when there is none.
pub fn directory_of(path: &str) -> String {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> AccessibilityAnalyzer {
        AccessibilityAnalyzer::new(AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn directories() {
        assert_eq!(directory_of("src/components/Button.tsx"), "src/components");
        assert_eq!(directory_of("App.vue"), ".");
        assert_eq!(directory_of(""), ".");
    }

    #[test]
    fn empty_component_scores_100() {
        let report = analyzer().analyze_component(&ComponentSource::new("broken", "src/Broken.tsx", vec![]));
        assert_eq!(report.elements, 0);
        assert!(report.violations.is_empty());
        assert_eq!(report.score, 100.0);
    }

    #[test]
    fn duplicate_component_ids_keep_first() {
        let sources = vec![
            ComponentSource::new("Card", "src/Card.tsx", vec![Element::new("img")]),
            ComponentSource::new("Card", "src/other/Card.tsx", vec![]),
        ];
        let result = analyzer().analyze(&sources);
        assert_eq!(result.summary.total_components, 1);
        assert_eq!(result.component_breakdown["Card"].path, "src/Card.tsx");
    }

    #[test]
    fn unknown_rule_ids_are_left_out_of_rule_views() {
        let a = analyzer();
        let stray = Violation::new("retired-rule", Severity::Error, "old", &Element::new("div"), 0);
        let report = ComponentReport {
            component_id: "Legacy".to_string(),
            path: "src/Legacy.tsx".to_string(),
            elements: 1,
            violations: vec![stray],
            score: 0.0,
        };
        let result = a.aggregate(vec![report]);
        assert!(result.rule_breakdown.is_empty());
        assert_eq!(result.summary.total_violations, 1);
        assert_eq!(result.patterns.compliance_level, ComplianceVerdict::None);
    }

    #[test]
    fn top_rules_are_ranked_and_truncated() {
        let config = AnalyzerConfig {
            patterns: crate::config::PatternsConfig { top_n: 2 },
            ..AnalyzerConfig::default()
        };
        let a = AccessibilityAnalyzer::new(config).unwrap();
        let tree = vec![Element::new("main")
            .with_child(Element::new("img"))
            .with_child(Element::new("img"))
            .with_child(Element::new("button"))
            .with_child(Element::new("input"))];
        let result = a.analyze(&[ComponentSource::new("Form", "Form.tsx", tree)]);

        let top: Vec<(&str, usize, f64)> = result
            .patterns
            .top_rules
            .iter()
            .map(|r| (r.rule_id.as_str(), r.count, r.percentage))
            .collect();
        assert_eq!(top, vec![("img-alt", 2, 50.0), ("button-text", 1, 25.0)]);
        assert_eq!(result.patterns.by_directory.get("."), Some(&4));
    }
}
