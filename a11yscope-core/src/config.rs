use crate::types::Severity;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

// Default value functions for serde
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Per-rule overrides applied on top of the built-in registry
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
    /// Analyze components on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Rule id
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replaces the rule's base severity. Validator demotions are relative to it.
    #[serde(default)]
    pub severity: Option<Severity>,
}

fn default_error_weight() -> u32 {
    10
}

fn default_warning_weight() -> u32 {
    5
}

fn default_info_weight() -> u32 {
    1
}

fn default_penalty_multiplier() -> f64 {
    2.0
}

fn default_max_penalty() -> f64 {
    50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_error_weight")]
    pub error_weight: u32,
    #[serde(default = "default_warning_weight")]
    pub warning_weight: u32,
    #[serde(default = "default_info_weight")]
    pub info_weight: u32,
    /// Multiplier applied to the summed severity weights
    #[serde(default = "default_penalty_multiplier")]
    pub penalty_multiplier: f64,
    /// Upper bound of the penalty subtracted from the base score
    #[serde(default = "default_max_penalty")]
    pub max_penalty: f64,
}

impl ScoringConfig {
    pub fn weight(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Error => self.error_weight,
            Severity::Warning => self.warning_weight,
            Severity::Info => self.info_weight,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            error_weight: default_error_weight(),
            warning_weight: default_warning_weight(),
            info_weight: default_info_weight(),
            penalty_multiplier: default_penalty_multiplier(),
            max_penalty: default_max_penalty(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsConfig {
    /// How many of the most frequent rules to list
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_screen_reader_classes() -> Vec<String> {
    vec![
        "sr-only".to_string(),
        "visually-hidden".to_string(),
        "visuallyhidden".to_string(),
        "screen-reader-text".to_string(),
        "screen-reader-only".to_string(),
        "a11y-hidden".to_string(),
    ]
}

/// Additions to the built-in expression and icon heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// Extra function names treated as translation calls (e.g. "translateLabel")
    #[serde(default)]
    pub translation_functions: Vec<String>,
    /// Extra identifier tokens that suggest text content (e.g. "caption")
    #[serde(default)]
    pub text_identifier_tokens: Vec<String>,
    /// Extra regexes matched against class names to detect icon libraries
    #[serde(default)]
    pub icon_class_patterns: Vec<String>,
    /// Class names marking visually hidden but announced content
    #[serde(default = "default_screen_reader_classes")]
    pub screen_reader_classes: Vec<String>,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            translation_functions: Vec::new(),
            text_identifier_tokens: Vec::new(),
            icon_class_patterns: Vec::new(),
            screen_reader_classes: default_screen_reader_classes(),
        }
    }
}

impl AnalyzerConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: AnalyzerConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("⚠️  Failed to load config from {}: {}, using defaults", p, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = AnalyzerConfig::from_yaml_str("{}").unwrap();
        assert!(config.rules.is_empty());
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(config.patterns.top_n, 10);
        assert!(!config.parallel);
        assert!(config
            .heuristics
            .screen_reader_classes
            .contains(&"sr-only".to_string()));
    }

    #[test]
    fn rule_overrides_parse() {
        let yaml = r#"
rules:
  - name: img-alt-meaningful
    enabled: false
  - name: heading-hierarchy-skip
    severity: error
scoring:
  max_penalty: 40
parallel: true
"#;
        let config = AnalyzerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.rules.len(), 2);
        assert!(!config.rules[0].enabled);
        assert!(config.rules[1].enabled);
        assert_eq!(config.rules[1].severity, Some(Severity::Error));
        assert_eq!(config.scoring.max_penalty, 40.0);
        assert_eq!(config.scoring.error_weight, 10);
        assert!(config.parallel);
    }

    #[test]
    fn fallback_on_missing_file() {
        let config = AnalyzerConfig::load_with_fallback(Some("/nonexistent/a11yscope.yaml"));
        assert_eq!(config.patterns.top_n, 10);
    }
}
