use crate::config::ScoringConfig;
use crate::rules::RuleRegistry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version constants stamped into every fingerprint
pub mod versions {
    pub const ENGINE_VERSION: &str = "0.1.0";
    pub const RULESET_VERSION: &str = "1.0.0";
}

/// Everything that changes what a report means
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RulesetKey {
    /// `id:severity:level:kind`, in registry order
    pub rules: Vec<String>,
    pub scoring: String,
    pub engine_version: String,
    pub ruleset_version: String,
}

impl RulesetKey {
    pub fn new(registry: &RuleRegistry, scoring: &ScoringConfig) -> Self {
        let rules = registry
            .iter()
            .map(|rule| {
                format!(
                    "{}:{}:{}:{}",
                    rule.id,
                    rule.severity,
                    rule.compliance_level
                        .map(|level| level.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    rule.check.kind()
                )
            })
            .collect();

        Self {
            rules,
            scoring: format!(
                "{}/{}/{}/{}/{}",
                scoring.error_weight,
                scoring.warning_weight,
                scoring.info_weight,
                scoring.penalty_multiplier,
                scoring.max_penalty
            ),
            engine_version: versions::ENGINE_VERSION.to_string(),
            ruleset_version: versions::RULESET_VERSION.to_string(),
        }
    }

    /// Hex SHA-256 of the key
    pub fn to_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.engine_version);
        hasher.update(&self.ruleset_version);
        for rule in &self.rules {
            hasher.update(rule);
            hasher.update([0u8]);
        }
        hasher.update(&self.scoring);
        format!("{:x}", hasher.finalize())
    }
}

pub fn ruleset_fingerprint(registry: &RuleRegistry, scoring: &ScoringConfig) -> String {
    RulesetKey::new(registry, scoring).to_hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::types::Severity;

    #[test]
    fn stable_for_identical_rulesets() {
        let scoring = ScoringConfig::default();
        let a = ruleset_fingerprint(&RuleRegistry::builtin(), &scoring);
        let b = ruleset_fingerprint(&RuleRegistry::builtin(), &scoring);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn changes_with_rules_and_scoring() {
        let scoring = ScoringConfig::default();
        let baseline = ruleset_fingerprint(&RuleRegistry::builtin(), &scoring);

        let mut reseverity = RuleRegistry::builtin();
        reseverity.apply_overrides(&[RuleConfig {
            name: "img-alt".to_string(),
            enabled: true,
            severity: Some(Severity::Warning),
        }]);
        assert_ne!(ruleset_fingerprint(&reseverity, &scoring), baseline);

        let heavier = ScoringConfig {
            error_weight: 20,
            ..ScoringConfig::default()
        };
        assert_ne!(ruleset_fingerprint(&RuleRegistry::builtin(), &heavier), baseline);
    }
}
