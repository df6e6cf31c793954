use crate::config::ScoringConfig;
use crate::types::{ComplianceLevel, ComplianceVerdict, Severity, Violation};
use std::collections::HashSet;

/// Per-component score in `[0, 100]`.
///
/// The base is the share of elements without any violation; a penalty of
/// `multiplier × Σ weight(severity)`, capped at `max_penalty`, is subtracted
/// and the result rounded and clamped. A component without elements scores
/// 100.
pub fn component_score(element_count: usize, violations: &[Violation], scoring: &ScoringConfig) -> f64 {
    if element_count == 0 {
        return 100.0;
    }

    let affected: HashSet<usize> = violations.iter().map(|v| v.element_index).collect();
    let clean = element_count.saturating_sub(affected.len());
    let base = clean as f64 / element_count as f64 * 100.0;

    let weights: u64 = violations
        .iter()
        .map(|v| u64::from(scoring.weight(v.severity)))
        .sum();
    let penalty = (scoring.penalty_multiplier * weights as f64).min(scoring.max_penalty);

    (base - penalty).round().clamp(0.0, 100.0)
}

/// Unweighted mean of component scores; 100 when there are none.
pub fn overall_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 100.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Compliance ladder, evaluated top-down:
/// - no errors and no AA-level warnings: AAA
/// - no errors: AA
/// - every error tagged above level A: A
/// - otherwise: none
///
/// `level_of` maps a rule id to its tag. Untagged or unknown rules count as
/// base level.
pub fn compliance_verdict<'a, I, F>(violations: I, level_of: F) -> ComplianceVerdict
where
    I: IntoIterator<Item = &'a Violation>,
    F: Fn(&str) -> Option<ComplianceLevel>,
{
    let mut has_error = false;
    let mut has_base_level_error = false;
    let mut has_aa_warning = false;

    for violation in violations {
        let level = level_of(&violation.rule_id);
        match violation.severity {
            Severity::Error => {
                has_error = true;
                if !matches!(level, Some(l) if l > ComplianceLevel::A) {
                    has_base_level_error = true;
                }
            }
            Severity::Warning if level == Some(ComplianceLevel::AA) => has_aa_warning = true,
            Severity::Warning | Severity::Info => {}
        }
    }

    if !has_error && !has_aa_warning {
        ComplianceVerdict::Aaa
    } else if !has_error {
        ComplianceVerdict::Aa
    } else if !has_base_level_error {
        ComplianceVerdict::A
    } else {
        ComplianceVerdict::None
    }
}

/// Rounded to two decimals
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Element;
    use proptest::prelude::*;

    fn violation(rule_id: &str, severity: Severity, index: usize) -> Violation {
        Violation::new(rule_id, severity, "msg", &Element::new("div"), index)
    }

    #[test]
    fn empty_component_scores_100() {
        assert_eq!(component_score(0, &[], &ScoringConfig::default()), 100.0);
        assert_eq!(component_score(5, &[], &ScoringConfig::default()), 100.0);
    }

    #[test]
    fn base_and_penalty() {
        let scoring = ScoringConfig::default();
        // 4 elements, 1 affected: base 75; one error: penalty 20
        let one_error = [violation("img-alt", Severity::Error, 2)];
        assert_eq!(component_score(4, &one_error, &scoring), 55.0);

        // same element twice counts once for the base
        let two = [
            violation("img-alt", Severity::Error, 2),
            violation("duplicate-id", Severity::Warning, 2),
        ];
        assert_eq!(component_score(4, &two, &scoring), 45.0);

        // penalty caps at 50
        let many: Vec<Violation> = (0..10).map(|i| violation("x", Severity::Error, i % 2)).collect();
        assert_eq!(component_score(10, &many, &scoring), 30.0);
    }

    #[test]
    fn overall_is_plain_mean() {
        assert_eq!(overall_score(&[]), 100.0);
        assert_eq!(overall_score(&[100.0, 50.0]), 75.0);
    }

    #[test]
    fn verdict_table() {
        use ComplianceLevel::{A, AA, AAA};
        let levels = |id: &str| match id {
            "a" => Some(A),
            "aa" => Some(AA),
            "aaa" => Some(AAA),
            _ => None,
        };

        let cases: Vec<(Vec<Violation>, ComplianceVerdict)> = vec![
            (vec![], ComplianceVerdict::Aaa),
            (vec![violation("a", Severity::Warning, 0)], ComplianceVerdict::Aaa),
            (vec![violation("aaa", Severity::Warning, 0)], ComplianceVerdict::Aaa),
            (vec![violation("aa", Severity::Info, 0)], ComplianceVerdict::Aaa),
            (vec![violation("aa", Severity::Warning, 0)], ComplianceVerdict::Aa),
            (
                vec![violation("aa", Severity::Warning, 0), violation("a", Severity::Warning, 1)],
                ComplianceVerdict::Aa,
            ),
            (vec![violation("aa", Severity::Error, 0)], ComplianceVerdict::A),
            (
                vec![violation("aaa", Severity::Error, 0), violation("aa", Severity::Warning, 1)],
                ComplianceVerdict::A,
            ),
            (vec![violation("a", Severity::Error, 0)], ComplianceVerdict::None),
            (vec![violation("unknown", Severity::Error, 0)], ComplianceVerdict::None),
            (
                vec![violation("aa", Severity::Error, 0), violation("a", Severity::Error, 1)],
                ComplianceVerdict::None,
            ),
        ];

        for (violations, expected) in cases {
            assert_eq!(
                compliance_verdict(&violations, levels),
                expected,
                "{:?}",
                violations.iter().map(|v| (&v.rule_id, v.severity)).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
    }

    fn severity_strategy() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Error),
            Just(Severity::Warning),
            Just(Severity::Info)
        ]
    }

    proptest! {
        #[test]
        fn score_stays_in_range(
            element_count in 0usize..200,
            raw in prop::collection::vec((0usize..200, severity_strategy()), 0..100),
        ) {
            let violations: Vec<Violation> = raw
                .into_iter()
                .filter(|(index, _)| *index < element_count)
                .map(|(index, severity)| violation("r", severity, index))
                .collect();
            let score = component_score(element_count, &violations, &ScoringConfig::default());
            prop_assert!((0.0..=100.0).contains(&score));
            prop_assert_eq!(score, score.round());
            if element_count == 0 {
                prop_assert_eq!(score, 100.0);
            }
        }
    }
}
