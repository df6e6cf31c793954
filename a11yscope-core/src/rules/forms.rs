use super::registry::{Rule, ValidationContext};
use super::selector::Selector;
use crate::context::LabelResolution;
use crate::types::{ComplianceLevel, Severity, Violation};
use anyhow::Result;

pub fn rules() -> Vec<Rule> {
    vec![Rule::element(
        "input-label",
        "Form control label",
        Severity::Error,
        Selector::tags(&["input", "select", "textarea"]),
        validate_input_label,
    )
    .describe("Form controls must have an associated label, an ARIA label, or a title")
    .wcag(ComplianceLevel::A, "3.3.2")]
}

fn validate_input_label(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let resolution = ctx
        .context
        .resolve_label(ctx.element, ctx.elements, ctx.text);

    let violation = match resolution {
        LabelResolution::Unlabeled => Some(ctx.violation_with(
            ctx.severity(),
            format!("<{}> has no associated label", ctx.element.tag),
        )),
        LabelResolution::Placeholder => Some(ctx.violation_with(
            ctx.severity().demoted(),
            format!(
                "<{}> is labeled only by its placeholder, which disappears on input",
                ctx.element.tag
            ),
        )),
        LabelResolution::Exempt
        | LabelResolution::Hidden
        | LabelResolution::AriaLabel
        | LabelResolution::AssociatedLabel
        | LabelResolution::PassThrough => None,
    };
    Ok(violation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::check;
    use crate::types::Element;

    #[test]
    fn unlabeled_controls_are_errors() {
        let tree = vec![Element::new("form")
            .with_child(Element::new("input").with_attr("type", "text"))
            .with_child(Element::new("select"))
            .with_child(Element::new("textarea"))];
        let violations = check("input-label", tree);
        assert_eq!(violations.len(), 3);
        assert!(violations.iter().all(|v| v.severity == Severity::Error));
    }

    #[test]
    fn placeholder_only_is_demoted() {
        let tree = vec![Element::new("input").with_attr("placeholder", "Search")];
        let violations = check("input-label", tree);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert!(violations[0].message.contains("placeholder"));
    }

    #[test]
    fn labeled_and_exempt_controls_pass() {
        let tree = vec![Element::new("form")
            .with_child(Element::new("label").with_attr("for", "name"))
            .with_child(Element::new("input").with_attr("id", "name"))
            .with_child(Element::new("input").with_attr("type", "hidden"))
            .with_child(Element::new("input").with_attr("type", "submit"))
            .with_child(Element::new("input").with_expr("aria-label", "t('email')"))
            .with_child(Element::new("textarea").with_attr("title", "Comments"))];
        assert!(check("input-label", tree).is_empty());
    }

    #[test]
    fn spread_props_soften_missing_label() {
        let tree = vec![Element::new("input").with_expr("...field", "field")];
        let violations = check("input-label", tree);
        assert_eq!(violations[0].severity, Severity::Warning);

        let placeholder = vec![Element::new("input")
            .with_expr("...field", "field")
            .with_attr("placeholder", "Name")];
        assert_eq!(check("input-label", placeholder)[0].severity, Severity::Info);
    }
}
