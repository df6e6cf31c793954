use super::registry::{Rule, ValidationContext};
use super::selector::Selector;
use crate::heuristics::AccessibleText;
use crate::types::{ComplianceLevel, PropertyValue, Severity, Violation};
use anyhow::Result;

/// Alt values that say nothing about the image
pub const GENERIC_ALT_VALUES: &[&str] = &[
    "image",
    "photo",
    "picture",
    "icon",
    "graphic",
    "img",
    "banner",
    "logo",
    "untitled",
    "screenshot",
    "thumbnail",
    "placeholder",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico", "tif", "tiff", "avif",
];

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::element(
            "img-alt",
            "Image alternative text",
            Severity::Error,
            Selector::tag("img"),
            validate_alt_present,
        )
        .describe("Images must have an alt attribute; use alt=\"\" for decorative images")
        .wcag(ComplianceLevel::A, "1.1.1"),
        Rule::element(
            "img-alt-meaningful",
            "Meaningful image alternative text",
            Severity::Warning,
            Selector::tag("img").requires(&["alt"]),
            validate_alt_meaningful,
        )
        .describe("Alt text should describe the image, not repeat a generic term or a file name")
        .wcag(ComplianceLevel::A, "1.1.1"),
    ]
}

fn validate_alt_present(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let element = ctx.element;
    if !matches!(element.property("alt"), None | Some(PropertyValue::Undefined)) {
        return Ok(None);
    }
    // Hidden from assistive technology entirely
    if element
        .get_literal("aria-hidden")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        || element
            .get_literal("role")
            .is_some_and(|role| matches!(role.trim(), "presentation" | "none"))
    {
        return Ok(None);
    }
    Ok(Some(ctx.violation_with(
        ctx.severity(),
        "Image is missing an alt attribute",
    )))
}

fn validate_alt_meaningful(ctx: &ValidationContext<'_>) -> Result<Option<Violation>> {
    let alt = match ctx.element.property("alt") {
        Some(PropertyValue::Expression { raw_value }) => {
            match ctx.text.expressions().resolve(raw_value) {
                AccessibleText::Confirmed(text) => text,
                AccessibleText::Inferred | AccessibleText::Absent => return Ok(None),
            }
        }
        Some(other) => match other.literal() {
            Some(text) => text,
            None => return Ok(None),
        },
        None => return Ok(None),
    };

    let alt = alt.trim();
    if alt.is_empty() {
        return Ok(None);
    }

    if is_generic_alt(alt) {
        return Ok(Some(ctx.violation(format!(
            "Alt text \"{alt}\" is too generic to describe the image"
        ))));
    }
    if looks_like_filename(alt) {
        return Ok(Some(ctx.violation(format!(
            "Alt text \"{alt}\" looks like a file name"
        ))));
    }
    Ok(None)
}

pub fn is_generic_alt(alt: &str) -> bool {
    let normalized = alt.trim().trim_end_matches('.').to_lowercase();
    GENERIC_ALT_VALUES.contains(&normalized.as_str())
}

/// `hero-banner.png`, `IMG_0042.JPG`
pub fn looks_like_filename(alt: &str) -> bool {
    match alt.trim().rsplit_once('.') {
        Some((stem, extension)) => {
            !stem.is_empty()
                && !stem.ends_with(char::is_whitespace)
                && IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str())
        }
        None => false,
    }
}
