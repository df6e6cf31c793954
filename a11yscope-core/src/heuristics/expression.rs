//! Lexical heuristics over unevaluated expression source.
//!
//! No evaluator is available, so every expression is classified by shape
//! against a fixed, ordered table of `(ExpressionKind, strategy)` pairs. The
//! first strategy that recognizes the shape decides the result; new heuristics
//! are added as new table rows.

use super::text::AccessibleText;
use crate::config::HeuristicsConfig;
use anyhow::Result;
use regex::Regex;

/// Recursion bound for nested expressions
const MAX_DEPTH: usize = 16;

/// Built-in identifier tokens that suggest the value is display text
const TEXT_IDENTIFIER_TOKENS: &[&str] = &["text", "label", "title", "message", "content", "children"];

/// Built-in translation function names and suffixes
const TRANSLATION_FUNCTIONS: &[&str] = &["t", "$t", "_t", "__", "i18n", "gettext", "ngettext"];
const TRANSLATION_SUFFIXES: &[&str] = &[
    "translate",
    "translation",
    "i18n",
    "formatmessage",
    "gettext",
    "localize",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    Ternary,
    LogicalOr,
    LogicalAnd,
    StringLiteral,
    NumericLiteral,
    TemplateLiteral,
    TranslationCall,
    TextIdentifier,
}

type Strategy = fn(&ExpressionResolver, &str, usize) -> Option<AccessibleText>;

/// Ordered by operator precedence: the loosest-binding shape is split first.
const PATTERNS: &[(ExpressionKind, Strategy)] = &[
    (ExpressionKind::Ternary, resolve_ternary),
    (ExpressionKind::LogicalOr, resolve_logical_or),
    (ExpressionKind::LogicalAnd, resolve_logical_and),
    (ExpressionKind::StringLiteral, resolve_string_literal),
    (ExpressionKind::NumericLiteral, resolve_numeric_literal),
    (ExpressionKind::TemplateLiteral, resolve_template_literal),
    (ExpressionKind::TranslationCall, resolve_translation_call),
    (ExpressionKind::TextIdentifier, resolve_text_identifier),
];

/// A value an expression may take, as far as lexical analysis can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Literal(String),
    Opaque,
}

pub struct ExpressionResolver {
    call_head: Regex,
    identifier_path: Regex,
    numeric: Regex,
    translation_names: Vec<String>,
    text_tokens: Vec<String>,
}

impl ExpressionResolver {
    pub fn new(config: &HeuristicsConfig) -> Result<Self> {
        let mut translation_names: Vec<String> =
            TRANSLATION_FUNCTIONS.iter().map(|s| s.to_string()).collect();
        translation_names.extend(config.translation_functions.iter().cloned());

        let mut text_tokens: Vec<String> =
            TEXT_IDENTIFIER_TOKENS.iter().map(|s| s.to_string()).collect();
        text_tokens.extend(config.text_identifier_tokens.iter().map(|t| t.to_lowercase()));

        Ok(Self {
            call_head: Regex::new(r"^((?:[A-Za-z_$][\w$]*\s*\??\.\s*)*([A-Za-z_$][\w$]*))\s*\(")?,
            identifier_path: Regex::new(
                r"^[A-Za-z_$][\w$]*(?:\s*\??\.\s*[A-Za-z_$][\w$]*|\[[^\[\]]+\])*$",
            )?,
            numeric: Regex::new(r"^-?\d+(?:\.\d+)?$")?,
            translation_names,
            text_tokens,
        })
    }

    /// Resolve raw expression source to accessible text.
    pub fn resolve(&self, raw: &str) -> AccessibleText {
        self.resolve_at(raw, 0)
    }

    /// Which table row recognizes this expression, if any.
    pub fn classify(&self, raw: &str) -> Option<ExpressionKind> {
        let source = strip_wrapping(raw);
        PATTERNS
            .iter()
            .find(|(_, strategy)| strategy(self, source, 0).is_some())
            .map(|(kind, _)| *kind)
    }

    fn resolve_at(&self, raw: &str, depth: usize) -> AccessibleText {
        if depth > MAX_DEPTH {
            return AccessibleText::Absent;
        }
        let source = strip_wrapping(raw);
        if source.is_empty() {
            return AccessibleText::Absent;
        }
        for (_, strategy) in PATTERNS {
            if let Some(result) = strategy(self, source, depth) {
                return result;
            }
        }
        AccessibleText::Absent
    }

    /// Enumerate the values an expression can produce: both ternary branches,
    /// both sides of `||`/`??`, the right side of `&&`. Anything that is not a
    /// plain literal is `Opaque`.
    pub fn literal_candidates(&self, raw: &str) -> Vec<Candidate> {
        let mut out = Vec::new();
        self.collect_candidates(raw, 0, &mut out);
        out
    }

    fn collect_candidates(&self, raw: &str, depth: usize, out: &mut Vec<Candidate>) {
        if depth > MAX_DEPTH {
            out.push(Candidate::Opaque);
            return;
        }
        let source = strip_wrapping(raw);

        if let Some((_, consequent, alternate)) = split_ternary(source) {
            self.collect_candidates(consequent, depth + 1, out);
            self.collect_candidates(alternate, depth + 1, out);
            return;
        }
        if let Some((left, right)) = split_logical_or(source) {
            self.collect_candidates(left, depth + 1, out);
            self.collect_candidates(right, depth + 1, out);
            return;
        }
        if let Some((_, right)) = split_binary(source, "&&") {
            self.collect_candidates(right, depth + 1, out);
            return;
        }
        if let Some(content) = string_literal(source) {
            out.push(Candidate::Literal(content));
            return;
        }
        if let Some((statics, interpolations)) = template_parts(source) {
            if interpolations.is_empty() {
                out.push(Candidate::Literal(statics.concat()));
                return;
            }
        }
        out.push(Candidate::Opaque);
    }

    fn is_translation_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.translation_names.iter().any(|n| n == name)
            || TRANSLATION_SUFFIXES
                .iter()
                .any(|suffix| lower.ends_with(suffix))
    }

    fn is_text_like(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        self.text_tokens.iter().any(|token| lower.contains(token.as_str()))
    }
}

// ===== STRATEGIES =====

fn resolve_ternary(resolver: &ExpressionResolver, source: &str, depth: usize) -> Option<AccessibleText> {
    let (_, consequent, alternate) = split_ternary(source)?;
    let preferred = resolver.resolve_at(consequent, depth + 1);
    if !preferred.is_absent() {
        return Some(preferred);
    }
    Some(resolver.resolve_at(alternate, depth + 1))
}

fn resolve_logical_or(resolver: &ExpressionResolver, source: &str, depth: usize) -> Option<AccessibleText> {
    let (left, right) = split_logical_or(source)?;
    let first = resolver.resolve_at(left, depth + 1);
    if !first.is_absent() {
        return Some(first);
    }
    Some(resolver.resolve_at(right, depth + 1))
}

fn resolve_logical_and(resolver: &ExpressionResolver, source: &str, depth: usize) -> Option<AccessibleText> {
    let (_, right) = split_binary(source, "&&")?;
    Some(resolver.resolve_at(right, depth + 1))
}

fn resolve_string_literal(_: &ExpressionResolver, source: &str, _: usize) -> Option<AccessibleText> {
    string_literal(source).map(AccessibleText::confirmed)
}

fn resolve_numeric_literal(resolver: &ExpressionResolver, source: &str, _: usize) -> Option<AccessibleText> {
    if resolver.numeric.is_match(source) {
        Some(AccessibleText::confirmed(source.to_string()))
    } else {
        None
    }
}

fn resolve_template_literal(resolver: &ExpressionResolver, source: &str, depth: usize) -> Option<AccessibleText> {
    let (statics, interpolations) = template_parts(source)?;
    let joined = statics
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !joined.is_empty() {
        return Some(AccessibleText::Confirmed(joined));
    }
    let any_likely = interpolations
        .iter()
        .any(|inner| resolver.resolve_at(inner, depth + 1).is_likely());
    Some(if any_likely {
        AccessibleText::Inferred
    } else {
        AccessibleText::Absent
    })
}

fn resolve_translation_call(resolver: &ExpressionResolver, source: &str, _: usize) -> Option<AccessibleText> {
    let captures = resolver.call_head.captures(source)?;
    let name = captures.get(2)?.as_str();
    if !resolver.is_translation_name(name) {
        return None;
    }
    // The call (or a chain of curried calls) must span the whole expression:
    // `t('a') + x` is not a bare call.
    let mut open = captures.get(0)?.end() - 1;
    loop {
        let close = matching_close(source, open)?;
        if close == source.len() - 1 {
            return Some(AccessibleText::Inferred);
        }
        let rest = &source[close + 1..];
        let next = rest.trim_start();
        if !next.starts_with('(') {
            return None;
        }
        open = close + 1 + (rest.len() - next.len());
    }
}

fn resolve_text_identifier(resolver: &ExpressionResolver, source: &str, _: usize) -> Option<AccessibleText> {
    if !resolver.identifier_path.is_match(source) {
        return None;
    }
    Some(if resolver.is_text_like(source) {
        AccessibleText::Inferred
    } else {
        AccessibleText::Absent
    })
}

// ===== LEXICAL HELPERS =====

/// Trim and peel balanced `{...}` / `(...)` wrappers.
pub fn strip_wrapping(raw: &str) -> &str {
    let mut source = raw.trim();
    loop {
        let bytes = source.as_bytes();
        if bytes.len() >= 2
            && matches!((bytes[0], bytes[bytes.len() - 1]), (b'{', b'}') | (b'(', b')'))
            && matching_close(source, 0) == Some(source.len() - 1)
        {
            source = source[1..source.len() - 1].trim();
        } else {
            return source;
        }
    }
}

/// Index one past the closing quote of the string literal starting at
/// `start`, or `None` when the literal is never closed.
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    let mut interpolation_depth = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if quote == b'`' {
            if b == b'$' && bytes.get(i + 1) == Some(&b'{') {
                interpolation_depth += 1;
                i += 2;
                continue;
            }
            if b == b'}' && interpolation_depth > 0 {
                interpolation_depth -= 1;
                i += 1;
                continue;
            }
        }
        if b == quote && interpolation_depth == 0 {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// Position of the bracket closing the one opened at `open`.
fn matching_close(source: &str, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Byte offsets of every top-level (depth 0, outside strings) ASCII byte.
/// Operators are ASCII, so every offset is a char boundary.
fn top_level_positions(source: &str) -> Vec<usize> {
    let bytes = source.as_bytes();
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b if depth == 0 && b.is_ascii() => positions.push(i),
            _ => {}
        }
        i += 1;
    }
    positions
}

fn split_binary<'a>(source: &'a str, operator: &str) -> Option<(&'a str, &'a str)> {
    top_level_positions(source)
        .into_iter()
        .find(|&i| source[i..].starts_with(operator))
        .map(|i| (source[..i].trim(), source[i + operator.len()..].trim()))
        .filter(|(left, right)| !left.is_empty() && !right.is_empty())
}

fn split_logical_or(source: &str) -> Option<(&str, &str)> {
    top_level_positions(source)
        .into_iter()
        .find(|&i| source[i..].starts_with("||") || source[i..].starts_with("??"))
        .map(|i| (source[..i].trim(), source[i + 2..].trim()))
        .filter(|(left, right)| !left.is_empty() && !right.is_empty())
}

/// Split `test ? consequent : alternate` at top level, honoring nested
/// ternaries and ignoring `?.` and `??`.
fn split_ternary(source: &str) -> Option<(&str, &str, &str)> {
    let bytes = source.as_bytes();
    let positions = top_level_positions(source);
    let is_ternary_mark = |i: usize| {
        bytes[i] == b'?'
            && bytes.get(i + 1) != Some(&b'.')
            && bytes.get(i + 1) != Some(&b'?')
            && (i == 0 || bytes[i - 1] != b'?')
    };

    let question = positions.iter().copied().find(|&i| is_ternary_mark(i))?;
    let mut nested = 0usize;
    for &i in positions.iter().filter(|&&i| i > question) {
        if is_ternary_mark(i) {
            nested += 1;
        } else if bytes[i] == b':' {
            if nested == 0 {
                let test = source[..question].trim();
                let consequent = source[question + 1..i].trim();
                let alternate = source[i + 1..].trim();
                if test.is_empty() || consequent.is_empty() || alternate.is_empty() {
                    return None;
                }
                return Some((test, consequent, alternate));
            }
            nested -= 1;
        }
    }
    None
}

/// Content of a source that is exactly one `'...'` or `"..."` literal.
fn string_literal(source: &str) -> Option<String> {
    let bytes = source.as_bytes();
    let quote = *bytes.first()?;
    if quote != b'\'' && quote != b'"' {
        return None;
    }
    if skip_string(bytes, 0) != Some(bytes.len()) {
        return None;
    }
    Some(unescape(&source[1..source.len() - 1]))
}

/// Static segments and interpolation sources of a source that is exactly one
/// template literal.
fn template_parts(source: &str) -> Option<(Vec<String>, Vec<&str>)> {
    let bytes = source.as_bytes();
    if bytes.first() != Some(&b'`') || skip_string(bytes, 0) != Some(bytes.len()) {
        return None;
    }
    let body = &source[1..source.len() - 1];
    let mut statics = Vec::new();
    let mut interpolations = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("${") {
        statics.push(unescape(&rest[..start]));
        let close = matching_close(rest, start + 1)?;
        interpolations.push(&rest[start + 2..close]);
        rest = &rest[close + 1..];
    }
    statics.push(unescape(rest));
    Some((statics, interpolations))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
