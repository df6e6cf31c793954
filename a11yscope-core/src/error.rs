use thiserror::Error;

/// Errors raised while building a rule registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("rule `{0}` is already registered")]
    DuplicateRule(String),
}

/// An isolated validator failure. Never fatal: the engine logs it and treats
/// the (rule, element) pair as "no violation detected".
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("validator for `{rule_id}` failed on <{element_tag}>: {source}")]
    Failed {
        rule_id: String,
        element_tag: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("validator for `{rule_id}` panicked on <{element_tag}>: {message}")]
    Panicked {
        rule_id: String,
        element_tag: String,
        message: String,
    },
}
