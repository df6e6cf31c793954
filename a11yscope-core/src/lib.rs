// a11yscope Core Library
//
// Static, heuristic accessibility checking over parsed UI element trees.
// Main interface for turning component trees into scored compliance reports.

pub mod types;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod context;
pub mod rules;
pub mod scoring;
pub mod fingerprint;
pub mod analyzer;

// Re-export main types and functions for easy use
pub use types::*;
pub use analyzer::AccessibilityAnalyzer;
pub use config::AnalyzerConfig;
pub use error::{RegistryError, ValidationError};
pub use heuristics::{AccessibleText, TextExtractor};
pub use context::{ContextAnalyzer, LabelResolution};
pub use rules::{DebugConfig, Rule, RuleEngine, RuleRegistry, Selector};
