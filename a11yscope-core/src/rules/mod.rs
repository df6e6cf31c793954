// Rules module - the registry, selector matching and the engine live here,
// validator families in their own files:
// - selector.rs: Selector predicates and bulk matching
// - registry.rs: Rule, ValidationContext and RuleRegistry
// - engine.rs: RuleEngine, validator isolation and dedup
// - images.rs, forms.rs, interactive.rs, aria.rs: single-element checks
// - structure.rs: fieldset/html-lang checks and the multi-element passes

pub mod aria;
pub mod engine;
pub mod forms;
pub mod images;
pub mod interactive;
pub mod registry;
pub mod selector;
pub mod structure;

pub use engine::{DebugConfig, RuleEngine};
pub use registry::{Rule, RuleCheck, RuleRegistry, ValidateFn, ValidationContext};
pub use selector::Selector;
