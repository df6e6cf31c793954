pub mod expression;
pub mod text;

pub use expression::{Candidate, ExpressionKind, ExpressionResolver};
pub use text::{AccessibleText, TextExtractor};
