//! The built-in compatibility rules.

mod constraints;
mod sealing;

pub use constraints::CannotChangeGenericConstraints;
pub use sealing::CannotSealType;
