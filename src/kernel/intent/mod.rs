pub mod types;
pub mod matcher;
pub mod cascade;

pub use types::*;
pub use cascade::{Classification, IntentClassifier, IntentClassifierCascade};
