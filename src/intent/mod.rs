pub mod classifier;
pub mod disambiguator;
pub mod types;

pub use classifier::IntentClassifier;
pub use disambiguator::{Disambiguator, Resolution};
pub use types::{Candidate, Intent, MutationKind};
