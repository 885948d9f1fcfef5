pub mod grouper;
pub mod hasher;
pub mod resolver;

pub use grouper::{analyze_duplicates, DuplicateAnalysis, DuplicateGroup};
