//! CLI command implementations.

mod build;
mod query;

pub use build::{BuildSummary, build};
pub use query::{artifact, css, key, list, meta};
