//! fontsub core: a content-addressed cache of font subsets and the
//! `@font-face` stylesheets that reference them.
//!
//! Leaves first:
//!
//! - [`unicode_range`] parses `U+HHHH[-HHHH]` specifications.
//! - [`cache_key`] derives the artifact fingerprint of a (family, subset) pair.
//! - [`coverage`] intersects requested codepoints with a font's cmap.
//! - [`scheduler`] builds stale subsets in parallel and records their coverage.
//! - [`metadata`] persists per-subset records and indexes them per family.
//! - [`css`] turns family specs into memoized stylesheet text.

pub mod cache_key;
pub mod config;
pub mod coverage;
pub mod css;
pub mod engine;
pub mod error;
pub mod http;
pub mod io;
pub mod listing;
pub mod metadata;
pub mod scheduler;
pub mod service;
pub mod subsets;
pub mod unicode_range;

pub use cache_key::{CacheKey, derive_key};
pub use config::Config;
pub use coverage::{Coverage, supported_codepoints, supported_codepoints_from_path};
pub use css::{CssSynthesizer, FamilySpec, Variant};
pub use engine::{HarfBuzzEngine, SubsetEngine, SubsetOptions};
pub use error::{Error, Result};
pub use metadata::{MetadataRecord, MetadataStore};
pub use scheduler::{BuildReport, SubsetBuildScheduler, SubsetOutcome, SubsetStatus};
pub use service::FontService;
pub use subsets::{SubsetDefinition, default_subsets};
pub use unicode_range::{ParseWarning, UnicodeRange, parse_unicode_range};
