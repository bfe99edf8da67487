//! The subsetting engine boundary.
//!
//! The orchestrator treats subsetting and encoding as one opaque call. The
//! default engine uses HarfBuzz for the subset and `ttf2woff2` for the
//! encoding.

use std::collections::BTreeSet;

use anyhow::{Result, bail};
use fontsub_font_subsetter::{Subsetter, WEB_TABLES_TO_DROP};
use fontsub_font_woff2::{convert_to_woff2, is_woff2, retain_safe_codepoints};

/// Knobs passed to a [`SubsetEngine`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetOptions {
    /// Tables dropped on top of the engine's defaults.
    pub drop_tables: Vec<[u8; 4]>,
    pub retain_glyph_names: bool,
}

impl SubsetOptions {
    /// First attempt: drop everything a web font does not need.
    pub fn strict() -> Self {
        Self {
            drop_tables: WEB_TABLES_TO_DROP.iter().map(|t| **t).collect(),
            retain_glyph_names: false,
        }
    }

    /// Retry: keep every table, so fewer tables have to be rewritten.
    pub fn relaxed() -> Self {
        Self { drop_tables: Vec::new(), retain_glyph_names: false }
    }
}

/// Produces one artifact from a font and a codepoint set.
pub trait SubsetEngine: Send + Sync {
    fn subset(
        &self,
        font_data: &[u8],
        codepoints: &BTreeSet<u32>,
        options: &SubsetOptions,
    ) -> Result<Vec<u8>>;
}

/// HarfBuzz subsetting followed by WOFF2 encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarfBuzzEngine;

impl SubsetEngine for HarfBuzzEngine {
    fn subset(
        &self,
        font_data: &[u8],
        codepoints: &BTreeSet<u32>,
        options: &SubsetOptions,
    ) -> Result<Vec<u8>> {
        let codepoints = retain_safe_codepoints(codepoints.iter().copied());
        if codepoints.is_empty() {
            bail!("No codepoints left to subset");
        }

        let ttf = Subsetter::new()
            .with_codepoints(codepoints)
            .drop_tables(options.drop_tables.iter().copied())
            .retain_glyph_names(options.retain_glyph_names)
            .subset(font_data)?;
        let woff2 = convert_to_woff2(&ttf)?;
        if !is_woff2(&woff2) {
            bail!("Encoder output is not WOFF2");
        }
        Ok(woff2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relaxed_drops_fewer_tables() {
        let strict = SubsetOptions::strict();
        let relaxed = SubsetOptions::relaxed();
        assert!(relaxed.drop_tables.len() < strict.drop_tables.len());
        assert!(strict.drop_tables.contains(b"FFTM"));
    }

    #[test]
    fn test_only_problematic_codepoints_is_an_error() {
        let codepoints = BTreeSet::from([0xF8FF]);
        let result = HarfBuzzEngine.subset(&[], &codepoints, &SubsetOptions::strict());
        assert!(result.is_err());
    }
}
