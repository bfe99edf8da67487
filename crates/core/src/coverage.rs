//! Coverage of a requested codepoint set against a font's cmap.

use std::{collections::BTreeSet, path::Path};

use skrifa::{FontRef, MetadataProvider};

use crate::{
    error::{Error, Result},
    io::FontFile,
};

/// Codepoints the font maps to a real glyph, read from its best cmap subtable.
pub fn supported_codepoints(data: &[u8]) -> std::result::Result<BTreeSet<u32>, String> {
    let font = FontRef::new(data).map_err(|e| e.to_string())?;
    Ok(font
        .charmap()
        .mappings()
        .filter(|(_, gid)| gid.to_u32() != 0)
        .map(|(cp, _)| cp)
        .collect())
}

/// Like [`supported_codepoints`], reading the font from disk.
///
/// This parses the whole cmap; call it once per font per build pass.
pub fn supported_codepoints_from_path(path: &Path) -> Result<BTreeSet<u32>> {
    let data = FontFile::new(path).read()?;
    supported_codepoints(&data)
        .map_err(|message| Error::ParseFont { path: path.to_path_buf(), message })
}

/// Result of intersecting a requested set with a font's supported set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coverage {
    /// Requested codepoints the font can render.
    pub actual: BTreeSet<u32>,
    /// Requested codepoints the font lacks.
    pub missing: BTreeSet<u32>,
    /// `|actual| / |requested|`, or 0 when nothing was requested.
    pub ratio: f64,
}

impl Coverage {
    pub fn compute(requested: &BTreeSet<u32>, supported: &BTreeSet<u32>) -> Self {
        let actual: BTreeSet<u32> = requested.intersection(supported).copied().collect();
        let missing: BTreeSet<u32> = requested.difference(supported).copied().collect();
        let ratio = if requested.is_empty() {
            0.0
        } else {
            actual.len() as f64 / requested.len() as f64
        };
        Self { actual, missing, ratio }
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }

    pub fn supported_count(&self) -> usize {
        self.actual.len()
    }

    /// Ratio rounded to three decimals, as persisted in metadata.
    ///
    /// A non-empty intersection never rounds down to zero.
    pub fn rounded_ratio(&self) -> f64 {
        let rounded = (self.ratio * 1000.0).round() / 1000.0;
        if self.is_empty() { rounded } else { rounded.max(0.001) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_partial_coverage() {
        let coverage = Coverage::compute(&set(&[0x41, 0x42, 0x43]), &set(&[0x41, 0x42, 0x61]));
        assert_eq!(coverage.actual, set(&[0x41, 0x42]));
        assert_eq!(coverage.missing, set(&[0x43]));
        assert!((coverage.ratio - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(coverage.rounded_ratio(), 0.667);
        assert_eq!(coverage.supported_count(), 2);
    }

    #[test]
    fn test_empty_request_has_zero_coverage() {
        let coverage = Coverage::compute(&BTreeSet::new(), &set(&[0x41]));
        assert_eq!(coverage.ratio, 0.0);
        assert!(coverage.is_empty());
        assert!(coverage.missing.is_empty());
    }

    #[test]
    fn test_no_overlap() {
        let coverage = Coverage::compute(&set(&[0xFFFF]), &set(&[0x41]));
        assert_eq!(coverage.ratio, 0.0);
        assert_eq!(coverage.missing, set(&[0xFFFF]));
    }

    #[test]
    fn test_full_coverage() {
        let coverage = Coverage::compute(&set(&[0x41, 0x42]), &set(&[0x41, 0x42, 0x43]));
        assert_eq!(coverage.ratio, 1.0);
        assert_eq!(coverage.rounded_ratio(), 1.0);
    }

    #[test]
    fn test_sparse_coverage_stays_nonzero() {
        let requested: BTreeSet<u32> = (0x4E00..=0x9FFF).collect();
        let coverage = Coverage::compute(&requested, &set(&[0x4E00]));
        assert!(coverage.ratio < 0.0005);
        assert_eq!(coverage.rounded_ratio(), 0.001);
        assert_eq!(coverage.supported_count(), 1);
    }

    #[test]
    fn test_unparseable_font() {
        assert!(supported_codepoints(b"definitely not a font").is_err());
    }
}
