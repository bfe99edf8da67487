//! Font subsetting wrapper around hb-subset with builder pattern.
//!
//! Operates purely on byte slices with no file I/O. Callers decide which
//! codepoints to keep; this crate only knows how to ask HarfBuzz for them.
//!
//! # Example
//!
//! ```no_run
//! use fontsub_font_subsetter::{Subsetter, WEB_TABLES_TO_DROP};
//!
//! let font_data: &[u8] = &[];
//! let subset = Subsetter::new()
//!     .with_codepoints([0x41, 0x42, 0x43])
//!     .drop_tables(WEB_TABLES_TO_DROP.iter().map(|t| **t))
//!     .subset(font_data);
//! ```

use anyhow::Result;
use hb_subset::{Blob, FontFace, SubsetInput, Tag};

/// Tables that carry no value for web delivery.
///
/// `FFTM` is a FontForge timestamp; the rest are legacy hinting and device
/// metrics that browsers ignore.
pub const WEB_TABLES_TO_DROP: &[&[u8; 4]] =
    &[b"FFTM", b"DSIG", b"LTSH", b"PCLT", b"VDMX", b"hdmx"];

/// Layout features to retain during subsetting.
///
/// Browsers pick which of these to apply at shaping time.
pub const LAYOUT_FEATURES: &[&[u8; 4]] = &[
    b"aalt", b"ccmp", b"dlig", b"fwid", b"hwid", b"liga", b"locl", b"calt", b"clig", b"rlig",
    b"pwid", b"vert", b"vrt2", b"halt", b"vhal", b"kern", b"mark", b"mkmk", b"case", b"zero",
    b"frac", b"numr", b"dnom", b"sups", b"subs", b"ordn", b"rvrn",
];

/// Font subsetter with builder pattern.
#[derive(Debug, Clone, Default)]
pub struct Subsetter {
    codepoints: Vec<u32>,
    drop_tables: Vec<[u8; 4]>,
    retain_glyph_names: bool,
    layout_features: Vec<[u8; 4]>,
}

impl Subsetter {
    /// Creates a new subsetter that keeps [`LAYOUT_FEATURES`] and drops nothing
    /// beyond HarfBuzz's own defaults.
    pub fn new() -> Self {
        Self {
            layout_features: LAYOUT_FEATURES.iter().map(|f| **f).collect(),
            ..Default::default()
        }
    }

    /// Adds codepoints to include in the subset.
    ///
    /// Values that are not Unicode scalar values are ignored at subset time.
    pub fn with_codepoints(mut self, codepoints: impl IntoIterator<Item = u32>) -> Self {
        self.codepoints.extend(codepoints);
        self
    }

    /// Adds table tags to drop from the output.
    pub fn drop_tables(mut self, tables: impl IntoIterator<Item = [u8; 4]>) -> Self {
        self.drop_tables.extend(tables);
        self
    }

    /// Sets whether to retain glyph names in the subset.
    pub fn retain_glyph_names(mut self, retain: bool) -> Self {
        self.retain_glyph_names = retain;
        self
    }

    /// Subsets the font data and returns the resulting TrueType/OpenType bytes.
    pub fn subset(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut input = SubsetInput::new()?;

        if self.retain_glyph_names {
            input.flags().retain_glyph_names();
        }

        {
            let mut feature_set = input.layout_feature_tag_set();
            for tag in &self.layout_features {
                feature_set.insert(Tag::new(tag));
            }
        }

        {
            let mut unicode_set = input.unicode_set();
            for cp in &self.codepoints {
                if let Some(c) = char::from_u32(*cp) {
                    unicode_set.insert(c);
                }
            }
        }

        if !self.drop_tables.is_empty() {
            let mut drop_tables = input.drop_table_tag_set();
            for table in &self.drop_tables {
                drop_tables.insert(Tag::new(table));
            }
        }

        let font = FontFace::new(Blob::from_bytes(data)?)?;
        let subset_font = input.subset_font(&font)?;
        Ok(subset_font.underlying_blob().to_vec())
    }
}
