//! WOFF2 encoding for subset artifacts.
//!
//! Subsets are produced as plain TrueType/OpenType by HarfBuzz and then
//! wrapped here. Codepoints that are known to produce fonts rejected by
//! browsers' OTS sanitizer are filtered before subsetting.
//!
//! # Example
//!
//! ```no_run
//! use fontsub_font_woff2::{convert_to_woff2, retain_safe_codepoints};
//!
//! let codepoints = retain_safe_codepoints([0x41, 0xF8FF]);
//! assert_eq!(codepoints, vec![0x41]);
//!
//! let ttf_data: &[u8] = &[];
//! let woff2 = convert_to_woff2(ttf_data);
//! ```

use anyhow::{Result, anyhow, bail};
use ttf2woff2::{BrotliQuality, encode};

/// Codepoints known to cause WOFF2 OTS validation errors.
///
/// U+F8FF (Apple logo) references `.notdef` as a composite component,
/// which Chrome's OTS parser rejects during WOFF2 decompression.
pub const PROBLEMATIC_CODEPOINTS: &[u32] = &[0xF8FF];

/// WOFF2 file signature (`wOF2`).
pub const WOFF2_SIGNATURE: &[u8; 4] = b"wOF2";

/// Drops [`PROBLEMATIC_CODEPOINTS`] from a codepoint collection.
pub fn retain_safe_codepoints(codepoints: impl IntoIterator<Item = u32>) -> Vec<u32> {
    codepoints.into_iter().filter(|cp| !PROBLEMATIC_CODEPOINTS.contains(cp)).collect()
}

/// Encodes TrueType/OpenType data as WOFF2 at the default Brotli quality.
pub fn convert_to_woff2(ttf_data: &[u8]) -> Result<Vec<u8>> {
    if ttf_data.is_empty() {
        bail!("Cannot encode an empty font as WOFF2");
    }
    encode(ttf_data, BrotliQuality::default()).map_err(|e| anyhow!("WOFF2 encoding failed: {e:?}"))
}

/// Returns `true` when `data` starts with the WOFF2 signature.
pub fn is_woff2(data: &[u8]) -> bool {
    data.starts_with(WOFF2_SIGNATURE)
}
