//! Subset definition table.

use std::{fs, path::Path};

use crate::error::{Error, Result};

/// One configured subset: its position in the table and its range spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetDefinition {
    pub index: usize,
    pub range_spec: String,
}

/// Built-in script blocks, in the order browsers usually list them.
///
/// Order is significant: a subset's index feeds its cache key.
pub const DEFAULT_SUBSETS: &[(&str, &str)] = &[
    (
        "cyrillic-ext",
        "U+0460-052F, U+1C80-1C88, U+20B4, U+2DE0-2DFF, U+A640-A69F, U+FE2E-FE2F",
    ),
    ("cyrillic", "U+0301, U+0400-045F, U+0490-0491, U+04B0-04B1, U+2116"),
    ("greek-ext", "U+1F00-1FFF"),
    ("greek", "U+0370-0377, U+037A-037F, U+0384-038A, U+038C, U+038E-03A1, U+03A3-03FF"),
    (
        "vietnamese",
        "U+0102-0103, U+0110-0111, U+0128-0129, U+0168-0169, U+01A0-01A1, U+01AF-01B0, \
         U+0300-0301, U+0303-0304, U+0308-0309, U+0323, U+0329, U+1EA0-1EF9, U+20AB",
    ),
    (
        "latin-ext",
        "U+0100-02AF, U+0304, U+0308, U+0329, U+1E00-1E9F, U+1EF2-1EFF, U+2020, U+20A0-20AB, \
         U+20AD-20C0, U+2113, U+2C60-2C7F, U+A720-A7FF",
    ),
    (
        "latin",
        "U+0000-00FF, U+0131, U+0152-0153, U+02BB-02BC, U+02C6, U+02DA, U+02DC, U+0304, U+0308, \
         U+0329, U+2000-206F, U+2074, U+20AC, U+2122, U+2191, U+2193, U+2212, U+2215, U+FEFF, \
         U+FFFD",
    ),
];

/// Build a table from range specs, numbering them by position.
pub fn from_specs<S: Into<String>>(specs: impl IntoIterator<Item = S>) -> Vec<SubsetDefinition> {
    specs
        .into_iter()
        .enumerate()
        .map(|(index, spec)| SubsetDefinition { index, range_spec: spec.into() })
        .collect()
}

/// The built-in table.
pub fn default_subsets() -> Vec<SubsetDefinition> {
    from_specs(DEFAULT_SUBSETS.iter().map(|(_, spec)| *spec))
}

/// Load a table from a JSON file holding an array of range-spec strings.
pub fn load_subsets(path: &Path) -> Result<Vec<SubsetDefinition>> {
    let config_error = |message: String| Error::Config { path: path.to_path_buf(), message };

    let text = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let specs: Vec<String> = serde_json::from_str(&text).map_err(|e| config_error(e.to_string()))?;
    if specs.is_empty() {
        return Err(config_error("subset table is empty".to_string()));
    }
    Ok(from_specs(specs))
}
