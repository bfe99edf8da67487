//! Listing of the source fonts available for subsetting.

use std::{fs, path::Path};

use serde::Serialize;
use url::form_urlencoded::byte_serialize;

use crate::{
    error::{Error, Result},
    io::{family_from_file_name, find_files_by_extension},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontEntry {
    pub name: String,
    pub filename: String,
    pub size: u64,
    pub size_mb: f64,
    /// Stylesheet URL for the family at its default weight.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontListing {
    pub status: &'static str,
    pub count: usize,
    pub fonts: Vec<FontEntry>,
}

/// `.ttf` and `.otf` files directly inside `font_dir`, sorted by name ignoring case.
pub fn list_fonts(font_dir: &Path, base_url: &str) -> Result<FontListing> {
    let base_url = base_url.trim_end_matches('/');
    let mut fonts = Vec::new();

    for path in find_files_by_extension(font_dir, &["ttf", "otf"], false)? {
        let filename = path.file_name().unwrap_or_default().to_string_lossy().into_owned();
        let name = family_from_file_name(&filename);
        let size = fs::metadata(&path)
            .map_err(|source| Error::ReadFont { path: path.clone(), source })?
            .len();
        let family: String = byte_serialize(name.as_bytes()).collect();

        fonts.push(FontEntry {
            url: format!("{base_url}/css?family={family}"),
            size_mb: (size as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            name,
            filename,
            size,
        });
    }

    fonts.sort_by_key(|f| f.name.to_lowercase());
    Ok(FontListing { status: "success", count: fonts.len(), fonts })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_list_fonts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("satisfy.ttf"), vec![0u8; 1024 * 1024 * 3 / 2]).unwrap();
        fs::write(dir.path().join("Noto Sans SC.OTF"), b"abc").unwrap();
        fs::write(dir.path().join("Alpha.ttf"), b"").unwrap();
        fs::write(dir.path().join("readme.md"), b"").unwrap();

        let listing = list_fonts(dir.path(), "https://fonts.example/").unwrap();
        assert_eq!(listing.status, "success");
        assert_eq!(listing.count, 3);

        let names: Vec<_> = listing.fonts.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Noto Sans SC", "satisfy"]);

        let noto = &listing.fonts[1];
        assert_eq!(noto.filename, "Noto Sans SC.OTF");
        assert_eq!(noto.size, 3);
        assert_eq!(noto.url, "https://fonts.example/css?family=Noto+Sans+SC");

        assert_eq!(listing.fonts[2].size_mb, 1.5);
    }

    #[test]
    fn test_listing_json_shape() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Demo.ttf"), b"x").unwrap();
        let value = serde_json::to_value(list_fonts(dir.path(), "").unwrap()).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["count"], 1);
        let font = &value["fonts"][0];
        for field in ["name", "filename", "size", "size_mb", "url"] {
            assert!(font.get(field).is_some(), "missing {field}");
        }
        assert_eq!(font["url"], "/css?family=Demo");
    }

    #[test]
    fn test_missing_dir_lists_nothing() {
        let dir = tempdir().unwrap();
        let listing = list_fonts(&dir.path().join("nope"), "").unwrap();
        assert_eq!(listing.count, 0);
    }
}
