//! Read-only commands over built subsets.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use fontsub_core::{
    CacheKey, FontService, derive_key,
    http::{Response, handle_artifact, handle_css, handle_list},
};
use url::form_urlencoded::Serializer;

fn ok_body(response: Response) -> Result<Response> {
    if response.status != 200 {
        bail!("{} ({})", response.body_text(), response.status);
    }
    Ok(response)
}

/// Stylesheet text, produced the same way the `/css` endpoint produces it.
pub fn css(service: &FontService, families: &[String], display: &str) -> Result<String> {
    let query = Serializer::new(String::new())
        .append_pair("family", &families.join("|"))
        .append_pair("display", display)
        .finish();
    Ok(ok_body(handle_css(service, &query))?.body_text().into_owned())
}

/// Font listing as pretty-printed JSON.
pub fn list(service: &FontService) -> Result<String> {
    let response = ok_body(handle_list(service))?;
    let value: serde_json::Value = serde_json::from_slice(&response.body)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn meta(service: &FontService, family: &str) -> Result<String> {
    let records = service.metadata(family)?;
    Ok(serde_json::to_string_pretty(&*records)?)
}

pub fn key(family: &str, index: usize) -> CacheKey {
    derive_key(family, index)
}

pub fn artifact(service: &FontService, file: &str, output: &Path) -> Result<()> {
    let response = ok_body(handle_artifact(service, file))?;
    fs::write(output, &response.body)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{file} -> {} ({} bytes)", output.display(), response.body.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use fontsub_core::Config;
    use tempfile::tempdir;

    use super::*;

    fn service(root: &Path) -> FontService {
        let config = Config {
            font_dir: root.join("fonts"),
            cache_dir: root.join("cache"),
            meta_dir: root.join("meta"),
            ..Config::default()
        };
        FontService::new(config).unwrap()
    }

    #[test]
    fn test_key_is_stable() {
        assert_eq!(key("Demo", 0).as_str().len(), 32);
        assert_eq!(key("Demo", 0), key("Demo", 0));
        assert_ne!(key("Demo", 0), key("Demo", 1));
    }

    #[test]
    fn test_queries_on_empty_service() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());

        assert_eq!(css(&service, &["Nobody".to_string()], "swap").unwrap(), "");
        assert!(list(&service).unwrap().contains("\"count\": 0"));
        assert_eq!(meta(&service, "Nobody").unwrap(), "[]");

        let file = key("Nobody", 0).artifact_file_name();
        let err = artifact(&service, &file, &dir.path().join("out.woff2")).unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_css_without_families_fails() {
        let dir = tempdir().unwrap();
        assert!(css(&service(dir.path()), &[], "swap").is_err());
    }
}
