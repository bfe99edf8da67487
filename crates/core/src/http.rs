//! Request shapes for the stylesheet, listing and artifact endpoints.
//!
//! These are transport-agnostic: each handler takes the raw request input and
//! returns a [`Response`] that any HTTP layer can turn into a reply.

use std::{borrow::Cow, collections::BTreeSet};

use serde_json::json;
use url::form_urlencoded;

use crate::{cache_key::CacheKey, service::FontService};

pub const DEFAULT_DISPLAY: &str = "swap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub cache_control: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self { status, content_type, cache_control: None, body: body.into() }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, "text/plain", body.into())
    }

    fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, "application/json", value.to_string())
    }

    fn max_age(mut self, seconds: u64) -> Self {
        self.cache_control = Some(format!("public, max-age={seconds}"));
        self
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Parsed `family` and `display` parameters of a stylesheet request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssQuery {
    pub families: BTreeSet<String>,
    pub display: String,
}

impl CssQuery {
    /// Parse a raw query string such as `family=Noto+Sans+SC:400|Satisfy&display=block`.
    pub fn from_query(raw: &str) -> Self {
        let mut families = BTreeSet::new();
        let mut display = None;

        for (key, value) in form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
            match &*key {
                "family" => families.extend(
                    value.split('|').map(str::trim).filter(|s| !s.is_empty()).map(String::from),
                ),
                "display" if !value.trim().is_empty() => display = Some(value.trim().to_string()),
                _ => {}
            }
        }

        Self { families, display: display.unwrap_or_else(|| DEFAULT_DISPLAY.to_string()) }
    }
}

/// `GET /css?family=...&display=...`
pub fn handle_css(service: &FontService, raw_query: &str) -> Response {
    let query = CssQuery::from_query(raw_query);
    if query.families.is_empty() {
        return Response::text(400, "family parameter is required");
    }

    match service.stylesheet(&query.families, &query.display) {
        Ok(css) => Response::new(200, "text/css", css.as_bytes())
            .max_age(service.config().cache_max_age),
        Err(e) => Response::text(500, e.to_string()),
    }
}

/// `GET /list`
pub fn handle_list(service: &FontService) -> Response {
    let listing = service
        .list_fonts()
        .map_err(|e| e.to_string())
        .and_then(|listing| serde_json::to_value(&listing).map_err(|e| e.to_string()));

    match listing {
        Ok(value) => Response::json(200, &value),
        Err(message) => Response::json(500, &json!({ "status": "error", "message": message })),
    }
}

/// `GET /s/{key}.woff2`
///
/// Only names shaped like a derived cache key are served.
pub fn handle_artifact(service: &FontService, file_name: &str) -> Response {
    let Some(key) = file_name.strip_suffix(".woff2").and_then(CacheKey::parse) else {
        return Response::text(404, "not found");
    };

    match service.cached_artifact(&key) {
        Ok(Some(bytes)) => {
            Response::new(200, "font/woff2", bytes).max_age(service.config().font_max_age)
        }
        Ok(None) => Response::text(404, "not found"),
        Err(e) => Response::text(500, e.to_string()),
    }
}
