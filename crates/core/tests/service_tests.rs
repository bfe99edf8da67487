//! Stylesheet, listing and artifact handlers over a built family.

mod common;

use common::{FakeEngine, Fixture};
use fontsub_core::{
    FontService, derive_key,
    http::{handle_artifact, handle_css, handle_list},
};

fn built_demo() -> (Fixture, FontService) {
    let fixture = Fixture::new(&["U+0041-0043", "U+FFFF", "U+0061-0062"]);
    fixture.add_font("Demo.ttf", &[0x41, 0x42, 0x61, 0x62]);
    let service = fixture.service(FakeEngine::new());
    service.build_family("Demo", false).unwrap();
    (fixture, service)
}

#[test]
fn test_css_requires_family() {
    let (_fixture, service) = built_demo();

    let response = handle_css(&service, "display=swap");
    assert_eq!(response.status, 400);
    assert_eq!(response.body_text(), "family parameter is required");
}

#[test]
fn test_css_for_built_family() {
    let (fixture, service) = built_demo();

    let response = handle_css(&service, "family=Demo:400,700italic&display=block");
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "text/css");
    assert_eq!(
        response.cache_control.as_deref(),
        Some(format!("public, max-age={}", fixture.config.cache_max_age).as_str())
    );

    let css = response.body_text();
    // Two covered subsets, two variants.
    assert_eq!(css.matches("@font-face").count(), 4);
    assert!(!css.contains("U+FFFF"));
    assert!(css.contains("font-display: block;"));
    assert!(css.contains("font-style: italic;"));
    assert!(css.contains(&format!("url('/s/{}')", derive_key("Demo", 2).artifact_file_name())));
}

#[test]
fn test_css_is_stable_across_calls() {
    let (_fixture, service) = built_demo();

    let first = handle_css(&service, "family=Demo|Other");
    let second = handle_css(&service, "family=Other|Demo");
    assert_eq!(first.body, second.body);
}

#[test]
fn test_css_reflects_rebuilt_metadata() {
    let (_fixture, service) = built_demo();
    let before = handle_css(&service, "family=Demo").body_text().into_owned();

    service.build_family("Demo", true).unwrap();
    let after = handle_css(&service, "family=Demo").body_text().into_owned();
    assert_eq!(before, after);

    service
        .store()
        .put(&fontsub_core::MetadataRecord::new("Demo", 1, "U+FFFF", 1.0, 1))
        .unwrap();
    let updated = handle_css(&service, "family=Demo").body_text().into_owned();
    assert_eq!(updated.matches("@font-face").count(), 3);
}

#[test]
fn test_css_with_corrupt_metadata_is_a_server_error() {
    let (fixture, service) = built_demo();
    let file = derive_key("Demo", 0).metadata_file_name();
    let path = fixture.config.meta_dir.join("Demo").join(file);
    std::fs::write(path, b"{ not json").unwrap();
    service.store().invalidate("Demo");

    let response = handle_css(&service, "family=Demo");
    assert_eq!(response.status, 500);
}

#[test]
fn test_css_ignores_names_outside_the_metadata_layout() {
    let (fixture, service) = built_demo();
    std::fs::write(fixture.dir.path().join("foreign.json"), b"{ not a record").unwrap();

    for query in ["family=:400", "family=..", "family=../..:700", "family=%2E%2E%2Fmeta%2FDemo"] {
        let response = handle_css(&service, query);
        assert_eq!(response.status, 200, "{query}");
        assert_eq!(response.body_text(), "", "{query}");
    }
    assert_eq!(service.store().cached_families(), 0);
}

#[test]
fn test_list() {
    let (_fixture, service) = built_demo();

    let response = handle_list(&service);
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "application/json");

    let value: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["count"], 1);
    assert_eq!(value["fonts"][0]["name"], "Demo");
    assert_eq!(value["fonts"][0]["url"], "http://localhost:8080/css?family=Demo");
}

#[test]
fn test_artifact_serving() {
    let (fixture, service) = built_demo();
    let file = derive_key("Demo", 0).artifact_file_name();

    let response = handle_artifact(&service, &file);
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "font/woff2");
    assert!(response.body.starts_with(b"FAKE"));
    assert_eq!(
        response.cache_control,
        Some(format!("public, max-age={}", fixture.config.font_max_age))
    );

    // Never built: the subset is empty for this font.
    let empty = derive_key("Demo", 1).artifact_file_name();
    assert_eq!(handle_artifact(&service, &empty).status, 404);
}

#[test]
fn test_artifact_rejects_foreign_names() {
    let (_fixture, service) = built_demo();

    for name in ["../meta/Demo", "subsets.json", "ABC.woff2", "0123.woff2", ""] {
        assert_eq!(handle_artifact(&service, name).status, 404, "{name}");
    }
    let key = derive_key("Demo", 0);
    assert_eq!(handle_artifact(&service, key.as_str()).status, 404);
}
