// tests/config_sources.rs
use std::{env, fs};

use newsdesk_aggregator::config::{
    load_api_sources, load_api_sources_from, load_rss_sources_from,
};

#[test]
fn line_list_skips_comments_and_blanks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api_sources.txt");
    fs::write(&path, "# comment\nreuters.com\n\n  cnbc.com  \nreuters.com\n").unwrap();

    let sources = load_api_sources_from(&path).unwrap();
    assert_eq!(sources, vec!["cnbc.com".to_string(), "reuters.com".into()]);
}

#[test]
fn rss_sources_drop_entries_without_urls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rss_sources.json");
    fs::write(
        &path,
        r#"[{"name":"Good","url":"https://example.com/feed"},{"name":"Bad","url":"  "}]"#,
    )
    .unwrap();

    let sources = load_rss_sources_from(&path).unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].name, "Good");
}

#[serial_test::serial]
#[test]
fn env_path_overrides_the_default_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.json");
    fs::write(&path, r#"["override.com"]"#).unwrap();

    env::set_var("API_SOURCES_PATH", path.display().to_string());
    let sources = load_api_sources().unwrap();
    env::remove_var("API_SOURCES_PATH");

    assert_eq!(sources, vec!["override.com".to_string()]);
}
