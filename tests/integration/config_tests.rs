//! Configuration files feeding crawl options and the fetcher

use site_harvest::config::{load_config, load_config_with_hash};
use site_harvest::fetcher::{FetchError, FirecrawlFetcher};
use site_harvest::{ConfigError, CrawlOptions};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const FULL_CONFIG: &str = r#"
[fetcher]
api-url = "http://127.0.0.1:3002/v1"
api-key-env = "SITE_HARVEST_TEST_KEY_UNSET"
poll-interval-ms = 500
poll-timeout-secs = 60

[crawl]
sample-timeout-ms = 5000
page-timeout-ms = 45000
overall-timeout-secs = 0
max-age-ms = 3600000
fallback-concurrency = 3
map-limit = 200

[output]
database-path = "./harvest.db"
export-dir = "./out"
batch-size = 10
"#;

#[test]
fn test_crawl_options_follow_config() {
    let file = write_config(FULL_CONFIG);
    let config = load_config(file.path()).unwrap();
    let options = CrawlOptions::from_config(&config.crawl);

    assert_eq!(options.sample_timeout_ms, 5000);
    assert_eq!(options.page_timeout_ms, 45000);
    assert_eq!(options.overall_timeout, None);
    assert_eq!(options.max_age, Some(3_600_000));
    assert_eq!(options.fallback_concurrency, 3);
    assert!(!options.auto_infer);
    assert_eq!(config.crawl.map_limit, 200);
}

#[test]
fn test_default_overall_timeout() {
    let file = write_config(
        r#"
[fetcher]
api-url = "https://api.firecrawl.dev/v1"
api-key-env = "FIRECRAWL_API_KEY"

[output]
database-path = "./harvest.db"
export-dir = "./out"
"#,
    );
    let config = load_config(file.path()).unwrap();
    let options = CrawlOptions::from_config(&config.crawl);
    assert_eq!(options.overall_timeout, Some(Duration::from_secs(600)));
}

#[test]
fn test_hash_tracks_content() {
    let first = write_config(FULL_CONFIG);
    let second = write_config(&FULL_CONFIG.replace("batch-size = 10", "batch-size = 11"));

    let (_, hash_a) = load_config_with_hash(first.path()).unwrap();
    let (_, hash_b) = load_config_with_hash(second.path()).unwrap();
    assert_ne!(hash_a, hash_b);
    assert_eq!(hash_a.len(), 64);
}

#[test]
fn test_invalid_values_are_rejected() {
    let bad_concurrency = FULL_CONFIG.replace("fallback-concurrency = 3", "fallback-concurrency = 0");
    let file = write_config(&bad_concurrency);
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Validation(_))
    ));

    let bad_url = FULL_CONFIG.replace("http://127.0.0.1:3002/v1", "ftp://files.test");
    let file = write_config(&bad_url);
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_fetcher_requires_key_in_environment() {
    let file = write_config(FULL_CONFIG);
    let config = load_config(file.path()).unwrap();

    let err = FirecrawlFetcher::from_config(&config.fetcher).unwrap_err();
    assert!(matches!(err, FetchError::MissingApiKey(ref var) if var == "SITE_HARVEST_TEST_KEY_UNSET"));
}
