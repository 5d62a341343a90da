//! Crawl orchestration through the public API

use crate::common::{urls, ScriptedFetcher};
use serde_json::json;
use site_harvest::crawler::{extract_date, OutcomeStatus};
use site_harvest::schema::{infer_schema, FieldType, Schema};
use site_harvest::{Coordinator, CrawlOptions, HarvestError, Strategy};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn product_schema() -> Schema {
    Schema::new()
        .with_field("title", FieldType::String, "Product name")
        .with_field("price", FieldType::Number, "Price")
        .with_field("date", FieldType::String, "Published date")
}

fn five_urls() -> Vec<String> {
    urls(&[
        "https://shop.test/p/1",
        "https://shop.test/p/2",
        "https://shop.test/p/3",
        "https://shop.test/p/4",
        "https://shop.test/p/5",
    ])
}

#[tokio::test]
async fn test_empty_selection_is_configuration_error() {
    let coordinator = Coordinator::new(Arc::new(ScriptedFetcher::default()));

    let err = coordinator
        .crawl(
            Some(product_schema()),
            &[],
            &CrawlOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Configuration(_)));
}

#[tokio::test]
async fn test_bulk_failure_degrades_to_per_url_fetches() {
    let mut fetcher = ScriptedFetcher::with_pages(&[
        ("https://shop.test/p/1", "# Mug\n\nPrice: 12.50"),
        ("https://shop.test/p/3", "# Cup\n\nPrice: 8"),
        ("https://shop.test/p/5", "# Bowl\n\nPrice: 20"),
    ]);
    fetcher.bulk_fails = true;
    let fetcher = Arc::new(fetcher);
    let coordinator = Coordinator::new(fetcher.clone());

    let result = coordinator
        .crawl(
            Some(product_schema()),
            &five_urls(),
            &CrawlOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.strategy, Strategy::BulkWithFallback);
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.total_completed, 3);
    assert_eq!(result.total_requested, 5);
    assert_eq!(result.credits_used, 7);

    let titles: Vec<_> = result
        .records
        .iter()
        .map(|r| r.get("title").cloned().unwrap())
        .collect();
    assert_eq!(titles, vec![json!("Mug"), json!("Cup"), json!("Bowl")]);
    assert_eq!(result.records[0].get("price"), Some(&json!(12.5)));

    let skipped: Vec<_> = result
        .outcomes
        .iter()
        .filter(|o| o.status == OutcomeStatus::Skipped)
        .map(|o| o.url.as_str())
        .collect();
    assert_eq!(skipped, vec!["https://shop.test/p/2", "https://shop.test/p/4"]);

    let fetches = fetcher
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("fetch "))
        .count();
    assert_eq!(fetches, 5);
}

#[tokio::test]
async fn test_parallel_fallback_keeps_selection_order() {
    let pages: Vec<(String, String)> = five_urls()
        .into_iter()
        .enumerate()
        .map(|(i, u)| (u, format!("# Item {}", i + 1)))
        .collect();
    let refs: Vec<(&str, &str)> = pages.iter().map(|(u, m)| (u.as_str(), m.as_str())).collect();
    let mut fetcher = ScriptedFetcher::with_pages(&refs);
    fetcher.bulk_fails = true;
    let coordinator = Coordinator::new(Arc::new(fetcher));

    let options = CrawlOptions::default().with_fallback_concurrency(4);
    let result = coordinator
        .crawl(
            Some(product_schema()),
            &five_urls(),
            &options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let titles: Vec<_> = result
        .records
        .iter()
        .filter_map(|r| r.text("title"))
        .collect();
    assert_eq!(
        titles,
        vec!["Item 1", "Item 2", "Item 3", "Item 4", "Item 5"]
    );
}

#[tokio::test]
async fn test_bulk_success_uses_single_call() {
    let fetcher = Arc::new(ScriptedFetcher::with_pages(&[
        ("https://shop.test/p/1", "# Mug\n\nPublished Oct 21, 2024"),
        ("https://shop.test/p/2", "# Cup\n\n2024-03-05 release"),
    ]));
    let coordinator = Coordinator::new(fetcher.clone());

    let result = coordinator
        .crawl(
            Some(product_schema()),
            &urls(&["https://shop.test/p/1", "https://shop.test/p/2?ref=nav", "https://shop.test/p/2#top"]),
            &CrawlOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.strategy, Strategy::Bulk);
    assert_eq!(result.total_requested, 2);
    assert_eq!(result.records[0].get("date"), Some(&json!("Oct 21, 2024")));
    assert_eq!(result.records[1].get("date"), Some(&json!("2024-03-05")));
    assert_eq!(result.records[1].get("price"), Some(&json!("")));
    assert_eq!(fetcher.calls(), vec!["batch 2"]);
}

#[tokio::test]
async fn test_auto_infer_samples_first_url() {
    let mut fetcher = ScriptedFetcher::with_pages(&[(
        "https://shop.test/p/1",
        "# Mug\n\nPrice: $12.00\n\nSKU: MUG-1",
    )]);
    fetcher.sample_markdown = "# Mug\n\nOnly $12.00, in stock.".to_string();
    let fetcher = Arc::new(fetcher);
    let coordinator = Coordinator::new(fetcher.clone());

    let options = CrawlOptions::default().with_auto_infer(true);
    let result = coordinator
        .crawl(
            None,
            &urls(&["https://shop.test/p/1"]),
            &options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let inferred = result.inferred_schema.clone().unwrap();
    assert_eq!(inferred, infer_schema("# Mug\n\nOnly $12.00, in stock.", ""));
    assert_eq!(result.schema, inferred);
    assert_eq!(fetcher.calls()[0], "sample https://shop.test/p/1");
    assert_eq!(result.records.len(), 1);
}

#[tokio::test]
async fn test_missing_schema_without_inference_fails() {
    let coordinator = Coordinator::new(Arc::new(ScriptedFetcher::default()));

    let err = coordinator
        .crawl(
            None,
            &urls(&["https://shop.test/p/1"]),
            &CrawlOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Configuration(_)));
}

#[tokio::test]
async fn test_cancelled_crawl_returns_nothing() {
    let fetcher = ScriptedFetcher::with_pages(&[("https://shop.test/p/1", "# Mug")]);
    let coordinator = Coordinator::new(Arc::new(fetcher));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = coordinator
        .crawl(
            Some(product_schema()),
            &urls(&["https://shop.test/p/1"]),
            &CrawlOptions::default().with_overall_timeout(Some(Duration::from_secs(5))),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Cancelled(_)));
}

#[test]
fn test_inference_is_deterministic() {
    let markdown = "# Blue Mug\n\nPrice: $12.00\nBy Jane Doe\nContact: hi@shop.test\nRating 4.5";
    let first = serde_json::to_vec(&infer_schema(markdown, "<h1>Blue Mug</h1>")).unwrap();
    let second = serde_json::to_vec(&infer_schema(markdown, "<h1>Blue Mug</h1>")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_date_extraction_examples() {
    assert_eq!(extract_date("Published Oct 21, 2024"), "Oct 21, 2024");
    assert_eq!(extract_date("2024-03-05"), "2024-03-05");
    assert_eq!(extract_date("no dates here"), "");
}
