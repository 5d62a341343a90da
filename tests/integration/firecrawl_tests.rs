//! End-to-end crawls against a mock Firecrawl-compatible API
//!
//! These tests use wiremock to stand in for the fetch API and run the full
//! map → select → crawl → export cycle over real HTTP.

use serde_json::json;
use site_harvest::crawler::MappingSession;
use site_harvest::fetcher::FirecrawlFetcher;
use site_harvest::schema::{FieldType, Schema};
use site_harvest::service::{handle_crawl, CrawlRequest};
use site_harvest::{Coordinator, CrawlOptions, ExportFormat, Exporter, HarvestError, Strategy};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(server: &MockServer) -> FirecrawlFetcher {
    FirecrawlFetcher::new(&server.uri(), "integration-key")
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
        .with_poll_timeout(Duration::from_secs(2))
}

fn product_schema() -> Schema {
    Schema::new()
        .with_field("title", FieldType::String, "Product name")
        .with_field("price", FieldType::Number, "Price")
}

async fn mount_scrape(server: &MockServer, url: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .and(body_partial_json(json!({ "url": url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_map_select_crawl_export() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/map"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "links": [
                "https://shop.test/",
                "https://shop.test/products/mug",
                "https://shop.test/products/cup",
                "https://shop.test/about"
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/batch/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "id": "job-42"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/batch/scrape/job-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "data": [
                {
                    "json": {"title": "Cup", "price": 8},
                    "markdown": "# Cup",
                    "metadata": {"sourceURL": "https://shop.test/products/cup"}
                },
                {
                    "json": {"title": "Mug", "price": null},
                    "markdown": "# Mug\n\nPrice: 12.50",
                    "metadata": {"sourceURL": "https://shop.test/products/mug"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let fetcher = Arc::new(fetcher_for(&server));
    let mut session = MappingSession::discover(fetcher.as_ref(), "https://shop.test", 100)
        .await
        .unwrap();
    assert_eq!(session.tree().total_count(), 4);

    session.toggle("https://shop.test/products").unwrap();
    let selected = session.selected_urls();
    assert_eq!(selected.len(), 2);

    let coordinator = Coordinator::new(fetcher);
    let result = coordinator
        .crawl(
            Some(product_schema()),
            &selected,
            &CrawlOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.strategy, Strategy::Bulk);
    assert_eq!(result.records.len(), 2);

    // Records follow selection order, not response order
    let mug = result
        .records
        .iter()
        .find(|r| r.get("title") == Some(&json!("Mug")))
        .unwrap();
    assert_eq!(mug.get("price"), Some(&json!(12.5)));

    let bytes = Exporter::new()
        .format(&result.records, ExportFormat::Shopify)
        .unwrap();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.len() == 28));
}

#[tokio::test]
async fn test_batch_rejection_falls_back_to_scrape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/batch/scrape"))
        .respond_with(ResponseTemplate::new(500).set_body_string("batch disabled"))
        .mount(&server)
        .await;

    mount_scrape(
        &server,
        "https://shop.test/p/1",
        json!({"success": true, "data": {"markdown": "# One\n\nPrice: 1"}}),
    )
    .await;
    mount_scrape(
        &server,
        "https://shop.test/p/2",
        json!({"success": false, "error": "blocked by site"}),
    )
    .await;
    mount_scrape(
        &server,
        "https://shop.test/p/3",
        json!({"success": true, "data": {"json": {"title": "Three", "price": 3}}}),
    )
    .await;

    let coordinator = Coordinator::new(Arc::new(fetcher_for(&server)));
    let request = CrawlRequest {
        url: Some("https://shop.test".to_string()),
        schema: Some(product_schema()),
        selected_urls: vec![
            "https://shop.test/p/1".to_string(),
            "https://shop.test/p/2".to_string(),
            "https://shop.test/p/3".to_string(),
        ],
        ..Default::default()
    };

    let response = handle_crawl(
        &coordinator,
        request,
        &CrawlOptions::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(response.strategy, Strategy::BulkWithFallback);
    assert_eq!(response.total_pages, 3);
    assert_eq!(response.completed, 2);
    assert_eq!(response.credits_used, 5);
    assert_eq!(response.data[0].get("title"), Some(&json!("One")));
    assert_eq!(response.data[1].get("title"), Some(&json!("Three")));
    assert!(response.raw_data.is_none());
}

#[tokio::test]
async fn test_gateway_failures_surface_as_upstream_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/batch/scrape"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(Arc::new(fetcher_for(&server)));
    let err = coordinator
        .crawl(
            Some(product_schema()),
            &["https://down.test/a".to_string()],
            &CrawlOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::UpstreamUnavailable { .. }));
}

#[tokio::test]
async fn test_map_node_on_leaf_yields_itself() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/map"))
        .and(body_partial_json(json!({"url": "https://shop.test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "links": ["https://shop.test/", "https://shop.test/blog/post-1"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/map"))
        .and(body_partial_json(json!({"url": "https://shop.test/blog/post-1"})))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server);
    let mut session = MappingSession::discover(&fetcher, "https://shop.test", 100)
        .await
        .unwrap();

    let outcome = session
        .map_node(&fetcher, "https://shop.test/blog/post-1", 100)
        .await;

    assert_eq!(outcome.discovered, vec!["https://shop.test/blog/post-1"]);
    assert!(outcome.added.is_empty());
    assert_eq!(session.tree().total_count(), 2);
}
