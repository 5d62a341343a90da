//! Persistence of sessions and crawl runs in an on-disk database

use crate::common::{urls, ScriptedFetcher};
use site_harvest::crawler::MappingSession;
use site_harvest::schema::default_schema;
use site_harvest::storage::{open_storage, RunStatus, Storage};
use site_harvest::{Coordinator, CrawlOptions, HarvestError};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_session_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");

    let mut fetcher = ScriptedFetcher::default();
    fetcher.maps = HashMap::from([(
        "https://blog.test".to_string(),
        urls(&[
            "https://blog.test/",
            "https://blog.test/posts/a",
            "https://blog.test/posts/b",
        ]),
    )]);
    let session = MappingSession::discover(&fetcher, "https://blog.test", 100)
        .await
        .unwrap();

    {
        let mut storage = open_storage(&db_path).unwrap();
        let id = storage.create_session("https://blog.test", "cfg-hash").unwrap();
        storage.add_discovered_urls(id, &session.urls()).unwrap();
    }

    let storage = open_storage(&db_path).unwrap();
    let latest = storage.get_latest_session().unwrap().unwrap();
    assert_eq!(latest.root_url, "https://blog.test");
    assert_eq!(latest.config_hash, "cfg-hash");

    let restored =
        MappingSession::from_urls(&latest.root_url, storage.load_session_urls(latest.id).unwrap());
    assert_eq!(restored.tree().total_count(), session.tree().total_count());
    assert_eq!(restored.urls(), session.urls());
}

#[tokio::test]
async fn test_completed_run_round_trips_records() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");

    let fetcher = ScriptedFetcher::with_pages(&[
        ("https://blog.test/posts/a", "# Post A\n\nPublished 2024-01-02"),
        ("https://blog.test/posts/b", "# Post B"),
    ]);
    let coordinator = Coordinator::new(Arc::new(fetcher));
    let result = coordinator
        .crawl(
            Some(default_schema()),
            &urls(&["https://blog.test/posts/a", "https://blog.test/posts/b"]),
            &CrawlOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let run_id = {
        let mut storage = open_storage(&db_path).unwrap();
        let run_id = storage.create_run(None).unwrap();
        storage.complete_run(run_id, &result).unwrap();
        run_id
    };

    let storage = open_storage(&db_path).unwrap();
    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.total_requested, 2);
    assert_eq!(run.credits_used, 4);
    assert_eq!(storage.load_records(run_id).unwrap(), result.records);
}

#[tokio::test]
async fn test_cancelled_crawl_marks_run_failed() {
    let dir = TempDir::new().unwrap();
    let mut storage = open_storage(&dir.path().join("harvest.db")).unwrap();

    let fetcher = ScriptedFetcher::with_pages(&[("https://blog.test/posts/a", "# Post A")]);
    let coordinator = Coordinator::new(Arc::new(fetcher));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let run_id = storage.create_run(None).unwrap();
    let err = coordinator
        .crawl(
            Some(default_schema()),
            &urls(&["https://blog.test/posts/a"]),
            &CrawlOptions::default(),
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HarvestError::Cancelled(_)));

    storage.fail_run(run_id, &err.to_string()).unwrap();

    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(storage.load_records(run_id).unwrap().is_empty());
    assert!(storage.load_outcomes(run_id).unwrap().is_empty());
    assert!(storage.get_latest_completed_run().unwrap().is_none());
}

#[tokio::test]
async fn test_expanded_nodes_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");

    let mut fetcher = ScriptedFetcher::default();
    fetcher.maps = HashMap::from([
        (
            "https://blog.test".to_string(),
            urls(&["https://blog.test/", "https://blog.test/posts"]),
        ),
        (
            "https://blog.test/posts".to_string(),
            urls(&["https://blog.test/posts/a", "https://blog.test/posts/b"]),
        ),
    ]);
    let mut session = MappingSession::discover(&fetcher, "https://blog.test", 100)
        .await
        .unwrap();

    {
        let mut storage = open_storage(&db_path).unwrap();
        let id = storage.create_session("https://blog.test", "cfg-hash").unwrap();
        storage.add_discovered_urls(id, &session.urls()).unwrap();

        let outcome = session
            .map_node(&fetcher, "https://blog.test/posts", 100)
            .await;
        storage.add_discovered_urls(id, &outcome.added).unwrap();
        let expanded: Vec<String> = session.expanded().iter().cloned().collect();
        storage.add_expanded_paths(id, &expanded).unwrap();
    }

    let storage = open_storage(&db_path).unwrap();
    let latest = storage.get_latest_session().unwrap().unwrap();
    let restored =
        MappingSession::from_urls(&latest.root_url, storage.load_session_urls(latest.id).unwrap())
            .with_expanded(storage.load_expanded_paths(latest.id).unwrap());

    assert_eq!(restored.expanded(), session.expanded());
    assert_eq!(restored.render(), session.render());
    assert!(restored.render().contains("- a (1)"));
}
