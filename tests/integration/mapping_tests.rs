//! Site mapping, tree maintenance, and selection

use crate::common::{urls, ScriptedFetcher};
use site_harvest::crawler::MappingSession;
use site_harvest::url::{SelectionState, TreeNode};
use std::collections::HashMap;

fn assert_counts_consistent(node: &TreeNode) {
    let child_total: usize = node.children.values().map(|c| c.count).sum();
    assert_eq!(node.count, node.urls.len() + child_total, "at {}", node.path);
    for child in node.children.values() {
        assert_counts_consistent(child);
    }
}

fn shop_fetcher() -> ScriptedFetcher {
    let mut fetcher = ScriptedFetcher::default();
    fetcher.maps = HashMap::from([
        (
            "https://shop.test".to_string(),
            urls(&[
                "https://shop.test/",
                "https://shop.test/products/mug",
                "https://shop.test/products/mug?utm=x",
                "https://shop.test/products/cup",
                "https://shop.test/blog",
                "https://cdn.shop.test/assets/logo",
            ]),
        ),
        (
            "https://shop.test/blog".to_string(),
            urls(&[
                "https://shop.test/blog/first",
                "https://shop.test/blog/second",
                "https://shop.test/products/bowl",
            ]),
        ),
    ]);
    fetcher
}

#[tokio::test]
async fn test_discovery_groups_by_domain() {
    let fetcher = shop_fetcher();
    let session = MappingSession::discover(&fetcher, "https://shop.test", 100)
        .await
        .unwrap();

    let tree = session.tree();
    assert_eq!(tree.roots().len(), 2);
    // the tracking-query variant of mug collapses into its base URL
    assert_eq!(tree.total_count(), 5);
    assert_eq!(tree.find("https://shop.test/products").unwrap().count, 2);

    for root in tree.roots().values() {
        assert_counts_consistent(root);
    }
}

#[tokio::test]
async fn test_expanding_a_node_splices_in_scope_urls() {
    let fetcher = shop_fetcher();
    let mut session = MappingSession::discover(&fetcher, "https://shop.test", 100)
        .await
        .unwrap();

    let outcome = session
        .map_node(&fetcher, "https://shop.test/blog", 100)
        .await;

    assert_eq!(
        outcome.added,
        vec!["https://shop.test/blog/first", "https://shop.test/blog/second"]
    );
    assert!(!session.tree().contains("https://shop.test/products/bowl"));
    assert_eq!(session.tree().find("https://shop.test/blog").unwrap().count, 3);
    assert_eq!(session.tree().total_count(), 7);
    assert!(session.expanded().contains("https://shop.test/blog"));

    for root in session.tree().roots().values() {
        assert_counts_consistent(root);
    }

    // Mapping the same node again adds nothing
    let again = session
        .map_node(&fetcher, "https://shop.test/blog", 100)
        .await;
    assert!(again.added.is_empty());
    assert_eq!(session.tree().total_count(), 7);
}

#[tokio::test]
async fn test_selection_states_follow_toggles() {
    let fetcher = shop_fetcher();
    let mut session = MappingSession::discover(&fetcher, "https://shop.test", 100)
        .await
        .unwrap();

    assert_eq!(
        session.toggle("https://shop.test/products/cup"),
        Some(SelectionState::Full)
    );
    assert_eq!(
        session.state_of("https://shop.test/products"),
        Some(SelectionState::Partial)
    );

    // Toggling a partial node selects the rest of it
    assert_eq!(
        session.toggle("https://shop.test/products"),
        Some(SelectionState::Full)
    );
    assert_eq!(
        session.selected_urls(),
        vec!["https://shop.test/products/cup", "https://shop.test/products/mug"]
    );

    assert_eq!(
        session.toggle("https://shop.test/products"),
        Some(SelectionState::None)
    );
    assert!(session.selected_urls().is_empty());
    assert_eq!(session.toggle("https://shop.test/nowhere"), None);
}

#[tokio::test]
async fn test_empty_discovery_keeps_root() {
    let fetcher = ScriptedFetcher::default();
    let session = MappingSession::discover(&fetcher, "https://quiet.test", 10)
        .await
        .unwrap();

    assert_eq!(session.urls(), vec!["https://quiet.test/"]);
    assert_eq!(fetcher.calls(), vec!["map https://quiet.test"]);
}
