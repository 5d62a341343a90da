//! URL handling module for Site-Harvest
//!
//! This module provides base-URL normalization, domain keys, path-scope
//! matching, the hierarchical URL tree, and page selection over that tree.

mod domain;
mod matcher;
mod normalize;
mod selection;
mod tree;

// Re-export main functions
pub use domain::{domain_key, extract_domain};
pub use matcher::is_within_scope;
pub use normalize::{base_url, dedupe_by_base_url, parse_http_url, path_segments};
pub use selection::{Selection, SelectionState};
pub use tree::{build_tree, TreeNode, UrlTree};

/// Lists the ancestor node paths of a node path, outermost first, including itself
///
/// # Examples
///
/// ```
/// use site_harvest::url::ancestor_paths;
///
/// assert_eq!(
///     ancestor_paths("https://example.com/blog/2024"),
///     vec![
///         "https://example.com",
///         "https://example.com/blog",
///         "https://example.com/blog/2024",
///     ]
/// );
/// ```
pub fn ancestor_paths(node_path: &str) -> Vec<String> {
    let Ok(url) = parse_http_url(node_path) else {
        return Vec::new();
    };
    let Some(key) = domain_key(&url) else {
        return Vec::new();
    };

    let mut paths = vec![key.clone()];
    let mut current = key;
    for segment in path_segments(&url) {
        current = format!("{}/{}", current, segment);
        paths.push(current.clone());
    }
    paths
}
