//! Hierarchical URL tree
//!
//! Groups a flat set of discovered URLs into domain-rooted trees of path
//! segments. Each node caches the number of URLs in its subtree; the cache is
//! only ever refreshed by an explicit bottom-up [`UrlTree::recount`] after a
//! structural change, never adjusted incrementally.

use crate::url::domain::domain_key;
use crate::url::normalize::{base_url, parse_http_url, path_segments};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Write;

/// One path segment of a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Cumulative URL up to and including this segment
    pub path: String,

    /// URLs ending exactly at this node (base URLs)
    pub urls: Vec<String>,

    /// Child nodes keyed by segment name
    pub children: BTreeMap<String, TreeNode>,

    /// Cached `urls.len()` plus the count of every child
    pub count: usize,
}

impl TreeNode {
    fn new(path: String) -> Self {
        Self {
            path,
            urls: Vec::new(),
            children: BTreeMap::new(),
            count: 0,
        }
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Recomputes `count` for this node and every descendant
    pub fn recount(&mut self) -> usize {
        let child_total: usize = self.children.values_mut().map(|c| c.recount()).sum();
        self.count = self.urls.len() + child_total;
        self.count
    }

    /// Collects every URL in this node's subtree (own URLs first, then children in key order)
    pub fn subtree_urls(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.count);
        self.collect_urls(&mut out);
        out
    }

    fn collect_urls(&self, out: &mut Vec<String>) {
        out.extend(self.urls.iter().cloned());
        for child in self.children.values() {
            child.collect_urls(out);
        }
    }

    fn descend(&self, segments: &[String]) -> Option<&TreeNode> {
        match segments.split_first() {
            None => Some(self),
            Some((head, rest)) => self.children.get(head)?.descend(rest),
        }
    }
}

/// A forest of domain-rooted URL trees
#[derive(Debug, Clone, Default)]
pub struct UrlTree {
    roots: BTreeMap<String, TreeNode>,
    known: HashSet<String>,
}

impl UrlTree {
    /// Creates an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from a set of discovered URLs
    ///
    /// URLs are reduced to their base URL (duplicates collapse), grouped under
    /// their domain key, and inserted by path segment. Malformed URLs are
    /// skipped. Counts are recomputed once all URLs are inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_harvest::url::UrlTree;
    ///
    /// let tree = UrlTree::build([
    ///     "https://example.com/",
    ///     "https://www.example.com/blog/a",
    ///     "https://example.com/blog/b?ref=home",
    /// ]);
    /// assert_eq!(tree.roots().len(), 1);
    /// assert_eq!(tree.total_count(), 3);
    /// assert_eq!(tree.find("https://example.com/blog").unwrap().count, 2);
    /// ```
    pub fn build<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for url in urls {
            tree.insert(url.as_ref());
        }
        tree.recount();
        tree
    }

    /// Inserts one URL without recounting
    ///
    /// Returns true if the URL was new. Callers must invoke [`UrlTree::recount`]
    /// after their last insert.
    pub fn insert(&mut self, url: &str) -> bool {
        let Ok(base) = base_url(url) else {
            tracing::debug!("Skipping malformed URL: {}", url);
            return false;
        };

        if self.known.contains(&base) {
            return false;
        }

        let Ok(parsed) = parse_http_url(&base) else {
            return false;
        };
        let Some(key) = domain_key(&parsed) else {
            return false;
        };

        let mut node = self
            .roots
            .entry(key.clone())
            .or_insert_with(|| TreeNode::new(key.clone()));

        let mut path = key;
        for segment in path_segments(&parsed) {
            path = format!("{}/{}", path, segment);
            node = node
                .children
                .entry(segment)
                .or_insert_with(|| TreeNode::new(path.clone()));
        }

        node.urls.push(base.clone());
        self.known.insert(base);
        true
    }

    /// Splices newly discovered URLs into the existing tree
    ///
    /// Existing subtrees are left intact; only missing nodes are created.
    /// Returns the base URLs that were actually added.
    pub fn splice<I, S>(&mut self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = Vec::new();
        for url in urls {
            if self.insert(url.as_ref()) {
                if let Ok(base) = base_url(url.as_ref()) {
                    added.push(base);
                }
            }
        }
        self.recount();
        added
    }

    /// Recomputes every node's count bottom-up
    pub fn recount(&mut self) {
        for root in self.roots.values_mut() {
            root.recount();
        }
    }

    /// Domain roots keyed by domain key
    pub fn roots(&self) -> &BTreeMap<String, TreeNode> {
        &self.roots
    }

    /// Consumes the tree, returning the domain roots
    pub fn into_roots(self) -> BTreeMap<String, TreeNode> {
        self.roots
    }

    /// Looks up a node by its cumulative path (e.g. `https://example.com/blog`)
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let url = parse_http_url(path).ok()?;
        let key = domain_key(&url)?;
        self.roots.get(&key)?.descend(&path_segments(&url))
    }

    /// Returns true if the URL (by base URL) is already in the tree
    pub fn contains(&self, url: &str) -> bool {
        base_url(url)
            .map(|base| self.known.contains(&base))
            .unwrap_or(false)
    }

    /// Sum of all root counts
    pub fn total_count(&self) -> usize {
        self.roots.values().map(|r| r.count).sum()
    }

    /// Every URL in the tree, grouped by root
    pub fn urls(&self) -> Vec<String> {
        self.roots.values().flat_map(|r| r.subtree_urls()).collect()
    }

    /// Renders the tree as indented text with counts
    ///
    /// With `expanded` set, only the children of listed node paths are shown;
    /// roots are always shown.
    pub fn render(&self, expanded: Option<&BTreeSet<String>>) -> String {
        let mut out = String::new();
        for root in self.roots.values() {
            let _ = writeln!(out, "{} ({})", root.path, root.count);
            render_children(root, expanded, 1, &mut out);
        }
        out
    }
}

fn render_children(
    node: &TreeNode,
    expanded: Option<&BTreeSet<String>>,
    depth: usize,
    out: &mut String,
) {
    if let Some(set) = expanded {
        if !set.contains(&node.path) {
            return;
        }
    }

    for (segment, child) in &node.children {
        let marker = if child.is_leaf() { "-" } else { "+" };
        let _ = writeln!(
            out,
            "{}{} {} ({})",
            "  ".repeat(depth),
            marker,
            segment,
            child.count
        );
        render_children(child, expanded, depth + 1, out);
    }
}

/// Builds the domain-keyed tree roots for a set of URLs
pub fn build_tree<I, S>(urls: I) -> BTreeMap<String, TreeNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    UrlTree::build(urls).into_roots()
}
