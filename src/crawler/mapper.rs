//! Site mapping session: initial discovery and incremental node expansion

use crate::fetcher::{FetchError, MapOptions, PageFetcher};
use crate::url::{ancestor_paths, is_within_scope, Selection, SelectionState, UrlTree};
use crate::{HarvestError, Result};
use std::collections::BTreeSet;

/// Result of expanding one node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapNodeOutcome {
    /// In-scope URLs the discovery call produced (never empty)
    pub discovered: Vec<String>,
    /// The subset that was not already in the tree
    pub added: Vec<String>,
}

/// The URL tree, its expansion state, and the user's selection
///
/// A session owns its tree; nothing is shared between sessions.
#[derive(Debug, Clone, Default)]
pub struct MappingSession {
    root_url: String,
    tree: UrlTree,
    expanded: BTreeSet<String>,
    selection: Selection,
}

impl MappingSession {
    /// Creates a session from an already discovered URL set
    pub fn from_urls<I, S>(root_url: &str, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            root_url: root_url.to_string(),
            tree: UrlTree::build(urls),
            expanded: BTreeSet::new(),
            selection: Selection::new(),
        }
    }

    /// Runs the initial discovery for a root URL
    ///
    /// # Returns
    ///
    /// * `Ok(MappingSession)` - Session holding every discovered URL (at least the root)
    /// * `Err(HarvestError::UpstreamUnavailable)` - The fetcher hit a gateway failure
    /// * `Err(HarvestError::Fetch)` - Discovery failed otherwise
    pub async fn discover(fetcher: &dyn PageFetcher, root_url: &str, limit: u32) -> Result<Self> {
        tracing::info!("Mapping {} (limit {})", root_url, limit);

        let response = fetcher
            .map_site(root_url, &MapOptions { limit })
            .await
            .map_err(|e| {
                if e.is_upstream_unavailable() {
                    HarvestError::UpstreamUnavailable {
                        url: root_url.to_string(),
                        message: e.to_string(),
                    }
                } else {
                    HarvestError::Fetch(e)
                }
            })?;

        if !response.success {
            let message = response
                .error
                .unwrap_or_else(|| "site discovery reported failure".to_string());
            return Err(FetchError::Unsuccessful(message).into());
        }

        let mut urls = response.urls;
        if urls.is_empty() {
            urls.push(root_url.to_string());
        }

        let session = Self::from_urls(root_url, &urls);
        tracing::info!(
            "Discovered {} URLs under {}",
            session.tree.total_count(),
            root_url
        );
        Ok(session)
    }

    /// Discovers deeper URLs under one node and splices them into the tree
    ///
    /// Results outside the node's path are dropped. When nothing in scope comes
    /// back, or discovery fails, the node path itself counts as the discovered
    /// URL. The node and its ancestors are marked expanded. Never fails.
    pub async fn map_node(
        &mut self,
        fetcher: &dyn PageFetcher,
        path: &str,
        limit: u32,
    ) -> MapNodeOutcome {
        let found = match fetcher.map_site(path, &MapOptions { limit }).await {
            Ok(response) if response.success => response.urls,
            Ok(response) => {
                tracing::warn!(
                    "Mapping {} unsuccessful: {}",
                    path,
                    response.error.as_deref().unwrap_or("no error message")
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Mapping {} failed: {}", path, e);
                Vec::new()
            }
        };

        let mut discovered: Vec<String> = found
            .into_iter()
            .filter(|url| is_within_scope(path, url))
            .collect();
        if discovered.is_empty() {
            discovered.push(path.to_string());
        }

        // Fetch happened above; the tree is mutated in one step from here
        let added = self.tree.splice(&discovered);
        for ancestor in ancestor_paths(path) {
            self.expanded.insert(ancestor);
        }

        tracing::info!(
            "Mapped {}: {} in scope, {} new",
            path,
            discovered.len(),
            added.len()
        );
        MapNodeOutcome { discovered, added }
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn tree(&self) -> &UrlTree {
        &self.tree
    }

    /// Every URL in the working set
    pub fn urls(&self) -> Vec<String> {
        self.tree.urls()
    }

    pub fn expanded(&self) -> &BTreeSet<String> {
        &self.expanded
    }

    /// Restores a stored expanded set
    pub fn with_expanded<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expanded.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn expand(&mut self, path: &str) {
        self.expanded.insert(path.to_string());
    }

    pub fn collapse(&mut self, path: &str) {
        self.expanded.remove(path);
    }

    /// Renders the tree showing only expanded nodes' children
    pub fn render(&self) -> String {
        self.tree.render(Some(&self.expanded))
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Toggles a node's subtree; `None` if no node has that path
    pub fn toggle(&mut self, path: &str) -> Option<SelectionState> {
        let node = self.tree.find(path)?;
        Some(self.selection.toggle(node))
    }

    /// Selects every URL in the tree
    pub fn select_all(&mut self) {
        for url in self.tree.urls() {
            self.selection.select(&url);
        }
    }

    /// Aggregate selection state of a node
    pub fn state_of(&self, path: &str) -> Option<SelectionState> {
        self.tree.find(path).map(|node| self.selection.state_of(node))
    }

    /// Selected URLs in tree order
    pub fn selected_urls(&self) -> Vec<String> {
        self.tree
            .urls()
            .into_iter()
            .filter(|url| self.selection.is_selected(url))
            .collect()
    }
}
