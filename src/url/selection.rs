//! Page selection over a URL tree
//!
//! Selection is tracked as a set of base URLs. A node's aggregate state is
//! derived from its subtree, and toggling a node flips its whole subtree.

use crate::url::normalize::base_url;
use crate::url::tree::TreeNode;
use std::collections::BTreeSet;

/// Aggregate selection state of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// Every URL in the subtree is selected
    Full,
    /// No URL in the subtree is selected
    None,
    /// Some, but not all, URLs in the subtree are selected
    Partial,
}

/// The set of URLs a user has chosen to crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<String>,
}

impl Selection {
    /// Creates an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the aggregate state of a node
    ///
    /// A node with an empty subtree reports `None`.
    pub fn state_of(&self, node: &TreeNode) -> SelectionState {
        let urls = node.subtree_urls();
        let selected = urls.iter().filter(|u| self.selected.contains(*u)).count();

        if selected == 0 {
            SelectionState::None
        } else if selected == urls.len() {
            SelectionState::Full
        } else {
            SelectionState::Partial
        }
    }

    /// Toggles a node's whole subtree as a unit
    ///
    /// A fully selected subtree is deselected; a partially or unselected one is
    /// fully selected. Returns the node's new state.
    pub fn toggle(&mut self, node: &TreeNode) -> SelectionState {
        let urls = node.subtree_urls();

        if self.state_of(node) == SelectionState::Full {
            for url in &urls {
                self.selected.remove(url);
            }
        } else {
            self.selected.extend(urls);
        }

        self.state_of(node)
    }

    /// Selects a single URL (by base URL); returns false if it does not parse
    pub fn select(&mut self, url: &str) -> bool {
        match base_url(url) {
            Ok(base) => {
                self.selected.insert(base);
                true
            }
            Err(_) => false,
        }
    }

    /// Deselects a single URL (by base URL)
    pub fn deselect(&mut self, url: &str) {
        if let Ok(base) = base_url(url) {
            self.selected.remove(&base);
        }
    }

    /// Returns true if the URL is selected
    pub fn is_selected(&self, url: &str) -> bool {
        base_url(url)
            .map(|base| self.selected.contains(&base))
            .unwrap_or(false)
    }

    /// Clears the selection
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Number of selected URLs
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns true if nothing is selected
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected URLs in sorted order
    pub fn urls(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }
}
