use crate::url::domain::domain_key;
use crate::url::normalize::{parse_http_url, path_segments};

/// Checks if a candidate URL lies inside the subtree rooted at `scope`
///
/// Matching is done per path segment under the same domain key, so the scope
/// `https://example.com/blog` matches:
///    - `https://example.com/blog` (the node itself)
///    - `https://www.example.com/blog/post-1` (a descendant; `www.` is ignored)
///
/// but not `https://example.com/blog-archive` or `https://other.com/blog/x`.
///
/// Either side failing to parse yields `false`.
///
/// # Examples
///
/// ```
/// use site_harvest::url::is_within_scope;
///
/// assert!(is_within_scope("https://example.com/blog", "https://example.com/blog/a"));
/// assert!(!is_within_scope("https://example.com/blog", "https://example.com/blogs"));
/// ```
pub fn is_within_scope(scope: &str, candidate: &str) -> bool {
    let (Ok(scope_url), Ok(candidate_url)) = (parse_http_url(scope), parse_http_url(candidate))
    else {
        return false;
    };

    if domain_key(&scope_url) != domain_key(&candidate_url) {
        return false;
    }

    let scope_segments = path_segments(&scope_url);
    let candidate_segments = path_segments(&candidate_url);

    candidate_segments.len() >= scope_segments.len()
        && scope_segments
            .iter()
            .zip(candidate_segments.iter())
            .all(|(a, b)| a == b)
}
