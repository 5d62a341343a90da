use crate::UrlError;
use url::Url;

/// Parses an absolute HTTP(S) URL
///
/// # Arguments
///
/// * `url_str` - The URL string to parse
///
/// # Returns
///
/// * `Ok(Url)` - Parsed URL with a host
/// * `Err(UrlError)` - Malformed, non-HTTP, or host-less URL
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Reduces a discovered URL to its base URL
///
/// The base URL is the URL with its query string and fragment removed. Two
/// discovered URLs that differ only in their query string share a base URL and
/// are treated as the same page everywhere downstream.
///
/// # Examples
///
/// ```
/// use site_harvest::url::base_url;
///
/// let base = base_url("https://example.com/shop/item?color=red#reviews").unwrap();
/// assert_eq!(base, "https://example.com/shop/item");
/// ```
pub fn base_url(url_str: &str) -> Result<String, UrlError> {
    let mut url = parse_http_url(url_str)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Splits a URL path into its non-empty segments
pub fn path_segments(url: &Url) -> Vec<String> {
    url.path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .collect()
}

/// Deduplicates URLs by base URL, keeping the first occurrence of each
///
/// Unparseable entries are dropped. Order of first occurrence is preserved.
pub fn dedupe_by_base_url<'a, I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();

    for url in urls {
        match base_url(url) {
            Ok(base) => {
                if seen.insert(base.clone()) {
                    unique.push(base);
                }
            }
            Err(e) => {
                tracing::debug!("Dropping unparseable URL {}: {}", url, e);
            }
        }
    }

    unique
}
