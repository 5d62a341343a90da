use url::Url;

/// Extracts the host from a URL, lowercased and without a leading `www.`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvest::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(stripped) => stripped.to_string(),
            None => host,
        }
    })
}

/// Computes the domain key of a URL: `scheme://host[:port]` with `www.` removed
///
/// URLs whose only difference is the `www.` prefix share a domain key and
/// therefore a single tree root.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvest::url::domain_key;
///
/// let a = Url::parse("https://www.example.com/about").unwrap();
/// let b = Url::parse("https://example.com/contact").unwrap();
/// assert_eq!(domain_key(&a), domain_key(&b));
/// assert_eq!(domain_key(&a), Some("https://example.com".to_string()));
/// ```
pub fn domain_key(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
