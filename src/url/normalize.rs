use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during canonicalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Canonicalizes a possibly relative link into the absolute form used as
/// the dedup and store key
///
/// # Canonicalization Steps
///
/// 1. Resolve `href` against `base`; reject if malformed
/// 2. Require an HTTP(S) scheme and a host
/// 3. Lowercase the host (done by the parser for HTTP(S) URLs)
/// 4. Collapse empty path segments and drop a trailing slash (except root)
/// 5. Remove the fragment
/// 6. Remove tracking query parameters and sort the rest
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::canonicalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com/category/phones?page=2").unwrap();
/// let url = canonicalize_url("/product/phone-x-123/#reviews", &base).unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/product/phone-x-123");
/// ```
pub fn canonicalize_url(href: &str, base: &Url) -> Result<Url, UrlError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Parse("empty link".to_string()));
    }

    let mut url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let filtered_params = filter_and_sort_query_params(&url);

        if filtered_params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(filtered_params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    Ok(url)
}

/// Collapses repeated slashes and removes a trailing slash
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/category/phones-5261?page=3").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        let result = canonicalize_url("/product/phone-123", &base()).unwrap();
        assert_eq!(result.as_str(), "https://shop.example.com/product/phone-123");
    }

    #[test]
    fn test_absolute_link_kept() {
        let result = canonicalize_url("https://cdn.example.com/product/a", &base()).unwrap();
        assert_eq!(result.as_str(), "https://cdn.example.com/product/a");
    }

    #[test]
    fn test_lowercase_host() {
        let result = canonicalize_url("https://SHOP.EXAMPLE.COM/product/A", &base()).unwrap();
        assert_eq!(result.as_str(), "https://shop.example.com/product/A");
    }

    #[test]
    fn test_remove_fragment_and_trailing_slash() {
        let result = canonicalize_url("/product/phone-123/#specs", &base()).unwrap();
        assert_eq!(result.as_str(), "https://shop.example.com/product/phone-123");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result =
            canonicalize_url("/product/phone-123?utm_source=home&b=2&a=1", &base()).unwrap();
        assert_eq!(
            result.as_str(),
            "https://shop.example.com/product/phone-123?a=1&b=2"
        );
    }

    #[test]
    fn test_all_tracking_params_removed() {
        let result = canonicalize_url("/product/x?fbclid=1&gclid=2&ref=3", &base()).unwrap();
        assert_eq!(result.as_str(), "https://shop.example.com/product/x");
    }

    #[test]
    fn test_multiple_slashes() {
        let result = canonicalize_url("//shop.example.com//product///x", &base()).unwrap();
        assert_eq!(result.as_str(), "https://shop.example.com/product/x");
    }

    #[test]
    fn test_equivalent_links_share_key() {
        let a = canonicalize_url("/product/x", &base()).unwrap();
        let b = canonicalize_url("https://shop.example.com/product/x/#top", &base()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_scheme() {
        let result = canonicalize_url("mailto:sales@example.com", &base());
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_empty_link() {
        assert!(canonicalize_url("   ", &base()).is_err());
    }
}
