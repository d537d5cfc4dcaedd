//! URL handling module for Catalog Crawler
//!
//! This module provides link canonicalization (the dedup/store key) and
//! helpers for building category listing page URLs.

mod normalize;

use url::Url;

// Re-export main functions
pub use normalize::canonicalize_url;

/// Query parameter carrying the listing page number
pub const PAGE_PARAM: &str = "page";

/// Builds the listing URL for one page of a category
///
/// Page 1 is the bare category URL; later pages add a `page=N` query
/// parameter, replacing any page parameter already present.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::listing_page_url;
/// use url::Url;
///
/// let category = Url::parse("https://shop.example.com/category/phones-5").unwrap();
/// assert_eq!(listing_page_url(&category, 1), "https://shop.example.com/category/phones-5");
/// assert_eq!(listing_page_url(&category, 3), "https://shop.example.com/category/phones-5?page=3");
/// ```
pub fn listing_page_url(category_url: &Url, page: u32) -> String {
    if page <= 1 {
        return category_url.to_string();
    }

    let mut url = category_url.clone();
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .append_pair(PAGE_PARAM, &page.to_string());

    url.to_string()
}

/// Returns the last path segment of a category URL, used as its short name in logs
pub fn category_slug(category_url: &str) -> String {
    category_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(category_url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_first_page_is_bare_url() {
        let url = listing_page_url(&category("https://shop.example.com/category/beauty-4"), 1);
        assert_eq!(url, "https://shop.example.com/category/beauty-4");
    }

    #[test]
    fn test_later_page_adds_param() {
        let url = listing_page_url(&category("https://shop.example.com/category/beauty-4"), 2);
        assert_eq!(url, "https://shop.example.com/category/beauty-4?page=2");
    }

    #[test]
    fn test_existing_query_kept() {
        let url = listing_page_url(&category("https://shop.example.com/search?q=shoes&page=7"), 3);
        assert_eq!(url, "https://shop.example.com/search?q=shoes&page=3");
    }

    #[test]
    fn test_category_slug() {
        assert_eq!(
            category_slug("https://shop.example.com/category/home-kitchen-602"),
            "home-kitchen-602"
        );
        assert_eq!(
            category_slug("https://shop.example.com/category/home-kitchen-602/"),
            "home-kitchen-602"
        );
    }
}
