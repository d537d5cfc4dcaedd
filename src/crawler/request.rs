//! Render request descriptors
//!
//! A `PendingRequest` is created when a fetch is issued and carries everything
//! its completion handler needs to resume the crawl.

use crate::CatalogError;

/// Which handler a request's completion goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Listing,
    Product,
}

/// Routing context attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContext {
    Listing {
        category_index: usize,
        page: u32,
        retry_count: u32,
    },
    Product {
        product_url: String,
        category_url: String,
        retry_count: u32,
    },
}

/// A render request waiting to be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub url: String,
    pub kind: RequestKind,
    pub context: RequestContext,
}

impl PendingRequest {
    /// Creates a listing page request
    pub fn listing(url: String, category_index: usize, page: u32, retry_count: u32) -> Self {
        Self {
            url,
            kind: RequestKind::Listing,
            context: RequestContext::Listing {
                category_index,
                page,
                retry_count,
            },
        }
    }

    /// Creates a product page request; the product URL doubles as the target
    pub fn product(product_url: String, category_url: String) -> Self {
        Self {
            url: product_url.clone(),
            kind: RequestKind::Product,
            context: RequestContext::Product {
                product_url,
                category_url,
                retry_count: 0,
            },
        }
    }

    /// Retry count of this request's chain
    pub fn retry_count(&self) -> u32 {
        match &self.context {
            RequestContext::Listing { retry_count, .. } => *retry_count,
            RequestContext::Product { retry_count, .. } => *retry_count,
        }
    }

    /// The same request with its retry count incremented
    pub fn retried(&self) -> Self {
        let mut next = self.clone();
        match &mut next.context {
            RequestContext::Listing { retry_count, .. } => *retry_count += 1,
            RequestContext::Product { retry_count, .. } => *retry_count += 1,
        }
        next
    }

    /// Returns `(category_index, page, retry_count)` for a listing request
    pub fn listing_route(&self) -> Result<(usize, u32, u32), CatalogError> {
        match (&self.kind, &self.context) {
            (
                RequestKind::Listing,
                RequestContext::Listing {
                    category_index,
                    page,
                    retry_count,
                },
            ) => Ok((*category_index, *page, *retry_count)),
            _ => Err(self.malformed("expected listing context")),
        }
    }

    /// Returns `(product_url, category_url)` for a product request
    pub fn product_route(&self) -> Result<(&str, &str), CatalogError> {
        match (&self.kind, &self.context) {
            (
                RequestKind::Product,
                RequestContext::Product {
                    product_url,
                    category_url,
                    ..
                },
            ) => Ok((product_url, category_url)),
            _ => Err(self.malformed("expected product context")),
        }
    }

    pub(crate) fn malformed(&self, reason: &str) -> CatalogError {
        CatalogError::MalformedContext {
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}
