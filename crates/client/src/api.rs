//! HTTP client for the storefront catalog API.
//!
//! [`CatalogApi`] is the seam the controller talks to; [`HttpCatalogClient`]
//! implements it with `reqwest`. Tests substitute a scripted implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use dharma_core::api::{
    CategoryListResponse, ErrorResponse, ProductCountResponse, ProductFilterRequest,
    ProductListResponse, ProductResponse, paths,
};
use dharma_core::{Category, ProductId, ProductSummary};

use crate::config::ClientConfig;

/// Errors talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Backend answered 2xx but flagged the body as unsuccessful.
    #[error("backend reported failure for {0}")]
    Unsuccessful(&'static str),
}

/// Catalog operations the browse controller depends on.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// All categories.
    async fn categories(&self) -> Result<Vec<Category>, ClientError>;

    /// Total number of products.
    async fn product_count(&self) -> Result<u64, ClientError>;

    /// One listing page (1-based).
    async fn product_page(&self, page: u32) -> Result<Vec<ProductSummary>, ClientError>;

    /// Products matching a filter request.
    async fn filter_products(
        &self,
        request: &ProductFilterRequest,
    ) -> Result<Vec<ProductSummary>, ClientError>;
}

/// `reqwest`-backed [`CatalogApi`].
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base: Url,
}

impl HttpCatalogClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base: api_base(&config.backend_url),
        })
    }

    /// `path` resolved under the backend URL, keeping any path prefix.
    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Absolute URL of a product's photo.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` if the URL cannot be joined.
    pub fn photo_url(&self, id: ProductId) -> Result<Url, ClientError> {
        self.endpoint(&paths::product_photo(id))
    }

    /// A single product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` with 404 for an unknown slug.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<ProductSummary, ClientError> {
        let body: ProductResponse = self.get_json(&paths::product_by_slug(slug)).await?;
        Ok(body.product)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        let body: CategoryListResponse = self.get_json(paths::CATEGORIES).await?;
        category_list(body)
    }

    #[instrument(skip(self))]
    async fn product_count(&self) -> Result<u64, ClientError> {
        let body: ProductCountResponse = self.get_json(paths::PRODUCT_COUNT).await?;
        Ok(body.total)
    }

    #[instrument(skip(self))]
    async fn product_page(&self, page: u32) -> Result<Vec<ProductSummary>, ClientError> {
        let body: ProductListResponse = self.get_json(&paths::product_list(page)).await?;
        debug!(page, returned = body.products.len(), "Fetched listing page");
        Ok(body.products)
    }

    #[instrument(skip(self, request), fields(checked = request.checked.len(), radio = request.radio.len()))]
    async fn filter_products(
        &self,
        request: &ProductFilterRequest,
    ) -> Result<Vec<ProductSummary>, ClientError> {
        let url = self.endpoint(paths::PRODUCT_FILTERS)?;
        let response = self.client.post(url).json(request).send().await?;
        let body: ProductListResponse = decode(response).await?;
        debug!(returned = body.products.len(), "Fetched filter result");
        Ok(body.products)
    }
}

/// The backend URL with a trailing slash, so relative joins stay beneath it.
fn api_base(url: &Url) -> Url {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Categories are only trusted when the body says `success`.
fn category_list(body: CategoryListResponse) -> Result<Vec<Category>, ClientError> {
    if body.success {
        Ok(body.category)
    } else {
        tracing::warn!("Category response flagged unsuccessful");
        Err(ClientError::Unsuccessful("categories"))
    }
}

/// Turn a response into `T`, or a `ClientError::Status` carrying the
/// backend's error message.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();

    // Read as text first for better error diagnostics
    let text = response.text().await?;

    if !status.is_success() {
        let message = error_message(&text);
        tracing::warn!(status = %status, message = %message, "Backend returned non-success status");
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        ClientError::Parse(e)
    })
}

/// The `message` of a JSON error body, or the start of the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |err| err.message,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> HttpCatalogClient {
        HttpCatalogClient::new(&ClientConfig {
            backend_url: Url::parse("http://catalog.test:8080").unwrap(),
            cart_dir: ".dharma".into(),
            request_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_error_message_prefers_json_body() {
        assert_eq!(
            error_message(r#"{"success":false,"message":"page must be at least 1 (got 0)"}"#),
            "page must be at least 1 (got 0)"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_photo_url_is_absolute() {
        let id = ProductId::random();
        let url = client().photo_url(id).unwrap();
        assert_eq!(
            url.as_str(),
            format!("http://catalog.test:8080/api/v1/product/product-photo/{id}")
        );
    }

    #[test]
    fn test_backend_path_prefix_is_kept() {
        for base in ["http://catalog.test/shop", "http://catalog.test/shop/"] {
            let client = HttpCatalogClient::new(&ClientConfig {
                backend_url: Url::parse(base).unwrap(),
                cart_dir: ".dharma".into(),
                request_timeout: Duration::from_secs(1),
            })
            .unwrap();
            assert_eq!(
                client.endpoint(paths::PRODUCT_COUNT).unwrap().as_str(),
                "http://catalog.test/shop/api/v1/product/product-count"
            );
        }
    }

    #[test]
    fn test_unsuccessful_category_body_rejected() {
        let ok: CategoryListResponse =
            serde_json::from_str(r#"{"success":true,"category":[]}"#).unwrap();
        assert!(category_list(ok).unwrap().is_empty());

        let flagged: CategoryListResponse =
            serde_json::from_str(r#"{"success":false,"category":[]}"#).unwrap();
        assert!(matches!(
            category_list(flagged),
            Err(ClientError::Unsuccessful("categories"))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_http_error() {
        let client = HttpCatalogClient::new(&ClientConfig {
            backend_url: Url::parse("http://127.0.0.1:9").unwrap(),
            cart_dir: ".dharma".into(),
            request_timeout: Duration::from_millis(500),
        })
        .unwrap();
        assert!(matches!(
            client.product_count().await,
            Err(ClientError::Http(_))
        ));
    }
}
