//! Catalog sources: a local JSON file or a remote URL

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{parse_catalog, CatalogError, CatalogSource, Product};

/// Catalog read from a JSON file on disk
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn load(&self) -> Result<Vec<Arc<Product>>, CatalogError> {
        let body = tokio::fs::read_to_string(&self.path).await?;
        let products = parse_catalog(&body)?;
        tracing::debug!(path = %self.path.display(), count = products.len(), "Loaded catalog file");
        Ok(products)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Catalog fetched over HTTP on every load
pub struct HttpCatalog {
    url: String,
    client: Client,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn load(&self) -> Result<Vec<Arc<Product>>, CatalogError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let products = parse_catalog(&body)?;
        tracing::debug!(url = %self.url, count = products.len(), "Fetched catalog");
        Ok(products)
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}
