//! Product catalog
//!
//! The catalog is a read-only JSON document of the form
//! `{ "products": [ { id, name, brand, category, image, description } ] }`.
//! It is fetched fresh on every category change; nothing is cached between
//! filter changes.

mod source;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use source::{FileCatalog, HttpCatalog};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Catalog identifiers are used as-is, whether the document stores them as
/// numbers or strings. Any other JSON value is kept in its text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ProductId {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => match n.as_i64() {
                Some(n) => ProductId::Number(n),
                None => ProductId::Text(n.to_string()),
            },
            Value::String(s) => ProductId::Text(s),
            Value::Null => ProductId::default(),
            other => ProductId::Text(other.to_string()),
        })
    }
}

impl ProductId {
    /// Compare against an id taken from a URL path or form field.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            ProductId::Number(n) => key.trim().parse::<i64>().map_or(false, |k| k == *n),
            ProductId::Text(s) => s == key,
        }
    }
}

impl Default for ProductId {
    fn default() -> Self {
        ProductId::Text(String::new())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Number(n) => write!(f, "{}", n),
            ProductId::Text(s) => f.write_str(s),
        }
    }
}

/// Text fields take strings as they are and scalars in their text form.
/// `null`, arrays and objects read as empty.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// A catalog entry. Missing or unusable fields read as empty so a sparse
/// record still renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: ProductId,
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub brand: String,
    #[serde(deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(deserialize_with = "lenient_text")]
    pub image: String,
    #[serde(deserialize_with = "lenient_text")]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    products: Vec<Product>,
}

/// Parse a catalog document into shared product records.
pub fn parse_catalog(body: &str) -> Result<Vec<Arc<Product>>, CatalogError> {
    let document: CatalogDocument = serde_json::from_str(body)?;
    Ok(document.products.into_iter().map(Arc::new).collect())
}

/// Where product data comes from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full product list.
    async fn load(&self) -> Result<Vec<Arc<Product>>, CatalogError>;

    /// Human readable location, used in logs
    fn location(&self) -> String;
}

/// Pick a source for a configured location: `http://` and `https://` URLs are
/// fetched over the network, anything else is read as a local file.
pub fn from_location(location: &str) -> Arc<dyn CatalogSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return Arc::new(HttpCatalog::new(location));
    }
    Arc::new(FileCatalog::new(location))
}

/// Keep the products whose category label equals `category` exactly.
pub fn filter_by_category(products: &[Arc<Product>], category: &str) -> Vec<Arc<Product>> {
    products
        .iter()
        .filter(|p| p.category == category)
        .cloned()
        .collect()
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// At most the first two sentences of `text`.
///
/// A sentence is a run of non-terminator characters followed by one or more
/// of `.`, `!` or `?`. Text without any such sentence is returned unchanged.
pub fn short_description(text: &str) -> String {
    let mut sentences: Vec<&str> = Vec::with_capacity(2);
    let mut run_start: Option<usize> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_sentence_end(c) {
            run_start.get_or_insert(i);
            continue;
        }

        // A terminator with nothing before it does not start a sentence.
        let Some(start) = run_start.take() else {
            continue;
        };

        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_sentence_end(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }

        sentences.push(text[start..end].trim());
        if sentences.len() == 2 {
            break;
        }
    }

    if sentences.is_empty() {
        return text.to_string();
    }

    sentences.join(" ").trim().to_string()
}
