//! Prompt text sent to the completion endpoint

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{short_description, Product};

/// Built-in prompts that don't require files
pub mod builtin {
    /// System instruction opening every routine session
    pub const BEAUTY_ADVISOR: &str = "You are a helpful beauty advisor. Only answer questions about the generated routine, skincare, haircare, makeup, fragrance, or other beauty topics. If asked about anything else, politely decline.";

    pub const ROUTINE_INTRO: &str = "Here are the selected products:";

    pub const ROUTINE_ASK: &str = "Please generate a personalized routine using these products.";
}

/// What the advisor is told about each selected product
#[derive(Debug, Serialize)]
struct ProductSummary<'a> {
    name: &'a str,
    brand: &'a str,
    category: &'a str,
    description: String,
}

impl<'a> From<&'a Product> for ProductSummary<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            name: &product.name,
            brand: &product.brand,
            category: &product.category,
            description: short_description(&product.description),
        }
    }
}

/// User turn asking for a routine built from `products`.
pub fn routine_request(products: &[Arc<Product>]) -> String {
    let summaries: Vec<ProductSummary<'_>> =
        products.iter().map(|p| ProductSummary::from(p.as_ref())).collect();

    format!(
        "{}\n{}\n{}",
        builtin::ROUTINE_INTRO,
        serde_json::to_string_pretty(&summaries).unwrap_or_default(),
        builtin::ROUTINE_ASK
    )
}
