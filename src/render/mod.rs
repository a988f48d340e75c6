//! HTML rendering
//!
//! Every method here is a pure projection of the state it is given. The page
//! shell swaps the returned markup into its containers and handles clicks by
//! delegation on those containers, so nothing rendered here carries listeners.
//!
//! Markup lives in handlebars templates registered once at startup; catalog
//! and chat text is escaped by the template engine.

mod page;
mod templates;

use std::sync::Arc;

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{short_description, Product};
use crate::conversation::{Message, Role};

pub mod notices {
    pub const CHOOSE_CATEGORY: &str = "Select a category to view products";
    pub const EMPTY_CATEGORY: &str = "No products found in this category.";
    pub const CATALOG_FAILED: &str = "Sorry, the product catalog could not be loaded. Please try again.";
    pub const NO_SELECTION: &str = "No products selected.";
    pub const SELECT_FIRST: &str = "Please select at least one product to generate a routine.";
    pub const GENERATING: &str = "Generating your personalized routine...";
    pub const ROUTINE_FAILED: &str = "Sorry, I couldn't generate a routine. Please try again.";
    pub const ANSWER_FAILED: &str = "Sorry, I couldn't answer that. Please try again.";
    pub const CONNECTION_FAILED: &str = "There was an error connecting to the AI. Please try again later.";
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Re-rendered page regions. A `None` region is left as it is.
#[derive(Debug, Default, Serialize)]
pub struct Fragments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<String>,
}

#[derive(Serialize)]
struct TextView<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct NoticeView<'a> {
    text: &'a str,
    spinner: bool,
}

#[derive(Serialize)]
struct CardView<'a> {
    id: String,
    name: &'a str,
    brand: &'a str,
    image: &'a str,
    description: String,
    selected: bool,
}

#[derive(Serialize)]
struct GridView<'a> {
    cards: Vec<CardView<'a>>,
}

#[derive(Serialize)]
struct ItemView<'a> {
    id: String,
    name: &'a str,
}

#[derive(Serialize)]
struct SelectedView<'a> {
    items: Vec<ItemView<'a>>,
}

#[derive(Serialize)]
struct BubbleView<'a> {
    role: &'static str,
    lines: Vec<&'a str>,
}

#[derive(Serialize)]
struct TranscriptView<'a> {
    bubbles: Vec<BubbleView<'a>>,
}

#[derive(Serialize)]
struct PageView {
    choose_category: String,
    typing_indicator: &'static str,
    generating: String,
    connection_failed: String,
}

/// Renders page regions from registered templates
pub struct Renderer {
    hbs: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut hbs = Handlebars::new();
        hbs.register_template_string(templates::PLACEHOLDER, templates::PLACEHOLDER_TEMPLATE)?;
        hbs.register_template_string(templates::NOTICE, templates::NOTICE_TEMPLATE)?;
        hbs.register_template_string(templates::PRODUCT_GRID, templates::PRODUCT_GRID_TEMPLATE)?;
        hbs.register_template_string(templates::SELECTED_LIST, templates::SELECTED_LIST_TEMPLATE)?;
        hbs.register_template_string(templates::TRANSCRIPT, templates::TRANSCRIPT_TEMPLATE)?;
        hbs.register_template_string(templates::PAGE, page::PAGE_TEMPLATE)?;

        Ok(Self { hbs })
    }

    fn placeholder(&self, text: &str) -> Result<String, RenderError> {
        Ok(self.hbs.render(templates::PLACEHOLDER, &TextView { text })?)
    }

    /// A standalone message in the chat area
    pub fn notice(&self, text: &str) -> Result<String, RenderError> {
        Ok(self.hbs.render(templates::NOTICE, &NoticeView { text, spinner: false })?)
    }

    fn generating_notice(&self) -> Result<String, RenderError> {
        let view = NoticeView {
            text: notices::GENERATING,
            spinner: true,
        };
        Ok(self.hbs.render(templates::NOTICE, &view)?)
    }

    /// Cards for the filtered products, highlighted when selected.
    pub fn product_grid(
        &self,
        category: &str,
        products: &[Arc<Product>],
        selection: &[Arc<Product>],
    ) -> Result<String, RenderError> {
        if category.is_empty() {
            return self.placeholder(notices::CHOOSE_CATEGORY);
        }
        if products.is_empty() {
            return self.placeholder(notices::EMPTY_CATEGORY);
        }

        let cards = products
            .iter()
            .map(|product| CardView {
                id: product.id.to_string(),
                name: &product.name,
                brand: &product.brand,
                image: &product.image,
                description: short_description(&product.description),
                selected: selection.iter().any(|s| s.id == product.id),
            })
            .collect();

        Ok(self.hbs.render(templates::PRODUCT_GRID, &GridView { cards })?)
    }

    pub fn catalog_error(&self) -> Result<String, RenderError> {
        self.placeholder(notices::CATALOG_FAILED)
    }

    /// The selected products with per-item removal and a clear-all control.
    pub fn selected_list(&self, selection: &[Arc<Product>]) -> Result<String, RenderError> {
        if selection.is_empty() {
            return self.placeholder(notices::NO_SELECTION);
        }

        let items = selection
            .iter()
            .map(|product| ItemView {
                id: product.id.to_string(),
                name: &product.name,
            })
            .collect();

        Ok(self.hbs.render(templates::SELECTED_LIST, &SelectedView { items })?)
    }

    /// User and assistant turns as chat bubbles, in order.
    pub fn transcript(&self, messages: &[Message]) -> Result<String, RenderError> {
        let bubbles = messages
            .iter()
            .filter_map(|message| {
                let role = match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => return None,
                };
                Some(BubbleView {
                    role,
                    lines: message.content.split('\n').collect(),
                })
            })
            .collect();

        Ok(self.hbs.render(templates::TRANSCRIPT, &TranscriptView { bubbles })?)
    }

    /// The full page, with the snippets its script reuses
    pub fn page(&self) -> Result<String, RenderError> {
        let view = PageView {
            choose_category: self.placeholder(notices::CHOOSE_CATEGORY)?,
            typing_indicator: templates::TYPING_INDICATOR,
            generating: self.generating_notice()?,
            connection_failed: self.notice(notices::CONNECTION_FAILED)?,
        };
        Ok(self.hbs.render(templates::PAGE, &view)?)
    }
}
