//! Fragment templates
//!
//! Registered once by [`super::Renderer`]. Double-stash expressions are HTML
//! escaped by handlebars.

pub const PLACEHOLDER: &str = "placeholder";
pub const NOTICE: &str = "notice";
pub const PRODUCT_GRID: &str = "product-grid";
pub const SELECTED_LIST: &str = "selected-list";
pub const TRANSCRIPT: &str = "transcript";
pub const PAGE: &str = "page";

pub const PLACEHOLDER_TEMPLATE: &str = r#"<div class="placeholder-message">{{text}}</div>"#;

pub const NOTICE_TEMPLATE: &str =
    r#"<div class="chat-notice">{{text}}{{#if spinner}} <span class="chat-loading-spinner"></span>{{/if}}</div>"#;

/// Description overlays always start collapsed
pub const PRODUCT_GRID_TEMPLATE: &str = r#"{{#each cards}}
<div class="product-card{{#if selected}} selected{{/if}}" data-id="{{id}}">
  <img src="{{image}}" alt="{{name}}">
  <div class="product-info">
    <h3>{{name}}</h3>
    <p>{{brand}}</p>
    <button class="product-desc-toggle" data-id="{{id}}" aria-expanded="false">Show Description</button>
  </div>
  <div class="product-desc-overlay" hidden>
    <strong>Description:</strong><br>
    {{description}}
  </div>
</div>
{{/each}}"#;

pub const SELECTED_LIST_TEMPLATE: &str = r#"{{#each items}}
<div class="selected-product-item" data-id="{{id}}">
  <span>{{name}}</span>
  <button class="selected-product-remove" title="Remove" aria-label="Remove {{name}}">&times;</button>
</div>
{{/each}}
<button id="clearSelectedProducts" class="clear-selected">Clear All</button>"#;

pub const TRANSCRIPT_TEMPLATE: &str = r#"{{#each bubbles}}
<div class="chat-message {{role}}">{{#each lines}}{{#if @index}}<br>{{/if}}{{this}}{{/each}}</div>
{{/each}}"#;

pub const TYPING_INDICATOR: &str = r#"<div class="chat-typing-indicator"><span class="chat-typing-dots"><span class="chat-typing-dot"></span><span class="chat-typing-dot"></span><span class="chat-typing-dot"></span></span></div>"#;
