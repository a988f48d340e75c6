//! API routes

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::{notices, Fragments, RenderError, Renderer};
use crate::state::{request_completion, CompletionOutcome, PickerSession, SessionError};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Session(SessionError::Busy) => StatusCode::CONFLICT,
            ApiError::Session(SessionError::UnknownProduct(_)) => StatusCode::NOT_FOUND,
            ApiError::Session(_) => StatusCode::BAD_REQUEST,
            ApiError::Render(e) => {
                tracing::error!("Rendering failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

type ApiResult = Result<Json<Fragments>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct FollowUp {
    pub message: String,
}

/// Both selection-dependent regions
fn selection_fragments(renderer: &Renderer, session: &PickerSession) -> ApiResult {
    Ok(Json(Fragments {
        products: Some(renderer.product_grid(
            session.category(),
            session.visible_products(),
            session.selection(),
        )?),
        selected: Some(renderer.selected_list(session.selection())?),
        chat: None,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(state.renderer.page()?))
}

async fn products(State(state): State<AppState>, Query(query): Query<CategoryQuery>) -> ApiResult {
    let category = query.category.as_str();

    if category.is_empty() {
        let mut session = state.session.lock().await;
        session.show_category("", &[]);
        return selection_fragments(&state.renderer, &session);
    }

    // Fetched on every change, outside the session lock
    match state.catalog.load().await {
        Ok(catalog) => {
            let mut session = state.session.lock().await;
            session.show_category(category, &catalog);
            selection_fragments(&state.renderer, &session)
        }
        Err(e) => {
            tracing::warn!(source = %state.catalog.location(), "Catalog fetch failed: {}", e);
            Ok(Json(Fragments {
                products: Some(state.renderer.catalog_error()?),
                ..Default::default()
            }))
        }
    }
}

async fn selection(State(state): State<AppState>) -> ApiResult {
    let session = state.session.lock().await;
    selection_fragments(&state.renderer, &session)
}

async fn toggle(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let mut session = state.session.lock().await;
    session.toggle_selection(&id).await?;
    selection_fragments(&state.renderer, &session)
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let mut session = state.session.lock().await;
    session.remove_selection(&id).await;
    selection_fragments(&state.renderer, &session)
}

async fn clear(State(state): State<AppState>) -> ApiResult {
    let mut session = state.session.lock().await;
    session.clear_selection().await;
    selection_fragments(&state.renderer, &session)
}

fn chat_only(chat: String) -> ApiResult {
    Ok(Json(Fragments {
        chat: Some(chat),
        ..Default::default()
    }))
}

async fn routine(State(state): State<AppState>) -> ApiResult {
    let ticket = {
        let mut session = state.session.lock().await;
        match session.begin_routine_session() {
            Ok(()) => {}
            Err(SessionError::EmptySelection) => {
                return chat_only(state.renderer.notice(notices::SELECT_FIRST)?);
            }
            Err(e) => return Err(e.into()),
        }
        session.begin_completion()?
    };

    let outcome = request_completion(&state.session, Arc::clone(&state.completion), ticket).await;

    let chat = match outcome {
        CompletionOutcome::Replied(reply) => {
            tracing::info!(chars = reply.len(), "Routine generated");
            let session = state.session.lock().await;
            state.renderer.transcript(session.transcript().messages())?
        }
        CompletionOutcome::Failed(e) if e.is_transport() => {
            state.renderer.notice(notices::CONNECTION_FAILED)?
        }
        CompletionOutcome::Failed(_) => state.renderer.notice(notices::ROUTINE_FAILED)?,
    };

    chat_only(chat)
}

async fn chat(State(state): State<AppState>, Json(request): Json<FollowUp>) -> ApiResult {
    let ticket = {
        let mut session = state.session.lock().await;
        match session.append_user_turn(&request.message) {
            Ok(_) => {}
            // Blank input changes nothing
            Err(SessionError::EmptyInput) => return Ok(Json(Fragments::default())),
            Err(e) => return Err(e.into()),
        }
        session.begin_completion()?
    };

    let outcome = request_completion(&state.session, Arc::clone(&state.completion), ticket).await;

    let session = state.session.lock().await;
    let mut chat = state.renderer.transcript(session.transcript().messages())?;
    if let CompletionOutcome::Failed(e) = outcome {
        let message = if e.is_transport() {
            notices::CONNECTION_FAILED
        } else {
            notices::ANSWER_FAILED
        };
        chat.push('\n');
        chat.push_str(&state.renderer.notice(message)?);
    }

    chat_only(chat)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/products", get(products))
        .route("/selection", get(selection).delete(clear))
        .route("/selection/:id", delete(remove))
        .route("/selection/:id/toggle", post(toggle))
        .route("/routine", post(routine))
        .route("/chat", post(chat))
}
