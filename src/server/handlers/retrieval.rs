use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::AssembledContext;
use crate::core::errors::RagError;
use crate::rag::Answer;
use crate::retrieval::SearchHit;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, RagError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RagError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, RagError> {
    let query = require_text(&request.query, "query")?;
    let top_k = request.top_k.unwrap_or_else(|| state.engine.default_top_k());
    if top_k == 0 {
        return Err(RagError::BadRequest("top_k must be at least 1".to_string()));
    }

    let hits = state.engine.search(query, top_k).await?;
    Ok(Json(SearchResponse { hits }))
}

pub async fn context(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<AssembledContext>, RagError> {
    let question = require_text(&request.question, "question")?;
    Ok(Json(state.engine.prepare(question).await?))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<Answer>, RagError> {
    let question = require_text(&request.question, "question")?;
    Ok(Json(state.engine.answer_question(question).await?))
}
