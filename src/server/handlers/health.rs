use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let corpus = state.engine.corpus();
    Json(json!({
        "status": "ok",
        "fragments": corpus.len(),
        "dimensions": corpus.dimensions(),
        "embedding_model": state.engine.embeddings().model_name(),
        "metric": state.engine.metric().name(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
