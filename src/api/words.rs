//! Dictionary lookups

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::phonetics::{Category, Difficulty, WordEntry};

#[derive(Debug, Deserialize)]
struct ListQuery {
    category: Option<String>,
    difficulty: Option<u8>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
}

/// List words, optionally filtered by category and difficulty
async fn list(State(state): State<Arc<ApiState>>, Query(query): Query<ListQuery>) -> Response {
    let category = match query.category.as_deref().map(str::parse::<Category>).transpose() {
        Ok(c) => c,
        Err(e) => return bad_request(e.to_string()),
    };
    let difficulty = match query.difficulty.map(Difficulty::try_from).transpose() {
        Ok(d) => d,
        Err(e) => return bad_request(e.to_string()),
    };

    let words: Vec<WordEntry> = state
        .dictionary
        .entries()
        .into_iter()
        .filter(|w| category.is_none_or(|c| w.category == c))
        .filter(|w| difficulty.is_none_or(|d| w.difficulty == d))
        .cloned()
        .collect();

    Json(words).into_response()
}

/// Look up one word (plural forms fall back to the singular)
async fn lookup(State(state): State<Arc<ApiState>>, Path(word): Path<String>) -> Response {
    match state.dictionary.lookup(&word) {
        Some(entry) => Json(entry.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("unknown word: {word}"),
            }),
        )
            .into_response(),
    }
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/{word}", get(lookup))
        .with_state(state)
}
