//! Live session projection

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use super::ApiState;
use crate::session::FeedbackView;

/// Current mood, phase, feedback text and correction card
async fn current(State(state): State<Arc<ApiState>>) -> Json<FeedbackView> {
    Json(state.feedback.borrow().clone())
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", get(current)).with_state(state)
}
