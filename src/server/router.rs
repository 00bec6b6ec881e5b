use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::server::handlers::{health_handler, index_handler, output_handler, process_handler};
use crate::server::state::AppState;

/// Room for the multipart framing around the video itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/process", post(process_handler).layer(DefaultBodyLimit::max(body_limit)))
        .route("/outputs/{run_id}", get(output_handler))
        .with_state(state)
}
