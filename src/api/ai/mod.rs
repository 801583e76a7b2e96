mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/evaluate", post(handlers::evaluate))
        .route("/evaluate-and-save/:task_id", post(handlers::evaluate_and_save))
        .route("/evaluation/:answer_id", get(handlers::stored_evaluation))
        .route("/evaluation-status/:answer_id", get(handlers::evaluation_status))
}
