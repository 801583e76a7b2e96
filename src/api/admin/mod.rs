mod handlers;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/exams/:exam_id/access", get(handlers::get_access).put(handlers::update_access))
        .route("/exams/:exam_id/status", put(handlers::update_status))
        .route("/listening-tests", post(handlers::initialize_listening_test))
        .route("/listening-tests/:exam_id/parts/:part_number", put(handlers::update_listening_part))
        .route("/reading-tests", post(handlers::initialize_reading_test))
        .route("/reading-tests/:exam_id/parts/:part_number", put(handlers::update_reading_part))
        .route(
            "/speaking/topics",
            get(handlers::list_speaking_topics).post(handlers::create_speaking_topic),
        )
        .route("/speaking/topics/:topic_id/questions", post(handlers::add_speaking_question))
        .route("/writing-tests", post(handlers::initialize_writing_test))
        .route("/writing-tests/:exam_id/parts", post(handlers::add_writing_part))
}

#[cfg(test)]
mod tests;
