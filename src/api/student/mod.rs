mod exams;
mod helpers;
mod speaking;
mod writing;

use axum::{routing::delete, routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        // Objective exams
        .route("/available-exams", get(exams::available_exams))
        .route("/available-listening-exams", get(exams::available_listening_exams))
        .route("/exam/:exam_id/start", get(exams::start_exam))
        .route("/exam/:exam_id/submit", post(exams::submit_exam))
        .route("/listening/exam/:exam_id/retake", delete(exams::retake_listening_exam))
        .route("/exam-result/:result_id", get(exams::exam_result))
        .route("/my-exam-history", get(exams::exam_history))
        // Writing practice
        .route("/writing/tasks", get(writing::list_writing_tests))
        .route("/writing/tasks/:task_id", get(writing::writing_task_detail))
        .route("/writing/tasks/:task_id/save-draft", post(writing::save_draft))
        .route("/writing/test/:test_id/submit", post(writing::submit_writing_test))
        .route("/writing/test/:test_id/answers", get(writing::writing_test_answers))
        .route("/writing/test/:test_id/reset", delete(writing::reset_writing_test))
        // Speaking practice
        .route("/speaking/topics", get(speaking::list_topics))
        .route("/speaking/topics/:topic_id", get(speaking::topic_detail))
        .route("/speaking/answers/:question_id", post(speaking::submit_answer))
        .route("/speaking/my-answers", get(speaking::my_answers))
}
