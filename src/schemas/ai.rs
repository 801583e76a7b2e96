use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::essay_grading::EssayEvaluation;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EvaluateRequest {
    #[validate(range(min = 1, max = 2, message = "part_number must be 1 or 2"))]
    pub(crate) part_number: i32,
    pub(crate) essay_text: String,
    pub(crate) instructions: String,
    #[serde(default)]
    pub(crate) task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateAndSaveRequest {
    pub(crate) essay_text: String,
    pub(crate) instructions: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EvaluationResponse {
    pub(crate) task_id: Option<String>,
    pub(crate) evaluation_timestamp: String,
    pub(crate) word_count: usize,
    pub(crate) evaluation_result: EssayEvaluation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) saved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) answer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_ai_evaluated: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StoredEvaluationResponse {
    pub(crate) answer_id: String,
    pub(crate) task_id: String,
    pub(crate) evaluation_timestamp: String,
    pub(crate) word_count: usize,
    pub(crate) answer_text: String,
    pub(crate) evaluation_result: EssayEvaluation,
}

#[derive(Debug, Serialize)]
pub(crate) struct EvaluationStatus {
    pub(crate) is_ai_evaluated: bool,
    pub(crate) answer_id: String,
    pub(crate) task_id: String,
}
