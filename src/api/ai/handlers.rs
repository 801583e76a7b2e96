use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{JsonBody, ValidJson};
use crate::api::guards::CurrentStudent;
use crate::api::validation::validate_essay_inputs;
use crate::core::redis::essay_evaluation_key;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{User, WritingAnswer, WritingTask};
use crate::repositories;
use crate::schemas::ai::{
    EvaluateAndSaveRequest, EvaluateRequest, EvaluationResponse, EvaluationStatus,
    StoredEvaluationResponse,
};
use crate::services::essay_grading::{CriteriaScores, EssayEvaluation, EssayRequest};
use crate::services::text;

const RATE_LIMIT_WINDOW_SECONDS: u64 = 3600;

pub(super) async fn evaluate(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<EvaluateRequest>,
) -> Result<Json<EvaluationResponse>, ApiError> {
    let essay_text = text::plain_text(&payload.essay_text);
    let instructions = text::plain_text(&payload.instructions);
    validate_essay_inputs(&essay_text, &instructions)?;

    let part_number = match payload.task_id.as_deref() {
        Some(task_id) => find_task(&state, task_id).await?.part_number,
        None => payload.part_number,
    };

    enforce_rate_limit(&state, &student).await?;
    let evaluation = state
        .grader()
        .evaluate(EssayRequest { essay_text: &essay_text, instructions: &instructions, part_number })
        .await
        .map_err(|e| ApiError::internal(&e, &format!("AI evaluation failed: {e}")))?;

    Ok(Json(EvaluationResponse {
        task_id: payload.task_id,
        evaluation_timestamp: format_primitive(primitive_now_utc()),
        word_count: text::word_count(&essay_text),
        evaluation_result: evaluation,
        saved: None,
        answer_id: None,
        is_ai_evaluated: None,
    }))
}

/// Grades the caller's essay for a task and stores it. An answer already graded with
/// the same text is returned as stored, without another model call.
pub(super) async fn evaluate_and_save(
    Path(task_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EvaluateAndSaveRequest>,
) -> Result<Json<EvaluationResponse>, ApiError> {
    let task = find_task(&state, &task_id).await?;

    let essay_text = text::plain_text(&payload.essay_text);
    let instructions = text::plain_text(&payload.instructions);
    validate_essay_inputs(&essay_text, &instructions)?;

    let existing = repositories::writing::find_answer(state.db(), &task.id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing answer"))?;
    if let Some(answer) = existing {
        if answer.is_ai_evaluated && answer.answer_text == payload.essay_text {
            tracing::debug!(answer_id = %answer.id, "Returning stored essay evaluation");
            return Ok(Json(saved_response(answer)));
        }
    }

    enforce_rate_limit(&state, &student).await?;
    let evaluation = state
        .grader()
        .evaluate(EssayRequest {
            essay_text: &essay_text,
            instructions: &instructions,
            part_number: task.part_number,
        })
        .await
        .map_err(|e| ApiError::internal(&e, &format!("AI evaluation failed: {e}")))?;

    let now = primitive_now_utc();
    let answer = repositories::writing::upsert_answer(
        state.db(),
        &Uuid::new_v4().to_string(),
        &task.id,
        &student.id,
        &payload.essay_text,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save writing answer"))?;

    let answer = repositories::writing::save_evaluation(
        state.db(),
        &answer.id,
        repositories::writing::SaveEvaluation {
            band_score: evaluation.band_score,
            task_achievement: evaluation.criteria_scores.task_achievement,
            coherence_cohesion: evaluation.criteria_scores.coherence_cohesion,
            lexical_resource: evaluation.criteria_scores.lexical_resource,
            grammatical_range: evaluation.criteria_scores.grammatical_range,
            mistakes: evaluation.mistakes.clone(),
            improvement_suggestions: evaluation.improvement_suggestions.clone(),
            rewritten_essay: &evaluation.rewritten_essay,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save essay evaluation"))?;

    tracing::info!(
        answer_id = %answer.id,
        task_id = %task.id,
        user_id = %student.id,
        band_score = evaluation.band_score,
        "Essay evaluation saved"
    );

    Ok(Json(EvaluationResponse {
        task_id: Some(answer.task_id),
        evaluation_timestamp: format_primitive(answer.updated_at),
        word_count: text::word_count(&essay_text),
        evaluation_result: evaluation,
        saved: Some(true),
        answer_id: Some(answer.id),
        is_ai_evaluated: Some(true),
    }))
}

pub(super) async fn stored_evaluation(
    Path(answer_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<StoredEvaluationResponse>, ApiError> {
    let answer = find_answer(&state, &answer_id, &student).await?;

    Ok(Json(StoredEvaluationResponse {
        evaluation_result: stored_result(&answer),
        evaluation_timestamp: format_primitive(answer.updated_at),
        word_count: text::word_count(&text::plain_text(&answer.answer_text)),
        answer_id: answer.id,
        task_id: answer.task_id,
        answer_text: answer.answer_text,
    }))
}

pub(super) async fn evaluation_status(
    Path(answer_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<EvaluationStatus>, ApiError> {
    let answer = find_answer(&state, &answer_id, &student).await?;

    Ok(Json(EvaluationStatus {
        is_ai_evaluated: answer.is_ai_evaluated,
        answer_id: answer.id,
        task_id: answer.task_id,
    }))
}

async fn find_task(state: &AppState, task_id: &str) -> Result<WritingTask, ApiError> {
    repositories::writing::find_task(state.db(), task_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing task"))?
        .ok_or_else(|| ApiError::NotFound("Writing task not found".to_string()))
}

async fn find_answer(
    state: &AppState,
    answer_id: &str,
    user: &User,
) -> Result<WritingAnswer, ApiError> {
    repositories::writing::find_answer_for_user(state.db(), answer_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing answer"))?
        .ok_or_else(|| ApiError::NotFound("Writing answer not found".to_string()))
}

/// Counts one model call against the caller's hourly budget. A Redis failure lets the
/// call through.
async fn enforce_rate_limit(state: &AppState, user: &User) -> Result<(), ApiError> {
    let limit = state.settings().rate_limits().ai_evaluations_per_hour;
    match state
        .redis()
        .rate_limit(&essay_evaluation_key(&user.id), limit, RATE_LIMIT_WINDOW_SECONDS)
        .await
    {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::warn!(user_id = %user.id, limit, "Essay evaluation rate limit exceeded");
            Err(ApiError::TooManyRequests("Too many essay evaluations, try again later"))
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rate limit check failed; allowing request");
            Ok(())
        }
    }
}

fn stored_result(answer: &WritingAnswer) -> EssayEvaluation {
    EssayEvaluation {
        band_score: answer.score,
        criteria_scores: CriteriaScores {
            task_achievement: answer.task_achievement_score.unwrap_or_default(),
            coherence_cohesion: answer.coherence_cohesion_score.unwrap_or_default(),
            lexical_resource: answer.lexical_resource_score.unwrap_or_default(),
            grammatical_range: answer.grammatical_range_score.unwrap_or_default(),
        },
        mistakes: answer.mistakes.as_ref().map(|value| value.0.clone()).unwrap_or_else(|| json!({})),
        improvement_suggestions: answer
            .improvement_suggestions
            .as_ref()
            .map(|value| value.0.clone())
            .unwrap_or_else(|| json!({})),
        rewritten_essay: answer.rewritten_essay.clone().unwrap_or_default(),
    }
}

fn saved_response(answer: WritingAnswer) -> EvaluationResponse {
    EvaluationResponse {
        evaluation_result: stored_result(&answer),
        evaluation_timestamp: format_primitive(answer.updated_at),
        word_count: text::word_count(&text::plain_text(&answer.answer_text)),
        task_id: Some(answer.task_id),
        saved: Some(true),
        answer_id: Some(answer.id),
        is_ai_evaluated: Some(true),
    }
}
