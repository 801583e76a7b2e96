use std::collections::{HashMap, HashSet};

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::JsonBody;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::writing::{
    AnsweredPart, OtherPart, PartSubmission, PreviousAnswer, SaveDraftResponse,
    WritingAnswerSubmit, WritingPart, WritingResetResponse, WritingTaskDetail,
    WritingTestAnswers, WritingTestSubmit, WritingTestSubmitResponse, WritingTestSummary,
};
use crate::services::exam_activation::WRITING_PARTS;
use crate::services::text;

use super::helpers::check_exam_access;

const TASK_NOT_FOUND: &str = "Writing task not found";
const TEST_NOT_FOUND: &str = "No writing tasks found for this test";

/// Active writing tests the caller may take, each with its parts. A test counts as
/// completed once every part has an answer.
pub(in crate::api::student) async fn list_writing_tests(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<WritingTestSummary>>, ApiError> {
    let now = primitive_now_utc();
    let rows = repositories::writing::list_active_tasks(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing tasks"))?;
    let answered: HashSet<String> =
        repositories::writing::list_answered_task_ids(state.db(), &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch writing answers"))?
            .into_iter()
            .collect();

    let mut tests: Vec<WritingTestSummary> = Vec::new();
    for row in rows {
        let part = WritingPart {
            task_id: row.id,
            part_number: row.part_number,
            task_type: row.task_type,
            instructions: row.instructions,
            word_limit: row.word_limit,
            total_marks: row.total_marks,
            duration: row.duration,
        };
        match tests.last_mut() {
            Some(test) if test.test_id == row.exam_id => test.parts.push(part),
            _ => tests.push(WritingTestSummary {
                test_id: row.exam_id,
                title: row.exam_title,
                is_completed: false,
                parts: vec![part],
            }),
        }
    }

    let mut visible = Vec::with_capacity(tests.len());
    for mut test in tests {
        if !check_exam_access(&state, &student, &test.test_id, now).await?.is_granted() {
            continue;
        }
        test.is_completed = test.parts.iter().all(|part| answered.contains(&part.task_id));
        visible.push(test);
    }

    Ok(Json(visible))
}

pub(in crate::api::student) async fn writing_task_detail(
    Path(task_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<WritingTaskDetail>, ApiError> {
    let task = repositories::writing::find_task(state.db(), &task_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing task"))?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    let previous_answer = repositories::writing::find_answer(state.db(), &task.id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing answer"))?
        .map(PreviousAnswer::from);

    Ok(Json(WritingTaskDetail {
        test_id: task.exam_id.clone(),
        part: task.into(),
        previous_answer,
    }))
}

pub(in crate::api::student) async fn save_draft(
    Path(task_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<WritingAnswerSubmit>,
) -> Result<Json<SaveDraftResponse>, ApiError> {
    let task = repositories::writing::find_task(state.db(), &task_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing task"))?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    let answer = repositories::writing::upsert_answer(
        state.db(),
        &Uuid::new_v4().to_string(),
        &task.id,
        &student.id,
        &payload.answer_text,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save writing answer"))?;

    let siblings = repositories::writing::list_tasks_by_exam(state.db(), &task.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing tasks"))?;
    let other_part = match siblings.into_iter().find(|sibling| sibling.id != task.id) {
        Some(other) => {
            let submitted = repositories::writing::find_answer(state.db(), &other.id, &student.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch writing answer"))?
                .is_some();
            Some(OtherPart { task_id: other.id, part_number: other.part_number, submitted })
        }
        None => None,
    };

    Ok(Json(SaveDraftResponse {
        message: "Writing answer submitted successfully".to_string(),
        task_id: task.id,
        answer_id: answer.id,
        part_number: task.part_number,
        word_count: text::word_count(&answer.answer_text),
        answer_text: answer.answer_text,
        other_part,
    }))
}

pub(in crate::api::student) async fn submit_writing_test(
    Path(test_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<WritingTestSubmit>,
) -> Result<Json<WritingTestSubmitResponse>, ApiError> {
    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let tasks = repositories::writing::list_tasks_by_exam(&mut *tx, &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing tasks"))?;
    if tasks.len() != WRITING_PARTS {
        return Err(ApiError::BadRequest("Writing test must have exactly two parts".to_string()));
    }

    let mut submissions = Vec::with_capacity(tasks.len());
    for task in tasks {
        let answer_text =
            if task.part_number == 1 { &payload.part1_answer } else { &payload.part2_answer };
        repositories::writing::upsert_answer(
            &mut *tx,
            &Uuid::new_v4().to_string(),
            &task.id,
            &student.id,
            answer_text,
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to save writing answer"))?;

        submissions.push(PartSubmission {
            task_id: task.id,
            part_number: task.part_number,
            word_count: text::word_count(answer_text),
            task_type: task.task_type,
        });
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;
    tracing::info!(test_id = %test_id, user_id = %student.id, "Writing test submitted");

    Ok(Json(WritingTestSubmitResponse {
        message: "Writing test submitted successfully".to_string(),
        test_id,
        submissions,
    }))
}

pub(in crate::api::student) async fn writing_test_answers(
    Path(test_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<WritingTestAnswers>, ApiError> {
    let tasks = repositories::writing::list_tasks_by_exam(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing tasks"))?;
    if tasks.is_empty() {
        return Err(ApiError::NotFound(TEST_NOT_FOUND.to_string()));
    }

    let mut answers: HashMap<String, PreviousAnswer> =
        repositories::writing::list_answers_by_exam(state.db(), &test_id, &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch writing answers"))?
            .into_iter()
            .map(|answer| (answer.task_id.clone(), PreviousAnswer::from(answer)))
            .collect();

    let parts: Vec<AnsweredPart> = tasks
        .into_iter()
        .map(|task| AnsweredPart {
            answer: answers.remove(&task.id),
            task_id: task.id,
            part_number: task.part_number,
            task_type: task.task_type,
            instructions: task.instructions,
            word_limit: task.word_limit,
        })
        .collect();

    let total_parts = parts.len();
    let submitted_parts = parts.iter().filter(|part| part.answer.is_some()).count();

    Ok(Json(WritingTestAnswers {
        test_id,
        is_completed: total_parts == submitted_parts,
        total_parts,
        submitted_parts,
        parts,
    }))
}

pub(in crate::api::student) async fn reset_writing_test(
    Path(test_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<WritingResetResponse>, ApiError> {
    let tasks = repositories::writing::list_tasks_by_exam(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch writing tasks"))?;
    if tasks.is_empty() {
        return Err(ApiError::NotFound(TEST_NOT_FOUND.to_string()));
    }

    let answers_deleted =
        repositories::writing::delete_answers_by_exam(state.db(), &test_id, &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to reset writing answers"))?;

    Ok(Json(WritingResetResponse {
        message: "Writing test answers reset successfully".to_string(),
        test_id,
        answers_deleted,
    }))
}
