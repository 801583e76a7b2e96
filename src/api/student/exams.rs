use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::errors::ApiError;
use crate::api::extract::JsonBody;
use crate::api::guards::{CurrentStudent, CurrentUser};
use crate::api::pagination::PageQuery;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::SectionType;
use crate::repositories;
use crate::schemas::exam::{
    AvailableExam, AvailableExamsQuery, DetailedAnswer, ExamResultDetail, ExamStartResponse,
    HistoryItem, ListeningExamSummary, RetakeResponse, StartMedia, StartOption, StartPassage,
    StartQuestion, StartSection, SubmitResponse,
};
use crate::services::exam_submission;

use super::helpers::{check_exam_access, require_exam_access};

pub(in crate::api::student) async fn available_exams(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Query(params): Query<AvailableExamsQuery>,
) -> Result<Json<Vec<AvailableExam>>, ApiError> {
    let now = primitive_now_utc();
    let summaries = repositories::exams::list_active_summaries(state.db(), params.section_type)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exams"))?;

    let mut exams = Vec::with_capacity(summaries.len());
    for summary in summaries {
        if !check_exam_access(&state, &student, &summary.id, now).await?.is_granted() {
            continue;
        }
        exams.push(AvailableExam {
            exam_id: summary.id,
            title: summary.title,
            description: summary.description,
            total_duration: summary.total_duration,
            total_marks: summary.total_marks,
        });
    }

    Ok(Json(exams))
}

pub(in crate::api::student) async fn available_listening_exams(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<ListeningExamSummary>>, ApiError> {
    let now = primitive_now_utc();
    let summaries =
        repositories::exams::list_active_summaries(state.db(), Some(SectionType::Listening))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch listening exams"))?;

    let mut exams = Vec::with_capacity(summaries.len());
    for summary in summaries {
        if !check_exam_access(&state, &student, &summary.id, now).await?.is_granted() {
            continue;
        }
        let is_completed =
            repositories::answers::listening_exists(state.db(), &summary.id, &student.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to check listening answers"))?;
        exams.push(ListeningExamSummary {
            exam_id: summary.id,
            title: summary.title,
            duration: summary.total_duration,
            total_marks: summary.total_marks,
            is_completed,
        });
    }

    Ok(Json(exams))
}

/// Serves the full exam content. Correct answers are stripped by the response types.
pub(in crate::api::student) async fn start_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamStartResponse>, ApiError> {
    let now = primitive_now_utc();
    let exam = repositories::exams::find_active_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found or not active".to_string()))?;

    require_exam_access(&state, &user, &exam.id, now).await?;

    let sections = repositories::sections::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam sections"))?;
    let questions = repositories::content::list_questions_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let options = repositories::content::list_options_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question options"))?;
    let passages = repositories::content::list_passages_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch reading passages"))?;
    let media = repositories::content::list_media_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch listening media"))?;

    let mut options_by_question: HashMap<String, Vec<StartOption>> = HashMap::new();
    for option in options {
        options_by_question.entry(option.question_id.clone()).or_default().push(option.into());
    }

    let mut questions_by_section: HashMap<String, Vec<StartQuestion>> = HashMap::new();
    for question in questions {
        let options = options_by_question.remove(&question.id).unwrap_or_default();
        questions_by_section
            .entry(question.section_id.clone())
            .or_default()
            .push(StartQuestion::new(question, options));
    }

    let mut passages_by_section: HashMap<String, Vec<StartPassage>> = HashMap::new();
    for passage in passages {
        passages_by_section.entry(passage.section_id.clone()).or_default().push(passage.into());
    }

    let mut media_by_section: HashMap<String, StartMedia> = HashMap::new();
    for item in media {
        media_by_section.entry(item.section_id.clone()).or_insert_with(|| item.into());
    }

    let has_listening =
        sections.iter().any(|section| section.section_type == SectionType::Listening);
    let is_completed = if has_listening {
        repositories::answers::listening_exists(state.db(), &exam.id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check listening answers"))?
    } else {
        false
    };

    let sections = sections
        .into_iter()
        .map(|section| StartSection {
            passages: passages_by_section.remove(&section.id).unwrap_or_default(),
            media: media_by_section.remove(&section.id),
            questions: questions_by_section.remove(&section.id).unwrap_or_default(),
            section_id: section.id,
            section_type: section.section_type,
            duration: section.duration,
            total_marks: section.total_marks,
            order_number: section.order_number,
        })
        .collect();

    tracing::info!(exam_id = %exam.id, user_id = %user.id, "Exam content served");

    Ok(Json(ExamStartResponse {
        exam_id: exam.id,
        title: exam.title,
        start_time: format_primitive(now),
        is_completed,
        sections,
    }))
}

pub(in crate::api::student) async fn submit_exam(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    JsonBody(answers): JsonBody<HashMap<String, String>>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let now = primitive_now_utc();
    repositories::exams::find_active_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found or not active".to_string()))?;

    require_exam_access(&state, &student, &exam_id, now).await?;

    let outcome = exam_submission::submit(state.db(), &exam_id, &student.id, &answers, now).await?;

    Ok(Json(SubmitResponse {
        result_id: outcome.result.id,
        total_score: outcome.card.total_score,
        section_scores: outcome.card.section_scores,
        completion_date: format_primitive(outcome.result.completion_date),
    }))
}

pub(in crate::api::student) async fn retake_listening_exam(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<RetakeResponse>, ApiError> {
    repositories::exams::find_active_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found or not active".to_string()))?;

    let answers_deleted =
        repositories::answers::delete_listening(state.db(), &exam_id, &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to reset listening answers"))?;

    tracing::info!(exam_id = %exam_id, user_id = %student.id, answers_deleted, "Listening exam reset");

    Ok(Json(RetakeResponse {
        message: "Listening exam reset successfully. You can now retake the exam.".to_string(),
        exam_id,
        answers_deleted,
    }))
}

pub(in crate::api::student) async fn exam_result(
    Path(result_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<ExamResultDetail>, ApiError> {
    let result = repositories::results::find_for_user(state.db(), &result_id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam result"))?
        .ok_or_else(|| ApiError::NotFound("Exam result not found".to_string()))?;

    let exam = repositories::exams::find_by_id(state.db(), &result.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let sections = repositories::sections::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam sections"))?;
    let stored = if sections.iter().any(|section| section.section_type == SectionType::Listening)
    {
        repositories::answers::list_listening(state.db(), &exam.id, &student.id).await
    } else {
        repositories::answers::list_by_result(state.db(), &result.id).await
    }
    .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;

    let questions = repositories::content::list_questions_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let questions: HashMap<_, _> =
        questions.into_iter().map(|question| (question.id.clone(), question)).collect();

    let detailed_answers = stored
        .into_iter()
        .filter_map(|answer| {
            let question = questions.get(&answer.question_id)?;
            Some(DetailedAnswer {
                section_id: question.section_id.clone(),
                question_text: question.question_text.clone(),
                correct_answer: question.correct_answer.clone(),
                max_marks: question.marks,
                question_id: answer.question_id,
                student_answer: answer.student_answer,
                score: answer.score,
            })
        })
        .collect();

    Ok(Json(ExamResultDetail {
        result_id: result.id,
        exam_id: exam.id,
        exam_title: exam.title,
        completion_date: format_primitive(result.completion_date),
        total_score: result.total_score,
        section_scores: result.section_scores.0,
        detailed_answers,
    }))
}

pub(in crate::api::student) async fn exam_history(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    let rows = repositories::results::list_history(
        state.db(),
        &student.id,
        page.offset(),
        page.bounded_limit(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch exam history"))?;

    Ok(Json(rows.into_iter().map(HistoryItem::from).collect()))
}
