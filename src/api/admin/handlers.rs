use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{JsonBody, ValidJson};
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{
    parse_access_types, validate_listening_part, validate_reading_part, validate_speaking_part_type,
};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Exam;
use crate::repositories;
use crate::schemas::admin::{
    ExamAccessResponse, ExamAccessUpdate, ExamCreatedResponse, ExamStatusQuery,
    ExamStatusResponse, ListeningPartPayload, ListeningPartResponse, ListeningTestInit,
    ReadingPartPayload, ReadingPartResponse, ReadingTestInit, SpeakingQuestionCreate,
    SpeakingQuestionCreated, SpeakingTopicCreate, SpeakingTopicCreated, SpeakingTopicEntry,
    WritingTaskCreate, WritingTaskResponse, WritingTestInit,
};
use crate::services::exam_content::{
    self, ContentError, ListeningPartUpdate, ReadingPartUpdate, WritingPartInput,
};

pub(super) async fn get_access(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ExamAccessResponse>, ApiError> {
    let exam = find_exam(&state, &exam_id).await?;
    let access_types = repositories::exams::list_access_types(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam access types"))?;

    Ok(Json(ExamAccessResponse {
        message: None,
        exam_id: exam.id,
        title: exam.title,
        access_types,
    }))
}

pub(super) async fn update_access(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ExamAccessUpdate>,
) -> Result<Json<ExamAccessResponse>, ApiError> {
    let access_types = parse_access_types(&payload.access_types)?;
    let exam = find_exam(&state, &exam_id).await?;

    let tags = access_types.iter().map(|access_type| access_type.as_str()).collect::<Vec<_>>();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    repositories::exams::replace_access_types(&mut tx, &exam.id, &tags)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update exam access types"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(exam_id = %exam.id, admin_id = %admin.id, access_types = ?tags, "Exam access updated");

    Ok(Json(ExamAccessResponse {
        message: Some("Exam access types updated successfully".to_string()),
        exam_id: exam.id,
        title: exam.title,
        access_types: tags.into_iter().map(str::to_string).collect(),
    }))
}

pub(super) async fn update_status(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<ExamStatusQuery>,
) -> Result<Json<ExamStatusResponse>, ApiError> {
    let exam = find_exam(&state, &exam_id).await?;
    repositories::exams::set_active(state.db(), &exam.id, params.active, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update exam status"))?;

    let verb = if params.active { "activated" } else { "deactivated" };
    tracing::info!(exam_id = %exam.id, admin_id = %admin.id, is_active = params.active, "Exam {verb}");

    Ok(Json(ExamStatusResponse {
        message: format!("Exam {verb} successfully"),
        exam_id: exam.id,
        title: exam.title,
        is_active: params.active,
    }))
}

pub(super) async fn initialize_listening_test(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ListeningTestInit>,
) -> Result<(StatusCode, Json<ExamCreatedResponse>), ApiError> {
    let exam = exam_content::initialize_listening(
        state.db(),
        payload.title.trim(),
        payload.duration,
        payload.total_marks,
        &admin.id,
        primitive_now_utc(),
    )
    .await
    .map_err(map_content_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ExamCreatedResponse {
            message: "Listening test initialized successfully".to_string(),
            exam_id: exam.id,
            title: exam.title,
        }),
    ))
}

pub(super) async fn update_listening_part(
    Path((exam_id, part_number)): Path<(String, i32)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ListeningPartPayload>,
) -> Result<Json<ListeningPartResponse>, ApiError> {
    validate_listening_part(part_number)?;
    let exam = find_exam(&state, &exam_id).await?;

    let outcome = exam_content::update_listening_part(
        state.db(),
        ListeningPartUpdate {
            exam_id: &exam.id,
            part_number,
            audio_filename: payload.audio_filename.trim(),
            transcript: payload.transcript.as_deref(),
            questions: &payload.questions,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(map_content_error)?;

    Ok(Json(ListeningPartResponse {
        message: format!("Part {part_number} updated successfully"),
        section_id: outcome.section_id,
        filename: payload.audio_filename.trim().to_string(),
        questions_count: payload.questions.len(),
        questions_found: outcome.contexts_found,
        questions_created: outcome.questions_created,
        exam_active: exam.is_active || outcome.exam_activated,
    }))
}

pub(super) async fn initialize_reading_test(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ReadingTestInit>,
) -> Result<(StatusCode, Json<ExamCreatedResponse>), ApiError> {
    let exam = exam_content::initialize_reading(
        state.db(),
        payload.title.trim(),
        payload.duration,
        payload.total_marks,
        &admin.id,
        primitive_now_utc(),
    )
    .await
    .map_err(map_content_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ExamCreatedResponse {
            message: "Reading test initialized successfully".to_string(),
            exam_id: exam.id,
            title: exam.title,
        }),
    ))
}

pub(super) async fn update_reading_part(
    Path((exam_id, part_number)): Path<(String, i32)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ReadingPartPayload>,
) -> Result<Json<ReadingPartResponse>, ApiError> {
    validate_reading_part(part_number)?;
    let exam = find_exam(&state, &exam_id).await?;

    let outcome = exam_content::update_reading_part(
        state.db(),
        ReadingPartUpdate {
            exam_id: &exam.id,
            part_number,
            passage_title: payload.passage.title.trim(),
            passage_content: &payload.passage.content,
            groups: &payload.question_groups,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(map_content_error)?;

    Ok(Json(ReadingPartResponse {
        message: format!("Reading part {part_number} updated successfully"),
        section_id: outcome.section_id,
        passage_id: outcome.passage_id,
        question_groups: payload.question_groups.len(),
        total_questions: outcome.total_questions,
        total_marks: outcome.total_marks,
        exam_active: exam.is_active || outcome.exam_activated,
    }))
}

pub(super) async fn initialize_writing_test(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<WritingTestInit>,
) -> Result<(StatusCode, Json<ExamCreatedResponse>), ApiError> {
    let exam = exam_content::initialize_writing(
        state.db(),
        payload.title.trim(),
        &admin.id,
        primitive_now_utc(),
    )
    .await
    .map_err(map_content_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ExamCreatedResponse {
            message: "Writing test initialized successfully".to_string(),
            exam_id: exam.id,
            title: exam.title,
        }),
    ))
}

pub(super) async fn add_writing_part(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<WritingTaskCreate>,
) -> Result<Json<WritingTaskResponse>, ApiError> {
    let outcome = exam_content::add_writing_part(
        state.db(),
        &exam_id,
        WritingPartInput {
            part_number: payload.part_number,
            task_type: payload.task_type.trim(),
            instructions: &payload.instructions,
            word_limit: payload.word_limit,
            total_marks: payload.total_marks,
            duration: payload.duration,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(map_content_error)?;

    Ok(Json(WritingTaskResponse {
        message: format!("Writing task part {} added successfully", payload.part_number),
        exam_id,
        task_id: outcome.task.id,
        part_number: outcome.task.part_number,
        is_complete: outcome.totals.is_some(),
    }))
}

pub(super) async fn list_speaking_topics(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<SpeakingTopicEntry>>, ApiError> {
    let topics = repositories::speaking::list_topics(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch speaking topics"))?;

    Ok(Json(
        topics
            .into_iter()
            .map(|topic| SpeakingTopicEntry {
                topic_id: topic.id,
                title: topic.title,
                description: topic.description,
            })
            .collect(),
    ))
}

pub(super) async fn create_speaking_topic(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SpeakingTopicCreate>,
) -> Result<(StatusCode, Json<SpeakingTopicCreated>), ApiError> {
    let description = payload.description.as_deref().map(str::trim).filter(|d| !d.is_empty());
    let topic = repositories::speaking::create_topic(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.title.trim(),
        description,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create speaking topic"))?;

    tracing::info!(topic_id = %topic.id, admin_id = %admin.id, "Speaking topic created");

    Ok((
        StatusCode::CREATED,
        Json(SpeakingTopicCreated {
            message: "Speaking topic created successfully".to_string(),
            topic_id: topic.id,
            title: topic.title,
            description: topic.description,
        }),
    ))
}

pub(super) async fn add_speaking_question(
    Path(topic_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SpeakingQuestionCreate>,
) -> Result<(StatusCode, Json<SpeakingQuestionCreated>), ApiError> {
    validate_speaking_part_type(&payload.part_type)?;
    let topic = repositories::speaking::find_topic(state.db(), &topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch speaking topic"))?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    let question = repositories::speaking::create_question(
        state.db(),
        repositories::speaking::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            topic_id: &topic.id,
            question_text: payload.question_text.trim(),
            sample_answer: payload.sample_answer.as_deref(),
            order_number: payload.order_number,
            part_type: &payload.part_type,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to add speaking question"))?;

    Ok((
        StatusCode::CREATED,
        Json(SpeakingQuestionCreated {
            message: "Question added successfully".to_string(),
            question_id: question.id,
            topic_id: topic.id,
            part_type: question.part_type,
        }),
    ))
}

async fn find_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

fn map_content_error(err: ContentError) -> ApiError {
    match err {
        ContentError::DuplicateTitle(_)
        | ContentError::QuestionCount { .. }
        | ContentError::QuestionOutOfRange { .. } => ApiError::BadRequest(err.to_string()),
        ContentError::ExamNotFound | ContentError::SectionNotFound => {
            ApiError::NotFound(err.to_string())
        }
        ContentError::Database(e) => ApiError::internal(e, "Failed to update exam content"),
    }
}
