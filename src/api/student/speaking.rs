use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::ValidJson;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::speaking::{
    MySpeakingAnswer, SpeakingAnswerResponse, SpeakingAnswerSubmit, TopicDetail, TopicQuestion,
    TopicQuestionSummary, TopicSummary,
};

pub(in crate::api::student) async fn list_topics(
    CurrentStudent(_student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<TopicSummary>>, ApiError> {
    let topics = repositories::speaking::list_topics(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch speaking topics"))?;
    let questions = repositories::speaking::list_questions(state.db(), None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch speaking questions"))?;

    let mut by_topic: HashMap<String, Vec<TopicQuestionSummary>> = HashMap::new();
    for question in questions {
        by_topic.entry(question.topic_id).or_default().push(TopicQuestionSummary {
            question_id: question.id,
            question_text: question.question_text,
            order_number: question.order_number,
        });
    }

    let topics = topics
        .into_iter()
        .map(|topic| TopicSummary {
            speaking_questions: by_topic.remove(&topic.id).unwrap_or_default(),
            topic_id: topic.id,
            title: topic.title,
            description: topic.description,
            created_at: format_primitive(topic.created_at),
        })
        .collect();

    Ok(Json(topics))
}

pub(in crate::api::student) async fn topic_detail(
    Path(topic_id): Path<String>,
    CurrentStudent(_student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<TopicDetail>, ApiError> {
    let topic = repositories::speaking::find_topic(state.db(), &topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch speaking topic"))?
        .ok_or_else(|| ApiError::NotFound("Speaking topic not found".to_string()))?;

    let questions = repositories::speaking::list_questions(state.db(), Some(&topic.id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch speaking questions"))?;

    Ok(Json(TopicDetail {
        topic_id: topic.id,
        title: topic.title,
        description: topic.description.unwrap_or_default(),
        questions: questions.into_iter().map(TopicQuestion::from).collect(),
    }))
}

pub(in crate::api::student) async fn submit_answer(
    Path(question_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SpeakingAnswerSubmit>,
) -> Result<Json<SpeakingAnswerResponse>, ApiError> {
    let exists = repositories::speaking::question_exists(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch speaking question"))?;
    if !exists {
        return Err(ApiError::NotFound("Speaking question not found".to_string()));
    }

    let answer = repositories::speaking::upsert_answer(
        state.db(),
        &Uuid::new_v4().to_string(),
        &question_id,
        &student.id,
        &payload.answer_text,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save speaking answer"))?;

    Ok(Json(SpeakingAnswerResponse {
        message: "Speaking answer submitted successfully".to_string(),
        answer_id: answer.id,
        question_id: answer.question_id,
        user_id: answer.user_id,
        answer_text: answer.answer_text,
    }))
}

pub(in crate::api::student) async fn my_answers(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<MySpeakingAnswer>>, ApiError> {
    let rows = repositories::speaking::list_answers_by_user(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch speaking answers"))?;

    Ok(Json(rows.into_iter().map(MySpeakingAnswer::from).collect()))
}
