use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{SpeakingAnswer, SpeakingQuestion, SpeakingTopic};

const TOPIC_COLUMNS: &str = "id, title, description, created_at";
const QUESTION_COLUMNS: &str = "id, topic_id, question_text, sample_answer, order_number, part_type";
const ANSWER_COLUMNS: &str = "id, question_id, user_id, answer_text, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MyAnswerRow {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) topic_id: String,
    pub(crate) topic_title: String,
    pub(crate) answer_text: String,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn list_topics(pool: &PgPool) -> Result<Vec<SpeakingTopic>, sqlx::Error> {
    sqlx::query_as::<_, SpeakingTopic>(&format!(
        "SELECT {TOPIC_COLUMNS} FROM speaking_topics ORDER BY created_at DESC, id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_topic(pool: &PgPool, id: &str) -> Result<Option<SpeakingTopic>, sqlx::Error> {
    sqlx::query_as::<_, SpeakingTopic>(&format!(
        "SELECT {TOPIC_COLUMNS} FROM speaking_topics WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Questions of every topic when `topic_id` is `None`.
pub(crate) async fn list_questions(
    pool: &PgPool,
    topic_id: Option<&str>,
) -> Result<Vec<SpeakingQuestion>, sqlx::Error> {
    sqlx::query_as::<_, SpeakingQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM speaking_questions
         WHERE ($1::VARCHAR IS NULL OR topic_id = $1)
         ORDER BY topic_id, order_number, id"
    ))
    .bind(topic_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn create_topic(
    pool: &PgPool,
    id: &str,
    title: &str,
    description: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<SpeakingTopic, sqlx::Error> {
    sqlx::query_as::<_, SpeakingTopic>(&format!(
        "INSERT INTO speaking_topics ({TOPIC_COLUMNS}) VALUES ($1,$2,$3,$4)
         RETURNING {TOPIC_COLUMNS}"
    ))
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) topic_id: &'a str,
    pub(crate) question_text: &'a str,
    pub(crate) sample_answer: Option<&'a str>,
    pub(crate) order_number: i32,
    pub(crate) part_type: &'a str,
}

pub(crate) async fn create_question(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<SpeakingQuestion, sqlx::Error> {
    sqlx::query_as::<_, SpeakingQuestion>(&format!(
        "INSERT INTO speaking_questions ({QUESTION_COLUMNS}) VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {QUESTION_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.topic_id)
    .bind(params.question_text)
    .bind(params.sample_answer)
    .bind(params.order_number)
    .bind(params.part_type)
    .fetch_one(pool)
    .await
}

pub(crate) async fn question_exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM speaking_questions WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn upsert_answer(
    pool: &PgPool,
    id: &str,
    question_id: &str,
    user_id: &str,
    answer_text: &str,
    now: PrimitiveDateTime,
) -> Result<SpeakingAnswer, sqlx::Error> {
    sqlx::query_as::<_, SpeakingAnswer>(&format!(
        "INSERT INTO speaking_answers ({ANSWER_COLUMNS}) VALUES ($1,$2,$3,$4,$5,$5)
         ON CONFLICT (question_id, user_id) DO UPDATE SET
            answer_text = EXCLUDED.answer_text,
            updated_at = EXCLUDED.updated_at
         RETURNING {ANSWER_COLUMNS}"
    ))
    .bind(id)
    .bind(question_id)
    .bind(user_id)
    .bind(answer_text)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_answers_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<MyAnswerRow>, sqlx::Error> {
    sqlx::query_as::<_, MyAnswerRow>(
        "SELECT a.id, a.question_id, q.question_text, t.id AS topic_id, t.title AS topic_title,
                a.answer_text, a.updated_at
         FROM speaking_answers a
         JOIN speaking_questions q ON q.id = a.question_id
         JOIN speaking_topics t ON t.id = q.topic_id
         WHERE a.user_id = $1
         ORDER BY a.updated_at DESC, a.id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
