use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ExamResult;

const COLUMNS: &str = "id, user_id, exam_id, total_score, section_scores, completion_date";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HistoryRow {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) total_score: i32,
    pub(crate) completion_date: PrimitiveDateTime,
}

pub(crate) struct CreateResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) total_score: i32,
    pub(crate) section_scores: serde_json::Value,
    pub(crate) completion_date: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResult<'_>,
) -> Result<ExamResult, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "INSERT INTO exam_results ({COLUMNS}) VALUES ($1,$2,$3,$4,$5,$6) RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.exam_id)
    .bind(params.total_score)
    .bind(Json(params.section_scores))
    .bind(params.completion_date)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<Option<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {COLUMNS} FROM exam_results WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_history(
    pool: &PgPool,
    user_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<HistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, HistoryRow>(
        "SELECT r.id, r.exam_id, e.title AS exam_title, r.total_score, r.completion_date
         FROM exam_results r
         JOIN exams e ON e.id = r.exam_id
         WHERE r.user_id = $1
         ORDER BY r.completion_date DESC, r.id
         OFFSET $2 LIMIT $3",
    )
    .bind(user_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}
