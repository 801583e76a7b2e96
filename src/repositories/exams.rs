use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Exam;
use crate::db::types::SectionType;

pub(crate) const COLUMNS: &str =
    "id, title, description, is_active, created_by, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamSummaryRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) total_duration: i64,
    pub(crate) total_marks: f64,
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_active_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE id = $1 AND is_active = TRUE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn title_exists(pool: &PgPool, title: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM exams WHERE title = $1)")
        .bind(title)
        .fetch_one(pool)
        .await
}

/// Active exams with at least one section of `section_type` (any section when `None`).
/// Duration and marks are summed over the matching sections only.
pub(crate) async fn list_active_summaries(
    pool: &PgPool,
    section_type: Option<SectionType>,
) -> Result<Vec<ExamSummaryRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT e.id, e.title, e.description, \
         COALESCE(SUM(s.duration), 0)::BIGINT AS total_duration, \
         COALESCE(SUM(s.total_marks), 0)::DOUBLE PRECISION AS total_marks \
         FROM exams e JOIN exam_sections s ON s.exam_id = e.id \
         WHERE e.is_active = TRUE",
    );

    if let Some(section_type) = section_type {
        builder.push(" AND s.section_type = ");
        builder.push_bind(section_type);
    }

    builder.push(" GROUP BY e.id, e.title, e.description, e.created_at ORDER BY e.created_at DESC");
    builder.build_query_as::<ExamSummaryRow>().fetch_all(pool).await
}

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) is_active: bool,
    pub(crate) created_by: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExam<'_>,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (id, title, description, is_active, created_by, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.is_active)
    .bind(params.created_by)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn set_active(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    is_active: bool,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE exams SET is_active = $1, updated_at = $2 WHERE id = $3")
        .bind(is_active)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Raw tag values; callers decide how to treat unknown ones.
pub(crate) async fn list_access_types(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT access_type FROM exam_access_types WHERE exam_id = $1 ORDER BY access_type",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn replace_access_types(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    exam_id: &str,
    access_types: &[&str],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM exam_access_types WHERE exam_id = $1")
        .bind(exam_id)
        .execute(&mut **tx)
        .await?;

    for access_type in access_types {
        sqlx::query("INSERT INTO exam_access_types (id, exam_id, access_type) VALUES ($1,$2,$3)")
            .bind(Uuid::new_v4().to_string())
            .bind(exam_id)
            .bind(*access_type)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}
