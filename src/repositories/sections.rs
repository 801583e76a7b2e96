use crate::db::models::ExamSection;
use crate::db::types::SectionType;

const COLUMNS: &str = "id, exam_id, section_type, duration, total_marks, order_number";

pub(crate) async fn list_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<ExamSection>, sqlx::Error> {
    sqlx::query_as::<_, ExamSection>(&format!(
        "SELECT {COLUMNS} FROM exam_sections WHERE exam_id = $1 ORDER BY order_number, id"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

/// Type of the section with the lowest order number.
pub(crate) async fn primary_section_type(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Option<SectionType>, sqlx::Error> {
    sqlx::query_scalar::<_, SectionType>(
        "SELECT section_type FROM exam_sections WHERE exam_id = $1 \
         ORDER BY order_number, id LIMIT 1",
    )
    .bind(exam_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_exam_and_order(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    order_number: i32,
) -> Result<Option<ExamSection>, sqlx::Error> {
    sqlx::query_as::<_, ExamSection>(&format!(
        "SELECT {COLUMNS} FROM exam_sections WHERE exam_id = $1 AND order_number = $2"
    ))
    .bind(exam_id)
    .bind(order_number)
    .fetch_optional(executor)
    .await
}

pub(crate) struct CreateSection<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) section_type: SectionType,
    pub(crate) duration: i32,
    pub(crate) total_marks: f64,
    pub(crate) order_number: i32,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateSection<'_>,
) -> Result<ExamSection, sqlx::Error> {
    sqlx::query_as::<_, ExamSection>(&format!(
        "INSERT INTO exam_sections (id, exam_id, section_type, duration, total_marks, order_number)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.section_type)
    .bind(params.duration)
    .bind(params.total_marks)
    .bind(params.order_number)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update_totals(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    duration: i32,
    total_marks: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE exam_sections SET duration = $1, total_marks = $2 WHERE id = $3")
        .bind(duration)
        .bind(total_marks)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
