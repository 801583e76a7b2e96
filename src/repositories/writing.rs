use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{WritingAnswer, WritingTask};
use crate::db::types::SectionType;

const TASK_COLUMNS: &str =
    "id, exam_id, part_number, task_type, instructions, word_limit, total_marks, duration";

const ANSWER_COLUMNS: &str = "\
    id, task_id, user_id, answer_text, score, task_achievement_score, \
    coherence_cohesion_score, lexical_resource_score, grammatical_range_score, \
    mistakes, improvement_suggestions, rewritten_essay, is_ai_evaluated, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct WritingTaskRow {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) part_number: i32,
    pub(crate) task_type: String,
    pub(crate) instructions: String,
    pub(crate) word_limit: i32,
    pub(crate) total_marks: f64,
    pub(crate) duration: i32,
}

/// Tasks of active exams that carry an essay section.
pub(crate) async fn list_active_tasks(pool: &PgPool) -> Result<Vec<WritingTaskRow>, sqlx::Error> {
    sqlx::query_as::<_, WritingTaskRow>(
        "SELECT t.id, t.exam_id, e.title AS exam_title, t.part_number, t.task_type,
                t.instructions, t.word_limit, t.total_marks, t.duration
         FROM writing_tasks t
         JOIN exams e ON e.id = t.exam_id
         WHERE e.is_active = TRUE
           AND EXISTS (
               SELECT 1 FROM exam_sections s WHERE s.exam_id = e.id AND s.section_type = $1
           )
         ORDER BY e.created_at DESC, e.id, t.part_number",
    )
    .bind(SectionType::Essay)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_tasks_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<WritingTask>, sqlx::Error> {
    sqlx::query_as::<_, WritingTask>(&format!(
        "SELECT {TASK_COLUMNS} FROM writing_tasks WHERE exam_id = $1 ORDER BY part_number"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn find_task(pool: &PgPool, id: &str) -> Result<Option<WritingTask>, sqlx::Error> {
    sqlx::query_as::<_, WritingTask>(&format!("SELECT {TASK_COLUMNS} FROM writing_tasks WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct UpsertTask<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) part_number: i32,
    pub(crate) task_type: &'a str,
    pub(crate) instructions: &'a str,
    pub(crate) word_limit: i32,
    pub(crate) total_marks: f64,
    pub(crate) duration: i32,
}

/// Replaces the task occupying the same part number, keeping its id.
pub(crate) async fn upsert_task(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertTask<'_>,
) -> Result<WritingTask, sqlx::Error> {
    sqlx::query_as::<_, WritingTask>(&format!(
        "INSERT INTO writing_tasks ({TASK_COLUMNS}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         ON CONFLICT (exam_id, part_number) DO UPDATE SET
            task_type = EXCLUDED.task_type,
            instructions = EXCLUDED.instructions,
            word_limit = EXCLUDED.word_limit,
            total_marks = EXCLUDED.total_marks,
            duration = EXCLUDED.duration
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.part_number)
    .bind(params.task_type)
    .bind(params.instructions)
    .bind(params.word_limit)
    .bind(params.total_marks)
    .bind(params.duration)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_answer(
    pool: &PgPool,
    task_id: &str,
    user_id: &str,
) -> Result<Option<WritingAnswer>, sqlx::Error> {
    sqlx::query_as::<_, WritingAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM writing_answers WHERE task_id = $1 AND user_id = $2"
    ))
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_answer_for_user(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<Option<WritingAnswer>, sqlx::Error> {
    sqlx::query_as::<_, WritingAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM writing_answers WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_answers_by_exam(
    pool: &PgPool,
    exam_id: &str,
    user_id: &str,
) -> Result<Vec<WritingAnswer>, sqlx::Error> {
    sqlx::query_as::<_, WritingAnswer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM writing_answers
         WHERE user_id = $2 AND task_id IN (SELECT id FROM writing_tasks WHERE exam_id = $1)"
    ))
    .bind(exam_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_answered_task_ids(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT task_id FROM writing_answers WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Insert or overwrite the caller's essay. A changed text discards the previous
/// AI evaluation.
pub(crate) async fn upsert_answer(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    task_id: &str,
    user_id: &str,
    answer_text: &str,
    now: PrimitiveDateTime,
) -> Result<WritingAnswer, sqlx::Error> {
    sqlx::query_as::<_, WritingAnswer>(&format!(
        "INSERT INTO writing_answers (id, task_id, user_id, answer_text, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         ON CONFLICT (task_id, user_id) DO UPDATE SET
            answer_text = EXCLUDED.answer_text,
            updated_at = EXCLUDED.updated_at,
            is_ai_evaluated = writing_answers.is_ai_evaluated
                AND writing_answers.answer_text = EXCLUDED.answer_text,
            score = CASE WHEN writing_answers.answer_text = EXCLUDED.answer_text
                         THEN writing_answers.score ELSE 0 END
         RETURNING {ANSWER_COLUMNS}"
    ))
    .bind(id)
    .bind(task_id)
    .bind(user_id)
    .bind(answer_text)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete_answers_by_exam(
    pool: &PgPool,
    exam_id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM writing_answers
         WHERE user_id = $2 AND task_id IN (SELECT id FROM writing_tasks WHERE exam_id = $1)",
    )
    .bind(exam_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) struct SaveEvaluation<'a> {
    pub(crate) band_score: f64,
    pub(crate) task_achievement: f64,
    pub(crate) coherence_cohesion: f64,
    pub(crate) lexical_resource: f64,
    pub(crate) grammatical_range: f64,
    pub(crate) mistakes: serde_json::Value,
    pub(crate) improvement_suggestions: serde_json::Value,
    pub(crate) rewritten_essay: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn save_evaluation(
    pool: &PgPool,
    answer_id: &str,
    params: SaveEvaluation<'_>,
) -> Result<WritingAnswer, sqlx::Error> {
    sqlx::query_as::<_, WritingAnswer>(&format!(
        "UPDATE writing_answers SET
            score = $1,
            task_achievement_score = $2,
            coherence_cohesion_score = $3,
            lexical_resource_score = $4,
            grammatical_range_score = $5,
            mistakes = $6,
            improvement_suggestions = $7,
            rewritten_essay = $8,
            is_ai_evaluated = TRUE,
            updated_at = $9
         WHERE id = $10
         RETURNING {ANSWER_COLUMNS}"
    ))
    .bind(params.band_score)
    .bind(params.task_achievement)
    .bind(params.coherence_cohesion)
    .bind(params.lexical_resource)
    .bind(params.grammatical_range)
    .bind(Json(params.mistakes))
    .bind(Json(params.improvement_suggestions))
    .bind(params.rewritten_essay)
    .bind(params.now)
    .bind(answer_id)
    .fetch_one(pool)
    .await
}
