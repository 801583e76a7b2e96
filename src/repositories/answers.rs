use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::StoredAnswer;

pub(crate) async fn insert_student_answer(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    result_id: &str,
    question_id: &str,
    student_answer: &str,
    score: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO student_answers (id, result_id, question_id, student_answer, score)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(id)
    .bind(result_id)
    .bind(question_id)
    .bind(student_answer)
    .bind(score)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) struct CreateListeningAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) student_answer: &'a str,
    pub(crate) score: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn insert_listening_answer(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateListeningAnswer<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO listening_answers (
            id, exam_id, user_id, question_id, student_answer, score, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.user_id)
    .bind(params.question_id)
    .bind(params.student_answer)
    .bind(params.score)
    .bind(params.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_result(
    pool: &PgPool,
    result_id: &str,
) -> Result<Vec<StoredAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StoredAnswer>(
        "SELECT question_id, student_answer, score FROM student_answers
         WHERE result_id = $1 ORDER BY id",
    )
    .bind(result_id)
    .fetch_all(pool)
    .await
}

/// Listening answers accumulate across attempts until a retake; newest first.
pub(crate) async fn list_listening(
    pool: &PgPool,
    exam_id: &str,
    user_id: &str,
) -> Result<Vec<StoredAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StoredAnswer>(
        "SELECT question_id, student_answer, score FROM listening_answers
         WHERE exam_id = $1 AND user_id = $2
         ORDER BY created_at DESC, id",
    )
    .bind(exam_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn listening_exists(
    pool: &PgPool,
    exam_id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM listening_answers WHERE exam_id = $1 AND user_id = $2)",
    )
    .bind(exam_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_listening(
    pool: &PgPool,
    exam_id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM listening_answers WHERE exam_id = $1 AND user_id = $2")
        .bind(exam_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
