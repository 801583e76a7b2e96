use sqlx::types::Json;
use time::PrimitiveDateTime;

use crate::db::models::{ListeningMedia, Question, QuestionOption, ReadingPassage};

const QUESTION_COLUMNS: &str = "\
    q.id, q.section_id, q.question_type, q.question_text, q.correct_answer, q.marks, \
    q.additional_data, q.order_index, q.created_at";

const OPTION_COLUMNS: &str = "id, question_id, option_text, is_correct, order_index";

const PASSAGE_COLUMNS: &str = "id, section_id, title, content, word_count";

const MEDIA_COLUMNS: &str = "id, section_id, audio_filename, transcript, duration";

/// Every question of the exam, ordered by section then position.
pub(crate) async fn list_questions_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS}
         FROM questions q
         JOIN exam_sections s ON s.id = q.section_id
         WHERE s.exam_id = $1
         ORDER BY s.order_number, q.order_index, q.created_at"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_options_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(
        "SELECT o.id, o.question_id, o.option_text, o.is_correct, o.order_index
         FROM question_options o
         JOIN questions q ON q.id = o.question_id
         JOIN exam_sections s ON s.id = q.section_id
         WHERE s.exam_id = $1
         ORDER BY o.question_id, o.order_index",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_passages_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<ReadingPassage>, sqlx::Error> {
    sqlx::query_as::<_, ReadingPassage>(&format!(
        "SELECT {PASSAGE_COLUMNS} FROM reading_passages
         WHERE section_id IN (SELECT id FROM exam_sections WHERE exam_id = $1)
         ORDER BY title"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_media_by_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<ListeningMedia>, sqlx::Error> {
    sqlx::query_as::<_, ListeningMedia>(&format!(
        "SELECT {MEDIA_COLUMNS} FROM listening_media
         WHERE section_id IN (SELECT id FROM exam_sections WHERE exam_id = $1)"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn count_sections_with_media(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(DISTINCT m.section_id)
         FROM listening_media m
         JOIN exam_sections s ON s.id = m.section_id
         WHERE s.exam_id = $1",
    )
    .bind(exam_id)
    .fetch_one(executor)
    .await
}

/// Per reading section: order, whether a passage exists, and its question count.
pub(crate) async fn reading_part_states(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<(i32, bool, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (i32, bool, i64)>(
        "SELECT s.order_number,
                EXISTS (SELECT 1 FROM reading_passages p WHERE p.section_id = s.id),
                (SELECT COUNT(*) FROM questions q WHERE q.section_id = s.id)
         FROM exam_sections s
         WHERE s.exam_id = $1 AND s.section_type = 'reading'
         ORDER BY s.order_number",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

/// Removes the section's media, passages and questions (options cascade).
pub(crate) async fn clear_section(
    executor: &mut sqlx::PgConnection,
    section_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM listening_media WHERE section_id = $1")
        .bind(section_id)
        .execute(&mut *executor)
        .await?;
    sqlx::query("DELETE FROM reading_passages WHERE section_id = $1")
        .bind(section_id)
        .execute(&mut *executor)
        .await?;
    sqlx::query("DELETE FROM questions WHERE section_id = $1")
        .bind(section_id)
        .execute(&mut *executor)
        .await?;
    Ok(())
}

pub(crate) struct CreateMedia<'a> {
    pub(crate) id: &'a str,
    pub(crate) section_id: &'a str,
    pub(crate) audio_filename: &'a str,
    pub(crate) transcript: Option<&'a str>,
    pub(crate) duration: i32,
}

pub(crate) async fn create_media(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateMedia<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO listening_media (id, section_id, audio_filename, transcript, duration)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(params.id)
    .bind(params.section_id)
    .bind(params.audio_filename)
    .bind(params.transcript)
    .bind(params.duration)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) struct CreatePassage<'a> {
    pub(crate) id: &'a str,
    pub(crate) section_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) content: &'a str,
    pub(crate) word_count: i32,
}

pub(crate) async fn create_passage(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreatePassage<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO reading_passages ({PASSAGE_COLUMNS}) VALUES ($1,$2,$3,$4,$5)"
    ))
    .bind(params.id)
    .bind(params.section_id)
    .bind(params.title)
    .bind(params.content)
    .bind(params.word_count)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) section_id: &'a str,
    pub(crate) question_type: &'a str,
    pub(crate) question_text: &'a str,
    pub(crate) correct_answer: Option<&'a str>,
    pub(crate) marks: i32,
    pub(crate) additional_data: serde_json::Value,
    pub(crate) order_index: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create_question(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO questions (
            id, section_id, question_type, question_text, correct_answer, marks,
            additional_data, order_index, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
    )
    .bind(params.id)
    .bind(params.section_id)
    .bind(params.question_type)
    .bind(params.question_text)
    .bind(params.correct_answer)
    .bind(params.marks)
    .bind(Json(params.additional_data))
    .bind(params.order_index)
    .bind(params.now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn create_option(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    question_id: &str,
    option_text: &str,
    is_correct: bool,
    order_index: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO question_options ({OPTION_COLUMNS}) VALUES ($1,$2,$3,$4,$5)"
    ))
    .bind(id)
    .bind(question_id)
    .bind(option_text)
    .bind(is_correct)
    .bind(order_index)
    .execute(executor)
    .await?;
    Ok(())
}
