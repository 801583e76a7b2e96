use std::collections::HashMap;

use thiserror::Error;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::metrics;
use crate::db::models::{ExamResult, ExamSection};
use crate::db::types::SectionType;
use crate::repositories;
use crate::services::scoring::{self, ScoreCard};

#[derive(Debug, Error)]
pub(crate) enum SubmissionError {
    #[error("exam not found or not active")]
    ExamNotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("failed to encode section scores: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Where per-question answers of one submission are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AnswerSink {
    /// Keyed by exam and user; survives until the user retakes the exam.
    Listening { exam_id: String, user_id: String },
    /// Keyed by the attempt's result row.
    Result { result_id: String },
}

impl AnswerSink {
    pub(crate) fn select(
        sections: &[ExamSection],
        exam_id: &str,
        user_id: &str,
        result_id: &str,
    ) -> Self {
        if sections.iter().any(|section| section.section_type == SectionType::Listening) {
            Self::Listening { exam_id: exam_id.to_string(), user_id: user_id.to_string() }
        } else {
            Self::Result { result_id: result_id.to_string() }
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Listening { .. } => "listening",
            Self::Result { .. } => "result",
        }
    }

    async fn write(
        &self,
        conn: &mut sqlx::PgConnection,
        card: &ScoreCard,
        now: PrimitiveDateTime,
    ) -> Result<(), sqlx::Error> {
        for answer in &card.answers {
            let id = Uuid::new_v4().to_string();
            match self {
                Self::Listening { exam_id, user_id } => {
                    repositories::answers::insert_listening_answer(
                        &mut *conn,
                        repositories::answers::CreateListeningAnswer {
                            id: &id,
                            exam_id,
                            user_id,
                            question_id: &answer.question_id,
                            student_answer: &answer.student_answer,
                            score: answer.score,
                            created_at: now,
                        },
                    )
                    .await?;
                }
                Self::Result { result_id } => {
                    repositories::answers::insert_student_answer(
                        &mut *conn,
                        &id,
                        result_id,
                        &answer.question_id,
                        &answer.student_answer,
                        answer.score,
                    )
                    .await?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct SubmissionOutcome {
    pub(crate) result: ExamResult,
    pub(crate) card: ScoreCard,
}

/// Scores `answers` against the exam and records one result plus one answer row per
/// scored question, all in a single transaction.
pub(crate) async fn submit(
    pool: &sqlx::PgPool,
    exam_id: &str,
    user_id: &str,
    answers: &HashMap<String, String>,
    now: PrimitiveDateTime,
) -> Result<SubmissionOutcome, SubmissionError> {
    let mut tx = pool.begin().await?;

    repositories::exams::find_active_by_id(&mut *tx, exam_id)
        .await?
        .ok_or(SubmissionError::ExamNotFound)?;

    let sections = repositories::sections::list_by_exam(&mut *tx, exam_id).await?;
    let questions = repositories::content::list_questions_by_exam(&mut *tx, exam_id).await?;

    let card = scoring::score_submission(&questions, answers);
    let result_id = Uuid::new_v4().to_string();
    let sink = AnswerSink::select(&sections, exam_id, user_id, &result_id);

    let result = repositories::results::create(
        &mut *tx,
        repositories::results::CreateResult {
            id: &result_id,
            user_id,
            exam_id,
            total_score: card.total_score,
            section_scores: serde_json::to_value(&card.section_scores)?,
            completion_date: now,
        },
    )
    .await?;

    sink.write(&mut *tx, &card, now).await?;
    tx.commit().await?;

    metrics::record_exam_submission(sink.label(), card.answers.len());
    tracing::info!(
        exam_id,
        user_id,
        result_id = %result.id,
        sink = sink.label(),
        submitted = answers.len(),
        scored = card.answers.len(),
        total_score = card.total_score,
        "Exam submission recorded"
    );

    Ok(SubmissionOutcome { result, card })
}
