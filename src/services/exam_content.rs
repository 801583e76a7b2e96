//! Admin-side authoring of listening, reading and writing tests.

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{Exam, WritingTask};
use crate::db::types::SectionType;
use crate::repositories;
use crate::services::exam_activation::{self, ReadingPartState, SectionPlan, WritingTotals};
use crate::services::text;
use crate::services::transcript::{self, QuestionContext};

const MAIN_TEXT_QUESTION_TYPE: &str = "main_text";
const WRITING_DEFAULT_DURATION: i32 = 60;
const WRITING_DEFAULT_MARKS: f64 = 40.0;

#[derive(Debug, Error)]
pub(crate) enum ContentError {
    #[error("An exam with the title '{0}' already exists")]
    DuplicateTitle(String),
    #[error("Exam not found")]
    ExamNotFound,
    #[error("Section not found")]
    SectionNotFound,
    #[error("Part {part} must have exactly {expected} questions, but got {actual}")]
    QuestionCount { part: i32, expected: usize, actual: usize },
    #[error(
        "Question number {number} is out of range for part {part}. Must be between {start} and {end}."
    )]
    QuestionOutOfRange { number: i32, part: i32, start: i32, end: i32 },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OptionInput {
    pub(crate) option_text: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListeningQuestionInput {
    pub(crate) question_type: String,
    #[serde(default)]
    pub(crate) correct_answer: Option<String>,
    #[serde(default)]
    pub(crate) marks: i32,
    #[serde(default)]
    pub(crate) options: Vec<OptionInput>,
}

pub(crate) struct ListeningPartUpdate<'a> {
    pub(crate) exam_id: &'a str,
    pub(crate) part_number: i32,
    pub(crate) audio_filename: &'a str,
    pub(crate) transcript: Option<&'a str>,
    pub(crate) questions: &'a [ListeningQuestionInput],
}

#[derive(Debug)]
pub(crate) struct ListeningPartOutcome {
    pub(crate) section_id: String,
    pub(crate) questions_created: usize,
    pub(crate) contexts_found: usize,
    pub(crate) exam_activated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReadingQuestionInput {
    pub(crate) question_text: String,
    pub(crate) question_type: String,
    pub(crate) correct_answer: String,
    pub(crate) marks: i32,
    pub(crate) question_number: i32,
    #[serde(default)]
    pub(crate) options: Vec<OptionInput>,
}

/// Questions sharing one instruction, e.g. "Questions 1-6: TRUE / FALSE / NOT GIVEN".
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuestionGroupInput {
    pub(crate) instruction: String,
    pub(crate) question_range: String,
    pub(crate) group_type: String,
    pub(crate) order_number: i32,
    pub(crate) questions: Vec<ReadingQuestionInput>,
}

pub(crate) struct ReadingPartUpdate<'a> {
    pub(crate) exam_id: &'a str,
    pub(crate) part_number: i32,
    pub(crate) passage_title: &'a str,
    pub(crate) passage_content: &'a str,
    pub(crate) groups: &'a [QuestionGroupInput],
}

#[derive(Debug)]
pub(crate) struct ReadingPartOutcome {
    pub(crate) section_id: String,
    pub(crate) passage_id: String,
    pub(crate) total_questions: usize,
    pub(crate) total_marks: i32,
    pub(crate) exam_activated: bool,
}

pub(crate) struct WritingPartInput<'a> {
    pub(crate) part_number: i32,
    pub(crate) task_type: &'a str,
    pub(crate) instructions: &'a str,
    pub(crate) word_limit: i32,
    pub(crate) total_marks: f64,
    pub(crate) duration: i32,
}

#[derive(Debug)]
pub(crate) struct WritingPartOutcome {
    pub(crate) task: WritingTask,
    /// Set once both parts exist; the exam is active from then on.
    pub(crate) totals: Option<WritingTotals>,
}

/// Creates an inactive listening exam with its four empty parts.
pub(crate) async fn initialize_listening(
    pool: &sqlx::PgPool,
    title: &str,
    total_duration: i32,
    total_marks: f64,
    created_by: &str,
    now: PrimitiveDateTime,
) -> Result<Exam, ContentError> {
    let plans = exam_activation::listening_parts(total_duration, total_marks);
    initialize_parts(pool, title, SectionType::Listening, &plans, created_by, now).await
}

/// Creates an inactive reading exam with its three empty parts.
pub(crate) async fn initialize_reading(
    pool: &sqlx::PgPool,
    title: &str,
    total_duration: i32,
    total_marks: f64,
    created_by: &str,
    now: PrimitiveDateTime,
) -> Result<Exam, ContentError> {
    let plans = exam_activation::reading_parts(total_duration, total_marks);
    initialize_parts(pool, title, SectionType::Reading, &plans, created_by, now).await
}

async fn initialize_parts(
    pool: &sqlx::PgPool,
    title: &str,
    section_type: SectionType,
    plans: &[SectionPlan],
    created_by: &str,
    now: PrimitiveDateTime,
) -> Result<Exam, ContentError> {
    if repositories::exams::title_exists(pool, title).await? {
        return Err(ContentError::DuplicateTitle(title.to_string()));
    }

    let mut tx = pool.begin().await?;
    let exam = create_exam(&mut tx, title, created_by, now).await?;
    for plan in plans {
        repositories::sections::create(
            &mut *tx,
            repositories::sections::CreateSection {
                id: &Uuid::new_v4().to_string(),
                exam_id: &exam.id,
                section_type,
                duration: plan.duration,
                total_marks: plan.total_marks,
                order_number: plan.order_number,
            },
        )
        .await?;
    }
    tx.commit().await?;

    tracing::info!(exam_id = %exam.id, created_by, ?section_type, parts = plans.len(), "Test initialized");
    Ok(exam)
}

/// Creates an inactive writing exam with a single essay section.
pub(crate) async fn initialize_writing(
    pool: &sqlx::PgPool,
    title: &str,
    created_by: &str,
    now: PrimitiveDateTime,
) -> Result<Exam, ContentError> {
    let mut tx = pool.begin().await?;
    let exam = create_exam(&mut tx, title, created_by, now).await?;
    repositories::sections::create(
        &mut *tx,
        repositories::sections::CreateSection {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            section_type: SectionType::Essay,
            duration: WRITING_DEFAULT_DURATION,
            total_marks: WRITING_DEFAULT_MARKS,
            order_number: 1,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(exam_id = %exam.id, created_by, "Writing test initialized");
    Ok(exam)
}

async fn create_exam(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    title: &str,
    created_by: &str,
    now: PrimitiveDateTime,
) -> Result<Exam, sqlx::Error> {
    repositories::exams::create(
        &mut **tx,
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title,
            description: None,
            is_active: false,
            created_by: Some(created_by),
            now,
        },
    )
    .await
}

fn normalize_transcript(transcript: Option<&str>) -> Option<String> {
    transcript.map(|text| text.trim().replace("\r\n", "\n")).filter(|text| !text.is_empty())
}

/// Replaces one listening part's media and questions. Questions are bound to the
/// transcript's question anchors in order; the exam activates with its fourth part.
pub(crate) async fn update_listening_part(
    pool: &sqlx::PgPool,
    update: ListeningPartUpdate<'_>,
    now: PrimitiveDateTime,
) -> Result<ListeningPartOutcome, ContentError> {
    let mut tx = pool.begin().await?;

    let section =
        repositories::sections::find_by_exam_and_order(&mut *tx, update.exam_id, update.part_number)
            .await?
            .filter(|section| section.section_type == SectionType::Listening)
            .ok_or(ContentError::SectionNotFound)?;

    repositories::content::clear_section(&mut *tx, &section.id).await?;

    let cleaned = normalize_transcript(update.transcript);
    repositories::content::create_media(
        &mut *tx,
        repositories::content::CreateMedia {
            id: &Uuid::new_v4().to_string(),
            section_id: &section.id,
            audio_filename: update.audio_filename,
            transcript: cleaned.as_deref(),
            duration: section.duration,
        },
    )
    .await?;

    let main_text_id = Uuid::new_v4().to_string();
    repositories::content::create_question(
        &mut *tx,
        repositories::content::CreateQuestion {
            id: &main_text_id,
            section_id: &section.id,
            question_type: MAIN_TEXT_QUESTION_TYPE,
            question_text: cleaned.as_deref().unwrap_or_default(),
            correct_answer: None,
            marks: 0,
            additional_data: json!({ "part_number": update.part_number }),
            order_index: 0,
            now,
        },
    )
    .await?;

    let contexts =
        cleaned.as_deref().map(transcript::parse_question_contexts).unwrap_or_default();

    let mut questions_created = 0usize;
    for (index, (input, context)) in update.questions.iter().zip(&contexts).enumerate() {
        let question_id = Uuid::new_v4().to_string();
        repositories::content::create_question(
            &mut *tx,
            repositories::content::CreateQuestion {
                id: &question_id,
                section_id: &section.id,
                question_type: &input.question_type,
                question_text: &context.context,
                correct_answer: input.correct_answer.as_deref(),
                marks: input.marks.max(0),
                additional_data: question_metadata(context, &main_text_id),
                order_index: index as i32 + 1,
                now,
            },
        )
        .await?;

        create_options(&mut tx, &question_id, &input.options).await?;
        questions_created += 1;
    }

    let parts_with_media =
        repositories::content::count_sections_with_media(&mut *tx, update.exam_id).await?;
    let exam_activated = exam_activation::listening_ready(parts_with_media);
    if exam_activated {
        repositories::exams::set_active(&mut *tx, update.exam_id, true, now).await?;
    }

    tx.commit().await?;

    tracing::info!(
        exam_id = update.exam_id,
        section_id = %section.id,
        part_number = update.part_number,
        submitted = update.questions.len(),
        contexts = contexts.len(),
        questions_created,
        exam_activated,
        "Listening part updated"
    );

    Ok(ListeningPartOutcome {
        section_id: section.id,
        questions_created,
        contexts_found: contexts.len(),
        exam_activated,
    })
}

async fn create_options(
    conn: &mut sqlx::PgConnection,
    question_id: &str,
    options: &[OptionInput],
) -> Result<(), sqlx::Error> {
    for (option_index, option) in options.iter().enumerate() {
        repositories::content::create_option(
            &mut *conn,
            &Uuid::new_v4().to_string(),
            question_id,
            option.option_text.trim(),
            option.is_correct,
            option_index as i32,
        )
        .await?;
    }
    Ok(())
}

/// Total question count of a reading part, once every count and number is in range.
fn check_reading_questions(
    part_number: i32,
    groups: &[QuestionGroupInput],
) -> Result<usize, ContentError> {
    let expected = exam_activation::reading_expected_questions(part_number);
    let actual = groups.iter().map(|group| group.questions.len()).sum();
    if actual != expected {
        return Err(ContentError::QuestionCount { part: part_number, expected, actual });
    }

    let (start, end) = exam_activation::reading_question_range(part_number);
    let stray = groups
        .iter()
        .flat_map(|group| &group.questions)
        .find(|question| !(start..=end).contains(&question.question_number));
    if let Some(question) = stray {
        return Err(ContentError::QuestionOutOfRange {
            number: question.question_number,
            part: part_number,
            start,
            end,
        });
    }
    Ok(actual)
}

/// Replaces one reading part's passage and question groups. The section's marks become
/// the sum of its questions; the exam activates once all three parts are complete.
pub(crate) async fn update_reading_part(
    pool: &sqlx::PgPool,
    update: ReadingPartUpdate<'_>,
    now: PrimitiveDateTime,
) -> Result<ReadingPartOutcome, ContentError> {
    let total_questions = check_reading_questions(update.part_number, update.groups)?;
    let mut tx = pool.begin().await?;

    let section =
        repositories::sections::find_by_exam_and_order(&mut *tx, update.exam_id, update.part_number)
            .await?
            .filter(|section| section.section_type == SectionType::Reading)
            .ok_or(ContentError::SectionNotFound)?;

    repositories::content::clear_section(&mut *tx, &section.id).await?;

    let passage_id = Uuid::new_v4().to_string();
    let word_count = text::word_count(&text::plain_text(update.passage_content));
    repositories::content::create_passage(
        &mut *tx,
        repositories::content::CreatePassage {
            id: &passage_id,
            section_id: &section.id,
            title: update.passage_title,
            content: update.passage_content,
            word_count: i32::try_from(word_count).unwrap_or(i32::MAX),
        },
    )
    .await?;

    let mut total_marks = 0;
    for group in update.groups {
        let group_data = json!({
            "instruction": group.instruction,
            "question_range": group.question_range,
            "group_type": group.group_type,
            "order_number": group.order_number,
        });
        for input in &group.questions {
            let question_id = Uuid::new_v4().to_string();
            repositories::content::create_question(
                &mut *tx,
                repositories::content::CreateQuestion {
                    id: &question_id,
                    section_id: &section.id,
                    question_type: &input.question_type,
                    question_text: &input.question_text,
                    correct_answer: Some(input.correct_answer.as_str()),
                    marks: input.marks.max(0),
                    additional_data: json!({
                        "question_number": input.question_number,
                        "group": group_data,
                    }),
                    order_index: input.question_number,
                    now,
                },
            )
            .await?;
            create_options(&mut tx, &question_id, &input.options).await?;
            total_marks += input.marks.max(0);
        }
    }

    repositories::sections::update_totals(
        &mut *tx,
        &section.id,
        section.duration,
        f64::from(total_marks),
    )
    .await?;

    let states = repositories::content::reading_part_states(&mut *tx, update.exam_id)
        .await?
        .into_iter()
        .map(|(order_number, has_passage, questions)| ReadingPartState {
            order_number,
            has_passage,
            questions,
        })
        .collect::<Vec<_>>();
    let exam_activated = exam_activation::reading_ready(&states);
    if exam_activated {
        repositories::exams::set_active(&mut *tx, update.exam_id, true, now).await?;
    }

    tx.commit().await?;

    tracing::info!(
        exam_id = update.exam_id,
        section_id = %section.id,
        part_number = update.part_number,
        groups = update.groups.len(),
        total_questions,
        total_marks,
        exam_activated,
        "Reading part updated"
    );

    Ok(ReadingPartOutcome {
        section_id: section.id,
        passage_id,
        total_questions,
        total_marks,
        exam_activated,
    })
}

fn question_metadata(context: &QuestionContext, main_text_id: &str) -> serde_json::Value {
    let required_choices = (context.required_choices > 1).then_some(context.required_choices);
    json!({
        "question_number": context.number,
        "main_text_id": main_text_id,
        "required_choices": required_choices,
    })
}

/// Adds or replaces one writing part. With both parts present the essay section's
/// totals are recomputed and the exam is activated.
pub(crate) async fn add_writing_part(
    pool: &sqlx::PgPool,
    exam_id: &str,
    input: WritingPartInput<'_>,
    now: PrimitiveDateTime,
) -> Result<WritingPartOutcome, ContentError> {
    let mut tx = pool.begin().await?;

    repositories::exams::find_by_id(&mut *tx, exam_id).await?.ok_or(ContentError::ExamNotFound)?;
    let section = repositories::sections::list_by_exam(&mut *tx, exam_id)
        .await?
        .into_iter()
        .find(|section| section.section_type == SectionType::Essay)
        .ok_or(ContentError::SectionNotFound)?;

    let task = repositories::writing::upsert_task(
        &mut *tx,
        repositories::writing::UpsertTask {
            id: &Uuid::new_v4().to_string(),
            exam_id,
            part_number: input.part_number,
            task_type: input.task_type,
            instructions: input.instructions,
            word_limit: input.word_limit,
            total_marks: input.total_marks,
            duration: input.duration,
        },
    )
    .await?;

    let tasks = repositories::writing::list_tasks_by_exam(&mut *tx, exam_id).await?;
    let totals = exam_activation::writing_ready(&tasks);
    if let Some(totals) = totals {
        repositories::sections::update_totals(
            &mut *tx,
            &section.id,
            totals.duration,
            totals.total_marks,
        )
        .await?;
        repositories::exams::set_active(&mut *tx, exam_id, true, now).await?;
    }

    tx.commit().await?;

    tracing::info!(
        exam_id,
        task_id = %task.id,
        part_number = task.part_number,
        is_complete = totals.is_some(),
        "Writing part saved"
    );

    Ok(WritingPartOutcome { task, totals })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_is_trimmed_and_unix_newlined() {
        assert_eq!(
            normalize_transcript(Some("  <p>a</p>\r\n<p>b</p>\r\n ")),
            Some("<p>a</p>\n<p>b</p>".to_string())
        );
        assert_eq!(normalize_transcript(Some("   ")), None);
        assert_eq!(normalize_transcript(None), None);
    }

    fn group(numbers: std::ops::RangeInclusive<i32>) -> QuestionGroupInput {
        QuestionGroupInput {
            instruction: "Do the statements agree?".to_string(),
            question_range: format!("{}-{}", numbers.start(), numbers.end()),
            group_type: "true_false_ng".to_string(),
            order_number: 1,
            questions: numbers
                .map(|number| ReadingQuestionInput {
                    question_text: format!("Statement {number}"),
                    question_type: "true_false".to_string(),
                    correct_answer: "TRUE".to_string(),
                    marks: 1,
                    question_number: number,
                    options: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn reading_questions_must_match_part_count_and_range() {
        assert_eq!(check_reading_questions(1, &[group(1..=6), group(7..=13)]).ok(), Some(13));
        assert_eq!(check_reading_questions(3, &[group(27..=40)]).ok(), Some(14));

        let err = check_reading_questions(2, &[group(14..=25)]).unwrap_err();
        assert_eq!(err.to_string(), "Part 2 must have exactly 13 questions, but got 12");

        let err = check_reading_questions(2, &[group(13..=25)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Question number 13 is out of range for part 2. Must be between 14 and 26."
        );
    }

    #[test]
    fn metadata_marks_choice_groups_only() {
        let numbered =
            QuestionContext { number: Some(4), required_choices: 1, context: "x".to_string() };
        let grouped =
            QuestionContext { number: None, required_choices: 2, context: "y".to_string() };

        let numbered = question_metadata(&numbered, "main");
        assert_eq!(numbered["question_number"], 4);
        assert!(numbered["required_choices"].is_null());
        assert_eq!(numbered["main_text_id"], "main");

        let grouped = question_metadata(&grouped, "main");
        assert!(grouped["question_number"].is_null());
        assert_eq!(grouped["required_choices"], 2);
    }
}
