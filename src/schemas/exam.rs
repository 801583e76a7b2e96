use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{ListeningMedia, Question, QuestionOption, ReadingPassage};
use crate::db::types::SectionType;
use crate::repositories::results::HistoryRow;
use crate::services::scoring::SectionTally;

#[derive(Debug, Deserialize)]
pub(crate) struct AvailableExamsQuery {
    #[serde(default)]
    pub(crate) section_type: Option<SectionType>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AvailableExam {
    pub(crate) exam_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) total_duration: i64,
    pub(crate) total_marks: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListeningExamSummary {
    pub(crate) exam_id: String,
    pub(crate) title: String,
    pub(crate) duration: i64,
    pub(crate) total_marks: f64,
    pub(crate) is_completed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamStartResponse {
    pub(crate) exam_id: String,
    pub(crate) title: String,
    pub(crate) start_time: String,
    /// Listening exams only: the caller has answers on record.
    pub(crate) is_completed: bool,
    pub(crate) sections: Vec<StartSection>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartSection {
    pub(crate) section_id: String,
    pub(crate) section_type: SectionType,
    pub(crate) duration: i32,
    pub(crate) total_marks: f64,
    pub(crate) order_number: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) passages: Vec<StartPassage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) media: Option<StartMedia>,
    pub(crate) questions: Vec<StartQuestion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartPassage {
    pub(crate) passage_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) word_count: i32,
}

impl From<ReadingPassage> for StartPassage {
    fn from(passage: ReadingPassage) -> Self {
        Self {
            passage_id: passage.id,
            title: passage.title.trim().to_string(),
            content: passage.content.trim().to_string(),
            word_count: passage.word_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartMedia {
    pub(crate) media_id: String,
    pub(crate) audio_filename: String,
    pub(crate) transcript: Option<String>,
    pub(crate) duration: i32,
}

impl From<ListeningMedia> for StartMedia {
    fn from(media: ListeningMedia) -> Self {
        Self {
            media_id: media.id,
            audio_filename: media.audio_filename,
            transcript: media.transcript.map(|text| text.trim().to_string()),
            duration: media.duration,
        }
    }
}

/// Served question. The correct answer and option correctness never leave the server.
#[derive(Debug, Serialize)]
pub(crate) struct StartQuestion {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: String,
    pub(crate) marks: i32,
    pub(crate) additional_data: serde_json::Value,
    pub(crate) options: Vec<StartOption>,
}

impl StartQuestion {
    pub(crate) fn new(question: Question, options: Vec<StartOption>) -> Self {
        Self {
            question_id: question.id,
            question_text: question.question_text.trim().to_string(),
            question_type: question.question_type.trim().to_string(),
            marks: question.marks,
            additional_data: question.additional_data.0,
            options,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartOption {
    pub(crate) option_id: String,
    pub(crate) option_text: String,
}

impl From<QuestionOption> for StartOption {
    fn from(option: QuestionOption) -> Self {
        Self { option_id: option.id, option_text: option.option_text.trim().to_string() }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) result_id: String,
    pub(crate) total_score: i32,
    pub(crate) section_scores: BTreeMap<String, SectionTally>,
    pub(crate) completion_date: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RetakeResponse {
    pub(crate) message: String,
    pub(crate) exam_id: String,
    pub(crate) answers_deleted: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetailedAnswer {
    pub(crate) question_id: String,
    pub(crate) section_id: String,
    pub(crate) question_text: String,
    pub(crate) student_answer: String,
    pub(crate) correct_answer: Option<String>,
    pub(crate) score: i32,
    pub(crate) max_marks: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResultDetail {
    pub(crate) result_id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) completion_date: String,
    pub(crate) total_score: i32,
    pub(crate) section_scores: serde_json::Value,
    pub(crate) detailed_answers: Vec<DetailedAnswer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryItem {
    pub(crate) result_id: String,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) total_score: i32,
    pub(crate) completion_date: String,
}

impl From<HistoryRow> for HistoryItem {
    fn from(row: HistoryRow) -> Self {
        Self {
            result_id: row.id,
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            total_score: row.total_score,
            completion_date: format_primitive(row.completion_date),
        }
    }
}
