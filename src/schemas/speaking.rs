use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::SpeakingQuestion;
use crate::repositories::speaking::MyAnswerRow;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SpeakingAnswerSubmit {
    #[validate(length(min = 1, message = "answer_text must not be empty"))]
    pub(crate) answer_text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicQuestionSummary {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) order_number: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicSummary {
    pub(crate) topic_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) created_at: String,
    pub(crate) speaking_questions: Vec<TopicQuestionSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicQuestion {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) sample_answer: String,
    pub(crate) order_number: i32,
    pub(crate) part_type: String,
}

impl From<SpeakingQuestion> for TopicQuestion {
    fn from(question: SpeakingQuestion) -> Self {
        Self {
            question_id: question.id,
            question_text: question.question_text,
            sample_answer: question.sample_answer.unwrap_or_default(),
            order_number: question.order_number,
            part_type: question.part_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TopicDetail {
    pub(crate) topic_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) questions: Vec<TopicQuestion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpeakingAnswerResponse {
    pub(crate) message: String,
    pub(crate) answer_id: String,
    pub(crate) question_id: String,
    pub(crate) user_id: String,
    pub(crate) answer_text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MySpeakingAnswer {
    pub(crate) answer_id: String,
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) topic_id: String,
    pub(crate) topic_title: String,
    pub(crate) answer_text: String,
    pub(crate) updated_at: String,
}

impl From<MyAnswerRow> for MySpeakingAnswer {
    fn from(row: MyAnswerRow) -> Self {
        Self {
            answer_id: row.id,
            question_id: row.question_id,
            question_text: row.question_text,
            topic_id: row.topic_id,
            topic_title: row.topic_title,
            answer_text: row.answer_text,
            updated_at: format_primitive(row.updated_at),
        }
    }
}
