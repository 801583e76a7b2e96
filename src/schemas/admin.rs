use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::exam_content::{ListeningQuestionInput, QuestionGroupInput};

#[derive(Debug, Deserialize)]
pub(crate) struct ExamAccessUpdate {
    pub(crate) access_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamAccessResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    pub(crate) exam_id: String,
    pub(crate) title: String,
    pub(crate) access_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamStatusQuery {
    pub(crate) active: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamStatusResponse {
    pub(crate) message: String,
    pub(crate) exam_id: String,
    pub(crate) title: String,
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ListeningTestInit {
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default = "default_listening_duration")]
    #[validate(range(min = 1, message = "duration must be positive"))]
    pub(crate) duration: i32,
    #[serde(default = "default_listening_marks")]
    #[validate(range(min = 0.0, message = "total_marks must be non-negative"))]
    pub(crate) total_marks: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ListeningPartPayload {
    #[validate(length(min = 1, message = "audio_filename must not be empty"))]
    pub(crate) audio_filename: String,
    #[serde(default)]
    pub(crate) transcript: Option<String>,
    pub(crate) questions: Vec<ListeningQuestionInput>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListeningPartResponse {
    pub(crate) message: String,
    pub(crate) section_id: String,
    pub(crate) filename: String,
    pub(crate) questions_count: usize,
    pub(crate) questions_found: usize,
    pub(crate) questions_created: usize,
    pub(crate) exam_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReadingTestInit {
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default = "default_reading_duration")]
    #[validate(range(min = 1, message = "duration must be positive"))]
    pub(crate) duration: i32,
    #[serde(default = "default_reading_marks")]
    #[validate(range(min = 0.0, message = "total_marks must be non-negative"))]
    pub(crate) total_marks: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PassageInput {
    #[validate(length(min = 1, max = 255, message = "passage title must not be empty"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "passage content must not be empty"))]
    pub(crate) content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReadingPartPayload {
    #[validate(nested)]
    pub(crate) passage: PassageInput,
    pub(crate) question_groups: Vec<QuestionGroupInput>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReadingPartResponse {
    pub(crate) message: String,
    pub(crate) section_id: String,
    pub(crate) passage_id: String,
    pub(crate) question_groups: usize,
    pub(crate) total_questions: usize,
    pub(crate) total_marks: i32,
    pub(crate) exam_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct WritingTestInit {
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub(crate) title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct WritingTaskCreate {
    #[validate(range(min = 1, max = 2, message = "Part number must be 1 or 2"))]
    pub(crate) part_number: i32,
    #[validate(length(min = 1, message = "task_type must not be empty"))]
    pub(crate) task_type: String,
    #[validate(length(min = 1, message = "instructions must not be empty"))]
    pub(crate) instructions: String,
    #[validate(range(min = 1, message = "word_limit must be positive"))]
    pub(crate) word_limit: i32,
    #[serde(default = "default_writing_marks")]
    #[validate(range(min = 0.0, message = "total_marks must be non-negative"))]
    pub(crate) total_marks: f64,
    #[serde(default = "default_writing_duration")]
    #[validate(range(min = 1, message = "duration must be positive"))]
    pub(crate) duration: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct WritingTaskResponse {
    pub(crate) message: String,
    pub(crate) exam_id: String,
    pub(crate) task_id: String,
    pub(crate) part_number: i32,
    pub(crate) is_complete: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SpeakingTopicCreate {
    #[validate(length(min = 1, max = 255, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpeakingTopicCreated {
    pub(crate) message: String,
    pub(crate) topic_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpeakingTopicEntry {
    pub(crate) topic_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SpeakingQuestionCreate {
    #[validate(length(min = 1, message = "question_text must not be empty"))]
    pub(crate) question_text: String,
    #[serde(default)]
    pub(crate) sample_answer: Option<String>,
    #[serde(default)]
    pub(crate) order_number: i32,
    pub(crate) part_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SpeakingQuestionCreated {
    pub(crate) message: String,
    pub(crate) question_id: String,
    pub(crate) topic_id: String,
    pub(crate) part_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamCreatedResponse {
    pub(crate) message: String,
    pub(crate) exam_id: String,
    pub(crate) title: String,
}

const fn default_listening_duration() -> i32 {
    30
}

const fn default_listening_marks() -> f64 {
    40.0
}

const fn default_reading_duration() -> i32 {
    60
}

const fn default_reading_marks() -> f64 {
    40.0
}

const fn default_writing_marks() -> f64 {
    20.0
}

const fn default_writing_duration() -> i32 {
    60
}
