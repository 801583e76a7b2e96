use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{SectionType, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) is_vip: bool,
    pub(crate) is_active: bool,
    pub(crate) account_activated_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSection {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) section_type: SectionType,
    pub(crate) duration: i32,
    pub(crate) total_marks: f64,
    pub(crate) order_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ReadingPassage {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) word_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ListeningMedia {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) audio_filename: String,
    pub(crate) transcript: Option<String>,
    pub(crate) duration: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) section_id: String,
    pub(crate) question_type: String,
    pub(crate) question_text: String,
    pub(crate) correct_answer: Option<String>,
    pub(crate) marks: i32,
    pub(crate) additional_data: Json<serde_json::Value>,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) option_text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamResult {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) exam_id: String,
    pub(crate) total_score: i32,
    pub(crate) section_scores: Json<serde_json::Value>,
    pub(crate) completion_date: PrimitiveDateTime,
}

/// Answer row as read back from either answer table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StoredAnswer {
    pub(crate) question_id: String,
    pub(crate) student_answer: String,
    pub(crate) score: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct WritingTask {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) part_number: i32,
    pub(crate) task_type: String,
    pub(crate) instructions: String,
    pub(crate) word_limit: i32,
    pub(crate) total_marks: f64,
    pub(crate) duration: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct WritingAnswer {
    pub(crate) id: String,
    pub(crate) task_id: String,
    pub(crate) user_id: String,
    pub(crate) answer_text: String,
    pub(crate) score: f64,
    pub(crate) task_achievement_score: Option<f64>,
    pub(crate) coherence_cohesion_score: Option<f64>,
    pub(crate) lexical_resource_score: Option<f64>,
    pub(crate) grammatical_range_score: Option<f64>,
    pub(crate) mistakes: Option<Json<serde_json::Value>>,
    pub(crate) improvement_suggestions: Option<Json<serde_json::Value>>,
    pub(crate) rewritten_essay: Option<String>,
    pub(crate) is_ai_evaluated: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SpeakingTopic {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SpeakingQuestion {
    pub(crate) id: String,
    pub(crate) topic_id: String,
    pub(crate) question_text: String,
    pub(crate) sample_answer: Option<String>,
    pub(crate) order_number: i32,
    pub(crate) part_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SpeakingAnswer {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) user_id: String,
    pub(crate) answer_text: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
