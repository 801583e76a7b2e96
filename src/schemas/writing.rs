use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{WritingAnswer, WritingTask};

#[derive(Debug, Deserialize)]
pub(crate) struct WritingAnswerSubmit {
    pub(crate) answer_text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WritingTestSubmit {
    pub(crate) part1_answer: String,
    pub(crate) part2_answer: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WritingPart {
    pub(crate) task_id: String,
    pub(crate) part_number: i32,
    pub(crate) task_type: String,
    pub(crate) instructions: String,
    pub(crate) word_limit: i32,
    pub(crate) total_marks: f64,
    pub(crate) duration: i32,
}

impl From<WritingTask> for WritingPart {
    fn from(task: WritingTask) -> Self {
        Self {
            task_id: task.id,
            part_number: task.part_number,
            task_type: task.task_type,
            instructions: task.instructions,
            word_limit: task.word_limit,
            total_marks: task.total_marks,
            duration: task.duration,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WritingTestSummary {
    pub(crate) test_id: String,
    pub(crate) title: String,
    pub(crate) is_completed: bool,
    pub(crate) parts: Vec<WritingPart>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PreviousAnswer {
    pub(crate) answer_text: String,
    pub(crate) score: f64,
    pub(crate) is_ai_evaluated: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<WritingAnswer> for PreviousAnswer {
    fn from(answer: WritingAnswer) -> Self {
        Self {
            answer_text: answer.answer_text,
            score: answer.score,
            is_ai_evaluated: answer.is_ai_evaluated,
            created_at: format_primitive(answer.created_at),
            updated_at: format_primitive(answer.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WritingTaskDetail {
    #[serde(flatten)]
    pub(crate) part: WritingPart,
    pub(crate) test_id: String,
    pub(crate) previous_answer: Option<PreviousAnswer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OtherPart {
    pub(crate) task_id: String,
    pub(crate) part_number: i32,
    pub(crate) submitted: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveDraftResponse {
    pub(crate) message: String,
    pub(crate) task_id: String,
    pub(crate) answer_id: String,
    pub(crate) part_number: i32,
    pub(crate) word_count: usize,
    pub(crate) answer_text: String,
    pub(crate) other_part: Option<OtherPart>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PartSubmission {
    pub(crate) task_id: String,
    pub(crate) part_number: i32,
    pub(crate) word_count: usize,
    pub(crate) task_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct WritingTestSubmitResponse {
    pub(crate) message: String,
    pub(crate) test_id: String,
    pub(crate) submissions: Vec<PartSubmission>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnsweredPart {
    pub(crate) task_id: String,
    pub(crate) part_number: i32,
    pub(crate) task_type: String,
    pub(crate) instructions: String,
    pub(crate) word_limit: i32,
    pub(crate) answer: Option<PreviousAnswer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WritingTestAnswers {
    pub(crate) test_id: String,
    pub(crate) is_completed: bool,
    pub(crate) total_parts: usize,
    pub(crate) submitted_parts: usize,
    pub(crate) parts: Vec<AnsweredPart>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WritingResetResponse {
    pub(crate) message: String,
    pub(crate) test_id: String,
    pub(crate) answers_deleted: u64,
}
