use crate::db::models::WritingTask;

pub(crate) const LISTENING_PARTS: i32 = 4;
pub(crate) const WRITING_PARTS: usize = 2;
pub(crate) const READING_PARTS: i32 = 3;
const READING_QUESTIONS: [usize; 3] = [13, 13, 14];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SectionPlan {
    pub(crate) order_number: i32,
    pub(crate) duration: i32,
    pub(crate) total_marks: f64,
}

/// Four equal listening parts; the remainder of an uneven split is dropped.
pub(crate) fn listening_parts(total_duration: i32, total_marks: f64) -> Vec<SectionPlan> {
    (1..=LISTENING_PARTS)
        .map(|order_number| SectionPlan {
            order_number,
            duration: total_duration / LISTENING_PARTS,
            total_marks: total_marks / f64::from(LISTENING_PARTS),
        })
        .collect()
}

pub(crate) fn listening_ready(parts_with_media: i64) -> bool {
    parts_with_media >= i64::from(LISTENING_PARTS)
}

/// Questions a reading part must carry: 13, 13 and 14.
pub(crate) fn reading_expected_questions(part_number: i32) -> usize {
    if part_number < READING_PARTS {
        READING_QUESTIONS[0]
    } else {
        READING_QUESTIONS[2]
    }
}

/// Inclusive question-number range of a reading part (1-13, 14-26, 27-40).
pub(crate) fn reading_question_range(part_number: i32) -> (i32, i32) {
    let before: usize = (1..part_number).map(reading_expected_questions).sum();
    let start = before as i32 + 1;
    (start, start + reading_expected_questions(part_number) as i32 - 1)
}

/// Three reading parts; duration is split evenly, marks in proportion to questions.
pub(crate) fn reading_parts(total_duration: i32, total_marks: f64) -> Vec<SectionPlan> {
    let total_questions: usize = READING_QUESTIONS.iter().sum();
    (1..=READING_PARTS)
        .map(|order_number| SectionPlan {
            order_number,
            duration: total_duration / READING_PARTS,
            total_marks: total_marks * reading_expected_questions(order_number) as f64
                / total_questions as f64,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadingPartState {
    pub(crate) order_number: i32,
    pub(crate) has_passage: bool,
    pub(crate) questions: i64,
}

/// All three parts carry a passage and exactly their expected question count.
pub(crate) fn reading_ready(parts: &[ReadingPartState]) -> bool {
    parts.len() == READING_PARTS as usize
        && parts.iter().all(|part| {
            part.has_passage
                && part.questions == reading_expected_questions(part.order_number) as i64
        })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WritingTotals {
    pub(crate) duration: i32,
    pub(crate) total_marks: f64,
}

/// `Some` once both writing parts exist, with the essay section's recomputed totals.
pub(crate) fn writing_ready(tasks: &[WritingTask]) -> Option<WritingTotals> {
    if tasks.len() < WRITING_PARTS {
        return None;
    }

    Some(WritingTotals {
        duration: tasks.iter().map(|task| task.duration).sum(),
        total_marks: tasks.iter().map(|task| task.total_marks).sum(),
    })
}
