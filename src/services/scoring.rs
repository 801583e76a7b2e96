use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::db::models::Question;

const ANSWER_SEPARATOR: &str = " or ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SectionTally {
    pub(crate) earned: i32,
    pub(crate) total: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoredAnswer {
    pub(crate) question_id: String,
    pub(crate) student_answer: String,
    pub(crate) score: i32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScoreCard {
    pub(crate) answers: Vec<ScoredAnswer>,
    pub(crate) section_scores: BTreeMap<String, SectionTally>,
    pub(crate) total_score: i32,
}

pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Acceptable answers encoded in `correct_answer`, already normalized.
pub(crate) fn answer_candidates(correct_answer: Option<&str>) -> Vec<String> {
    correct_answer
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.split(ANSWER_SEPARATOR)
                .map(normalize)
                .filter(|candidate| !candidate.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Full marks on an exact normalized match with any candidate, otherwise zero.
pub(crate) fn score_answer(question: &Question, submitted: &str) -> i32 {
    let submitted = normalize(submitted);
    let matched = answer_candidates(question.correct_answer.as_deref())
        .iter()
        .any(|candidate| *candidate == submitted);

    if matched {
        question.marks.max(0)
    } else {
        0
    }
}

/// Grades every submitted pair whose question belongs to `questions`; other ids are
/// skipped. Answers come out in the exam's question order.
pub(crate) fn score_submission(
    questions: &[Question],
    submitted: &HashMap<String, String>,
) -> ScoreCard {
    let mut card = ScoreCard::default();

    for question in questions {
        let Some(answer) = submitted.get(&question.id) else {
            continue;
        };

        let score = score_answer(question, answer);
        let tally = card.section_scores.entry(question.section_id.clone()).or_default();
        tally.earned += score;
        tally.total += question.marks.max(0);
        card.total_score += score;

        card.answers.push(ScoredAnswer {
            question_id: question.id.clone(),
            student_answer: answer.clone(),
            score,
        });
    }

    card
}
