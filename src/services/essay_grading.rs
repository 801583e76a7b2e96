use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::core::config::Settings;
use crate::core::metrics;

pub(crate) const CRITERIA: [&str; 4] =
    ["task_achievement", "coherence_cohesion", "lexical_resource", "grammatical_range"];

const SYSTEM_PROMPT: &str =
    "You are an expert IELTS examiner. Always respond in the exact JSON format specified.";

const RESPONSE_TEMPLATE: &str = r#"{
    "band_score": "<overall_score>",
    "criteria_scores": {
        "task_achievement": "<score>",
        "coherence_cohesion": "<score>",
        "lexical_resource": "<score>",
        "grammatical_range": "<score>"
    },
    "mistakes": {
        "task_achievement": [{"phrase": "<original_text>", "explanation": "<vietnamese_explanation>"}],
        "coherence_cohesion": [{"phrase": "<original_text>", "explanation": "<vietnamese_explanation>"}],
        "lexical_resource": [{"phrase": "<original_text>", "explanation": "<vietnamese_explanation>"}],
        "grammatical_range": [{"phrase": "<original_text>", "explanation": "<vietnamese_explanation>"}]
    },
    "improvement_suggestions": {
        "task_achievement": [{"phrase": "<original_text>", "suggestion": "<vietnamese_suggestion>"}],
        "coherence_cohesion": [{"phrase": "<original_text>", "suggestion": "<vietnamese_suggestion>"}],
        "lexical_resource": [{"phrase": "<original_text>", "suggestion": "<vietnamese_suggestion>"}],
        "grammatical_range": [{"phrase": "<original_text>", "suggestion": "<vietnamese_suggestion>"}]
    },
    "rewritten_essay": "<new_essay_achieving_band_8>"
}"#;

#[derive(Debug, Error)]
pub(crate) enum EssayGradingError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to grading model failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("grading model returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("grading model response has no message content")]
    MissingContent,
    #[error("failed to parse AI response as JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct CriteriaScores {
    pub(crate) task_achievement: f64,
    pub(crate) coherence_cohesion: f64,
    pub(crate) lexical_resource: f64,
    pub(crate) grammatical_range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EssayEvaluation {
    pub(crate) band_score: f64,
    pub(crate) criteria_scores: CriteriaScores,
    pub(crate) mistakes: Value,
    pub(crate) improvement_suggestions: Value,
    pub(crate) rewritten_essay: String,
}

#[derive(Debug, Clone)]
pub(crate) struct EssayRequest<'a> {
    /// Plain text; callers strip HTML first.
    pub(crate) essay_text: &'a str,
    pub(crate) instructions: &'a str,
    pub(crate) part_number: i32,
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub(crate) struct EssayGrader {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl EssayGrader {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self, EssayGradingError> {
        let ai = settings.ai();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(ai.request_timeout))
            .build()
            .map_err(EssayGradingError::Client)?;

        Ok(Self {
            client,
            api_key: ai.api_key.clone(),
            base_url: ai.base_url.trim_end_matches('/').to_string(),
            model: ai.model.clone(),
            max_tokens: ai.max_tokens,
            temperature: ai.temperature,
        })
    }

    pub(crate) async fn evaluate(
        &self,
        request: EssayRequest<'_>,
    ) -> Result<EssayEvaluation, EssayGradingError> {
        let timer = Instant::now();
        let result = self.call_model(&request).await;

        match &result {
            Ok(evaluation) => {
                metrics::record_essay_evaluation("success");
                tracing::info!(
                    part_number = request.part_number,
                    band_score = evaluation.band_score,
                    duration_ms = timer.elapsed().as_millis() as u64,
                    model = %self.model,
                    "Essay evaluated"
                );
            }
            Err(err) => {
                metrics::record_essay_evaluation("failure");
                tracing::warn!(
                    part_number = request.part_number,
                    error = %err,
                    duration_ms = timer.elapsed().as_millis() as u64,
                    "Essay evaluation failed"
                );
            }
        }

        result
    }

    async fn call_model(
        &self,
        request: &EssayRequest<'_>,
    ) -> Result<EssayEvaluation, EssayGradingError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(request)}
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(EssayGradingError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EssayGradingError::Upstream { status: status.as_u16(), body });
        }

        let body: Value = response.json().await.map_err(EssayGradingError::Transport)?;
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or(EssayGradingError::MissingContent)?;

        parse_evaluation(content)
    }
}

fn flatten(text: &str) -> String {
    text.trim().replace('\r', "").replace('\n', " ")
}

pub(crate) fn build_prompt(request: &EssayRequest<'_>) -> String {
    let task_type = if request.part_number == 1 { "Task 1" } else { "Task 2" };

    format!(
        "You are an IELTS Writing Examiner. Evaluate the following IELTS Writing {task_type} \
essay strictly according to the official IELTS Writing band descriptors.

1. Assess the essay on all four criteria: Task Achievement, Coherence and Cohesion, \
Lexical Resource, and Grammatical Range and Accuracy. For each criterion identify 2-3 \
specific phrases that need improvement, quote the original text, explain the problem \
in Vietnamese and suggest an improvement in Vietnamese. Never leave a criterion empty.
2. Rewrite the essay in English, keeping the original structure, at band 8.0.

Return ONLY JSON in this format:

{RESPONSE_TEMPLATE}

Task Type: IELTS Writing {task_type}
Task Instructions: {}
Student Essay: {}
",
        flatten(request.instructions),
        flatten(request.essay_text),
    )
}

/// Accepts numbers or numeric strings; anything else scores 0.
fn score_value(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Every criterion is present, defaulting to an empty list.
fn per_criterion(value: Option<&Value>) -> Value {
    let source = value.and_then(Value::as_object);
    let mut normalized = Map::new();
    for criterion in CRITERIA {
        let entries = source
            .and_then(|map| map.get(criterion))
            .filter(|entry| !entry.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        normalized.insert(criterion.to_string(), entries);
    }
    Value::Object(normalized)
}

pub(crate) fn parse_evaluation(content: &str) -> Result<EssayEvaluation, EssayGradingError> {
    let raw: Value = serde_json::from_str(content).map_err(EssayGradingError::InvalidJson)?;
    let criteria = raw.get("criteria_scores");

    Ok(EssayEvaluation {
        band_score: score_value(raw.get("band_score")),
        criteria_scores: CriteriaScores {
            task_achievement: score_value(criteria.and_then(|c| c.get("task_achievement"))),
            coherence_cohesion: score_value(criteria.and_then(|c| c.get("coherence_cohesion"))),
            lexical_resource: score_value(criteria.and_then(|c| c.get("lexical_resource"))),
            grammatical_range: score_value(criteria.and_then(|c| c.get("grammatical_range"))),
        },
        mistakes: per_criterion(raw.get("mistakes")),
        improvement_suggestions: per_criterion(raw.get("improvement_suggestions")),
        rewritten_essay: raw
            .get("rewritten_essay")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &Value) -> Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content.to_string()}}],
            "usage": {"total_tokens": 321}
        })
    }

    async fn grader_for(server: &MockServer) -> EssayGrader {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("AI_BASE_URL", format!("{}/v1", server.uri()));
        std::env::set_var("AI_API_KEY", "test-key");
        let settings = Settings::load().expect("settings");
        test_support::set_test_env();
        EssayGrader::from_settings(&settings).expect("grader")
    }

    #[test]
    fn parse_accepts_numeric_strings_and_fills_missing_criteria() {
        let content = json!({
            "band_score": "6.5",
            "criteria_scores": {
                "task_achievement": 6,
                "coherence_cohesion": "7.0",
                "lexical_resource": "n/a"
            },
            "mistakes": {
                "task_achievement": [{"phrase": "In nowadays", "explanation": "sai"}]
            },
            "rewritten_essay": "Nowadays, ..."
        })
        .to_string();

        let evaluation = parse_evaluation(&content).expect("evaluation");

        assert_eq!(evaluation.band_score, 6.5);
        assert_eq!(evaluation.criteria_scores.task_achievement, 6.0);
        assert_eq!(evaluation.criteria_scores.coherence_cohesion, 7.0);
        assert_eq!(evaluation.criteria_scores.lexical_resource, 0.0);
        assert_eq!(evaluation.criteria_scores.grammatical_range, 0.0);
        assert_eq!(evaluation.mistakes["task_achievement"][0]["phrase"], "In nowadays");
        for criterion in CRITERIA {
            assert!(evaluation.improvement_suggestions[criterion].is_array());
        }
        assert_eq!(evaluation.mistakes["grammatical_range"], json!([]));
    }

    #[test]
    fn parse_rejects_non_json() {
        let err = parse_evaluation("Band 7, well done").unwrap_err();
        assert!(matches!(err, EssayGradingError::InvalidJson(_)));
    }

    #[test]
    fn prompt_names_task_and_flattens_text() {
        let prompt = build_prompt(&EssayRequest {
            essay_text: "Line one\nLine two\r\n",
            instructions: "Describe the chart.",
            part_number: 1,
        });

        assert!(prompt.contains("IELTS Writing Task 1"));
        assert!(prompt.contains("Student Essay: Line one Line two"));
        assert!(prompt.contains("\"rewritten_essay\""));
    }

    #[tokio::test]
    async fn evaluate_posts_chat_completion_and_parses_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "llama3-70b-8192",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(&json!({
                "band_score": 7.5,
                "criteria_scores": {
                    "task_achievement": 7,
                    "coherence_cohesion": 8,
                    "lexical_resource": 7.5,
                    "grammatical_range": 7
                },
                "rewritten_essay": "Improved essay"
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let grader = grader_for(&server).await;
        let evaluation = grader
            .evaluate(EssayRequest {
                essay_text: "Some people think...",
                instructions: "Discuss both views.",
                part_number: 2,
            })
            .await
            .expect("evaluation");

        assert_eq!(evaluation.band_score, 7.5);
        assert_eq!(evaluation.criteria_scores.coherence_cohesion, 8.0);
        assert_eq!(evaluation.rewritten_essay, "Improved essay");
    }

    #[tokio::test]
    async fn evaluate_surfaces_upstream_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let grader = grader_for(&server).await;
        let err = grader
            .evaluate(EssayRequest { essay_text: "text", instructions: "task", part_number: 1 })
            .await
            .unwrap_err();

        match err {
            EssayGradingError::Upstream { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
