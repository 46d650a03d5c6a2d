use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// User directory entry. Created by the user service; read-only here apart
/// from the profile-edit fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // same label as the wire format
        let label = match self {
            Role::Student => "STUDENT",
            Role::Admin => "ADMIN",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub module_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_length: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    #[serde(default)]
    pub course_id: Option<i64>,
    pub title: String,
    /// Materials are grouped into weekly modules; rows without a week
    /// number belong to week 1, as the course viewer assumes.
    #[serde(default = "default_week")]
    pub week_number: u32,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

fn default_week() -> u32 {
    1
}

/// One click-tracking row from the activity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub student_id: i64,
    pub course_code: String,
    #[serde(default)]
    pub module_code: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sum_clicks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    #[default]
    SingleChoice,
    MultiChoice,
    TrueFalse,
    Ordering,
}

/// A submitted or correct answer as it appears on the wire: a bare option
/// index, or a list of indices for multi-answer and ordering questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    One(usize),
    Many(Vec<usize>),
}

impl AnswerValue {
    pub fn as_one(&self) -> Option<usize> {
        match self {
            AnswerValue::One(idx) => Some(*idx),
            AnswerValue::Many(_) => None,
        }
    }

    pub fn as_set(&self) -> BTreeSet<usize> {
        match self {
            AnswerValue::One(idx) => BTreeSet::from([*idx]),
            AnswerValue::Many(indices) => indices.iter().copied().collect(),
        }
    }

    pub fn as_sequence(&self) -> Vec<usize> {
        match self {
            AnswerValue::One(idx) => vec![*idx],
            AnswerValue::Many(indices) => indices.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer", alias = "correct_answer")]
    pub correct: AnswerValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: i64,
    #[serde(default)]
    pub course_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub assessment_type: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub max_marks: f64,
    /// Some backends persist the question list as a json string column;
    /// both shapes deserialize to the same vec, bad payloads to empty.
    #[serde(default, deserialize_with = "questions_maybe_string")]
    pub questions: Vec<Question>,
}

fn questions_maybe_string<'de, D>(deserializer: D) -> Result<Vec<Question>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Parsed(Vec<Question>),
        Encoded(String),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Parsed(questions)) => questions,
        Some(Raw::Encoded(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
        None => Vec::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Submitted,
    Graded,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SubmissionStatus::Submitted => "SUBMITTED",
            SubmissionStatus::Graded => "GRADED",
        };
        write!(f, "{label}")
    }
}

/// Per-question detail stored inside a submission, json-encoded on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: i64,
    #[serde(default)]
    pub student_answer: Option<AnswerValue>,
    pub is_correct: bool,
    pub correct_answer: AnswerValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub id: Option<i64>,
    pub student_id: i64,
    pub assessment_id: i64,
    pub marks_obtained: f64,
    pub submission_status: SubmissionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub graded_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub feedback: Option<String>,
    /// Json-encoded `Vec<AnswerRecord>`, matching the gateway column.
    #[serde(default)]
    pub answers: String,
}

impl Submission {
    pub fn answer_records(&self) -> Vec<AnswerRecord> {
        serde_json::from_str(&self.answers).unwrap_or_default()
    }
}

/// Body for the admin grading update on a submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingUpdate {
    pub marks_obtained: f64,
    pub feedback: String,
    pub submission_status: SubmissionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub graded_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

// The AI microservice speaks snake_case, unlike the gateway.

#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub student_id: i64,
    pub module_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub student_id: i64,
    pub module_code: String,
    pub success_proba: f64,
    pub risk_level: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
    pub resource_id: i64,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationResponse {
    pub student_id: i64,
    pub module_code: String,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiHealth {
    pub status: String,
}

impl AiHealth {
    pub fn unavailable() -> Self {
        Self {
            status: "unavailable".to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assessment_questions_as_string() {
        let raw = r#"{
            "id": 4,
            "title": "Quiz 1",
            "maxMarks": 20.0,
            "questions": "[{\"question\":\"2+2?\",\"options\":[\"3\",\"4\"],\"correctAnswer\":1}]"
        }"#;
        let assessment: Assessment = serde_json::from_str(raw).unwrap();
        assert_eq!(assessment.questions.len(), 1);
        assert_eq!(assessment.questions[0].correct, AnswerValue::One(1));
        assert_eq!(assessment.questions[0].kind, QuestionKind::SingleChoice);
    }

    #[test]
    fn assessment_questions_inline() {
        let raw = r#"{
            "id": 4,
            "title": "Quiz 1",
            "questions": [
                {"question": "pick two", "type": "MULTI_CHOICE",
                 "options": ["a", "b", "c"], "correctAnswer": [0, 2]}
            ]
        }"#;
        let assessment: Assessment = serde_json::from_str(raw).unwrap();
        assert_eq!(assessment.questions[0].kind, QuestionKind::MultiChoice);
        assert_eq!(
            assessment.questions[0].correct.as_set(),
            std::collections::BTreeSet::from([0, 2])
        );
    }

    #[test]
    fn enum_labels_match_wire_format() {
        for role in [Role::Student, Role::Admin] {
            let wire = serde_json::to_value(role).unwrap();
            assert_eq!(wire.as_str(), Some(role.to_string().as_str()));
        }
        for status in [SubmissionStatus::Submitted, SubmissionStatus::Graded] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire.as_str(), Some(status.to_string().as_str()));
        }
    }

    #[test]
    fn grading_update_body_is_camel_case() {
        let update = GradingUpdate {
            marks_obtained: 12.5,
            feedback: "Bien".to_string(),
            submission_status: SubmissionStatus::Graded,
            graded_at: time::macros::datetime!(2026-02-01 10:00 UTC),
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["marksObtained"], 12.5);
        assert_eq!(value["submissionStatus"], "GRADED");
        assert_eq!(value["gradedAt"], "2026-02-01T10:00:00Z");
    }

    #[test]
    fn profile_update_sends_only_set_fields() {
        let update = ProfileUpdate {
            city: Some("Lyon".to_string()),
            ..ProfileUpdate::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["city"], "Lyon");
        assert!(value.get("education").is_none());
        assert!(value.get("bio").is_none());
    }

    #[test]
    fn recommendation_response_wire_format() {
        let raw = r#"{
            "student_id": 3,
            "module_code": "AAA",
            "recommendations": [
                {"resource_id": 8, "title": "Revisions", "type": "video",
                 "url": "https://example.com/v/8", "reason": "low quiz scores"}
            ]
        }"#;
        let response: RecommendationResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.recommendations.len(), 1);
        assert_eq!(response.recommendations[0].kind, "video");
        assert_eq!(response.recommendations[0].resource_id, 8);
    }

    #[test]
    fn user_role_wire_format() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"email":"a@b.c","role":"ADMIN"}"#).unwrap();
        assert_eq!(user.role, Role::Admin);
        let user: User = serde_json::from_str(r#"{"id":2,"email":"x@y.z"}"#).unwrap();
        assert_eq!(user.role, Role::Student);
    }
}
