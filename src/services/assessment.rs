use crate::error::{Error, Result};
use crate::models::{Assessment, GradingUpdate, Submission};

use super::gateway_http;

/// Client for assessments and submissions, both served by the course
/// gateway.
#[derive(Debug, Clone)]
pub struct AssessmentClient {
    http: reqwest::Client,
    base: String,
}

impl AssessmentClient {
    pub fn new(base: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            http: gateway_http(token),
            base: base.into(),
        }
    }

    pub async fn get_assessment(&self, assessment_id: i64) -> Result<Assessment> {
        self.http
            .get(format!(
                "{}/courses/api/v1/assessments/{assessment_id}",
                self.base
            ))
            .send()
            .await
            .map_err(Error::service("assessment"))?
            .error_for_status()
            .map_err(Error::service("assessment"))?
            .json()
            .await
            .map_err(Error::service("assessment"))
    }

    pub async fn list_for_course(&self, course_id: i64) -> Result<Vec<Assessment>> {
        self.http
            .get(format!(
                "{}/courses/api/v1/assessments/course/{course_id}",
                self.base
            ))
            .send()
            .await
            .map_err(Error::service("assessment"))?
            .error_for_status()
            .map_err(Error::service("assessment"))?
            .json()
            .await
            .map_err(Error::service("assessment"))
    }

    pub async fn submit(&self, submission: &Submission) -> Result<Submission> {
        self.http
            .post(format!("{}/courses/api/v1/student-assessments", self.base))
            .json(submission)
            .send()
            .await
            .map_err(Error::service("assessment"))?
            .error_for_status()
            .map_err(Error::service("assessment"))?
            .json()
            .await
            .map_err(Error::service("assessment"))
    }

    pub async fn list_for_student(&self, student_id: i64) -> Result<Vec<Submission>> {
        self.http
            .get(format!(
                "{}/courses/api/v1/student-assessments/student/{student_id}",
                self.base
            ))
            .send()
            .await
            .map_err(Error::service("assessment"))?
            .error_for_status()
            .map_err(Error::service("assessment"))?
            .json()
            .await
            .map_err(Error::service("assessment"))
    }

    pub async fn list_for_assessment(&self, assessment_id: i64) -> Result<Vec<Submission>> {
        self.http
            .get(format!(
                "{}/courses/api/v1/student-assessments/assessment/{assessment_id}",
                self.base
            ))
            .send()
            .await
            .map_err(Error::service("assessment"))?
            .error_for_status()
            .map_err(Error::service("assessment"))?
            .json()
            .await
            .map_err(Error::service("assessment"))
    }

    /// Manual grading by an admin, for assessment types the client cannot
    /// auto-grade.
    pub async fn grade(&self, submission_id: i64, update: &GradingUpdate) -> Result<Submission> {
        self.http
            .put(format!(
                "{}/courses/api/v1/student-assessments/{submission_id}",
                self.base
            ))
            .json(update)
            .send()
            .await
            .map_err(Error::service("assessment"))?
            .error_for_status()
            .map_err(Error::service("assessment"))?
            .json()
            .await
            .map_err(Error::service("assessment"))
    }
}
