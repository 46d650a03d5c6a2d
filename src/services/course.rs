use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Course, Material};

use super::{CourseDirectory, CourseFollow, gateway_http};

/// Client for the course/material service behind the gateway.
#[derive(Debug, Clone)]
pub struct CourseClient {
    http: reqwest::Client,
    base: String,
}

/// Create/update body for the admin course forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpsert {
    pub title: String,
    pub course_code: String,
    pub module_code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_length: Option<String>,
}

impl CourseClient {
    pub fn new(base: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            http: gateway_http(token),
            base: base.into(),
        }
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        self.http
            .get(format!("{}/courses/api/v1/courses", self.base))
            .send()
            .await
            .map_err(Error::service("course"))?
            .error_for_status()
            .map_err(Error::service("course"))?
            .json()
            .await
            .map_err(Error::service("course"))
    }

    pub async fn get_course(&self, course_id: i64) -> Result<Course> {
        self.http
            .get(format!("{}/courses/api/v1/courses/{course_id}", self.base))
            .send()
            .await
            .map_err(Error::service("course"))?
            .error_for_status()
            .map_err(Error::service("course"))?
            .json()
            .await
            .map_err(Error::service("course"))
    }

    pub async fn list_materials(&self, course_id: i64) -> Result<Vec<Material>> {
        self.http
            .get(format!(
                "{}/courses/api/v1/vle-materials/course/{course_id}",
                self.base
            ))
            .send()
            .await
            .map_err(Error::service("course"))?
            .error_for_status()
            .map_err(Error::service("course"))?
            .json()
            .await
            .map_err(Error::service("course"))
    }

    /// Server-side enrollment ("follow"). Best-effort from the caller's
    /// point of view: local enrollment state is written regardless.
    pub async fn follow(&self, course_id: i64) -> Result<()> {
        self.http
            .post(format!(
                "{}/courses/api/v1/courses/{course_id}/follow",
                self.base
            ))
            .send()
            .await
            .map_err(Error::service("course"))?
            .error_for_status()
            .map_err(Error::service("course"))?;
        Ok(())
    }

    pub async fn create_course(&self, course: &CourseUpsert) -> Result<Course> {
        self.http
            .post(format!("{}/courses/api/v1/courses", self.base))
            .json(course)
            .send()
            .await
            .map_err(Error::service("course"))?
            .error_for_status()
            .map_err(Error::service("course"))?
            .json()
            .await
            .map_err(Error::service("course"))
    }

    pub async fn update_course(&self, course_id: i64, course: &CourseUpsert) -> Result<Course> {
        self.http
            .put(format!("{}/courses/api/v1/courses/{course_id}", self.base))
            .json(course)
            .send()
            .await
            .map_err(Error::service("course"))?
            .error_for_status()
            .map_err(Error::service("course"))?
            .json()
            .await
            .map_err(Error::service("course"))
    }

    pub async fn delete_course(&self, course_id: i64) -> Result<()> {
        self.http
            .delete(format!("{}/courses/api/v1/courses/{course_id}", self.base))
            .send()
            .await
            .map_err(Error::service("course"))?
            .error_for_status()
            .map_err(Error::service("course"))?;
        Ok(())
    }
}

impl CourseDirectory for CourseClient {
    fn list_courses(&self) -> impl Future<Output = Result<Vec<Course>>> + Send {
        CourseClient::list_courses(self)
    }
}

impl CourseFollow for CourseClient {
    fn follow(&self, course_id: i64) -> impl Future<Output = Result<()>> + Send {
        CourseClient::follow(self, course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_body_is_camel_case() {
        let course = CourseUpsert {
            title: "Rust 101".to_string(),
            course_code: "CS101".to_string(),
            module_code: "AAA".to_string(),
            description: "intro".to_string(),
            presentation_length: None,
        };
        let value = serde_json::to_value(&course).unwrap();
        assert_eq!(value["courseCode"], "CS101");
        assert_eq!(value["moduleCode"], "AAA");
        // unset optional fields stay off the wire
        assert!(value.get("presentationLength").is_none());

        let course = CourseUpsert {
            presentation_length: Some("8h".to_string()),
            ..course
        };
        let value = serde_json::to_value(&course).unwrap();
        assert_eq!(value["presentationLength"], "8h");
    }
}
