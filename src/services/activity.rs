use crate::error::{Error, Result};
use crate::models::Activity;

use super::{ActivityFeed, gateway_http};

/// Client for the click-tracking service behind the gateway. Everything
/// here is a soft signal; callers tolerate failures as "no signal".
#[derive(Debug, Clone)]
pub struct ActivityClient {
    http: reqwest::Client,
    base: String,
}

impl ActivityClient {
    pub fn new(base: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            http: gateway_http(token),
            base: base.into(),
        }
    }

    pub async fn list_for_student(&self, student_id: i64) -> Result<Vec<Activity>> {
        self.http
            .get(format!(
                "{}/activities/api/activities/student/{student_id}",
                self.base
            ))
            .send()
            .await
            .map_err(Error::service("activity"))?
            .error_for_status()
            .map_err(Error::service("activity"))?
            .json()
            .await
            .map_err(Error::service("activity"))
    }

    pub async fn list_all(&self) -> Result<Vec<Activity>> {
        self.http
            .get(format!("{}/activities/api/activities", self.base))
            .send()
            .await
            .map_err(Error::service("activity"))?
            .error_for_status()
            .map_err(Error::service("activity"))?
            .json()
            .await
            .map_err(Error::service("activity"))
    }

    /// Record one material click. Fired on navigation and never awaited for
    /// anything: an error only means a weaker inference signal later.
    pub async fn increment_clicks(
        &self,
        student_id: i64,
        course_code: &str,
        module_code: &str,
        date: &str,
    ) -> Result<()> {
        self.http
            .post(format!("{}/activities/api/activities/increment", self.base))
            .query(&[
                ("studentId", student_id.to_string()),
                ("courseCode", course_code.to_string()),
                ("moduleCode", module_code.to_string()),
                ("date", date.to_string()),
                ("clicks", "1".to_string()),
            ])
            .send()
            .await
            .map_err(Error::service("activity"))?
            .error_for_status()
            .map_err(Error::service("activity"))?;
        Ok(())
    }
}

impl ActivityFeed for ActivityClient {
    fn list_for_student(
        &self,
        student_id: i64,
    ) -> impl Future<Output = Result<Vec<Activity>>> + Send {
        ActivityClient::list_for_student(self, student_id)
    }
}
