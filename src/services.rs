pub mod activity;
pub mod analytics;
pub mod assessment;
pub mod course;
pub mod user;

use crate::error::Result;
use crate::models::{Activity, Course};

/// Catalog lookup, the one remote call the enrollment reconciler cannot
/// work without.
pub trait CourseDirectory {
    fn list_courses(&self) -> impl Future<Output = Result<Vec<Course>>> + Send;
}

/// Best-effort activity signals; callers treat a failure as an empty feed.
pub trait ActivityFeed {
    fn list_for_student(&self, student_id: i64)
    -> impl Future<Output = Result<Vec<Activity>>> + Send;
}

/// Server-side enrollment call. Best-effort from the client's view: local
/// enrollment state is written whether or not it succeeds.
pub trait CourseFollow {
    fn follow(&self, course_id: i64) -> impl Future<Output = Result<()>> + Send;
}

/// Shared client for the gateway services, with the bearer token baked into
/// the default headers when one is known.
pub(crate) fn gateway_http(token: Option<&str>) -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(token) = token
        && let Ok(value) = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
    {
        headers.insert(reqwest::header::AUTHORIZATION, value);
    }
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .expect("build http client failed")
}
