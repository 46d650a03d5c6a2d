use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{
    AiHealth, Prediction, PredictionRequest, Recommendation, RecommendationResponse,
};

/// Client for the independent AI microservice. Lives at its own base
/// address, bypassing the gateway, and everything it offers is an optional
/// enhancement: callers must keep working when it is down.
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    http: reqwest::Client,
    base: String,
}

impl AnalyticsClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
        }
    }

    pub async fn predict(&self, student_id: i64, module_code: &str) -> Result<Prediction> {
        self.http
            .post(format!("{}/predict", self.base))
            .json(&PredictionRequest {
                student_id,
                module_code: module_code.to_string(),
            })
            .send()
            .await
            .map_err(Error::service("ai"))?
            .error_for_status()
            .map_err(Error::service("ai"))?
            .json()
            .await
            .map_err(Error::service("ai"))
    }

    pub async fn recommendations(
        &self,
        student_id: i64,
        module_code: &str,
    ) -> Result<Vec<Recommendation>> {
        let response: RecommendationResponse = self
            .http
            .get(format!("{}/reco/{student_id}/{module_code}", self.base))
            .send()
            .await
            .map_err(Error::service("ai"))?
            .error_for_status()
            .map_err(Error::service("ai"))?
            .json()
            .await
            .map_err(Error::service("ai"))?;
        Ok(response.recommendations)
    }

    /// Health probe. Never errors: an unreachable service reads as
    /// unavailable and the caller renders the degraded state.
    pub async fn health(&self) -> AiHealth {
        let result = async {
            self.http
                .get(format!("{}/health", self.base))
                .send()
                .await?
                .error_for_status()?
                .json::<AiHealth>()
                .await
        }
        .await;
        match result {
            Ok(health) => health,
            Err(e) => {
                warn!("AI service health check failed: {e}");
                AiHealth::unavailable()
            }
        }
    }
}
