use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{ProfileUpdate, TokenResponse, User};

use super::gateway_http;

/// Client for the user directory service behind the gateway.
#[derive(Debug, Clone)]
pub struct UserClient {
    http: reqwest::Client,
    base: String,
}

impl UserClient {
    pub fn new(base: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            http: gateway_http(token),
            base: base.into(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        self.http
            .post(format!("{}/users/auth/login", self.base))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(Error::service("user"))?
            .error_for_status()
            .map_err(Error::service("user"))?
            .json()
            .await
            .map_err(Error::service("user"))
    }

    /// Identity of the current session. A failure here is a hard failure:
    /// nothing user-scoped can proceed without it.
    pub async fn get_me(&self) -> Result<User> {
        self.http
            .get(format!("{}/users/api/user/me", self.base))
            .send()
            .await
            .map_err(Error::service("user"))?
            .error_for_status()
            .map_err(Error::service("user"))?
            .json()
            .await
            .map_err(Error::service("user"))
    }

    /// Full roster for the admin views. Degrades to empty on failure, the
    /// way the dashboard does.
    pub async fn list_students(&self) -> Vec<User> {
        let result: Result<Vec<User>> = async {
            self.http
                .get(format!("{}/users/auth", self.base))
                .send()
                .await
                .map_err(Error::service("user"))?
                .error_for_status()
                .map_err(Error::service("user"))?
                .json()
                .await
                .map_err(Error::service("user"))
        }
        .await;
        match result {
            Ok(users) => users,
            Err(e) => {
                warn!("listing students failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        self.http
            .get(format!("{}/users/api/user/{user_id}", self.base))
            .send()
            .await
            .map_err(Error::service("user"))?
            .error_for_status()
            .map_err(Error::service("user"))?
            .json()
            .await
            .map_err(Error::service("user"))
    }

    pub async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<User> {
        self.http
            .put(format!("{}/users/api/user/{user_id}", self.base))
            .json(update)
            .send()
            .await
            .map_err(Error::service("user"))?
            .error_for_status()
            .map_err(Error::service("user"))?
            .json()
            .await
            .map_err(Error::service("user"))
    }
}
