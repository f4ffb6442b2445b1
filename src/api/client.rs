use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::api::types::{
    AuthResponse, BodyMetric, DailyMetrics, DeleteMealRequest, LogMealRequest, LoginRequest, Meal,
    MetricsRange, NutritionTargets, RegisterRequest, UserProfile,
};
use crate::errors::{SmartPlateError, SmartPlateResult};

/// Thin typed client over the SmartPlate HTTP API. One function per remote
/// operation; no retries, no caching, platform-default timeouts. Every call
/// is independent and at-most-once from the client's perspective.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // --- auth ---

    pub async fn register(&self, req: &RegisterRequest) -> SmartPlateResult<AuthResponse> {
        tracing::debug!(email = %req.email, "POST /auth/register");
        let resp = self
            .http
            .post(self.url("/auth/register"))
            .json(req)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    pub async fn login(&self, req: &LoginRequest) -> SmartPlateResult<AuthResponse> {
        tracing::debug!(email = %req.email, "POST /auth/login");
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(req)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    // --- profile ---

    pub async fn profile(&self, token: &str) -> SmartPlateResult<UserProfile> {
        tracing::debug!("GET /user/userdata");
        let resp = self
            .http
            .get(self.url("/user/userdata"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    pub async fn save_profile(
        &self,
        token: &str,
        profile: &UserProfile,
    ) -> SmartPlateResult<UserProfile> {
        tracing::debug!("POST /user/userdata");
        let resp = self
            .http
            .post(self.url("/user/userdata"))
            .bearer_auth(token)
            .json(profile)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    // --- nutrition targets ---

    pub async fn targets(&self, token: &str) -> SmartPlateResult<NutritionTargets> {
        tracing::debug!("GET /userinsights/userinsights");
        let resp = self
            .http
            .get(self.url("/userinsights/userinsights"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    /// Ask the server to derive fresh targets from the stored profile. The
    /// body is an empty object; the computation happens server-side.
    pub async fn generate_targets(&self, token: &str) -> SmartPlateResult<NutritionTargets> {
        tracing::debug!("POST /userinsights/userinsights");
        let resp = self
            .http
            .post(self.url("/userinsights/userinsights"))
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    /// Manual override: replaces the server-generated targets wholesale.
    pub async fn override_targets(
        &self,
        token: &str,
        targets: &NutritionTargets,
    ) -> SmartPlateResult<NutritionTargets> {
        tracing::debug!("PUT /userinsights/userinsights");
        let resp = self
            .http
            .put(self.url("/userinsights/userinsights"))
            .bearer_auth(token)
            .json(targets)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    // --- meals ---

    pub async fn log_meal(&self, token: &str, req: &LogMealRequest) -> SmartPlateResult<Meal> {
        // The base64 photo payload is deliberately not logged.
        tracing::debug!(
            meal = %req.meal_name,
            has_image = req.image_bytes.is_some(),
            manual = req.calories.is_some(),
            "POST /usermeals/usermeal"
        );
        let resp = self
            .http
            .post(self.url("/usermeals/usermeal"))
            .bearer_auth(token)
            .json(req)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    pub async fn meals_for_date(
        &self,
        token: &str,
        date: NaiveDate,
    ) -> SmartPlateResult<Vec<Meal>> {
        tracing::debug!(date = %date, "GET /usermeals/usermeal");
        let resp = self
            .http
            .get(self.url("/usermeals/usermeal"))
            .query(&[("Date", date.format("%Y-%m-%d").to_string())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    /// Single meal with the AI explanation and advice attached.
    pub async fn meal_by_id(&self, token: &str, meal_id: &str) -> SmartPlateResult<Meal> {
        tracing::debug!(meal_id = %meal_id, "GET /usermeals/usermealById");
        let resp = self
            .http
            .get(self.url("/usermeals/usermealById"))
            .query(&[("MealId", meal_id)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    pub async fn delete_meal(&self, token: &str, meal_id: &str) -> SmartPlateResult<()> {
        tracing::debug!(meal_id = %meal_id, "DELETE /usermeals/usermeal");
        let resp = self
            .http
            .delete(self.url("/usermeals/usermeal"))
            .bearer_auth(token)
            .json(&DeleteMealRequest {
                meal_id: meal_id.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await.map(|_| ())
    }

    // --- metrics ---

    pub async fn meal_metrics(
        &self,
        token: &str,
        range: MetricsRange,
    ) -> SmartPlateResult<Vec<DailyMetrics>> {
        tracing::debug!(range = %range, "GET /usermetrics/mealmetrics");
        let resp = self
            .http
            .get(self.url("/usermetrics/mealmetrics"))
            .query(&[("Range", range.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }

    pub async fn body_metrics(
        &self,
        token: &str,
        range: MetricsRange,
    ) -> SmartPlateResult<Vec<BodyMetric>> {
        tracing::debug!(range = %range, "GET /usermetrics/bodymetrics");
        let resp = self
            .http
            .get(self.url("/usermetrics/bodymetrics"))
            .query(&[("Range", range.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        handle_response(resp).await
    }
}

fn transport_error(e: reqwest::Error) -> SmartPlateError {
    SmartPlateError::RequestFailed {
        status: None,
        message: e.to_string(),
    }
}

/// Uniform status handling: 401 becomes `Unauthorized` (the sole
/// re-authentication signal), any other non-2xx becomes `RequestFailed`
/// carrying the server's `message` field when the error body has one.
async fn check_status(resp: reqwest::Response) -> SmartPlateResult<reqwest::Response> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        tracing::warn!("API answered 401");
        return Err(SmartPlateError::Unauthorized);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });
        tracing::warn!(status = status.as_u16(), message = %message, "API request failed");
        return Err(SmartPlateError::RequestFailed {
            status: Some(status.as_u16()),
            message,
        });
    }
    Ok(resp)
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> SmartPlateResult<T> {
    let resp = check_status(resp).await?;
    let status = resp.status().as_u16();
    resp.json::<T>()
        .await
        .map_err(|e| SmartPlateError::RequestFailed {
            status: Some(status),
            message: format!("invalid response body: {e}"),
        })
}
