use chrono::NaiveDate;

use crate::api::types::{
    AuthResponse, BodyMetric, DailyMetrics, LogMealRequest, LoginRequest, Meal, MetricsRange,
    NutritionTargets, RegisterRequest, UserProfile,
};
use crate::api::ApiClient;
use crate::errors::{SmartPlateError, SmartPlateResult};
use crate::session::{Session, SessionStore};

/// Targets plus the day's meals, the data behind the dashboard view.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub targets: NutritionTargets,
    pub meals: Vec<Meal>,
}

/// Application facade: the session store is the single source of truth for
/// auth state, and every authenticated call funnels through one place that
/// clears the session when the API answers 401. Callers never have to
/// remember the logout-on-401 rule themselves.
pub struct App {
    store: SessionStore,
    client: ApiClient,
}

impl App {
    pub fn new(store: SessionStore, client: ApiClient) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Currently stored session, if any.
    pub fn session(&self) -> Option<Session> {
        self.store.load()
    }

    // --- auth lifecycle ---

    pub async fn login(&self, email: &str, password: &str) -> SmartPlateResult<Session> {
        let auth = self
            .client
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.remember(auth)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> SmartPlateResult<Session> {
        let auth = self
            .client
            .register(&RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.remember(auth)
    }

    pub fn logout(&self) {
        self.store.clear();
        tracing::info!("logged out");
    }

    fn remember(&self, auth: AuthResponse) -> SmartPlateResult<Session> {
        let session = Session {
            name: auth.name,
            email: auth.email,
            token: auth.token,
        };
        self.store.persist(&session)?;
        tracing::info!(email = %session.email, "session established");
        Ok(session)
    }

    fn token(&self) -> SmartPlateResult<String> {
        self.store
            .load()
            .map(|s| s.token)
            .ok_or(SmartPlateError::Unauthorized)
    }

    /// On 401 the stored session is dead; drop it before propagating so the
    /// caller (and every later caller) observes the logged-out state.
    fn guard<T>(&self, result: SmartPlateResult<T>) -> SmartPlateResult<T> {
        if matches!(result, Err(SmartPlateError::Unauthorized)) {
            self.store.clear();
        }
        result
    }

    // --- profile ---

    pub async fn profile(&self) -> SmartPlateResult<UserProfile> {
        let token = self.token()?;
        self.guard(self.client.profile(&token).await)
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> SmartPlateResult<UserProfile> {
        let token = self.token()?;
        self.guard(self.client.save_profile(&token, profile).await)
    }

    // --- targets ---

    pub async fn targets(&self) -> SmartPlateResult<NutritionTargets> {
        let token = self.token()?;
        self.guard(self.client.targets(&token).await)
    }

    pub async fn generate_targets(&self) -> SmartPlateResult<NutritionTargets> {
        let token = self.token()?;
        self.guard(self.client.generate_targets(&token).await)
    }

    pub async fn set_targets(
        &self,
        targets: &NutritionTargets,
    ) -> SmartPlateResult<NutritionTargets> {
        let token = self.token()?;
        self.guard(self.client.override_targets(&token, targets).await)
    }

    // --- meals ---

    pub async fn log_meal(&self, req: &LogMealRequest) -> SmartPlateResult<Meal> {
        let token = self.token()?;
        self.guard(self.client.log_meal(&token, req).await)
    }

    pub async fn meals_on(&self, date: NaiveDate) -> SmartPlateResult<Vec<Meal>> {
        let token = self.token()?;
        self.guard(self.client.meals_for_date(&token, date).await)
    }

    pub async fn meal(&self, meal_id: &str) -> SmartPlateResult<Meal> {
        let token = self.token()?;
        self.guard(self.client.meal_by_id(&token, meal_id).await)
    }

    pub async fn delete_meal(&self, meal_id: &str) -> SmartPlateResult<()> {
        let token = self.token()?;
        self.guard(self.client.delete_meal(&token, meal_id).await)
    }

    // --- metrics ---

    pub async fn meal_metrics(&self, range: MetricsRange) -> SmartPlateResult<Vec<DailyMetrics>> {
        let token = self.token()?;
        self.guard(self.client.meal_metrics(&token, range).await)
    }

    pub async fn body_metrics(&self, range: MetricsRange) -> SmartPlateResult<Vec<BodyMetric>> {
        let token = self.token()?;
        self.guard(self.client.body_metrics(&token, range).await)
    }

    // --- composed views ---

    /// The dashboard needs targets and the day's meals. A user who has not
    /// generated targets yet gets them generated on the fly; auth failures
    /// are never swallowed by that fallback.
    pub async fn dashboard(&self, date: NaiveDate) -> SmartPlateResult<Dashboard> {
        let targets = match self.targets().await {
            Ok(t) => t,
            Err(SmartPlateError::Unauthorized) => return Err(SmartPlateError::Unauthorized),
            Err(e) => {
                tracing::info!(error = %e, "no stored targets, generating");
                self.generate_targets().await?
            }
        };
        let meals = self.meals_on(date).await?;
        Ok(Dashboard {
            date,
            targets,
            meals,
        })
    }
}
