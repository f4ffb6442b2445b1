//! Wire models for the SmartPlate API.
//!
//! The service is not consistent about casing: profile and meal-logging
//! request bodies are camelCase, while insight and metric responses (and the
//! macro fields of a returned meal) are snake_case. Rust field names are
//! snake_case throughout and every divergent wire name is pinned with an
//! explicit serde rename, so the structs document the contract as it actually
//! is instead of papering over it.

use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{SmartPlateError, SmartPlateResult};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Returned by both auth endpoints; this is exactly what gets persisted as
/// the local session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub name: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiologicalSex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingType {
    Strength,
    Cardio,
    Crossfit,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingIntensity {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DailyActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    WeightLoss,
    Maintenance,
    MuscleGain,
}

/// Biometric and lifestyle inputs the server derives nutrition targets from.
/// Ratings (`sleep_quality`, `stress_level`, `routine_consistency`) are 1–5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub biological_sex: BiologicalSex,
    pub workouts_per_week: u32,
    pub training_type: TrainingType,
    pub training_intensity: TrainingIntensity,
    pub daily_activity_level: DailyActivityLevel,
    pub goal: Goal,
    pub sleep_quality: u8,
    pub stress_level: u8,
    pub routine_consistency: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_notes: Option<String>,
}

/// Daily targets, either server-generated from the profile or manually
/// overridden by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub target_calories: f64,
    pub protein_target_g: f64,
    pub carbs_target_g: f64,
    pub fat_target_g: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours_target: Option<f64>,
}

/// A logged eating event as the server returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    #[serde(rename = "mealName")]
    pub meal_name: String,
    #[serde(default)]
    pub description: String,
    pub meal_date: NaiveDate,
    pub meal_time: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// AI reasoning for the macro estimate; only present on the detail view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

/// Macro values for the manual logging path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualMacros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Body of `POST /usermeals/usermeal`. One shape covers both paths: the AI
/// path sends `imageBytes`, the manual path sends explicit macro fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMealRequest {
    pub meal_name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_bytes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
}

impl LogMealRequest {
    fn base(meal_name: &str, description: &str) -> SmartPlateResult<Self> {
        if meal_name.trim().is_empty() {
            return Err(SmartPlateError::InvalidRequest(
                "meal name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            meal_name: meal_name.to_string(),
            description: description.to_string(),
            image_bytes: None,
            meal_date: None,
            calories: None,
            protein_g: None,
            carbs_g: None,
            fat_g: None,
        })
    }

    /// AI path: the photo is base64-encoded into the JSON body and the
    /// server estimates the macros.
    pub fn photo(meal_name: &str, description: &str, image: &[u8]) -> SmartPlateResult<Self> {
        let mut req = Self::base(meal_name, description)?;
        req.image_bytes = Some(base64::engine::general_purpose::STANDARD.encode(image));
        Ok(req)
    }

    /// Manual path: the caller supplies the macros. Negative values are
    /// rejected here so they never reach the wire.
    pub fn manual(
        meal_name: &str,
        description: &str,
        macros: ManualMacros,
    ) -> SmartPlateResult<Self> {
        let fields = [
            ("calories", macros.calories),
            ("protein", macros.protein_g),
            ("carbs", macros.carbs_g),
            ("fat", macros.fat_g),
        ];
        for (label, value) in fields {
            if value < 0.0 || !value.is_finite() {
                return Err(SmartPlateError::InvalidRequest(format!(
                    "{label} must be a non-negative number, got {value}"
                )));
            }
        }
        let mut req = Self::base(meal_name, description)?;
        req.calories = Some(macros.calories);
        req.protein_g = Some(macros.protein_g);
        req.carbs_g = Some(macros.carbs_g);
        req.fat_g = Some(macros.fat_g);
        Ok(req)
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.meal_date = Some(date);
        self
    }
}

/// Body of `DELETE /usermeals/usermeal`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteMealRequest {
    #[serde(rename = "MealId")]
    pub meal_id: String,
}

/// One day of aggregated meal totals, as the history charts consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub meal_date: NaiveDate,
    pub calories_total: f64,
    pub protein_g_total: f64,
    pub carbs_g_total: f64,
    pub fat_g_total: f64,
}

/// One body-weight entry in the historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMetric {
    pub entry_date: NaiveDate,
    pub weight_kg: f64,
}

/// Window for the metrics endpoints, the `Range` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsRange {
    Week,
    Month,
}

impl MetricsRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl std::fmt::Display for MetricsRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricsRange {
    type Err = SmartPlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(SmartPlateError::InvalidRequest(format!(
                "unknown range '{other}', expected 'week' or 'month'"
            ))),
        }
    }
}
