//! Client-side core of the nutrition log: tolerant normalization of food
//! records, mass scaling, and the per-meal session ledger reconciled against
//! the server's daily calorie snapshot.
//!
//! Remote collaborators sit behind the [`NutritionClient`] trait; the
//! reqwest-based implementation lives in [`http_client`].

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod ledger;
pub mod normalize;
pub mod retry;
pub mod scaling;
pub mod session;
pub mod suggestions;
pub mod utils;

pub use ledger::{DailyCalorieView, LedgerEntry, LedgerState, MealTime, MealTotals, SessionLedger};
pub use normalize::NutrientProfile;
pub use session::{CommitReceipt, LedgerSummary, MealSession, SearchOutcome};

#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected by server: {0}")]
    InvalidInput(String),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("a commit is already in flight")]
    CommitInProgress,
    #[error("decoding response: {0}")]
    Decode(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl NutritionError {
    /// Network-level failures the user can retry without re-entering data.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            NutritionError::Http(_) | NutritionError::Timeout(_) | NutritionError::Api { .. }
        )
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, NutritionError::Unauthenticated(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NutritionError::Validation(_) | NutritionError::CommitInProgress
        )
    }

    /// Whether an idempotent lookup may be retried after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            NutritionError::Http(e) => !e.is_decode() && !e.is_builder(),
            NutritionError::Timeout(_) => true,
            NutritionError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A candidate returned by the food-name search, already normalized.
#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
pub struct FoodSuggestion {
    #[serde(rename = "fdcId")]
    pub fdc_id: i64,
    #[serde(flatten)]
    pub profile: NutrientProfile,
}

/// Authoritative daily totals as reported by the server.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct DailyCalorieSnapshot {
    pub calorie_target: f64,
    pub total_calories_consumed: f64,
    pub calories_left_for_day: f64,
}

/// One food as submitted in a meal log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct LoggedFood {
    pub name: String,
    pub calories: f64,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FoodLogRequest {
    #[serde(rename = "mealTime")]
    pub meal_time: MealTime,
    pub foods: Vec<LoggedFood>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FoodLogAck {
    #[serde(default)]
    pub message: String,
}

/// Body/health data forwarded to the remote metabolic calculator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ProfileSubmission {
    /// Body weight in kilograms
    pub weight: f64,
    /// Height in centimetres
    pub height: f64,
    pub age: u32,
    pub gender: String,
    #[serde(rename = "weightGoal", default, skip_serializing_if = "Option::is_none")]
    pub weight_goal: Option<String>,
    #[serde(rename = "dietType", default, skip_serializing_if = "Option::is_none")]
    pub diet_type: Option<String>,
    #[serde(
        rename = "healthConditions",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub health_conditions: Vec<String>,
}

/// Values derived remotely from a [`ProfileSubmission`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ProfileMetrics {
    #[serde(default)]
    pub message: String,
    pub bmi: f64,
    pub bmr: f64,
    #[serde(rename = "profileId", default)]
    pub profile_id: String,
}

#[async_trait]
pub trait NutritionClient: Send + Sync + 'static {
    /// Look up foods whose name contains `query`.
    async fn search_foods(&self, query: &str) -> Result<Vec<FoodSuggestion>, NutritionError>;

    /// Fetch the full per-100g record for one food.
    async fn get_food_detail(&self, fdc_id: i64) -> Result<NutrientProfile, NutritionError>;

    /// Fetch today's target and consumption.
    async fn get_daily_calories(&self) -> Result<DailyCalorieSnapshot, NutritionError>;

    /// Persist a finalized meal.
    async fn add_food_log(&self, request: &FoodLogRequest) -> Result<FoodLogAck, NutritionError>;

    /// Submit body data and receive the remotely computed BMI/BMR.
    async fn submit_profile(
        &self,
        profile: &ProfileSubmission,
    ) -> Result<ProfileMetrics, NutritionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn food_log_request_uses_wire_names() {
        let req = FoodLogRequest {
            meal_time: MealTime::Snack,
            foods: vec![LoggedFood {
                name: "Apple".into(),
                calories: 104.0,
                fat: 0.4,
                carbs: 28.0,
                protein: 0.6,
            }],
        };
        let v = serde_json::to_value(&req).expect("serialize");
        assert_eq!(v["mealTime"], "snack");
        assert_eq!(v["foods"][0]["name"], "Apple");
        assert_eq!(v["foods"][0]["carbs"], 28.0);
    }

    #[test]
    fn profile_submission_omits_unset_optionals() {
        let p = ProfileSubmission {
            weight: 70.0,
            height: 175.0,
            age: 30,
            gender: "Male".into(),
            weight_goal: None,
            diet_type: Some("vegetarian".into()),
            health_conditions: vec![],
        };
        let v = serde_json::to_value(&p).expect("serialize");
        assert!(v.get("weightGoal").is_none());
        assert!(v.get("healthConditions").is_none());
        assert_eq!(v["dietType"], "vegetarian");
    }

    #[test]
    fn suggestion_flattens_profile_fields() {
        let s = FoodSuggestion {
            fdc_id: 7,
            profile: NutrientProfile::new("Pear", 57.0, 0.1, 15.0, 0.4),
        };
        let v = serde_json::to_value(&s).expect("serialize");
        assert_eq!(v, json!({"fdcId": 7, "name": "Pear", "calories": 57.0, "total_fat": 0.1, "carbohydrate": 15.0, "protein": 0.4}));
    }

    #[test]
    fn error_classification() {
        assert!(NutritionError::Timeout("x".into()).is_transport());
        assert!(NutritionError::Timeout("x".into()).is_transient());
        assert!(
            NutritionError::Api {
                status: 503,
                message: "down".into()
            }
            .is_transient()
        );
        assert!(
            !NutritionError::Api {
                status: 500,
                message: "x".into()
            }
            .is_validation()
        );
        assert!(!NutritionError::Unauthenticated("x".into()).is_transient());
        assert!(NutritionError::Unauthenticated("x".into()).is_unauthenticated());
        assert!(NutritionError::CommitInProgress.is_validation());
        assert!(!NutritionError::NotFound("x".into()).is_transient());
    }
}
