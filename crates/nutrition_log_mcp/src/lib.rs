use std::sync::Arc;

use rmcp::Json;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use nutrition_log_client::{
    CommitReceipt, DailyCalorieView, FoodSuggestion, LedgerEntry, LedgerSummary, MealSession,
    MealTime, NutrientProfile, ProfileMetrics, ProfileSubmission, SearchOutcome,
};

pub mod error;
pub mod grams;

use error::McpError;
use grams::GramsInput;

#[derive(Clone)]
pub struct NutritionMcpHandler {
    session: Arc<MealSession>,
    tool_router: rmcp::handler::server::tool::ToolRouter<NutritionMcpHandler>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchParams {
    /// Partial food name; an empty query clears the suggestions
    pub query: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchResult {
    /// `applied`, `superseded` or `cleared`
    pub status: String,
    pub suggestions: Vec<FoodSuggestion>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FdcIdParam {
    pub fdc_id: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SelectedFood {
    pub fdc_id: i64,
    pub profile: NutrientProfile,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct AddItemParams {
    /// Mass in grams, as a number or text like "150g"
    pub grams: GramsInput,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AddItemResult {
    pub entry: LedgerEntry,
    pub ledger: LedgerSummary,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct MealTimeParam {
    /// breakfast, lunch, dinner or snack
    pub meal_time: String,
}

fn tool_error(err: impl Into<McpError>) -> String {
    let err = err.into();
    tracing::warn!(kind = err.kind(), error = %err, "tool call failed");
    err.into()
}

#[tool_router]
impl NutritionMcpHandler {
    pub fn new(session: Arc<MealSession>) -> Self {
        Self {
            session,
            tool_router: Self::tool_router(),
        }
    }

    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    #[tool(
        name = "search_foods",
        description = "Search foods by partial name. Only the latest search updates the suggestion list."
    )]
    async fn search_foods(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<Json<SearchResult>, String> {
        let outcome = self
            .session
            .search(&params.0.query)
            .await
            .map_err(tool_error)?;
        let (status, suggestions) = match outcome {
            SearchOutcome::Applied(list) => ("applied", list),
            SearchOutcome::Superseded => ("superseded", Vec::new()),
            SearchOutcome::Cleared => ("cleared", Vec::new()),
        };
        Ok(Json(SearchResult {
            status: status.to_string(),
            suggestions,
        }))
    }

    #[tool(
        name = "select_food",
        description = "Fetch per-100g nutrients for a food and make it the current selection"
    )]
    async fn select_food(
        &self,
        params: Parameters<FdcIdParam>,
    ) -> Result<Json<SelectedFood>, String> {
        let fdc_id = params.0.fdc_id;
        if fdc_id <= 0 {
            return Err(tool_error(McpError::Validation(format!(
                "fdc_id must be positive, got {fdc_id}"
            ))));
        }
        let profile = self.session.select(fdc_id).await.map_err(tool_error)?;
        Ok(Json(SelectedFood { fdc_id, profile }))
    }

    #[tool(
        name = "add_food_item",
        description = "Scale the selected food to the given grams and add it to the current meal"
    )]
    async fn add_food_item(
        &self,
        params: Parameters<AddItemParams>,
    ) -> Result<Json<AddItemResult>, String> {
        let grams = params.0.grams.to_grams().map_err(tool_error)?;
        let entry = self
            .session
            .add_selected(grams)
            .await
            .map_err(tool_error)?;
        let ledger = self.session.summary().await;
        Ok(Json(AddItemResult { entry, ledger }))
    }

    #[tool(name = "set_meal_time", description = "Choose the meal the entries belong to")]
    async fn set_meal_time(
        &self,
        params: Parameters<MealTimeParam>,
    ) -> Result<Json<LedgerSummary>, String> {
        let meal_time: MealTime = params.0.meal_time.parse().map_err(tool_error)?;
        self.session
            .set_meal_time(meal_time)
            .await
            .map_err(tool_error)?;
        Ok(Json(self.session.summary().await))
    }

    #[tool(
        name = "get_meal_ledger",
        description = "Show the uncommitted meal, its totals and the daily calorie view"
    )]
    async fn get_meal_ledger(&self) -> Result<Json<LedgerSummary>, String> {
        Ok(Json(self.session.summary().await))
    }

    #[tool(
        name = "commit_meal",
        description = "Submit the current meal as one food log. Entries are kept if the submission fails."
    )]
    async fn commit_meal(&self) -> Result<Json<CommitReceipt>, String> {
        let receipt = self.session.commit().await.map_err(tool_error)?;
        Ok(Json(receipt))
    }

    #[tool(name = "reset_meal", description = "Discard the uncommitted meal")]
    async fn reset_meal(&self) -> Result<Json<LedgerSummary>, String> {
        self.session.reset().await.map_err(tool_error)?;
        Ok(Json(self.session.summary().await))
    }

    #[tool(
        name = "get_daily_calories",
        description = "Refresh today's calorie target, consumption and remaining budget"
    )]
    async fn get_daily_calories(&self) -> Result<Json<DailyCalorieView>, String> {
        let view = self
            .session
            .refresh_daily_view()
            .await
            .map_err(tool_error)?;
        Ok(Json(view))
    }

    #[tool(
        name = "submit_profile",
        description = "Send body and health data; returns BMI and BMR computed by the server"
    )]
    async fn submit_profile(
        &self,
        params: Parameters<ProfileSubmission>,
    ) -> Result<Json<ProfileMetrics>, String> {
        let metrics = self
            .session
            .submit_profile(&params.0)
            .await
            .map_err(tool_error)?;
        Ok(Json(metrics))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for NutritionMcpHandler {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo::new(
            rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
        )
        .with_instructions(
            "Nutrition log MCP server - search foods, build a meal by mass, \
             and log it against today's calorie budget.",
        )
    }
}
