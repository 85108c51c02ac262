//! One meal-entry session driven against a [`NutritionClient`].
//!
//! [`MealSession`] owns the ledger, the suggestion list and the current
//! selection. Methods take `&self` so lookups may overlap; locks are never
//! held across a remote call. Every remote call is bounded by the session
//! timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::ledger::{
    DailyCalorieView, LedgerEntry, LedgerState, MealTime, MealTotals, PendingCommit, SessionLedger,
};
use crate::normalize::NutrientProfile;
use crate::suggestions::SuggestionBoard;
use crate::{FoodSuggestion, NutritionClient, NutritionError, ProfileMetrics, ProfileSubmission};

#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
#[serde(tag = "status", content = "suggestions", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The response was current and now backs the suggestion list.
    Applied(Vec<FoodSuggestion>),
    /// A newer search was issued while this one was in flight.
    Superseded,
    /// The query was empty; the list was cleared without a lookup.
    Cleared,
}

#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
pub struct LedgerSummary {
    pub state: LedgerState,
    pub meal_time: Option<MealTime>,
    pub entries: Vec<LedgerEntry>,
    pub totals: MealTotals,
    pub view: DailyCalorieView,
    pub selected: Option<NutrientProfile>,
}

#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
pub struct CommitReceipt {
    pub message: String,
    pub meal_time: MealTime,
    pub committed_entries: usize,
    pub view: DailyCalorieView,
    /// `false` when the meal was stored but fresh totals could not be
    /// fetched; `view` is then a local projection.
    pub snapshot_refreshed: bool,
}

#[derive(Debug, Default)]
struct Selection {
    issued: u64,
    profile: Option<NutrientProfile>,
}

pub struct MealSession {
    client: Arc<dyn NutritionClient>,
    ledger: Arc<Mutex<SessionLedger>>,
    board: Mutex<SuggestionBoard>,
    selection: Mutex<Selection>,
    timeout: Duration,
}

impl MealSession {
    pub fn new(client: Arc<dyn NutritionClient>, view: DailyCalorieView, timeout: Duration) -> Self {
        Self {
            client,
            ledger: Arc::new(Mutex::new(SessionLedger::new(view))),
            board: Mutex::new(SuggestionBoard::new()),
            selection: Mutex::new(Selection::default()),
            timeout,
        }
    }

    /// Start a session from the server's current daily totals.
    pub async fn load(
        client: Arc<dyn NutritionClient>,
        timeout: Duration,
    ) -> Result<Self, NutritionError> {
        let snapshot = bounded(timeout, client.get_daily_calories()).await?;
        Ok(Self::new(
            client,
            DailyCalorieView::from_snapshot(&snapshot),
            timeout,
        ))
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, NutritionError>>,
    ) -> Result<T, NutritionError> {
        bounded(self.timeout, fut).await
    }

    /// Look up foods matching `query`. Only the most recently issued search
    /// may change the suggestion list.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, NutritionError> {
        let query = query.trim();
        if query.is_empty() {
            self.board.lock().await.clear();
            return Ok(SearchOutcome::Cleared);
        }

        let token = self.board.lock().await.issue();
        let result = self.call(self.client.search_foods(query)).await;

        let mut board = self.board.lock().await;
        match result {
            Ok(suggestions) => {
                if board.apply(token, suggestions) {
                    Ok(SearchOutcome::Applied(board.suggestions().to_vec()))
                } else {
                    metrics::counter!("nutrition_log_stale_suggestions_total").increment(1);
                    tracing::debug!(%query, "discarding superseded suggestions");
                    Ok(SearchOutcome::Superseded)
                }
            }
            Err(e) => {
                board.apply(token, Vec::new());
                Err(e)
            }
        }
    }

    pub async fn suggestions(&self) -> Vec<FoodSuggestion> {
        self.board.lock().await.suggestions().to_vec()
    }

    /// Fetch full detail for a candidate and make it the current selection.
    /// A selection superseded by a later call is returned but not kept.
    pub async fn select(&self, fdc_id: i64) -> Result<NutrientProfile, NutritionError> {
        let ticket = {
            let mut selection = self.selection.lock().await;
            selection.issued += 1;
            selection.issued
        };
        let profile = self.call(self.client.get_food_detail(fdc_id)).await?;

        let mut selection = self.selection.lock().await;
        if selection.issued == ticket {
            selection.profile = Some(profile.clone());
        } else {
            tracing::debug!(fdc_id, "discarding superseded food detail");
        }
        Ok(profile)
    }

    pub async fn selected(&self) -> Option<NutrientProfile> {
        self.selection.lock().await.profile.clone()
    }

    /// Add the current selection at `grams`, then clear the selection and the
    /// suggestion list.
    pub async fn add_selected(&self, grams: u32) -> Result<LedgerEntry, NutritionError> {
        let profile = self
            .selection
            .lock()
            .await
            .profile
            .clone()
            .ok_or_else(|| NutritionError::Validation("select a food before adding it".into()))?;
        let entry = self.add_food(&profile, grams).await?;

        {
            let mut selection = self.selection.lock().await;
            selection.issued += 1;
            selection.profile = None;
        }
        self.board.lock().await.clear();
        Ok(entry)
    }

    pub async fn add_food(
        &self,
        profile: &NutrientProfile,
        grams: u32,
    ) -> Result<LedgerEntry, NutritionError> {
        let entry = self.ledger.lock().await.append(profile, grams)?.clone();
        metrics::counter!("nutrition_log_entries_appended_total").increment(1);
        Ok(entry)
    }

    pub async fn set_meal_time(&self, meal_time: MealTime) -> Result<(), NutritionError> {
        self.ledger.lock().await.set_meal_time(meal_time)
    }

    pub async fn summary(&self) -> LedgerSummary {
        let selected = self.selected().await;
        let ledger = self.ledger.lock().await;
        LedgerSummary {
            state: ledger.state(),
            meal_time: ledger.meal_time(),
            entries: ledger.entries().to_vec(),
            totals: ledger.totals(),
            view: *ledger.view(),
            selected,
        }
    }

    /// Submit the meal, then adopt the server's fresh daily totals.
    ///
    /// Fails without any request when the meal is empty, has no meal time, or
    /// another commit is still in flight. On a failed submission the ledger is
    /// left exactly as it was.
    ///
    /// The submission runs on its own task, so dropping the returned future
    /// does not strand the ledger in the committing state: the task still
    /// settles it once the server answers or the timeout expires.
    pub async fn commit(&self) -> Result<CommitReceipt, NutritionError> {
        let pending = match self.ledger.lock().await.begin_commit() {
            Ok(p) => p,
            Err(e) => {
                metrics::counter!("nutrition_log_commits_total", "outcome" => "rejected")
                    .increment(1);
                return Err(e);
            }
        };

        let task = tokio::spawn(settle_commit(
            self.client.clone(),
            self.ledger.clone(),
            self.timeout,
            pending,
        ));
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(NutritionError::Timeout(format!("commit task cancelled: {e}"))),
        }
    }

    /// Replace the calorie view with a fresh server snapshot.
    pub async fn refresh_daily_view(&self) -> Result<DailyCalorieView, NutritionError> {
        let snapshot = self.call(self.client.get_daily_calories()).await?;
        let mut ledger = self.ledger.lock().await;
        ledger.refresh(&snapshot);
        Ok(*ledger.view())
    }

    /// Discard the uncommitted meal, the selection and the suggestions.
    pub async fn reset(&self) -> Result<(), NutritionError> {
        self.ledger.lock().await.reset()?;
        {
            let mut selection = self.selection.lock().await;
            selection.issued += 1;
            selection.profile = None;
        }
        self.board.lock().await.clear();
        Ok(())
    }

    pub async fn submit_profile(
        &self,
        profile: &ProfileSubmission,
    ) -> Result<ProfileMetrics, NutritionError> {
        self.call(self.client.submit_profile(profile)).await
    }
}

async fn settle_commit(
    client: Arc<dyn NutritionClient>,
    ledger: Arc<Mutex<SessionLedger>>,
    timeout: Duration,
    pending: PendingCommit,
) -> Result<CommitReceipt, NutritionError> {
    let meal_time = pending.request().meal_time;
    let committed_entries = pending.request().foods.len();

    let submitted = bounded(timeout, client.add_food_log(pending.request())).await;
    let ack = match submitted {
        Ok(ack) => ack,
        Err(e) => {
            ledger.lock().await.abort_commit(pending);
            metrics::counter!("nutrition_log_commits_total", "outcome" => "failed").increment(1);
            tracing::warn!(%meal_time, "meal commit failed, entries kept: {}", e);
            return Err(e);
        }
    };

    let refreshed = bounded(timeout, client.get_daily_calories()).await;
    let mut ledger = ledger.lock().await;
    let snapshot_refreshed = match refreshed {
        Ok(snapshot) => {
            ledger.complete_commit(pending, &snapshot);
            true
        }
        Err(e) => {
            tracing::warn!("meal stored but daily totals refresh failed: {}", e);
            ledger.complete_commit_unrefreshed(pending);
            false
        }
    };
    metrics::counter!("nutrition_log_commits_total", "outcome" => "ok").increment(1);
    tracing::info!(
        %meal_time,
        committed_entries,
        remaining = ledger.view().remaining,
        "meal committed"
    );

    Ok(CommitReceipt {
        message: ack.message,
        meal_time,
        committed_entries,
        view: *ledger.view(),
        snapshot_refreshed,
    })
}

async fn bounded<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, NutritionError>>,
) -> Result<T, NutritionError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(NutritionError::Timeout(format!(
            "no response within {} ms",
            timeout.as_millis()
        ))),
    }
}
