//! The in-progress meal and its effect on today's calorie budget.
//!
//! A [`SessionLedger`] holds the entries of one not-yet-submitted meal. Its
//! [`DailyCalorieView`] starts from a server snapshot and is pushed forward
//! by exactly one addition per appended entry. After a successful commit the
//! view is replaced by the next server snapshot, never merged with it.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::normalize::NutrientProfile;
use crate::scaling::scale;
use crate::{DailyCalorieSnapshot, FoodLogRequest, LoggedFood, NutritionError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MealTime {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealTime::Breakfast => "breakfast",
            MealTime::Lunch => "lunch",
            MealTime::Dinner => "dinner",
            MealTime::Snack => "snack",
        }
    }
}

impl fmt::Display for MealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealTime {
    type Err = NutritionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealTime::Breakfast),
            "lunch" => Ok(MealTime::Lunch),
            "dinner" => Ok(MealTime::Dinner),
            "snack" => Ok(MealTime::Snack),
            _ => Err(NutritionError::Validation(format!(
                "unknown meal time {s:?}; expected breakfast, lunch, dinner or snack"
            ))),
        }
    }
}

/// One logged food with nutrients scaled to the eaten mass.
#[derive(Clone, Debug, Serialize, PartialEq, JsonSchema)]
pub struct LedgerEntry {
    pub food_name: String,
    pub grams: u32,
    pub calories: f64,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
}

impl LedgerEntry {
    pub fn to_logged_food(&self) -> LoggedFood {
        LoggedFood {
            name: self.food_name.clone(),
            calories: self.calories,
            fat: self.fat,
            carbs: self.carbs,
            protein: self.protein,
        }
    }
}

/// Per-nutrient sums over the current meal.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, JsonSchema)]
pub struct MealTotals {
    pub calories: f64,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, JsonSchema)]
pub struct DailyCalorieView {
    pub target: f64,
    pub consumed_before_session: f64,
    pub consumed_this_session: f64,
    pub remaining: f64,
}

impl DailyCalorieView {
    pub fn from_snapshot(snapshot: &DailyCalorieSnapshot) -> Self {
        Self {
            target: snapshot.calorie_target,
            consumed_before_session: snapshot.total_calories_consumed,
            consumed_this_session: 0.0,
            remaining: snapshot.calories_left_for_day,
        }
    }

    /// Count `calories` against the budget. `remaining` starts from the
    /// server's figure and only ever moves by what this session adds.
    fn record(&mut self, calories: f64) {
        self.consumed_this_session += calories;
        self.remaining -= calories;
    }

    /// Treat this session's calories as already consumed, for when the server
    /// accepted a meal but its fresh totals could not be fetched.
    fn rebased(&self) -> Self {
        Self {
            target: self.target,
            consumed_before_session: self.consumed_before_session + self.consumed_this_session,
            consumed_this_session: 0.0,
            remaining: self.remaining,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerState {
    Empty,
    Accumulating,
    Committing,
}

/// Issued by [`SessionLedger::begin_commit`]; hand it back to either
/// [`SessionLedger::complete_commit`] or [`SessionLedger::abort_commit`].
#[derive(Debug)]
#[must_use = "a pending commit must be completed or aborted"]
pub struct PendingCommit {
    request: FoodLogRequest,
}

impl PendingCommit {
    pub fn request(&self) -> &FoodLogRequest {
        &self.request
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionLedger {
    entries: Vec<LedgerEntry>,
    meal_time: Option<MealTime>,
    baseline: DailyCalorieView,
    view: DailyCalorieView,
    committing: bool,
}

impl SessionLedger {
    pub fn new(view: DailyCalorieView) -> Self {
        Self {
            entries: Vec::new(),
            meal_time: None,
            baseline: view,
            view,
            committing: false,
        }
    }

    pub fn from_snapshot(snapshot: &DailyCalorieSnapshot) -> Self {
        Self::new(DailyCalorieView::from_snapshot(snapshot))
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn meal_time(&self) -> Option<MealTime> {
        self.meal_time
    }

    pub fn view(&self) -> &DailyCalorieView {
        &self.view
    }

    pub fn state(&self) -> LedgerState {
        if self.committing {
            LedgerState::Committing
        } else if self.entries.is_empty() {
            LedgerState::Empty
        } else {
            LedgerState::Accumulating
        }
    }

    pub fn totals(&self) -> MealTotals {
        self.entries
            .iter()
            .fold(MealTotals::default(), |acc, e| MealTotals {
                calories: acc.calories + e.calories,
                fat: acc.fat + e.fat,
                carbs: acc.carbs + e.carbs,
                protein: acc.protein + e.protein,
            })
    }

    pub fn set_meal_time(&mut self, meal_time: MealTime) -> Result<(), NutritionError> {
        self.ensure_idle()?;
        self.meal_time = Some(meal_time);
        Ok(())
    }

    /// Scale `profile` to `grams` and append it, advancing the calorie view by
    /// the new entry's calories.
    pub fn append(
        &mut self,
        profile: &NutrientProfile,
        grams: u32,
    ) -> Result<&LedgerEntry, NutritionError> {
        self.ensure_idle()?;
        if grams == 0 {
            return Err(NutritionError::Validation(
                "mass must be greater than zero".into(),
            ));
        }
        let entry = scale(profile, grams);
        self.view.record(entry.calories);
        self.entries.push(entry);
        tracing::debug!(
            food = profile.name(),
            grams,
            remaining = self.view.remaining,
            "ledger entry appended"
        );
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Validate the meal and enter the committing state. Nothing changes when
    /// validation fails.
    pub fn begin_commit(&mut self) -> Result<PendingCommit, NutritionError> {
        if self.committing {
            return Err(NutritionError::CommitInProgress);
        }
        if self.entries.is_empty() {
            return Err(NutritionError::Validation(
                "add at least one food item before submitting".into(),
            ));
        }
        let Some(meal_time) = self.meal_time else {
            return Err(NutritionError::Validation(
                "select a meal time before submitting".into(),
            ));
        };
        self.committing = true;
        Ok(PendingCommit {
            request: FoodLogRequest {
                meal_time,
                foods: self.entries.iter().map(LedgerEntry::to_logged_food).collect(),
            },
        })
    }

    /// The server accepted the meal: clear it and adopt `snapshot` as the view.
    pub fn complete_commit(&mut self, pending: PendingCommit, snapshot: &DailyCalorieSnapshot) {
        let _ = pending;
        self.clear();
        self.baseline = DailyCalorieView::from_snapshot(snapshot);
        self.view = self.baseline;
    }

    /// The server accepted the meal but fresh totals are unavailable.
    pub fn complete_commit_unrefreshed(&mut self, pending: PendingCommit) {
        let _ = pending;
        let rebased = self.view.rebased();
        self.clear();
        self.baseline = rebased;
        self.view = rebased;
    }

    /// The commit failed; entries and meal time stay exactly as they were.
    pub fn abort_commit(&mut self, pending: PendingCommit) {
        let _ = pending;
        self.committing = false;
    }

    /// Replace the view from a fresh snapshot. Pending entries are not known
    /// to the server yet, so their calories are projected on top once each.
    pub fn refresh(&mut self, snapshot: &DailyCalorieSnapshot) {
        self.baseline = DailyCalorieView::from_snapshot(snapshot);
        self.view = self.baseline;
        for e in &self.entries {
            self.view.record(e.calories);
        }
    }

    /// Discard the uncommitted meal and its projected calories.
    pub fn reset(&mut self) -> Result<(), NutritionError> {
        self.ensure_idle()?;
        self.clear();
        self.view = self.baseline;
        Ok(())
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.meal_time = None;
        self.committing = false;
    }

    fn ensure_idle(&self) -> Result<(), NutritionError> {
        if self.committing {
            Err(NutritionError::CommitInProgress)
        } else {
            Ok(())
        }
    }
}
