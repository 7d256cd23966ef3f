use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => Err(anyhow::anyhow!("Unknown meal type: {s}")),
        }
    }
}

/// Denormalized copy of the recipe as the client saw it when planning.
/// Everything besides id/title (image included) is kept verbatim in `extra`
/// so the snapshot reads back exactly as it was sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeSnapshot {
    pub id: i64,
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecipeSnapshot {
    pub fn image(&self) -> Option<&str> {
        self.extra.get("image").and_then(Value::as_str)
    }
}

/// A single planned meal owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe: RecipeSnapshot,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated entry ready to be persisted; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewMealPlanEntry {
    pub user_id: String,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe: RecipeSnapshot,
}

/// Body for POST /api/mealplan. Fields are optional on the wire so that
/// missing ones are reported together. Any `id`/`userId` sent is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealPlanRequest {
    pub date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
    pub recipe: Option<RecipeSnapshot>,
}

impl CreateMealPlanRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push("date");
        }
        if self.meal_type.is_none() {
            missing.push("mealType");
        }
        if self.recipe.is_none() {
            missing.push("recipe");
        }
        missing
    }

    /// Returns `None` when any required field is absent.
    pub fn into_new_entry(self, user_id: &str) -> Option<NewMealPlanEntry> {
        Some(NewMealPlanEntry {
            user_id: user_id.to_string(),
            date: self.date?,
            meal_type: self.meal_type?,
            recipe: self.recipe?,
        })
    }
}

/// Body for PUT /api/mealplan/{id}: only supplied fields are merged.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMealPlanRequest {
    pub date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
    pub recipe: Option<RecipeSnapshot>,
}

impl UpdateMealPlanRequest {
    pub fn apply_to(&self, entry: &mut MealPlanEntry) {
        if let Some(date) = self.date {
            entry.date = date;
        }
        if let Some(meal_type) = self.meal_type {
            entry.meal_type = meal_type;
        }
        if let Some(recipe) = &self.recipe {
            entry.recipe = recipe.clone();
        }
    }
}

/// Query params for GET /api/mealplan.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Inclusive date window; an absent bound is open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| start <= date) && self.end.map_or(true, |end| date <= end)
    }
}

impl From<MealPlanQuery> for DateRange {
    fn from(q: MealPlanQuery) -> Self {
        Self {
            start: q.start_date,
            end: q.end_date,
        }
    }
}
