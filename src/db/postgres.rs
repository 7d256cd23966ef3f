use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::MealPlanStore;
use crate::models::mealplan::{
    DateRange, MealPlanEntry, NewMealPlanEntry, RecipeSnapshot, UpdateMealPlanRequest,
};

const COLUMNS: &str = "id, user_id, date, meal_type, recipe, created_at, updated_at";

/// DB row struct. meal_type is stored as TEXT and parsed on the way out.
#[derive(Debug, FromRow)]
struct MealPlanRow {
    id: Uuid,
    user_id: String,
    date: NaiveDate,
    meal_type: String,
    recipe: Json<RecipeSnapshot>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MealPlanRow> for MealPlanEntry {
    type Error = anyhow::Error;

    fn try_from(row: MealPlanRow) -> Result<Self, Self::Error> {
        Ok(MealPlanEntry {
            id: row.id,
            date: row.date,
            meal_type: row.meal_type.parse()?,
            recipe: row.recipe.0,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgMealPlanStore {
    pool: PgPool,
}

impl PgMealPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MealPlanStore for PgMealPlanStore {
    async fn list(&self, user_id: &str, range: DateRange) -> anyhow::Result<Vec<MealPlanEntry>> {
        let rows = sqlx::query_as::<_, MealPlanRow>(&format!(
            r#"SELECT {COLUMNS}
               FROM meal_plan_entries
               WHERE user_id = $1
                 AND ($2::DATE IS NULL OR date >= $2)
                 AND ($3::DATE IS NULL OR date <= $3)
               ORDER BY date, created_at"#
        ))
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MealPlanEntry::try_from).collect()
    }

    async fn create(&self, entry: NewMealPlanEntry) -> anyhow::Result<MealPlanEntry> {
        let row = sqlx::query_as::<_, MealPlanRow>(&format!(
            r#"INSERT INTO meal_plan_entries (user_id, date, meal_type, recipe)
               VALUES ($1, $2, $3, $4)
               RETURNING {COLUMNS}"#
        ))
        .bind(&entry.user_id)
        .bind(entry.date)
        .bind(entry.meal_type.to_string())
        .bind(Json(&entry.recipe))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MealPlanEntry>> {
        let row = sqlx::query_as::<_, MealPlanRow>(&format!(
            "SELECT {COLUMNS} FROM meal_plan_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MealPlanEntry::try_from).transpose()
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &UpdateMealPlanRequest,
    ) -> anyhow::Result<Option<MealPlanEntry>> {
        let row = sqlx::query_as::<_, MealPlanRow>(&format!(
            r#"UPDATE meal_plan_entries
               SET date = COALESCE($1, date),
                   meal_type = COALESCE($2, meal_type),
                   recipe = COALESCE($3, recipe),
                   updated_at = NOW()
               WHERE id = $4
               RETURNING {COLUMNS}"#
        ))
        .bind(patch.date)
        .bind(patch.meal_type.map(|t| t.to_string()))
        .bind(patch.recipe.as_ref().map(Json))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MealPlanEntry::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM meal_plan_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
