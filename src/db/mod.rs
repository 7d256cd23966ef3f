pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::mealplan::{DateRange, MealPlanEntry, NewMealPlanEntry, UpdateMealPlanRequest};

pub use memory::MemoryMealPlanStore;
pub use postgres::PgMealPlanStore;

/// Persistence for meal-plan entries. Handlers receive it through `AppState`.
#[async_trait]
pub trait MealPlanStore: Send + Sync {
    /// Entries owned by `user_id` whose date falls in `range`, by date ascending.
    async fn list(&self, user_id: &str, range: DateRange) -> anyhow::Result<Vec<MealPlanEntry>>;

    async fn create(&self, entry: NewMealPlanEntry) -> anyhow::Result<MealPlanEntry>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MealPlanEntry>>;

    /// Merges the supplied fields and stamps `updated_at`. `None` if the entry is gone.
    async fn update(
        &self,
        id: Uuid,
        patch: &UpdateMealPlanRequest,
    ) -> anyhow::Result<Option<MealPlanEntry>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded in ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
