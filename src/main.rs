use std::{sync::Arc, time::Duration};

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mealplan_api::{
    build_router,
    config::{Config, StoreBackend},
    db::{self, MealPlanStore, MemoryMealPlanStore, PgMealPlanStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn MealPlanStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Missing required env var: DATABASE_URL"))?;
            let pool = db::create_pool(
                database_url,
                config.database_max_connections,
                Duration::from_secs(config.database_acquire_timeout_seconds),
            )
            .await?;
            db::run_migrations(&pool).await?;
            info!("Database connected and migrations applied");
            Arc::new(PgMealPlanStore::new(pool))
        }
        StoreBackend::Memory => {
            info!("Using in-memory meal plan store, data is not persisted");
            Arc::new(MemoryMealPlanStore::new())
        }
    };

    if config.spoonacular_api_key.is_none() {
        info!("SPOONACULAR_API_KEY not set, recipe endpoints will return 500");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, store)?;
    let app = build_router(state);

    info!("Meal plan API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
