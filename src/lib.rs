// Library exports for the API binary, tooling and tests
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::MealPlanStore;
use middleware::auth::IdentityVerifier;
use services::recipes::RecipeService;

pub use routes::build_router;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn MealPlanStore>,
    pub verifier: Arc<IdentityVerifier>,
    pub recipes: Arc<RecipeService>,
}

impl AppState {
    /// Wires the non-store collaborators from config around an already built store.
    pub fn new(config: Config, store: Arc<dyn MealPlanStore>) -> anyhow::Result<Self> {
        let verifier = IdentityVerifier::from_config(&config)?;
        let recipes = RecipeService::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            verifier: Arc::new(verifier),
            recipes: Arc::new(recipes),
        })
    }
}
