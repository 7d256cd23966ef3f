pub mod mealplan;
pub mod metrics;
pub mod recipes;
