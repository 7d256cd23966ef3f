pub mod auth;
pub mod mealplan;
