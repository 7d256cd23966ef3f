use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    pub static ref MEALPLAN_OPERATIONS_COUNTER: CounterVec = register_counter_vec!(
        "mealplan_operations_total",
        "Meal plan operations by operation and outcome",
        &["operation", "outcome"]
    ).unwrap();

    pub static ref RECIPE_UPSTREAM_COUNTER: CounterVec = register_counter_vec!(
        "recipe_upstream_requests_total",
        "Calls to the upstream recipe API by endpoint and outcome",
        &["endpoint", "outcome"]
    ).unwrap();
}

pub fn record_mealplan(operation: &str, outcome: &str) {
    MEALPLAN_OPERATIONS_COUNTER
        .with_label_values(&[operation, outcome])
        .inc();
}

pub fn record_upstream(endpoint: &str, outcome: &str) {
    RECIPE_UPSTREAM_COUNTER
        .with_label_values(&[endpoint, outcome])
        .inc();
}
