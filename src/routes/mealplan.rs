use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::ApiResult,
    models::{
        auth::AuthenticatedUser,
        mealplan::{CreateMealPlanRequest, MealPlanEntry, MealPlanQuery, UpdateMealPlanRequest},
    },
    services::mealplan::MealPlanService,
    AppState,
};

/// GET /api/mealplan?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD
pub async fn list_entries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    query: Result<Query<MealPlanQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<MealPlanEntry>>> {
    let Query(params) = query?;
    MealPlanService::list(state.store.as_ref(), &user.user_id, params.into())
        .await
        .map(Json)
}

/// POST /api/mealplan
pub async fn create_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateMealPlanRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MealPlanEntry>)> {
    let Json(req) = body?;
    MealPlanService::create(state.store.as_ref(), &user.user_id, req)
        .await
        .map(|entry| (StatusCode::CREATED, Json(entry)))
}

/// PUT /api/mealplan/{id}
pub async fn update_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateMealPlanRequest>, JsonRejection>,
) -> ApiResult<Json<MealPlanEntry>> {
    let Json(patch) = body?;
    MealPlanService::update(state.store.as_ref(), &user.user_id, &id, &patch)
        .await
        .map(Json)
}

/// DELETE /api/mealplan/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = MealPlanService::delete(state.store.as_ref(), &user.user_id, &id).await?;
    Ok(Json(json!({ "message": "Meal plan entry deleted", "id": id })))
}
