use uuid::Uuid;

use crate::{
    db::MealPlanStore,
    error::{ApiError, ApiResult},
    models::mealplan::{
        CreateMealPlanRequest, DateRange, MealPlanEntry, UpdateMealPlanRequest,
    },
    services::metrics::record_mealplan,
};

const NOT_FOUND: &str = "Meal plan entry not found";

pub struct MealPlanService;

impl MealPlanService {
    /// The caller's entries inside `range`, ordered by date. Never fails on an empty result.
    pub async fn list(
        store: &dyn MealPlanStore,
        user_id: &str,
        range: DateRange,
    ) -> ApiResult<Vec<MealPlanEntry>> {
        let entries = store.list(user_id, range).await.inspect_err(|_| {
            record_mealplan("list", "error");
        })?;
        record_mealplan("list", "ok");
        Ok(entries)
    }

    /// Validates required fields and persists the entry under the caller's id.
    pub async fn create(
        store: &dyn MealPlanStore,
        user_id: &str,
        req: CreateMealPlanRequest,
    ) -> ApiResult<MealPlanEntry> {
        let missing = req.missing_fields();
        let Some(new_entry) = req.into_new_entry(user_id) else {
            record_mealplan("create", "invalid");
            return Err(ApiError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let entry = store.create(new_entry).await.inspect_err(|_| {
            record_mealplan("create", "error");
        })?;
        record_mealplan("create", "ok");
        tracing::info!(entry_id = %entry.id, user_id, date = %entry.date, "Meal plan entry created");
        Ok(entry)
    }

    /// Ownership is checked before the write; an entry removed in between surfaces as 404.
    pub async fn update(
        store: &dyn MealPlanStore,
        user_id: &str,
        id: &str,
        patch: &UpdateMealPlanRequest,
    ) -> ApiResult<MealPlanEntry> {
        let id = Self::check_owner(
            store,
            user_id,
            id,
            "update",
            "Not authorized to modify this meal plan entry",
        )
        .await?;

        let updated = store
            .update(id, patch)
            .await
            .inspect_err(|_| record_mealplan("update", "error"))?
            .ok_or(ApiError::NotFound(NOT_FOUND))?;
        record_mealplan("update", "ok");
        tracing::info!(entry_id = %id, user_id, "Meal plan entry updated");
        Ok(updated)
    }

    pub async fn delete(store: &dyn MealPlanStore, user_id: &str, id: &str) -> ApiResult<Uuid> {
        let id = Self::check_owner(
            store,
            user_id,
            id,
            "delete",
            "Not authorized to delete this meal plan entry",
        )
        .await?;

        let removed = store
            .delete(id)
            .await
            .inspect_err(|_| record_mealplan("delete", "error"))?;
        if !removed {
            return Err(ApiError::NotFound(NOT_FOUND));
        }
        record_mealplan("delete", "ok");
        tracing::info!(entry_id = %id, user_id, "Meal plan entry deleted");
        Ok(id)
    }

    async fn check_owner(
        store: &dyn MealPlanStore,
        user_id: &str,
        raw_id: &str,
        operation: &str,
        forbidden: &'static str,
    ) -> ApiResult<Uuid> {
        // A malformed id cannot name any stored entry.
        let Ok(id) = raw_id.parse::<Uuid>() else {
            record_mealplan(operation, "not_found");
            return Err(ApiError::NotFound(NOT_FOUND));
        };

        let existing = store
            .get(id)
            .await
            .inspect_err(|_| record_mealplan(operation, "error"))?;
        match existing {
            None => {
                record_mealplan(operation, "not_found");
                Err(ApiError::NotFound(NOT_FOUND))
            }
            Some(entry) if entry.user_id != user_id => {
                record_mealplan(operation, "forbidden");
                tracing::warn!(entry_id = %id, user_id, "Ownership mismatch on {operation}");
                Err(ApiError::Forbidden(forbidden))
            }
            Some(_) => Ok(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryMealPlanStore;
    use crate::models::mealplan::{MealType, RecipeSnapshot};
    use serde_json::json;

    fn create_req() -> CreateMealPlanRequest {
        serde_json::from_value(json!({
            "date": "2024-06-10",
            "mealType": "lunch",
            "recipe": { "id": 1, "title": "Soup", "image": "x" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_rejects_missing_fields_without_persisting() {
        let store = MemoryMealPlanStore::new();
        let req = CreateMealPlanRequest {
            meal_type: Some(MealType::Lunch),
            ..Default::default()
        };
        let err = MealPlanService::create(&store, "u1", req).await.unwrap_err();
        match err {
            ApiError::Validation(msg) => assert_eq!(msg, "Missing required fields: date, recipe"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_by_other_user_is_forbidden_and_leaves_entry() {
        let store = MemoryMealPlanStore::new();
        let entry = MealPlanService::create(&store, "u1", create_req()).await.unwrap();

        let patch = UpdateMealPlanRequest {
            recipe: Some(RecipeSnapshot {
                id: 2,
                title: "Stew".into(),
                extra: Default::default(),
            }),
            ..Default::default()
        };
        let err = MealPlanService::update(&store, "u2", &entry.id.to_string(), &patch)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let stored = store.get(entry.id).await.unwrap().unwrap();
        assert_eq!(stored, entry);
    }

    #[tokio::test]
    async fn delete_by_other_user_is_forbidden() {
        let store = MemoryMealPlanStore::new();
        let entry = MealPlanService::create(&store, "u1", create_req()).await.unwrap();

        let err = MealPlanService::delete(&store, "u2", &entry.id.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids_are_not_found() {
        let store = MemoryMealPlanStore::new();
        let patch = UpdateMealPlanRequest::default();

        for id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
            let err = MealPlanService::update(&store, "u1", &id, &patch).await.unwrap_err();
            assert!(matches!(err, ApiError::NotFound(_)));
            let err = MealPlanService::delete(&store, "u1", &id).await.unwrap_err();
            assert!(matches!(err, ApiError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn owner_can_update_then_delete() {
        let store = MemoryMealPlanStore::new();
        let entry = MealPlanService::create(&store, "u1", create_req()).await.unwrap();
        let id = entry.id.to_string();

        let patch = UpdateMealPlanRequest {
            meal_type: Some(MealType::Dinner),
            ..Default::default()
        };
        let updated = MealPlanService::update(&store, "u1", &id, &patch).await.unwrap();
        assert_eq!(updated.meal_type, MealType::Dinner);
        assert_eq!(updated.user_id, "u1");
        assert_eq!(updated.id, entry.id);

        let deleted = MealPlanService::delete(&store, "u1", &id).await.unwrap();
        assert_eq!(deleted, entry.id);
        assert!(store.is_empty().await);
    }
}
