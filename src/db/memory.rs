use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::MealPlanStore;
use crate::models::mealplan::{DateRange, MealPlanEntry, NewMealPlanEntry, UpdateMealPlanRequest};

/// Process-local store for tests and `STORE_BACKEND=memory`. Data is lost on restart.
#[derive(Default)]
pub struct MemoryMealPlanStore {
    entries: RwLock<HashMap<Uuid, MealPlanEntry>>,
}

impl MemoryMealPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MealPlanStore for MemoryMealPlanStore {
    async fn list(&self, user_id: &str, range: DateRange) -> anyhow::Result<Vec<MealPlanEntry>> {
        let entries = self.entries.read().await;
        let mut found: Vec<MealPlanEntry> = entries
            .values()
            .filter(|e| e.user_id == user_id && range.contains(e.date))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(found)
    }

    async fn create(&self, entry: NewMealPlanEntry) -> anyhow::Result<MealPlanEntry> {
        let now = Utc::now();
        let created = MealPlanEntry {
            id: Uuid::new_v4(),
            date: entry.date,
            meal_type: entry.meal_type,
            recipe: entry.recipe,
            user_id: entry.user_id,
            created_at: now,
            updated_at: now,
        };
        self.entries.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<MealPlanEntry>> {
        Ok(self.entries.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &UpdateMealPlanRequest,
    ) -> anyhow::Result<Option<MealPlanEntry>> {
        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(&id).map(|entry| {
            patch.apply_to(entry);
            entry.updated_at = Utc::now();
            entry.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.entries.write().await.remove(&id).is_some())
    }
}
