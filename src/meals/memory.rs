use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{ComplianceFilter, Meal, MealDraft, Page};
use super::store::{MealStore, StoreError};
use crate::metrics::tally;

/// [`MealStore`] over a plain `Vec<Meal>`, for tests and the fake app state.
#[derive(Default)]
pub struct InMemoryMealStore {
    meals: RwLock<Vec<Meal>>,
}

impl InMemoryMealStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meals(meals: Vec<Meal>) -> Self {
        Self {
            meals: RwLock::new(meals),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Meal>>, StoreError> {
        self.meals
            .read()
            .map_err(|_| StoreError::Unavailable("meal store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Meal>>, StoreError> {
        self.meals
            .write()
            .map_err(|_| StoreError::Unavailable("meal store lock poisoned".into()))
    }
}

fn visible(meal: &Meal, owner: Uuid) -> bool {
    meal.owner == owner && meal.deleted_at.is_none()
}

#[async_trait]
impl MealStore for InMemoryMealStore {
    async fn insert(&self, owner: Uuid, draft: MealDraft) -> Result<Meal, StoreError> {
        let now = OffsetDateTime::now_utc();
        let meal = Meal {
            id: Uuid::new_v4(),
            owner,
            name: draft.name,
            description: draft.description,
            occurred_at: draft.occurred_at,
            is_diet_compliant: draft.is_diet_compliant,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.write()?.push(meal.clone());
        Ok(meal)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        draft: MealDraft,
    ) -> Result<Option<Meal>, StoreError> {
        let mut meals = self.write()?;
        let Some(meal) = meals.iter_mut().find(|m| m.id == id && visible(m, owner)) else {
            return Ok(None);
        };
        meal.name = draft.name;
        meal.description = draft.description;
        meal.occurred_at = draft.occurred_at;
        meal.is_diet_compliant = draft.is_diet_compliant;
        meal.updated_at = OffsetDateTime::now_utc();
        Ok(Some(meal.clone()))
    }

    async fn soft_delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut meals = self.write()?;
        match meals.iter_mut().find(|m| m.id == id && visible(m, owner)) {
            Some(meal) => {
                let now = OffsetDateTime::now_utc();
                meal.deleted_at = Some(now);
                meal.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_active(&self, owner: Uuid, id: Uuid) -> Result<Option<Meal>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .find(|m| m.id == id && visible(m, owner))
            .cloned())
    }

    async fn list_active(&self, owner: Uuid, page: Page) -> Result<Vec<Meal>, StoreError> {
        let mut rows: Vec<Meal> = self
            .read()?
            .iter()
            .filter(|m| visible(m, owner))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(a.id.cmp(&b.id)));
        let skip = usize::try_from(page.offset).unwrap_or(0);
        let take = usize::try_from(page.limit).unwrap_or(0);
        Ok(rows.into_iter().skip(skip).take(take).collect())
    }

    async fn count_active(
        &self,
        owner: Uuid,
        filter: ComplianceFilter,
    ) -> Result<i64, StoreError> {
        let n = self
            .read()?
            .iter()
            .filter(|m| visible(m, owner))
            .filter(|m| filter.as_flag().map_or(true, |flag| flag == m.is_diet_compliant))
            .count();
        Ok(i64::try_from(n).unwrap_or(i64::MAX))
    }

    async fn group_active_compliant_by_date(
        &self,
        owner: Uuid,
    ) -> Result<BTreeMap<Date, i64>, StoreError> {
        let meals = self.read()?;
        Ok(tally::bucket_by_day(
            meals
                .iter()
                .filter(|m| visible(m, owner) && m.is_diet_compliant)
                .map(|m| m.occurred_at),
        ))
    }
}

/// Serves everything from an [`InMemoryMealStore`] except the per-day
/// grouping, which always reports the backend as unreachable.
pub struct BrokenGrouping {
    inner: InMemoryMealStore,
}

impl BrokenGrouping {
    pub fn new(inner: InMemoryMealStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl MealStore for BrokenGrouping {
    async fn insert(&self, owner: Uuid, draft: MealDraft) -> Result<Meal, StoreError> {
        self.inner.insert(owner, draft).await
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        draft: MealDraft,
    ) -> Result<Option<Meal>, StoreError> {
        self.inner.update(owner, id, draft).await
    }

    async fn soft_delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        self.inner.soft_delete(owner, id).await
    }

    async fn find_active(&self, owner: Uuid, id: Uuid) -> Result<Option<Meal>, StoreError> {
        self.inner.find_active(owner, id).await
    }

    async fn list_active(&self, owner: Uuid, page: Page) -> Result<Vec<Meal>, StoreError> {
        self.inner.list_active(owner, page).await
    }

    async fn count_active(
        &self,
        owner: Uuid,
        filter: ComplianceFilter,
    ) -> Result<i64, StoreError> {
        self.inner.count_active(owner, filter).await
    }

    async fn group_active_compliant_by_date(
        &self,
        _owner: Uuid,
    ) -> Result<BTreeMap<Date, i64>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn draft(name: &str, compliant: bool) -> MealDraft {
        MealDraft {
            name: name.into(),
            description: None,
            occurred_at: datetime!(2024-01-01 12:00 UTC),
            is_diet_compliant: compliant,
        }
    }

    const ALL: Page = Page {
        limit: 100,
        offset: 0,
    };

    #[tokio::test]
    async fn other_accounts_cannot_see_or_touch_a_meal() {
        let store = InMemoryMealStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let meal = store.insert(alice, draft("salad", true)).await.unwrap();

        assert!(store.find_active(bob, meal.id).await.unwrap().is_none());
        assert!(store.update(bob, meal.id, draft("pizza", false)).await.unwrap().is_none());
        assert!(!store.soft_delete(bob, meal.id).await.unwrap());
        assert_eq!(store.find_active(alice, meal.id).await.unwrap(), Some(meal));
    }

    #[tokio::test]
    async fn soft_deleted_meal_disappears_but_is_kept() {
        let store = InMemoryMealStore::new();
        let owner = Uuid::new_v4();
        let meal = store.insert(owner, draft("soup", true)).await.unwrap();

        assert!(store.soft_delete(owner, meal.id).await.unwrap());
        assert!(!store.soft_delete(owner, meal.id).await.unwrap());
        assert!(store.find_active(owner, meal.id).await.unwrap().is_none());
        assert!(store.list_active(owner, ALL).await.unwrap().is_empty());
        assert_eq!(store.read().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_identity_and_owner() {
        let store = InMemoryMealStore::new();
        let owner = Uuid::new_v4();
        let meal = store.insert(owner, draft("toast", true)).await.unwrap();

        let edited = store
            .update(owner, meal.id, draft("toast with butter", false))
            .await
            .unwrap()
            .expect("meal exists");
        assert_eq!(edited.id, meal.id);
        assert_eq!(edited.owner, owner);
        assert_eq!(edited.name, "toast with butter");
        assert!(!edited.is_diet_compliant);
        assert_eq!(edited.created_at, meal.created_at);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paged() {
        let store = InMemoryMealStore::new();
        let owner = Uuid::new_v4();
        for hour in [8u8, 20, 13] {
            let mut d = draft(&format!("meal at {hour}"), true);
            d.occurred_at = d.occurred_at.replace_hour(hour).unwrap();
            store.insert(owner, d).await.unwrap();
        }

        let names: Vec<String> = store
            .list_active(owner, ALL)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["meal at 20", "meal at 13", "meal at 8"]);

        let second = store
            .list_active(owner, Page { limit: 1, offset: 1 })
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "meal at 13");
    }
}
