use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{ComplianceFilter, Meal, MealDraft, Page};
use super::store::{MealStore, StoreError};
use crate::metrics::tally;

const MEAL_COLUMNS: &str = "id, user_id, name, description, occurred_at, is_diet_compliant, \
                            created_at, updated_at, deleted_at";

/// Postgres-backed [`MealStore`]. Each call is one independent statement on
/// the shared pool.
#[derive(Clone)]
pub struct PgMealStore {
    db: PgPool,
}

impl PgMealStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealStore for PgMealStore {
    async fn insert(&self, owner: Uuid, draft: MealDraft) -> Result<Meal, StoreError> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            INSERT INTO meals (id, user_id, name, description, occurred_at, is_diet_compliant)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(draft.name)
        .bind(draft.description)
        .bind(draft.occurred_at)
        .bind(draft.is_diet_compliant)
        .fetch_one(&self.db)
        .await?;
        Ok(meal)
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        draft: MealDraft,
    ) -> Result<Option<Meal>, StoreError> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            UPDATE meals
               SET name = $3,
                   description = $4,
                   occurred_at = $5,
                   is_diet_compliant = $6,
                   updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(draft.name)
        .bind(draft.description)
        .bind(draft.occurred_at)
        .bind(draft.is_diet_compliant)
        .fetch_optional(&self.db)
        .await?;
        Ok(meal)
    }

    async fn soft_delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE meals
               SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_active(&self, owner: Uuid, id: Uuid) -> Result<Option<Meal>, StoreError> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
              FROM meals
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        Ok(meal)
    }

    async fn list_active(&self, owner: Uuid, page: Page) -> Result<Vec<Meal>, StoreError> {
        let rows = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
              FROM meals
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY occurred_at DESC, id
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count_active(
        &self,
        owner: Uuid,
        filter: ComplianceFilter,
    ) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
              FROM meals
             WHERE user_id = $1
               AND deleted_at IS NULL
               AND ($2::boolean IS NULL OR is_diet_compliant = $2)
            "#,
        )
        .bind(owner)
        .bind(filter.as_flag())
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn group_active_compliant_by_date(
        &self,
        owner: Uuid,
    ) -> Result<BTreeMap<Date, i64>, StoreError> {
        // Bucketed in Rust against tally::REFERENCE_OFFSET, not the session TZ.
        let occurred = sqlx::query_scalar::<_, OffsetDateTime>(
            r#"
            SELECT occurred_at
              FROM meals
             WHERE user_id = $1
               AND deleted_at IS NULL
               AND is_diet_compliant = TRUE
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(tally::bucket_by_day(occurred))
    }
}
