use uuid::Uuid;

use super::tally;
use crate::meals::repo_types::ComplianceFilter;
use crate::meals::store::{MealStore, StoreError};

/// The four per-account statistics, each one independent read against the
/// store. Nothing is cached between calls.
pub struct MetricsEngine<'a> {
    store: &'a dyn MealStore,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(store: &'a dyn MealStore) -> Self {
        Self { store }
    }

    pub async fn total_meal_count(&self, owner: Uuid) -> Result<i64, StoreError> {
        self.store.count_active(owner, ComplianceFilter::Any).await
    }

    pub async fn diet_compliant_count(&self, owner: Uuid) -> Result<i64, StoreError> {
        self.store.count_active(owner, ComplianceFilter::Compliant).await
    }

    pub async fn non_compliant_count(&self, owner: Uuid) -> Result<i64, StoreError> {
        self.store.count_active(owner, ComplianceFilter::NonCompliant).await
    }

    /// Most compliant meals logged on any single calendar day.
    pub async fn best_diet_streak(&self, owner: Uuid) -> Result<i64, StoreError> {
        let per_day = self.store.group_active_compliant_by_date(owner).await?;
        Ok(tally::best_day(&per_day))
    }
}
