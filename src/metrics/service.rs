use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::engine::MetricsEngine;
use crate::meals::store::{MealStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealMetrics {
    pub total_meal_count: i64,
    pub diet_meal_count: i64,
    pub non_diet_meal_count: i64,
    pub best_diet_sequence: i64,
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics computation failed: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Runs the four statistics for `owner` and returns all of them or none.
///
/// The reads are concurrent and independent, so a meal written in between can
/// make `total != diet + non_diet` for that one response. The first failing
/// read drops the others.
#[instrument(skip(store))]
pub async fn compute_metrics(
    store: &dyn MealStore,
    owner: Uuid,
) -> Result<MealMetrics, MetricsError> {
    let engine = MetricsEngine::new(store);
    let (total_meal_count, diet_meal_count, non_diet_meal_count, best_diet_sequence) = tokio::try_join!(
        engine.total_meal_count(owner),
        engine.diet_compliant_count(owner),
        engine.non_compliant_count(owner),
        engine.best_diet_streak(owner),
    )?;

    let metrics = MealMetrics {
        total_meal_count,
        diet_meal_count,
        non_diet_meal_count,
        best_diet_sequence,
    };
    debug!(user_id = %owner, ?metrics, "metrics computed");
    Ok(metrics)
}
