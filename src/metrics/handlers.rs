use axum::{extract::State, routing::get, Json, Router};
use tracing::{error, instrument};

use super::service::{compute_metrics, MealMetrics};
use crate::{
    auth::extractors::AuthUser,
    error::{internal, ApiError},
    state::AppState,
};

pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/meals/metrics", get(get_metrics))
}

#[instrument(skip(state))]
pub async fn get_metrics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MealMetrics>, ApiError> {
    let metrics = compute_metrics(state.meals.as_ref(), user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "compute_metrics failed");
            internal("Error retrieving metrics")
        })?;
    Ok(Json(metrics))
}
