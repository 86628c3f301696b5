use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{MealListResponse, MealRequest, MealResponse, Pagination};
use crate::{
    auth::extractors::AuthUser,
    error::{api_error, bad_request, internal, ApiError, MessageResponse},
    state::AppState,
};

const MEAL_NOT_FOUND: &str = "Meal not found";

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route(
            "/meals/:id",
            get(get_meal).put(update_meal).delete(delete_meal),
        )
}

#[instrument(skip(state, query))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<MealListResponse>, ApiError> {
    let Query(p) = query.map_err(bad_request)?;
    let meals = state
        .meals
        .list_active(user_id, p.into())
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "list_meals failed");
            internal("Error retrieving meals")
        })?;
    Ok(Json(MealListResponse {
        meals: meals.into_iter().map(MealResponse::from).collect(),
    }))
}

#[instrument(skip(state, path))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MealResponse>, ApiError> {
    let Path(id) = path.map_err(bad_request)?;
    match state.meals.find_active(user_id, id).await {
        Ok(Some(meal)) => Ok(Json(meal.into())),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, MEAL_NOT_FOUND)),
        Err(e) => {
            error!(error = %e, %user_id, %id, "get_meal failed");
            Err(internal("Error retrieving meal"))
        }
    }
}

#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<MealRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<MealResponse>), ApiError> {
    let Json(body) = body.map_err(bad_request)?;
    let draft = body.into_draft().map_err(|msg| {
        warn!(%user_id, reason = %msg, "invalid meal");
        api_error(StatusCode::BAD_REQUEST, msg)
    })?;

    let meal = state.meals.insert(user_id, draft).await.map_err(|e| {
        error!(error = %e, %user_id, "create_meal failed");
        internal("Error creating meal")
    })?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/meals/{}", meal.id)) {
        headers.insert(header::LOCATION, location);
    }

    info!(%user_id, meal_id = %meal.id, "meal created");
    Ok((StatusCode::CREATED, headers, Json(meal.into())))
}

#[instrument(skip(state, path, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<MealRequest>, JsonRejection>,
) -> Result<Json<MealResponse>, ApiError> {
    let Path(id) = path.map_err(bad_request)?;
    let Json(body) = body.map_err(bad_request)?;
    let draft = body.into_draft().map_err(|msg| {
        warn!(%user_id, %id, reason = %msg, "invalid meal");
        api_error(StatusCode::BAD_REQUEST, msg)
    })?;

    match state.meals.update(user_id, id, draft).await {
        Ok(Some(meal)) => {
            info!(%user_id, meal_id = %id, "meal updated");
            Ok(Json(meal.into()))
        }
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, MEAL_NOT_FOUND)),
        Err(e) => {
            error!(error = %e, %user_id, %id, "update_meal failed");
            Err(internal("Error updating meal"))
        }
    }
}

#[instrument(skip(state, path))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path.map_err(bad_request)?;
    match state.meals.soft_delete(user_id, id).await {
        Ok(true) => {
            info!(%user_id, meal_id = %id, "meal deleted");
            Ok(Json(MessageResponse::new("Meal deleted successfully")))
        }
        Ok(false) => Err(api_error(StatusCode::NOT_FOUND, MEAL_NOT_FOUND)),
        Err(e) => {
            error!(error = %e, %user_id, %id, "delete_meal failed");
            Err(internal("Error deleting meal"))
        }
    }
}
