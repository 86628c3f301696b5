pub mod engine;
pub mod handlers;
pub mod service;
pub mod tally;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::metrics_routes()
}
