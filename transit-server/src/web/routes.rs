//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::error;

use crate::domain::{StopId, TripId};
use crate::planner::{PlanError, TripPlanner};
use crate::store::TransitStore;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/journey/plan", post(plan_journey))
        .route("/stops", get(list_stops))
        .route("/stops/:id", get(get_stop))
        .route("/routes", get(list_routes))
        .route("/trips/:id", get(get_trip))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan a journey between two coordinates.
///
/// Builds a fresh planner for the request, so searches from concurrent
/// clients never share penalty state.
async fn plan_journey(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    let planner = TripPlanner::new(state.store.as_ref(), (*state.config).clone());
    let result = planner.plan(
        request.origin.to_point(),
        request.destination.to_point(),
        request.departure,
    )?;
    Ok(Json(PlanResponse::from(&result)))
}

/// List every stop in the network.
async fn list_stops(State(state): State<AppState>) -> Json<Vec<StopResult>> {
    Json(state.store.all_stops().iter().map(StopResult::from).collect())
}

/// Fetch one stop by id.
async fn get_stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StopResult>, AppError> {
    state
        .store
        .stop_by_id(&StopId::new(id.as_str()))
        .map(|stop| Json(StopResult::from(stop)))
        .ok_or_else(|| AppError::NotFound {
            message: format!("no stop with id {id}"),
        })
}

/// List every route in the network.
async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteResult>> {
    Json(
        state
            .store
            .all_routes()
            .iter()
            .map(RouteResult::from)
            .collect(),
    )
}

/// Fetch one trip by id, joined with its route.
async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TripResult>, AppError> {
    state
        .store
        .trip_with_route(&TripId::new(id.as_str()))
        .map(|(trip, route)| Json(TripResult::new(trip, route)))
        .ok_or_else(|| AppError::NotFound {
            message: format!("no trip with id {id}"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::InvalidRequest(message) => AppError::BadRequest { message },
            PlanError::InconsistentData(message) => AppError::Internal {
                message: format!("inconsistent schedule data: {message}"),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
