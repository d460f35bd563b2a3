use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use serde_json::Value;
use uuid::Uuid;

use crate::engine::converter::{get_route_segments, load_and_convert_order_data};
use crate::error::AppError;
use crate::models::order::LegacyOrder;
use crate::models::segment::RouteSegment;
use crate::models::user::UserIdentity;
use crate::state::AppState;
use crate::storage::{ORDER_DETAILS_KEY, USER_DATA_KEY};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients/:client_id/order", get(get_stored_order))
        .route("/clients/:client_id/order/legacy", get(get_legacy_order))
        .route("/clients/:client_id/order/segments", get(get_segments))
        .route("/clients/:client_id/profile", put(put_profile))
}

async fn get_stored_order(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let order = state
        .session_storage
        .load_json::<Value>(client_id, ORDER_DETAILS_KEY)
        .ok_or_else(|| AppError::NotFound(format!("no stored order for client {client_id}")))?;

    Ok(Json(order))
}

async fn get_legacy_order(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<LegacyOrder>, AppError> {
    let order = load_and_convert_order_data(&state.session_storage, client_id)
        .ok_or_else(|| AppError::NotFound(format!("no stored order for client {client_id}")))?;

    Ok(Json(order))
}

/// `null` when the stored order predates route segments.
async fn get_segments(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
) -> Json<Option<Vec<RouteSegment>>> {
    Json(get_route_segments(&state.session_storage, client_id))
}

async fn put_profile(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<UserIdentity>,
) -> Result<StatusCode, AppError> {
    if !payload.is_usable() {
        return Err(AppError::BadRequest(
            "name and phone cannot be empty".to_string(),
        ));
    }

    state
        .local_storage
        .save_json(client_id, USER_DATA_KEY, &payload)?;
    Ok(StatusCode::NO_CONTENT)
}
