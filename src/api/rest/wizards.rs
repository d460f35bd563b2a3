use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::controller::{
    DispatchResult, OpenWizard, WizardView, close_wizard, dispatch, open_wizard, view_wizard,
};
use crate::engine::wizard::WizardAction;
use crate::error::AppError;
use crate::i18n::Locale;
use crate::models::vehicle::{OrderType, TransportType};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/wizards", post(create_wizard))
        .route("/wizards/:id", get(get_wizard).delete(delete_wizard))
        .route("/wizards/:id/actions", post(apply_action))
}

fn default_resume() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWizardRequest {
    pub client_id: Option<Uuid>,
    pub transport_type: TransportType,
    pub order_type: OrderType,
    pub locale: Option<Locale>,
    #[serde(default = "default_resume")]
    pub resume: bool,
}

async fn create_wizard(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateWizardRequest>,
) -> Result<Json<WizardView>, AppError> {
    let view = open_wizard(
        &state,
        OpenWizard {
            client_id: payload.client_id.unwrap_or_else(Uuid::new_v4),
            transport_type: payload.transport_type,
            order_type: payload.order_type,
            locale: payload.locale,
            resume: payload.resume,
        },
    );

    Ok(Json(view))
}

async fn get_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, AppError> {
    Ok(Json(view_wizard(&state, id)?))
}

async fn delete_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    close_wizard(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(action): Json<WizardAction>,
) -> Result<Json<DispatchResult>, AppError> {
    Ok(Json(dispatch(&state, id, action)?))
}
