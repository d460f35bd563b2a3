use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::completion::{segment_completion, status_for};
use crate::engine::converter::{parse_order, route_segments};
use crate::engine::validation::{ValidationErrors, validate_segments, visible_errors};
use crate::engine::wizard::{
    Effect, Notification, Outcome, Transition, WizardAction, WizardContext, WizardState,
    WizardStep, reduce,
};
use crate::error::AppError;
use crate::geo::parse_address;
use crate::i18n::{Locale, TextDirection};
use crate::models::location::LatLng;
use crate::models::order::Order;
use crate::models::segment::{RouteSegment, SegmentStatus};
use crate::models::user::UserIdentity;
use crate::models::vehicle::{MotorbikeOptions, OrderType, TransportType, VehicleOptions};
use crate::state::AppState;
use crate::storage::{ORDER_DETAILS_KEY, USER_DATA_KEY};

pub struct WizardSession {
    pub id: Uuid,
    pub client_id: Uuid,
    pub state: WizardState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmitted {
    pub wizard_id: Uuid,
    pub client_id: Uuid,
    pub order: Order,
}

#[derive(Debug, Clone)]
pub struct OpenWizard {
    pub client_id: Uuid,
    pub transport_type: TransportType,
    pub order_type: OrderType,
    pub locale: Option<Locale>,
    pub resume: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentProgress {
    pub segment_id: Uuid,
    pub completion: u8,
    pub status: SegmentStatus,
}

/// Wizard state plus everything derived from it for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub id: Uuid,
    pub client_id: Uuid,
    pub locale: Locale,
    pub direction: TextDirection,
    pub step: WizardStep,
    pub transport_type: TransportType,
    pub order_type: OrderType,
    pub route_segments: Vec<RouteSegment>,
    pub vehicle_options: VehicleOptions,
    pub motorbike_options: MotorbikeOptions,
    pub return_to_pickup: bool,
    pub overall_completion: u8,
    pub progress: Vec<SegmentProgress>,
    pub errors: ValidationErrors,
    pub can_proceed: bool,
    pub can_submit: bool,
    pub geocoding: Vec<Uuid>,
    pub notification: Option<Notification>,
    pub submitted: bool,
}

impl WizardView {
    pub fn new(session: &WizardSession, now: DateTime<Utc>) -> Self {
        let state = &session.state;
        let errors = validate_segments(&state.route_segments, state.locale);

        Self {
            id: session.id,
            client_id: session.client_id,
            locale: state.locale,
            direction: state.locale.direction(),
            step: state.step,
            transport_type: state.transport_type,
            order_type: state.order_type,
            route_segments: state.route_segments.clone(),
            vehicle_options: state.vehicle_options.clone(),
            motorbike_options: state.motorbike_options.clone(),
            return_to_pickup: state.return_to_pickup,
            overall_completion: state.overall_completion(),
            progress: state
                .route_segments
                .iter()
                .map(|segment| SegmentProgress {
                    segment_id: segment.id,
                    completion: segment_completion(segment),
                    status: status_for(segment),
                })
                .collect(),
            errors: visible_errors(&errors, &state.touched),
            can_proceed: state.can_plan_route_proceed(),
            can_submit: state.can_submit(),
            geocoding: state.geocoding.iter().copied().collect(),
            notification: state
                .notification
                .clone()
                .filter(|notification| notification.is_active(now)),
            submitted: state.submitted,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub path: String,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub outcome: Outcome,
    pub wizard: WizardView,
    pub redirect: Option<Redirect>,
}

/// Sender identity for `client_id`, or the configured fallback when the
/// stored profile is missing, malformed or blank.
pub fn current_user(state: &AppState, client_id: Uuid) -> UserIdentity {
    state
        .local_storage
        .load_json::<UserIdentity>(client_id, USER_DATA_KEY)
        .filter(UserIdentity::is_usable)
        .unwrap_or_else(|| state.config.fallback_user.clone())
}

pub fn open_wizard(state: &AppState, request: OpenWizard) -> WizardView {
    let now = Utc::now();
    let locale = request.locale.unwrap_or(state.config.default_locale);
    let sender = current_user(state, request.client_id);

    let stored: Option<Value> = if request.resume {
        state
            .session_storage
            .load_json(request.client_id, ORDER_DETAILS_KEY)
    } else {
        None
    };

    let wizard_state = match stored {
        Some(stored) => resume_state(&stored, &request, locale, sender),
        None => WizardState::new(request.transport_type, request.order_type, locale, sender),
    };

    let session = WizardSession {
        id: Uuid::new_v4(),
        client_id: request.client_id,
        state: wizard_state,
        created_at: now,
        updated_at: now,
    };
    let view = WizardView::new(&session, now);

    info!(
        wizard_id = %session.id,
        client_id = %session.client_id,
        segments = session.state.route_segments.len(),
        "wizard opened"
    );
    state.wizards.insert(session.id, session);
    state.metrics.active_wizards.inc();

    view
}

fn resume_state(
    stored: &Value,
    request: &OpenWizard,
    locale: Locale,
    sender: UserIdentity,
) -> WizardState {
    if let Some(order) = parse_order(stored) {
        return WizardState::resume(order, locale, sender);
    }

    let mut fresh = WizardState::new(request.transport_type, request.order_type, locale, sender);
    match route_segments(stored) {
        Some(segments) if !segments.is_empty() => {
            fresh.route_segments = segments;
            for segment in &mut fresh.route_segments {
                segment.status = status_for(segment);
            }
        }
        _ => {
            info!(client_id = %request.client_id, "stored order has no route segments; starting fresh");
        }
    }
    fresh
}

pub fn view_wizard(state: &AppState, wizard_id: Uuid) -> Result<WizardView, AppError> {
    let session = state
        .wizards
        .get(&wizard_id)
        .ok_or_else(|| AppError::NotFound(format!("wizard {wizard_id} not found")))?;
    Ok(WizardView::new(session.value(), Utc::now()))
}

pub fn close_wizard(state: &AppState, wizard_id: Uuid) -> Result<(), AppError> {
    state
        .wizards
        .remove(&wizard_id)
        .ok_or_else(|| AppError::NotFound(format!("wizard {wizard_id} not found")))?;
    state.metrics.active_wizards.dec();
    info!(%wizard_id, "wizard closed");
    Ok(())
}

/// Closes wizards untouched since before `now - idle_ttl`. Returns how many.
pub fn prune_idle_wizards(state: &AppState, now: DateTime<Utc>) -> usize {
    let cutoff = now - chrono::Duration::seconds(state.config.wizard_idle_ttl_secs as i64);
    let before = state.wizards.len();
    state.wizards.retain(|_, session| session.updated_at >= cutoff);
    let pruned = before.saturating_sub(state.wizards.len());

    if pruned > 0 {
        state.metrics.active_wizards.sub(pruned as i64);
        info!(pruned, "closed idle wizards");
    }
    pruned
}

/// Prunes idle wizards every `wizard_prune_interval_secs`.
pub async fn run_idle_wizard_sweeper(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(
        state.config.wizard_prune_interval_secs.max(1),
    ));
    loop {
        ticker.tick().await;
        prune_idle_wizards(&state, Utc::now());
    }
}

/// Runs one action through the reducer and carries out its effects.
pub fn dispatch(
    state: &Arc<AppState>,
    wizard_id: Uuid,
    action: WizardAction,
) -> Result<DispatchResult, AppError> {
    let action_name = action.name();
    let ctx = WizardContext {
        now: Utc::now(),
        notification_timeout_ms: state.config.notification_timeout_ms,
    };

    let (client_id, effects, outcome, view) = {
        let mut session = state
            .wizards
            .get_mut(&wizard_id)
            .ok_or_else(|| AppError::NotFound(format!("wizard {wizard_id} not found")))?;

        let Transition {
            state: next,
            effects,
            outcome,
        } = match reduce(&session.state, action, &ctx) {
            Ok(transition) => transition,
            Err(err) => {
                state
                    .metrics
                    .wizard_actions_total
                    .with_label_values(&[action_name, "rejected"])
                    .inc();
                debug!(%wizard_id, action = action_name, error = %err, "wizard action rejected");
                return Err(err.into());
            }
        };

        session.state = next;
        session.updated_at = ctx.now;
        (
            session.client_id,
            effects,
            outcome,
            WizardView::new(&session, ctx.now),
        )
    };

    state
        .metrics
        .wizard_actions_total
        .with_label_values(&[action_name, outcome.as_str()])
        .inc();

    let mut redirect = None;
    for effect in effects {
        match effect {
            Effect::ReverseGeocode {
                point_id,
                token,
                location,
                locale,
            } => spawn_reverse_geocode(state.clone(), wizard_id, point_id, token, location, locale),
            Effect::PersistOrder(order) => {
                persist_order(state, wizard_id, client_id, order)?;
                close_wizard(state, wizard_id)?;
                redirect = Some(Redirect {
                    path: state.config.summary_path.clone(),
                    delay_ms: state.config.summary_delay_ms,
                });
            }
        }
    }

    Ok(DispatchResult {
        outcome,
        wizard: view,
        redirect,
    })
}

fn persist_order(
    state: &AppState,
    wizard_id: Uuid,
    client_id: Uuid,
    order: Order,
) -> Result<(), AppError> {
    state
        .session_storage
        .save_json(client_id, ORDER_DETAILS_KEY, &order)?;

    let transport = match order.transport_type {
        TransportType::Truck => "truck",
        TransportType::Motorbike => "motorbike",
    };
    state
        .metrics
        .orders_submitted_total
        .with_label_values(&[transport])
        .inc();

    info!(
        %wizard_id,
        %client_id,
        segments = order.route_segments.len(),
        transport,
        "order submitted"
    );

    let _ = state.order_events_tx.send(OrderSubmitted {
        wizard_id,
        client_id,
        order,
    });
    Ok(())
}

fn spawn_reverse_geocode(
    state: Arc<AppState>,
    wizard_id: Uuid,
    point_id: Uuid,
    token: u64,
    location: LatLng,
    locale: Locale,
) {
    tokio::spawn(async move {
        let action = match state.geocoder.geocode(location, locale).await {
            Ok(results) => match results.first() {
                Some(result) => {
                    state
                        .metrics
                        .geocode_requests_total
                        .with_label_values(&["success"])
                        .inc();
                    WizardAction::GeocodeResolved {
                        point_id,
                        token,
                        address: parse_address(result),
                    }
                }
                None => {
                    state
                        .metrics
                        .geocode_requests_total
                        .with_label_values(&["empty"])
                        .inc();
                    warn!(%wizard_id, %point_id, "geocoder returned no results");
                    WizardAction::GeocodeFailed { point_id, token }
                }
            },
            Err(err) => {
                state
                    .metrics
                    .geocode_requests_total
                    .with_label_values(&["error"])
                    .inc();
                warn!(%wizard_id, %point_id, error = %err, "reverse geocoding failed");
                WizardAction::GeocodeFailed { point_id, token }
            }
        };

        if let Err(err) = dispatch(&state, wizard_id, action) {
            debug!(%wizard_id, %point_id, error = %err, "dropping geocode result");
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use uuid::Uuid;

    use chrono::Utc;

    use super::{
        OpenWizard, current_user, dispatch, open_wizard, prune_idle_wizards, view_wizard,
    };
    use crate::error::AppError;
    use crate::config::Config;
    use crate::engine::completion::tests::complete_segment;
    use crate::engine::converter::get_route_segments;
    use crate::engine::wizard::{Outcome, WizardAction};
    use crate::geo::geocoder::GeocodeFixture;
    use crate::geo::{AddressComponent, GeocodeResult, StaticGeocoder};
    use crate::i18n::Locale;
    use crate::models::location::{LatLng, PointType};
    use crate::models::user::UserIdentity;
    use crate::models::vehicle::{OrderType, TransportType, VehicleOptions};
    use crate::state::AppState;
    use crate::storage::{ORDER_DETAILS_KEY, USER_DATA_KEY};

    fn app_state(geocoder: StaticGeocoder) -> Arc<AppState> {
        Arc::new(AppState::new(Config::default(), Arc::new(geocoder)))
    }

    fn open(state: &AppState, client_id: Uuid, order_type: OrderType) -> Uuid {
        open_wizard(
            state,
            OpenWizard {
                client_id,
                transport_type: TransportType::Truck,
                order_type,
                locale: Some(Locale::En),
                resume: true,
            },
        )
        .id
    }

    #[test]
    fn falls_back_to_configured_identity() {
        let state = app_state(StaticGeocoder::empty());
        let client = Uuid::new_v4();

        assert_eq!(current_user(&state, client), state.config.fallback_user);

        state.local_storage.set_item(client, USER_DATA_KEY, "{\"name\": 3}".to_string());
        assert_eq!(current_user(&state, client), state.config.fallback_user);

        let user = UserIdentity {
            name: "Noura".to_string(),
            phone: "+966533333333".to_string(),
        };
        state.local_storage.save_json(client, USER_DATA_KEY, &user).unwrap();
        assert_eq!(current_user(&state, client), user);
    }

    #[tokio::test]
    async fn submit_writes_the_order_and_resumes_it_on_next_mount() {
        let state = app_state(StaticGeocoder::empty());
        let client = Uuid::new_v4();
        let wizard_id = open(&state, client, OrderType::MultiDirection);
        let mut events = state.order_events_tx.subscribe();

        {
            let mut session = state.wizards.get_mut(&wizard_id).unwrap();
            session.state.route_segments = vec![complete_segment(), complete_segment()];
        }
        dispatch(&state, wizard_id, WizardAction::NextStep).unwrap();
        dispatch(
            &state,
            wizard_id,
            WizardAction::UpdateVehicleOptions {
                options: VehicleOptions {
                    truck_type: "refrigerated".to_string(),
                    ..Default::default()
                },
            },
        )
        .unwrap();

        let result = dispatch(&state, wizard_id, WizardAction::Submit).unwrap();
        assert_eq!(result.outcome, Outcome::Applied);
        let redirect = result.redirect.unwrap();
        assert_eq!(redirect.delay_ms, 800);

        assert!(matches!(
            view_wizard(&state, wizard_id),
            Err(AppError::NotFound(_))
        ));

        let stored = get_route_segments(&state.session_storage, client).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(events.recv().await.unwrap().client_id, client);

        let resumed = open(&state, client, OrderType::SingleDirection);
        let view = view_wizard(&state, resumed).unwrap();
        assert_eq!(view.order_type, OrderType::MultiDirection);
        assert_eq!(view.route_segments.len(), 2);
        assert_eq!(view.vehicle_options.truck_type, "refrigerated");
        assert_eq!(view.overall_completion, 100);
    }

    #[test]
    fn idle_wizards_are_closed() {
        let state = app_state(StaticGeocoder::empty());
        let idle = open(&state, Uuid::new_v4(), OrderType::SingleDirection);
        let fresh = open(&state, Uuid::new_v4(), OrderType::SingleDirection);

        let ttl = chrono::Duration::seconds(state.config.wizard_idle_ttl_secs as i64);
        state.wizards.get_mut(&idle).unwrap().updated_at = Utc::now() - ttl - ttl;

        assert_eq!(prune_idle_wizards(&state, Utc::now()), 1);
        assert!(view_wizard(&state, idle).is_err());
        assert!(view_wizard(&state, fresh).is_ok());
        assert_eq!(state.metrics.active_wizards.get(), 1);
    }

    #[test]
    fn legacy_stored_order_starts_a_fresh_wizard() {
        let state = app_state(StaticGeocoder::empty());
        let client = Uuid::new_v4();
        state.session_storage.set_item(
            client,
            ORDER_DETAILS_KEY,
            r#"{"transportType":"truck","locationPoints":[]}"#.to_string(),
        );

        let view = view_wizard(&state, open(&state, client, OrderType::SingleDirection)).unwrap();
        assert_eq!(view.route_segments.len(), 1);
        assert_eq!(view.overall_completion, 0);
    }

    #[tokio::test]
    async fn map_click_fills_the_address_from_the_geocoder() {
        let location = LatLng { lat: 24.7136, lng: 46.6753 };
        let geocoder = StaticGeocoder::new(vec![GeocodeFixture {
            location,
            locale: None,
            results: vec![GeocodeResult {
                address_components: vec![AddressComponent {
                    long_name: "Riyadh".to_string(),
                    short_name: "Riyadh".to_string(),
                    types: vec!["locality".to_string()],
                }],
                formatted_address: "Riyadh".to_string(),
            }],
        }]);
        let state = app_state(geocoder);
        let wizard_id = open(&state, Uuid::new_v4(), OrderType::SingleDirection);

        let result = dispatch(
            &state,
            wizard_id,
            WizardAction::SetLocation {
                index: 0,
                point_type: PointType::Pickup,
                location: Some(location),
            },
        )
        .unwrap();
        assert_eq!(result.wizard.geocoding.len(), 1);

        let mut view = view_wizard(&state, wizard_id).unwrap();
        for _ in 0..50 {
            if view.geocoding.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            view = view_wizard(&state, wizard_id).unwrap();
        }

        assert!(view.geocoding.is_empty());
        assert_eq!(view.route_segments[0].pickup_point.city, "Riyadh");
    }

    #[tokio::test]
    async fn geocoder_failure_leaves_the_address_empty() {
        let state = app_state(StaticGeocoder::empty());
        let wizard_id = open(&state, Uuid::new_v4(), OrderType::SingleDirection);

        dispatch(
            &state,
            wizard_id,
            WizardAction::SetLocation {
                index: 0,
                point_type: PointType::Dropoff,
                location: Some(LatLng { lat: 1.0, lng: 1.0 }),
            },
        )
        .unwrap();

        let mut view = view_wizard(&state, wizard_id).unwrap();
        for _ in 0..50 {
            if view.geocoding.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            view = view_wizard(&state, wizard_id).unwrap();
        }

        assert!(view.geocoding.is_empty());
        assert!(view.route_segments[0].dropoff_point.location.is_some());
        assert!(view.route_segments[0].dropoff_point.city.is_empty());
    }
}
