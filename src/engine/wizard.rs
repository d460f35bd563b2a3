use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::engine::completion::{overall_completion, segment_completion, status_for};
use crate::engine::validation::{TouchedFields, all_field_keys, validate_segments};
use crate::geo::ParsedAddress;
use crate::i18n::{Locale, Message};
use crate::models::location::{LatLng, PointFieldUpdate, PointType};
use crate::models::order::{Order, ROUTE_SEGMENTS_SCHEMA};
use crate::models::package::{PackageFieldUpdate, PackageUpdateError};
use crate::models::segment::RouteSegment;
use crate::models::user::UserIdentity;
use crate::models::vehicle::{
    MotorbikeOptions, OrderType, TransportOptions, TransportType, VehicleOptions,
};

pub const DEFAULT_NOTIFICATION_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    PlanRoute,
    VehicleOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub shown_at: DateTime<Utc>,
    pub dismiss_after_ms: u64,
}

impl Notification {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.shown_at + Duration::milliseconds(self.dismiss_after_ms as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub locale: Locale,
    pub transport_type: TransportType,
    pub order_type: OrderType,
    pub step: WizardStep,
    pub route_segments: Vec<RouteSegment>,
    pub vehicle_options: VehicleOptions,
    pub motorbike_options: MotorbikeOptions,
    pub return_to_pickup: bool,
    pub sender: UserIdentity,
    pub touched: TouchedFields,
    pub notification: Option<Notification>,
    /// Latest reverse-geocode request per point id.
    pub geocode_tokens: BTreeMap<Uuid, u64>,
    /// Points with a reverse-geocode request still in flight.
    pub geocoding: BTreeSet<Uuid>,
    pub submitted: bool,
}

/// One field-group change within a segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "group", content = "update", rename_all = "lowercase")]
pub enum SegmentUpdate {
    Pickup(PointFieldUpdate),
    Dropoff(PointFieldUpdate),
    Package(PackageFieldUpdate),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum WizardAction {
    AddSegment,
    RemoveSegment {
        index: usize,
    },
    UpdateSegment {
        index: usize,
        updates: Vec<SegmentUpdate>,
    },
    UpdatePhone {
        index: usize,
        point_type: PointType,
        phone: String,
    },
    SetLocation {
        index: usize,
        point_type: PointType,
        location: Option<LatLng>,
    },
    GeocodeResolved {
        point_id: Uuid,
        token: u64,
        address: ParsedAddress,
    },
    GeocodeFailed {
        point_id: Uuid,
        token: u64,
    },
    TouchField {
        key: String,
    },
    UpdateVehicleOptions {
        options: VehicleOptions,
    },
    UpdateMotorbikeOptions {
        options: MotorbikeOptions,
    },
    SetReturnToPickup {
        value: bool,
    },
    NextStep,
    PreviousStep,
    DismissNotification,
    Submit,
}

impl WizardAction {
    pub fn name(&self) -> &'static str {
        match self {
            WizardAction::AddSegment => "add-segment",
            WizardAction::RemoveSegment { .. } => "remove-segment",
            WizardAction::UpdateSegment { .. } => "update-segment",
            WizardAction::UpdatePhone { .. } => "update-phone",
            WizardAction::SetLocation { .. } => "set-location",
            WizardAction::GeocodeResolved { .. } => "geocode-resolved",
            WizardAction::GeocodeFailed { .. } => "geocode-failed",
            WizardAction::TouchField { .. } => "touch-field",
            WizardAction::UpdateVehicleOptions { .. } => "update-vehicle-options",
            WizardAction::UpdateMotorbikeOptions { .. } => "update-motorbike-options",
            WizardAction::SetReturnToPickup { .. } => "set-return-to-pickup",
            WizardAction::NextStep => "next-step",
            WizardAction::PreviousStep => "previous-step",
            WizardAction::DismissNotification => "dismiss-notification",
            WizardAction::Submit => "submit",
        }
    }
}

/// Work the caller performs after a transition is committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ReverseGeocode {
        point_id: Uuid,
        token: u64,
        location: LatLng,
        locale: Locale,
    },
    PersistOrder(Order),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Applied,
    /// A gated transition was refused and a notification raised.
    Blocked,
    /// A geocode response arrived for a superseded request.
    Stale,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Applied => "applied",
            Outcome::Blocked => "blocked",
            Outcome::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: WizardState,
    pub effects: Vec<Effect>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WizardError {
    #[error("segment {0} does not exist")]
    SegmentOutOfRange(usize),

    #[error("the last remaining segment cannot be removed")]
    LastSegment,

    #[error("segments can only be added to multi-direction orders")]
    SingleDirectionOrder,

    #[error("package images are limited to 5")]
    TooManyImages,

    #[error("package image {0} does not exist")]
    NoSuchImage(usize),

    #[error("action {action} is not available on step {step:?}")]
    WrongStep { action: &'static str, step: WizardStep },

    #[error("order has already been submitted")]
    AlreadySubmitted,

    #[error("unknown field {0}")]
    UnknownField(String),
}

impl From<PackageUpdateError> for WizardError {
    fn from(err: PackageUpdateError) -> Self {
        match err {
            PackageUpdateError::TooManyImages => WizardError::TooManyImages,
            PackageUpdateError::NoSuchImage(index) => WizardError::NoSuchImage(index),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WizardContext {
    pub now: DateTime<Utc>,
    pub notification_timeout_ms: u64,
}

impl WizardContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            notification_timeout_ms: DEFAULT_NOTIFICATION_TIMEOUT_MS,
        }
    }
}

impl WizardState {
    pub fn new(
        transport_type: TransportType,
        order_type: OrderType,
        locale: Locale,
        sender: UserIdentity,
    ) -> Self {
        let first = RouteSegment::new(1, locale, Some(&sender));
        Self {
            locale,
            transport_type,
            order_type,
            step: WizardStep::PlanRoute,
            route_segments: vec![first],
            vehicle_options: VehicleOptions::default(),
            motorbike_options: MotorbikeOptions::default(),
            return_to_pickup: false,
            sender,
            touched: TouchedFields::new(),
            notification: None,
            geocode_tokens: BTreeMap::new(),
            geocoding: BTreeSet::new(),
            submitted: false,
        }
    }

    /// Reopens a previously submitted order for editing.
    pub fn resume(order: Order, locale: Locale, sender: UserIdentity) -> Self {
        let mut state = Self::new(order.transport_type, order.order_type, locale, sender);
        if !order.route_segments.is_empty() {
            state.route_segments = order.route_segments;
        }
        match order.vehicle_options {
            TransportOptions::Vehicle(options) => state.vehicle_options = options,
            TransportOptions::Motorbike(options) => state.motorbike_options = options,
        }
        state.return_to_pickup = order.return_to_pickup;
        state.refresh_statuses();
        state
    }

    pub fn transport_options(&self) -> TransportOptions {
        match self.transport_type {
            TransportType::Truck => TransportOptions::Vehicle(self.vehicle_options.clone()),
            TransportType::Motorbike => TransportOptions::Motorbike(self.motorbike_options.clone()),
        }
    }

    pub fn overall_completion(&self) -> u8 {
        overall_completion(&self.route_segments)
    }

    pub fn can_plan_route_proceed(&self) -> bool {
        match self.order_type {
            OrderType::MultiDirection => self
                .route_segments
                .iter()
                .all(|segment| segment_completion(segment) == 100),
            OrderType::SingleDirection => true,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.overall_completion() == 100 && self.transport_options().is_complete()
    }

    fn segment_mut(&mut self, index: usize) -> Result<&mut RouteSegment, WizardError> {
        self.route_segments
            .get_mut(index)
            .ok_or(WizardError::SegmentOutOfRange(index))
    }

    /// Point labels follow segment position.
    fn relabel(&mut self) {
        let locale = self.locale;
        for (position, segment) in self.route_segments.iter_mut().enumerate() {
            for point_type in [PointType::Pickup, PointType::Dropoff] {
                segment.point_mut(point_type).label = locale.point_label(point_type, position + 1);
            }
        }
    }

    fn refresh_statuses(&mut self) {
        for segment in &mut self.route_segments {
            segment.status = status_for(segment);
        }
    }

    fn notify(&mut self, message: Message, ctx: &WizardContext) {
        self.notification = Some(Notification {
            message: self.locale.text(message).to_string(),
            shown_at: ctx.now,
            dismiss_after_ms: ctx.notification_timeout_ms,
        });
    }

    fn build_order(&self, created_at: DateTime<Utc>) -> Order {
        Order {
            schema_version: ROUTE_SEGMENTS_SCHEMA,
            transport_type: self.transport_type,
            order_type: self.order_type,
            route_segments: self.route_segments.clone(),
            vehicle_options: self.transport_options(),
            return_to_pickup: self.return_to_pickup,
            created_at,
        }
    }
}

/// Applies `action` to a copy of `state`.
///
/// Errors leave `state` untouched. Gated transitions that fail are not errors:
/// they come back as [`Outcome::Blocked`] with a notification set.
pub fn reduce(
    state: &WizardState,
    action: WizardAction,
    ctx: &WizardContext,
) -> Result<Transition, WizardError> {
    if state.submitted {
        return Err(WizardError::AlreadySubmitted);
    }

    let mut next = state.clone();
    let mut effects = Vec::new();
    let mut outcome = Outcome::Applied;

    match action {
        WizardAction::AddSegment => {
            if next.order_type != OrderType::MultiDirection {
                return Err(WizardError::SingleDirectionOrder);
            }
            let ordinal = next.route_segments.len() + 1;
            let segment = RouteSegment::new(ordinal, next.locale, Some(&next.sender));
            next.route_segments.push(segment);
        }
        WizardAction::RemoveSegment { index } => {
            if index >= next.route_segments.len() {
                return Err(WizardError::SegmentOutOfRange(index));
            }
            if next.route_segments.len() == 1 {
                return Err(WizardError::LastSegment);
            }
            let removed = next.route_segments.remove(index);
            let prefix = format!("{}-", removed.id);
            next.touched.retain(|key| !key.starts_with(&prefix));
            for point_id in [removed.pickup_point.id, removed.dropoff_point.id] {
                next.geocode_tokens.remove(&point_id);
                next.geocoding.remove(&point_id);
            }
            next.relabel();
        }
        WizardAction::UpdateSegment { index, updates } => {
            let segment = next.segment_mut(index)?;
            for update in updates {
                match update {
                    SegmentUpdate::Pickup(update) => segment.pickup_point.apply(update),
                    SegmentUpdate::Dropoff(update) => segment.dropoff_point.apply(update),
                    SegmentUpdate::Package(update) => segment.package_details.apply(update)?,
                }
            }
            segment.status = status_for(segment);
        }
        WizardAction::UpdatePhone {
            index,
            point_type,
            phone,
        } => {
            let segment = next.segment_mut(index)?;
            segment
                .point_mut(point_type)
                .apply(PointFieldUpdate::ContactPhone(phone));
            segment.status = status_for(segment);
        }
        WizardAction::SetLocation {
            index,
            point_type,
            location,
        } => {
            let locale = next.locale;
            let segment = next.segment_mut(index)?;
            let point = segment.point_mut(point_type);
            point.set_location(location);
            let point_id = point.id;
            segment.status = status_for(segment);

            let token = next.geocode_tokens.entry(point_id).or_insert(0);
            *token += 1;
            let token = *token;

            match location {
                Some(location) => {
                    next.geocoding.insert(point_id);
                    effects.push(Effect::ReverseGeocode {
                        point_id,
                        token,
                        location,
                        locale,
                    });
                }
                None => {
                    next.geocoding.remove(&point_id);
                }
            }
        }
        WizardAction::GeocodeResolved {
            point_id,
            token,
            address,
        } => {
            let current = next.geocode_tokens.get(&point_id) == Some(&token);
            let point = if current {
                next.route_segments
                    .iter_mut()
                    .find_map(|segment| segment.find_point_mut(point_id))
            } else {
                None
            };
            match point {
                Some(point) => {
                    point.apply_address(&address);
                    next.geocoding.remove(&point_id);
                }
                None => outcome = Outcome::Stale,
            }
        }
        WizardAction::GeocodeFailed { point_id, token } => {
            if next.geocode_tokens.get(&point_id) == Some(&token) {
                next.geocoding.remove(&point_id);
            } else {
                outcome = Outcome::Stale;
            }
        }
        WizardAction::TouchField { key } => {
            if !all_field_keys(&next.route_segments).any(|known| known == key) {
                return Err(WizardError::UnknownField(key));
            }
            next.touched.insert(key);
        }
        WizardAction::UpdateVehicleOptions { options } => next.vehicle_options = options,
        WizardAction::UpdateMotorbikeOptions { options } => next.motorbike_options = options,
        WizardAction::SetReturnToPickup { value } => next.return_to_pickup = value,
        WizardAction::NextStep => {
            if next.step != WizardStep::PlanRoute {
                return Err(WizardError::WrongStep {
                    action: "next-step",
                    step: next.step,
                });
            }
            if next.can_plan_route_proceed() {
                next.step = WizardStep::VehicleOptions;
                next.notification = None;
            } else {
                next.notify(Message::IncompleteOrder, ctx);
                outcome = Outcome::Blocked;
            }
        }
        WizardAction::PreviousStep => {
            next.step = WizardStep::PlanRoute;
        }
        WizardAction::DismissNotification => next.notification = None,
        WizardAction::Submit => {
            if next.step != WizardStep::VehicleOptions {
                return Err(WizardError::WrongStep {
                    action: "submit",
                    step: next.step,
                });
            }
            let errors = validate_segments(&next.route_segments, next.locale);
            if !errors.is_empty() || !next.can_submit() {
                let keys: Vec<String> = all_field_keys(&next.route_segments).collect();
                next.touched.extend(keys);
                next.notify(Message::IncompleteOrder, ctx);
                outcome = Outcome::Blocked;
            } else {
                next.notification = None;
                next.submitted = true;
                effects.push(Effect::PersistOrder(next.build_order(ctx.now)));
            }
        }
    }

    Ok(Transition {
        state: next,
        effects,
        outcome,
    })
}
