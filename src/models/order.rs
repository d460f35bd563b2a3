use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::{LatLng, PointType};
use crate::models::package::PackageDetails;
use crate::models::segment::RouteSegment;
use crate::models::vehicle::{OrderType, TransportOptions, TransportType};

/// Tag written with every [`Order`]. Untagged payloads predate it.
pub const ROUTE_SEGMENTS_SCHEMA: u32 = 2;

/// The aggregate handed to the summary screen at submit time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub schema_version: u32,
    pub transport_type: TransportType,
    pub order_type: OrderType,
    pub route_segments: Vec<RouteSegment>,
    pub vehicle_options: TransportOptions,
    pub return_to_pickup: bool,
    pub created_at: DateTime<Utc>,
}

/// Flat pre-segment order shape. Package details belong to the whole order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOrder {
    pub transport_type: TransportType,
    #[serde(default)]
    pub order_type: Option<OrderType>,
    pub location_points: Vec<LegacyLocationPoint>,
    #[serde(default)]
    pub package_details: PackageDetails,
    #[serde(default)]
    pub vehicle_options: Option<TransportOptions>,
    #[serde(default)]
    pub return_to_pickup: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyLocationPoint {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub point_type: PointType,
    pub label: String,
    pub location: Option<LatLng>,
    #[serde(default)]
    pub street_name: String,
    #[serde(default)]
    pub area_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub additional_details: String,
    #[serde(default)]
    pub building_photo: Option<String>,
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_phone: String,
}
