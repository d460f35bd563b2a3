pub mod geocoder;

use serde::{Deserialize, Serialize};

use crate::models::location::LatLng;

pub use geocoder::{GeocodeError, Geocoder, StaticGeocoder};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    pub types: Vec<String>,
}

/// One entry of a reverse-geocoding response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub formatted_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAddress {
    pub street: String,
    pub area: String,
    pub city: String,
    pub building: String,
    pub full_address: String,
}

/// Normalizes a provider result. Missing components become empty strings.
pub fn parse_address(result: &GeocodeResult) -> ParsedAddress {
    let street_number = component(result, &["street_number"]);
    let subpremise = component(result, &["subpremise"]);

    ParsedAddress {
        street: component(result, &["route"]),
        area: component(result, &["sublocality", "sublocality_level_1"]),
        city: {
            let locality = component(result, &["locality"]);
            if locality.is_empty() {
                component(result, &["administrative_area_level_1"])
            } else {
                locality
            }
        },
        building: format!("{street_number} {subpremise}").trim().to_string(),
        full_address: result.formatted_address.clone(),
    }
}

fn component(result: &GeocodeResult, wanted: &[&str]) -> String {
    result
        .address_components
        .iter()
        .find(|c| c.types.iter().any(|t| wanted.contains(&t.as_str())))
        .map(|c| c.long_name.clone())
        .unwrap_or_default()
}

pub fn haversine_km(a: &LatLng, b: &LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}
