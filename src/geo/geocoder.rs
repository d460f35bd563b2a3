use std::path::Path;

use futures::future::{self, BoxFuture};
use serde::Deserialize;
use thiserror::Error;

use crate::geo::{GeocodeResult, haversine_km};
use crate::i18n::Locale;
use crate::models::location::LatLng;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeocodeError {
    #[error("no geocoding results")]
    NoResults,

    #[error("geocoding provider failed: {0}")]
    Provider(String),
}

/// Reverse-geocoding provider boundary.
pub trait Geocoder: Send + Sync {
    fn geocode(
        &self,
        location: LatLng,
        locale: Locale,
    ) -> BoxFuture<'_, Result<Vec<GeocodeResult>, GeocodeError>>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeFixture {
    pub location: LatLng,
    #[serde(default)]
    pub locale: Option<Locale>,
    pub results: Vec<GeocodeResult>,
}

/// Answers from a fixed table: the nearest fixture within `max_distance_km`.
#[derive(Debug, Clone)]
pub struct StaticGeocoder {
    fixtures: Vec<GeocodeFixture>,
    max_distance_km: f64,
}

impl StaticGeocoder {
    pub const DEFAULT_MAX_DISTANCE_KM: f64 = 0.5;

    pub fn new(fixtures: Vec<GeocodeFixture>) -> Self {
        Self {
            fixtures,
            max_distance_km: Self::DEFAULT_MAX_DISTANCE_KM,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn from_file(path: &Path) -> Result<Self, GeocodeError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            GeocodeError::Provider(format!("failed to read {}: {err}", path.display()))
        })?;
        let fixtures: Vec<GeocodeFixture> = serde_json::from_str(&raw).map_err(|err| {
            GeocodeError::Provider(format!("invalid fixtures in {}: {err}", path.display()))
        })?;
        Ok(Self::new(fixtures))
    }

    fn lookup(&self, location: LatLng, locale: Locale) -> Result<Vec<GeocodeResult>, GeocodeError> {
        self.fixtures
            .iter()
            .filter(|f| f.locale.is_none_or(|l| l == locale))
            .map(|f| (f, haversine_km(&f.location, &location)))
            .filter(|(_, distance)| *distance <= self.max_distance_km)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(f, _)| f.results.clone())
            .filter(|results| !results.is_empty())
            .ok_or(GeocodeError::NoResults)
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(
        &self,
        location: LatLng,
        locale: Locale,
    ) -> BoxFuture<'_, Result<Vec<GeocodeResult>, GeocodeError>> {
        Box::pin(future::ready(self.lookup(location, locale)))
    }
}

#[cfg(test)]
mod tests {
    use super::{GeocodeError, GeocodeFixture, Geocoder, StaticGeocoder};
    use crate::geo::GeocodeResult;
    use crate::i18n::Locale;
    use crate::models::location::LatLng;

    fn fixture(lat: f64, lng: f64, formatted: &str, locale: Option<Locale>) -> GeocodeFixture {
        GeocodeFixture {
            location: LatLng { lat, lng },
            locale,
            results: vec![GeocodeResult {
                address_components: vec![],
                formatted_address: formatted.to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn returns_nearest_fixture_for_the_locale() {
        let geocoder = StaticGeocoder::new(vec![
            fixture(24.7136, 46.6753, "Riyadh", Some(Locale::En)),
            fixture(24.7136, 46.6753, "الرياض", Some(Locale::Ar)),
            fixture(21.4858, 39.1925, "Jeddah", None),
        ]);

        let results = geocoder
            .geocode(LatLng { lat: 24.7137, lng: 46.6754 }, Locale::Ar)
            .await
            .unwrap();
        assert_eq!(results[0].formatted_address, "الرياض");
    }

    #[tokio::test]
    async fn far_away_points_have_no_results() {
        let geocoder = StaticGeocoder::new(vec![fixture(21.4858, 39.1925, "Jeddah", None)]);
        let result = geocoder.geocode(LatLng { lat: 0.0, lng: 0.0 }, Locale::En).await;
        assert_eq!(result, Err(GeocodeError::NoResults));
    }
}
