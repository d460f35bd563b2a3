use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::ParsedAddress;
use crate::i18n::Locale;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
    Pickup,
    Dropoff,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationPoint {
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
    pub contact_name: String,
    #[serde(default)]
    pub contact_phone: String,
}

/// One field-level change to a [`LocationPoint`].
///
/// Location changes go through [`LocationPoint::set_location`] instead so the
/// derived address fields can never outlive the coordinates they came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum PointFieldUpdate {
    StreetName(String),
    AreaName(String),
    City(String),
    Building(String),
    AdditionalDetails(String),
    BuildingPhoto(Option<String>),
    ContactName(String),
    ContactPhone(String),
}

impl LocationPoint {
    pub fn new(point_type: PointType, ordinal: usize, locale: Locale) -> Self {
        Self {
            id: Uuid::new_v4(),
            point_type,
            label: locale.point_label(point_type, ordinal),
            location: None,
            street_name: String::new(),
            area_name: String::new(),
            city: String::new(),
            building: String::new(),
            additional_details: String::new(),
            building_photo: None,
            contact_name: String::new(),
            contact_phone: String::new(),
        }
    }

    /// Replaces the coordinates wholesale and drops any address resolved for
    /// the previous ones.
    pub fn set_location(&mut self, location: Option<LatLng>) {
        self.location = location;
        self.clear_address();
    }

    pub fn apply_address(&mut self, address: &ParsedAddress) {
        if self.location.is_none() {
            return;
        }
        self.street_name = address.street.clone();
        self.area_name = address.area.clone();
        self.city = address.city.clone();
        self.building = address.building.clone();
    }

    /// Address fields describe the selected coordinates, so edits to them are
    /// dropped while no location is set.
    pub fn apply(&mut self, update: PointFieldUpdate) {
        let has_location = self.location.is_some();
        match update {
            PointFieldUpdate::StreetName(value) if has_location => self.street_name = value,
            PointFieldUpdate::AreaName(value) if has_location => self.area_name = value,
            PointFieldUpdate::City(value) if has_location => self.city = value,
            PointFieldUpdate::Building(value) if has_location => self.building = value,
            PointFieldUpdate::StreetName(_)
            | PointFieldUpdate::AreaName(_)
            | PointFieldUpdate::City(_)
            | PointFieldUpdate::Building(_) => {}
            PointFieldUpdate::AdditionalDetails(value) => self.additional_details = value,
            PointFieldUpdate::BuildingPhoto(value) => self.building_photo = value,
            PointFieldUpdate::ContactName(value) => self.contact_name = value,
            PointFieldUpdate::ContactPhone(value) => self.contact_phone = value,
        }
    }

    fn clear_address(&mut self) {
        self.street_name.clear();
        self.area_name.clear();
        self.city.clear();
        self.building.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{LatLng, LocationPoint, PointFieldUpdate, PointType};
    use crate::geo::ParsedAddress;
    use crate::i18n::Locale;

    fn resolved_address() -> ParsedAddress {
        ParsedAddress {
            street: "King Fahd Road".to_string(),
            area: "Al Olaya".to_string(),
            city: "Riyadh".to_string(),
            building: "12".to_string(),
            full_address: "12 King Fahd Road, Al Olaya, Riyadh".to_string(),
        }
    }

    #[test]
    fn moving_the_pin_clears_the_old_address() {
        let mut point = LocationPoint::new(PointType::Pickup, 1, Locale::En);
        point.set_location(Some(LatLng { lat: 24.7, lng: 46.6 }));
        point.apply_address(&resolved_address());
        assert_eq!(point.city, "Riyadh");

        point.set_location(Some(LatLng { lat: 21.5, lng: 39.2 }));
        assert!(point.street_name.is_empty());
        assert!(point.city.is_empty());
    }

    #[test]
    fn address_is_not_applied_without_a_location() {
        let mut point = LocationPoint::new(PointType::Dropoff, 1, Locale::En);
        point.apply_address(&resolved_address());
        assert!(point.location.is_none());
        assert!(point.street_name.is_empty());
    }

    #[test]
    fn address_edits_need_a_location() {
        let mut point = LocationPoint::new(PointType::Pickup, 1, Locale::En);
        point.apply(PointFieldUpdate::StreetName("Olaya St".to_string()));
        point.apply(PointFieldUpdate::Building("9".to_string()));
        assert!(point.street_name.is_empty());
        assert!(point.building.is_empty());

        point.set_location(Some(LatLng { lat: 24.7, lng: 46.6 }));
        point.apply(PointFieldUpdate::StreetName("Olaya St".to_string()));
        assert_eq!(point.street_name, "Olaya St");
    }

    #[test]
    fn field_updates_touch_only_their_field() {
        let mut point = LocationPoint::new(PointType::Dropoff, 2, Locale::En);
        point.apply(PointFieldUpdate::ContactName("Sara".to_string()));
        assert_eq!(point.contact_name, "Sara");
        assert!(point.contact_phone.is_empty());
        assert_eq!(point.label, "Dropoff Point 2");
    }
}
