use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::i18n::Locale;
use crate::models::location::{LocationPoint, PointType};
use crate::models::package::PackageDetails;
use crate::models::user::UserIdentity;

/// Advisory only; completion is always recomputed from the fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub id: Uuid,
    pub pickup_point: LocationPoint,
    pub dropoff_point: LocationPoint,
    #[serde(default)]
    pub package_details: PackageDetails,
    #[serde(default)]
    pub status: SegmentStatus,
}

impl RouteSegment {
    /// Builds segment number `ordinal` (1-based) with fresh ids and labels.
    /// The pickup contact is pre-filled from `sender` when one is known.
    pub fn new(ordinal: usize, locale: Locale, sender: Option<&UserIdentity>) -> Self {
        let mut pickup_point = LocationPoint::new(PointType::Pickup, ordinal, locale);
        if let Some(sender) = sender {
            pickup_point.contact_name = sender.name.clone();
            pickup_point.contact_phone = sender.phone.clone();
        }

        Self {
            id: Uuid::new_v4(),
            pickup_point,
            dropoff_point: LocationPoint::new(PointType::Dropoff, ordinal, locale),
            package_details: PackageDetails::default(),
            status: SegmentStatus::Pending,
        }
    }

    pub fn point(&self, point_type: PointType) -> &LocationPoint {
        match point_type {
            PointType::Pickup => &self.pickup_point,
            PointType::Dropoff => &self.dropoff_point,
        }
    }

    pub fn point_mut(&mut self, point_type: PointType) -> &mut LocationPoint {
        match point_type {
            PointType::Pickup => &mut self.pickup_point,
            PointType::Dropoff => &mut self.dropoff_point,
        }
    }

    pub fn find_point_mut(&mut self, point_id: Uuid) -> Option<&mut LocationPoint> {
        if self.pickup_point.id == point_id {
            Some(&mut self.pickup_point)
        } else if self.dropoff_point.id == point_id {
            Some(&mut self.dropoff_point)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RouteSegment, SegmentStatus};
    use crate::i18n::Locale;
    use crate::models::location::PointType;
    use crate::models::user::UserIdentity;

    #[test]
    fn factory_stamps_distinct_ids_and_prefills_sender() {
        let sender = UserIdentity {
            name: "Omar".to_string(),
            phone: "+966500000001".to_string(),
        };
        let segment = RouteSegment::new(1, Locale::En, Some(&sender));

        assert_ne!(segment.pickup_point.id, segment.dropoff_point.id);
        assert_ne!(segment.id, segment.pickup_point.id);
        assert_eq!(segment.pickup_point.point_type, PointType::Pickup);
        assert_eq!(segment.dropoff_point.point_type, PointType::Dropoff);
        assert_eq!(segment.pickup_point.contact_name, "Omar");
        assert!(segment.dropoff_point.contact_name.is_empty());
        assert_eq!(segment.status, SegmentStatus::Pending);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let segment = RouteSegment::new(2, Locale::En, None);
        let json = serde_json::to_value(&segment).unwrap();

        assert_eq!(json["pickupPoint"]["type"], "pickup");
        assert_eq!(json["dropoffPoint"]["label"], "Dropoff Point 2");
        assert_eq!(json["packageDetails"]["isFragile"], false);
        assert_eq!(json["status"], "pending");
        assert!(json["pickupPoint"]["location"].is_null());
    }
}
