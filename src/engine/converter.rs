use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::models::order::{
    LegacyLocationPoint, LegacyOrder, Order, ROUTE_SEGMENTS_SCHEMA,
};
use crate::models::location::LocationPoint;
use crate::models::segment::RouteSegment;
use crate::storage::{KeyValueStore, ORDER_DETAILS_KEY};

/// True iff `stored` has a `routeSegments` array.
///
/// The `schemaVersion` tag is written on every new order but does not decide
/// the format: a tag without segments cannot be loaded, and untagged segment
/// orders predate the tag.
pub fn is_new_format(stored: &Value) -> bool {
    stored.get("routeSegments").is_some_and(Value::is_array)
}

/// Flattens segments into pickup/dropoff pairs.
///
/// The legacy shape has a single package per order, so package details are
/// taken from the first segment and the others are dropped.
pub fn convert_to_old_format(order: &Order) -> LegacyOrder {
    let location_points = order
        .route_segments
        .iter()
        .flat_map(|segment| [&segment.pickup_point, &segment.dropoff_point])
        .map(to_legacy_point)
        .collect();

    LegacyOrder {
        transport_type: order.transport_type,
        order_type: Some(order.order_type),
        location_points,
        package_details: order
            .route_segments
            .first()
            .map(|segment| segment.package_details.clone())
            .unwrap_or_default(),
        vehicle_options: Some(order.vehicle_options.clone()),
        return_to_pickup: order.return_to_pickup,
        created_at: Some(order.created_at),
    }
}

fn to_legacy_point(point: &LocationPoint) -> LegacyLocationPoint {
    LegacyLocationPoint {
        id: point.id,
        point_type: point.point_type,
        label: point.label.clone(),
        location: point.location,
        street_name: point.street_name.clone(),
        area_name: point.area_name.clone(),
        city: point.city.clone(),
        building: point.building.clone(),
        additional_details: point.additional_details.clone(),
        building_photo: point.building_photo.clone(),
        recipient_name: point.contact_name.clone(),
        recipient_phone: point.contact_phone.clone(),
    }
}

/// Any stored payload in the legacy shape, converting when needed.
pub fn to_legacy(stored: &Value) -> Option<LegacyOrder> {
    if is_new_format(stored) {
        return parse_order(stored).map(|order| convert_to_old_format(&order));
    }

    match serde_json::from_value(stored.clone()) {
        Ok(legacy) => Some(legacy),
        Err(err) => {
            warn!(error = %err, "stored order is neither format");
            None
        }
    }
}

pub fn parse_order(stored: &Value) -> Option<Order> {
    if !is_new_format(stored) {
        return None;
    }

    let mut tagged = stored.clone();
    if let Some(object) = tagged.as_object_mut() {
        object
            .entry("schemaVersion")
            .or_insert(Value::from(ROUTE_SEGMENTS_SCHEMA));
    }

    match serde_json::from_value(tagged) {
        Ok(order) => Some(order),
        Err(err) => {
            warn!(error = %err, "stored route-segment order is malformed");
            None
        }
    }
}

/// Segments as stored; `None` for legacy data, which cannot be split back
/// into per-segment packages.
pub fn route_segments(stored: &Value) -> Option<Vec<RouteSegment>> {
    if !is_new_format(stored) {
        return None;
    }

    let segments = stored.get("routeSegments")?.clone();
    match serde_json::from_value(segments) {
        Ok(segments) => Some(segments),
        Err(err) => {
            warn!(error = %err, "stored route segments are malformed");
            None
        }
    }
}

pub fn load_and_convert_order_data(store: &KeyValueStore, client_id: Uuid) -> Option<LegacyOrder> {
    let stored: Value = store.load_json(client_id, ORDER_DETAILS_KEY)?;
    to_legacy(&stored)
}

pub fn get_route_segments(store: &KeyValueStore, client_id: Uuid) -> Option<Vec<RouteSegment>> {
    let stored: Value = store.load_json(client_id, ORDER_DETAILS_KEY)?;
    route_segments(&stored)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::{
        convert_to_old_format, get_route_segments, is_new_format, load_and_convert_order_data,
    };
    use crate::engine::completion::tests::complete_segment;
    use crate::models::location::PointType;
    use crate::models::order::{Order, ROUTE_SEGMENTS_SCHEMA};
    use crate::models::vehicle::{OrderType, TransportOptions, TransportType, VehicleOptions};
    use crate::storage::{KeyValueStore, ORDER_DETAILS_KEY};

    fn order_with(segment_count: usize) -> Order {
        let route_segments = (0..segment_count)
            .map(|n| {
                let mut segment = complete_segment();
                segment.package_details.description = format!("package {n}");
                segment.dropoff_point.contact_name = format!("recipient {n}");
                segment
            })
            .collect();

        Order {
            schema_version: ROUTE_SEGMENTS_SCHEMA,
            transport_type: TransportType::Truck,
            order_type: OrderType::MultiDirection,
            route_segments,
            vehicle_options: TransportOptions::Vehicle(VehicleOptions {
                truck_type: "pickup".to_string(),
                ..Default::default()
            }),
            return_to_pickup: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn detects_format_by_segments_array() {
        assert!(is_new_format(&json!({"routeSegments": []})));
        assert!(is_new_format(&json!({"schemaVersion": 2, "routeSegments": []})));
        assert!(!is_new_format(&json!({"routeSegments": {}})));
        assert!(!is_new_format(&json!({"locationPoints": []})));
        assert!(is_new_format(&json!({"schemaVersion": 1, "routeSegments": []})));
        assert!(!is_new_format(&json!({"schemaVersion": 2})));
    }

    #[test]
    fn flattens_into_alternating_points() {
        let order = order_with(3);
        let legacy = convert_to_old_format(&order);

        assert_eq!(legacy.location_points.len(), 6);
        for (index, point) in legacy.location_points.iter().enumerate() {
            let expected = if index % 2 == 0 { PointType::Pickup } else { PointType::Dropoff };
            assert_eq!(point.point_type, expected);
        }
        assert_eq!(legacy.location_points[3].recipient_name, "recipient 1");
        assert_eq!(legacy.location_points[2].id, order.route_segments[1].pickup_point.id);
    }

    #[test]
    fn package_details_always_come_from_the_first_segment() {
        let mut order = order_with(2);
        order.route_segments[1].package_details.is_fragile = true;
        order.route_segments[1].package_details.weight = "900kg".to_string();

        let legacy = convert_to_old_format(&order);
        assert_eq!(legacy.package_details.description, "package 0");
        assert_eq!(legacy.package_details.weight, "3kg");
        assert!(!legacy.package_details.is_fragile);
    }

    #[test]
    fn loading_always_returns_the_legacy_shape() {
        let store = KeyValueStore::new("session");
        let client = Uuid::new_v4();
        let order = order_with(2);
        store.save_json(client, ORDER_DETAILS_KEY, &order).unwrap();

        let legacy = load_and_convert_order_data(&store, client).unwrap();
        assert_eq!(legacy.location_points.len(), 4);

        let segments = get_route_segments(&store, client).unwrap();
        assert_eq!(segments, order.route_segments);
    }

    #[test]
    fn legacy_data_has_no_segments() {
        let store = KeyValueStore::new("session");
        let client = Uuid::new_v4();
        let legacy = convert_to_old_format(&order_with(1));
        store.save_json(client, ORDER_DETAILS_KEY, &legacy).unwrap();

        assert_eq!(get_route_segments(&store, client), None);
        assert_eq!(load_and_convert_order_data(&store, client), Some(legacy));
    }

    #[test]
    fn untagged_segment_orders_still_load() {
        let store = KeyValueStore::new("session");
        let client = Uuid::new_v4();
        let mut value = serde_json::to_value(order_with(1)).unwrap();
        value.as_object_mut().unwrap().remove("schemaVersion");
        store.save_json(client, ORDER_DETAILS_KEY, &value).unwrap();

        let legacy = load_and_convert_order_data(&store, client).unwrap();
        assert_eq!(legacy.location_points.len(), 2);
    }

    #[test]
    fn garbage_reads_as_no_data() {
        let store = KeyValueStore::new("session");
        let client = Uuid::new_v4();
        store.set_item(client, ORDER_DETAILS_KEY, "][".to_string());
        assert_eq!(load_and_convert_order_data(&store, client), None);
        assert_eq!(get_route_segments(&store, client), None);
    }
}
