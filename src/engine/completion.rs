use crate::models::segment::{RouteSegment, SegmentStatus};

const REQUIRED_FIELDS: usize = 8;

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Flags for each required field, in checklist order.
pub fn required_fields(segment: &RouteSegment) -> [bool; REQUIRED_FIELDS] {
    let pickup = &segment.pickup_point;
    let dropoff = &segment.dropoff_point;
    let package = &segment.package_details;

    [
        pickup.location.is_some(),
        filled(&pickup.additional_details),
        dropoff.location.is_some(),
        filled(&dropoff.contact_name),
        filled(&dropoff.contact_phone),
        filled(&dropoff.additional_details),
        filled(&package.description),
        filled(&package.weight),
    ]
}

/// Percentage of required fields filled, rounded to the nearest integer.
pub fn segment_completion(segment: &RouteSegment) -> u8 {
    let satisfied = required_fields(segment).iter().filter(|f| **f).count();
    (100.0 * satisfied as f64 / REQUIRED_FIELDS as f64).round() as u8
}

/// Rounded mean of the per-segment scores; an empty order scores 0.
pub fn overall_completion(segments: &[RouteSegment]) -> u8 {
    if segments.is_empty() {
        return 0;
    }

    let total: u32 = segments.iter().map(|s| segment_completion(s) as u32).sum();
    (total as f64 / segments.len() as f64).round() as u8
}

pub fn status_for(segment: &RouteSegment) -> SegmentStatus {
    match segment_completion(segment) {
        0 => SegmentStatus::Pending,
        100 => SegmentStatus::Completed,
        _ => SegmentStatus::InProgress,
    }
}
