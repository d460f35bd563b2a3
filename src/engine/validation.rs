use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::engine::completion::required_fields;
use crate::i18n::{Locale, Message};
use crate::models::segment::RouteSegment;

/// Field key to localized message. Empty means valid.
pub type ValidationErrors = BTreeMap<String, String>;

/// Field keys the user has interacted with.
pub type TouchedFields = BTreeSet<String>;

/// Field names in checklist order, paired with their message.
pub static SEGMENT_FIELDS: [(&str, Message); 8] = [
    ("pickup-location", Message::PickupLocationRequired),
    ("pickup-details", Message::PickupDetailsRequired),
    ("dropoff-location", Message::DropoffLocationRequired),
    ("dropoff-name", Message::RecipientNameRequired),
    ("dropoff-phone", Message::RecipientPhoneRequired),
    ("dropoff-details", Message::DropoffDetailsRequired),
    ("package-description", Message::PackageDescriptionRequired),
    ("package-weight", Message::PackageWeightRequired),
];

pub fn field_key(segment_id: Uuid, field: &str) -> String {
    format!("{segment_id}-{field}")
}

pub fn validate_segment(segment: &RouteSegment, locale: Locale) -> ValidationErrors {
    required_fields(segment)
        .iter()
        .zip(SEGMENT_FIELDS)
        .filter(|(present, _)| !**present)
        .map(|(_, (field, message))| (field_key(segment.id, field), locale.text(message).to_string()))
        .collect()
}

pub fn validate_segments(segments: &[RouteSegment], locale: Locale) -> ValidationErrors {
    segments
        .iter()
        .flat_map(|segment| validate_segment(segment, locale))
        .collect()
}

pub fn all_field_keys(segments: &[RouteSegment]) -> impl Iterator<Item = String> + '_ {
    segments
        .iter()
        .flat_map(|segment| SEGMENT_FIELDS.iter().map(move |(field, _)| field_key(segment.id, field)))
}

/// Errors for fields the user has already touched.
pub fn visible_errors(errors: &ValidationErrors, touched: &TouchedFields) -> ValidationErrors {
    errors
        .iter()
        .filter(|(key, _)| touched.contains(*key))
        .map(|(key, message)| (key.clone(), message.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{TouchedFields, field_key, validate_segment, validate_segments, visible_errors};
    use crate::engine::completion::segment_completion;
    use crate::engine::completion::tests::complete_segment;
    use crate::i18n::Locale;
    use crate::models::segment::RouteSegment;

    #[test]
    fn complete_segment_has_no_errors() {
        assert!(validate_segment(&complete_segment(), Locale::En).is_empty());
    }

    #[test]
    fn missing_phone_yields_exactly_one_keyed_error() {
        let mut segment = complete_segment();
        segment.dropoff_point.contact_phone = String::new();

        let errors = validate_segment(&segment, Locale::En);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(&format!("{}-dropoff-phone", segment.id)).map(String::as_str),
            Some("Please enter the recipient phone number")
        );
    }

    #[test]
    fn errors_are_empty_exactly_when_completion_is_full() {
        let mut segment = RouteSegment::new(1, Locale::Ar, None);
        assert_eq!(validate_segment(&segment, Locale::Ar).len(), 8);
        assert!(segment_completion(&segment) < 100);

        segment = complete_segment();
        assert!(validate_segment(&segment, Locale::Ar).is_empty());
        assert_eq!(segment_completion(&segment), 100);
    }

    #[test]
    fn keys_from_different_segments_do_not_collide() {
        let a = RouteSegment::new(1, Locale::En, None);
        let b = RouteSegment::new(2, Locale::En, None);
        assert_eq!(validate_segments(&[a, b], Locale::En).len(), 16);
    }

    #[test]
    fn only_touched_errors_are_visible() {
        let segment = RouteSegment::new(1, Locale::En, None);
        let errors = validate_segment(&segment, Locale::En);

        let mut touched = TouchedFields::new();
        touched.insert(field_key(segment.id, "package-weight"));

        let visible = visible_errors(&errors, &touched);
        assert_eq!(visible.len(), 1);
        assert!(visible.contains_key(&field_key(segment.id, "package-weight")));
    }
}
