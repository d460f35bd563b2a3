use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::location::PointType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ar,
    En,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Rtl,
    Ltr,
}

/// Every user-facing message the order core can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    PickupLocationRequired,
    PickupDetailsRequired,
    DropoffLocationRequired,
    RecipientNameRequired,
    RecipientPhoneRequired,
    DropoffDetailsRequired,
    PackageDescriptionRequired,
    PackageWeightRequired,
    IncompleteOrder,
}

impl Locale {
    pub fn language_code(self) -> &'static str {
        match self {
            Locale::Ar => "ar",
            Locale::En => "en",
        }
    }

    pub fn direction(self) -> TextDirection {
        match self {
            Locale::Ar => TextDirection::Rtl,
            Locale::En => TextDirection::Ltr,
        }
    }

    pub fn point_label(self, point_type: PointType, ordinal: usize) -> String {
        let base = match (self, point_type) {
            (Locale::Ar, PointType::Pickup) => "نقطة الاستلام",
            (Locale::Ar, PointType::Dropoff) => "نقطة التسليم",
            (Locale::En, PointType::Pickup) => "Pickup Point",
            (Locale::En, PointType::Dropoff) => "Dropoff Point",
        };
        format!("{base} {ordinal}")
    }

    pub fn text(self, message: Message) -> &'static str {
        match self {
            Locale::Ar => arabic(message),
            Locale::En => english(message),
        }
    }
}

fn arabic(message: Message) -> &'static str {
    match message {
        Message::PickupLocationRequired => "يرجى تحديد موقع الاستلام على الخريطة",
        Message::PickupDetailsRequired => "يرجى إدخال تفاصيل موقع الاستلام",
        Message::DropoffLocationRequired => "يرجى تحديد موقع التسليم على الخريطة",
        Message::RecipientNameRequired => "يرجى إدخال اسم المستلم",
        Message::RecipientPhoneRequired => "يرجى إدخال رقم هاتف المستلم",
        Message::DropoffDetailsRequired => "يرجى إدخال تفاصيل موقع التسليم",
        Message::PackageDescriptionRequired => "يرجى إدخال وصف الشحنة",
        Message::PackageWeightRequired => "يرجى إدخال وزن الشحنة",
        Message::IncompleteOrder => "يرجى إكمال جميع الحقول المطلوبة قبل المتابعة",
    }
}

fn english(message: Message) -> &'static str {
    match message {
        Message::PickupLocationRequired => "Please select the pickup location on the map",
        Message::PickupDetailsRequired => "Please enter the pickup location details",
        Message::DropoffLocationRequired => "Please select the dropoff location on the map",
        Message::RecipientNameRequired => "Please enter the recipient name",
        Message::RecipientPhoneRequired => "Please enter the recipient phone number",
        Message::DropoffDetailsRequired => "Please enter the dropoff location details",
        Message::PackageDescriptionRequired => "Please enter the package description",
        Message::PackageWeightRequired => "Please enter the package weight",
        Message::IncompleteOrder => "Please complete all required fields before continuing",
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.language_code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" => Ok(Locale::Ar),
            "en" => Ok(Locale::En),
            other => Err(format!("unknown locale: {other}, expected ar/en")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Locale, TextDirection};
    use crate::models::location::PointType;

    #[test]
    fn arabic_is_right_to_left() {
        assert_eq!(Locale::Ar.direction(), TextDirection::Rtl);
        assert_eq!(Locale::En.direction(), TextDirection::Ltr);
    }

    #[test]
    fn labels_carry_the_ordinal() {
        assert_eq!(Locale::En.point_label(PointType::Dropoff, 3), "Dropoff Point 3");
        assert_eq!(Locale::Ar.point_label(PointType::Pickup, 1), "نقطة الاستلام 1");
    }

    #[test]
    fn parses_locale_case_insensitively() {
        assert_eq!(" EN ".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }
}
