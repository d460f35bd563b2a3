use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Truck,
    Motorbike,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    SingleDirection,
    MultiDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VehicleOptions {
    pub truck_type: String,
    #[serde(default)]
    pub needs_loading_help: bool,
    #[serde(default)]
    pub needs_unloading_help: bool,
    #[serde(default)]
    pub workers_count: u8,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MotorbikeOptions {
    pub package_type: String,
    #[serde(default)]
    pub is_express: bool,
    #[serde(default)]
    pub insulated_box: bool,
    #[serde(default)]
    pub notes: String,
}

/// The option record that matches the order's transport type.
///
/// Stored untagged; `truckType` and `packageType` are mandatory keys, which is
/// what tells the two shapes apart on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TransportOptions {
    Vehicle(VehicleOptions),
    Motorbike(MotorbikeOptions),
}

impl TransportOptions {
    /// The one option that must be chosen before submit.
    pub fn is_complete(&self) -> bool {
        match self {
            TransportOptions::Vehicle(options) => !options.truck_type.trim().is_empty(),
            TransportOptions::Motorbike(options) => !options.package_type.trim().is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MotorbikeOptions, TransportOptions, VehicleOptions};

    #[test]
    fn untagged_options_round_trip_to_the_right_variant() {
        let motorbike = TransportOptions::Motorbike(MotorbikeOptions {
            package_type: "documents".to_string(),
            ..Default::default()
        });
        let json = serde_json::to_value(&motorbike).unwrap();
        assert_eq!(json["packageType"], "documents");

        let back: TransportOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back, motorbike);
    }

    #[test]
    fn blank_truck_type_is_incomplete() {
        let options = TransportOptions::Vehicle(VehicleOptions {
            truck_type: "  ".to_string(),
            ..Default::default()
        });
        assert!(!options.is_complete());
    }
}
