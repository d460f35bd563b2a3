use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageDetails {
    pub description: String,
    pub weight: String,
    pub dimensions: String,
    pub special_instructions: String,
    pub images: Vec<String>,
    pub video: Option<String>,
    pub is_fragile: bool,
    pub requires_refrigeration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum PackageFieldUpdate {
    Description(String),
    Weight(String),
    Dimensions(String),
    SpecialInstructions(String),
    AddImage(String),
    RemoveImage(usize),
    Video(Option<String>),
    IsFragile(bool),
    RequiresRefrigeration(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageUpdateError {
    TooManyImages,
    NoSuchImage(usize),
}

impl PackageDetails {
    pub const MAX_IMAGES: usize = 5;

    pub fn apply(&mut self, update: PackageFieldUpdate) -> Result<(), PackageUpdateError> {
        match update {
            PackageFieldUpdate::Description(value) => self.description = value,
            PackageFieldUpdate::Weight(value) => self.weight = value,
            PackageFieldUpdate::Dimensions(value) => self.dimensions = value,
            PackageFieldUpdate::SpecialInstructions(value) => self.special_instructions = value,
            PackageFieldUpdate::AddImage(image) => {
                if self.images.len() >= Self::MAX_IMAGES {
                    return Err(PackageUpdateError::TooManyImages);
                }
                self.images.push(image);
            }
            PackageFieldUpdate::RemoveImage(index) => {
                if index >= self.images.len() {
                    return Err(PackageUpdateError::NoSuchImage(index));
                }
                self.images.remove(index);
            }
            PackageFieldUpdate::Video(value) => self.video = value,
            PackageFieldUpdate::IsFragile(value) => self.is_fragile = value,
            PackageFieldUpdate::RequiresRefrigeration(value) => {
                self.requires_refrigeration = value
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{PackageDetails, PackageFieldUpdate, PackageUpdateError};

    #[test]
    fn sixth_image_is_rejected() {
        let mut package = PackageDetails::default();
        for n in 0..PackageDetails::MAX_IMAGES {
            package
                .apply(PackageFieldUpdate::AddImage(format!("data:image/png;base64,{n}")))
                .unwrap();
        }

        let result = package.apply(PackageFieldUpdate::AddImage("data:image/png;base64,x".into()));
        assert_eq!(result, Err(PackageUpdateError::TooManyImages));
        assert_eq!(package.images.len(), PackageDetails::MAX_IMAGES);
    }

    #[test]
    fn removing_an_image_keeps_the_order_of_the_rest() {
        let mut package = PackageDetails {
            images: vec!["a".into(), "b".into(), "c".into()],
            ..Default::default()
        };
        package.apply(PackageFieldUpdate::RemoveImage(1)).unwrap();
        assert_eq!(package.images, vec!["a".to_string(), "c".to_string()]);

        assert_eq!(
            package.apply(PackageFieldUpdate::RemoveImage(7)),
            Err(PackageUpdateError::NoSuchImage(7))
        );
    }
}
