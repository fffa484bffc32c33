use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AspectRatio {
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "21:9")]
    Ultrawide,
    #[serde(rename = "custom")]
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropStrategy {
    Fit,
    CropCenter,
    CropTop,
    CropBottom,
    CropLeft,
    CropRight,
}

/// Edge length of an ICO output, sent as a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    Px16,
    Px32,
    Px48,
    Px64,
    Px128,
    Px256,
}

impl IconSize {
    pub fn pixels(self) -> u32 {
        match self {
            IconSize::Px16 => 16,
            IconSize::Px32 => 32,
            IconSize::Px48 => 48,
            IconSize::Px64 => 64,
            IconSize::Px128 => 128,
            IconSize::Px256 => 256,
        }
    }
}

impl Serialize for IconSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.pixels())
    }
}

/// Optional transformation parameters forwarded to the service untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_strategy: Option<CropStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<IconSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_height: Option<u32>,
}

impl ConversionMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub target_format: String,
    pub output_path: Option<PathBuf>,
    pub metadata: Option<ConversionMetadata>,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<PathBuf>, target_format: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            target_format: target_format.into(),
            output_path: None,
            metadata: None,
        }
    }

    pub fn builder(
        input_path: impl Into<PathBuf>,
        target_format: impl Into<String>,
    ) -> ConversionRequestBuilder {
        ConversionRequestBuilder {
            request: Self::new(input_path, target_format),
        }
    }

    /// Target format as sent on the wire.
    pub fn normalized_target_format(&self) -> String {
        self.target_format.trim().to_lowercase()
    }

    /// Metadata to transmit; an all-empty record is not sent.
    pub(crate) fn wire_metadata(&self) -> Option<&ConversionMetadata> {
        self.metadata.as_ref().filter(|m| !m.is_empty())
    }
}

pub struct ConversionRequestBuilder {
    request: ConversionRequest,
}

impl ConversionRequestBuilder {
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.output_path = Some(path.into());
        self
    }

    pub fn metadata(mut self, metadata: ConversionMetadata) -> Self {
        self.request.metadata = Some(metadata);
        self
    }

    pub fn aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.metadata_mut().aspect_ratio = Some(aspect_ratio);
        self
    }

    pub fn crop_strategy(mut self, crop_strategy: CropStrategy) -> Self {
        self.metadata_mut().crop_strategy = Some(crop_strategy);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.metadata_mut().quality = Some(quality);
        self
    }

    pub fn icon_size(mut self, icon_size: IconSize) -> Self {
        self.metadata_mut().icon_size = Some(icon_size);
        self
    }

    pub fn resize(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        let metadata = self.metadata_mut();
        metadata.resize_width = width;
        metadata.resize_height = height;
        self
    }

    pub fn build(self) -> ConversionRequest {
        self.request
    }

    fn metadata_mut(&mut self) -> &mut ConversionMetadata {
        self.request.metadata.get_or_insert_with(ConversionMetadata::default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub source_format: String,
    pub target_format: String,
    pub file_size: u64,
    pub processing_time_ms: u64,
    pub download_url: String,
    pub tokens_used: Option<u64>,
}

/// `photo.png` converted to `JPG` lands at `photo.jpg`.
pub fn default_output_path(input_path: &Path, target_format: &str) -> PathBuf {
    input_path.with_extension(target_format.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("photo.png"), "JPG"),
            PathBuf::from("photo.jpg")
        );
        assert_eq!(
            default_output_path(Path::new("shots/raw/scan"), "webp"),
            PathBuf::from("shots/raw/scan.webp")
        );
        assert_eq!(
            default_output_path(Path::new("bundle.tar.png"), "avif"),
            PathBuf::from("bundle.tar.avif")
        );
    }

    #[test]
    fn test_metadata_wire_format() {
        let request = ConversionRequest::builder("photo.jpg", "ICO")
            .aspect_ratio(AspectRatio::Widescreen)
            .crop_strategy(CropStrategy::CropCenter)
            .quality(90)
            .icon_size(IconSize::Px64)
            .build();

        let wire = serde_json::to_value(request.wire_metadata().unwrap()).unwrap();
        assert_eq!(
            wire,
            json!({
                "aspect_ratio": "16:9",
                "crop_strategy": "crop-center",
                "quality": 90,
                "icon_size": 64
            })
        );
        assert_eq!(request.normalized_target_format(), "ico");
    }

    #[test]
    fn test_empty_metadata_not_sent() {
        let request = ConversionRequest::builder("photo.jpg", "png")
            .metadata(ConversionMetadata::default())
            .build();
        assert!(request.wire_metadata().is_none());

        let resized = ConversionRequest::builder("photo.jpg", "png")
            .resize(Some(800), None)
            .build();
        assert_eq!(
            serde_json::to_value(resized.wire_metadata().unwrap()).unwrap(),
            json!({ "resize_width": 800 })
        );
    }
}
