//! Conversions between crop geometry types and wire field maps.

use tracing::warn;

use super::FieldMap;
use crate::model::{ComputedCrop, CropOptions};

impl ComputedCrop {
    /// All numeric output fields as wire strings. URL-context fields are
    /// not included; the codec injects those at render time.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        for (key, value) in [
            ("width", self.width),
            ("height", self.height),
            ("resizeWidth", self.resize_width),
            ("resizeHeight", self.resize_height),
            ("offsetX", self.offset_x),
            ("offsetY", self.offset_y),
            ("cropX", self.crop_x),
            ("cropY", self.crop_y),
            ("cropWidth", self.crop_width),
            ("cropHeight", self.crop_height),
            ("cropX2", self.crop_x2),
            ("cropY2", self.crop_y2),
        ] {
            fields.insert(key.to_string(), value.to_string());
        }
        fields
    }
}

/// Parse one numeric wire field, warning and skipping on bad values so a
/// single corrupt parameter does not discard the whole URL.
fn numeric(fields: &FieldMap, key: &str) -> Option<f64> {
    let raw = fields.get(key)?;
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, raw, "ignoring non-numeric url field");
            None
        }
    }
}

impl CropOptions {
    /// Build initialization options from a matched field set. Field
    /// presence is preserved so the initialization mode selection sees
    /// exactly what the URL carried.
    pub fn from_fields(fields: &FieldMap) -> Self {
        CropOptions {
            width: numeric(fields, "width"),
            height: numeric(fields, "height"),
            resize_width: numeric(fields, "resizeWidth"),
            resize_height: numeric(fields, "resizeHeight"),
            offset_x: numeric(fields, "offsetX"),
            offset_y: numeric(fields, "offsetY"),
            crop_x: numeric(fields, "cropX"),
            crop_y: numeric(fields, "cropY"),
            crop_width: numeric(fields, "cropWidth"),
            crop_height: numeric(fields, "cropHeight"),
            crop_x2: numeric(fields, "cropX2"),
            crop_y2: numeric(fields, "cropY2"),
            ..CropOptions::default()
        }
    }
}
