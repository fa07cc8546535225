//! Interactive crop/pan/zoom geometry with bidirectional URL codecs for
//! image CDN dialects.
//!
//! Pure geometry and string transformation — no pixel operations, no I/O.
//!
//! # Modules
//!
//! - [`model`] — Crop state machine: scale/pan/frame mutations, clamping,
//!   output-field derivation and method classification
//! - [`adapters`] — Declarative URL dialects: token-pattern matching and
//!   method-keyed template rendering for the bundled image CDNs
//!
//! # Example
//!
//! ```
//! use zencrop::{CropModel, CropOptions, Provider, Size, UrlParts};
//!
//! let codec = Provider::Cloudinary.codec();
//! let url = "https://res.cloudinary.com/demo/image/upload/w_330,h_213,c_scale/x_39,y_15,w_166,h_90,c_crop/sofa_cat.jpg";
//!
//! // URL -> crop state
//! let fields = codec.try_match(url).unwrap().expect("cloudinary url");
//! let mut model = CropModel::new(CropOptions::from_fields(&fields), Size::new(660, 426));
//! model.initialize_sizes().unwrap();
//! assert_eq!(model.scale(), 0.5);
//!
//! // crop state -> URL
//! let parts = UrlParts::from_fields(&fields);
//! assert_eq!(codec.render(&parts, &model.computed()).unwrap(), url);
//! ```

#![forbid(unsafe_code)]

pub mod adapters;
pub mod model;

// Re-exports: core types from the model module
pub use model::{
    ComputedCrop, ConfigError, CropEvent, CropEventKind, CropMethod, CropModel, CropOptions,
    Size, Subscription,
};

pub use adapters::{
    FieldMap, FromSrc, PatternError, Provider, RenderError, ToSrc, UrlAdapter, UrlCodec,
    UrlParts, infer_method,
};
