//! Crop/pan/zoom state machine for one editing session.
//!
//! [`CropModel`] owns the mutable selection state (zoom factor, pan offset,
//! crop frame) for a single source image, enforces the clamping invariants
//! after every mutation, and derives the numeric output fields plus the
//! [`CropMethod`] classification that the URL codec consumes.
//!
//! All operations are synchronous, deterministic transformations over
//! in-process state. Rounding is round-half-away-from-zero throughout
//! (`f64::round`); round-trips through provider URLs depend on exact pixel
//! values.
//!
//! # Example
//!
//! ```
//! use zencrop::{CropModel, CropOptions, Size};
//!
//! let options = CropOptions {
//!     width: Some(400.0),
//!     ..CropOptions::default()
//! };
//! let mut model = CropModel::new(options, Size::new(800, 600));
//! model.initialize_sizes().unwrap();
//!
//! assert_eq!(model.scale(), 0.5);
//! assert_eq!(model.crop_size(), Size::new(400, 300));
//! ```

use tracing::debug;

/// Width × height dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Which minimal set of output parameters expresses the current selection.
///
/// Ordered from most specific to most general; template fallback scans
/// forward through this order and never substitutes an earlier (cheaper)
/// method than the classified one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CropMethod {
    /// Untouched source: scale 1, no pan, crop frame matches the image.
    Original,
    /// Pure proportional resize: no pan, crop frame matches the scaled image.
    Resize,
    /// Scale-to-fill with centered overflow on exactly one axis.
    Cover,
    /// Crop a source rectangle, then resize it to the output frame.
    CropResize,
    /// Resize the whole source, then crop at an offset.
    ResizeCrop,
}

impl CropMethod {
    /// Fallback order for method-template selection (most specific first).
    pub const ORDER: [CropMethod; 5] = [
        CropMethod::Original,
        CropMethod::Resize,
        CropMethod::Cover,
        CropMethod::CropResize,
        CropMethod::ResizeCrop,
    ];

    /// Canonical lowercase name as it appears in provider URLs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CropMethod::Original => "original",
            CropMethod::Resize => "resize",
            CropMethod::Cover => "cover",
            CropMethod::CropResize => "cropresize",
            CropMethod::ResizeCrop => "resizecrop",
        }
    }
}

/// Externally supplied initialization parameters.
///
/// Field presence selects one of five initialization modes (see
/// [`CropModel::initialize_sizes`]). Every numeric member is optional;
/// absent and present are distinct states that survive parse → render.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CropOptions {
    /// Output frame width. Required by every initialization mode.
    pub width: Option<f64>,
    /// Output frame height.
    pub height: Option<f64>,
    /// Upper zoom bound. Default 2.0.
    pub max_scale: Option<f64>,
    /// Scaled-image width; presence selects the resizecrop mode.
    pub resize_width: Option<f64>,
    /// Scaled-image height (informational; width drives the scale).
    pub resize_height: Option<f64>,
    /// Pan offset from the left edge, in output pixels.
    pub offset_x: Option<f64>,
    /// Pan offset from the top edge, in output pixels.
    pub offset_y: Option<f64>,
    /// Crop rectangle left, in source pixels.
    pub crop_x: Option<f64>,
    /// Crop rectangle top, in source pixels.
    pub crop_y: Option<f64>,
    /// Crop rectangle width, in source pixels.
    pub crop_width: Option<f64>,
    /// Crop rectangle height, in source pixels.
    pub crop_height: Option<f64>,
    /// Crop rectangle right edge, in source pixels.
    pub crop_x2: Option<f64>,
    /// Crop rectangle bottom edge, in source pixels.
    pub crop_y2: Option<f64>,
    /// Pixels-per-point density factor; size/offset fields are divided by
    /// it during initialization so editing happens in device-independent
    /// units. Crop-rectangle fields are already in source pixels and are
    /// left untouched.
    pub ppp: Option<f64>,
    /// Allow frame-resize requests taller than the scaled image to zoom in
    /// instead of being contained.
    pub auto_zoom: bool,
}

/// Pure derivation from the current state: every numeric output field plus
/// the method classification. Recomputed on demand, never stored.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComputedCrop {
    /// Scaled image width, in output (device) pixels.
    pub resize_width: u32,
    /// Scaled image height, in output (device) pixels.
    pub resize_height: u32,
    /// Pan offset from the left edge (≥ 0), in output pixels.
    pub offset_x: u32,
    /// Pan offset from the top edge (≥ 0), in output pixels.
    pub offset_y: u32,
    /// Crop rectangle left, in source pixels.
    pub crop_x: u32,
    /// Crop rectangle top, in source pixels.
    pub crop_y: u32,
    /// Crop rectangle width, in source pixels.
    pub crop_width: u32,
    /// Crop rectangle height, in source pixels.
    pub crop_height: u32,
    /// Crop rectangle right edge (`crop_x + crop_width`).
    pub crop_x2: u32,
    /// Crop rectangle bottom edge (`crop_y + crop_height`).
    pub crop_y2: u32,
    /// Output frame width, in output pixels.
    pub width: u32,
    /// Output frame height, in output pixels.
    pub height: u32,
    /// Method classification for this selection.
    pub method: CropMethod,
    /// Zoom factor the fields were derived at.
    pub scale: f64,
}

/// Initialization configuration error: none of the five modes can be
/// resolved from the supplied options. The model never silently picks a
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No initialization mode matches the supplied options.
    #[error("no initialization mode matches the supplied options")]
    Unresolved,
    /// Every mode derives the frame from `width`.
    #[error("`width` is required to initialize crop geometry")]
    MissingWidth,
    /// The resizecrop mode needs an explicit frame height.
    #[error("`height` is required when `resize_width` is supplied")]
    MissingHeight,
    /// A crop rectangle was requested but cannot be completed from the
    /// supplied x2/y2 or width/height fields.
    #[error("crop rectangle is underspecified")]
    IncompleteCropRect,
}

// ============================================================================
// Events
// ============================================================================

/// A state-change notification carrying the changed values.
#[derive(Clone, Debug, PartialEq)]
pub enum CropEvent {
    /// Zoom factor changed.
    ScaleChanged {
        /// New zoom factor.
        scale: f64,
        /// Image size at the new zoom factor.
        scaled_size: Size,
    },
    /// Pan offset changed (post-clamping values).
    ContainerPositionChanged {
        /// New left offset (≤ 0).
        left: f64,
        /// New top offset (≤ 0).
        top: f64,
    },
    /// Crop frame dimensions changed.
    CropSizeChanged {
        /// New frame width.
        width: u32,
        /// New frame height.
        height: u32,
    },
    /// Derived lower zoom bound moved.
    MinScaleChanged {
        /// New lower zoom bound.
        min_scale: f64,
    },
    /// Generic "model updated" signal.
    Updated {
        /// What triggered the update.
        reason: &'static str,
    },
}

/// Event category, used for observer registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CropEventKind {
    ScaleChanged,
    ContainerPositionChanged,
    CropSizeChanged,
    MinScaleChanged,
    Updated,
}

impl CropEvent {
    /// The category this event belongs to.
    pub fn kind(&self) -> CropEventKind {
        match self {
            CropEvent::ScaleChanged { .. } => CropEventKind::ScaleChanged,
            CropEvent::ContainerPositionChanged { .. } => {
                CropEventKind::ContainerPositionChanged
            }
            CropEvent::CropSizeChanged { .. } => CropEventKind::CropSizeChanged,
            CropEvent::MinScaleChanged { .. } => CropEventKind::MinScaleChanged,
            CropEvent::Updated { .. } => CropEventKind::Updated,
        }
    }
}

/// Handle returned by [`CropModel::on`]; pass to [`CropModel::off`] to
/// unregister.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

struct Listener {
    id: u64,
    kind: CropEventKind,
    handler: Box<dyn FnMut(&CropEvent)>,
}

// ============================================================================
// State
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
struct CropState {
    /// Pan offset of the scaled image relative to the crop frame.
    /// Both axes ≤ 0 under normal clamping.
    container: (f64, f64),
    /// Fixed output frame.
    crop: Size,
    /// Zoom factor applied to the source dimensions.
    scale: f64,
    /// Derived lower zoom bound; never set directly.
    min_scale: f64,
}

/// Crop geometry engine for one image.
///
/// Created once the source dimensions are known, mutated exclusively
/// through the `update_*` operations, discarded when the session ends.
pub struct CropModel {
    image: Size,
    options: CropOptions,
    state: CropState,
    listeners: Vec<Listener>,
    next_listener_id: u64,
}

/// Clamp with the lower bound winning when the range is inverted (the
/// scaled image can transiently be smaller than the frame mid-update).
fn check_range(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

impl CropModel {
    /// Create a model for an image of known natural dimensions.
    ///
    /// State starts zeroed (scale 1, no pan, empty frame); call
    /// [`initialize_sizes`](Self::initialize_sizes) to derive the starting
    /// geometry from the options.
    pub fn new(options: CropOptions, image: Size) -> Self {
        Self {
            image,
            options,
            state: CropState {
                container: (0.0, 0.0),
                crop: Size::new(0, 0),
                scale: 1.0,
                min_scale: 0.0,
            },
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    // ---- Observers ----

    /// Register a handler for one event category. Returns a handle for
    /// [`off`](Self::off).
    pub fn on(
        &mut self,
        kind: CropEventKind,
        handler: impl FnMut(&CropEvent) + 'static,
    ) -> Subscription {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            handler: Box::new(handler),
        });
        Subscription(id)
    }

    /// Unregister a handler. Returns whether it was still registered.
    pub fn off(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != subscription.0);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: CropEvent) {
        let kind = event.kind();
        for listener in &mut self.listeners {
            if listener.kind == kind {
                (listener.handler)(&event);
            }
        }
    }

    // ---- Getters ----

    /// Natural source dimensions.
    pub fn image_size(&self) -> Size {
        self.image
    }

    /// The configuration this model was built from (post-normalization
    /// once [`initialize_sizes`](Self::initialize_sizes) has run).
    pub fn options(&self) -> &CropOptions {
        &self.options
    }

    /// Current zoom factor.
    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    /// Derived lower zoom bound.
    pub fn min_scale(&self) -> f64 {
        self.state.min_scale
    }

    /// Upper zoom bound (configured, default 2.0).
    pub fn max_scale(&self) -> f64 {
        self.options.max_scale.unwrap_or(2.0)
    }

    /// Current crop frame dimensions.
    pub fn crop_size(&self) -> Size {
        self.state.crop
    }

    /// Current crop frame height.
    pub fn crop_height(&self) -> u32 {
        self.state.crop.height
    }

    /// Current pan offset `(left, top)`, both ≤ 0 under normal clamping.
    pub fn container(&self) -> (f64, f64) {
        self.state.container
    }

    /// Source dimensions scaled by `scale` (or the current scale).
    pub fn scaled_image_size(&self, scale: Option<f64>) -> Size {
        let s = scale.unwrap_or(self.state.scale);
        Size::new(
            (self.image.width as f64 * s).round() as u32,
            (self.image.height as f64 * s).round() as u32,
        )
    }

    /// Current method classification (shorthand for `computed().method`).
    pub fn method(&self) -> CropMethod {
        self.computed().method
    }

    // ---- Pure derivation ----

    /// Derive the full output field set and method classification from the
    /// current state.
    ///
    /// The classification override uses a 1-pixel tolerance on the
    /// slack symmetry and an `l == 0 && t == 0` tie-break. Tightening the
    /// rule breaks round-trips through the simpler provider URL forms.
    pub fn computed(&self) -> ComputedCrop {
        let scaled = self.scaled_image_size(None);
        let (width, height) = (scaled.width as f64, scaled.height as f64);
        let scale = self.state.scale;
        let (crop_w, crop_h) = (
            self.state.crop.width as f64,
            self.state.crop.height as f64,
        );

        // Slack on each side of the frame, in output pixels.
        let l = -self.state.container.0;
        let r = width - crop_w + self.state.container.0;
        let t = -self.state.container.1;
        let b = height - crop_h + self.state.container.1;

        // Device-density multiplier for output fields. Capped so output
        // pixels never exceed source pixels.
        let mut ppp = self.options.ppp.unwrap_or(1.0);
        if ppp * scale > 1.0 {
            ppp = (1.0 / scale).ceil();
        }

        let crop_x = ((l / scale).round()).max(0.0) as u32;
        let crop_y = ((t / scale).round()).max(0.0) as u32;
        let crop_width = (crop_w / scale).round() as u32;
        let crop_height = (crop_h / scale).round() as u32;

        let (dx, dy) = ((l - r).abs(), (t - b).abs());
        let mut method = if self.options.resize_width.is_some() {
            CropMethod::ResizeCrop
        } else {
            CropMethod::CropResize
        };
        if dx <= 1.0 && dy <= 1.0 && (l == 0.0 || t == 0.0) {
            method = if l == 0.0 && t == 0.0 {
                if scale != 1.0 {
                    CropMethod::Resize
                } else {
                    CropMethod::Original
                }
            } else {
                CropMethod::Cover
            };
        }

        ComputedCrop {
            resize_width: (width * ppp).round() as u32,
            resize_height: (height * ppp).round() as u32,
            offset_x: ((-self.state.container.0).max(0.0) * ppp).round() as u32,
            offset_y: ((-self.state.container.1).max(0.0) * ppp).round() as u32,
            crop_x,
            crop_y,
            crop_width,
            crop_height,
            crop_x2: crop_x + crop_width,
            crop_y2: crop_y + crop_height,
            width: (crop_w * ppp).round() as u32,
            height: (crop_h * ppp).round() as u32,
            method,
            scale,
        }
    }

    // ---- Mutators ----

    /// Set a new zoom factor, anchored at fractional point `(xp, yp)` of
    /// the scaled image (default: the point under the crop-frame center).
    ///
    /// The factor is clamped into `[min_scale, max_scale]`; returns whether
    /// anything changed.
    pub fn update_scale(&mut self, new_scale: f64, xp: Option<f64>, yp: Option<f64>) -> bool {
        let scaled = self.scaled_image_size(None);
        let xp = xp.unwrap_or(
            (self.state.crop.width as f64 / 2.0 - self.state.container.0) / scaled.width as f64,
        );
        let yp = yp.unwrap_or(
            (self.state.crop.height as f64 / 2.0 - self.state.container.1)
                / scaled.height as f64,
        );

        let new_scale = check_range(new_scale, self.state.min_scale, self.max_scale());
        if new_scale != self.state.scale {
            let new_scaled = self.scaled_image_size(Some(new_scale));
            let xd = ((new_scaled.width as f64 - scaled.width as f64) * xp).round();
            let yd = ((new_scaled.height as f64 - scaled.height as f64) * yp).round();
            let new_left = self.state.container.0 - xd;
            let new_top = self.state.container.1 - yd;

            self.update_crop_container_pan_zoom(Some(new_left), Some(new_top), Some(new_scale));
            true
        } else {
            false
        }
    }

    fn update_scaled_image_size(&mut self, new_scale: f64) -> bool {
        if self.state.scale != new_scale {
            self.state.scale = new_scale;
            let scaled_size = self.scaled_image_size(None);
            self.emit(CropEvent::ScaleChanged {
                scale: new_scale,
                scaled_size,
            });
            true
        } else {
            false
        }
    }

    /// Set the crop frame dimensions (integer-truncated) and recompute the
    /// derived `min_scale` before any later scale clamp can observe it.
    pub fn update_cropper_frame_size(
        &mut self,
        new_height: Option<f64>,
        new_width: Option<f64>,
    ) -> bool {
        let mut changed = false;

        if let Some(h) = new_height {
            self.state.crop.height = h as u32;
            changed = true;
        }
        if let Some(w) = new_width {
            self.state.crop.width = w as u32;
            changed = true;
        }

        if changed {
            let width_ratio = self.state.crop.width as f64 / self.image.width as f64;
            let height_ratio = self.state.crop.height as f64 / self.image.height as f64;
            let min_scale = width_ratio.max(height_ratio);
            if min_scale != self.state.min_scale {
                self.state.min_scale = min_scale;
                self.emit(CropEvent::MinScaleChanged { min_scale });
            }

            self.emit(CropEvent::CropSizeChanged {
                width: self.state.crop.width,
                height: self.state.crop.height,
            });
        }

        changed
    }

    /// Central mutator: apply an optional scale change, then clamp the pan
    /// offsets so the frame never extends past the scaled image.
    ///
    /// Fires [`CropEvent::ContainerPositionChanged`] only when a clamped
    /// value actually differs from the current one.
    pub fn update_crop_container_pan_zoom(
        &mut self,
        new_left: Option<f64>,
        new_top: Option<f64>,
        new_scale: Option<f64>,
    ) -> bool {
        let mut changed = false;

        if let Some(s) = new_scale {
            changed = self.update_scaled_image_size(s);
        }

        let scaled = self.scaled_image_size(None);

        if let Some(left) = new_left {
            let left = check_range(
                left,
                self.state.crop.width as f64 - scaled.width as f64,
                0.0,
            );
            if self.state.container.0 != left {
                self.state.container.0 = left;
                changed = true;
            }
        }

        if let Some(top) = new_top {
            let top = check_range(
                top,
                self.state.crop.height as f64 - scaled.height as f64,
                0.0,
            );
            if self.state.container.1 != top {
                self.state.container.1 = top;
                changed = true;
            }
        }

        if changed {
            self.emit(CropEvent::ContainerPositionChanged {
                left: self.state.container.0,
                top: self.state.container.1,
            });
        }

        changed
    }

    /// Zoom out to the derived minimum and center the scaled image in the
    /// crop frame.
    pub fn update_pan_zoom_to_fit_crop_container(&mut self) -> bool {
        let new_scale = self.state.min_scale;
        let resized = self.scaled_image_size(Some(new_scale));
        let new_left = ((self.state.crop.width as f64 - resized.width as f64) / 2.0).round();
        let new_top = ((self.state.crop.height as f64 - resized.height as f64) / 2.0).round();
        self.update_crop_container_pan_zoom(Some(new_left), Some(new_top), Some(new_scale))
    }

    /// Frame-height change policy, with the classification and the prior
    /// geometry supplied by the caller (so a driver can replay a height
    /// change against a snapshot taken before other mutations).
    ///
    /// Unless auto-zoom is enabled the request is contained at the scaled
    /// image height. Basic classifications (original/cover/resize) re-fit so
    /// they stay in cover-like geometry instead of drifting into a crop;
    /// over-tall requests become zoom requests; anything else is a
    /// vertical-centering crop.
    pub fn update_crop_height_with(
        &mut self,
        method: CropMethod,
        new_height: f64,
        orig_height: f64,
        original_top: f64,
        max_height: f64,
    ) {
        let mut new_height = new_height;
        if !self.options.auto_zoom && new_height > max_height {
            new_height = max_height;
        }
        let new_height = new_height.round();

        self.update_cropper_frame_size(Some(new_height), None);

        match method {
            CropMethod::Original | CropMethod::Cover | CropMethod::Resize => {
                self.update_pan_zoom_to_fit_crop_container();
            }
            _ if new_height > max_height => {
                let new_scale = new_height / self.image.height as f64;
                self.update_scale(new_scale, None, None);
            }
            _ => {
                let mut new_top = ((new_height - orig_height) / 2.0).round() + original_top;
                if new_top > 0.0 {
                    new_top = 0.0;
                }
                self.update_crop_container_pan_zoom(None, Some(new_top), None);
            }
        }
    }

    /// Request a new crop frame height under the current classification.
    /// Returns whether the height actually changed.
    pub fn update_crop_height(&mut self, new_height: f64) -> bool {
        let orig_height = self.state.crop.height as f64;
        let method = self.computed().method;
        let original_top = self.state.container.1;
        let max_height = self.scaled_image_size(None).height as f64;
        self.update_crop_height_with(method, new_height, orig_height, original_top, max_height);
        orig_height != self.state.crop.height as f64
    }

    /// Scale so the configured width spans the full source width, with the
    /// frame height following the source aspect ratio.
    pub fn update_pan_zoom_crop_to_fit_width_and_aspect(&mut self) -> bool {
        let Some(width) = self.options.width else {
            return false;
        };

        let new_scale = width / self.image.width as f64;
        let new_height = (self.image.height as f64 * new_scale).round();
        let mut changed = self.update_crop_height(new_height);
        changed = self.update_scale(new_scale, None, None) || changed;
        changed
    }

    /// Try "fit the crop frame", then "fit width and aspect", then force
    /// scale 1 — stopping at the first step that changes anything. Always
    /// fires a generic [`CropEvent::Updated`].
    pub fn update_smart_auto_resize(&mut self) {
        let done = self.update_pan_zoom_to_fit_crop_container();
        if !done {
            let done = self.update_pan_zoom_crop_to_fit_width_and_aspect();
            if !done {
                self.update_scale(1.0, None, None);
            }
        }
        self.emit(CropEvent::Updated { reason: "autosize" });
    }

    // ---- Initialization ----

    /// Bootstrap state from the supplied options.
    ///
    /// Five mutually exclusive modes, selected by field presence in
    /// priority order:
    ///
    /// 1. **resizecrop**: `resize_width` present
    /// 2. **cropresize**: `crop_x2` or `crop_width` present
    /// 3. **cover**: `height` present
    /// 4. **resize**: `width` present
    /// 5. otherwise: [`ConfigError::Unresolved`]
    ///
    /// A units pre-pass divides `width`/`height`/`resize_*`/`offset_*` by
    /// `ppp` first; crop-rectangle fields are already in source pixels and
    /// stay untouched.
    pub fn initialize_sizes(&mut self) -> Result<(), ConfigError> {
        if let Some(ppp) = self.options.ppp {
            for field in [
                &mut self.options.width,
                &mut self.options.height,
                &mut self.options.resize_width,
                &mut self.options.resize_height,
                &mut self.options.offset_x,
                &mut self.options.offset_y,
            ] {
                if let Some(v) = field {
                    *v = (*v / ppp).round();
                }
            }
        }

        let o = self.options.clone();
        let (iw, ih) = (self.image.width as f64, self.image.height as f64);

        let (new_scale, new_crop_height, new_width, new_left, new_top);

        if let Some(resize_width) = o.resize_width {
            // resizecrop: scale from the requested resize width, pan from
            // the offsets.
            new_scale = resize_width / iw;
            new_crop_height = o.height.ok_or(ConfigError::MissingHeight)?;
            new_width = o.width.ok_or(ConfigError::MissingWidth)?;
            new_left = -o.offset_x.unwrap_or(0.0);
            new_top = -o.offset_y.unwrap_or(0.0);
            debug!(mode = "resizecrop", scale = new_scale, "initializing crop geometry");
        } else if o.crop_x2.is_some() || o.crop_width.is_some() {
            // cropresize: complete the crop rectangle, then scale it to the
            // output width.
            let width = o.width.ok_or(ConfigError::MissingWidth)?;
            let crop_x = o.crop_x.unwrap_or(0.0);
            let crop_y = o.crop_y.unwrap_or(0.0);
            let crop_width = match o.crop_width {
                Some(w) => w,
                None => o.crop_x2.ok_or(ConfigError::IncompleteCropRect)? - crop_x,
            };
            let crop_height = match o.crop_height {
                Some(h) => h,
                None => o.crop_y2.ok_or(ConfigError::IncompleteCropRect)? - crop_y,
            };
            if crop_width <= 0.0 || crop_height <= 0.0 {
                return Err(ConfigError::IncompleteCropRect);
            }

            // Write the completed rectangle back so later reads of the
            // options see consistent values.
            self.options.crop_x = Some(crop_x);
            self.options.crop_y = Some(crop_y);
            self.options.crop_width = Some(crop_width);
            self.options.crop_height = Some(crop_height);

            new_scale = width / crop_width;
            new_crop_height = o.height.unwrap_or(crop_height * new_scale);
            new_width = width;
            new_left = (-crop_x * new_scale).round();
            new_top = (-crop_y * new_scale).round();
            debug!(mode = "cropresize", scale = new_scale, "initializing crop geometry");
        } else if let Some(height) = o.height {
            // cover: fill the requested frame, centering the overflow axis.
            let width = o.width.ok_or(ConfigError::MissingWidth)?;
            new_scale = (width / iw).max(height / ih);
            new_width = width.min((iw * new_scale).round());
            new_crop_height = height.min((ih * new_scale).round());
            let resized = self.scaled_image_size(Some(new_scale));
            new_left = ((new_width - resized.width as f64) / 2.0).round();
            new_top = ((new_crop_height - resized.height as f64) / 2.0).round();
            debug!(mode = "cover", scale = new_scale, "initializing crop geometry");
        } else if let Some(width) = o.width {
            // resize: proportional, no offset.
            new_scale = width / iw;
            new_crop_height = (ih * new_scale).round();
            new_width = width;
            new_left = 0.0;
            new_top = 0.0;
            debug!(mode = "resize", scale = new_scale, "initializing crop geometry");
        } else {
            return Err(ConfigError::Unresolved);
        }

        self.update_cropper_frame_size(Some(new_crop_height), Some(new_width));
        self.update_crop_container_pan_zoom(Some(new_left), Some(new_top), Some(new_scale));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
