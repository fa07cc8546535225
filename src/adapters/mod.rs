//! Bidirectional URL codecs for image-CDN crop dialects.
//!
//! Each provider dialect is described by a declarative [`UrlAdapter`]:
//! a match side that extracts crop fields from a source URL and a render
//! side that rebuilds a URL from computed crop fields. Compiling an
//! adapter yields a [`UrlCodec`].
//!
//! # Example
//!
//! ```
//! use zencrop::adapters::{infer_method, Provider};
//!
//! let codec = Provider::Cloudinary.codec();
//! let url = "https://res.cloudinary.com/demo/image/upload/w_200/balloons.jpg";
//!
//! let fields = codec.try_match(url).unwrap().expect("dialect match");
//! assert_eq!(fields.get("width").map(String::as_str), Some("200"));
//!
//! let method = infer_method(&fields);
//! assert_eq!(codec.render_fields(&fields, method).unwrap(), url);
//! ```

mod convert;
mod pattern;
mod providers;
mod template;

pub use pattern::{CompiledPattern, PatternError};
pub use providers::Provider;
pub use template::{decode_uri_component, encode_uri_component, render_template};

use std::collections::BTreeMap;

use tracing::warn;

use crate::model::CropMethod;

/// Field values extracted from or rendered into a URL, keyed by the wire
/// names (`width`, `cropX`, `urlPrefix`, ...). Values are kept as strings;
/// absent and present-empty are distinct states.
pub type FieldMap = BTreeMap<String, String>;

/// Match side of an adapter.
#[derive(Clone, Debug)]
pub enum FromSrc {
    /// A full token pattern matched against the whole URL.
    Pattern(String),
    /// Subpatterns for the adapter's non-builtin tokens; the match pattern
    /// itself is synthesized from the render templates.
    Subpatterns(BTreeMap<String, String>),
}

/// Render side of an adapter.
#[derive(Clone, Debug)]
pub enum ToSrc {
    /// One template regardless of method.
    Single(String),
    /// Per-method templates. Rendering scans forward from the classified
    /// method through [`CropMethod::ORDER`] to the first defined entry, so
    /// a missing specific form falls back to a more general one and never
    /// to a less expressive one.
    PerMethod(BTreeMap<CropMethod, String>),
}

impl ToSrc {
    /// Build a per-method table from `(method, template)` pairs.
    pub fn per_method<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CropMethod, S)>,
        S: Into<String>,
    {
        ToSrc::PerMethod(
            entries
                .into_iter()
                .map(|(m, t)| (m, t.into()))
                .collect(),
        )
    }

    fn template_for(&self, method: CropMethod) -> Option<&str> {
        match self {
            ToSrc::Single(template) => Some(template),
            ToSrc::PerMethod(map) => CropMethod::ORDER
                .iter()
                .skip_while(|m| **m != method)
                .find_map(|m| map.get(m))
                .map(String::as_str),
        }
    }

    fn templates(&self) -> Vec<&str> {
        match self {
            ToSrc::Single(template) => vec![template],
            ToSrc::PerMethod(map) => map.values().map(String::as_str).collect(),
        }
    }
}

/// Declarative description of one provider dialect.
#[derive(Clone, Debug)]
pub struct UrlAdapter {
    /// How to recognize and pick apart a URL in this dialect.
    pub from_src: FromSrc,
    /// How to rebuild a URL from computed fields.
    pub to_src: ToSrc,
    /// Fallback prefix for URLs that do not match: the URL is treated as
    /// an untouched original served through this prefix.
    pub default_prefix: Option<String>,
}

/// Rendering error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The per-method table has no entry at or after the requested method.
    #[error("no url template for method `{}` or any later fallback", method.as_str())]
    NoTemplate {
        /// The classified method that could not be rendered.
        method: CropMethod,
    },
}

/// URL context captured when a source URL is first parsed, re-injected
/// into every render so prefix and original survive round trips.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// Everything before the transform section.
    pub url_prefix: Option<String>,
    /// Everything after the transform section.
    pub url_postfix: Option<String>,
    /// The untransformed image URL (decoded).
    pub url_original: Option<String>,
}

impl UrlParts {
    /// Extract the URL-context fields from a match result.
    pub fn from_fields(fields: &FieldMap) -> Self {
        Self {
            url_prefix: fields.get("urlPrefix").cloned(),
            url_postfix: fields.get("urlPostfix").cloned(),
            url_original: fields.get("urlOriginal").cloned(),
        }
    }
}

/// Classify a parsed field set by presence, most specific first. Mirrors
/// the initialization-mode priority of
/// [`CropModel::initialize_sizes`](crate::CropModel::initialize_sizes).
pub fn infer_method(fields: &FieldMap) -> CropMethod {
    if fields.contains_key("resizeWidth") {
        CropMethod::ResizeCrop
    } else if fields.contains_key("cropX") || fields.contains_key("cropX2") {
        CropMethod::CropResize
    } else if fields.contains_key("height") {
        CropMethod::Cover
    } else if fields.contains_key("width") {
        CropMethod::Resize
    } else {
        CropMethod::Original
    }
}

/// A compiled, ready-to-use dialect codec.
#[derive(Debug)]
pub struct UrlCodec {
    pattern: CompiledPattern,
    to_src: ToSrc,
    default_prefix: Option<String>,
}

impl UrlCodec {
    /// Compile an adapter.
    ///
    /// For the [`FromSrc::Subpatterns`] form the matcher is synthesized by
    /// escaping every render template, joining them as alternatives and
    /// resolving bare tokens against the builtins first, then the
    /// subpattern map.
    pub fn new(adapter: &UrlAdapter) -> Result<Self, PatternError> {
        let pattern = match &adapter.from_src {
            FromSrc::Pattern(p) => CompiledPattern::compile(p, None)?,
            FromSrc::Subpatterns(map) => {
                let escaped: Vec<String> = adapter
                    .to_src
                    .templates()
                    .into_iter()
                    .map(pattern::escape_template)
                    .collect();
                let composed = format!("({})", escaped.join("|"));
                CompiledPattern::compile(&composed, Some(map))?
            }
        };
        Ok(Self {
            pattern,
            to_src: adapter.to_src.clone(),
            default_prefix: adapter.default_prefix.clone(),
        })
    }

    /// Strict match. `Ok(None)` when the URL is not in this dialect. A
    /// matched `encodedUrlOriginal` is decoded into `urlOriginal`.
    pub fn try_match(&self, url: &str) -> Result<Option<FieldMap>, PatternError> {
        let mut matched = self.pattern.match_url(url)?;
        if let Some(fields) = matched.as_mut() {
            if let Some(encoded) = fields.get("encodedUrlOriginal") {
                fields.insert("urlOriginal".to_string(), decode_uri_component(encoded));
            }
        }
        Ok(matched)
    }

    /// Match with the default-prefix fallback: an unrecognized URL becomes
    /// an untouched original behind the configured prefix. `Ok(None)` only
    /// when there is no fallback either.
    pub fn parse(&self, url: &str) -> Result<Option<FieldMap>, PatternError> {
        if let Some(fields) = self.try_match(url)? {
            return Ok(Some(fields));
        }
        match &self.default_prefix {
            Some(prefix) => {
                let mut fields = FieldMap::new();
                fields.insert("urlOriginal".to_string(), url.to_string());
                fields.insert("urlPrefix".to_string(), prefix.clone());
                fields.insert("urlPostfix".to_string(), url.to_string());
                Ok(Some(fields))
            }
            None => {
                warn!(url, "image url matches neither the dialect nor a default prefix");
                Ok(None)
            }
        }
    }

    /// Render a URL from a field set, selecting the template by forward
    /// method fallback.
    ///
    /// The URL-context fields are normalized first: missing `urlPrefix`,
    /// `urlPostfix` and `urlOriginal` render as empty rather than leaking
    /// token text, and `encodedUrlOriginal` is always recomputed from
    /// `urlOriginal`.
    pub fn render_fields(
        &self,
        fields: &FieldMap,
        method: CropMethod,
    ) -> Result<String, RenderError> {
        let mut fields = fields.clone();
        for key in ["urlPrefix", "urlPostfix", "urlOriginal"] {
            fields.entry(key.to_string()).or_default();
        }
        let original = fields
            .get("urlOriginal")
            .cloned()
            .unwrap_or_default();
        fields.insert(
            "encodedUrlOriginal".to_string(),
            encode_uri_component(&original),
        );

        let template = self
            .to_src
            .template_for(method)
            .ok_or(RenderError::NoTemplate { method })?;
        Ok(render_template(template, &fields))
    }

    /// Render a URL for a computed crop within a previously captured URL
    /// context.
    pub fn render(
        &self,
        parts: &UrlParts,
        computed: &crate::model::ComputedCrop,
    ) -> Result<String, RenderError> {
        let mut fields = computed.to_fields();
        if let Some(prefix) = &parts.url_prefix {
            fields.insert("urlPrefix".to_string(), prefix.clone());
        }
        if let Some(postfix) = &parts.url_postfix {
            fields.insert("urlPostfix".to_string(), postfix.clone());
        }
        if let Some(original) = &parts.url_original {
            fields.insert("urlOriginal".to_string(), original.clone());
        }
        self.render_fields(&fields, computed.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_adapter() -> UrlAdapter {
        UrlAdapter {
            from_src: FromSrc::Pattern(
                "{urlPrefix:https?://[^/]*/img}.*method=resize.*params={width:[0-9]+}.*url={encodedUrlOriginal:[^ &\\?]+}"
                    .to_string(),
            ),
            to_src: ToSrc::per_method([
                (
                    CropMethod::Resize,
                    "{urlPrefix}?method=resize&params={width}&url={encodedUrlOriginal}",
                ),
                (
                    CropMethod::Cover,
                    "{urlPrefix}?method=cover&params={width},{height}&url={encodedUrlOriginal}",
                ),
            ]),
            default_prefix: None,
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn try_match_extracts_and_decodes() {
        let codec = UrlCodec::new(&simple_adapter()).unwrap();
        let url =
            "https://proxy.example.com/img?method=resize&params=300&url=https%3A%2F%2Fexample.com%2Fimage.jpg";

        let f = codec.try_match(url).unwrap().unwrap();
        assert_eq!(
            f.get("urlPrefix").map(String::as_str),
            Some("https://proxy.example.com/img")
        );
        assert_eq!(f.get("width").map(String::as_str), Some("300"));
        assert_eq!(
            f.get("encodedUrlOriginal").map(String::as_str),
            Some("https%3A%2F%2Fexample.com%2Fimage.jpg")
        );
        assert_eq!(
            f.get("urlOriginal").map(String::as_str),
            Some("https://example.com/image.jpg")
        );
    }

    #[test]
    fn try_match_rejects_foreign_urls() {
        let codec = UrlCodec::new(&simple_adapter()).unwrap();
        let url = "https://unknown.example.com/img?method=other&params=300&url=x";
        assert!(codec.try_match(url).unwrap().is_none());
    }

    #[test]
    fn parse_falls_back_to_default_prefix() {
        let mut adapter = simple_adapter();
        adapter.default_prefix = Some("https://default.example.com/img".to_string());
        let codec = UrlCodec::new(&adapter).unwrap();

        let f = codec.parse("https://example.com/image.jpg").unwrap().unwrap();
        assert_eq!(
            f.get("urlOriginal").map(String::as_str),
            Some("https://example.com/image.jpg")
        );
        assert_eq!(
            f.get("urlPrefix").map(String::as_str),
            Some("https://default.example.com/img")
        );
        assert_eq!(
            f.get("urlPostfix").map(String::as_str),
            Some("https://example.com/image.jpg")
        );
    }

    #[test]
    fn parse_without_fallback_returns_none() {
        let codec = UrlCodec::new(&simple_adapter()).unwrap();
        assert!(codec.parse("https://example.com/image.jpg").unwrap().is_none());
    }

    #[test]
    fn render_selects_method_template() {
        let codec = UrlCodec::new(&simple_adapter()).unwrap();
        let f = fields(&[
            ("urlPrefix", "https://proxy.example.com/img"),
            ("urlOriginal", "https://example.com/image.jpg"),
            ("width", "300"),
            ("height", "200"),
        ]);

        assert_eq!(
            codec.render_fields(&f, CropMethod::Cover).unwrap(),
            "https://proxy.example.com/img?method=cover&params=300,200&url=https%3A%2F%2Fexample.com%2Fimage.jpg"
        );
    }

    #[test]
    fn render_falls_forward_never_backward() {
        let adapter = UrlAdapter {
            from_src: FromSrc::Pattern("{urlPrefix:https?://[^/]*/img}".to_string()),
            to_src: ToSrc::per_method([(
                CropMethod::ResizeCrop,
                "{urlPrefix}?rw={resizeWidth}&x={offsetX}",
            )]),
            default_prefix: None,
        };
        let codec = UrlCodec::new(&adapter).unwrap();
        let f = fields(&[
            ("urlPrefix", "https://proxy.example.com/img"),
            ("resizeWidth", "400"),
            ("offsetX", "50"),
        ]);

        // cropresize has no entry: skips forward to resizecrop
        assert_eq!(
            codec.render_fields(&f, CropMethod::CropResize).unwrap(),
            "https://proxy.example.com/img?rw=400&x=50"
        );
        // nothing at or after the end of the table: an error, not a
        // silent backward pick
        let adapter = UrlAdapter {
            from_src: FromSrc::Pattern("{urlPrefix:https?://[^/]*/img}".to_string()),
            to_src: ToSrc::per_method([(CropMethod::Resize, "{urlPrefix}?w={width}")]),
            default_prefix: None,
        };
        let codec = UrlCodec::new(&adapter).unwrap();
        assert_eq!(
            codec.render_fields(&f, CropMethod::CropResize),
            Err(RenderError::NoTemplate {
                method: CropMethod::CropResize
            })
        );
    }

    #[test]
    fn render_normalizes_missing_url_context() {
        let adapter = UrlAdapter {
            from_src: FromSrc::Pattern("{urlPrefix:.*}".to_string()),
            to_src: ToSrc::Single(
                "{urlPrefix}{urlOriginal}?u={encodedUrlOriginal}&h={height}".to_string(),
            ),
            default_prefix: None,
        };
        let codec = UrlCodec::new(&adapter).unwrap();

        // context fields render empty; the unknown data field stays verbatim
        assert_eq!(
            codec.render_fields(&FieldMap::new(), CropMethod::Original).unwrap(),
            "?u=&h={height}"
        );
    }

    #[test]
    fn subpatterns_form_synthesizes_matcher_from_templates() {
        let mut subs = BTreeMap::new();
        subs.insert("urlPrefix".to_string(), "https?://[^/]*/img".to_string());
        subs.insert("encodedUrlOriginal".to_string(), "[^ &\\?]+".to_string());
        let adapter = UrlAdapter {
            from_src: FromSrc::Subpatterns(subs),
            to_src: ToSrc::per_method([
                (
                    CropMethod::Resize,
                    "{urlPrefix}?method=resize&params={width}&url={encodedUrlOriginal}",
                ),
                (
                    CropMethod::Cover,
                    "{urlPrefix}?method=cover&params={width},{height}&url={encodedUrlOriginal}",
                ),
            ]),
            default_prefix: None,
        };
        let codec = UrlCodec::new(&adapter).unwrap();

        let url = "https://proxy.example.com/img?method=cover&params=300,100&url=pic.jpg";
        let f = codec.try_match(url).unwrap().unwrap();
        assert_eq!(f.get("width").map(String::as_str), Some("300"));
        assert_eq!(f.get("height").map(String::as_str), Some("100"));
        assert_eq!(codec.render_fields(&f, infer_method(&f)).unwrap(), url);
    }

    #[test]
    fn infer_method_priority() {
        assert_eq!(infer_method(&FieldMap::new()), CropMethod::Original);
        assert_eq!(infer_method(&fields(&[("width", "1")])), CropMethod::Resize);
        assert_eq!(
            infer_method(&fields(&[("width", "1"), ("height", "2")])),
            CropMethod::Cover
        );
        assert_eq!(
            infer_method(&fields(&[("width", "1"), ("height", "2"), ("cropX", "3")])),
            CropMethod::CropResize
        );
        assert_eq!(
            infer_method(&fields(&[("width", "1"), ("cropX2", "9")])),
            CropMethod::CropResize
        );
        assert_eq!(
            infer_method(&fields(&[("resizeWidth", "4"), ("cropX", "3")])),
            CropMethod::ResizeCrop
        );
    }
}
