//! Bundled dialect definitions for the supported image CDNs.
//!
//! Match patterns accept every URL shape the provider's crop pipeline
//! emits; render templates are keyed by method so each URL carries only
//! the parameters its method needs. Providers whose dialect has no native
//! form for a method rely on the forward fallback (for example sirv
//! renders a cropresize state through its resizecrop form).

use std::sync::OnceLock;

use super::{FromSrc, ToSrc, UrlAdapter, UrlCodec};
use crate::model::CropMethod::{Cover, CropResize, Original, Resize, ResizeCrop};

/// A supported CDN dialect.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    Cloudinary,
    Imagekit,
    Gumlet,
    Sirv,
    Uploadcare,
    Cloudimage,
    Weserv,
    Filestack,
    Thumbor,
    Wnimageproxy,
    Imaginary,
    Mosaico,
    Imageflow,
    Cimage,
    Glide,
}

fn adapter(
    from_src: &str,
    to_src: ToSrc,
    default_prefix: Option<&str>,
) -> UrlAdapter {
    UrlAdapter {
        from_src: FromSrc::Pattern(from_src.to_string()),
        to_src,
        default_prefix: default_prefix.map(str::to_string),
    }
}

impl Provider {
    /// Every bundled dialect.
    pub const ALL: [Provider; 15] = [
        Provider::Cloudinary,
        Provider::Imagekit,
        Provider::Gumlet,
        Provider::Sirv,
        Provider::Uploadcare,
        Provider::Cloudimage,
        Provider::Weserv,
        Provider::Filestack,
        Provider::Thumbor,
        Provider::Wnimageproxy,
        Provider::Imaginary,
        Provider::Mosaico,
        Provider::Imageflow,
        Provider::Cimage,
        Provider::Glide,
    ];

    /// Lowercase dialect name.
    pub const fn name(self) -> &'static str {
        match self {
            Provider::Cloudinary => "cloudinary",
            Provider::Imagekit => "imagekit",
            Provider::Gumlet => "gumlet",
            Provider::Sirv => "sirv",
            Provider::Uploadcare => "uploadcare",
            Provider::Cloudimage => "cloudimage",
            Provider::Weserv => "weserv",
            Provider::Filestack => "filestack",
            Provider::Thumbor => "thumbor",
            Provider::Wnimageproxy => "wnimageproxy",
            Provider::Imaginary => "imaginary",
            Provider::Mosaico => "mosaico",
            Provider::Imageflow => "imageflow",
            Provider::Cimage => "cimage",
            Provider::Glide => "glide",
        }
    }

    /// Look up a dialect by its lowercase name.
    pub fn from_name(name: &str) -> Option<Provider> {
        Provider::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// The declarative adapter for this dialect.
    pub fn adapter(self) -> UrlAdapter {
        match self {
            Provider::Cloudinary => adapter(
                r"{urlPrefix:.*/upload}(/x_{cropX},y_{cropY},w_{cropWidth},h_{cropHeight},c_crop/w_{width},h_{height},c_scale|/w_{resizeWidth},h_{resizeHeight},c_scale/x_{offsetX},y_{offsetY},w_{width},h_{height},c_crop|/w_{width}(,h_{height},c_fill)?)?{urlPostfix:/[^/]*}",
                ToSrc::per_method([
                    (Original, "{urlPrefix}{urlPostfix}"),
                    (Resize, "{urlPrefix}/w_{width}{urlPostfix}"),
                    (Cover, "{urlPrefix}/w_{width},h_{height},c_fill{urlPostfix}"),
                    (
                        CropResize,
                        "{urlPrefix}/x_{cropX},y_{cropY},w_{cropWidth},h_{cropHeight},c_crop/w_{width},h_{height},c_scale{urlPostfix}",
                    ),
                    (
                        ResizeCrop,
                        "{urlPrefix}/w_{resizeWidth},h_{resizeHeight},c_scale/x_{offsetX},y_{offsetY},w_{width},h_{height},c_crop{urlPostfix}",
                    ),
                ]),
                None,
            ),
            Provider::Imagekit => adapter(
                r"{urlPrefix:https?://[^/]*/[^/]*}/tr:(w-{resizeWidth},h-{resizeHeight}:w-{width},h-{height},cm-extract,x-{offsetX},y-{offsetY}(,fo-top_left)?|(w-{cropWidth},h-{cropHeight},cm-extract,x-{cropX},y-{cropY}(,fo-top_left)?:)?w-{width}(,h-{height})?){urlPostfix:/.*}",
                ToSrc::per_method([
                    (Original, "{urlPrefix}{urlPostfix}"),
                    (Resize, "{urlPrefix}/tr:w-{width}{urlPostfix}"),
                    (Cover, "{urlPrefix}/tr:w-{width},h-{height}{urlPostfix}"),
                    (
                        CropResize,
                        "{urlPrefix}/tr:w-{cropWidth},h-{cropHeight},cm-extract,x-{cropX},y-{cropY},fo-top_left:w-{width},h-{height}{urlPostfix}",
                    ),
                    (
                        ResizeCrop,
                        "{urlPrefix}/tr:w-{resizeWidth},h-{resizeHeight}:w-{width},h-{height},cm-extract,x-{offsetX},y-{offsetY},fo-top_left{urlPostfix}",
                    ),
                ]),
                None,
            ),
            Provider::Gumlet => adapter(
                r"{urlPrefix:[^\?]*}{urlOriginal:http[^\?]*}?\?(width={width}|(extract={cropX},{cropY},{cropWidth},{cropHeight}&)?mode=crop&width={width}&height={height})",
                ToSrc::per_method([
                    (Resize, "{urlPrefix}{urlOriginal}?width={width}"),
                    (
                        Cover,
                        "{urlPrefix}{urlOriginal}?mode=crop&width={width}&height={height}",
                    ),
                    (
                        CropResize,
                        "{urlPrefix}{urlOriginal}?extract={cropX},{cropY},{cropWidth},{cropHeight}&mode=crop&width={width}&height={height}",
                    ),
                ]),
                Some("https://moimagecropper-demo.gumlet.com/p/"),
            ),
            Provider::Sirv => adapter(
                r"{urlPrefix:[^\?]*}\?(w={width}(&h={height}&scale.option=fill&cw={width}&ch={height}&cx=center&cy=center)?|w={resizeWidth}(&h={resizeHeight})?&cx={offsetX}&cy={offsetY}&cw={width}&ch={height})",
                ToSrc::per_method([
                    (Resize, "{urlPrefix}?w={width}"),
                    (
                        Cover,
                        "{urlPrefix}?w={width}&h={height}&scale.option=fill&cw={width}&ch={height}&cx=center&cy=center",
                    ),
                    (
                        ResizeCrop,
                        "{urlPrefix}?w={resizeWidth}&cx={offsetX}&cy={offsetY}&cw={width}&ch={height}",
                    ),
                ]),
                None,
            ),
            Provider::Uploadcare => adapter(
                r"{urlPrefix:((?!/-/).)*/}((-/crop/{cropWidth}x{cropHeight}/{cropX},{cropY}/)?-/resize/{width}x/|-/resize/{resizeWidth}x/-/crop/{width}x{height}/{offsetX},{offsetY}/|-/scale_crop/{width}x{height}/)",
                ToSrc::per_method([
                    (Original, "{urlPrefix}"),
                    (Resize, "{urlPrefix}-/resize/{width}x/"),
                    (Cover, "{urlPrefix}-/scale_crop/{width}x{height}/"),
                    (
                        CropResize,
                        "{urlPrefix}-/crop/{cropWidth}x{cropHeight}/{cropX},{cropY}/-/resize/{width}x/",
                    ),
                    (
                        ResizeCrop,
                        "{urlPrefix}-/resize/{resizeWidth}x/-/crop/{width}x{height}/{offsetX},{offsetY}/",
                    ),
                ]),
                None,
            ),
            Provider::Cloudimage => adapter(
                r"{urlPrefix:https?://[^/]*/}(crop_px/{cropX},{cropY},{cropX2},{cropY2}-{width}x{height}|crop/{width}x{height}|width/{width})/n/{urlOriginal:.*}",
                ToSrc::per_method([
                    (Resize, "{urlPrefix}width/{width}/n/{urlOriginal}"),
                    (Cover, "{urlPrefix}crop/{width}x{height}/n/{urlOriginal}"),
                    (
                        CropResize,
                        "{urlPrefix}crop_px/{cropX},{cropY},{cropX2},{cropY2}-{width}x{height}/n/{urlOriginal}",
                    ),
                ]),
                Some("https://demo.cloudimg.io/"),
            ),
            Provider::Weserv => adapter(
                r"{urlPrefix:https?://[^/]*/}\?(w={width}&h={height}&t=square&|w={resizeWidth}(&h={resizeHeight})?&t=fitup&crop={width},{height},{offsetX},{offsetY}&)?url={encodedUrlOriginal}",
                ToSrc::per_method([
                    (Original, "{urlPrefix}?url={encodedUrlOriginal}"),
                    (
                        Cover,
                        "{urlPrefix}?w={width}&h={height}&t=square&url={encodedUrlOriginal}",
                    ),
                    (
                        ResizeCrop,
                        "{urlPrefix}?w={resizeWidth}&t=fitup&crop={width},{height},{offsetX},{offsetY}&url={encodedUrlOriginal}",
                    ),
                ]),
                Some("https://images.weserv.nl/"),
            ),
            Provider::Filestack => adapter(
                r"{urlPrefix:https?://[^/]*/}((crop=d:\[{cropX},{cropY},{cropWidth},{cropHeight}\]/)?resize=w:{width}(,h:{height},fit:crop)?/)?{urlPostfix:[^/]*}",
                ToSrc::per_method([
                    (Original, "{urlPrefix}{urlPostfix}"),
                    (Resize, "{urlPrefix}resize=w:{width}/{urlPostfix}"),
                    (
                        Cover,
                        "{urlPrefix}resize=w:{width},h:{height},fit:crop/{urlPostfix}",
                    ),
                    (
                        CropResize,
                        "{urlPrefix}crop=d:[{cropX},{cropY},{cropWidth},{cropHeight}]/resize=w:{width},h:{height},fit:crop/{urlPostfix}",
                    ),
                ]),
                None,
            ),
            Provider::Thumbor => adapter(
                r"{urlPrefix:https?://.*?/unsafe/}({cropX}x{cropY}:{cropX2}x{cropY2}/)?({width}x({height})?/)?{urlOriginal:.*}",
                ToSrc::per_method([
                    (Original, "{urlPrefix}{urlOriginal}"),
                    (Resize, "{urlPrefix}{width}x/{urlOriginal}"),
                    (Cover, "{urlPrefix}{width}x{height}/{urlOriginal}"),
                    (
                        CropResize,
                        "{urlPrefix}{cropX}x{cropY}:{cropX2}x{cropY2}/{width}x{height}/{urlOriginal}",
                    ),
                ]),
                Some("https://i2.wp.com/thumbor.thumborize.me/unsafe/"),
            ),
            Provider::Wnimageproxy => adapter(
                r"{urlPrefix:https?://.*/imageproxy/}(((cx{cropX},)?(cy{cropY},)?cw{cropWidth},ch{cropHeight},)?{width}x({height})?/){urlOriginal:.*}",
                ToSrc::per_method([
                    (Resize, "{urlPrefix}{width}x/{urlOriginal}"),
                    (Cover, "{urlPrefix}{width}x{height}/{urlOriginal}"),
                    (
                        CropResize,
                        "{urlPrefix}cx{cropX},cy{cropY},cw{cropWidth},ch{cropHeight},{width}x{height}/{urlOriginal}",
                    ),
                ]),
                Some("https://willnorris.com/api/imageproxy/"),
            ),
            Provider::Imaginary => adapter(
                r"{urlPrefix:https?://[^/]*/}(resize\?width={width}&nocrop=true|resize\?width={width}&height={height}|extract\?width={resizeWidth}&height={resizeHeight}&left={offsetX}&top={offsetY}&areawidth={width}&areaheight={height})&url={encodedUrlOriginal}",
                ToSrc::per_method([
                    (
                        Resize,
                        "{urlPrefix}resize?width={width}&nocrop=true&url={encodedUrlOriginal}",
                    ),
                    (
                        Cover,
                        "{urlPrefix}resize?width={width}&height={height}&url={encodedUrlOriginal}",
                    ),
                    (
                        ResizeCrop,
                        "{urlPrefix}extract?width={resizeWidth}&height={resizeHeight}&left={offsetX}&top={offsetY}&areawidth={width}&areaheight={height}&url={encodedUrlOriginal}",
                    ),
                ]),
                Some("https://static.pimmr.me/"),
            ),
            // Bundled demo backend; also reachable scheme-relative.
            Provider::Mosaico => adapter(
                r"{urlPrefix:(https?://[^/]*)?/img}\?method=(resize&params={width}|cover&params={width},{height}|cropresize&params={cropWidth},{cropHeight},{cropX},{cropY},{width},{height})&url={encodedUrlOriginal}",
                ToSrc::per_method([
                    (
                        Resize,
                        "{urlPrefix}?method=resize&params={width}&url={encodedUrlOriginal}",
                    ),
                    (
                        Cover,
                        "{urlPrefix}?method=cover&params={width},{height}&url={encodedUrlOriginal}",
                    ),
                    (
                        CropResize,
                        "{urlPrefix}?method=cropresize&params={cropWidth},{cropHeight},{cropX},{cropY},{width},{height}&url={encodedUrlOriginal}",
                    ),
                ]),
                Some("/img"),
            ),
            Provider::Imageflow => adapter(
                r"{urlPrefix:https?://[^;]*};(w={width}|w={width};h={height};mode=crop;scale=both|crop={cropX},{cropY},{cropX2},{cropY2};w={width};h={height};mode=crop;scale=both)",
                ToSrc::per_method([
                    (Resize, "{urlPrefix};w={width}"),
                    (Cover, "{urlPrefix};w={width};h={height};mode=crop;scale=both"),
                    (
                        CropResize,
                        "{urlPrefix};crop={cropX},{cropY},{cropX2},{cropY2};w={width};h={height};mode=crop;scale=both",
                    ),
                ]),
                None,
            ),
            Provider::Cimage => adapter(
                r"{urlPrefix:https?://[^\?]*\?(src=[^&]*&)?}(w={width}|w={width}&h={height}&crop-to-fit|crop={cropWidth},{cropHeight},{cropX},{cropY}&w={width})",
                ToSrc::per_method([
                    (Resize, "{urlPrefix}w={width}"),
                    (Cover, "{urlPrefix}w={width}&h={height}&crop-to-fit"),
                    (
                        CropResize,
                        "{urlPrefix}crop={cropWidth},{cropHeight},{cropX},{cropY}&w={width}",
                    ),
                ]),
                Some("https://cimage.se/cimage/imgd.php"),
            ),
            Provider::Glide => adapter(
                r"{urlPrefix:https?://[^\?]*}\?(crop={cropWidth},{cropHeight},{cropX},{cropY}&)?w={width}(&h={height}&fit=crop)?",
                ToSrc::per_method([
                    (Resize, "{urlPrefix}?w={width}"),
                    (Cover, "{urlPrefix}?w={width}&h={height}&fit=crop"),
                    (
                        CropResize,
                        "{urlPrefix}?crop={cropWidth},{cropHeight},{cropX},{cropY}&w={width}&h={height}&fit=crop",
                    ),
                ]),
                None,
            ),
        }
    }

    /// The compiled codec for this dialect, built on first use.
    pub fn codec(self) -> &'static UrlCodec {
        static CODECS: [OnceLock<UrlCodec>; Provider::ALL.len()] =
            [const { OnceLock::new() }; Provider::ALL.len()];
        CODECS[self as usize].get_or_init(|| {
            UrlCodec::new(&self.adapter()).expect("bundled adapter pattern is valid")
        })
    }
}
