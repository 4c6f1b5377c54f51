//! Pure Rust codec: decoders and encoders from the `image` crate.
//!
//! | Kind | Decode | Encode |
//! |---|---|---|
//! | PNG | `image::codecs::png` | `PngEncoder::new_with_quality` (compression + filter from params) |
//! | JPEG | `image::codecs::jpeg` | `JpegEncoder::new_with_quality` (quality from params) |
//!
//! PNG re-encoding is lossless: pixels and color type are preserved, only
//! the deflate stream changes. JPEG re-encoding is lossy and always emits
//! 8-bit grayscale or RGB.

use super::backend::{CodecError, ImageCodec};
use super::format::ImageKind;
use super::params::{EncodeParams, PngCompression, PngFilter};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

/// Codec backed by the `image` crate.
///
/// See the [module docs](self) for the format-to-encoder mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(data: &[u8], kind: ImageKind) -> Result<DynamicImage, CodecError> {
    image::load_from_memory_with_format(data, kind.image_format()).map_err(|e| {
        CodecError::Decode {
            kind,
            reason: e.to_string(),
        }
    })
}

fn compression_type(compression: PngCompression) -> CompressionType {
    match compression {
        PngCompression::Default => CompressionType::Default,
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Best => CompressionType::Best,
    }
}

fn filter_type(filter: PngFilter) -> FilterType {
    match filter {
        PngFilter::None => FilterType::NoFilter,
        PngFilter::Sub => FilterType::Sub,
        PngFilter::Up => FilterType::Up,
        PngFilter::Avg => FilterType::Avg,
        PngFilter::Paeth => FilterType::Paeth,
        PngFilter::Adaptive => FilterType::Adaptive,
    }
}

fn encode_png(img: &DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut out,
        compression_type(params.png_compression),
        filter_type(params.png_filter),
    );
    img.write_with_encoder(encoder)
        .map_err(|e| CodecError::Encode {
            kind: ImageKind::Png,
            reason: e.to_string(),
        })?;
    Ok(out)
}

/// The JPEG encoder only accepts 8-bit luma or RGB.
fn jpeg_compatible(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        other if other.color().has_color() => DynamicImage::ImageRgb8(other.to_rgb8()),
        other => DynamicImage::ImageLuma8(other.to_luma8()),
    }
}

fn encode_jpeg(img: DynamicImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
    let img = jpeg_compatible(img);
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, params.jpeg_quality.value());
    img.write_with_encoder(encoder)
        .map_err(|e| CodecError::Encode {
            kind: ImageKind::Jpeg,
            reason: e.to_string(),
        })?;
    Ok(out)
}

impl ImageCodec for RustCodec {
    fn recompress(
        &self,
        data: &[u8],
        kind: ImageKind,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, CodecError> {
        let img = decode(data, kind)?;
        match kind {
            ImageKind::Png => encode_png(&img, params),
            ImageKind::Jpeg => encode_jpeg(img, params),
        }
    }
}
