//! Shared test utilities for the gltf-slim test suite.
//!
//! Provides small encoded images and builders for glTF/GLB fixtures, so
//! tests can set up a scene in a temp directory without checked-in binaries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_glb(tmp.path(), "scene.glb", &[
//!     EmbeddedImage::png(png_bytes(32, 32)),
//!     EmbeddedImage::jpeg(jpeg_bytes(32, 32)),
//! ]);
//! ```

use crate::container::glb::Glb;
use crate::imaging::{MIME_JPEG, MIME_PNG};
use crate::splice::pad_to_4;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageBuffer, Rgb, Rgba};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

// =========================================================================
// Encoded images
// =========================================================================

fn gradient(width: u32, height: u32) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
    })
}

fn encode_png_fast(img: &DynamicImage) -> Vec<u8> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter);
    img.write_with_encoder(encoder).unwrap();
    out
}

/// RGB gradient PNG written with the cheapest settings, so re-encoding it
/// with best compression always shrinks it.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_png_fast(&DynamicImage::ImageRgb8(gradient(width, height)))
}

/// RGBA gradient PNG with a varying alpha channel.
pub fn rgba_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x * 4) as u8, (y * 4) as u8, 128, ((x * y) % 256) as u8])
    });
    encode_png_fast(&DynamicImage::ImageRgba8(img))
}

/// RGB gradient JPEG at quality 100.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, 100);
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(encoder)
        .unwrap();
    out
}

// =========================================================================
// Scene fixtures
// =========================================================================

/// Bytes of the non-image view appended after the images in every fixture.
pub const GEOMETRY: [u8; 16] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16,
];

/// An image to embed in a buffer view.
pub struct EmbeddedImage {
    pub mime_type: Option<&'static str>,
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            mime_type: Some(MIME_PNG),
            data,
        }
    }

    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            mime_type: Some(MIME_JPEG),
            data,
        }
    }
}

/// Build a document and binary buffer holding `images` back to back
/// (each padded to 4 bytes), followed by one geometry view of [`GEOMETRY`].
///
/// View `i` holds image `i`; the geometry view is last.
pub fn scene_with_images(images: &[EmbeddedImage]) -> (Value, Vec<u8>) {
    let mut bin = Vec::new();
    let mut views = Vec::new();
    let mut entries = Vec::new();
    for (i, image) in images.iter().enumerate() {
        views.push(json!({
            "buffer": 0,
            "byteOffset": bin.len(),
            "byteLength": image.data.len(),
        }));
        let mut entry = json!({"bufferView": i, "name": format!("image{i}")});
        if let Some(mime) = image.mime_type {
            entry["mimeType"] = json!(mime);
        }
        entries.push(entry);
        bin.extend(pad_to_4(image.data.clone()));
    }
    views.push(json!({
        "buffer": 0,
        "byteOffset": bin.len(),
        "byteLength": GEOMETRY.len(),
        "target": 34962,
    }));
    bin.extend_from_slice(&GEOMETRY);

    let doc = json!({
        "asset": {"version": "2.0", "generator": "fixture"},
        "buffers": [{"byteLength": bin.len()}],
        "bufferViews": views,
        "images": entries,
    });
    (doc, bin)
}

/// Write a GLB built by [`scene_with_images`] to `dir/name`.
pub fn write_glb(dir: &Path, name: &str, images: &[EmbeddedImage]) -> PathBuf {
    let (doc, bin) = scene_with_images(images);
    let bytes = Glb {
        json: serde_json::to_vec(&doc).unwrap(),
        bin: Some(bin),
    }
    .to_vec()
    .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Write a `.gltf` document to `dir/name` whose images are the external
/// files `(uri, bytes)`; each file is written next to the document. A
/// `geometry.bin` buffer holding [`GEOMETRY`] is referenced too.
pub fn write_gltf_with_files(dir: &Path, name: &str, files: &[(&str, Vec<u8>)]) -> PathBuf {
    for (uri, data) in files {
        let path = dir.join(uri);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, data).unwrap();
    }
    std::fs::write(dir.join("geometry.bin"), GEOMETRY).unwrap();

    let images: Vec<Value> = files.iter().map(|(uri, _)| json!({"uri": uri})).collect();
    let doc = json!({
        "asset": {"version": "2.0"},
        "buffers": [{"uri": "geometry.bin", "byteLength": GEOMETRY.len()}],
        "bufferViews": [{"buffer": 0, "byteLength": GEOMETRY.len()}],
        "images": images,
    });
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    path
}

// =========================================================================
// Lookups
// =========================================================================

/// Read a field of the JSON chunk or document at `path`.
pub fn read_document(path: &Path) -> Value {
    let bytes = std::fs::read(path).unwrap();
    if crate::container::glb::is_glb(&bytes) {
        serde_json::from_slice(&Glb::from_slice(&bytes).unwrap().json).unwrap()
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}
