//! Image re-encoding in pure Rust, with no system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Resolve kind** | declared `mimeType`, else URI extension / data-URI media type |
//! | **Decode** | `image::load_from_memory_with_format` |
//! | **PNG encode** | `PngEncoder` with best compression + adaptive filtering |
//! | **JPEG encode** | `JpegEncoder` at quality 95 |
//!
//! The module is split into:
//! - **Format**: [`ImageKind`] resolution and MIME constants
//! - **Parameters**: [`EncodeParams`] describing how hard to compress
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]

pub mod backend;
mod format;
mod params;
pub mod rust_backend;

pub use backend::{CodecError, ImageCodec};
pub use format::{FormatError, ImageKind, MIME_JPEG, MIME_PNG, guess_mime_type};
pub use params::{EncodeParams, PngCompression, PngFilter, Quality};
pub use rust_backend::RustCodec;
