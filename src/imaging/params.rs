//! Parameter types for re-encoding.
//!
//! These describe *how hard* to compress, not *what* to compress. The
//! optimizer builds one [`EncodeParams`] from the config and hands it to the
//! codec with every image, so a mock codec can assert on exactly what it was
//! asked to do.
//!
//! - [`Quality`]: JPEG quality (1–100, default 95). Clamped on construction.
//! - [`PngCompression`] / [`PngFilter`]: deflate effort and row filter for PNG.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Deflate effort for PNG output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Default,
    Fast,
    #[default]
    Best,
}

/// Row filter for PNG output. `Adaptive` picks the best filter per row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngFilter {
    None,
    Sub,
    Up,
    Avg,
    Paeth,
    #[default]
    Adaptive,
}

/// Everything the codec needs besides the bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeParams {
    pub jpeg_quality: Quality,
    pub png_compression: PngCompression,
    pub png_filter: PngFilter,
}
