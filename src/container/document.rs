//! The slice of the glTF JSON schema the optimizer rewrites.
//!
//! Only `buffers`, `bufferViews` and `images` are modelled. Everything else
//! in the document (meshes, materials, accessors, extensions, unknown
//! members on the modelled objects) is captured in flattened `extra` maps
//! and serialized back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Range;

/// Root of a glTF JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffers: Vec<Buffer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buffer_views: Vec<BufferView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A logical buffer. `uri` is absent for the GLB binary chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub byte_length: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A sub-range of exactly one buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<u64>,
    pub byte_length: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BufferView {
    /// Byte offset into the owning buffer (absent means 0).
    pub fn offset(&self) -> u64 {
        self.byte_offset.unwrap_or(0)
    }

    /// `[offset, offset + byteLength)` within the owning buffer.
    pub fn range(&self) -> Range<u64> {
        let start = self.offset();
        start..start.saturating_add(self.byte_length)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_view: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where an image's encoded bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// A relative file path or a `data:` URI, looked up as a named resource.
    Uri(&'a str),
    /// A range of a buffer, described by a buffer view.
    BufferView(usize),
}

impl Image {
    /// Addressing mode of this image.
    ///
    /// A URI always wins: the buffer view is only consulted when the image
    /// carries no URI. Returns `None` when neither is set.
    pub fn source(&self) -> Option<ImageSource<'_>> {
        match (&self.uri, self.buffer_view) {
            (Some(uri), _) => Some(ImageSource::Uri(uri)),
            (None, Some(view)) => Some(ImageSource::BufferView(view)),
            (None, None) => None,
        }
    }
}
