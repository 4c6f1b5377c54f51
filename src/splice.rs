//! Buffer splicing and offset repair.
//!
//! Replacing an embedded image changes the length of one buffer view. Every
//! later view of the same buffer has to move by the same amount, and the
//! buffer's declared length has to follow, or the container stops being
//! internally consistent.
//!
//! ```text
//! before   | view 0 (100) | view 1 (50) | view 2 (30) |     byteLength 180
//! splice view 0 with 60 bytes → delta = -40
//! after    | view 0 (60) | view 1 (50) | view 2 (30) |       byteLength 140
//!                          offset 60     offset 110
//! ```
//!
//! # Ordering precondition
//!
//! Only views declared *after* the spliced view are shifted. This assumes
//! the views of one buffer are declared in ascending offset order, which is
//! how exporters lay them out. The true spatial order is not inferred; a
//! later-declared view that would be shifted below zero is reported as
//! [`SpliceError::ViewOutOfOrder`].

use crate::container::{ContainerError, Gltf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("Buffer view {0} does not exist")]
    InvalidBufferView(usize),
    #[error("Buffer {buffer} referenced by buffer view {view} does not exist")]
    InvalidBuffer { view: usize, buffer: usize },
    #[error("Unsupported backend: cannot rewrite {0}")]
    UnsupportedBackend(String),
    #[error("Missing data for buffer {buffer}: {source}")]
    MissingData {
        buffer: usize,
        #[source]
        source: ContainerError,
    },
    #[error("Missing resource: {0}")]
    MissingResource(String),
    #[error("Buffer view {view} ends at byte {end} but its buffer holds {len} bytes")]
    ViewOutOfBounds { view: usize, end: u64, len: usize },
    #[error("Buffer view {view} is declared after the spliced view but starts before it")]
    ViewOutOfOrder { view: usize },
}

/// Round `len` up to the next multiple of 4.
pub fn round_up4(len: usize) -> usize {
    len.div_ceil(4) * 4
}

/// Zero-pad `payload` to a 4-byte boundary.
pub fn pad_to_4(mut payload: Vec<u8>) -> Vec<u8> {
    payload.resize(round_up4(payload.len()), 0);
    payload
}

/// What a splice changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpliceOutcome {
    pub buffer: usize,
    pub original_length: u64,
    pub new_length: u64,
    pub delta: i64,
}

/// Replace the bytes of buffer view `view_index` with `payload`.
///
/// The payload is zero-padded to a multiple of 4. The view keeps its offset
/// and takes the padded length; later views of the same buffer shift by the
/// length difference; the buffer's `byteLength` shifts by the same amount;
/// the buffer's resource is swapped for one holding the spliced bytes.
///
/// Nothing in the model is modified unless the whole splice succeeds.
pub fn splice_buffer_region(
    gltf: &mut Gltf,
    view_index: usize,
    payload: &[u8],
) -> Result<SpliceOutcome, SpliceError> {
    let view = gltf
        .document
        .buffer_views
        .get(view_index)
        .ok_or(SpliceError::InvalidBufferView(view_index))?;
    let buffer = view.buffer;
    let range = view.range();
    let original_length = view.byte_length;
    if buffer >= gltf.document.buffers.len() {
        return Err(SpliceError::InvalidBuffer {
            view: view_index,
            buffer,
        });
    }

    let missing = |source| SpliceError::MissingData { buffer, source };
    let resource_index = gltf.buffer_resource_index(buffer).map_err(missing)?;
    let resource = &gltf.resources[resource_index];
    if !resource.is_rewritable() {
        return Err(SpliceError::UnsupportedBackend(resource.to_string()));
    }

    // Whole backing store, loaded before anything changes
    let data = gltf.load_resource(resource_index).map_err(missing)?;
    if range.end > data.len() as u64 {
        return Err(SpliceError::ViewOutOfBounds {
            view: view_index,
            end: range.end,
            len: data.len(),
        });
    }

    let padded = pad_to_4(payload.to_vec());
    let new_length = padded.len() as u64;
    let delta = new_length as i64 - original_length as i64;

    let (start, end) = (range.start as usize, range.end as usize);
    let mut spliced = Vec::with_capacity(data.len() - (end - start) + padded.len());
    spliced.extend_from_slice(&data[..start]);
    spliced.extend_from_slice(&padded);
    spliced.extend_from_slice(&data[end..]);

    let mut shifted = Vec::new();
    for (index, other) in gltf
        .document
        .buffer_views
        .iter()
        .enumerate()
        .skip(view_index + 1)
    {
        if other.buffer != buffer {
            continue;
        }
        let offset = other
            .offset()
            .checked_add_signed(delta)
            .ok_or(SpliceError::ViewOutOfOrder { view: index })?;
        shifted.push((index, offset));
    }

    let buffer_length = gltf.document.buffers[buffer]
        .byte_length
        .saturating_add_signed(delta);
    let replacement = gltf.resources[resource_index]
        .with_data(spliced, None)
        .ok_or_else(|| SpliceError::UnsupportedBackend(gltf.resources[resource_index].to_string()))?;

    gltf.document.buffer_views[view_index].byte_length = new_length;
    for (index, offset) in shifted {
        gltf.document.buffer_views[index].byte_offset = Some(offset);
    }
    gltf.document.buffers[buffer].byte_length = buffer_length;
    gltf.resources[resource_index] = replacement;

    Ok(SpliceOutcome {
        buffer,
        original_length,
        new_length,
        delta,
    })
}

/// Replace the content of the resource named `uri` wholesale.
///
/// Kind, identity and MIME type are preserved; `mime_type` overrides the
/// stored type when the image declares one. No buffer or view changes.
pub fn replace_resource(
    gltf: &mut Gltf,
    uri: &str,
    payload: Vec<u8>,
    mime_type: Option<&str>,
) -> Result<usize, SpliceError> {
    let index = gltf
        .resource_index(uri)
        .map_err(|_| SpliceError::MissingResource(uri.to_string()))?;
    let resource = &gltf.resources[index];
    let replacement = resource
        .with_data(payload, mime_type)
        .ok_or_else(|| SpliceError::UnsupportedBackend(resource.to_string()))?;
    gltf.resources[index] = replacement;
    Ok(index)
}
