//! GLB binary container codec.
//!
//! ```text
//! header   magic "glTF" | version 2 | total length     (3 × u32 LE)
//! chunk 0  length | "JSON" | JSON bytes, space padded  (required)
//! chunk 1  length | "BIN\0" | binary bytes, zero padded (optional)
//! ```
//!
//! Chunk lengths are always multiples of 4. Chunks of unknown type are
//! skipped on read and never written.

use super::model::ContainerError;

pub const MAGIC: [u8; 4] = *b"glTF";
pub const VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = u32::from_le_bytes(*b"JSON");
pub const CHUNK_BIN: u32 = u32::from_le_bytes(*b"BIN\0");

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// A decoded GLB: the JSON chunk and the optional binary chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glb {
    pub json: Vec<u8>,
    pub bin: Option<Vec<u8>>,
}

/// True when `data` starts with the GLB magic.
pub fn is_glb(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == MAGIC
}

fn read_u32_le(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

impl Glb {
    pub fn from_slice(data: &[u8]) -> Result<Self, ContainerError> {
        if data.len() < HEADER_LEN {
            return Err(ContainerError::InvalidGlb(
                "file too small for GLB header".into(),
            ));
        }
        if !is_glb(data) {
            return Err(ContainerError::InvalidGlb("invalid magic".into()));
        }
        let version = read_u32_le(data, 4);
        if version != VERSION {
            return Err(ContainerError::InvalidGlb(format!(
                "unsupported version {version}"
            )));
        }
        let length = read_u32_le(data, 8) as usize;
        if length > data.len() {
            return Err(ContainerError::InvalidGlb(format!(
                "header declares {length} bytes but file has {}",
                data.len()
            )));
        }

        let mut offset = HEADER_LEN;
        let mut json = None;
        let mut bin = None;

        while offset + CHUNK_HEADER_LEN <= length {
            let chunk_length = read_u32_le(data, offset) as usize;
            let chunk_type = read_u32_le(data, offset + 4);
            offset += CHUNK_HEADER_LEN;

            let end = offset
                .checked_add(chunk_length)
                .filter(|end| *end <= length)
                .ok_or_else(|| ContainerError::InvalidGlb("chunk extends past file end".into()))?;
            let chunk = &data[offset..end];
            offset = end;

            match chunk_type {
                CHUNK_JSON if json.is_none() => json = Some(chunk.to_vec()),
                CHUNK_BIN if json.is_none() => {
                    return Err(ContainerError::InvalidGlb(
                        "BIN chunk precedes JSON chunk".into(),
                    ));
                }
                CHUNK_BIN if bin.is_none() => bin = Some(chunk.to_vec()),
                _ => {}
            }
        }

        let json = json.ok_or_else(|| ContainerError::InvalidGlb("no JSON chunk".into()))?;
        Ok(Self { json, bin })
    }

    /// Encode to GLB bytes, padding each chunk to a 4-byte boundary.
    pub fn to_vec(&self) -> Result<Vec<u8>, ContainerError> {
        let json_padded = padded_len(self.json.len());
        let bin_padded = self.bin.as_ref().map(|b| padded_len(b.len()));

        let total = HEADER_LEN
            + CHUNK_HEADER_LEN
            + json_padded
            + bin_padded.map_or(0, |len| CHUNK_HEADER_LEN + len);
        let total_u32 = u32::try_from(total)
            .map_err(|_| ContainerError::InvalidGlb(format!("{total} bytes exceeds GLB limit")))?;

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&total_u32.to_le_bytes());

        write_chunk(&mut out, CHUNK_JSON, &self.json, json_padded, b' ');
        if let (Some(bin), Some(len)) = (&self.bin, bin_padded) {
            write_chunk(&mut out, CHUNK_BIN, bin, len, 0);
        }
        Ok(out)
    }
}

/// Strip trailing padding from a JSON chunk. Spaces are the standard fill,
/// but some exporters pad with NUL bytes.
pub fn trim_json_padding(json: &[u8]) -> &[u8] {
    let end = json
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\0'))
        .map_or(0, |i| i + 1);
    &json[..end]
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(4) * 4
}

// Lengths were bounds-checked against u32 in `to_vec`.
fn write_chunk(out: &mut Vec<u8>, kind: u32, data: &[u8], padded: usize, fill: u8) {
    out.extend_from_slice(&(padded as u32).to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(data);
    out.resize(out.len() + (padded - data.len()), fill);
}
