//! Storage backends for buffer and image bytes.
//!
//! | Variant | Source | Loaded |
//! |---|---|---|
//! | [`Resource::Glb`] | GLB `BIN` chunk (buffer without URI) | eagerly |
//! | [`Resource::File`] | relative path next to the container | on first access, then cached |
//! | [`Resource::Base64`] | `data:<mime>;base64,<payload>` URI | eagerly |
//! | [`Resource::Remote`] | URI with a scheme (`http://…`) | never |
//!
//! A resource is identified by the URI string it was created from, so
//! replacing its bytes keeps every buffer and image that points at it valid.

use super::model::ContainerError;
use base64::{Engine as _, engine::general_purpose};
use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Glb {
        data: Vec<u8>,
    },
    File {
        uri: String,
        /// Percent-decoded path, relative to the container's directory.
        path: PathBuf,
        mime_type: Option<String>,
        data: Option<Vec<u8>>,
    },
    Base64 {
        uri: String,
        mime_type: Option<String>,
        data: Vec<u8>,
    },
    Remote {
        uri: String,
    },
}

impl Resource {
    /// Classify a URI and build the matching resource.
    ///
    /// `data:` URIs are decoded immediately; file URIs are not read until
    /// [`load`](Self::load) is called.
    pub fn from_uri(uri: &str) -> Result<Self, ContainerError> {
        if let Some(rest) = uri.strip_prefix("data:") {
            let (mime_type, data) = decode_data_uri(rest)
                .ok_or_else(|| ContainerError::InvalidUri(truncate_uri(uri)))?;
            return Ok(Resource::Base64 {
                uri: uri.to_string(),
                mime_type,
                data,
            });
        }
        if has_scheme(uri) {
            return Ok(Resource::Remote {
                uri: uri.to_string(),
            });
        }
        let path = percent_decode(uri).ok_or_else(|| ContainerError::InvalidUri(uri.into()))?;
        Ok(Resource::File {
            uri: uri.to_string(),
            path: PathBuf::from(path),
            mime_type: None,
            data: None,
        })
    }

    /// The URI this resource is looked up by. `None` for the GLB chunk.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Resource::Glb { .. } => None,
            Resource::File { uri, .. } | Resource::Base64 { uri, .. } | Resource::Remote { uri } => {
                Some(uri.as_str())
            }
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Resource::File { mime_type, .. } | Resource::Base64 { mime_type, .. } => {
                mime_type.as_deref()
            }
            Resource::Glb { .. } | Resource::Remote { .. } => None,
        }
    }

    /// Bytes of the resource, if they are in memory.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Resource::Glb { data } | Resource::Base64 { data, .. } => Some(data.as_slice()),
            Resource::File { data, .. } => data.as_deref(),
            Resource::Remote { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.data().is_some()
    }

    /// Whether [`with_data`](Self::with_data) can produce a replacement.
    pub fn is_rewritable(&self) -> bool {
        !matches!(self, Resource::Remote { .. })
    }

    /// True for a file whose path is absolute or climbs out of the
    /// directory it is resolved against with `..`.
    pub fn escapes_base_dir(&self) -> bool {
        match self {
            Resource::File { path, .. } => !path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir)),
            _ => false,
        }
    }

    /// Read the resource into memory. Idempotent: a loaded (or replaced)
    /// resource is never read from disk again.
    pub fn load(&mut self, base_dir: &Path) -> Result<&[u8], ContainerError> {
        match self {
            Resource::Glb { data } | Resource::Base64 { data, .. } => Ok(data.as_slice()),
            Resource::File { uri, path, data, .. } => {
                if data.is_none() {
                    let bytes = std::fs::read(base_dir.join(&*path)).map_err(|source| {
                        ContainerError::ResourceLoad {
                            resource: uri.clone(),
                            source,
                        }
                    })?;
                    *data = Some(bytes);
                }
                Ok(data.as_deref().unwrap_or_default())
            }
            Resource::Remote { uri } => Err(ContainerError::RemoteResource(uri.clone())),
        }
    }

    /// A resource of the same kind and identity holding `data` instead.
    ///
    /// `mime_type` overrides the stored MIME type when given. Returns `None`
    /// for backends that cannot be rewritten.
    pub fn with_data(&self, data: Vec<u8>, mime_type: Option<&str>) -> Option<Resource> {
        let pick = |current: &Option<String>| mime_type.map(str::to_string).or(current.clone());
        match self {
            Resource::Glb { .. } => Some(Resource::Glb { data }),
            Resource::File {
                uri,
                path,
                mime_type: current,
                ..
            } => Some(Resource::File {
                uri: uri.clone(),
                path: path.clone(),
                mime_type: pick(current),
                data: Some(data),
            }),
            Resource::Base64 {
                uri,
                mime_type: current,
                ..
            } => Some(Resource::Base64 {
                uri: uri.clone(),
                mime_type: pick(current),
                data,
            }),
            Resource::Remote { .. } => None,
        }
    }

    /// Re-encode a base64 resource as a `data:` URI.
    pub fn to_data_uri(&self) -> Option<String> {
        match self {
            Resource::Base64 {
                mime_type, data, ..
            } => Some(format!(
                "data:{};base64,{}",
                mime_type.as_deref().unwrap_or("application/octet-stream"),
                general_purpose::STANDARD.encode(data)
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Glb { .. } => write!(f, "GLB binary chunk"),
            Resource::File { uri, .. } => write!(f, "file \"{uri}\""),
            Resource::Base64 { uri, .. } => write!(f, "base64 data URI {}", truncate_uri(uri)),
            Resource::Remote { uri } => write!(f, "remote URI \"{uri}\""),
        }
    }
}

/// Parse the part of a data URI after `data:`.
fn decode_data_uri(rest: &str) -> Option<(Option<String>, Vec<u8>)> {
    let (header, payload) = rest.split_once(',')?;
    let media_type = header.strip_suffix(";base64")?;
    let data = general_purpose::STANDARD.decode(payload.trim()).ok()?;
    let mime_type = (!media_type.is_empty()).then(|| media_type.to_string());
    Some((mime_type, data))
}

/// MIME type declared in a `data:` URI header, if `uri` is one.
pub fn data_uri_mime_type(uri: &str) -> Option<&str> {
    let header = uri.strip_prefix("data:")?.split_once(',')?.0;
    let media_type = header.split(';').next()?;
    (!media_type.is_empty()).then_some(media_type)
}

fn has_scheme(uri: &str) -> bool {
    uri.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn percent_decode(uri: &str) -> Option<String> {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = uri.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn truncate_uri(uri: &str) -> String {
    match uri.char_indices().nth(48) {
        Some((at, _)) => format!("{}…", &uri[..at]),
        None => uri.to_string(),
    }
}
