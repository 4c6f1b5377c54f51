//! glTF container model: JSON document, GLB codec and resource backends.
//!
//! | Piece | Role |
//! |---|---|
//! | [`Document`] | `buffers` / `bufferViews` / `images`, everything else carried through |
//! | [`glb`] | GLB header and chunk encoding |
//! | [`Resource`] | closed set of storage backends (GLB chunk, file, base64, remote) |
//! | [`Gltf`] | document + resource arena; load, lookup, export |

mod document;
pub mod glb;
mod model;
mod resource;

pub use document::{Buffer, BufferView, Document, Image, ImageSource};
pub use model::{ContainerError, ContainerKind, Gltf, parent_dir};
pub use resource::{Resource, data_uri_mime_type};
