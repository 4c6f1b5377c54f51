//! # gltf-slim
//!
//! Shrinks glTF 2.0 scenes by re-encoding the images inside them. Every PNG
//! is re-compressed losslessly with maximum effort and every JPEG is
//! re-encoded at a configurable quality; geometry and all other data are
//! carried over byte for byte.
//!
//! # Architecture
//!
//! ```text
//! Gltf::load        .glb / .gltf  →  document + resource arena
//! optimize_image    for each image: resolve kind → recompress → write back
//!   ├─ buffer view  splice_buffer_region  (repairs later offsets)
//!   └─ URI          replace_resource      (file / data URI swapped in place)
//! Gltf::export      same container kind at the output path
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`container`] | glTF document model, GLB codec, resource backends, load and export |
//! | [`splice`] | Buffer splicing with offset repair, wholesale resource replacement |
//! | [`imaging`] | Image kind resolution and the PNG/JPEG re-encoding codec |
//! | [`optimize`] | Per-file driver, progress events and reports |
//! | [`size`] | On-disk size accounting including external files |
//! | [`config`] | `gltf-slim.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Index-Stable Arenas
//!
//! Buffers, buffer views, images and resources are plain `Vec`s addressed by
//! index, exactly as glTF addresses them. Rewriting a resource swaps one
//! element in place, so every index held elsewhere stays valid and the
//! driver never juggles references into the model.
//!
//! ## Closed Resource Backends
//!
//! A resource is one of four variants: the GLB binary chunk, an external
//! file, a base64 data URI or a remote URI. Each knows how to load its bytes
//! and how to produce a copy holding new bytes. Remote URIs cannot be
//! rewritten; asking to is an error rather than a silent skip.
//!
//! ## Declaration-Order Offset Repair
//!
//! After a splice only views declared after the spliced one (on the same
//! buffer) move. Exporters lay views out in ascending offset order, and the
//! splicer relies on that; a view that would move below zero is reported.
//! See [`splice`].
//!
//! ## All or Nothing
//!
//! Every image is re-encoded in memory before anything is written. The
//! container goes to a temporary file that is renamed into place, so a failed
//! run leaves no partial output behind.

pub mod config;
pub mod container;
pub mod imaging;
pub mod optimize;
pub mod output;
pub mod size;
pub mod splice;

#[cfg(test)]
pub(crate) mod test_helpers;
