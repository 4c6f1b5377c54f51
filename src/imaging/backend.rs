//! Codec trait and shared error type.
//!
//! The [`ImageCodec`] trait is the single operation the optimizer needs:
//! take encoded bytes of a known kind, decode them, and encode them again
//! with the requested settings.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), pure Rust and built on the
//! `image` crate.

use super::format::ImageKind;
use super::params::EncodeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to decode {kind:?} image: {reason}")]
    Decode { kind: ImageKind, reason: String },
    #[error("Failed to encode {kind:?} image: {reason}")]
    Encode { kind: ImageKind, reason: String },
}

/// Trait for image codecs.
pub trait ImageCodec {
    /// Decode `data` as `kind` and re-encode it as the same kind.
    fn recompress(
        &self,
        data: &[u8],
        kind: ImageKind,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, CodecError>;
}
