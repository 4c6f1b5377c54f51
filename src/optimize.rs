//! Per-file optimization driver.
//!
//! Loads a container, re-encodes every image in declaration order and
//! writes the result:
//!
//! ```text
//! for each image i:
//!     kind  = resolve(mimeType, uri)          # fail fast on unknown types
//!     bytes = view range (read fresh) | URI resource
//!     new   = codec.recompress(bytes, kind)
//!     view  → splice_buffer_region(view, new) # repairs later offsets
//!     uri   → replace_resource(uri, new)
//! export(output)
//! ```
//!
//! Buffer view ranges are read from the model on every iteration because
//! each splice can move the views that follow it. Any failure aborts the
//! run before the output container is written.
//!
//! ## Progress
//!
//! The driver reports progress as [`OptimizeEvent`]s over an optional
//! channel; the CLI formats them with [`crate::output`].

use crate::container::{ContainerError, Gltf, ImageSource, Resource, parent_dir};
use crate::imaging::{CodecError, EncodeParams, FormatError, ImageCodec, ImageKind, RustCodec};
use crate::size::container_size;
use crate::splice::{SpliceError, replace_resource, splice_buffer_region};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Image {index}: {source}")]
    UnsupportedFormat {
        index: usize,
        #[source]
        source: FormatError,
    },
    #[error("Image {index}: {source}")]
    Splice {
        index: usize,
        #[source]
        source: SpliceError,
    },
    #[error("Image {index}: {source}")]
    Codec {
        index: usize,
        #[source]
        source: CodecError,
    },
    #[error("Image {index}: {source}")]
    ResourceLoad {
        index: usize,
        #[source]
        source: ContainerError,
    },
    #[error("Image {0} does not exist")]
    InvalidImage(usize),
    #[error("Image {0} has neither a URI nor a buffer view")]
    MissingSource(usize),
    #[error("Refusing to overwrite input file {}", .0.display())]
    WouldOverwriteInput(PathBuf),
    #[error("Refusing to clean {}: it contains input {}", .dir.display(), .input.display())]
    WouldDeleteInput { dir: PathBuf, input: PathBuf },
}

/// Progress events emitted while a file is optimized.
#[derive(Debug, Clone)]
pub enum OptimizeEvent {
    FileStarted {
        path: PathBuf,
        image_count: usize,
    },
    /// `index` is 0-based.
    ImageStarted {
        index: usize,
        count: usize,
        uri: Option<String>,
    },
    ImageOptimized {
        index: usize,
        original_size: usize,
        compressed_size: usize,
        elapsed: Duration,
    },
    Writing {
        path: PathBuf,
    },
    FileFinished {
        input: PathBuf,
        output: PathBuf,
        original_size: u64,
        new_size: u64,
        elapsed: Duration,
    },
}

/// Outcome of re-encoding one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
    pub index: usize,
    pub kind: ImageKind,
    pub uri: Option<String>,
    pub original_size: usize,
    pub compressed_size: usize,
    pub elapsed: Duration,
}

/// Outcome of optimizing one container. Sizes include external files.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub images: Vec<ImageReport>,
    pub original_size: u64,
    pub new_size: u64,
    pub elapsed: Duration,
}

fn send(progress: &Option<Sender<OptimizeEvent>>, event: OptimizeEvent) {
    if let Some(tx) = progress {
        tx.send(event).ok();
    }
}

/// Optimize `input` into `output` with the built-in codec.
pub fn optimize_file(
    input: &Path,
    output: &Path,
    params: &EncodeParams,
    progress: Option<Sender<OptimizeEvent>>,
) -> Result<FileReport, OptimizeError> {
    optimize_file_with_codec(&RustCodec::new(), input, output, params, progress)
}

/// Optimize using a specific codec (allows testing with mock).
pub fn optimize_file_with_codec(
    codec: &impl ImageCodec,
    input: &Path,
    output: &Path,
    params: &EncodeParams,
    progress: Option<Sender<OptimizeEvent>>,
) -> Result<FileReport, OptimizeError> {
    let start = Instant::now();
    let mut gltf = Gltf::load(input)?;
    check_output(input, output, &gltf)?;

    let count = gltf.document.images.len();
    send(
        &progress,
        OptimizeEvent::FileStarted {
            path: input.to_path_buf(),
            image_count: count,
        },
    );

    let mut images = Vec::with_capacity(count);
    for index in 0..count {
        send(
            &progress,
            OptimizeEvent::ImageStarted {
                index,
                count,
                uri: gltf.document.images[index].uri.clone(),
            },
        );
        let report = optimize_image(&mut gltf, index, codec, params)?;
        send(
            &progress,
            OptimizeEvent::ImageOptimized {
                index,
                original_size: report.original_size,
                compressed_size: report.compressed_size,
                elapsed: report.elapsed,
            },
        );
        images.push(report);
    }

    // Replacements live in memory until export, so the input is still
    // intact on disk.
    let original_size = container_size(input, &gltf.resources)?;

    send(
        &progress,
        OptimizeEvent::Writing {
            path: output.to_path_buf(),
        },
    );
    gltf.export(output)?;
    let new_size = container_size(output, &gltf.resources)?;

    let report = FileReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        images,
        original_size,
        new_size,
        elapsed: start.elapsed(),
    };
    send(
        &progress,
        OptimizeEvent::FileFinished {
            input: report.input.clone(),
            output: report.output.clone(),
            original_size: report.original_size,
            new_size: report.new_size,
            elapsed: report.elapsed,
        },
    );
    Ok(report)
}

/// Re-encode image `index` in place and write the result back into the
/// model: spliced into its buffer view, or swapped into its URI resource.
pub fn optimize_image(
    gltf: &mut Gltf,
    index: usize,
    codec: &impl ImageCodec,
    params: &EncodeParams,
) -> Result<ImageReport, OptimizeError> {
    let start = Instant::now();
    let image = gltf
        .document
        .images
        .get(index)
        .ok_or(OptimizeError::InvalidImage(index))?;
    let kind = ImageKind::resolve(image.mime_type.as_deref(), image.uri.as_deref())
        .map_err(|source| OptimizeError::UnsupportedFormat { index, source })?;
    let mime_type = image.mime_type.clone();
    let source = match image.source() {
        Some(ImageSource::Uri(uri)) => Source::Uri(uri.to_string()),
        Some(ImageSource::BufferView(view)) => Source::View(view),
        None => return Err(OptimizeError::MissingSource(index)),
    };

    let (original_size, compressed) = {
        let data = match &source {
            Source::View(view) => gltf.buffer_view_data(*view),
            Source::Uri(uri) => match gltf.resource_index(uri) {
                Ok(resource) => gltf.load_resource(resource),
                Err(e) => Err(e),
            },
        }
        .map_err(|source| OptimizeError::ResourceLoad { index, source })?;
        let compressed = codec
            .recompress(data, kind, params)
            .map_err(|source| OptimizeError::Codec { index, source })?;
        (data.len(), compressed)
    };
    let compressed_size = compressed.len();

    let written = match &source {
        Source::View(view) => splice_buffer_region(gltf, *view, &compressed).map(|_| ()),
        Source::Uri(uri) => {
            replace_resource(gltf, uri, compressed, mime_type.as_deref()).map(|_| ())
        }
    };
    written.map_err(|source| OptimizeError::Splice { index, source })?;

    Ok(ImageReport {
        index,
        kind,
        uri: source.uri().map(str::to_string),
        original_size,
        compressed_size,
        elapsed: start.elapsed(),
    })
}

enum Source {
    Uri(String),
    View(usize),
}

impl Source {
    fn uri(&self) -> Option<&str> {
        match self {
            Source::Uri(uri) => Some(uri),
            Source::View(_) => None,
        }
    }
}

/// Reject outputs that would clobber the input container or the external
/// files it reads from.
fn check_output(input: &Path, output: &Path, gltf: &Gltf) -> Result<(), OptimizeError> {
    gltf.check_export_paths()?;
    if same_path(input, output) {
        return Err(OptimizeError::WouldOverwriteInput(input.to_path_buf()));
    }
    if same_path(parent_dir(input), parent_dir(output)) {
        let external = gltf.resources.iter().find_map(|r| match r {
            Resource::File { path, .. } => Some(path),
            _ => None,
        });
        if let Some(path) = external {
            return Err(OptimizeError::WouldOverwriteInput(
                parent_dir(input).join(path),
            ));
        }
    }
    Ok(())
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Create `dir`, removing any previous contents first when `clean` is set.
///
/// Cleaning is refused when `dir` is, or encloses, the directory of any of
/// `inputs`, since the inputs and their external files live there.
pub fn prepare_output_dir(
    dir: &Path,
    clean: bool,
    inputs: &[PathBuf],
) -> Result<(), OptimizeError> {
    if clean && dir.exists() {
        let root = std::fs::canonicalize(dir)?;
        for input in inputs {
            let input_dir = parent_dir(input);
            let input_dir =
                std::fs::canonicalize(input_dir).unwrap_or_else(|_| input_dir.to_path_buf());
            if input_dir.starts_with(&root) {
                return Err(OptimizeError::WouldDeleteInput {
                    dir: dir.to_path_buf(),
                    input: input.clone(),
                });
            }
        }
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}
