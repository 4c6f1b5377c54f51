//! A loaded glTF scene: document plus resource arena.
//!
//! Buffers, buffer views, images and resources are all addressed by index.
//! The resource list is built once at load time and only ever mutated by
//! swapping an element in place, so indices held by callers stay valid for
//! the whole run.

use super::document::Document;
use super::glb::{self, Glb};
use super::resource::Resource;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid GLB: {0}")]
    InvalidGlb(String),
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
    #[error("Failed to load resource \"{resource}\": {source}")]
    ResourceLoad {
        resource: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Remote resource \"{0}\" cannot be loaded")]
    RemoteResource(String),
    #[error("Missing resource: {0}")]
    MissingResource(String),
    #[error("Buffer view {0} does not exist")]
    InvalidBufferView(usize),
    #[error("Buffer {buffer} referenced by buffer view {view} does not exist")]
    InvalidBuffer { view: usize, buffer: usize },
    #[error("Buffer view {view} ends at byte {end} but its buffer holds {len} bytes")]
    ViewOutOfBounds { view: usize, end: u64, len: usize },
    #[error("File resource \"{0}\" points outside the container's directory")]
    UnsafePath(String),
}

/// On-disk container flavour. Export always writes the flavour that was
/// loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// `.gltf`: a JSON document with external or data-URI resources.
    Json,
    /// `.glb`: binary container with an embedded `BIN` chunk.
    Glb,
}

#[derive(Debug, Clone)]
pub struct Gltf {
    pub document: Document,
    pub resources: Vec<Resource>,
    kind: ContainerKind,
    base_dir: PathBuf,
}

impl Gltf {
    /// Load a `.gltf` or `.glb` file. External files are resolved relative
    /// to its directory but not read yet.
    pub fn load(path: &Path) -> Result<Self, ContainerError> {
        let data = std::fs::read(path)?;
        Self::from_slice(&data, parent_dir(path))
    }

    /// Parse container bytes; GLB is detected by its magic.
    pub fn from_slice(data: &[u8], base_dir: &Path) -> Result<Self, ContainerError> {
        let (kind, document, bin): (_, Document, _) = if glb::is_glb(data) {
            let Glb { json, bin } = Glb::from_slice(data)?;
            let document: Document = serde_json::from_slice(glb::trim_json_padding(&json))?;
            (ContainerKind::Glb, document, bin)
        } else {
            (ContainerKind::Json, serde_json::from_slice(data)?, None)
        };
        Self::from_parts(kind, document, bin, base_dir)
    }

    fn from_parts(
        kind: ContainerKind,
        document: Document,
        bin: Option<Vec<u8>>,
        base_dir: &Path,
    ) -> Result<Self, ContainerError> {
        let mut resources = Vec::new();
        if let Some(data) = bin {
            resources.push(Resource::Glb { data });
        }

        let uris = document
            .buffers
            .iter()
            .filter_map(|b| b.uri.as_deref())
            .chain(document.images.iter().filter_map(|i| i.uri.as_deref()));
        for uri in uris {
            if !resources.iter().any(|r| r.uri() == Some(uri)) {
                resources.push(Resource::from_uri(uri)?);
            }
        }

        Ok(Self {
            document,
            resources,
            kind,
            base_dir: base_dir.to_path_buf(),
        })
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Directory external resources are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn glb_resource_index(&self) -> Option<usize> {
        self.resources
            .iter()
            .position(|r| matches!(r, Resource::Glb { .. }))
    }

    pub fn resource_index(&self, uri: &str) -> Result<usize, ContainerError> {
        self.resources
            .iter()
            .position(|r| r.uri() == Some(uri))
            .ok_or_else(|| ContainerError::MissingResource(uri.to_string()))
    }

    pub fn get_resource(&self, uri: &str) -> Option<&Resource> {
        self.resource_index(uri).ok().map(|i| &self.resources[i])
    }

    /// Index of the resource backing `buffer`: the GLB chunk when the buffer
    /// has no URI, the named resource otherwise.
    pub fn buffer_resource_index(&self, buffer: usize) -> Result<usize, ContainerError> {
        let entry = self.document.buffers.get(buffer).ok_or_else(|| {
            ContainerError::MissingResource(format!("buffer {buffer} does not exist"))
        })?;
        match &entry.uri {
            Some(uri) => self.resource_index(uri),
            None => self.glb_resource_index().ok_or_else(|| {
                ContainerError::MissingResource(format!(
                    "buffer {buffer} has no URI and the container has no binary chunk"
                ))
            }),
        }
    }

    /// Load (once) and return the bytes of a resource.
    pub fn load_resource(&mut self, index: usize) -> Result<&[u8], ContainerError> {
        let base_dir = &self.base_dir;
        let resource = self
            .resources
            .get_mut(index)
            .ok_or_else(|| ContainerError::MissingResource(format!("resource {index}")))?;
        resource.load(base_dir)
    }

    /// Bytes covered by a buffer view, read from the current model state.
    pub fn buffer_view_data(&mut self, view: usize) -> Result<&[u8], ContainerError> {
        let entry = self
            .document
            .buffer_views
            .get(view)
            .ok_or(ContainerError::InvalidBufferView(view))?;
        let buffer = entry.buffer;
        if buffer >= self.document.buffers.len() {
            return Err(ContainerError::InvalidBuffer { view, buffer });
        }
        let range = entry.range();
        let resource = self.buffer_resource_index(buffer)?;
        let data = self.load_resource(resource)?;
        if range.end > data.len() as u64 {
            return Err(ContainerError::ViewOutOfBounds {
                view,
                end: range.end,
                len: data.len(),
            });
        }
        Ok(&data[range.start as usize..range.end as usize])
    }

    /// Load every file resource that is not in memory yet.
    pub fn load_all(&mut self) -> Result<(), ContainerError> {
        for index in 0..self.resources.len() {
            if self.resources[index].is_rewritable() {
                self.load_resource(index)?;
            }
        }
        Ok(())
    }

    /// Serialize the JSON document, re-encoding base64 resources into the
    /// URIs that reference them.
    pub fn to_json(&self) -> Result<Vec<u8>, ContainerError> {
        let mut document = self.document.clone();
        for resource in &self.resources {
            let (Some(uri), Some(data_uri)) = (resource.uri(), resource.to_data_uri()) else {
                continue;
            };
            let buffer_uris = document.buffers.iter_mut().map(|b| &mut b.uri);
            let image_uris = document.images.iter_mut().map(|i| &mut i.uri);
            for slot in buffer_uris.chain(image_uris) {
                if slot.as_deref() == Some(uri) {
                    *slot = Some(data_uri.clone());
                }
            }
        }
        Ok(serde_json::to_vec(&document)?)
    }

    /// Fail if any file resource would be written outside the output
    /// directory on export.
    pub fn check_export_paths(&self) -> Result<(), ContainerError> {
        match self.resources.iter().find(|r| r.escapes_base_dir()) {
            Some(resource) => Err(ContainerError::UnsafePath(
                resource.uri().unwrap_or_default().to_string(),
            )),
            None => Ok(()),
        }
    }

    /// Write the container to `path` and every file resource next to it.
    ///
    /// Unloaded file resources are read from the source directory first, so
    /// exporting into the source directory is safe. The container itself is
    /// written to a temporary file and renamed into place. Nothing is written
    /// when a file resource path is absolute or climbs out with `..`.
    pub fn export(&mut self, path: &Path) -> Result<(), ContainerError> {
        self.check_export_paths()?;
        self.load_all()?;

        let bytes = match self.kind {
            ContainerKind::Json => self.to_json()?,
            ContainerKind::Glb => {
                let bin = self
                    .glb_resource_index()
                    .and_then(|i| self.resources[i].data())
                    .map(<[u8]>::to_vec);
                Glb {
                    json: self.to_json()?,
                    bin,
                }
                .to_vec()?
            }
        };

        let out_dir = parent_dir(path);
        for resource in &self.resources {
            if let Resource::File {
                path: relative,
                data: Some(data),
                ..
            } = resource
            {
                let target = out_dir.join(relative);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&target, data)?;
            }
        }

        write_atomically(path, &bytes)?;
        Ok(())
    }
}

/// Directory containing `path`; `.` for bare filenames.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn glb_bytes(doc: serde_json::Value, bin: Vec<u8>) -> Vec<u8> {
        Glb {
            json: serde_json::to_vec(&doc).unwrap(),
            bin: Some(bin),
        }
        .to_vec()
        .unwrap()
    }

    fn three_view_doc() -> serde_json::Value {
        json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 12}],
            "bufferViews": [
                {"buffer": 0, "byteLength": 4},
                {"buffer": 0, "byteOffset": 4, "byteLength": 8}
            ]
        })
    }

    #[test]
    fn load_glb_creates_glb_resource() {
        let bytes = glb_bytes(three_view_doc(), (0u8..12).collect());
        let gltf = Gltf::from_slice(&bytes, Path::new(".")).unwrap();
        assert_eq!(gltf.kind(), ContainerKind::Glb);
        assert_eq!(gltf.resources.len(), 1);
        assert_eq!(gltf.glb_resource_index(), Some(0));
        assert_eq!(gltf.buffer_resource_index(0).unwrap(), 0);
    }

    #[test]
    fn buffer_view_data_slices_the_buffer() {
        let bytes = glb_bytes(three_view_doc(), (0u8..12).collect());
        let mut gltf = Gltf::from_slice(&bytes, Path::new(".")).unwrap();
        assert_eq!(gltf.buffer_view_data(0).unwrap(), &[0, 1, 2, 3]);
        assert_eq!(gltf.buffer_view_data(1).unwrap(), &[4, 5, 6, 7, 8, 9, 10, 11]);
        assert!(matches!(
            gltf.buffer_view_data(2),
            Err(ContainerError::InvalidBufferView(2))
        ));
    }

    #[test]
    fn buffer_view_past_end_is_rejected() {
        let doc = json!({
            "buffers": [{"byteLength": 4}],
            "bufferViews": [{"buffer": 0, "byteOffset": 2, "byteLength": 8}]
        });
        let bytes = glb_bytes(doc, vec![0; 4]);
        let mut gltf = Gltf::from_slice(&bytes, Path::new(".")).unwrap();
        assert!(matches!(
            gltf.buffer_view_data(0),
            Err(ContainerError::ViewOutOfBounds { end: 10, len: 4, .. })
        ));
    }

    #[test]
    fn json_buffer_without_uri_has_no_backing() {
        let doc = serde_json::to_vec(&three_view_doc()).unwrap();
        let mut gltf = Gltf::from_slice(&doc, Path::new(".")).unwrap();
        assert_eq!(gltf.kind(), ContainerKind::Json);
        assert!(matches!(
            gltf.buffer_view_data(0),
            Err(ContainerError::MissingResource(_))
        ));
    }

    #[test]
    fn resources_are_deduplicated_by_uri() {
        let doc = json!({
            "buffers": [{"uri": "scene.bin", "byteLength": 4}],
            "images": [
                {"uri": "tex.png"},
                {"uri": "tex.png"},
                {"uri": "data:image/png;base64,AAAA"}
            ]
        });
        let gltf = Gltf::from_slice(&serde_json::to_vec(&doc).unwrap(), Path::new(".")).unwrap();
        let uris: Vec<_> = gltf.resources.iter().map(|r| r.uri().unwrap()).collect();
        assert_eq!(
            uris,
            vec!["scene.bin", "tex.png", "data:image/png;base64,AAAA"]
        );
        assert!(gltf.get_resource("tex.png").is_some());
        assert!(gltf.get_resource("other.png").is_none());
    }

    #[test]
    fn file_resources_resolve_against_container_dir() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("scene.bin"), [1, 2, 3, 4]).unwrap();
        let doc = json!({
            "buffers": [{"uri": "scene.bin", "byteLength": 4}],
            "bufferViews": [{"buffer": 0, "byteOffset": 1, "byteLength": 2}]
        });
        let path = tmp.path().join("scene.gltf");
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let mut gltf = Gltf::load(&path).unwrap();
        assert_eq!(gltf.base_dir(), tmp.path());
        assert_eq!(gltf.buffer_view_data(0).unwrap(), &[2, 3]);
    }

    #[test]
    fn export_glb_roundtrips_document_and_bin() {
        let tmp = TempDir::new().unwrap();
        let bytes = glb_bytes(three_view_doc(), (0u8..12).collect());
        let mut gltf = Gltf::from_slice(&bytes, tmp.path()).unwrap();

        let out = tmp.path().join("out.glb");
        gltf.export(&out).unwrap();

        let reloaded = Gltf::load(&out).unwrap();
        assert_eq!(reloaded.kind(), ContainerKind::Glb);
        assert_eq!(reloaded.document, gltf.document);
        assert_eq!(
            reloaded.resources[0].data().unwrap(),
            (0u8..12).collect::<Vec<_>>().as_slice()
        );
    }

    #[test]
    fn export_json_writes_file_resources_and_data_uris() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::create_dir_all(src.path().join("tex")).unwrap();
        std::fs::write(src.path().join("tex/a.png"), b"png!").unwrap();
        let doc = json!({
            "asset": {"version": "2.0"},
            "buffers": [{"uri": "data:application/octet-stream;base64,AQIDBA==", "byteLength": 4}],
            "images": [{"uri": "tex/a.png"}]
        });
        let path = src.path().join("scene.gltf");
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let mut gltf = Gltf::load(&path).unwrap();
        let index = gltf
            .resource_index("data:application/octet-stream;base64,AQIDBA==")
            .unwrap();
        gltf.resources[index] = gltf.resources[index]
            .with_data(vec![9, 9, 9, 9], None)
            .unwrap();

        let out = dst.path().join("scene.gltf");
        gltf.export(&out).unwrap();

        assert_eq!(std::fs::read(dst.path().join("tex/a.png")).unwrap(), b"png!");
        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(
            written["buffers"][0]["uri"],
            "data:application/octet-stream;base64,CQkJCQ=="
        );
        assert_eq!(written["images"][0]["uri"], "tex/a.png");
        assert_eq!(written["asset"]["version"], "2.0");
        // The in-memory model keeps the original key
        assert!(gltf.resource_index("data:application/octet-stream;base64,AQIDBA==").is_ok());
    }

    #[test]
    fn export_fails_on_missing_file_resource() {
        let tmp = TempDir::new().unwrap();
        let doc = json!({"images": [{"uri": "gone.png"}]});
        let mut gltf =
            Gltf::from_slice(&serde_json::to_vec(&doc).unwrap(), tmp.path()).unwrap();
        let out = tmp.path().join("out").join("scene.gltf");
        assert!(matches!(
            gltf.export(&out),
            Err(ContainerError::ResourceLoad { .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn export_refuses_paths_outside_output_dir() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let shared = tmp.path().join("shared");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::write(shared.join("tex.jpg"), b"original").unwrap();
        let absolute = shared.join("abs.jpg");
        std::fs::write(&absolute, b"original").unwrap();

        for uri in ["../shared/tex.jpg".to_string(), absolute.display().to_string()] {
            let doc = json!({"images": [{"uri": uri}]});
            let path = src.join("scene.gltf");
            std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
            let mut gltf = Gltf::load(&path).unwrap();
            gltf.load_all().unwrap();
            let index = gltf.resource_index(&uri).unwrap();
            gltf.resources[index] = gltf.resources[index].with_data(vec![0; 4], None).unwrap();

            let out = tmp.path().join("out/scene.gltf");
            assert!(matches!(
                gltf.export(&out),
                Err(ContainerError::UnsafePath(u)) if u == uri
            ));
            assert!(!out.exists());
        }
        assert_eq!(std::fs::read(shared.join("tex.jpg")).unwrap(), b"original");
        assert_eq!(std::fs::read(&absolute).unwrap(), b"original");
    }

    #[test]
    fn glb_with_zero_padded_json_chunk_loads() {
        let mut json = serde_json::to_vec(&three_view_doc()).unwrap();
        json.resize(json.len().div_ceil(4) * 4 + 4, 0);
        let bytes = Glb {
            json,
            bin: Some((0u8..12).collect()),
        }
        .to_vec()
        .unwrap();
        let mut gltf = Gltf::from_slice(&bytes, Path::new(".")).unwrap();
        assert_eq!(gltf.document.buffer_views.len(), 2);
        assert_eq!(gltf.buffer_view_data(0).unwrap(), &[0, 1, 2, 3]);
    }

    #[test]
    fn parent_dir_of_bare_filename_is_current_dir() {
        assert_eq!(parent_dir(Path::new("scene.glb")), Path::new("."));
        assert_eq!(parent_dir(Path::new("a/scene.glb")), Path::new("a"));
    }
}
