//! File size accounting.
//!
//! The size of a glTF scene is the size of its container file plus every
//! external file it references. Embedded (GLB chunk) and base64 resources
//! are already inside the container and remote URIs are not counted.

use crate::container::{Resource, parent_dir};
use std::collections::HashSet;
use std::path::Path;

/// Total on-disk size of the container at `path` and its external files.
///
/// File resources are resolved relative to `path`'s directory; a file
/// referenced by several URIs is counted once.
pub fn container_size(path: &Path, resources: &[Resource]) -> std::io::Result<u64> {
    let base_dir = parent_dir(path);
    let mut total = std::fs::metadata(path)?.len();
    let mut seen = HashSet::new();
    for resource in resources {
        if let Resource::File { path: relative, .. } = resource {
            if seen.insert(relative) {
                total += std::fs::metadata(base_dir.join(relative))?.len();
            }
        }
    }
    Ok(total)
}

/// Human-readable size with binary prefixes and two decimals.
///
/// ```text
/// 512        → 512.00 B
/// 1536       → 1.50 KiB
/// 5242880    → 5.00 MiB
/// ```
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
