//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Optimize
//!
//! ```text
//! Optimizing 2 image(s) in GLTF file: "models/scene.glb"
//!   Optimizing image 1 of 2 (URI: None)
//!     Original size: 1.20 MiB
//!     Compressed size: 860.12 KiB
//!     Reduction: 30.0%
//!     Elapsed: 0:00:00.412000
//!   Optimizing image 2 of 2 (URI: textures/normal.png)
//!     ...
//!   Generating output file: "optimized/scene.glb"
//!   Finished optimizing "models/scene.glb" to "optimized/scene.glb"
//!     Original size (including external file resources): 2.40 MiB
//!     New size (including external file resources): 1.75 MiB
//!     Reduction: 27.1%
//!   Elapsed: 0:00:00.975310
//! ```
//!
//! ## Size
//!
//! ```text
//! models/scene.gltf: 3.42 KiB (including external file resources)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::optimize::OptimizeEvent;
use crate::size::format_size;
use std::path::Path;
use std::time::Duration;

/// Return indentation string: 2 spaces per depth level.
fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Percentage saved going from `original` to `new`, one decimal.
///
/// Growth is reported as a negative reduction; an empty original as 0.0%.
pub fn format_reduction(original: u64, new: u64) -> String {
    if original == 0 {
        return "0.0%".to_string();
    }
    let reduction = (1.0 - new as f64 / original as f64) * 100.0;
    format!("{:.1}%", reduction)
}

/// Elapsed time as `H:MM:SS`, with microseconds when non-zero.
///
/// ```text
/// 0:00:00.412000
/// 1:02:03
/// ```
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let micros = elapsed.subsec_micros();
    let base = format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
    if micros == 0 {
        base
    } else {
        format!("{base}.{micros:06}")
    }
}

// ============================================================================
// Optimize output
// ============================================================================

/// Format a single optimize progress event as display lines.
pub fn format_optimize_event(event: &OptimizeEvent) -> Vec<String> {
    match event {
        OptimizeEvent::FileStarted { path, image_count } => vec![format!(
            "Optimizing {} image(s) in GLTF file: \"{}\"",
            image_count,
            path.display()
        )],
        OptimizeEvent::ImageStarted { index, count, uri } => vec![format!(
            "{}Optimizing image {} of {} (URI: {})",
            indent(1),
            index + 1,
            count,
            uri.as_deref().unwrap_or("None")
        )],
        OptimizeEvent::ImageOptimized {
            original_size,
            compressed_size,
            elapsed,
            ..
        } => {
            let (original, compressed) = (*original_size as u64, *compressed_size as u64);
            vec![
                format!("{}Original size: {}", indent(2), format_size(original)),
                format!("{}Compressed size: {}", indent(2), format_size(compressed)),
                format!(
                    "{}Reduction: {}",
                    indent(2),
                    format_reduction(original, compressed)
                ),
                format!("{}Elapsed: {}", indent(2), format_elapsed(*elapsed)),
            ]
        }
        OptimizeEvent::Writing { path } => vec![format!(
            "{}Generating output file: \"{}\"",
            indent(1),
            path.display()
        )],
        OptimizeEvent::FileFinished {
            input,
            output,
            original_size,
            new_size,
            elapsed,
        } => vec![
            format!(
                "{}Finished optimizing \"{}\" to \"{}\"",
                indent(1),
                input.display(),
                output.display()
            ),
            format!(
                "{}Original size (including external file resources): {}",
                indent(2),
                format_size(*original_size)
            ),
            format!(
                "{}New size (including external file resources): {}",
                indent(2),
                format_size(*new_size)
            ),
            format!(
                "{}Reduction: {}",
                indent(2),
                format_reduction(*original_size, *new_size)
            ),
            format!("{}Elapsed: {}", indent(1), format_elapsed(*elapsed)),
        ],
    }
}

/// Print an optimize progress event to stdout.
pub fn print_optimize_event(event: &OptimizeEvent) {
    for line in format_optimize_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Size output
// ============================================================================

/// Format the total size of one container.
pub fn format_size_output(path: &Path, size: u64) -> Vec<String> {
    vec![format!(
        "{}: {} (including external file resources)",
        path.display(),
        format_size(size)
    )]
}

/// Print the total size of one container to stdout.
pub fn print_size_output(path: &Path, size: u64) {
    for line in format_size_output(path, size) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "    ");
    }

    #[test]
    fn reduction_one_decimal() {
        assert_eq!(format_reduction(1000, 700), "30.0%");
        assert_eq!(format_reduction(3, 2), "33.3%");
        assert_eq!(format_reduction(100, 100), "0.0%");
    }

    #[test]
    fn reduction_of_growth_is_negative() {
        assert_eq!(format_reduction(100, 125), "-25.0%");
    }

    #[test]
    fn reduction_of_empty_original_is_zero() {
        assert_eq!(format_reduction(0, 0), "0.0%");
        assert_eq!(format_reduction(0, 10), "0.0%");
    }

    #[test]
    fn elapsed_with_and_without_micros() {
        assert_eq!(format_elapsed(Duration::from_millis(412)), "0:00:00.412000");
        assert_eq!(format_elapsed(Duration::from_secs(3723)), "1:02:03");
        assert_eq!(format_elapsed(Duration::ZERO), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_micros(61_000_005)), "0:01:01.000005");
    }

    // =========================================================================
    // Optimize event formatting tests
    // =========================================================================

    #[test]
    fn format_file_started() {
        let event = OptimizeEvent::FileStarted {
            path: PathBuf::from("models/scene.glb"),
            image_count: 3,
        };
        assert_eq!(
            format_optimize_event(&event),
            vec!["Optimizing 3 image(s) in GLTF file: \"models/scene.glb\""]
        );
    }

    #[test]
    fn format_image_started_is_one_based() {
        let event = OptimizeEvent::ImageStarted {
            index: 0,
            count: 2,
            uri: None,
        };
        assert_eq!(
            format_optimize_event(&event),
            vec!["  Optimizing image 1 of 2 (URI: None)"]
        );

        let event = OptimizeEvent::ImageStarted {
            index: 1,
            count: 2,
            uri: Some("textures/normal.png".to_string()),
        };
        assert_eq!(
            format_optimize_event(&event),
            vec!["  Optimizing image 2 of 2 (URI: textures/normal.png)"]
        );
    }

    #[test]
    fn format_image_optimized() {
        let event = OptimizeEvent::ImageOptimized {
            index: 0,
            original_size: 2048,
            compressed_size: 1536,
            elapsed: Duration::from_millis(250),
        };
        assert_eq!(
            format_optimize_event(&event),
            vec![
                "    Original size: 2.00 KiB",
                "    Compressed size: 1.50 KiB",
                "    Reduction: 25.0%",
                "    Elapsed: 0:00:00.250000",
            ]
        );
    }

    #[test]
    fn format_writing() {
        let event = OptimizeEvent::Writing {
            path: PathBuf::from("optimized/scene.glb"),
        };
        assert_eq!(
            format_optimize_event(&event),
            vec!["  Generating output file: \"optimized/scene.glb\""]
        );
    }

    #[test]
    fn format_file_finished() {
        let event = OptimizeEvent::FileFinished {
            input: PathBuf::from("scene.gltf"),
            output: PathBuf::from("optimized/scene.gltf"),
            original_size: 4096,
            new_size: 1024,
            elapsed: Duration::from_secs(2),
        };
        let lines = format_optimize_event(&event);
        assert_eq!(
            lines[0],
            "  Finished optimizing \"scene.gltf\" to \"optimized/scene.gltf\""
        );
        assert_eq!(
            lines[1],
            "    Original size (including external file resources): 4.00 KiB"
        );
        assert_eq!(
            lines[2],
            "    New size (including external file resources): 1.00 KiB"
        );
        assert_eq!(lines[3], "    Reduction: 75.0%");
        assert_eq!(lines[4], "  Elapsed: 0:00:02");
    }

    #[test]
    fn format_size_line() {
        assert_eq!(
            format_size_output(Path::new("scene.gltf"), 3500),
            vec!["scene.gltf: 3.42 KiB (including external file resources)"]
        );
    }
}
