use clap::{Parser, Subcommand};
use gltf_slim::{config, container::Gltf, optimize, output, size};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gltf-slim")]
#[command(about = "Shrink glTF/GLB files by re-encoding their images")]
#[command(long_about = "\
Shrink glTF/GLB files by re-encoding their images

PNG images are re-compressed losslessly with maximum effort; JPEG images
are re-encoded at the configured quality (95 by default). Geometry and all
other data are copied unchanged.

Images embedded in a buffer are spliced back in place and every later
buffer view is moved to match. Images referenced by URI are replaced
under the same name: external files are written next to the output,
base64 data URIs are re-encoded into the document.

  gltf-slim optimize scene.glb                 # → optimized/scene.glb
  gltf-slim optimize a.gltf b.glb --out-dir out
  gltf-slim optimize scene.glb --output small.glb
  gltf-slim size scene.gltf                    # includes external files

Run 'gltf-slim gen-config' to generate a documented gltf-slim.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./gltf-slim.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-encode every image in one or more glTF/GLB files
    Optimize(OptimizeArgs),
    /// Print the total size of glTF/GLB files including external resources
    Size {
        /// Files to measure
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a stock gltf-slim.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct OptimizeArgs {
    /// Input .gltf or .glb files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (single input only)
    #[arg(long, conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Output directory (default: output_dir from config)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Optimize(args) => {
            let config = config::load_config(cli.config.as_deref())?;
            let params = config.encode_params();
            let jobs = plan_outputs(&args, &config)?;

            for (input, output_path) in jobs {
                let (tx, rx) = std::sync::mpsc::channel();
                let printer = std::thread::spawn(move || {
                    for event in rx {
                        output::print_optimize_event(&event);
                    }
                });
                let result = optimize::optimize_file(&input, &output_path, &params, Some(tx));
                printer.join().map_err(|_| "progress printer panicked")?;
                result?;
            }
        }
        Command::Size { files } => {
            for file in files {
                let gltf = Gltf::load(&file)?;
                let total = size::container_size(&file, &gltf.resources)?;
                output::print_size_output(&file, total);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Pair every input with its output path, preparing the output directory.
fn plan_outputs(
    args: &OptimizeArgs,
    config: &config::SlimConfig,
) -> Result<Vec<(PathBuf, PathBuf)>, Box<dyn std::error::Error>> {
    if let Some(output_path) = &args.output {
        if args.inputs.len() > 1 {
            return Err("--output can only be used with a single input".into());
        }
        return Ok(vec![(args.inputs[0].clone(), output_path.clone())]);
    }

    let out_dir = args.out_dir.as_deref().unwrap_or(&config.output_dir);

    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let name = file_name(input)?;
        if !seen.insert(name.to_path_buf()) {
            return Err(format!(
                "two inputs named \"{}\" would write to the same output",
                name.display()
            )
            .into());
        }
        jobs.push((input.clone(), out_dir.join(name)));
    }
    optimize::prepare_output_dir(out_dir, config.clean_output_dir, &args.inputs)?;
    Ok(jobs)
}

fn file_name(path: &Path) -> Result<&Path, Box<dyn std::error::Error>> {
    path.file_name()
        .map(Path::new)
        .ok_or_else(|| format!("\"{}\" is not a file path", path.display()).into())
}
