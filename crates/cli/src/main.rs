//! CLI tool for converting PowerPoint decks to PDF.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::Rgb;
use deck_render::RenderOptions;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Render .pptx files to PDF, one page per slide.
#[derive(Parser, Debug)]
#[command(name = "pptx2pdf")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Supersampling scale over 96 DPI
    #[arg(short, long, default_value = "2.0")]
    scale: f32,

    /// Font file used for all text instead of a system font
    #[arg(short, long)]
    font: Option<PathBuf>,

    /// Extra directory to search for fonts (repeatable)
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Page background as a hex color
    #[arg(long, default_value = "FFFFFF")]
    background: String,

    /// Print progress events to stdout as JSON lines
    #[arg(short, long)]
    progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let options = build_options(&args)?;
    let mut failures = 0;

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Converting: {}", input_path.display());
        }

        match convert_file(input_path, &args, &options) {
            Ok(output_path) => {
                if args.verbose {
                    eprintln!("Written to: {}", output_path.display());
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error converting {}: {:#}", input_path.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} file(s) failed", failures, args.input.len());
    }
    Ok(())
}

fn build_options(args: &Args) -> Result<RenderOptions> {
    if !(args.scale.is_finite() && args.scale > 0.0) {
        anyhow::bail!("Scale must be a positive number, got {}", args.scale);
    }
    let background = Rgb::from_hex(&args.background)
        .with_context(|| format!("Invalid background color: {}", args.background))?;

    let mut options = RenderOptions::new()
        .with_scale(args.scale)
        .with_background(background);
    if let Some(font) = &args.font {
        options = options.with_font_path(font);
    }
    for dir in &args.font_dirs {
        options = options.with_font_dir(dir);
    }
    Ok(options)
}

/// Convert a single deck and write the PDF next to it or into `--output`.
fn convert_file(input_path: &Path, args: &Args, options: &RenderOptions) -> Result<PathBuf> {
    let data = std::fs::read(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    let document = deck_render::convert(&data, options, |event| {
        if args.progress {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("Could not serialize progress event: {}", e),
            }
        }
    })?;

    if args.verbose {
        eprintln!(
            "  Rendered {} pages at {}x{} pt",
            document.page_count, document.page_width_pt, document.page_height_pt
        );
    }

    let output_path = get_output_path(input_path, args.output.as_ref())?;
    write_output(&output_path, &document.pdf)?;
    Ok(output_path)
}

/// Determine the output path for a converted file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.pdf", stem);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
