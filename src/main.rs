use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures::executor::block_on;
use image_compressor_rust::reencode::CanvasReencoder;
use image_compressor_rust::routine::JpegSearchRoutine;
use image_compressor_rust::{
    download_name, format_megabytes, Compressor, CompressorOptions, FallbackPolicy,
    QualityFraction, SourceImage,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Keep the smaller of the primary and fallback outputs
    KeepSmaller,
    /// Always report the fallback output once it has run
    AlwaysReplace,
}

impl From<Policy> for FallbackPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::KeepSmaller => FallbackPolicy::KeepSmaller,
            Policy::AlwaysReplace => FallbackPolicy::AlwaysReplace,
        }
    }
}

/// Simple image compressor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image file
    input: PathBuf,

    /// Output file (defaults to compressed_<name> next to the input)
    output: Option<PathBuf>,

    /// Quality in percent; 100 keeps the original
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Max image dimension (longer side)
    #[arg(long, default_value_t = 2048)]
    max_dim: u32,

    /// How to choose between the primary and fallback outputs
    #[arg(long, value_enum, default_value_t = Policy::KeepSmaller)]
    policy: Policy,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let source = SourceImage::from_path(&args.input)?;
    println!(
        "Loaded {} ({}, {})",
        source.name(),
        source.mime(),
        format_megabytes(source.size())
    );

    let options = CompressorOptions {
        max_dimension: args.max_dim,
        policy: args.policy.into(),
        ..CompressorOptions::default()
    };
    let compressor = Compressor::new(JpegSearchRoutine, CanvasReencoder, options);
    let quality = QualityFraction::from_percent(args.quality);

    let start = Instant::now();
    let result = block_on(compressor.compress(&source, quality))
        .with_context(|| format!("Failed to compress {}", args.input.display()))?;
    println!("Compressed in {:.2?} ({} stage)", start.elapsed(), result.stage());

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_file_name(download_name(source.name())));
    std::fs::write(&output, result.bytes())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Original size: {}", format_megabytes(source.size()));
    println!("New size:      {}", format_megabytes(result.size()));
    println!("Saved to {}", output.display());

    Ok(())
}
