//! `pngsmith` - load a PNG, optionally transform it, and save it again.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use pngsmith::png::{DecodeReport, EncodeOptions, EncodeReport, PngImage, Zlib};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pngsmith")]
#[command(author, version, about, long_about = None)]
struct Args {
  /// The PNG file to load.
  input: PathBuf,

  /// Invert the color samples (alpha is left alone).
  #[arg(short, long, default_value_t = false)]
  invert: bool,

  /// Convert to greyscale if every pixel is already grey.
  #[arg(short, long, default_value_t = false)]
  simplify: bool,

  /// Where to write the result.
  #[arg(short, long, default_value = "out.png")]
  output: PathBuf,

  /// Compression level, 0 (none) to 10 (slowest).
  #[arg(long, default_value_t = EncodeOptions::default().compression_level,
    value_parser = clap::value_parser!(u8).range(0..=10))]
  level: u8,

  /// Print the image info and stop, without writing anything.
  #[arg(long, default_value_t = false)]
  info: bool,

  /// Log every decode and encode stage.
  #[arg(short, long, default_value_t = false)]
  verbose: bool,
}

fn main() -> ExitCode {
  let args = match Args::try_parse() {
    Ok(args) => args,
    Err(e) => {
      let _ = e.print();
      return ExitCode::from(parse_error_code(&e));
    }
  };
  init_tracing(args.verbose);
  match run(&args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("error: {e:#}");
      ExitCode::FAILURE
    }
  }
}

/// `--help` and `--version` come through as errors too, but they aren't failures.
fn parse_error_code(e: &clap::Error) -> u8 {
  u8::from(e.use_stderr())
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
  let filter =
    EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(args: &Args) -> Result<()> {
  let (mut image, report) = PngImage::load(&args.input)
    .with_context(|| format!("failed to load {}", args.input.display()))?;
  println!("{}\n", image.header());
  print_decode_report(&report);
  for chunk in image.ancillary_chunks() {
    info!(name = %chunk.name(), len = chunk.data().len(), "kept ancillary chunk (not written back)");
  }
  if args.info {
    return Ok(());
  }

  if args.invert {
    image.invert();
    info!("colors inverted");
  }
  if args.simplify {
    if image.simplify() {
      println!("RGB values in each pixel were identical. Image has been converted to grayscale.\n");
    } else {
      info!("image left as it was, it has color or is already greyscale");
    }
  }

  let options = EncodeOptions { compression_level: args.level };
  let report = image
    .save_with(&args.output, options, &Zlib)
    .with_context(|| format!("failed to save {}", args.output.display()))?;
  print_encode_report(&report);
  println!("Saved {}", args.output.display());
  Ok(())
}

fn print_decode_report(report: &DecodeReport) {
  println!("File size: {} bytes, {} chunks", report.file_len, report.chunk_count);
  for name in &report.dropped {
    println!("Discarded chunk: {name}");
  }
  println!(
    "Image data: {} IDAT chunk(s), {} compressed, {} inflated (compression factor {:.2})",
    report.idat_count,
    report.compressed_len,
    report.inflated_len,
    report.compression_factor()
  );
  println!("Filter types used: {}\n", report.filters);
}

fn print_encode_report(report: &EncodeReport) {
  println!(
    "Compressed {} filtered bytes to {} at level {} (compression factor {:.2})",
    report.filtered_len,
    report.compressed_len,
    report.compression_level,
    report.compression_factor()
  );
  println!("Filter types used: {}", report.filters);
  println!("File size: {} bytes", report.file_len);
}
