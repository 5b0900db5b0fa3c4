use miniz_oxide::inflate::TINFLStatus;
use thiserror::Error;

use crate::png::{ChunkName, PngColorType};

/// An error from the `pngsmith` crate.
///
/// Every variant aborts the load or save that produced it. Nothing is
/// retried and no partial image is handed back.
#[derive(Debug, Error)]
pub enum PngError {
  /// The first 8 bytes are not the PNG signature.
  #[error("file header does not match the PNG signature")]
  BadSignature,

  /// A chunk declared more bytes than the stream has left.
  #[error("stream truncated: chunk needs {needed} more bytes but only {remaining} remain")]
  TruncatedStream { needed: usize, remaining: usize },

  /// The CRC stored after a chunk doesn't match its name and data.
  #[error("bad checksum on {name} chunk (declared {declared:#010x}, computed {actual:#010x})")]
  ChecksumMismatch { name: ChunkName, declared: u32, actual: u32 },

  /// An unknown chunk without the ancillary bit.
  #[error("unknown critical chunk {0} encountered")]
  UnsupportedCriticalChunk(ChunkName),

  /// Adam7 (or any other non-zero interlace method).
  #[error("interlace method {0} is not supported")]
  UnsupportedInterlace(u8),

  /// The defiltered byte count doesn't fit the header's geometry.
  #[error("pixel data is {actual} bytes but the image geometry needs {expected}")]
  GeometryMismatch { expected: usize, actual: usize },

  /// A scanline started with a filter type byte outside `0..=4`.
  #[error("unknown scanline filter type {0}")]
  UnknownFilterType(u8),

  /// The compression collaborator failed.
  #[error(transparent)]
  Compression(#[from] CompressionError),

  /// The stream has no chunks, or the first chunk isn't `IHDR`.
  #[error("the first chunk is not an IHDR chunk")]
  MissingHeader,

  /// The `IHDR` payload is malformed.
  #[error("invalid IHDR chunk: {0}")]
  InvalidHeader(&'static str),

  /// A bit depth this crate doesn't decode for the given color type.
  #[error("bit depth {bit_depth} is not supported for color type {color_type:?}")]
  UnsupportedBitDepth { color_type: PngColorType, bit_depth: u8 },

  /// An indexed-color image without a `PLTE` chunk.
  #[error("indexed-color image has no PLTE chunk")]
  MissingPalette,

  /// A `PLTE` chunk of the wrong length, or a pixel index past its end.
  #[error("invalid palette: {0}")]
  InvalidPalette(&'static str),

  /// Opening, reading, or writing a file failed.
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Errors reported by a [`Compressor`](crate::png::Compressor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompressionError {
  /// The zlib stream is corrupted or truncated.
  #[error("could not inflate image data: {0:?}")]
  Inflate(TINFLStatus),

  /// Compression levels run from 0 to 10.
  #[error("compression level {0} is out of range (0..=10)")]
  InvalidLevel(u8),
}

/// Shorthand for results carrying a [`PngError`].
pub type PngResult<T> = Result<T, PngError>;
