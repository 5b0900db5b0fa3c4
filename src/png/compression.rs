use miniz_oxide::deflate::CompressionLevel;

use crate::CompressionError;

/// Something that can turn filtered scanline bytes into the payload of the
/// `IDAT` chunks, and back again.
///
/// PNG only defines one compression method (zlib-wrapped deflate), but the
/// codec doesn't care which engine does the work. Failures are passed through
/// to the caller unchanged.
pub trait Compressor {
  /// Compresses `data` at the given effort `level`.
  fn compress(&self, data: &[u8], level: u8) -> Result<Vec<u8>, CompressionError>;

  /// Decompresses a complete stream.
  ///
  /// A stream that would inflate past `limit` bytes is an error, and no more
  /// than `limit` bytes are ever produced.
  fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, CompressionError>;
}

/// The zlib compressor from `miniz_oxide`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Zlib;
impl Zlib {
  /// The highest level `miniz_oxide` accepts.
  pub const MAX_LEVEL: u8 = CompressionLevel::UberCompression as u8;
}
impl Compressor for Zlib {
  fn compress(&self, data: &[u8], level: u8) -> Result<Vec<u8>, CompressionError> {
    if level > Self::MAX_LEVEL {
      return Err(CompressionError::InvalidLevel(level));
    }
    Ok(miniz_oxide::deflate::compress_to_vec_zlib(data, level))
  }

  fn decompress(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, CompressionError> {
    // a stream that runs past the limit reports `HasMoreOutput`
    miniz_oxide::inflate::decompress_to_vec_zlib_with_limit(data, limit)
      .map_err(|e| CompressionError::Inflate(e.status))
  }
}

/// Settings for [`PngImage::encode_with`](super::PngImage::encode_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodeOptions {
  /// Passed straight to the [`Compressor`].
  pub compression_level: u8,
}
impl Default for EncodeOptions {
  #[inline]
  fn default() -> Self {
    Self { compression_level: CompressionLevel::BestCompression as u8 }
  }
}
