use std::path::Path;

use tracing::{debug, warn};

use super::*;
use crate::{PngError, PngResult};

/// A decoded, non-interlaced PNG image.
///
/// The header always describes the pixels as they're stored here: indexed
/// images are expanded to truecolor when they're decoded, so a `PngImage`
/// never has color type [`Index`](PngColorType::Index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngImage {
  header: IHDR,
  pixels: PixelMatrix,
  ancillary: Vec<Chunk>,
}

/// What happened while decoding an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeReport {
  /// Size of the whole PNG stream.
  pub file_len: usize,
  /// Chunks kept after checksums and the acceptance rules.
  pub chunk_count: usize,
  /// Ancillary chunks that weren't safe to copy, so they were dropped.
  pub dropped: Vec<ChunkName>,
  /// How many `IDAT` chunks the image data was split across.
  pub idat_count: usize,
  /// Joined `IDAT` payload size.
  pub compressed_len: usize,
  /// Size of the inflated, still filtered, scanlines.
  pub inflated_len: usize,
  /// Filter types found on the scanlines.
  pub filters: FilterUsage,
  /// If the stream had an `IEND` chunk.
  pub has_iend: bool,
}
impl DecodeReport {
  /// Inflated bytes per compressed byte, so higher is better.
  ///
  /// Zero when there was no compressed data.
  #[inline]
  #[must_use]
  pub fn compression_factor(&self) -> f64 {
    factor(self.inflated_len, self.compressed_len)
  }
}

/// What happened while encoding an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeReport {
  /// Unfiltered pixel bytes.
  pub raw_len: usize,
  /// Pixel bytes plus one filter type byte per line.
  pub filtered_len: usize,
  /// Size of the compressed stream, across all `IDAT` chunks.
  pub compressed_len: usize,
  /// How many `IDAT` chunks were written.
  pub idat_count: usize,
  /// Size of the whole PNG stream.
  pub file_len: usize,
  /// The compression level that was used.
  pub compression_level: u8,
  /// Filter types chosen for the scanlines.
  pub filters: FilterUsage,
}
impl EncodeReport {
  /// Filtered bytes per compressed byte.
  #[inline]
  #[must_use]
  pub fn compression_factor(&self) -> f64 {
    factor(self.filtered_len, self.compressed_len)
  }
}

#[inline]
fn factor(inflated: usize, compressed: usize) -> f64 {
  if compressed == 0 {
    0.0
  } else {
    inflated as f64 / compressed as f64
  }
}

impl PngImage {
  /// Builds an image from a pixel matrix.
  ///
  /// ## Failure
  /// * [`InvalidHeader`](PngError::InvalidHeader) for an empty matrix or an
  ///   indexed color type.
  /// * [`UnsupportedBitDepth`](PngError::UnsupportedBitDepth) unless the bit
  ///   depth is 8 or 16 (and allowed for the color type).
  /// * [`GeometryMismatch`](PngError::GeometryMismatch) if the matrix pixel
  ///   size doesn't fit the color type and bit depth.
  pub fn from_matrix(pixels: PixelMatrix, color_type: PngColorType, bit_depth: u8) -> PngResult<Self> {
    if pixels.width() == 0 || pixels.height() == 0 {
      return Err(PngError::InvalidHeader("width and height must be non-zero"));
    }
    if color_type == PngColorType::Index {
      return Err(PngError::InvalidHeader("indexed images are stored expanded"));
    }
    if !matches!(bit_depth, 8 | 16) || !color_type.allowed_bit_depths().contains(&bit_depth) {
      return Err(PngError::UnsupportedBitDepth { color_type, bit_depth });
    }
    let header = IHDR::new(pixels.width(), pixels.height(), bit_depth, color_type);
    if header.bytes_per_pixel() != pixels.bytes_per_pixel() {
      return Err(PngError::GeometryMismatch {
        expected: header.bytes_per_pixel(),
        actual: pixels.bytes_per_pixel(),
      });
    }
    Ok(Self { header, pixels, ancillary: Vec::new() })
  }

  /// Decodes PNG bytes with the [`Zlib`] compressor.
  #[inline]
  pub fn decode(bytes: &[u8]) -> PngResult<(Self, DecodeReport)> {
    Self::decode_with(bytes, &Zlib)
  }

  /// Decodes PNG bytes.
  ///
  /// Every chunk in the stream is read and checked before any image data is
  /// looked at, so a corrupted chunk anywhere fails the decode.
  pub fn decode_with(bytes: &[u8], compressor: &impl Compressor) -> PngResult<(Self, DecodeReport)> {
    let ChunkList { chunks, dropped } = read_chunks(bytes)?;
    let mut header = match chunks.first() {
      Some(first) => IHDR::try_from(first)?,
      None => return Err(PngError::MissingHeader),
    };
    debug!(
      width = header.width,
      height = header.height,
      bit_depth = header.bit_depth,
      color_type = header.color_type as u8,
      "header read"
    );
    let has_iend = chunks.iter().any(|c| c.name() == ChunkName::IEND);
    if !has_iend {
      warn!("stream ended without an IEND chunk");
    }

    let mut idat_count = 0;
    let mut compressed: Vec<u8> = Vec::new();
    for idat in chunks.iter().filter(|c| c.name() == ChunkName::IDAT) {
      idat_count += 1;
      compressed.extend_from_slice(idat.data());
    }
    // the header fixes the inflated size, one spare byte lets an exact
    // stream finish and an overlong one fail the line count below
    let limit = header.filtered_data_len().saturating_add(1);
    let inflated = compressor.decompress(&compressed, limit)?;
    debug!(idat_count, compressed = compressed.len(), inflated = inflated.len(), "image data inflated");

    let bpp = header.bytes_per_pixel();
    let (flat, filters) = unfilter_scanlines(&inflated, header.scanline_len(), bpp)?;
    let mut pixels = PixelMatrix::from_flat(flat, header.width, header.height, bpp)?;
    if header.color_type == PngColorType::Index {
      let palette = Palette::from_chunks(&chunks)?;
      pixels = palette.expand(&pixels)?;
      header = IHDR::new(header.width, header.height, 8, palette.expanded_color_type());
    }

    let report = DecodeReport {
      file_len: bytes.len(),
      chunk_count: chunks.len(),
      dropped,
      idat_count,
      compressed_len: compressed.len(),
      inflated_len: inflated.len(),
      filters,
      has_iend,
    };
    let ancillary = chunks.into_iter().filter(|c| c.name().is_ancillary() && !c.name().is_known()).collect();
    Ok((Self { header, pixels, ancillary }, report))
  }

  /// Encodes the image with the default options and the [`Zlib`]
  /// compressor.
  #[inline]
  pub fn encode(&self) -> PngResult<(Vec<u8>, EncodeReport)> {
    self.encode_with(EncodeOptions::default(), &Zlib)
  }

  /// Encodes the image as an `IHDR`, the `IDAT` data, and an `IEND`.
  ///
  /// The compressed stream goes in a single `IDAT` unless it's longer than
  /// [`MAX_CHUNK_LEN`].
  pub fn encode_with(
    &self, options: EncodeOptions, compressor: &impl Compressor,
  ) -> PngResult<(Vec<u8>, EncodeReport)> {
    let header = IHDR::new(self.header.width, self.header.height, self.header.bit_depth, self.header.color_type);
    let raw = self.pixels.to_flat();
    let (filtered, filters) = filter_scanlines(raw, header.scanline_len(), header.bytes_per_pixel())?;
    let compressed = compressor.compress(&filtered, options.compression_level)?;
    debug!(filtered = filtered.len(), compressed = compressed.len(), "image data deflated");

    let mut out = PNG_SIGNATURE.to_vec();
    header.to_chunk().write_to(&mut out);
    let mut idat_count = 0;
    for piece in compressed.chunks(MAX_CHUNK_LEN) {
      Chunk::new(ChunkName::IDAT, piece.to_vec()).write_to(&mut out);
      idat_count += 1;
    }
    Chunk::iend().write_to(&mut out);

    let report = EncodeReport {
      raw_len: raw.len(),
      filtered_len: filtered.len(),
      compressed_len: compressed.len(),
      idat_count,
      file_len: out.len(),
      compression_level: options.compression_level,
      filters,
    };
    Ok((out, report))
  }

  /// Reads and decodes a PNG file.
  pub fn load(path: impl AsRef<Path>) -> PngResult<(Self, DecodeReport)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    debug!(path = %path.display(), len = bytes.len(), "file read");
    Self::decode(&bytes)
  }

  /// Encodes the image with the default options and writes it to a file.
  #[inline]
  pub fn save(&self, path: impl AsRef<Path>) -> PngResult<EncodeReport> {
    self.save_with(path, EncodeOptions::default(), &Zlib)
  }

  /// Encodes the image and writes it to a file.
  ///
  /// The file is only created once the encode has succeeded.
  pub fn save_with(
    &self, path: impl AsRef<Path>, options: EncodeOptions, compressor: &impl Compressor,
  ) -> PngResult<EncodeReport> {
    let path = path.as_ref();
    let (bytes, report) = self.encode_with(options, compressor)?;
    std::fs::write(path, &bytes)?;
    debug!(path = %path.display(), len = bytes.len(), "file written");
    Ok(report)
  }

  /// The header describing [`pixels`](Self::pixels).
  #[inline]
  #[must_use]
  pub const fn header(&self) -> &IHDR {
    &self.header
  }

  /// The pixel matrix.
  #[inline]
  #[must_use]
  pub const fn pixels(&self) -> &PixelMatrix {
    &self.pixels
  }

  /// Unknown, safe-to-copy ancillary chunks that were kept while decoding.
  ///
  /// These are never written back out by [`encode`](Self::encode).
  #[inline]
  #[must_use]
  pub fn ancillary_chunks(&self) -> &[Chunk] {
    &self.ancillary
  }

  /// Sets a pixel, if the position is in bounds and `value` is exactly one
  /// pixel long.
  #[inline]
  pub fn set_pixel(&mut self, x: u32, y: u32, value: &[u8]) -> bool {
    match self.pixels.get_mut(x, y) {
      Some(pixel) if pixel.len() == value.len() => {
        pixel.copy_from_slice(value);
        true
      }
      _ => false,
    }
  }

  pub(crate) fn pixels_mut(&mut self) -> &mut PixelMatrix {
    &mut self.pixels
  }

  pub(crate) fn replace_pixels(&mut self, pixels: PixelMatrix, color_type: PngColorType) {
    debug_assert_eq!(pixels.width(), self.header.width);
    debug_assert_eq!(pixels.height(), self.header.height);
    self.header.color_type = color_type;
    self.pixels = pixels;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use miniz_oxide::inflate::TINFLStatus;

  /// A 1x1, 8-bit greyscale image with a single zero byte.
  fn tiny_gray_png() -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    IHDR::new(1, 1, 8, PngColorType::Y).to_chunk().write_to(&mut out);
    let idat = Zlib.compress(&[0, 0], 9).unwrap();
    Chunk::new(ChunkName::IDAT, idat).write_to(&mut out);
    Chunk::iend().write_to(&mut out);
    out
  }

  #[test]
  fn test_decode_tiny_gray() {
    let (image, report) = PngImage::decode(&tiny_gray_png()).unwrap();
    assert_eq!(image.pixels().to_rows(), vec![vec![vec![0_u8]]]);
    assert_eq!(image.header().color_type, PngColorType::Y);
    assert_eq!(report.chunk_count, 3);
    assert_eq!(report.idat_count, 1);
    assert_eq!(report.inflated_len, 2);
    assert_eq!(report.filters.count(FilterType::None), 1);
    assert!(report.has_iend);
  }

  #[test]
  fn test_compression_factor() {
    let report = DecodeReport { compressed_len: 10, inflated_len: 40, ..Default::default() };
    assert_eq!(report.compression_factor(), 4.0);
    assert_eq!(DecodeReport::default().compression_factor(), 0.0);

    let report = EncodeReport { filtered_len: 30, compressed_len: 20, ..Default::default() };
    assert_eq!(report.compression_factor(), 1.5);
    assert_eq!(EncodeReport::default().compression_factor(), 0.0);
  }

  #[test]
  fn test_encode_writes_three_chunks() {
    let (image, _) = PngImage::decode(&tiny_gray_png()).unwrap();
    let (bytes, report) = image.encode().unwrap();
    assert_eq!(report.file_len, bytes.len());
    assert_eq!(report.idat_count, 1);
    assert_eq!(report.raw_len, 1);
    assert_eq!(report.filtered_len, 2);
    let names: Vec<ChunkName> = read_chunks(&bytes).unwrap().chunks.iter().map(Chunk::name).collect();
    assert_eq!(names, [ChunkName::IHDR, ChunkName::IDAT, ChunkName::IEND]);
    assert_eq!(&bytes[bytes.len() - 12..], Chunk::iend().to_bytes().as_slice());
  }

  #[test]
  fn test_multiple_idat_are_joined() {
    let raw = [0, 1, 2, 3, 0, 4, 5, 6];
    let idat = Zlib.compress(&raw, 9).unwrap();
    let (a, b) = idat.split_at(idat.len() / 2);
    let mut png = PNG_SIGNATURE.to_vec();
    IHDR::new(3, 2, 8, PngColorType::Y).to_chunk().write_to(&mut png);
    Chunk::new(ChunkName::IDAT, a.to_vec()).write_to(&mut png);
    Chunk::new(ChunkName(*b"tEXt"), b"k\0v".to_vec()).write_to(&mut png);
    Chunk::new(ChunkName::IDAT, b.to_vec()).write_to(&mut png);
    Chunk::iend().write_to(&mut png);
    let (image, report) = PngImage::decode(&png).unwrap();
    assert_eq!(report.idat_count, 2);
    assert_eq!(image.pixels().to_flat(), &[1, 2, 3, 4, 5, 6]);
    assert_eq!(image.ancillary_chunks().len(), 1);
    assert_eq!(image.ancillary_chunks()[0].name(), ChunkName(*b"tEXt"));
  }

  #[test]
  fn test_decode_needs_ihdr_first() {
    let mut png = PNG_SIGNATURE.to_vec();
    Chunk::iend().write_to(&mut png);
    assert!(matches!(PngImage::decode(&png), Err(PngError::MissingHeader)));
    assert!(matches!(PngImage::decode(&PNG_SIGNATURE), Err(PngError::MissingHeader)));
  }

  #[test]
  fn test_decode_without_iend() {
    let mut png = tiny_gray_png();
    png.truncate(png.len() - 12);
    let (image, report) = PngImage::decode(&png).unwrap();
    assert!(!report.has_iend);
    assert_eq!(image.pixels().to_flat(), &[0]);
  }

  #[test]
  fn test_decode_geometry_mismatch() {
    let mut png = PNG_SIGNATURE.to_vec();
    IHDR::new(2, 2, 8, PngColorType::Y).to_chunk().write_to(&mut png);
    // one whole line where the header says two
    let idat = Zlib.compress(&[0, 1, 1], 9).unwrap();
    Chunk::new(ChunkName::IDAT, idat).write_to(&mut png);
    Chunk::iend().write_to(&mut png);
    assert!(matches!(
      PngImage::decode(&png),
      Err(PngError::GeometryMismatch { expected: 4, actual: 2 })
    ));
  }

  #[test]
  fn test_decode_stops_inflating_at_header_size() {
    // a 1x1 header in front of a megabyte of zeros
    let idat = Zlib.compress(&vec![0; 1 << 20], 9).unwrap();
    assert!(idat.len() < 4096);
    let mut png = PNG_SIGNATURE.to_vec();
    IHDR::new(1, 1, 8, PngColorType::Y).to_chunk().write_to(&mut png);
    Chunk::new(ChunkName::IDAT, idat).write_to(&mut png);
    Chunk::iend().write_to(&mut png);
    assert!(matches!(
      PngImage::decode(&png),
      Err(PngError::Compression(crate::CompressionError::Inflate(TINFLStatus::HasMoreOutput)))
    ));
  }

  #[test]
  fn test_decode_bad_zlib() {
    let mut png = PNG_SIGNATURE.to_vec();
    IHDR::new(1, 1, 8, PngColorType::Y).to_chunk().write_to(&mut png);
    Chunk::new(ChunkName::IDAT, vec![1, 2, 3, 4]).write_to(&mut png);
    Chunk::iend().write_to(&mut png);
    assert!(matches!(PngImage::decode(&png), Err(PngError::Compression(_))));
  }

  #[test]
  fn test_decode_indexed() {
    let mut png = PNG_SIGNATURE.to_vec();
    IHDR::new(2, 1, 8, PngColorType::Index).to_chunk().write_to(&mut png);
    Chunk::new(ChunkName::PLTE, vec![255, 0, 0, 0, 0, 255]).write_to(&mut png);
    Chunk::new(ChunkName::IDAT, Zlib.compress(&[0, 1, 0], 9).unwrap()).write_to(&mut png);
    Chunk::iend().write_to(&mut png);
    let (image, _) = PngImage::decode(&png).unwrap();
    assert_eq!(image.header().color_type, PngColorType::RGB);
    assert_eq!(image.pixels().to_flat(), &[0, 0, 255, 255, 0, 0]);

    // and the expanded image re-encodes as truecolor
    let (bytes, _) = image.encode().unwrap();
    let (again, _) = PngImage::decode(&bytes).unwrap();
    assert_eq!(again, image);
  }

  #[test]
  fn test_encode_bad_level() {
    let (image, _) = PngImage::decode(&tiny_gray_png()).unwrap();
    let options = EncodeOptions { compression_level: 200 };
    assert!(matches!(
      image.encode_with(options, &Zlib),
      Err(PngError::Compression(crate::CompressionError::InvalidLevel(200)))
    ));
  }

  #[test]
  fn test_from_matrix_16_bit_round_trip() {
    let flat: Vec<u8> = (0..2 * 3 * 4_u8).collect();
    let matrix = PixelMatrix::from_flat(flat, 2, 3, 4).unwrap();
    let image = PngImage::from_matrix(matrix, PngColorType::YA, 16).unwrap();
    let (bytes, _) = image.encode().unwrap();
    let (again, _) = PngImage::decode(&bytes).unwrap();
    assert_eq!(again.header().bit_depth, 16);
    assert_eq!(again, image);
  }

  #[test]
  fn test_from_matrix_rejects() {
    let matrix = PixelMatrix::from_flat(vec![0; 6], 2, 1, 3).unwrap();
    assert!(PngImage::from_matrix(matrix.clone(), PngColorType::RGB, 8).is_ok());
    assert!(matches!(
      PngImage::from_matrix(matrix.clone(), PngColorType::RGBA, 8),
      Err(PngError::GeometryMismatch { expected: 4, actual: 3 })
    ));
    assert!(matches!(
      PngImage::from_matrix(matrix.clone(), PngColorType::Index, 8),
      Err(PngError::InvalidHeader(_))
    ));
    assert!(matches!(
      PngImage::from_matrix(matrix, PngColorType::RGB, 4),
      Err(PngError::UnsupportedBitDepth { .. })
    ));
  }

  #[test]
  fn test_set_pixel() {
    let matrix = PixelMatrix::from_flat(vec![0; 4], 2, 2, 1).unwrap();
    let mut image = PngImage::from_matrix(matrix, PngColorType::Y, 8).unwrap();
    assert!(image.set_pixel(1, 0, &[7]));
    assert!(!image.set_pixel(2, 0, &[7]));
    assert!(!image.set_pixel(0, 0, &[7, 7]));
    assert_eq!(image.pixels().to_flat(), &[0, 7, 0, 0]);
  }
}
