use core::fmt::Display;

use super::*;
use crate::{PngError, PngResult};

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// If the last channel is alpha.
  #[inline]
  #[must_use]
  pub const fn has_alpha(self) -> bool {
    matches!(self, Self::YA | Self::RGBA)
  }

  /// The bit depths the PNG format allows for this color type.
  #[inline]
  #[must_use]
  pub const fn allowed_bit_depths(self) -> &'static [u8] {
    match self {
      Self::Y => &[1, 2, 4, 8, 16],
      Self::Index => &[1, 2, 4, 8],
      Self::RGB | Self::YA | Self::RGBA => &[8, 16],
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(PngError::InvalidHeader("unknown color type")),
    })
  }
}

/// Image Header
///
/// Always the first chunk of a PNG. Once it's parsed the header doesn't change
/// for the rest of the load or save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
  /// always 0 (zlib deflate)
  pub compression_method: u8,
  /// always 0 (adaptive filtering with five filter types)
  pub filter_method: u8,
  /// always 0 here, interlaced images are rejected
  pub interlace_method: u8,
}
impl IHDR {
  /// Size of the `IHDR` chunk data.
  pub const LEN: usize = 13;

  /// A non-interlaced header with the default methods.
  #[inline]
  #[must_use]
  pub const fn new(width: u32, height: u32, bit_depth: u8, color_type: PngColorType) -> Self {
    Self {
      width,
      height,
      bit_depth,
      color_type,
      compression_method: 0,
      filter_method: 0,
      interlace_method: 0,
    }
  }

  /// Bits used by one pixel of the stored image data.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Bytes used by one pixel of the stored image data.
  ///
  /// This is also the distance that filters look back to find the "left"
  /// byte.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    (self.bits_per_pixel() + 7) / 8
  }

  /// Bytes in one scanline, not counting the filter type byte.
  #[inline]
  #[must_use]
  pub const fn scanline_len(&self) -> usize {
    (self.width as usize).saturating_mul(self.bytes_per_pixel())
  }

  /// Bytes of unfiltered pixel data for the whole image.
  #[inline]
  #[must_use]
  pub const fn image_data_len(&self) -> usize {
    self.scanline_len().saturating_mul(self.height as usize)
  }

  /// Bytes of decompressed, still filtered data for the whole image.
  ///
  /// Each line is a filter byte (1) + pixel data.
  #[inline]
  #[must_use]
  pub const fn filtered_data_len(&self) -> usize {
    self.scanline_len().saturating_add(1).saturating_mul(self.height as usize)
  }

  /// Encodes the header as an `IHDR` chunk.
  #[must_use]
  pub fn to_chunk(&self) -> Chunk {
    let mut data = Vec::with_capacity(Self::LEN);
    data.extend_from_slice(&self.width.to_be_bytes());
    data.extend_from_slice(&self.height.to_be_bytes());
    data.extend_from_slice(&[
      self.bit_depth,
      self.color_type as u8,
      self.compression_method,
      self.filter_method,
      self.interlace_method,
    ]);
    Chunk::new(ChunkName::IHDR, data)
  }
}
impl TryFrom<&[u8]> for IHDR {
  type Error = PngError;
  fn try_from(value: &[u8]) -> PngResult<Self> {
    match value {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =>
      {
        let color_type = PngColorType::try_from(*color_type)?;
        if *interlace_method != 0 {
          return Err(PngError::UnsupportedInterlace(*interlace_method));
        }
        if *compression_method != 0 {
          return Err(PngError::InvalidHeader("unknown compression method"));
        }
        if *filter_method != 0 {
          return Err(PngError::InvalidHeader("unknown filter method"));
        }
        let width = u32::from_be_bytes([*w0, *w1, *w2, *w3]);
        let height = u32::from_be_bytes([*h0, *h1, *h2, *h3]);
        if width == 0 || height == 0 {
          return Err(PngError::InvalidHeader("width and height must be non-zero"));
        }
        let bit_depth = *bit_depth;
        if !color_type.allowed_bit_depths().contains(&bit_depth) {
          return Err(PngError::InvalidHeader("bit depth not allowed for the color type"));
        }
        // sub-byte samples would need bit unpacking, and indexed color is
        // only expanded from whole bytes.
        let supported = match color_type {
          PngColorType::Index => bit_depth == 8,
          _ => bit_depth >= 8,
        };
        if !supported {
          return Err(PngError::UnsupportedBitDepth { color_type, bit_depth });
        }
        Ok(Self {
          width,
          height,
          bit_depth,
          color_type,
          compression_method: 0,
          filter_method: 0,
          interlace_method: 0,
        })
      }
      _ => Err(PngError::InvalidHeader("IHDR data must be 13 bytes")),
    }
  }
}
impl TryFrom<&Chunk> for IHDR {
  type Error = PngError;
  #[inline]
  fn try_from(chunk: &Chunk) -> PngResult<Self> {
    if chunk.name() == ChunkName::IHDR {
      IHDR::try_from(chunk.data())
    } else {
      Err(PngError::MissingHeader)
    }
  }
}
impl Display for IHDR {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    writeln!(f, "Dimensions: {}x{}", self.width, self.height)?;
    writeln!(f, "Bit depth/color type: {}/{}", self.bit_depth, self.color_type as u8)?;
    writeln!(f, "Bytes per pixel: {}", self.bytes_per_pixel())?;
    write!(
      f,
      "Compression/filter/interlace method: {}/{}/{}",
      self.compression_method, self.filter_method, self.interlace_method
    )
  }
}
