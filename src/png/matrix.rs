use crate::{PngError, PngResult};

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// pixel index.
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  (y as usize) * (width as usize) + (x as usize)
}

/// A `height` × `width` grid of pixels, each `bytes_per_pixel` bytes long.
///
/// Rows run top to bottom and pixels left to right, the same order PNG stores
/// them in. Every row has exactly `width` pixels and every pixel has exactly
/// `bytes_per_pixel` channel bytes; the constructors make sure of that, so
/// nothing else re-checks it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PixelMatrix {
  width: u32,
  height: u32,
  bytes_per_pixel: usize,
  samples: Vec<u8>,
}
impl PixelMatrix {
  /// Assembles a matrix from flat, row-major pixel bytes.
  ///
  /// ## Failure
  /// * [`GeometryMismatch`](PngError::GeometryMismatch) unless
  ///   `flat.len() == width * height * bytes_per_pixel`.
  pub fn from_flat(
    flat: Vec<u8>, width: u32, height: u32, bytes_per_pixel: usize,
  ) -> PngResult<Self> {
    let expected = (width as usize)
      .checked_mul(height as usize)
      .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
      .unwrap_or(usize::MAX);
    if bytes_per_pixel == 0 || flat.len() != expected {
      return Err(PngError::GeometryMismatch { expected, actual: flat.len() });
    }
    Ok(Self { width, height, bytes_per_pixel, samples: flat })
  }

  /// Assembles a matrix from nested rows of pixels.
  ///
  /// ## Failure
  /// * [`GeometryMismatch`](PngError::GeometryMismatch) if the rows aren't
  ///   all the same length, or the pixels aren't all the same size.
  pub fn from_rows(rows: &[Vec<Vec<u8>>]) -> PngResult<Self> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    let bytes_per_pixel = rows.first().and_then(|r| r.first()).map_or(0, Vec::len);
    let expected = width * height * bytes_per_pixel;
    let mut samples = Vec::with_capacity(expected);
    for row in rows {
      if row.len() != width {
        return Err(PngError::GeometryMismatch { expected: width, actual: row.len() });
      }
      for pixel in row {
        if pixel.len() != bytes_per_pixel {
          return Err(PngError::GeometryMismatch { expected: bytes_per_pixel, actual: pixel.len() });
        }
        samples.extend_from_slice(pixel);
      }
    }
    let width = u32::try_from(width).map_err(|_| PngError::InvalidHeader("width too large"))?;
    let height = u32::try_from(height).map_err(|_| PngError::InvalidHeader("height too large"))?;
    Self::from_flat(samples, width, height, bytes_per_pixel)
  }

  /// Width in pixels.
  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.width
  }

  /// Height in pixels.
  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.height
  }

  /// Channel bytes in each pixel.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    self.bytes_per_pixel
  }

  /// Bytes in one row.
  #[inline]
  #[must_use]
  pub const fn row_len(&self) -> usize {
    self.width as usize * self.bytes_per_pixel
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<&[u8]> {
    if x < self.width && y < self.height {
      let i = xy_width_to_index(x, y, self.width) * self.bytes_per_pixel;
      Some(&self.samples[i..i + self.bytes_per_pixel])
    } else {
      None
    }
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut [u8]> {
    if x < self.width && y < self.height {
      let i = xy_width_to_index(x, y, self.width) * self.bytes_per_pixel;
      Some(&mut self.samples[i..i + self.bytes_per_pixel])
    } else {
      None
    }
  }

  /// Iterates over the rows, top to bottom.
  pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
    self.samples.chunks_exact(self.row_len().max(1))
  }

  /// Iterates over every pixel, row by row.
  pub fn pixels(&self) -> impl Iterator<Item = &[u8]> + '_ {
    self.samples.chunks_exact(self.bytes_per_pixel.max(1))
  }

  /// Iterates over every pixel mutably, row by row.
  pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
    self.samples.chunks_exact_mut(self.bytes_per_pixel.max(1))
  }

  /// The flat, row-major bytes of the matrix.
  #[inline]
  #[must_use]
  pub fn to_flat(&self) -> &[u8] {
    &self.samples
  }

  /// Takes the flat, row-major bytes out of the matrix.
  #[inline]
  #[must_use]
  pub fn into_flat(self) -> Vec<u8> {
    self.samples
  }

  /// Copies the matrix out as nested `rows[y][x][channel]` vectors.
  #[must_use]
  pub fn to_rows(&self) -> Vec<Vec<Vec<u8>>> {
    self.rows().map(|row| row.chunks_exact(self.bytes_per_pixel).map(<[u8]>::to_vec).collect()).collect()
  }

  /// Rebuilds every pixel with a new pixel size.
  ///
  /// `op` gets each old pixel and pushes the bytes of the new pixel, which
  /// must be exactly `new_bpp` bytes.
  pub(crate) fn map_pixels<F>(&self, new_bpp: usize, mut op: F) -> PngResult<Self>
  where
    F: FnMut(&[u8], &mut Vec<u8>) -> PngResult<()>,
  {
    let pixel_count = (self.width as usize) * (self.height as usize);
    let mut samples = Vec::with_capacity(pixel_count * new_bpp);
    for pixel in self.pixels() {
      op(pixel, &mut samples)?;
    }
    Self::from_flat(samples, self.width, self.height, new_bpp)
  }

  /// Like [`map_pixels`](Self::map_pixels), for ops that can't fail.
  ///
  /// `op` must push exactly `new_bpp` bytes per pixel.
  pub(crate) fn reshape_pixels<F>(&self, new_bpp: usize, mut op: F) -> Self
  where
    F: FnMut(&[u8], &mut Vec<u8>),
  {
    let pixel_count = (self.width as usize) * (self.height as usize);
    let mut samples = Vec::with_capacity(pixel_count * new_bpp);
    for pixel in self.pixels() {
      op(pixel, &mut samples);
    }
    debug_assert_eq!(samples.len(), pixel_count * new_bpp);
    Self { width: self.width, height: self.height, bytes_per_pixel: new_bpp, samples }
  }
}
