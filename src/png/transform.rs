use tracing::debug;

use super::*;

impl PngImage {
  /// Inverts every color sample, leaving alpha alone.
  ///
  /// Each byte `v` becomes `255 - v`. For 16-bit samples that's the same as
  /// `65535 - v` on the whole big-endian sample.
  pub fn invert(&mut self) {
    let color_bytes = self.color_bytes_per_pixel();
    for pixel in self.pixels_mut().pixels_mut() {
      for sample in &mut pixel[..color_bytes] {
        *sample = u8::MAX - *sample;
      }
    }
    debug!(color_bytes, "image inverted");
  }

  /// Converts a truecolor image to greyscale when every pixel has equal red,
  /// green, and blue samples.
  ///
  /// Returns if the image was converted. Alpha is kept.
  pub fn simplify(&mut self) -> bool {
    let gray_type = match self.header().color_type {
      PngColorType::RGB => PngColorType::Y,
      PngColorType::RGBA => PngColorType::YA,
      _ => return false,
    };
    let sample_len = usize::from(self.header().bit_depth / 8);
    let is_gray = |pixel: &[u8]| {
      let (r, rest) = pixel.split_at(sample_len);
      let (g, rest) = rest.split_at(sample_len);
      r == g && g == &rest[..sample_len]
    };
    if !self.pixels().pixels().all(is_gray) {
      return false;
    }
    let new_bpp = gray_type.channel_count() * sample_len;
    let gray = self.pixels().reshape_pixels(new_bpp, |pixel, out| {
      // keep red, then skip green and blue to reach any alpha
      out.extend_from_slice(&pixel[..sample_len]);
      out.extend_from_slice(&pixel[3 * sample_len..]);
    });
    self.replace_pixels(gray, gray_type);
    debug!(color_type = gray_type as u8, "image simplified to greyscale");
    true
  }

  fn color_bytes_per_pixel(&self) -> usize {
    let header = self.header();
    let channels = header.color_type.channel_count();
    let color_channels = if header.color_type.has_alpha() { channels - 1 } else { channels };
    color_channels * usize::from(header.bit_depth / 8)
  }
}
