use core::fmt::Debug;

use tracing::debug;

use super::*;
use crate::{PngError, PngResult};

/// A palette from a `PLTE` chunk, with the alpha values of a `tRNS` chunk if
/// there was one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Palette<'b> {
  entries: &'b [[u8; 3]],
  alphas: Option<&'b [u8]>,
}
impl Debug for Palette<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    // prints no more than 4 palette entries
    f.debug_struct("Palette")
      .field("entries", &(&self.entries[..self.entries.len().min(4)], self.entries.len()))
      .field("alphas", &self.alphas.map(<[u8]>::len))
      .finish()
  }
}
impl<'b> Palette<'b> {
  /// Finds the `PLTE` (and optional `tRNS`) chunk among the kept chunks.
  ///
  /// ## Failure
  /// * [`MissingPalette`](PngError::MissingPalette) without a `PLTE` chunk.
  /// * [`InvalidPalette`](PngError::InvalidPalette) if the `PLTE` isn't 1 to
  ///   256 RGB entries, or there are more alpha values than entries.
  pub fn from_chunks(chunks: &'b [Chunk]) -> PngResult<Self> {
    let plte = chunks.iter().find(|c| c.name() == ChunkName::PLTE).ok_or(PngError::MissingPalette)?;
    let entries: &[[u8; 3]] = bytemuck::try_cast_slice(plte.data())
      .map_err(|_| PngError::InvalidPalette("PLTE length is not a multiple of 3"))?;
    if entries.is_empty() || entries.len() > 256 {
      return Err(PngError::InvalidPalette("PLTE must have 1 to 256 entries"));
    }
    let alphas = chunks.iter().find(|c| c.name() == ChunkName::tRNS).map(Chunk::data);
    if alphas.is_some_and(|a| a.len() > entries.len()) {
      return Err(PngError::InvalidPalette("more tRNS entries than palette entries"));
    }
    debug!(entries = entries.len(), alphas = alphas.map_or(0, <[u8]>::len), "palette read");
    Ok(Self { entries, alphas })
  }

  /// The color type of the expanded pixels.
  #[inline]
  #[must_use]
  pub const fn expanded_color_type(&self) -> PngColorType {
    if self.alphas.is_some() {
      PngColorType::RGBA
    } else {
      PngColorType::RGB
    }
  }

  /// Replaces every one byte index with its palette color.
  ///
  /// Entries past the end of the `tRNS` data are fully opaque.
  pub fn expand(&self, indexes: &PixelMatrix) -> PngResult<PixelMatrix> {
    let color_type = self.expanded_color_type();
    indexes.map_pixels(color_type.channel_count(), |pixel, out| {
      let i = usize::from(pixel[0]);
      let [r, g, b] =
        *self.entries.get(i).ok_or(PngError::InvalidPalette("pixel index past the end of the palette"))?;
      out.extend_from_slice(&[r, g, b]);
      if let Some(alphas) = self.alphas {
        out.push(alphas.get(i).copied().unwrap_or(u8::MAX));
      }
      Ok(())
    })
  }
}
