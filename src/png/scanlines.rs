use core::fmt::Display;

use tracing::debug;

use super::*;
use crate::{PngError, PngResult};

/// How many scanlines used each filter type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FilterUsage([usize; 5]);
impl FilterUsage {
  /// Counts one more line filtered with `filter`.
  #[inline]
  pub fn record(&mut self, filter: FilterType) {
    self.0[filter as usize] += 1;
  }

  /// How many lines used `filter`.
  #[inline]
  #[must_use]
  pub const fn count(&self, filter: FilterType) -> usize {
    self.0[filter as usize]
  }

  /// Total lines counted.
  #[inline]
  #[must_use]
  pub fn lines(&self) -> usize {
    self.0.iter().sum()
  }

  /// The filter types used at least once, lowest first.
  pub fn used(&self) -> impl Iterator<Item = FilterType> + '_ {
    FilterType::ALL.into_iter().filter(|f| self.count(*f) > 0)
  }
}
/// Formats like `0 1 4`.
impl Display for FilterUsage {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for (i, filter) in self.used().enumerate() {
      if i > 0 {
        f.write_str(" ")?;
      }
      write!(f, "{}", filter as u8)?;
    }
    Ok(())
  }
}

/// Unfilters decompressed image data.
///
/// The data is a series of filter lines, each a filter type byte followed by
/// `scanline_len` filtered bytes. The output is the reconstructed bytes of
/// every line with the filter type bytes removed.
///
/// The line above the first line is all zeros. Each reconstructed line then
/// becomes the line above for the next one.
///
/// ## Failure
/// * A filter type byte outside `0..=4` is
///   [`UnknownFilterType`](PngError::UnknownFilterType).
/// * Data that ends partway through a line is
///   [`GeometryMismatch`](PngError::GeometryMismatch).
pub fn unfilter_scanlines(
  filtered: &[u8], scanline_len: usize, bpp: usize,
) -> PngResult<(Vec<u8>, FilterUsage)> {
  let filterline_len = scanline_len + 1;
  let line_count = filtered.len() / filterline_len;
  if filtered.len() % filterline_len != 0 {
    return Err(PngError::GeometryMismatch {
      expected: (line_count + 1) * filterline_len,
      actual: filtered.len(),
    });
  }
  let mut usage = FilterUsage::default();
  let mut pixels: Vec<u8> = Vec::with_capacity(line_count * scanline_len);
  let zero_line = vec![0_u8; scanline_len];
  for filterline in filtered.chunks_exact(filterline_len) {
    let (filter_byte, line_data) = (filterline[0], &filterline[1..]);
    let filter = FilterType::try_from(filter_byte)?;
    usage.record(filter);
    let start = pixels.len();
    pixels.extend_from_slice(line_data);
    let (done, line) = pixels.split_at_mut(start);
    let prev: &[u8] = if start == 0 { &zero_line[..] } else { &done[start - scanline_len..] };
    filter.invert(line, prev, bpp);
  }
  debug!(lines = line_count, bytes = pixels.len(), filters = %usage, "scanlines unfiltered");
  Ok((pixels, usage))
}

/// Filters raw image bytes, choosing a filter for each line adaptively.
///
/// The output has a filter type byte in front of every line, ready for
/// compression.
///
/// ## Failure
/// * A zero `scanline_len` is [`InvalidHeader`](PngError::InvalidHeader).
/// * If `raw` isn't a whole number of `scanline_len` lines you get
///   [`GeometryMismatch`](PngError::GeometryMismatch).
pub fn filter_scanlines(
  raw: &[u8], scanline_len: usize, bpp: usize,
) -> PngResult<(Vec<u8>, FilterUsage)> {
  if scanline_len == 0 {
    return Err(PngError::InvalidHeader("zero length scanline"));
  }
  let line_count = raw.len() / scanline_len;
  if raw.len() % scanline_len != 0 {
    return Err(PngError::GeometryMismatch {
      expected: (line_count + 1) * scanline_len,
      actual: raw.len(),
    });
  }
  let mut usage = FilterUsage::default();
  let mut out: Vec<u8> = Vec::with_capacity(line_count * (scanline_len + 1));
  let mut adaptive = AdaptiveFilter::new(scanline_len);
  let zero_line = vec![0_u8; scanline_len];
  // `raw` is never written to, so the line above is still unfiltered when the
  // next line looks at it.
  let mut prev: &[u8] = &zero_line;
  for line in raw.chunks_exact(scanline_len) {
    let (filter, filtered) = adaptive.choose(line, prev, bpp);
    usage.record(filter);
    out.push(filter as u8);
    out.extend_from_slice(filtered);
    prev = line;
  }
  debug!(lines = line_count, bytes = out.len(), filters = %usage, "scanlines filtered");
  Ok((out, usage))
}
