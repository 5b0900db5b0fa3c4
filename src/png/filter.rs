//! Per-scanline filtering.
//!
//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! For every byte `x` of a line the filters look at three neighbors:
//!
//! * `a`: the byte one pixel to the left (`bpp` bytes back), or 0 for the
//!   first pixel of the line.
//! * `b`: the byte directly above, from the previous line, or 0 on the first
//!   line of the image.
//! * `c`: the byte above and one pixel to the left, 0 when either of the
//!   above is 0 by position.
//!
//! These are always the *unfiltered* values. When encoding that means the raw
//! line has to stay intact while the filtered line is written elsewhere. When
//! decoding it works out naturally, because by the time we reach `x` every
//! byte to its left has already been reconstructed.

use crate::PngError;

/// The five filter types of PNG filter method 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FilterType {
  /// `x` is stored unchanged.
  #[default]
  None = 0,
  /// `x - a`
  Sub = 1,
  /// `x - b`
  Up = 2,
  /// `x - floor((a + b) / 2)`
  Average = 3,
  /// `x - paeth_predictor(a, b, c)`
  Paeth = 4,
}
impl TryFrom<u8> for FilterType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      _ => return Err(PngError::UnknownFilterType(value)),
    })
  }
}
impl FilterType {
  /// All the filter types, lowest number first.
  pub const ALL: [Self; 5] = [Self::None, Self::Sub, Self::Up, Self::Average, Self::Paeth];

  /// The value this filter predicts for a byte, given its neighbors.
  #[inline]
  #[must_use]
  pub const fn predict(self, a: u8, b: u8, c: u8) -> u8 {
    match self {
      Self::None => 0,
      Self::Sub => a,
      Self::Up => b,
      Self::Average => ((a as u16 + b as u16) / 2) as u8,
      Self::Paeth => paeth_predictor(a, b, c),
    }
  }

  /// Filters one raw line into `out`.
  ///
  /// * `raw` is the unfiltered line, it's never modified.
  /// * `prev` is the unfiltered line above, all zeros for the first line.
  /// * `out` gets the filtered bytes, and must be the same length as `raw`.
  ///
  /// ## Panics
  /// * If `prev` or `out` are shorter than `raw`.
  pub fn apply(self, raw: &[u8], prev: &[u8], bpp: usize, out: &mut [u8]) {
    debug_assert!(bpp > 0);
    let out = &mut out[..raw.len()];
    let prev = &prev[..raw.len()];
    match self {
      Self::None => out.copy_from_slice(raw),
      Self::Up => {
        for ((o, x), b) in out.iter_mut().zip(raw).zip(prev) {
          *o = x.wrapping_sub(*b);
        }
      }
      _ => {
        for (i, o) in out.iter_mut().enumerate() {
          let (a, c) = if i >= bpp { (raw[i - bpp], prev[i - bpp]) } else { (0, 0) };
          *o = raw[i].wrapping_sub(self.predict(a, prev[i], c));
        }
      }
    }
  }

  /// Reconstructs one filtered line in place.
  ///
  /// * `prev` is the already reconstructed line above, all zeros for the
  ///   first line.
  ///
  /// ## Panics
  /// * If `prev` is shorter than `line`.
  pub fn invert(self, line: &mut [u8], prev: &[u8], bpp: usize) {
    debug_assert!(bpp > 0);
    let prev = &prev[..line.len()];
    match self {
      Self::None => (),
      Self::Up => {
        for (x, b) in line.iter_mut().zip(prev) {
          *x = x.wrapping_add(*b);
        }
      }
      _ => {
        for i in 0..line.len() {
          // `line[i - bpp]` is already reconstructed at this point.
          let (a, c) = if i >= bpp { (line[i - bpp], prev[i - bpp]) } else { (0, 0) };
          line[i] = line[i].wrapping_add(self.predict(a, prev[i], c));
        }
      }
    }
  }
}

/// The Paeth filter function computes a simple linear function of the three
/// neighboring bytes (left `a`, above `b`, upper left `c`).
///
/// The output is the neighbor closest to the computed value.
#[inline]
#[must_use]
pub const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  // Note: "The calculations within the PaethPredictor function shall be
  // performed exactly, without overflow", so this is i32 math.
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // The order of these tests is fixed by the PNG spec: ties go to `a`, then
  // `b`, then `c`.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// The minimum sum of absolute differences heuristic.
///
/// Each filtered byte is read as an `i8` and the magnitudes are summed. Lower
/// is better.
#[inline]
#[must_use]
pub fn filter_score(filtered: &[u8]) -> u64 {
  filtered.iter().map(|&b| u64::from((b as i8).unsigned_abs())).sum()
}

/// Buffers for trying every filter on a line.
///
/// Reuse one of these across all the lines of an image to avoid allocating a
/// candidate line per filter per row.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveFilter {
  candidates: [Vec<u8>; 5],
}
impl AdaptiveFilter {
  /// Makes buffers sized for lines of `line_len` bytes.
  #[must_use]
  pub fn new(line_len: usize) -> Self {
    Self { candidates: core::array::from_fn(|_| vec![0; line_len]) }
  }

  /// Filters `raw` with every filter type and returns the one with the lowest
  /// [`filter_score`], along with its filtered bytes.
  ///
  /// Ties go to the lower numbered filter type. This is a greedy choice for a
  /// single line, not the best possible choice for the whole image.
  pub fn choose(&mut self, raw: &[u8], prev: &[u8], bpp: usize) -> (FilterType, &[u8]) {
    let mut best = (FilterType::None, u64::MAX);
    for (filter, candidate) in FilterType::ALL.into_iter().zip(self.candidates.iter_mut()) {
      candidate.resize(raw.len(), 0);
      filter.apply(raw, prev, bpp, candidate);
      let score = filter_score(candidate);
      if score < best.1 {
        best = (filter, score);
      }
    }
    let (filter, _) = best;
    (filter, &self.candidates[filter as usize])
  }
}

/// Picks the best filter for one line, see [`AdaptiveFilter::choose`].
#[must_use]
pub fn choose_filter(raw: &[u8], prev: &[u8], bpp: usize) -> (FilterType, Vec<u8>) {
  let mut adaptive = AdaptiveFilter::new(raw.len());
  let (filter, filtered) = adaptive.choose(raw, prev, bpp);
  (filter, filtered.to_vec())
}
