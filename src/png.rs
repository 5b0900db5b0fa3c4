//! Module for working with PNG data.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! ## Decoding
//!
//! A PNG is an 8 byte signature followed by a series of "chunks". Each chunk
//! is a big-endian length, a four byte name, that many bytes of data, and a
//! CRC-32 over the name and data. [`PngImage::decode`] does this:
//!
//! 1) Checks the signature ([`is_png_header_correct`]).
//! 2) Reads every chunk with a [`ChunkIter`], verifying each checksum. An
//!    unknown *critical* chunk stops the decode. An unknown ancillary chunk
//!    is kept only if it's marked safe-to-copy.
//! 3) Reads the [`IHDR`], which must be the first chunk.
//! 4) Joins all `IDAT` payloads and inflates them with a [`Compressor`].
//! 5) Unfilters the scanlines ([`unfilter_scanlines`]).
//! 6) Assembles the bytes into a [`PixelMatrix`].
//!
//! ## Encoding
//!
//! [`PngImage::encode`] flattens the matrix, picks a filter for each scanline
//! with [`choose_filter`], deflates the result, and writes an `IHDR`, a single
//! `IDAT`, and an `IEND`.
//!
//! ## What's Not Supported
//!
//! * Interlaced images are rejected with
//!   [`UnsupportedInterlace`](crate::PngError::UnsupportedInterlace).
//! * Bit depths below 8. Indexed color is only decoded at bit depth 8, and is
//!   expanded to truecolor through the palette.

mod chunk;
pub use chunk::*;

mod chunk_iter;
pub use chunk_iter::*;

mod compression;
pub use compression::*;

mod crc32;
pub use crc32::*;

mod filter;
pub use filter::*;

mod ihdr;
pub use ihdr::*;

mod image;
pub use image::*;

mod matrix;
pub use matrix::*;

mod palette;
pub(crate) use palette::*;

mod scanlines;
pub use scanlines::*;

mod transform;

/// The 8 bytes every PNG stream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the PNG's initial 8 bytes are correct.
///
/// * If this is the case, the rest of the bytes are very likely PNG data.
/// * If this is *not* the case, the rest of the bytes are very likely *not* PNG
///   data.
#[inline]
#[must_use]
pub const fn is_png_header_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

#[test]
fn test_is_png_header_correct() {
  assert!(is_png_header_correct(&PNG_SIGNATURE));
  assert!(is_png_header_correct(&[137, 80, 78, 71, 13, 10, 26, 10, 0, 0]));
  assert!(!is_png_header_correct(&PNG_SIGNATURE[..7]));
  assert!(!is_png_header_correct(b"GIF89a\0\0"));
}
