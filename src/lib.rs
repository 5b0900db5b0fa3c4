#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! A crate for decoding and re-encoding PNG images.
//!
//! The whole round trip lives in the [`png`] module:
//!
//! * The file is split into checksummed chunks.
//! * The `IDAT` payloads are joined and inflated.
//! * Each scanline is unfiltered against the line above it.
//! * The bytes are assembled into a [`PixelMatrix`](png::PixelMatrix).
//!
//! Saving runs the same steps backwards, picking a filter for every scanline
//! adaptively before compressing.
//!
//! ```no_run
//! use pngsmith::png::PngImage;
//! # fn main() -> pngsmith::PngResult<()> {
//! let (mut image, _report) = PngImage::load("in.png")?;
//! image.invert();
//! image.save("out.png")?;
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

pub mod png;
