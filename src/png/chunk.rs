use core::fmt::{Debug, Display, Write};

use super::*;
use crate::{PngError, PngResult};

/// The largest data length a PNG chunk may declare.
pub const MAX_CHUNK_LEN: usize = (1 << 31) - 1;

/// The bit that carries each property letter of a chunk name.
///
/// In ASCII this is the lowercase bit, but decoders are supposed to test the
/// bit directly rather than ask about letter case.
const PROPERTY_BIT: u8 = 1 << 5;

/// The four byte name of a chunk.
///
/// Names are kept as raw bytes so that the property bits can be tested
/// directly, even when a name isn't valid ASCII.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkName(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkName {
  /// Image header
  pub const IHDR: Self = Self(*b"IHDR");
  /// Palette
  pub const PLTE: Self = Self(*b"PLTE");
  /// Image data
  pub const IDAT: Self = Self(*b"IDAT");
  /// Image end
  pub const IEND: Self = Self(*b"IEND");
  /// Transparency
  pub const tRNS: Self = Self(*b"tRNS");

  /// The chunks this crate knows how to handle itself.
  pub const KNOWN: [Self; 5] = [Self::IHDR, Self::PLTE, Self::IDAT, Self::IEND, Self::tRNS];

  /// If this is one of the [`KNOWN`](Self::KNOWN) chunks.
  #[inline]
  #[must_use]
  pub fn is_known(self) -> bool {
    Self::KNOWN.contains(&self)
  }

  /// Ancillary chunks can be skipped by a decoder, critical ones can't.
  #[inline]
  #[must_use]
  pub const fn is_ancillary(self) -> bool {
    (self.0[0] & PROPERTY_BIT) != 0
  }

  /// Private chunks are not part of the public PNG registry.
  #[inline]
  #[must_use]
  pub const fn is_private(self) -> bool {
    (self.0[1] & PROPERTY_BIT) != 0
  }

  /// Must be unset in every chunk name conforming to the current PNG version.
  #[inline]
  #[must_use]
  pub const fn is_reserved(self) -> bool {
    (self.0[2] & PROPERTY_BIT) != 0
  }

  /// Safe-to-copy chunks may be carried along by an editor that doesn't
  /// understand them.
  #[inline]
  #[must_use]
  pub const fn is_safe_to_copy(self) -> bool {
    (self.0[3] & PROPERTY_BIT) != 0
  }

  /// All four property bits at once.
  #[inline]
  #[must_use]
  pub const fn properties(self) -> ChunkProperties {
    ChunkProperties {
      ancillary: self.is_ancillary(),
      private: self.is_private(),
      reserved: self.is_reserved(),
      safe_to_copy: self.is_safe_to_copy(),
    }
  }
}
impl Debug for ChunkName {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char('\"')?;
    Display::fmt(self, f)?;
    f.write_char('\"')
  }
}
impl Display for ChunkName {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    Ok(())
  }
}
impl From<[u8; 4]> for ChunkName {
  #[inline]
  #[must_use]
  fn from(array: [u8; 4]) -> Self {
    Self(array)
  }
}

/// The properties encoded in the case bits of a [`ChunkName`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct ChunkProperties {
  pub ancillary: bool,
  pub private: bool,
  pub reserved: bool,
  pub safe_to_copy: bool,
}

/// A complete chunk: name, data, and the checksum that goes with them.
///
/// The length is never stored, it's always `data.len()`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
  name: ChunkName,
  data: Vec<u8>,
  crc: u32,
}
impl Debug for Chunk {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Chunk")
      .field("name", &self.name)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("crc", &format_args!("{:#010x}", self.crc))
      .finish()
  }
}
impl Chunk {
  /// Builds a chunk and computes its checksum.
  ///
  /// The data must not be longer than [`MAX_CHUNK_LEN`].
  #[must_use]
  pub fn new(name: ChunkName, data: Vec<u8>) -> Self {
    debug_assert!(data.len() <= MAX_CHUNK_LEN);
    let crc = chunk_crc(&name.0, &data);
    Self { name, data, crc }
  }

  /// Builds a chunk with an already known checksum, which isn't checked.
  #[inline]
  #[must_use]
  pub fn with_crc(name: ChunkName, data: Vec<u8>, crc: u32) -> Self {
    Self { name, data, crc }
  }

  /// The `IEND` chunk: no data, and always the same checksum.
  #[inline]
  #[must_use]
  pub fn iend() -> Self {
    Self::with_crc(ChunkName::IEND, Vec::new(), 0xAE42_6082)
  }

  /// The chunk's name.
  #[inline]
  #[must_use]
  pub const fn name(&self) -> ChunkName {
    self.name
  }

  /// The chunk's data bytes.
  #[inline]
  #[must_use]
  pub fn data(&self) -> &[u8] {
    &self.data
  }

  /// Takes the data bytes out of the chunk.
  #[inline]
  #[must_use]
  pub fn into_data(self) -> Vec<u8> {
    self.data
  }

  /// The checksum as declared (or computed, for chunks built with
  /// [`new`](Self::new)).
  #[inline]
  #[must_use]
  pub const fn crc(&self) -> u32 {
    self.crc
  }

  /// The property bits of the chunk's name.
  #[inline]
  #[must_use]
  pub const fn properties(&self) -> ChunkProperties {
    self.name.properties()
  }

  /// Checks that the stored checksum matches the name and data.
  pub fn verify(&self) -> PngResult<()> {
    let actual = chunk_crc(&self.name.0, &self.data);
    if actual == self.crc {
      Ok(())
    } else {
      Err(PngError::ChecksumMismatch { name: self.name, declared: self.crc, actual })
    }
  }

  /// How many bytes [`write_to`](Self::write_to) appends.
  #[inline]
  #[must_use]
  pub fn encoded_len(&self) -> usize {
    4 + 4 + self.data.len() + 4
  }

  /// Appends the wire form: length, name, data, checksum.
  ///
  /// Nothing is validated here; a chunk built with a wrong checksum is
  /// written with that wrong checksum.
  pub fn write_to(&self, out: &mut Vec<u8>) {
    out.reserve(self.encoded_len());
    out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
    out.extend_from_slice(&self.name.0);
    out.extend_from_slice(&self.data);
    out.extend_from_slice(&self.crc.to_be_bytes());
  }

  /// The wire form as a fresh buffer.
  #[inline]
  #[must_use]
  pub fn to_bytes(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(self.encoded_len());
    self.write_to(&mut out);
    out
  }
}
