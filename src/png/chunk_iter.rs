use tracing::{debug, warn};

use super::*;
use crate::{PngError, PngResult};

/// Splits the next chunk off the front of `bytes`.
///
/// The checksum is verified before the chunk is returned. On success you get
/// the chunk and the bytes that follow it.
pub fn parse_next_chunk(bytes: &[u8]) -> PngResult<(Chunk, &[u8])> {
  let (len_bytes, rest) = split_array::<4>(bytes)?;
  let (name_bytes, rest) = split_array::<4>(rest)?;
  let chunk_len = u32::from_be_bytes(len_bytes) as usize;
  if rest.len() < chunk_len {
    return Err(PngError::TruncatedStream { needed: chunk_len, remaining: rest.len() });
  }
  let (data, rest) = rest.split_at(chunk_len);
  let (crc_bytes, rest) = split_array::<4>(rest)?;
  let chunk = Chunk::with_crc(ChunkName(name_bytes), data.to_vec(), u32::from_be_bytes(crc_bytes));
  chunk.verify()?;
  Ok((chunk, rest))
}

#[inline]
fn split_array<const N: usize>(bytes: &[u8]) -> PngResult<([u8; N], &[u8])> {
  match bytes.split_first_chunk::<N>() {
    Some((head, tail)) => Ok((*head, tail)),
    None => Err(PngError::TruncatedStream { needed: N, remaining: bytes.len() }),
  }
}

/// An iterator that produces successive checksum-verified chunks.
///
/// After the first error the iterator is finished. A stream that ends
/// exactly on a chunk boundary just ends.
#[derive(Debug, Clone)]
pub struct ChunkIter<'b> {
  spare: &'b [u8],
}
impl<'b> ChunkIter<'b> {
  /// Pass the full PNG bytes, the signature is checked and skipped.
  pub fn from_png_bytes(bytes: &'b [u8]) -> PngResult<Self> {
    if is_png_header_correct(bytes) {
      Ok(Self { spare: &bytes[PNG_SIGNATURE.len()..] })
    } else {
      Err(PngError::BadSignature)
    }
  }

  /// Iterates over bare chunks, with no signature in front.
  #[inline]
  #[must_use]
  pub const fn from_chunk_bytes(spare: &'b [u8]) -> Self {
    Self { spare }
  }
}
impl Iterator for ChunkIter<'_> {
  type Item = PngResult<Chunk>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.spare.is_empty() {
      return None;
    }
    match parse_next_chunk(self.spare) {
      Ok((chunk, rest)) => {
        self.spare = rest;
        Some(Ok(chunk))
      }
      Err(e) => {
        self.spare = &[];
        Some(Err(e))
      }
    }
  }
}
impl core::iter::FusedIterator for ChunkIter<'_> {}

/// The chunks that survived [`read_chunks`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkList {
  /// Kept chunks, in stream order.
  pub chunks: Vec<Chunk>,
  /// Names of ancillary chunks that were not safe to copy, in stream order.
  pub dropped: Vec<ChunkName>,
}

/// What to do with a chunk that passed its checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkDisposition {
  /// Known, or safe to copy.
  Keep,
  /// Unknown ancillary chunk that isn't safe to copy.
  Drop,
}

/// Decides if a chunk is kept or dropped.
///
/// ## Failure
/// * An unknown critical chunk means the image can't be reliably decoded,
///   so it's [`UnsupportedCriticalChunk`](PngError::UnsupportedCriticalChunk).
pub fn chunk_disposition(name: ChunkName) -> PngResult<ChunkDisposition> {
  if name.is_known() {
    Ok(ChunkDisposition::Keep)
  } else if !name.is_ancillary() {
    Err(PngError::UnsupportedCriticalChunk(name))
  } else if name.is_safe_to_copy() {
    Ok(ChunkDisposition::Keep)
  } else {
    Ok(ChunkDisposition::Drop)
  }
}

/// Checks the signature and reads every chunk in the PNG bytes.
///
/// Any checksum failure, truncation, or unknown critical chunk fails the
/// whole read.
pub fn read_chunks(bytes: &[u8]) -> PngResult<ChunkList> {
  let mut list = ChunkList::default();
  for chunk in ChunkIter::from_png_bytes(bytes)? {
    let chunk = chunk?;
    match chunk_disposition(chunk.name())? {
      ChunkDisposition::Keep => {
        debug!(name = %chunk.name(), len = chunk.data().len(), "chunk read");
        list.chunks.push(chunk);
      }
      ChunkDisposition::Drop => {
        warn!(name = %chunk.name(), "unrecognized, unsafe-to-copy chunk discarded");
        list.dropped.push(chunk.name());
      }
    }
  }
  Ok(list)
}
