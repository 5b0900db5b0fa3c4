//! The CRC-32 that guards every PNG chunk.
//!
//! This is the ISO 3309 / ITU-T V.42 polynomial (`0xEDB8_8320` reflected),
//! the same one zlib and gzip use.

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c >>= 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

#[inline]
fn update_crc(mut crc: u32, bytes: &[u8]) -> u32 {
  for byte in bytes.iter().copied() {
    let i = (crc ^ u32::from(byte)) as u8 as usize;
    crc = CRC_TABLE[i] ^ (crc >> 8);
  }
  crc
}

/// Computes the PNG CRC-32 of a byte sequence.
#[inline]
#[must_use]
pub fn png_crc(bytes: &[u8]) -> u32 {
  update_crc(u32::MAX, bytes) ^ u32::MAX
}

/// Computes the CRC-32 of `name ‖ data` without joining the two buffers.
#[inline]
#[must_use]
pub fn chunk_crc(name: &[u8; 4], data: &[u8]) -> u32 {
  update_crc(update_crc(u32::MAX, name), data) ^ u32::MAX
}
