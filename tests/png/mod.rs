use pngsmith::{
  png::{
    chunk_crc, parse_next_chunk, unfilter_scanlines, Chunk, ChunkIter, ChunkName, Compressor,
    FilterType, PixelMatrix, PngColorType, PngImage, Zlib, IHDR,
  },
  PngError,
};
use proptest::prelude::*;
use walkdir::WalkDir;

use super::png_of;

fn tiny_gray_chunks() -> Vec<Chunk> {
  vec![
    IHDR::new(1, 1, 8, PngColorType::Y).to_chunk(),
    Chunk::new(ChunkName::IDAT, Zlib.compress(&[0, 0], 9).unwrap()),
    Chunk::iend(),
  ]
}

#[test]
fn test_ChunkIter_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    if entry.file_type().is_dir() {
      continue;
    }
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in ChunkIter::from_chunk_bytes(&v) {
      //
    }
    let _ = PngImage::decode(&v);
  }
  // even totally random data should never panic the iterator!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    for _ in ChunkIter::from_chunk_bytes(&v) {
      //
    }
    // or the decoder, with or without a real signature in front
    assert!(matches!(PngImage::decode(&v), Err(PngError::BadSignature)));
    let mut signed = png_of(&[]);
    signed.extend_from_slice(&v);
    assert!(PngImage::decode(&signed).is_err());
  }
}

#[test]
fn test_tiny_gray_load_save_load() {
  let dir = tempfile::tempdir().unwrap();
  let input = dir.path().join("in.png");
  let output = dir.path().join("out.png");
  std::fs::write(&input, png_of(&tiny_gray_chunks())).unwrap();

  let (image, report) = PngImage::load(&input).unwrap();
  assert_eq!(image.pixels().to_rows(), vec![vec![vec![0x00_u8]]]);
  assert_eq!(report.dropped.len(), 0);

  let saved = image.save(&output).unwrap();
  assert_eq!(std::fs::metadata(&output).unwrap().len() as usize, saved.file_len);

  let (again, _) = PngImage::load(&output).unwrap();
  assert_eq!(again.pixels(), image.pixels());
  assert_eq!(again.header(), image.header());
}

#[test]
fn test_truncated_idat_is_an_error() {
  let mut bytes = png_of(&tiny_gray_chunks());
  // cut partway into the IDAT data: signature, IHDR, then 8 bytes of IDAT
  // length and name, then 2 bytes of its data
  bytes.truncate(8 + 25 + 8 + 2);
  assert!(matches!(PngImage::decode(&bytes), Err(PngError::TruncatedStream { remaining: 2, .. })));
}

#[test]
fn test_corrupt_chunk_is_an_error() {
  let mut bytes = png_of(&tiny_gray_chunks());
  // a byte of the IHDR width
  bytes[8 + 8 + 2] ^= 0x40;
  assert!(matches!(
    PngImage::decode(&bytes),
    Err(PngError::ChecksumMismatch { name: ChunkName::IHDR, .. })
  ));
}

#[test]
fn test_bad_signature() {
  let mut bytes = png_of(&tiny_gray_chunks());
  bytes[1] = b'Q';
  assert!(matches!(PngImage::decode(&bytes), Err(PngError::BadSignature)));
}

#[test]
fn test_unknown_chunks() {
  let mut chunks = tiny_gray_chunks();
  // not safe to copy, then safe to copy
  chunks.insert(1, Chunk::new(ChunkName(*b"fOOB"), vec![1, 2, 3]));
  chunks.insert(2, Chunk::new(ChunkName(*b"fOOd"), vec![4]));
  let (image, report) = PngImage::decode(&png_of(&chunks)).unwrap();
  assert_eq!(report.dropped, [ChunkName(*b"fOOB")]);
  assert_eq!(image.ancillary_chunks().len(), 1);
  assert_eq!(image.ancillary_chunks()[0].data(), &[4]);
  assert_eq!(image.pixels().to_flat(), &[0]);

  chunks.insert(1, Chunk::new(ChunkName(*b"FOOD"), vec![]));
  assert!(matches!(
    PngImage::decode(&png_of(&chunks)),
    Err(PngError::UnsupportedCriticalChunk(ChunkName([b'F', b'O', b'O', b'D'])))
  ));
}

#[test]
fn test_interlaced_is_rejected() {
  let mut ihdr = IHDR::new(1, 1, 8, PngColorType::Y);
  ihdr.interlace_method = 1;
  let mut chunks = tiny_gray_chunks();
  chunks[0] = ihdr.to_chunk();
  assert!(matches!(PngImage::decode(&png_of(&chunks)), Err(PngError::UnsupportedInterlace(1))));
}

#[test]
fn test_unknown_filter_type_in_file() {
  let mut chunks = tiny_gray_chunks();
  chunks[1] = Chunk::new(ChunkName::IDAT, Zlib.compress(&[7, 0], 9).unwrap());
  assert!(matches!(PngImage::decode(&png_of(&chunks)), Err(PngError::UnknownFilterType(7))));
}

#[test]
fn test_failed_save_writes_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("never.png");
  let (image, _) = PngImage::decode(&png_of(&tiny_gray_chunks())).unwrap();
  let options = pngsmith::png::EncodeOptions { compression_level: 11 };
  assert!(matches!(image.save_with(&output, options, &Zlib), Err(PngError::Compression(_))));
  assert!(!output.exists());
}

#[test]
fn test_load_missing_file() {
  let dir = tempfile::tempdir().unwrap();
  assert!(matches!(PngImage::load(dir.path().join("nope.png")), Err(PngError::Io(_))));
}

#[test]
fn test_transforms_survive_a_round_trip() {
  let matrix = PixelMatrix::from_flat(vec![10, 10, 10, 128, 200, 200, 200, 255], 2, 1, 4).unwrap();
  let mut image = PngImage::from_matrix(matrix, PngColorType::RGBA, 8).unwrap();
  image.invert();
  assert!(image.simplify());
  let (bytes, _) = image.encode().unwrap();
  let (again, _) = PngImage::decode(&bytes).unwrap();
  assert_eq!(again.header().color_type, PngColorType::YA);
  assert_eq!(again.pixels().to_flat(), &[245, 128, 55, 255]);
}

fn color_and_depth() -> impl Strategy<Value = (PngColorType, u8)> {
  prop_oneof![
    Just(PngColorType::Y),
    Just(PngColorType::RGB),
    Just(PngColorType::YA),
    Just(PngColorType::RGBA),
  ]
  .prop_flat_map(|color| (Just(color), prop_oneof![Just(8_u8), Just(16_u8)]))
}

proptest! {
  #[test]
  fn prop_filter_invert_is_exact(
    bpp in 1_usize..=8,
    pixels in 1_usize..16,
    seed in proptest::collection::vec(any::<u8>(), 256),
  ) {
    let len = bpp * pixels;
    let raw = &seed[..len];
    let prev = &seed[128..128 + len];
    for filter in FilterType::ALL {
      let mut line = vec![0; len];
      filter.apply(raw, prev, bpp, &mut line);
      filter.invert(&mut line, prev, bpp);
      prop_assert_eq!(&line[..], raw, "filter {:?}", filter);
    }
  }

  #[test]
  fn prop_chunk_round_trip(
    name in proptest::array::uniform4(any::<u8>()),
    data in proptest::collection::vec(any::<u8>(), 0..300),
  ) {
    let chunk = Chunk::new(ChunkName(name), data.clone());
    prop_assert_eq!(chunk.crc(), chunk_crc(&name, &data));
    let bytes = chunk.to_bytes();
    let (parsed, rest) = parse_next_chunk(&bytes).unwrap();
    prop_assert!(rest.is_empty());
    prop_assert_eq!(parsed, chunk);
  }

  #[test]
  fn prop_image_round_trip(
    (color_type, bit_depth) in color_and_depth(),
    width in 1_u32..12,
    height in 1_u32..12,
    seed in any::<u64>(),
  ) {
    let bpp = color_type.channel_count() * usize::from(bit_depth / 8);
    let len = width as usize * height as usize * bpp;
    // smooth ramps with a little noise, so several filter types get picked
    let flat: Vec<u8> = (0..len as u64)
      .map(|i| (i / 3).wrapping_add(seed.rotate_left(i as u32 % 64) & 3) as u8)
      .collect();
    let matrix = PixelMatrix::from_flat(flat, width, height, bpp).unwrap();
    let image = PngImage::from_matrix(matrix, color_type, bit_depth).unwrap();
    let (bytes, encoded) = image.encode().unwrap();
    let (again, decoded) = PngImage::decode(&bytes).unwrap();
    prop_assert_eq!(&again, &image);
    prop_assert_eq!(encoded.filters, decoded.filters);
  }

  #[test]
  fn prop_unfilter_never_panics(
    data in proptest::collection::vec(any::<u8>(), 0..200),
    scanline_len in 1_usize..20,
    bpp in 1_usize..8,
  ) {
    let _ = unfilter_scanlines(&data, scanline_len, bpp);
  }
}
