//! Sample inputs shared by unit and integration tests.

/// Minimal JPEG whose only segment is an EXIF block carrying `DateTimeOriginal`.
///
/// `value` is written verbatim, so malformed dates can be embedded too.
#[must_use]
pub fn jpeg_with_datetime(value: &[u8; 19]) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2a\x00");
    tiff.extend_from_slice(&8_u32.to_le_bytes());
    // IFD0: pointer to the EXIF sub-IFD at offset 26.
    tiff.extend_from_slice(&1_u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769_u16.to_le_bytes());
    tiff.extend_from_slice(&4_u16.to_le_bytes());
    tiff.extend_from_slice(&1_u32.to_le_bytes());
    tiff.extend_from_slice(&26_u32.to_le_bytes());
    tiff.extend_from_slice(&0_u32.to_le_bytes());
    // EXIF IFD: DateTimeOriginal, ASCII, 20 bytes at offset 44.
    tiff.extend_from_slice(&1_u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003_u16.to_le_bytes());
    tiff.extend_from_slice(&2_u16.to_le_bytes());
    tiff.extend_from_slice(&20_u32.to_le_bytes());
    tiff.extend_from_slice(&44_u32.to_le_bytes());
    tiff.extend_from_slice(&0_u32.to_le_bytes());
    tiff.extend_from_slice(value);
    tiff.push(0);

    let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap_or(u16::MAX);
    let mut jpeg = vec![0xff, 0xd8, 0xff, 0xe1];
    jpeg.extend_from_slice(&segment_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xff, 0xd9]);
    jpeg
}
