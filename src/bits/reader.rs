/*
# Bits Reader Module

 Big-endian integer readers for byte slices. Every on-disk field this crate
 touches (box headers, index tables, KLV headers and payloads) is big-endian.

 Key components:
 - Cursor-style slice reader: `read_u32()` with position tracking
 - Fixed-offset slice readers: `be_u16_at()`, `be_u32_at()`, `be_i16_at()`, `be_i32_at()`, `be_u64_at()`
*/

/// Read a 32-bit big endian value from a byte slice advancing the position.
pub fn read_u32(data: &[u8], pos: &mut usize) -> Option<u32> {
    let v = be_u32_at(data, *pos)?;
    *pos += 4;
    Some(v)
}

fn bytes_at<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    data.get(offset..end)?.try_into().ok()
}

pub fn be_u16_at(data: &[u8], offset: usize) -> Option<u16> {
    bytes_at::<2>(data, offset).map(u16::from_be_bytes)
}

pub fn be_i16_at(data: &[u8], offset: usize) -> Option<i16> {
    bytes_at::<2>(data, offset).map(i16::from_be_bytes)
}

pub fn be_u32_at(data: &[u8], offset: usize) -> Option<u32> {
    bytes_at::<4>(data, offset).map(u32::from_be_bytes)
}

pub fn be_i32_at(data: &[u8], offset: usize) -> Option<i32> {
    bytes_at::<4>(data, offset).map(i32::from_be_bytes)
}

pub fn be_u64_at(data: &[u8], offset: usize) -> Option<u64> {
    bytes_at::<8>(data, offset).map(u64::from_be_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_reader_advances() {
        let data = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xff];
        let mut pos = 2;
        assert_eq!(read_u32(&data, &mut pos), Some(2));
        assert_eq!(pos, 6);
        assert_eq!(read_u32(&data, &mut pos), None);
        assert_eq!(pos, 6);
        assert_eq!(be_u16_at(&data, 0), Some(1));
        assert_eq!(be_u64_at(&data, 0), None);
    }

    #[test]
    fn test_signed_readers() {
        let data = [0xff, 0xff, 0xff, 0xfe];
        assert_eq!(be_i32_at(&data, 0), Some(-2));
        assert_eq!(be_i16_at(&data, 2), Some(-2));
        assert_eq!(be_i16_at(&data, 3), None);
        assert_eq!(be_u32_at(&data, usize::MAX), None);
    }
}
