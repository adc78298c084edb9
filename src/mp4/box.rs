use crate::bits::reader::{be_u32_at, be_u64_at};
use crate::errors::Mp4Result;
use crate::streams::seekable_stream::{read_up_to, SeekableStream};
use log::debug;
use std::io::SeekFrom;

/// Smallest possible box header (32-bit size + type)
pub const BOX_HEADER_SIZE: u64 = 8;
/// Header size when the 64-bit extended size is present
pub const EXTENDED_BOX_HEADER_SIZE: u64 = 16;

/// A box located inside a byte range, with absolute offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp4Box {
    pub box_type: [u8; 4],
    pub start: u64,
    pub size: u64,
    pub header_size: u64,
}

impl Mp4Box {
    pub fn data_start(&self) -> u64 {
        self.start + self.header_size
    }

    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    pub fn data_len(&self) -> u64 {
        self.size - self.header_size
    }

    pub fn is(&self, tag: &[u8; 4]) -> bool {
        &self.box_type == tag
    }
}

/// Decode one header from `header` (8 or 16 available bytes) for a box
/// starting at `start` inside a range ending at `end`.
fn decode_header(header: &[u8], start: u64, end: u64) -> Option<Mp4Box> {
    let size32 = be_u32_at(header, 0)?;
    let box_type: [u8; 4] = header.get(4..8)?.try_into().ok()?;
    let (size, header_size) = match size32 {
        0 => (end - start, BOX_HEADER_SIZE),
        1 => (be_u64_at(header, 8)?, EXTENDED_BOX_HEADER_SIZE),
        n => (n as u64, BOX_HEADER_SIZE),
    };
    if size < header_size {
        debug!(
            "Box '{}' at {} declares size {} below its header, stopping walk",
            String::from_utf8_lossy(&box_type),
            start,
            size
        );
        return None;
    }
    let available = end - start;
    if available < header_size {
        return None;
    }
    let size = if size > available {
        debug!(
            "Box '{}' at {} overruns its range by {} bytes, clipping",
            String::from_utf8_lossy(&box_type),
            start,
            size - available
        );
        available
    } else {
        size
    };
    Some(Mp4Box {
        box_type,
        start,
        size,
        header_size,
    })
}

/// Walk the boxes whose headers fall inside `[start, end)` of a seekable source.
///
/// A declared size of 0 extends the box to `end`; a declared size of 1 reads the
/// 64-bit size that follows. Unknown tags are returned as-is. The walk stops
/// quietly when fewer than 8 bytes remain or a header is malformed.
pub fn walk_boxes<S: SeekableStream>(stream: &mut S, start: u64, end: u64) -> Mp4Result<Vec<Mp4Box>> {
    let mut boxes = Vec::new();
    let mut pos = start;
    while let Some(b) = read_box_at(stream, pos, end)? {
        pos = b.end();
        boxes.push(b);
    }
    Ok(boxes)
}

/// Decode the box header at `pos`, for a box that must end by `end`
pub fn read_box_at<S: SeekableStream>(stream: &mut S, pos: u64, end: u64) -> Mp4Result<Option<Mp4Box>> {
    if end.saturating_sub(pos) < BOX_HEADER_SIZE {
        return Ok(None);
    }
    let mut header = [0u8; 16];
    let want = (end - pos).min(EXTENDED_BOX_HEADER_SIZE) as usize;
    stream.seek(SeekFrom::Start(pos))?;
    let got = read_up_to(stream, &mut header[..want])?;
    if got < BOX_HEADER_SIZE as usize {
        return Ok(None);
    }
    Ok(decode_header(&header[..got], pos, end))
}

/// Walk the boxes of an in-memory buffer. Offsets are relative to `data`.
pub fn walk_slice(data: &[u8]) -> Vec<Mp4Box> {
    let end = data.len() as u64;
    let mut boxes = Vec::new();
    let mut pos = 0u64;
    while end - pos >= BOX_HEADER_SIZE {
        let header_end = (pos + EXTENDED_BOX_HEADER_SIZE).min(end) as usize;
        let Some(b) = decode_header(&data[pos as usize..header_end], pos, end) else {
            break;
        };
        pos = b.end();
        boxes.push(b);
    }
    boxes
}

/// Write a box header to a vector
pub fn write_box_header(output: &mut Vec<u8>, name: &str, size: u32) {
    output.extend_from_slice(&size.to_be_bytes());
    output.extend_from_slice(name.as_bytes());
}

/// Find a box and return the contained slice
pub fn find_box<'a>(data: &'a [u8], name: &str) -> Option<&'a [u8]> {
    walk_slice(data)
        .into_iter()
        .find(|b| b.box_type == name.as_bytes())
        .map(|b| &data[b.data_start() as usize..b.end() as usize])
}

/// All payload slices of boxes called `name`, in order
pub fn find_all_boxes<'a>(data: &'a [u8], name: &str) -> Vec<&'a [u8]> {
    walk_slice(data)
        .into_iter()
        .filter(|b| b.box_type == name.as_bytes())
        .map(|b| &data[b.data_start() as usize..b.end() as usize])
        .collect()
}

/// Follow a path of nested boxes (e.g. `["mdia", "minf", "stbl"]`)
pub fn find_box_path<'a>(data: &'a [u8], path: &[&str]) -> Option<&'a [u8]> {
    path.iter().try_fold(data, |current, name| find_box(current, name))
}
