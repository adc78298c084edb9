use crate::errors::{Mp4Error, Mp4Result};
use crate::mp4::r#box::{read_box_at, walk_boxes, Mp4Box};
use crate::streams::seekable_stream::{read_up_to, SeekableStream};
use log::{debug, info};
use std::io::SeekFrom;

/// Bytes searched for a moov signature at each end of the file (512KB)
const SIGNATURE_SEARCH_LIMIT: u64 = 512 * 1024;
/// Movie boxes beyond this are corrupt size fields
const MAX_MOOV_SIZE: u64 = 256 * 1024 * 1024;

/// Locate the moov box.
///
/// The top-level box walk is tried first. Files with a foreign prefix or a
/// damaged box in front of moov fall back to a signature search over the
/// first and last 512KB.
pub fn find_moov_box<S: SeekableStream>(stream: &mut S) -> Mp4Result<Option<Mp4Box>> {
    let len = stream.stream_len()?;
    if let Some(moov) = walk_boxes(stream, 0, len)?.into_iter().find(|b| b.is(b"moov")) {
        return Ok(Some(moov));
    }

    let head_end = len.min(SIGNATURE_SEARCH_LIMIT);
    let tail_start = len.saturating_sub(SIGNATURE_SEARCH_LIMIT).max(head_end);
    for (start, end) in [(0, head_end), (tail_start, len)] {
        if let Some(moov) = search_signature(stream, start, end, len)? {
            info!("Found moov by signature at offset {}", moov.start);
            return Ok(Some(moov));
        }
    }
    Ok(None)
}

fn search_signature<S: SeekableStream>(
    stream: &mut S,
    start: u64,
    end: u64,
    len: u64,
) -> Mp4Result<Option<Mp4Box>> {
    if end <= start {
        return Ok(None);
    }
    let mut window = vec![0u8; (end - start) as usize];
    stream.seek(SeekFrom::Start(start))?;
    let got = read_up_to(stream, &mut window)?;
    window.truncate(got);

    for i in window.windows(4).enumerate().filter(|(_, w)| *w == b"moov").map(|(i, _)| i) {
        let Some(header_pos) = (start + i as u64).checked_sub(4) else {
            continue;
        };
        match read_box_at(stream, header_pos, len)? {
            Some(b) if b.is(b"moov") && b.data_len() > 0 => return Ok(Some(b)),
            _ => debug!("Rejected moov signature at {}", header_pos),
        }
    }
    Ok(None)
}

/// Find the moov box and read its payload
pub fn read_moov_payload<S: SeekableStream>(stream: &mut S) -> Mp4Result<Option<Vec<u8>>> {
    let Some(moov) = find_moov_box(stream)? else {
        return Ok(None);
    };
    if moov.data_len() > MAX_MOOV_SIZE {
        return Err(Mp4Error::new(format!(
            "moov box of {} bytes exceeds the supported size",
            moov.data_len()
        )));
    }
    let mut payload = vec![0u8; moov.data_len() as usize];
    stream.read_exact_at(moov.data_start(), &mut payload)?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_box;
    use std::io::Cursor;

    #[test]
    fn test_moov_found_by_walk() {
        let data = [
            make_box("ftyp", b"isom"),
            make_box("mdat", &[0; 32]),
            make_box("moov", &make_box("mvhd", &[0; 20])),
        ]
        .concat();
        let moov = find_moov_box(&mut Cursor::new(&data)).unwrap().unwrap();
        assert_eq!(moov.start, 52);
        let payload = read_moov_payload(&mut Cursor::new(&data)).unwrap().unwrap();
        assert_eq!(&payload[4..8], b"mvhd");
    }

    #[test]
    fn test_moov_after_foreign_prefix() {
        let mut data = vec![0xEEu8; 13];
        data.extend_from_slice(&make_box("moov", &make_box("udta", &[1, 2, 3, 4])));
        let moov = find_moov_box(&mut Cursor::new(&data)).unwrap().unwrap();
        assert_eq!(moov.start, 13);
        assert_eq!(moov.data_len(), 12);
    }

    #[test]
    fn test_no_moov() {
        let data = vec![0u8; 4096];
        assert!(find_moov_box(&mut Cursor::new(&data)).unwrap().is_none());
        assert!(read_moov_payload(&mut Cursor::new(&data)).unwrap().is_none());
    }
}
