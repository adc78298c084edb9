use super::r#box::find_box;
use crate::bits::reader::be_u32_at;
use crate::errors::{Mp4Error, Mp4Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SampleToChunkEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

/// Parse stsc (sample to chunk) box
pub fn parse_stsc(stbl: &[u8]) -> Mp4Result<Vec<SampleToChunkEntry>> {
    let stsc = find_box(stbl, "stsc").ok_or(Mp4Error::MissingBox {
        name: "stsc",
        parent: "stbl",
    })?;

    if stsc.len() < 8 {
        return Err(Mp4Error::Truncated {
            name: "stsc",
            expected: 8,
            actual: stsc.len(),
        });
    }

    let entry_count = be_u32_at(stsc, 4).unwrap_or(0) as usize;
    let required_size = 8 + entry_count * 12;
    if required_size > stsc.len() {
        return Err(Mp4Error::Truncated {
            name: "stsc",
            expected: required_size,
            actual: stsc.len(),
        });
    }

    let mut entries: Vec<SampleToChunkEntry> = (0..entry_count)
        .filter_map(|i| {
            let pos = 8 + i * 12;
            Some(SampleToChunkEntry {
                first_chunk: be_u32_at(stsc, pos)?,
                samples_per_chunk: be_u32_at(stsc, pos + 4)?,
                sample_description_index: be_u32_at(stsc, pos + 8)?,
            })
        })
        .collect();

    // Runs are keyed by first chunk; writers that emit them out of order still
    // describe a partition once sorted.
    entries.sort_by_key(|e| e.first_chunk);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::r#box::write_box_header;

    fn stsc_box(runs: &[(u32, u32)]) -> Vec<u8> {
        let mut payload = vec![0u8; 4];
        payload.extend_from_slice(&(runs.len() as u32).to_be_bytes());
        for (first, per) in runs {
            payload.extend_from_slice(&first.to_be_bytes());
            payload.extend_from_slice(&per.to_be_bytes());
            payload.extend_from_slice(&1u32.to_be_bytes());
        }
        let mut out = Vec::new();
        write_box_header(&mut out, "stsc", (payload.len() + 8) as u32);
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn test_parse_runs_sorted() {
        let entries = parse_stsc(&stsc_box(&[(3, 1), (1, 2)])).unwrap();
        assert_eq!(entries[0].first_chunk, 1);
        assert_eq!(entries[0].samples_per_chunk, 2);
        assert_eq!(entries[1].first_chunk, 3);
        assert_eq!(entries[1].sample_description_index, 1);
    }

    #[test]
    fn test_truncated_table() {
        let mut data = stsc_box(&[(1, 2)]);
        // Claim two entries while holding one
        data[15] = 2;
        assert!(matches!(
            parse_stsc(&data),
            Err(Mp4Error::Truncated { name: "stsc", .. })
        ));
    }
}
