use super::r#box::find_box;
use crate::bits::reader::{be_u32_at, be_u64_at};
use crate::errors::{Mp4Error, Mp4Result};

/// Parse stco (32-bit chunk offset) or co64 (64-bit chunk offset) box
pub fn parse_stco_or_co64(stbl: &[u8]) -> Mp4Result<Vec<u64>> {
    if let Some(stco) = find_box(stbl, "stco") {
        return read_offsets(stco, "stco", 4);
    }
    if let Some(co64) = find_box(stbl, "co64") {
        return read_offsets(co64, "co64", 8);
    }
    Err(Mp4Error::new(
        "No chunk offset box found: missing both stco and co64",
    ))
}

fn read_offsets(table: &[u8], name: &'static str, width: usize) -> Mp4Result<Vec<u64>> {
    if table.len() < 8 {
        return Err(Mp4Error::Truncated {
            name,
            expected: 8,
            actual: table.len(),
        });
    }
    let entry_count = be_u32_at(table, 4).unwrap_or(0) as usize;
    let present = (table.len() - 8) / width;
    Ok((0..entry_count.min(present))
        .filter_map(|i| {
            let pos = 8 + i * width;
            if width == 8 {
                be_u64_at(table, pos)
            } else {
                be_u32_at(table, pos).map(u64::from)
            }
        })
        .collect())
}
