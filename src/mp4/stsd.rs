use crate::bits::reader::be_u32_at;

/// Sample-entry tags (codec fourCCs) listed in an stsd payload
pub fn sample_entry_tags(stsd: &[u8]) -> Vec<[u8; 4]> {
    let Some(entry_count) = be_u32_at(stsd, 4) else {
        return Vec::new();
    };

    // Skip version/flags (4 bytes) and entry count (4 bytes)
    let mut pos = 8usize;
    let mut tags = Vec::new();
    for _ in 0..entry_count {
        let Some(entry_size) = be_u32_at(stsd, pos) else {
            break;
        };
        let Some(tag) = stsd.get(pos + 4..pos + 8) else {
            break;
        };
        tags.push([tag[0], tag[1], tag[2], tag[3]]);
        if entry_size < 8 {
            break;
        }
        pos += entry_size as usize;
    }
    tags
}

