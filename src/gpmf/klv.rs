/*
# KLV Tree Parser

 Decodes the camera's metadata payload: a forest of key-length-value elements.
 Each element has an 8-byte header

   [key: 4 ASCII bytes][type: u8][struct size: u8][repeat: u16 BE]

 followed by `struct size * repeat` payload bytes, padded to a multiple of 4.
 Type 0 marks a container whose payload is itself a forest.
*/

use crate::bits::reader::be_u16_at;

pub const KLV_HEADER_SIZE: usize = 8;
/// Nesting limit; real streams nest DEVC > STRM > leaf
const MAX_DEPTH: usize = 16;

pub const DEVC: [u8; 4] = *b"DEVC";
pub const STRM: [u8; 4] = *b"STRM";
pub const SCAL: [u8; 4] = *b"SCAL";
pub const GPS5: [u8; 4] = *b"GPS5";
pub const GPS9: [u8; 4] = *b"GPS9";
pub const GPSP: [u8; 4] = *b"GPSP";

/// Decoded 8-byte element header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KlvHeader {
    pub key: [u8; 4],
    pub type_code: u8,
    pub struct_size: u8,
    pub repeat: u16,
}

impl KlvHeader {
    /// Parse the header at `pos`, if 8 bytes are available
    pub fn parse(data: &[u8], pos: usize) -> Option<Self> {
        let raw = data.get(pos..pos.checked_add(KLV_HEADER_SIZE)?)?;
        Some(KlvHeader {
            key: [raw[0], raw[1], raw[2], raw[3]],
            type_code: raw[4],
            struct_size: raw[5],
            repeat: be_u16_at(raw, 6)?,
        })
    }

    pub fn data_size(&self) -> usize {
        self.struct_size as usize * self.repeat as usize
    }

    pub fn padded_size(&self) -> usize {
        padded_len(self.data_size())
    }

    pub fn is_container(&self) -> bool {
        self.type_code == 0
    }

    /// Keys are four printable 7-bit ASCII characters
    pub fn has_valid_key(&self) -> bool {
        self.key.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
    }
}

/// Round `len` up to the next multiple of 4
pub fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Element payload: raw bytes or nested elements
#[derive(Debug, Clone, PartialEq)]
pub enum KlvBody<'a> {
    Leaf(&'a [u8]),
    Container(Vec<KlvElement<'a>>),
}

/// One decoded element; `offset` is the header position in the parsed buffer
#[derive(Debug, Clone, PartialEq)]
pub struct KlvElement<'a> {
    pub header: KlvHeader,
    pub offset: usize,
    pub body: KlvBody<'a>,
}

impl<'a> KlvElement<'a> {
    pub fn key(&self) -> &[u8; 4] {
        &self.header.key
    }

    pub fn children(&self) -> &[KlvElement<'a>] {
        match &self.body {
            KlvBody::Container(children) => children,
            KlvBody::Leaf(_) => &[],
        }
    }

    pub fn payload(&self) -> Option<&'a [u8]> {
        match self.body {
            KlvBody::Leaf(data) => Some(data),
            KlvBody::Container(_) => None,
        }
    }

    /// First direct child leaf with `key`
    pub fn child_leaf(&self, key: &[u8; 4]) -> Option<&KlvElement<'a>> {
        self.children()
            .iter()
            .find(|c| c.key() == key && c.payload().is_some())
    }

    /// Offset just past this element, padding included
    pub fn end(&self) -> usize {
        self.offset + KLV_HEADER_SIZE + self.header.padded_size()
    }
}

/// Parse a whole buffer into a forest
pub fn parse_klv(data: &[u8]) -> Vec<KlvElement<'_>> {
    parse_range(data, 0, data.len())
}

/// Parse the forest in `data[start..end]`. Offsets stay relative to `data`.
pub fn parse_range(data: &[u8], start: usize, end: usize) -> Vec<KlvElement<'_>> {
    parse_level(data, start, end.min(data.len()), 0)
}

fn parse_level(data: &[u8], start: usize, end: usize, depth: usize) -> Vec<KlvElement<'_>> {
    let mut elements = Vec::new();
    let mut pos = start;

    while end.saturating_sub(pos) >= KLV_HEADER_SIZE {
        let Some(header) = KlvHeader::parse(data, pos) else {
            break;
        };
        if !header.has_valid_key() {
            break;
        }

        let data_start = pos + KLV_HEADER_SIZE;
        let data_end = data_start + header.data_size();
        let truncated = data_end > end;
        let data_end = data_end.min(end);

        let body = if header.is_container() && header.data_size() > 0 && depth < MAX_DEPTH {
            KlvBody::Container(parse_level(data, data_start, data_end, depth + 1))
        } else {
            KlvBody::Leaf(&data[data_start..data_end])
        };
        elements.push(KlvElement {
            header,
            offset: pos,
            body,
        });

        if truncated {
            log::debug!(
                "KLV '{}' at {} overruns its range",
                String::from_utf8_lossy(&header.key),
                pos
            );
            break;
        }
        pos = data_start + header.padded_size();
    }

    elements
}

/// Every container tagged `key`, at any depth, in document order
pub fn find_containers<'e, 'a>(forest: &'e [KlvElement<'a>], key: &[u8; 4]) -> Vec<&'e KlvElement<'a>> {
    let mut found = Vec::new();
    collect_containers(forest, key, &mut found);
    found
}

fn collect_containers<'e, 'a>(
    forest: &'e [KlvElement<'a>],
    key: &[u8; 4],
    found: &mut Vec<&'e KlvElement<'a>>,
) {
    for element in forest {
        if let KlvBody::Container(children) = &element.body {
            if element.key() == key {
                found.push(element);
            }
            collect_containers(children, key, found);
        }
    }
}
