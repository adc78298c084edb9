use super::stco::parse_stco_or_co64;
use super::stsc::{parse_stsc, SampleToChunkEntry};
use super::stsz::parse_stsz;
use crate::errors::Mp4Result;
use log::debug;

/// Index tables of one track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleTable {
    pub sample_sizes: Vec<u32>,
    pub chunk_offsets: Vec<u64>,
    pub chunk_runs: Vec<SampleToChunkEntry>,
}

/// Absolute byte range of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub index: usize,
    pub offset: u64,
    pub size: u32,
}

impl SampleTable {
    /// Decode the sample-size, chunk-offset and chunk-run tables of an stbl payload
    pub fn from_stbl(stbl: &[u8]) -> Mp4Result<Self> {
        Ok(SampleTable {
            sample_sizes: parse_stsz(stbl)?,
            chunk_offsets: parse_stco_or_co64(stbl)?,
            chunk_runs: parse_stsc(stbl)?,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.sample_sizes.len()
    }

    /// Map every sample to its byte range, in sample order.
    ///
    /// Runs whose sample totals exceed the size table are clipped: mapping
    /// stops at whichever of chunks or sizes runs out first.
    pub fn sample_ranges(&self) -> Vec<SampleRange> {
        let mut ranges = Vec::with_capacity(self.sample_sizes.len());
        let mut sample_index = 0usize;

        for (chunk_idx, &chunk_offset) in self.chunk_offsets.iter().enumerate() {
            let chunk_num = (chunk_idx + 1) as u32;
            let samples_in_chunk = samples_in_chunk(chunk_num, &self.chunk_runs);

            let mut offset = chunk_offset;
            for _ in 0..samples_in_chunk {
                let Some(&size) = self.sample_sizes.get(sample_index) else {
                    debug!(
                        "Sample sizes exhausted at chunk {} of {}",
                        chunk_num,
                        self.chunk_offsets.len()
                    );
                    return ranges;
                };
                ranges.push(SampleRange {
                    index: sample_index,
                    offset,
                    size,
                });
                sample_index += 1;
                let Some(next) = offset.checked_add(size as u64) else {
                    debug!("Chunk {} runs past the addressable range", chunk_num);
                    break;
                };
                offset = next;
            }
        }

        ranges
    }
}

/// Samples per chunk for a 1-based chunk number: the latest run starting at or before it
pub fn samples_in_chunk(chunk_num: u32, runs: &[SampleToChunkEntry]) -> u32 {
    runs.iter()
        .take_while(|run| run.first_chunk <= chunk_num)
        .last()
        .map(|run| run.samples_per_chunk)
        .unwrap_or(0)
}
