//! Record data of a data group.
//!
//! A data group's records live in a single `##DT` block or are split over
//! the fragments of a `##DL` list (optionally behind a `##HL` header list),
//! each fragment plain or `##DZ` compressed. The fragments are joined into
//! one buffer before records are cut out of it.

use super::blocks::{BlockReader, DzBlock};
use super::error::{MdfError, Result};
use crate::constants::{mdf_blocks, zip_types};
use flate2::read::ZlibDecoder;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

const MAX_DEFLATE_RATIO: u64 = 1032;

/// Size of the records belonging to one channel group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSize {
    Fixed(usize),
    /// Variable length signal data, prefixed by a `u32` length
    Variable,
}

/// Where the records of one channel group are found
#[derive(Debug, Clone)]
pub struct RecordLayout {
    pub data_link: u64,
    pub record_id_size: u8,
    pub record_id: u64,
    pub record_size: usize,
    pub cycle_count: u64,
    /// Record sizes of every channel group in the data group, by record id
    pub group_sizes: HashMap<u64, RecordSize>,
}

/// Join all data fragments starting at `link`
pub fn load_data(reader: &BlockReader<'_>, link: u64) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    if link != 0 {
        append_fragment(reader, link, &mut data)?;
    }
    Ok(data)
}

fn append_fragment(reader: &BlockReader<'_>, link: u64, out: &mut Vec<u8>) -> Result<()> {
    let block = reader.raw(
        link,
        &[
            mdf_blocks::DT,
            mdf_blocks::DZ,
            mdf_blocks::DL,
            mdf_blocks::HL,
        ],
    )?;

    match &block.header.id {
        id if id == mdf_blocks::DT => out.extend_from_slice(block.data),
        id if id == mdf_blocks::DZ => inflate(link, &reader.dz(link)?, out)?,
        id if id == mdf_blocks::HL => append_fragment(reader, block.link(0), out)?,
        _ => {
            let lists = reader.walk(link, "DL", |offset| Ok(reader.data_list(offset)?.next))?;
            for list in lists {
                for fragment in reader.data_list(list)?.fragments {
                    if fragment != 0 {
                        append_fragment(reader, fragment, out)?;
                    }
                }
            }
        }
    }

    Ok(())
}

fn inflate(offset: u64, dz: &DzBlock<'_>, out: &mut Vec<u8>) -> Result<()> {
    if &dz.original_type != b"DT" {
        return Err(MdfError::UnsupportedData {
            reason: format!(
                "compressed {} blocks are not supported",
                String::from_utf8_lossy(&dz.original_type)
            ),
        });
    }

    // deflate cannot expand data by more than about 1032:1
    let capacity = dz
        .original_length
        .min(dz.payload.len() as u64 * MAX_DEFLATE_RATIO);
    let mut inflated = Vec::with_capacity(capacity as usize);
    ZlibDecoder::new(dz.payload)
        .read_to_end(&mut inflated)
        .map_err(|source| MdfError::Decompression { offset, source })?;

    if inflated.len() as u64 != dz.original_length {
        return Err(MdfError::Decompression {
            offset,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "expected {} bytes, got {}",
                    dz.original_length,
                    inflated.len()
                ),
            ),
        });
    }

    match dz.zip_type {
        zip_types::DEFLATE => out.extend_from_slice(&inflated),
        zip_types::TRANSPOSE_DEFLATE => {
            out.extend_from_slice(&untranspose(&inflated, dz.zip_parameter as usize))
        }
        other => {
            return Err(MdfError::UnsupportedData {
                reason: format!("compression type {}", other),
            });
        }
    }

    debug!(
        "Inflated data block at {:#x} to {} bytes",
        offset,
        inflated.len()
    );
    Ok(())
}

/// Undo the byte transposition applied before compression
///
/// The first `rows * columns` bytes were stored column by column; any
/// remaining bytes were stored as they are.
fn untranspose(data: &[u8], columns: usize) -> Vec<u8> {
    if columns == 0 {
        return data.to_vec();
    }

    let rows = data.len() / columns;
    let transposed = rows * columns;
    let mut out = vec![0u8; data.len()];

    for column in 0..columns {
        for row in 0..rows {
            out[row * columns + column] = data[column * rows + row];
        }
    }
    out[transposed..].copy_from_slice(&data[transposed..]);
    out
}

/// Cut the records of one channel group out of the joined group data
///
/// Record counts come straight from the file, so they are checked against
/// the data before anything is allocated for them.
pub fn extract_records<'d>(layout: &RecordLayout, data: &'d [u8]) -> Result<Vec<&'d [u8]>> {
    let implausible = || MdfError::ImplausibleRecordCount {
        record_id: layout.record_id,
        cycle_count: layout.cycle_count,
    };
    let cycle_count = usize::try_from(layout.cycle_count).map_err(|_| implausible())?;

    if layout.record_id_size == 0 {
        let needed = (layout.record_size as u64)
            .checked_mul(layout.cycle_count)
            .ok_or_else(implausible)?;
        if (data.len() as u64) < needed {
            return Err(MdfError::Truncated {
                offset: layout.data_link,
                needed,
            });
        }
        if layout.record_size == 0 {
            let mut records = Vec::new();
            records
                .try_reserve_exact(cycle_count)
                .map_err(|_| implausible())?;
            records.resize(cycle_count, &data[..0]);
            return Ok(records);
        }
        return Ok(data
            .chunks_exact(layout.record_size)
            .take(cycle_count)
            .collect());
    }

    let id_size = layout.record_id_size as usize;
    let truncated = |needed: usize| MdfError::Truncated {
        offset: layout.data_link,
        needed: needed as u64,
    };

    let fits = data.len() / (id_size + layout.record_size);
    let mut records = Vec::with_capacity(cycle_count.min(fits));
    let mut pos = 0;
    while pos < data.len() {
        let id_bytes = data.get(pos..pos + id_size).ok_or_else(|| truncated(id_size))?;
        let id = read_record_id(id_bytes);
        pos += id_size;

        let size = match layout.group_sizes.get(&id) {
            Some(RecordSize::Fixed(size)) => *size,
            Some(RecordSize::Variable) => {
                let length = data.get(pos..pos + 4).ok_or_else(|| truncated(4))?;
                pos += 4;
                u32::from_le_bytes([length[0], length[1], length[2], length[3]]) as usize
            }
            None => {
                return Err(MdfError::UnsupportedData {
                    reason: format!("unknown record id {} at data offset {}", id, pos - id_size),
                });
            }
        };

        let record = data.get(pos..pos + size).ok_or_else(|| truncated(size))?;
        pos += size;

        if id == layout.record_id && records.len() < cycle_count {
            records.push(record);
        }
    }

    if records.len() < cycle_count {
        warn!(
            "Channel group with record id {} announces {} records, found {}",
            layout.record_id,
            cycle_count,
            records.len()
        );
    }
    Ok(records)
}

fn read_record_id(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |value, &byte| (value << 8) | u64::from(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_layout(record_size: usize, cycle_count: u64) -> RecordLayout {
        RecordLayout {
            data_link: 0x100,
            record_id_size: 0,
            record_id: 0,
            record_size,
            cycle_count,
            group_sizes: HashMap::new(),
        }
    }

    #[test]
    fn test_sorted_records() {
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let records = extract_records(&sorted_layout(2, 3), &data).unwrap();
        assert_eq!(records, vec![&[1u8, 2][..], &[3u8, 4][..], &[5u8, 6][..]]);
    }

    #[test]
    fn test_sorted_records_truncated() {
        let data = [1u8, 2, 3];
        assert!(matches!(
            extract_records(&sorted_layout(2, 3), &data),
            Err(MdfError::Truncated {
                offset: 0x100,
                needed: 6
            })
        ));
    }

    #[test]
    fn test_empty_records() {
        let records = extract_records(&sorted_layout(0, 2), &[]).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_unsorted_records() {
        let mut group_sizes = HashMap::new();
        group_sizes.insert(1, RecordSize::Fixed(2));
        group_sizes.insert(2, RecordSize::Fixed(1));
        group_sizes.insert(3, RecordSize::Variable);
        let layout = RecordLayout {
            data_link: 0x100,
            record_id_size: 1,
            record_id: 1,
            record_size: 2,
            cycle_count: 2,
            group_sizes,
        };
        let data: [u8; 15] = [
            1, 10, 11, // group 1
            2, 99, // group 2
            3, 2, 0, 0, 0, b'o', b'k', // variable length
            1, 12, 13, // group 1
        ];

        let records = extract_records(&layout, &data).unwrap();
        assert_eq!(records, vec![&[10u8, 11][..], &[12u8, 13][..]]);
    }

    #[test]
    fn test_unknown_record_id() {
        let mut layout = sorted_layout(1, 1);
        layout.record_id_size = 1;
        assert!(matches!(
            extract_records(&layout, &[9, 0]),
            Err(MdfError::UnsupportedData { .. })
        ));
    }

    #[test]
    fn test_record_counts_beyond_the_data() {
        let data = [1u8, 2, 3, 4];

        match extract_records(&sorted_layout(0, u64::MAX), &data) {
            Err(MdfError::ImplausibleRecordCount { cycle_count, .. }) => {
                assert_eq!(cycle_count, u64::MAX)
            }
            other => panic!("Expected ImplausibleRecordCount, got {:?}", other),
        }

        assert!(matches!(
            extract_records(&sorted_layout(1 << 33, 1 << 40), &data),
            Err(MdfError::ImplausibleRecordCount { .. })
        ));

        assert!(matches!(
            extract_records(&sorted_layout(2, u64::MAX / 4), &data),
            Err(MdfError::Truncated { .. })
        ));
    }

    #[test]
    fn test_unsorted_capacity_follows_the_data() {
        let mut group_sizes = HashMap::new();
        group_sizes.insert(1, RecordSize::Fixed(1));
        let layout = RecordLayout {
            data_link: 0x100,
            record_id_size: 1,
            record_id: 1,
            record_size: 1,
            cycle_count: u64::from(u32::MAX),
            group_sizes,
        };

        let records = extract_records(&layout, &[1, 7, 1, 8]).unwrap();
        assert_eq!(records, vec![&[7u8][..], &[8u8][..]]);
    }

    #[test]
    fn test_untranspose() {
        // two records of three bytes: [1 2 3] [4 5 6], plus one trailing byte
        let stored = [1u8, 4, 2, 5, 3, 6, 7];
        assert_eq!(untranspose(&stored, 3), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_record_id_is_little_endian() {
        assert_eq!(read_record_id(&[0x01, 0x02]), 0x0201);
    }
}
