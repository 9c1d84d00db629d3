//! MDF 4 block parsing.
//!
//! Every block starts with a 24 byte header: a four character id such as
//! `##DG`, four reserved bytes, the block length and the number of links.
//! The links follow as little-endian `u64` file offsets (0 means "no
//! block"), then the block-specific data section.

use super::error::{MdfError, Result};
use crate::constants::mdf_blocks::{self, BLOCK_HEADER_SIZE};
use std::collections::HashSet;
use winnow::Parser;
use winnow::binary::{le_f64, le_u8, le_u16, le_u32, le_u64};
use winnow::error::ContextError;
use winnow::token::take;

type PResult<T> = std::result::Result<T, ContextError>;

fn u8_le(input: &mut &[u8]) -> PResult<u8> {
    le_u8.parse_next(input)
}

fn u16_le(input: &mut &[u8]) -> PResult<u16> {
    le_u16.parse_next(input)
}

fn u32_le(input: &mut &[u8]) -> PResult<u32> {
    le_u32.parse_next(input)
}

fn u64_le(input: &mut &[u8]) -> PResult<u64> {
    le_u64.parse_next(input)
}

fn f64_le(input: &mut &[u8]) -> PResult<f64> {
    le_f64.parse_next(input)
}

fn bytes<'i>(input: &mut &'i [u8], count: usize) -> PResult<&'i [u8]> {
    take(count).parse_next(input)
}

fn skip(input: &mut &[u8], count: usize) -> PResult<()> {
    take(count).void().parse_next(input)
}

/// Common block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub id: [u8; 4],
    pub length: u64,
    pub link_count: u64,
}

fn block_header(input: &mut &[u8]) -> PResult<BlockHeader> {
    let id_bytes = bytes(input, 4)?;
    skip(input, 4)?;
    let length = u64_le(input)?;
    let link_count = u64_le(input)?;

    let mut id = [0u8; 4];
    id.copy_from_slice(id_bytes);
    Ok(BlockHeader {
        id,
        length,
        link_count,
    })
}

/// A block split into its links and data section
#[derive(Debug, Clone)]
pub struct RawBlock<'a> {
    pub offset: u64,
    pub header: BlockHeader,
    pub links: Vec<u64>,
    pub data: &'a [u8],
}

impl RawBlock<'_> {
    /// Link at `index`, or 0 when the block has fewer links
    pub fn link(&self, index: usize) -> u64 {
        self.links.get(index).copied().unwrap_or(0)
    }

    pub fn id_str(&self) -> String {
        String::from_utf8_lossy(&self.header.id).into_owned()
    }

    fn malformed(&self) -> MdfError {
        MdfError::Parse {
            block: self.id_str(),
            offset: self.offset,
        }
    }
}

/// File header (`##HD`)
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    pub first_data_group: u64,
}

/// Data group (`##DG`)
#[derive(Debug, Clone)]
pub struct DataGroupBlock {
    pub next: u64,
    pub first_channel_group: u64,
    pub data: u64,
    pub record_id_size: u8,
}

/// Channel group (`##CG`)
#[derive(Debug, Clone)]
pub struct ChannelGroupBlock {
    pub next: u64,
    pub first_channel: u64,
    pub record_id: u64,
    pub cycle_count: u64,
    pub flags: u16,
    pub data_bytes: u32,
    pub invalidation_bytes: u32,
}

impl ChannelGroupBlock {
    /// Variable length signal data group
    pub fn is_vlsd(&self) -> bool {
        self.flags & 0x1 != 0
    }

    pub fn record_size(&self) -> usize {
        self.data_bytes as usize + self.invalidation_bytes as usize
    }
}

/// Channel (`##CN`)
#[derive(Debug, Clone)]
pub struct ChannelBlock {
    pub next: u64,
    pub name: u64,
    pub conversion: u64,
    pub unit: u64,
    pub channel_type: u8,
    pub data_type: u8,
    pub bit_offset: u8,
    pub byte_offset: u32,
    pub bit_count: u32,
}

/// Channel conversion (`##CC`)
#[derive(Debug, Clone)]
pub struct ConversionBlock {
    pub unit: u64,
    pub conversion_type: u8,
    pub values: Vec<f64>,
}

/// Data list (`##DL`)
#[derive(Debug, Clone)]
pub struct DataListBlock {
    pub next: u64,
    pub fragments: Vec<u64>,
}

/// Compressed data (`##DZ`)
#[derive(Debug, Clone)]
pub struct DzBlock<'a> {
    pub original_type: [u8; 2],
    pub zip_type: u8,
    pub zip_parameter: u32,
    pub original_length: u64,
    pub payload: &'a [u8],
}

/// Reads blocks out of the bytes of a whole file
#[derive(Debug, Clone, Copy)]
pub struct BlockReader<'a> {
    bytes: &'a [u8],
}

impl<'a> BlockReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Read the block at `offset` and check its id is one of `expected`
    pub fn raw(&self, offset: u64, expected: &[&[u8; 4]]) -> Result<RawBlock<'a>> {
        let start = usize::try_from(offset).map_err(|_| MdfError::InvalidLink { offset })?;
        if offset == 0 || start >= self.bytes.len() {
            return Err(MdfError::InvalidLink { offset });
        }

        let mut input = &self.bytes[start..];
        let header = block_header(&mut input).map_err(|_| MdfError::Truncated {
            offset,
            needed: BLOCK_HEADER_SIZE as u64,
        })?;

        if !expected.iter().any(|id| **id == header.id) {
            return Err(MdfError::UnexpectedBlock {
                offset,
                expected: expected
                    .iter()
                    .map(|id| String::from_utf8_lossy(&id[..]).into_owned())
                    .collect::<Vec<_>>()
                    .join(" or "),
                found: String::from_utf8_lossy(&header.id).into_owned(),
            });
        }

        let available = (self.bytes.len() - start) as u64;
        let links_size = header.link_count.saturating_mul(8);
        if header.length > available
            || links_size.saturating_add(BLOCK_HEADER_SIZE as u64) > header.length
        {
            return Err(MdfError::Truncated {
                offset,
                needed: header.length.max(links_size),
            });
        }

        let body = &self.bytes[start + BLOCK_HEADER_SIZE..start + header.length as usize];
        let mut input = body;
        let mut links = Vec::with_capacity(header.link_count as usize);
        for _ in 0..header.link_count {
            links.push(u64_le(&mut input).map_err(|_| MdfError::Parse {
                block: String::from_utf8_lossy(&header.id).into_owned(),
                offset,
            })?);
        }

        Ok(RawBlock {
            offset,
            header,
            links,
            data: input,
        })
    }

    pub fn header(&self, offset: u64) -> Result<HeaderBlock> {
        let block = self.raw(offset, &[mdf_blocks::HD])?;
        Ok(HeaderBlock {
            first_data_group: block.link(0),
        })
    }

    pub fn data_group(&self, offset: u64) -> Result<DataGroupBlock> {
        let block = self.raw(offset, &[mdf_blocks::DG])?;
        let mut input = block.data;
        let record_id_size = u8_le(&mut input).map_err(|_| block.malformed())?;

        Ok(DataGroupBlock {
            next: block.link(0),
            first_channel_group: block.link(1),
            data: block.link(2),
            record_id_size,
        })
    }

    pub fn channel_group(&self, offset: u64) -> Result<ChannelGroupBlock> {
        let block = self.raw(offset, &[mdf_blocks::CG])?;
        let mut input = block.data;
        let parsed = (|| -> PResult<_> {
            let record_id = u64_le(&mut input)?;
            let cycle_count = u64_le(&mut input)?;
            let flags = u16_le(&mut input)?;
            skip(&mut input, 6)?;
            let data_bytes = u32_le(&mut input)?;
            let invalidation_bytes = u32_le(&mut input)?;
            Ok((record_id, cycle_count, flags, data_bytes, invalidation_bytes))
        })();
        let (record_id, cycle_count, flags, data_bytes, invalidation_bytes) =
            parsed.map_err(|_| block.malformed())?;

        Ok(ChannelGroupBlock {
            next: block.link(0),
            first_channel: block.link(1),
            record_id,
            cycle_count,
            flags,
            data_bytes,
            invalidation_bytes,
        })
    }

    pub fn channel(&self, offset: u64) -> Result<ChannelBlock> {
        let block = self.raw(offset, &[mdf_blocks::CN])?;
        let mut input = block.data;
        let parsed = (|| -> PResult<_> {
            let channel_type = u8_le(&mut input)?;
            let _sync_type = u8_le(&mut input)?;
            let data_type = u8_le(&mut input)?;
            let bit_offset = u8_le(&mut input)?;
            let byte_offset = u32_le(&mut input)?;
            let bit_count = u32_le(&mut input)?;
            Ok((channel_type, data_type, bit_offset, byte_offset, bit_count))
        })();
        let (channel_type, data_type, bit_offset, byte_offset, bit_count) =
            parsed.map_err(|_| block.malformed())?;

        Ok(ChannelBlock {
            next: block.link(0),
            name: block.link(2),
            conversion: block.link(4),
            unit: block.link(6),
            channel_type,
            data_type,
            bit_offset,
            byte_offset,
            bit_count,
        })
    }

    pub fn conversion(&self, offset: u64) -> Result<ConversionBlock> {
        let block = self.raw(offset, &[mdf_blocks::CC])?;
        let mut input = block.data;
        let parsed = (|| -> PResult<_> {
            let conversion_type = u8_le(&mut input)?;
            let _precision = u8_le(&mut input)?;
            let _flags = u16_le(&mut input)?;
            let _ref_count = u16_le(&mut input)?;
            let value_count = u16_le(&mut input)?;
            let _physical_min = f64_le(&mut input)?;
            let _physical_max = f64_le(&mut input)?;
            let values = (0..value_count)
                .map(|_| f64_le(&mut input))
                .collect::<PResult<Vec<_>>>()?;
            Ok((conversion_type, values))
        })();
        let (conversion_type, values) = parsed.map_err(|_| block.malformed())?;

        Ok(ConversionBlock {
            unit: block.link(1),
            conversion_type,
            values,
        })
    }

    pub fn data_list(&self, offset: u64) -> Result<DataListBlock> {
        let block = self.raw(offset, &[mdf_blocks::DL])?;
        Ok(DataListBlock {
            next: block.link(0),
            fragments: block.links.iter().skip(1).copied().collect(),
        })
    }

    pub fn dz(&self, offset: u64) -> Result<DzBlock<'a>> {
        let block = self.raw(offset, &[mdf_blocks::DZ])?;
        let mut input = block.data;
        let parsed = (|| -> PResult<_> {
            let original_type = bytes(&mut input, 2)?;
            let zip_type = u8_le(&mut input)?;
            skip(&mut input, 1)?;
            let zip_parameter = u32_le(&mut input)?;
            let original_length = u64_le(&mut input)?;
            let data_length = u64_le(&mut input)?;
            let payload = bytes(&mut input, data_length as usize)?;
            Ok((original_type, zip_type, zip_parameter, original_length, payload))
        })();
        let (original_type, zip_type, zip_parameter, original_length, payload) =
            parsed.map_err(|_| block.malformed())?;

        Ok(DzBlock {
            original_type: [original_type[0], original_type[1]],
            zip_type,
            zip_parameter,
            original_length,
            payload,
        })
    }

    /// Text of a `##TX` or `##MD` block; a null link gives an empty string
    ///
    /// For XML metadata the content of the `<TX>` element is returned.
    pub fn text(&self, offset: u64) -> Result<String> {
        if offset == 0 {
            return Ok(String::new());
        }

        let block = self.raw(offset, &[mdf_blocks::TX, mdf_blocks::MD])?;
        let end = block
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(block.data.len());
        let text = String::from_utf8_lossy(&block.data[..end]);

        if block.header.id == *mdf_blocks::MD {
            Ok(xml_text(&text))
        } else {
            Ok(text.into_owned())
        }
    }

    /// Offsets of a linked list of blocks, starting at `first`
    ///
    /// `next_of` returns the link to the following block.
    pub fn walk(
        &self,
        first: u64,
        block: &str,
        mut next_of: impl FnMut(u64) -> Result<u64>,
    ) -> Result<Vec<u64>> {
        let mut offsets = Vec::new();
        let mut seen = HashSet::new();
        let mut current = first;

        while current != 0 {
            if !seen.insert(current) {
                return Err(MdfError::LinkCycle {
                    block: block.to_string(),
                    offset: current,
                });
            }
            offsets.push(current);
            current = next_of(current)?;
        }

        Ok(offsets)
    }
}

/// Extract the `<TX>` element of an MD block, unescaping XML entities
fn xml_text(xml: &str) -> String {
    let inner = match (xml.find("<TX>"), xml.find("</TX>")) {
        (Some(start), Some(end)) if start + 4 <= end => &xml[start + 4..end],
        _ => xml,
    };

    inner
        .trim()
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
