//! Channel sample decoding.

use super::FileData;
use super::blocks::{BlockReader, ChannelBlock};
use super::conversion::Conversion;
use super::data::{RecordLayout, extract_records, load_data};
use super::error::{MdfError, Result};
use crate::constants::{channel_types, data_types};
use crate::source::ChannelSource;
use std::sync::Arc;
use tracing::debug;

/// Position and type of a channel's raw value inside a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEncoding {
    pub channel_type: u8,
    pub data_type: u8,
    pub byte_offset: u32,
    pub bit_offset: u8,
    pub bit_count: u32,
}

impl From<&ChannelBlock> for ChannelEncoding {
    fn from(block: &ChannelBlock) -> Self {
        Self {
            channel_type: block.channel_type,
            data_type: block.data_type,
            byte_offset: block.byte_offset,
            bit_offset: block.bit_offset,
            bit_count: block.bit_count,
        }
    }
}

impl ChannelEncoding {
    /// Value is the record index rather than stored data
    pub fn is_virtual(&self) -> bool {
        matches!(
            self.channel_type,
            channel_types::VIRTUAL_MASTER | channel_types::VIRTUAL_DATA
        )
    }

    /// Bytes spanned by the value, starting at `byte_offset`
    fn byte_span(&self) -> usize {
        (self.bit_offset as usize + self.bit_count as usize).div_ceil(8)
    }

    /// Why this channel cannot be decoded into numbers, if it cannot
    fn unsupported_reason(&self, record_size: usize) -> Option<String> {
        match self.channel_type {
            channel_types::VARIABLE_LENGTH => {
                return Some("variable length signal data".to_string());
            }
            channel_types::MAXIMUM_LENGTH => {
                return Some("maximum length data".to_string());
            }
            channel_types::FIXED_LENGTH | channel_types::MASTER | channel_types::SYNCHRONIZATION => {}
            _ if self.is_virtual() => return None,
            other => return Some(format!("channel type {}", other)),
        }

        if self.bit_offset > 7 {
            return Some(format!("bit offset {}", self.bit_offset));
        }

        match self.data_type {
            data_types::UNSIGNED_LE
            | data_types::UNSIGNED_BE
            | data_types::SIGNED_LE
            | data_types::SIGNED_BE => {
                if self.bit_count == 0 || self.bit_count > 64 {
                    return Some(format!("{} bit integers", self.bit_count));
                }
            }
            data_types::FLOAT_LE | data_types::FLOAT_BE => {
                if self.bit_offset != 0 || !matches!(self.bit_count, 32 | 64) {
                    return Some(format!("{} bit floating point", self.bit_count));
                }
            }
            other => return Some(format!("data type {}", other)),
        }

        let end = self.byte_offset as usize + self.byte_span();
        if end > record_size {
            return Some(format!(
                "value ends at byte {} of a {} byte record",
                end, record_size
            ));
        }

        None
    }

    /// Raw numeric value stored in `record`
    fn decode(&self, record: &[u8]) -> f64 {
        let start = self.byte_offset as usize;
        let bytes = &record[start..start + self.byte_span()];
        let big_endian = matches!(
            self.data_type,
            data_types::UNSIGNED_BE | data_types::SIGNED_BE | data_types::FLOAT_BE
        );

        let word = if big_endian {
            bytes
                .iter()
                .fold(0u128, |acc, &b| (acc << 8) | u128::from(b))
        } else {
            bytes
                .iter()
                .rev()
                .fold(0u128, |acc, &b| (acc << 8) | u128::from(b))
        };
        let mask = if self.bit_count >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bit_count) - 1
        };
        let raw = ((word >> self.bit_offset) as u64) & mask;

        match self.data_type {
            data_types::SIGNED_LE | data_types::SIGNED_BE => {
                let sign_bit = 1u64 << (self.bit_count - 1);
                let value = if raw & sign_bit != 0 { raw | !mask } else { raw };
                value as i64 as f64
            }
            data_types::FLOAT_LE | data_types::FLOAT_BE if self.bit_count == 32 => {
                f64::from(f32::from_bits(raw as u32))
            }
            data_types::FLOAT_LE | data_types::FLOAT_BE => f64::from_bits(raw),
            _ => raw as f64,
        }
    }
}

/// A channel of an opened MDF file
///
/// Samples are decoded from the file each time they are requested.
#[derive(Debug, Clone)]
pub struct MdfChannel {
    name: String,
    unit: String,
    encoding: ChannelEncoding,
    conversion: Conversion,
    layout: Arc<RecordLayout>,
    file: Arc<FileData>,
}

impl MdfChannel {
    pub(crate) fn new(
        name: String,
        unit: String,
        encoding: ChannelEncoding,
        conversion: Conversion,
        layout: Arc<RecordLayout>,
        file: Arc<FileData>,
    ) -> Self {
        Self {
            name,
            unit,
            encoding,
            conversion,
            layout,
            file,
        }
    }

    /// Number of samples recorded for this channel
    pub fn sample_count(&self) -> u64 {
        self.layout.cycle_count
    }

    fn check_supported(&self) -> Result<()> {
        if let Some(reason) = self.encoding.unsupported_reason(self.layout.record_size) {
            return Err(MdfError::UnsupportedChannel {
                channel: self.name.clone(),
                reason,
            });
        }
        if let Conversion::Unsupported(conversion_type) = self.conversion {
            return Err(MdfError::UnsupportedConversion {
                channel: self.name.clone(),
                conversion_type,
            });
        }
        Ok(())
    }
}

impl ChannelSource for MdfChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn read_samples(&self) -> Result<Vec<f64>> {
        self.check_supported()?;

        let reader = BlockReader::new(self.file.bytes());
        let data = load_data(&reader, self.layout.data_link)?;
        let records = extract_records(&self.layout, &data)?;

        let samples: Vec<f64> = if self.encoding.is_virtual() {
            (0..records.len())
                .map(|index| self.conversion.apply(index as f64))
                .collect()
        } else {
            records
                .iter()
                .map(|record| self.conversion.apply(self.encoding.decode(record)))
                .collect()
        };

        debug!(
            "Decoded {} samples of channel '{}'",
            samples.len(),
            self.name
        );
        Ok(samples)
    }
}
