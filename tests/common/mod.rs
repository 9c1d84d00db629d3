//! Minimal MDF 4 writer for building test files.
//!
//! Blocks are appended children first, so every link is known by the time
//! its parent is written. Only the header block has a fixed position and is
//! patched once the first data group is known.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;
use tempfile::NamedTempFile;

pub const UNSIGNED_LE: u8 = 0;
pub const UNSIGNED_BE: u8 = 1;
pub const SIGNED_LE: u8 = 2;
pub const FLOAT_LE: u8 = 4;
pub const STRING_UTF8: u8 = 7;

pub const FIXED_LENGTH: u8 = 0;
pub const MASTER: u8 = 2;
pub const VIRTUAL_MASTER: u8 = 3;

#[derive(Debug, Clone)]
pub struct TestChannel {
    pub name: &'static str,
    pub unit: &'static str,
    pub channel_type: u8,
    pub data_type: u8,
    pub byte_offset: u32,
    pub bit_offset: u8,
    pub bit_count: u32,
    /// `(cc_type, values)`
    pub conversion: Option<(u8, Vec<f64>)>,
    /// Store the unit on the conversion block instead of the channel
    pub unit_on_conversion: bool,
}

impl TestChannel {
    pub fn float(name: &'static str, unit: &'static str, byte_offset: u32) -> Self {
        Self {
            name,
            unit,
            channel_type: FIXED_LENGTH,
            data_type: FLOAT_LE,
            byte_offset,
            bit_offset: 0,
            bit_count: 64,
            conversion: None,
            unit_on_conversion: false,
        }
    }

    pub fn integer(
        name: &'static str,
        unit: &'static str,
        data_type: u8,
        byte_offset: u32,
        bit_count: u32,
    ) -> Self {
        Self {
            data_type,
            bit_count,
            ..Self::float(name, unit, byte_offset)
        }
    }

    pub fn with_type(mut self, channel_type: u8) -> Self {
        self.channel_type = channel_type;
        self
    }

    pub fn with_bit_offset(mut self, bit_offset: u8) -> Self {
        self.bit_offset = bit_offset;
        self
    }

    pub fn with_linear(mut self, offset: f64, factor: f64) -> Self {
        self.conversion = Some((1, vec![offset, factor]));
        self
    }

    pub fn with_conversion(mut self, conversion_type: u8, values: Vec<f64>) -> Self {
        self.conversion = Some((conversion_type, values));
        self
    }

    pub fn with_unit_on_conversion(mut self) -> Self {
        self.unit_on_conversion = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct TestGroup {
    pub record_id: u64,
    pub record_size: u32,
    pub cycle_count: u64,
    pub vlsd: bool,
    pub channels: Vec<TestChannel>,
}

impl TestGroup {
    pub fn new(record_size: u32, cycle_count: u64, channels: Vec<TestChannel>) -> Self {
        Self {
            record_id: 0,
            record_size,
            cycle_count,
            vlsd: false,
            channels,
        }
    }

    pub fn with_record_id(mut self, record_id: u64) -> Self {
        self.record_id = record_id;
        self
    }

    pub fn vlsd(record_id: u64, cycle_count: u64) -> Self {
        Self {
            record_id,
            record_size: 0,
            cycle_count,
            vlsd: true,
            channels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TestData {
    None,
    Plain(Vec<u8>),
    Deflate(Vec<u8>),
    /// Transposed with the given column count before compression
    TransposeDeflate(Vec<u8>, u32),
    /// `##DL` list of plain fragments
    List(Vec<Vec<u8>>),
}

#[derive(Debug, Clone)]
pub struct TestDataGroup {
    pub record_id_size: u8,
    pub groups: Vec<TestGroup>,
    pub data: TestData,
}

impl TestDataGroup {
    /// Sorted data group with a single channel group
    pub fn sorted(group: TestGroup, data: TestData) -> Self {
        Self {
            record_id_size: 0,
            groups: vec![group],
            data,
        }
    }
}

/// Records of little-endian `f64` values, one slice per record
pub fn float_records(rows: &[&[f64]]) -> Vec<u8> {
    rows.iter()
        .flat_map(|row| row.iter().flat_map(|v| v.to_le_bytes()))
        .collect()
}

const HD_SIZE: usize = 24 + 6 * 8 + 32;

struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn block(&mut self, id: &[u8; 4], links: &[u64], data: &[u8]) -> u64 {
        while self.bytes.len() % 8 != 0 {
            self.bytes.push(0);
        }
        let offset = self.bytes.len() as u64;
        let length = (24 + links.len() * 8 + data.len()) as u64;

        self.bytes.extend_from_slice(id);
        self.bytes.extend_from_slice(&[0; 4]);
        self.bytes.extend_from_slice(&length.to_le_bytes());
        self.bytes.extend_from_slice(&(links.len() as u64).to_le_bytes());
        for link in links {
            self.bytes.extend_from_slice(&link.to_le_bytes());
        }
        self.bytes.extend_from_slice(data);
        offset
    }

    fn text(&mut self, text: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        while data.len() % 8 != 0 {
            data.push(0);
        }
        self.block(b"##TX", &[], &data)
    }

    fn conversion(&mut self, conversion_type: u8, values: &[f64], unit: u64) -> u64 {
        let mut data = vec![conversion_type, 0];
        data.extend_from_slice(&0u16.to_le_bytes()); // flags
        data.extend_from_slice(&0u16.to_le_bytes()); // ref count
        data.extend_from_slice(&(values.len() as u16).to_le_bytes());
        data.extend_from_slice(&0f64.to_le_bytes());
        data.extend_from_slice(&0f64.to_le_bytes());
        for value in values {
            data.extend_from_slice(&value.to_le_bytes());
        }
        self.block(b"##CC", &[0, unit, 0, 0], &data)
    }

    fn channel(&mut self, channel: &TestChannel, next: u64) -> u64 {
        let name = self.text(channel.name);
        let unit = self.text(channel.unit);
        let (cn_unit, cc_unit) = if channel.unit_on_conversion {
            (0, unit)
        } else {
            (unit, 0)
        };
        let conversion = match &channel.conversion {
            Some((conversion_type, values)) => self.conversion(*conversion_type, values, cc_unit),
            None => 0,
        };

        let mut data = vec![
            channel.channel_type,
            0,
            channel.data_type,
            channel.bit_offset,
        ];
        data.extend_from_slice(&channel.byte_offset.to_le_bytes());
        data.extend_from_slice(&channel.bit_count.to_le_bytes());
        data.extend_from_slice(&[0; 8]); // flags, invalidation bit
        data.extend_from_slice(&[0; 4]); // precision, reserved, attachments
        data.extend_from_slice(&[0; 48]); // value and limit ranges
        self.block(
            b"##CN",
            &[next, 0, name, 0, conversion, 0, cn_unit, 0],
            &data,
        )
    }

    fn channel_group(&mut self, group: &TestGroup, next: u64) -> u64 {
        let mut first_channel = 0;
        for channel in group.channels.iter().rev() {
            first_channel = self.channel(channel, first_channel);
        }

        let flags: u16 = if group.vlsd { 1 } else { 0 };
        let mut data = Vec::new();
        data.extend_from_slice(&group.record_id.to_le_bytes());
        data.extend_from_slice(&group.cycle_count.to_le_bytes());
        data.extend_from_slice(&flags.to_le_bytes());
        data.extend_from_slice(&[0; 6]); // path separator, reserved
        data.extend_from_slice(&group.record_size.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        self.block(b"##CG", &[next, first_channel, 0, 0, 0, 0], &data)
    }

    fn deflate(&mut self, raw: &[u8], stored: &[u8], zip_type: u8, zip_parameter: u32) -> u64 {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(stored).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut data = b"DT".to_vec();
        data.push(zip_type);
        data.push(0);
        data.extend_from_slice(&zip_parameter.to_le_bytes());
        data.extend_from_slice(&(raw.len() as u64).to_le_bytes());
        data.extend_from_slice(&(compressed.len() as u64).to_le_bytes());
        data.extend_from_slice(&compressed);
        self.block(b"##DZ", &[], &data)
    }

    fn data(&mut self, data: &TestData) -> u64 {
        match data {
            TestData::None => 0,
            TestData::Plain(bytes) => self.block(b"##DT", &[], bytes),
            TestData::Deflate(bytes) => self.deflate(bytes, bytes, 0, 0),
            TestData::TransposeDeflate(bytes, columns) => {
                let stored = transpose(bytes, *columns as usize);
                self.deflate(bytes, &stored, 1, *columns)
            }
            TestData::List(fragments) => {
                let links: Vec<u64> = std::iter::once(0)
                    .chain(fragments.iter().map(|f| self.block(b"##DT", &[], f)))
                    .collect();
                let mut list = vec![0u8, 0, 0, 0];
                list.extend_from_slice(&(fragments.len() as u32).to_le_bytes());
                self.block(b"##DL", &links, &list)
            }
        }
    }

    fn data_group(&mut self, group: &TestDataGroup, next: u64) -> u64 {
        let mut first_channel_group = 0;
        for cg in group.groups.iter().rev() {
            first_channel_group = self.channel_group(cg, first_channel_group);
        }
        let data = self.data(&group.data);

        let mut block_data = vec![group.record_id_size];
        block_data.extend_from_slice(&[0; 7]);
        self.block(b"##DG", &[next, first_channel_group, data, 0], &block_data)
    }
}

fn transpose(data: &[u8], columns: usize) -> Vec<u8> {
    let rows = data.len() / columns;
    let transposed = rows * columns;
    let mut out = Vec::with_capacity(data.len());
    for column in 0..columns {
        for row in 0..rows {
            out.push(data[row * columns + column]);
        }
    }
    out.extend_from_slice(&data[transposed..]);
    out
}

/// Bytes of an MDF 4.10 file holding `data_groups`
pub fn build_mdf(data_groups: &[TestDataGroup]) -> Vec<u8> {
    let mut id = vec![0u8; 64];
    id[0..8].copy_from_slice(b"MDF     ");
    id[8..16].copy_from_slice(b"4.10    ");
    id[16..24].copy_from_slice(b"mdftest ");
    id[28..30].copy_from_slice(&410u16.to_le_bytes());

    let mut writer = Writer { bytes: id };
    writer.bytes.resize(64 + HD_SIZE, 0);

    let mut first_data_group = 0;
    for dg in data_groups.iter().rev() {
        first_data_group = writer.data_group(dg, first_data_group);
    }

    let mut header = Vec::with_capacity(HD_SIZE);
    header.extend_from_slice(b"##HD");
    header.extend_from_slice(&[0; 4]);
    header.extend_from_slice(&(HD_SIZE as u64).to_le_bytes());
    header.extend_from_slice(&6u64.to_le_bytes());
    header.extend_from_slice(&first_data_group.to_le_bytes());
    header.resize(HD_SIZE, 0);
    writer.bytes[64..64 + HD_SIZE].copy_from_slice(&header);

    writer.bytes
}

/// Write an MDF file to a temporary location
pub fn write_mdf(data_groups: &[TestDataGroup]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".mf4")
        .tempfile()
        .unwrap();
    file.write_all(&build_mdf(data_groups)).unwrap();
    file.flush().unwrap();
    file
}

/// Single data group and channel group with `Time`, `Speed` and `Gear`
///
/// Speed is stored in 0.01 km/h steps, gear as an unsigned byte.
pub fn drive_file() -> TestDataGroup {
    let channels = vec![
        TestChannel::float("Time", "s", 0).with_type(MASTER),
        TestChannel::integer("Speed", "km/h", UNSIGNED_LE, 8, 16).with_linear(0.0, 0.01),
        TestChannel::integer("Gear", "", UNSIGNED_LE, 10, 8),
    ];

    let mut records = Vec::new();
    for (time, speed, gear) in [(0.0f64, 0u16, 1u8), (0.5, 1250, 2), (1.0, 2575, 3)] {
        records.extend_from_slice(&time.to_le_bytes());
        records.extend_from_slice(&speed.to_le_bytes());
        records.push(gear);
        records.push(0);
    }

    TestDataGroup::sorted(TestGroup::new(12, 3, channels), TestData::Plain(records))
}
