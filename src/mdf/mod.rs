//! Read-only access to ASAM MDF 4 measurement files.
//!
//! Opening a file checks the identification block and walks the data
//! group, channel group and channel lists to build the measurement
//! hierarchy. Channel names, units and conversions are read up front;
//! samples are decoded only when a channel is asked for them.

pub mod blocks;
pub mod channel;
pub mod conversion;
pub mod data;
pub mod error;

pub use channel::{ChannelEncoding, MdfChannel};
pub use conversion::Conversion;
pub use error::{MdfError, Result};

use self::blocks::{BlockReader, ChannelGroupBlock, DataGroupBlock};
use self::data::{RecordLayout, RecordSize};
use crate::constants::mdf_blocks::{
    FILE_ID, HD_OFFSET, ID_BLOCK_SIZE, MIN_VERSION, UNFINISHED_FILE_ID,
};
use crate::source::{ChannelGroup, DataGroup};
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bytes of an opened file
#[derive(Debug)]
pub enum FileData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl FileData {
    pub fn bytes(&self) -> &[u8] {
        match self {
            FileData::Mapped(mmap) => mmap.as_ref(),
            FileData::Owned(bytes) => bytes.as_slice(),
        }
    }
}

/// An opened MDF 4 file
#[derive(Debug)]
pub struct MdfFile {
    version: u16,
    program: String,
    data_groups: Vec<DataGroup<MdfChannel>>,
}

impl MdfFile {
    /// Memory-map and parse the file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let io_error = |source| MdfError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let length = file.metadata().map_err(io_error)?.len();
        if length < ID_BLOCK_SIZE as u64 {
            return Err(MdfError::NotMdf {
                reason: format!("file is only {} bytes long", length),
            });
        }

        // SAFETY: the mapping is read-only and owned by the returned file.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
        debug!("Mapped {} ({} bytes)", path.display(), length);

        Self::parse(FileData::Mapped(mmap))
    }

    /// Parse a file already held in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::parse(FileData::Owned(bytes))
    }

    fn parse(data: FileData) -> Result<Self> {
        let data = Arc::new(data);
        let bytes = data.bytes();
        let (version, program) = identification(bytes)?;
        let reader = BlockReader::new(bytes);

        let header = reader.header(HD_OFFSET)?;
        let data_group_offsets = reader.walk(header.first_data_group, "DG", |offset| {
            Ok(reader.data_group(offset)?.next)
        })?;

        let mut data_groups = Vec::with_capacity(data_group_offsets.len());
        for offset in data_group_offsets {
            let block = reader.data_group(offset)?;
            data_groups.push(read_data_group(&reader, &block, &data)?);
        }

        info!(
            "Opened MDF {}.{:02} file written by '{}' with {} data groups",
            version / 100,
            version % 100,
            program,
            data_groups.len()
        );

        Ok(Self {
            version,
            program,
            data_groups,
        })
    }

    /// Format version, e.g. 410 for 4.10
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Name of the program that wrote the file
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn data_groups(&self) -> &[DataGroup<MdfChannel>] {
        &self.data_groups
    }
}

/// Check the identification block and return version and program name
fn identification(bytes: &[u8]) -> Result<(u16, String)> {
    if bytes.len() < ID_BLOCK_SIZE {
        return Err(MdfError::NotMdf {
            reason: format!("file is only {} bytes long", bytes.len()),
        });
    }

    let file_id = &bytes[0..8];
    if file_id == UNFINISHED_FILE_ID {
        warn!("File is marked as unfinished, data may be incomplete");
    } else if file_id != FILE_ID {
        return Err(MdfError::NotMdf {
            reason: format!(
                "unknown file identifier '{}'",
                String::from_utf8_lossy(file_id).trim_end()
            ),
        });
    }

    let program = String::from_utf8_lossy(&bytes[16..24])
        .trim_end_matches(['\0', ' '])
        .to_string();
    let version = u16::from_le_bytes([bytes[28], bytes[29]]);
    if version < MIN_VERSION {
        return Err(MdfError::UnsupportedVersion { version });
    }

    Ok((version, program))
}

fn read_data_group(
    reader: &BlockReader<'_>,
    block: &DataGroupBlock,
    file: &Arc<FileData>,
) -> Result<DataGroup<MdfChannel>> {
    let group_offsets = reader.walk(block.first_channel_group, "CG", |offset| {
        Ok(reader.channel_group(offset)?.next)
    })?;
    let group_blocks = group_offsets
        .iter()
        .map(|&offset| reader.channel_group(offset))
        .collect::<Result<Vec<_>>>()?;

    if block.record_id_size == 0 && group_blocks.len() > 1 {
        warn!(
            "Data group holds {} channel groups without record ids",
            group_blocks.len()
        );
    }

    let mut group_sizes = HashMap::with_capacity(group_blocks.len());
    for cg in &group_blocks {
        let size = if cg.is_vlsd() {
            RecordSize::Variable
        } else {
            RecordSize::Fixed(cg.record_size())
        };
        if group_sizes.insert(cg.record_id, size).is_some() && block.record_id_size != 0 {
            return Err(MdfError::UnsupportedData {
                reason: format!(
                    "record id {} is used by more than one channel group",
                    cg.record_id
                ),
            });
        }
    }

    let mut channel_groups = Vec::with_capacity(group_blocks.len());
    for cg in group_blocks.iter().filter(|cg| !cg.is_vlsd()) {
        let layout = Arc::new(RecordLayout {
            data_link: block.data,
            record_id_size: block.record_id_size,
            record_id: cg.record_id,
            record_size: cg.record_size(),
            cycle_count: cg.cycle_count,
            group_sizes: group_sizes.clone(),
        });
        channel_groups.push(read_channel_group(reader, cg, layout, file)?);
    }

    Ok(DataGroup::new(channel_groups))
}

fn read_channel_group(
    reader: &BlockReader<'_>,
    block: &ChannelGroupBlock,
    layout: Arc<RecordLayout>,
    file: &Arc<FileData>,
) -> Result<ChannelGroup<MdfChannel>> {
    let channel_offsets = reader.walk(block.first_channel, "CN", |offset| {
        Ok(reader.channel(offset)?.next)
    })?;

    let mut channels = Vec::with_capacity(channel_offsets.len());
    for offset in channel_offsets {
        let cn = reader.channel(offset)?;
        let conversion_block = match cn.conversion {
            0 => None,
            link => Some(reader.conversion(link)?),
        };

        let name = reader.text(cn.name)?;
        let unit = match (cn.unit, &conversion_block) {
            (0, Some(cc)) => reader.text(cc.unit)?,
            (link, _) => reader.text(link)?,
        };

        channels.push(MdfChannel::new(
            name,
            unit,
            ChannelEncoding::from(&cn),
            Conversion::from_block(conversion_block.as_ref()),
            Arc::clone(&layout),
            Arc::clone(file),
        ));
    }

    debug!(
        "Channel group {} has {} channels and {} records",
        block.record_id,
        channels.len(),
        block.cycle_count
    );
    Ok(ChannelGroup::new(channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_block(file_id: &[u8; 8], version: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; ID_BLOCK_SIZE];
        bytes[0..8].copy_from_slice(file_id);
        bytes[8..16].copy_from_slice(b"4.10    ");
        bytes[16..24].copy_from_slice(b"tester  ");
        bytes[28..30].copy_from_slice(&version.to_le_bytes());
        bytes
    }

    #[test]
    fn test_identification() {
        let (version, program) = identification(&id_block(FILE_ID, 410)).unwrap();
        assert_eq!(version, 410);
        assert_eq!(program, "tester");
    }

    #[test]
    fn test_rejects_other_files() {
        assert!(matches!(
            identification(b"PK\x03\x04"),
            Err(MdfError::NotMdf { .. })
        ));
        assert!(matches!(
            identification(&id_block(b"NOT MDF ", 410)),
            Err(MdfError::NotMdf { .. })
        ));
    }

    #[test]
    fn test_rejects_mdf3() {
        assert!(matches!(
            identification(&id_block(FILE_ID, 330)),
            Err(MdfError::UnsupportedVersion { version: 330 })
        ));
    }

    #[test]
    fn test_unfinished_files_are_accepted() {
        assert!(identification(&id_block(UNFINISHED_FILE_ID, 410)).is_ok());
    }

    #[test]
    fn test_missing_header_block() {
        let result = MdfFile::from_bytes(id_block(FILE_ID, 410));
        assert!(matches!(result, Err(MdfError::InvalidLink { offset: 64 })));
    }
}
