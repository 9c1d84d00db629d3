//! Measurement hierarchy consumed by the export pipeline.
//!
//! A measurement file is a list of data groups, each holding channel
//! groups, each holding channels. The pipeline only needs a channel's name,
//! unit and samples, so readers plug in by implementing [`ChannelSource`].

use crate::mdf::MdfError;

/// A single named, unit-tagged numeric series
pub trait ChannelSource {
    fn name(&self) -> &str;

    fn unit(&self) -> &str;

    /// Decode the full sample series
    ///
    /// Called once per selected channel; implementations do not need to
    /// cache the result.
    fn read_samples(&self) -> Result<Vec<f64>, MdfError>;
}

/// Channels sharing a common record layout
#[derive(Debug, Clone)]
pub struct ChannelGroup<C> {
    pub channels: Vec<C>,
}

impl<C> ChannelGroup<C> {
    pub fn new(channels: Vec<C>) -> Self {
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Top-level grouping, usually one per recording
#[derive(Debug, Clone)]
pub struct DataGroup<C> {
    pub channel_groups: Vec<ChannelGroup<C>>,
}

impl<C> DataGroup<C> {
    pub fn new(channel_groups: Vec<ChannelGroup<C>>) -> Self {
        Self { channel_groups }
    }
}

/// Channel whose samples are already held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryChannel {
    pub name: String,
    pub unit: String,
    pub samples: Vec<f64>,
}

impl InMemoryChannel {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, samples: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            samples,
        }
    }
}

impl ChannelSource for InMemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn unit(&self) -> &str {
        &self.unit
    }

    fn read_samples(&self) -> Result<Vec<f64>, MdfError> {
        Ok(self.samples.clone())
    }
}
