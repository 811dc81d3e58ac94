//! Channel layout and frame buffer
//!
//! Each joint of the catalog contributes 7 consecutive channels:
//!
//! | offset | suffix  | unit       |
//! |--------|---------|------------|
//! | 0      | `_posx` | mm         |
//! | 1      | `_posy` | mm         |
//! | 2      | `_posz` | mm         |
//! | 3      | `_oriw` | quaternion |
//! | 4      | `_orix` | quaternion |
//! | 5      | `_oriy` | quaternion |
//! | 6      | `_oriz` | quaternion |
//!
//! Consumers decode samples by position, so the layout is a pure function of
//! the catalog order.

use crate::types::{JointCatalog, JointId, Skeleton, CHANNELS_PER_JOINT};
use serde::Serialize;

/// Unit of position channels
pub const POSITION_UNIT: &str = "mm";

/// Unit of orientation channels
pub const ORIENTATION_UNIT: &str = "quaternion";

/// Channel suffixes in payload order
pub const CHANNEL_SUFFIXES: [&str; CHANNELS_PER_JOINT] =
    ["posx", "posy", "posz", "oriw", "orix", "oriy", "oriz"];

/// What a channel measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Position,
    Orientation,
}

/// Description of one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelDescriptor {
    /// Channel label, e.g. `PELVIS_posx`
    pub name: String,
    /// Physical unit
    pub unit: &'static str,
    /// Position or orientation component
    pub kind: ChannelKind,
    /// Joint this channel belongs to
    #[serde(skip)]
    pub joint: JointId,
}

/// Fixed channel layout derived from a joint catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    channels: Vec<ChannelDescriptor>,
}

impl ChannelLayout {
    /// Build the layout for a catalog, preserving its order
    pub fn build(catalog: &JointCatalog) -> Self {
        let channels = catalog
            .iter()
            .flat_map(|joint| {
                CHANNEL_SUFFIXES
                    .into_iter()
                    .enumerate()
                    .map(move |(offset, suffix)| {
                        let kind = if offset < 3 {
                            ChannelKind::Position
                        } else {
                            ChannelKind::Orientation
                        };
                        let unit = match kind {
                            ChannelKind::Position => POSITION_UNIT,
                            ChannelKind::Orientation => ORIENTATION_UNIT,
                        };
                        ChannelDescriptor {
                            name: format!("{}_{}", joint.name(), suffix),
                            unit,
                            kind,
                            joint,
                        }
                    })
            })
            .collect();

        Self { channels }
    }

    /// Number of channels (7 per joint)
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channels in payload order
    pub fn channels(&self) -> &[ChannelDescriptor] {
        &self.channels
    }

    /// Channel labels in payload order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }
}

/// Reusable sample buffer sized to a layout
///
/// The buffer is allocated once and never resized; every published frame
/// has the same width.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    values: Box<[f32]>,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer for `catalog`
    pub fn new(catalog: &JointCatalog) -> Self {
        Self {
            values: vec![0.0; catalog.channel_count()].into_boxed_slice(),
        }
    }

    /// Copy the joints of `skeleton` into the buffer in catalog order
    pub fn fill(&mut self, catalog: &JointCatalog, skeleton: &Skeleton) {
        debug_assert_eq!(self.values.len(), catalog.channel_count());
        for (joint, slot) in catalog
            .iter()
            .zip(self.values.chunks_exact_mut(CHANNELS_PER_JOINT))
        {
            skeleton.joint(joint).write_channels(slot);
        }
    }

    /// Set every channel to zero
    pub fn clear(&mut self) {
        self.values.fill(0.0);
    }

    /// Sample width
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Current sample
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}
