//! Stream description and metadata tree
//!
//! A [`StreamInfo`] is what consumers see before the first sample: stream
//! name and type, channel count, advertised rate, sample format, a source id
//! for re-discovery, and a free-form [`MetadataNode`] tree describing every
//! channel.
//!
//! The advertised rate depends on the negotiated [`ProcessingMode`]; the
//! channel count does not.

use super::layout::{ChannelKind, ChannelLayout};
use crate::config::StreamConfig;
use crate::types::ProcessingMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sample value format on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelFormat {
    Float32,
}

/// Node of the stream description tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MetadataNode>,
}

impl MetadataNode {
    /// Create an empty node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Create a leaf node holding a value
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    /// Append a child with a value and return `self` for chaining
    pub fn append_child_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.children.push(Self::leaf(name, value));
        self
    }

    /// Append an empty child and return it
    pub fn append_child(&mut self, name: impl Into<String>) -> &mut MetadataNode {
        self.children.push(Self::new(name));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&MetadataNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Value of the first direct child with the given name
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.value.as_deref())
    }
}

/// Identity fields written at the top of the description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamIdentity {
    pub manufacturer: String,
    pub model: String,
    pub mode: ProcessingMode,
}

/// Build the description tree for a layout
///
/// ```text
/// desc
/// ├── manufacturer
/// ├── model
/// ├── processing_mode
/// └── channels
///     └── channel { label, unit, type } × N
/// ```
pub fn describe(layout: &ChannelLayout, identity: &StreamIdentity) -> MetadataNode {
    let mut desc = MetadataNode::new("desc");
    desc.append_child_value("manufacturer", identity.manufacturer.as_str())
        .append_child_value("model", identity.model.as_str())
        .append_child_value("processing_mode", identity.mode.label());

    let channels = desc.append_child("channels");
    for channel in layout.channels() {
        let node = channels.append_child("channel");
        node.append_child_value("label", channel.name.as_str())
            .append_child_value("unit", channel.unit)
            .append_child_value(
                "type",
                match channel.kind {
                    ChannelKind::Position => "position",
                    ChannelKind::Orientation => "orientation",
                },
            );
    }

    desc
}

/// Full stream descriptor handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub name: String,
    pub content_type: String,
    pub channel_count: usize,
    /// Advertised sample rate in Hz
    pub nominal_rate: f64,
    pub channel_format: ChannelFormat,
    pub source_id: String,
    pub created_at: DateTime<Utc>,
    pub desc: MetadataNode,
}

impl StreamInfo {
    /// Build the descriptor for a layout in the negotiated mode
    pub fn new(config: &StreamConfig, layout: &ChannelLayout, mode: ProcessingMode) -> Self {
        let identity = StreamIdentity {
            manufacturer: config.manufacturer.clone(),
            model: config.model.clone(),
            mode,
        };

        Self {
            name: config.name.clone(),
            content_type: config.content_type.clone(),
            channel_count: layout.channel_count(),
            nominal_rate: config.advertised_rate(mode),
            channel_format: ChannelFormat::Float32,
            source_id: config.source_id.clone(),
            created_at: Utc::now(),
            desc: describe(layout, &identity),
        }
    }

    /// Serialize the descriptor as a single JSON line
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JointCatalog, JointId};

    fn identity(mode: ProcessingMode) -> StreamIdentity {
        StreamIdentity {
            manufacturer: "Acme".to_string(),
            model: "Depth".to_string(),
            mode,
        }
    }

    #[test]
    fn test_describe_structure() {
        let catalog = JointCatalog::new(vec![JointId::Neck]).unwrap();
        let layout = ChannelLayout::build(&catalog);
        let desc = describe(&layout, &identity(ProcessingMode::Accelerated));

        assert_eq!(desc.child_value("manufacturer"), Some("Acme"));
        assert_eq!(desc.child_value("model"), Some("Depth"));
        assert_eq!(desc.child_value("processing_mode"), Some("accelerated"));

        let channels = desc.child("channels").unwrap();
        assert_eq!(channels.children.len(), 7);
        assert_eq!(channels.children[0].child_value("label"), Some("NECK_posx"));
        assert_eq!(channels.children[0].child_value("unit"), Some("mm"));
        assert_eq!(channels.children[3].child_value("type"), Some("orientation"));
    }

    #[test]
    fn test_stream_info_differs_only_in_advertised_fields() {
        let config = StreamConfig::default();
        let layout = ChannelLayout::build(&JointCatalog::full());
        let fast = StreamInfo::new(&config, &layout, ProcessingMode::Accelerated);
        let slow = StreamInfo::new(&config, &layout, ProcessingMode::Baseline);

        assert_eq!(fast.channel_count, 224);
        assert_eq!(fast.channel_count, slow.channel_count);
        assert_eq!(fast.nominal_rate, 10.0);
        assert_eq!(slow.nominal_rate, 4.0);
        assert_eq!(fast.desc.child("channels"), slow.desc.child("channels"));
        assert_eq!(slow.desc.child_value("processing_mode"), Some("baseline"));
    }

    #[test]
    fn test_stream_info_json() {
        let config = StreamConfig::default();
        let layout = ChannelLayout::build(&JointCatalog::full());
        let info = StreamInfo::new(&config, &layout, ProcessingMode::Baseline);
        let json: serde_json::Value = serde_json::from_str(&info.to_json().unwrap()).unwrap();

        assert_eq!(json["name"], "Azure-Kinect");
        assert_eq!(json["content_type"], "MoCap");
        assert_eq!(json["channel_count"], 224);
        assert_eq!(json["channel_format"], "float32");
    }
}
