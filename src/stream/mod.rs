//! Stream side of the pipeline
//!
//! - [`layout`] - channel layout and the reusable frame buffer
//! - [`metadata`] - stream descriptor and description tree
//! - [`outlet_trait`] - transport and outlet traits
//! - [`publisher`] - consumer-gated publishing on top of an outlet
//! - [`tcp`] / [`memory`] - outlet implementations

pub mod layout;
pub mod memory;
pub mod metadata;
pub mod outlet_trait;
pub mod publisher;
pub mod tcp;

pub use layout::{ChannelDescriptor, ChannelKind, ChannelLayout, FrameBuffer};
pub use memory::{MemoryOutlet, MemoryOutletHandle, MemoryTransport};
pub use metadata::{describe, ChannelFormat, MetadataNode, StreamIdentity, StreamInfo};
pub use outlet_trait::{Outlet, StreamTransport};
pub use publisher::{ConsumerGatedPublisher, PublisherStats};
pub use tcp::{TcpConsumer, TcpOutlet, TcpTransport};
