//! Test data builders for skeletons and tracking results

use super::mock_helpers::ScriptedFrame;
use bodystream_rs::types::{JointId, JointPose, Quaternion, Skeleton, Vec3};
use std::time::Duration;

/// Builder for creating test Skeletons
///
/// Joints that are not set explicitly sit at the origin with identity
/// orientation.
pub struct SkeletonBuilder {
    skeleton: Skeleton,
}

impl SkeletonBuilder {
    pub fn new() -> Self {
        Self {
            skeleton: Skeleton::default(),
        }
    }

    pub fn joint(mut self, id: JointId, position: [f32; 3], orientation: [f32; 4]) -> Self {
        let [x, y, z] = position;
        let [qw, qx, qy, qz] = orientation;
        self.skeleton.set_joint(
            id,
            JointPose::new(Vec3::new(x, y, z), Quaternion::new(qw, qx, qy, qz)),
        );
        self
    }

    /// Give every joint a distinct position derived from its index
    pub fn indexed(mut self) -> Self {
        for id in JointId::ALL {
            let base = id.index() as f32 * 10.0;
            self.skeleton.set_joint(
                id,
                JointPose::new(Vec3::new(base, base + 1.0, base + 2.0), Quaternion::IDENTITY),
            );
        }
        self
    }

    pub fn build(self) -> Skeleton {
        self.skeleton
    }
}

impl Default for SkeletonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating scripted tracking results
pub struct FrameBuilder {
    bodies: Vec<Skeleton>,
    claimed: Option<usize>,
    timestamp: Duration,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            claimed: None,
            timestamp: Duration::ZERO,
        }
    }

    pub fn body(mut self, skeleton: Skeleton) -> Self {
        self.bodies.push(skeleton);
        self
    }

    /// Report `count` bodies regardless of how many skeletons were added
    pub fn claim_bodies(mut self, count: usize) -> Self {
        self.claimed = Some(count);
        self
    }

    pub fn timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn build(self) -> ScriptedFrame {
        ScriptedFrame {
            num_bodies: self.claimed.unwrap_or(self.bodies.len()),
            bodies: self.bodies,
            timestamp: self.timestamp,
        }
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodystream_rs::sensor::BodyFrame;

    #[test]
    fn test_skeleton_builder() {
        let skeleton = SkeletonBuilder::new()
            .joint(JointId::Neck, [1.0, 2.0, 3.0], [1.0, 0.0, 0.0, 0.0])
            .build();
        assert_eq!(skeleton.joint(JointId::Neck).position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(skeleton.joint(JointId::Head).position, Vec3::default());
    }

    #[test]
    fn test_frame_builder_claims() {
        let frame = FrameBuilder::new().claim_bodies(1).build();
        assert_eq!(frame.num_bodies(), 1);
        assert!(frame.skeleton(0).is_none());
    }
}
