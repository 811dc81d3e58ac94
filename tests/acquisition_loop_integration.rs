//! Integration tests for the acquisition loop
//!
//! These tests drive [`AcquisitionLoop`] with mocked sensor collaborators:
//! - Frame limit and publish counts
//! - Extraction of joint values in catalog order
//! - Empty and multi-subject frames
//! - Faults at every waiting stage

mod common;

use bodystream_rs::config::EmptyFramePolicy;
use bodystream_rs::error::{StreamError, WaitError};
use bodystream_rs::stream::{ConsumerGatedPublisher, MemoryOutletHandle};
use bodystream_rs::types::{JointCatalog, JointId, ProcessingMode};
use bodystream_rs::{AcquisitionLoop, AcquisitionSettings, LoopOutcome};
use common::builders::{FrameBuilder, SkeletonBuilder};
use common::mock_helpers::{
    accepting_outlet, counting_device, echo_tracker, MockStreamOutlet, MockTracker,
};

fn limited(frames: u64) -> AcquisitionSettings {
    AcquisitionSettings {
        frame_limit: Some(frames),
        empty_frames: EmptyFramePolicy::Skip,
    }
}

fn one_subject() -> common::mock_helpers::ScriptedFrame {
    FrameBuilder::new()
        .body(SkeletonBuilder::new().indexed().build())
        .build()
}

#[test]
fn test_publishes_exactly_frame_limit_samples() {
    let catalog = JointCatalog::full();
    let mut device = counting_device(100);
    let mut tracker = echo_tracker(one_subject());

    let mut outlet = MockStreamOutlet::new();
    outlet
        .expect_push_sample()
        .withf(|sample: &[f32]| sample.len() == 224)
        .times(7)
        .returning(|_| Ok(()));
    let mut publisher = ConsumerGatedPublisher::new(outlet);

    let mut acquisition = AcquisitionLoop::new(&catalog, limited(7), ProcessingMode::Accelerated);
    let outcome = acquisition.run(&mut device, &mut tracker, &mut publisher);

    assert!(matches!(outcome, LoopOutcome::Completed { frames: 7 }));
    assert_eq!(acquisition.state().iterations, 7);
    assert_eq!(publisher.stats().published, 7);
}

#[test]
fn test_joint_zero_values() {
    let catalog = JointCatalog::full();
    let skeleton = SkeletonBuilder::new()
        .joint(JointId::Pelvis, [10.0, 20.0, 30.0], [1.0, 0.0, 0.0, 0.0])
        .build();
    let mut device = counting_device(1);
    let mut tracker = echo_tracker(FrameBuilder::new().body(skeleton).build());

    let handle = MemoryOutletHandle::new();
    let mut publisher = ConsumerGatedPublisher::new(handle.outlet());
    let mut acquisition = AcquisitionLoop::new(&catalog, limited(1), ProcessingMode::Baseline);
    acquisition.run(&mut device, &mut tracker, &mut publisher);

    let samples = handle.samples();
    assert_eq!(samples.len(), 1);
    assert_eq!(&samples[0][0..7], &[10.0, 20.0, 30.0, 1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_sample_follows_catalog_order() {
    let catalog = JointCatalog::new(vec![JointId::Head, JointId::Pelvis]).unwrap();
    let mut device = counting_device(1);
    let mut tracker = echo_tracker(one_subject());

    let handle = MemoryOutletHandle::new();
    let mut publisher = ConsumerGatedPublisher::new(handle.outlet());
    let mut acquisition = AcquisitionLoop::new(&catalog, limited(1), ProcessingMode::Accelerated);
    acquisition.run(&mut device, &mut tracker, &mut publisher);

    let head = JointId::Head.index() as f32 * 10.0;
    let sample = &handle.samples()[0];
    assert_eq!(sample.len(), 14);
    assert_eq!(&sample[0..3], &[head, head + 1.0, head + 2.0]);
    assert_eq!(&sample[7..10], &[0.0, 1.0, 2.0]);
}

#[test]
fn test_two_subjects_never_publish() {
    let catalog = JointCatalog::full();
    let skeleton = SkeletonBuilder::new().build();
    let mut device = counting_device(10);
    let mut tracker = echo_tracker(
        FrameBuilder::new()
            .body(skeleton.clone())
            .body(skeleton)
            .build(),
    );

    let mut outlet = MockStreamOutlet::new();
    outlet.expect_push_sample().times(0);
    let mut publisher = ConsumerGatedPublisher::new(outlet);

    let mut acquisition = AcquisitionLoop::new(&catalog, limited(10), ProcessingMode::Accelerated);
    let outcome = acquisition.run(&mut device, &mut tracker, &mut publisher);

    assert!(matches!(
        outcome,
        LoopOutcome::MultipleSubjects { count: 2, frame: 1 }
    ));
    assert_eq!(acquisition.state().iterations, 0);
}

#[test]
fn test_empty_frames_are_skipped_by_default() {
    let catalog = JointCatalog::full();
    let mut device = counting_device(10);
    let mut tracker = echo_tracker(FrameBuilder::new().build());

    let mut outlet = MockStreamOutlet::new();
    outlet.expect_push_sample().times(0);
    let mut publisher = ConsumerGatedPublisher::new(outlet);

    let mut acquisition = AcquisitionLoop::new(&catalog, limited(4), ProcessingMode::Accelerated);
    let outcome = acquisition.run(&mut device, &mut tracker, &mut publisher);

    assert!(matches!(outcome, LoopOutcome::Completed { frames: 4 }));
    assert_eq!(acquisition.stats().empty_frames, 4);
}

#[test]
fn test_empty_frames_publish_zeros_when_configured() {
    let catalog = JointCatalog::new(vec![JointId::Neck]).unwrap();
    let mut device = counting_device(10);
    let mut tracker = echo_tracker(FrameBuilder::new().build());

    let mut outlet = MockStreamOutlet::new();
    outlet
        .expect_push_sample()
        .withf(|sample: &[f32]| sample == [0.0f32; 7])
        .times(2)
        .returning(|_| Ok(()));
    let mut publisher = ConsumerGatedPublisher::new(outlet);

    let settings = AcquisitionSettings {
        frame_limit: Some(2),
        empty_frames: EmptyFramePolicy::Zeros,
    };
    let mut acquisition = AcquisitionLoop::new(&catalog, settings, ProcessingMode::Accelerated);
    acquisition.run(&mut device, &mut tracker, &mut publisher);
}

#[test]
fn test_capture_timeout_stops_loop() {
    let catalog = JointCatalog::full();
    let mut device = counting_device(3);
    let mut tracker = echo_tracker(one_subject());
    let mut publisher = ConsumerGatedPublisher::new(accepting_outlet());

    let mut acquisition = AcquisitionLoop::new(&catalog, limited(10), ProcessingMode::Accelerated);
    let outcome = acquisition.run(&mut device, &mut tracker, &mut publisher);

    match outcome {
        LoopOutcome::Fault(StreamError::Capture(WaitError::Timeout)) => {}
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(acquisition.state().iterations, 3);
    assert_eq!(publisher.stats().published, 3);
}

#[test]
fn test_enqueue_failure_is_a_fault() {
    let catalog = JointCatalog::full();
    let mut device = counting_device(10);
    let mut tracker = MockTracker::new();
    tracker
        .expect_enqueue_capture()
        .times(1)
        .returning(|_, _| Err(WaitError::Failed(-5)));
    tracker.expect_pop_result().times(0);

    let mut publisher = ConsumerGatedPublisher::new(accepting_outlet());
    let mut acquisition = AcquisitionLoop::new(&catalog, limited(10), ProcessingMode::Accelerated);
    let outcome = acquisition.run(&mut device, &mut tracker, &mut publisher);

    match outcome {
        LoopOutcome::Fault(e) => {
            assert!(matches!(e, StreamError::Enqueue(WaitError::Failed(-5))));
            assert!(e.to_string().contains("Add capture to tracker process queue"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_pop_timeout_is_a_fault() {
    let catalog = JointCatalog::full();
    let mut device = counting_device(10);
    let mut tracker = MockTracker::new();
    tracker.expect_enqueue_capture().returning(|_, _| Ok(()));
    tracker
        .expect_pop_result()
        .times(1)
        .returning(|_| Err(WaitError::Timeout));

    let mut outlet = MockStreamOutlet::new();
    outlet.expect_push_sample().times(0);
    let mut publisher = ConsumerGatedPublisher::new(outlet);

    let mut acquisition = AcquisitionLoop::new(&catalog, limited(10), ProcessingMode::Accelerated);
    let outcome = acquisition.run(&mut device, &mut tracker, &mut publisher);

    assert!(matches!(
        outcome,
        LoopOutcome::Fault(StreamError::PopResult(WaitError::Timeout))
    ));
}

#[test]
fn test_missing_skeleton_is_a_fault() {
    let catalog = JointCatalog::full();
    let mut device = counting_device(10);
    let mut tracker = echo_tracker(FrameBuilder::new().claim_bodies(1).build());

    let mut outlet = MockStreamOutlet::new();
    outlet.expect_push_sample().times(0);
    let mut publisher = ConsumerGatedPublisher::new(outlet);

    let mut acquisition = AcquisitionLoop::new(&catalog, limited(10), ProcessingMode::Accelerated);
    let outcome = acquisition.run(&mut device, &mut tracker, &mut publisher);

    assert!(matches!(
        outcome,
        LoopOutcome::Fault(StreamError::Extraction(_))
    ));
}

#[test]
fn test_rejected_samples_do_not_stop_loop() {
    let catalog = JointCatalog::full();
    let mut device = counting_device(10);
    let mut tracker = echo_tracker(one_subject());

    let handle = MemoryOutletHandle::new();
    handle.set_fail_pushes(true);
    let mut publisher = ConsumerGatedPublisher::new(handle.outlet());

    let mut acquisition = AcquisitionLoop::new(&catalog, limited(5), ProcessingMode::Accelerated);
    let outcome = acquisition.run(&mut device, &mut tracker, &mut publisher);

    assert!(outcome.is_completed());
    assert_eq!(publisher.stats().failed, 5);
}
