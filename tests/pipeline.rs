//! Extraction pipeline integration tests.
//!
//! Every test drives [`MockRenderer`], a scripted stand-in for a Lottie
//! player, and checks the order and outcome of the commands it receives.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use common::{CancelAfter, Call, EventLog, LoadBehavior, MockRenderer, payload};
use lottie_sprites::{
    AnimationDescriptor, ExtractionPipeline, LoadRequest, PipelineEvent, PipelineOptions,
    PipelineState, SpriteError, compute_mapping,
};

fn descriptor(frames: u64) -> AnimationDescriptor {
    AnimationDescriptor::new("mock://spin.json", 64, 32, frames, 30.0).unwrap()
}

// ── Sequential capture ─────────────────────────────────────────────

#[tokio::test]
async fn captures_follow_the_mapping_in_order() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    let mapping = compute_mapping(10, 5);

    let summary = pipeline.extract(&descriptor(10), mapping).await.unwrap();

    assert_eq!(summary.rendered, 5);
    assert_eq!(summary.failed, 0);
    assert!(!summary.cancelled);
    assert_eq!(pipeline.state(), PipelineState::Completed);
    assert_eq!(pipeline.renderer().captured(), vec![0, 2, 4, 6, 8]);

    let frames = pipeline.frames();
    assert_eq!(frames.indices(), vec![0, 1, 2, 3, 4]);
    let third = frames.frame(3).unwrap();
    assert_eq!(third.source_index, 6);
    assert_eq!(third.image.bytes(), payload(6).as_slice());
}

#[tokio::test]
async fn every_capture_is_preceded_by_stop_and_seek() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    pipeline
        .extract(&descriptor(4), compute_mapping(4, 2))
        .await
        .unwrap();

    let calls = pipeline.renderer().calls();
    for (position, call) in calls.iter().enumerate() {
        if let Call::Capture(frame) = call {
            assert_eq!(calls[position - 1], Call::SetFrame(*frame));
            assert_eq!(calls[position - 2], Call::Stop);
        }
    }
}

#[tokio::test]
async fn upsampling_repeats_source_frames() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    pipeline
        .extract(&descriptor(4), compute_mapping(4, 10))
        .await
        .unwrap();

    assert_eq!(
        pipeline.renderer().captured(),
        vec![0, 0, 0, 1, 1, 2, 2, 2, 3, 3]
    );
    assert_eq!(pipeline.frames().len(), 10);
}

#[tokio::test]
async fn source_is_loaded_for_extraction() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    pipeline
        .extract(&descriptor(3), compute_mapping(3, 3))
        .await
        .unwrap();

    assert_eq!(
        pipeline.renderer().calls()[0],
        Call::Load(LoadRequest::for_extraction("mock://spin.json"))
    );
}

#[tokio::test]
async fn completion_restores_looping_playback() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    pipeline
        .extract(&descriptor(3), compute_mapping(3, 3))
        .await
        .unwrap();

    let calls = pipeline.renderer().calls();
    assert_eq!(
        calls[calls.len() - 3..],
        [Call::SetLoop(true), Call::SetFrame(0), Call::Play]
    );
}

// ── Failures ───────────────────────────────────────────────────────

#[tokio::test]
async fn failed_captures_are_skipped_and_reported() {
    let log = Arc::new(EventLog::default());
    let renderer = MockRenderer::new().with_blank_frames([2]);
    let mut pipeline = ExtractionPipeline::new(renderer);
    pipeline.subscribe(log.clone());

    let summary = pipeline
        .extract(&descriptor(4), compute_mapping(4, 4))
        .await
        .unwrap();

    assert_eq!(summary.rendered, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(pipeline.frames().indices(), vec![0, 1, 3]);

    let events = log.events();
    assert!(events.iter().any(|event| matches!(
        event,
        PipelineEvent::FrameFailed { index: 2, .. }
    )));
    assert!(matches!(events.last(), Some(PipelineEvent::Done(done)) if *done == summary));
}

#[tokio::test]
async fn readiness_failure_returns_to_idle() {
    let renderer = MockRenderer::new().with_load_behavior(LoadBehavior::Fail);
    let mut pipeline = ExtractionPipeline::new(renderer);

    let result = pipeline
        .extract(&descriptor(4), compute_mapping(4, 4))
        .await;

    assert!(matches!(result, Err(SpriteError::RendererLoad(_))));
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert!(pipeline.renderer().captured().is_empty());
    assert!(pipeline.frames().is_empty());

    let calls = pipeline.renderer().calls();
    assert_eq!(
        calls[calls.len() - 3..],
        [Call::SetLoop(true), Call::SetFrame(0), Call::Play]
    );
}

#[tokio::test(start_paused = true)]
async fn stalled_capture_times_out() {
    let renderer = MockRenderer::new().with_stalled_frames([1]);
    let options = PipelineOptions::new().with_capture_timeout(Duration::from_secs(2));
    let mut pipeline = ExtractionPipeline::with_options(renderer, options);

    let summary = pipeline
        .extract(&descriptor(3), compute_mapping(3, 3))
        .await
        .unwrap();

    assert_eq!(summary.rendered, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(pipeline.frames().indices(), vec![0, 2]);
}

// ── Lifecycle ──────────────────────────────────────────────────────

#[tokio::test]
async fn start_is_rejected_while_running() {
    let renderer = MockRenderer::new().with_load_behavior(LoadBehavior::Hold);
    let mut pipeline = ExtractionPipeline::new(renderer);
    let mapping = compute_mapping(4, 4);

    pipeline.start(&descriptor(4), mapping.clone()).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Running);

    let second = pipeline.start(&descriptor(4), mapping);
    assert!(matches!(
        second,
        Err(SpriteError::AlreadyRunning {
            state: PipelineState::Running
        })
    ));

    pipeline.renderer_mut().pending_signal.take().unwrap().ready();
    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.rendered, 4);
}

#[tokio::test]
async fn empty_mapping_is_rejected_without_state_change() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    let result = pipeline.start(&descriptor(4), compute_mapping(4, 0));

    assert!(matches!(result, Err(SpriteError::EmptyMapping)));
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.frames().generation(), 0);
    assert!(pipeline.renderer().calls().is_empty());
}

#[tokio::test]
async fn empty_mapping_after_a_run_returns_to_idle() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    pipeline
        .extract(&descriptor(3), compute_mapping(3, 3))
        .await
        .unwrap();
    assert_eq!(pipeline.state(), PipelineState::Completed);

    let result = pipeline.start(&descriptor(3), compute_mapping(3, 0));

    assert!(matches!(result, Err(SpriteError::EmptyMapping)));
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.frames().indices(), vec![0, 1, 2]);
    assert!(matches!(pipeline.run().await, Err(SpriteError::NotStarted)));
}

#[tokio::test]
async fn run_without_start_fails() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    assert!(matches!(pipeline.run().await, Err(SpriteError::NotStarted)));
}

#[tokio::test]
async fn restart_releases_previous_frames() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    pipeline
        .extract(&descriptor(4), compute_mapping(4, 4))
        .await
        .unwrap();

    let old_key = pipeline.frames().key(1).unwrap();
    let released: Vec<_> = pipeline
        .frames()
        .iter()
        .map(|frame| frame.image.downgrade())
        .collect();

    pipeline
        .extract(&descriptor(4), compute_mapping(4, 2))
        .await
        .unwrap();

    assert!(released.iter().all(|weak| weak.is_released()));
    assert_eq!(pipeline.frames().indices(), vec![0, 1]);
    assert!(matches!(
        pipeline.frames().get(old_key),
        Err(SpriteError::StaleReference { .. })
    ));
}

#[tokio::test]
async fn reset_abandons_a_run_that_was_never_driven() {
    let renderer = MockRenderer::new().with_load_behavior(LoadBehavior::Hold);
    let mut pipeline = ExtractionPipeline::new(renderer);
    pipeline
        .start(&descriptor(2), compute_mapping(2, 2))
        .unwrap();
    assert_eq!(pipeline.state(), PipelineState::Running);

    pipeline.reset().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert!(matches!(pipeline.run().await, Err(SpriteError::NotStarted)));

    // The abandoned load signal firing late changes nothing.
    let stale = pipeline.renderer_mut().pending_signal.take().unwrap();
    pipeline
        .start(&descriptor(2), compute_mapping(2, 2))
        .unwrap();
    stale.ready();
    pipeline.renderer_mut().pending_signal.take().unwrap().ready();

    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.rendered, 2);
    assert_eq!(pipeline.state(), PipelineState::Completed);
}

// ── Cancellation ───────────────────────────────────────────────────

#[tokio::test]
async fn cancel_stops_after_the_current_frame() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    pipeline.subscribe(Arc::new(CancelAfter {
        handle: pipeline.handle(),
        after: 2,
    }));

    let summary = pipeline
        .extract(&descriptor(10), compute_mapping(10, 10))
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.rendered, 3);
    assert_eq!(pipeline.frames().indices(), vec![0, 1, 2]);
    assert_eq!(pipeline.renderer().captured(), vec![0, 1, 2]);
    assert_eq!(pipeline.state(), PipelineState::Completed);
}

#[tokio::test]
async fn cancel_during_an_in_flight_capture_lets_it_finish() {
    let release = Arc::new(Notify::new());
    let renderer = MockRenderer::new().with_gate(3, release.clone());
    let mut pipeline = ExtractionPipeline::new(renderer);
    let handle = pipeline.handle();

    // Runs only once the pipeline suspends inside the capture of frame 3.
    let canceller = tokio::spawn(async move {
        let state = handle.state();
        handle.cancel();
        release.notify_one();
        state
    });

    let summary = pipeline
        .extract(&descriptor(8), compute_mapping(8, 8))
        .await
        .unwrap();

    assert_eq!(canceller.await.unwrap(), PipelineState::Running);
    assert!(summary.cancelled);
    assert_eq!(pipeline.frames().indices(), vec![0, 1, 2, 3]);
    assert_eq!(pipeline.renderer().captured(), vec![0, 1, 2, 3]);
    assert!(!pipeline.renderer().calls().contains(&Call::SetFrame(4)));
    assert_eq!(pipeline.state(), PipelineState::Completed);
}

#[tokio::test]
async fn cancel_before_readiness_renders_nothing() {
    let renderer = MockRenderer::new().with_load_behavior(LoadBehavior::Hold);
    let mut pipeline = ExtractionPipeline::new(renderer);
    pipeline
        .start(&descriptor(5), compute_mapping(5, 5))
        .unwrap();

    assert!(pipeline.cancel());
    assert_eq!(pipeline.state(), PipelineState::Cancelling);
    assert!(!pipeline.cancel());

    pipeline.renderer_mut().pending_signal.take().unwrap().ready();
    let summary = pipeline.run().await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.rendered, 0);
    assert_eq!(pipeline.state(), PipelineState::Completed);
}

#[tokio::test]
async fn cancel_when_idle_is_a_noop() {
    let pipeline = ExtractionPipeline::new(MockRenderer::new());
    assert!(!pipeline.cancel());
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[tokio::test]
async fn pipeline_can_start_again_after_cancellation() {
    let mut pipeline = ExtractionPipeline::new(MockRenderer::new());
    let id = pipeline.subscribe(Arc::new(CancelAfter {
        handle: pipeline.handle(),
        after: 0,
    }));
    pipeline
        .extract(&descriptor(4), compute_mapping(4, 4))
        .await
        .unwrap();
    assert!(pipeline.unsubscribe(id));

    let summary = pipeline
        .extract(&descriptor(4), compute_mapping(4, 4))
        .await
        .unwrap();
    assert!(!summary.cancelled);
    assert_eq!(summary.rendered, 4);
}

// ── Progress ───────────────────────────────────────────────────────

#[tokio::test]
async fn progress_reports_follow_batch_size() {
    let log = Arc::new(EventLog::default());
    let options = PipelineOptions::new().with_batch_size(2);
    let mut pipeline = ExtractionPipeline::with_options(MockRenderer::new(), options);
    pipeline.subscribe(log.clone());

    pipeline
        .extract(&descriptor(5), compute_mapping(5, 5))
        .await
        .unwrap();

    // Two batch reports plus the final snapshot.
    assert_eq!(*log.progress.lock().unwrap(), vec![2, 4, 5]);
}
