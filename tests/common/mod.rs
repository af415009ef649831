//! Scripted renderer shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use lottie_sprites::{
    ImageHandle, LoadRequest, PipelineEvent, PipelineHandle, PipelineObserver, PreviewSink,
    Readiness, ReadySignal, Renderer,
};

/// Every command a renderer received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(LoadRequest),
    SetFrame(u64),
    Play,
    Stop,
    SetLoop(bool),
    Resize(u32, u32),
    Capture(u64),
}

/// How [`MockRenderer::load`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadBehavior {
    #[default]
    Ready,
    Fail,
    /// Keep the signal in [`MockRenderer::pending_signal`] for the test to fire.
    Hold,
}

#[derive(Debug, Default)]
pub struct MockRenderer {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub load_behavior: LoadBehavior,
    pub pending_signal: Option<ReadySignal>,
    /// Source frames whose capture yields nothing.
    pub blank_frames: HashSet<u64>,
    /// Source frames whose capture never finishes in reasonable time.
    pub stalled_frames: HashSet<u64>,
    /// Capture of this source frame waits until the notify fires.
    pub gate: Option<(u64, Arc<Notify>)>,
    current: u64,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blank_frames(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.blank_frames.extend(frames);
        self
    }

    pub fn with_stalled_frames(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.stalled_frames.extend(frames);
        self
    }

    pub fn with_gate(mut self, frame: u64, release: Arc<Notify>) -> Self {
        self.gate = Some((frame, release));
        self
    }

    pub fn with_load_behavior(mut self, behavior: LoadBehavior) -> Self {
        self.load_behavior = behavior;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Source frames captured, in capture order.
    pub fn captured(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Capture(frame) => Some(frame),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Bytes the mock returns for source frame `frame`.
pub fn payload(frame: u64) -> Vec<u8> {
    format!("frame-{frame}").into_bytes()
}

impl Renderer for MockRenderer {
    fn load(&mut self, request: LoadRequest) -> Readiness {
        self.record(Call::Load(request));
        match self.load_behavior {
            LoadBehavior::Ready => Readiness::ready(),
            LoadBehavior::Fail => Readiness::failed("corrupt animation"),
            LoadBehavior::Hold => {
                let (signal, readiness) = Readiness::channel();
                self.pending_signal = Some(signal);
                readiness
            }
        }
    }

    fn set_frame(&mut self, frame: u64) {
        self.current = frame;
        self.record(Call::SetFrame(frame));
    }

    fn play(&mut self) {
        self.record(Call::Play);
    }

    fn stop(&mut self) {
        self.record(Call::Stop);
    }

    fn set_loop(&mut self, looping: bool) {
        self.record(Call::SetLoop(looping));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.record(Call::Resize(width, height));
    }

    async fn capture_frame(&mut self) -> Option<Vec<u8>> {
        let frame = self.current;
        self.record(Call::Capture(frame));
        if let Some((gated, release)) = &self.gate {
            if *gated == frame {
                release.notified().await;
            }
        }
        if self.stalled_frames.contains(&frame) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.blank_frames.contains(&frame) {
            return None;
        }
        Some(payload(frame))
    }
}

/// Observer recording every event.
#[derive(Default)]
pub struct EventLog {
    pub events: Mutex<Vec<PipelineEvent>>,
    pub progress: Mutex<Vec<u64>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineObserver for EventLog {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn on_progress(&self, info: &lottie_sprites::ProgressInfo) {
        self.progress.lock().unwrap().push(info.current);
    }
}

/// Observer that cancels the run right after output frame `after` renders.
pub struct CancelAfter {
    pub handle: PipelineHandle,
    pub after: u64,
}

impl PipelineObserver for CancelAfter {
    fn on_event(&self, event: &PipelineEvent) {
        if let PipelineEvent::FrameRendered { index, .. } = event {
            if *index == self.after {
                self.handle.cancel();
            }
        }
    }
}

/// Preview sink recording shown indices.
#[derive(Default)]
pub struct Screen {
    pub shown: Mutex<Vec<u64>>,
    pub hidden: Mutex<u32>,
}

impl Screen {
    pub fn shown(&self) -> Vec<u64> {
        self.shown.lock().unwrap().clone()
    }
}

impl PreviewSink for Screen {
    fn show(&self, index: u64, _image: &ImageHandle) {
        self.shown.lock().unwrap().push(index);
    }

    fn hide(&self) {
        *self.hidden.lock().unwrap() += 1;
    }
}
