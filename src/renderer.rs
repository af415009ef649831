//! The renderer contract.
//!
//! Rasterizing a Lottie animation is left to an external renderer (a browser
//! player, a native Lottie engine, a test double). The pipeline drives it
//! through [`Renderer`]: load a source, seek, capture. A renderer holds a
//! single current frame of state and is never used concurrently.
//!
//! Loading is asynchronous. [`Renderer::load`] returns a [`Readiness`]
//! future that resolves once the source has finished loading; the renderer
//! keeps the paired [`ReadySignal`] and fires it exactly once.
//!
//! # Example
//!
//! ```
//! use lottie_sprites::{LoadRequest, Readiness, Renderer};
//!
//! /// Renders every frame as a fixed payload.
//! struct Solid {
//!     frame: u64,
//! }
//!
//! impl Renderer for Solid {
//!     fn load(&mut self, _request: LoadRequest) -> Readiness {
//!         Readiness::ready()
//!     }
//!     fn set_frame(&mut self, frame: u64) {
//!         self.frame = frame;
//!     }
//!     fn play(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn set_loop(&mut self, _looping: bool) {}
//!     fn resize(&mut self, _width: u32, _height: u32) {}
//!     async fn capture_frame(&mut self) -> Option<Vec<u8>> {
//!         Some(vec![self.frame as u8])
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, Receiver, Sender};

use crate::error::SpriteError;

/// Parameters for [`Renderer::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Animation source, as given in
    /// [`AnimationDescriptor::source_url`](crate::AnimationDescriptor::source_url).
    pub source: String,
    /// Start playing as soon as the source is loaded.
    pub autoplay: bool,
    /// Loop playback.
    pub looping: bool,
}

impl LoadRequest {
    /// Request used for extraction: no autoplay, no looping.
    pub fn for_extraction(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            autoplay: false,
            looping: false,
        }
    }

    /// Request used for live display: autoplay and loop.
    pub fn for_playback(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            autoplay: true,
            looping: true,
        }
    }
}

/// An external, stateful animation renderer.
pub trait Renderer {
    /// Begin loading `request.source`. Seeking before the returned
    /// [`Readiness`] resolves is undefined.
    fn load(&mut self, request: LoadRequest) -> Readiness;

    /// Seek to source frame `frame`.
    fn set_frame(&mut self, frame: u64);

    /// Resume playback.
    fn play(&mut self);

    /// Stop playback.
    fn stop(&mut self);

    /// Enable or disable looping.
    fn set_loop(&mut self, looping: bool);

    /// Resize the render surface.
    fn resize(&mut self, width: u32, height: u32);

    /// Rasterize the current frame to PNG. `None` means the capture produced
    /// no data.
    fn capture_frame(&mut self) -> impl Future<Output = Option<Vec<u8>>> + Send;
}

/// One-shot future resolving when a renderer finishes loading a source.
///
/// Consumed by the pipeline exactly once per run; dropping it detaches the
/// run from the renderer's signal.
pub struct Readiness {
    receiver: Receiver<Result<(), String>>,
}

impl Readiness {
    /// Create a linked signal/future pair.
    pub fn channel() -> (ReadySignal, Readiness) {
        let (sender, receiver) = oneshot::channel();
        (ReadySignal { sender }, Readiness { receiver })
    }

    /// A readiness future that is already resolved.
    pub fn ready() -> Self {
        let (signal, readiness) = Self::channel();
        signal.ready();
        readiness
    }

    /// A readiness future that already failed with `reason`.
    pub fn failed(reason: impl Into<String>) -> Self {
        let (signal, readiness) = Self::channel();
        signal.fail(reason);
        readiness
    }
}

impl Future for Readiness {
    type Output = Result<(), SpriteError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|result| match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(SpriteError::RendererLoad(reason)),
            Err(_) => Err(SpriteError::RendererLoad(
                "renderer dropped the load signal".to_string(),
            )),
        })
    }
}

/// Renderer-side half of a [`Readiness`] pair.
#[derive(Debug)]
pub struct ReadySignal {
    sender: Sender<Result<(), String>>,
}

impl ReadySignal {
    /// Report that the source finished loading.
    pub fn ready(self) {
        // The waiting run may already be gone.
        let _ = self.sender.send(Ok(()));
    }

    /// Report that loading failed.
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.sender.send(Err(reason.into()));
    }
}
