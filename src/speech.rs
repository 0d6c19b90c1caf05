use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CaptureError;
use crate::parser::Transcript;

/// Speech-to-text capability. Injected into the driver at construction;
/// never reached through global state. One call yields one finished
/// transcript (or a typed failure), locale fixed to German.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Resolves when the user finished speaking or `cancel` fires.
    async fn capture(&self, cancel: CancellationToken) -> Result<Transcript, CaptureError>;
    /// Halt any in-flight capture immediately.
    fn stop(&self);
}

/// Text-to-speech capability with an explicit completion signal.
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    async fn speak(&self, text: &str) -> anyhow::Result<()>;
    fn stop(&self);
}

/// Capture backed by a prepared script of results. Used by the demo
/// driver and the integration tests; real recognizer backends implement
/// the same trait.
#[derive(Default)]
pub struct ScriptedCapture {
    queue: Mutex<VecDeque<Result<Transcript, CaptureError>>>,
}

impl ScriptedCapture {
    pub fn new(results: Vec<Result<Transcript, CaptureError>>) -> Self {
        Self {
            queue: Mutex::new(results.into()),
        }
    }

    pub fn push(&self, result: Result<Transcript, CaptureError>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(result);
        }
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn capture(&self, cancel: CancellationToken) -> Result<Transcript, CaptureError> {
        if cancel.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }
        let next = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| {
            Err(CaptureError::Unavailable("script exhausted".to_string()))
        })
    }

    fn stop(&self) {}
}

/// Synthesis that logs instead of speaking. Completion is immediate.
#[derive(Default)]
pub struct ConsoleSpeech;

#[async_trait]
impl SpeechSynthesis for ConsoleSpeech {
    async fn speak(&self, text: &str) -> anyhow::Result<()> {
        info!(target: "tts", "{text}");
        Ok(())
    }

    fn stop(&self) {}
}
