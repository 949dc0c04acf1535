//! Single-slot gate in front of the speech output.
//!
//! At most one utterance is in flight. A request made while one is
//! speaking is dropped, never queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::NavError;
use crate::traits::SpeechSink;

/// Outcome of a speak request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    Started,
    /// Another utterance was still in flight.
    Dropped,
}

/// Marks one in-flight utterance; the slot frees when this is dropped.
#[derive(Debug)]
pub struct Utterance {
    in_flight: Arc<AtomicBool>,
}

impl Drop for Utterance {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct SpeechGate {
    sink: Option<Arc<dyn SpeechSink>>,
    in_flight: Arc<AtomicBool>,
}

impl std::fmt::Debug for SpeechGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechGate")
            .field("has_sink", &self.sink.is_some())
            .field("in_flight", &self.is_speaking())
            .finish()
    }
}

impl SpeechGate {
    pub fn new(sink: Arc<dyn SpeechSink>) -> Self {
        Self {
            sink: Some(sink),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A gate with no speech output behind it.
    pub fn unsupported() -> Self {
        Self {
            sink: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Hands `text` to the sink unless an utterance is already in flight.
    pub fn speak(&self, text: &str) -> Result<SpeakOutcome, NavError> {
        let sink = self.sink.as_ref().ok_or(NavError::SpeechUnsupported)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(text, "speech busy, dropping announcement");
            return Ok(SpeakOutcome::Dropped);
        }

        sink.speak(
            text,
            Utterance {
                in_flight: Arc::clone(&self.in_flight),
            },
        );
        Ok(SpeakOutcome::Started)
    }
}
