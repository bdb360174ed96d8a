//! Message passing from asynchronous collaborators into the engine.
//!
//! The hand tracker and the streaming session finish their work on their own
//! schedule. Rather than reaching into engine state from those callbacks,
//! they post a typed [`CollaboratorEvent`] through an [`EventSender`]; the
//! frame loop drains the single [`EventQueue`] once per cycle and hands each
//! event to the engine, so the sketch keeps exactly one writer.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::warn;

use crate::camera::Point;
use crate::consts::{EVENT_QUEUE_CAPACITY, FINGERTIP_LANDMARK};

/// A result delivered by an external collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum CollaboratorEvent {
    /// One hand-tracking cycle. `point` is the fingertip in normalized image
    /// space, or `None` when no hand was present.
    HandDetected { point: Option<Point> },
    /// Transcript text from the streaming model.
    TranscriptChunk { text: String },
    /// Raw 16-bit little-endian PCM from the streaming model.
    AudioChunk { bytes: Vec<u8> },
    /// The model was interrupted; queued playback must stop.
    Interrupted,
}

impl CollaboratorEvent {
    /// Build a detection event from one hand's landmark set.
    ///
    /// An empty set, or one too short to contain the fingertip, means no hand.
    #[must_use]
    pub fn from_landmarks(landmarks: &[Point]) -> Self {
        Self::HandDetected { point: landmarks.get(FINGERTIP_LANDMARK).copied() }
    }

    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HandDetected { .. } => "hand_detected",
            Self::TranscriptChunk { .. } => "transcript_chunk",
            Self::AudioChunk { .. } => "audio_chunk",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Create a connected sender/queue pair.
#[must_use]
pub fn channel() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    (EventSender { tx }, EventQueue { rx })
}

/// Cloneable posting handle given to collaborators.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<CollaboratorEvent>,
}

impl EventSender {
    /// Best-effort, non-blocking post.
    ///
    /// A full or closed queue drops the event with a warning; a lost cycle
    /// only delays the next detection. Audio is lossy under backpressure: a
    /// dropped chunk is a gap in playback, so it gets its own warning.
    /// Returns whether the event was queued.
    pub fn post(&self, event: CollaboratorEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(CollaboratorEvent::AudioChunk { bytes })) => {
                warn!(bytes = bytes.len(), "collaborator event queue full; dropping audio, playback will skip");
                false
            }
            Err(TrySendError::Full(event)) => {
                warn!(kind = event.kind(), "collaborator event queue full; dropping event");
                false
            }
            Err(TrySendError::Closed(event)) => {
                warn!(kind = event.kind(), "collaborator event queue closed; dropping event");
                false
            }
        }
    }
}

/// Single-consumer end, owned by the frame loop.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::Receiver<CollaboratorEvent>,
}

impl EventQueue {
    /// Take every event posted so far, in arrival order. Never blocks.
    pub fn drain(&mut self) -> Vec<CollaboratorEvent> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => out.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Stop accepting new events. Already queued events can still be drained.
    pub fn close(&mut self) {
        self.rx.close();
    }
}
