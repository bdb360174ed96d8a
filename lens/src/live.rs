//! Live AI session: the resource that owns the streaming collaborator.
//!
//! DESIGN
//! ======
//! The camera/microphone tracks, the outbound streaming session and the
//! audio output are three separately acquired resources. [`LiveSession`]
//! owns all of them behind small traits so the hosting view only ever sees
//! `start`, the send helpers and `teardown`. Teardown runs once, in a fixed
//! order: stop inbound tracks, close the outbound session, close audio. A
//! dropped session tears itself down.
//!
//! The rest of the module is the wire plumbing around that session: 16-bit
//! PCM codecs, base64 media blobs, the outbound frame throttle, and the
//! gapless playback clock for model audio.
//!
//! ERROR HANDLING
//! ==============
//! Sends are fire-and-forget from the core's point of view. A failed send is
//! returned as [`LiveError::Send`] and logged; it never changes session state.

#[cfg(test)]
#[path = "live_test.rs"]
mod live_test;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LensConfig;

/// MIME type of outbound video frames.
pub const JPEG_MIME: &str = "image/jpeg";

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors produced by the live session and its codecs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiveError {
    #[error("session already started")]
    AlreadyStarted,
    #[error("session not started")]
    NotStarted,
    #[error("session closed")]
    Closed,
    /// The collaborator rejected an outbound chunk.
    #[error("send failed: {0}")]
    Send(String),
    /// Inbound media could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),
}

// =============================================================================
// MEDIA BLOBS AND PCM
// =============================================================================

/// A base64 payload tagged with its MIME type, as the streaming API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBlob {
    pub data: String,
    pub mime_type: String,
}

/// Convert float samples in `[-1, 1]` to 16-bit little-endian PCM. Out-of-range samples clip.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let scaled = if s.is_nan() { 0.0 } else { (s * 32768.0).clamp(-32768.0, 32767.0) };
        out.extend_from_slice(&(scaled as i16).to_le_bytes());
    }
    out
}

/// Convert 16-bit little-endian PCM to float samples in `[-1, 1)`.
///
/// # Errors
///
/// Returns [`LiveError::Decode`] if the byte count is odd.
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<f32>, LiveError> {
    if bytes.len() % 2 != 0 {
        return Err(LiveError::Decode(format!("odd PCM byte count {}", bytes.len())));
    }
    Ok(bytes.chunks_exact(2).map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0).collect())
}

/// Decode a base64 PCM chunk as delivered by the model.
///
/// # Errors
///
/// Returns [`LiveError::Decode`] for invalid base64 or an odd byte count.
pub fn decode_audio_base64(data: &str) -> Result<Vec<u8>, LiveError> {
    let bytes = STANDARD.decode(data).map_err(|e| LiveError::Decode(e.to_string()))?;
    if bytes.len() % 2 != 0 {
        return Err(LiveError::Decode(format!("odd PCM byte count {}", bytes.len())));
    }
    Ok(bytes)
}

/// Microphone samples as an outbound PCM blob at `sample_rate`.
#[must_use]
pub fn pcm_blob(samples: &[f32], sample_rate: u32) -> MediaBlob {
    MediaBlob { data: STANDARD.encode(encode_pcm16(samples)), mime_type: format!("audio/pcm;rate={sample_rate}") }
}

/// Turn a `data:image/jpeg;base64,...` URL from a canvas into an outbound frame blob.
///
/// # Errors
///
/// Returns [`LiveError::Decode`] if the URL is not a base64 JPEG data URL.
pub fn jpeg_blob(data_url: &str) -> Result<MediaBlob, LiveError> {
    let data = data_url
        .strip_prefix(JPEG_DATA_URL_PREFIX)
        .ok_or_else(|| LiveError::Decode("expected a base64 JPEG data URL".into()))?;
    if data.is_empty() {
        return Err(LiveError::Decode("empty frame".into()));
    }
    Ok(MediaBlob { data: data.to_owned(), mime_type: JPEG_MIME.to_owned() })
}

// =============================================================================
// FRAME THROTTLE / PLAYBACK CLOCK
// =============================================================================

/// Lets at most one frame through per interval.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval_ms: f64,
    last_sent_ms: Option<f64>,
}

impl FrameThrottle {
    #[must_use]
    pub fn new(interval_ms: f64) -> Self {
        Self { interval_ms, last_sent_ms: None }
    }

    /// Whether a frame may be sent at `now_ms`.
    #[must_use]
    pub fn is_due_at(&self, now_ms: f64) -> bool {
        self.last_sent_ms.is_none_or(|last| now_ms - last >= self.interval_ms)
    }

    /// Claim the slot at `now_ms` if it is due. Returns whether it was claimed.
    pub fn try_acquire_at(&mut self, now_ms: f64) -> bool {
        if !self.is_due_at(now_ms) {
            return false;
        }
        self.last_sent_ms = Some(now_ms);
        true
    }

    pub fn reset(&mut self) {
        self.last_sent_ms = None;
    }
}

/// Schedules audio chunks back to back on an output clock, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackClock {
    next_start: f64,
}

impl PlaybackClock {
    /// Start time for a chunk of `duration` arriving at `now`; advances the clock.
    pub fn schedule(&mut self, now: f64, duration: f64) -> f64 {
        let start = self.next_start.max(now);
        self.next_start = start + duration.max(0.0);
        start
    }

    /// When the next chunk would start.
    #[must_use]
    pub fn next_start(&self) -> f64 {
        self.next_start
    }

    pub fn reset(&mut self) {
        self.next_start = 0.0;
    }
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Camera and microphone tracks feeding the session.
pub trait InboundMedia {
    /// Stop every track. Called once, during teardown.
    fn stop(&mut self);
}

/// The connection to the streaming model.
pub trait OutboundSession {
    /// Forward one microphone chunk.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Send`] when the connection rejects the chunk.
    fn send_audio(&mut self, blob: &MediaBlob) -> Result<(), LiveError>;

    /// Forward one video frame.
    ///
    /// # Errors
    ///
    /// Returns [`LiveError::Send`] when the connection rejects the frame.
    fn send_frame(&mut self, blob: &MediaBlob) -> Result<(), LiveError>;

    /// Close the connection, cancelling anything still pending.
    fn close(&mut self);
}

/// Speaker output for model audio.
pub trait AudioOutput {
    /// Queue `samples` to start at `start_at` seconds on the output clock.
    fn schedule(&mut self, samples: &[f32], sample_rate: u32, start_at: f64);
    /// Stop every queued or playing source.
    fn stop_all(&mut self);
    /// Release the output device.
    fn close(&mut self);
}

// =============================================================================
// SESSION
// =============================================================================

/// Lifecycle of a [`LiveSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Resources acquired, not yet streaming.
    Idle,
    Active,
    /// Torn down. Terminal.
    Closed,
}

/// The streaming session resource owned by the hosting view.
pub struct LiveSession<M: InboundMedia, O: OutboundSession, A: AudioOutput> {
    inbound: M,
    outbound: O,
    audio: A,
    state: SessionState,
    throttle: FrameThrottle,
    clock: PlaybackClock,
    input_sample_rate: u32,
    output_sample_rate: u32,
}

impl<M: InboundMedia, O: OutboundSession, A: AudioOutput> LiveSession<M, O, A> {
    #[must_use]
    pub fn new(inbound: M, outbound: O, audio: A, config: &LensConfig) -> Self {
        Self {
            inbound,
            outbound,
            audio,
            state: SessionState::Idle,
            throttle: FrameThrottle::new(config.frame_interval_ms),
            clock: PlaybackClock::default(),
            input_sample_rate: config.input_sample_rate,
            output_sample_rate: config.output_sample_rate,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Begin streaming.
    ///
    /// # Errors
    ///
    /// [`LiveError::AlreadyStarted`] if active, [`LiveError::Closed`] after teardown.
    pub fn start(&mut self) -> Result<(), LiveError> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Active;
                info!("live session started");
                Ok(())
            }
            SessionState::Active => Err(LiveError::AlreadyStarted),
            SessionState::Closed => Err(LiveError::Closed),
        }
    }

    /// Forward microphone samples as 16-bit PCM.
    ///
    /// # Errors
    ///
    /// Fails unless active, or if the collaborator rejects the chunk.
    pub fn send_audio(&mut self, samples: &[f32]) -> Result<(), LiveError> {
        self.ensure_active()?;
        let blob = pcm_blob(samples, self.input_sample_rate);
        self.outbound.send_audio(&blob).inspect_err(|err| warn!(error = %err, "audio chunk send failed"))
    }

    /// Whether a video frame would be accepted at `now_ms`. Lets the host skip capture.
    #[must_use]
    pub fn frame_due_at(&self, now_ms: f64) -> bool {
        self.is_active() && self.throttle.is_due_at(now_ms)
    }

    /// Forward a captured JPEG frame if the throttle allows it.
    ///
    /// Returns `Ok(false)` when the frame was throttled.
    ///
    /// # Errors
    ///
    /// Fails unless active, for a malformed data URL, or if the collaborator rejects the frame.
    pub fn send_frame_at(&mut self, now_ms: f64, data_url: &str) -> Result<bool, LiveError> {
        self.ensure_active()?;
        if !self.throttle.is_due_at(now_ms) {
            return Ok(false);
        }
        let blob = jpeg_blob(data_url)?;
        self.throttle.try_acquire_at(now_ms);
        self.outbound.send_frame(&blob).inspect_err(|err| warn!(error = %err, "frame send failed"))?;
        Ok(true)
    }

    /// Queue decoded model audio right after whatever is already queued.
    ///
    /// Returns the scheduled start time in seconds.
    ///
    /// # Errors
    ///
    /// [`LiveError::Closed`] after teardown.
    pub fn play_at(&mut self, now_s: f64, samples: &[f32]) -> Result<f64, LiveError> {
        if self.state == SessionState::Closed {
            return Err(LiveError::Closed);
        }
        let duration = samples.len() as f64 / f64::from(self.output_sample_rate);
        let start = self.clock.schedule(now_s, duration);
        self.audio.schedule(samples, self.output_sample_rate, start);
        Ok(start)
    }

    /// The model was interrupted: silence queued audio and restart the clock.
    pub fn interrupt(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.audio.stop_all();
        self.clock.reset();
        debug!("playback interrupted");
    }

    /// Release everything, exactly once: inbound tracks, then the session, then audio.
    ///
    /// Returns `false` if the session was already torn down.
    pub fn teardown(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        self.state = SessionState::Closed;
        self.inbound.stop();
        self.outbound.close();
        self.audio.stop_all();
        self.audio.close();
        self.throttle.reset();
        self.clock.reset();
        info!("live session torn down");
        true
    }

    fn ensure_active(&self) -> Result<(), LiveError> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Idle => Err(LiveError::NotStarted),
            SessionState::Closed => Err(LiveError::Closed),
        }
    }
}

impl<M: InboundMedia, O: OutboundSession, A: AudioOutput> Drop for LiveSession<M, O, A> {
    fn drop(&mut self) {
        if self.teardown() {
            debug!("live session torn down on drop");
        }
    }
}
