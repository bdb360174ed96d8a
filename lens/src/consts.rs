//! Shared numeric constants for the lens crate.

// ── Calibration ─────────────────────────────────────────────────

/// Source pixels per centimeter when no calibration is configured.
pub const DEFAULT_PIXELS_PER_CM: f64 = 20.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space pick radius in pixels for grabbing a measurement point.
pub const HIT_RADIUS_PX: f64 = 20.0;

// ── Zoom ────────────────────────────────────────────────────────

/// Smallest allowed `Transformation::scale`.
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed `Transformation::scale`.
pub const MAX_SCALE: f64 = 10.0;

/// Multiplicative step for the zoom-in / zoom-out controls.
pub const ZOOM_STEP: f64 = 1.25;

/// Wheel delta (pixels) to exponent multiplier for wheel zoom.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.001;

// ── Markers ─────────────────────────────────────────────────────

/// Radius of an unselected point marker, in screen pixels.
pub const MARKER_RADIUS_PX: f64 = 6.0;

/// Radius of the selected point marker, in screen pixels.
pub const SELECTED_MARKER_RADIUS_PX: f64 = 8.0;

/// Offset from a marker to its letter label, in screen pixels.
pub const MARKER_LABEL_OFFSET_PX: f64 = 10.0;

/// Shadow blur applied to ink strokes.
pub const STROKE_GLOW_BLUR: f64 = 10.0;

// ── Overlay style ───────────────────────────────────────────────

/// Accent colour for shape outlines, markers and labels.
pub const ACCENT_COLOR: &str = "#FACC15";

/// Translucent fill for closed shapes.
pub const SHAPE_FILL: &str = "rgba(250, 204, 21, 0.2)";

/// Outline width for shape previews, in screen pixels.
pub const SHAPE_LINE_WIDTH_PX: f64 = 2.0;

/// Dash segment length for shape previews, in screen pixels.
pub const SHAPE_DASH_PX: f64 = 5.0;

/// Font for marker letters and measurement labels.
pub const LABEL_FONT: &str = "bold 14px Inter";

/// Top-left inset of the measurement label block, in screen pixels.
pub const LABEL_INSET_PX: f64 = 16.0;

/// Line height of the measurement label block, in screen pixels.
pub const LABEL_LINE_HEIGHT_PX: f64 = 20.0;

/// Radius of the whiteboard pen reticle, in screen pixels.
pub const PEN_RETICLE_RADIUS_PX: f64 = 20.0;

// ── Brush ───────────────────────────────────────────────────────

/// Ink colours offered by the whiteboard palette.
pub const BRUSH_COLORS: [&str; 5] = ["#FACC15", "#FFFFFF", "#22D3EE", "#F472B6", "#4ADE80"];

/// Ink widths offered by the whiteboard palette, in image pixels at scale 1.
pub const BRUSH_WIDTHS: [f64; 4] = [2.0, 5.0, 8.0, 12.0];

// ── Hand tracking ───────────────────────────────────────────────

/// Landmark index of the index fingertip in a hand-landmark set.
pub const FINGERTIP_LANDMARK: usize = 8;

// ── Live streaming ──────────────────────────────────────────────

/// Minimum spacing between forwarded video frames, in milliseconds.
pub const STREAM_FRAME_INTERVAL_MS: f64 = 1500.0;

/// Downsampled frame size sent to the streaming session.
pub const STREAM_FRAME_WIDTH: u32 = 320;
pub const STREAM_FRAME_HEIGHT: u32 = 240;

/// JPEG quality for streamed frames.
pub const STREAM_JPEG_QUALITY: f64 = 0.6;

/// Microphone capture rate, in Hz.
pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Model audio output rate, in Hz.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

// ── Collaborator events ─────────────────────────────────────────

/// Bounded capacity of the collaborator event queue. Drained once per frame.
pub const EVENT_QUEUE_CAPACITY: usize = 256;
