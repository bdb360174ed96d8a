use tracing::{debug, trace, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, HtmlVideoElement};

use crate::camera::{MediaKind, MediaSource, Point, Projection, Size, Transformation};
use crate::config::LensConfig;
use crate::consts::{WHEEL_ZOOM_SENSITIVITY, ZOOM_STEP};
use crate::doc::{Brush, Sketch, Stroke, Vertex, VertexId};
use crate::events::CollaboratorEvent;
use crate::geometry::Measurement;
use crate::hit;
use crate::input::{Button, InputState, Modifiers, UiState, WheelDelta};
use crate::live;
use crate::mode::{MeasurementMode, Placement};
use crate::overlay::{self, Scene, SceneInput};
use crate::render::{self, Background};
use crate::units::Unit;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    ModeChanged(MeasurementMode),
    PointAdded { id: VertexId },
    PointMoved { id: VertexId },
    PointSelected { id: VertexId },
    PointsCleared,
    StrokeCommitted { samples: usize },
    StrokesCleared,
    ViewChanged(Transformation),
    SetCursor(&'static str),
    /// Transcript text just appended. The whole text is [`EngineCore::transcript`].
    TranscriptUpdated(String),
    /// Decoded model audio to schedule for playback.
    PlayAudio(Vec<f32>),
    /// Stop every scheduled audio source.
    StopAudio,
}

/// Core engine state: everything that does not need the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
/// This is the only writer of the sketch and the transform.
pub struct EngineCore {
    pub sketch: Sketch,
    pub transform: Transformation,
    pub ui: UiState,
    pub input: InputState,
    pub media: Option<MediaSource>,
    pub viewport: Size,
    pub dpr: f64,
    pub config: LensConfig,
    transcript: String,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(LensConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: LensConfig) -> Self {
        Self {
            sketch: Sketch::new(),
            transform: Transformation::default(),
            ui: UiState::default(),
            input: InputState::default(),
            media: None,
            viewport: Size::default(),
            dpr: 1.0,
            config,
            transcript: String::new(),
        }
    }

    // --- Media / viewport ---

    /// Swap in a new background. Everything anchored to the old one is dropped.
    ///
    /// A still image switches to DISTANCE; a live video switches to WHITEBOARD.
    pub fn set_media(&mut self, source: MediaSource) -> Vec<Action> {
        self.reset();
        self.media = Some(source);
        let mode = match source.kind {
            MediaKind::Image => MeasurementMode::Distance,
            MediaKind::Video => MeasurementMode::Whiteboard,
        };
        self.ui.mode = mode;
        debug!(kind = ?source.kind, width = source.size.width, height = source.size.height, %mode, "media set");
        vec![Action::PointsCleared, Action::StrokesCleared, Action::ModeChanged(mode), Action::RenderNeeded]
    }

    /// Update the intrinsic size of the current media without touching the sketch.
    ///
    /// Live video only reports its resolution once metadata has loaded.
    pub fn set_media_size(&mut self, size: Size) -> Vec<Action> {
        match self.media.as_mut() {
            Some(media) if media.size != size => {
                media.size = size;
                vec![Action::RenderNeeded]
            }
            _ => Vec::new(),
        }
    }

    /// Drop the background and everything anchored to it.
    pub fn clear_media(&mut self) -> Vec<Action> {
        self.reset();
        self.media = None;
        vec![Action::PointsCleared, Action::StrokesCleared, Action::RenderNeeded]
    }

    /// Clear points, ink, selection and any gesture, and restore the default view.
    pub fn reset(&mut self) {
        self.abandon_gesture();
        self.sketch.clear();
        self.transform.reset();
        self.ui.selected_id = None;
        self.ui.pen = None;
        self.ui.hand_present = false;
    }

    /// Update viewport dimensions (CSS pixels) and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.viewport = Size::new(width_css, height_css);
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        vec![Action::RenderNeeded]
    }

    // --- Mode / unit / brush ---

    /// Switch measurement mode. Always clears the point set, the pen and any gesture.
    pub fn set_mode(&mut self, mode: MeasurementMode) -> Vec<Action> {
        self.abandon_gesture();
        self.sketch.clear_vertices();
        self.ui.selected_id = None;
        self.ui.pen = None;
        self.ui.hand_present = false;
        self.ui.mode = mode;
        debug!(%mode, "mode changed");
        vec![Action::PointsCleared, Action::ModeChanged(mode), Action::SetCursor(cursor_for(mode)), Action::RenderNeeded]
    }

    pub fn set_unit(&mut self, unit: Unit) -> Vec<Action> {
        self.ui.unit = unit;
        vec![Action::RenderNeeded]
    }

    /// Colour for strokes started from now on.
    pub fn set_brush_color(&mut self, color: &str) {
        color.clone_into(&mut self.ui.brush.color);
    }

    /// Width for strokes started from now on. Non-positive widths are ignored.
    pub fn set_brush_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.ui.brush.width = width;
        }
    }

    /// Drop all ink, including a stroke being drawn.
    pub fn clear_strokes(&mut self) -> Vec<Action> {
        if self.input == InputState::Drawing {
            self.input = InputState::Idle;
        }
        self.sketch.clear_strokes();
        vec![Action::StrokesCleared, Action::RenderNeeded]
    }

    /// Sticky pan toggle: while set, every primary press pans.
    pub fn set_pan_lock(&mut self, on: bool) {
        self.ui.pan_lock = on;
    }

    // --- View ---

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.zoom_about(self.viewport_center(), ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.zoom_about(self.viewport_center(), 1.0 / ZOOM_STEP)
    }

    /// Restore the identity transform.
    pub fn reset_view(&mut self) -> Vec<Action> {
        self.transform.reset();
        vec![Action::ViewChanged(self.transform), Action::RenderNeeded]
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if self.input.is_active() || self.media.is_none() || self.is_hand_tracked() {
            return Vec::new();
        }
        let mode = self.ui.mode;

        if mode.is_shape() && button == Button::Primary {
            let projection = self.projection();
            if let Some(hit) = hit::hit_test(screen_pt, self.sketch.vertices(), &projection, self.config.hit_radius_px)
            {
                self.input = InputState::Dragging { id: hit.vertex_id };
                self.ui.selected_id = Some(hit.vertex_id);
                trace!(id = %hit.vertex_id, "drag start");
                return vec![Action::PointSelected { id: hit.vertex_id }, Action::RenderNeeded];
            }
        }

        let wants_pan = match button {
            Button::Primary => modifiers.shift || self.ui.pan_lock,
            Button::Middle => true,
            Button::Secondary => false,
        };
        if wants_pan {
            self.input = InputState::Panning { last_screen: screen_pt };
            trace!("pan start");
            return vec![Action::SetCursor("grabbing")];
        }
        if button != Button::Primary {
            return Vec::new();
        }

        match mode {
            MeasurementMode::Whiteboard => {
                let at = self.to_image(screen_pt);
                self.sketch.begin_stroke(Vertex::new(at), &self.ui.brush);
                self.input = InputState::Drawing;
                self.ui.pen = Some(screen_pt);
                trace!("stroke start");
                vec![Action::RenderNeeded]
            }
            MeasurementMode::LiveAi => Vec::new(),
            _ => self.place_point(screen_pt),
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        if self.is_hand_tracked() {
            return Vec::new();
        }
        self.ui.pen = Some(screen_pt);

        match self.input {
            InputState::Dragging { id } => {
                let at = self.to_image(screen_pt);
                if self.sketch.move_vertex(&id, at) {
                    vec![Action::PointMoved { id }, Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            InputState::Panning { last_screen } => {
                self.transform.pan_by(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                self.input = InputState::Panning { last_screen: screen_pt };
                vec![Action::ViewChanged(self.transform), Action::RenderNeeded]
            }
            InputState::Drawing => {
                let at = self.to_image(screen_pt);
                self.sketch.extend_stroke(Vertex::new(at));
                vec![Action::RenderNeeded]
            }
            InputState::Idle if self.ui.mode == MeasurementMode::Whiteboard => vec![Action::RenderNeeded],
            InputState::Idle => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, _screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if self.is_hand_tracked() {
            // The fingertip owns the stroke; only pointer gestures end here.
            if self.input != InputState::Drawing {
                self.input = InputState::Idle;
            }
            return Vec::new();
        }
        match std::mem::take(&mut self.input) {
            InputState::Drawing => self.commit_stroke(),
            InputState::Panning { .. } => vec![Action::SetCursor(cursor_for(self.ui.mode))],
            InputState::Dragging { id } => {
                trace!(%id, "drag end");
                Vec::new()
            }
            InputState::Idle => Vec::new(),
        }
    }

    /// Zoom about the pointer: scrolling down zooms out.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        self.zoom_about(screen_pt, (-delta.dy * WHEEL_ZOOM_SENSITIVITY).exp())
    }

    // --- Collaborator input ---

    /// One hand-tracking cycle: `fingertip` in normalized image space, or `None` when no hand.
    ///
    /// Presence appearing starts a stroke, each sighting extends it, and
    /// presence vanishing commits it. Ignored unless drawing on live video.
    pub fn on_hand_detection(&mut self, fingertip: Option<Point>) -> Vec<Action> {
        if !self.is_hand_tracked() {
            return Vec::new();
        }
        match fingertip {
            Some(raw) => {
                let at = self.clamp(raw);
                self.ui.hand_present = true;
                self.ui.pen = Some(self.projection().image_to_screen(at));
                if self.input == InputState::Drawing {
                    self.sketch.extend_stroke(Vertex::new(at));
                } else {
                    self.sketch.begin_stroke(Vertex::new(at), &self.ui.brush);
                    self.input = InputState::Drawing;
                    trace!("hand stroke start");
                }
                vec![Action::RenderNeeded]
            }
            None => {
                let was_present = std::mem::replace(&mut self.ui.hand_present, false);
                if self.input == InputState::Drawing {
                    self.input = InputState::Idle;
                    return self.commit_stroke();
                }
                if was_present { vec![Action::RenderNeeded] } else { Vec::new() }
            }
        }
    }

    /// Route one queued collaborator event.
    pub fn apply_event(&mut self, event: CollaboratorEvent) -> Vec<Action> {
        match event {
            CollaboratorEvent::HandDetected { point } => self.on_hand_detection(point),
            CollaboratorEvent::TranscriptChunk { text } => {
                self.transcript.push_str(&text);
                vec![Action::TranscriptUpdated(text)]
            }
            CollaboratorEvent::AudioChunk { bytes } => match live::decode_pcm16(&bytes) {
                Ok(samples) if !samples.is_empty() => vec![Action::PlayAudio(samples)],
                Ok(_) => Vec::new(),
                Err(err) => {
                    warn!(error = %err, "dropping undecodable audio chunk");
                    Vec::new()
                }
            },
            CollaboratorEvent::Interrupted => vec![Action::StopAudio],
        }
    }

    // --- Queries ---

    /// The currently selected point, if any.
    #[must_use]
    pub fn selection(&self) -> Option<VertexId> {
        self.ui.selected_id
    }

    #[must_use]
    pub fn mode(&self) -> MeasurementMode {
        self.ui.mode
    }

    #[must_use]
    pub fn transform(&self) -> Transformation {
        self.transform
    }

    /// Point positions in placement order.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        self.sketch.positions()
    }

    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        self.sketch.strokes()
    }

    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Whether the fingertip, not the pointer, drives the ink.
    #[must_use]
    pub fn is_hand_tracked(&self) -> bool {
        self.ui.mode == MeasurementMode::Whiteboard && self.media.is_some_and(|m| m.kind == MediaKind::Video)
    }

    /// The current image↔screen mapping.
    #[must_use]
    pub fn projection(&self) -> Projection {
        let media = self.media.unwrap_or_default();
        Projection { transform: self.transform, media: media.size, kind: media.kind, viewport: self.viewport }
    }

    /// Measurements for the current points. Empty until the mode has enough points.
    #[must_use]
    pub fn measurements(&self) -> Vec<Measurement> {
        let Some(media) = self.media else {
            return Vec::new();
        };
        self.ui.mode.measure(&self.sketch.positions(), media.size, self.config.pixels_per_cm)
    }

    /// Measurement text in the selected unit, e.g. `Distance: 25.0 cm`.
    #[must_use]
    pub fn measurement_labels(&self) -> Vec<String> {
        self.measurements().iter().map(|m| m.display(self.ui.unit)).collect()
    }

    /// The display list for one frame.
    #[must_use]
    pub fn scene(&self) -> Scene {
        let measurements = self.measurements();
        overlay::build_scene(&SceneInput {
            sketch: &self.sketch,
            ui: &self.ui,
            projection: self.projection(),
            has_media: self.media.is_some(),
            drawing: self.input == InputState::Drawing,
            measurements: &measurements,
        })
    }

    // --- Internals ---

    fn place_point(&mut self, screen_pt: Point) -> Vec<Action> {
        let entry = self.ui.mode.entry();
        let vertex = Vertex::new(self.to_image(screen_pt));
        let added = match entry.placement {
            Placement::Replace => {
                self.sketch.replace_vertices(vertex);
                true
            }
            Placement::Append => self.sketch.push_vertex(vertex, entry.max_points),
        };
        if !added {
            trace!(mode = %entry.mode, cap = entry.max_points, "point cap reached");
            return Vec::new();
        }
        trace!(id = %vertex.id, x = vertex.x, y = vertex.y, "point added");
        vec![Action::PointAdded { id: vertex.id }, Action::RenderNeeded]
    }

    fn commit_stroke(&mut self) -> Vec<Action> {
        let samples = self.sketch.pending_stroke().map_or(0, |s| s.points.len());
        if !self.sketch.commit_stroke() {
            return Vec::new();
        }
        trace!(samples, "stroke committed");
        vec![Action::StrokeCommitted { samples }, Action::RenderNeeded]
    }

    /// Drop any gesture in progress. An unfinished stroke is discarded, not committed.
    fn abandon_gesture(&mut self) {
        if self.sketch.discard_stroke() {
            debug!("in-progress stroke discarded");
        }
        self.input = InputState::Idle;
    }

    fn zoom_about(&mut self, anchor: Point, factor: f64) -> Vec<Action> {
        let (min, max) = (self.config.min_scale, self.config.max_scale);
        if !self.transform.zoom_at(anchor, factor, min, max) {
            return Vec::new();
        }
        vec![Action::ViewChanged(self.transform), Action::RenderNeeded]
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport.width * 0.5, self.viewport.height * 0.5)
    }

    fn to_image(&self, screen_pt: Point) -> Point {
        self.clamp(self.projection().screen_to_image(screen_pt))
    }

    fn clamp(&self, p: Point) -> Point {
        if self.config.clamp_points { Point::new(p.x.clamp(0.0, 1.0), p.y.clamp(0.0, 1.0)) } else { p }
    }
}

fn cursor_for(mode: MeasurementMode) -> &'static str {
    if mode == MeasurementMode::Whiteboard { "none" } else { "crosshair" }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    background: Option<Background>,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, config: LensConfig) -> Self {
        Self { canvas, background: None, core: EngineCore::with_config(config) }
    }

    // --- Media ---

    /// Measure on a decoded still image.
    pub fn set_image(&mut self, image: HtmlImageElement) -> Vec<Action> {
        let source = MediaSource::image(f64::from(image.natural_width()), f64::from(image.natural_height()));
        self.background = Some(Background::Image(image));
        self.core.set_media(source)
    }

    /// Draw on a live camera feed.
    pub fn set_video(&mut self, video: HtmlVideoElement) -> Vec<Action> {
        let source = MediaSource::video(f64::from(video.video_width()), f64::from(video.video_height()));
        self.background = Some(Background::Video(video));
        self.core.set_media(source)
    }

    pub fn clear_media(&mut self) -> Vec<Action> {
        self.background = None;
        self.core.clear_media()
    }

    // --- Delegated state changes ---

    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.core.set_viewport(width_css, height_css, dpr)
    }

    pub fn set_mode(&mut self, mode: MeasurementMode) -> Vec<Action> {
        self.core.set_mode(mode)
    }

    pub fn set_unit(&mut self, unit: Unit) -> Vec<Action> {
        self.core.set_unit(unit)
    }

    pub fn set_brush(&mut self, brush: &Brush) {
        self.core.set_brush_color(&brush.color);
        self.core.set_brush_width(brush.width);
    }

    pub fn clear_strokes(&mut self) -> Vec<Action> {
        self.core.clear_strokes()
    }

    pub fn set_pan_lock(&mut self, on: bool) {
        self.core.set_pan_lock(on);
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.core.zoom_in()
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.core.zoom_out()
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.core.reset_view()
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn apply_event(&mut self, event: CollaboratorEvent) -> Vec<Action> {
        self.core.apply_event(event)
    }

    // --- Render ---

    /// Draw the current state to the canvas. A failed frame is logged and skipped.
    pub fn render(&mut self) {
        if let Err(err) = self.try_render() {
            warn!(error = ?err, "frame render failed; skipping");
        }
    }

    fn try_render(&mut self) -> Result<(), JsValue> {
        if let Some(Background::Video(video)) = &self.background {
            let size = Size::new(f64::from(video.video_width()), f64::from(video.video_height()));
            if size.is_drawable() {
                self.core.set_media_size(size);
            }
        }
        self.sync_backing_store();

        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let scene = self.core.scene();
        render::draw(&ctx, &scene, self.background.as_ref(), self.core.dpr)
    }

    /// Grab a downscaled JPEG of the live feed for the streaming session.
    ///
    /// Returns `None` when the background is not a video.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the scratch canvas cannot be drawn to or encoded.
    pub fn capture_stream_frame(&self, scratch: &HtmlCanvasElement) -> Result<Option<String>, JsValue> {
        let Some(Background::Video(video)) = &self.background else {
            return Ok(None);
        };
        let config = &self.core.config;
        render::capture_frame(
            video,
            scratch,
            config.stream_frame_width,
            config.stream_frame_height,
            config.stream_jpeg_quality,
        )
        .map(Some)
    }

    /// Resize the canvas backing store to the viewport when it changed.
    fn sync_backing_store(&self) {
        let Size { width, height } = self.core.viewport;
        let w = device_pixels(width, self.core.dpr);
        let h = device_pixels(height, self.core.dpr);
        if self.canvas.width() != w || self.canvas.height() != h {
            self.canvas.set_width(w);
            self.canvas.set_height(h);
        }
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> Option<VertexId> {
        self.core.selection()
    }

    #[must_use]
    pub fn measurement_labels(&self) -> Vec<String> {
        self.core.measurement_labels()
    }

    #[must_use]
    pub fn transform(&self) -> Transformation {
        self.core.transform()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_pixels(css: f64, dpr: f64) -> u32 {
    let px = (css * dpr).round();
    if px.is_finite() && px > 0.0 { px.min(f64::from(u32::MAX)) as u32 } else { 0 }
}
