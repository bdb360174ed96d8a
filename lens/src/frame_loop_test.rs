use super::*;
use crate::camera::{MediaSource, Point};
use crate::events::channel;
use crate::mode::MeasurementMode;

#[derive(Default)]
struct RecordingSink {
    calls: Vec<String>,
}

impl FrameSink for RecordingSink {
    fn apply_event(&mut self, event: CollaboratorEvent) -> Vec<Action> {
        self.calls.push(event.kind().to_owned());
        vec![Action::RenderNeeded]
    }

    fn render(&mut self) {
        self.calls.push("render".to_owned());
    }
}

// =============================================================
// CancelToken
// =============================================================

#[test]
fn token_clones_share_state() {
    let token = CancelToken::new();
    let other = token.clone();
    assert!(!other.is_cancelled());
    token.cancel();
    token.cancel();
    assert!(other.is_cancelled());
}

// =============================================================
// RenderLoop
// =============================================================

#[test]
fn tick_drains_events_before_render() {
    let (tx, queue) = channel();
    let mut render_loop = RenderLoop::new(queue);
    let mut sink = RecordingSink::default();

    tx.post(CollaboratorEvent::TranscriptChunk { text: "hi".into() });
    tx.post(CollaboratorEvent::Interrupted);

    let tick = render_loop.tick(&mut sink);
    assert_eq!(tick, Tick::Continue { actions: vec![Action::RenderNeeded, Action::RenderNeeded] });
    assert_eq!(sink.calls, ["transcript_chunk", "interrupted", "render"]);
    assert_eq!(render_loop.frames(), 1);
}

#[test]
fn tick_without_events_still_renders() {
    let (_tx, queue) = channel();
    let mut render_loop = RenderLoop::new(queue);
    let mut sink = RecordingSink::default();

    assert_eq!(render_loop.tick(&mut sink), Tick::Continue { actions: vec![] });
    assert_eq!(render_loop.tick(&mut sink), Tick::Continue { actions: vec![] });
    assert_eq!(sink.calls, ["render", "render"]);
}

#[test]
fn cancelled_loop_does_nothing() {
    let (tx, queue) = channel();
    let mut render_loop = RenderLoop::new(queue);
    let mut sink = RecordingSink::default();
    render_loop.token().cancel();

    tx.post(CollaboratorEvent::Interrupted);
    assert_eq!(render_loop.tick(&mut sink), Tick::Stopped);
    assert!(sink.calls.is_empty());
    assert_eq!(render_loop.frames(), 0);
}

#[test]
fn cancel_between_ticks_stops_next_tick() {
    let (tx, queue) = channel();
    let mut render_loop = RenderLoop::new(queue);
    let token = render_loop.token();
    let mut sink = RecordingSink::default();

    assert!(matches!(render_loop.tick(&mut sink), Tick::Continue { .. }));
    token.cancel();
    assert_eq!(render_loop.tick(&mut sink), Tick::Stopped);
    assert_eq!(sink.calls, ["render"]);
    assert!(!tx.post(CollaboratorEvent::Interrupted), "queue closes once stopped");
}

#[test]
fn headless_engine_applies_hand_events_in_order() {
    let (tx, queue) = channel();
    let mut render_loop = RenderLoop::new(queue);
    let mut core = EngineCore::new();
    core.set_viewport(400.0, 300.0, 1.0);
    core.set_media(MediaSource::video(640.0, 480.0));
    assert_eq!(core.mode(), MeasurementMode::Whiteboard);

    tx.post(CollaboratorEvent::HandDetected { point: Some(Point::new(0.2, 0.2)) });
    tx.post(CollaboratorEvent::HandDetected { point: Some(Point::new(0.4, 0.4)) });
    tx.post(CollaboratorEvent::HandDetected { point: None });

    let Tick::Continue { actions } = render_loop.tick(&mut core) else {
        panic!("loop should run");
    };
    assert!(actions.contains(&Action::StrokeCommitted { samples: 2 }));
    assert_eq!(core.strokes().len(), 1);
}
