#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::{BRUSH_COLORS, MAX_SCALE, MIN_SCALE};

// =============================================================
// Helpers
// =============================================================

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn shift_modifier() -> Modifiers {
    Modifiers { shift: true, ..Default::default() }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn has_action<F>(actions: &[Action], pred: F) -> bool
where
    F: Fn(&Action) -> bool,
{
    actions.iter().any(pred)
}

fn has_render_needed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::RenderNeeded))
}

/// Engine with a 1000x800 still image shown 1:1 in a matching viewport.
fn image_core() -> EngineCore {
    let mut core = EngineCore::new();
    core.set_viewport(1000.0, 800.0, 1.0);
    core.set_media(MediaSource::image(1000.0, 800.0));
    core
}

/// Engine with a 640x480 live feed in a 640x480 viewport, in WHITEBOARD.
fn video_core() -> EngineCore {
    let mut core = EngineCore::new();
    core.set_viewport(640.0, 480.0, 1.0);
    core.set_media(MediaSource::video(640.0, 480.0));
    core
}

fn core_in(mode: MeasurementMode) -> EngineCore {
    let mut core = image_core();
    core.set_mode(mode);
    core
}

fn click(core: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    let mut actions = core.on_pointer_down(pt(x, y), Button::Primary, no_modifiers());
    actions.extend(core.on_pointer_up(pt(x, y), Button::Primary, no_modifiers()));
    actions
}

fn drag(core: &mut EngineCore, from: Point, to: Point, modifiers: Modifiers) {
    core.on_pointer_down(from, Button::Primary, modifiers);
    core.on_pointer_move(to, modifiers);
    core.on_pointer_up(to, Button::Primary, modifiers);
}

// =============================================================
// EngineCore: construction and defaults
// =============================================================

#[test]
fn core_new_defaults() {
    let core = EngineCore::new();
    assert!(core.selection().is_none());
    assert_eq!(core.mode(), MeasurementMode::Distance);
    assert_eq!(core.transform(), Transformation::default());
    assert_eq!(core.input, InputState::Idle);
    assert!(core.media.is_none());
    assert!(core.points().is_empty());
    assert!(core.measurements().is_empty());
}

#[test]
fn pointer_down_without_media_is_noop() {
    let mut core = EngineCore::new();
    core.set_viewport(800.0, 600.0, 1.0);
    assert!(core.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_modifiers()).is_empty());
    assert!(core.points().is_empty());
}

#[test]
fn set_viewport_rejects_bad_dpr() {
    let mut core = EngineCore::new();
    core.set_viewport(100.0, 100.0, 0.0);
    assert_eq!(core.dpr, 1.0);
    core.set_viewport(100.0, 100.0, 2.0);
    assert_eq!(core.dpr, 2.0);
}

// =============================================================
// Point placement
// =============================================================

#[test]
fn click_adds_point_at_image_coordinates() {
    let mut core = image_core();
    let actions = click(&mut core, 250.0, 200.0);
    assert!(has_action(&actions, |a| matches!(a, Action::PointAdded { .. })));
    assert!(has_render_needed(&actions));
    assert_eq!(core.points(), vec![pt(0.25, 0.25)]);
}

#[test]
fn click_respects_pan_and_zoom() {
    let mut core = image_core();
    core.transform = Transformation { x: 100.0, y: 50.0, scale: 2.0 };
    click(&mut core, 600.0, 450.0);
    assert_eq!(core.points(), vec![pt(0.25, 0.25)]);
}

#[test]
fn distance_caps_at_two_points() {
    let mut core = image_core();
    click(&mut core, 100.0, 100.0);
    click(&mut core, 500.0, 100.0);
    let before = core.points();
    let actions = click(&mut core, 900.0, 700.0);
    assert!(actions.is_empty());
    assert_eq!(core.points(), before);
}

#[test]
fn triangle_rejects_fourth_point() {
    let mut core = core_in(MeasurementMode::Triangle);
    for x in [100.0, 300.0, 500.0] {
        click(&mut core, x, 400.0 + x * 0.1);
    }
    let before = core.sketch.vertices().to_vec();
    click(&mut core, 900.0, 100.0);
    assert_eq!(core.sketch.vertices(), before.as_slice());
    assert_eq!(core.points().len(), 3);
}

#[test]
fn point_mode_replaces_instead_of_rejecting() {
    let mut core = core_in(MeasurementMode::Point);
    click(&mut core, 100.0, 100.0);
    let first = core.sketch.vertices()[0].id;
    click(&mut core, 700.0, 400.0);
    assert_eq!(core.points(), vec![pt(0.7, 0.5)]);
    assert_ne!(core.sketch.vertices()[0].id, first);
}

#[test]
fn area_accepts_twelve_points() {
    let mut core = core_in(MeasurementMode::Area);
    for i in 0..14 {
        let x = 50.0 + f64::from(i) * 60.0;
        click(&mut core, x, 100.0 + f64::from(i % 3) * 200.0);
    }
    assert_eq!(core.points().len(), 12);
}

#[test]
fn whiteboard_and_live_ai_never_place_points() {
    for mode in [MeasurementMode::Whiteboard, MeasurementMode::LiveAi] {
        let mut core = core_in(mode);
        click(&mut core, 300.0, 300.0);
        assert!(core.points().is_empty(), "{mode:?}");
    }
}

#[test]
fn clicks_outside_media_clamp_into_range() {
    let mut core = image_core();
    click(&mut core, -50.0, 2000.0);
    assert_eq!(core.points(), vec![pt(0.0, 1.0)]);
}

#[test]
fn clamping_can_be_disabled() {
    let config = LensConfig { clamp_points: false, ..LensConfig::default() };
    let mut core = EngineCore::with_config(config);
    core.set_viewport(1000.0, 800.0, 1.0);
    core.set_media(MediaSource::image(1000.0, 800.0));
    click(&mut core, -100.0, 400.0);
    assert_eq!(core.points(), vec![pt(-0.1, 0.5)]);
}

#[test]
fn secondary_button_does_nothing() {
    let mut core = image_core();
    let actions = core.on_pointer_down(pt(100.0, 100.0), Button::Secondary, no_modifiers());
    assert!(actions.is_empty());
    assert_eq!(core.input, InputState::Idle);
    assert!(core.points().is_empty());
}

// =============================================================
// Selection and drag
// =============================================================

#[test]
fn pointer_down_near_point_starts_drag_and_selects() {
    let mut core = image_core();
    click(&mut core, 500.0, 400.0);
    let id = core.sketch.vertices()[0].id;

    let actions = core.on_pointer_down(pt(510.0, 410.0), Button::Primary, no_modifiers());
    assert!(has_action(&actions, |a| *a == Action::PointSelected { id }));
    assert_eq!(core.input, InputState::Dragging { id });
    assert_eq!(core.selection(), Some(id));
    assert_eq!(core.points().len(), 1);
}

#[test]
fn pointer_down_just_outside_radius_adds_point() {
    let mut core = image_core();
    click(&mut core, 500.0, 400.0);
    click(&mut core, 521.0, 400.0);
    assert_eq!(core.points().len(), 2);
    assert!(core.selection().is_none());
}

#[test]
fn drag_moves_only_target_point() {
    let mut core = core_in(MeasurementMode::Triangle);
    click(&mut core, 100.0, 100.0);
    click(&mut core, 500.0, 100.0);
    click(&mut core, 300.0, 600.0);
    let before = core.sketch.vertices().to_vec();

    drag(&mut core, pt(500.0, 100.0), pt(800.0, 400.0), no_modifiers());

    let after = core.sketch.vertices();
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1].id, before[1].id);
    assert_eq!(after[1].position(), pt(0.8, 0.5));
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn drag_reports_moves() {
    let mut core = image_core();
    click(&mut core, 500.0, 400.0);
    let id = core.sketch.vertices()[0].id;
    core.on_pointer_down(pt(500.0, 400.0), Button::Primary, no_modifiers());
    let actions = core.on_pointer_move(pt(600.0, 400.0), no_modifiers());
    assert!(has_action(&actions, |a| *a == Action::PointMoved { id }));
}

#[test]
fn drag_beyond_media_is_clamped() {
    let mut core = image_core();
    click(&mut core, 500.0, 400.0);
    drag(&mut core, pt(500.0, 400.0), pt(5000.0, -300.0), no_modifiers());
    assert_eq!(core.points(), vec![pt(1.0, 0.0)]);
}

#[test]
fn hit_wins_over_shift_pan() {
    let mut core = image_core();
    click(&mut core, 500.0, 400.0);
    let id = core.sketch.vertices()[0].id;
    core.on_pointer_down(pt(500.0, 400.0), Button::Primary, shift_modifier());
    assert_eq!(core.input, InputState::Dragging { id });
}

#[test]
fn second_pointer_down_mid_gesture_is_ignored() {
    let mut core = image_core();
    core.on_pointer_down(pt(10.0, 10.0), Button::Primary, shift_modifier());
    let actions = core.on_pointer_down(pt(300.0, 300.0), Button::Primary, no_modifiers());
    assert!(actions.is_empty());
    assert!(matches!(core.input, InputState::Panning { .. }));
    assert!(core.points().is_empty());
}

// =============================================================
// Panning
// =============================================================

#[test]
fn shift_drag_pans_view() {
    let mut core = image_core();
    drag(&mut core, pt(100.0, 100.0), pt(160.0, 70.0), shift_modifier());
    assert_eq!(core.transform(), Transformation { x: 60.0, y: -30.0, scale: 1.0 });
    assert!(core.points().is_empty());
}

#[test]
fn pan_accumulates_incremental_deltas() {
    let mut core = image_core();
    core.on_pointer_down(pt(0.0, 0.0), Button::Primary, shift_modifier());
    core.on_pointer_move(pt(10.0, 5.0), shift_modifier());
    core.on_pointer_move(pt(25.0, 5.0), shift_modifier());
    core.on_pointer_up(pt(25.0, 5.0), Button::Primary, shift_modifier());
    assert_eq!(core.transform().x, 25.0);
    assert_eq!(core.transform().y, 5.0);
}

#[test]
fn pan_lock_makes_plain_press_pan() {
    let mut core = image_core();
    core.set_pan_lock(true);
    drag(&mut core, pt(100.0, 100.0), pt(150.0, 100.0), no_modifiers());
    assert_eq!(core.transform().x, 50.0);
    assert!(core.points().is_empty());
}

#[test]
fn middle_button_pans() {
    let mut core = image_core();
    core.on_pointer_down(pt(0.0, 0.0), Button::Middle, no_modifiers());
    core.on_pointer_move(pt(-20.0, 0.0), no_modifiers());
    assert_eq!(core.transform().x, -20.0);
}

#[test]
fn pan_start_and_end_set_cursor() {
    let mut core = image_core();
    let down = core.on_pointer_down(pt(0.0, 0.0), Button::Primary, shift_modifier());
    assert!(has_action(&down, |a| *a == Action::SetCursor("grabbing")));
    let up = core.on_pointer_up(pt(0.0, 0.0), Button::Primary, shift_modifier());
    assert!(has_action(&up, |a| *a == Action::SetCursor("crosshair")));
}

#[test]
fn points_stay_anchored_after_pan() {
    let mut core = image_core();
    click(&mut core, 500.0, 400.0);
    drag(&mut core, pt(100.0, 100.0), pt(200.0, 100.0), shift_modifier());
    assert_eq!(core.points(), vec![pt(0.5, 0.5)]);
    // The marker moved with the image, so it is grabbed at its new screen spot.
    core.on_pointer_down(pt(600.0, 400.0), Button::Primary, no_modifiers());
    assert!(matches!(core.input, InputState::Dragging { .. }));
}

// =============================================================
// Zoom
// =============================================================

#[test]
fn wheel_up_zooms_in_about_pointer() {
    let mut core = image_core();
    let anchor = pt(300.0, 200.0);
    let before = core.projection().screen_to_image(anchor);
    let actions = core.on_wheel(anchor, WheelDelta { dx: 0.0, dy: -100.0 }, no_modifiers());
    assert!(has_render_needed(&actions));
    assert!(core.transform().scale > 1.0);
    let after = core.projection().screen_to_image(anchor);
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
}

#[test]
fn wheel_down_zooms_out() {
    let mut core = image_core();
    core.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 100.0 }, no_modifiers());
    assert!(core.transform().scale < 1.0);
}

#[test]
fn zoom_is_clamped() {
    let mut core = image_core();
    for _ in 0..100 {
        core.zoom_in();
    }
    assert_eq!(core.transform().scale, MAX_SCALE);
    assert!(core.zoom_in().is_empty());
    for _ in 0..100 {
        core.zoom_out();
    }
    assert!(approx_eq(core.transform().scale, MIN_SCALE));
}

#[test]
fn inverted_zoom_range_leaves_view_alone() {
    let config = LensConfig { min_scale: 5.0, max_scale: 1.0, ..LensConfig::default() };
    let mut core = EngineCore::with_config(config);
    core.set_viewport(1000.0, 800.0, 1.0);
    core.set_media(MediaSource::image(1000.0, 800.0));
    assert!(core.zoom_in().is_empty());
    assert!(core.zoom_out().is_empty());
    assert!(core.on_wheel(pt(500.0, 400.0), WheelDelta { dx: 0.0, dy: -100.0 }, no_modifiers()).is_empty());
    assert_eq!(core.transform().scale, 1.0);
}

#[test]
fn zoom_in_keeps_viewport_center_fixed() {
    let mut core = image_core();
    let center = pt(500.0, 400.0);
    let before = core.projection().screen_to_image(center);
    core.zoom_in();
    assert!(approx_eq(core.transform().scale, 1.25));
    let after = core.projection().screen_to_image(center);
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
}

#[test]
fn reset_view_restores_identity() {
    let mut core = image_core();
    core.zoom_in();
    drag(&mut core, pt(0.0, 0.0), pt(40.0, 40.0), shift_modifier());
    let actions = core.reset_view();
    assert!(has_action(&actions, |a| *a == Action::ViewChanged(Transformation::default())));
    assert_eq!(core.transform(), Transformation::default());
}

// =============================================================
// Mode changes
// =============================================================

#[test]
fn mode_switch_clears_points_from_every_mode() {
    for from in MeasurementMode::ALL.into_iter().filter(|m| m.is_shape()) {
        let mut core = core_in(from);
        click(&mut core, 200.0, 200.0);
        assert!(!core.points().is_empty(), "{from:?}");
        let actions = core.set_mode(MeasurementMode::Circle);
        assert!(core.points().is_empty(), "{from:?}");
        assert!(has_action(&actions, |a| *a == Action::ModeChanged(MeasurementMode::Circle)));
    }
}

#[test]
fn mode_switch_to_same_mode_still_clears() {
    let mut core = image_core();
    click(&mut core, 200.0, 200.0);
    core.set_mode(MeasurementMode::Distance);
    assert!(core.points().is_empty());
}

#[test]
fn mode_switch_abandons_drag() {
    let mut core = image_core();
    click(&mut core, 500.0, 400.0);
    core.on_pointer_down(pt(500.0, 400.0), Button::Primary, no_modifiers());
    core.set_mode(MeasurementMode::Triangle);
    assert_eq!(core.input, InputState::Idle);
    assert!(core.selection().is_none());
    assert!(core.on_pointer_move(pt(700.0, 400.0), no_modifiers()).is_empty());
}

#[test]
fn mode_switch_discards_in_progress_stroke() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    core.on_pointer_down(pt(100.0, 100.0), Button::Primary, no_modifiers());
    core.on_pointer_move(pt(200.0, 200.0), no_modifiers());
    core.set_mode(MeasurementMode::Distance);
    assert!(core.sketch.pending_stroke().is_none());
    assert!(core.strokes().is_empty());
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn mode_switch_keeps_committed_ink() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    drag(&mut core, pt(100.0, 100.0), pt(200.0, 200.0), no_modifiers());
    core.set_mode(MeasurementMode::Distance);
    assert_eq!(core.strokes().len(), 1);
}

#[test]
fn whiteboard_cursor_is_hidden() {
    let mut core = image_core();
    let actions = core.set_mode(MeasurementMode::Whiteboard);
    assert!(has_action(&actions, |a| *a == Action::SetCursor("none")));
}

// =============================================================
// Media
// =============================================================

#[test]
fn new_image_resets_everything_and_selects_distance() {
    let mut core = core_in(MeasurementMode::Polygon);
    click(&mut core, 100.0, 100.0);
    core.zoom_in();
    core.set_mode(MeasurementMode::Whiteboard);
    drag(&mut core, pt(0.0, 0.0), pt(50.0, 50.0), no_modifiers());

    let actions = core.set_media(MediaSource::image(400.0, 300.0));
    assert!(has_action(&actions, |a| *a == Action::ModeChanged(MeasurementMode::Distance)));
    assert_eq!(core.mode(), MeasurementMode::Distance);
    assert!(core.points().is_empty());
    assert!(core.strokes().is_empty());
    assert_eq!(core.transform(), Transformation::default());
}

#[test]
fn new_video_selects_whiteboard() {
    let core = video_core();
    assert_eq!(core.mode(), MeasurementMode::Whiteboard);
    assert!(core.is_hand_tracked());
}

#[test]
fn new_media_mid_gesture_discards_stroke() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    core.on_pointer_down(pt(100.0, 100.0), Button::Primary, no_modifiers());
    core.set_media(MediaSource::image(100.0, 100.0));
    assert!(core.sketch.pending_stroke().is_none());
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn set_media_size_keeps_points() {
    let mut core = video_core();
    core.set_mode(MeasurementMode::Distance);
    click(&mut core, 320.0, 240.0);
    let actions = core.set_media_size(Size::new(1280.0, 960.0));
    assert!(has_render_needed(&actions));
    assert_eq!(core.points(), vec![pt(0.5, 0.5)]);
    assert!(core.set_media_size(Size::new(1280.0, 960.0)).is_empty());
}

#[test]
fn clear_media_drops_background() {
    let mut core = image_core();
    click(&mut core, 100.0, 100.0);
    core.clear_media();
    assert!(core.media.is_none());
    assert!(core.points().is_empty());
}

// =============================================================
// Whiteboard (pointer)
// =============================================================

#[test]
fn pointer_stroke_commits_on_up() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    core.on_pointer_down(pt(100.0, 100.0), Button::Primary, no_modifiers());
    assert_eq!(core.input, InputState::Drawing);
    core.on_pointer_move(pt(150.0, 120.0), no_modifiers());
    core.on_pointer_move(pt(200.0, 160.0), no_modifiers());
    let actions = core.on_pointer_up(pt(200.0, 160.0), Button::Primary, no_modifiers());

    assert!(has_action(&actions, |a| *a == Action::StrokeCommitted { samples: 3 }));
    assert_eq!(core.strokes().len(), 1);
    assert_eq!(core.strokes()[0].points[0].position(), pt(0.1, 0.125));
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn stroke_uses_brush_at_start() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    core.set_brush_color(BRUSH_COLORS[2]);
    core.set_brush_width(12.0);
    core.on_pointer_down(pt(100.0, 100.0), Button::Primary, no_modifiers());
    core.set_brush_color(BRUSH_COLORS[3]);
    core.on_pointer_up(pt(100.0, 100.0), Button::Primary, no_modifiers());
    assert_eq!(core.strokes()[0].color, "#22D3EE");
    assert_eq!(core.strokes()[0].width, 12.0);
}

#[test]
fn invalid_brush_width_ignored() {
    let mut core = EngineCore::new();
    core.set_brush_width(-3.0);
    core.set_brush_width(f64::NAN);
    assert_eq!(core.ui.brush.width, 5.0);
}

#[test]
fn clear_strokes_drops_history_and_pending() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    drag(&mut core, pt(10.0, 10.0), pt(20.0, 20.0), no_modifiers());
    core.on_pointer_down(pt(30.0, 30.0), Button::Primary, no_modifiers());
    let actions = core.clear_strokes();
    assert!(has_action(&actions, |a| *a == Action::StrokesCleared));
    assert!(core.strokes().is_empty());
    assert!(core.sketch.pending_stroke().is_none());
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn pen_follows_pointer() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    let actions = core.on_pointer_move(pt(42.0, 24.0), no_modifiers());
    assert!(has_render_needed(&actions));
    assert_eq!(core.ui.pen, Some(pt(42.0, 24.0)));
}

// =============================================================
// Whiteboard (hand tracking)
// =============================================================

#[test]
fn pointer_drawing_ignored_on_live_video() {
    let mut core = video_core();
    assert!(core.on_pointer_down(pt(100.0, 100.0), Button::Primary, no_modifiers()).is_empty());
    assert!(core.on_pointer_move(pt(200.0, 200.0), no_modifiers()).is_empty());
    assert_eq!(core.input, InputState::Idle);
    assert!(core.sketch.pending_stroke().is_none());
}

#[test]
fn hand_presence_drives_stroke() {
    let mut core = video_core();
    core.on_hand_detection(Some(pt(0.1, 0.1)));
    assert_eq!(core.input, InputState::Drawing);
    assert!(core.ui.hand_present);
    core.on_hand_detection(Some(pt(0.2, 0.2)));
    core.on_hand_detection(Some(pt(0.3, 0.3)));
    assert_eq!(core.sketch.pending_stroke().map(|s| s.points.len()), Some(3));

    let actions = core.on_hand_detection(None);
    assert!(has_action(&actions, |a| *a == Action::StrokeCommitted { samples: 3 }));
    assert!(!core.ui.hand_present);
    assert_eq!(core.input, InputState::Idle);
    assert_eq!(core.strokes().len(), 1);
}

#[test]
fn each_presence_period_is_its_own_stroke() {
    let mut core = video_core();
    for _ in 0..2 {
        core.on_hand_detection(Some(pt(0.5, 0.5)));
        core.on_hand_detection(Some(pt(0.6, 0.5)));
        core.on_hand_detection(None);
    }
    assert_eq!(core.strokes().len(), 2);
}

#[test]
fn absence_without_stroke_is_quiet() {
    let mut core = video_core();
    assert!(core.on_hand_detection(None).is_empty());
    assert!(core.strokes().is_empty());
}

#[test]
fn pointer_up_does_not_commit_hand_stroke() {
    let mut core = video_core();
    core.on_hand_detection(Some(pt(0.5, 0.5)));
    core.on_pointer_up(pt(0.0, 0.0), Button::Primary, no_modifiers());
    assert_eq!(core.input, InputState::Drawing);
    assert!(core.strokes().is_empty());
}

#[test]
fn hand_pen_projects_to_screen() {
    let mut core = video_core();
    core.on_hand_detection(Some(pt(0.5, 0.25)));
    assert_eq!(core.ui.pen, Some(pt(320.0, 120.0)));
}

#[test]
fn hand_detection_ignored_outside_live_whiteboard() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    assert!(core.on_hand_detection(Some(pt(0.5, 0.5))).is_empty());
    let mut video = video_core();
    video.set_mode(MeasurementMode::Distance);
    assert!(video.on_hand_detection(Some(pt(0.5, 0.5))).is_empty());
    assert!(video.sketch.pending_stroke().is_none());
}

#[test]
fn leaving_whiteboard_forgets_the_hand() {
    let mut core = video_core();
    core.on_hand_detection(Some(pt(0.5, 0.5)));
    assert!(core.ui.hand_present);
    core.set_mode(MeasurementMode::Distance);
    assert!(!core.ui.hand_present);
    assert_eq!(core.ui.pen, None);

    core.set_mode(MeasurementMode::Whiteboard);
    assert!(!core.ui.hand_present);
    assert!(core.scene().pen.is_none());
}

// =============================================================
// Collaborator events
// =============================================================

#[test]
fn apply_event_routes_hand_detection() {
    let mut core = video_core();
    core.apply_event(CollaboratorEvent::HandDetected { point: Some(pt(0.5, 0.5)) });
    assert_eq!(core.input, InputState::Drawing);
}

#[test]
fn transcript_accumulates() {
    let mut core = EngineCore::new();
    core.apply_event(CollaboratorEvent::TranscriptChunk { text: "The table is ".into() });
    let actions = core.apply_event(CollaboratorEvent::TranscriptChunk { text: "about 2 m long.".into() });
    assert_eq!(actions, vec![Action::TranscriptUpdated("about 2 m long.".into())]);
    assert_eq!(core.transcript(), "The table is about 2 m long.");
}

#[test]
fn audio_chunk_becomes_play_action() {
    let mut core = EngineCore::new();
    let bytes = [0x00, 0x40, 0x00, 0xC0].to_vec();
    let actions = core.apply_event(CollaboratorEvent::AudioChunk { bytes });
    assert_eq!(actions, vec![Action::PlayAudio(vec![0.5, -0.5])]);
}

#[test]
fn odd_length_audio_chunk_is_dropped() {
    let mut core = EngineCore::new();
    assert!(core.apply_event(CollaboratorEvent::AudioChunk { bytes: vec![1, 2, 3] }).is_empty());
}

#[test]
fn interrupted_stops_audio() {
    let mut core = EngineCore::new();
    assert_eq!(core.apply_event(CollaboratorEvent::Interrupted), vec![Action::StopAudio]);
}

// =============================================================
// Measurements
// =============================================================

#[test]
fn distance_scenario_reports_centimeters_and_inches() {
    let mut core = image_core();
    click(&mut core, 250.0, 200.0);
    click(&mut core, 750.0, 200.0);
    assert_eq!(core.measurement_labels(), vec!["Distance: 25.0 cm".to_owned()]);
    core.set_unit(Unit::In);
    assert_eq!(core.measurement_labels(), vec!["Distance: 9.8 in".to_owned()]);
}

#[test]
fn measurements_use_configured_calibration() {
    let config = LensConfig { pixels_per_cm: 10.0, ..LensConfig::default() };
    let mut core = EngineCore::with_config(config);
    core.set_viewport(1000.0, 800.0, 1.0);
    core.set_media(MediaSource::image(1000.0, 800.0));
    click(&mut core, 0.0, 0.0);
    click(&mut core, 500.0, 0.0);
    assert!(approx_eq(core.measurements()[0].value_cm, 50.0));
}

#[test]
fn rectangle_measurement_after_drag() {
    let mut core = core_in(MeasurementMode::Rectangle);
    click(&mut core, 0.0, 0.0);
    click(&mut core, 200.0, 100.0);
    drag(&mut core, pt(200.0, 100.0), pt(400.0, 200.0), no_modifiers());
    let m = core.measurements();
    assert!(approx_eq(m[0].value_cm, 20.0));
    assert!(approx_eq(m[1].value_cm, 10.0));
    assert!(approx_eq(m[2].value_cm, 200.0));
}

// =============================================================
// Scene
// =============================================================

#[test]
fn scene_reflects_points_and_labels() {
    let mut core = core_in(MeasurementMode::Triangle);
    click(&mut core, 100.0, 100.0);
    click(&mut core, 500.0, 100.0);
    click(&mut core, 300.0, 500.0);
    let scene = core.scene();
    assert_eq!(scene.markers.len(), 3);
    assert!(matches!(scene.shape, Some(overlay::Shape::Polyline { closed: true, .. })));
    assert_eq!(scene.labels.len(), 2);
    assert!(scene.media_rect.is_some());
}

#[test]
fn scene_marks_pen_active_while_drawing() {
    let mut core = core_in(MeasurementMode::Whiteboard);
    core.on_pointer_down(pt(10.0, 10.0), Button::Primary, no_modifiers());
    let pen = core.scene().pen.unwrap();
    assert!(pen.active);
}
