//! Measurement and annotation engine for the camera lens view.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! overlay drawn on top of a still photo or live camera feed: turning pointer
//! and hand-tracking input into measurement points and ink strokes, mapping
//! between normalized image space and the screen under pan/zoom, computing
//! real-world measurements, and painting the result every frame. The host
//! JavaScript layer only wires DOM events and collaborator callbacks to the
//! engine and reacts to the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | Points, strokes and the per-session sketch |
//! | [`camera`] | Pan/zoom transform and image↔screen projection |
//! | [`mode`] | Measurement modes and their dispatch table |
//! | [`geometry`] | Distances, shoelace area, measurement values |
//! | [`units`] | Length/area unit conversion and formatting |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing against placed points |
//! | [`overlay`] | Per-frame display list |
//! | [`render`] | Canvas2D painter for the display list |
//! | [`events`] | Message queue from async collaborators |
//! | [`frame_loop`] | Cancellable per-frame loop |
//! | [`live`] | Live AI session resource and media codecs |
//! | [`config`] | Runtime configuration and validation |
//! | [`consts`] | Shared numeric constants (zoom limits, marker sizes, etc.) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod events;
pub mod frame_loop;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod live;
pub mod mode;
pub mod overlay;
pub mod render;
pub mod units;
