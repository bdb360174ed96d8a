//! Scripted sessions: drive the headless engine from a JSONL script.
//!
//! Each non-blank line is one step, tagged by `op`:
//!
//! ```text
//! {"op":"viewport","width":1280,"height":960}
//! {"op":"image","width":1000,"height":800}
//! {"op":"mode","mode":"rectangle"}
//! {"op":"click","x":100,"y":100}
//! {"op":"drag","from":[100,100],"to":[140,120]}
//! {"op":"hand","at":[0.4,0.5]}
//! ```
//!
//! Pointer coordinates are screen pixels. Hand positions are normalized image
//! coordinates and, like transcript text, arrive through the collaborator
//! queue. One frame runs after every step.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use std::io::BufRead;

use lens::camera::{MediaSource, Point};
use lens::config::LensConfig;
use lens::engine::EngineCore;
use lens::events::{self, CollaboratorEvent};
use lens::frame_loop::{RenderLoop, Tick};
use lens::input::{Button, Modifiers, WheelDelta};
use lens::mode::MeasurementMode;
use lens::units::Unit;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse { line: usize, source: serde_json::Error },
    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Viewport {
        width: f64,
        height: f64,
        #[serde(default = "unit_dpr")]
        dpr: f64,
    },
    Image {
        width: f64,
        height: f64,
    },
    Video {
        width: f64,
        height: f64,
    },
    Mode {
        mode: String,
    },
    Unit {
        unit: String,
    },
    Click {
        x: f64,
        y: f64,
    },
    Drag {
        from: [f64; 2],
        to: [f64; 2],
    },
    /// Middle-button drag by a screen offset.
    Pan {
        dx: f64,
        dy: f64,
    },
    Wheel {
        x: f64,
        y: f64,
        dy: f64,
    },
    /// `at: null` (or missing) means the hand left the frame.
    Hand {
        #[serde(default)]
        at: Option<[f64; 2]>,
    },
    Transcript {
        text: String,
    },
    ClearStrokes,
}

fn unit_dpr() -> f64 {
    1.0
}

/// Engine state after the script ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub mode: String,
    pub unit: String,
    pub points: Vec<[f64; 2]>,
    pub strokes: usize,
    pub labels: Vec<String>,
    pub transcript: String,
    pub frames: u64,
}

/// Parse a JSONL script. Blank lines and `#` comments are skipped.
///
/// # Errors
///
/// Returns [`ReplayError::Parse`] with the 1-based line number of the first bad step.
pub fn parse_script(reader: impl BufRead) -> Result<Vec<(usize, Step)>, ReplayError> {
    let mut steps = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let step = serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse { line: index + 1, source })?;
        steps.push((index + 1, step));
    }
    Ok(steps)
}

/// Run `steps` against a fresh engine.
///
/// # Errors
///
/// Returns [`ReplayError::Invalid`] for a step naming an unknown mode or unit.
pub fn run(steps: &[(usize, Step)], config: LensConfig) -> Result<Summary, ReplayError> {
    let (tx, queue) = events::channel();
    let mut render_loop = RenderLoop::new(queue);
    let mut core = EngineCore::with_config(config);
    let none = Modifiers::default();

    for (line, step) in steps {
        debug!(line, ?step, "step");
        match step {
            Step::Viewport { width, height, dpr } => {
                core.set_viewport(*width, *height, *dpr);
            }
            Step::Image { width, height } => {
                core.set_media(MediaSource::image(*width, *height));
            }
            Step::Video { width, height } => {
                core.set_media(MediaSource::video(*width, *height));
            }
            Step::Mode { mode } => {
                let mode: MeasurementMode =
                    mode.parse().map_err(|e: lens::mode::UnknownMode| invalid(*line, &e))?;
                core.set_mode(mode);
            }
            Step::Unit { unit } => {
                let unit: Unit = unit.parse().map_err(|e: lens::units::UnknownUnit| invalid(*line, &e))?;
                core.set_unit(unit);
            }
            Step::Click { x, y } => {
                let at = Point::new(*x, *y);
                core.on_pointer_down(at, Button::Primary, none);
                core.on_pointer_up(at, Button::Primary, none);
            }
            Step::Drag { from, to } => {
                let (from, to) = (Point::new(from[0], from[1]), Point::new(to[0], to[1]));
                core.on_pointer_down(from, Button::Primary, none);
                core.on_pointer_move(to, none);
                core.on_pointer_up(to, Button::Primary, none);
            }
            Step::Pan { dx, dy } => {
                let start = Point::new(0.0, 0.0);
                let end = Point::new(*dx, *dy);
                core.on_pointer_down(start, Button::Middle, none);
                core.on_pointer_move(end, none);
                core.on_pointer_up(end, Button::Middle, none);
            }
            Step::Wheel { x, y, dy } => {
                core.on_wheel(Point::new(*x, *y), WheelDelta { dx: 0.0, dy: *dy }, none);
            }
            Step::Hand { at } => {
                let point = at.map(|[x, y]| Point::new(x, y));
                tx.post(CollaboratorEvent::HandDetected { point });
            }
            Step::Transcript { text } => {
                tx.post(CollaboratorEvent::TranscriptChunk { text: text.clone() });
            }
            Step::ClearStrokes => {
                core.clear_strokes();
            }
        }
        if let Tick::Continue { actions } = render_loop.tick(&mut core) {
            debug!(line, actions = actions.len(), "frame");
        }
    }

    let summary = Summary {
        mode: core.mode().to_string(),
        unit: core.ui.unit.to_string(),
        points: core.points().iter().map(|p| [p.x, p.y]).collect(),
        strokes: core.strokes().len(),
        labels: core.measurement_labels(),
        transcript: core.transcript().to_owned(),
        frames: render_loop.frames(),
    };
    info!(steps = steps.len(), points = summary.points.len(), strokes = summary.strokes, "replay finished");
    Ok(summary)
}

fn invalid(line: usize, err: &impl std::fmt::Display) -> ReplayError {
    ReplayError::Invalid { line, message: err.to_string() }
}
