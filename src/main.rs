mod replay;

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lens::camera::{Point, Size};
use lens::config::{ConfigError, LensConfig};
use lens::mode::MeasurementMode;
use lens::units::{self, Unit};
use serde_json::{Value, json};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid point `{0}`; expected x,y in normalized image coordinates")]
    InvalidPoint(String),
    #[error("{mode} takes at most {max} points, got {got}")]
    TooManyPoints { mode: MeasurementMode, max: usize, got: usize },
    #[error("invalid image size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error(transparent)]
    Replay(#[from] replay::ReplayError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "arlens", about = "Measure photos and replay lens sessions from the command line")]
struct Cli {
    /// JSON config file; missing keys take their defaults.
    #[arg(long, env = "ARLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the calibration from the config.
    #[arg(long, env = "ARLENS_PIXELS_PER_CM")]
    pixels_per_cm: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List measurement modes and their point limits.
    Modes,
    /// Convert a length or area from centimeters.
    Convert(ConvertArgs),
    /// Measure points placed on an image.
    Measure(MeasureArgs),
    /// Run a JSONL session script through the engine.
    Replay(ReplayArgs),
    /// Print the effective config.
    Config,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Value in centimeters (square centimeters with --area).
    value: f64,

    #[arg(long, default_value = "cm")]
    to: Unit,

    #[arg(long, default_value_t = false)]
    area: bool,
}

#[derive(Args, Debug)]
struct MeasureArgs {
    #[arg(long, default_value = "distance")]
    mode: MeasurementMode,

    /// Image width in pixels.
    #[arg(long)]
    width: f64,

    /// Image height in pixels.
    #[arg(long)]
    height: f64,

    /// Normalized point `x,y`; repeat in placement order.
    #[arg(long = "point", value_parser = parse_point)]
    points: Vec<Point>,

    #[arg(long, default_value = "cm")]
    unit: Unit,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    #[arg(long, default_value = "-", help = "Script path, or - for stdin")]
    input: String,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).with_target(false).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.pixels_per_cm)?;

    match cli.command {
        Command::Modes => {
            run_modes();
            Ok(())
        }
        Command::Convert(args) => {
            run_convert(&args);
            Ok(())
        }
        Command::Measure(args) => run_measure(&config, &args),
        Command::Replay(args) => run_replay(config, &args),
        Command::Config => print_json(&serde_json::to_value(&config)?),
    }
}

fn load_config(path: Option<&Path>, pixels_per_cm: Option<f64>) -> Result<LensConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let raw =
                fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
            LensConfig::from_json(&raw)?
        }
        None => LensConfig::default(),
    };
    if let Some(ppcm) = pixels_per_cm {
        config.pixels_per_cm = ppcm;
        config.validate()?;
    }
    debug!(pixels_per_cm = config.pixels_per_cm, "config loaded");
    Ok(config)
}

fn run_modes() {
    for mode in MeasurementMode::ALL {
        let entry = mode.entry();
        println!("{:<12} {:<10} {}", mode.name(), entry.label, entry.max_points);
    }
}

fn run_convert(args: &ConvertArgs) {
    let value = if args.area { units::convert_area(args.value, args.to) } else { units::convert(args.value, args.to) };
    println!("{}", units::format(value, args.to, args.area));
}

fn run_measure(config: &LensConfig, args: &MeasureArgs) -> Result<(), CliError> {
    let media = Size::new(args.width, args.height);
    if !media.is_drawable() {
        return Err(CliError::InvalidSize { width: args.width, height: args.height });
    }
    let max = args.mode.max_points();
    if args.points.len() > max {
        return Err(CliError::TooManyPoints { mode: args.mode, max, got: args.points.len() });
    }

    let measurements: Vec<Value> = args
        .mode
        .measure(&args.points, media, config.pixels_per_cm)
        .iter()
        .map(|m| {
            json!({
                "label": m.label,
                "value": m.value_in(args.unit),
                "display": m.display(args.unit),
            })
        })
        .collect();

    print_json(&json!({
        "mode": args.mode.name(),
        "unit": args.unit.symbol(),
        "measurements": measurements,
    }))
}

fn run_replay(config: LensConfig, args: &ReplayArgs) -> Result<(), CliError> {
    let steps = if args.input == "-" {
        replay::parse_script(io::stdin().lock())?
    } else {
        let file = File::open(&args.input)
            .map_err(|source| CliError::Read { path: PathBuf::from(&args.input), source })?;
        replay::parse_script(BufReader::new(file))?
    };
    let summary = replay::run(&steps, config)?;
    print_json(&serde_json::to_value(summary)?)
}

fn parse_point(raw: &str) -> Result<Point, CliError> {
    let invalid = || CliError::InvalidPoint(raw.to_owned());
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok(Point::new(x, y))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
