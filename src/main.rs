//! Heading reader - Live compass heading on the console
//!
//! Feeds accelerometer and magnetometer events from a simulated device or a
//! CSV recording into the orientation estimator and redraws a small dashboard.
//!
//! Usage:
//!   heading-reader --source sim --yaw-rate 45
//!   heading-reader --source replay --file recording.csv

use clap::{Parser, ValueEnum};
use compass_rotator::{
    heading_gauge, init_logging, HeadingAngle, HeadingError, OrientationEstimator, ReplaySource,
    SensorSource, SessionClock, SimulatedDevice, SimulationConfig, StreamControl,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Minimum time between dashboard redraws
const REDRAW_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Synthetic rotating device
    Sim,
    /// CSV recording
    Replay,
}

#[derive(Parser, Debug)]
#[command(name = "heading-reader")]
#[command(about = "Display a live compass heading from accelerometer and magnetometer data", long_about = None)]
struct Args {
    /// Where sensor events come from
    #[arg(short, long, value_enum, default_value_t = Source::Sim)]
    source: Source,

    /// Recording to replay (required with --source replay)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Simulated sample rate in Hz per sensor
    #[arg(short, long, default_value = "50")]
    rate: u32,

    /// Simulated yaw rate in degrees/second
    #[arg(long, default_value = "30", allow_hyphen_values = true)]
    yaw_rate: f32,

    /// Simulated peak tilt in degrees
    #[arg(long, default_value = "15")]
    tilt: f32,

    /// Replay as fast as possible instead of in real time
    #[arg(long)]
    no_pacing: bool,

    /// Duration in seconds (optional, runs until Ctrl+C or end of recording)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn open_source(args: &Args, stop: Arc<AtomicBool>) -> Result<Box<dyn SensorSource>, HeadingError> {
    match args.source {
        Source::Sim => {
            let config = SimulationConfig {
                rate_hz: args.rate,
                yaw_rate_dps: args.yaw_rate,
                tilt_deg: args.tilt,
                ..Default::default()
            };
            let device = SimulatedDevice::new(config)?.stop_on(stop);
            Ok(if args.no_pacing {
                Box::new(device.without_pacing())
            } else {
                Box::new(device)
            })
        }
        Source::Replay => {
            let path = args.file.as_ref().ok_or_else(|| {
                HeadingError::InvalidParameter("--file is required with --source replay".to_string())
            })?;
            Ok(Box::new(
                ReplaySource::open(path)?
                    .realtime(!args.no_pacing)
                    .stop_on(stop),
            ))
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(if args.verbose { "debug" } else { "info" });

    // Setup Ctrl+C handler
    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    ctrlc::set_handler(move || {
        s.store(true, Ordering::SeqCst);
    })?;

    let mut source = match open_source(&args, stop.clone()) {
        Ok(s) => s,
        Err(HeadingError::Io(e)) => {
            eprintln!("Error: cannot read recording: {}", e);
            eprintln!("Please check:");
            eprintln!("  1. The --file path exists and is readable");
            eprintln!("  2. The file was written by the recorder");
            return Err(Box::new(HeadingError::Io(e)));
        }
        Err(e) => {
            eprintln!("Error opening sensor source: {}", e);
            return Err(Box::new(e));
        }
    };

    let end_time = args.duration.map(|d| Instant::now() + Duration::from_secs(d));
    let mut stdout = io::stdout();

    // Clear screen once at start
    print!("\x1B[2J\x1B[H");
    stdout.flush()?;

    let clock = run_dashboard(&mut source, &mut stdout, &stop, end_time)?;

    println!();
    info!(
        "Processed {} events in {:.1}s ({:.1} Hz)",
        clock.events(),
        clock.elapsed_secs(),
        clock.rate_hz()
    );

    Ok(())
}

/// Feed events to the estimator until the source ends or a stop condition
/// hits, redrawing `out` at most every [`REDRAW_INTERVAL`]
fn run_dashboard<S, W>(
    source: &mut S,
    out: &mut W,
    stop: &AtomicBool,
    end_time: Option<Instant>,
) -> Result<SessionClock, Box<dyn std::error::Error>>
where
    S: SensorSource,
    W: Write,
{
    let mut estimator = OrientationEstimator::new();
    let mut clock = SessionClock::new();
    let mut last_redraw: Option<Instant> = None;
    let mut last_frame: Option<(HeadingAngle, f64)> = None;

    let mut draw_error = None;
    source.stream(|event| {
        if stop.load(Ordering::SeqCst) {
            return StreamControl::Break;
        }
        if let Some(end) = end_time {
            if Instant::now() >= end {
                return StreamControl::Break;
            }
        }

        let heading = estimator.on_sensor_event(&event);
        clock.tick();
        last_frame = Some((heading, event.timestamp));

        if last_redraw.map_or(true, |t| t.elapsed() >= REDRAW_INTERVAL) {
            last_redraw = Some(Instant::now());
            if let Err(e) = draw_dashboard(&mut *out, &estimator, heading, &clock, event.timestamp) {
                draw_error = Some(e);
                return StreamControl::Break;
            }
        }

        StreamControl::Continue
    })?;

    if let Some(e) = draw_error {
        return Err(Box::new(e));
    }

    // Show events that arrived after the last throttled redraw
    if let Some((heading, source_time)) = last_frame {
        draw_dashboard(&mut *out, &estimator, heading, &clock, source_time)?;
    }

    Ok(clock)
}

fn draw_dashboard(
    out: &mut impl Write,
    estimator: &OrientationEstimator,
    heading: HeadingAngle,
    clock: &SessionClock,
    source_time: f64,
) -> io::Result<()> {
    let a = estimator.accelerometer();
    let m = estimator.magnetometer();
    let orientation = estimator.orientation();

    // Move cursor to top without clearing (reduces flicker)
    write!(out, "\x1B[H")?;
    writeln!(out, "Compass Heading - Live Data                                ")?;
    writeln!(out, "===========================                                ")?;
    writeln!(
        out,
        "Time: {:.2}s | Events: {} | Rate: {:.1} Hz                ",
        source_time,
        clock.events(),
        clock.rate_hz()
    )?;
    writeln!(out)?;

    writeln!(out, "HEADING  {:>8}                                    ", heading.to_string())?;
    writeln!(out, "  [{}]", heading_gauge(heading, 41))?;
    writeln!(
        out,
        "  Pitch: {:+7.1}°   Roll: {:+7.1}°          ",
        orientation.pitch_degrees(),
        orientation.roll_degrees()
    )?;
    writeln!(out)?;

    writeln!(out, "ACCELEROMETER (m/s²)")?;
    writeln!(out, "  X: {:+8.3}  Y: {:+8.3}  Z: {:+8.3}      ", a.x, a.y, a.z)?;
    writeln!(out, "MAGNETOMETER (µT)")?;
    writeln!(out, "  X: {:+8.2}  Y: {:+8.2}  Z: {:+8.2}      ", m.x, m.y, m.z)?;

    writeln!(out)?;
    if !estimator.has_both_readings() {
        writeln!(out, "Waiting for both sensors...                   ")?;
    } else {
        writeln!(out, "Press Ctrl+C to exit                          ")?;
    }

    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_rotator::{device_readings, SensorEvent, SensorKind};

    #[test]
    fn test_final_frame_shows_last_heading() {
        let config = SimulationConfig::default();
        let mut events = Vec::new();
        for (i, yaw) in [10.0f32, 20.0, 30.0, 40.0].into_iter().enumerate() {
            let (accel, mag) = device_readings(&config, yaw, 0.0, 0.0);
            let t = i as f64 * 0.01;
            events.push(SensorEvent::new(SensorKind::Accelerometer, accel, t));
            events.push(SensorEvent::new(SensorKind::MagneticField, mag, t));
        }
        let mut source = ReplaySource::from_events(events);
        let mut out = Vec::new();

        let clock = run_dashboard(&mut source, &mut out, &AtomicBool::new(false), None).unwrap();
        assert_eq!(clock.events(), 8);

        let text = String::from_utf8(out).unwrap();
        let last_heading = text.lines().filter(|l| l.starts_with("HEADING")).last().unwrap();
        assert!(last_heading.contains("+40.0°"), "{}", last_heading);
    }
}
