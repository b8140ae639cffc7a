//! Sensor Session Recorder
//!
//! Streams a simulated device and writes every accelerometer and magnetometer
//! event to a CSV file that `heading-reader --source replay` can play back.
//!
//! Usage:
//!   recorder --output session.csv --rate 100 --duration 30

use clap::Parser;
use compass_rotator::{
    init_logging, Recorder, SensorEvent, SensorSource, SimulatedDevice, SimulationConfig, StreamControl,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Events buffered before each write
const BATCH_SIZE: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "recorder")]
#[command(about = "Record simulated accelerometer/magnetometer sessions to CSV", long_about = None)]
struct Args {
    /// Output CSV path (defaults to recording_<timestamp>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sample rate in Hz per sensor (1-1000)
    #[arg(short, long, default_value = "50")]
    rate: u32,

    /// Yaw rate in degrees/second
    #[arg(long, default_value = "30", allow_hyphen_values = true)]
    yaw_rate: f32,

    /// Peak tilt in degrees
    #[arg(long, default_value = "15")]
    tilt: f32,

    /// Duration in seconds (optional, runs until Ctrl+C if omitted)
    #[arg(short, long)]
    duration: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging("info");

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "recording_{}.csv",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ))
    });

    let config = SimulationConfig {
        rate_hz: args.rate,
        yaw_rate_dps: args.yaw_rate,
        tilt_deg: args.tilt,
        ..Default::default()
    };
    let mut device = SimulatedDevice::new(config)?;
    let mut recorder = Recorder::create(&output)?;

    match args.duration {
        Some(d) => info!("Recording for {} seconds", d),
        None => info!("Recording until Ctrl+C"),
    }

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("Received Ctrl+C, stopping recording...");
        r.store(false, Ordering::SeqCst);
    })?;

    let start = Instant::now();
    let end_time = args.duration.map(|d| start + Duration::from_secs(d));
    let mut batch: Vec<SensorEvent> = Vec::with_capacity(BATCH_SIZE);
    let mut write_error = None;

    device.stream(|event| {
        if !running.load(Ordering::SeqCst) {
            return StreamControl::Break;
        }
        if let Some(end) = end_time {
            if Instant::now() >= end {
                return StreamControl::Break;
            }
        }

        batch.push(event);
        if batch.len() >= BATCH_SIZE {
            if let Err(e) = recorder.append_batch(&batch) {
                error!("Write error: {}", e);
                write_error = Some(e);
                return StreamControl::Break;
            }
            batch.clear();
        }

        StreamControl::Continue
    })?;

    if let Some(e) = write_error {
        error!("Attempting to flush data...");
        if let Err(flush_err) = recorder.flush() {
            error!("Failed to flush: {}", flush_err);
        }
        return Err(Box::new(e));
    }

    recorder.append_batch(&batch)?;
    recorder.flush()?;

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "Recorded {} events in {:.2}s ({:.1} Hz) to {}",
        recorder.event_count(),
        elapsed,
        recorder.event_count() as f64 / elapsed,
        output.display()
    );

    Ok(())
}
