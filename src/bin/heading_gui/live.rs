//! Sensor streaming thread management

use crate::state::SensorHandle;
use compass_rotator::{ReplaySource, SensorEvent, SensorSource, SimulatedDevice, SimulationConfig, StreamControl};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// Result of attempting to start a source
pub enum ConnectResult {
    Success(SensorHandle),
    Error(String),
}

/// Start the synthetic device on a background thread
pub fn start_simulation(config: SimulationConfig) -> ConnectResult {
    // Build on the UI thread so bad settings are reported immediately
    match SimulatedDevice::new(config) {
        Ok(device) => {
            let stop_signal = Arc::new(AtomicBool::new(false));
            let device = device.stop_on(stop_signal.clone());
            ConnectResult::Success(spawn_source(device, stop_signal))
        }
        Err(e) => ConnectResult::Error(format!("Failed to start simulation: {}", e)),
    }
}

/// Load a recording and replay it in real time on a background thread
pub fn start_replay(path: &Path) -> ConnectResult {
    match ReplaySource::open(path) {
        Ok(replay) if replay.is_empty() => {
            ConnectResult::Error(format!("{} contains no sensor events", path.display()))
        }
        Ok(replay) => {
            let stop_signal = Arc::new(AtomicBool::new(false));
            let replay = replay.realtime(true).stop_on(stop_signal.clone());
            ConnectResult::Success(spawn_source(replay, stop_signal))
        }
        Err(e) => ConnectResult::Error(format!("Failed to load {}: {}", path.display(), e)),
    }
}

/// Stream `source` into a channel until stopped, exhausted or the receiver drops
///
/// `source` must already watch `stop_signal` so a stop request also cuts
/// short any pacing sleep.
fn spawn_source<S>(mut source: S, stop_signal: Arc<AtomicBool>) -> SensorHandle
where
    S: SensorSource + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<SensorEvent>();
    let stop_clone = stop_signal.clone();

    let thread = thread::spawn(move || {
        let result = source.stream(|event| {
            if stop_clone.load(Ordering::Relaxed) {
                return StreamControl::Break;
            }
            if tx.send(event).is_err() {
                // Receiver dropped, stop streaming
                return StreamControl::Break;
            }
            StreamControl::Continue
        });

        match result {
            Ok(count) => info!("Sensor thread finished after {} events", count),
            Err(e) => error!("Sensor thread: stream error: {}", e),
        }
    });

    SensorHandle::new(rx, stop_signal, thread)
}
