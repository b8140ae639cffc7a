//! Application state management

use compass_rotator::{DisplayState, HeadingAngle, OrientationEstimator, SensorEvent, SimulationConfig};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// Main application state
///
/// The UI thread is the only owner of the estimator; the sensor thread only
/// sends events over the channel.
#[derive(Default)]
pub struct AppState {
    /// Current application mode
    pub mode: AppMode,

    /// Streaming thread, if any
    pub sensor_handle: Option<SensorHandle>,

    /// Latest readings and derived orientation
    pub estimator: OrientationEstimator,

    /// Heading computed from the most recent event
    pub live_heading: HeadingAngle,

    /// Live or frozen display
    pub display: DisplayState,

    /// Recent live headings for the trace plot
    pub history: HeadingHistory,

    /// Replay file currently playing
    pub replay_path: Option<PathBuf>,

    /// Parameters for the next simulation run
    pub sim_config: SimulationConfig,

    /// UI state
    pub ui: UiState,
}

impl AppState {
    /// Forget readings from a previous session
    pub fn reset_readings(&mut self) {
        self.estimator = OrientationEstimator::new();
        self.live_heading = HeadingAngle::default();
        self.history.clear();
    }

    /// Feed one event through the estimator
    pub fn apply_event(&mut self, event: &SensorEvent) {
        self.live_heading = self.estimator.on_sensor_event(event);
        self.history.push(event.timestamp, self.live_heading);
    }

    /// Heading to draw this frame
    pub fn shown_heading(&self) -> HeadingAngle {
        self.display.angle_to_show(self.live_heading)
    }
}

/// Application mode
#[derive(Default, PartialEq, Clone, Copy)]
pub enum AppMode {
    #[default]
    Idle,      // No source
    Simulated, // Synthetic device running
    Replay,    // Playing a recording
}

/// Handle to the sensor streaming thread
pub struct SensorHandle {
    pub rx: Receiver<SensorEvent>,
    pub stop_signal: Arc<AtomicBool>,
    pub thread: Option<JoinHandle<()>>,
    pub start_time: Instant,
}

impl SensorHandle {
    pub fn new(rx: Receiver<SensorEvent>, stop_signal: Arc<AtomicBool>, thread: JoinHandle<()>) -> Self {
        Self {
            rx,
            stop_signal,
            thread: Some(thread),
            start_time: Instant::now(),
        }
    }

    /// Signal the thread to stop
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }
}

/// Timestamped heading for plotting
#[derive(Clone, Copy)]
pub struct HeadingSample {
    pub timestamp: f64,
    pub degrees: f32,
}

/// Bounded history of live headings
pub struct HeadingHistory {
    data: VecDeque<HeadingSample>,
    max_samples: usize,
}

impl Default for HeadingHistory {
    fn default() -> Self {
        Self::new(6000) // ~60 seconds of events at 50 Hz per sensor
    }
}

impl HeadingHistory {
    pub fn new(max_samples: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn push(&mut self, timestamp: f64, heading: HeadingAngle) {
        if self.data.len() >= self.max_samples {
            self.data.pop_front();
        }
        self.data.push_back(HeadingSample {
            timestamp,
            degrees: heading.degrees(),
        });
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Samples within the last `window_secs` of source time
    pub fn window(&self, window_secs: f64) -> impl Iterator<Item = &HeadingSample> {
        let cutoff = self.data.back().map(|s| s.timestamp - window_secs).unwrap_or(0.0);
        self.data.iter().filter(move |s| s.timestamp >= cutoff)
    }
}

/// UI-specific state
pub struct UiState {
    /// Show the heading trace panel
    pub show_trace: bool,

    /// Trace time window (seconds)
    pub trace_window: f64,

    /// Status message
    pub status: String,

    /// Connection error message
    pub error: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_trace: true,
            trace_window: 10.0,
            status: String::from("Ready"),
            error: None,
        }
    }
}
