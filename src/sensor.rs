//! Sensor events and the source abstraction that produces them

use crate::error::{HeadingError, Result};
use crate::vector::Vector3;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest single sleep between stop-flag checks while pacing
const PACING_SLICE: Duration = Duration::from_millis(20);

/// Control flow for streaming operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamControl {
    /// Continue streaming
    Continue,
    /// Stop streaming
    Break,
}

/// The two sensor types the estimator subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Accelerometer,
    MagneticField,
}

impl SensorKind {
    /// Name used in recordings
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::MagneticField => "magnetic_field",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKind {
    type Err = HeadingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accelerometer" => Ok(SensorKind::Accelerometer),
            "magnetic_field" => Ok(SensorKind::MagneticField),
            other => Err(HeadingError::InvalidParameter(format!(
                "unknown sensor type '{}'",
                other
            ))),
        }
    }
}

/// A single reading delivered by a sensor source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    pub kind: SensorKind,
    pub values: Vector3,
    /// Seconds since the source started
    pub timestamp: f64,
}

impl SensorEvent {
    pub fn new(kind: SensorKind, values: Vector3, timestamp: f64) -> Self {
        Self {
            kind,
            values,
            timestamp,
        }
    }
}

/// Sleep until `due`, waking every [`PACING_SLICE`] to check `stop`
///
/// Returns false if `stop` was raised before `due`.
pub(crate) fn pace_until(due: Instant, stop: Option<&AtomicBool>) -> bool {
    loop {
        if stop_requested(stop) {
            return false;
        }
        let now = Instant::now();
        if now >= due {
            return true;
        }
        thread::sleep((due - now).min(PACING_SLICE));
    }
}

pub(crate) fn stop_requested(stop: Option<&AtomicBool>) -> bool {
    stop.map_or(false, |flag| flag.load(Ordering::SeqCst))
}

/// Anything that delivers accelerometer and magnetometer events in order
///
/// Implementors only provide [`next_event`](SensorSource::next_event); the
/// streaming helpers are built on top of it.
pub trait SensorSource {
    /// Block until the next event is available
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    fn next_event(&mut self) -> Result<Option<SensorEvent>>;

    /// Deliver events to `callback` until it returns `Break` or the source ends
    ///
    /// Returns the number of events delivered.
    fn stream<F>(&mut self, mut callback: F) -> Result<u64>
    where
        Self: Sized,
        F: FnMut(SensorEvent) -> StreamControl,
    {
        let mut count = 0u64;
        while let Some(event) = self.next_event()? {
            count += 1;
            if callback(event) == StreamControl::Break {
                break;
            }
        }
        Ok(count)
    }

    /// Deliver events to `callback` for a fixed wall-clock duration
    fn stream_for<F>(&mut self, duration: Duration, mut callback: F) -> Result<u64>
    where
        Self: Sized,
        F: FnMut(SensorEvent),
    {
        let deadline = Instant::now() + duration;
        self.stream(|event| {
            callback(event);
            if Instant::now() >= deadline {
                StreamControl::Break
            } else {
                StreamControl::Continue
            }
        })
    }
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn next_event(&mut self) -> Result<Option<SensorEvent>> {
        (**self).next_event()
    }
}
