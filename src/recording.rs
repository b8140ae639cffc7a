//! CSV recording and replay of sensor sessions
//!
//! File layout:
//! ```text
//! # started 2026-10-16T09:30:00+02:00
//! timestamp_s,sensor,x,y,z
//! 0.000000,accelerometer,0.0000,0.0000,9.8100
//! 0.000000,magnetic_field,0.0000,22.0000,-42.0000
//! ```
//! Lines starting with `#` and blank lines are ignored when reading.

use crate::error::{HeadingError, Result};
use crate::sensor::{self, SensorEvent, SensorKind, SensorSource};
use crate::vector::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Column header written after the comment line
pub const CSV_HEADER: &str = "timestamp_s,sensor,x,y,z";

/// Writes sensor events as CSV rows
pub struct Recorder<W: Write> {
    writer: W,
    event_count: usize,
}

impl Recorder<BufWriter<File>> {
    /// Create a new recording file, truncating any existing one
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        info!("Recording to {}", path.as_ref().display());
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> Recorder<W> {
    /// Start a recording on any writer and emit the header
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(writer, "# started {}", chrono::Local::now().to_rfc3339())?;
        writeln!(writer, "{}", CSV_HEADER)?;
        Ok(Self {
            writer,
            event_count: 0,
        })
    }

    pub fn append(&mut self, event: &SensorEvent) -> Result<()> {
        let v = event.values;
        writeln!(
            self.writer,
            "{:.6},{},{:.4},{:.4},{:.4}",
            event.timestamp, event.kind, v.x, v.y, v.z
        )?;
        self.event_count += 1;
        Ok(())
    }

    pub fn append_batch(&mut self, events: &[SensorEvent]) -> Result<()> {
        for event in events {
            self.append(event)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of events written so far
    pub fn event_count(&self) -> usize {
        self.event_count
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}

/// Parse one data row; `line_no` is 1-based for error messages
fn parse_line(line: &str, line_no: usize) -> Result<SensorEvent> {
    let parse_err = |message: String| HeadingError::Parse {
        line: line_no,
        message,
    };

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 5 {
        return Err(parse_err(format!("expected 5 fields, found {}", fields.len())));
    }

    let timestamp: f64 = fields[0]
        .parse()
        .ok()
        .filter(|t: &f64| t.is_finite())
        .ok_or_else(|| parse_err(format!("invalid timestamp '{}'", fields[0])))?;
    let kind: SensorKind = fields[1].parse().map_err(|e| parse_err(format!("{}", e)))?;

    let mut values = [0.0f32; 3];
    for (slot, field) in values.iter_mut().zip(&fields[2..]) {
        *slot = field
            .parse()
            .ok()
            .filter(|v: &f32| v.is_finite())
            .ok_or_else(|| parse_err(format!("invalid value '{}'", field)))?;
    }

    Ok(SensorEvent::new(kind, Vector3::from(values), timestamp))
}

/// Read every event from a recording
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<SensorEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == CSV_HEADER {
            continue;
        }
        events.push(parse_line(trimmed, index + 1)?);
    }
    Ok(events)
}

/// Replays a recording as a [`SensorSource`]
pub struct ReplaySource {
    events: Vec<SensorEvent>,
    position: usize,
    realtime: bool,
    start: Option<Instant>,
    stop: Option<Arc<AtomicBool>>,
}

impl ReplaySource {
    /// Load a recording from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let events = read_events(BufReader::new(file))?;
        if events.is_empty() {
            warn!("Recording {} contains no events", path.as_ref().display());
        } else {
            info!(
                "Loaded {} events ({:.1}s) from {}",
                events.len(),
                events.last().map(|e| e.timestamp).unwrap_or(0.0),
                path.as_ref().display()
            );
        }
        Ok(Self::from_events(events))
    }

    pub fn from_events(events: Vec<SensorEvent>) -> Self {
        Self {
            events,
            position: 0,
            realtime: false,
            start: None,
            stop: None,
        }
    }

    /// Sleep between events to honour the recorded timestamps
    pub fn realtime(mut self, enabled: bool) -> Self {
        self.realtime = enabled;
        self
    }

    /// End the replay early once `flag` is raised, even mid-sleep
    pub fn stop_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Recorded time span (first, last) in seconds
    pub fn time_range(&self) -> Option<(f64, f64)> {
        Some((self.events.first()?.timestamp, self.events.last()?.timestamp))
    }
}

impl SensorSource for ReplaySource {
    fn next_event(&mut self) -> Result<Option<SensorEvent>> {
        let stop = self.stop.as_deref();
        if sensor::stop_requested(stop) {
            return Ok(None);
        }
        let Some(event) = self.events.get(self.position).copied() else {
            return Ok(None);
        };
        self.position += 1;

        if self.realtime {
            let first = self.events[0].timestamp;
            let offset = Duration::try_from_secs_f64((event.timestamp - first).max(0.0)).map_err(|e| {
                HeadingError::InvalidParameter(format!("timestamp {}: {}", event.timestamp, e))
            })?;
            let start = *self.start.get_or_insert_with(Instant::now);
            let due = start.checked_add(offset).ok_or_else(|| {
                HeadingError::InvalidParameter(format!("timestamp {} is too far ahead", event.timestamp))
            })?;
            if !sensor::pace_until(due, stop) {
                return Ok(None);
            }
        }

        Ok(Some(event))
    }
}
