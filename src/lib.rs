//! Tilt-compensated compass heading from accelerometer and magnetometer data
//!
//! This library turns raw gravity and magnetic field readings into a heading
//! angle, keeps a live/frozen display selection, and computes the geometry of
//! the rotating compass polygon drawn by the GUI.
//!
//! # Quick Start
//!
//! ## Computing a Heading
//! ```
//! use compass_rotator::{OrientationEstimator, Vector3};
//!
//! let mut estimator = OrientationEstimator::new();
//! estimator.update_accelerometer(Vector3::new(0.0, 0.0, 9.81));
//! estimator.update_magnetometer(Vector3::new(-22.0, 0.0, -42.0));
//!
//! // Top edge of the device points east
//! let heading = estimator.current_heading();
//! assert!((heading.degrees() - 90.0).abs() < 1e-3);
//! ```
//!
//! ## Freezing the Display
//! ```
//! use compass_rotator::{DisplayState, HeadingAngle};
//!
//! let mut display = DisplayState::default();
//! display.toggle(HeadingAngle::from_degrees(12.0));
//!
//! // Further sensor updates are ignored until the next toggle
//! let shown = display.angle_to_show(HeadingAngle::from_degrees(80.0));
//! assert_eq!(shown.degrees(), 12.0);
//! ```
//!
//! ## Streaming From a Source
//! ```no_run
//! use compass_rotator::{OrientationEstimator, SensorSource, SimulatedDevice, SimulationConfig};
//! use std::time::Duration;
//!
//! let mut device = SimulatedDevice::new(SimulationConfig::default())?;
//! let mut estimator = OrientationEstimator::new();
//!
//! device.stream_for(Duration::from_secs(5), |event| {
//!     let heading = estimator.on_sensor_event(&event);
//!     println!("{:.2}s {}", event.timestamp, heading);
//! })?;
//! # Ok::<(), compass_rotator::HeadingError>(())
//! ```

pub mod common;
pub mod display;
pub mod error;
pub mod logging;
pub mod orientation;
pub mod recording;
pub mod sensor;
pub mod shape;
pub mod simulated;
pub mod vector;

// Re-export public API
pub use common::{heading_gauge, SessionClock};
pub use display::DisplayState;
pub use error::{HeadingError, Result};
pub use logging::init_logging;
pub use orientation::{HeadingAngle, Orientation, OrientationEstimator, RotationMatrix};
pub use recording::{read_events, Recorder, ReplaySource};
pub use sensor::{SensorEvent, SensorKind, SensorSource, StreamControl};
pub use shape::{fit_size, CompassShape, Point, Triangle};
pub use simulated::{device_readings, SimulatedDevice, SimulationConfig};
pub use vector::Vector3;
