//! Heading estimation from accelerometer and magnetometer readings
//!
//! The estimator keeps the latest reading of each sensor and, on demand,
//! builds a tilt-compensated rotation matrix from them:
//!
//! 1. `H = E × A` (magnetic field × gravity) points east in device coordinates
//! 2. `M = A × H` points towards magnetic north
//! 3. `A` itself points up
//!
//! The azimuth is then `atan2(R[1], R[4])`, i.e. the angle of the device Y axis
//! measured clockwise from magnetic north. No filtering is applied: every new
//! sample fully replaces the previous one.

use crate::error::{HeadingError, Result};
use crate::sensor::{SensorEvent, SensorKind};
use crate::vector::Vector3;
use std::fmt;
use tracing::debug;

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f32 = 9.81;

/// Accelerometer readings with |A|² below this are treated as free fall
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;

/// Minimum |E × A| for the east axis to be trusted
const MIN_EAST_NORM: f32 = 0.1;

/// Heading in degrees, normalized to (-180, 180]
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct HeadingAngle(f32);

impl HeadingAngle {
    /// Build a heading from any angle in degrees, wrapping into (-180, 180]
    pub fn from_degrees(degrees: f32) -> Self {
        let mut wrapped = degrees % 360.0;
        if wrapped <= -180.0 {
            wrapped += 360.0;
        } else if wrapped > 180.0 {
            wrapped -= 360.0;
        }
        Self(wrapped)
    }

    pub fn from_radians(radians: f32) -> Self {
        Self::from_degrees(radians * (180.0 / std::f32::consts::PI))
    }

    pub fn degrees(self) -> f32 {
        self.0
    }

    pub fn radians(self) -> f32 {
        self.0.to_radians()
    }
}

impl fmt::Display for HeadingAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.1}°", self.0)
    }
}

/// Azimuth, pitch and roll in radians
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    /// Rotation about the vertical axis, clockwise from magnetic north
    pub azimuth: f32,
    /// Rotation about the device X axis (negative when the top edge is raised)
    pub pitch: f32,
    /// Rotation about the device Y axis
    pub roll: f32,
}

impl Orientation {
    pub fn heading(&self) -> HeadingAngle {
        HeadingAngle::from_radians(self.azimuth)
    }

    pub fn pitch_degrees(&self) -> f32 {
        self.pitch.to_degrees()
    }

    pub fn roll_degrees(&self) -> f32 {
        self.roll.to_degrees()
    }
}

/// Row-major 3x3 rotation matrix from device to world coordinates
///
/// Rows are the world east, north and up axes expressed in device coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationMatrix([f32; 9]);

impl RotationMatrix {
    /// Build a rotation matrix from a gravity and a geomagnetic reading
    ///
    /// # Errors
    /// * `FreeFall` - gravity magnitude below 10% of standard gravity
    /// * `DegenerateReading` - field parallel to gravity, or either vector zero
    pub fn from_gravity_and_geomagnetic(gravity: Vector3, geomagnetic: Vector3) -> Result<Self> {
        if gravity.norm_squared() < FREE_FALL_GRAVITY_SQUARED {
            return Err(HeadingError::FreeFall);
        }

        let east = geomagnetic.cross(&gravity);
        let east_norm = east.norm();
        if east_norm.is_nan() || east_norm < MIN_EAST_NORM {
            return Err(HeadingError::DegenerateReading);
        }

        let east = east.normalized().ok_or(HeadingError::DegenerateReading)?;
        let up = gravity.normalized().ok_or(HeadingError::DegenerateReading)?;
        let north = up.cross(&east);

        Ok(Self([
            east.x, east.y, east.z, //
            north.x, north.y, north.z, //
            up.x, up.y, up.z,
        ]))
    }

    pub fn as_array(&self) -> &[f32; 9] {
        &self.0
    }

    /// Extract azimuth, pitch and roll
    ///
    /// An all-zero matrix yields all-zero angles.
    pub fn orientation(&self) -> Orientation {
        let r = &self.0;
        Orientation {
            azimuth: r[1].atan2(r[4]),
            pitch: (-r[7]).clamp(-1.0, 1.0).asin(),
            roll: (-r[6]).atan2(r[8]),
        }
    }
}

/// Tracks the latest accelerometer and magnetometer readings
///
/// # Example
/// ```
/// use compass_rotator::{OrientationEstimator, Vector3};
///
/// let mut estimator = OrientationEstimator::new();
/// estimator.update_accelerometer(Vector3::new(0.0, 0.0, 9.81));
/// estimator.update_magnetometer(Vector3::new(0.0, 22.0, -42.0));
///
/// // Device lying flat with its top edge pointing north
/// assert!(estimator.current_heading().degrees().abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrientationEstimator {
    accelerometer: Option<Vector3>,
    magnetometer: Option<Vector3>,
    /// Last matrix that could be built; all zeros until the first success
    rotation: RotationMatrix,
}

impl OrientationEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored accelerometer reading
    pub fn update_accelerometer(&mut self, reading: Vector3) {
        self.accelerometer = Some(reading);
    }

    /// Replace the stored magnetometer reading
    pub fn update_magnetometer(&mut self, reading: Vector3) {
        self.magnetometer = Some(reading);
    }

    pub fn accelerometer(&self) -> Vector3 {
        self.accelerometer.unwrap_or_default()
    }

    pub fn magnetometer(&self) -> Vector3 {
        self.magnetometer.unwrap_or_default()
    }

    /// True once each sensor has reported at least once
    pub fn has_both_readings(&self) -> bool {
        self.accelerometer.is_some() && self.magnetometer.is_some()
    }

    /// Route a sensor event to the matching reading and recompute the heading
    pub fn on_sensor_event(&mut self, event: &SensorEvent) -> HeadingAngle {
        match event.kind {
            SensorKind::Accelerometer => self.update_accelerometer(event.values),
            SensorKind::MagneticField => self.update_magnetometer(event.values),
        }
        self.current_heading()
    }

    /// Recompute orientation from the latest readings and return the heading
    ///
    /// Readings that cannot form a rotation matrix leave the previous matrix in
    /// place, so the returned heading is always derived from some past pair of
    /// usable readings. Until both sensors have produced such a pair the
    /// heading is 0°; callers should not rely on it before then.
    pub fn current_heading(&mut self) -> HeadingAngle {
        match self.compute_rotation() {
            Ok(rotation) => self.rotation = rotation,
            Err(e) => debug!("Keeping previous rotation matrix: {}", e),
        }
        self.rotation.orientation().heading()
    }

    /// Like [`current_heading`](Self::current_heading) but reports unusable
    /// readings instead of falling back to the previous matrix
    pub fn try_current_heading(&self) -> Result<HeadingAngle> {
        Ok(self.compute_rotation()?.orientation().heading())
    }

    /// Azimuth, pitch and roll of the last computed rotation matrix
    pub fn orientation(&self) -> Orientation {
        self.rotation.orientation()
    }

    pub fn rotation_matrix(&self) -> &RotationMatrix {
        &self.rotation
    }

    fn compute_rotation(&self) -> Result<RotationMatrix> {
        RotationMatrix::from_gravity_and_geomagnetic(self.accelerometer(), self.magnetometer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{device_readings, SimulationConfig};

    fn angle_diff(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    fn heading_at(yaw: f32, pitch: f32, roll: f32) -> f32 {
        let (accel, mag) = device_readings(&SimulationConfig::default(), yaw, pitch, roll);
        let mut estimator = OrientationEstimator::new();
        estimator.update_accelerometer(accel);
        estimator.update_magnetometer(mag);
        estimator.current_heading().degrees()
    }

    #[test]
    fn test_heading_wraps_into_half_open_range() {
        assert_eq!(HeadingAngle::from_degrees(-180.0).degrees(), 180.0);
        assert_eq!(HeadingAngle::from_degrees(180.0).degrees(), 180.0);
        assert_eq!(HeadingAngle::from_degrees(270.0).degrees(), -90.0);
        assert_eq!(HeadingAngle::from_degrees(-450.0).degrees(), -90.0);
        assert_eq!(HeadingAngle::from_degrees(45.0).degrees(), 45.0);
    }

    #[test]
    fn test_flat_device_tracks_yaw() {
        for yaw in [0.0, 45.0, 90.0, 135.0, 180.0, -90.0] {
            let heading = heading_at(yaw, 0.0, 0.0);
            assert!(
                angle_diff(heading, yaw) < 0.01,
                "yaw {} gave heading {}",
                yaw,
                heading
            );
        }
    }

    #[test]
    fn test_heading_ignores_tilt() {
        for yaw in [0.0, 90.0, 180.0] {
            let flat = heading_at(yaw, 0.0, 0.0);
            for (pitch, roll) in [(20.0, 0.0), (-35.0, 0.0), (0.0, 25.0), (30.0, -40.0)] {
                let tilted = heading_at(yaw, pitch, roll);
                assert!(
                    angle_diff(flat, tilted) < 0.01,
                    "yaw {} pitch {} roll {}: {} vs {}",
                    yaw,
                    pitch,
                    roll,
                    flat,
                    tilted
                );
            }
        }
    }

    #[test]
    fn test_upright_device_reading() {
        let mut estimator = OrientationEstimator::new();
        estimator.update_accelerometer(Vector3::new(0.0, 9.8, 0.0));
        estimator.update_magnetometer(Vector3::new(0.0, 0.0, -50.0));

        let heading = estimator.current_heading();
        assert_eq!(heading.degrees(), 0.0);
        assert!((estimator.orientation().pitch_degrees() + 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_heading_is_zero_before_both_sensors_report() {
        let mut estimator = OrientationEstimator::new();
        assert!(!estimator.has_both_readings());
        assert_eq!(estimator.current_heading().degrees(), 0.0);

        estimator.update_accelerometer(Vector3::new(0.0, 0.0, 9.81));
        assert_eq!(estimator.current_heading().degrees(), 0.0);
        assert!(matches!(
            estimator.try_current_heading(),
            Err(HeadingError::DegenerateReading)
        ));
    }

    #[test]
    fn test_degenerate_reading_keeps_previous_heading() {
        let (accel, mag) = device_readings(&SimulationConfig::default(), 60.0, 0.0, 0.0);
        let mut estimator = OrientationEstimator::new();
        estimator.update_accelerometer(accel);
        estimator.update_magnetometer(mag);
        let before = estimator.current_heading();

        // Free fall
        estimator.update_accelerometer(Vector3::new(0.0, 0.0, 0.5));
        assert!(matches!(estimator.try_current_heading(), Err(HeadingError::FreeFall)));
        assert_eq!(estimator.current_heading(), before);

        // Field parallel to gravity
        estimator.update_accelerometer(Vector3::new(0.0, 0.0, 9.81));
        estimator.update_magnetometer(Vector3::new(0.0, 0.0, -40.0));
        assert_eq!(estimator.current_heading(), before);
    }

    #[test]
    fn test_sensor_event_routing() {
        let (accel, mag) = device_readings(&SimulationConfig::default(), -120.0, 10.0, 5.0);
        let mut estimator = OrientationEstimator::new();
        estimator.on_sensor_event(&SensorEvent::new(SensorKind::Accelerometer, accel, 0.0));
        let heading = estimator.on_sensor_event(&SensorEvent::new(SensorKind::MagneticField, mag, 0.01));

        assert_eq!(estimator.accelerometer(), accel);
        assert_eq!(estimator.magnetometer(), mag);
        assert!(angle_diff(heading.degrees(), -120.0) < 0.01);
    }

    #[test]
    fn test_rotation_matrix_is_orthonormal() {
        let (accel, mag) = device_readings(&SimulationConfig::default(), 33.0, 12.0, -8.0);
        let r = RotationMatrix::from_gravity_and_geomagnetic(accel, mag).unwrap();
        let m = r.as_array();
        let rows = [
            Vector3::new(m[0], m[1], m[2]),
            Vector3::new(m[3], m[4], m[5]),
            Vector3::new(m[6], m[7], m[8]),
        ];
        for (i, a) in rows.iter().enumerate() {
            for (j, b) in rows.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((a.dot(b) - expected).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_zero_matrix_orientation() {
        let o = RotationMatrix::default().orientation();
        assert_eq!(o, Orientation::default());
    }
}
