//! Synthetic accelerometer/magnetometer source
//!
//! Models a device that spins about the vertical axis at a constant rate while
//! rocking back and forth in pitch. Useful on machines with no motion sensors
//! and as a deterministic input for tests.

use crate::error::{HeadingError, Result};
use crate::orientation::STANDARD_GRAVITY;
use crate::sensor::{self, SensorEvent, SensorKind, SensorSource};
use crate::vector::Vector3;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Simulation parameters
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Readings per sensor per second
    pub rate_hz: u32,
    /// Yaw rate in degrees/second (positive turns clockwise seen from above)
    pub yaw_rate_dps: f32,
    /// Peak pitch in degrees
    pub tilt_deg: f32,
    /// Period of one pitch oscillation in seconds
    pub wobble_period_s: f32,
    /// Horizontal field strength in µT
    pub field_north_ut: f32,
    /// Vertical field strength in µT (positive points down)
    pub field_down_ut: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rate_hz: 50,
            yaw_rate_dps: 30.0,
            tilt_deg: 15.0,
            wobble_period_s: 4.0,
            field_north_ut: 22.0,
            field_down_ut: 42.0,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rate_hz == 0 || self.rate_hz > 1000 {
            return Err(HeadingError::InvalidParameter(format!(
                "rate must be 1-1000 Hz, got {}",
                self.rate_hz
            )));
        }
        if self.tilt_deg.abs() >= 90.0 {
            return Err(HeadingError::InvalidParameter(format!(
                "tilt must be within ±90°, got {}",
                self.tilt_deg
            )));
        }
        if self.wobble_period_s <= 0.0 {
            return Err(HeadingError::InvalidParameter(
                "wobble period must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Accelerometer and magnetometer readings for a device at the given attitude
///
/// Angles are in degrees. The device is first yawed clockwise from north, then
/// pitched about its X axis (positive raises the top edge), then rolled about
/// its Y axis. World gravity `(0, 0, g)` and field `(0, north, -down)` are
/// rotated into device coordinates.
pub fn device_readings(config: &SimulationConfig, yaw: f32, pitch: f32, roll: f32) -> (Vector3, Vector3) {
    let gravity = [0.0, 0.0, STANDARD_GRAVITY as f64];
    let field = [0.0, config.field_north_ut as f64, -(config.field_down_ut as f64)];

    let (sy, cy) = (yaw as f64).to_radians().sin_cos();
    let (sp, cp) = (pitch as f64).to_radians().sin_cos();
    let (sr, cr) = (roll as f64).to_radians().sin_cos();

    let to_device = |v: [f64; 3]| -> Vector3 {
        // Undo yaw
        let (x, y, z) = (v[0] * cy - v[1] * sy, v[0] * sy + v[1] * cy, v[2]);
        // Undo pitch
        let (x, y, z) = (x, y * cp + z * sp, -y * sp + z * cp);
        // Undo roll
        let (x, y, z) = (x * cr - z * sr, y, x * sr + z * cr);

        Vector3::new(x as f32, y as f32, z as f32)
    };

    (to_device(gravity), to_device(field))
}

/// Sensor source that synthesizes readings from [`SimulationConfig`]
pub struct SimulatedDevice {
    config: SimulationConfig,
    tick: u64,
    pending: Option<SensorEvent>,
    paced: bool,
    start: Option<Instant>,
    stop: Option<Arc<AtomicBool>>,
}

impl SimulatedDevice {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Simulated device: {} Hz, yaw {:.1}°/s, tilt ±{:.1}°",
            config.rate_hz, config.yaw_rate_dps, config.tilt_deg
        );
        Ok(Self {
            config,
            tick: 0,
            pending: None,
            paced: true,
            start: None,
            stop: None,
        })
    }

    /// Emit events as fast as they are requested instead of in real time
    pub fn without_pacing(mut self) -> Self {
        self.paced = false;
        self
    }

    /// End the stream once `flag` is raised, even while waiting for a tick
    pub fn stop_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulated attitude (yaw, pitch, roll) in degrees at time `t`
    pub fn attitude_at(&self, t: f64) -> (f32, f32, f32) {
        let yaw = (self.config.yaw_rate_dps as f64 * t) as f32;
        let phase = 2.0 * std::f64::consts::PI * t / self.config.wobble_period_s as f64;
        let pitch = (self.config.tilt_deg as f64 * phase.sin()) as f32;
        (yaw, pitch, 0.0)
    }

    /// Returns false if the stop flag was raised while waiting
    fn wait_until(&mut self, t: f64) -> bool {
        if !self.paced {
            return true;
        }
        let start = *self.start.get_or_insert_with(Instant::now);
        sensor::pace_until(start + Duration::from_secs_f64(t), self.stop.as_deref())
    }
}

impl SensorSource for SimulatedDevice {
    fn next_event(&mut self) -> Result<Option<SensorEvent>> {
        if sensor::stop_requested(self.stop.as_deref()) {
            return Ok(None);
        }
        if let Some(event) = self.pending.take() {
            return Ok(Some(event));
        }

        let t = self.tick as f64 / self.config.rate_hz as f64;
        self.tick += 1;
        if !self.wait_until(t) {
            return Ok(None);
        }

        let (yaw, pitch, roll) = self.attitude_at(t);
        let (accel, mag) = device_readings(&self.config, yaw, pitch, roll);

        self.pending = Some(SensorEvent::new(SensorKind::MagneticField, mag, t));
        Ok(Some(SensorEvent::new(SensorKind::Accelerometer, accel, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::OrientationEstimator;

    #[test]
    fn test_flat_north_readings() {
        let config = SimulationConfig::default();
        let (accel, mag) = device_readings(&config, 0.0, 0.0, 0.0);
        assert!((accel.z - STANDARD_GRAVITY).abs() < 1e-5);
        assert!(accel.x.abs() < 1e-5 && accel.y.abs() < 1e-5);
        assert!((mag.y - 22.0).abs() < 1e-5);
        assert!((mag.z + 42.0).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_raises_gravity_on_y() {
        let (accel, _) = device_readings(&SimulationConfig::default(), 0.0, 90.0, 0.0);
        assert!((accel.y - STANDARD_GRAVITY).abs() < 1e-4);
        assert!(accel.z.abs() < 1e-4);
    }

    #[test]
    fn test_events_alternate_and_share_timestamps() {
        let config = SimulationConfig {
            rate_hz: 10,
            ..Default::default()
        };
        let mut device = SimulatedDevice::new(config).unwrap().without_pacing();

        let first = device.next_event().unwrap().unwrap();
        let second = device.next_event().unwrap().unwrap();
        let third = device.next_event().unwrap().unwrap();

        assert_eq!(first.kind, SensorKind::Accelerometer);
        assert_eq!(second.kind, SensorKind::MagneticField);
        assert_eq!(third.kind, SensorKind::Accelerometer);
        assert_eq!(first.timestamp, second.timestamp);
        assert!((third.timestamp - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_estimator_follows_simulated_yaw() {
        let config = SimulationConfig {
            rate_hz: 100,
            yaw_rate_dps: 90.0,
            ..Default::default()
        };
        let mut device = SimulatedDevice::new(config).unwrap().without_pacing();
        let mut estimator = OrientationEstimator::new();

        // 1 second: 100 ticks, 2 events each
        let mut last = None;
        for _ in 0..200 {
            let event = device.next_event().unwrap().unwrap();
            last = Some((event.timestamp, estimator.on_sensor_event(&event)));
        }

        let (t, heading) = last.unwrap();
        let expected = (90.0 * t) as f32;
        assert!((heading.degrees() - expected).abs() < 0.05);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let zero_rate = SimulationConfig {
            rate_hz: 0,
            ..Default::default()
        };
        assert!(SimulatedDevice::new(zero_rate).is_err());

        let vertical = SimulationConfig {
            tilt_deg: 90.0,
            ..Default::default()
        };
        assert!(matches!(
            SimulatedDevice::new(vertical),
            Err(HeadingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_stop_flag_ends_paced_stream() {
        let config = SimulationConfig {
            rate_hz: 1,
            ..Default::default()
        };
        let stop = Arc::new(AtomicBool::new(false));
        let mut device = SimulatedDevice::new(config).unwrap().stop_on(stop.clone());

        let raiser = {
            let stop = stop.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(100));
                stop.store(true, std::sync::atomic::Ordering::SeqCst);
            })
        };

        let started = Instant::now();
        let count = device.stream(|_| crate::sensor::StreamControl::Continue).unwrap();
        raiser.join().unwrap();

        // The second tick is a full second away
        assert_eq!(count, 2);
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
