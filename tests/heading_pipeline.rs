//! End-to-end checks across estimator, display state, recording and replay

use compass_rotator::{
    read_events, DisplayState, HeadingAngle, OrientationEstimator, Recorder, ReplaySource,
    SensorKind, SensorSource, SimulatedDevice, SimulationConfig, StreamControl, Vector3,
};
use proptest::prelude::*;
use std::io::Cursor;

#[test]
fn freeze_survives_sensor_updates_until_released() {
    let mut estimator = OrientationEstimator::new();
    let mut display = DisplayState::default();

    estimator.update_accelerometer(Vector3::new(0.0, 9.8, 0.0));
    estimator.update_magnetometer(Vector3::new(0.0, 0.0, -50.0));
    let h0 = estimator.current_heading();

    display.toggle(h0);
    assert!(display.is_fixed());
    assert_eq!(display.angle_to_show(HeadingAngle::from_degrees(-77.0)), h0);

    // Tilt the device; the live heading may move but the display must not
    estimator.update_accelerometer(Vector3::new(3.0, 6.0, 6.5));
    let live = estimator.current_heading();
    assert_eq!(display.angle_to_show(live), h0);

    display.toggle(live);
    assert_eq!(display, DisplayState::Live);
    let h1 = HeadingAngle::from_degrees(33.0);
    assert_eq!(display.angle_to_show(h1), h1);
}

#[test]
fn replayed_recording_reproduces_headings() {
    let config = SimulationConfig {
        rate_hz: 20,
        yaw_rate_dps: 45.0,
        ..Default::default()
    };
    let mut device = SimulatedDevice::new(config).unwrap().without_pacing();
    let mut recorder = Recorder::new(Vec::new()).unwrap();
    let mut live = OrientationEstimator::new();
    let mut live_headings = Vec::new();

    device
        .stream(|event| {
            recorder.append(&event).unwrap();
            live_headings.push(live.on_sensor_event(&event).degrees());
            if live_headings.len() >= 80 {
                StreamControl::Break
            } else {
                StreamControl::Continue
            }
        })
        .unwrap();
    assert_eq!(recorder.event_count(), 80);

    let bytes = recorder.into_inner().unwrap();
    let events = read_events(Cursor::new(bytes)).unwrap();
    assert_eq!(events.len(), 80);
    assert_eq!(events[0].kind, SensorKind::Accelerometer);
    assert_eq!(events[1].kind, SensorKind::MagneticField);

    let mut replay = ReplaySource::from_events(events);
    let mut replayed = OrientationEstimator::new();
    let mut replay_headings = Vec::new();
    while let Some(event) = replay.next_event().unwrap() {
        replay_headings.push(replayed.on_sensor_event(&event).degrees());
    }

    // Values are written with four decimals, so allow a small drift
    for (a, b) in live_headings.iter().zip(&replay_headings) {
        let diff = (a - b).rem_euclid(360.0);
        assert!(diff.min(360.0 - diff) < 0.05, "{} vs {}", a, b);
    }
}

#[test]
fn replay_file_round_trip() {
    let path = std::env::temp_dir().join(format!("compass_rotator_{}.csv", std::process::id()));
    {
        let mut recorder = Recorder::create(&path).unwrap();
        let mut device = SimulatedDevice::new(SimulationConfig::default())
            .unwrap()
            .without_pacing();
        for _ in 0..10 {
            let event = device.next_event().unwrap().unwrap();
            recorder.append(&event).unwrap();
        }
        recorder.flush().unwrap();
    }

    let replay = ReplaySource::open(&path).unwrap();
    assert_eq!(replay.len(), 10);
    let (first, last) = replay.time_range().unwrap();
    assert_eq!(first, 0.0);
    assert!((last - 0.08).abs() < 1e-6);

    std::fs::remove_file(&path).ok();
}

fn component() -> impl Strategy<Value = f32> {
    -100.0f32..100.0
}

proptest! {
    #[test]
    fn heading_stays_in_half_open_range(
        ax in component(), ay in component(), az in component(),
        mx in component(), my in component(), mz in component(),
    ) {
        let mut estimator = OrientationEstimator::new();
        estimator.update_accelerometer(Vector3::new(ax, ay, az));
        estimator.update_magnetometer(Vector3::new(mx, my, mz));

        let heading = estimator.current_heading().degrees();
        prop_assert!(heading > -180.0 && heading <= 180.0, "heading {}", heading);
    }

    #[test]
    fn wrapping_is_idempotent(degrees in -10_000.0f32..10_000.0) {
        let once = HeadingAngle::from_degrees(degrees);
        let twice = HeadingAngle::from_degrees(once.degrees());
        prop_assert_eq!(once, twice);
        prop_assert!(once.degrees() > -180.0 && once.degrees() <= 180.0);
    }
}
