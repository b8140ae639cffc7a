//! Common utilities shared across programs

use crate::orientation::HeadingAngle;
use std::time::Instant;

/// Elapsed time and event rate since a session started
pub struct SessionClock {
    start: Instant,
    events: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            events: 0,
        }
    }

    /// Count one more event
    pub fn tick(&mut self) {
        self.events += 1;
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Average events per second, 0 before any time has passed
    pub fn rate_hz(&self) -> f64 {
        let elapsed = self.elapsed_secs();
        if elapsed > 0.0 {
            self.events as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a heading as a marker on a W..N..E compass strip
///
/// The strip spans -180° to +180° with `N` in the middle; the marker `▲` sits
/// at the heading's position.
///
/// # Example
/// ```
/// use compass_rotator::{heading_gauge, HeadingAngle};
///
/// let gauge = heading_gauge(HeadingAngle::from_degrees(0.0), 41);
/// assert_eq!(gauge.chars().nth(20), Some('▲'));
/// ```
pub fn heading_gauge(heading: HeadingAngle, width: usize) -> String {
    let width = width.max(5);
    let last = (width - 1) as f32;
    let position = (((heading.degrees() + 180.0) / 360.0) * last).round() as usize;
    let position = position.min(width - 1);

    let center = width / 2;
    let quarter = width / 4;

    (0..width)
        .map(|i| {
            if i == position {
                '▲'
            } else if i == center {
                'N'
            } else if i == center - quarter {
                'W'
            } else if i == center + quarter {
                'E'
            } else if i == 0 || i == width - 1 {
                'S'
            } else {
                '·'
            }
        })
        .collect()
}
