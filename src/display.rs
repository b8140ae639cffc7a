//! Live/frozen selection of the heading shown on screen

use crate::orientation::HeadingAngle;

/// Whether the display follows the sensors or holds a captured heading
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DisplayState {
    /// Show the most recent heading
    #[default]
    Live,
    /// Show the heading captured when the display was frozen
    Fixed(HeadingAngle),
}

impl DisplayState {
    /// Freeze at `current_heading` when live, resume live tracking when fixed
    pub fn toggle(&mut self, current_heading: HeadingAngle) {
        *self = match *self {
            DisplayState::Live => DisplayState::Fixed(current_heading),
            DisplayState::Fixed(_) => DisplayState::Live,
        };
    }

    /// Heading to render this frame
    pub fn angle_to_show(&self, live_heading: HeadingAngle) -> HeadingAngle {
        match *self {
            DisplayState::Live => live_heading,
            DisplayState::Fixed(frozen) => frozen,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, DisplayState::Fixed(_))
    }

    /// Label for the button that triggers the next toggle
    pub fn toggle_label(&self) -> &'static str {
        match self {
            DisplayState::Live => "Freeze",
            DisplayState::Fixed(_) => "Unfreeze",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deg(d: f32) -> HeadingAngle {
        HeadingAngle::from_degrees(d)
    }

    #[test]
    fn test_starts_live() {
        let state = DisplayState::default();
        assert_eq!(state, DisplayState::Live);
        assert_eq!(state.angle_to_show(deg(42.0)), deg(42.0));
        assert_eq!(state.toggle_label(), "Freeze");
    }

    #[test]
    fn test_fixed_ignores_live_heading() {
        let mut state = DisplayState::default();
        state.toggle(deg(10.0));

        assert!(state.is_fixed());
        assert_eq!(state.toggle_label(), "Unfreeze");
        for live in [-170.0, 0.0, 10.0, 95.5] {
            assert_eq!(state.angle_to_show(deg(live)), deg(10.0));
        }
    }

    #[test]
    fn test_double_toggle_returns_to_live() {
        let mut state = DisplayState::default();
        state.toggle(deg(-45.0));
        // The heading passed when unfreezing is discarded
        state.toggle(deg(120.0));

        assert_eq!(state, DisplayState::Live);
        assert_eq!(state.angle_to_show(deg(7.0)), deg(7.0));
    }

    #[test]
    fn test_refreeze_captures_new_heading() {
        let mut state = DisplayState::default();
        state.toggle(deg(30.0));
        state.toggle(deg(31.0));
        state.toggle(deg(80.0));
        assert_eq!(state, DisplayState::Fixed(deg(80.0)));
    }
}
