use crate::error::PresenterError;

pub const DEFAULT_ZOOM_MIN: f64 = 0.2;
pub const DEFAULT_ZOOM_MAX: f64 = 5.0;
pub const DEFAULT_ZOOM_STEP: f64 = 0.2;
pub const INITIAL_ZOOM: f64 = 1.0;

/// Zoom results are rounded to this many steps per unit so that repeated
/// increments land exactly on the configured bounds.
const ZOOM_PRECISION: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomSettings {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min: DEFAULT_ZOOM_MIN,
            max: DEFAULT_ZOOM_MAX,
            step: DEFAULT_ZOOM_STEP,
        }
    }
}

impl ZoomSettings {
    /// Narrower range used by the compact slide layout.
    pub fn compact() -> Self {
        Self {
            min: 0.5,
            max: 2.0,
            step: 0.1,
        }
    }

    pub fn validate(&self) -> Result<(), PresenterError> {
        if ![self.min, self.max, self.step].iter().all(|v| v.is_finite()) {
            return Err(PresenterError::InvalidZoom(
                "zoom bounds and step must be finite".into(),
            ));
        }
        if self.min <= 0.0 {
            return Err(PresenterError::InvalidZoom(format!(
                "minimum zoom {} must be positive",
                self.min
            )));
        }
        if self.min >= self.max {
            return Err(PresenterError::InvalidZoom(format!(
                "minimum zoom {} must be below maximum {}",
                self.min, self.max
            )));
        }
        if self.step <= 0.0 {
            return Err(PresenterError::InvalidZoom(format!(
                "zoom step {} must be positive",
                self.step
            )));
        }
        Ok(())
    }

    pub fn clamp(&self, level: f64) -> f64 {
        level.clamp(self.min, self.max)
    }
}

fn normalize(level: f64) -> f64 {
    (level * ZOOM_PRECISION).round() / ZOOM_PRECISION
}

/// Slide index, zoom level and presenting flag. Mutated only by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationState {
    current_index: usize,
    zoom_level: f64,
    is_presenting: bool,
}

impl PresentationState {
    pub fn new(zoom: &ZoomSettings) -> Self {
        Self {
            current_index: 0,
            zoom_level: zoom.clamp(INITIAL_ZOOM),
            is_presenting: false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn is_presenting(&self) -> bool {
        self.is_presenting
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.current_index = index;
    }

    /// One step up, clamped. Returns `false` when already at the maximum.
    pub(crate) fn zoom_in(&mut self, zoom: &ZoomSettings) -> bool {
        if self.zoom_level >= zoom.max {
            return false;
        }
        self.zoom_level = normalize(self.zoom_level + zoom.step).min(zoom.max);
        true
    }

    /// One step down, clamped. Returns `false` when already at the minimum.
    pub(crate) fn zoom_out(&mut self, zoom: &ZoomSettings) -> bool {
        if self.zoom_level <= zoom.min {
            return false;
        }
        self.zoom_level = normalize(self.zoom_level - zoom.step).max(zoom.min);
        true
    }

    pub(crate) fn start(&mut self) -> bool {
        !std::mem::replace(&mut self.is_presenting, true)
    }

    pub(crate) fn pause(&mut self) -> bool {
        std::mem::replace(&mut self.is_presenting, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_in_clamps_exactly_at_maximum() {
        let zoom = ZoomSettings::default();
        let mut state = PresentationState::new(&zoom);
        let changed = (0..25).filter(|_| state.zoom_in(&zoom)).count();

        assert_eq!(changed, 20);
        assert_eq!(state.zoom_level(), 5.0);
        assert!(!state.zoom_in(&zoom));
        assert_eq!(state.zoom_level(), 5.0);
    }

    #[test]
    fn zoom_out_clamps_exactly_at_minimum() {
        let zoom = ZoomSettings::default();
        let mut state = PresentationState::new(&zoom);
        for _ in 0..10 {
            state.zoom_out(&zoom);
        }
        assert_eq!(state.zoom_level(), 0.2);
        assert!(!state.zoom_out(&zoom));
    }

    #[test]
    fn mixed_steps_stay_within_bounds_without_drift() {
        let zoom = ZoomSettings::compact();
        let mut state = PresentationState::new(&zoom);
        for round in 0..200 {
            if round % 3 == 0 {
                state.zoom_out(&zoom);
            } else {
                state.zoom_in(&zoom);
            }
            let level = state.zoom_level();
            assert!((zoom.min..=zoom.max).contains(&level), "level {level}");
            let steps = level / zoom.step;
            assert!((steps - steps.round()).abs() < 1e-9, "level {level} drifted");
        }
    }

    #[test]
    fn start_and_pause_only_report_real_changes() {
        let mut state = PresentationState::new(&ZoomSettings::default());
        assert!(!state.pause());
        assert!(state.start());
        assert!(!state.start());
        assert!(state.pause());
        assert!(!state.is_presenting());
    }

    #[test]
    fn rejects_inverted_or_degenerate_zoom_ranges() {
        let inverted = ZoomSettings {
            min: 2.0,
            max: 1.0,
            step: 0.1,
        };
        assert!(inverted.validate().is_err());
        let zero_step = ZoomSettings {
            step: 0.0,
            ..ZoomSettings::default()
        };
        assert!(zero_step.validate().is_err());
        assert!(ZoomSettings::default().validate().is_ok());
        assert!(ZoomSettings::compact().validate().is_ok());
    }

    #[test]
    fn initial_zoom_is_clamped_into_range() {
        let zoom = ZoomSettings {
            min: 1.5,
            max: 3.0,
            step: 0.5,
        };
        assert_eq!(PresentationState::new(&zoom).zoom_level(), 1.5);
    }
}
