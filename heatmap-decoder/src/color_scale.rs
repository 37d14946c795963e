//! Colour-scale range control
//!
//! Computes the `(vmin, vmax)` range used to map temperatures to colours.
//! Either a fixed range is configured, or the range follows the current
//! readings with a half-degree margin. Small range movements are suppressed so
//! the display does not flicker.

use crate::types::SENSOR_COUNT;

/// Margin added on each side of the observed min/max
const ADAPTIVE_MARGIN: f64 = 0.5;

/// Readings spread narrower than this count as all equal
const MIN_SPREAD: f64 = 0.1;

/// Extra widening applied to a degenerate range, per side
const DEGENERATE_WIDEN: f64 = 0.5;

/// Bound movement that counts as a real change
const HYSTERESIS: f64 = 0.05;

/// Temperature bounds for colour mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    pub vmin: f64,
    pub vmax: f64,
}

impl DisplayRange {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    pub fn span(&self) -> f64 {
        self.vmax - self.vmin
    }

    /// Position of `value` within the range, clamped to `[0, 1]`
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return 0.5;
        }
        ((value - self.vmin) / span).clamp(0.0, 1.0)
    }

    /// True if either bound moved by more than the hysteresis threshold
    fn differs_from(&self, other: &DisplayRange) -> bool {
        (self.vmin - other.vmin).abs() > HYSTERESIS || (self.vmax - other.vmax).abs() > HYSTERESIS
    }
}

/// Result of one range computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeUpdate {
    /// Range computed for this tick
    pub range: DisplayRange,
    /// Whether the caller should apply `range` to the display
    pub changed: bool,
}

/// Adaptive range from four values, before hysteresis
///
/// When the readings are (nearly) equal the margin is doubled, giving a
/// range two degrees wide centred on the common value.
pub fn adaptive_range(values: &[f64; SENSOR_COUNT]) -> DisplayRange {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut vmin = min - ADAPTIVE_MARGIN;
    let mut vmax = max + ADAPTIVE_MARGIN;
    if (max - min).abs() < MIN_SPREAD {
        vmin -= DEGENERATE_WIDEN;
        vmax += DEGENERATE_WIDEN;
    }
    DisplayRange::new(vmin, vmax)
}

/// Tracks the applied range between render ticks
#[derive(Debug, Clone, Default)]
pub struct ColorScale {
    fixed: Option<DisplayRange>,
    applied: Option<DisplayRange>,
}

impl ColorScale {
    /// Adaptive colour scale
    pub fn adaptive() -> Self {
        Self::default()
    }

    /// Colour scale pinned to `[vmin, vmax]`
    pub fn fixed(vmin: f64, vmax: f64) -> Self {
        Self {
            fixed: Some(DisplayRange::new(vmin, vmax)),
            applied: None,
        }
    }

    /// Build from an optional fixed override
    pub fn from_override(fixed: Option<(f64, f64)>) -> Self {
        match fixed {
            Some((vmin, vmax)) => Self::fixed(vmin, vmax),
            None => Self::adaptive(),
        }
    }

    /// Range last reported as changed
    pub fn applied(&self) -> Option<DisplayRange> {
        self.applied
    }

    /// Compute this tick's range and decide whether it should be applied
    pub fn compute_range(&mut self, values: &[f64; SENSOR_COUNT]) -> RangeUpdate {
        let range = self.fixed.unwrap_or_else(|| adaptive_range(values));

        let changed = match &self.applied {
            None => true,
            Some(last) => range.differs_from(last),
        };
        if changed {
            log::debug!("Colour range -> [{:.2}, {:.2}]", range.vmin, range.vmax);
            self.applied = Some(range);
        }

        RangeUpdate { range, changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_adaptive_margin() {
        let range = adaptive_range(&[20.0, 21.0, 19.0, 20.5]);
        assert_relative_eq!(range.vmin, 18.5, epsilon = 1e-12);
        assert_relative_eq!(range.vmax, 21.5, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_values_are_widened() {
        let range = adaptive_range(&[20.0; 4]);
        assert_relative_eq!(range.vmin, 19.0, epsilon = 1e-12);
        assert_relative_eq!(range.vmax, 21.0, epsilon = 1e-12);

        let near = adaptive_range(&[20.0, 20.05, 20.0, 20.02]);
        assert_relative_eq!(near.vmin, 19.0, epsilon = 1e-12);
        assert_relative_eq!(near.vmax, 21.05, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_range_is_returned_unchanged() {
        let mut scale = ColorScale::fixed(15.0, 60.0);
        let first = scale.compute_range(&[20.0, 25.0, 30.0, 35.0]);
        assert_eq!(first.range, DisplayRange::new(15.0, 60.0));
        assert!(first.changed);

        let second = scale.compute_range(&[-5.0, 80.0, 0.0, 1.0]);
        assert_eq!(second.range, DisplayRange::new(15.0, 60.0));
        assert!(!second.changed);
    }

    #[test]
    fn test_hysteresis() {
        let mut scale = ColorScale::adaptive();
        assert!(scale.compute_range(&[20.0, 21.0, 19.0, 20.5]).changed);

        // 0.04 shift on both bounds
        let small = scale.compute_range(&[20.04, 21.04, 19.04, 20.54]);
        assert!(!small.changed);
        assert_relative_eq!(small.range.vmin, 18.54, epsilon = 1e-9);
        assert_relative_eq!(scale.applied().unwrap().vmin, 18.5, epsilon = 1e-12);

        let large = scale.compute_range(&[20.0, 21.2, 19.0, 20.5]);
        assert!(large.changed);
        assert_relative_eq!(scale.applied().unwrap().vmax, 21.7, epsilon = 1e-9);
    }

    #[test]
    fn test_normalize() {
        let range = DisplayRange::new(10.0, 20.0);
        assert_eq!(range.normalize(15.0), 0.5);
        assert_eq!(range.normalize(-100.0), 0.0);
        assert_eq!(range.normalize(100.0), 1.0);
        assert_eq!(DisplayRange::new(5.0, 5.0).normalize(5.0), 0.5);
    }
}
