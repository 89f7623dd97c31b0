use std::time::Duration;

use crate::MIN_FILL_DURATION;

const DEFAULT_FILL: Duration = Duration::from_millis(7_500);
const DEFAULT_POUR: Duration = Duration::from_secs(2);

/// Water carried by the mug between the faucet and the pan.
///
/// The level fills while the mug sits under a dispensing faucet and drains
/// while it pours over the pan. Pouring only succeeds while water remains.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterVessel {
    level: f32,
    fill: Duration,
    pour: Duration,
}

impl WaterVessel {
    /// Creates an empty vessel with the provided fill and pour durations.
    #[must_use]
    pub const fn new(fill: Duration, pour: Duration) -> Self {
        Self {
            level: 0.0,
            fill,
            pour,
        }
    }

    /// Current water level in `[0, 1]`.
    #[must_use]
    pub const fn level(&self) -> f32 {
        self.level
    }

    /// Adds water for the provided delta.
    pub fn fill(&mut self, dt: Duration) {
        if self.level < 1.0 {
            self.level = (self.level + rate(dt, self.fill)).min(1.0);
        }
    }

    /// Pours water for the provided delta, returning whether any water flowed.
    pub fn pour(&mut self, dt: Duration) -> bool {
        if self.level <= 0.0 {
            return false;
        }
        self.level = (self.level - rate(dt, self.pour)).max(0.0);
        true
    }

    /// Discards all water.
    pub fn empty(&mut self) {
        self.level = 0.0;
    }
}

impl Default for WaterVessel {
    fn default() -> Self {
        Self::new(DEFAULT_FILL, DEFAULT_POUR)
    }
}

fn rate(dt: Duration, full: Duration) -> f32 {
    dt.as_secs_f32() / full.max(MIN_FILL_DURATION).as_secs_f32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pour_fails_once_empty() {
        let mut vessel = WaterVessel::new(Duration::from_secs(1), Duration::from_secs(1));
        assert!(!vessel.pour(Duration::from_millis(250)));

        vessel.fill(Duration::from_millis(500));
        assert_eq!(vessel.level(), 0.5);

        assert!(vessel.pour(Duration::from_millis(750)));
        assert_eq!(vessel.level(), 0.0);
        assert!(!vessel.pour(Duration::from_millis(250)));
    }

    #[test]
    fn fill_saturates_at_full() {
        let mut vessel = WaterVessel::default();
        vessel.fill(Duration::from_secs(60));
        assert_eq!(vessel.level(), 1.0);
        vessel.empty();
        assert_eq!(vessel.level(), 0.0);
    }
}
