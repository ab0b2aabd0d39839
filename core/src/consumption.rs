//! Breathing gas volume accounting.

/// Surface-equivalent gas volume (L) breathed over `dt_min` at `ambient_pressure`.
pub fn consume(sac_rate_l_min: f64, ambient_pressure: f64, dt_min: f64) -> f64 {
    sac_rate_l_min * ambient_pressure * dt_min
}

/// Running total of gas used over a dive.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionTracker {
    sac_rate_l_min: f64,
    total_l: f64,
}

impl ConsumptionTracker {
    pub fn new(sac_rate_l_min: f64) -> Self {
        Self {
            sac_rate_l_min,
            total_l: 0.0,
        }
    }

    /// Add one tick of breathing and return the volume it used.
    pub fn record(&mut self, ambient_pressure: f64, dt_min: f64) -> f64 {
        let used = consume(self.sac_rate_l_min, ambient_pressure, dt_min);
        self.total_l += used;
        used
    }

    pub fn total_l(&self) -> f64 {
        self.total_l
    }
}

/// Cylinder pressure (bar) left after using `consumed_l` from a full cylinder.
pub fn remaining_pressure(start_pressure_bar: f64, cylinder_volume_l: f64, consumed_l: f64) -> f64 {
    start_pressure_bar - consumed_l / cylinder_volume_l
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumption_scales_with_pressure() {
        assert!((consume(20.0, 1.0, 1.0) - 20.0).abs() < 1e-12);
        assert!((consume(20.0, 4.0, 1.0) - 80.0).abs() < 1e-12);
        assert!((consume(20.0, 4.0, 0.5) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_tracker_accumulates() {
        let mut tracker = ConsumptionTracker::new(19.0);
        for _ in 0..10 {
            tracker.record(3.0, 0.1);
        }
        assert!((tracker.total_l() - 57.0).abs() < 1e-9, "got {}", tracker.total_l());
    }

    #[test]
    fn test_remaining_pressure() {
        assert!((remaining_pressure(200.0, 15.0, 1500.0) - 100.0).abs() < 1e-12);
        assert!(remaining_pressure(200.0, 10.0, 2500.0) < 0.0);
    }
}
