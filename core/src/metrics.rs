//! Summary metrics for a finished simulation.
//!
//! Pure functions over a `SimulationLog`, used to assemble the `DivePlan`
//! returned to presentation.

use crate::models::{DecoStop, DivePhase, ProfileSample, SimulationLog};

/// Stops taken during the ascent.
///
/// A stop is a run of ascent ticks that stay at the same depth as the tick
/// before; its duration is the sum of those held ticks.
pub fn deco_stops(samples: &[ProfileSample]) -> Vec<DecoStop> {
    let mut stops: Vec<DecoStop> = Vec::new();
    let mut holding = false;

    for pair in samples.windows(2) {
        let (prev, sample) = (&pair[0], &pair[1]);
        let held = sample.phase == DivePhase::Ascent
            && sample.depth_m > 0.0
            && sample.depth_m == prev.depth_m;

        if !held {
            holding = false;
            continue;
        }

        let dt = sample.time_min - prev.time_min;
        if holding {
            if let Some(stop) = stops.last_mut() {
                stop.duration_min += dt;
            }
        } else {
            stops.push(DecoStop {
                depth_m: sample.depth_m,
                duration_min: dt,
            });
        }
        holding = true;
    }

    stops
}

/// Highest ppO2 seen in the log (bar).
pub fn max_ppo2(samples: &[ProfileSample]) -> f64 {
    samples.iter().map(|s| s.ppo2).fold(0.0_f64, f64::max)
}

/// Time from the last bottom sample (or the start) to surfacing (min).
pub fn ascent_time(log: &SimulationLog) -> f64 {
    let ascent_start = log
        .samples
        .iter()
        .rev()
        .find(|s| matches!(s.phase, DivePhase::Descent | DivePhase::Bottom))
        .map(|s| s.time_min)
        .unwrap_or(0.0);
    (log.total_time_min() - ascent_start).max(0.0)
}

/// Maximum ceiling reached anywhere in the log (m).
pub fn max_ceiling(samples: &[ProfileSample]) -> f64 {
    samples.iter().map(|s| s.ceiling_m).fold(0.0_f64, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time_min: f64, depth_m: f64, phase: DivePhase) -> ProfileSample {
        ProfileSample {
            time_min,
            depth_m,
            phase,
            o2_fraction: 0.21,
            ppo2: (depth_m / 10.0 + 1.0) * 0.21,
            ceiling_m: 0.0,
        }
    }

    #[test]
    fn test_no_stops_on_direct_ascent() {
        let samples = vec![
            sample(1.0, 20.0, DivePhase::Bottom),
            sample(2.0, 10.0, DivePhase::Ascent),
            sample(3.0, 0.0, DivePhase::Ascent),
        ];
        assert!(deco_stops(&samples).is_empty());
    }

    #[test]
    fn test_bottom_hold_is_not_a_stop() {
        let samples = vec![
            sample(1.0, 20.0, DivePhase::Bottom),
            sample(2.0, 20.0, DivePhase::Bottom),
            sample(3.0, 0.0, DivePhase::Ascent),
        ];
        assert!(deco_stops(&samples).is_empty());
    }

    #[test]
    fn test_stops_grouped_by_depth() {
        let samples = vec![
            sample(10.0, 30.0, DivePhase::Bottom),
            sample(11.0, 6.0, DivePhase::Ascent),
            sample(12.0, 6.0, DivePhase::Ascent),
            sample(13.0, 6.0, DivePhase::Ascent),
            sample(14.0, 3.0, DivePhase::Ascent),
            sample(15.0, 3.0, DivePhase::Ascent),
            sample(16.0, 0.0, DivePhase::Ascent),
            sample(17.0, 0.0, DivePhase::Ascent),
        ];
        let stops = deco_stops(&samples);
        assert_eq!(
            stops,
            vec![
                DecoStop {
                    depth_m: 6.0,
                    duration_min: 2.0
                },
                DecoStop {
                    depth_m: 3.0,
                    duration_min: 1.0
                },
            ]
        );
    }

    #[test]
    fn test_max_ppo2_and_ascent_time() {
        let log = SimulationLog {
            samples: vec![
                sample(1.0, 10.0, DivePhase::Descent),
                sample(3.0, 30.0, DivePhase::Bottom),
                sample(5.0, 10.0, DivePhase::Ascent),
                sample(7.5, 0.0, DivePhase::Ascent),
            ],
            tissue_history: Vec::new(),
            gas_consumed_l: 0.0,
        };
        assert!((max_ppo2(&log.samples) - 0.84).abs() < 1e-9);
        assert!((ascent_time(&log) - 4.5).abs() < 1e-9);
        assert_eq!(max_ceiling(&log.samples), 0.0);
    }
}
