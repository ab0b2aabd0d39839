//! Input configuration and result types shared with the bindings.

use serde::{Deserialize, Serialize};

use crate::gas::GasMix;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivePhase {
    Descent,
    Bottom,
    Ascent,
    Surfaced,
}

/// Immutable dive plan input. Fractions, not percentages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiveConfig {
    /// Planned maximum depth (m)
    pub max_depth_m: f64,
    /// Time held at max depth after the descent (min)
    pub bottom_time_min: f64,
    pub descent_rate_m_min: f64,
    pub ascent_rate_m_min: f64,
    /// Surface air consumption (L/min)
    pub sac_rate_l_min: f64,
    pub cylinder_volume_l: f64,
    pub start_pressure_bar: f64,
    /// Gradient factor applied at max depth (0.0-1.0)
    pub gf_low: f64,
    /// Gradient factor applied at the surface (0.0-1.0)
    pub gf_high: f64,
    pub bottom_o2_fraction: f64,
    /// Deco gas O2 fraction; `None` disables gas switching
    pub deco_o2_fraction: Option<f64>,
    /// Integration step (min)
    pub time_step_min: f64,
    /// Ascent time after which the plan is abandoned as divergent (min)
    pub max_ascent_time_min: f64,
}

pub const DEFAULT_DESCENT_RATE_M_MIN: f64 = 15.0;
pub const DEFAULT_TIME_STEP_MIN: f64 = 0.1;
pub const DEFAULT_MAX_ASCENT_TIME_MIN: f64 = 24.0 * 60.0;

impl DiveConfig {
    pub fn bottom_gas(&self) -> GasMix {
        GasMix::new(self.bottom_o2_fraction)
    }

    pub fn deco_gas(&self) -> Option<GasMix> {
        self.deco_o2_fraction.map(GasMix::new)
    }
}

/// Percent-based plan request, as collected from a user.
///
/// Missing fields fall back to the planner's stock defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(default = "default_max_depth")]
    pub max_depth_m: f64,
    #[serde(default = "default_bottom_time")]
    pub bottom_time_min: f64,
    #[serde(default = "default_descent_rate")]
    pub descent_rate_m_min: f64,
    #[serde(default = "default_ascent_rate")]
    pub ascent_rate_m_min: f64,
    #[serde(default = "default_sac_rate")]
    pub sac_rate_l_min: f64,
    #[serde(default = "default_cylinder_volume")]
    pub cylinder_volume_l: f64,
    #[serde(default = "default_start_pressure")]
    pub start_pressure_bar: f64,
    #[serde(default = "default_gf_low")]
    pub gf_low_pct: f64,
    #[serde(default = "default_gf_high")]
    pub gf_high_pct: f64,
    #[serde(default = "default_bottom_o2")]
    pub bottom_o2_pct: f64,
    #[serde(default)]
    pub deco_o2_pct: Option<f64>,
    #[serde(default = "default_time_step")]
    pub time_step_min: f64,
    #[serde(default = "default_max_ascent_time")]
    pub max_ascent_time_min: f64,
}

fn default_max_depth() -> f64 {
    40.0
}

fn default_bottom_time() -> f64 {
    20.0
}

fn default_descent_rate() -> f64 {
    DEFAULT_DESCENT_RATE_M_MIN
}

fn default_ascent_rate() -> f64 {
    10.0
}

fn default_sac_rate() -> f64 {
    19.0
}

fn default_cylinder_volume() -> f64 {
    15.0
}

fn default_start_pressure() -> f64 {
    200.0
}

fn default_gf_low() -> f64 {
    30.0
}

fn default_gf_high() -> f64 {
    70.0
}

fn default_bottom_o2() -> f64 {
    32.0
}

fn default_time_step() -> f64 {
    DEFAULT_TIME_STEP_MIN
}

fn default_max_ascent_time() -> f64 {
    DEFAULT_MAX_ASCENT_TIME_MIN
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            max_depth_m: default_max_depth(),
            bottom_time_min: default_bottom_time(),
            descent_rate_m_min: default_descent_rate(),
            ascent_rate_m_min: default_ascent_rate(),
            sac_rate_l_min: default_sac_rate(),
            cylinder_volume_l: default_cylinder_volume(),
            start_pressure_bar: default_start_pressure(),
            gf_low_pct: default_gf_low(),
            gf_high_pct: default_gf_high(),
            bottom_o2_pct: default_bottom_o2(),
            deco_o2_pct: None,
            time_step_min: default_time_step(),
            max_ascent_time_min: default_max_ascent_time(),
        }
    }
}

impl PlanRequest {
    /// Convert percentages to fractions. Values are not validated here.
    pub fn into_config(self) -> DiveConfig {
        DiveConfig {
            max_depth_m: self.max_depth_m,
            bottom_time_min: self.bottom_time_min,
            descent_rate_m_min: self.descent_rate_m_min,
            ascent_rate_m_min: self.ascent_rate_m_min,
            sac_rate_l_min: self.sac_rate_l_min,
            cylinder_volume_l: self.cylinder_volume_l,
            start_pressure_bar: self.start_pressure_bar,
            gf_low: self.gf_low_pct / 100.0,
            gf_high: self.gf_high_pct / 100.0,
            bottom_o2_fraction: self.bottom_o2_pct / 100.0,
            deco_o2_fraction: self.deco_o2_pct.map(|pct| pct / 100.0),
            time_step_min: self.time_step_min,
            max_ascent_time_min: self.max_ascent_time_min,
        }
    }
}

/// State at the end of one simulated tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    /// Elapsed time since leaving the surface (min)
    pub time_min: f64,
    pub depth_m: f64,
    pub phase: DivePhase,
    /// O2 fraction of the gas breathed during the tick
    pub o2_fraction: f64,
    pub ppo2: f64,
    /// Ceiling from the tissue state after the tick (m)
    pub ceiling_m: f64,
}

/// Append-only record of a simulation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationLog {
    pub samples: Vec<ProfileSample>,
    /// Per-compartment pressure history (bar), indexed `[compartment][tick]`
    pub tissue_history: Vec<Vec<f64>>,
    /// Cumulative surface-equivalent gas volume (L)
    pub gas_consumed_l: f64,
}

impl SimulationLog {
    pub fn time_depth_series(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.time_min, s.depth_m)).collect()
    }

    pub fn ppo2_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.ppo2).collect()
    }

    pub fn total_time_min(&self) -> f64 {
        self.samples.last().map(|s| s.time_min).unwrap_or(0.0)
    }
}

/// A held decompression stop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecoStop {
    pub depth_m: f64,
    pub duration_min: f64,
}

/// The moment the deco gas became active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasSwitch {
    /// Index into `SimulationLog::samples` of the first tick on deco gas
    pub tick: u64,
    pub time_min: f64,
    pub depth_m: f64,
}

/// Non-fatal condition found while planning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlanWarning {
    /// ppO2 above 1.6 bar during a tick
    Ppo2Exceeded {
        time_min: f64,
        depth_m: f64,
        ppo2: f64,
    },
    /// The cylinder runs dry before the surface
    GasExhausted { remaining_pressure_bar: f64 },
}

/// Complete planner output handed to presentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DivePlan {
    pub log: SimulationLog,
    pub total_time_min: f64,
    /// Time from leaving the bottom to surfacing (min)
    pub ascent_time_min: f64,
    /// Total time held at stops (min)
    pub deco_time_min: f64,
    pub stops: Vec<DecoStop>,
    pub gas_consumed_l: f64,
    pub remaining_pressure_bar: f64,
    pub max_ppo2: f64,
    pub bottom_gas_mod_m: f64,
    pub deco_gas_mod_m: Option<f64>,
    /// `None` when no switch happened
    pub gas_switch: Option<GasSwitch>,
    pub warnings: Vec<PlanWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: PlanRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PlanRequest::default());
        assert_eq!(request.bottom_o2_pct, 32.0);
        assert_eq!(request.deco_o2_pct, None);
    }

    #[test]
    fn test_request_into_config_converts_percent() {
        let request: PlanRequest = serde_json::from_str(
            r#"{"max_depth_m": 30, "gf_low_pct": 30, "gf_high_pct": 70, "bottom_o2_pct": 32, "deco_o2_pct": 50}"#,
        )
        .unwrap();
        let config = request.into_config();
        assert!((config.gf_low - 0.3).abs() < 1e-12);
        assert!((config.gf_high - 0.7).abs() < 1e-12);
        assert!((config.bottom_o2_fraction - 0.32).abs() < 1e-12);
        assert_eq!(config.deco_o2_fraction, Some(0.5));
        assert_eq!(config.deco_gas(), Some(GasMix::new(0.5)));
        assert_eq!(config.time_step_min, DEFAULT_TIME_STEP_MIN);
    }

    #[test]
    fn test_empty_log() {
        let log = SimulationLog::default();
        assert_eq!(log.total_time_min(), 0.0);
        assert!(log.time_depth_series().is_empty());
    }
}
