//! Nitrox gas mixes and the bottom/deco gas switch policy.

use serde::{Deserialize, Serialize};

use crate::buhlmann::{ambient_pressure, METERS_PER_BAR, SURFACE_PRESSURE};
use crate::models::DivePhase;

/// Highest oxygen partial pressure (bar) a gas may be breathed at.
pub const MAX_PPO2: f64 = 1.6;

/// Slack (bar) for floating point noise when comparing ppO2 against the limit.
pub const PPO2_TOLERANCE: f64 = 1e-9;

/// Oxygen/nitrogen breathing gas. The nitrogen fraction is always `1 - o2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasMix {
    /// Fraction of O2 (0.0–1.0)
    pub o2_fraction: f64,
}

impl GasMix {
    pub fn new(o2_fraction: f64) -> Self {
        Self { o2_fraction }
    }

    /// Gas from an oxygen percentage, e.g. `32.0` for EAN32.
    pub fn from_percent(o2_percent: f64) -> Self {
        Self::new(o2_percent / 100.0)
    }

    pub fn nitrogen_fraction(&self) -> f64 {
        1.0 - self.o2_fraction
    }

    /// Oxygen partial pressure (bar) when breathed at `depth_m`.
    pub fn ppo2_at(&self, depth_m: f64) -> f64 {
        ambient_pressure(depth_m) * self.o2_fraction
    }

    /// Whether breathing this gas at `depth_m` puts ppO2 above 1.6 bar.
    pub fn exceeds_ppo2_limit(&self, depth_m: f64) -> bool {
        self.ppo2_at(depth_m) > MAX_PPO2 + PPO2_TOLERANCE
    }

    /// Maximum operating depth (m) at a ppO2 of 1.6 bar.
    pub fn max_operating_depth(&self) -> f64 {
        max_operating_depth(self.o2_fraction)
    }
}

/// Depth (m) at which a gas with `o2_fraction` reaches a ppO2 of 1.6 bar.
pub fn max_operating_depth(o2_fraction: f64) -> f64 {
    (MAX_PPO2 / o2_fraction - SURFACE_PRESSURE) * METERS_PER_BAR
}

/// Picks the breathing gas for a depth and dive phase.
///
/// Stateless: the answer depends only on depth, phase and the configured
/// gases, so the simulator records the switch tick itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasSwitchPolicy {
    bottom: GasMix,
    deco: Option<GasMix>,
}

impl GasSwitchPolicy {
    pub fn new(bottom: GasMix, deco: Option<GasMix>) -> Self {
        Self { bottom, deco }
    }

    pub fn bottom_gas(&self) -> GasMix {
        self.bottom
    }

    pub fn deco_gas(&self) -> Option<GasMix> {
        self.deco
    }

    /// Depth (m) at or above which the deco gas is breathed during ascent.
    pub fn switch_depth(&self) -> Option<f64> {
        self.deco.map(|gas| gas.max_operating_depth())
    }

    /// Whether the deco gas is breathed at `depth_m` in `phase`.
    pub fn uses_deco_gas(&self, depth_m: f64, phase: DivePhase) -> bool {
        match (phase, self.deco) {
            (DivePhase::Ascent, Some(deco)) => depth_m <= deco.max_operating_depth(),
            _ => false,
        }
    }

    pub fn active_gas(&self, depth_m: f64, phase: DivePhase) -> GasMix {
        match self.deco {
            Some(deco) if self.uses_deco_gas(depth_m, phase) => deco,
            _ => self.bottom,
        }
    }

    pub fn active_fraction(&self, depth_m: f64, phase: DivePhase) -> f64 {
        self.active_gas(depth_m, phase).nitrogen_fraction()
    }
}
