//! Bühlmann ZHL-16C tissue model and gradient-factor ceiling.
//!
//! Tracks dissolved nitrogen in 16 independent compartments using the
//! Schreiner closed-form update, and converts the current loading into a
//! ceiling (the shallowest depth the diver may ascend to) under a
//! depth-interpolated gradient factor.

// ============================================================================
// Physical Constants
// ============================================================================

/// Water vapour pressure in the lungs (bar), at 37°C.
pub const P_WATER_VAPOR: f64 = 0.0627;

/// Absolute pressure at the surface (bar).
pub const SURFACE_PRESSURE: f64 = 1.0;

/// Metres of water per bar of hydrostatic pressure.
pub const METERS_PER_BAR: f64 = 10.0;

/// Nitrogen loading of every compartment before the dive (bar).
pub const INITIAL_N2_PRESSURE: f64 = 0.79;

/// Absolute ambient pressure (bar) at `depth_m`.
pub fn ambient_pressure(depth_m: f64) -> f64 {
    depth_m.max(0.0) / METERS_PER_BAR + SURFACE_PRESSURE
}

/// Depth (m) equivalent of an absolute pressure, floored at the surface.
pub fn depth_from_pressure(pressure: f64) -> f64 {
    ((pressure - SURFACE_PRESSURE) * METERS_PER_BAR).max(0.0)
}

// ============================================================================
// ZHL-16C Compartment Constants
// ============================================================================

/// Number of tissue compartments.
pub const NUM_COMPARTMENTS: usize = 16;

/// A modeled tissue group: N2 half-time and Bühlmann tolerance coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compartment {
    /// Half-time in minutes.
    pub half_life_min: f64,
    /// 'a' coefficient (bar).
    pub a: f64,
    /// 'b' coefficient (dimensionless).
    pub b: f64,
}

impl Compartment {
    const fn new(half_life_min: f64, a: f64, b: f64) -> Self {
        Self { half_life_min, a, b }
    }

    /// Exchange rate constant `ln(2) / half_life` (1/min).
    pub fn rate_constant(&self) -> f64 {
        std::f64::consts::LN_2 / self.half_life_min
    }
}

/// Compartments ordered fastest to slowest.
pub const COMPARTMENTS: [Compartment; NUM_COMPARTMENTS] = [
    Compartment::new(4.0, 1.2599, 0.5050),
    Compartment::new(5.0, 1.0000, 0.6314),
    Compartment::new(8.0, 0.8618, 0.7222),
    Compartment::new(12.5, 0.7562, 0.7825),
    Compartment::new(18.5, 0.6667, 0.8126),
    Compartment::new(27.0, 0.5600, 0.8434),
    Compartment::new(38.3, 0.4947, 0.8693),
    Compartment::new(54.3, 0.4500, 0.8910),
    Compartment::new(77.0, 0.4187, 0.9092),
    Compartment::new(109.0, 0.3798, 0.9222),
    Compartment::new(146.0, 0.3497, 0.9319),
    Compartment::new(187.0, 0.3223, 0.9403),
    Compartment::new(239.0, 0.2850, 0.9477),
    Compartment::new(305.0, 0.2737, 0.9544),
    Compartment::new(390.0, 0.2523, 0.9602),
    Compartment::new(498.0, 0.2327, 0.9653),
];

/// Inspired (alveolar) N2 partial pressure for a gas breathed at `ambient_pressure`.
pub fn alveolar_pressure(ambient_pressure: f64, nitrogen_fraction: f64) -> f64 {
    ((ambient_pressure - P_WATER_VAPOR) * nitrogen_fraction).max(0.0)
}

// ============================================================================
// Gradient Factors
// ============================================================================

/// Low/high gradient factor pair, as fractions in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientFactors {
    /// Applied at the planned maximum depth.
    pub low: f64,
    /// Applied at the surface.
    pub high: f64,
}

impl GradientFactors {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Gradient factor at `depth_m`, linear from `high` at the surface to
    /// `low` at `planned_max_depth_m`.
    ///
    /// A non-positive planned depth has no slope; the surface value is used.
    pub fn at_depth(&self, depth_m: f64, planned_max_depth_m: f64) -> f64 {
        if planned_max_depth_m <= 0.0 {
            return self.high;
        }
        let ratio = (depth_m / planned_max_depth_m).clamp(0.0, 1.0);
        self.high + (self.low - self.high) * ratio
    }
}

// ============================================================================
// Tissue State
// ============================================================================

/// Dissolved N2 pressure (bar) in each of the 16 compartments.
#[derive(Debug, Clone, PartialEq)]
pub struct TissueState {
    p_n2: [f64; NUM_COMPARTMENTS],
}

impl Default for TissueState {
    fn default() -> Self {
        Self::pre_dive()
    }
}

impl TissueState {
    /// Loading before the dive starts.
    pub fn pre_dive() -> Self {
        Self::uniform(INITIAL_N2_PRESSURE)
    }

    /// Every compartment at the same pressure.
    pub fn uniform(pressure: f64) -> Self {
        Self {
            p_n2: [pressure.max(0.0); NUM_COMPARTMENTS],
        }
    }

    pub fn pressures(&self) -> &[f64; NUM_COMPARTMENTS] {
        &self.p_n2
    }

    /// Expose the compartments for `dt_min` minutes at `ambient_pressure`
    /// breathing a gas with the given N2 fraction.
    ///
    /// Exact exponential solution, so the result does not depend on `dt_min`
    /// being small.
    pub fn advance(&mut self, ambient_pressure: f64, nitrogen_fraction: f64, dt_min: f64) {
        if dt_min <= 0.0 {
            return;
        }
        let p_alv = alveolar_pressure(ambient_pressure, nitrogen_fraction);
        for (p, compartment) in self.p_n2.iter_mut().zip(COMPARTMENTS.iter()) {
            let k = compartment.rate_constant();
            *p = p_alv + (*p - p_alv) * (-k * dt_min).exp();
        }
    }

    /// Tolerated ambient pressure (bar) for compartment `i` under gradient factor `gf`.
    fn tolerated_pressure(&self, i: usize, gf: f64) -> f64 {
        let Compartment { a, b, .. } = COMPARTMENTS[i];
        (self.p_n2[i] - a * gf) / (gf / b + 1.0 - gf)
    }

    /// Deepest tolerated ambient pressure over all compartments, with the
    /// index of the compartment that sets it.
    pub fn leading_tolerated_pressure(&self, gf: f64) -> (f64, usize) {
        let mut max_p = f64::NEG_INFINITY;
        let mut leading = 0;
        for i in 0..NUM_COMPARTMENTS {
            let p = self.tolerated_pressure(i, gf);
            if p > max_p {
                max_p = p;
                leading = i;
            }
        }
        (max_p, leading)
    }

    /// Ceiling depth (m) under a fixed gradient factor.
    pub fn ceiling_with_gf(&self, gf: f64) -> f64 {
        let (pressure, _) = self.leading_tolerated_pressure(gf);
        depth_from_pressure(pressure)
    }
}

/// Ceiling (m) for the live tissue state at `depth_now_m`, using the gradient
/// factor interpolated for that depth. Never negative.
pub fn ceiling(
    tissues: &TissueState,
    gradient_factors: &GradientFactors,
    planned_max_depth_m: f64,
    depth_now_m: f64,
) -> f64 {
    let gf = gradient_factors.at_depth(depth_now_m, planned_max_depth_m);
    tissues.ceiling_with_gf(gf)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const AIR_FN2: f64 = 0.79;

    #[test]
    fn test_compartments_ordered_fastest_first() {
        for pair in COMPARTMENTS.windows(2) {
            assert!(pair[0].half_life_min < pair[1].half_life_min);
        }
    }

    #[test]
    fn test_pre_dive_ceiling_is_surface() {
        let tissues = TissueState::pre_dive();
        let gf = GradientFactors::new(0.3, 0.7);
        assert_eq!(ceiling(&tissues, &gf, 30.0, 0.0), 0.0);
    }

    #[test]
    fn test_convergence_to_alveolar_pressure() {
        // 30m on air: alveolar = (4.0 - 0.0627) * 0.79
        let ambient = ambient_pressure(30.0);
        let target = alveolar_pressure(ambient, AIR_FN2);

        for start in [0.0, 0.79, 6.0] {
            let mut tissues = TissueState::uniform(start);
            // 20 half-lives of the slowest compartment
            for _ in 0..10_000 {
                tissues.advance(ambient, AIR_FN2, 1.0);
            }
            for (i, p) in tissues.pressures().iter().enumerate() {
                assert!(
                    (p - target).abs() < 1e-4,
                    "compartment {i} from {start} should converge to {target}, got {p}"
                );
            }
        }
    }

    #[test]
    fn test_step_size_independence() {
        let ambient = ambient_pressure(25.0);
        let mut coarse = TissueState::pre_dive();
        coarse.advance(ambient, AIR_FN2, 20.0);

        let mut fine = TissueState::pre_dive();
        for _ in 0..200 {
            fine.advance(ambient, AIR_FN2, 0.1);
        }

        for (a, b) in coarse.pressures().iter().zip(fine.pressures()) {
            assert!((a - b).abs() < 1e-9, "coarse {a} vs fine {b}");
        }
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut tissues = TissueState::pre_dive();
        tissues.advance(ambient_pressure(40.0), AIR_FN2, 0.0);
        assert_eq!(tissues, TissueState::pre_dive());
    }

    #[test]
    fn test_pressures_stay_non_negative() {
        let mut tissues = TissueState::uniform(0.0);
        tissues.advance(ambient_pressure(0.0), 0.0, 500.0);
        assert!(tissues.pressures().iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn test_lower_nitrogen_fraction_loads_less() {
        let ambient = ambient_pressure(20.0);
        let start = TissueState::uniform(2.0);

        let mut bottom_gas = start.clone();
        bottom_gas.advance(ambient, 0.68, 1.0);

        let mut deco_gas = start.clone();
        deco_gas.advance(ambient, 0.50, 1.0);

        for (i, (hi, lo)) in bottom_gas
            .pressures()
            .iter()
            .zip(deco_gas.pressures())
            .enumerate()
        {
            assert!(lo < hi, "compartment {i}: deco gas {lo} should be below bottom gas {hi}");
        }
    }

    #[test]
    fn test_gradient_factor_interpolation() {
        let gf = GradientFactors::new(0.3, 0.7);
        assert!((gf.at_depth(0.0, 30.0) - 0.7).abs() < 1e-12);
        assert!((gf.at_depth(30.0, 30.0) - 0.3).abs() < 1e-12);
        assert!((gf.at_depth(15.0, 30.0) - 0.5).abs() < 1e-12);
        // Guarded against a zero planned depth
        assert!((gf.at_depth(10.0, 0.0) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_loaded_tissue_has_ceiling() {
        let mut tissues = TissueState::pre_dive();
        tissues.advance(ambient_pressure(30.0), 0.68, 20.0);
        let gf = GradientFactors::new(0.3, 0.7);

        let deep = ceiling(&tissues, &gf, 30.0, 30.0);
        let shallow = ceiling(&tissues, &gf, 30.0, 0.0);
        assert!(deep > 0.0, "30m/20min EAN32 at GF 30 should carry a ceiling");
        assert!(
            shallow <= deep,
            "higher GF near the surface must not deepen the ceiling: {shallow} vs {deep}"
        );
    }

    #[test]
    fn test_leading_compartment_is_fast_after_short_exposure() {
        let mut tissues = TissueState::pre_dive();
        tissues.advance(ambient_pressure(40.0), AIR_FN2, 10.0);
        let (_, leading) = tissues.leading_tolerated_pressure(1.0);
        assert!(leading < 4, "short deep exposure should lead on a fast compartment, got {leading}");
    }
}
