//! Dive profile simulation.
//!
//! Runs the staged pipeline: validate the configuration, step the tissue
//! model through descent, bottom and a ceiling-controlled ascent, then
//! summarize the log into a `DivePlan`.

use tracing::{debug, info, warn};

use crate::buhlmann::{
    ambient_pressure, ceiling, GradientFactors, TissueState, NUM_COMPARTMENTS,
};
use crate::consumption::{remaining_pressure, ConsumptionTracker};
use crate::error::PlanError;
use crate::gas::GasSwitchPolicy;
use crate::metrics;
use crate::models::{
    DiveConfig, DivePhase, DivePlan, GasSwitch, PlanRequest, PlanWarning, ProfileSample,
    SimulationLog,
};

/// Deco stops are taken at multiples of this depth (m).
pub const STOP_INCREMENT_M: f64 = 3.0;

/// Upper bound on simulated ticks (descent, bottom and the ascent cap
/// together). Each tick appends one sample and 16 tissue pressures.
pub const MAX_SIMULATION_TICKS: f64 = 2_000_000.0;

/// Ticks the descent, bottom and capped ascent need at most.
fn planned_ticks(config: &DiveConfig) -> f64 {
    let dt = config.time_step_min;
    let descent = (config.max_depth_m / (config.descent_rate_m_min * dt)).ceil();
    let bottom = (config.bottom_time_min / dt).round();
    let ascent = (config.max_ascent_time_min / dt).ceil();
    descent + bottom + ascent
}

// ============================================================================
// Validation
// ============================================================================

fn require_finite(field: &str, value: f64) -> Result<(), PlanError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PlanError::config(field, "must be a finite number"))
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), PlanError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(PlanError::config(field, "must be greater than 0"))
    }
}

fn require_gradient_factor(field: &str, value: f64) -> Result<(), PlanError> {
    require_finite(field, value)?;
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(PlanError::config(field, "must be in (0, 1]"))
    }
}

fn require_o2_fraction(field: &str, value: f64) -> Result<(), PlanError> {
    require_finite(field, value)?;
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(PlanError::config(field, "must be in (0, 1)"))
    }
}

/// Reject a configuration the simulation cannot run safely.
pub fn validate(config: &DiveConfig) -> Result<(), PlanError> {
    require_positive("max_depth_m", config.max_depth_m)?;
    require_finite("bottom_time_min", config.bottom_time_min)?;
    if config.bottom_time_min < 0.0 {
        return Err(PlanError::config("bottom_time_min", "must not be negative"));
    }
    require_positive("descent_rate_m_min", config.descent_rate_m_min)?;
    require_positive("ascent_rate_m_min", config.ascent_rate_m_min)?;
    require_positive("sac_rate_l_min", config.sac_rate_l_min)?;
    require_positive("cylinder_volume_l", config.cylinder_volume_l)?;
    require_positive("start_pressure_bar", config.start_pressure_bar)?;
    require_positive("time_step_min", config.time_step_min)?;
    require_positive("max_ascent_time_min", config.max_ascent_time_min)?;

    require_gradient_factor("gf_low", config.gf_low)?;
    require_gradient_factor("gf_high", config.gf_high)?;

    require_o2_fraction("bottom_o2_fraction", config.bottom_o2_fraction)?;
    if let Some(fo2) = config.deco_o2_fraction {
        require_o2_fraction("deco_o2_fraction", fo2)?;
    }

    let bottom_gas = config.bottom_gas();
    if bottom_gas.exceeds_ppo2_limit(config.max_depth_m) {
        return Err(PlanError::config(
            "max_depth_m",
            format!(
                "exceeds the bottom gas MOD of {:.1} m",
                bottom_gas.max_operating_depth()
            ),
        ));
    }

    let ticks = planned_ticks(config);
    if !ticks.is_finite() || ticks > MAX_SIMULATION_TICKS {
        return Err(PlanError::config(
            "time_step_min",
            format!(
                "needs {ticks:.0} ticks, more than the {MAX_SIMULATION_TICKS:.0} allowed"
            ),
        ));
    }

    Ok(())
}

// ============================================================================
// Simulator
// ============================================================================

/// Owns all mutable state of one planning run.
#[derive(Debug)]
pub struct ProfileSimulator<'a> {
    config: &'a DiveConfig,
    gradient_factors: GradientFactors,
    policy: GasSwitchPolicy,
    tissues: TissueState,
    consumption: ConsumptionTracker,
    log: SimulationLog,
    warnings: Vec<PlanWarning>,
    gas_switch: Option<GasSwitch>,
    phase: DivePhase,
    depth_m: f64,
    ticks: u64,
}

impl<'a> ProfileSimulator<'a> {
    /// Validate `config` and prepare a run starting at the surface.
    pub fn new(config: &'a DiveConfig) -> Result<Self, PlanError> {
        validate(config)?;
        Ok(Self {
            config,
            gradient_factors: GradientFactors::new(config.gf_low, config.gf_high),
            policy: GasSwitchPolicy::new(config.bottom_gas(), config.deco_gas()),
            tissues: TissueState::pre_dive(),
            consumption: ConsumptionTracker::new(config.sac_rate_l_min),
            log: SimulationLog {
                samples: Vec::new(),
                tissue_history: vec![Vec::new(); NUM_COMPARTMENTS],
                gas_consumed_l: 0.0,
            },
            warnings: Vec::new(),
            gas_switch: None,
            phase: DivePhase::Descent,
            depth_m: 0.0,
            ticks: 0,
        })
    }

    /// Run every phase to the surface.
    ///
    /// On divergence the error carries the plan as far as it got.
    pub fn run(mut self) -> Result<DivePlan, PlanError> {
        self.descend();
        self.hold_bottom();
        match self.ascend() {
            Ok(()) => Ok(self.finish()),
            Err(limit_min) => {
                warn!(
                    limit_min,
                    depth_m = self.depth_m,
                    "ascent did not clear the surface ceiling"
                );
                Err(PlanError::Divergence {
                    limit_min,
                    partial: Box::new(self.finish()),
                })
            }
        }
    }

    fn current_ceiling(&self, depth_m: f64) -> f64 {
        ceiling(
            &self.tissues,
            &self.gradient_factors,
            self.config.max_depth_m,
            depth_m,
        )
    }

    /// Spend one time step at `depth_m` and log the result.
    fn tick(&mut self, depth_m: f64) {
        let dt = self.config.time_step_min;
        let gas = self.policy.active_gas(depth_m, self.phase);
        let ambient = ambient_pressure(depth_m);

        self.tissues.advance(ambient, gas.nitrogen_fraction(), dt);
        self.consumption.record(ambient, dt);
        self.ticks += 1;
        self.depth_m = depth_m;

        let time_min = self.ticks as f64 * dt;
        let tick_index = self.log.samples.len() as u64;

        if self.gas_switch.is_none() && self.policy.uses_deco_gas(depth_m, self.phase) {
            debug!(tick = tick_index, time_min, depth_m, "switched to deco gas");
            self.gas_switch = Some(GasSwitch {
                tick: tick_index,
                time_min,
                depth_m,
            });
        }

        let ppo2 = gas.ppo2_at(depth_m);
        if gas.exceeds_ppo2_limit(depth_m) {
            warn!(time_min, depth_m, ppo2, "ppO2 above limit");
            self.warnings.push(PlanWarning::Ppo2Exceeded {
                time_min,
                depth_m,
                ppo2,
            });
        }

        let ceiling_m = self.current_ceiling(depth_m);
        self.log.samples.push(ProfileSample {
            time_min,
            depth_m,
            phase: self.phase,
            o2_fraction: gas.o2_fraction,
            ppo2,
            ceiling_m,
        });
        for (history, p) in self
            .log
            .tissue_history
            .iter_mut()
            .zip(self.tissues.pressures())
        {
            history.push(*p);
        }
    }

    fn descend(&mut self) {
        self.phase = DivePhase::Descent;
        let step = self.config.descent_rate_m_min * self.config.time_step_min;
        while self.depth_m < self.config.max_depth_m {
            let next = (self.depth_m + step).min(self.config.max_depth_m);
            self.tick(next);
        }
        debug!(time_min = self.log.total_time_min(), "reached planned depth");
    }

    fn hold_bottom(&mut self) {
        self.phase = DivePhase::Bottom;
        let ticks = (self.config.bottom_time_min / self.config.time_step_min).round() as u64;
        for _ in 0..ticks {
            self.tick(self.config.max_depth_m);
        }
        debug!(
            time_min = self.log.total_time_min(),
            ceiling_m = self.current_ceiling(self.depth_m),
            "bottom time over"
        );
    }

    /// Ceiling-controlled ascent. Returns the time cap (min) if the surface
    /// is never cleared.
    fn ascend(&mut self) -> Result<(), f64> {
        self.phase = DivePhase::Ascent;
        let step = self.config.ascent_rate_m_min * self.config.time_step_min;
        let max_ticks =
            (self.config.max_ascent_time_min / self.config.time_step_min).ceil() as u64;

        for _ in 0..max_ticks {
            let ceiling_m = self.current_ceiling(self.depth_m);
            let stop_m = (ceiling_m / STOP_INCREMENT_M).ceil() * STOP_INCREMENT_M;

            // Never descend back to a deeper stop.
            let next = if self.depth_m > stop_m {
                (self.depth_m - step).max(stop_m)
            } else {
                self.depth_m
            };
            self.tick(next);

            if next <= 0.0 && self.current_ceiling(0.0) <= 0.0 {
                self.phase = DivePhase::Surfaced;
                return Ok(());
            }
        }

        Err(self.config.max_ascent_time_min)
    }

    fn finish(mut self) -> DivePlan {
        let gas_consumed_l = self.consumption.total_l();
        self.log.gas_consumed_l = gas_consumed_l;

        let remaining_pressure_bar = remaining_pressure(
            self.config.start_pressure_bar,
            self.config.cylinder_volume_l,
            gas_consumed_l,
        );
        if remaining_pressure_bar < 0.0 {
            warn!(remaining_pressure_bar, "cylinder exhausted before the surface");
            self.warnings.push(PlanWarning::GasExhausted {
                remaining_pressure_bar,
            });
        }

        let stops = metrics::deco_stops(&self.log.samples);
        let deco_time_min: f64 = stops.iter().map(|s| s.duration_min).sum();

        DivePlan {
            total_time_min: self.log.total_time_min(),
            ascent_time_min: metrics::ascent_time(&self.log),
            deco_time_min,
            stops,
            gas_consumed_l,
            remaining_pressure_bar,
            max_ppo2: metrics::max_ppo2(&self.log.samples),
            bottom_gas_mod_m: self.policy.bottom_gas().max_operating_depth(),
            deco_gas_mod_m: self.policy.switch_depth(),
            gas_switch: self.gas_switch,
            warnings: self.warnings,
            log: self.log,
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Plan a dive: validate, simulate and summarize.
pub fn plan_dive(config: DiveConfig) -> Result<DivePlan, PlanError> {
    let plan = ProfileSimulator::new(&config)?.run()?;
    info!(
        total_time_min = plan.total_time_min,
        gas_consumed_l = plan.gas_consumed_l,
        stops = plan.stops.len(),
        max_ceiling_m = metrics::max_ceiling(&plan.log.samples),
        "dive plan complete"
    );
    Ok(plan)
}

/// Plan a dive from a JSON `PlanRequest`, returning the `DivePlan` as JSON.
pub fn plan_dive_json(request_json: String) -> Result<String, PlanError> {
    let request: PlanRequest = serde_json::from_str(&request_json)?;
    let plan = plan_dive(request.into_config())?;
    Ok(serde_json::to_string(&plan)?)
}

// ============================================================================
// Tests
// ============================================================================
