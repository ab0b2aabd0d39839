pub mod buhlmann;
pub mod consumption;
pub mod error;
pub mod gas;
pub mod metrics;
pub mod models;
pub mod planner;

uniffi::include_scaffolding!("deco_planner");

pub use error::PlanError;
pub use gas::{max_operating_depth, GasMix, GasSwitchPolicy};
pub use models::{
    DecoStop, DiveConfig, DivePhase, DivePlan, GasSwitch, PlanRequest, PlanWarning,
    ProfileSample, SimulationLog,
};
pub use planner::{plan_dive, plan_dive_json, validate, ProfileSimulator};
