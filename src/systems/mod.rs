//! Aircraft systems: engine, propeller, fuel, and electrics.

pub mod electrical;
pub mod engine;
pub mod fuel;
pub mod propeller;

pub use electrical::{ElectricalFailure, ElectricalSystem, ElectricalSystemState};
pub use engine::{EngineControls, EngineFailure, EnginePhase, EngineState, PistonEngine};
pub use fuel::{FuelSelector, FuelTankId, GravityFuelSystem};
pub use propeller::FixedPitchPropeller;
