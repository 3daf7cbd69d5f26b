use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::systems::engine::{EngineFailure, EngineWarning};
use crate::systems::fuel::{FuelSelector, FuelTankId};

/// Closed set of message topics carried by the bus.
///
/// Command topics carry switch/lever inputs toward a subsystem; state topics
/// carry the owning subsystem's published snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    ControlInput,
    EngineCommand,
    EngineState,
    FuelCommand,
    FuelState,
    ElectricalCommand,
    ElectricalState,
    PositionUpdated,
    TerrainUpdated,
    CollisionDetected,
    AutopilotCommand,
}

/// Control inputs from the pilot or autopilot, pre-validated to their ranges.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ControlInputMsg {
    /// Elevator, [-1, 1].
    pub pitch: f64,
    /// Aileron, [-1, 1].
    pub roll: f64,
    /// Rudder, [-1, 1].
    pub yaw: f64,
    /// [0, 1].
    pub throttle: f64,
    /// [0, 1].
    pub flaps: f64,
    /// [0, 1].
    pub brakes: f64,
    /// [0, 1], 1.0 = extended.
    pub gear: f64,
}

/// Discrete engine control changes. `None` fields leave the current
/// setting untouched, so panel switches can send single-field updates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineCommandMsg {
    pub starter: Option<bool>,
    pub magneto_left: Option<bool>,
    pub magneto_right: Option<bool>,
    /// Fuel/air ratio, 0.0 = idle cutoff, 1.0 = full rich.
    pub mixture: Option<f64>,
    pub throttle: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStateMsg {
    pub running: bool,
    pub rpm: f64,
    pub power_hp: f64,
    pub fuel_flow_gph: f64,
    pub manifold_pressure_inhg: f64,
    pub oil_pressure_psi: f64,
    pub oil_temperature_c: f64,
    pub cylinder_head_temp_c: f64,
    pub starter_engaged: bool,
    pub warnings: Vec<EngineWarning>,
    pub failures: Vec<EngineFailure>,
}

/// Fuel panel controls plus the ground-refuel request, the only sanctioned
/// way total fuel increases.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FuelCommandMsg {
    pub selector: Option<FuelSelector>,
    pub left_pump: Option<bool>,
    pub right_pump: Option<bool>,
    pub refuel: Option<RefuelRequest>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RefuelRequest {
    pub tank: FuelTankId,
    pub gallons: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FuelStateMsg {
    pub left_quantity_gal: f64,
    pub right_quantity_gal: f64,
    pub total_fuel_gal: f64,
    /// Flow actually delivered to the engine last tick.
    pub fuel_flow_gph: f64,
    /// Maximum flow the selected tanks can feed right now.
    pub fuel_available_gph: f64,
    pub fuel_pressure_psi: f64,
    pub selector: FuelSelector,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ElectricalCommandMsg {
    pub battery_master: Option<bool>,
    pub alternator_switch: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ElectricalStateMsg {
    pub battery_voltage: f64,
    pub battery_charge_ah: f64,
    pub bus_voltage: f64,
    pub alternator_online: bool,
    pub alternator_current_amps: f64,
    pub total_load_amps: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionUpdatedMsg {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    /// Pitch (x), roll (y), yaw (z), radians in [-pi, pi].
    pub rotation: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
    pub airspeed: f64,
    pub groundspeed: f64,
    pub mass: f64,
    pub fuel: f64,
    pub on_ground: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerrainUpdatedMsg {
    /// Terrain elevation below the aircraft, meters MSL.
    pub elevation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    Ground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionSeverity {
    /// Touchdown within the safe vertical-speed envelope.
    Landing,
    /// Hard contact outside the landing envelope.
    Impact,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionDetectedMsg {
    pub kind: CollisionKind,
    pub severity: CollisionSeverity,
    pub position: Vector3<f64>,
    /// Surface normal at the contact point.
    pub contact_normal: Vector3<f64>,
    pub terrain_elevation: f64,
    pub agl_altitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AutopilotCommandMsg {
    Engage(crate::autopilot::AutopilotMode),
    Disengage,
    SetHeading(f64),
    SetAltitude(f64),
    SetSpeed(f64),
    SetVerticalSpeed(f64),
}

/// Tagged payload, one variant per topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    ControlInput(ControlInputMsg),
    EngineCommand(EngineCommandMsg),
    EngineState(EngineStateMsg),
    FuelCommand(FuelCommandMsg),
    FuelState(FuelStateMsg),
    ElectricalCommand(ElectricalCommandMsg),
    ElectricalState(ElectricalStateMsg),
    PositionUpdated(PositionUpdatedMsg),
    TerrainUpdated(TerrainUpdatedMsg),
    CollisionDetected(CollisionDetectedMsg),
    AutopilotCommand(AutopilotCommandMsg),
}

impl Payload {
    pub fn topic(&self) -> Topic {
        match self {
            Payload::ControlInput(_) => Topic::ControlInput,
            Payload::EngineCommand(_) => Topic::EngineCommand,
            Payload::EngineState(_) => Topic::EngineState,
            Payload::FuelCommand(_) => Topic::FuelCommand,
            Payload::FuelState(_) => Topic::FuelState,
            Payload::ElectricalCommand(_) => Topic::ElectricalCommand,
            Payload::ElectricalState(_) => Topic::ElectricalState,
            Payload::PositionUpdated(_) => Topic::PositionUpdated,
            Payload::TerrainUpdated(_) => Topic::TerrainUpdated,
            Payload::CollisionDetected(_) => Topic::CollisionDetected,
            Payload::AutopilotCommand(_) => Topic::AutopilotCommand,
        }
    }
}

impl ControlInputMsg {
    /// Validate ranges at construction, rejecting out-of-band inputs rather
    /// than clamping them silently.
    pub fn validated(self) -> Result<Self, crate::utils::SimError> {
        use crate::utils::SimError;

        if !(-1.0..=1.0).contains(&self.pitch) {
            return Err(SimError::InvalidControl("pitch out of bounds".into()));
        }
        if !(-1.0..=1.0).contains(&self.roll) {
            return Err(SimError::InvalidControl("roll out of bounds".into()));
        }
        if !(-1.0..=1.0).contains(&self.yaw) {
            return Err(SimError::InvalidControl("yaw out of bounds".into()));
        }
        if !(0.0..=1.0).contains(&self.throttle) {
            return Err(SimError::InvalidControl("throttle out of bounds".into()));
        }
        if !(0.0..=1.0).contains(&self.flaps) {
            return Err(SimError::InvalidControl("flaps out of bounds".into()));
        }
        if !(0.0..=1.0).contains(&self.brakes) {
            return Err(SimError::InvalidControl("brakes out of bounds".into()));
        }
        if !(0.0..=1.0).contains(&self.gear) {
            return Err(SimError::InvalidControl("gear out of bounds".into()));
        }
        Ok(self)
    }
}
