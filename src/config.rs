//! Simulation configuration.
//!
//! Config files use the aviation-conventional imperial units (square feet,
//! pounds, gallons, knots); `build()` validates the values and converts them
//! into the SI parameter structs the subsystems consume. Validation errors
//! name the offending field.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::physics::Surface;
use crate::systems::fuel::FuelSelector;
use crate::utils::constants::{KNOTS_TO_MPS, LBF_TO_N, LBS_TO_KG, SQFT_TO_SQM};
use crate::utils::SimError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub flight_model: FlightModelConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub fuel: FuelConfig,
    #[serde(default)]
    pub electrical: ElectricalConfig,
    #[serde(default)]
    pub ground: GroundConfig,
    #[serde(default)]
    pub autopilot: AutopilotConfig,
}

impl SimConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        info!(path = %path.as_ref().display(), "loaded simulation config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SimError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Airframe parameters, imperial. Defaults approximate a Cessna 172.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightModelConfig {
    /// Wing area (ft²).
    pub wing_area_sqft: Option<f64>,
    /// Gross weight (lbs), fuel excluded.
    pub weight_lbs: Option<f64>,
    /// Static thrust ceiling (lbf) for the fallback thrust model.
    pub max_thrust_lbs: Option<f64>,
    /// Parasite drag coefficient.
    pub drag_coefficient: f64,
    /// Usable fuel load at startup (lbs).
    pub fuel_capacity_lbs: f64,
    #[serde(default)]
    pub propeller: PropellerConfig,
}

impl Default for FlightModelConfig {
    fn default() -> Self {
        Self {
            wing_area_sqft: Some(174.0),
            weight_lbs: Some(1700.0),
            max_thrust_lbs: Some(500.0),
            drag_coefficient: 0.027,
            fuel_capacity_lbs: 220.0,
            propeller: PropellerConfig::default(),
        }
    }
}

impl FlightModelConfig {
    /// Validate and convert to SI.
    pub fn build(&self) -> Result<FlightModelParams, SimError> {
        let wing_area_sqft = self
            .wing_area_sqft
            .ok_or(SimError::MissingField("flight_model.wing_area_sqft"))?;
        let weight_lbs = self
            .weight_lbs
            .ok_or(SimError::MissingField("flight_model.weight_lbs"))?;
        let max_thrust_lbs = self
            .max_thrust_lbs
            .ok_or(SimError::MissingField("flight_model.max_thrust_lbs"))?;

        if wing_area_sqft <= 0.0 {
            return Err(SimError::InvalidConfig(
                "flight_model.wing_area_sqft must be positive".into(),
            ));
        }
        if weight_lbs <= 0.0 {
            return Err(SimError::InvalidConfig(
                "flight_model.weight_lbs must be positive".into(),
            ));
        }
        if self.drag_coefficient < 0.0 {
            return Err(SimError::InvalidConfig(
                "flight_model.drag_coefficient must be non-negative".into(),
            ));
        }
        if self.fuel_capacity_lbs < 0.0 {
            return Err(SimError::InvalidConfig(
                "flight_model.fuel_capacity_lbs must be non-negative".into(),
            ));
        }

        Ok(FlightModelParams {
            wing_area: wing_area_sqft * SQFT_TO_SQM,
            empty_mass: weight_lbs * LBS_TO_KG,
            max_thrust: max_thrust_lbs * LBF_TO_N,
            drag_coefficient: self.drag_coefficient,
            initial_fuel: self.fuel_capacity_lbs * LBS_TO_KG,
            propeller: self.propeller.clone(),
        })
    }
}

/// Flight-model parameters in SI units, produced by
/// [`FlightModelConfig::build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightModelParams {
    /// m².
    pub wing_area: f64,
    /// kg, fuel excluded.
    pub empty_mass: f64,
    /// N.
    pub max_thrust: f64,
    pub drag_coefficient: f64,
    /// kg.
    pub initial_fuel: f64,
    pub propeller: PropellerConfig,
}

/// Fixed-pitch propeller geometry. Defaults match a 75-inch climb prop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropellerConfig {
    /// m.
    pub diameter: f64,
    /// Pitch/diameter ratio.
    pub pitch_ratio: f64,
    /// Efficiency at zero airspeed.
    pub static_efficiency: f64,
    /// Peak efficiency at the cruise advance ratio.
    pub cruise_efficiency: f64,
    /// Advance ratio at which efficiency peaks.
    pub cruise_advance_ratio: f64,
}

impl Default for PropellerConfig {
    fn default() -> Self {
        Self {
            diameter: 1.905,
            pitch_ratio: 0.6,
            static_efficiency: 0.50,
            cruise_efficiency: 0.80,
            cruise_advance_ratio: 0.6,
        }
    }
}

/// Piston engine parameters. Defaults approximate a Lycoming O-360.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_power_hp: f64,
    pub max_rpm: f64,
    pub idle_rpm: f64,
    /// RPM the crank must reach before combustion can catch.
    pub start_rpm_threshold: f64,
    /// Minimum bus voltage for the starter motor to turn.
    pub starter_min_voltage: f64,
    /// Amps the starter motor pulls while engaged.
    pub starter_current_draw: f64,
    /// GPH at idle.
    pub idle_fuel_flow_gph: f64,
    /// GPH at full power, full rich.
    pub max_fuel_flow_gph: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_power_hp: 180.0,
            max_rpm: 2700.0,
            idle_rpm: 600.0,
            start_rpm_threshold: 200.0,
            starter_min_voltage: 11.0,
            starter_current_draw: 150.0,
            idle_fuel_flow_gph: 1.5,
            max_fuel_flow_gph: 12.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.max_power_hp <= 0.0 {
            return Err(SimError::InvalidConfig(
                "engine.max_power_hp must be positive".into(),
            ));
        }
        if self.idle_rpm <= 0.0 || self.idle_rpm >= self.max_rpm {
            return Err(SimError::InvalidConfig(
                "engine.idle_rpm must be positive and below max_rpm".into(),
            ));
        }
        if self.start_rpm_threshold <= 0.0 {
            return Err(SimError::InvalidConfig(
                "engine.start_rpm_threshold must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Gravity-feed fuel system. Defaults match a 26/26-gallon two-tank setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConfig {
    pub left_capacity_gal: f64,
    pub right_capacity_gal: f64,
    pub left_quantity_gal: f64,
    pub right_quantity_gal: f64,
    pub initial_selector: FuelSelector,
    /// psi with a boost pump running.
    pub pump_pressure_psi: f64,
    /// psi on gravity feed alone.
    pub gravity_pressure_psi: f64,
    /// GPH a tank can feed with its pump on.
    pub pump_feed_gph: f64,
    /// GPH a tank can feed on gravity alone.
    pub gravity_feed_gph: f64,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            left_capacity_gal: 26.0,
            right_capacity_gal: 26.0,
            left_quantity_gal: 26.0,
            right_quantity_gal: 26.0,
            initial_selector: FuelSelector::Both,
            pump_pressure_psi: 4.5,
            gravity_pressure_psi: 2.5,
            pump_feed_gph: 20.0,
            gravity_feed_gph: 15.0,
        }
    }
}

impl FuelConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.left_capacity_gal < 0.0 || self.right_capacity_gal < 0.0 {
            return Err(SimError::InvalidConfig(
                "fuel tank capacities must be non-negative".into(),
            ));
        }
        if self.left_quantity_gal > self.left_capacity_gal
            || self.right_quantity_gal > self.right_capacity_gal
        {
            return Err(SimError::InvalidConfig(
                "fuel quantity exceeds tank capacity".into(),
            ));
        }
        Ok(())
    }
}

/// 12V electrical system. Defaults match a 35 Ah battery with a 60 A
/// belt-driven alternator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricalConfig {
    pub battery_capacity_ah: f64,
    /// Avionics and lighting draw with the master on (A).
    pub base_load_amps: f64,
    pub alternator_max_amps: f64,
    /// Regulated bus voltage with the alternator online.
    pub regulated_voltage: f64,
    /// Alternator pulley ratio relative to crankshaft RPM.
    pub alternator_drive_ratio: f64,
    /// Alternator RPM below which it cannot excite.
    pub alternator_min_rpm: f64,
}

impl Default for ElectricalConfig {
    fn default() -> Self {
        Self {
            battery_capacity_ah: 35.0,
            base_load_amps: 5.0,
            alternator_max_amps: 60.0,
            regulated_voltage: 14.0,
            alternator_drive_ratio: 2.5,
            alternator_min_rpm: 1200.0,
        }
    }
}

impl ElectricalConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.battery_capacity_ah <= 0.0 {
            return Err(SimError::InvalidConfig(
                "electrical.battery_capacity_ah must be positive".into(),
            ));
        }
        if self.regulated_voltage <= 0.0 {
            return Err(SimError::InvalidConfig(
                "electrical.regulated_voltage must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// N at full brake application.
    pub max_brake_force: f64,
    /// Maximum nosewheel deflection (degrees).
    pub max_steering_angle_deg: f64,
    pub surface: Surface,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            max_brake_force: 15000.0,
            max_steering_angle_deg: 60.0,
            surface: Surface::Asphalt,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    pub heading: PidGains,
    pub altitude: PidGains,
    pub speed: PidGains,
    pub vertical_speed: PidGains,
    /// kt, ground takeoff rotation speed.
    pub rotation_speed_kts: f64,
    /// Degrees, initial climb pitch after rotation.
    pub climb_pitch_deg: f64,
    /// ft AGL at which takeoff hands off to altitude hold.
    pub takeoff_handoff_ft: f64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            heading: PidGains {
                kp: 0.02,
                ki: 0.001,
                kd: 0.01,
            },
            altitude: PidGains {
                kp: 0.01,
                ki: 0.0005,
                kd: 0.005,
            },
            speed: PidGains {
                kp: 0.05,
                ki: 0.01,
                kd: 0.0,
            },
            vertical_speed: PidGains {
                kp: 0.005,
                ki: 0.0001,
                kd: 0.002,
            },
            rotation_speed_kts: 55.0,
            climb_pitch_deg: 10.0,
            takeoff_handoff_ft: 500.0,
        }
    }
}

impl AutopilotConfig {
    /// Rotation speed in m/s.
    pub fn rotation_speed_mps(&self) -> f64 {
        self.rotation_speed_kts * KNOTS_TO_MPS
    }
}
