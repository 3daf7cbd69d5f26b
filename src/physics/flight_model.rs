use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bus::ControlInputMsg;
use crate::config::FlightModelParams;
use crate::physics::{FlightForces, PhysicsError};
use crate::systems::propeller::FixedPitchPropeller;
use crate::utils::constants::{AIR_DENSITY_SEA_LEVEL, GRAVITY};
use crate::utils::math::normalize_angle;

/// Full kinematic state of the aircraft in the world frame (+y up).
///
/// `rotation` holds Euler angles in radians: pitch about x, roll about y,
/// yaw about z, each kept in [-pi, pi].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftState {
    /// m, world frame.
    pub position: Vector3<f64>,
    /// m/s.
    pub velocity: Vector3<f64>,
    /// m/s².
    pub acceleration: Vector3<f64>,
    /// rad: pitch (x), roll (y), yaw (z).
    pub rotation: Vector3<f64>,
    /// rad/s.
    pub angular_velocity: Vector3<f64>,
    /// kg, airframe plus fuel.
    pub mass: f64,
    /// kg of fuel aboard.
    pub fuel: f64,
    pub on_ground: bool,
}

impl Default for AircraftState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
            rotation: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            mass: 0.0,
            fuel: 0.0,
            on_ground: true,
        }
    }
}

impl AircraftState {
    pub fn airspeed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Horizontal speed over the ground, m/s.
    pub fn groundspeed(&self) -> f64 {
        (self.velocity.x * self.velocity.x + self.velocity.z * self.velocity.z).sqrt()
    }

    pub fn pitch(&self) -> f64 {
        self.rotation.x
    }

    pub fn roll(&self) -> f64 {
        self.rotation.y
    }

    pub fn yaw(&self) -> f64 {
        self.rotation.z
    }
}

/// Engine output coupling fed from the engine subsystem each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOutput {
    pub power_hp: f64,
    pub rpm: f64,
}

/// Flight dynamics model seam. The simulation root drives whichever model
/// is plugged in through this trait.
pub trait FlightModel {
    /// Advance the state by `dt` seconds under the given control inputs.
    fn update(&mut self, dt: f64, inputs: &ControlInputMsg) -> Result<&AircraftState, PhysicsError>;

    fn state(&self) -> &AircraftState;

    fn forces(&self) -> &FlightForces;

    fn reset(&mut self, state: AircraftState);

    /// Accumulate an external impulse (gust, pushback). Decays 10% per tick.
    fn apply_force(&mut self, force: Vector3<f64>);
}

/// Simplified six-degree-of-freedom model.
///
/// Lift and drag scale with dynamic pressure; lift coefficient follows pitch
/// as an angle-of-attack stand-in. Rotation is kinematic: control deflection
/// commands a body rate directly. Integration is semi-implicit Euler, stable
/// at fixed 60 Hz steps.
#[derive(Debug)]
pub struct SimpleFlightModel {
    params: FlightModelParams,
    propeller: FixedPitchPropeller,
    state: AircraftState,
    forces: FlightForces,
    /// Decaying accumulated impulses.
    external_force: Vector3<f64>,
    /// Ground reaction acceleration, valid for exactly one update.
    ground_acceleration: Vector3<f64>,
    /// Terrain elevation below the aircraft, m MSL.
    terrain_elevation: f64,
    engine: Option<EngineOutput>,
    lift_slope_per_deg: f64,
    updates: u64,
}

impl SimpleFlightModel {
    pub fn new(params: FlightModelParams) -> Self {
        let propeller = FixedPitchPropeller::new(params.propeller.clone());
        let state = AircraftState {
            mass: params.empty_mass + params.initial_fuel,
            fuel: params.initial_fuel,
            ..Default::default()
        };
        info!(
            wing_area_m2 = params.wing_area,
            mass_kg = state.mass,
            max_thrust_n = params.max_thrust,
            "initialized flight model"
        );
        Self {
            params,
            propeller,
            state,
            forces: FlightForces::default(),
            external_force: Vector3::zeros(),
            ground_acceleration: Vector3::zeros(),
            terrain_elevation: 0.0,
            engine: None,
            lift_slope_per_deg: 0.1,
            updates: 0,
        }
    }

    /// Couple the propeller to live engine output, or decouple with `None`
    /// to fall back to the throttle-proportional thrust model.
    pub fn set_engine_output(&mut self, engine: Option<EngineOutput>) {
        self.engine = engine;
    }

    /// Feed the ground reaction for the upcoming update. Unlike
    /// [`FlightModel::apply_force`] this does not decay; it is cleared
    /// after one integration step.
    pub fn apply_ground_acceleration(&mut self, acceleration: Vector3<f64>) {
        self.ground_acceleration = acceleration;
    }

    pub fn set_terrain_elevation(&mut self, elevation: f64) {
        self.terrain_elevation = elevation;
    }

    pub fn update_count(&self) -> u64 {
        self.updates
    }

    fn calculate_forces(&mut self, inputs: &ControlInputMsg) {
        let airspeed = self.state.airspeed();
        let q = 0.5 * AIR_DENSITY_SEA_LEVEL * airspeed * airspeed;

        // Lift: CL from the angle of attack (pitch minus flight-path angle),
        // applied straight up in the world frame. A climb raises the
        // flight-path angle and bleeds the angle of attack back off, so lift
        // is self-limiting; the clamp is a coarse stall boundary.
        let flight_path_angle = if airspeed > 0.1 {
            self.state.velocity.y.atan2(self.state.groundspeed())
        } else {
            0.0
        };
        let aoa_deg = (self.state.pitch() - flight_path_angle).to_degrees();
        let cl = (self.lift_slope_per_deg * aoa_deg).clamp(-1.5, 1.5);
        let lift_magnitude = q * self.params.wing_area * cl;
        self.forces.lift = Vector3::new(0.0, lift_magnitude, 0.0);

        // Drag opposes the velocity vector.
        let drag_magnitude = q * self.params.wing_area * self.params.drag_coefficient;
        self.forces.drag = if airspeed > 0.1 {
            self.state.velocity.normalize() * -drag_magnitude
        } else {
            Vector3::zeros()
        };

        let thrust_magnitude = match self.engine {
            Some(engine) if engine.power_hp > 0.0 => self.propeller.thrust_n(
                engine.power_hp,
                engine.rpm,
                airspeed,
                AIR_DENSITY_SEA_LEVEL,
            ),
            _ => {
                // Throttle-proportional fallback, fading linearly with
                // airspeed so static thrust is not available at cruise.
                let falloff = (1.0 - airspeed / 100.0).clamp(0.0, 1.0);
                inputs.throttle * self.params.max_thrust * falloff
            }
        };

        // Thrust along the velocity vector once moving, along the nose when
        // stationary.
        self.forces.thrust = if airspeed > 0.1 {
            self.state.velocity.normalize() * thrust_magnitude
        } else {
            let yaw = self.state.yaw();
            Vector3::new(
                thrust_magnitude * yaw.cos(),
                0.0,
                thrust_magnitude * yaw.sin(),
            )
        };

        self.forces.weight = Vector3::new(0.0, -self.state.mass * GRAVITY, 0.0);
        self.forces.external = self.external_force;
        self.forces.ground = self.ground_acceleration * self.state.mass;
    }

    fn update_rotation(&mut self, dt: f64, inputs: &ControlInputMsg) {
        const PITCH_RATE: f64 = 1.0;
        const ROLL_RATE: f64 = 2.0;
        const YAW_RATE: f64 = 0.5;

        self.state.angular_velocity = Vector3::new(
            inputs.pitch * PITCH_RATE,
            inputs.roll * ROLL_RATE,
            inputs.yaw * YAW_RATE,
        );

        self.state.rotation += self.state.angular_velocity * dt;
        self.state.rotation.x = normalize_angle(self.state.rotation.x);
        self.state.rotation.y = normalize_angle(self.state.rotation.y);
        self.state.rotation.z = normalize_angle(self.state.rotation.z);
    }
}

impl FlightModel for SimpleFlightModel {
    fn update(&mut self, dt: f64, inputs: &ControlInputMsg) -> Result<&AircraftState, PhysicsError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::InvalidTimestep(dt));
        }
        self.updates += 1;

        self.calculate_forces(inputs);

        if self.external_force.norm_squared() > 0.001 {
            self.external_force *= 0.9;
        } else {
            self.external_force = Vector3::zeros();
        }

        self.state.acceleration = self.forces.total() / self.state.mass;

        self.state.velocity += self.state.acceleration * dt;
        self.state.position += self.state.velocity * dt;

        self.update_rotation(dt, inputs);

        // Terrain clamp: the aircraft is on the ground exactly when resting
        // at the terrain elevation.
        if self.state.position.y <= self.terrain_elevation {
            self.state.position.y = self.terrain_elevation;
            self.state.velocity.y = self.state.velocity.y.max(0.0);
            self.state.on_ground = true;
        } else {
            self.state.on_ground = false;
        }

        // Basic burn tied to throttle; the engine subsystem owns the real
        // fuel accounting through the fuel system.
        let burn = inputs.throttle * 0.01 * dt;
        self.state.fuel = (self.state.fuel - burn).max(0.0);
        self.state.mass = self.params.empty_mass + self.state.fuel;

        // One-shot ground reaction is consumed by this update.
        self.ground_acceleration = Vector3::zeros();

        if !(self.state.position.iter().all(|v| v.is_finite())
            && self.state.velocity.iter().all(|v| v.is_finite()))
        {
            return Err(PhysicsError::NonFiniteState("aircraft state"));
        }

        Ok(&self.state)
    }

    fn state(&self) -> &AircraftState {
        &self.state
    }

    fn forces(&self) -> &FlightForces {
        &self.forces
    }

    fn reset(&mut self, state: AircraftState) {
        debug!("flight model reset");
        self.state = state;
        self.external_force = Vector3::zeros();
        self.ground_acceleration = Vector3::zeros();
        self.updates = 0;
    }

    fn apply_force(&mut self, force: Vector3<f64>) {
        self.external_force += force;
    }
}
