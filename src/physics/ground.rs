use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::utils::constants::GRAVITY;

/// Runway/taxiway surface type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Asphalt,
    Concrete,
    Grass,
    Dirt,
    Gravel,
    Snow,
    Ice,
    Water,
}

impl Surface {
    /// Braking friction coefficient.
    pub fn friction(&self) -> f64 {
        match self {
            Surface::Asphalt => 0.8,
            Surface::Concrete => 0.85,
            Surface::Grass => 0.4,
            Surface::Dirt => 0.5,
            Surface::Gravel => 0.6,
            Surface::Snow => 0.3,
            Surface::Ice => 0.1,
            Surface::Water => 0.2,
        }
    }

    /// Rolling resistance coefficient.
    pub fn rolling_resistance(&self) -> f64 {
        match self {
            Surface::Asphalt => 0.02,
            Surface::Concrete => 0.015,
            Surface::Grass => 0.08,
            Surface::Dirt => 0.10,
            Surface::Gravel => 0.06,
            Surface::Snow => 0.05,
            Surface::Ice => 0.02,
            Surface::Water => 0.04,
        }
    }
}

/// Ground contact state handed to the force calculation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroundContact {
    pub on_ground: bool,
    /// 0.0 = gear unloaded, 1.0 = fully compressed.
    pub gear_compression: f64,
    pub surface: Surface,
}

impl Default for GroundContact {
    fn default() -> Self {
        Self {
            on_ground: false,
            gear_compression: 1.0,
            surface: Surface::Asphalt,
        }
    }
}

/// Force breakdown from ground operations, Newtons in the world frame.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GroundForces {
    pub rolling_resistance: Vector3<f64>,
    pub steering: Vector3<f64>,
    pub brake: Vector3<f64>,
}

impl GroundForces {
    pub fn total(&self) -> Vector3<f64> {
        self.rolling_resistance + self.steering + self.brake
    }
}

/// Rolling, steering, and braking physics for taxi, takeoff roll, and
/// landing rollout.
#[derive(Debug, Clone)]
pub struct GroundPhysics {
    max_brake_force: f64,
    max_steering_angle_deg: f64,
}

impl GroundPhysics {
    pub fn new(max_brake_force: f64, max_steering_angle_deg: f64) -> Self {
        Self {
            max_brake_force,
            max_steering_angle_deg,
        }
    }

    /// Compute ground forces for the current tick.
    ///
    /// `rudder` is nosewheel steering input in [-1, 1], `brake` in [0, 1].
    /// Mass is passed per call since fuel burn changes it every tick.
    pub fn calculate_ground_forces(
        &self,
        contact: &GroundContact,
        rudder: f64,
        brake: f64,
        velocity: Vector3<f64>,
        mass_kg: f64,
    ) -> GroundForces {
        let mut forces = GroundForces::default();
        if !contact.on_ground {
            return forces;
        }

        let speed = velocity.norm();
        let normal_force = mass_kg * GRAVITY * contact.gear_compression;

        if speed > 0.01 {
            let direction = velocity.normalize();

            let rolling_magnitude = contact.surface.rolling_resistance() * normal_force;
            forces.rolling_resistance = -direction * rolling_magnitude;

            if brake > 0.01 {
                let brake_magnitude = brake * self.max_brake_force * contact.gear_compression;
                forces.brake = -direction * brake_magnitude;
            }
        }

        // Nosewheel steering: lateral force falling off with speed, useless
        // above roughly 50 m/s where aerodynamic controls take over.
        if rudder.abs() > 0.01 && speed > 0.5 {
            let steering_angle = (rudder * self.max_steering_angle_deg).to_radians();
            let speed_factor = (1.0 - speed / 50.0).max(0.1);
            let lateral = mass_kg * GRAVITY * 0.3 * steering_angle.sin() * speed_factor;

            let forward = velocity.normalize();
            let right = Vector3::new(forward.z, 0.0, -forward.x);
            forces.steering = right * lateral * rudder;
        }

        forces
    }

    /// Stopping distance estimate: v² / (2 μ g).
    pub fn stopping_distance(
        &self,
        initial_speed_mps: f64,
        brake_efficiency: f64,
        surface: Surface,
    ) -> f64 {
        if initial_speed_mps <= 0.0 {
            return 0.0;
        }
        let deceleration = surface.friction() * GRAVITY * brake_efficiency;
        initial_speed_mps * initial_speed_mps / (2.0 * deceleration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rolling_contact() -> GroundContact {
        GroundContact {
            on_ground: true,
            gear_compression: 1.0,
            surface: Surface::Asphalt,
        }
    }

    #[test]
    fn airborne_aircraft_gets_no_ground_forces() {
        let physics = GroundPhysics::new(15000.0, 60.0);
        let contact = GroundContact {
            on_ground: false,
            ..rolling_contact()
        };
        let forces =
            physics.calculate_ground_forces(&contact, 1.0, 1.0, Vector3::new(20.0, 0.0, 0.0), 1000.0);
        assert_eq!(forces.total(), Vector3::zeros());
    }

    #[test]
    fn brake_force_opposes_motion() {
        let physics = GroundPhysics::new(15000.0, 60.0);
        let forces = physics.calculate_ground_forces(
            &rolling_contact(),
            0.0,
            0.5,
            Vector3::new(20.0, 0.0, 0.0),
            1000.0,
        );
        assert!(forces.brake.x < 0.0);
        assert_relative_eq!(forces.brake.x, -7500.0, epsilon = 1e-9);
    }

    #[test]
    fn rolling_resistance_scales_with_surface() {
        let physics = GroundPhysics::new(15000.0, 60.0);
        let velocity = Vector3::new(10.0, 0.0, 0.0);

        let asphalt =
            physics.calculate_ground_forces(&rolling_contact(), 0.0, 0.0, velocity, 1000.0);
        let grass_contact = GroundContact {
            surface: Surface::Grass,
            ..rolling_contact()
        };
        let grass = physics.calculate_ground_forces(&grass_contact, 0.0, 0.0, velocity, 1000.0);

        assert!(grass.rolling_resistance.norm() > asphalt.rolling_resistance.norm());
    }

    #[test]
    fn steering_weakens_with_speed() {
        let physics = GroundPhysics::new(15000.0, 60.0);
        let slow = physics.calculate_ground_forces(
            &rolling_contact(),
            0.5,
            0.0,
            Vector3::new(5.0, 0.0, 0.0),
            1000.0,
        );
        let fast = physics.calculate_ground_forces(
            &rolling_contact(),
            0.5,
            0.0,
            Vector3::new(40.0, 0.0, 0.0),
            1000.0,
        );
        assert!(slow.steering.norm() > fast.steering.norm());
    }

    #[test]
    fn stopping_distance_matches_formula() {
        let physics = GroundPhysics::new(15000.0, 60.0);
        let distance = physics.stopping_distance(20.0, 1.0, Surface::Asphalt);
        assert_relative_eq!(distance, 400.0 / (2.0 * 0.8 * 9.81), epsilon = 1e-9);
    }
}
