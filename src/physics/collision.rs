use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::physics::AircraftState;

/// Outcome of a ground contact check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionResult {
    pub collided: bool,
    /// Contact point on the terrain surface.
    pub contact_point: Vector3<f64>,
    /// Surface normal at the contact point, unit +Y for flat terrain.
    pub contact_normal: Vector3<f64>,
    pub penetration_depth: f64,
    /// True when contact qualifies as a landing rather than an impact.
    pub safe_landing: bool,
}

impl CollisionResult {
    fn none() -> Self {
        Self {
            collided: false,
            contact_point: Vector3::zeros(),
            contact_normal: Vector3::y(),
            penetration_depth: 0.0,
            safe_landing: false,
        }
    }
}

/// Ground collision detection against a terrain elevation sample.
///
/// Contact is declared when the aircraft reaches the terrain elevation
/// (AGL <= 0). A touchdown with vertical speed inside the safe-landing
/// envelope is classified as a landing, anything harder as an impact.
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    /// m/s of descent still counting as a landing.
    safe_landing_speed: f64,
    /// m AGL inside which landing classification applies.
    landing_threshold: f64,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self {
            safe_landing_speed: 3.0,
            landing_threshold: 2.0,
        }
    }
}

impl CollisionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Altitude above ground level, m. Negative means penetration.
    pub fn terrain_proximity(&self, position: &Vector3<f64>, terrain_elevation: f64) -> f64 {
        position.y - terrain_elevation
    }

    pub fn check_ground_collision(
        &self,
        state: &AircraftState,
        terrain_elevation: f64,
    ) -> CollisionResult {
        let agl = self.terrain_proximity(&state.position, terrain_elevation);
        if agl > 0.0 {
            return CollisionResult::none();
        }

        let vertical_speed = state.velocity.y.abs();
        let safe = agl >= -self.landing_threshold && vertical_speed <= self.safe_landing_speed;

        CollisionResult {
            collided: true,
            contact_point: Vector3::new(state.position.x, terrain_elevation, state.position.z),
            contact_normal: Vector3::y(),
            penetration_depth: -agl,
            safe_landing: safe,
        }
    }
}
