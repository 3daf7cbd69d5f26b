use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Per-tick force breakdown in the world frame (+y up), Newtons.
///
/// Kept as separate components so instruments and tests can inspect each
/// contribution; `total()` is what the integrator consumes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FlightForces {
    pub weight: Vector3<f64>,
    pub lift: Vector3<f64>,
    pub drag: Vector3<f64>,
    pub thrust: Vector3<f64>,
    /// Decaying external impulses (gusts, pushback).
    pub external: Vector3<f64>,
    /// Ground reaction passed in by the simulation root, valid for one tick.
    pub ground: Vector3<f64>,
}

impl FlightForces {
    pub fn total(&self) -> Vector3<f64> {
        self.weight + self.lift + self.drag + self.thrust + self.external + self.ground
    }
}
