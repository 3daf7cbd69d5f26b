//! Flight dynamics, ground handling, and collision detection.

mod collision;
mod error;
mod flight_model;
mod forces;
mod ground;
mod terrain;

pub use collision::{CollisionDetector, CollisionResult};
pub use error::PhysicsError;
pub use flight_model::{AircraftState, EngineOutput, FlightModel, SimpleFlightModel};
pub use forces::FlightForces;
pub use ground::{GroundContact, GroundForces, GroundPhysics, Surface};
pub use terrain::{FlatTerrain, TerrainProvider};
