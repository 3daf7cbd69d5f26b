pub mod autopilot;
pub mod bus;
pub mod config;
pub mod physics;
pub mod sim;
pub mod systems;
pub mod utils;

pub use autopilot::{Autopilot, AutopilotMode};
pub use bus::{Message, MessageBus, MessagePriority, Payload, Topic};
pub use config::SimConfig;
pub use physics::{AircraftState, FlightModel, SimpleFlightModel};
pub use sim::Simulation;
pub use utils::SimError;
