use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("Invalid timestep: {0}")]
    InvalidTimestep(f64),
    #[error("Non-finite state detected in {0}")]
    NonFiniteState(&'static str),
    #[error("Invalid physics parameter: {0}")]
    InvalidParameter(String),
}
