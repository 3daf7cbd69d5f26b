use std::io;
use thiserror::Error;

use crate::physics::PhysicsError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    InvalidConfig(String),

    #[error("Missing required config field: {0}")]
    MissingField(&'static str),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("Invalid control input: {0}")]
    InvalidControl(String),

    #[error("State error: {0}")]
    StateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_yaml::Error),
}
