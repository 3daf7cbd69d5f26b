pub mod constants;
pub mod errors;
pub mod math;

pub use errors::SimError;
