pub const GRAVITY: f64 = 9.81; // m/s^2
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225; // kg/m^3

// Imperial to SI conversions
pub const SQFT_TO_SQM: f64 = 0.092903;
pub const LBS_TO_KG: f64 = 0.453592;
pub const LBF_TO_N: f64 = 4.44822;
pub const HP_TO_WATTS: f64 = 745.7;
pub const FT_TO_M: f64 = 0.3048;
pub const KNOTS_TO_MPS: f64 = 0.514444;
pub const MPS_TO_FPM: f64 = 196.850394;

/// Seconds per hour, for GPH and amp-hour bookkeeping.
pub const SECONDS_PER_HOUR: f64 = 3600.0;
