//! Fixed-pitch propeller thrust model.
//!
//! The blade angle cannot change in flight, so efficiency swings with the
//! advance ratio: poor at the static end, peaking at cruise, stalling off
//! at high speed.

use tracing::info;

use crate::config::PropellerConfig;
use crate::utils::constants::HP_TO_WATTS;

#[derive(Debug, Clone)]
pub struct FixedPitchPropeller {
    config: PropellerConfig,
}

impl FixedPitchPropeller {
    pub fn new(config: PropellerConfig) -> Self {
        info!(
            diameter_m = config.diameter,
            pitch_ratio = config.pitch_ratio,
            "fixed-pitch propeller initialized"
        );
        Self { config }
    }

    /// Thrust in Newtons for the given engine output and flight condition.
    ///
    /// Below 1 m/s the thrust-coefficient method (`C_T ρ n² D⁴`) replaces
    /// the power-velocity relation `η P / v`, which diverges at zero speed.
    pub fn thrust_n(
        &self,
        power_hp: f64,
        rpm: f64,
        airspeed_mps: f64,
        air_density_kgm3: f64,
    ) -> f64 {
        if power_hp <= 0.0 || rpm <= 0.0 {
            return 0.0;
        }

        let power_watts = power_hp * HP_TO_WATTS;
        let efficiency = self.efficiency(airspeed_mps, rpm);

        if airspeed_mps < 1.0 {
            let rps = rpm / 60.0;
            let c_t = (0.06 + (self.config.pitch_ratio - 0.5) * 0.1 + efficiency * 0.04)
                .clamp(0.04, 0.15);
            c_t * air_density_kgm3 * rps * rps * self.config.diameter.powi(4)
        } else {
            efficiency * power_watts / airspeed_mps
        }
    }

    /// Efficiency at the current advance ratio, piecewise: static plateau,
    /// linear rise to cruise, cruise plateau to 1.5×, then quadratic-ish
    /// falloff capped at 50%.
    pub fn efficiency(&self, airspeed_mps: f64, rpm: f64) -> f64 {
        if rpm <= 0.0 {
            return 0.0;
        }

        let j = self.advance_ratio(airspeed_mps, rpm);
        let cruise_j = self.config.cruise_advance_ratio;

        let efficiency = if j < 0.1 {
            self.config.static_efficiency
        } else if j < cruise_j {
            let t = j / cruise_j;
            self.config.static_efficiency
                + (self.config.cruise_efficiency - self.config.static_efficiency) * t
        } else if j < cruise_j * 1.5 {
            self.config.cruise_efficiency
        } else {
            let excess = j - cruise_j * 1.5;
            self.config.cruise_efficiency - (excess * 0.3).min(0.5)
        };

        efficiency.clamp(0.0, 1.0)
    }

    /// Advance ratio J = v / (n D).
    pub fn advance_ratio(&self, airspeed_mps: f64, rpm: f64) -> f64 {
        if rpm <= 0.0 {
            return 0.0;
        }
        let rps = rpm / 60.0;
        airspeed_mps / (rps * self.config.diameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn prop() -> FixedPitchPropeller {
        FixedPitchPropeller::new(PropellerConfig::default())
    }

    #[test]
    fn no_thrust_without_power() {
        let prop = prop();
        assert_eq!(prop.thrust_n(0.0, 2700.0, 0.0, 1.225), 0.0);
        assert_eq!(prop.thrust_n(180.0, 0.0, 0.0, 1.225), 0.0);
    }

    #[test]
    fn static_thrust_in_realistic_band() {
        let prop = prop();
        let thrust = prop.thrust_n(180.0, 2700.0, 0.0, 1.225);
        // A 180 HP fixed-pitch installation produces on the order of
        // 2-4 kN static.
        assert!(thrust > 1000.0 && thrust < 5000.0, "thrust was {thrust}");
    }

    #[test]
    fn dynamic_thrust_decreases_with_airspeed() {
        let prop = prop();
        let slow = prop.thrust_n(180.0, 2700.0, 30.0, 1.225);
        let fast = prop.thrust_n(180.0, 2700.0, 60.0, 1.225);
        assert!(fast < slow);
    }

    #[test]
    fn efficiency_peaks_at_cruise_advance_ratio() {
        let prop = prop();
        let cruise_j = PropellerConfig::default().cruise_advance_ratio;
        let diameter = PropellerConfig::default().diameter;
        let rpm = 2400.0;
        let rps = rpm / 60.0;

        let static_eff = prop.efficiency(0.0, rpm);
        let cruise_eff = prop.efficiency(cruise_j * rps * diameter, rpm);
        let stalled_eff = prop.efficiency(3.0 * cruise_j * rps * diameter, rpm);

        assert_relative_eq!(static_eff, 0.50, epsilon = 1e-9);
        assert_relative_eq!(cruise_eff, 0.80, epsilon = 1e-9);
        assert!(stalled_eff < cruise_eff);
    }

    #[test]
    fn advance_ratio_formula() {
        let prop = prop();
        let j = prop.advance_ratio(40.0, 2400.0);
        assert_relative_eq!(j, 40.0 / (40.0 * 1.905), epsilon = 1e-9);
        assert_eq!(prop.advance_ratio(40.0, 0.0), 0.0);
    }
}
