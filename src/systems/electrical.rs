//! 12V electrical system: lead-acid battery plus belt-driven alternator.
//!
//! Single main bus, no redundancy. The battery can be run completely flat,
//! and the starter will not turn once bus voltage sags below its minimum.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ElectricalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectricalFailure {
    Alternator,
    Battery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectricalWarning {
    LowBattery,
    CriticalBattery,
    LowVoltage,
    Brownout,
    AlternatorOffline,
}

/// Published electrical snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectricalSystemState {
    pub battery_voltage: f64,
    pub battery_charge_ah: f64,
    pub battery_soc_percent: f64,
    pub bus_voltage: f64,
    pub alternator_online: bool,
    pub alternator_current_amps: f64,
    pub total_load_amps: f64,
    pub warnings: Vec<ElectricalWarning>,
    pub failures: Vec<ElectricalFailure>,
}

/// Ohms per amp of bus sag when the battery alone feeds the bus.
const BUS_DROP_PER_AMP: f64 = 0.01;
/// Ah/h lost to self-discharge with the master off.
const SELF_DISCHARGE_AH_PER_HOUR: f64 = 0.1;
/// Charging tapers toward this float voltage.
const CHARGE_TARGET_VOLTAGE: f64 = 13.8;

#[derive(Debug)]
pub struct ElectricalSystem {
    config: ElectricalConfig,
    charge_ah: f64,
    battery_voltage: f64,
    bus_voltage: f64,
    master_on: bool,
    alternator_switch_on: bool,
    alternator_failed: bool,
    alternator_online: bool,
    alternator_amps: f64,
    total_load_amps: f64,
    battery_failed: bool,
}

impl ElectricalSystem {
    pub fn new(config: ElectricalConfig) -> Self {
        info!(
            capacity_ah = config.battery_capacity_ah,
            alternator_max_amps = config.alternator_max_amps,
            "electrical system initialized"
        );
        let mut system = Self {
            charge_ah: config.battery_capacity_ah,
            config,
            battery_voltage: 0.0,
            bus_voltage: 0.0,
            master_on: false,
            alternator_switch_on: true,
            alternator_failed: false,
            alternator_online: false,
            alternator_amps: 0.0,
            total_load_amps: 0.0,
            battery_failed: false,
        };
        system.battery_voltage = system.open_circuit_voltage();
        system
    }

    /// Advance the system by `dt` seconds. `starter_amps` is the starter
    /// motor draw for this tick (zero when not cranking).
    pub fn update(&mut self, dt: f64, engine_rpm: f64, starter_amps: f64) {
        if !self.master_on {
            // Self-discharge continues even with everything off.
            let loss = SELF_DISCHARGE_AH_PER_HOUR / 3600.0 * dt;
            self.charge_ah = (self.charge_ah - loss).max(0.0);
            self.battery_voltage = self.open_circuit_voltage();
            self.bus_voltage = 0.0;
            self.alternator_online = false;
            self.alternator_amps = 0.0;
            self.total_load_amps = 0.0;
            return;
        }

        // Open-circuit voltage reflects the current state of charge before
        // this tick's load is applied.
        self.battery_voltage = self.open_circuit_voltage();

        self.total_load_amps = self.config.base_load_amps + starter_amps;

        let alternator_rpm = engine_rpm * self.config.alternator_drive_ratio;
        self.alternator_online = self.alternator_switch_on
            && !self.alternator_failed
            && alternator_rpm > self.config.alternator_min_rpm;

        let net_amps;
        if self.alternator_online {
            let rpm_factor =
                ((alternator_rpm - self.config.alternator_min_rpm) / 3000.0).clamp(0.0, 1.0);
            let available = self.config.alternator_max_amps * rpm_factor;

            // Charging tapers as the battery approaches float voltage.
            let charge_amps =
                ((CHARGE_TARGET_VOLTAGE - self.battery_voltage) * 10.0).clamp(0.0, 15.0);

            self.alternator_amps = (self.total_load_amps + charge_amps).min(available);
            net_amps = self.alternator_amps - self.total_load_amps;
            self.bus_voltage = self.config.regulated_voltage;
        } else {
            self.alternator_amps = 0.0;
            net_amps = -self.total_load_amps;
            let drop = self.total_load_amps * BUS_DROP_PER_AMP;
            self.bus_voltage = (self.battery_voltage - drop).max(0.0);
        }

        self.charge_ah = (self.charge_ah + net_amps / 3600.0 * dt)
            .clamp(0.0, self.config.battery_capacity_ah);
        self.battery_voltage = self.open_circuit_voltage();
    }

    pub fn set_master(&mut self, on: bool) {
        if on != self.master_on {
            info!(on, "battery master switched");
        }
        self.master_on = on;
    }

    pub fn set_alternator_switch(&mut self, on: bool) {
        self.alternator_switch_on = on;
    }

    pub fn bus_voltage(&self) -> f64 {
        self.bus_voltage
    }

    pub fn battery_voltage(&self) -> f64 {
        self.battery_voltage
    }

    pub fn charge_ah(&self) -> f64 {
        self.charge_ah
    }

    pub fn alternator_online(&self) -> bool {
        self.alternator_online
    }

    pub fn master_on(&self) -> bool {
        self.master_on
    }

    /// Whether the bus can hold `min_voltage` while supplying `amps` on
    /// battery power alone.
    pub fn can_supply(&self, amps: f64, min_voltage: f64) -> bool {
        if !self.master_on {
            return false;
        }
        if self.alternator_online {
            return self.config.regulated_voltage >= min_voltage;
        }
        let load = self.config.base_load_amps + amps;
        self.battery_voltage - load * BUS_DROP_PER_AMP >= min_voltage
    }

    pub fn fail(&mut self, failure: ElectricalFailure) {
        warn!(?failure, "electrical failure injected");
        match failure {
            ElectricalFailure::Alternator => self.alternator_failed = true,
            ElectricalFailure::Battery => {
                self.battery_failed = true;
                self.charge_ah = 0.0;
                self.battery_voltage = 0.0;
            }
        }
    }

    pub fn state(&self) -> ElectricalSystemState {
        let soc = self.charge_ah / self.config.battery_capacity_ah * 100.0;

        let mut warnings = Vec::new();
        if soc < 10.0 {
            warnings.push(ElectricalWarning::CriticalBattery);
        } else if soc < 20.0 {
            warnings.push(ElectricalWarning::LowBattery);
        }
        if self.battery_voltage < 11.0 {
            warnings.push(ElectricalWarning::LowVoltage);
        }
        if self.master_on && self.bus_voltage < 10.0 {
            warnings.push(ElectricalWarning::Brownout);
        }
        if self.alternator_failed {
            warnings.push(ElectricalWarning::AlternatorOffline);
        }

        let mut failures = Vec::new();
        if self.alternator_failed {
            failures.push(ElectricalFailure::Alternator);
        }
        if self.battery_failed || self.charge_ah <= 0.0 {
            failures.push(ElectricalFailure::Battery);
        }

        ElectricalSystemState {
            battery_voltage: self.battery_voltage,
            battery_charge_ah: self.charge_ah,
            battery_soc_percent: soc,
            bus_voltage: self.bus_voltage,
            alternator_online: self.alternator_online,
            alternator_current_amps: self.alternator_amps,
            total_load_amps: self.total_load_amps,
            warnings,
            failures,
        }
    }

    /// Lead-acid open-circuit voltage from state of charge, piecewise.
    fn open_circuit_voltage(&self) -> f64 {
        if self.battery_failed {
            return 0.0;
        }
        let soc = self.charge_ah / self.config.battery_capacity_ah;
        if soc <= 0.0 {
            0.0
        } else if soc <= 0.05 {
            10.5 + (soc / 0.05) * 0.3
        } else if soc <= 0.25 {
            10.8 + ((soc - 0.05) / 0.20) * 1.0
        } else if soc <= 0.75 {
            11.8 + ((soc - 0.25) / 0.50) * 0.4
        } else {
            12.2 + ((soc - 0.75) / 0.25) * 0.4
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f64 = 0.016;

    fn system() -> ElectricalSystem {
        ElectricalSystem::new(ElectricalConfig::default())
    }

    #[test]
    fn master_off_means_dead_bus() {
        let mut system = system();
        system.update(DT, 2400.0, 0.0);
        assert_eq!(system.bus_voltage(), 0.0);
        // The battery itself still reads a healthy open-circuit voltage,
        // less one tick of self-discharge.
        assert_relative_eq!(system.battery_voltage(), 12.6, epsilon = 1e-6);
    }

    #[test]
    fn full_battery_carries_the_starter() {
        let mut system = system();
        system.set_master(true);
        system.update(DT, 0.0, 150.0);
        assert!(system.bus_voltage() >= 11.0, "bus was {}", system.bus_voltage());
    }

    #[test]
    fn flat_battery_cannot_carry_the_starter() {
        let mut system = ElectricalSystem::new(ElectricalConfig {
            battery_capacity_ah: 35.0,
            ..Default::default()
        });
        system.charge_ah = 3.0; // under 10% SoC
        system.set_master(true);
        system.update(DT, 0.0, 150.0);
        assert!(system.bus_voltage() < 11.0);
        assert!(!system.can_supply(150.0, 11.0));
    }

    #[test]
    fn alternator_comes_online_above_threshold_rpm() {
        let mut system = system();
        system.set_master(true);

        // 400 engine RPM gives 1000 alternator RPM, below the 1200 cut-in.
        system.update(DT, 400.0, 0.0);
        assert!(!system.alternator_online());

        // 1000 engine RPM gives 2500 alternator RPM.
        system.update(DT, 1000.0, 0.0);
        assert!(system.alternator_online());
        assert_relative_eq!(system.bus_voltage(), 14.0, epsilon = 1e-9);
    }

    #[test]
    fn alternator_recharges_battery() {
        let mut system = system();
        system.charge_ah = 20.0;
        system.set_master(true);

        for _ in 0..6000 {
            system.update(0.1, 2400.0, 0.0);
        }
        assert!(system.charge_ah() > 20.0);
    }

    #[test]
    fn battery_drains_under_load_without_alternator() {
        let mut system = system();
        system.set_master(true);
        let initial = system.charge_ah();
        for _ in 0..1000 {
            system.update(0.1, 0.0, 0.0);
        }
        assert!(system.charge_ah() < initial);
    }

    #[test]
    fn self_discharge_with_master_off() {
        let mut system = system();
        let initial = system.charge_ah();
        // One simulated hour.
        for _ in 0..3600 {
            system.update(1.0, 0.0, 0.0);
        }
        assert_relative_eq!(system.charge_ah(), initial - 0.1, epsilon = 1e-6);
    }

    #[test]
    fn alternator_failure_forces_battery_power() {
        let mut system = system();
        system.set_master(true);
        system.fail(ElectricalFailure::Alternator);
        system.update(DT, 2400.0, 0.0);
        assert!(!system.alternator_online());
        assert!(system.bus_voltage() < 14.0);
        assert!(system
            .state()
            .warnings
            .contains(&ElectricalWarning::AlternatorOffline));
    }

    #[test]
    fn battery_failure_zeroes_everything() {
        let mut system = system();
        system.set_master(true);
        system.fail(ElectricalFailure::Battery);
        system.update(DT, 0.0, 0.0);
        assert_eq!(system.battery_voltage(), 0.0);
        assert_eq!(system.bus_voltage(), 0.0);
        assert!(system
            .state()
            .failures
            .contains(&ElectricalFailure::Battery));
    }

    #[test]
    fn discharge_curve_is_monotonic() {
        let mut system = system();
        let mut last = f64::INFINITY;
        for soc_percent in (0..=100).rev() {
            system.charge_ah = system.config.battery_capacity_ah * soc_percent as f64 / 100.0;
            let v = system.open_circuit_voltage();
            assert!(v <= last + 1e-9);
            last = v;
        }
        system.charge_ah = system.config.battery_capacity_ah;
        assert_relative_eq!(system.open_circuit_voltage(), 12.6, epsilon = 1e-9);
    }
}
