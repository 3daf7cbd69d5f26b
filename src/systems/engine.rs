//! Naturally aspirated piston engine.
//!
//! No-forgiveness operating model: the starter needs bus voltage, ignition
//! needs at least one magneto, and combustion stops the same tick fuel flow
//! reaches zero.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;

/// Failure modes injectable for training scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineFailure {
    OilPressureLoss,
    Overheat,
    Seizure,
    Fire,
    Magneto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineWarning {
    LowOilPressure,
    HighOilTemperature,
    HighCylinderHeadTemperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    Off,
    Starting,
    Running,
    Failed,
}

/// Lever and switch positions feeding the engine each tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineControls {
    pub throttle: f64,
    /// 0.0 = idle cutoff, 1.0 = full rich.
    pub mixture: f64,
    pub starter: bool,
    pub magneto_left: bool,
    pub magneto_right: bool,
}

impl Default for EngineControls {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            mixture: 1.0,
            starter: false,
            magneto_left: false,
            magneto_right: false,
        }
    }
}

/// Published engine snapshot. Temperatures are reported in Celsius even
/// though the thermal model integrates in Fahrenheit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    pub phase: EnginePhase,
    pub running: bool,
    pub rpm: f64,
    pub power_hp: f64,
    pub fuel_flow_gph: f64,
    pub manifold_pressure_inhg: f64,
    pub oil_pressure_psi: f64,
    pub oil_temperature_c: f64,
    pub cylinder_head_temp_c: f64,
    pub starter_engaged: bool,
    pub warnings: Vec<EngineWarning>,
    pub failures: Vec<EngineFailure>,
}

const AMBIENT_TEMP_F: f64 = 70.0;
const MAX_OIL_TEMP_F: f64 = 245.0;
const MAX_CHT_F: f64 = 500.0;
const MIN_OIL_PRESSURE_PSI: f64 = 25.0;
const MAX_OIL_PRESSURE_PSI: f64 = 60.0;
/// Sustained crank speed delivered by the starter motor.
const STARTER_CRANK_RPM: f64 = 200.0;

#[derive(Debug)]
pub struct PistonEngine {
    config: EngineConfig,
    rpm: f64,
    manifold_pressure: f64,
    fuel_flow_gph: f64,
    oil_pressure_psi: f64,
    oil_temp_f: f64,
    cht_f: f64,
    horsepower: f64,
    running: bool,
    starting: bool,
    failure: Option<EngineFailure>,
    /// 0.0 cold to 1.0 fully warm.
    warmup_factor: f64,
}

impl PistonEngine {
    pub fn new(config: EngineConfig) -> Self {
        info!(
            max_power_hp = config.max_power_hp,
            max_rpm = config.max_rpm,
            "piston engine initialized"
        );
        Self {
            config,
            rpm: 0.0,
            manifold_pressure: 29.92,
            fuel_flow_gph: 0.0,
            oil_pressure_psi: 0.0,
            oil_temp_f: AMBIENT_TEMP_F,
            cht_f: AMBIENT_TEMP_F,
            horsepower: 0.0,
            running: false,
            starting: false,
            failure: None,
            warmup_factor: 0.0,
        }
    }

    /// Advance the engine by `dt` seconds.
    ///
    /// `electrical_available` gates the starter motor; `fuel_available_gph`
    /// is the flow the fuel system can deliver right now.
    pub fn update(
        &mut self,
        dt: f64,
        controls: &EngineControls,
        electrical_available: bool,
        fuel_available_gph: f64,
    ) {
        if self.failure.is_some() {
            self.update_failed(dt);
            return;
        }

        // Fuel starvation kills a running engine the same tick.
        if fuel_available_gph <= 0.0 && self.running {
            warn!("engine fuel starvation, immediate shutdown");
            self.running = false;
            self.starting = false;
            self.rpm = (self.rpm - 500.0 * dt).max(0.0);
            self.fuel_flow_gph = 0.0;
            self.horsepower = 0.0;
            return;
        }

        if controls.starter && electrical_available && !self.running {
            self.starting = true;
            self.rpm = (self.rpm + 400.0 * dt).min(STARTER_CRANK_RPM);

            if self.can_catch(controls, fuel_available_gph)
                && self.rpm >= self.config.start_rpm_threshold
            {
                self.running = true;
                self.starting = false;
                info!(rpm = self.rpm, "engine started");
            }
        } else {
            self.starting = false;
        }

        if self.running {
            self.update_running(dt, controls, fuel_available_gph);
        } else {
            // Wind down when off or cranking has stopped short of a start.
            self.rpm = (self.rpm - 300.0 * dt).max(0.0);
            self.fuel_flow_gph = 0.0;
            self.horsepower = 0.0;
        }

        self.update_temperatures(dt);
        self.update_oil_pressure();
    }

    pub fn state(&self) -> EngineState {
        let phase = if self.failure.is_some() {
            EnginePhase::Failed
        } else if self.running {
            EnginePhase::Running
        } else if self.starting {
            EnginePhase::Starting
        } else {
            EnginePhase::Off
        };

        EngineState {
            phase,
            running: self.running,
            rpm: self.rpm,
            power_hp: self.horsepower,
            fuel_flow_gph: self.fuel_flow_gph,
            manifold_pressure_inhg: self.manifold_pressure,
            oil_pressure_psi: self.oil_pressure_psi,
            oil_temperature_c: fahrenheit_to_celsius(self.oil_temp_f),
            cylinder_head_temp_c: fahrenheit_to_celsius(self.cht_f),
            starter_engaged: self.starting,
            warnings: self.warnings(),
            failures: self.failure.into_iter().collect(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn power_hp(&self) -> f64 {
        self.horsepower
    }

    pub fn starter_engaged(&self) -> bool {
        self.starting
    }

    pub fn fuel_flow_gph(&self) -> f64 {
        self.fuel_flow_gph
    }

    pub fn can_start(&self) -> bool {
        self.failure.is_none() && !self.running
    }

    /// Inject a failure. The engine shuts down and windmills until reset.
    pub fn fail(&mut self, failure: EngineFailure) {
        warn!(?failure, "engine failure injected");
        self.failure = Some(failure);
        self.running = false;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    fn can_catch(&self, controls: &EngineControls, fuel_available_gph: f64) -> bool {
        if !(controls.magneto_left || controls.magneto_right) {
            return false;
        }
        if fuel_available_gph <= 0.0 {
            return false;
        }
        if controls.mixture < 0.1 {
            return false;
        }
        // Cold engine needs some throttle to catch.
        !(self.warmup_factor < 0.3 && controls.throttle < 0.1)
    }

    fn update_running(&mut self, dt: f64, controls: &EngineControls, fuel_available_gph: f64) {
        // Both magnetos off: ignition lost immediately.
        if !(controls.magneto_left || controls.magneto_right) {
            warn!("both magnetos off, engine shutdown");
            self.running = false;
            return;
        }

        let target_rpm = self.config.idle_rpm
            + (self.config.max_rpm - self.config.idle_rpm) * controls.throttle;

        let rpm_rate = 500.0;
        if self.rpm < target_rpm {
            self.rpm = (self.rpm + rpm_rate * dt).min(target_rpm);
        } else {
            self.rpm = (self.rpm - rpm_rate * dt).max(target_rpm);
        }

        self.calculate_power(controls);
        self.calculate_fuel_consumption(controls, fuel_available_gph);

        self.warmup_factor = (self.warmup_factor + 0.05 * dt).min(1.0);
    }

    fn calculate_power(&mut self, controls: &EngineControls) {
        let rpm_factor = self.rpm / self.config.max_rpm;

        let mixture_factor = if controls.mixture < 0.5 {
            controls.mixture * 2.0
        } else if controls.mixture > 0.9 {
            1.0 - (controls.mixture - 0.9) * 2.0
        } else {
            1.0
        };

        let warmup_penalty = 0.7 + 0.3 * self.warmup_factor;

        self.horsepower = self.config.max_power_hp
            * rpm_factor
            * controls.throttle
            * mixture_factor
            * warmup_penalty;

        self.manifold_pressure = 10.0 + 19.92 * controls.throttle;
    }

    fn calculate_fuel_consumption(&mut self, controls: &EngineControls, fuel_available_gph: f64) {
        let power_factor = self.horsepower / self.config.max_power_hp;

        let mut target_flow = self.config.idle_fuel_flow_gph
            + (self.config.max_fuel_flow_gph - self.config.idle_fuel_flow_gph) * power_factor;
        target_flow *= 0.5 + 0.5 * controls.mixture;

        self.fuel_flow_gph = target_flow.min(fuel_available_gph);

        // Partial starvation degrades power proportionally.
        if fuel_available_gph < target_flow {
            let ratio = if target_flow > 0.0 {
                fuel_available_gph / target_flow
            } else {
                0.0
            };
            self.horsepower *= ratio;
        }
    }

    fn update_temperatures(&mut self, dt: f64) {
        let power_factor = self.horsepower / self.config.max_power_hp;

        let target_oil = AMBIENT_TEMP_F + 150.0 * power_factor;
        if self.oil_temp_f < target_oil {
            self.oil_temp_f = (self.oil_temp_f + 20.0 * dt).min(target_oil);
        } else {
            self.oil_temp_f = (self.oil_temp_f - 10.0 * dt).max(target_oil);
        }

        let target_cht = AMBIENT_TEMP_F + 350.0 * power_factor;
        if self.cht_f < target_cht {
            self.cht_f = (self.cht_f + 30.0 * dt).min(target_cht);
        } else {
            self.cht_f = (self.cht_f - 15.0 * dt).max(target_cht);
        }
    }

    fn update_oil_pressure(&mut self) {
        if !self.running {
            self.oil_pressure_psi = 0.0;
            return;
        }

        let rpm_factor = self.rpm / self.config.max_rpm;
        let temp_factor = if self.oil_temp_f < 150.0 {
            1.3
        } else if self.oil_temp_f > 220.0 {
            0.8
        } else {
            1.0
        };

        let base = MIN_OIL_PRESSURE_PSI
            + (MAX_OIL_PRESSURE_PSI - MIN_OIL_PRESSURE_PSI) * rpm_factor;
        self.oil_pressure_psi = base * temp_factor;
    }

    fn warnings(&self) -> Vec<EngineWarning> {
        let mut warnings = Vec::new();
        if self.running {
            if self.oil_pressure_psi < MIN_OIL_PRESSURE_PSI {
                warnings.push(EngineWarning::LowOilPressure);
            }
            if self.oil_temp_f > MAX_OIL_TEMP_F {
                warnings.push(EngineWarning::HighOilTemperature);
            }
            if self.cht_f > MAX_CHT_F {
                warnings.push(EngineWarning::HighCylinderHeadTemperature);
            }
        }
        warnings
    }

    fn update_failed(&mut self, dt: f64) {
        self.running = false;
        self.starting = false;
        self.rpm = (self.rpm - 200.0 * dt).max(0.0);
        self.fuel_flow_gph = 0.0;
        self.horsepower = 0.0;
        self.oil_pressure_psi = 0.0;
        self.oil_temp_f = (self.oil_temp_f - 10.0 * dt).max(AMBIENT_TEMP_F);
        self.cht_f = (self.cht_f - 15.0 * dt).max(AMBIENT_TEMP_F);
    }
}

fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f64 = 0.016;

    fn engine() -> PistonEngine {
        PistonEngine::new(EngineConfig::default())
    }

    fn start_controls() -> EngineControls {
        EngineControls {
            throttle: 0.2,
            mixture: 1.0,
            starter: true,
            magneto_left: true,
            magneto_right: true,
        }
    }

    fn start_engine(engine: &mut PistonEngine) {
        for _ in 0..400 {
            engine.update(DT, &start_controls(), true, 15.0);
            if engine.is_running() {
                return;
            }
        }
        panic!("engine failed to start");
    }

    #[test]
    fn engine_starts_with_power_fuel_and_magnetos() {
        let mut engine = engine();
        let mut ticks = 0;
        loop {
            engine.update(DT, &start_controls(), true, 15.0);
            ticks += 1;
            if engine.is_running() {
                break;
            }
            assert!(ticks < 400, "start took too long");
        }
        // Cranking at 400 RPM/s to a 200 RPM threshold takes at least 31
        // ticks at 16 ms.
        assert!(ticks >= 31);
    }

    #[test]
    fn crank_rpm_rises_monotonically_to_threshold() {
        let mut engine = engine();
        let controls = EngineControls {
            mixture: 0.0, // cutoff, so it cranks without catching
            ..start_controls()
        };
        let mut last_rpm = 0.0;
        for _ in 0..200 {
            engine.update(DT, &controls, true, 15.0);
            assert!(engine.rpm() >= last_rpm - 1e-9);
            assert!(engine.rpm() <= 200.0);
            last_rpm = engine.rpm();
        }
        assert!(!engine.is_running());
        // Steady-state crank speed sits just under the 200 RPM ceiling
        // because the wind-down term applies between starter pulses.
        assert!(last_rpm > 190.0, "crank speed was {last_rpm}");
    }

    #[test]
    fn starter_needs_electrical_power() {
        let mut engine = engine();
        for _ in 0..400 {
            engine.update(DT, &start_controls(), false, 15.0);
        }
        assert!(!engine.is_running());
        assert_eq!(engine.rpm(), 0.0);
    }

    #[test]
    fn no_start_without_magnetos() {
        let mut engine = engine();
        let controls = EngineControls {
            magneto_left: false,
            magneto_right: false,
            ..start_controls()
        };
        for _ in 0..400 {
            engine.update(DT, &controls, true, 15.0);
        }
        assert!(!engine.is_running());
    }

    #[test]
    fn fuel_starvation_kills_engine_in_one_update() {
        let mut engine = engine();
        start_engine(&mut engine);

        engine.update(DT, &start_controls(), true, 0.0);
        assert!(!engine.is_running());
        assert_eq!(engine.fuel_flow_gph(), 0.0);
        assert_eq!(engine.power_hp(), 0.0);
    }

    #[test]
    fn dual_magneto_failure_kills_engine_in_one_update() {
        let mut engine = engine();
        start_engine(&mut engine);

        let controls = EngineControls {
            starter: false,
            magneto_left: false,
            magneto_right: false,
            ..start_controls()
        };
        engine.update(DT, &controls, true, 15.0);
        assert!(!engine.is_running());
    }

    #[test]
    fn single_magneto_keeps_engine_running() {
        let mut engine = engine();
        start_engine(&mut engine);

        let controls = EngineControls {
            starter: false,
            magneto_right: false,
            ..start_controls()
        };
        for _ in 0..100 {
            engine.update(DT, &controls, true, 15.0);
        }
        assert!(engine.is_running());
    }

    #[test]
    fn lean_mixture_reduces_power() {
        let mut rich = engine();
        let mut lean = engine();
        start_engine(&mut rich);
        start_engine(&mut lean);

        let cruise = EngineControls {
            starter: false,
            throttle: 0.8,
            mixture: 0.7,
            ..start_controls()
        };
        let too_lean = EngineControls {
            mixture: 0.2,
            ..cruise
        };
        for _ in 0..500 {
            rich.update(DT, &cruise, true, 15.0);
            lean.update(DT, &too_lean, true, 15.0);
        }
        assert!(lean.power_hp() < rich.power_hp());
    }

    #[test]
    fn injected_failure_windmills_down() {
        let mut engine = engine();
        start_engine(&mut engine);
        let rpm_before = engine.rpm();

        engine.fail(EngineFailure::Seizure);
        engine.update(DT, &start_controls(), true, 15.0);

        assert!(!engine.is_running());
        assert!(engine.rpm() < rpm_before);
        assert_eq!(engine.state().phase, EnginePhase::Failed);
        assert_eq!(engine.state().failures, vec![EngineFailure::Seizure]);
    }

    #[test]
    fn oil_pressure_zero_when_stopped() {
        let mut engine = engine();
        engine.update(DT, &EngineControls::default(), true, 15.0);
        assert_eq!(engine.state().oil_pressure_psi, 0.0);
    }

    #[test]
    fn temperatures_published_in_celsius() {
        let engine = engine();
        let state = engine.state();
        // 70°F ambient is about 21.1°C.
        assert_relative_eq!(state.oil_temperature_c, (70.0 - 32.0) * 5.0 / 9.0, epsilon = 1e-9);
    }

    #[test]
    fn warmup_raises_power_over_time() {
        let mut engine = engine();
        start_engine(&mut engine);
        let cruise = EngineControls {
            starter: false,
            throttle: 0.8,
            mixture: 0.7,
            ..start_controls()
        };
        for _ in 0..50 {
            engine.update(DT, &cruise, true, 15.0);
        }
        let cold_power = engine.power_hp();

        // 25 simulated seconds of warmup.
        for _ in 0..1500 {
            engine.update(DT, &cruise, true, 15.0);
        }
        assert!(engine.power_hp() > cold_power);
    }
}
