//! Gravity-feed dual-tank fuel system.
//!
//! No-forgiveness semantics: the moment the selected tanks run dry (or the
//! selector is OFF) available flow drops to zero and the engine dies on the
//! same tick.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::FuelConfig;
use crate::utils::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelSelector {
    Off,
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelTankId {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FuelTank {
    pub capacity_gal: f64,
    pub quantity_gal: f64,
    pub pump_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelWarning {
    LowFuel,
    CriticalFuel,
    Imbalance,
}

/// Snapshot of the fuel system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelSystemState {
    pub left_quantity_gal: f64,
    pub right_quantity_gal: f64,
    pub total_gal: f64,
    pub selector: FuelSelector,
    /// Flow delivered to the engine during the last update.
    pub fuel_flow_gph: f64,
    /// Maximum flow the selected tanks can feed right now.
    pub available_flow_gph: f64,
    pub pressure_psi: f64,
    pub warnings: Vec<FuelWarning>,
}

#[derive(Debug)]
pub struct GravityFuelSystem {
    config: FuelConfig,
    left: FuelTank,
    right: FuelTank,
    selector: FuelSelector,
    last_flow_gph: f64,
}

impl GravityFuelSystem {
    pub fn new(config: FuelConfig) -> Self {
        info!(
            left_gal = config.left_quantity_gal,
            right_gal = config.right_quantity_gal,
            "gravity fuel system initialized"
        );
        Self {
            left: FuelTank {
                capacity_gal: config.left_capacity_gal,
                quantity_gal: config.left_quantity_gal,
                pump_enabled: false,
            },
            right: FuelTank {
                capacity_gal: config.right_capacity_gal,
                quantity_gal: config.right_quantity_gal,
                pump_enabled: false,
            },
            selector: config.initial_selector,
            last_flow_gph: 0.0,
            config,
        }
    }

    /// Consume fuel for one tick. `demand_gph` is what the engine asked
    /// for; delivery is clamped to what the selected tanks can feed.
    pub fn update(&mut self, dt: f64, demand_gph: f64) {
        if self.selector == FuelSelector::Off {
            self.last_flow_gph = 0.0;
            return;
        }

        let delivered = demand_gph.min(self.available_flow_gph()).max(0.0);
        self.last_flow_gph = delivered;

        let consumed = delivered / 3600.0 * dt;
        match self.selector {
            FuelSelector::Both => self.consume_from_both(consumed),
            FuelSelector::Left => self.consume(FuelTankId::Left, consumed),
            FuelSelector::Right => self.consume(FuelTankId::Right, consumed),
            FuelSelector::Off => {}
        }
    }

    /// Maximum flow the engine can draw, GPH. Zero with the selector OFF
    /// or the selected tanks empty.
    pub fn available_flow_gph(&self) -> f64 {
        let available = match self.selector {
            FuelSelector::Off => return 0.0,
            FuelSelector::Both => self.left.quantity_gal + self.right.quantity_gal,
            FuelSelector::Left => self.left.quantity_gal,
            FuelSelector::Right => self.right.quantity_gal,
        };
        if available <= 0.0 {
            return 0.0;
        }
        if self.pump_active() {
            self.config.pump_feed_gph
        } else {
            self.config.gravity_feed_gph
        }
    }

    /// Line pressure at the engine, psi.
    pub fn pressure_psi(&self) -> f64 {
        if self.available_flow_gph() <= 0.0 {
            0.0
        } else if self.pump_active() {
            self.config.pump_pressure_psi
        } else {
            self.config.gravity_pressure_psi
        }
    }

    pub fn set_selector(&mut self, selector: FuelSelector) {
        if selector != self.selector {
            info!(?selector, "fuel selector moved");
        }
        self.selector = selector;
    }

    pub fn selector(&self) -> FuelSelector {
        self.selector
    }

    pub fn set_pump(&mut self, tank: FuelTankId, enabled: bool) {
        self.tank_mut(tank).pump_enabled = enabled;
    }

    pub fn quantity(&self, tank: FuelTankId) -> f64 {
        self.tank(tank).quantity_gal
    }

    pub fn total_gal(&self) -> f64 {
        self.left.quantity_gal + self.right.quantity_gal
    }

    pub fn last_flow_gph(&self) -> f64 {
        self.last_flow_gph
    }

    /// Ground refueling. Rejects amounts that would overflow the tank.
    pub fn refuel(&mut self, tank: FuelTankId, gallons: f64) -> Result<(), SimError> {
        if gallons < 0.0 {
            return Err(SimError::InvalidControl(
                "refuel amount must be non-negative".into(),
            ));
        }
        let t = self.tank_mut(tank);
        let new_quantity = t.quantity_gal + gallons;
        if new_quantity > t.capacity_gal {
            warn!(?tank, gallons, "refuel rejected: would overflow");
            return Err(SimError::StateError(format!(
                "refueling {gallons:.1} gal would overflow the {tank:?} tank"
            )));
        }
        t.quantity_gal = new_quantity;
        info!(?tank, gallons, "tank refueled");
        Ok(())
    }

    pub fn state(&self) -> FuelSystemState {
        let mut warnings = Vec::new();
        let total = self.total_gal();
        if total < 2.0 {
            warnings.push(FuelWarning::CriticalFuel);
        } else if total < 5.0 {
            warnings.push(FuelWarning::LowFuel);
        }
        if (self.left.quantity_gal - self.right.quantity_gal).abs() > 5.0 {
            warnings.push(FuelWarning::Imbalance);
        }

        FuelSystemState {
            left_quantity_gal: self.left.quantity_gal,
            right_quantity_gal: self.right.quantity_gal,
            total_gal: total,
            selector: self.selector,
            fuel_flow_gph: self.last_flow_gph,
            available_flow_gph: self.available_flow_gph(),
            pressure_psi: self.pressure_psi(),
            warnings,
        }
    }

    fn pump_active(&self) -> bool {
        match self.selector {
            FuelSelector::Off => false,
            FuelSelector::Left => self.left.pump_enabled,
            FuelSelector::Right => self.right.pump_enabled,
            FuelSelector::Both => self.left.pump_enabled || self.right.pump_enabled,
        }
    }

    fn tank(&self, id: FuelTankId) -> &FuelTank {
        match id {
            FuelTankId::Left => &self.left,
            FuelTankId::Right => &self.right,
        }
    }

    fn tank_mut(&mut self, id: FuelTankId) -> &mut FuelTank {
        match id {
            FuelTankId::Left => &mut self.left,
            FuelTankId::Right => &mut self.right,
        }
    }

    fn consume(&mut self, id: FuelTankId, gallons: f64) {
        let tank = self.tank_mut(id);
        tank.quantity_gal = (tank.quantity_gal - gallons).max(0.0);
    }

    /// Split consumption evenly; if the left tank runs dry mid-tick the
    /// shortfall comes from the right.
    fn consume_from_both(&mut self, gallons: f64) {
        let per_tank = gallons / 2.0;

        self.left.quantity_gal -= per_tank;
        if self.left.quantity_gal < 0.0 {
            let shortfall = -self.left.quantity_gal;
            self.left.quantity_gal = 0.0;
            self.right.quantity_gal -= shortfall;
        }

        self.right.quantity_gal = (self.right.quantity_gal - per_tank).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn system() -> GravityFuelSystem {
        GravityFuelSystem::new(FuelConfig::default())
    }

    #[test]
    fn both_selector_drains_tanks_evenly() {
        let mut system = system();
        // 9 GPH for one simulated hour at 1 s steps.
        for _ in 0..3600 {
            system.update(1.0, 9.0);
        }
        assert_relative_eq!(system.quantity(FuelTankId::Left), 26.0 - 4.5, epsilon = 0.1);
        assert_relative_eq!(system.quantity(FuelTankId::Right), 26.0 - 4.5, epsilon = 0.1);
    }

    #[test]
    fn selector_off_feeds_nothing() {
        let mut system = system();
        system.set_selector(FuelSelector::Off);
        assert_eq!(system.available_flow_gph(), 0.0);
        assert_eq!(system.pressure_psi(), 0.0);

        system.update(1.0, 9.0);
        assert_relative_eq!(system.total_gal(), 52.0, epsilon = 1e-9);
    }

    #[test]
    fn single_tank_selector_drains_that_tank_only() {
        let mut system = system();
        system.set_selector(FuelSelector::Left);
        for _ in 0..3600 {
            system.update(1.0, 9.0);
        }
        assert_relative_eq!(system.quantity(FuelTankId::Left), 26.0 - 9.0, epsilon = 0.1);
        assert_relative_eq!(system.quantity(FuelTankId::Right), 26.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_selected_tank_gives_zero_flow() {
        let mut system = GravityFuelSystem::new(FuelConfig {
            left_quantity_gal: 0.0,
            ..Default::default()
        });
        system.set_selector(FuelSelector::Left);
        assert_eq!(system.available_flow_gph(), 0.0);
    }

    #[test]
    fn pump_raises_pressure_and_feed() {
        let mut system = system();
        assert_eq!(system.available_flow_gph(), 15.0);
        assert_relative_eq!(system.pressure_psi(), 2.5, epsilon = 1e-9);

        system.set_pump(FuelTankId::Left, true);
        assert_eq!(system.available_flow_gph(), 20.0);
        assert_relative_eq!(system.pressure_psi(), 4.5, epsilon = 1e-9);
    }

    #[test]
    fn feed_figures_come_from_the_config() {
        let mut system = GravityFuelSystem::new(FuelConfig {
            gravity_feed_gph: 11.0,
            pump_feed_gph: 17.0,
            gravity_pressure_psi: 2.0,
            pump_pressure_psi: 5.0,
            ..Default::default()
        });
        assert_eq!(system.available_flow_gph(), 11.0);
        assert_relative_eq!(system.pressure_psi(), 2.0, epsilon = 1e-9);

        system.set_pump(FuelTankId::Right, true);
        assert_eq!(system.available_flow_gph(), 17.0);
        assert_relative_eq!(system.pressure_psi(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn refuel_rejects_overflow() {
        let mut system = system();
        assert!(system.refuel(FuelTankId::Left, 1.0).is_err());

        let mut part_full = GravityFuelSystem::new(FuelConfig {
            left_quantity_gal: 10.0,
            ..Default::default()
        });
        part_full.refuel(FuelTankId::Left, 10.0).unwrap();
        assert_relative_eq!(part_full.quantity(FuelTankId::Left), 20.0, epsilon = 1e-9);
        assert!(part_full.refuel(FuelTankId::Left, 10.0).is_err());
    }

    #[test]
    fn both_spillover_when_left_runs_dry() {
        let mut system = GravityFuelSystem::new(FuelConfig {
            left_quantity_gal: 0.001,
            right_quantity_gal: 10.0,
            ..Default::default()
        });
        for _ in 0..600 {
            system.update(1.0, 12.0);
        }
        assert_eq!(system.quantity(FuelTankId::Left), 0.0);
        // The full 12 GPH for 10 minutes is 2 gallons, nearly all from the
        // right tank.
        assert_relative_eq!(system.quantity(FuelTankId::Right), 8.0, epsilon = 0.05);
    }

    #[test]
    fn low_fuel_warnings_escalate() {
        let mut system = GravityFuelSystem::new(FuelConfig {
            left_quantity_gal: 2.0,
            right_quantity_gal: 2.0,
            ..Default::default()
        });
        assert!(system.state().warnings.contains(&FuelWarning::LowFuel));

        system.set_selector(FuelSelector::Both);
        for _ in 0..1200 {
            system.update(1.0, 9.0);
        }
        assert!(system.state().warnings.contains(&FuelWarning::CriticalFuel));
    }
}
