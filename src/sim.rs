//! Simulation composition root.
//!
//! Owns the message bus and every subsystem, and drives the fixed-timestep
//! tick. Each tick starts by draining the bus and routing everything that
//! was published during the previous tick, then updates subsystems in
//! causal order: fuel, electrical, engine, flight dynamics, collision and
//! ground handling, autopilot. State published during tick N is therefore
//! visible to consumers at the start of tick N+1.

use nalgebra::Vector3;
use tracing::{debug, info, trace, warn};

use crate::autopilot::Autopilot;
use crate::bus::{
    CollisionDetectedMsg, CollisionKind, CollisionSeverity, ControlInputMsg, ElectricalStateMsg,
    EngineStateMsg, FuelStateMsg, Message, MessageBus, MessagePriority, Payload,
    PositionUpdatedMsg, TerrainUpdatedMsg,
};
use crate::config::SimConfig;
use crate::physics::{
    CollisionDetector, EngineOutput, FlightModel, FlatTerrain, GroundContact, GroundPhysics,
    PhysicsError, SimpleFlightModel, TerrainProvider,
};
use crate::systems::engine::EngineControls;
use crate::systems::{ElectricalSystem, GravityFuelSystem, PistonEngine};
use crate::utils::SimError;

/// Message-fed caches. These hold the most recent routed value of each
/// state topic, so subsystems always consume one-tick-stale snapshots.
#[derive(Debug, Default)]
struct BusCaches {
    engine_running: bool,
    engine_rpm: f64,
    engine_power_hp: f64,
    engine_starter_engaged: bool,
    engine_demand_gph: f64,
    fuel_available_gph: f64,
    bus_voltage: f64,
    terrain_elevation: f64,
}

pub struct Simulation {
    config: SimConfig,
    bus: MessageBus,

    flight: SimpleFlightModel,
    engine: PistonEngine,
    fuel: GravityFuelSystem,
    electrical: ElectricalSystem,
    ground: GroundPhysics,
    collision: CollisionDetector,
    autopilot: Autopilot,
    terrain: Box<dyn TerrainProvider>,

    controls: ControlInputMsg,
    engine_controls: EngineControls,
    caches: BusCaches,
    in_ground_contact: bool,
    elapsed: f64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.engine.validate()?;
        config.fuel.validate()?;
        config.electrical.validate()?;
        let flight_params = config.flight_model.build()?;

        let sim = Self {
            bus: MessageBus::new(),
            flight: SimpleFlightModel::new(flight_params),
            engine: PistonEngine::new(config.engine.clone()),
            fuel: GravityFuelSystem::new(config.fuel.clone()),
            electrical: ElectricalSystem::new(config.electrical.clone()),
            ground: GroundPhysics::new(
                config.ground.max_brake_force,
                config.ground.max_steering_angle_deg,
            ),
            collision: CollisionDetector::new(),
            autopilot: Autopilot::new(config.autopilot.clone()),
            terrain: Box::new(FlatTerrain::default()),
            controls: ControlInputMsg::default(),
            engine_controls: EngineControls::default(),
            caches: BusCaches::default(),
            in_ground_contact: true,
            elapsed: 0.0,
            config,
        };
        info!("simulation initialized");
        Ok(sim)
    }

    /// Replace the terrain elevation source.
    pub fn set_terrain_provider(&mut self, terrain: Box<dyn TerrainProvider>) {
        self.terrain = terrain;
    }

    /// Queue a message for delivery at the start of the next tick.
    pub fn publish(&mut self, message: Message) {
        self.bus.publish(message);
    }

    /// Advance the simulation by one fixed step.
    ///
    /// A non-finite or non-positive `dt` is rejected before any subsystem
    /// advances, so an erroring tick leaves the simulation untouched.
    pub fn tick(&mut self, dt: f64) -> Result<(), SimError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::InvalidTimestep(dt).into());
        }

        self.route_pending();

        self.update_fuel(dt);
        self.update_electrical(dt);
        self.update_engine(dt);
        self.update_flight(dt)?;
        self.update_collision_and_ground();
        self.update_autopilot(dt);

        self.elapsed += dt;
        Ok(())
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn aircraft_state(&self) -> &crate::physics::AircraftState {
        self.flight.state()
    }

    pub fn engine_state(&self) -> crate::systems::EngineState {
        self.engine.state()
    }

    pub fn fuel_state(&self) -> crate::systems::fuel::FuelSystemState {
        self.fuel.state()
    }

    pub fn electrical_state(&self) -> crate::systems::ElectricalSystemState {
        self.electrical.state()
    }

    pub fn autopilot(&self) -> &Autopilot {
        &self.autopilot
    }

    pub fn engine_mut(&mut self) -> &mut PistonEngine {
        &mut self.engine
    }

    pub fn electrical_mut(&mut self) -> &mut ElectricalSystem {
        &mut self.electrical
    }

    fn route_pending(&mut self) {
        for message in self.bus.drain() {
            self.route(message);
        }
    }

    fn route(&mut self, message: Message) {
        trace!(topic = ?message.topic(), sender = message.sender, "routing");
        match message.payload {
            Payload::ControlInput(msg) => {
                self.controls = msg;
                self.engine_controls.throttle = msg.throttle;
            }
            Payload::EngineCommand(msg) => {
                if let Some(starter) = msg.starter {
                    self.engine_controls.starter = starter;
                }
                if let Some(left) = msg.magneto_left {
                    self.engine_controls.magneto_left = left;
                }
                if let Some(right) = msg.magneto_right {
                    self.engine_controls.magneto_right = right;
                }
                if let Some(mixture) = msg.mixture {
                    self.engine_controls.mixture = mixture.clamp(0.0, 1.0);
                }
                if let Some(throttle) = msg.throttle {
                    self.engine_controls.throttle = throttle.clamp(0.0, 1.0);
                }
            }
            Payload::FuelCommand(msg) => {
                if let Some(selector) = msg.selector {
                    self.fuel.set_selector(selector);
                }
                if let Some(left) = msg.left_pump {
                    self.fuel.set_pump(crate::systems::FuelTankId::Left, left);
                }
                if let Some(right) = msg.right_pump {
                    self.fuel.set_pump(crate::systems::FuelTankId::Right, right);
                }
                if let Some(refuel) = msg.refuel {
                    if let Err(err) = self.fuel.refuel(refuel.tank, refuel.gallons) {
                        warn!(%err, "refuel request rejected");
                    }
                }
            }
            Payload::ElectricalCommand(msg) => {
                if let Some(master) = msg.battery_master {
                    self.electrical.set_master(master);
                }
                if let Some(alternator) = msg.alternator_switch {
                    self.electrical.set_alternator_switch(alternator);
                }
            }
            Payload::AutopilotCommand(msg) => {
                self.autopilot.handle_command(&msg);
            }
            Payload::PositionUpdated(msg) => {
                self.autopilot.observe(&msg);
            }
            Payload::EngineState(msg) => {
                self.caches.engine_running = msg.running;
                self.caches.engine_rpm = msg.rpm;
                self.caches.engine_power_hp = msg.power_hp;
                self.caches.engine_starter_engaged = msg.starter_engaged;
                self.caches.engine_demand_gph = msg.fuel_flow_gph;
            }
            Payload::FuelState(msg) => {
                self.caches.fuel_available_gph = msg.fuel_available_gph;
            }
            Payload::ElectricalState(msg) => {
                self.caches.bus_voltage = msg.bus_voltage;
            }
            Payload::TerrainUpdated(msg) => {
                self.caches.terrain_elevation = msg.elevation;
            }
            Payload::CollisionDetected(msg) => {
                debug!(?msg.severity, "collision message observed");
            }
        }
    }

    fn update_fuel(&mut self, dt: f64) {
        // Demand is the engine's published flow from the previous tick,
        // with a minimum draw while cranking so a start attempt wets the
        // lines.
        let demand = if self.caches.engine_starter_engaged && self.caches.engine_demand_gph == 0.0 {
            self.config.engine.idle_fuel_flow_gph
        } else {
            self.caches.engine_demand_gph
        };
        self.fuel.update(dt, demand);

        let state = self.fuel.state();
        self.bus.publish(Message::new(
            "fuel",
            MessagePriority::Normal,
            Payload::FuelState(FuelStateMsg {
                left_quantity_gal: state.left_quantity_gal,
                right_quantity_gal: state.right_quantity_gal,
                total_fuel_gal: state.total_gal,
                fuel_flow_gph: state.fuel_flow_gph,
                fuel_available_gph: state.available_flow_gph,
                fuel_pressure_psi: state.pressure_psi,
                selector: state.selector,
            }),
        ));
    }

    fn update_electrical(&mut self, dt: f64) {
        let starter_amps = if self.caches.engine_starter_engaged {
            self.config.engine.starter_current_draw
        } else {
            0.0
        };
        self.electrical
            .update(dt, self.caches.engine_rpm, starter_amps);

        let state = self.electrical.state();
        self.bus.publish(Message::new(
            "electrical",
            MessagePriority::Normal,
            Payload::ElectricalState(ElectricalStateMsg {
                battery_voltage: state.battery_voltage,
                battery_charge_ah: state.battery_charge_ah,
                bus_voltage: state.bus_voltage,
                alternator_online: state.alternator_online,
                alternator_current_amps: state.alternator_current_amps,
                total_load_amps: state.total_load_amps,
            }),
        ));
    }

    fn update_engine(&mut self, dt: f64) {
        let electrical_available = self.caches.bus_voltage >= self.config.engine.starter_min_voltage;
        self.engine.update(
            dt,
            &self.engine_controls,
            electrical_available,
            self.caches.fuel_available_gph,
        );

        let state = self.engine.state();
        self.bus.publish(Message::new(
            "engine",
            MessagePriority::Normal,
            Payload::EngineState(EngineStateMsg {
                running: state.running,
                rpm: state.rpm,
                power_hp: state.power_hp,
                fuel_flow_gph: state.fuel_flow_gph,
                manifold_pressure_inhg: state.manifold_pressure_inhg,
                oil_pressure_psi: state.oil_pressure_psi,
                oil_temperature_c: state.oil_temperature_c,
                cylinder_head_temp_c: state.cylinder_head_temp_c,
                starter_engaged: state.starter_engaged,
                warnings: state.warnings,
                failures: state.failures,
            }),
        ));
    }

    fn update_flight(&mut self, dt: f64) -> Result<(), SimError> {
        let engine_output = if self.caches.engine_running {
            Some(EngineOutput {
                power_hp: self.caches.engine_power_hp,
                rpm: self.caches.engine_rpm,
            })
        } else {
            None
        };
        self.flight.set_engine_output(engine_output);
        self.flight
            .set_terrain_elevation(self.caches.terrain_elevation);

        let state = self.flight.update(dt, &self.controls)?;

        self.bus.publish(Message::new(
            "flight",
            MessagePriority::High,
            Payload::PositionUpdated(PositionUpdatedMsg {
                position: state.position,
                velocity: state.velocity,
                acceleration: state.acceleration,
                rotation: state.rotation,
                angular_velocity: state.angular_velocity,
                airspeed: state.airspeed(),
                groundspeed: state.groundspeed(),
                mass: state.mass,
                fuel: state.fuel,
                on_ground: state.on_ground,
            }),
        ));
        Ok(())
    }

    fn update_collision_and_ground(&mut self) {
        let state = self.flight.state().clone();

        let elevation = self.terrain.elevation_at(state.position.x, state.position.z);
        self.bus.publish(Message::new(
            "terrain",
            MessagePriority::Normal,
            Payload::TerrainUpdated(TerrainUpdatedMsg { elevation }),
        ));

        let result = self.collision.check_ground_collision(&state, elevation);
        if result.collided && !self.in_ground_contact {
            let severity = if result.safe_landing {
                CollisionSeverity::Landing
            } else {
                CollisionSeverity::Impact
            };
            info!(?severity, "ground contact");
            self.bus.publish(Message::new(
                "collision",
                MessagePriority::Critical,
                Payload::CollisionDetected(CollisionDetectedMsg {
                    kind: CollisionKind::Ground,
                    severity,
                    position: state.position,
                    contact_normal: result.contact_normal,
                    terrain_elevation: elevation,
                    agl_altitude: state.position.y - elevation,
                }),
            ));
        }
        self.in_ground_contact = result.collided;

        if state.on_ground {
            let contact = GroundContact {
                on_ground: true,
                gear_compression: 1.0,
                surface: self.config.ground.surface,
            };
            let forces = self.ground.calculate_ground_forces(
                &contact,
                self.controls.yaw,
                self.controls.brakes,
                state.velocity,
                state.mass,
            );
            let acceleration = forces.total() / state.mass;
            self.flight.apply_ground_acceleration(acceleration);
        } else {
            self.flight.apply_ground_acceleration(Vector3::zeros());
        }
    }

    fn update_autopilot(&mut self, dt: f64) {
        if let Some(controls) = self.autopilot.update(dt) {
            self.bus.publish(Message::new(
                "autopilot",
                MessagePriority::High,
                Payload::ControlInput(controls),
            ));
        }
    }
}
