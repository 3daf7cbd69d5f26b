//! Shared helpers for the integration suite.

use skylane::bus::{ElectricalCommandMsg, EngineCommandMsg, Message, MessagePriority, Payload};
use skylane::{SimConfig, Simulation};

pub const DT: f64 = 0.016;

pub fn cold_and_dark() -> Simulation {
    Simulation::new(SimConfig::default()).expect("default config must build")
}

/// Publish the cockpit setup for an engine start: master on, both magnetos,
/// full rich, cracked throttle, starter engaged.
pub fn publish_start_commands(sim: &mut Simulation) {
    sim.publish(Message::new(
        "test",
        MessagePriority::High,
        Payload::ElectricalCommand(ElectricalCommandMsg {
            battery_master: Some(true),
            ..Default::default()
        }),
    ));
    sim.publish(Message::new(
        "test",
        MessagePriority::High,
        Payload::EngineCommand(EngineCommandMsg {
            starter: Some(true),
            magneto_left: Some(true),
            magneto_right: Some(true),
            mixture: Some(1.0),
            throttle: Some(0.2),
        }),
    ));
}

/// Run the simulation until the engine reports running, returning the tick
/// count. Panics after `max_ticks`.
pub fn start_engine(sim: &mut Simulation, max_ticks: usize) -> usize {
    publish_start_commands(sim);
    for tick in 0..max_ticks {
        sim.tick(DT).expect("tick failed");
        if sim.engine_state().running {
            // Release the starter.
            sim.publish(Message::new(
                "test",
                MessagePriority::High,
                Payload::EngineCommand(EngineCommandMsg {
                    starter: Some(false),
                    ..Default::default()
                }),
            ));
            return tick;
        }
    }
    panic!("engine did not start within {max_ticks} ticks");
}
