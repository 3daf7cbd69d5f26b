//! Synchronous priority message bus connecting the simulation subsystems.
//!
//! Publishing never delivers immediately: messages accumulate in the bus and
//! are drained by the simulation root at the start of the next tick, so every
//! subscriber sees state that is exactly one tick stale. Draining is ordered
//! by priority, and within a priority level messages come out in the order
//! they were published.

mod topics;

pub use topics::{
    AutopilotCommandMsg, CollisionDetectedMsg, CollisionKind, CollisionSeverity, ControlInputMsg,
    ElectricalCommandMsg, ElectricalStateMsg, EngineCommandMsg, EngineStateMsg, FuelCommandMsg,
    FuelStateMsg, Payload, PositionUpdatedMsg, RefuelRequest, TerrainUpdatedMsg, Topic,
};

use serde::{Deserialize, Serialize};

/// Delivery priority. `Critical` is reserved for collision and failure
/// notifications that must be handled before routine state traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessagePriority {
    Critical = 0,
    High = 1,
    Normal = 2,
    Low = 3,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Identifier of the publishing subsystem.
    pub sender: &'static str,
    pub priority: MessagePriority,
    pub payload: Payload,
}

impl Message {
    pub fn new(sender: &'static str, priority: MessagePriority, payload: Payload) -> Self {
        Self {
            sender,
            priority,
            payload,
        }
    }

    pub fn topic(&self) -> Topic {
        self.payload.topic()
    }
}

/// Priority-bucketed FIFO queue.
///
/// Four fixed buckets, one per priority level. `publish` appends to the
/// matching bucket; `drain` empties all buckets highest-priority-first,
/// preserving publish order within each bucket.
#[derive(Debug, Default)]
pub struct MessageBus {
    buckets: [Vec<Message>; 4],
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, message: Message) {
        self.buckets[message.priority as usize].push(message);
    }

    /// Remove and return all pending messages in delivery order.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.pending());
        for bucket in &mut self.buckets {
            out.append(bucket);
        }
        out
    }

    pub fn pending(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn terrain_msg(priority: MessagePriority, elevation: f64) -> Message {
        Message::new(
            "test",
            priority,
            Payload::TerrainUpdated(TerrainUpdatedMsg { elevation }),
        )
    }

    fn elevation_of(message: &Message) -> f64 {
        match message.payload {
            Payload::TerrainUpdated(m) => m.elevation,
            _ => panic!("unexpected payload"),
        }
    }

    #[test]
    fn drain_orders_by_priority() {
        let mut bus = MessageBus::new();
        bus.publish(terrain_msg(MessagePriority::Low, 1.0));
        bus.publish(terrain_msg(MessagePriority::Critical, 2.0));
        bus.publish(terrain_msg(MessagePriority::Normal, 3.0));
        bus.publish(terrain_msg(MessagePriority::High, 4.0));

        let order: Vec<f64> = bus.drain().iter().map(elevation_of).collect();
        assert_eq!(order, vec![2.0, 4.0, 3.0, 1.0]);
    }

    #[test]
    fn drain_preserves_fifo_within_priority() {
        let mut bus = MessageBus::new();
        for i in 0..5 {
            bus.publish(terrain_msg(MessagePriority::Normal, i as f64));
        }

        let order: Vec<f64> = bus.drain().iter().map(elevation_of).collect();
        assert_eq!(order, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn drain_empties_the_bus() {
        let mut bus = MessageBus::new();
        bus.publish(terrain_msg(MessagePriority::Normal, 0.0));
        assert_eq!(bus.pending(), 1);

        let _ = bus.drain();
        assert_eq!(bus.pending(), 0);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn message_reports_its_payload_topic() {
        let msg = terrain_msg(MessagePriority::Normal, 0.0);
        assert_eq!(msg.topic(), Topic::TerrainUpdated);
    }

    #[test]
    fn control_input_validation_rejects_out_of_range() {
        let bad = ControlInputMsg {
            throttle: 1.5,
            ..Default::default()
        };
        assert!(bad.validated().is_err());

        let good = ControlInputMsg {
            throttle: 0.75,
            pitch: -0.2,
            ..Default::default()
        };
        assert!(good.validated().is_ok());
    }
}
