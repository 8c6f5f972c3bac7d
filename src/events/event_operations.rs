//! Event Bus Operations
//!
//! Publish, subscribe and drain. Dispatch to processors lives in the session,
//! which owns both the bus and the processors.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::event_data::{EventBusData, EventBusMetrics, EventTopic, SimEvent};
use crate::process::ProcessorId;

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Create an event bus with a bounded outbox
pub fn create_event_bus(max_outbox: usize) -> EventBusData {
    EventBusData {
        subscriptions: FxHashMap::default(),
        pending: VecDeque::new(),
        outbox: VecDeque::new(),
        max_outbox,
        metrics: EventBusMetrics::default(),
    }
}

// ============================================================================
// SUBSCRIPTIONS
// ============================================================================

/// Subscribe a processor to a topic. Duplicate subscriptions are ignored.
pub fn subscribe(bus: &mut EventBusData, topic: EventTopic, processor: ProcessorId) {
    let subscribers = bus.subscriptions.entry(topic).or_default();
    if !subscribers.contains(&processor) {
        subscribers.push(processor);
    }
}

/// Remove a processor from every topic
pub fn unsubscribe_all(bus: &mut EventBusData, processor: ProcessorId) {
    for subscribers in bus.subscriptions.values_mut() {
        subscribers.retain(|id| *id != processor);
    }
    bus.subscriptions.retain(|_, subscribers| !subscribers.is_empty());
}

/// Drop every subscription
pub fn clear_subscriptions(bus: &mut EventBusData) {
    bus.subscriptions.clear();
}

/// Subscribers of a topic in subscription order
pub fn subscribers_of(bus: &EventBusData, topic: EventTopic) -> Vec<ProcessorId> {
    bus.subscriptions.get(&topic).cloned().unwrap_or_default()
}

/// Topic an event is routed on, if any
pub fn topic_of(event: &SimEvent) -> Option<EventTopic> {
    match event {
        SimEvent::Captured { slot, .. } | SimEvent::Released { slot, .. } => {
            Some(EventTopic::Slot(*slot))
        }
        _ => None,
    }
}

// ============================================================================
// PUBLISHING
// ============================================================================

/// Queue an event for dispatch this frame
pub fn publish_event(bus: &mut EventBusData, event: SimEvent) {
    log::debug!("[EventBus::publish] {:?}", event);
    bus.metrics.events_published += 1;
    bus.pending.push_back(event);
}

/// Take everything published so far, oldest first
pub fn take_pending(bus: &mut EventBusData) -> Vec<SimEvent> {
    bus.pending.drain(..).collect()
}

/// Hand a dispatched event to the external outbox
pub fn forward_to_outbox(bus: &mut EventBusData, event: SimEvent) {
    if bus.outbox.len() >= bus.max_outbox {
        bus.metrics.events_dropped += 1;
        log::warn!("[EventBus] Outbox full, dropping event: {:?}", event);
        return;
    }

    bus.outbox.push_back(event);
    bus.metrics.events_delivered += 1;
    if bus.outbox.len() > bus.metrics.peak_outbox_size {
        bus.metrics.peak_outbox_size = bus.outbox.len();
    }
}

/// Drain the outbox for the external consumer
pub fn drain_outbox(bus: &mut EventBusData) -> Vec<SimEvent> {
    bus.outbox.drain(..).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::SlotId;
    use crate::props::PropId;

    #[test]
    fn test_subscribe_keeps_order_and_dedups() {
        let mut bus = create_event_bus(8);
        let topic = EventTopic::Slot(SlotId(0));
        subscribe(&mut bus, topic, ProcessorId(2));
        subscribe(&mut bus, topic, ProcessorId(1));
        subscribe(&mut bus, topic, ProcessorId(2));

        assert_eq!(subscribers_of(&bus, topic), vec![ProcessorId(2), ProcessorId(1)]);
    }

    #[test]
    fn test_unsubscribe_all_tears_down() {
        let mut bus = create_event_bus(8);
        subscribe(&mut bus, EventTopic::Slot(SlotId(0)), ProcessorId(1));
        subscribe(&mut bus, EventTopic::Slot(SlotId(1)), ProcessorId(1));
        subscribe(&mut bus, EventTopic::Slot(SlotId(1)), ProcessorId(2));

        unsubscribe_all(&mut bus, ProcessorId(1));
        assert!(subscribers_of(&bus, EventTopic::Slot(SlotId(0))).is_empty());
        assert_eq!(subscribers_of(&bus, EventTopic::Slot(SlotId(1))), vec![ProcessorId(2)]);

        clear_subscriptions(&mut bus);
        assert!(bus.subscriptions.is_empty());
    }

    #[test]
    fn test_topic_routing() {
        let captured = SimEvent::Captured {
            slot: SlotId(4),
            prop: PropId(0),
        };
        assert_eq!(topic_of(&captured), Some(EventTopic::Slot(SlotId(4))));
        assert_eq!(topic_of(&SimEvent::GrabStarted { prop: PropId(0) }), None);
    }

    #[test]
    fn test_outbox_drops_when_full() {
        let mut bus = create_event_bus(2);
        for i in 0..3 {
            forward_to_outbox(&mut bus, SimEvent::GrabStarted { prop: PropId(i) });
        }
        assert_eq!(bus.metrics.events_dropped, 1);

        let drained = drain_outbox(&mut bus);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], SimEvent::GrabStarted { prop: PropId(0) });
        assert!(bus.outbox.is_empty());
    }

    #[test]
    fn test_publish_then_take() {
        let mut bus = create_event_bus(8);
        publish_event(&mut bus, SimEvent::SceneReset);
        assert_eq!(take_pending(&mut bus), vec![SimEvent::SceneReset]);
        assert!(take_pending(&mut bus).is_empty());
        assert_eq!(bus.metrics.events_published, 1);
    }
}
