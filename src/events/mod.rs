//! Events - the session-owned publish/subscribe bus

pub mod event_data;
pub mod event_operations;

pub use event_data::{AbortReason, EventBusData, EventBusMetrics, EventTopic, SimEvent};

// Re-export DOP operations
pub use event_operations::{
    clear_subscriptions, create_event_bus, drain_outbox, forward_to_outbox, publish_event,
    subscribe, subscribers_of, take_pending, topic_of, unsubscribe_all,
};
