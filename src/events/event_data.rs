//! Event Bus Data
//!
//! Typed simulation events plus the subscriber registry that routes slot
//! events to stage processors. Owned by the session; nothing global.
//!
//! Pure DOP: No methods, just data structures.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::docking::SlotId;
use crate::interaction::ZoneId;
use crate::process::{ProcessorId, StageKind};
use crate::props::{PropId, Tag};

/// Why a running stage lost its progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// An input slot's occupant left or was replaced
    InputChanged,
    /// The user grabbed the pitcher off the wand, or a held prop was let go
    InputLost,
    SceneReset,
}

/// Things that happen in the simulation
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A slot took ownership of a prop
    Captured { slot: SlotId, prop: PropId },

    /// A slot gave up its occupant
    Released {
        slot: SlotId,
        prop: PropId,
        to_user: bool,
    },

    GrabStarted { prop: PropId },
    GrabEnded { prop: PropId },

    StageStarted {
        stage: StageKind,
        processor: Option<ProcessorId>,
    },

    StageAborted {
        stage: StageKind,
        processor: Option<ProcessorId>,
        reason: AbortReason,
    },

    StageCompleted {
        stage: StageKind,
        processor: Option<ProcessorId>,
        target: PropId,
        tag: Tag,
    },

    /// A production tag was written
    TagChanged { prop: PropId, from: Tag, to: Tag },

    /// Body flags had drifted from the owner's contract and were restored
    PhysicsHealed { prop: PropId },

    /// A docked prop had been deactivated by something outside the simulation
    OccupantRecovered { slot: SlotId, prop: PropId },

    ZoneEntered { zone: ZoneId, prop: PropId },
    ZoneExited { zone: ZoneId, prop: PropId },

    SceneReset,
}

/// Subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Slot(SlotId),
}

/// Event bus metrics
#[derive(Debug, Clone, Default)]
pub struct EventBusMetrics {
    pub events_published: u64,
    pub events_delivered: u64,
    pub events_dropped: u64,
    pub peak_outbox_size: usize,
}

/// Event bus state
pub struct EventBusData {
    /// Ordered subscriber lists per topic
    pub subscriptions: FxHashMap<EventTopic, Vec<ProcessorId>>,

    /// Published but not yet dispatched
    pub pending: VecDeque<SimEvent>,

    /// Dispatched, waiting for the external consumer
    pub outbox: VecDeque<SimEvent>,

    pub max_outbox: usize,
    pub metrics: EventBusMetrics,
}
