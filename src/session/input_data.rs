//! Session Input Data - queued events from the XR layer
//!
//! Pure DOP: No methods, just data structures.

use cgmath::Point3;
use crossbeam_channel::{Receiver, Sender};

use crate::interaction::ZoneId;
use crate::physics::Pose;
use crate::process::ProcessorId;
use crate::props::PropId;

/// Something the user or a sensor did since the last tick
#[derive(Clone, Debug)]
pub enum InputEvent {
    /// Hand closed on a prop
    GrabStart {
        prop: PropId,
        actor_pose: Option<Pose>,
    },

    /// Hand opened
    GrabEnd { prop: PropId },

    /// Tracked pose of a prop in hand or loose in the world
    PoseUpdate { prop: PropId, pose: Pose },

    /// Proximity sensor reports
    EnterZone { zone: ZoneId, prop: PropId },
    StayInZone { zone: ZoneId, prop: PropId },
    ExitZone { zone: ZoneId, prop: PropId },

    /// Steam knob grabbed at a hand position
    KnobGrabStart { hand: Point3<f32> },

    /// Hand moved while holding the knob
    KnobHandMoved { hand: Point3<f32> },

    KnobGrabEnd,

    /// Absolute knob position in degrees
    KnobRotation { degrees: f32 },

    /// Start button for a manual stage
    RequestStart { processor: ProcessorId },

    /// Put the whole bar back to its initial state
    ResetScene,
}

/// Input queue metrics for monitoring
#[derive(Clone, Copy, Debug, Default)]
pub struct InputMetrics {
    /// Total inputs applied
    pub events_processed: u64,

    /// Inputs dropped (queue full)
    pub events_dropped: u64,

    /// Inputs the session refused (unknown ids, failed preconditions)
    pub events_rejected: u64,

    /// Peak queue length seen at a drain
    pub peak_queue_size: usize,
}

/// Bounded input channel owned by the session
pub struct InputQueueData {
    pub sender: Sender<InputEvent>,
    pub receiver: Receiver<InputEvent>,
    pub max_queue_size: usize,
    pub metrics: InputMetrics,
}
