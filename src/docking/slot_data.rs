/// Docking Slot Data Structures
///
/// Pure DOP - NO METHODS. Just data.
/// A place on a machine or prop that claims exclusive ownership of one prop.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::{OwnershipState, Pose};
use crate::props::{PropId, PropKind};

/// Slot identifier, dense index into the slot table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

/// A docking slot
#[derive(Debug, Clone)]
pub struct DockingSlotData {
    pub id: SlotId,
    pub label: String,
    pub accepts: PropKind,
    /// Pose in the parent's space, or world space when there is no parent
    pub local_pose: Pose,
    /// Prop this slot is mounted on; the slot moves with it
    pub parent: Option<PropId>,
    pub capture_radius: f32,
    pub active: bool,
    pub occupant: Option<PropId>,
    pub locked: bool,
    /// Last indicator state sent to the effect sink
    pub indicator_visible: Option<bool>,
}

/// Creation parameters for a slot
#[derive(Debug, Clone)]
pub struct SlotSpec {
    pub label: String,
    pub accepts: PropKind,
    pub pose: Pose,
    pub parent: Option<PropId>,
    pub capture_radius: f32,
}

/// All slots in the scene, indexed by `SlotId`
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    pub slots: Vec<DockingSlotData>,
}

/// Where a released prop goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Back to free physics
    ToWorld,
    /// Straight into the user's hand
    ToUser,
}

/// Result of one integrity pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub occupants_recovered: usize,
    pub bodies_healed: usize,
    pub stale_occupants_cleared: usize,
}

/// Why a capture was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("slot {} does not exist", .slot.0)]
    UnknownSlot { slot: SlotId },

    #[error("prop {} does not exist", .prop.0)]
    UnknownProp { prop: PropId },

    #[error("slot {} is inactive", .slot.0)]
    SlotInactive { slot: SlotId },

    #[error("slot {} is already occupied", .slot.0)]
    SlotOccupied { slot: SlotId },

    #[error("slot accepts {expected:?}, got {found:?}")]
    KindMismatch { expected: PropKind, found: PropKind },

    #[error("prop is {distance:.3}m away, capture radius is {radius:.3}m")]
    OutOfRange { distance: f32, radius: f32 },

    #[error("prop {} is already owned ({owner:?})", .prop.0)]
    OwnershipConflict { prop: PropId, owner: OwnershipState },
}

/// Why a release was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseError {
    #[error("slot {} does not exist", .slot.0)]
    UnknownSlot { slot: SlotId },

    #[error("slot {} is locked", .slot.0)]
    Locked { slot: SlotId },
}
