/// Ownership Data Structures
///
/// Pure DOP - NO METHODS. Just data.
/// Who owns a prop and what its body flags should say about it.
use serde::{Deserialize, Serialize};

use super::body_data::BodyFlags;
use crate::docking::SlotId;
use crate::props::PropId;

/// Logical owner of a prop. A prop is in exactly one of these at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnershipState {
    Free,
    Held,
    Docked(SlotId),
}

/// Expected versus actual body flags for a prop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftReport {
    pub expected: BodyFlags,
    pub actual: BodyFlags,
}

/// Periodic reconciliation timer
#[derive(Debug, Clone)]
pub struct ReconcileTimerData {
    pub interval: f32,
    pub accumulated: f32,
    pub passes_run: u64,
    pub bodies_healed: u64,
}

/// A released prop waiting for its first physics check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingReleaseCheck {
    pub prop: PropId,
    pub remaining: f32,
}
