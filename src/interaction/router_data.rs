/// Held Object Router Data
///
/// Pure DOP - NO METHODS. Just data.
/// Routing state between the grab layer and the docking slots.
use crate::physics::PendingReleaseCheck;

/// Router state
#[derive(Debug, Clone)]
pub struct RouterData {
    /// Dock a released prop into the nearest eligible slot
    pub auto_capture_on_release: bool,

    /// Seconds between letting go of a prop and its first physics check
    pub release_check_delay: f32,

    pub pending_checks: Vec<PendingReleaseCheck>,
    pub metrics: RouterMetrics,
}

#[derive(Debug, Clone, Default)]
pub struct RouterMetrics {
    pub grabs_started: u64,
    pub grabs_ended: u64,
    pub undocked_by_grab: u64,
    pub auto_captures: u64,
}
