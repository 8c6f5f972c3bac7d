//! Physics Module - ownership of rigid bodies
//!
//! The physics engine itself is external. This module owns the contract
//! between a prop's logical owner and its body flags.

pub mod body_data;
pub mod ownership_data;
pub mod ownership_operations;
pub mod pose;

pub use body_data::{BodyFlags, RigidBodyData};
pub use ownership_data::{DriftReport, OwnershipState, PendingReleaseCheck, ReconcileTimerData};
pub use pose::Pose;

// Re-export DOP operations
pub use ownership_operations::{
    advance_release_checks, body_flags, create_reconcile_timer, drift_of, reconcile,
    reconcile_props, schedule_release_check, set_docked, set_free, set_held, tick_reconcile,
};
pub use pose::{compose_pose, pose_at, tilt_degrees, tilted_pose, transform_point};
