/// Ownership Operations
///
/// Pure functions that keep body flags in line with the logical owner.
/// Docked bodies are pinned; free and released bodies fall under gravity.
use cgmath::Vector3;

use super::body_data::{BodyFlags, RigidBodyData};
use super::ownership_data::{
    DriftReport, OwnershipState, PendingReleaseCheck, ReconcileTimerData,
};
use super::pose::Pose;
use crate::events::{publish_event, EventBusData, SimEvent};
use crate::props::{PropData, PropId, PropTable};

// ============================================================================
// BODY FLAG TRANSITIONS
// ============================================================================

fn zero_velocities(body: &mut RigidBodyData) {
    body.linear_velocity = Vector3::new(0.0, 0.0, 0.0);
    body.angular_velocity = Vector3::new(0.0, 0.0, 0.0);
}

/// Pin a body to a slot pose
/// Pure function - gravity off, kinematic on, velocities zeroed, pose snapped
pub fn set_docked(body: &mut RigidBodyData, slot_pose: Pose) {
    body.use_gravity = false;
    body.is_kinematic = true;
    zero_velocities(body);
    body.pose = slot_pose;
}

/// Return a body to free simulation
/// Pure function - gravity on, kinematic off, velocities zeroed
pub fn set_free(body: &mut RigidBodyData) {
    body.use_gravity = true;
    body.is_kinematic = false;
    zero_velocities(body);
}

/// Hand a body to the user
/// Pure function - same flags as free; the grab layer drives the pose from here
pub fn set_held(body: &mut RigidBodyData) {
    body.use_gravity = true;
    body.is_kinematic = false;
    zero_velocities(body);
}

/// Current ownership-relevant flags of a body
pub fn body_flags(body: &RigidBodyData) -> BodyFlags {
    BodyFlags {
        is_kinematic: body.is_kinematic,
        use_gravity: body.use_gravity,
    }
}

/// Flags an owner demands, if it demands any
/// Held bodies are driven by the grab layer and are not enforced
pub fn expected_flags(ownership: OwnershipState) -> Option<BodyFlags> {
    match ownership {
        OwnershipState::Free => Some(BodyFlags::DYNAMIC),
        OwnershipState::Docked(_) => Some(BodyFlags::DOCKED),
        OwnershipState::Held => None,
    }
}

/// Report a mismatch between body flags and the owner's contract
pub fn drift_of(body: &RigidBodyData, ownership: OwnershipState) -> Option<DriftReport> {
    let expected = expected_flags(ownership)?;
    let actual = body_flags(body);
    if expected == actual {
        None
    } else {
        Some(DriftReport { expected, actual })
    }
}

// ============================================================================
// RECONCILIATION
// ============================================================================

/// Force a free prop's body back to the free contract
/// Idempotent - returns true only when something had drifted
pub fn reconcile(prop: &mut PropData) -> bool {
    if prop.ownership != OwnershipState::Free {
        return false;
    }

    match drift_of(&prop.body, prop.ownership) {
        Some(report) => {
            log::warn!(
                "[PhysicsOwnership::reconcile] {} drifted (kinematic={}, gravity={}), restoring free physics",
                prop.name,
                report.actual.is_kinematic,
                report.actual.use_gravity
            );
            set_free(&mut prop.body);
            true
        }
        None => false,
    }
}

/// Reconcile every prop in the table, publishing a heal event per fix
pub fn reconcile_props(props: &mut PropTable, events: &mut EventBusData) -> usize {
    let mut healed = 0;
    for prop in props.props.iter_mut() {
        if reconcile(prop) {
            healed += 1;
            publish_event(events, SimEvent::PhysicsHealed { prop: prop.id });
        }
    }
    healed
}

/// Create a reconcile timer with the given interval in seconds
pub fn create_reconcile_timer(interval: f32) -> ReconcileTimerData {
    ReconcileTimerData {
        interval,
        accumulated: 0.0,
        passes_run: 0,
        bodies_healed: 0,
    }
}

/// Accumulate frame time; true when a reconcile pass is due
pub fn advance_reconcile_timer(timer: &mut ReconcileTimerData, dt: f32) -> bool {
    timer.accumulated += dt.max(0.0);
    if timer.accumulated >= timer.interval {
        timer.accumulated = 0.0;
        timer.passes_run += 1;
        true
    } else {
        false
    }
}

/// Run the periodic pass if due. Returns the number of bodies healed.
pub fn tick_reconcile(
    timer: &mut ReconcileTimerData,
    dt: f32,
    props: &mut PropTable,
    events: &mut EventBusData,
) -> usize {
    if !advance_reconcile_timer(timer, dt) {
        return 0;
    }
    let healed = reconcile_props(props, events);
    timer.bodies_healed += healed as u64;
    healed
}

// ============================================================================
// DELAYED RELEASE CHECKS
// ============================================================================

/// Queue a physics check for a just-released prop, replacing any earlier one
pub fn schedule_release_check(pending: &mut Vec<PendingReleaseCheck>, prop: PropId, delay: f32) {
    pending.retain(|check| check.prop != prop);
    pending.push(PendingReleaseCheck {
        prop,
        remaining: delay,
    });
}

/// Count down pending checks; returns the props whose check is due now
pub fn advance_release_checks(pending: &mut Vec<PendingReleaseCheck>, dt: f32) -> Vec<PropId> {
    let mut due = Vec::new();
    pending.retain_mut(|check| {
        check.remaining -= dt;
        if check.remaining <= 0.0 {
            due.push(check.prop);
            false
        } else {
            true
        }
    });
    due
}
