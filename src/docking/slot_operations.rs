/// Docking Slot Operations
///
/// Capture, release, locking and the per-frame integrity pass.
/// A slot and its occupant always agree: the occupant's ownership is
/// `Docked(slot)` and its body is pinned to the slot pose.
use super::slot_data::{
    CaptureError, DockingSlotData, IntegrityReport, ReleaseError, ReleaseMode, SlotId, SlotSpec,
    SlotTable,
};
use crate::effects::{set_effect, EffectDispatcher, EffectId};
use crate::error::{SimError, SimResult};
use crate::events::{publish_event, EventBusData, SimEvent};
use crate::physics::pose::{compose_pose, pose_distance};
use crate::physics::{drift_of, set_docked, set_free, set_held, OwnershipState, Pose};
use crate::constants;
use crate::props::{get_prop, get_prop_mut, PropId, PropKind, PropTable};

impl SlotSpec {
    /// World-anchored slot with the default capture radius
    pub fn new(label: &str, accepts: PropKind, pose: Pose) -> Self {
        Self {
            label: label.to_string(),
            accepts,
            pose,
            parent: None,
            capture_radius: constants::docking::CAPTURE_RADIUS,
        }
    }
}

// ============================================================================
// TABLE
// ============================================================================

pub fn create_slot_table() -> SlotTable {
    SlotTable { slots: Vec::new() }
}

/// Register a slot. Slots start active, empty and unlocked.
pub fn add_slot(table: &mut SlotTable, spec: SlotSpec) -> SlotId {
    let id = SlotId(table.slots.len() as u32);
    log::debug!(
        "[DockingSlot::add_slot] {} accepts {:?} (radius {})",
        spec.label,
        spec.accepts,
        spec.capture_radius
    );
    table.slots.push(DockingSlotData {
        id,
        label: spec.label,
        accepts: spec.accepts,
        local_pose: spec.pose,
        parent: spec.parent,
        capture_radius: spec.capture_radius,
        active: true,
        occupant: None,
        locked: false,
        indicator_visible: None,
    });
    id
}

pub fn get_slot(table: &SlotTable, id: SlotId) -> Option<&DockingSlotData> {
    table.slots.get(id.0 as usize)
}

pub fn get_slot_mut(table: &mut SlotTable, id: SlotId) -> Option<&mut DockingSlotData> {
    table.slots.get_mut(id.0 as usize)
}

/// World pose of a slot, following its parent prop if it has one
pub fn slot_world_pose(slot: &DockingSlotData, props: &PropTable) -> Pose {
    match slot.parent.and_then(|parent| get_prop(props, parent)) {
        Some(parent) => compose_pose(&parent.body.pose, &slot.local_pose),
        None => slot.local_pose,
    }
}

/// Slot currently holding a prop
pub fn slot_of_prop(table: &SlotTable, prop: PropId) -> Option<SlotId> {
    table
        .slots
        .iter()
        .find(|slot| slot.occupant == Some(prop))
        .map(|slot| slot.id)
}

// ============================================================================
// CAPTURE / RELEASE
// ============================================================================

/// Check every capture rule without changing anything
pub fn check_capture(
    slots: &SlotTable,
    props: &PropTable,
    slot_id: SlotId,
    prop_id: PropId,
) -> Result<Pose, CaptureError> {
    let slot = get_slot(slots, slot_id).ok_or(CaptureError::UnknownSlot { slot: slot_id })?;
    let prop = get_prop(props, prop_id).ok_or(CaptureError::UnknownProp { prop: prop_id })?;

    if !slot.active {
        return Err(CaptureError::SlotInactive { slot: slot_id });
    }
    if slot.occupant.is_some() {
        return Err(CaptureError::SlotOccupied { slot: slot_id });
    }
    if prop.kind != slot.accepts {
        return Err(CaptureError::KindMismatch {
            expected: slot.accepts,
            found: prop.kind,
        });
    }

    let slot_pose = slot_world_pose(slot, props);
    let distance = pose_distance(&slot_pose, &prop.body.pose);
    if distance > slot.capture_radius {
        return Err(CaptureError::OutOfRange {
            distance,
            radius: slot.capture_radius,
        });
    }

    if prop.ownership != OwnershipState::Free {
        return Err(CaptureError::OwnershipConflict {
            prop: prop_id,
            owner: prop.ownership,
        });
    }

    Ok(slot_pose)
}

/// Dock a prop into a slot
pub fn try_capture(
    slots: &mut SlotTable,
    props: &mut PropTable,
    slot_id: SlotId,
    prop_id: PropId,
    events: &mut EventBusData,
) -> Result<(), CaptureError> {
    let slot_pose = match check_capture(slots, props, slot_id, prop_id) {
        Ok(pose) => pose,
        Err(err) => {
            log::debug!(
                "[DockingSlot::try_capture] Slot {} refused prop {}: {}",
                slot_id.0,
                prop_id.0,
                err
            );
            return Err(err);
        }
    };

    let slot = get_slot_mut(slots, slot_id).ok_or(CaptureError::UnknownSlot { slot: slot_id })?;
    let prop = get_prop_mut(props, prop_id).ok_or(CaptureError::UnknownProp { prop: prop_id })?;

    slot.occupant = Some(prop_id);
    prop.ownership = OwnershipState::Docked(slot_id);
    prop.active = true;
    set_docked(&mut prop.body, slot_pose);

    log::info!("[DockingSlot::try_capture] {} docked in {}", prop.name, slot.label);
    publish_event(
        events,
        SimEvent::Captured {
            slot: slot_id,
            prop: prop_id,
        },
    );
    Ok(())
}

/// Give up the occupant. `Ok(None)` when the slot was empty.
/// A locked slot refuses unless forced; forcing also clears the lock.
pub fn release(
    slots: &mut SlotTable,
    props: &mut PropTable,
    slot_id: SlotId,
    force: bool,
    mode: ReleaseMode,
    events: &mut EventBusData,
) -> Result<Option<PropId>, ReleaseError> {
    let slot = get_slot_mut(slots, slot_id).ok_or(ReleaseError::UnknownSlot { slot: slot_id })?;

    let Some(prop_id) = slot.occupant else {
        return Ok(None);
    };

    if slot.locked {
        if !force {
            log::warn!(
                "[DockingSlot::release] {} is locked, keeping its occupant",
                slot.label
            );
            return Err(ReleaseError::Locked { slot: slot_id });
        }
        slot.locked = false;
    }
    slot.occupant = None;

    if let Some(prop) = get_prop_mut(props, prop_id) {
        match mode {
            ReleaseMode::ToWorld => {
                prop.ownership = OwnershipState::Free;
                set_free(&mut prop.body);
            }
            ReleaseMode::ToUser => {
                prop.ownership = OwnershipState::Held;
                set_held(&mut prop.body);
            }
        }
        log::info!(
            "[DockingSlot::release] {} left {} ({:?})",
            prop.name,
            slot.label,
            mode
        );
    }

    publish_event(
        events,
        SimEvent::Released {
            slot: slot_id,
            prop: prop_id,
            to_user: mode == ReleaseMode::ToUser,
        },
    );
    Ok(Some(prop_id))
}

// ============================================================================
// LOCKING / ACTIVATION
// ============================================================================

pub fn lock_slot(slots: &mut SlotTable, slot_id: SlotId) -> SimResult<()> {
    let slot = get_slot_mut(slots, slot_id).ok_or(SimError::UnknownSlot { id: slot_id.0 })?;
    slot.locked = true;
    Ok(())
}

pub fn unlock_slot(slots: &mut SlotTable, slot_id: SlotId) -> SimResult<()> {
    let slot = get_slot_mut(slots, slot_id).ok_or(SimError::UnknownSlot { id: slot_id.0 })?;
    slot.locked = false;
    Ok(())
}

/// Enable or disable capturing into a slot. The current occupant is unaffected.
pub fn set_slot_active(slots: &mut SlotTable, slot_id: SlotId, active: bool) -> SimResult<()> {
    let slot = get_slot_mut(slots, slot_id).ok_or(SimError::UnknownSlot { id: slot_id.0 })?;
    slot.active = active;
    Ok(())
}

/// Empty every slot without touching the props (scene reset)
pub fn clear_all_slots(slots: &mut SlotTable) {
    for slot in slots.slots.iter_mut() {
        slot.occupant = None;
        slot.locked = false;
        slot.active = true;
        slot.indicator_visible = None;
    }
}

// ============================================================================
// INTEGRITY
// ============================================================================

/// Per-frame pass over every slot: keep occupants active, pinned and on the
/// slot pose, and keep the empty-slot indicator in sync.
pub fn check_integrity(
    slots: &mut SlotTable,
    props: &mut PropTable,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    for index in 0..slots.slots.len() {
        let slot_pose = slot_world_pose(&slots.slots[index], props);
        let slot = &mut slots.slots[index];

        if let Some(prop_id) = slot.occupant {
            match get_prop_mut(props, prop_id) {
                Some(prop) if prop.ownership == OwnershipState::Docked(slot.id) => {
                    if !prop.active {
                        log::error!(
                            "[DockingSlot::check_integrity] {} was deactivated while docked in {}, reactivating",
                            prop.name,
                            slot.label
                        );
                        prop.active = true;
                        report.occupants_recovered += 1;
                        publish_event(
                            events,
                            SimEvent::OccupantRecovered {
                                slot: slot.id,
                                prop: prop_id,
                            },
                        );
                    }

                    if drift_of(&prop.body, prop.ownership).is_some() {
                        log::warn!(
                            "[DockingSlot::check_integrity] {} lost its docked physics in {}, re-pinning",
                            prop.name,
                            slot.label
                        );
                        set_docked(&mut prop.body, slot_pose);
                        report.bodies_healed += 1;
                        publish_event(events, SimEvent::PhysicsHealed { prop: prop_id });
                    } else if prop.body.pose != slot_pose {
                        prop.body.pose = slot_pose;
                    }
                }
                _ => {
                    log::error!(
                        "[DockingSlot::check_integrity] {} lists prop {} which it does not own, clearing",
                        slot.label,
                        prop_id.0
                    );
                    slot.occupant = None;
                    slot.locked = false;
                    report.stale_occupants_cleared += 1;
                    publish_event(
                        events,
                        SimEvent::Released {
                            slot: slot.id,
                            prop: prop_id,
                            to_user: false,
                        },
                    );
                }
            }
        }

        let visible = slot.active && slot.occupant.is_none();
        if slot.indicator_visible != Some(visible) {
            slot.indicator_visible = Some(visible);
            set_effect(effects, EffectId::SlotIndicator(slot.id), visible);
        }
    }

    report
}
