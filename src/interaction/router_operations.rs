/// Held Object Router Operations
///
/// Grab start and end as reported by the XR layer. Grabbing always wins over
/// a slot's lock; letting go hands the prop to the nearest eligible slot or
/// back to the world.
use super::router_data::{RouterData, RouterMetrics};
use crate::docking::{release, slot_world_pose, try_capture, ReleaseMode, SlotId};
use crate::error::{SimError, SimResult};
use crate::events::{publish_event, EventBusData, SimEvent};
use crate::physics::{
    advance_release_checks, reconcile, schedule_release_check, set_held, OwnershipState, Pose,
};
use crate::props::{get_prop, get_prop_mut, PropId};
use crate::scene_buffers::SceneBuffers;
use crate::spatial::{nearest_within, slots_of_kind};

pub fn create_router(auto_capture_on_release: bool, release_check_delay: f32) -> RouterData {
    RouterData {
        auto_capture_on_release,
        release_check_delay,
        pending_checks: Vec::new(),
        metrics: RouterMetrics::default(),
    }
}

fn unknown_prop(prop: PropId) -> SimError {
    SimError::UnknownProp { id: prop.0 }
}

// ============================================================================
// GRAB LIFECYCLE
// ============================================================================

/// The user took hold of a prop. A docked prop is pulled out of its slot even
/// when the slot is locked; tags are left as they are.
/// `actor_pose` is where the grab layer holds the prop, if it reports one.
pub fn on_grab_start(
    router: &mut RouterData,
    scene: &mut SceneBuffers,
    events: &mut EventBusData,
    prop_id: PropId,
    actor_pose: Option<Pose>,
) -> SimResult<()> {
    let ownership = get_prop(&scene.props, prop_id)
        .ok_or_else(|| unknown_prop(prop_id))?
        .ownership;

    match ownership {
        OwnershipState::Held => {
            log::debug!("[HeldObjectRouter::on_grab_start] prop {} already held", prop_id.0);
            return Ok(());
        }
        OwnershipState::Docked(slot) => {
            release(
                &mut scene.slots,
                &mut scene.props,
                slot,
                true,
                ReleaseMode::ToUser,
                events,
            )?;
            router.metrics.undocked_by_grab += 1;
        }
        OwnershipState::Free => {
            if let Some(prop) = get_prop_mut(&mut scene.props, prop_id) {
                prop.ownership = OwnershipState::Held;
                set_held(&mut prop.body);
            }
        }
    }

    router.pending_checks.retain(|check| check.prop != prop_id);
    if let Some(prop) = get_prop_mut(&mut scene.props, prop_id) {
        prop.active = true;
        if let Some(pose) = actor_pose {
            prop.body.pose = pose;
        }
        log::info!("[HeldObjectRouter::on_grab_start] {} picked up", prop.name);
    }

    router.metrics.grabs_started += 1;
    publish_event(events, SimEvent::GrabStarted { prop: prop_id });
    Ok(())
}

/// The user let go. Body flags are left to the throw; the delayed release
/// check puts them right if nothing else does. Returns the slot the prop
/// snapped into, if any.
pub fn on_grab_end(
    router: &mut RouterData,
    scene: &mut SceneBuffers,
    events: &mut EventBusData,
    prop_id: PropId,
) -> SimResult<Option<SlotId>> {
    let prop = get_prop_mut(&mut scene.props, prop_id).ok_or_else(|| unknown_prop(prop_id))?;
    if prop.ownership != OwnershipState::Held {
        log::warn!(
            "[HeldObjectRouter::on_grab_end] {} was not held ({:?}), ignoring",
            prop.name,
            prop.ownership
        );
        return Ok(None);
    }
    prop.ownership = OwnershipState::Free;

    router.metrics.grabs_ended += 1;
    publish_event(events, SimEvent::GrabEnded { prop: prop_id });

    if router.auto_capture_on_release {
        if let Some(slot) = find_nearest_slot(scene, prop_id) {
            match try_capture(&mut scene.slots, &mut scene.props, slot, prop_id, events) {
                Ok(()) => {
                    router.metrics.auto_captures += 1;
                    return Ok(Some(slot));
                }
                Err(err) => {
                    log::debug!(
                        "[HeldObjectRouter::on_grab_end] auto-capture into slot {} failed: {}",
                        slot.0,
                        err
                    );
                }
            }
        }
    }

    schedule_release_check(&mut router.pending_checks, prop_id, router.release_check_delay);
    Ok(None)
}

/// Nearest active, empty slot accepting this prop, strictly inside the prop's
/// snap search radius. Ties go to the slot registered first.
pub fn find_nearest_slot(scene: &SceneBuffers, prop_id: PropId) -> Option<SlotId> {
    let prop = get_prop(&scene.props, prop_id)?;

    let candidates = slots_of_kind(&scene.index, prop.kind)
        .iter()
        .filter_map(|id| scene.slots.slots.get(id.0 as usize))
        .filter(|slot| slot.active && slot.occupant.is_none() && slot.parent != Some(prop_id))
        .map(|slot| (slot.id, slot_world_pose(slot, &scene.props).position));

    nearest_within(prop.body.pose.position, candidates, prop.snap_search_radius)
        .map(|(slot, _)| slot)
}

/// Pose report for a prop in hand or loose in the world. Docked props follow
/// their slot and ignore it.
pub fn update_held_pose(scene: &mut SceneBuffers, prop_id: PropId, pose: Pose) -> SimResult<bool> {
    let prop = get_prop_mut(&mut scene.props, prop_id).ok_or_else(|| unknown_prop(prop_id))?;
    if matches!(prop.ownership, OwnershipState::Docked(_)) {
        return Ok(false);
    }
    prop.body.pose = pose;
    Ok(true)
}

/// Put a prop into a specific slot regardless of where it is now.
/// The prop is taken from its current owner and moved onto the slot first.
pub fn force_capture(
    router: &mut RouterData,
    scene: &mut SceneBuffers,
    events: &mut EventBusData,
    prop_id: PropId,
    slot_id: SlotId,
) -> SimResult<()> {
    let target_pose = scene
        .slots
        .slots
        .get(slot_id.0 as usize)
        .map(|slot| slot_world_pose(slot, &scene.props))
        .ok_or(SimError::UnknownSlot { id: slot_id.0 })?;

    let ownership = get_prop(&scene.props, prop_id)
        .ok_or_else(|| unknown_prop(prop_id))?
        .ownership;

    match ownership {
        OwnershipState::Docked(current) if current == slot_id => return Ok(()),
        OwnershipState::Docked(current) => {
            release(
                &mut scene.slots,
                &mut scene.props,
                current,
                true,
                ReleaseMode::ToWorld,
                events,
            )?;
        }
        OwnershipState::Held => {
            if let Some(prop) = get_prop_mut(&mut scene.props, prop_id) {
                prop.ownership = OwnershipState::Free;
            }
            publish_event(events, SimEvent::GrabEnded { prop: prop_id });
        }
        OwnershipState::Free => {}
    }

    if let Some(prop) = get_prop_mut(&mut scene.props, prop_id) {
        prop.body.pose = target_pose;
    }
    router.pending_checks.retain(|check| check.prop != prop_id);
    try_capture(&mut scene.slots, &mut scene.props, slot_id, prop_id, events)?;
    Ok(())
}

// ============================================================================
// DELAYED RELEASE CHECKS
// ============================================================================

/// Count down release checks and reconcile props whose check is due
pub fn tick_release_checks(
    router: &mut RouterData,
    scene: &mut SceneBuffers,
    events: &mut EventBusData,
    dt: f32,
) -> usize {
    let mut healed = 0;
    for prop_id in advance_release_checks(&mut router.pending_checks, dt) {
        if let Some(prop) = get_prop_mut(&mut scene.props, prop_id) {
            if reconcile(prop) {
                healed += 1;
                publish_event(events, SimEvent::PhysicsHealed { prop: prop_id });
            }
        }
    }
    healed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::{get_slot, lock_slot, SlotSpec};
    use crate::events::{create_event_bus, take_pending};
    use crate::physics::ownership_operations::body_flags;
    use crate::physics::pose::pose_at;
    use crate::physics::BodyFlags;
    use crate::props::{PropKind, PropSpec};
    use crate::scene_buffers::{create_scene_buffers, install_slot, spawn_prop};

    fn slot_spec(label: &str, kind: PropKind, x: f32) -> SlotSpec {
        SlotSpec {
            label: label.to_string(),
            accepts: kind,
            pose: pose_at(x, 1.0, 0.0),
            parent: None,
            capture_radius: 0.15,
        }
    }

    #[test]
    fn test_grab_pulls_prop_from_locked_slot() {
        let mut scene = create_scene_buffers();
        let mut events = create_event_bus(64);
        let mut router = create_router(true, 0.3);
        let slot = install_slot(&mut scene, slot_spec("grinder", PropKind::Filter, 0.0));
        let filter = spawn_prop(&mut scene, PropSpec::new("filter", PropKind::Filter, pose_at(0.0, 1.0, 0.0)));

        try_capture(&mut scene.slots, &mut scene.props, slot, filter, &mut events).expect("capture");
        lock_slot(&mut scene.slots, slot).expect("lock");

        on_grab_start(&mut router, &mut scene, &mut events, filter, None).expect("grab");
        let prop = get_prop(&scene.props, filter).expect("filter");
        assert_eq!(prop.ownership, OwnershipState::Held);
        assert!(get_slot(&scene.slots, slot).expect("slot").occupant.is_none());
        assert_eq!(router.metrics.undocked_by_grab, 1);
    }

    #[test]
    fn test_release_snaps_to_nearest_slot() {
        let mut scene = create_scene_buffers();
        let mut events = create_event_bus(64);
        let mut router = create_router(true, 0.3);
        let far = install_slot(&mut scene, slot_spec("far", PropKind::Cup, 0.15));
        let near = install_slot(&mut scene, slot_spec("near", PropKind::Cup, 0.05));
        let cup = spawn_prop(&mut scene, PropSpec::new("cup", PropKind::Cup, pose_at(2.0, 1.0, 0.0)));

        on_grab_start(&mut router, &mut scene, &mut events, cup, None).expect("grab");
        update_held_pose(&mut scene, cup, pose_at(0.0, 1.0, 0.0)).expect("pose");
        let docked = on_grab_end(&mut router, &mut scene, &mut events, cup).expect("release");

        assert_eq!(docked, Some(near));
        assert_ne!(docked, Some(far));
        assert_eq!(
            get_prop(&scene.props, cup).expect("cup").ownership,
            OwnershipState::Docked(near)
        );
        assert!(router.pending_checks.is_empty());
    }

    #[test]
    fn test_equidistant_slots_prefer_first_registered() {
        let mut scene = create_scene_buffers();
        let mut events = create_event_bus(64);
        let mut router = create_router(true, 0.3);
        let first = install_slot(&mut scene, slot_spec("left", PropKind::Cup, -0.1));
        install_slot(&mut scene, slot_spec("right", PropKind::Cup, 0.1));
        let cup = spawn_prop(&mut scene, PropSpec::new("cup", PropKind::Cup, pose_at(0.0, 1.0, 0.0)));

        on_grab_start(&mut router, &mut scene, &mut events, cup, None).expect("grab");
        assert_eq!(find_nearest_slot(&scene, cup), Some(first));
        assert_eq!(
            on_grab_end(&mut router, &mut scene, &mut events, cup).expect("release"),
            Some(first)
        );
    }

    #[test]
    fn test_search_radius_is_exclusive() {
        let mut scene = create_scene_buffers();
        let mut events = create_event_bus(64);
        let mut router = create_router(true, 0.3);
        install_slot(&mut scene, slot_spec("far", PropKind::Cup, 0.5));
        let cup = spawn_prop(&mut scene, PropSpec::new("cup", PropKind::Cup, pose_at(0.0, 1.0, 0.0)));

        on_grab_start(&mut router, &mut scene, &mut events, cup, None).expect("grab");
        assert!(find_nearest_slot(&scene, cup).is_none());
        assert_eq!(
            on_grab_end(&mut router, &mut scene, &mut events, cup).expect("release"),
            None
        );
        assert_eq!(router.pending_checks.len(), 1);
    }

    #[test]
    fn test_release_without_slot_stays_free_and_heals() {
        let mut scene = create_scene_buffers();
        let mut events = create_event_bus(64);
        let mut router = create_router(true, 0.3);
        let cup = spawn_prop(&mut scene, PropSpec::new("cup", PropKind::Cup, pose_at(0.0, 1.0, 0.0)));

        on_grab_start(&mut router, &mut scene, &mut events, cup, Some(pose_at(0.0, 1.4, 0.0)))
            .expect("grab");
        if let Some(prop) = get_prop_mut(&mut scene.props, cup) {
            prop.body.is_kinematic = true;
        }
        assert_eq!(
            on_grab_end(&mut router, &mut scene, &mut events, cup).expect("release"),
            None
        );
        assert_eq!(get_prop(&scene.props, cup).expect("cup").ownership, OwnershipState::Free);

        assert_eq!(tick_release_checks(&mut router, &mut scene, &mut events, 0.2), 0);
        assert_eq!(tick_release_checks(&mut router, &mut scene, &mut events, 0.2), 1);
        assert_eq!(body_flags(&get_prop(&scene.props, cup).expect("cup").body), BodyFlags::DYNAMIC);
        assert!(take_pending(&mut events).contains(&SimEvent::PhysicsHealed { prop: cup }));
    }

    #[test]
    fn test_docked_prop_ignores_pose_updates() {
        let mut scene = create_scene_buffers();
        let mut events = create_event_bus(64);
        let slot = install_slot(&mut scene, slot_spec("cup slot", PropKind::Cup, 0.0));
        let cup = spawn_prop(&mut scene, PropSpec::new("cup", PropKind::Cup, pose_at(0.0, 1.0, 0.0)));
        try_capture(&mut scene.slots, &mut scene.props, slot, cup, &mut events).expect("capture");

        assert_eq!(update_held_pose(&mut scene, cup, pose_at(3.0, 0.0, 0.0)).ok(), Some(false));
        assert_eq!(get_prop(&scene.props, cup).expect("cup").body.pose.position.x, 0.0);
    }

    #[test]
    fn test_force_capture_moves_between_slots() {
        let mut scene = create_scene_buffers();
        let mut events = create_event_bus(64);
        let mut router = create_router(true, 0.3);
        let a = install_slot(&mut scene, slot_spec("a", PropKind::Cup, 0.0));
        let b = install_slot(&mut scene, slot_spec("b", PropKind::Cup, 3.0));
        let cup = spawn_prop(&mut scene, PropSpec::new("cup", PropKind::Cup, pose_at(0.0, 1.0, 0.0)));
        try_capture(&mut scene.slots, &mut scene.props, a, cup, &mut events).expect("capture");

        force_capture(&mut router, &mut scene, &mut events, cup, b).expect("force");
        assert_eq!(get_prop(&scene.props, cup).expect("cup").ownership, OwnershipState::Docked(b));
        assert!(get_slot(&scene.slots, a).expect("slot a").occupant.is_none());
    }
}
