//! Session Operations
//!
//! Every frame runs in the same order: ownership reconciliation, queued
//! inputs, slot integrity, event dispatch, stage timers, continuous stations,
//! and a final dispatch so the outbox holds everything that happened.

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use crossbeam_channel::Sender;
use parking_lot::RwLock;

use super::input_data::InputEvent;
use super::input_operations::{create_input_queue, drain_inputs, queue_input};
use super::session_data::{FrameInfo, Session, SharedSession, TickReport};
use crate::config::SimulationConfig;
use crate::constants::timing::MAX_DISPATCH_PASSES;
use crate::docking::{self, check_integrity, clear_all_slots, ReleaseMode, SlotId};
use crate::effects::{attach_sink, create_effect_dispatcher, reset_effects, EffectSink};
use crate::error::{OptionExt, SimError, SimResult};
use crate::events::{
    clear_subscriptions, create_event_bus, drain_outbox, forward_to_outbox, publish_event,
    subscribe, subscribers_of, take_pending, topic_of, AbortReason, EventTopic, SimEvent,
};
use crate::interaction::{
    clear_zones, create_router, enter_zone, exit_zone, on_grab_end, on_grab_start,
    tick_release_checks, update_held_pose, ZoneId,
};
use crate::physics::{create_reconcile_timer, tick_reconcile, OwnershipState, Pose};
use crate::process::{
    abort, begin_knob_turn, create_fill_stage, create_pour_stage, create_processor,
    create_steam_knob, create_texturizer, end_knob_turn, knob_intensity, on_slot_event,
    refresh_armed, request_start, reset_fill, reset_knob, reset_pour, reset_processor,
    reset_texturizer, set_knob_rotation, tick_fill, tick_pour, tick_processor, tick_texturizer,
    turn_knob_with_hand, update_steam_output, ProcessorId, StageSpec, SteamKnobData,
};
use crate::props::{self, reset_all, respawn_all, PropId, Tag};
use crate::scene_buffers::create_scene_buffers;

// ============================================================================
// CREATION
// ============================================================================

/// Create an empty session. The configuration is validated first.
pub fn create_session(config: SimulationConfig) -> SimResult<Session> {
    config.validate()?;

    let session = Session {
        scene: create_scene_buffers(),
        processors: Vec::new(),
        steam_knob: None,
        texturizers: Vec::new(),
        pours: Vec::new(),
        fills: Vec::new(),
        router: create_router(
            config.docking.auto_capture_on_release,
            config.timing.release_check_delay,
        ),
        events: create_event_bus(config.events.max_outbox),
        effects: create_effect_dispatcher(None),
        reconcile_timer: create_reconcile_timer(config.timing.reconcile_interval),
        input: create_input_queue(config.events.max_input_queue),
        frame: FrameInfo::default(),
        config,
    };

    log::info!("[Session::create] Session created");
    Ok(session)
}

/// Wrap a session for sharing with reader threads
pub fn create_shared_session(session: Session) -> SharedSession {
    Arc::new(RwLock::new(session))
}

/// Attach the presentation layer. Current effect state is replayed into it.
pub fn set_effect_sink(session: &mut Session, sink: Box<dyn EffectSink>) {
    attach_sink(&mut session.effects, sink);
}

/// Register a docked stage and subscribe it to its input slots
pub fn add_stage(session: &mut Session, spec: StageSpec) -> ProcessorId {
    let id = ProcessorId(session.processors.len() as u32);
    let processor = create_processor(id, spec);
    for input in &processor.inputs {
        subscribe(&mut session.events, EventTopic::Slot(input.slot), id);
    }
    log::info!(
        "[Session::add_stage] {} registered as processor {}",
        processor.label,
        id.0
    );
    session.processors.push(processor);
    id
}

/// Install the steam knob (once) and a texturizer watching `zone`.
/// Returns the texturizer index.
pub fn install_steam_station(
    session: &mut Session,
    zone: ZoneId,
    knob_center: Point3<f32>,
    knob_axis: Vector3<f32>,
) -> usize {
    if session.steam_knob.is_none() {
        session.steam_knob = Some(create_steam_knob(&session.config.steam, knob_center, knob_axis));
    }
    session
        .texturizers
        .push(create_texturizer(zone, &session.config.steam));
    session.texturizers.len() - 1
}

/// Install a pour station for a pitcher. Returns its index.
pub fn install_pour_station(session: &mut Session, pitcher: PropId) -> usize {
    session
        .pours
        .push(create_pour_stage(pitcher, &session.config.pour));
    session.pours.len() - 1
}

/// Install a fill station for a milk carton. Returns its index.
pub fn install_fill_station(session: &mut Session, carton: PropId) -> usize {
    session
        .fills
        .push(create_fill_stage(carton, &session.config.fill));
    session.fills.len() - 1
}

/// Tear down every subscription. Running stages are aborted first.
pub fn shutdown_session(session: &mut Session) {
    for processor in session.processors.iter_mut() {
        abort(
            processor,
            AbortReason::SceneReset,
            &mut session.scene,
            &mut session.effects,
            &mut session.events,
        );
    }
    clear_subscriptions(&mut session.events);
    log::info!("[Session::shutdown] Subscriptions cleared");
}

// ============================================================================
// FRAME
// ============================================================================

/// Advance the simulation by one frame
pub fn tick(session: &mut Session, dt: f32) -> TickReport {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, session.config.timing.max_frame_delta)
    } else {
        0.0
    };
    session.frame.frame_number += 1;
    session.frame.elapsed_time += f64::from(dt);
    session.frame.last_delta = dt;

    let mut report = TickReport::default();

    // 1. ownership reconciliation
    report.bodies_healed += tick_reconcile(
        &mut session.reconcile_timer,
        dt,
        &mut session.scene.props,
        &mut session.events,
    );
    report.bodies_healed += tick_release_checks(
        &mut session.router,
        &mut session.scene,
        &mut session.events,
        dt,
    );

    // 2. queued inputs
    for input in drain_inputs(&mut session.input) {
        match apply_input(session, input) {
            Ok(()) => {
                session.input.metrics.events_processed += 1;
                report.inputs_applied += 1;
            }
            Err(err) => {
                session.input.metrics.events_rejected += 1;
                log::warn!("[Session::tick] Input rejected: {}", err);
            }
        }
    }

    // 3. slot integrity
    let integrity = check_integrity(
        &mut session.scene.slots,
        &mut session.scene.props,
        &mut session.effects,
        &mut session.events,
    );
    report.bodies_healed += integrity.bodies_healed;
    report.occupants_recovered += integrity.occupants_recovered;

    // 4. capture and release events reach processors before timers run
    report.events_dispatched += dispatch_events(session);

    // 5. stage timers
    for processor in session.processors.iter_mut() {
        tick_processor(
            processor,
            dt,
            &mut session.scene,
            &mut session.effects,
            &mut session.events,
        );
        refresh_armed(processor, &session.scene, &mut session.effects);
    }

    // 6. continuous stations
    if let Some(knob) = session.steam_knob.as_mut() {
        update_steam_output(knob, &mut session.effects);
    }
    let intensity = session.steam_knob.as_ref().map(knob_intensity).unwrap_or(0.0);
    for texturizer in session.texturizers.iter_mut() {
        tick_texturizer(
            texturizer,
            intensity,
            dt,
            &mut session.scene,
            &mut session.effects,
            &mut session.events,
        );
    }
    for fill in session.fills.iter_mut() {
        tick_fill(
            fill,
            dt,
            &mut session.scene,
            &mut session.effects,
            &mut session.events,
        );
    }
    for pour in session.pours.iter_mut() {
        tick_pour(
            pour,
            dt,
            &mut session.scene,
            &mut session.effects,
            &mut session.events,
        );
    }

    // 7. everything left goes out
    report.events_dispatched += dispatch_events(session);

    report
}

/// Deliver pending events to subscribed processors and forward them to the
/// outbox. Events raised while handling are delivered in a later pass.
fn dispatch_events(session: &mut Session) -> usize {
    let mut dispatched = 0;

    for _ in 0..MAX_DISPATCH_PASSES {
        let batch = take_pending(&mut session.events);
        if batch.is_empty() {
            return dispatched;
        }

        for event in batch {
            if let Some(topic) = topic_of(&event) {
                for id in subscribers_of(&session.events, topic) {
                    if let Some(processor) = session.processors.get_mut(id.0 as usize) {
                        on_slot_event(
                            processor,
                            &event,
                            &mut session.scene,
                            &mut session.effects,
                            &mut session.events,
                        );
                    }
                }
            }
            forward_to_outbox(&mut session.events, event);
            dispatched += 1;
        }
    }

    if !session.events.pending.is_empty() {
        log::warn!(
            "[Session::dispatch_events] {} events still pending after {} passes, deferring to next tick",
            session.events.pending.len(),
            MAX_DISPATCH_PASSES
        );
    }
    dispatched
}

fn apply_input(session: &mut Session, input: InputEvent) -> SimResult<()> {
    log::debug!("[Session::apply_input] {:?}", input);
    match input {
        InputEvent::GrabStart { prop, actor_pose } => grab_start(session, prop, actor_pose),
        InputEvent::GrabEnd { prop } => grab_end(session, prop).map(|_| ()),
        InputEvent::PoseUpdate { prop, pose } => update_pose(session, prop, pose).map(|_| ()),
        InputEvent::EnterZone { zone, prop } | InputEvent::StayInZone { zone, prop } => {
            zone_enter(session, zone, prop)
        }
        InputEvent::ExitZone { zone, prop } => zone_exit(session, zone, prop),
        InputEvent::KnobGrabStart { hand } => grab_knob(session, hand),
        InputEvent::KnobHandMoved { hand } => move_knob_hand(session, hand).map(|_| ()),
        InputEvent::KnobGrabEnd => release_knob(session),
        InputEvent::KnobRotation { degrees } => set_knob(session, degrees),
        InputEvent::RequestStart { processor } => request_stage_start(session, processor),
        InputEvent::ResetScene => {
            reset_scene(session);
            Ok(())
        }
    }
}

// ============================================================================
// INPUT QUEUE
// ============================================================================

/// Queue an input for the next tick. False when the queue dropped it.
pub fn queue(session: &mut Session, event: InputEvent) -> bool {
    queue_input(&mut session.input, event)
}

/// Sender for producers on other threads
pub fn input_sender(session: &Session) -> Sender<InputEvent> {
    session.input.sender.clone()
}

// ============================================================================
// GRAB / POSE / ZONES
// ============================================================================

pub fn grab_start(session: &mut Session, prop: PropId, actor_pose: Option<Pose>) -> SimResult<()> {
    on_grab_start(
        &mut session.router,
        &mut session.scene,
        &mut session.events,
        prop,
        actor_pose,
    )
}

/// Returns the slot the prop snapped into, if any
pub fn grab_end(session: &mut Session, prop: PropId) -> SimResult<Option<SlotId>> {
    on_grab_end(&mut session.router, &mut session.scene, &mut session.events, prop)
}

/// False when the prop is docked and the pose was ignored
pub fn update_pose(session: &mut Session, prop: PropId, pose: Pose) -> SimResult<bool> {
    update_held_pose(&mut session.scene, prop, pose)
}

pub fn zone_enter(session: &mut Session, zone: ZoneId, prop: PropId) -> SimResult<()> {
    enter_zone(&mut session.scene.zones, zone, prop, &mut session.events).map(|_| ())
}

pub fn zone_exit(session: &mut Session, zone: ZoneId, prop: PropId) -> SimResult<()> {
    exit_zone(&mut session.scene.zones, zone, prop, &mut session.events).map(|_| ())
}

// ============================================================================
// STEAM KNOB
// ============================================================================

fn knob_mut(session: &mut Session) -> SimResult<&mut SteamKnobData> {
    session
        .steam_knob
        .as_mut()
        .ok_or_else(|| SimError::MissingCollaborator {
            name: "steam knob".to_string(),
        })
}

pub fn grab_knob(session: &mut Session, hand: Point3<f32>) -> SimResult<()> {
    begin_knob_turn(knob_mut(session)?, hand);
    Ok(())
}

/// Returns the knob's new rotation in degrees
pub fn move_knob_hand(session: &mut Session, hand: Point3<f32>) -> SimResult<f32> {
    Ok(turn_knob_with_hand(knob_mut(session)?, hand))
}

pub fn release_knob(session: &mut Session) -> SimResult<()> {
    end_knob_turn(knob_mut(session)?);
    Ok(())
}

pub fn set_knob(session: &mut Session, degrees: f32) -> SimResult<()> {
    set_knob_rotation(knob_mut(session)?, degrees);
    Ok(())
}

/// Current steam intensity in [0, 1]; zero without a knob
pub fn steam_intensity(session: &Session) -> f32 {
    session.steam_knob.as_ref().map(knob_intensity).unwrap_or(0.0)
}

// ============================================================================
// STAGES
// ============================================================================

/// Start a manual stage now
pub fn request_stage_start(session: &mut Session, id: ProcessorId) -> SimResult<()> {
    let processor = session
        .processors
        .get_mut(id.0 as usize)
        .ok_or_sim(|| SimError::UnknownProcessor { id: id.0 })?;
    request_start(
        processor,
        &mut session.scene,
        &mut session.effects,
        &mut session.events,
    )
}

// ============================================================================
// SLOTS
// ============================================================================

/// Dock a prop into a slot; false when the slot refused it
pub fn try_capture(session: &mut Session, slot: SlotId, prop: PropId) -> bool {
    capture(session, slot, prop).is_ok()
}

/// Dock a prop into a slot, reporting why it was refused
pub fn capture(session: &mut Session, slot: SlotId, prop: PropId) -> SimResult<()> {
    docking::try_capture(
        &mut session.scene.slots,
        &mut session.scene.props,
        slot,
        prop,
        &mut session.events,
    )?;
    session.router.pending_checks.retain(|check| check.prop != prop);
    Ok(())
}

/// Release a slot's occupant to the world
pub fn release_slot(session: &mut Session, slot: SlotId, force: bool) -> SimResult<Option<PropId>> {
    let released = docking::release(
        &mut session.scene.slots,
        &mut session.scene.props,
        slot,
        force,
        ReleaseMode::ToWorld,
        &mut session.events,
    )?;
    Ok(released)
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

pub fn get_tag(session: &Session, prop: PropId) -> Option<Tag> {
    props::get_tag(&session.scene.registry, prop)
}

/// Write a tag through the transition table. Returns the previous tag.
pub fn set_tag(session: &mut Session, prop: PropId, tag: Tag) -> SimResult<Tag> {
    let from = props::set_tag(&mut session.scene.registry, prop, tag)?;
    publish_event(&mut session.events, SimEvent::TagChanged { prop, from, to: tag });
    Ok(from)
}

// ============================================================================
// RESET / OUTBOX / CHECKS
// ============================================================================

/// Put the bar back to its initial state: stages idle, slots empty, props at
/// their spawn poses with their initial tags, every effect off.
pub fn reset_scene(session: &mut Session) {
    for processor in session.processors.iter_mut() {
        abort(
            processor,
            AbortReason::SceneReset,
            &mut session.scene,
            &mut session.effects,
            &mut session.events,
        );
        reset_processor(processor, &mut session.effects);
    }

    clear_all_slots(&mut session.scene.slots);
    respawn_all(&mut session.scene.props);
    session.router.pending_checks.clear();
    clear_zones(&mut session.scene.zones);

    for (prop, from, to) in reset_all(&mut session.scene.registry) {
        if from != to {
            publish_event(&mut session.events, SimEvent::TagChanged { prop, from, to });
        }
    }

    if let Some(knob) = session.steam_knob.as_mut() {
        reset_knob(knob, &mut session.effects);
    }
    for texturizer in session.texturizers.iter_mut() {
        reset_texturizer(texturizer, &mut session.effects);
        texturizer.completed = 0;
    }
    for pour in session.pours.iter_mut() {
        reset_pour(pour, &mut session.effects);
    }
    for fill in session.fills.iter_mut() {
        reset_fill(fill, &mut session.effects);
    }
    reset_effects(&mut session.effects);
    session.reconcile_timer.accumulated = 0.0;

    publish_event(&mut session.events, SimEvent::SceneReset);
    log::info!("[Session::reset_scene] Scene reset");
}

/// Everything that happened since the last drain
pub fn drain_events(session: &mut Session) -> Vec<SimEvent> {
    drain_outbox(&mut session.events)
}

/// Props whose ownership disagrees with the slot table. Empty when consistent.
pub fn ownership_violations(session: &Session) -> Vec<PropId> {
    let slots = &session.scene.slots.slots;
    let mut violations = Vec::new();

    for prop in &session.scene.props.props {
        let holders: Vec<SlotId> = slots
            .iter()
            .filter(|slot| slot.occupant == Some(prop.id))
            .map(|slot| slot.id)
            .collect();

        let consistent = match prop.ownership {
            OwnershipState::Docked(slot) => holders.as_slice() == [slot],
            OwnershipState::Free | OwnershipState::Held => holders.is_empty(),
        };
        if !consistent {
            violations.push(prop.id);
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::SlotSpec;
    use crate::effects::{is_effect_active, AudioCue, EffectId, RecordingEffectSink};
    use crate::physics::pose::pose_at;
    use crate::process::{create_grind_stage, StageState, StartMode};
    use crate::props::{PropKind, PropSpec};
    use crate::scene_buffers::{install_slot, spawn_prop};

    fn session_with_grinder(start_mode: StartMode) -> (Session, SlotId, PropId, ProcessorId) {
        let mut session = create_session(SimulationConfig::default()).expect("session");
        let filter = spawn_prop(
            &mut session.scene,
            PropSpec::new("filter", PropKind::Filter, pose_at(0.0, 1.0, 0.0)),
        );
        let grinder = install_slot(
            &mut session.scene,
            SlotSpec::new("grinder", PropKind::Filter, pose_at(0.0, 1.0, 0.0)),
        );
        let mut config = session.config.grinder.clone();
        config.start_mode = start_mode;
        let id = add_stage(&mut session, create_grind_stage(grinder, &config));
        (session, grinder, filter, id)
    }

    #[test]
    fn test_create_session_rejects_invalid_config() {
        let mut config = SimulationConfig::default();
        config.pour.duration = 0.0;
        assert!(matches!(
            create_session(config),
            Err(SimError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_capture_starts_stage_in_same_tick() {
        let (mut session, grinder, filter, id) = session_with_grinder(StartMode::OnCapture);
        assert!(try_capture(&mut session, grinder, filter));
        tick(&mut session, 0.1);

        let processor = &session.processors[id.0 as usize];
        assert_eq!(processor.state, StageState::Running);
        assert!((processor.elapsed - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let (mut session, _, _, _) = session_with_grinder(StartMode::OnCapture);
        tick(&mut session, 5.0);
        assert_eq!(session.frame.last_delta, 0.25);
        tick(&mut session, f32::NAN);
        assert_eq!(session.frame.last_delta, 0.0);
        assert_eq!(session.frame.frame_number, 2);
    }

    #[test]
    fn test_queued_inputs_apply_on_tick() {
        let (mut session, grinder, filter, _) = session_with_grinder(StartMode::OnCapture);
        assert!(queue(&mut session, InputEvent::GrabStart { prop: filter, actor_pose: None }));
        assert!(queue(&mut session, InputEvent::GrabEnd { prop: filter }));

        let report = tick(&mut session, 0.1);
        assert_eq!(report.inputs_applied, 2);
        // released on top of the grinder, so it snaps in
        assert_eq!(session.scene.slots.slots[grinder.0 as usize].occupant, Some(filter));
    }

    #[test]
    fn test_unknown_prop_input_is_rejected() {
        let (mut session, _, _, _) = session_with_grinder(StartMode::OnCapture);
        queue(&mut session, InputEvent::GrabStart { prop: PropId(99), actor_pose: None });
        let report = tick(&mut session, 0.1);
        assert_eq!(report.inputs_applied, 0);
        assert_eq!(session.input.metrics.events_rejected, 1);
    }

    #[test]
    fn test_knob_inputs_without_knob_fail() {
        let (mut session, _, _, _) = session_with_grinder(StartMode::OnCapture);
        assert!(matches!(
            set_knob(&mut session, 90.0),
            Err(SimError::MissingCollaborator { .. })
        ));
        assert_eq!(steam_intensity(&session), 0.0);
    }

    #[test]
    fn test_manual_stage_waits_for_request() {
        let (mut session, grinder, filter, id) = session_with_grinder(StartMode::Manual);
        assert!(matches!(
            request_stage_start(&mut session, id),
            Err(SimError::PreconditionNotMet { .. })
        ));

        assert!(try_capture(&mut session, grinder, filter));
        tick(&mut session, 0.1);
        assert!(session.processors[id.0 as usize].armed);
        assert_eq!(session.processors[id.0 as usize].state, StageState::Idle);

        request_stage_start(&mut session, id).expect("start");
        assert_eq!(session.processors[id.0 as usize].state, StageState::Running);
        assert!(matches!(
            request_stage_start(&mut session, ProcessorId(42)),
            Err(SimError::UnknownProcessor { id: 42 })
        ));
    }

    #[test]
    fn test_set_tag_publishes_change() {
        let (mut session, _, filter, _) = session_with_grinder(StartMode::OnCapture);
        assert_eq!(set_tag(&mut session, filter, Tag::FILTER_WITH_COFFEE).expect("tag"), Tag::FILTER);
        assert!(set_tag(&mut session, filter, Tag::FILTER).is_err());

        tick(&mut session, 0.0);
        let events = drain_events(&mut session);
        assert!(events.contains(&SimEvent::TagChanged {
            prop: filter,
            from: Tag::FILTER,
            to: Tag::FILTER_WITH_COFFEE,
        }));
    }

    #[test]
    fn test_effect_sink_sees_slot_indicator() {
        let (mut session, grinder, filter, _) = session_with_grinder(StartMode::OnCapture);
        let sink = RecordingEffectSink::new();
        set_effect_sink(&mut session, Box::new(sink.clone()));

        tick(&mut session, 0.1);
        assert_eq!(sink.last_state(EffectId::SlotIndicator(grinder)), Some(true));

        assert!(try_capture(&mut session, grinder, filter));
        tick(&mut session, 0.1);
        assert_eq!(sink.last_state(EffectId::SlotIndicator(grinder)), Some(false));
        assert!(is_effect_active(&session.effects, EffectId::Audio(AudioCue::Grinder)));
    }

    #[test]
    fn test_shutdown_clears_subscriptions() {
        let (mut session, grinder, filter, _) = session_with_grinder(StartMode::OnCapture);
        shutdown_session(&mut session);
        assert!(try_capture(&mut session, grinder, filter));
        tick(&mut session, 0.1);
        assert_eq!(session.processors[0].state, StageState::Idle);
    }
}
