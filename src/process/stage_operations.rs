/// Stage Processor Operations
///
/// Idle -> Running -> Idle. A run starts only when every input slot holds a
/// prop with the required tag, loses all progress when an input changes, and
/// writes its output tag exactly once when the timer runs out.
use super::stage_data::{
    InputRequirement, OutputTarget, ProcessorId, StageKind, StageMetrics, StageProcessorData,
    StageSpec, StageState, StartMode,
};
use crate::config::DockedStageConfig;
use crate::docking::{get_slot, lock_slot, unlock_slot, SlotId};
use crate::effects::{
    set_effect, set_effects, AudioCue, ContentsCue, EffectDispatcher, EffectId, EmissionCue,
};
use crate::error::{SimError, SimResult};
use crate::events::{publish_event, AbortReason, EventBusData, SimEvent};
use crate::props::{get_prop, get_tag, set_tag, PropId, Tag};
use crate::scene_buffers::SceneBuffers;

// ============================================================================
// CREATION
// ============================================================================

pub fn create_processor(id: ProcessorId, spec: StageSpec) -> StageProcessorData {
    StageProcessorData {
        id,
        label: spec.label,
        kind: spec.kind,
        snapshot: Vec::with_capacity(spec.inputs.len()),
        inputs: spec.inputs,
        output_tag: spec.output_tag,
        output_target: spec.output_target,
        duration: spec.duration,
        elapsed: 0.0,
        state: StageState::Idle,
        lock_inputs: spec.lock_inputs,
        start_mode: spec.start_mode,
        armed: false,
        target: None,
        locked_slots: Vec::new(),
        activity_cues: spec.activity_cues,
        completion_contents: spec.completion_contents,
        metrics: StageMetrics::default(),
    }
}

/// Grinder: an empty filter in the grinder slot becomes a filter with coffee
pub fn create_grind_stage(grinder_slot: SlotId, config: &DockedStageConfig) -> StageSpec {
    StageSpec {
        label: "grinder".to_string(),
        kind: StageKind::Grind,
        inputs: vec![InputRequirement {
            slot: grinder_slot,
            occupant_tag: Tag::FILTER,
            parent_tag: None,
        }],
        output_tag: Tag::FILTER_WITH_COFFEE,
        output_target: OutputTarget::Occupant(grinder_slot),
        duration: config.duration,
        lock_inputs: config.lock_inputs,
        start_mode: config.start_mode,
        activity_cues: vec![
            EffectId::Emission(EmissionCue::GrinderParticles),
            EffectId::Audio(AudioCue::Grinder),
        ],
        completion_contents: Some(ContentsCue::GroundCoffee),
    }
}

/// Tamper: the tamper seated on a filter with coffee presses it
pub fn create_tamp_stage(tamper_seat: SlotId, config: &DockedStageConfig) -> StageSpec {
    StageSpec {
        label: "tamper".to_string(),
        kind: StageKind::Tamp,
        inputs: vec![InputRequirement {
            slot: tamper_seat,
            occupant_tag: Tag::TAMPER,
            parent_tag: Some(Tag::FILTER_WITH_COFFEE),
        }],
        output_tag: Tag::FILTER_PRESSED,
        output_target: OutputTarget::SlotParent(tamper_seat),
        duration: config.duration,
        lock_inputs: config.lock_inputs,
        start_mode: config.start_mode,
        activity_cues: vec![
            EffectId::Emission(EmissionCue::CompactParticles),
            EffectId::Audio(AudioCue::Press),
        ],
        completion_contents: None,
    }
}

/// Espresso machine: a pressed filter in the group head and an empty cup below it
pub fn create_extract_stage(
    group_head: SlotId,
    cup_slot: SlotId,
    config: &DockedStageConfig,
) -> StageSpec {
    StageSpec {
        label: "espresso machine".to_string(),
        kind: StageKind::Extract,
        inputs: vec![
            InputRequirement {
                slot: group_head,
                occupant_tag: Tag::FILTER_PRESSED,
                parent_tag: None,
            },
            InputRequirement {
                slot: cup_slot,
                occupant_tag: Tag::CUP,
                parent_tag: None,
            },
        ],
        output_tag: Tag::CUP_WITH_ESPRESSO,
        output_target: OutputTarget::Occupant(cup_slot),
        duration: config.duration,
        lock_inputs: config.lock_inputs,
        start_mode: config.start_mode,
        activity_cues: vec![
            EffectId::Emission(EmissionCue::EspressoStream),
            EffectId::Audio(AudioCue::Extraction),
        ],
        completion_contents: Some(ContentsCue::Espresso),
    }
}

// ============================================================================
// QUERIES
// ============================================================================

pub fn input_slots(processor: &StageProcessorData) -> Vec<SlotId> {
    processor.inputs.iter().map(|input| input.slot).collect()
}

/// Current occupant of every input slot, in input order
pub fn occupancy_snapshot(processor: &StageProcessorData, scene: &SceneBuffers) -> Vec<Option<PropId>> {
    processor
        .inputs
        .iter()
        .map(|input| get_slot(&scene.slots, input.slot).and_then(|slot| slot.occupant))
        .collect()
}

/// Prop the output tag would be written to right now
pub fn resolve_target(processor: &StageProcessorData, scene: &SceneBuffers) -> Option<PropId> {
    match processor.output_target {
        OutputTarget::Occupant(slot) => get_slot(&scene.slots, slot)?.occupant,
        OutputTarget::SlotParent(slot) => get_slot(&scene.slots, slot)?.parent,
    }
}

/// Ok when every input is satisfied, otherwise the first reason it is not
pub fn evaluate_preconditions(
    processor: &StageProcessorData,
    scene: &SceneBuffers,
) -> Result<(), String> {
    for input in &processor.inputs {
        let slot = get_slot(&scene.slots, input.slot)
            .ok_or_else(|| format!("slot {} does not exist", input.slot.0))?;
        let occupant = slot
            .occupant
            .ok_or_else(|| format!("{} is empty", slot.label))?;

        let tag = get_tag(&scene.registry, occupant);
        if tag != Some(input.occupant_tag) {
            return Err(format!(
                "{} holds {}, needs {}",
                slot.label,
                tag.map(|t| t.name()).unwrap_or("an untagged prop"),
                input.occupant_tag
            ));
        }

        if let Some(required) = input.parent_tag {
            let parent = slot
                .parent
                .ok_or_else(|| format!("{} is not mounted on anything", slot.label))?;
            let parent_tag = get_tag(&scene.registry, parent);
            if parent_tag != Some(required) {
                return Err(format!(
                    "{} sits on {}, needs {}",
                    slot.label,
                    parent_tag.map(|t| t.name()).unwrap_or("an untagged prop"),
                    required
                ));
            }
        }
    }

    if resolve_target(processor, scene).is_none() {
        return Err("nothing to receive the output".to_string());
    }
    Ok(())
}

/// Fraction of the current run completed (0 when idle and never run)
pub fn stage_progress(processor: &StageProcessorData) -> f32 {
    if processor.duration <= 0.0 {
        return 0.0;
    }
    (processor.elapsed / processor.duration).clamp(0.0, 1.0)
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// React to a capture or release in one of this processor's slots
pub fn on_slot_event(
    processor: &mut StageProcessorData,
    event: &SimEvent,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    match processor.state {
        StageState::Running => {
            // a release always ends the run, even when the same prop is back by now
            let input_released = matches!(
                event,
                SimEvent::Released { slot, .. } if processor.inputs.iter().any(|input| input.slot == *slot)
            );
            if input_released || occupancy_snapshot(processor, scene) != processor.snapshot {
                log::info!(
                    "[StageProcessor::on_slot_event] {} input changed ({:?}), aborting",
                    processor.label,
                    event
                );
                abort(processor, AbortReason::InputChanged, scene, effects, events);
            }
        }
        StageState::Idle => match processor.start_mode {
            StartMode::OnCapture => match evaluate_preconditions(processor, scene) {
                Ok(()) => start(processor, scene, effects, events),
                Err(reason) => {
                    if matches!(event, SimEvent::Captured { .. }) {
                        log::warn!(
                            "[StageProcessor::on_slot_event] {} not starting: {}",
                            processor.label,
                            reason
                        );
                    }
                }
            },
            StartMode::Manual => refresh_armed(processor, scene, effects),
        },
    }
}

/// Manual mode: recompute whether the stage is ready to be started
pub fn refresh_armed(
    processor: &mut StageProcessorData,
    scene: &SceneBuffers,
    effects: &mut EffectDispatcher,
) {
    if processor.start_mode != StartMode::Manual {
        return;
    }
    let armed =
        processor.state == StageState::Idle && evaluate_preconditions(processor, scene).is_ok();
    processor.armed = armed;
    set_effect(effects, EffectId::ReadyIndicator(processor.id), armed);
}

/// Explicit start (the extraction button)
pub fn request_start(
    processor: &mut StageProcessorData,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) -> SimResult<()> {
    if processor.state == StageState::Running {
        return Err(SimError::StageAlreadyRunning {
            stage: processor.kind,
        });
    }
    if let Err(reason) = evaluate_preconditions(processor, scene) {
        log::warn!(
            "[StageProcessor::request_start] {} refused: {}",
            processor.label,
            reason
        );
        return Err(SimError::PreconditionNotMet {
            stage: processor.kind,
            reason,
        });
    }
    start(processor, scene, effects, events);
    Ok(())
}

fn start(
    processor: &mut StageProcessorData,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    processor.snapshot = occupancy_snapshot(processor, scene);
    processor.target = resolve_target(processor, scene);
    processor.elapsed = 0.0;
    processor.state = StageState::Running;
    processor.armed = false;
    processor.metrics.runs_started += 1;

    if processor.lock_inputs {
        for slot in input_slots(processor) {
            if lock_slot(&mut scene.slots, slot).is_ok() {
                processor.locked_slots.push(slot);
            }
        }
    }

    if processor.start_mode == StartMode::Manual {
        set_effect(effects, EffectId::ReadyIndicator(processor.id), false);
    }
    set_effects(effects, &processor.activity_cues, true);

    log::info!(
        "[StageProcessor::start] {} started ({}s)",
        processor.label,
        processor.duration
    );
    publish_event(
        events,
        SimEvent::StageStarted {
            stage: processor.kind,
            processor: Some(processor.id),
        },
    );
}

fn release_locks(processor: &mut StageProcessorData, scene: &mut SceneBuffers) {
    for slot in processor.locked_slots.drain(..) {
        let _ = unlock_slot(&mut scene.slots, slot);
    }
}

/// Advance a running stage; aborts if an input changed, completes at the end of its timer
pub fn tick_processor(
    processor: &mut StageProcessorData,
    dt: f32,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    if processor.state != StageState::Running {
        return;
    }

    if occupancy_snapshot(processor, scene) != processor.snapshot {
        abort(processor, AbortReason::InputChanged, scene, effects, events);
        return;
    }

    processor.elapsed += dt;
    if processor.elapsed >= processor.duration {
        complete(processor, scene, effects, events);
    }
}

/// Drop the current run: progress discarded, effects off, locks released
pub fn abort(
    processor: &mut StageProcessorData,
    reason: AbortReason,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    if processor.state != StageState::Running {
        return;
    }

    processor.state = StageState::Idle;
    processor.elapsed = 0.0;
    processor.snapshot.clear();
    processor.target = None;
    processor.metrics.runs_aborted += 1;
    release_locks(processor, scene);
    set_effects(effects, &processor.activity_cues, false);

    log::info!("[StageProcessor::abort] {} aborted: {:?}", processor.label, reason);
    publish_event(
        events,
        SimEvent::StageAborted {
            stage: processor.kind,
            processor: Some(processor.id),
            reason,
        },
    );
}

fn complete(
    processor: &mut StageProcessorData,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    processor.state = StageState::Idle;
    processor.elapsed = processor.duration;
    set_effects(effects, &processor.activity_cues, false);

    if let Some(target) = processor.target.take() {
        match set_tag(&mut scene.registry, target, processor.output_tag) {
            Ok(from) => {
                if let Some(contents) = processor.completion_contents {
                    set_effect(effects, EffectId::Contents(target, contents), true);
                }
                processor.metrics.runs_completed += 1;

                let name = get_prop(&scene.props, target)
                    .map(|prop| prop.name.as_str())
                    .unwrap_or("?");
                log::info!(
                    "[StageProcessor::complete] {} finished, {} is now {}",
                    processor.label,
                    name,
                    processor.output_tag
                );

                publish_event(
                    events,
                    SimEvent::TagChanged {
                        prop: target,
                        from,
                        to: processor.output_tag,
                    },
                );
                publish_event(
                    events,
                    SimEvent::StageCompleted {
                        stage: processor.kind,
                        processor: Some(processor.id),
                        target,
                        tag: processor.output_tag,
                    },
                );
            }
            Err(err) => {
                log::error!(
                    "[StageProcessor::complete] {} could not write its output: {}",
                    processor.label,
                    err
                );
            }
        }
    }

    processor.snapshot.clear();
    release_locks(processor, scene);
}

/// Back to a fresh idle processor (scene reset). Slot locks are cleared by the caller.
pub fn reset_processor(processor: &mut StageProcessorData, effects: &mut EffectDispatcher) {
    processor.state = StageState::Idle;
    processor.elapsed = 0.0;
    processor.armed = false;
    processor.snapshot.clear();
    processor.target = None;
    processor.locked_slots.clear();
    set_effects(effects, &processor.activity_cues, false);
    if processor.start_mode == StartMode::Manual {
        set_effect(effects, EffectId::ReadyIndicator(processor.id), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::{release, try_capture, ReleaseError, ReleaseMode, SlotSpec};
    use crate::effects::{create_effect_dispatcher, is_effect_active};
    use crate::events::{create_event_bus, take_pending};
    use crate::physics::pose::pose_at;
    use crate::props::{PropKind, PropSpec};
    use crate::scene_buffers::{create_scene_buffers, install_slot, spawn_prop};

    struct Grinder {
        scene: SceneBuffers,
        effects: EffectDispatcher,
        events: EventBusData,
        slot: SlotId,
        filter: PropId,
        processor: StageProcessorData,
    }

    fn grinder(duration: f32) -> Grinder {
        let mut scene = create_scene_buffers();
        let slot = install_slot(
            &mut scene,
            SlotSpec {
                label: "grinder".to_string(),
                accepts: PropKind::Filter,
                pose: pose_at(0.0, 1.0, 0.0),
                parent: None,
                capture_radius: 0.15,
            },
        );
        let filter = spawn_prop(
            &mut scene,
            PropSpec::new("filter", PropKind::Filter, pose_at(0.0, 1.0, 0.0)),
        );
        let config = DockedStageConfig {
            duration,
            lock_inputs: true,
            start_mode: StartMode::OnCapture,
        };
        Grinder {
            scene,
            effects: create_effect_dispatcher(None),
            events: create_event_bus(64),
            slot,
            filter,
            processor: create_processor(ProcessorId(0), create_grind_stage(slot, &config)),
        }
    }

    fn dock(g: &mut Grinder) {
        try_capture(&mut g.scene.slots, &mut g.scene.props, g.slot, g.filter, &mut g.events)
            .expect("capture");
        let event = SimEvent::Captured {
            slot: g.slot,
            prop: g.filter,
        };
        on_slot_event(&mut g.processor, &event, &mut g.scene, &mut g.effects, &mut g.events);
    }

    #[test]
    fn test_capture_starts_and_locks() {
        let mut g = grinder(10.0);
        dock(&mut g);

        assert_eq!(g.processor.state, StageState::Running);
        assert!(get_slot(&g.scene.slots, g.slot).expect("slot").locked);
        assert!(is_effect_active(&g.effects, EffectId::Audio(AudioCue::Grinder)));
        assert_eq!(g.processor.target, Some(g.filter));
    }

    #[test]
    fn test_completion_writes_tag_once() {
        let mut g = grinder(10.0);
        dock(&mut g);
        take_pending(&mut g.events);

        for _ in 0..9 {
            tick_processor(&mut g.processor, 1.0, &mut g.scene, &mut g.effects, &mut g.events);
        }
        assert_eq!(get_tag(&g.scene.registry, g.filter), Some(Tag::FILTER));

        tick_processor(&mut g.processor, 1.0, &mut g.scene, &mut g.effects, &mut g.events);
        tick_processor(&mut g.processor, 1.0, &mut g.scene, &mut g.effects, &mut g.events);

        assert_eq!(get_tag(&g.scene.registry, g.filter), Some(Tag::FILTER_WITH_COFFEE));
        assert_eq!(g.processor.metrics.runs_completed, 1);
        assert_eq!(g.processor.state, StageState::Idle);
        assert!(!get_slot(&g.scene.slots, g.slot).expect("slot").locked);
        assert!(!is_effect_active(&g.effects, EffectId::Audio(AudioCue::Grinder)));
        assert!(is_effect_active(
            &g.effects,
            EffectId::Contents(g.filter, ContentsCue::GroundCoffee)
        ));

        let completions = take_pending(&mut g.events)
            .into_iter()
            .filter(|event| matches!(event, SimEvent::StageCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_locked_slot_refuses_plain_release() {
        let mut g = grinder(10.0);
        dock(&mut g);
        assert_eq!(
            release(&mut g.scene.slots, &mut g.scene.props, g.slot, false, ReleaseMode::ToWorld, &mut g.events),
            Err(ReleaseError::Locked { slot: g.slot })
        );
    }

    #[test]
    fn test_abort_on_removal_and_restart_from_zero() {
        let mut g = grinder(10.0);
        dock(&mut g);
        tick_processor(&mut g.processor, 4.0, &mut g.scene, &mut g.effects, &mut g.events);
        assert!((stage_progress(&g.processor) - 0.4).abs() < 1e-5);

        release(&mut g.scene.slots, &mut g.scene.props, g.slot, true, ReleaseMode::ToUser, &mut g.events)
            .expect("forced release");
        let event = SimEvent::Released {
            slot: g.slot,
            prop: g.filter,
            to_user: true,
        };
        on_slot_event(&mut g.processor, &event, &mut g.scene, &mut g.effects, &mut g.events);

        assert_eq!(g.processor.state, StageState::Idle);
        assert_eq!(g.processor.elapsed, 0.0);
        assert_eq!(g.processor.metrics.runs_aborted, 1);
        assert_eq!(get_tag(&g.scene.registry, g.filter), Some(Tag::FILTER));

        if let Some(prop) = crate::props::get_prop_mut(&mut g.scene.props, g.filter) {
            prop.ownership = crate::physics::OwnershipState::Free;
        }
        dock(&mut g);
        assert_eq!(g.processor.state, StageState::Running);
        assert_eq!(g.processor.elapsed, 0.0);
    }

    #[test]
    fn test_release_aborts_even_when_same_prop_is_back() {
        let mut g = grinder(10.0);
        dock(&mut g);
        tick_processor(&mut g.processor, 4.0, &mut g.scene, &mut g.effects, &mut g.events);

        // released and recaptured before anyone is notified
        release(&mut g.scene.slots, &mut g.scene.props, g.slot, true, ReleaseMode::ToWorld, &mut g.events)
            .expect("forced release");
        try_capture(&mut g.scene.slots, &mut g.scene.props, g.slot, g.filter, &mut g.events)
            .expect("recapture");
        assert_eq!(occupancy_snapshot(&g.processor, &g.scene), g.processor.snapshot);

        let released = SimEvent::Released {
            slot: g.slot,
            prop: g.filter,
            to_user: false,
        };
        on_slot_event(&mut g.processor, &released, &mut g.scene, &mut g.effects, &mut g.events);
        assert_eq!(g.processor.state, StageState::Idle);
        assert_eq!(g.processor.elapsed, 0.0);
        assert_eq!(g.processor.metrics.runs_aborted, 1);

        // the capture that follows starts a fresh, locked run
        let captured = SimEvent::Captured {
            slot: g.slot,
            prop: g.filter,
        };
        on_slot_event(&mut g.processor, &captured, &mut g.scene, &mut g.effects, &mut g.events);
        assert_eq!(g.processor.state, StageState::Running);
        assert_eq!(g.processor.elapsed, 0.0);
        assert!(get_slot(&g.scene.slots, g.slot).expect("slot").locked);
    }

    #[test]
    fn test_wrong_tag_never_starts() {
        let mut g = grinder(10.0);
        set_tag(&mut g.scene.registry, g.filter, Tag::FILTER_WITH_COFFEE).expect("tag");
        dock(&mut g);
        assert_eq!(g.processor.state, StageState::Idle);
        assert!(evaluate_preconditions(&g.processor, &g.scene)
            .expect_err("not ready")
            .contains("needs Filter"));
    }

    #[test]
    fn test_manual_mode_arms_then_starts_on_request() {
        let mut g = grinder(10.0);
        g.processor.start_mode = StartMode::Manual;
        dock(&mut g);

        assert_eq!(g.processor.state, StageState::Idle);
        assert!(g.processor.armed);
        assert!(is_effect_active(&g.effects, EffectId::ReadyIndicator(ProcessorId(0))));

        request_start(&mut g.processor, &mut g.scene, &mut g.effects, &mut g.events)
            .expect("armed stage starts");
        assert_eq!(g.processor.state, StageState::Running);
        assert!(!g.processor.armed);
        assert!(matches!(
            request_start(&mut g.processor, &mut g.scene, &mut g.effects, &mut g.events),
            Err(SimError::StageAlreadyRunning { .. })
        ));
    }

    #[test]
    fn test_request_start_reports_missing_input() {
        let mut g = grinder(10.0);
        g.processor.start_mode = StartMode::Manual;
        match request_start(&mut g.processor, &mut g.scene, &mut g.effects, &mut g.events) {
            Err(SimError::PreconditionNotMet { stage, reason }) => {
                assert_eq!(stage, StageKind::Grind);
                assert!(reason.contains("grinder is empty"));
            }
            other => panic!("expected precondition failure, got {:?}", other),
        }
    }
}
