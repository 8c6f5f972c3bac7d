/// Pour Stage Operations
///
/// While the held pitcher of textured milk is tilted past the pour angle over
/// an espresso cup, pour time accumulates. Any interruption or a change of
/// target cup starts the pour over.
use cgmath::Point3;

use super::pour_data::PourStageData;
use super::stage_data::StageKind;
use crate::config::PourConfig;
use crate::effects::{
    set_effect, AudioCue, ContentsCue, EffectDispatcher, EffectId, EmissionCue,
};
use crate::events::{publish_event, AbortReason, EventBusData, SimEvent};
use crate::physics::{tilt_degrees, OwnershipState};
use crate::props::{get_prop, get_tag, set_tag, spout_position, PropId, PropKind, Tag};
use crate::scene_buffers::SceneBuffers;
use crate::spatial::{nearest_within, props_of_kind};

const POUR_STREAM: EffectId = EffectId::Emission(EmissionCue::MilkPourStream);
const POUR_AUDIO: EffectId = EffectId::Audio(AudioCue::Pour);
const MIXING_PARTICLES: EffectId = EffectId::Emission(EmissionCue::MixingParticles);
const MIXING_AUDIO: EffectId = EffectId::Audio(AudioCue::Mixing);

pub fn create_pour_stage(pitcher: PropId, config: &PourConfig) -> PourStageData {
    PourStageData {
        pitcher,
        pour_angle: config.pour_angle,
        duration: config.duration,
        max_distance: config.max_distance,
        elapsed: 0.0,
        pouring: false,
        target_cup: None,
        mixing_cue_live: false,
        completed: 0,
    }
}

/// Nearest active prop of `kind` tagged `tag`, strictly within `limit` of
/// `spout` and strictly below it
pub fn nearest_vessel_below(
    scene: &SceneBuffers,
    spout: Point3<f32>,
    kind: PropKind,
    tag: Tag,
    limit: f32,
) -> Option<PropId> {
    let candidates = props_of_kind(&scene.index, kind).iter().filter_map(|id| {
        let prop = get_prop(&scene.props, *id)?;
        let position = prop.body.pose.position;
        let eligible = prop.active
            && get_tag(&scene.registry, *id) == Some(tag)
            && position.y < spout.y;
        eligible.then_some((*id, position))
    });
    nearest_within(spout, candidates, limit).map(|(id, _)| id)
}

/// Cup the pitcher is pouring into this frame, if every pour condition holds
pub fn pour_target(stage: &PourStageData, scene: &SceneBuffers) -> Option<PropId> {
    let pitcher = get_prop(&scene.props, stage.pitcher)?;
    if pitcher.ownership != OwnershipState::Held {
        return None;
    }
    if get_tag(&scene.registry, stage.pitcher) != Some(Tag::PITCHER_WITH_TEXTURED_MILK) {
        return None;
    }
    if tilt_degrees(&pitcher.body.pose) <= stage.pour_angle {
        return None;
    }
    nearest_vessel_below(
        scene,
        spout_position(pitcher),
        PropKind::Cup,
        Tag::CUP_WITH_ESPRESSO,
        stage.max_distance,
    )
}

pub fn pour_progress(stage: &PourStageData) -> f32 {
    if stage.duration <= 0.0 {
        return 0.0;
    }
    (stage.elapsed / stage.duration).clamp(0.0, 1.0)
}

fn start_pouring(
    stage: &mut PourStageData,
    cup: PropId,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    stage.pouring = true;
    stage.target_cup = Some(cup);
    stage.elapsed = 0.0;
    set_effect(effects, POUR_STREAM, true);
    set_effect(effects, POUR_AUDIO, true);
    publish_event(
        events,
        SimEvent::StageStarted {
            stage: StageKind::Pour,
            processor: None,
        },
    );
    log::info!("[MilkPour] Pouring into cup {}", cup.0);
}

/// Stop the stream and forget progress
pub fn stop_pouring(stage: &mut PourStageData, effects: &mut EffectDispatcher) {
    stage.pouring = false;
    stage.elapsed = 0.0;
    stage.target_cup = None;
    set_effect(effects, POUR_STREAM, false);
    set_effect(effects, POUR_AUDIO, false);
}

fn interrupt(
    stage: &mut PourStageData,
    reason: AbortReason,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    stop_pouring(stage, effects);
    log::info!("[MilkPour] Pour interrupted ({:?})", reason);
    publish_event(
        events,
        SimEvent::StageAborted {
            stage: StageKind::Pour,
            processor: None,
            reason,
        },
    );
}

/// One frame of pouring
pub fn tick_pour(
    stage: &mut PourStageData,
    dt: f32,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    // mixing plays once, for the frame the cappuccino came together
    if stage.mixing_cue_live {
        stage.mixing_cue_live = false;
        set_effect(effects, MIXING_PARTICLES, false);
        set_effect(effects, MIXING_AUDIO, false);
    }

    let Some(cup) = pour_target(stage, scene) else {
        if stage.pouring {
            interrupt(stage, AbortReason::InputLost, effects, events);
        }
        return;
    };

    if stage.pouring && stage.target_cup != Some(cup) {
        interrupt(stage, AbortReason::InputChanged, effects, events);
    }
    if !stage.pouring {
        start_pouring(stage, cup, effects, events);
    }

    stage.elapsed += dt;
    log::debug!("[MilkPour] {:.1}/{:.1}s", stage.elapsed, stage.duration);
    if stage.elapsed >= stage.duration {
        complete_pouring(stage, cup, scene, effects, events);
    }
}

fn complete_pouring(
    stage: &mut PourStageData,
    cup: PropId,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    let pitcher = stage.pitcher;
    stop_pouring(stage, effects);

    let cup_from = match set_tag(&mut scene.registry, cup, Tag::CUP_WITH_CAPPUCCINO) {
        Ok(from) => from,
        Err(err) => {
            log::error!("[MilkPour] Could not finish the cappuccino: {}", err);
            return;
        }
    };
    set_effect(effects, EffectId::Contents(cup, ContentsCue::Espresso), false);
    set_effect(effects, EffectId::Contents(cup, ContentsCue::Cappuccino), true);
    set_effect(effects, MIXING_PARTICLES, true);
    set_effect(effects, MIXING_AUDIO, true);
    stage.mixing_cue_live = true;
    publish_event(
        events,
        SimEvent::TagChanged {
            prop: cup,
            from: cup_from,
            to: Tag::CUP_WITH_CAPPUCCINO,
        },
    );

    match set_tag(&mut scene.registry, pitcher, Tag::PITCHER) {
        Ok(from) => {
            set_effect(effects, EffectId::Contents(pitcher, ContentsCue::Milk), false);
            set_effect(effects, EffectId::Contents(pitcher, ContentsCue::TexturedMilk), false);
            publish_event(
                events,
                SimEvent::TagChanged {
                    prop: pitcher,
                    from,
                    to: Tag::PITCHER,
                },
            );
        }
        Err(err) => log::error!("[MilkPour] Could not empty the pitcher: {}", err),
    }

    stage.completed += 1;
    publish_event(
        events,
        SimEvent::StageCompleted {
            stage: StageKind::Pour,
            processor: None,
            target: cup,
            tag: Tag::CUP_WITH_CAPPUCCINO,
        },
    );
    log::info!("[MilkPour] Cappuccino complete in cup {}", cup.0);
}

/// Back to not pouring, without an abort event
pub fn reset_pour(stage: &mut PourStageData, effects: &mut EffectDispatcher) {
    stop_pouring(stage, effects);
    stage.mixing_cue_live = false;
    set_effect(effects, MIXING_PARTICLES, false);
    set_effect(effects, MIXING_AUDIO, false);
}
