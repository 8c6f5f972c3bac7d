/// Fill Stage Operations
///
/// A held carton tipped into its pouring window streams milk. An empty
/// pitcher under the stream accumulates fill time, keeping it when the
/// stream stops, and becomes a pitcher with milk once full.
use super::fill_data::FillStageData;
use super::pour_operations::nearest_vessel_below;
use super::stage_data::StageKind;
use crate::config::FillConfig;
use crate::effects::{set_effect, AudioCue, ContentsCue, EffectDispatcher, EffectId, EmissionCue};
use crate::events::{publish_event, EventBusData, SimEvent};
use crate::physics::{tilt_degrees, OwnershipState};
use crate::props::{get_prop, set_tag, spout_position, PropId, PropKind, Tag};
use crate::scene_buffers::SceneBuffers;

const CARTON_STREAM: EffectId = EffectId::Emission(EmissionCue::CartonStream);
const FILL_AUDIO: EffectId = EffectId::Audio(AudioCue::MilkFill);

pub fn create_fill_stage(carton: PropId, config: &FillConfig) -> FillStageData {
    FillStageData {
        carton,
        min_angle: config.min_angle,
        max_angle: config.max_angle,
        duration: config.duration,
        fill_radius: config.fill_radius,
        streaming: false,
        receiving: None,
        progress: Default::default(),
        completed: 0,
    }
}

/// Whether the carton is held inside its pouring window
pub fn carton_streaming(stage: &FillStageData, scene: &SceneBuffers) -> bool {
    let Some(carton) = get_prop(&scene.props, stage.carton) else {
        return false;
    };
    if carton.ownership != OwnershipState::Held {
        return false;
    }
    let tilt = tilt_degrees(&carton.body.pose);
    tilt >= stage.min_angle && tilt <= stage.max_angle
}

/// Accumulated fill fraction for a pitcher
pub fn fill_progress(stage: &FillStageData, pitcher: PropId) -> f32 {
    if stage.duration <= 0.0 {
        return 0.0;
    }
    let elapsed = stage.progress.get(&pitcher).copied().unwrap_or(0.0);
    (elapsed / stage.duration).clamp(0.0, 1.0)
}

/// One frame of carton pouring
pub fn tick_fill(
    stage: &mut FillStageData,
    dt: f32,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    let streaming = carton_streaming(stage, scene);
    if streaming != stage.streaming {
        stage.streaming = streaming;
        set_effect(effects, CARTON_STREAM, streaming);
        log::info!(
            "[MilkFill] Carton stream {}",
            if streaming { "started" } else { "stopped" }
        );
    }

    let view: &SceneBuffers = scene;
    let receiver = if streaming {
        get_prop(&view.props, stage.carton).and_then(|carton| {
            nearest_vessel_below(
                view,
                spout_position(carton),
                PropKind::Pitcher,
                Tag::PITCHER,
                stage.fill_radius,
            )
        })
    } else {
        None
    };

    if receiver != stage.receiving {
        stage.receiving = receiver;
        set_effect(effects, FILL_AUDIO, receiver.is_some());
        if let Some(pitcher) = receiver {
            publish_event(
                events,
                SimEvent::StageStarted {
                    stage: StageKind::Fill,
                    processor: None,
                },
            );
            log::info!("[MilkFill] Filling pitcher {}", pitcher.0);
        }
    }

    let Some(pitcher) = receiver else {
        return;
    };

    let elapsed = stage.progress.entry(pitcher).or_insert(0.0);
    *elapsed += dt;
    log::debug!("[MilkFill] {:.1}/{:.1}s", *elapsed, stage.duration);
    if *elapsed >= stage.duration {
        complete_fill(stage, pitcher, scene, effects, events);
    }
}

fn complete_fill(
    stage: &mut FillStageData,
    pitcher: PropId,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    stage.progress.remove(&pitcher);
    stage.receiving = None;
    set_effect(effects, FILL_AUDIO, false);

    match set_tag(&mut scene.registry, pitcher, Tag::PITCHER_WITH_MILK) {
        Ok(from) => {
            stage.completed += 1;
            set_effect(effects, EffectId::Contents(pitcher, ContentsCue::Milk), true);
            publish_event(
                events,
                SimEvent::TagChanged {
                    prop: pitcher,
                    from,
                    to: Tag::PITCHER_WITH_MILK,
                },
            );
            publish_event(
                events,
                SimEvent::StageCompleted {
                    stage: StageKind::Fill,
                    processor: None,
                    target: pitcher,
                    tag: Tag::PITCHER_WITH_MILK,
                },
            );
            log::info!("[MilkFill] Pitcher {} is full", pitcher.0);
        }
        Err(err) => log::error!("[MilkFill] Could not fill pitcher: {}", err),
    }
}

/// Stop streaming and forget every pitcher's progress
pub fn reset_fill(stage: &mut FillStageData, effects: &mut EffectDispatcher) {
    stage.streaming = false;
    stage.receiving = None;
    stage.progress.clear();
    set_effect(effects, CARTON_STREAM, false);
    set_effect(effects, FILL_AUDIO, false);
}
