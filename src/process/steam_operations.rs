/// Steam Station Operations
///
/// Knob input maps to an intensity in [0, 1]. The texturizer accumulates time
/// only while the intensity is at or above its threshold, pauses below it and
/// forgets everything when the pitcher leaves the wand.
use cgmath::{InnerSpace, Point3, Vector3};

use super::stage_data::StageKind;
use super::steam_data::{SteamKnobData, TexturizerData, TexturizerState};
use crate::config::SteamConfig;
use crate::effects::{
    set_effect, set_effect_level, AudioCue, ContentsCue, EffectDispatcher, EffectId, EmissionCue,
};
use crate::events::{publish_event, AbortReason, EventBusData, SimEvent};
use crate::interaction::{is_in_zone, zone_members, ZoneId};
use crate::props::{get_prop, get_tag, set_tag, PropId, PropKind, Tag};
use crate::scene_buffers::SceneBuffers;

const STEAM_JET: EffectId = EffectId::Emission(EmissionCue::SteamJet);
const STEAM_AUDIO: EffectId = EffectId::Audio(AudioCue::Steam);
const TEXTURIZING_AUDIO: EffectId = EffectId::Audio(AudioCue::Texturizing);

// ============================================================================
// STEAM KNOB
// ============================================================================

pub fn create_steam_knob(
    config: &SteamConfig,
    center: Point3<f32>,
    axis: Vector3<f32>,
) -> SteamKnobData {
    SteamKnobData {
        rotation: config.min_rotation,
        min_rotation: config.min_rotation,
        max_rotation: config.max_rotation,
        rotation_speed: config.rotation_speed,
        center,
        axis,
        last_hand: None,
        on_threshold: config.on_threshold,
        max_emission: config.max_emission,
        max_volume: config.max_volume,
        steam_on: false,
    }
}

/// Where `value` sits between `a` and `b`, clamped to [0, 1]
/// Pure function - a degenerate range maps to 0
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

pub fn knob_intensity(knob: &SteamKnobData) -> f32 {
    inverse_lerp(knob.min_rotation, knob.max_rotation, knob.rotation)
}

/// Absolute knob position, clamped to the knob's range
pub fn set_knob_rotation(knob: &mut SteamKnobData, degrees: f32) {
    knob.rotation = degrees.clamp(knob.min_rotation, knob.max_rotation);
}

pub fn begin_knob_turn(knob: &mut SteamKnobData, hand: Point3<f32>) {
    knob.last_hand = Some(hand);
}

/// Turn the knob by the hand's travel along the knob's tangent. Returns the new rotation.
pub fn turn_knob_with_hand(knob: &mut SteamKnobData, hand: Point3<f32>) -> f32 {
    let Some(last) = knob.last_hand else {
        knob.last_hand = Some(hand);
        return knob.rotation;
    };

    let movement = hand - last;
    let to_hand = hand - knob.center;
    let tangent = knob.axis.cross(to_hand);
    if to_hand.magnitude2() > f32::EPSILON && tangent.magnitude2() > f32::EPSILON {
        let delta = movement.dot(tangent.normalize()) * knob.rotation_speed;
        set_knob_rotation(knob, knob.rotation + delta);
    }

    knob.last_hand = Some(hand);
    knob.rotation
}

pub fn end_knob_turn(knob: &mut SteamKnobData) {
    knob.last_hand = None;
}

/// Push the knob's intensity to the steam jet and its sound
pub fn update_steam_output(knob: &mut SteamKnobData, effects: &mut EffectDispatcher) {
    let intensity = knob_intensity(knob);
    let on = intensity > knob.on_threshold;

    set_effect_level(effects, STEAM_JET, intensity * knob.max_emission);
    set_effect_level(effects, STEAM_AUDIO, intensity * knob.max_volume);
    set_effect(effects, STEAM_JET, on);
    set_effect(effects, STEAM_AUDIO, on);

    if on != knob.steam_on {
        knob.steam_on = on;
        if on {
            log::info!("[SteamKnob] Steam on ({:.0}%)", intensity * 100.0);
        } else {
            log::info!("[SteamKnob] Steam off");
        }
    }
}

/// Knob back to its minimum, steam off
pub fn reset_knob(knob: &mut SteamKnobData, effects: &mut EffectDispatcher) {
    knob.rotation = knob.min_rotation;
    knob.last_hand = None;
    update_steam_output(knob, effects);
}

// ============================================================================
// TEXTURIZER
// ============================================================================

pub fn create_texturizer(zone: ZoneId, config: &SteamConfig) -> TexturizerData {
    TexturizerData {
        zone,
        duration: config.duration,
        minimum_intensity: config.minimum_intensity,
        elapsed: 0.0,
        state: TexturizerState::Idle,
        pitcher: None,
        completed: 0,
    }
}

/// Forget the current pitcher and all progress
pub fn reset_texturizer(texturizer: &mut TexturizerData, effects: &mut EffectDispatcher) {
    texturizer.elapsed = 0.0;
    texturizer.state = TexturizerState::Idle;
    texturizer.pitcher = None;
    set_effect(effects, TEXTURIZING_AUDIO, false);
}

pub fn texturizer_progress(texturizer: &TexturizerData) -> f32 {
    if texturizer.duration <= 0.0 {
        return 0.0;
    }
    (texturizer.elapsed / texturizer.duration).clamp(0.0, 1.0)
}

fn is_texturizable(scene: &SceneBuffers, prop: PropId) -> bool {
    get_prop(&scene.props, prop).map(|p| p.kind) == Some(PropKind::Pitcher)
        && get_tag(&scene.registry, prop) == Some(Tag::PITCHER_WITH_MILK)
}

/// One frame of texturizing at the given steam intensity
pub fn tick_texturizer(
    texturizer: &mut TexturizerData,
    intensity: f32,
    dt: f32,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    if let Some(pitcher) = texturizer.pitcher {
        let inside = is_in_zone(&scene.zones, texturizer.zone, pitcher);
        if !inside || !is_texturizable(scene, pitcher) {
            let had_progress =
                texturizer.elapsed > 0.0 || texturizer.state != TexturizerState::Idle;
            reset_texturizer(texturizer, effects);
            log::info!("[MilkTexturizer] Pitcher left the steam wand, progress reset");
            if had_progress {
                publish_event(
                    events,
                    SimEvent::StageAborted {
                        stage: StageKind::Steam,
                        processor: None,
                        reason: AbortReason::InputLost,
                    },
                );
            }
        }
    }

    if texturizer.pitcher.is_none() {
        texturizer.pitcher = zone_members(&scene.zones, texturizer.zone)
            .iter()
            .copied()
            .find(|prop| is_texturizable(scene, *prop));
        if let Some(pitcher) = texturizer.pitcher {
            log::info!("[MilkTexturizer] Pitcher {} detected under the wand", pitcher.0);
        }
    }

    let Some(pitcher) = texturizer.pitcher else {
        return;
    };

    if intensity >= texturizer.minimum_intensity {
        if texturizer.state != TexturizerState::Texturizing {
            if texturizer.state == TexturizerState::Idle {
                publish_event(
                    events,
                    SimEvent::StageStarted {
                        stage: StageKind::Steam,
                        processor: None,
                    },
                );
            }
            log::info!("[MilkTexturizer] Texturizing");
            texturizer.state = TexturizerState::Texturizing;
            set_effect(effects, TEXTURIZING_AUDIO, true);
        }

        texturizer.elapsed += dt;
        if texturizer.elapsed >= texturizer.duration {
            complete_texturizing(texturizer, pitcher, scene, effects, events);
        }
    } else if texturizer.state == TexturizerState::Texturizing {
        log::warn!("[MilkTexturizer] Not enough steam, pausing");
        texturizer.state = TexturizerState::Paused;
        set_effect(effects, TEXTURIZING_AUDIO, false);
    }
}

fn complete_texturizing(
    texturizer: &mut TexturizerData,
    pitcher: PropId,
    scene: &mut SceneBuffers,
    effects: &mut EffectDispatcher,
    events: &mut EventBusData,
) {
    match set_tag(&mut scene.registry, pitcher, Tag::PITCHER_WITH_TEXTURED_MILK) {
        Ok(from) => {
            texturizer.completed += 1;
            set_effect(effects, EffectId::Contents(pitcher, ContentsCue::Milk), false);
            set_effect(effects, EffectId::Contents(pitcher, ContentsCue::TexturedMilk), true);
            log::info!("[MilkTexturizer] Milk texturized");

            publish_event(
                events,
                SimEvent::TagChanged {
                    prop: pitcher,
                    from,
                    to: Tag::PITCHER_WITH_TEXTURED_MILK,
                },
            );
            publish_event(
                events,
                SimEvent::StageCompleted {
                    stage: StageKind::Steam,
                    processor: None,
                    target: pitcher,
                    tag: Tag::PITCHER_WITH_TEXTURED_MILK,
                },
            );
        }
        Err(err) => log::error!("[MilkTexturizer] Could not texturize: {}", err),
    }
    reset_texturizer(texturizer, effects);
}
