//! Effect Operations
//!
//! The dispatcher forwards state changes to the sink and remembers what it
//! asked for. Without a sink the simulation keeps running and says so once.

use rustc_hash::FxHashMap;

use super::effect_data::{
    EffectCall, EffectDispatcher, EffectId, EffectSink, NullEffectSink, RecordingEffectSink,
};

impl EffectSink for RecordingEffectSink {
    fn set_active(&mut self, effect: EffectId, active: bool) {
        self.calls.lock().push(EffectCall::SetActive(effect, active));
    }

    fn set_level(&mut self, effect: EffectId, level: f32) {
        self.calls.lock().push(EffectCall::SetLevel(effect, level));
    }
}

impl EffectSink for NullEffectSink {
    fn set_active(&mut self, _effect: EffectId, _active: bool) {}
}

impl RecordingEffectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every call received so far
    pub fn recorded(&self) -> Vec<EffectCall> {
        self.calls.lock().clone()
    }

    /// Last activation state the sink was told for an effect
    pub fn last_state(&self, effect: EffectId) -> Option<bool> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            EffectCall::SetActive(id, active) if *id == effect => Some(*active),
            _ => None,
        })
    }
}

// ============================================================================
// DISPATCHER
// ============================================================================

pub fn create_effect_dispatcher(sink: Option<Box<dyn EffectSink>>) -> EffectDispatcher {
    EffectDispatcher {
        sink,
        active: FxHashMap::default(),
        levels: FxHashMap::default(),
        missing_sink_reported: false,
        calls_without_sink: 0,
    }
}

/// Attach or replace the sink. Current state is replayed so the new sink starts in sync.
pub fn attach_sink(dispatcher: &mut EffectDispatcher, mut sink: Box<dyn EffectSink>) {
    for (effect, active) in dispatcher.active.iter() {
        sink.set_active(*effect, *active);
    }
    for (effect, level) in dispatcher.levels.iter() {
        sink.set_level(*effect, *level);
    }
    dispatcher.sink = Some(sink);
    dispatcher.missing_sink_reported = false;
}

pub fn detach_sink(dispatcher: &mut EffectDispatcher) -> Option<Box<dyn EffectSink>> {
    dispatcher.sink.take()
}

fn with_sink<F>(dispatcher: &mut EffectDispatcher, effect: EffectId, call: F)
where
    F: FnOnce(&mut Box<dyn EffectSink>),
{
    match dispatcher.sink.as_mut() {
        Some(sink) => call(sink),
        None => {
            dispatcher.calls_without_sink += 1;
            if !dispatcher.missing_sink_reported {
                dispatcher.missing_sink_reported = true;
                log::warn!(
                    "[EffectDispatcher] No effect sink attached, continuing without presentation (first effect: {:?})",
                    effect
                );
            }
        }
    }
}

/// Switch an effect on or off. Repeated requests for the same state are not forwarded.
pub fn set_effect(dispatcher: &mut EffectDispatcher, effect: EffectId, active: bool) {
    if dispatcher.active.get(&effect) == Some(&active) {
        return;
    }
    dispatcher.active.insert(effect, active);
    with_sink(dispatcher, effect, |sink| sink.set_active(effect, active));
}

/// Switch a group of effects
pub fn set_effects(dispatcher: &mut EffectDispatcher, effects: &[EffectId], active: bool) {
    for effect in effects {
        set_effect(dispatcher, *effect, active);
    }
}

/// Set a continuous level. Unchanged levels are not forwarded.
pub fn set_effect_level(dispatcher: &mut EffectDispatcher, effect: EffectId, level: f32) {
    if let Some(previous) = dispatcher.levels.get(&effect) {
        if (previous - level).abs() <= f32::EPSILON {
            return;
        }
    }
    dispatcher.levels.insert(effect, level);
    with_sink(dispatcher, effect, |sink| sink.set_level(effect, level));
}

pub fn is_effect_active(dispatcher: &EffectDispatcher, effect: EffectId) -> bool {
    dispatcher.active.get(&effect).copied().unwrap_or(false)
}

pub fn effect_level(dispatcher: &EffectDispatcher, effect: EffectId) -> f32 {
    dispatcher.levels.get(&effect).copied().unwrap_or(0.0)
}

/// Switch every active effect off and zero every level
pub fn reset_effects(dispatcher: &mut EffectDispatcher) {
    let mut active: Vec<EffectId> = dispatcher
        .active
        .iter()
        .filter(|(_, on)| **on)
        .map(|(effect, _)| *effect)
        .collect();
    active.sort_by_key(|effect| format!("{:?}", effect));
    for effect in active {
        set_effect(dispatcher, effect, false);
    }

    let levels: Vec<EffectId> = dispatcher.levels.keys().copied().collect();
    for effect in levels {
        set_effect_level(dispatcher, effect, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::effect_data::{AudioCue, EmissionCue};

    #[test]
    fn test_forwards_changes_only() {
        let sink = RecordingEffectSink::new();
        let mut dispatcher = create_effect_dispatcher(Some(Box::new(sink.clone())));
        let grinder = EffectId::Audio(AudioCue::Grinder);

        set_effect(&mut dispatcher, grinder, true);
        set_effect(&mut dispatcher, grinder, true);
        set_effect(&mut dispatcher, grinder, false);

        assert_eq!(
            sink.recorded(),
            vec![
                EffectCall::SetActive(grinder, true),
                EffectCall::SetActive(grinder, false)
            ]
        );
        assert!(!is_effect_active(&dispatcher, grinder));
    }

    #[test]
    fn test_missing_sink_degrades_gracefully() {
        let mut dispatcher = create_effect_dispatcher(None);
        let steam = EffectId::Emission(EmissionCue::SteamJet);

        set_effect(&mut dispatcher, steam, true);
        set_effect_level(&mut dispatcher, steam, 25.0);

        assert!(is_effect_active(&dispatcher, steam));
        assert_eq!(effect_level(&dispatcher, steam), 25.0);
        assert!(dispatcher.missing_sink_reported);
        assert_eq!(dispatcher.calls_without_sink, 2);
    }

    #[test]
    fn test_attach_replays_state() {
        let mut dispatcher = create_effect_dispatcher(None);
        let steam = EffectId::Emission(EmissionCue::SteamJet);
        set_effect(&mut dispatcher, steam, true);

        let sink = RecordingEffectSink::new();
        attach_sink(&mut dispatcher, Box::new(sink.clone()));
        assert_eq!(sink.last_state(steam), Some(true));
    }

    #[test]
    fn test_reset_switches_everything_off() {
        let sink = RecordingEffectSink::new();
        let mut dispatcher = create_effect_dispatcher(Some(Box::new(sink.clone())));
        let steam = EffectId::Emission(EmissionCue::SteamJet);
        set_effect(&mut dispatcher, steam, true);
        set_effect_level(&mut dispatcher, steam, 40.0);

        reset_effects(&mut dispatcher);
        assert_eq!(sink.last_state(steam), Some(false));
        assert_eq!(effect_level(&dispatcher, steam), 0.0);
    }
}
