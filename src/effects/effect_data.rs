//! Effect Data
//!
//! Names of the presentation effects the simulation switches, and the sink
//! trait the rendering and audio layers implement.
//!
//! Pure DOP: No methods, just data structures.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::docking::SlotId;
use crate::process::ProcessorId;
use crate::props::PropId;

/// Particle systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmissionCue {
    GrinderParticles,
    CompactParticles,
    EspressoStream,
    SteamJet,
    CartonStream,
    MilkPourStream,
    MixingParticles,
}

/// Looping and one-shot sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    Grinder,
    Press,
    Extraction,
    Steam,
    Texturizing,
    MilkFill,
    Pour,
    Mixing,
}

/// Visible contents of a vessel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentsCue {
    GroundCoffee,
    Espresso,
    Milk,
    TexturedMilk,
    Cappuccino,
}

/// Identifier of one presentation effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectId {
    Emission(EmissionCue),
    Audio(AudioCue),
    Contents(PropId, ContentsCue),
    /// Ghost outline shown on an empty slot
    SlotIndicator(SlotId),
    /// Lit while a manual-start stage is armed
    ReadyIndicator(ProcessorId),
}

/// Presentation layer. Calls are fire-and-forget.
pub trait EffectSink: Send + Sync {
    fn set_active(&mut self, effect: EffectId, active: bool);

    /// Continuous level (emission rate, volume). Sinks without levels ignore it.
    fn set_level(&mut self, _effect: EffectId, _level: f32) {}
}

/// Effect state as the simulation last requested it
pub struct EffectDispatcher {
    pub sink: Option<Box<dyn EffectSink>>,
    pub active: FxHashMap<EffectId, bool>,
    pub levels: FxHashMap<EffectId, f32>,
    pub missing_sink_reported: bool,
    pub calls_without_sink: u64,
}

/// One call received by a recording sink
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectCall {
    SetActive(EffectId, bool),
    SetLevel(EffectId, f32),
}

/// Sink that records every call into a shared log
#[derive(Clone, Default)]
pub struct RecordingEffectSink {
    pub calls: Arc<Mutex<Vec<EffectCall>>>,
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEffectSink;
