//! Effects - presentation signals (particles, audio, visible contents)
//!
//! The simulation never renders or plays anything itself. It tells an
//! [`EffectSink`] what should be on, and keeps running if nobody listens.

pub mod effect_data;
pub mod effect_operations;

pub use effect_data::{
    AudioCue, ContentsCue, EffectCall, EffectDispatcher, EffectId, EffectSink, EmissionCue,
    NullEffectSink, RecordingEffectSink,
};

// Re-export DOP operations
pub use effect_operations::{
    attach_sink, create_effect_dispatcher, detach_sink, effect_level, is_effect_active,
    reset_effects, set_effect, set_effect_level, set_effects,
};

static_assertions::assert_impl_all!(RecordingEffectSink: Send, Sync, Clone);
static_assertions::assert_impl_all!(EffectDispatcher: Send, Sync);
