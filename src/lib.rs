// Barista Engine - Data-Oriented Programming (DOP) Architecture
//
// Interaction and process coordination for a hands-on coffee bar:
// docking slots, physics ownership, the held-object router, timed stages
// and the tag registry that tracks what every prop has become.
//
// For new code, prefer:
// - session::Session as the single owner of all scene state
// - *_operations modules for data transformations
// - Pure functions over methods

// Constants module
pub mod constants;

// Core modules
pub mod config;
pub mod error;
pub mod scene_buffers;

// Scene state
pub mod physics;
pub mod props;
pub mod spatial;

// Coordination
pub mod docking;
pub mod effects;
pub mod events;
pub mod interaction;
pub mod process;
pub mod session;

pub use config::{ConfigError, SimulationConfig};
pub use error::{OptionExt, SimError, SimResult};
pub use scene_buffers::{create_scene_buffers, SceneBuffers};

// === Core Types ===
pub use docking::{DockingSlotData, ReleaseMode, SlotId, SlotSpec};
pub use effects::{EffectId, EffectSink, NullEffectSink, RecordingEffectSink};
pub use events::{AbortReason, EventTopic, SimEvent};
pub use interaction::ZoneId;
pub use physics::{OwnershipState, Pose};
pub use process::{ProcessorId, StageKind, StageState, StartMode};
pub use props::{PropId, PropKind, PropSpec, Tag};
pub use session::{
    build_cafe_scene, create_session, create_shared_session, tick, CafeHandles, InputEvent,
    Session, SessionSnapshot, SharedSession, TickReport,
};
