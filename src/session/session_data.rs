//! Session Data
//!
//! Pure DOP - NO METHODS. Just data.
//! One session owns the whole bar: scene tables, processors, stations, the
//! event bus and the effect dispatcher. Nothing here is global.

use std::sync::Arc;

use parking_lot::RwLock;

use super::input_data::InputQueueData;
use crate::config::SimulationConfig;
use crate::effects::EffectDispatcher;
use crate::events::EventBusData;
use crate::interaction::RouterData;
use crate::physics::ReconcileTimerData;
use crate::process::{
    FillStageData, PourStageData, StageProcessorData, SteamKnobData, TexturizerData,
};
use crate::scene_buffers::SceneBuffers;

/// Frame bookkeeping
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInfo {
    pub frame_number: u64,
    /// Simulated seconds since the session was created
    pub elapsed_time: f64,
    /// Clamped delta of the last tick
    pub last_delta: f32,
}

/// Per-tick summary, mostly for logs and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub inputs_applied: usize,
    pub events_dispatched: usize,
    pub bodies_healed: usize,
    pub occupants_recovered: usize,
}

/// The simulation
pub struct Session {
    pub config: SimulationConfig,
    pub scene: SceneBuffers,

    /// Docked stages, indexed by `ProcessorId`
    pub processors: Vec<StageProcessorData>,

    /// Continuous stations
    pub steam_knob: Option<SteamKnobData>,
    pub texturizers: Vec<TexturizerData>,
    pub pours: Vec<PourStageData>,
    pub fills: Vec<FillStageData>,

    pub router: RouterData,
    pub events: EventBusData,
    pub effects: EffectDispatcher,
    pub reconcile_timer: ReconcileTimerData,
    pub input: InputQueueData,
    pub frame: FrameInfo,
}

/// Thread-safe shared session (Arc<RwLock<>>)
pub type SharedSession = Arc<RwLock<Session>>;
