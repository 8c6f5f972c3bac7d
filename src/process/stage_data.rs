/// Stage Processor Data
///
/// Pure DOP - NO METHODS. Just data.
/// A docked stage is a timed transformation gated by the tags of the props
/// sitting in its input slots (grinder, tamper, espresso machine).
use serde::{Deserialize, Serialize};

use crate::docking::SlotId;
use crate::effects::{ContentsCue, EffectId};
use crate::props::{PropId, Tag};

/// Processor identifier, dense index into the session's processor list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessorId(pub u32);

/// Production stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Grind,
    Tamp,
    Extract,
    Steam,
    Pour,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageState {
    Idle,
    Running,
}

/// How a ready stage gets going
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StartMode {
    /// As soon as a slot event makes every input ready
    #[default]
    OnCapture,
    /// Arms when ready; waits for an explicit start request (a button)
    Manual,
}

/// One input slot and what must be in it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRequirement {
    pub slot: SlotId,
    pub occupant_tag: Tag,
    /// Tag the slot's parent prop must carry, for slots mounted on a prop
    pub parent_tag: Option<Tag>,
}

/// Which prop receives the output tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    Occupant(SlotId),
    SlotParent(SlotId),
}

/// Creation parameters for a processor
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub label: String,
    pub kind: StageKind,
    pub inputs: Vec<InputRequirement>,
    pub output_tag: Tag,
    pub output_target: OutputTarget,
    pub duration: f32,
    pub lock_inputs: bool,
    pub start_mode: StartMode,
    /// On while running
    pub activity_cues: Vec<EffectId>,
    /// Contents switched on in the target prop at completion
    pub completion_contents: Option<ContentsCue>,
}

#[derive(Debug, Clone, Default)]
pub struct StageMetrics {
    pub runs_started: u32,
    pub runs_completed: u32,
    pub runs_aborted: u32,
}

/// A docked stage processor
#[derive(Debug, Clone)]
pub struct StageProcessorData {
    pub id: ProcessorId,
    pub label: String,
    pub kind: StageKind,
    pub inputs: Vec<InputRequirement>,
    pub output_tag: Tag,
    pub output_target: OutputTarget,
    pub duration: f32,
    pub elapsed: f32,
    pub state: StageState,
    pub lock_inputs: bool,
    pub start_mode: StartMode,
    /// Manual mode: inputs ready and not running
    pub armed: bool,
    /// Occupant of each input slot when the run started
    pub snapshot: Vec<Option<PropId>>,
    /// Prop that receives the output tag, fixed at start
    pub target: Option<PropId>,
    /// Slots this run locked and must unlock
    pub locked_slots: Vec<SlotId>,
    pub activity_cues: Vec<EffectId>,
    pub completion_contents: Option<ContentsCue>,
    pub metrics: StageMetrics,
}
