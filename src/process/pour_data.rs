/// Pour Stage Data
///
/// Pure DOP - NO METHODS. Just data.
/// A continuous scan driven by the held, tilted pitcher of textured milk.
use crate::props::PropId;

/// Pitcher -> cup combine stage
#[derive(Debug, Clone)]
pub struct PourStageData {
    pub pitcher: PropId,
    /// Tilt beyond which milk flows, in degrees
    pub pour_angle: f32,
    pub duration: f32,
    /// Cups must be strictly closer than this to the spout
    pub max_distance: f32,
    pub elapsed: f32,
    pub pouring: bool,
    pub target_cup: Option<PropId>,
    /// Mixing cues fired by the last completion, cleared on the next tick
    pub mixing_cue_live: bool,
    pub completed: u32,
}
