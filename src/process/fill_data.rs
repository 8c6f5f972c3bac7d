/// Fill Stage Data
///
/// Pure DOP - NO METHODS. Just data.
use rustc_hash::FxHashMap;

use crate::props::PropId;

/// Carton -> pitcher fill stage
#[derive(Debug, Clone)]
pub struct FillStageData {
    pub carton: PropId,
    pub min_angle: f32,
    pub max_angle: f32,
    pub duration: f32,
    pub fill_radius: f32,
    /// Carton stream visible
    pub streaming: bool,
    /// Pitcher currently under the stream
    pub receiving: Option<PropId>,
    /// Accumulated fill time per pitcher
    pub progress: FxHashMap<PropId, f32>,
    pub completed: u32,
}
