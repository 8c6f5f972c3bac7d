/// Steam Station Data
///
/// Pure DOP - NO METHODS. Just data.
/// The steam knob sets an intensity; the texturizer zone under the wand turns
/// a filled pitcher's milk into textured milk while the intensity is high enough.
use cgmath::{Point3, Vector3};

use crate::interaction::ZoneId;
use crate::props::PropId;

/// Steam knob state
#[derive(Debug, Clone)]
pub struct SteamKnobData {
    /// Current rotation in degrees
    pub rotation: f32,
    pub min_rotation: f32,
    pub max_rotation: f32,
    /// Degrees per meter of tangential hand travel
    pub rotation_speed: f32,
    /// Knob center in world space
    pub center: Point3<f32>,
    /// Rotation axis in world space
    pub axis: Vector3<f32>,
    /// Hand position at the previous knob input, while grabbed
    pub last_hand: Option<Point3<f32>>,
    pub on_threshold: f32,
    pub max_emission: f32,
    pub max_volume: f32,
    pub steam_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexturizerState {
    Idle,
    Texturizing,
    Paused,
}

/// Texturizer under the steam wand
#[derive(Debug, Clone)]
pub struct TexturizerData {
    pub zone: ZoneId,
    pub duration: f32,
    pub minimum_intensity: f32,
    pub elapsed: f32,
    pub state: TexturizerState,
    /// Pitcher being worked on
    pub pitcher: Option<PropId>,
    pub completed: u32,
}
