/// Rigid Body Data
///
/// Pure DOP - NO METHODS. Just data.
/// The body record the external physics engine mirrors for each prop.
use cgmath::Vector3;

use super::pose::Pose;

/// Rigid body state for one prop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBodyData {
    pub pose: Pose,
    pub linear_velocity: Vector3<f32>,
    pub angular_velocity: Vector3<f32>,
    pub is_kinematic: bool,
    pub use_gravity: bool,
}

/// The two flags ownership is allowed to dictate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyFlags {
    pub is_kinematic: bool,
    pub use_gravity: bool,
}

impl BodyFlags {
    /// Docked bodies are pinned to their slot
    pub const DOCKED: Self = Self {
        is_kinematic: true,
        use_gravity: false,
    };

    /// Free and released bodies fall under gravity
    pub const DYNAMIC: Self = Self {
        is_kinematic: false,
        use_gravity: true,
    };
}
