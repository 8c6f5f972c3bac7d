/// Prop Data Structures
///
/// Pure DOP - NO METHODS. Just data.
/// Every physical object on the bar the user can pick up.
use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use crate::physics::{OwnershipState, Pose, RigidBodyData};

/// Prop identifier, dense index into the prop table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropId(pub u32);

/// Fixed physical kind of a prop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    Filter,
    Cup,
    Tamper,
    Pitcher,
    Carton,
}

/// A prop on the bar
#[derive(Debug, Clone)]
pub struct PropData {
    pub id: PropId,
    pub name: String,
    pub kind: PropKind,
    pub body: RigidBodyData,
    pub ownership: OwnershipState,
    pub active: bool,
    pub spawn_pose: Pose,
    /// Pour point in prop-local space
    pub spout_offset: Vector3<f32>,
    pub snap_search_radius: f32,
}

/// Creation parameters for a prop
#[derive(Debug, Clone)]
pub struct PropSpec {
    pub name: String,
    pub kind: PropKind,
    pub pose: Pose,
    pub spout_offset: Vector3<f32>,
    pub snap_search_radius: f32,
}

/// All props in the scene, indexed by `PropId`
#[derive(Debug, Clone, Default)]
pub struct PropTable {
    pub props: Vec<PropData>,
}
