/// Trigger Zone Data
///
/// Pure DOP - NO METHODS. Just data.
/// Proximity volumes reported by the physics layer (enter / stay / exit).
use serde::{Deserialize, Serialize};

use crate::props::PropId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// A trigger volume and the props currently inside it, in arrival order
#[derive(Debug, Clone)]
pub struct ZoneData {
    pub id: ZoneId,
    pub label: String,
    pub members: Vec<PropId>,
}

#[derive(Debug, Clone, Default)]
pub struct ZoneTable {
    pub zones: Vec<ZoneData>,
}
