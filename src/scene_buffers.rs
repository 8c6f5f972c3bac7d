//! Central SceneBuffers
//!
//! The tables every subsystem reads and writes: props, slots, tags, the kind
//! index and trigger zones. Operations modules transform this data; the
//! struct itself has no methods.

use crate::docking::{add_slot, create_slot_table, SlotId, SlotSpec, SlotTable};
use crate::interaction::{add_zone, create_zone_table, ZoneId, ZoneTable};
use crate::props::{
    add_prop, base_tag, create_prop_table, create_registry, register_prop, ClassificationRegistry,
    PropId, PropSpec, PropTable,
};
use crate::spatial::{create_kind_index, index_prop, index_slot, KindIndex};

/// Scene state shared by docking, routing and processing
#[derive(Debug, Clone, Default)]
pub struct SceneBuffers {
    pub props: PropTable,
    pub slots: SlotTable,
    pub registry: ClassificationRegistry,
    pub index: KindIndex,
    pub zones: ZoneTable,
}

/// Create empty scene buffers
pub fn create_scene_buffers() -> SceneBuffers {
    SceneBuffers {
        props: create_prop_table(),
        slots: create_slot_table(),
        registry: create_registry(),
        index: create_kind_index(),
        zones: create_zone_table(),
    }
}

/// Add a prop, tag it with its kind's base tag and index it
pub fn spawn_prop(scene: &mut SceneBuffers, spec: PropSpec) -> PropId {
    let kind = spec.kind;
    let id = add_prop(&mut scene.props, spec);
    register_prop(&mut scene.registry, id, base_tag(kind));
    index_prop(&mut scene.index, kind, id);
    id
}

/// Add a slot and index it under the kind it accepts
pub fn install_slot(scene: &mut SceneBuffers, spec: SlotSpec) -> SlotId {
    let kind = spec.accepts;
    let id = add_slot(&mut scene.slots, spec);
    index_slot(&mut scene.index, kind, id);
    id
}

pub fn install_zone(scene: &mut SceneBuffers, label: &str) -> ZoneId {
    add_zone(&mut scene.zones, label)
}
