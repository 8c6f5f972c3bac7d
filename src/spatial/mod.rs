//! Spatial registry - proximity queries without scanning the whole scene

pub mod kind_index;

pub use kind_index::{
    create_kind_index, index_prop, index_slot, nearest_within, props_of_kind, slots_of_kind,
    KindIndex,
};
