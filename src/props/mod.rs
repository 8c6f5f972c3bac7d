//! Props - the physical objects on the bar and their production tags

pub mod classification_data;
pub mod classification_operations;
pub mod prop_data;
pub mod prop_operations;

pub use classification_data::{ClassificationRegistry, CupStage, FilterStage, PitcherStage, Tag};
pub use prop_data::{PropData, PropId, PropKind, PropSpec, PropTable};

// Re-export DOP operations
pub use classification_operations::{
    allowed_successors, base_tag, create_registry, get_tag, is_allowed_transition,
    register_prop, reset_all, set_tag,
};
pub use prop_operations::{
    add_prop, create_prop_table, default_spout_offset, get_prop, get_prop_mut, held_props,
    respawn_all, spout_position,
};
