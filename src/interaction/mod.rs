//! Interaction - the grab layer's entry point and proximity zones

pub mod router_data;
pub mod router_operations;
pub mod zone_data;
pub mod zone_operations;

pub use router_data::{RouterData, RouterMetrics};
pub use zone_data::{ZoneData, ZoneId, ZoneTable};

// Re-export DOP operations
pub use router_operations::{
    create_router, find_nearest_slot, force_capture, on_grab_end, on_grab_start,
    tick_release_checks, update_held_pose,
};
pub use zone_operations::{
    add_zone, clear_zones, create_zone_table, enter_zone, exit_zone, get_zone, is_in_zone,
    zone_members,
};
