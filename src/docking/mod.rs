//! Docking - slots that claim exclusive ownership of props

pub mod slot_data;
pub mod slot_operations;

pub use slot_data::{
    CaptureError, DockingSlotData, IntegrityReport, ReleaseError, ReleaseMode, SlotId, SlotSpec,
    SlotTable,
};

// Re-export DOP operations
pub use slot_operations::{
    add_slot, check_capture, check_integrity, clear_all_slots, create_slot_table, get_slot,
    get_slot_mut, lock_slot, release, set_slot_active, slot_of_prop, slot_world_pose,
    try_capture, unlock_slot,
};
