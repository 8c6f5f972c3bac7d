/// Process & Transform System
///
/// Timed transformations that move props through their production tags.
/// Docked stages (grinder, tamper, espresso machine) are slot-driven state
/// machines; the steam, pour and fill stations are continuous scans the
/// session runs every frame. Purely data-oriented - no process "objects",
/// just tables of data.

pub mod fill_data;
pub mod fill_operations;
pub mod pour_data;
pub mod pour_operations;
pub mod stage_data;
pub mod stage_operations;
pub mod steam_data;
pub mod steam_operations;

pub use fill_data::FillStageData;
pub use pour_data::PourStageData;
pub use stage_data::{
    InputRequirement, OutputTarget, ProcessorId, StageKind, StageMetrics, StageProcessorData,
    StageSpec, StageState, StartMode,
};
pub use steam_data::{SteamKnobData, TexturizerData, TexturizerState};

// Re-export DOP operations
pub use fill_operations::{carton_streaming, create_fill_stage, fill_progress, reset_fill, tick_fill};
pub use pour_operations::{
    create_pour_stage, nearest_vessel_below, pour_progress, pour_target, reset_pour, stop_pouring,
    tick_pour,
};
pub use stage_operations::{
    abort, create_extract_stage, create_grind_stage, create_processor, create_tamp_stage,
    evaluate_preconditions, input_slots, occupancy_snapshot, on_slot_event, refresh_armed,
    request_start, reset_processor, resolve_target, stage_progress, tick_processor,
};
pub use steam_operations::{
    begin_knob_turn, create_steam_knob, create_texturizer, end_knob_turn, inverse_lerp,
    knob_intensity, reset_knob, reset_texturizer, set_knob_rotation, texturizer_progress,
    tick_texturizer, turn_knob_with_hand, update_steam_output,
};
