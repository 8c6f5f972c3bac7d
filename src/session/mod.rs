//! Session - one bar, one frame loop
//!
//! The session owns the scene, the stage processors, the continuous stations
//! and the event bus. Everything outside talks to it through the functions in
//! `session_operations` or by pushing `InputEvent`s onto its queue.

pub mod cafe_scene;
pub mod input_data;
pub mod input_operations;
pub mod session_data;
pub mod session_operations;
pub mod snapshot;


pub use cafe_scene::{build_cafe_scene, layout, CafeHandles};
pub use input_data::{InputEvent, InputMetrics, InputQueueData};
pub use session_data::{FrameInfo, Session, SharedSession, TickReport};
pub use snapshot::{
    snapshot, snapshot_json, ProcessorSnapshot, PropSnapshot, SessionSnapshot, SlotSnapshot,
};

// Re-export DOP operations
pub use input_operations::{create_input_queue, drain_inputs, pending_inputs, queue_input};
pub use session_operations::{
    add_stage, capture, create_session, create_shared_session, drain_events, get_tag, grab_end,
    grab_knob, grab_start, input_sender, install_fill_station, install_pour_station,
    install_steam_station, move_knob_hand, ownership_violations, queue, release_knob,
    release_slot, request_stage_start, reset_scene, set_effect_sink, set_knob, set_tag,
    shutdown_session, steam_intensity, tick, try_capture, update_pose, zone_enter, zone_exit,
};

static_assertions::assert_impl_all!(Session: Send, Sync);
