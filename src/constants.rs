//! Simulation constants
//!
//! Default parameters for the café. Every value here can be overridden through
//! [`crate::config::SimulationConfig`]; these are the numbers the bar was tuned with.

/// Docking defaults
pub mod docking {
    /// Maximum distance between a slot and a prop for a capture to succeed (meters)
    pub const CAPTURE_RADIUS: f32 = 0.15;

    /// Radius a released prop searches for a slot to snap into (meters)
    pub const SNAP_SEARCH_RADIUS: f32 = 0.2;

    /// Local offset of the tamper seat above the filter basket
    pub const TAMPER_SEAT_OFFSET: [f32; 3] = [0.0, 0.05, 0.0];
}

/// Ownership enforcement timing
pub mod timing {
    /// Interval between physics reconciliation passes (seconds)
    pub const RECONCILE_INTERVAL: f32 = 0.2;

    /// Delay before a released prop gets its first physics check (seconds)
    pub const RELEASE_CHECK_DELAY: f32 = 0.3;

    /// Upper bound for a single frame delta; longer frames are clamped
    pub const MAX_FRAME_DELTA: f32 = 0.25;

    /// Dispatch passes per frame before the event loop gives up
    pub const MAX_DISPATCH_PASSES: usize = 8;
}

/// Stage durations (seconds)
pub mod stages {
    pub const GRIND_DURATION: f32 = 10.0;
    pub const PRESS_TIME: f32 = 2.0;
    pub const EXTRACTION_DURATION: f32 = 15.0;
    pub const TEXTURIZING_TIME: f32 = 20.0;
    pub const POUR_TIME_TO_COMPLETE: f32 = 2.0;
    pub const TIME_TO_FILL: f32 = 5.0;
}

/// Steam knob and wand
pub mod steam {
    pub const MIN_ROTATION: f32 = 0.0;
    pub const MAX_ROTATION: f32 = 180.0;

    /// Degrees of knob rotation per meter of tangential hand travel
    pub const ROTATION_SPEED: f32 = 100.0;

    /// Minimum intensity (0-1) the texturizer needs to make progress
    pub const MINIMUM_INTENSITY: f32 = 0.3;

    /// Intensity above which the steam jet is considered on
    pub const STEAM_ON_THRESHOLD: f32 = 0.01;

    pub const MAX_EMISSION: f32 = 50.0;
    pub const MAX_VOLUME: f32 = 0.8;
}

/// Pouring geometry
pub mod pouring {
    /// Pitcher tilt (degrees from upright) beyond which milk flows
    pub const POUR_ANGLE: f32 = 45.0;

    /// Maximum spout-to-cup distance for a pour to count (meters)
    pub const MAX_POUR_DISTANCE: f32 = 0.3;

    /// Spout position in pitcher-local space
    pub const PITCHER_SPOUT_OFFSET: [f32; 3] = [0.0, 0.1, 0.05];

    /// Carton tilt window (degrees from upright)
    pub const CARTON_MIN_POUR_ANGLE: f32 = 45.0;
    pub const CARTON_MAX_POUR_ANGLE: f32 = 135.0;

    /// Spout position in carton-local space
    pub const CARTON_SPOUT_OFFSET: [f32; 3] = [0.0, 0.12, 0.03];

    /// Maximum carton-spout to pitcher distance while filling (meters)
    pub const FILL_RADIUS: f32 = 0.25;
}

/// Event bus limits
pub mod events {
    /// Events kept for external consumers before new ones are dropped
    pub const MAX_OUTBOX: usize = 4096;
    /// Inputs buffered between ticks before new ones are dropped
    pub const MAX_INPUT_QUEUE: usize = 1024;
}
