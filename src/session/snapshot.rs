//! Session Snapshot
//!
//! A serializable, read-only view of the bar for renderers, debuggers and
//! analytics. Taking one never changes the session.

use serde::{Deserialize, Serialize};

use super::session_data::Session;
use super::session_operations::steam_intensity;
use crate::docking::SlotId;
use crate::error::{SimError, SimResult};
use crate::physics::OwnershipState;
use crate::process::{
    pour_progress, stage_progress, texturizer_progress, ProcessorId, StageKind, StageState,
};
use crate::props::{get_tag, PropId, PropKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSnapshot {
    pub id: PropId,
    pub name: String,
    pub kind: PropKind,
    /// Display name of the current tag
    pub tag: String,
    pub ownership: OwnershipState,
    pub position: [f32; 3],
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub id: SlotId,
    pub label: String,
    pub occupant: Option<PropId>,
    pub locked: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorSnapshot {
    pub id: ProcessorId,
    pub label: String,
    pub kind: StageKind,
    pub state: StageState,
    /// Fraction of the current run, in [0, 1]
    pub progress: f32,
    pub armed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub frame_number: u64,
    pub elapsed_time: f64,
    pub props: Vec<PropSnapshot>,
    pub slots: Vec<SlotSnapshot>,
    pub processors: Vec<ProcessorSnapshot>,
    pub steam_intensity: f32,
    pub texturizer_progress: Vec<f32>,
    pub pour_progress: Vec<f32>,
    pub outbox_len: usize,
    pub events_dropped: u64,
}

/// Capture the current state
pub fn snapshot(session: &Session) -> SessionSnapshot {
    let props = session
        .scene
        .props
        .props
        .iter()
        .map(|prop| PropSnapshot {
            id: prop.id,
            name: prop.name.clone(),
            kind: prop.kind,
            tag: get_tag(&session.scene.registry, prop.id)
                .map(|tag| tag.to_string())
                .unwrap_or_default(),
            ownership: prop.ownership,
            position: prop.body.pose.position.into(),
            active: prop.active,
        })
        .collect();

    let slots = session
        .scene
        .slots
        .slots
        .iter()
        .map(|slot| SlotSnapshot {
            id: slot.id,
            label: slot.label.clone(),
            occupant: slot.occupant,
            locked: slot.locked,
            active: slot.active,
        })
        .collect();

    let processors = session
        .processors
        .iter()
        .map(|processor| ProcessorSnapshot {
            id: processor.id,
            label: processor.label.clone(),
            kind: processor.kind,
            state: processor.state,
            progress: stage_progress(processor),
            armed: processor.armed,
        })
        .collect();

    SessionSnapshot {
        frame_number: session.frame.frame_number,
        elapsed_time: session.frame.elapsed_time,
        props,
        slots,
        processors,
        steam_intensity: steam_intensity(session),
        texturizer_progress: session.texturizers.iter().map(texturizer_progress).collect(),
        pour_progress: session.pours.iter().map(pour_progress).collect(),
        outbox_len: session.events.outbox.len(),
        events_dropped: session.events.metrics.events_dropped,
    }
}

/// Snapshot as pretty-printed JSON
pub fn snapshot_json(session: &Session) -> SimResult<String> {
    serde_json::to_string_pretty(&snapshot(session)).map_err(|e| SimError::SerializationError {
        context: "session snapshot".to_string(),
        error: e.to_string(),
    })
}
