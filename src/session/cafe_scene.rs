//! Cafe Scene
//!
//! The standard bar: grinder, espresso machine with its cup stand, a tamper
//! that seats on the filter, the steam wand, a milk pitcher and a carton.

use cgmath::{Point3, Vector3};

use super::session_data::Session;
use super::session_operations::{
    add_stage, create_session, install_fill_station, install_pour_station, install_steam_station,
};
use crate::config::SimulationConfig;
use crate::constants;
use crate::docking::{SlotId, SlotSpec};
use crate::error::SimResult;
use crate::interaction::ZoneId;
use crate::physics::pose::pose_at;
use crate::physics::Pose;
use crate::process::{create_extract_stage, create_grind_stage, create_tamp_stage, ProcessorId};
use crate::props::{PropId, PropKind, PropSpec};
use crate::scene_buffers::{install_slot, install_zone, spawn_prop};

/// Handles to everything the cafe scene creates
#[derive(Debug, Clone, Copy)]
pub struct CafeHandles {
    pub filter: PropId,
    pub cup: PropId,
    pub tamper: PropId,
    pub pitcher: PropId,
    pub carton: PropId,

    pub grinder_slot: SlotId,
    pub group_head_slot: SlotId,
    pub cup_slot: SlotId,
    /// Rides on the filter
    pub tamper_seat: SlotId,

    pub steam_zone: ZoneId,

    pub grinder: ProcessorId,
    pub tamper_stage: ProcessorId,
    pub extraction: ProcessorId,

    pub steam_station: usize,
    pub pour_station: usize,
    pub fill_station: usize,
}

/// Scene layout in meters, counter top at y = 1.0
pub mod layout {
    pub const GRINDER: [f32; 3] = [0.0, 1.0, 0.0];
    pub const GROUP_HEAD: [f32; 3] = [0.6, 1.0, 0.0];
    pub const CUP_STAND: [f32; 3] = [0.6, 0.9, 0.1];
    pub const STEAM_KNOB: [f32; 3] = [1.2, 1.3, -0.2];

    pub const FILTER_SPAWN: [f32; 3] = [-0.4, 1.0, 0.0];
    pub const CUP_SPAWN: [f32; 3] = [1.0, 0.9, 0.0];
    pub const TAMPER_SPAWN: [f32; 3] = [-0.4, 1.0, 0.4];
    pub const PITCHER_SPAWN: [f32; 3] = [1.4, 1.0, 0.0];
    pub const CARTON_SPAWN: [f32; 3] = [1.8, 1.0, 0.0];
}

fn at(p: [f32; 3]) -> Pose {
    pose_at(p[0], p[1], p[2])
}

fn slot(label: &str, accepts: PropKind, position: [f32; 3], config: &SimulationConfig) -> SlotSpec {
    let mut spec = SlotSpec::new(label, accepts, at(position));
    spec.capture_radius = config.docking.capture_radius;
    spec
}

fn prop(name: &str, kind: PropKind, position: [f32; 3], config: &SimulationConfig) -> PropSpec {
    let mut spec = PropSpec::new(name, kind, at(position));
    spec.snap_search_radius = config.docking.snap_search_radius;
    spec
}

/// Build a session holding the standard cafe
pub fn build_cafe_scene(config: SimulationConfig) -> SimResult<(Session, CafeHandles)> {
    let mut session = create_session(config)?;
    let config = session.config.clone();
    let scene = &mut session.scene;

    let filter = spawn_prop(scene, prop("filter", PropKind::Filter, layout::FILTER_SPAWN, &config));
    let cup = spawn_prop(scene, prop("cup", PropKind::Cup, layout::CUP_SPAWN, &config));
    let tamper = spawn_prop(scene, prop("tamper", PropKind::Tamper, layout::TAMPER_SPAWN, &config));
    let pitcher = spawn_prop(
        scene,
        prop("milk pitcher", PropKind::Pitcher, layout::PITCHER_SPAWN, &config),
    );
    let carton = spawn_prop(
        scene,
        prop("milk carton", PropKind::Carton, layout::CARTON_SPAWN, &config),
    );

    let grinder_slot = install_slot(scene, slot("grinder", PropKind::Filter, layout::GRINDER, &config));
    let group_head_slot = install_slot(
        scene,
        slot("group head", PropKind::Filter, layout::GROUP_HEAD, &config),
    );
    let cup_slot = install_slot(scene, slot("cup stand", PropKind::Cup, layout::CUP_STAND, &config));
    let mut seat = slot(
        "tamper seat",
        PropKind::Tamper,
        constants::docking::TAMPER_SEAT_OFFSET,
        &config,
    );
    seat.parent = Some(filter);
    let tamper_seat = install_slot(scene, seat);

    let steam_zone = install_zone(scene, "steam wand");

    let grinder = add_stage(&mut session, create_grind_stage(grinder_slot, &config.grinder));
    let tamper_stage = add_stage(&mut session, create_tamp_stage(tamper_seat, &config.tamper));
    let extraction = add_stage(
        &mut session,
        create_extract_stage(group_head_slot, cup_slot, &config.extraction),
    );

    let knob = layout::STEAM_KNOB;
    let steam_station = install_steam_station(
        &mut session,
        steam_zone,
        Point3::new(knob[0], knob[1], knob[2]),
        Vector3::unit_z(),
    );
    let pour_station = install_pour_station(&mut session, pitcher);
    let fill_station = install_fill_station(&mut session, carton);

    log::info!(
        "[CafeScene] Built {} props, {} slots, {} stages",
        session.scene.props.props.len(),
        session.scene.slots.slots.len(),
        session.processors.len()
    );

    Ok((
        session,
        CafeHandles {
            filter,
            cup,
            tamper,
            pitcher,
            carton,
            grinder_slot,
            group_head_slot,
            cup_slot,
            tamper_seat,
            steam_zone,
            grinder,
            tamper_stage,
            extraction,
            steam_station,
            pour_station,
            fill_station,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docking::slot_world_pose;
    use crate::props::{get_tag, Tag};

    #[test]
    fn test_cafe_scene_layout() {
        let (session, handles) = build_cafe_scene(SimulationConfig::default()).expect("scene");
        assert_eq!(session.scene.props.props.len(), 5);
        assert_eq!(session.scene.slots.slots.len(), 4);
        assert_eq!(session.processors.len(), 3);
        assert!(session.steam_knob.is_some());
        assert_eq!(get_tag(&session.scene.registry, handles.pitcher), Some(Tag::PITCHER));
        assert_eq!(get_tag(&session.scene.registry, handles.carton), Some(Tag::CARTON));
    }

    #[test]
    fn test_tamper_seat_sits_on_filter() {
        let (session, handles) = build_cafe_scene(SimulationConfig::default()).expect("scene");
        let seat = &session.scene.slots.slots[handles.tamper_seat.0 as usize];
        let pose = slot_world_pose(seat, &session.scene.props);
        let filter = layout::FILTER_SPAWN;
        assert!((pose.position.x - filter[0]).abs() < 1e-6);
        assert!((pose.position.y - (filter[1] + 0.05)).abs() < 1e-6);
        assert!((pose.position.z - filter[2]).abs() < 1e-6);
    }
}
