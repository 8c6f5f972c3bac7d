/// Prop Operations
///
/// Pure functions for creating and querying props.
use cgmath::{Point3, Vector3};

use super::prop_data::{PropData, PropId, PropKind, PropSpec, PropTable};
use crate::constants;
use crate::physics::pose::transform_point;
use crate::physics::{set_free, OwnershipState, Pose, RigidBodyData};

impl PropSpec {
    /// Spec with the kind's default spout and search radius
    pub fn new(name: &str, kind: PropKind, pose: Pose) -> Self {
        Self {
            name: name.to_string(),
            kind,
            pose,
            spout_offset: default_spout_offset(kind),
            snap_search_radius: constants::docking::SNAP_SEARCH_RADIUS,
        }
    }
}

/// Where a prop of this kind pours from, in local space
pub fn default_spout_offset(kind: PropKind) -> Vector3<f32> {
    let offset = match kind {
        PropKind::Pitcher => constants::pouring::PITCHER_SPOUT_OFFSET,
        PropKind::Carton => constants::pouring::CARTON_SPOUT_OFFSET,
        _ => [0.0, 0.0, 0.0],
    };
    Vector3::new(offset[0], offset[1], offset[2])
}

/// Create an empty prop table
pub fn create_prop_table() -> PropTable {
    PropTable { props: Vec::new() }
}

/// Add a prop resting freely at its spawn pose
pub fn add_prop(table: &mut PropTable, spec: PropSpec) -> PropId {
    let id = PropId(table.props.len() as u32);
    let mut body = RigidBodyData {
        pose: spec.pose,
        linear_velocity: Vector3::new(0.0, 0.0, 0.0),
        angular_velocity: Vector3::new(0.0, 0.0, 0.0),
        is_kinematic: false,
        use_gravity: true,
    };
    set_free(&mut body);

    log::debug!("[Props::add_prop] {} ({:?}) registered as {:?}", spec.name, spec.kind, id);

    table.props.push(PropData {
        id,
        name: spec.name,
        kind: spec.kind,
        body,
        ownership: OwnershipState::Free,
        active: true,
        spawn_pose: spec.pose,
        spout_offset: spec.spout_offset,
        snap_search_radius: spec.snap_search_radius,
    });
    id
}

pub fn get_prop(table: &PropTable, id: PropId) -> Option<&PropData> {
    table.props.get(id.0 as usize)
}

pub fn get_prop_mut(table: &mut PropTable, id: PropId) -> Option<&mut PropData> {
    table.props.get_mut(id.0 as usize)
}

/// World-space pour point of a prop
pub fn spout_position(prop: &PropData) -> Point3<f32> {
    transform_point(&prop.body.pose, prop.spout_offset)
}

/// Ids of all props currently held by the user
pub fn held_props(table: &PropTable) -> Vec<PropId> {
    table
        .props
        .iter()
        .filter(|prop| prop.ownership == OwnershipState::Held)
        .map(|prop| prop.id)
        .collect()
}

/// Put every prop back where it spawned, free and active
pub fn respawn_all(table: &mut PropTable) {
    for prop in table.props.iter_mut() {
        prop.ownership = OwnershipState::Free;
        prop.active = true;
        prop.body.pose = prop.spawn_pose;
        set_free(&mut prop.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::pose::pose_at;

    #[test]
    fn test_add_prop_starts_free() {
        let mut table = create_prop_table();
        let cup = add_prop(&mut table, PropSpec::new("cup", PropKind::Cup, pose_at(0.0, 1.0, 0.0)));
        let pitcher = add_prop(
            &mut table,
            PropSpec::new("pitcher", PropKind::Pitcher, pose_at(1.0, 1.0, 0.0)),
        );

        assert_eq!(cup, PropId(0));
        assert_eq!(pitcher, PropId(1));
        let prop = get_prop(&table, cup).expect("cup exists");
        assert_eq!(prop.ownership, OwnershipState::Free);
        assert!(prop.body.use_gravity);
        assert!(!prop.body.is_kinematic);
        assert!(get_prop(&table, PropId(7)).is_none());
    }

    #[test]
    fn test_spout_follows_pose() {
        let mut table = create_prop_table();
        let id = add_prop(
            &mut table,
            PropSpec::new("pitcher", PropKind::Pitcher, pose_at(1.0, 1.0, 0.0)),
        );
        let spout = spout_position(get_prop(&table, id).expect("pitcher exists"));
        assert!((spout.y - 1.1).abs() < 1e-5);
        assert!((spout.z - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_respawn_restores_spawn_pose() {
        let mut table = create_prop_table();
        let id = add_prop(&mut table, PropSpec::new("cup", PropKind::Cup, pose_at(0.0, 1.0, 0.0)));
        if let Some(prop) = get_prop_mut(&mut table, id) {
            prop.body.pose = pose_at(5.0, 0.0, 5.0);
            prop.ownership = OwnershipState::Held;
            prop.active = false;
        }

        respawn_all(&mut table);
        let prop = get_prop(&table, id).expect("cup exists");
        assert_eq!(prop.body.pose, prop.spawn_pose);
        assert_eq!(prop.ownership, OwnershipState::Free);
        assert!(prop.active);
    }
}
