/// Data-Oriented Pose System
///
/// Pure functions for rigid transforms - no methods, just data transformations.
use cgmath::{Deg, InnerSpace, MetricSpace, Point3, Quaternion, Rotation, Rotation3, Vector3};

/// Position plus orientation in world (or parent-local) space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3<f32>,
    pub rotation: Quaternion<f32>,
}

/// Identity rotation
/// Pure function - returns the unit quaternion
pub fn identity_rotation() -> Quaternion<f32> {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}

/// Create an upright pose at a position
pub fn pose_at(x: f32, y: f32, z: f32) -> Pose {
    Pose {
        position: Point3::new(x, y, z),
        rotation: identity_rotation(),
    }
}

/// Create a pose rotated `degrees` around `axis`
/// Pure function - axis is normalized before use
pub fn tilted_pose(position: Point3<f32>, axis: Vector3<f32>, degrees: f32) -> Pose {
    Pose {
        position,
        rotation: Quaternion::from_axis_angle(axis.normalize(), Deg(degrees)),
    }
}

/// Transform a local offset into world space
/// Pure function - rotates then translates
pub fn transform_point(pose: &Pose, local: Vector3<f32>) -> Point3<f32> {
    pose.position + pose.rotation.rotate_vector(local)
}

/// Compose a child pose given in parent-local space
/// Pure function - returns the child's world pose
pub fn compose_pose(parent: &Pose, local: &Pose) -> Pose {
    Pose {
        position: transform_point(parent, local.position - Point3::new(0.0, 0.0, 0.0)),
        rotation: parent.rotation * local.rotation,
    }
}

/// Local up axis expressed in world space
pub fn up_vector(pose: &Pose) -> Vector3<f32> {
    pose.rotation.rotate_vector(Vector3::unit_y())
}

/// Angle between the pose's up axis and world up, in degrees (0 upright, 180 upside down)
/// Pure function - clamps the dot product so rounding never yields NaN
pub fn tilt_degrees(pose: &Pose) -> f32 {
    let up = up_vector(pose);
    let magnitude = up.magnitude();
    if magnitude <= f32::EPSILON {
        return 0.0;
    }
    let cos = (up.dot(Vector3::unit_y()) / magnitude).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Distance between two points
pub fn distance(a: Point3<f32>, b: Point3<f32>) -> f32 {
    a.distance(b)
}

/// Positional difference between two poses, ignoring rotation
pub fn pose_distance(a: &Pose, b: &Pose) -> f32 {
    distance(a.position, b.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upright_pose_has_no_tilt() {
        assert!(tilt_degrees(&pose_at(1.0, 2.0, 3.0)).abs() < 1e-3);
    }

    #[test]
    fn test_tilt_matches_rotation() {
        let pose = tilted_pose(Point3::new(0.0, 0.0, 0.0), Vector3::unit_x(), 60.0);
        assert!((tilt_degrees(&pose) - 60.0).abs() < 1e-2);

        let flipped = tilted_pose(Point3::new(0.0, 0.0, 0.0), Vector3::unit_z(), 180.0);
        assert!((tilt_degrees(&flipped) - 180.0).abs() < 1e-2);
    }

    #[test]
    fn test_compose_follows_parent() {
        let parent = pose_at(1.0, 1.0, 0.0);
        let child = compose_pose(&parent, &pose_at(0.0, 0.05, 0.0));
        assert!((child.position.y - 1.05).abs() < 1e-5);
        assert!((child.position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_point_rotates_offset() {
        let pose = tilted_pose(Point3::new(0.0, 0.0, 0.0), Vector3::unit_z(), 90.0);
        let spout = transform_point(&pose, Vector3::new(0.0, 1.0, 0.0));
        assert!((spout.x + 1.0).abs() < 1e-4);
        assert!(spout.y.abs() < 1e-4);
    }
}
