//! Helper functions

use crate::kinematic_traits::Pose;
use nalgebra::{Translation3, UnitQuaternion, Vector3};
use std::f64::consts::PI;

/// Reduces the angle into (-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Shortest signed angular distance from `from` to `to`.
pub fn angle_difference(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Maps every joint onto the 2*pi continuation nearest to the corresponding previous joint,
/// after reducing it into (-pi, pi]. This keeps interpolated paths free of full turn jumps.
/// Joints without a previous value are only normalized.
pub fn absolute_joints(joints: &[f64], previous: &[f64]) -> Vec<f64> {
    joints
        .iter()
        .enumerate()
        .map(|(i, &joint)| {
            let value = normalize_angle(joint);
            match previous.get(i) {
                Some(&prev) if prev.is_finite() => {
                    let turns = ((prev - value) / (2.0 * PI)).round();
                    value + turns * 2.0 * PI
                }
                _ => value,
            }
        })
        .collect()
}

/// Sum of squared shortest angular differences.
pub fn squared_difference(joints: &[f64], previous: &[f64]) -> f64 {
    joints
        .iter()
        .zip(previous.iter())
        .map(|(&a, &b)| {
            let d = angle_difference(b, a);
            d * d
        })
        .sum()
}

/// Linear interpolation between `a` and `b`, `t` mapped from [start, end] to [0, 1].
pub fn lerp(a: f64, b: f64, t: f64, start: f64, end: f64) -> f64 {
    if (end - start).abs() < f64::EPSILON {
        return b;
    }
    let s = (t - start) / (end - start);
    a + (b - a) * s
}

/// Per element [lerp]. Missing elements in `a` are taken from `b`.
pub fn lerp_joints(a: &[f64], b: &[f64], t: f64, start: f64, end: f64) -> Vec<f64> {
    b.iter()
        .enumerate()
        .map(|(i, &to)| lerp(a.get(i).copied().unwrap_or(to), to, t, start, end))
        .collect()
}

/// Position lerp with shortest path quaternion slerp. Falls back to normalized linear
/// interpolation when the rotations are opposite and slerp is undefined.
pub fn lerp_pose(a: &Pose, b: &Pose, t: f64, start: f64, end: f64) -> Pose {
    let s = if (end - start).abs() < f64::EPSILON {
        1.0
    } else {
        (t - start) / (end - start)
    };
    let translation = a.translation.vector.lerp(&b.translation.vector, s);
    let rotation = a
        .rotation
        .try_slerp(&b.rotation, s, 1e-9)
        .unwrap_or_else(|| a.rotation.nlerp(&b.rotation, s));
    Pose::from_parts(Translation3::from(translation), rotation)
}

/// Angle between the Z (normal) axes and between the X axes of two poses, the larger one.
pub fn rotation_angle(a: &Pose, b: &Pose) -> f64 {
    let normal = (a.rotation * Vector3::z()).angle(&(b.rotation * Vector3::z()));
    let x_axis = (a.rotation * Vector3::x()).angle(&(b.rotation * Vector3::x()));
    normal.max(x_axis)
}

/// Pose from x, y, z in millimeters and roll, pitch, yaw in degrees.
pub fn pose_from_xyz_rpy(values: &[f64; 6]) -> Pose {
    Pose::from_parts(
        Translation3::new(values[0], values[1], values[2]),
        UnitQuaternion::from_euler_angles(
            values[3].to_radians(),
            values[4].to_radians(),
            values[5].to_radians(),
        ),
    )
}

/// Formats joint values converting radians to degrees.
pub fn format_joints(joints: &[f64]) -> String {
    let values: Vec<String> = joints
        .iter()
        .map(|j| format!("{:5.2}", j.to_degrees()))
        .collect();
    format!("[{}]", values.join(" "))
}

/// Print joint values, converting radians to degrees.
pub fn dump_joints(joints: &[f64]) {
    println!("{}", format_joints(joints));
}

/// Print the pose translation and rotation (roll, pitch, yaw in degrees).
pub fn dump_pose(pose: &Pose) {
    let t = pose.translation.vector;
    let (roll, pitch, yaw) = pose.rotation.euler_angles();
    println!(
        "[{:8.2} {:8.2} {:8.2}] rpy [{:7.2} {:7.2} {:7.2}]",
        t.x,
        t.y,
        t.z,
        roll.to_degrees(),
        pitch.to_degrees(),
        yaw.to_degrees()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-12);
        assert!((normalize_angle(-2.0 * PI - 0.5) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_absolute_joints_follow_previous_turn() {
        let previous = [3.1, -3.1, 7.0];
        let raw = [-3.1, 3.1, 0.8];
        let absolute = absolute_joints(&raw, &previous);
        for (a, p) in absolute.iter().zip(previous.iter()) {
            assert!((a - p).abs() < PI, "{a} jumped away from {p}");
        }
        assert!((absolute[0] - (2.0 * PI - 3.1)).abs() < 1e-12);
        assert!((absolute[2] - (0.8 + 2.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_lerp_pose_midpoint() {
        let a = Pose::translation(0.0, 0.0, 500.0);
        let b = Pose::from_parts(
            Translation3::new(300.0, 0.0, 500.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.0),
        );
        let mid = lerp_pose(&a, &b, 0.5, 0.0, 1.0);
        assert!((mid.translation.x - 150.0).abs() < 1e-9);
        assert!((mid.rotation.angle() - 0.5).abs() < 1e-9);
    }
}
