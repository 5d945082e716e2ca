//! Seven axis arm with a spherical shoulder, an elbow and a spherical wrist (KUKA iiwa, Franka and alike).
//! The redundant axis 3 is not solved but taken as a parameter, usually from the previous joints,
//! so that following a path keeps the elbow where it was.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::kinematic_traits::{Configuration, Inverse, Kinematics, Pose, SINGULARITY_TOL};
use crate::kinematics_impl::{dh_chain, dh_transform, finish_joints, wrist_angles};

const ALPHA: [f64; 7] = [
    -FRAC_PI_2, FRAC_PI_2, FRAC_PI_2, -FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2, 0.0,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedundantArm {
    /// Link offsets: shoulder height d\[0\], upper arm d\[2\], forearm d\[4\] and flange d\[6\].
    pub d: [f64; 7],
}

impl RedundantArm {
    pub fn new(d: [f64; 7]) -> Self {
        RedundantArm { d }
    }
}

impl Kinematics for RedundantArm {
    fn dof(&self) -> usize {
        7
    }

    fn forward(&self, joints: &[f64]) -> Vec<Pose> {
        dh_chain(joints, &self.d, &[0.0; 7], &ALPHA)
    }

    fn inverse(&self, flange: &Pose, configuration: Configuration, redundancy: f64) -> Inverse {
        let d = &self.d;
        let mut errors = Vec::new();
        let mut joints = vec![0.0; 7];
        joints[2] = redundancy;

        let shoulder = configuration.contains(Configuration::SHOULDER);
        let elbow = configuration.contains(Configuration::ELBOW);
        let wrist = !configuration.contains(Configuration::WRIST);

        let normal = flange.rotation * Vector3::z();
        let center = flange.translation.vector - normal * d[6];
        let w = center - Vector3::new(0.0, 0.0, d[0]);

        // Elbow from the shoulder to wrist distance
        let x = (w.norm_squared() - d[2] * d[2] - d[4] * d[4]) / (2.0 * d[2] * d[4]);
        if x.abs() > 1.0 {
            errors.push("Target out of reach.".to_string());
        }
        let q4 = x.clamp(-1.0, 1.0).acos();
        joints[3] = if elbow { -q4 } else { q4 };

        // Wrist centre in the frame of axis 2, depends on axes 3 and 4 only.
        let p = (dh_transform(joints[2], d[2], 0.0, ALPHA[2])
            * dh_transform(joints[3], d[3], 0.0, ALPHA[3]))
            * Point3::new(0.0, 0.0, d[4]);

        let radius = p.x.hypot(p.z);
        let x = if radius > SINGULARITY_TOL { w.z / radius } else { 2.0 };
        if x.abs() > 1.0 {
            errors.push("Target out of reach.".to_string());
        }
        let arc = x.clamp(-1.0, 1.0).acos();
        let phi = p.x.atan2(p.z);
        joints[1] = if shoulder { -phi - arc } else { -phi + arc };

        let v = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), joints[1])
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), ALPHA[1])
            * p.coords;
        if w.x.hypot(w.y) < 1e-6 {
            errors.push("Near shoulder singularity.".to_string());
        }
        joints[0] = w.y.atan2(w.x) - v.z.atan2(v.x);

        let arm = dh_chain(&joints[..4], &d[..4], &[0.0; 4], &ALPHA[..4]);
        let r04 = arm[3].rotation.to_rotation_matrix();
        let residual = r04.matrix().transpose() * flange.rotation.to_rotation_matrix().matrix();
        joints[4..7].copy_from_slice(&wrist_angles(&residual, wrist, &mut errors));

        finish_joints(&mut joints);
        Inverse { joints, errors }
    }

    fn redundancy(&self, previous: &[f64]) -> f64 {
        previous.get(2).copied().unwrap_or(0.0)
    }
}
