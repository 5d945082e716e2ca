//! Six axis arm with an offset wrist, as collaborative arms (UR and alike) are built.

use std::f64::consts::FRAC_PI_2;

use nalgebra::Vector3;

use crate::kinematic_traits::{Configuration, Inverse, Kinematics, Pose, SINGULARITY_TOL};
use crate::kinematics_impl::{dh_chain, dh_transform, finish_joints};

const ALPHA: [f64; 6] = [FRAC_PI_2, 0.0, 0.0, FRAC_PI_2, -FRAC_PI_2, 0.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetWrist {
    /// DH link lengths, a\[1\] and a\[2\] are the upper arm and forearm (negative on UR arms).
    pub a: [f64; 6],
    /// DH link offsets d\[0\], d\[3\], d\[4\] and d\[5\].
    pub d: [f64; 6],
}

impl OffsetWrist {
    pub fn new(a: [f64; 6], d: [f64; 6]) -> Self {
        OffsetWrist { a, d }
    }

    fn link(&self, index: usize, joint: f64) -> Pose {
        dh_transform(joint, self.d[index], self.a[index], ALPHA[index])
    }
}

/// Clamps the arccos argument into its domain, reporting when it was clearly outside. Round-off
/// past +-1 is a singular (aligned) pose, not an unreachable one.
fn clamped_acos(x: f64, message: &str, errors: &mut Vec<String>) -> f64 {
    if x.abs() - 1.0 > SINGULARITY_TOL {
        errors.push(message.to_string());
    }
    x.clamp(-1.0, 1.0).acos()
}

impl Kinematics for OffsetWrist {
    fn dof(&self) -> usize {
        6
    }

    fn forward(&self, joints: &[f64]) -> Vec<Pose> {
        dh_chain(joints, &self.d, &self.a, &ALPHA)
    }

    fn inverse(&self, flange: &Pose, configuration: Configuration, _redundancy: f64) -> Inverse {
        let (a, d) = (&self.a, &self.d);
        let mut errors = Vec::new();
        let mut joints = vec![0.0; 6];

        let shoulder = configuration.contains(Configuration::SHOULDER);
        let mut elbow = configuration.contains(Configuration::ELBOW);
        if shoulder {
            elbow = !elbow;
        }
        let wrist = !configuration.contains(Configuration::WRIST);

        let normal = flange.rotation * Vector3::z();
        let position = flange.translation.vector;

        // Axis 1: the wrist 1 axis must be tangent to the circle of radius d3 around the base.
        let big_a = d[5] * normal.y - position.y;
        let big_b = d[5] * normal.x - position.x;
        let radius = (big_a * big_a + big_b * big_b).sqrt();
        let arc = if radius < SINGULARITY_TOL || (d[3] / radius).abs() > 1.0 {
            errors.push("Near shoulder singularity.".to_string());
            0.0
        } else {
            (d[3] / radius).acos()
        };
        let arctan = (-big_a).atan2(-big_b);
        joints[0] = if shoulder {
            arctan - arc + FRAC_PI_2
        } else {
            arctan + arc + FRAC_PI_2
        };
        let (s1, c1) = joints[0].sin_cos();

        // Axis 5
        let x = (position.x * s1 - position.y * c1 - d[3]) / d[5];
        let q5 = clamped_acos(x, "Target out of reach.", &mut errors);
        joints[4] = if wrist { q5 } else { -q5 };
        let s5 = joints[4].sin();

        // Axis 6
        let inverse = flange.inverse().to_homogeneous();
        if s5.abs() < SINGULARITY_TOL {
            errors.push("Near wrist singularity.".to_string());
            joints[5] = 0.0;
        } else {
            joints[5] = ((-inverse[(1, 0)] * s1 + inverse[(1, 1)] * c1) / s5)
                .atan2((inverse[(0, 0)] * s1 - inverse[(0, 1)] * c1) / s5);
        }

        // Axes 3 and 2 from the planar triangle between axis 2 and axis 4.
        let t14 = self.link(0, joints[0]).inverse()
            * flange
            * (self.link(4, joints[4]) * self.link(5, joints[5])).inverse();
        let px = t14.translation.x;
        let pz = t14.translation.y;
        let length = px.hypot(pz);
        let x = (length * length - a[1] * a[1] - a[2] * a[2]) / (2.0 * a[1] * a[2]);
        let q3 = clamped_acos(x, "Target out of reach.", &mut errors);
        joints[2] = if elbow { -q3 } else { q3 };
        joints[1] = pz.atan2(px)
            - (a[2] * joints[2].sin()).atan2(a[1] + a[2] * joints[2].cos());

        // Axis 4
        let t34 = self.link(2, joints[2]).inverse() * self.link(1, joints[1]).inverse() * t14;
        let r34 = t34.rotation.to_rotation_matrix();
        joints[3] = r34[(1, 0)].atan2(r34[(0, 0)]);

        if joints.iter().any(|j| !j.is_finite()) {
            errors.push(format!("Branch {configuration} has no numeric solution."));
        }
        finish_joints(&mut joints);
        Inverse { joints, errors }
    }
}
