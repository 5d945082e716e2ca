//! Six axis arm with a parallel base and a spherical wrist (axes 4, 5 and 6 intersect in one point),
//! as most industrial arms are built.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;

use crate::kinematic_traits::{Configuration, Inverse, Kinematics, Pose, SINGULARITY_TOL};
use crate::kinematics_impl::{dh_chain, finish_joints, law_of_cosines, wrist_angles};

const ALPHA: [f64; 6] = [FRAC_PI_2, 0.0, FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2, 0.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalWrist {
    /// DH link lengths, only a\[0..3\] are used.
    pub a: [f64; 6],
    /// DH link offsets, only d\[0\], d\[3\] and d\[5\] are used.
    pub d: [f64; 6],
}

impl SphericalWrist {
    pub fn new(a: [f64; 6], d: [f64; 6]) -> Self {
        SphericalWrist { a, d }
    }
}

impl Kinematics for SphericalWrist {
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

        let l1 = a[1];
        let l2 = a[2].hypot(d[3]);
        let ad2 = a[2].atan2(d[3]);

        let normal = flange.rotation * Vector3::z();
        let mut center = flange.translation.vector - normal * d[5];
        joints[0] = center.y.atan2(center.x);
        let ll = center.x.hypot(center.y);
        if ll < a[0] + SINGULARITY_TOL {
            errors.push("Near shoulder singularity (wrist centre above the base axis).".to_string());
        }
        let p1 = if ll > f64::EPSILON {
            Vector3::new(a[0] * center.x / ll, a[0] * center.y / ll, d[0])
        } else {
            Vector3::new(a[0], 0.0, d[0])
        };

        if shoulder {
            joints[0] += PI;
            center.x = -center.x;
            center.y = -center.y;
        }

        let l3 = (center - p1).norm();
        let mut unreachable = false;

        let mut beta = law_of_cosines(l1, l3, l2).unwrap_or_else(|| {
            unreachable = true;
            0.0
        });
        let mut gamma = law_of_cosines(l1, l2, l3).unwrap_or_else(|| {
            unreachable = true;
            PI
        });
        if elbow {
            beta = -beta;
            gamma = -gamma;
        }

        // Signed horizontal reach from axis 2, negative when the wrist is behind the shoulder.
        let reach = if shoulder { -(ll + a[0]) } else { ll - a[0] };
        let elevation = (center.z - p1.z).atan2(reach);
        joints[1] = beta + elevation;
        joints[2] = gamma - ad2 - FRAC_PI_2;

        let arm = dh_chain(&joints[..3], &self.d[..3], &self.a[..3], &ALPHA[..3]);
        let r03 = arm[2].rotation.to_rotation_matrix();
        let residual = r03.matrix().transpose() * flange.rotation.to_rotation_matrix().matrix();
        joints[3..6].copy_from_slice(&wrist_angles(&residual, wrist, &mut errors));

        if unreachable {
            errors.push("Target out of reach.".to_string());
        }
        finish_joints(&mut joints);
        Inverse { joints, errors }
    }
}
