//! Arm kinematics: DH chains shared by all wrist topologies and the common solve pipeline
//! (joints, range check, planes) of a robot arm.

use nalgebra::{Matrix3, Translation3, UnitQuaternion, Vector3};

use crate::emitter::Manufacturer;
use crate::kinematic_traits::{
    ANGLE_TOL, Configuration, Inverse, KinematicSolution, Kinematics, Pose, SINGULARITY_TOL,
};
use crate::offset_wrist::OffsetWrist;
use crate::parameters::Joint;
use crate::program_error::ProgramError;
use crate::redundant::RedundantArm;
use crate::spherical_wrist::SphericalWrist;
use crate::target::{Target, TargetKind};
use crate::utils::{absolute_joints, normalize_angle};

/// Standard Denavit-Hartenberg transform Rz(theta) Tz(d) Tx(a) Rx(alpha).
pub(crate) fn dh_transform(theta: f64, d: f64, a: f64, alpha: f64) -> Pose {
    Pose::from_parts(
        Translation3::new(0.0, 0.0, d),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), theta),
    ) * Pose::from_parts(
        Translation3::new(a, 0.0, 0.0),
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), alpha),
    )
}

/// Cumulative DH transforms, one pose per joint.
pub(crate) fn dh_chain(joints: &[f64], d: &[f64], a: &[f64], alpha: &[f64]) -> Vec<Pose> {
    let mut pose = Pose::identity();
    joints
        .iter()
        .enumerate()
        .map(|(i, &q)| {
            pose *= dh_transform(q, d[i], a[i], alpha[i]);
            pose
        })
        .collect()
}

/// Angle between the sides `adjacent1` and `adjacent2` of a triangle, facing the `opposite` side.
/// None if the triangle does not close.
pub(crate) fn law_of_cosines(adjacent1: f64, adjacent2: f64, opposite: f64) -> Option<f64> {
    let x = (adjacent1 * adjacent1 + adjacent2 * adjacent2 - opposite * opposite)
        / (2.0 * adjacent1 * adjacent2);
    if x.is_finite() && x.abs() <= 1.0 {
        Some(x.acos())
    } else {
        None
    }
}

/// ZYZ decomposition of the residual wrist rotation into the last three axes.
/// `wrist` selects the positive branch of the middle axis.
pub(crate) fn wrist_angles(m: &Matrix3<f64>, wrist: bool, errors: &mut Vec<String>) -> [f64; 3] {
    let c5 = m[(2, 2)];
    if (c5 - 1.0).abs() < SINGULARITY_TOL {
        errors.push("Near wrist singularity.".to_string());
        return [0.0, 0.0, m[(1, 0)].atan2(m[(0, 0)])];
    }
    let sign = if wrist { 1.0 } else { -1.0 };
    let s5 = sign * (1.0 - c5 * c5).max(0.0).sqrt();
    [
        (sign * m[(1, 2)]).atan2(sign * m[(0, 2)]),
        s5.atan2(c5),
        (sign * m[(2, 1)]).atan2(-sign * m[(2, 0)]),
    ]
}

/// Replaces NaN with 0 and normalizes every joint into (-pi, pi].
pub(crate) fn finish_joints(joints: &mut [f64]) {
    for joint in joints.iter_mut() {
        *joint = if joint.is_finite() {
            normalize_angle(*joint)
        } else {
            0.0
        };
    }
}

/// Wrist topology of an arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    SphericalWrist,
    OffsetWrist,
    Redundant,
}

/// Closed set of analytic solvers, one per wrist topology.
#[derive(Debug, Clone, PartialEq)]
pub enum ArmKinematics {
    SphericalWrist(SphericalWrist),
    OffsetWrist(OffsetWrist),
    Redundant(RedundantArm),
}

impl ArmKinematics {
    /// Builds the solver from DH `a` and `d` values of the joints.
    pub fn new(topology: Topology, joints: &[Joint]) -> Result<Self, ProgramError> {
        let expected = match topology {
            Topology::SphericalWrist | Topology::OffsetWrist => 6,
            Topology::Redundant => 7,
        };
        if joints.len() != expected {
            return Err(ProgramError::InvalidMechanism(format!(
                "{:?} arm needs {} joints, {} given",
                topology,
                expected,
                joints.len()
            )));
        }
        let mut a = [0.0; 6];
        let mut d = [0.0; 6];
        for (i, joint) in joints.iter().take(6).enumerate() {
            a[i] = joint.a;
            d[i] = joint.d;
        }
        Ok(match topology {
            Topology::SphericalWrist => ArmKinematics::SphericalWrist(SphericalWrist::new(a, d)),
            Topology::OffsetWrist => ArmKinematics::OffsetWrist(OffsetWrist::new(a, d)),
            Topology::Redundant => {
                let mut d7 = [0.0; 7];
                for (i, joint) in joints.iter().enumerate() {
                    d7[i] = joint.d;
                }
                ArmKinematics::Redundant(RedundantArm::new(d7))
            }
        })
    }
}

impl Kinematics for ArmKinematics {
    fn dof(&self) -> usize {
        match self {
            ArmKinematics::SphericalWrist(k) => k.dof(),
            ArmKinematics::OffsetWrist(k) => k.dof(),
            ArmKinematics::Redundant(k) => k.dof(),
        }
    }

    fn forward(&self, joints: &[f64]) -> Vec<Pose> {
        match self {
            ArmKinematics::SphericalWrist(k) => k.forward(joints),
            ArmKinematics::OffsetWrist(k) => k.forward(joints),
            ArmKinematics::Redundant(k) => k.forward(joints),
        }
    }

    fn inverse(&self, flange: &Pose, configuration: Configuration, redundancy: f64) -> Inverse {
        match self {
            ArmKinematics::SphericalWrist(k) => k.inverse(flange, configuration, redundancy),
            ArmKinematics::OffsetWrist(k) => k.inverse(flange, configuration, redundancy),
            ArmKinematics::Redundant(k) => k.inverse(flange, configuration, redundancy),
        }
    }

    fn redundancy(&self, previous: &[f64]) -> f64 {
        match self {
            ArmKinematics::Redundant(k) => k.redundancy(previous),
            _ => 0.0,
        }
    }
}

/// A robot arm: analytic solver plus axis limits, mounting and payload.
#[derive(Debug, Clone)]
pub struct RobotArm {
    pub name: String,
    pub manufacturer: Manufacturer,
    pub kinematics: ArmKinematics,
    pub joints: Vec<Joint>,
    /// Arm base relative to its parent (the cell, or the mechanism that carries it).
    pub base: Pose,
    /// Maximal payload, kg
    pub payload: f64,
}

impl RobotArm {
    pub fn new(
        name: &str,
        manufacturer: Manufacturer,
        topology: Topology,
        joints: Vec<Joint>,
        base: Pose,
        payload: f64,
    ) -> Result<Self, ProgramError> {
        let kinematics = ArmKinematics::new(topology, &joints)?;
        Ok(RobotArm {
            name: name.to_string(),
            manufacturer,
            kinematics,
            joints,
            base,
            payload,
        })
    }

    pub fn dof(&self) -> usize {
        self.kinematics.dof()
    }

    /// Solves the target for this arm. `frame` is the world pose of the target frame, `parent` the
    /// world pose the arm base is mounted on. Returned planes are `[base, joint1..jointN]` in world
    /// coordinates, the tool center point is not included.
    pub fn solve(
        &self,
        target: &Target,
        frame: &Pose,
        previous: Option<&[f64]>,
        parent: &Pose,
    ) -> KinematicSolution {
        let base = parent * self.base;
        let dof = self.dof();
        let mut errors = Vec::new();

        let (joints, configuration) = match &target.kind {
            TargetKind::Cartesian { pose, configuration, .. } => {
                let flange = base.inverse() * frame * pose * target.tool.tcp.inverse();
                match (configuration, previous) {
                    (None, Some(previous)) => {
                        let closest = self.kinematics.closest_solution(&flange, previous);
                        errors.extend(closest.errors);
                        (closest.joints, closest.configuration)
                    }
                    (forced, previous) => {
                        let configuration = forced.unwrap_or_default();
                        let redundancy = previous
                            .map(|p| self.kinematics.redundancy(p))
                            .unwrap_or(0.0);
                        let solution = self.kinematics.inverse(&flange, configuration, redundancy);
                        errors.extend(solution.errors);
                        let joints = match previous {
                            Some(previous) => absolute_joints(&solution.joints, previous),
                            None => solution.joints,
                        };
                        (joints, configuration)
                    }
                }
            }
            TargetKind::Joint { joints } => {
                let mut joints = joints.clone();
                if joints.len() != dof {
                    errors.push(format!(
                        "Joint target has {} values but the arm has {} axes.",
                        joints.len(),
                        dof
                    ));
                    joints.resize(dof, 0.0);
                }
                let configuration = self.configuration_of(&joints);
                (joints, configuration)
            }
        };

        let mut joints = joints;
        for (i, (value, joint)) in joints.iter_mut().zip(self.joints.iter()).enumerate() {
            if !joint.is_in_range(*value) {
                errors.push(format!("Axis {} is outside the permitted range.", i + 1));
                *value = joint.clamp(*value);
            }
        }

        let mut planes = Vec::with_capacity(dof + 1);
        planes.push(base);
        planes.extend(self.kinematics.forward(&joints).into_iter().map(|p| base * p));

        KinematicSolution {
            joints,
            planes,
            configuration,
            errors,
            frame: *frame,
        }
    }

    /// Back-computes the configuration of the given joints. Undefined when the joints cannot be
    /// reproduced by any analytic branch, that is near a singularity.
    pub fn configuration_of(&self, joints: &[f64]) -> Configuration {
        let Some(flange) = self.kinematics.forward(joints).last().copied() else {
            return Configuration::UNDEFINED;
        };
        let closest = self.kinematics.closest_solution(&flange, joints);
        if closest.difference < ANGLE_TOL {
            closest.configuration
        } else {
            Configuration::UNDEFINED
        }
    }
}
