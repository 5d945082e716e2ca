//! External mechanisms moved in lockstep with an arm: linear tracks, rotary positioners and
//! custom chains.

use nalgebra::{Translation3, UnitQuaternion, Vector3};

use crate::kinematic_traits::{KinematicSolution, Pose};
use crate::parameters::{Joint, JointKind};
use crate::program_error::ProgramError;

/// Up to three prismatic axes along X, Y and Z of the track base.
#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub joints: Vec<Joint>,
    pub base: Pose,
    /// The arm is mounted on the track carriage.
    pub moves_robot: bool,
}

/// Rotary axes, each turning about the Z axis of its axis pose. Axis poses are relative to the
/// previous axis (or the base for the first one).
#[derive(Debug, Clone)]
pub struct Positioner {
    pub name: String,
    pub joints: Vec<Joint>,
    pub axes: Vec<Pose>,
    pub base: Pose,
    pub moves_robot: bool,
}

/// Any serial chain. Each joint rotates about or translates along Z of its axis pose, depending
/// on its kind.
#[derive(Debug, Clone)]
pub struct CustomMechanism {
    pub name: String,
    pub joints: Vec<Joint>,
    pub axes: Vec<Pose>,
    pub base: Pose,
    pub moves_robot: bool,
}

#[derive(Debug, Clone)]
pub enum Mechanism {
    Track(Track),
    Positioner(Positioner),
    Custom(CustomMechanism),
}

impl Track {
    pub fn new(name: &str, joints: Vec<Joint>, base: Pose, moves_robot: bool) -> Result<Self, ProgramError> {
        if joints.is_empty() || joints.len() > 3 {
            return Err(ProgramError::InvalidMechanism(format!(
                "track {name} must have 1 to 3 axes, {} given",
                joints.len()
            )));
        }
        if joints.iter().any(|j| j.kind != JointKind::Prismatic) {
            return Err(ProgramError::InvalidMechanism(format!(
                "track {name} may only have prismatic axes"
            )));
        }
        Ok(Track {
            name: name.to_string(),
            joints,
            base,
            moves_robot,
        })
    }
}

impl Positioner {
    pub fn new(
        name: &str,
        joints: Vec<Joint>,
        axes: Vec<Pose>,
        base: Pose,
        moves_robot: bool,
    ) -> Result<Self, ProgramError> {
        if joints.is_empty() || joints.len() != axes.len() {
            return Err(ProgramError::InvalidMechanism(format!(
                "positioner {name} needs one axis pose per joint, {} joints and {} axes given",
                joints.len(),
                axes.len()
            )));
        }
        if joints.iter().any(|j| j.kind != JointKind::Revolute) {
            return Err(ProgramError::InvalidMechanism(format!(
                "positioner {name} may only have revolute axes"
            )));
        }
        Ok(Positioner {
            name: name.to_string(),
            joints,
            axes,
            base,
            moves_robot,
        })
    }
}

impl CustomMechanism {
    pub fn new(
        name: &str,
        joints: Vec<Joint>,
        axes: Vec<Pose>,
        base: Pose,
        moves_robot: bool,
    ) -> Result<Self, ProgramError> {
        if joints.len() != axes.len() {
            return Err(ProgramError::InvalidMechanism(format!(
                "mechanism {name} needs one axis pose per joint, {} joints and {} axes given",
                joints.len(),
                axes.len()
            )));
        }
        Ok(CustomMechanism {
            name: name.to_string(),
            joints,
            axes,
            base,
            moves_robot,
        })
    }
}

/// Motion of one joint about or along the Z axis of its axis frame.
fn joint_motion(joint: &Joint, value: f64) -> Pose {
    match joint.kind {
        JointKind::Revolute => Pose::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), value),
        ),
        JointKind::Prismatic => Pose::translation(0.0, 0.0, value),
    }
}

impl Mechanism {
    pub fn name(&self) -> &str {
        match self {
            Mechanism::Track(m) => &m.name,
            Mechanism::Positioner(m) => &m.name,
            Mechanism::Custom(m) => &m.name,
        }
    }

    pub fn joints(&self) -> &[Joint] {
        match self {
            Mechanism::Track(m) => &m.joints,
            Mechanism::Positioner(m) => &m.joints,
            Mechanism::Custom(m) => &m.joints,
        }
    }

    pub fn base(&self) -> &Pose {
        match self {
            Mechanism::Track(m) => &m.base,
            Mechanism::Positioner(m) => &m.base,
            Mechanism::Custom(m) => &m.base,
        }
    }

    /// The arm of the group is carried by this mechanism.
    pub fn moves_robot(&self) -> bool {
        match self {
            Mechanism::Track(m) => m.moves_robot,
            Mechanism::Positioner(m) => m.moves_robot,
            Mechanism::Custom(m) => m.moves_robot,
        }
    }

    /// Solves the mechanism for the given axis values. `parent` is the world pose the mechanism
    /// base is mounted on. Planes are `[base, axis1..axisN]` in world coordinates.
    pub fn solve(&self, values: &[f64], parent: &Pose) -> KinematicSolution {
        let joints = self.joints();
        let mut errors = Vec::new();
        let mut values: Vec<f64> = values.to_vec();
        values.resize(joints.len(), 0.0);
        for (i, (value, joint)) in values.iter_mut().zip(joints.iter()).enumerate() {
            if !joint.is_in_range(*value) {
                errors.push(format!(
                    "Axis {} of {} is outside the permitted range.",
                    i + 1,
                    self.name()
                ));
                *value = joint.clamp(*value);
            }
        }

        let base = parent * self.base();
        let mut planes = Vec::with_capacity(values.len() + 1);
        planes.push(base);
        match self {
            Mechanism::Track(_) => {
                let mut offset = Vector3::zeros();
                for (i, value) in values.iter().enumerate().take(3) {
                    offset[i] = *value;
                    planes.push(base * Pose::translation(offset.x, offset.y, offset.z));
                }
            }
            Mechanism::Positioner(Positioner { axes, .. })
            | Mechanism::Custom(CustomMechanism { axes, .. }) => {
                let mut pose = base;
                for ((value, joint), axis) in values.iter().zip(joints.iter()).zip(axes.iter()) {
                    pose = pose * axis * joint_motion(joint, *value);
                    planes.push(pose);
                }
            }
        }

        KinematicSolution {
            joints: values,
            planes,
            errors,
            ..Default::default()
        }
    }
}
