//! Targets: the motion intent for one mechanical group at one step.

use std::sync::Arc;

use crate::attributes::{Command, Frame, Speed, Tool, Zone};
use crate::kinematic_traits::{Configuration, Pose};

/// Interpolation of a Cartesian motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Joints are interpolated, the TCP path is not a straight line.
    Joint,
    /// The TCP moves along a straight line with slerped orientation.
    Linear,
}

#[derive(Debug, Clone)]
pub enum TargetKind {
    Cartesian {
        /// TCP pose in frame coordinates
        pose: Pose,
        /// Forced analytic branch. When none, the branch closest to the previous joints is used.
        configuration: Option<Configuration>,
        motion: Motion,
    },
    Joint {
        joints: Vec<f64>,
    },
}

/// A target. Targets are immutable: use the `with_*` constructors to derive a changed copy.
#[derive(Debug, Clone)]
pub struct Target {
    pub kind: TargetKind,
    pub tool: Arc<Tool>,
    pub frame: Arc<Frame>,
    pub speed: Arc<Speed>,
    pub zone: Arc<Zone>,
    pub command: Option<Arc<Command>>,
    /// Values of the external axes of the group, in mechanism order.
    pub external: Vec<f64>,
}

impl Target {
    fn with_kind(kind: TargetKind) -> Self {
        Target {
            kind,
            tool: Tool::default_tool(),
            frame: Frame::default_frame(),
            speed: Speed::default_speed(),
            zone: Zone::default_zone(),
            command: None,
            external: Vec::new(),
        }
    }

    pub fn cartesian(pose: Pose, motion: Motion) -> Self {
        Target::with_kind(TargetKind::Cartesian {
            pose,
            configuration: None,
            motion,
        })
    }

    pub fn linear(pose: Pose) -> Self {
        Target::cartesian(pose, Motion::Linear)
    }

    pub fn joint(joints: Vec<f64>) -> Self {
        Target::with_kind(TargetKind::Joint { joints })
    }

    pub fn with_tool(&self, tool: Arc<Tool>) -> Self {
        Target { tool, ..self.clone() }
    }

    pub fn with_frame(&self, frame: Arc<Frame>) -> Self {
        Target { frame, ..self.clone() }
    }

    pub fn with_speed(&self, speed: Arc<Speed>) -> Self {
        Target { speed, ..self.clone() }
    }

    pub fn with_zone(&self, zone: Arc<Zone>) -> Self {
        Target { zone, ..self.clone() }
    }

    pub fn with_command(&self, command: Option<Arc<Command>>) -> Self {
        Target { command, ..self.clone() }
    }

    pub fn with_external(&self, external: Vec<f64>) -> Self {
        Target { external, ..self.clone() }
    }

    /// Copy with the forced configuration replaced. Joint targets are returned unchanged.
    pub fn with_configuration(&self, configuration: Option<Configuration>) -> Self {
        match &self.kind {
            TargetKind::Cartesian { pose, motion, .. } => Target {
                kind: TargetKind::Cartesian {
                    pose: *pose,
                    configuration,
                    motion: *motion,
                },
                ..self.clone()
            },
            TargetKind::Joint { .. } => self.clone(),
        }
    }

    /// Joint target with the given joints, keeping all attributes.
    pub fn to_joint_target(&self, joints: Vec<f64>) -> Self {
        Target {
            kind: TargetKind::Joint { joints },
            ..self.clone()
        }
    }

    /// Joint targets and Cartesian targets with joint motion
    pub fn is_joint_motion(&self) -> bool {
        !self.is_linear()
    }

    pub fn is_linear(&self) -> bool {
        matches!(
            self.kind,
            TargetKind::Cartesian {
                motion: Motion::Linear,
                ..
            }
        )
    }

    pub fn is_cartesian(&self) -> bool {
        matches!(self.kind, TargetKind::Cartesian { .. })
    }

    pub fn configuration(&self) -> Option<Configuration> {
        match self.kind {
            TargetKind::Cartesian { configuration, .. } => configuration,
            TargetKind::Joint { .. } => None,
        }
    }
}
