//! The compiled program: authored targets with their kinematics, the keyframe timeline used for
//! playback and collision checks, resolved attributes and diagnostics.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::attributes::{Attribute, Command};
use crate::check_program::CheckProgram;
use crate::kinematic_traits::{KinematicSolution, Pose};
use crate::program_error::ProgramError;
use crate::robot_system::RobotSystem;
use crate::simulation::{Simulation, SimulationPose};
use crate::target::{Target, TargetKind};
use crate::utils::{lerp_joints, lerp_pose};

/// The constraint that determined the duration of a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpeedLimit {
    Translation,
    Rotation,
    /// Arm axis, zero based
    Axis(usize),
    /// External axis, zero based
    External(usize),
    /// Explicit motion time
    Time,
}

impl fmt::Display for SpeedLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedLimit::Translation => write!(f, "translation speed"),
            SpeedLimit::Rotation => write!(f, "rotation speed"),
            SpeedLimit::Axis(i) => write!(f, "axis {} speed", i + 1),
            SpeedLimit::External(i) => write!(f, "external axis {} speed", i + 1),
            SpeedLimit::Time => write!(f, "programmed time"),
        }
    }
}

/// One target bound to a mechanical group.
#[derive(Debug, Clone)]
pub struct ProgramTarget {
    /// Index of the system target
    pub index: usize,
    pub group: usize,
    pub target: Arc<Target>,
    /// Leaf commands, command groups expanded.
    pub commands: Vec<Arc<Command>>,
    pub kinematics: KinematicSolution,
    pub changes_configuration: bool,
    /// What limited the speed of the motion to this target.
    pub leading: Option<SpeedLimit>,
}

impl ProgramTarget {
    pub fn new(index: usize, group: usize, target: Arc<Target>) -> Self {
        let commands = target
            .command
            .as_ref()
            .map(Command::flatten)
            .unwrap_or_default();
        ProgramTarget {
            index,
            group,
            target,
            commands,
            kinematics: KinematicSolution::default(),
            changes_configuration: false,
            leading: None,
        }
    }

    /// Replaces the target, recomputing the flattened commands.
    pub(crate) fn set_target(&mut self, target: Arc<Target>) {
        *self = ProgramTarget {
            kinematics: std::mem::take(&mut self.kinematics),
            ..ProgramTarget::new(self.index, self.group, target)
        };
    }

    pub fn commands_before(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter().filter(|c| c.run_before)
    }

    pub fn commands_after(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter().filter(|c| !c.run_before)
    }

    /// Tool center point in world coordinates.
    pub fn world_plane(&self) -> Pose {
        self.kinematics.tcp()
    }

    /// Tool center point in target frame coordinates.
    pub fn plane(&self) -> Pose {
        match &self.target.kind {
            TargetKind::Cartesian { pose, .. } => *pose,
            TargetKind::Joint { .. } => self.kinematics.frame.inverse() * self.kinematics.tcp(),
        }
    }

    /// Tool center point of the previous target, in the frame coordinates of this target.
    pub fn prev_plane(&self, prev: &ProgramTarget) -> Pose {
        let frame = if Arc::ptr_eq(&self.target.frame, &prev.target.frame) {
            prev.kinematics.frame
        } else {
            self.kinematics.frame
        };
        frame.inverse() * prev.kinematics.tcp()
    }

    /// Target between the previous target and this one. Linear motions interpolate the TCP in
    /// frame coordinates, all other motions interpolate joints. External axes are always
    /// interpolated per axis.
    pub fn lerp(&self, prev: &ProgramTarget, dof: usize, t: f64, start: f64, end: f64) -> Target {
        let split = |joints: &[f64]| {
            let at = dof.min(joints.len());
            (joints[..at].to_vec(), joints[at..].to_vec())
        };
        let (prev_arm, prev_external) = split(&prev.kinematics.joints);
        let (arm, external) = split(&self.kinematics.joints);
        let external = lerp_joints(&prev_external, &external, t, start, end);

        let target = match &self.target.kind {
            TargetKind::Cartesian { pose, motion, .. } if self.target.is_linear() => {
                let pose = lerp_pose(&self.prev_plane(prev), pose, t, start, end);
                Target {
                    kind: TargetKind::Cartesian {
                        pose,
                        configuration: None,
                        motion: *motion,
                    },
                    ..(*self.target).clone()
                }
            }
            _ => self
                .target
                .to_joint_target(lerp_joints(&prev_arm, &arm, t, start, end)),
        };
        target.with_external(external)
    }
}

/// All program targets of one step, one per mechanical group.
#[derive(Debug, Clone)]
pub struct SystemTarget {
    pub index: usize,
    pub program_targets: Vec<ProgramTarget>,
    /// Time from the start of the program, seconds
    pub total_time: f64,
    /// Time from the previous target (or keyframe)
    pub delta_time: f64,
    /// Time the motion would take if only the axis speed limits applied
    pub min_time: f64,
    /// Interpolation substeps of the motion towards this target
    pub divisions: usize,
}

impl SystemTarget {
    pub fn new(index: usize, program_targets: Vec<ProgramTarget>) -> Self {
        SystemTarget {
            index,
            program_targets,
            total_time: 0.0,
            delta_time: 0.0,
            min_time: 0.0,
            divisions: 0,
        }
    }

    pub fn targets(&self) -> Vec<&Target> {
        self.program_targets.iter().map(|t| t.target.as_ref()).collect()
    }

    pub fn joints(&self) -> Vec<Vec<f64>> {
        self.program_targets
            .iter()
            .map(|t| t.kinematics.joints.clone())
            .collect()
    }

    pub fn kinematics(&self) -> Vec<KinematicSolution> {
        self.program_targets
            .iter()
            .map(|t| t.kinematics.clone())
            .collect()
    }

    /// Interpolated targets for every group.
    pub fn lerp(&self, prev: &SystemTarget, system: &RobotSystem, t: f64, start: f64, end: f64) -> Vec<Target> {
        self.program_targets
            .iter()
            .zip(prev.program_targets.iter())
            .map(|(current, prev)| {
                let dof = system.groups[current.group].arm.dof();
                current.lerp(prev, dof, t, start, end)
            })
            .collect()
    }

    /// Stores solutions, flagging targets whose configuration differs from the previous one.
    pub(crate) fn set_kinematics(&mut self, solutions: Vec<KinematicSolution>, prev: Option<&SystemTarget>) {
        for (target, solution) in self.program_targets.iter_mut().zip(solutions) {
            target.changes_configuration = prev
                .and_then(|p| p.program_targets.get(target.group))
                .map(|p| p.kinematics.configuration != solution.configuration)
                .unwrap_or(false);
            target.kinematics = solution;
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = (usize, &String)> {
        self.program_targets
            .iter()
            .flat_map(|t| t.kinematics.errors.iter().map(move |e| (t.group, e)))
    }
}

/// A compiled robot program.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub robot_system: Arc<RobotSystem>,
    /// Authored targets with their kinematics, truncated after the first target with errors.
    pub targets: Vec<SystemTarget>,
    /// Timeline samples where the velocity profile changes.
    pub keyframes: Vec<SystemTarget>,
    pub attributes: Vec<Attribute>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Seconds
    pub duration: f64,
    /// Subdivision length of linear motions, mm
    pub step_size: f64,
    simulation: Simulation,
}

impl Program {
    /// Compiles the program. `toolpaths` holds one list of targets per mechanical group, all of
    /// the same length. Geometric problems are reported in `errors` and truncate the program;
    /// only a malformed program or robot system is an `Err`.
    pub fn new(
        name: &str,
        robot_system: Arc<RobotSystem>,
        toolpaths: Vec<Vec<Target>>,
        step_size: f64,
    ) -> Result<Program, ProgramError> {
        if toolpaths.len() != robot_system.groups.len() {
            return Err(ProgramError::GroupCountMismatch {
                expected: robot_system.groups.len(),
                found: toolpaths.len(),
            });
        }
        let count = toolpaths.first().map(|t| t.len()).unwrap_or(0);
        if count == 0 {
            return Err(ProgramError::EmptyProgram);
        }
        for (group, toolpath) in toolpaths.iter().enumerate() {
            if toolpath.len() != count {
                return Err(ProgramError::ToolpathLengthMismatch {
                    group,
                    expected: count,
                    found: toolpath.len(),
                });
            }
        }
        if !(step_size > 0.0) || !step_size.is_finite() {
            return Err(ProgramError::InvalidStepSize(step_size));
        }

        let mut targets: Vec<SystemTarget> = (0..count)
            .map(|i| SystemTarget::new(i, Vec::with_capacity(toolpaths.len())))
            .collect();
        for (group, toolpath) in toolpaths.into_iter().enumerate() {
            for (index, target) in toolpath.into_iter().enumerate() {
                targets[index]
                    .program_targets
                    .push(ProgramTarget::new(index, group, Arc::new(target)));
            }
        }

        let compiled = CheckProgram::run(&robot_system, targets, step_size)?;
        if compiled.errors.is_empty() {
            info!(
                "Program {} compiled: {} targets, {} keyframes, {:.3} s, {} warnings",
                name,
                compiled.targets.len(),
                compiled.keyframes.len(),
                compiled.duration,
                compiled.warnings.len()
            );
        } else {
            warn!(
                "Program {} truncated at target {} with {} errors",
                name,
                compiled.targets.len().saturating_sub(1),
                compiled.errors.len()
            );
        }

        Ok(Program {
            name: name.to_string(),
            robot_system,
            targets: compiled.targets,
            keyframes: compiled.keyframes,
            attributes: compiled.attributes,
            warnings: compiled.warnings,
            errors: compiled.errors,
            duration: compiled.duration,
            step_size,
            simulation: Simulation::default(),
        })
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Moves the simulation to the given time and returns the pose of every group there.
    /// With `normalized`, time is a fraction of the program duration.
    pub fn animate(&mut self, time: f64, normalized: bool) -> Result<&SimulationPose, ProgramError> {
        self.simulation.step(
            &self.keyframes,
            &self.robot_system,
            self.duration,
            time,
            normalized,
        )
    }

    /// Pose of the last [`Program::animate`] call.
    pub fn current_simulation_pose(&self) -> &SimulationPose {
        self.simulation.pose()
    }
}
