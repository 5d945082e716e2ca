//! Mechanical groups (one arm with its external axes) and the robot cell composed of them.

use crate::attributes::Frame;
use crate::kinematic_traits::{KinematicSolution, Pose};
use crate::kinematics_impl::RobotArm;
use crate::mechanism::Mechanism;
use crate::parameters::Joint;
use crate::program_error::ProgramError;
use crate::target::Target;

/// One logical robot: an arm and the external mechanisms moving in lockstep with it.
#[derive(Debug, Clone)]
pub struct MechanicalGroup {
    pub index: usize,
    pub arm: RobotArm,
    pub externals: Vec<Mechanism>,
}

/// A robot cell. Targets and solutions are always one per group, in group order.
#[derive(Debug, Clone)]
pub struct RobotSystem {
    pub name: String,
    /// World pose of the cell
    pub base: Pose,
    pub groups: Vec<MechanicalGroup>,
}

impl MechanicalGroup {
    pub fn new(arm: RobotArm, externals: Vec<Mechanism>) -> Self {
        MechanicalGroup {
            index: 0,
            arm,
            externals,
        }
    }

    /// Number of external axes over all mechanisms.
    pub fn external_count(&self) -> usize {
        self.externals.iter().map(|m| m.joints().len()).sum()
    }

    pub fn joint_count(&self) -> usize {
        self.arm.dof() + self.external_count()
    }

    /// Arm joints followed by external joints, the order of solution joints.
    pub fn joints(&self) -> Vec<&Joint> {
        self.arm
            .joints
            .iter()
            .chain(self.externals.iter().flat_map(|m| m.joints().iter()))
            .collect()
    }

    /// Number of planes in a solution of this group.
    pub fn plane_count(&self) -> usize {
        let external: usize = self.externals.iter().map(|m| m.joints().len() + 1).sum();
        external + self.arm.dof() + 2
    }

    /// Index of the last plane of the given mechanism in a solution of this group.
    pub fn mechanism_plane_index(&self, mechanism: usize) -> Option<usize> {
        if mechanism >= self.externals.len() {
            return None;
        }
        let end: usize = self.externals[..=mechanism]
            .iter()
            .map(|m| m.joints().len() + 1)
            .sum();
        Some(end - 1)
    }

    /// Index of the flange plane in a solution of this group. The TCP plane follows it.
    pub fn flange_plane_index(&self) -> usize {
        self.plane_count() - 2
    }

    pub fn payload(&self) -> f64 {
        self.arm.payload
    }

    /// Solves the group. `coupled` is the world pose the target frame is attached to when it is
    /// coupled to another group; frames coupled to a mechanism of this group are resolved here.
    pub fn solve(
        &self,
        target: &Target,
        coupled: Option<&Pose>,
        previous: Option<&[f64]>,
        parent: &Pose,
    ) -> KinematicSolution {
        let dof = self.arm.dof();
        let mut planes = Vec::with_capacity(self.plane_count());
        let mut errors = Vec::new();
        let mut external = Vec::with_capacity(self.external_count());
        let mut mechanism_tips = Vec::with_capacity(self.externals.len());
        let mut arm_parent = *parent;

        let mut offset = 0;
        for mechanism in &self.externals {
            let count = mechanism.joints().len();
            let start = offset.min(target.external.len());
            let end = (offset + count).min(target.external.len());
            let solution = mechanism.solve(&target.external[start..end], parent);
            let tip = solution.tcp();
            if mechanism.moves_robot() {
                arm_parent = tip;
            }
            mechanism_tips.push(tip);
            planes.extend(solution.planes);
            errors.extend(solution.errors);
            external.extend(solution.joints);
            offset += count;
        }

        let frame = frame_pose(&target.frame, self.index, coupled, &mechanism_tips);
        let previous_arm = previous.map(|p| &p[..dof.min(p.len())]);
        let arm = self.arm.solve(target, &frame, previous_arm, &arm_parent);

        let flange = arm.tcp();
        let mut joints = arm.joints;
        joints.extend(external);
        planes.extend(arm.planes);
        planes.push(flange * target.tool.tcp);
        let mut all_errors = arm.errors;
        all_errors.extend(errors);

        KinematicSolution {
            joints,
            planes,
            configuration: arm.configuration,
            errors: all_errors,
            frame,
        }
    }
}

/// World pose of the target frame.
fn frame_pose(frame: &Frame, group: usize, coupled: Option<&Pose>, own_tips: &[Pose]) -> Pose {
    match (frame.coupled_group, frame.coupled_mechanism) {
        (Some(g), Some(m)) if g == group => own_tips
            .get(m)
            .map(|tip| tip * frame.pose)
            .unwrap_or(frame.pose),
        (Some(_), _) => coupled.map(|c| c * frame.pose).unwrap_or(frame.pose),
        (None, _) => frame.pose,
    }
}

impl RobotSystem {
    pub fn new(name: &str, base: Pose, groups: Vec<MechanicalGroup>) -> Self {
        let groups = groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| MechanicalGroup { index, ..group })
            .collect();
        RobotSystem {
            name: name.to_string(),
            base,
            groups,
        }
    }

    /// Cell with one arm and no external axes.
    pub fn single(arm: RobotArm) -> Self {
        let name = arm.name.clone();
        RobotSystem::new(&name, Pose::identity(), vec![MechanicalGroup::new(arm, Vec::new())])
    }

    pub fn payload(&self, group: usize) -> f64 {
        self.groups.get(group).map(|g| g.payload()).unwrap_or(0.0)
    }

    /// True if any arm has more than six axes.
    pub fn has_redundant_arm(&self) -> bool {
        self.groups.iter().any(|g| g.arm.dof() > 6)
    }

    /// Index of the first plane of each group in the flattened list of all planes.
    pub fn plane_offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        self.groups
            .iter()
            .map(|g| {
                let start = offset;
                offset += g.plane_count();
                start
            })
            .collect()
    }

    /// Checks the coupling of a frame used by a target of the given group.
    pub fn check_frame(&self, frame: &Frame, group: usize) -> Result<(), ProgramError> {
        let Some(coupled) = frame.coupled_group else {
            if frame.coupled_mechanism.is_some() {
                return Err(ProgramError::FrameCoupling(format!(
                    "frame {} is coupled to a mechanism but not to a group",
                    frame.name
                )));
            }
            return Ok(());
        };
        let Some(target_group) = self.groups.get(coupled) else {
            return Err(ProgramError::FrameCoupling(format!(
                "frame {} is coupled to group {} but the cell has {} groups",
                frame.name,
                coupled,
                self.groups.len()
            )));
        };
        match frame.coupled_mechanism {
            Some(m) if m >= target_group.externals.len() => Err(ProgramError::FrameCoupling(format!(
                "frame {} is coupled to mechanism {} of group {} that has {} mechanisms",
                frame.name,
                m,
                coupled,
                target_group.externals.len()
            ))),
            None if coupled == group => Err(ProgramError::FrameCoupling(format!(
                "frame {} of group {} is coupled to the tool of its own group",
                frame.name, group
            ))),
            _ => Ok(()),
        }
    }

    /// Solves one system step, one target per group. Groups whose frame is coupled to another
    /// group are solved after that group. `previous` holds the joints of the previous step.
    pub fn kinematics(
        &self,
        targets: &[&Target],
        previous: Option<&[Vec<f64>]>,
    ) -> Result<Vec<KinematicSolution>, ProgramError> {
        if targets.len() != self.groups.len() {
            return Err(ProgramError::TargetCountMismatch {
                expected: self.groups.len(),
                found: targets.len(),
            });
        }
        for (group, target) in targets.iter().enumerate() {
            self.check_frame(&target.frame, group)?;
        }

        let mut solutions: Vec<Option<KinematicSolution>> = vec![None; targets.len()];
        let mut remaining: Vec<usize> = (0..targets.len()).collect();
        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|&g| {
                let frame = &targets[g].frame;
                let coupled = match frame.coupled_group {
                    Some(other) if other != g => match &solutions[other] {
                        None => return true,
                        Some(solution) => {
                            let index = match frame.coupled_mechanism {
                                Some(m) => self.groups[other].mechanism_plane_index(m),
                                None => solution.planes.len().checked_sub(1),
                            };
                            index.and_then(|i| solution.planes.get(i)).copied()
                        }
                    },
                    _ => None,
                };
                let previous = previous.and_then(|p| p.get(g)).map(|p| p.as_slice());
                solutions[g] =
                    Some(self.groups[g].solve(targets[g], coupled.as_ref(), previous, &self.base));
                false
            });
            if remaining.len() == before {
                return Err(ProgramError::FrameCoupling(
                    "frames of the groups are coupled to each other in a loop".to_string(),
                ));
            }
        }
        Ok(solutions.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::Track;
    use crate::target::Target;
    use crate::tests::test_utils::{HOME, are_poses_near, two_arm_system};
    use nalgebra::Vector3;
    use std::sync::Arc;

    fn cell_with_track() -> RobotSystem {
        let track = Track::new(
            "Track",
            vec![Joint::prismatic((0.0, 4000.0), 1000.0)],
            Pose::identity(),
            true,
        )
        .expect("valid track");
        RobotSystem::new(
            "Cell",
            Pose::identity(),
            vec![MechanicalGroup::new(RobotArm::irb4600_40(), vec![Mechanism::Track(track)])],
        )
    }

    #[test]
    fn test_track_carries_the_arm() {
        let system = cell_with_track();
        let home = vec![0.0, 1.2, -0.4, 0.0, 0.9, 0.0];
        let at_zero = Target::joint(home.clone()).with_external(vec![0.0]);
        let moved = at_zero.with_external(vec![1000.0]);

        let a = system.kinematics(&[&at_zero], None).expect("solved");
        let b = system.kinematics(&[&moved], None).expect("solved");
        assert_eq!(a[0].planes.len(), system.groups[0].plane_count());
        assert_eq!(b[0].joints.len(), 7);
        assert_eq!(b[0].joints[6], 1000.0);
        let shift = b[0].tcp().translation.vector - a[0].tcp().translation.vector;
        assert!((shift - Vector3::new(1000.0, 0.0, 0.0)).norm() < 1e-6);
        assert!(b[0].errors.is_empty(), "{:?}", b[0].errors);
    }

    #[test]
    fn test_dangling_frame_coupling_is_rejected() {
        let system = cell_with_track();
        let frame = Arc::new(Frame::coupled("Workpiece", Pose::identity(), 3, None));
        let target = Target::joint(vec![0.0, 1.2, -0.4, 0.0, 0.9, 0.0]).with_frame(frame);
        let result = system.kinematics(&[&target], None);
        assert!(matches!(result, Err(ProgramError::FrameCoupling(_))));
    }

    #[test]
    fn test_frame_coupled_to_own_mechanism() {
        let system = cell_with_track();
        let frame = Arc::new(Frame::coupled("OnCarriage", Pose::identity(), 0, Some(0)));
        assert!(system.check_frame(&frame, 0).is_ok());
        let wrong = Frame::coupled("Missing", Pose::identity(), 0, Some(2));
        assert!(system.check_frame(&wrong, 0).is_err());
    }

    #[test]
    fn test_frame_coupled_to_other_group() {
        let system = two_arm_system();
        let held = Arc::new(Frame::coupled("Held", Pose::translation(0.0, 0.0, 100.0), 1, None));
        // Group 0 depends on group 1, so it is solved second.
        let first = Target::joint(HOME.to_vec()).with_frame(held.clone());
        let second = Target::joint(HOME.to_vec());
        let solutions = system.kinematics(&[&first, &second], None).expect("solved");

        assert_eq!(solutions.len(), 2);
        let expected = solutions[1].tcp() * held.pose;
        assert!(are_poses_near(&solutions[0].frame, &expected, 1e-9));
        assert!((solutions[1].tcp().translation.y - solutions[0].tcp().translation.y - 3000.0).abs() < 1e-6);
    }

    #[test]
    fn test_coupling_loop_is_rejected() {
        let system = two_arm_system();
        let to_second = Arc::new(Frame::coupled("OnSecond", Pose::identity(), 1, None));
        let to_first = Arc::new(Frame::coupled("OnFirst", Pose::identity(), 0, None));
        let first = Target::joint(HOME.to_vec()).with_frame(to_second);
        let second = Target::joint(HOME.to_vec()).with_frame(to_first);
        let result = system.kinematics(&[&first, &second], None);
        assert!(matches!(result, Err(ProgramError::FrameCoupling(_))), "{:?}", result.err());
    }
}
