//! Helpers shared by the tests: preset cells, reference frames and seeded random joints.

use std::sync::Arc;

use nalgebra::Translation3;
use rand::Rng;
use rand::rngs::StdRng;

use crate::attributes::{Frame, Speed, Tool};
use crate::kinematic_traits::Pose;
use crate::kinematics_impl::RobotArm;
use crate::robot_system::{MechanicalGroup, RobotSystem};
use crate::target::Target;

/// IRB 4600 joints with the TCP well inside the workspace and no singular axis.
pub(crate) const HOME: [f64; 6] = [0.0, 1.2, -0.4, 0.0, 0.9, 0.0];

pub(crate) fn irb4600_system() -> Arc<RobotSystem> {
    Arc::new(RobotSystem::single(RobotArm::irb4600_40()))
}

/// Two IRB 4600 arms facing the same way, the second one 3 m along Y.
pub(crate) fn two_arm_system() -> Arc<RobotSystem> {
    let second = RobotArm {
        base: Pose::translation(0.0, 3000.0, 0.0),
        ..RobotArm::irb4600_40()
    };
    let groups = vec![
        MechanicalGroup::new(RobotArm::irb4600_40(), Vec::new()),
        MechanicalGroup::new(second, Vec::new()),
    ];
    Arc::new(RobotSystem::new("TwoArms", Pose::identity(), groups))
}

/// World TCP of the given joints, default tool.
pub(crate) fn tcp_of(system: &RobotSystem, joints: &[f64]) -> Pose {
    let target = Target::joint(joints.to_vec());
    let solutions = system.kinematics(&[&target], None).expect("joint target solves");
    assert!(solutions[0].errors.is_empty(), "{:?}", solutions[0].errors);
    solutions[0].tcp()
}

/// Frame aligned with the TCP at the given joints, placed so that this TCP is at (0, 0, 500)
/// with identity rotation in frame coordinates.
pub(crate) fn work_frame(system: &RobotSystem, joints: &[f64]) -> Arc<Frame> {
    let pose = tcp_of(system, joints) * Translation3::new(0.0, 0.0, -500.0);
    Arc::new(Frame::new("Work", pose))
}

pub(crate) fn tool() -> Arc<Tool> {
    Arc::new(Tool::new("Spindle", Pose::identity(), 5.0))
}

/// Home joint target followed by linear targets at the given X offsets along the work frame.
pub(crate) fn linear_moves(system: &RobotSystem, offsets: &[f64], speed: f64) -> Vec<Target> {
    let frame = work_frame(system, &HOME);
    let speed = Arc::new(Speed::new("Feed", speed));
    let tool = tool();
    let start = Target::joint(HOME.to_vec())
        .with_frame(frame.clone())
        .with_speed(speed.clone())
        .with_tool(tool.clone());
    let mut targets = vec![start];
    for offset in offsets {
        targets.push(
            Target::linear(Pose::translation(*offset, 0.0, 500.0))
                .with_frame(frame.clone())
                .with_speed(speed.clone())
                .with_tool(tool.clone()),
        );
    }
    targets
}

pub(crate) fn random_joints(rng: &mut StdRng, ranges: &[(f64, f64)]) -> Vec<f64> {
    ranges.iter().map(|(from, to)| rng.gen_range(*from..*to)).collect()
}

pub(crate) fn are_poses_near(a: &Pose, b: &Pose, tolerance: f64) -> bool {
    let translation = (a.translation.vector - b.translation.vector).norm();
    let rotation = a.rotation.angle_to(&b.rotation);
    translation < tolerance && rotation < tolerance
}
