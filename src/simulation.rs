//! Playback of a compiled program along its keyframe timeline.

use crate::kinematic_traits::KinematicSolution;
use crate::program::SystemTarget;
use crate::program_error::ProgramError;
use crate::robot_system::RobotSystem;
use crate::target::Target;

/// State of the system at one moment of the program.
#[derive(Debug, Clone, Default)]
pub struct SimulationPose {
    /// One solution per mechanical group
    pub kinematics: Vec<KinematicSolution>,
    /// Index of the target the system is moving to
    pub target_index: usize,
    /// Seconds from the program start
    pub time: f64,
}

/// Cursor over the keyframes. Consecutive calls with nearby times only move the cursor a few
/// keyframes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Simulation {
    cursor: usize,
    pose: SimulationPose,
}

impl Simulation {
    pub(crate) fn pose(&self) -> &SimulationPose {
        &self.pose
    }

    pub(crate) fn step(
        &mut self,
        keyframes: &[SystemTarget],
        system: &RobotSystem,
        duration: f64,
        time: f64,
        normalized: bool,
    ) -> Result<&SimulationPose, ProgramError> {
        let Some(first) = keyframes.first() else {
            return Err(ProgramError::EmptyProgram);
        };
        let time = if normalized { time * duration } else { time };
        let time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, duration.max(0.0))
        };

        if keyframes.len() == 1 {
            let kinematics = system.kinematics(&first.targets(), None)?;
            self.pose = SimulationPose {
                kinematics,
                target_index: first.index,
                time,
            };
            return Ok(&self.pose);
        }

        let last = keyframes.len() - 1;
        let mut cursor = self.cursor.clamp(1, last);
        while cursor < last && time > keyframes[cursor].total_time {
            cursor += 1;
        }
        while cursor > 1 && time < keyframes[cursor - 1].total_time {
            cursor -= 1;
        }
        self.cursor = cursor;

        let (prev, next) = (&keyframes[cursor - 1], &keyframes[cursor]);
        let targets = next.lerp(prev, system, time, prev.total_time, next.total_time);
        let refs: Vec<&Target> = targets.iter().collect();
        let kinematics = system.kinematics(&refs, Some(&prev.joints()))?;
        self.pose = SimulationPose {
            kinematics,
            target_index: next.index,
            time,
        };
        Ok(&self.pose)
    }
}
