//! Robot kinematics and motion compiler for offline robot programming.
//!
//! Motion is authored once as a sequence of manufacturer independent targets (Cartesian poses or
//! joint positions, each with its tool, frame, speed, blend zone and commands) and compiled
//! against a robot cell into a validated, speed limited joint timeline.
//!
//! # Features
//!
//! - Analytic forward and inverse kinematics for six axis arms with a spherical wrist (ABB and
//!   most industrial arms), six axis arms with an offset wrist (collaborative arms like UR) and
//!   seven axis redundant arms (KUKA iiwa, Franka).
//! - All 8 analytic branches are available and selected by [`kinematic_traits::Configuration`];
//!   without a forced branch, the one closest to the previous joints is used.
//! - Linear tracks, rotary positioners and custom mechanisms move in lockstep with the arm.
//!   Frames can be coupled to the tool of another robot or to a mechanism.
//! - The compiler subdivides linear motions, checks every substep for singularities, reach and
//!   axis limits, and times each motion by the slowest of TCP, axis and external axis speeds.
//! - Programs can be played back at any time and swept for collisions in parallel
//!   (feature `collisions`).
//! - Robot cells can be read from YAML (feature `allow_filesystem`).
//!
//! Lengths are in millimeters, angles in radians, time in seconds.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rs_robot_program::kinematics_impl::RobotArm;
//! use rs_robot_program::program::Program;
//! use rs_robot_program::robot_system::RobotSystem;
//! use rs_robot_program::target::Target;
//!
//! let system = Arc::new(RobotSystem::single(RobotArm::irb4600_40()));
//! let targets = vec![
//!     Target::joint(vec![0.0, 1.2, -0.4, 0.0, 0.9, 0.0]),
//!     Target::joint(vec![0.3, 1.1, -0.3, 0.0, 0.9, 0.0]),
//! ];
//! let program = Program::new("Demo", system, vec![targets], 10.0).expect("valid program");
//! assert!(program.errors.is_empty());
//! assert!(program.duration > 0.0);
//! ```

pub mod parameters;
pub mod parameters_robots;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;
#[cfg(feature = "allow_filesystem")]
pub mod parameter_error;

#[path = "utils/utils.rs"]
pub mod utils;
pub mod kinematic_traits;
pub mod kinematics_impl;

#[path = "arms/spherical_wrist.rs"]
pub mod spherical_wrist;
#[path = "arms/offset_wrist.rs"]
pub mod offset_wrist;
#[path = "arms/redundant.rs"]
pub mod redundant;

pub mod mechanism;
pub mod robot_system;

pub mod attributes;
pub mod target;

pub mod program_error;
pub mod program;
mod check_program;
pub mod simulation;

pub mod emitter;

#[cfg(feature = "collisions")]
pub mod collisions;

#[cfg(test)]
mod tests;
