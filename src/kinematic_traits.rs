//! Core kinematic types shared by the arm solvers, the external mechanisms and the program compiler.

extern crate nalgebra as na;

use bitflags::bitflags;
use na::Isometry3;
use std::fmt;

use crate::utils::{absolute_joints, squared_difference};

/// Pose of a joint, flange or tool center point. It contains both Cartesian position
/// (millimeters) and rotation quaternion.
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(300.0, 0.0, 500.0);
/// let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5);
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// A joint vector is considered to match the configuration it was back-computed from
/// when the summed squared angular difference is below this value.
pub const ANGLE_TOL: f64 = 1e-4;

/// Distance tolerance, millimeters.
pub const DISTANCE_TOL: f64 = 1e-3;

/// Closeness to a singular position (cosines, sines or radii in mm) where analytic
/// solutions become ill conditioned.
pub const SINGULARITY_TOL: f64 = 1e-4;

/// Two consecutive substep durations closer than this belong to the same keyframe span.
pub const TIME_TOL: f64 = 1e-9;

bitflags! {
    /// Selects one of up to 8 analytic inverse kinematic solutions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Configuration: u8 {
        const SHOULDER = 0b0001;
        const ELBOW = 0b0010;
        const WRIST = 0b0100;
        /// The pose was reached through a near singular solution and the branch cannot be trusted.
        const UNDEFINED = 0b1000;
    }
}

impl Configuration {
    /// Configuration of the analytic branch with the given index (0..8).
    pub fn from_index(index: usize) -> Self {
        Configuration::from_bits_truncate((index & 0b111) as u8)
    }

    /// Index of the analytic branch, ignoring the undefined flag.
    pub fn index(&self) -> usize {
        (self.bits() & 0b111) as usize
    }

    pub fn is_undefined(&self) -> bool {
        self.contains(Configuration::UNDEFINED)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            return write!(f, "Undefined");
        }
        if self.is_empty() {
            return write!(f, "None");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "{}", names.join(" | "))
    }
}

/// The result of solving one target against one mechanism.
#[derive(Clone, Debug, Default)]
pub struct KinematicSolution {
    pub joints: Vec<f64>,
    /// One pose per joint, in world coordinates. For a mechanical group this is the planes of
    /// the external mechanisms, then the arm base, arm joints and finally the tool center point.
    pub planes: Vec<Pose>,
    pub configuration: Configuration,
    /// Singularities, unreachable poses and out of range joints. Never raised as Rust errors.
    pub errors: Vec<String>,
    /// World pose of the target frame the solution was computed for.
    pub frame: Pose,
}

impl KinematicSolution {
    /// The last plane, that is the tool center point for a mechanical group.
    pub fn tcp(&self) -> Pose {
        self.planes.last().copied().unwrap_or_else(Pose::identity)
    }
}

/// One analytic inverse kinematic branch.
#[derive(Clone, Debug, Default)]
pub struct Inverse {
    pub joints: Vec<f64>,
    pub errors: Vec<String>,
}

/// The branch closest to the previous joints, see [`Kinematics::closest_solution`].
#[derive(Clone, Debug, Default)]
pub struct ClosestSolution {
    pub joints: Vec<f64>,
    pub configuration: Configuration,
    pub errors: Vec<String>,
    /// Summed squared angular distance to the previous joints.
    pub difference: f64,
}

/// Analytic kinematics of a serial arm. All poses are relative to the arm base.
pub trait Kinematics {
    /// Number of joints
    fn dof(&self) -> usize;

    /// Cumulative poses of every joint frame, the last one being the flange.
    fn forward(&self, joints: &[f64]) -> Vec<Pose>;

    /// Solves one analytic branch. `redundancy` is only read by arms with more than 6 axes.
    /// Returned joints are normalized into (-pi, pi].
    fn inverse(&self, flange: &Pose, configuration: Configuration, redundancy: f64) -> Inverse;

    /// Redundancy parameter to use when following a path from `previous` joints.
    fn redundancy(&self, _previous: &[f64]) -> f64 {
        0.0
    }

    /// Solves all 8 branches and returns the one closest to `previous`, with every joint
    /// moved to the 2*pi continuation nearest to the previous value of that joint.
    fn closest_solution(&self, flange: &Pose, previous: &[f64]) -> ClosestSolution {
        let redundancy = self.redundancy(previous);
        let mut closest = ClosestSolution {
            difference: f64::INFINITY,
            ..Default::default()
        };

        for index in 0..8 {
            let configuration = Configuration::from_index(index);
            let solution = self.inverse(flange, configuration, redundancy);
            let joints = absolute_joints(&solution.joints, previous);
            let difference = squared_difference(&joints, previous);
            if difference < closest.difference {
                closest = ClosestSolution {
                    joints,
                    configuration,
                    errors: solution.errors,
                    difference,
                };
            }
        }
        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_index() {
        for i in 0..8 {
            assert_eq!(Configuration::from_index(i).index(), i);
        }
        let undefined = Configuration::UNDEFINED | Configuration::ELBOW;
        assert_eq!(undefined.index(), 2);
        assert!(undefined.is_undefined());
    }

    #[test]
    fn test_configuration_display() {
        assert_eq!(Configuration::empty().to_string(), "None");
        assert_eq!(Configuration::UNDEFINED.to_string(), "Undefined");
        assert_eq!(
            (Configuration::SHOULDER | Configuration::WRIST).to_string(),
            "SHOULDER | WRIST"
        );
    }
}
