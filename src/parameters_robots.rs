//! Hardcoded parameters for a few robots and external mechanisms.
//! Joint ranges are expressed in the solver joint space (DH angles), not in controller angles.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Translation3, UnitQuaternion, Vector3};

use crate::emitter::Manufacturer;
use crate::kinematic_traits::Pose;
use crate::kinematics_impl::{ArmKinematics, RobotArm};
use crate::mechanism::{Positioner, Track};
use crate::offset_wrist::OffsetWrist;
use crate::parameters::Joint;
use crate::redundant::RedundantArm;
use crate::spherical_wrist::SphericalWrist;

fn arm(
    name: &str,
    manufacturer: Manufacturer,
    kinematics: ArmKinematics,
    joints: Vec<Joint>,
    payload: f64,
) -> RobotArm {
    RobotArm {
        name: name.to_string(),
        manufacturer,
        kinematics,
        joints,
        base: Pose::identity(),
        payload,
    }
}

fn a_d(joints: &[Joint]) -> ([f64; 6], [f64; 6]) {
    let mut a = [0.0; 6];
    let mut d = [0.0; 6];
    for (i, joint) in joints.iter().take(6).enumerate() {
        a[i] = joint.a;
        d[i] = joint.d;
    }
    (a, d)
}

impl RobotArm {
    /// ABB IRB 4600-40/2.55
    pub fn irb4600_40() -> Self {
        let joints = vec![
            Joint::revolute_deg(175.0, 495.0, -180.0, 180.0, 175.0),
            Joint::revolute_deg(1095.0, 0.0, -90.0, 180.0, 175.0),
            Joint::revolute_deg(175.0, 0.0, -180.0, 180.0, 175.0),
            Joint::revolute_deg(0.0, 1270.0, -400.0, 400.0, 250.0),
            Joint::revolute_deg(0.0, 0.0, -125.0, 125.0, 250.0),
            Joint::revolute_deg(0.0, 135.0, -400.0, 400.0, 360.0),
        ];
        let (a, d) = a_d(&joints);
        arm(
            "IRB4600-40",
            Manufacturer::Abb,
            ArmKinematics::SphericalWrist(SphericalWrist::new(a, d)),
            joints,
            40.0,
        )
    }

    /// ABB IRB 120
    pub fn irb120() -> Self {
        let joints = vec![
            Joint::revolute_deg(0.0, 290.0, -165.0, 165.0, 250.0),
            Joint::revolute_deg(270.0, 0.0, -30.0, 210.0, 250.0),
            Joint::revolute_deg(70.0, 0.0, -180.0, 180.0, 250.0),
            Joint::revolute_deg(0.0, 302.0, -160.0, 160.0, 320.0),
            Joint::revolute_deg(0.0, 0.0, -120.0, 120.0, 320.0),
            Joint::revolute_deg(0.0, 72.0, -400.0, 400.0, 420.0),
        ];
        let (a, d) = a_d(&joints);
        arm(
            "IRB120",
            Manufacturer::Abb,
            ArmKinematics::SphericalWrist(SphericalWrist::new(a, d)),
            joints,
            3.0,
        )
    }

    /// Universal Robots UR5e
    pub fn ur5e() -> Self {
        let joints = vec![
            Joint::revolute_deg(0.0, 162.5, -360.0, 360.0, 180.0),
            Joint::revolute_deg(-425.0, 0.0, -360.0, 360.0, 180.0),
            Joint::revolute_deg(-392.2, 0.0, -360.0, 360.0, 180.0),
            Joint::revolute_deg(0.0, 133.3, -360.0, 360.0, 180.0),
            Joint::revolute_deg(0.0, 99.7, -360.0, 360.0, 180.0),
            Joint::revolute_deg(0.0, 99.6, -360.0, 360.0, 180.0),
        ];
        let (a, d) = a_d(&joints);
        arm(
            "UR5e",
            Manufacturer::UR,
            ArmKinematics::OffsetWrist(OffsetWrist::new(a, d)),
            joints,
            5.0,
        )
    }

    /// Universal Robots UR10e
    pub fn ur10e() -> Self {
        let joints = vec![
            Joint::revolute_deg(0.0, 180.7, -360.0, 360.0, 120.0),
            Joint::revolute_deg(-612.7, 0.0, -360.0, 360.0, 120.0),
            Joint::revolute_deg(-571.55, 0.0, -360.0, 360.0, 180.0),
            Joint::revolute_deg(0.0, 174.15, -360.0, 360.0, 180.0),
            Joint::revolute_deg(0.0, 119.85, -360.0, 360.0, 180.0),
            Joint::revolute_deg(0.0, 116.55, -360.0, 360.0, 180.0),
        ];
        let (a, d) = a_d(&joints);
        arm(
            "UR10e",
            Manufacturer::UR,
            ArmKinematics::OffsetWrist(OffsetWrist::new(a, d)),
            joints,
            12.5,
        )
    }

    /// KUKA LBR iiwa 7 R800
    pub fn iiwa7() -> Self {
        let joints = vec![
            Joint::revolute_deg(0.0, 340.0, -170.0, 170.0, 98.0),
            Joint::revolute_deg(0.0, 0.0, -120.0, 120.0, 98.0),
            Joint::revolute_deg(0.0, 400.0, -170.0, 170.0, 100.0),
            Joint::revolute_deg(0.0, 0.0, -120.0, 120.0, 130.0),
            Joint::revolute_deg(0.0, 400.0, -170.0, 170.0, 140.0),
            Joint::revolute_deg(0.0, 0.0, -120.0, 120.0, 180.0),
            Joint::revolute_deg(0.0, 126.0, -175.0, 175.0, 180.0),
        ];
        let mut d = [0.0; 7];
        for (i, joint) in joints.iter().enumerate() {
            d[i] = joint.d;
        }
        arm(
            "LBR iiwa 7 R800",
            Manufacturer::Kuka,
            ArmKinematics::Redundant(RedundantArm::new(d)),
            joints,
            7.0,
        )
    }
}

impl Track {
    /// Floor track along the X axis carrying the arm.
    pub fn linear(name: &str, length: f64, max_speed: f64) -> Self {
        Track {
            name: name.to_string(),
            joints: vec![Joint::prismatic((0.0, length), max_speed)],
            base: Pose::identity(),
            moves_robot: true,
        }
    }
}

impl Positioner {
    /// Turntable rotating about the vertical axis, table plate at the given height.
    pub fn single_axis(name: &str, base: Pose, height: f64) -> Self {
        Positioner {
            name: name.to_string(),
            joints: vec![Joint::revolute_deg(0.0, 0.0, -360.0, 360.0, 120.0)],
            axes: vec![Pose::translation(0.0, 0.0, height)],
            base,
            moves_robot: false,
        }
    }

    /// Tilt about the X axis followed by the table rotation.
    pub fn two_axis(name: &str, base: Pose, height: f64) -> Self {
        let tilt_axis = Pose::from_parts(
            Translation3::new(0.0, 0.0, height),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2),
        );
        let table_axis = Pose::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2),
        );
        Positioner {
            name: name.to_string(),
            joints: vec![
                Joint::revolute_deg(0.0, 0.0, -135.0, 135.0, 90.0),
                Joint::revolute_deg(0.0, 0.0, -360.0, 360.0, 120.0),
            ],
            axes: vec![tilt_axis, table_axis],
            base,
            moves_robot: false,
        }
    }
}
