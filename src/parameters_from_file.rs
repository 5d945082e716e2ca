//! Supports reading robot cells from YAML files (optional)

use std::path::Path;

use yaml_rust2::{Yaml, YamlLoader};

use crate::emitter::Manufacturer;
use crate::kinematic_traits::Pose;
use crate::kinematics_impl::{RobotArm, Topology};
use crate::mechanism::{CustomMechanism, Mechanism, Positioner, Track};
use crate::parameter_error::ParameterError;
use crate::parameters::{Joint, JointKind};
use crate::robot_system::{MechanicalGroup, RobotSystem};
use crate::utils::pose_from_xyz_rpy;

impl RobotSystem {
    /// Read the robot cell from YAML file. YAML file like this is supported:
    /// ```yaml
    /// name: Cell
    /// base: [0, 0, 0, 0, 0, 0]
    /// groups:
    ///   - arm:
    ///       name: IRB4600-40
    ///       manufacturer: ABB
    ///       topology: spherical_wrist
    ///       payload: 40
    ///       base: [0, 0, 0, 0, 0, 0]
    ///       joints:
    ///         - { a: 175, d: 495, min: -180, max: 180, max_speed: 175 }
    ///         # ... one entry per axis
    ///     externals:
    ///       - type: track
    ///         name: Track
    ///         moves_robot: true
    ///         joints:
    ///           - { min: 0, max: 4000, max_speed: 1000 }
    /// ```
    /// Poses are `[x, y, z, rx, ry, rz]` with angles in degrees. Ranges and speeds of revolute
    /// axes are in degrees and degrees per second, of prismatic axes in mm and mm/s.
    /// Topology is `spherical_wrist`, `offset_wrist` or `redundant`. Externals are `track`,
    /// `positioner` (with `axes` poses) or `custom` (with `axes` and a `kind` per joint).
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let docs = YamlLoader::load_from_str(contents)
            .map_err(|e| ParameterError::ParseError(e.to_string()))?;
        let doc = docs
            .first()
            .ok_or_else(|| ParameterError::ParseError("empty document".to_string()))?;

        let name = optional_str(doc, "name").unwrap_or("Cell");
        let base = optional_pose(doc, "base")?;
        let groups = field(doc, "groups")?
            .as_vec()
            .ok_or_else(|| ParameterError::ParseError("groups must be a list".to_string()))?
            .iter()
            .map(parse_group)
            .collect::<Result<Vec<_>, _>>()?;
        if groups.is_empty() {
            return Err(ParameterError::KinematicsConfigurationError(
                "the cell has no mechanical groups".to_string(),
            ));
        }
        Ok(RobotSystem::new(name, base, groups))
    }
}

fn field<'a>(yaml: &'a Yaml, key: &str) -> Result<&'a Yaml, ParameterError> {
    let value = &yaml[key];
    if value.is_badvalue() || value.is_null() {
        Err(ParameterError::MissingField(key.to_string()))
    } else {
        Ok(value)
    }
}

fn optional_str<'a>(yaml: &'a Yaml, key: &str) -> Option<&'a str> {
    yaml[key].as_str()
}

/// Numbers can be written as integers or reals.
fn as_number(value: &Yaml, key: &str) -> Result<f64, ParameterError> {
    match value {
        Yaml::Real(_) => value
            .as_f64()
            .ok_or_else(|| ParameterError::ParseError(format!("{key} is not a number"))),
        Yaml::Integer(i) => Ok(*i as f64),
        _ => Err(ParameterError::ParseError(format!("{key} is not a number"))),
    }
}

fn number(yaml: &Yaml, key: &str) -> Result<f64, ParameterError> {
    as_number(field(yaml, key)?, key)
}

fn optional_number(yaml: &Yaml, key: &str, default: f64) -> Result<f64, ParameterError> {
    match field(yaml, key) {
        Ok(value) => as_number(value, key),
        Err(_) => Ok(default),
    }
}

fn pose(value: &Yaml, key: &str) -> Result<Pose, ParameterError> {
    let values = value
        .as_vec()
        .ok_or_else(|| ParameterError::ParseError(format!("{key} must be a list")))?;
    if values.len() != 6 {
        return Err(ParameterError::InvalidLength {
            expected: 6,
            found: values.len(),
        });
    }
    let mut xyz_rpy = [0.0; 6];
    for (i, v) in values.iter().enumerate() {
        xyz_rpy[i] = as_number(v, key)?;
    }
    Ok(pose_from_xyz_rpy(&xyz_rpy))
}

fn optional_pose(yaml: &Yaml, key: &str) -> Result<Pose, ParameterError> {
    match field(yaml, key) {
        Ok(value) => pose(value, key),
        Err(_) => Ok(Pose::identity()),
    }
}

fn list<'a>(yaml: &'a Yaml, key: &str) -> Result<&'a Vec<Yaml>, ParameterError> {
    field(yaml, key)?
        .as_vec()
        .ok_or_else(|| ParameterError::ParseError(format!("{key} must be a list")))
}

fn parse_joint(yaml: &Yaml, kind: JointKind) -> Result<Joint, ParameterError> {
    let (min, max, speed) = (
        number(yaml, "min")?,
        number(yaml, "max")?,
        number(yaml, "max_speed")?,
    );
    if min > max {
        return Err(ParameterError::KinematicsConfigurationError(format!(
            "joint range [{min}, {max}] is empty"
        )));
    }
    Ok(match kind {
        JointKind::Revolute => Joint::revolute_deg(
            optional_number(yaml, "a", 0.0)?,
            optional_number(yaml, "d", 0.0)?,
            min,
            max,
            speed,
        ),
        JointKind::Prismatic => Joint::prismatic((min, max), speed),
    })
}

fn parse_group(yaml: &Yaml) -> Result<MechanicalGroup, ParameterError> {
    let arm = field(yaml, "arm")?;
    let name = optional_str(arm, "name").unwrap_or("Robot");
    let manufacturer = match optional_str(arm, "manufacturer") {
        Some(m) => m.parse::<Manufacturer>().map_err(ParameterError::ParseError)?,
        None => Manufacturer::Other,
    };
    let topology = match optional_str(arm, "topology").unwrap_or("spherical_wrist") {
        "spherical_wrist" => Topology::SphericalWrist,
        "offset_wrist" => Topology::OffsetWrist,
        "redundant" => Topology::Redundant,
        other => {
            return Err(ParameterError::ParseError(format!("unknown topology '{other}'")));
        }
    };
    let joints = list(arm, "joints")?
        .iter()
        .map(|j| parse_joint(j, JointKind::Revolute))
        .collect::<Result<Vec<_>, _>>()?;
    let arm = RobotArm::new(
        name,
        manufacturer,
        topology,
        joints,
        optional_pose(arm, "base")?,
        optional_number(arm, "payload", 0.0)?,
    )?;

    let externals = match field(yaml, "externals") {
        Ok(_) => list(yaml, "externals")?
            .iter()
            .map(parse_mechanism)
            .collect::<Result<Vec<_>, _>>()?,
        Err(_) => Vec::new(),
    };
    Ok(MechanicalGroup::new(arm, externals))
}

fn parse_mechanism(yaml: &Yaml) -> Result<Mechanism, ParameterError> {
    let kind = optional_str(yaml, "type")
        .ok_or_else(|| ParameterError::MissingField("type".to_string()))?;
    let name = optional_str(yaml, "name").unwrap_or(kind);
    let base = optional_pose(yaml, "base")?;
    let moves_robot = yaml["moves_robot"].as_bool().unwrap_or(false);
    let axes = || -> Result<Vec<Pose>, ParameterError> {
        list(yaml, "axes")?.iter().map(|a| pose(a, "axes")).collect()
    };

    Ok(match kind {
        "track" => {
            let joints = list(yaml, "joints")?
                .iter()
                .map(|j| parse_joint(j, JointKind::Prismatic))
                .collect::<Result<Vec<_>, _>>()?;
            Mechanism::Track(Track::new(name, joints, base, moves_robot)?)
        }
        "positioner" => {
            let joints = list(yaml, "joints")?
                .iter()
                .map(|j| parse_joint(j, JointKind::Revolute))
                .collect::<Result<Vec<_>, _>>()?;
            Mechanism::Positioner(Positioner::new(name, joints, axes()?, base, moves_robot)?)
        }
        "custom" => {
            let joints = list(yaml, "joints")?
                .iter()
                .map(|j| {
                    let kind = match optional_str(j, "kind").unwrap_or("revolute") {
                        "prismatic" => JointKind::Prismatic,
                        _ => JointKind::Revolute,
                    };
                    parse_joint(j, kind)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Mechanism::Custom(CustomMechanism::new(name, joints, axes()?, base, moves_robot)?)
        }
        other => {
            return Err(ParameterError::ParseError(format!("unknown mechanism type '{other}'")));
        }
    })
}
