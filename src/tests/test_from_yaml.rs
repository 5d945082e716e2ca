#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nalgebra::Vector3;

    use crate::attributes::{Frame, Speed};
    use crate::kinematic_traits::Pose;
    use crate::kinematics_impl::RobotArm;
    use crate::parameter_error::ParameterError;
    use crate::program::Program;
    use crate::robot_system::RobotSystem;
    use crate::target::Target;
    use crate::tests::test_utils::HOME;

    const READ_ERROR: &str = "Failed to load robot cell from file";
    const CELL: &str = "src/tests/data/irb4600_track.yaml";

    #[test]
    fn test_cell_from_yaml() {
        let system = RobotSystem::from_yaml_file(CELL).expect(READ_ERROR);
        assert_eq!(system.name, "TrackCell");
        assert_eq!(system.groups.len(), 1);

        let group = &system.groups[0];
        let preset = RobotArm::irb4600_40();
        assert_eq!(group.arm.name, preset.name);
        assert_eq!(group.arm.manufacturer, preset.manufacturer);
        assert_eq!(group.arm.payload, preset.payload);
        assert_eq!(group.arm.joints.len(), 6);
        for (loaded, expected) in group.arm.joints.iter().zip(&preset.joints) {
            assert_eq!(loaded.a, expected.a);
            assert_eq!(loaded.d, expected.d);
            assert!((loaded.range.0 - expected.range.0).abs() < 1e-12);
            assert!((loaded.range.1 - expected.range.1).abs() < 1e-12);
            assert!((loaded.max_speed - expected.max_speed).abs() < 1e-12);
        }

        assert_eq!(group.externals.len(), 2);
        assert_eq!(group.externals[0].name(), "Track");
        assert!(group.externals[0].moves_robot());
        assert_eq!(group.externals[1].name(), "Turntable");
        assert_eq!(group.external_count(), 2);
        assert_eq!(group.plane_count(), 12);

        // Same kinematics as the preset when the track is at zero.
        let preset = RobotSystem::single(RobotArm::irb4600_40());
        let target = Target::joint(HOME.to_vec()).with_external(vec![0.0, 0.0]);
        let loaded = system.kinematics(&[&target], None).expect("solved");
        let expected = preset.kinematics(&[&Target::joint(HOME.to_vec())], None).expect("solved");
        let difference = loaded[0].tcp().translation.vector - expected[0].tcp().translation.vector;
        assert!(difference.norm() < 1e-9);
    }

    #[test]
    fn test_program_on_loaded_cell() {
        let system = Arc::new(RobotSystem::from_yaml_file(CELL).expect(READ_ERROR));
        let table = Arc::new(Frame::coupled("Table", Pose::identity(), 0, Some(1)));
        let fast = Arc::new(Speed::new("Fast", 2000.0));
        let start = Target::joint(HOME.to_vec())
            .with_external(vec![0.0, 0.0])
            .with_frame(table)
            .with_speed(fast);
        let targets = vec![start.clone(), start.with_external(vec![1000.0, 0.0])];
        let program = Program::new("Track", system, vec![targets], 10.0).expect("compiles");
        assert!(program.errors.is_empty(), "{:?}", program.errors);

        let (start, end) = (&program.targets[0].program_targets[0], &program.targets[1].program_targets[0]);
        let shift = end.world_plane().translation.vector - start.world_plane().translation.vector;
        assert!((shift - Vector3::new(1000.0, 0.0, 0.0)).norm() < 1e-6);

        // The frame follows the turntable plate.
        let plate = start.kinematics.frame.translation.vector;
        assert!((plate - Vector3::new(2000.0, 1500.0, 700.0)).norm() < 1e-9);

        // One second at the track speed limit of 1000 mm/s.
        assert!((program.duration - 1.0).abs() < 1e-9, "{}", program.duration);
        assert_eq!(
            program.targets[1].program_targets[0].leading,
            Some(crate::program::SpeedLimit::External(0))
        );
        assert!(program.warnings.iter().any(|w| w.contains("limited by external axis 1 speed")));
    }

    #[test]
    fn test_yaml_errors() {
        assert!(matches!(
            RobotSystem::from_yaml_str("name: Empty"),
            Err(ParameterError::MissingField(ref field)) if field == "groups"
        ));
        assert!(matches!(
            RobotSystem::from_yaml_str("base: [0, 0, 0]\ngroups: []"),
            Err(ParameterError::InvalidLength { expected: 6, found: 3 })
        ));
        let unknown = "groups:\n  - arm:\n      topology: delta\n      joints: []\n";
        assert!(matches!(
            RobotSystem::from_yaml_str(unknown),
            Err(ParameterError::ParseError(_))
        ));
        assert!(matches!(
            RobotSystem::from_yaml_file("src/tests/data/missing.yaml"),
            Err(ParameterError::IoError(_))
        ));
    }
}
