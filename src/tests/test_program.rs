#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::attributes::{Command, CommandKind, Frame, Speed, Tool};
    use crate::kinematic_traits::{Configuration, Pose};
    use crate::kinematics_impl::RobotArm;
    use crate::program::{Program, SpeedLimit};
    use crate::program_error::ProgramError;
    use crate::robot_system::RobotSystem;
    use crate::target::Target;
    use crate::tests::test_utils::{
        HOME, are_poses_near, irb4600_system, linear_moves, tcp_of, two_arm_system, work_frame,
    };

    #[test]
    fn test_linear_move_timing() {
        let system = irb4600_system();
        let targets = linear_moves(&system, &[300.0], 100.0);
        let program = Program::new("Linear", system, vec![targets], 50.0).expect("compiles");

        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert_eq!(program.targets.len(), 2);
        assert!((program.duration - 3.0).abs() < 1e-6, "duration {}", program.duration);

        // 300 mm in steps of 50 mm.
        assert_eq!(program.targets[1].divisions, 6);

        let target = &program.targets[1].program_targets[0];
        assert_eq!(target.kinematics.configuration, Configuration::empty());
        assert!(!target.changes_configuration);

        assert!(
            program
                .warnings
                .contains(&"Target 1 of robot 0: motion is limited by translation speed.".to_string())
        );

        // Constant speed along the line: only the end of the motion is a keyframe.
        assert_eq!(program.keyframes.len(), 2);
        let last = program.keyframes.last().expect("keyframe");
        assert!((last.total_time - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_linear_move_reaches_the_line() {
        let system = irb4600_system();
        let frame = work_frame(&system, &HOME);
        let targets = linear_moves(&system, &[300.0], 100.0);
        let program = Program::new("Linear", system, vec![targets], 50.0).expect("compiles");
        let reached = program.targets[1].program_targets[0].world_plane();
        let expected = frame.pose * Pose::translation(300.0, 0.0, 500.0);
        assert!((reached.translation.vector - expected.translation.vector).norm() < 1e-6);
    }

    #[test]
    fn test_forced_configuration_on_linear_target_is_ignored() {
        let system = irb4600_system();
        let mut targets = linear_moves(&system, &[100.0], 100.0);
        targets[1] = targets[1].with_configuration(Some(Configuration::ELBOW));
        let program = Program::new("Forced", system, vec![targets], 10.0).expect("compiles");

        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert!(
            program
                .warnings
                .iter()
                .any(|w| w.contains("configuration is ignored for linear motions"))
        );
        let target = &program.targets[1].program_targets[0];
        assert_eq!(target.target.configuration(), None);
        assert_eq!(target.kinematics.configuration, Configuration::empty());
    }

    #[test]
    fn test_shoulder_singularity_truncates() {
        let system = irb4600_system();
        let tool = Arc::new(Tool::new("Flange", Pose::identity(), 0.0));
        let targets = vec![
            Target::joint(HOME.to_vec()).with_tool(tool.clone()),
            Target::cartesian(Pose::translation(0.0, 0.0, 1500.0), crate::target::Motion::Joint)
                .with_tool(tool.clone()),
            Target::joint(HOME.to_vec()).with_tool(tool),
        ];
        let program = Program::new("Singular", system, vec![targets], 10.0).expect("compiles");

        assert!(program.has_errors());
        assert!(program.errors[0].starts_with("Errors in target 1 of robot 0"));
        assert!(program.errors.iter().any(|e| e.contains("Near shoulder singularity")));
        assert_eq!(program.targets.len(), 2, "erroneous target is kept, later ones dropped");
        assert_eq!(program.duration, 0.0);
    }

    #[test]
    fn test_unreachable_first_target() {
        let system = irb4600_system();
        let targets = vec![
            Target::cartesian(Pose::translation(9000.0, 0.0, 0.0), crate::target::Motion::Joint),
            Target::joint(HOME.to_vec()),
        ];
        let program = Program::new("Far", system, vec![targets], 10.0).expect("compiles");
        assert!(program.errors.iter().any(|e| e.contains("Target out of reach")));
        assert_eq!(program.targets.len(), 1);
        assert_eq!(program.keyframes.len(), 1);
        assert!(!program.targets[0].program_targets[0].target.is_cartesian());
    }

    #[test]
    fn test_duration_is_monotonic() {
        let system = irb4600_system();
        let mut targets = linear_moves(&system, &[50.0, 150.0, 120.0, 300.0, 0.0], 150.0);
        targets.push(Target::joint(vec![0.4, 1.0, -0.2, 0.3, 1.1, -0.5]));
        let program = Program::new("Monotonic", system, vec![targets], 20.0).expect("compiles");

        assert!(program.errors.is_empty(), "{:?}", program.errors);
        for pair in program.targets.windows(2) {
            assert!(pair[1].total_time >= pair[0].total_time);
            assert!(pair[1].delta_time >= 0.0);
            assert!(pair[1].min_time <= pair[1].delta_time + 1e-9);
        }
        for pair in program.keyframes.windows(2) {
            assert!(pair[1].total_time >= pair[0].total_time);
            assert!(pair[1].index >= pair[0].index);
        }
        let last = program.keyframes.last().expect("keyframes");
        assert!((last.total_time - program.duration).abs() < 1e-9);
        assert!(program.targets.iter().skip(1).all(|t| t.program_targets[0].leading.is_some()));
    }

    #[test]
    fn test_attribute_names_are_unique() {
        let system = irb4600_system();
        let frame = work_frame(&system, &HOME);
        let slow = Arc::new(Speed::new("Fast", 50.0));
        let fast = Arc::new(Speed::new("Fast", 500.0));
        let unnamed = Arc::new(Speed::new("", 250.0));
        let wait = Arc::new(Command::wait(0.25));
        let signal = Arc::new(Command::new(
            "",
            CommandKind::SetDigitalOutput {
                output: "DO_1".to_string(),
                value: true,
            },
        ));
        let both = Arc::new(Command::group("Both", vec![wait.clone(), signal]));

        let line = |x: f64| Target::linear(Pose::translation(x, 0.0, 500.0)).with_frame(frame.clone());
        let targets = vec![
            Target::joint(HOME.to_vec()).with_frame(frame.clone()).with_speed(slow.clone()),
            line(50.0).with_speed(fast.clone()).with_command(Some(both.clone())),
            line(100.0).with_speed(unnamed).with_command(Some(wait)),
            line(150.0).with_speed(slow).with_command(Some(both)),
        ];
        let program = Program::new("Attributes", system, vec![targets], 25.0).expect("compiles");
        assert!(program.errors.is_empty(), "{:?}", program.errors);

        let names: Vec<&str> = program.attributes.iter().map(|a| a.name()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len(), "{:?}", names);
        assert!(names.iter().all(|n| !n.is_empty()));
        assert!(names.contains(&"Fast000"));
        assert!(names.contains(&"SetDO000"));

        // Every attribute used by a target is one of the listed instances.
        for system_target in &program.targets {
            let target = &system_target.program_targets[0];
            let speed_name = &target.target.speed.name;
            assert!(names.contains(&speed_name.as_str()));
            for command in &target.commands {
                assert!(names.contains(&command.name.as_str()), "{}", command.name);
            }
        }
        assert!(program.warnings.iter().any(|w| w.contains("Fast000")));
        assert!(program.warnings.iter().any(|w| w.contains("no tool set")));
    }

    #[test]
    fn test_undefined_configuration_before_linear_motion() {
        let system = irb4600_system();
        let singular = vec![0.0, 1.2, -0.4, 0.5, 0.0, 0.0];
        let start = tcp_of(&system, &singular);
        let targets = vec![
            Target::joint(singular.clone()),
            Target::linear(start * Pose::translation(0.0, 0.0, -50.0)),
        ];
        let program = Program::new("Undefined", system.clone(), vec![targets], 10.0).expect("compiles");
        assert!(program.targets[0].program_targets[0].kinematics.configuration.is_undefined());
        assert!(program.errors.iter().any(|e| e.contains("undefined configuration")));
        assert_eq!(program.targets.len(), 2);

        // A joint motion may leave a singular position.
        let targets = vec![Target::joint(singular), Target::joint(HOME.to_vec())];
        let program = Program::new("Leave", system, vec![targets], 10.0).expect("compiles");
        assert!(program.errors.is_empty(), "{:?}", program.errors);
    }

    #[test]
    fn test_redundant_arm_keyframes_every_substep() {
        let system = Arc::new(RobotSystem::single(RobotArm::iiwa7()));
        let home = vec![0.0, 0.6, 0.0, -1.4, 0.0, 0.9, 0.0];
        let frame = Arc::new(Frame::new("Flange", tcp_of(&system, &home)));
        let targets = vec![
            Target::joint(home).with_frame(frame.clone()),
            Target::linear(Pose::translation(0.0, 0.0, -100.0)).with_frame(frame),
        ];
        let program = Program::new("Iiwa", system, vec![targets], 10.0).expect("compiles");

        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert_eq!(program.keyframes.len(), 11);
        let joints = &program.targets[1].program_targets[0].kinematics.joints;
        assert_eq!(joints.len(), 7);
        assert!(joints[2].abs() < 1e-9, "redundant axis follows the previous value");
    }

    #[test]
    fn test_structural_errors() {
        let system = irb4600_system();
        assert_eq!(
            Program::new("Empty", system.clone(), vec![vec![]], 10.0).err(),
            Some(ProgramError::EmptyProgram)
        );
        assert_eq!(
            Program::new("Two", system.clone(), vec![vec![], vec![]], 10.0).err(),
            Some(ProgramError::GroupCountMismatch {
                expected: 1,
                found: 2
            })
        );
        let targets = vec![Target::joint(HOME.to_vec())];
        assert!(matches!(
            Program::new("Step", system.clone(), vec![targets.clone()], 0.0),
            Err(ProgramError::InvalidStepSize(_))
        ));

        let coupled = Arc::new(Frame::coupled("Self", Pose::identity(), 0, None));
        let targets = vec![Target::joint(HOME.to_vec()).with_frame(coupled)];
        assert!(matches!(
            Program::new("Coupled", system, vec![targets], 10.0),
            Err(ProgramError::FrameCoupling(_))
        ));
    }

    #[test]
    fn test_heavy_tool_is_warned() {
        let system = irb4600_system();
        let heavy = Arc::new(Tool::new("Heavy", Pose::identity(), 80.0));
        let targets = vec![Target::joint(HOME.to_vec()).with_tool(heavy)];
        let program = Program::new("Heavy", system, vec![targets], 10.0).expect("compiles");
        assert!(program.warnings.iter().any(|w| w.contains("exceeds the payload")));
    }

    fn timed_line(time: f64) -> Program {
        let system = irb4600_system();
        let mut targets = linear_moves(&system, &[300.0], 100.0);
        targets[1] = targets[1].with_speed(Arc::new(Speed::timed("Timed", time)));
        Program::new("Timed", system, vec![targets], 50.0).expect("compiles")
    }

    #[test]
    fn test_programmed_time_replaces_tcp_speed() {
        let program = timed_line(7.0);
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert_eq!(program.targets[1].divisions, 6);
        assert!((program.duration - 7.0).abs() < 1e-9, "duration {}", program.duration);
        assert_eq!(program.targets[1].program_targets[0].leading, Some(SpeedLimit::Time));
        assert!(
            program.warnings.iter().all(|w| !w.contains("limited by")),
            "{:?}",
            program.warnings
        );
    }

    #[test]
    fn test_axis_speed_overrides_short_programmed_time() {
        let program = timed_line(0.01);
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert!(program.duration > 0.01, "duration {}", program.duration);
        assert!(matches!(
            program.targets[1].program_targets[0].leading,
            Some(SpeedLimit::Axis(_))
        ));
        assert!(
            program
                .warnings
                .iter()
                .any(|w| w.starts_with("Target 1 of robot 0: motion is limited by axis")),
            "{:?}",
            program.warnings
        );
    }

    #[test]
    fn test_linear_motion_in_frame_held_by_other_robot() {
        let system = two_arm_system();
        let held = Arc::new(Frame::coupled("Held", Pose::translation(0.0, 0.0, 100.0), 0, None));
        let holder_home = Target::joint(HOME.to_vec());
        let worker_home = Target::joint(HOME.to_vec()).with_frame(held.clone());
        let homes = system
            .kinematics(&[&holder_home, &worker_home], None)
            .expect("solved");

        // 100 mm along the TCP X axis of the second arm, expressed in the held frame.
        let goal = homes[1].tcp() * Pose::translation(100.0, 0.0, 0.0);
        let in_frame = homes[1].frame.inverse() * goal;
        let holder = vec![holder_home.clone(), holder_home];
        let worker = vec![worker_home, Target::linear(in_frame).with_frame(held.clone())];
        let program = Program::new("Coupled", system, vec![holder, worker], 50.0).expect("compiles");

        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert_eq!(program.targets[1].divisions, 2);
        let reached = &program.targets[1].program_targets[1];
        assert!(are_poses_near(&reached.world_plane(), &goal, 1e-6));
        let holder_tcp = program.targets[1].program_targets[0].world_plane();
        assert!(are_poses_near(&reached.kinematics.frame, &(holder_tcp * held.pose), 1e-9));
    }

    #[test]
    fn test_coupling_loop_fails_to_compile() {
        let system = two_arm_system();
        let to_second = Arc::new(Frame::coupled("OnSecond", Pose::identity(), 1, None));
        let to_first = Arc::new(Frame::coupled("OnFirst", Pose::identity(), 0, None));
        let toolpaths = vec![
            vec![Target::joint(HOME.to_vec()).with_frame(to_second)],
            vec![Target::joint(HOME.to_vec()).with_frame(to_first)],
        ];
        assert!(matches!(
            Program::new("Loop", system, toolpaths, 10.0),
            Err(ProgramError::FrameCoupling(_))
        ));
    }
}
