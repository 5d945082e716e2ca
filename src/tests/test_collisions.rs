#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parry3d::math::Isometry;
    use parry3d::shape::SharedShape;

    use crate::collisions::{CollisionSettings, SystemShapes};
    use crate::kinematic_traits::Pose;
    use crate::program::Program;
    use crate::tests::test_utils::{HOME, irb4600_system, linear_moves, work_frame};

    /// Shape index of the TCP plane of the only group, and the environment after it.
    const TCP: usize = 7;
    const ENVIRONMENT: usize = 8;

    fn sweep_program() -> Program {
        let system = irb4600_system();
        let targets = linear_moves(&system, &[50.0, 100.0, 150.0, 200.0, 250.0, 300.0], 100.0);
        Program::new("Sweep", system, vec![targets], 50.0).expect("compiles")
    }

    fn shapes() -> SystemShapes {
        let mut shapes = SystemShapes::default();
        shapes.tools.insert("Spindle".to_string(), SharedShape::ball(10.0));
        shapes
    }

    /// Obstacle centered where the TCP is at the given X offset of the work frame. Static
    /// environment shapes are in world coordinates, so the ball is placed inside a compound.
    fn settings_with_obstacle(offset: f64, threads: Option<usize>) -> CollisionSettings {
        let system = irb4600_system();
        let frame = work_frame(&system, &HOME);
        let center = (frame.pose * Pose::translation(offset, 0.0, 500.0)).translation.vector.cast::<f32>();
        let obstacle = SharedShape::compound(vec![(
            Isometry::translation(center.x, center.y, center.z),
            SharedShape::ball(20.0),
        )]);
        CollisionSettings {
            environment: Some(obstacle),
            linear_step: 5.0,
            threads,
            ..CollisionSettings::new(vec![TCP], vec![ENVIRONMENT])
        }
    }

    #[test]
    fn test_earliest_collision_is_found() {
        let program = sweep_program();
        assert!(program.errors.is_empty(), "{:?}", program.errors);
        assert_eq!(program.keyframes.len(), 7);

        let collision = program
            .check_collisions(&shapes(), &settings_with_obstacle(150.0, Some(2)))
            .expect("checked");
        assert!(collision.has_collision);
        assert_eq!(collision.target_index, 3);
        assert_eq!(collision.meshes, (TCP, ENVIRONMENT));
        assert_eq!(collision.kinematics.len(), 1);

        let collision = program
            .check_collisions(&shapes(), &settings_with_obstacle(100.0, Some(2)))
            .expect("checked");
        assert!(collision.has_collision);
        assert_eq!(collision.target_index, 2);
    }

    #[test]
    fn test_thread_count_does_not_change_the_result() {
        let program = sweep_program();
        let single = program
            .check_collisions(&shapes(), &settings_with_obstacle(250.0, Some(1)))
            .expect("checked");
        let parallel = program
            .check_collisions(&shapes(), &settings_with_obstacle(250.0, Some(4)))
            .expect("checked");
        assert!(single.has_collision && parallel.has_collision);
        assert_eq!(single.target_index, parallel.target_index);
        assert_eq!(single.target_index, 5);
    }

    #[test]
    fn test_far_obstacle_does_not_collide() {
        let program = sweep_program();
        let collision = program
            .check_collisions(&shapes(), &settings_with_obstacle(1000.0, None))
            .expect("checked");
        assert!(!collision.has_collision);
        assert!(collision.kinematics.is_empty());
    }

    #[test]
    fn test_missing_tool_shape_is_skipped() {
        let program = sweep_program();
        let collision = program
            .check_collisions(&SystemShapes::default(), &settings_with_obstacle(150.0, None))
            .expect("checked");
        assert!(!collision.has_collision);
    }

    #[test]
    fn test_substeps_with_solver_errors_are_not_posed() {
        let system = irb4600_system();
        let targets = linear_moves(&system, &[150.0, 300.0], 100.0);
        let mut program = Program::new("Clamped", system.clone(), vec![targets], 50.0).expect("compiles");
        assert_eq!(program.keyframes.len(), 3);

        // Drive axis 1 far past its limit on the way to the last keyframe. The solver clamps it
        // and reports the range error.
        let last = program.keyframes.last_mut().expect("keyframe");
        let moved = &mut last.program_targets[0];
        moved.kinematics.joints[0] = 10.0;
        moved.target = Arc::new(moved.target.to_joint_target(moved.kinematics.joints.clone()));
        let clamped = system.kinematics(&[moved.target.as_ref()], None).expect("solved");
        assert!(!clamped[0].errors.is_empty());

        // Obstacle right at the clamped pose, far from every valid substep.
        let center = clamped[0].tcp().translation.vector.cast::<f32>();
        let obstacle = SharedShape::compound(vec![(
            Isometry::translation(center.x, center.y, center.z),
            SharedShape::ball(20.0),
        )]);
        let settings = CollisionSettings {
            environment: Some(obstacle),
            linear_step: 1000.0,
            angular_step: 100.0,
            ..CollisionSettings::new(vec![TCP], vec![ENVIRONMENT])
        };
        let collision = program.check_collisions(&shapes(), &settings).expect("checked");
        assert!(!collision.has_collision, "{:?}", collision.meshes);
    }
}
