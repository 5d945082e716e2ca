//! Swept collision checking of a compiled program.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::Isometry3;
use parry3d::shape::SharedShape;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use crate::kinematic_traits::{KinematicSolution, Pose};
use crate::program::{Program, SystemTarget};
use crate::program_error::ProgramError;
use crate::target::Target;

/// Shapes attached to the planes of the robot system.
#[derive(Clone, Default)]
pub struct SystemShapes {
    /// Per group, one optional shape per plane of the group solution (external mechanisms, arm
    /// base, arm joints, TCP), in the plane's local coordinates.
    pub groups: Vec<Vec<Option<SharedShape>>>,
    /// Tool shapes by tool name, in flange coordinates. A tool shape takes the index of the TCP
    /// plane of its group.
    pub tools: HashMap<String, SharedShape>,
}

/// What to check. Shape indices are plane indices of all groups flattened in group order; the
/// environment shape takes the index after the last plane.
#[derive(Clone)]
pub struct CollisionSettings {
    pub first: Vec<usize>,
    pub second: Vec<usize>,
    pub environment: Option<SharedShape>,
    /// Flattened plane the environment moves with. Static in world coordinates when none.
    pub environment_plane: Option<usize>,
    /// Maximal TCP travel between checked poses, mm
    pub linear_step: f64,
    /// Maximal joint travel between checked poses, rad
    pub angular_step: f64,
    /// Dedicated thread pool size, the global pool when none.
    pub threads: Option<usize>,
}

impl CollisionSettings {
    pub fn new(first: Vec<usize>, second: Vec<usize>) -> Self {
        CollisionSettings {
            first,
            second,
            environment: None,
            environment_plane: None,
            linear_step: 100.0,
            angular_step: std::f64::consts::PI / 4.0,
            threads: None,
        }
    }
}

/// The earliest collision of a program.
#[derive(Debug, Clone, Default)]
pub struct Collision {
    pub has_collision: bool,
    /// Target the system was moving to when the collision happened.
    pub target_index: usize,
    /// Colliding shape indices, the smaller one first.
    pub meshes: (usize, usize),
    pub kinematics: Vec<KinematicSolution>,
}

impl Program {
    /// Finds the earliest collision between the `first` and `second` shape sets along the whole
    /// keyframe timeline. Motions between keyframes are checked in parallel.
    pub fn check_collisions(
        &self,
        shapes: &SystemShapes,
        settings: &CollisionSettings,
    ) -> Result<Collision, ProgramError> {
        match settings.threads {
            None => Ok(self.earliest_collision(shapes, settings)),
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ProgramError::ThreadPool(e.to_string()))?;
                Ok(pool.install(|| self.earliest_collision(shapes, settings)))
            }
        }
    }

    fn earliest_collision(&self, shapes: &SystemShapes, settings: &CollisionSettings) -> Collision {
        let keyframes = &self.keyframes;
        if keyframes.len() < 2 {
            return keyframes
                .first()
                .and_then(|k| self.collision_at(k, &k.kinematics(), shapes, settings))
                .unwrap_or_default();
        }

        let best = AtomicUsize::new(usize::MAX);
        let found: Mutex<Option<(usize, Collision)>> = Mutex::new(None);

        (1..keyframes.len()).into_par_iter().for_each(|pair| {
            let (prev, next) = (&keyframes[pair - 1], &keyframes[pair]);
            let divisions = self.collision_divisions(prev, next, settings);
            let start = if pair == 1 { 0 } else { 1 };
            let mut previous = prev.joints();

            for j in start..=divisions {
                if best.load(Ordering::Acquire) < pair {
                    return;
                }
                let kinematics = if j == 0 {
                    prev.kinematics()
                } else {
                    let t = j as f64 / divisions as f64;
                    let targets = next.lerp(prev, &self.robot_system, t, 0.0, 1.0);
                    let refs: Vec<&Target> = targets.iter().collect();
                    match self.robot_system.kinematics(&refs, Some(&previous)) {
                        Ok(kinematics) => kinematics,
                        Err(_) => continue,
                    }
                };
                // Clamped joints of a failed solve do not show where the arm is.
                if kinematics.iter().any(|k| !k.errors.is_empty()) {
                    continue;
                }
                previous = kinematics.iter().map(|k| k.joints.clone()).collect();

                if let Some(collision) = self.collision_at(next, &kinematics, shapes, settings) {
                    let mut slot = found.lock().unwrap_or_else(|e| e.into_inner());
                    if slot.as_ref().is_none_or(|(p, _)| pair < *p) {
                        debug!(
                            "Collision between shapes {} and {} moving to target {}",
                            collision.meshes.0, collision.meshes.1, collision.target_index
                        );
                        *slot = Some((pair, collision));
                    }
                    best.fetch_min(pair, Ordering::AcqRel);
                    return;
                }
            }
        });

        found
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .map(|(_, collision)| collision)
            .unwrap_or_default()
    }

    fn collision_divisions(&self, prev: &SystemTarget, next: &SystemTarget, settings: &CollisionSettings) -> usize {
        let mut divisions = 1;
        for (a, b) in prev.program_targets.iter().zip(&next.program_targets) {
            let distance = (b.kinematics.tcp().translation.vector
                - a.kinematics.tcp().translation.vector)
                .norm();
            let dof = self.robot_system.groups[b.group].arm.dof();
            let rotation = a
                .kinematics
                .joints
                .iter()
                .zip(&b.kinematics.joints)
                .take(dof)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max);
            if settings.linear_step > 0.0 {
                divisions = divisions.max((distance / settings.linear_step).ceil() as usize);
            }
            if settings.angular_step > 0.0 {
                divisions = divisions.max((rotation / settings.angular_step).ceil() as usize);
            }
        }
        divisions
    }

    /// First colliding shape pair in the given system state, checked in settings order.
    fn collision_at(
        &self,
        target: &SystemTarget,
        kinematics: &[KinematicSolution],
        shapes: &SystemShapes,
        settings: &CollisionSettings,
    ) -> Option<Collision> {
        let planes: Vec<Pose> = kinematics.iter().flat_map(|k| k.planes.iter().copied()).collect();
        let mut posed: Vec<Option<(Isometry3<f32>, &SharedShape)>> = vec![None; planes.len() + 1];

        let mut offset = 0;
        for (g, solution) in kinematics.iter().enumerate() {
            let group_shapes = shapes.groups.get(g);
            for (k, plane) in solution.planes.iter().enumerate() {
                if let Some(Some(shape)) = group_shapes.and_then(|s| s.get(k)) {
                    posed[offset + k] = Some((plane.cast::<f32>(), shape));
                }
            }
            let group = &self.robot_system.groups[g];
            let tool = target.program_targets.get(g).map(|t| t.target.tool.name.as_str());
            if let Some(shape) = tool.and_then(|name| shapes.tools.get(name)) {
                if let Some(flange) = solution.planes.get(group.flange_plane_index()) {
                    posed[offset + group.plane_count() - 1] = Some((flange.cast::<f32>(), shape));
                }
            }
            offset += solution.planes.len();
        }
        if let Some(environment) = &settings.environment {
            let pose = match settings.environment_plane {
                Some(plane) => planes.get(plane).copied().unwrap_or_else(Pose::identity),
                None => Pose::identity(),
            };
            posed[planes.len()] = Some((pose.cast::<f32>(), environment));
        }

        for &a in &settings.first {
            for &b in &settings.second {
                if a == b {
                    continue;
                }
                let (Some(Some((pose_a, shape_a))), Some(Some((pose_b, shape_b)))) =
                    (posed.get(a), posed.get(b))
                else {
                    continue;
                };
                let collides =
                    parry3d::query::intersection_test(pose_a, &***shape_a, pose_b, &***shape_b)
                        .unwrap_or(false);
                if collides {
                    return Some(Collision {
                        has_collision: true,
                        target_index: target.index,
                        meshes: (a.min(b), a.max(b)),
                        kinematics: kinematics.to_vec(),
                    });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = CollisionSettings::new(vec![7], vec![8]);
        assert!(settings.environment.is_none());
        assert!(settings.threads.is_none());
        assert!(settings.linear_step > 0.0 && settings.angular_step > 0.0);
    }
}
