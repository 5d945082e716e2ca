//! Program compiler: validates the authored targets, resolves attributes, solves every motion in
//! substeps and builds the keyframe timeline.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::attributes::{Attribute, Command, CommandKind, Frame, Speed, Tool, Zone};
use crate::kinematic_traits::{ANGLE_TOL, DISTANCE_TOL, TIME_TOL};
use crate::program::{SpeedLimit, SystemTarget};
use crate::program_error::ProgramError;
use crate::robot_system::RobotSystem;
use crate::target::Target;
use crate::utils::rotation_angle;

/// Output of the compiler, moved into the program.
#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledProgram {
    pub targets: Vec<SystemTarget>,
    pub keyframes: Vec<SystemTarget>,
    pub attributes: Vec<Attribute>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub duration: f64,
}

pub(crate) struct CheckProgram<'a> {
    system: &'a RobotSystem,
    step_size: f64,
    compiled: CompiledProgram,
}

/// Timing of one substep for one group.
struct StepTime {
    time: f64,
    /// Time needed if only the axis speed limits applied
    axis_time: f64,
    leading: SpeedLimit,
}

fn ptr<T>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as *const () as usize
}

/// Time to travel the distance, unlimited when the speed is not positive.
fn motion_time(distance: f64, speed: f64) -> f64 {
    if speed > 0.0 { distance / speed } else { 0.0 }
}

/// Copies solver errors of the target into program errors. True if there were any.
fn promote_errors(errors: &mut Vec<String>, target: &SystemTarget) -> bool {
    let before = errors.len();
    for (group, error) in target.errors() {
        errors.push(format!(
            "Errors in target {} of robot {}: {}",
            target.index, group, error
        ));
    }
    errors.len() > before
}

impl<'a> CheckProgram<'a> {
    /// Compiles the targets. Targets must already have one program target per group and the same
    /// count for every group.
    pub(crate) fn run(
        system: &'a RobotSystem,
        targets: Vec<SystemTarget>,
        step_size: f64,
    ) -> Result<CompiledProgram, ProgramError> {
        let mut check = CheckProgram {
            system,
            step_size,
            compiled: CompiledProgram {
                targets,
                ..Default::default()
            },
        };

        check.check_frames()?;
        check.resize_externals();
        let solved = check.fix_first_target()?;
        check.check_defaults();
        check.clear_linear_configurations();
        check.resolve_attributes();
        check.check_payload();

        if solved {
            check.segment()?;
        } else {
            check.compiled.targets.truncate(1);
            check.compiled.keyframes = check.compiled.targets.clone();
        }
        Ok(check.compiled)
    }

    fn check_frames(&self) -> Result<(), ProgramError> {
        for system_target in &self.compiled.targets {
            for target in &system_target.program_targets {
                self.system.check_frame(&target.target.frame, target.group)?;
            }
        }
        Ok(())
    }

    fn resize_externals(&mut self) {
        let mut resized = 0;
        for system_target in &mut self.compiled.targets {
            for target in &mut system_target.program_targets {
                let count = self.system.groups[target.group].external_count();
                if target.target.external.len() != count {
                    let mut external = target.target.external.clone();
                    external.resize(count, 0.0);
                    let changed = Arc::new(target.target.with_external(external));
                    target.set_target(changed);
                    resized += 1;
                }
            }
        }
        if resized > 0 {
            self.compiled.warnings.push(format!(
                "External axis values of {} targets did not match the number of external axes of their robot and have been resized.",
                resized
            ));
        }
    }

    /// Solves the first target without previous joints and turns Cartesian first targets into
    /// joint targets, so that every program starts from a defined joint position.
    /// False if the first target cannot be reached.
    fn fix_first_target(&mut self) -> Result<bool, ProgramError> {
        let solutions = self
            .system
            .kinematics(&self.compiled.targets[0].targets(), None)?;

        let first = &mut self.compiled.targets[0];
        for (target, solution) in first.program_targets.iter_mut().zip(&solutions) {
            if !target.target.is_cartesian() {
                continue;
            }
            let dof = self.system.groups[target.group].arm.dof().min(solution.joints.len());
            let joints = solution.joints[..dof].to_vec();
            let external = solution.joints[dof..].to_vec();
            let changed = Arc::new(target.target.to_joint_target(joints).with_external(external));
            target.set_target(changed);
            self.compiled.warnings.push(format!(
                "First target of robot {} has been changed to a joint target.",
                target.group
            ));
        }
        first.set_kinematics(solutions, None);
        Ok(!promote_errors(&mut self.compiled.errors, first))
    }

    fn check_defaults(&mut self) {
        let tool = Tool::default_tool();
        let speed = Speed::default_speed();
        let targets = self.compiled.targets.iter().flat_map(|t| t.program_targets.iter());
        let (mut default_tool, mut default_speed) = (false, false);
        for target in targets {
            default_tool |= Arc::ptr_eq(&target.target.tool, &tool);
            default_speed |= Arc::ptr_eq(&target.target.speed, &speed);
        }
        if default_tool {
            self.compiled.warnings.push(format!(
                "Some targets have no tool set, the {} with its TCP at the flange is used.",
                tool.name
            ));
        }
        if default_speed {
            self.compiled.warnings.push(format!(
                "Some targets have no speed set, the {} of {} mm/s is used.",
                speed.name, speed.translation_speed
            ));
        }
    }

    fn clear_linear_configurations(&mut self) {
        for system_target in &mut self.compiled.targets {
            for target in &mut system_target.program_targets {
                if target.target.is_linear() && target.target.configuration().is_some() {
                    let changed = Arc::new(target.target.with_configuration(None));
                    target.set_target(changed);
                    self.compiled.warnings.push(format!(
                        "Target {} of robot {}: configuration is ignored for linear motions.",
                        target.index, target.group
                    ));
                }
            }
        }
    }

    fn check_payload(&mut self) {
        let mut checked = HashSet::new();
        for target in self.compiled.targets.iter().flat_map(|t| t.program_targets.iter()) {
            let tool = &target.target.tool;
            if !checked.insert((ptr(tool), target.group)) {
                continue;
            }
            let payload = self.system.payload(target.group);
            if tool.weight > payload {
                self.compiled.warnings.push(format!(
                    "Weight of tool {} ({} kg) exceeds the payload of robot {} ({} kg).",
                    tool.name, tool.weight, target.group, payload
                ));
            }
        }
    }

    /// Collects the attributes, names the unnamed ones, makes names unique and puts the renamed
    /// instances back into the targets.
    fn resolve_attributes(&mut self) {
        let mut collected = AttributeSet::default();
        for target in self.compiled.targets.iter().flat_map(|t| t.program_targets.iter()) {
            let target = &target.target;
            collected.insert(Attribute::Tool(target.tool.clone()));
            collected.insert(Attribute::Frame(target.frame.clone()));
            collected.insert(Attribute::Speed(target.speed.clone()));
            collected.insert(Attribute::Zone(target.zone.clone()));
            if let Some(command) = &target.command {
                collected.insert_command(command);
            }
        }

        let user_names: HashSet<String> = collected
            .list
            .iter()
            .map(|a| a.name().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let mut used: HashSet<String> = HashSet::new();
        let mut counters: HashMap<&'static str, usize> = HashMap::new();
        let mut renamer = Renamer::default();
        let free = |candidate: &String, used: &HashSet<String>| {
            !used.contains(candidate) && !user_names.contains(candidate)
        };

        for attribute in &collected.list {
            let name = if attribute.name().is_empty() {
                let counter = counters.entry(attribute.type_name()).or_default();
                loop {
                    let candidate = format!("{}{:03}", attribute.type_name(), *counter);
                    *counter += 1;
                    if free(&candidate, &used) {
                        break candidate;
                    }
                }
            } else if used.contains(attribute.name()) {
                let candidate = (0..)
                    .map(|i| format!("{}{:03}", attribute.name(), i))
                    .find(|c| free(c, &used))
                    .unwrap_or_default();
                self.compiled.warnings.push(format!(
                    "{} name {} is used by more than one instance, renamed to {}.",
                    attribute.type_name(),
                    attribute.name(),
                    candidate
                ));
                candidate
            } else {
                attribute.name().to_string()
            };
            if name != attribute.name() {
                renamer.renamed.insert(attribute.key(), attribute.renamed(&name));
            }
            used.insert(name);
        }

        self.compiled.attributes = collected
            .list
            .iter()
            .map(|attribute| match attribute {
                Attribute::Tool(a) => Attribute::Tool(renamer.tool(a)),
                Attribute::Frame(a) => Attribute::Frame(renamer.frame(a)),
                Attribute::Speed(a) => Attribute::Speed(renamer.speed(a)),
                Attribute::Zone(a) => Attribute::Zone(renamer.zone(a)),
                Attribute::Command(a) => Attribute::Command(renamer.command(a)),
            })
            .collect();

        for system_target in &mut self.compiled.targets {
            for target in &mut system_target.program_targets {
                if let Some(changed) = renamer.target(&target.target) {
                    target.set_target(Arc::new(changed));
                }
            }
        }
    }

    /// Segments every motion, filling timing and keyframes. Stops at the first target with errors.
    fn segment(&mut self) -> Result<(), ProgramError> {
        let mut total = 0.0;
        let mut first = self.compiled.targets[0].clone();
        first.total_time = 0.0;
        self.compiled.keyframes.push(first.clone());
        let dwell = longest_wait(&first);
        if dwell > 0.0 {
            total += dwell;
            first.total_time = total;
            first.delta_time = dwell;
            self.compiled.keyframes.push(first.clone());
        }
        self.compiled.targets[0] = first;

        for i in 1..self.compiled.targets.len() {
            if !self.segment_target(i, &mut total)? {
                self.compiled.targets.truncate(i + 1);
                break;
            }
        }
        self.compiled.duration = total;
        Ok(())
    }

    /// Compiles the motion from target `i - 1` to target `i`. False if target `i` has errors.
    fn segment_target(&mut self, i: usize, total: &mut f64) -> Result<bool, ProgramError> {
        let system = self.system;
        let prev = self.compiled.targets[i - 1].clone();
        let mut current = self.compiled.targets[i].clone();
        let start = *total;

        for (group, (p, c)) in prev.program_targets.iter().zip(&current.program_targets).enumerate() {
            if p.kinematics.configuration.is_undefined() && c.target.is_linear() {
                self.compiled.errors.push(format!(
                    "Errors in target {} of robot {}: linear motion starts from a target with an undefined configuration (near a singularity).",
                    i, group
                ));
            }
        }
        if !self.compiled.errors.is_empty() {
            self.compiled.targets[i] = current;
            return Ok(false);
        }

        // Linear motions keep the configuration they start from.
        let endpoints: Vec<Target> = current
            .program_targets
            .iter()
            .zip(&prev.program_targets)
            .map(|(c, p)| {
                if c.target.is_linear() {
                    c.target.with_configuration(Some(p.kinematics.configuration))
                } else {
                    (*c.target).clone()
                }
            })
            .collect();
        let refs: Vec<&Target> = endpoints.iter().collect();
        let solutions = system.kinematics(&refs, Some(&prev.joints()))?;
        current.set_kinematics(solutions, Some(&prev));
        if promote_errors(&mut self.compiled.errors, &current) {
            self.compiled.targets[i] = current;
            return Ok(false);
        }

        let mut divisions = 1;
        for (c, p) in current.program_targets.iter().zip(&prev.program_targets) {
            if c.changes_configuration && !c.target.is_linear() {
                self.compiled.warnings.push(format!(
                    "Target {} of robot {} changes configuration from {} to {}.",
                    i, c.group, p.kinematics.configuration, c.kinematics.configuration
                ));
            }
            let (from, to) = (c.prev_plane(p), c.plane());
            let distance = (to.translation.vector - from.translation.vector).norm();
            if c.target.is_linear() {
                // Solver round-off must not add a substep to an exact multiple of the step.
                let steps = ((distance - DISTANCE_TOL) / self.step_size).ceil();
                divisions = divisions.max(steps as usize);
            }
            let still = c
                .kinematics
                .joints
                .iter()
                .zip(&p.kinematics.joints)
                .all(|(a, b)| (a - b).abs() < ANGLE_TOL);
            if distance < DISTANCE_TOL && rotation_angle(&from, &to) < ANGLE_TOL && still {
                self.compiled.warnings.push(format!(
                    "Target {} of robot {} does not change position or orientation.",
                    i, c.group
                ));
            }
        }

        let keyframe_every_step = system.has_redundant_arm();
        let mut last = prev.clone();
        let mut last_keyframe_time = start;
        let mut previous_delta = 0.0;
        let mut min_time = 0.0;
        let mut slowest: Vec<(f64, Option<SpeedLimit>)> = vec![(-1.0, None); current.program_targets.len()];
        let mut binding: BTreeSet<(usize, SpeedLimit)> = BTreeSet::new();

        for j in 1..=divisions {
            let t = j as f64 / divisions as f64;
            let lerped = current.lerp(&prev, system, t, 0.0, 1.0);
            let refs: Vec<&Target> = lerped.iter().collect();
            let solutions = system.kinematics(&refs, Some(&last.joints()))?;

            let mut step = current.clone();
            for (target, lerped) in step.program_targets.iter_mut().zip(lerped) {
                target.target = Arc::new(lerped);
            }
            step.set_kinematics(solutions, Some(&last));
            if promote_errors(&mut self.compiled.errors, &step) {
                self.compiled.targets[i] = current;
                return Ok(false);
            }

            let times = self.step_times(&last, &step, divisions);
            let delta = times.iter().map(|s| s.time).fold(0.0, f64::max);
            min_time += times.iter().map(|s| s.axis_time).fold(0.0, f64::max);
            for (group, time) in times.iter().enumerate() {
                if time.time > slowest[group].0 {
                    slowest[group] = (time.time, Some(time.leading));
                }
                if time.time > 0.0 && time.leading != SpeedLimit::Time {
                    binding.insert((group, time.leading));
                }
            }

            if j > 1 && (keyframe_every_step || (delta - previous_delta).abs() > TIME_TOL) {
                self.push_keyframe(last.clone(), &mut last_keyframe_time);
            }
            *total += delta;
            step.total_time = *total;
            previous_delta = delta;
            last = step;
        }
        self.push_keyframe(last.clone(), &mut last_keyframe_time);

        for group in 0..current.program_targets.len() {
            let limits: Vec<String> = binding
                .iter()
                .filter(|(g, _)| *g == group)
                .map(|(_, limit)| limit.to_string())
                .collect();
            if !limits.is_empty() {
                self.compiled.warnings.push(format!(
                    "Target {} of robot {}: motion is limited by {}.",
                    i,
                    group,
                    limits.join(", ")
                ));
            }
        }

        let dwell = longest_wait(&current);
        if dwell > 0.0 {
            *total += dwell;
            last.total_time = *total;
            self.push_keyframe(last, &mut last_keyframe_time);
        }

        for (target, (_, leading)) in current.program_targets.iter_mut().zip(slowest) {
            target.leading = leading;
        }
        current.total_time = *total;
        current.delta_time = *total - start;
        current.min_time = min_time;
        current.divisions = divisions;
        debug!(
            "Target {} compiled: {} divisions, {:.3} s, configuration {}",
            i,
            divisions,
            current.delta_time,
            current
                .program_targets
                .first()
                .map(|t| t.kinematics.configuration)
                .unwrap_or_default()
        );
        self.compiled.targets[i] = current;
        Ok(true)
    }

    fn push_keyframe(&mut self, mut keyframe: SystemTarget, last_time: &mut f64) {
        keyframe.delta_time = keyframe.total_time - *last_time;
        *last_time = keyframe.total_time;
        self.compiled.keyframes.push(keyframe);
    }

    /// Time of the substep from `prev` to `step` for every group, the slowest of the TCP,
    /// programmed time, axis and external axis limits.
    fn step_times(&self, prev: &SystemTarget, step: &SystemTarget, divisions: usize) -> Vec<StepTime> {
        step.program_targets
            .iter()
            .zip(&prev.program_targets)
            .map(|(current, prev)| {
                let group = &self.system.groups[current.group];
                let dof = group.arm.dof();
                let speed = &current.target.speed;
                let mut limits: Vec<(f64, SpeedLimit)> = Vec::new();

                if speed.time > 0.0 {
                    limits.push((speed.time / divisions as f64, SpeedLimit::Time));
                } else {
                    let (from, to) = (current.prev_plane(prev), current.plane());
                    let distance = (to.translation.vector - from.translation.vector).norm();
                    limits.push((
                        motion_time(distance, speed.translation_speed),
                        SpeedLimit::Translation,
                    ));
                    limits.push((
                        motion_time(rotation_angle(&from, &to), speed.rotation_speed),
                        SpeedLimit::Rotation,
                    ));
                }

                let mut axis_time: f64 = 0.0;
                for (k, joint) in group.joints().into_iter().enumerate() {
                    let (Some(a), Some(b)) =
                        (current.kinematics.joints.get(k), prev.kinematics.joints.get(k))
                    else {
                        continue;
                    };
                    let (max_speed, limit) = if k < dof {
                        (joint.max_speed, SpeedLimit::Axis(k))
                    } else {
                        let cap = if joint.is_prismatic() {
                            speed.translation_external
                        } else {
                            speed.rotation_external
                        };
                        (joint.max_speed.min(cap), SpeedLimit::External(k - dof))
                    };
                    let time = motion_time((a - b).abs(), max_speed);
                    axis_time = axis_time.max(time);
                    limits.push((time, limit));
                }

                let (time, leading) = limits
                    .into_iter()
                    .fold((0.0, SpeedLimit::Translation), |best, next| {
                        if next.0 > best.0 { next } else { best }
                    });
                StepTime {
                    time,
                    axis_time,
                    leading,
                }
            })
            .collect()
    }
}

/// Longest dwell over the commands of all groups, seconds.
fn longest_wait(target: &SystemTarget) -> f64 {
    target
        .program_targets
        .iter()
        .flat_map(|t| t.commands.iter())
        .filter_map(|c| c.wait_seconds())
        .fold(0.0, f64::max)
}

/// Distinct attributes in order of first use.
#[derive(Default)]
struct AttributeSet {
    seen: HashSet<usize>,
    list: Vec<Attribute>,
}

impl AttributeSet {
    fn insert(&mut self, attribute: Attribute) -> bool {
        let inserted = self.seen.insert(attribute.key());
        if inserted {
            self.list.push(attribute);
        }
        inserted
    }

    /// A command group is followed by its children.
    fn insert_command(&mut self, command: &Arc<Command>) {
        if self.insert(Attribute::Command(command.clone())) {
            if let CommandKind::Group(children) = &command.kind {
                for child in children {
                    self.insert_command(child);
                }
            }
        }
    }
}

/// Maps attributes to their renamed copies. Command groups are rebuilt when any child changed,
/// each group only once.
#[derive(Default)]
struct Renamer {
    renamed: HashMap<usize, Attribute>,
    commands: HashMap<usize, Arc<Command>>,
}

impl Renamer {
    fn tool(&self, tool: &Arc<Tool>) -> Arc<Tool> {
        match self.renamed.get(&ptr(tool)) {
            Some(Attribute::Tool(renamed)) => renamed.clone(),
            _ => tool.clone(),
        }
    }

    fn frame(&self, frame: &Arc<Frame>) -> Arc<Frame> {
        match self.renamed.get(&ptr(frame)) {
            Some(Attribute::Frame(renamed)) => renamed.clone(),
            _ => frame.clone(),
        }
    }

    fn speed(&self, speed: &Arc<Speed>) -> Arc<Speed> {
        match self.renamed.get(&ptr(speed)) {
            Some(Attribute::Speed(renamed)) => renamed.clone(),
            _ => speed.clone(),
        }
    }

    fn zone(&self, zone: &Arc<Zone>) -> Arc<Zone> {
        match self.renamed.get(&ptr(zone)) {
            Some(Attribute::Zone(renamed)) => renamed.clone(),
            _ => zone.clone(),
        }
    }

    fn command(&mut self, command: &Arc<Command>) -> Arc<Command> {
        let key = ptr(command);
        if let Some(done) = self.commands.get(&key) {
            return done.clone();
        }
        let base = match self.renamed.get(&key) {
            Some(Attribute::Command(renamed)) => renamed.clone(),
            _ => command.clone(),
        };
        let result = match &base.kind {
            CommandKind::Group(children) => {
                let rebuilt: Vec<Arc<Command>> = children.iter().map(|c| self.command(c)).collect();
                if rebuilt.iter().zip(children).all(|(a, b)| Arc::ptr_eq(a, b)) {
                    base
                } else {
                    Arc::new(Command {
                        kind: CommandKind::Group(rebuilt),
                        ..(*base).clone()
                    })
                }
            }
            _ => base,
        };
        self.commands.insert(key, result.clone());
        result
    }

    /// The target with renamed attributes, none if nothing changed.
    fn target(&mut self, target: &Arc<Target>) -> Option<Target> {
        let tool = self.tool(&target.tool);
        let frame = self.frame(&target.frame);
        let speed = self.speed(&target.speed);
        let zone = self.zone(&target.zone);
        let command = target.command.as_ref().map(|c| self.command(c));
        let unchanged = Arc::ptr_eq(&tool, &target.tool)
            && Arc::ptr_eq(&frame, &target.frame)
            && Arc::ptr_eq(&speed, &target.speed)
            && Arc::ptr_eq(&zone, &target.zone)
            && match (&command, &target.command) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => true,
            };
        if unchanged {
            return None;
        }
        Some(Target {
            tool,
            frame,
            speed,
            zone,
            command,
            ..(**target).clone()
        })
    }
}

/// Program targets of a step, for tests that build system targets by hand.
#[cfg(test)]
pub(crate) fn system_target(index: usize, targets: Vec<Target>) -> SystemTarget {
    SystemTarget::new(
        index,
        targets
            .into_iter()
            .enumerate()
            .map(|(group, target)| {
                crate::program::ProgramTarget::new(index, group, Arc::new(target))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::Pose;
    use crate::kinematics_impl::RobotArm;

    fn compile(targets: Vec<Target>) -> CompiledProgram {
        let system = RobotSystem::single(RobotArm::irb4600_40());
        let targets = targets
            .into_iter()
            .enumerate()
            .map(|(i, t)| system_target(i, vec![t]))
            .collect();
        CheckProgram::run(&system, targets, 10.0).expect("compiles")
    }

    #[test]
    fn test_unnamed_and_duplicate_attributes() {
        let home = vec![0.0, 1.2, -0.4, 0.0, 0.9, 0.0];
        let tool_a = Arc::new(Tool::new("Gripper", Pose::translation(0.0, 0.0, 100.0), 1.0));
        let tool_b = Arc::new(Tool::new("Gripper", Pose::translation(0.0, 0.0, 120.0), 1.0));
        let wait = Arc::new(Command::wait(0.5));
        let group = Arc::new(Command::group("", vec![wait.clone()]));
        let speed = Arc::new(Speed::new("", 200.0));
        let targets = vec![
            Target::joint(home.clone()).with_tool(tool_a).with_speed(speed.clone()),
            Target::joint(vec![0.1, 1.2, -0.4, 0.0, 0.9, 0.0])
                .with_tool(tool_b)
                .with_speed(speed)
                .with_command(Some(group)),
        ];
        let compiled = compile(targets);
        assert!(compiled.errors.is_empty(), "{:?}", compiled.errors);

        let names: Vec<&str> = compiled.attributes.iter().map(|a| a.name()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len(), "{:?}", names);
        assert!(names.contains(&"Gripper"));
        assert!(names.contains(&"Gripper000"));
        assert!(names.contains(&"Speed000"));
        assert!(names.contains(&"Group000"));
        assert!(names.contains(&"Wait000"));
        assert!(compiled.warnings.iter().any(|w| w.contains("renamed to Gripper000")));

        // Renamed instances are the ones used by the targets.
        let second = &compiled.targets[1].program_targets[0];
        assert_eq!(second.target.tool.name, "Gripper000");
        assert_eq!(second.commands[0].name, "Wait000");
        assert!((compiled.duration - compiled.targets[1].total_time).abs() < 1e-12);
    }

    #[test]
    fn test_external_values_are_resized() {
        let compiled = compile(vec![
            Target::joint(vec![0.0, 1.2, -0.4, 0.0, 0.9, 0.0]).with_external(vec![1.0, 2.0]),
        ]);
        assert!(compiled.targets[0].program_targets[0].target.external.is_empty());
        assert!(compiled.warnings.iter().any(|w| w.contains("resized")));
    }

    #[test]
    fn test_wait_adds_dwell_keyframe() {
        let home = vec![0.0, 1.2, -0.4, 0.0, 0.9, 0.0];
        let wait = Arc::new(Command::new("Dwell", CommandKind::Wait { seconds: 2.0 }));
        let compiled = compile(vec![
            Target::joint(home.clone()),
            Target::joint(home).with_command(Some(wait)),
        ]);
        assert!((compiled.duration - 2.0).abs() < 1e-9);
        let last = compiled.keyframes.last().expect("keyframes");
        assert!((last.delta_time - 2.0).abs() < 1e-9);
        assert!(
            compiled
                .warnings
                .iter()
                .any(|w| w.contains("does not change position or orientation"))
        );
    }
}
