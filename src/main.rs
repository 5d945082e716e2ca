//! Compiles a small demo program (a square traced with linear motions) on a preset arm or on a
//! robot cell read from YAML, then prints the diagnostics, the command code and TCP samples of
//! the playback.

use std::sync::Arc;

use anyhow::{Result, bail};
use rs_robot_program::attributes::{Command, CommandKind, Frame, Speed, Tool, Zone};
use rs_robot_program::emitter::NumberFormat;
use rs_robot_program::kinematic_traits::Pose;
use rs_robot_program::kinematics_impl::RobotArm;
use rs_robot_program::mechanism::{Mechanism, Positioner, Track};
use rs_robot_program::program::Program;
use rs_robot_program::robot_system::{MechanicalGroup, RobotSystem};
use rs_robot_program::target::Target;
use rs_robot_program::utils::{dump_joints, dump_pose};

#[cfg(feature = "allow_filesystem")]
#[derive(clap::Parser)]
#[command(name = "rs-robot-program", version)]
#[command(about = "Compiles a demo program and prints its diagnostics and playback")]
struct Cli {
    /// Robot cell in YAML. A preset arm is used when not given.
    #[arg(long)]
    cell: Option<std::path::PathBuf>,

    /// Preset arm: irb4600, irb120, ur5e, ur10e or iiwa7
    #[arg(long, default_value = "irb4600")]
    robot: String,

    /// Mount the preset arm on a 4 m floor track
    #[arg(long)]
    track: bool,

    /// Add a turntable next to the preset arm
    #[arg(long)]
    turntable: bool,

    /// Start joints in radians, comma separated. Defaults to a pose of the preset arm.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    home: Option<Vec<f64>>,

    /// Side of the square, mm
    #[arg(long, default_value_t = 200.0)]
    size: f64,

    /// Subdivision length of linear motions, mm
    #[arg(long, default_value_t = 10.0)]
    step: f64,

    /// Number of playback samples to print
    #[arg(long, default_value_t = 5)]
    samples: usize,
}

#[cfg(not(feature = "allow_filesystem"))]
struct Cli {
    robot: String,
    track: bool,
    turntable: bool,
    home: Option<Vec<f64>>,
    size: f64,
    step: f64,
    samples: usize,
}

fn preset(name: &str) -> Result<(RobotArm, Vec<f64>)> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "irb4600" => (RobotArm::irb4600_40(), vec![0.0, 1.2, -0.4, 0.0, 0.9, 0.0]),
        "irb120" => (RobotArm::irb120(), vec![0.0, 1.2, -0.4, 0.0, 0.9, 0.0]),
        "ur5e" => (RobotArm::ur5e(), vec![0.0, -1.2, 1.5, -1.9, -1.5, 0.0]),
        "ur10e" => (RobotArm::ur10e(), vec![0.0, -1.2, 1.5, -1.9, -1.5, 0.0]),
        "iiwa7" => (RobotArm::iiwa7(), vec![0.0, 0.6, 0.0, -1.4, 0.0, 0.9, 0.0]),
        other => bail!("unknown robot '{other}'"),
    })
}

fn preset_system(cli: &Cli) -> Result<(RobotSystem, Vec<f64>)> {
    let (arm, home) = preset(&cli.robot)?;
    let mut externals = Vec::new();
    if cli.track {
        externals.push(Mechanism::Track(Track::linear("Track", 4000.0, 1000.0)));
    }
    if cli.turntable {
        let base = Pose::translation(1500.0, 1000.0, 0.0);
        externals.push(Mechanism::Positioner(Positioner::single_axis("Turntable", base, 600.0)));
    }
    let group = MechanicalGroup::new(arm, externals);
    Ok((RobotSystem::new("Cell", Pose::identity(), vec![group]), home))
}

#[cfg(feature = "allow_filesystem")]
fn load_system(cli: &Cli) -> Result<(RobotSystem, Vec<f64>)> {
    match &cli.cell {
        Some(path) => {
            let system = RobotSystem::from_yaml_file(path)?;
            let home = match &cli.home {
                Some(home) => home.clone(),
                None => bail!("--home is required with --cell"),
            };
            Ok((system, home))
        }
        None => preset_system(cli),
    }
}

#[cfg(not(feature = "allow_filesystem"))]
fn load_system(cli: &Cli) -> Result<(RobotSystem, Vec<f64>)> {
    preset_system(cli)
}

/// Per group: a home joint target, then a square in a frame at the home TCP, with a dwell and an
/// output at every corner.
fn demo_toolpaths(system: &RobotSystem, home: &[f64], size: f64) -> Result<Vec<Vec<Target>>> {
    let tool = Arc::new(Tool::new("Pen", Pose::identity(), 1.0));
    let speed = Arc::new(Speed::new("Draw", 150.0));
    let zone = Arc::new(Zone::new("Blend", 1.0));
    let pen_down = Arc::new(Command::new(
        "PenDown",
        CommandKind::SetDigitalOutput {
            output: "DO_Pen".to_string(),
            value: true,
        },
    ));
    let corner = Arc::new(Command::group("Corner", vec![Arc::new(Command::wait(0.2)), pen_down]));

    let starts: Vec<Target> = system
        .groups
        .iter()
        .map(|group| {
            Target::joint(home.to_vec())
                .with_tool(tool.clone())
                .with_speed(speed.clone())
                .with_external(vec![0.0; group.external_count()])
        })
        .collect();
    let refs: Vec<&Target> = starts.iter().collect();
    let solutions = system.kinematics(&refs, None)?;

    let mut toolpaths = Vec::with_capacity(starts.len());
    for (group, (start, solution)) in starts.into_iter().zip(solutions).enumerate() {
        if let Some(error) = solution.errors.first() {
            bail!("start joints of robot {group}: {error}");
        }
        let frame = Arc::new(Frame::new(&format!("Paper{group}"), solution.tcp()));
        let start = start.with_frame(frame);
        let mut toolpath = vec![start.clone()];
        for (x, y) in [(size, 0.0), (size, size), (0.0, size), (0.0, 0.0)] {
            toolpath.push(Target {
                kind: Target::linear(Pose::translation(x, y, 0.0)).kind,
                zone: zone.clone(),
                command: Some(corner.clone()),
                ..start.clone()
            });
        }
        toolpaths.push(toolpath);
    }
    Ok(toolpaths)
}

fn print_program(program: &mut Program, samples: usize) -> Result<()> {
    println!(
        "Program {}: {} targets, {} keyframes, {:.3} s",
        program.name,
        program.targets.len(),
        program.keyframes.len(),
        program.duration
    );
    for attribute in &program.attributes {
        println!("  {}", attribute);
    }
    for (group, target) in program.targets[0].program_targets.iter().enumerate() {
        print!("Start of robot {group}: ");
        dump_pose(&target.world_plane());
    }
    for warning in &program.warnings {
        println!("Warning: {}", warning);
    }
    for error in &program.errors {
        println!("Error: {}", error);
    }

    let code = program.commands_code(&NumberFormat::default());
    for target in code.targets.iter().filter(|t| !t.before.is_empty() || !t.after.is_empty()) {
        println!(
            "Target {} of robot {}: {}",
            target.index,
            target.group,
            target.before.iter().chain(&target.after).cloned().collect::<Vec<_>>().join(" ")
        );
    }
    for warning in &code.warnings {
        println!("Warning: {}", warning);
    }

    let count = samples.max(2);
    for i in 0..count {
        let pose = program.animate(i as f64 / (count - 1) as f64, true)?;
        for (group, solution) in pose.kinematics.iter().enumerate() {
            let tcp = solution.tcp().translation.vector;
            println!(
                "t = {:.3} s, target {}, robot {}: TCP [{:.1}, {:.1}, {:.1}], configuration {}",
                pose.time, pose.target_index, group, tcp.x, tcp.y, tcp.z, solution.configuration
            );
            dump_joints(&solution.joints);
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let (system, home) = load_system(&cli)?;
    let home = cli.home.clone().unwrap_or(home);
    let system = Arc::new(system);
    let toolpaths = demo_toolpaths(&system, &home, cli.size)?;
    let mut program = Program::new("Square", system, toolpaths, cli.step)?;
    print_program(&mut program, cli.samples)
}

#[cfg(feature = "allow_filesystem")]
fn main() -> Result<()> {
    use clap::Parser;

    tracing_subscriber::fmt::init();
    run(Cli::parse())
}

#[cfg(not(feature = "allow_filesystem"))]
fn main() -> Result<()> {
    run(Cli {
        robot: "irb4600".to_string(),
        track: false,
        turntable: false,
        home: None,
        size: 200.0,
        step: 10.0,
        samples: 5,
    })
}
