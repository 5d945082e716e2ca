//! Target attributes: tools, frames, speeds, zones and commands. Attributes are shared between
//! many targets as `Arc` handles and compared by identity.

use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::emitter::Manufacturer;
use crate::kinematic_traits::Pose;

/// Tool mounted on the flange.
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    /// Tool center point relative to the flange.
    pub tcp: Pose,
    /// kg
    pub weight: f64,
}

/// Reference pose the target coordinates are expressed in. A frame coupled to a mechanical group
/// follows the tool center point of that group; coupled to a mechanism, it follows the last axis
/// of that mechanism.
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub pose: Pose,
    pub coupled_group: Option<usize>,
    pub coupled_mechanism: Option<usize>,
}

/// Speed caps for a motion.
#[derive(Debug, Clone)]
pub struct Speed {
    pub name: String,
    /// TCP speed, mm/s
    pub translation_speed: f64,
    /// TCP rotation speed, rad/s
    pub rotation_speed: f64,
    /// Linear external axis speed cap, mm/s
    pub translation_external: f64,
    /// Rotary external axis speed cap, rad/s
    pub rotation_external: f64,
    /// Explicit motion duration in seconds, replaces the TCP speed caps when positive.
    pub time: f64,
}

/// Blend zone around a target.
#[derive(Debug, Clone)]
pub struct Zone {
    pub name: String,
    /// mm
    pub distance: f64,
    /// rad
    pub rotation: f64,
}

#[derive(Debug, Clone)]
pub enum CommandKind {
    /// Dwell, seconds
    Wait { seconds: f64 },
    SetDigitalOutput { output: String, value: bool },
    SetAnalogOutput { output: String, value: f64 },
    Message(String),
    Stop,
    /// Verbatim code per manufacturer
    Custom { code: Vec<(Manufacturer, String)> },
    Group(Vec<Arc<Command>>),
}

/// Instruction executed before or after the motion to a target.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub kind: CommandKind,
    pub run_before: bool,
}

static DEFAULT_TOOL: LazyLock<Arc<Tool>> = LazyLock::new(|| {
    Arc::new(Tool {
        name: "DefaultTool".to_string(),
        tcp: Pose::identity(),
        weight: 0.0,
    })
});

static DEFAULT_FRAME: LazyLock<Arc<Frame>> = LazyLock::new(|| {
    Arc::new(Frame {
        name: "DefaultFrame".to_string(),
        pose: Pose::identity(),
        coupled_group: None,
        coupled_mechanism: None,
    })
});

static DEFAULT_SPEED: LazyLock<Arc<Speed>> = LazyLock::new(|| {
    Arc::new(Speed {
        name: "DefaultSpeed".to_string(),
        ..Speed::new("", 100.0)
    })
});

static DEFAULT_ZONE: LazyLock<Arc<Zone>> = LazyLock::new(|| {
    Arc::new(Zone {
        name: "DefaultZone".to_string(),
        distance: 0.0,
        rotation: 0.0,
    })
});

impl Tool {
    /// Unnamed tools get their name when a program is compiled.
    pub fn new(name: &str, tcp: Pose, weight: f64) -> Self {
        Tool {
            name: name.to_string(),
            tcp,
            weight,
        }
    }

    /// Shared placeholder for targets without a tool. Programs using it are warned about.
    pub fn default_tool() -> Arc<Tool> {
        DEFAULT_TOOL.clone()
    }
}

impl Frame {
    pub fn new(name: &str, pose: Pose) -> Self {
        Frame {
            name: name.to_string(),
            pose,
            coupled_group: None,
            coupled_mechanism: None,
        }
    }

    pub fn coupled(name: &str, pose: Pose, group: usize, mechanism: Option<usize>) -> Self {
        Frame {
            name: name.to_string(),
            pose,
            coupled_group: Some(group),
            coupled_mechanism: mechanism,
        }
    }

    pub fn default_frame() -> Arc<Frame> {
        DEFAULT_FRAME.clone()
    }

    pub fn is_coupled(&self) -> bool {
        self.coupled_group.is_some()
    }
}

impl Speed {
    /// Speed with the given TCP translation speed; rotation at 90 degrees per second, external
    /// axes at 1000 mm/s and 90 degrees per second.
    pub fn new(name: &str, translation_speed: f64) -> Self {
        Speed {
            name: name.to_string(),
            translation_speed,
            rotation_speed: std::f64::consts::FRAC_PI_2,
            translation_external: 1000.0,
            rotation_external: std::f64::consts::FRAC_PI_2,
            time: 0.0,
        }
    }

    /// Motion that takes the given time unless axis limits are slower.
    pub fn timed(name: &str, time: f64) -> Self {
        Speed {
            time,
            ..Speed::new(name, f64::INFINITY)
        }
    }

    /// Shared placeholder for targets without a speed. Programs using it are warned about.
    pub fn default_speed() -> Arc<Speed> {
        DEFAULT_SPEED.clone()
    }
}

impl Zone {
    pub fn new(name: &str, distance: f64) -> Self {
        Zone {
            name: name.to_string(),
            distance,
            rotation: distance / 10.0,
        }
    }

    pub fn default_zone() -> Arc<Zone> {
        DEFAULT_ZONE.clone()
    }

    /// A fine zone stops exactly at the target.
    pub fn is_fly_by(&self) -> bool {
        self.distance > 0.0 || self.rotation > 0.0
    }
}

impl Command {
    pub fn new(name: &str, kind: CommandKind) -> Self {
        Command {
            name: name.to_string(),
            kind,
            run_before: false,
        }
    }

    pub fn wait(seconds: f64) -> Self {
        Command::new("", CommandKind::Wait { seconds })
    }

    pub fn group(name: &str, commands: Vec<Arc<Command>>) -> Self {
        Command::new(name, CommandKind::Group(commands))
    }

    pub fn before(self) -> Self {
        Command {
            run_before: true,
            ..self
        }
    }

    /// Name of the command kind, also the prefix of generated names.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            CommandKind::Wait { .. } => "Wait",
            CommandKind::SetDigitalOutput { .. } => "SetDO",
            CommandKind::SetAnalogOutput { .. } => "SetAO",
            CommandKind::Message(_) => "Message",
            CommandKind::Stop => "Stop",
            CommandKind::Custom { .. } => "Custom",
            CommandKind::Group(_) => "Group",
        }
    }

    pub fn wait_seconds(&self) -> Option<f64> {
        match self.kind {
            CommandKind::Wait { seconds } => Some(seconds),
            _ => None,
        }
    }

    /// Leaf commands in execution order, groups expanded recursively.
    pub fn flatten(command: &Arc<Command>) -> Vec<Arc<Command>> {
        match &command.kind {
            CommandKind::Group(children) => children.iter().flat_map(Command::flatten).collect(),
            _ => vec![command.clone()],
        }
    }
}

/// Any shared target attribute, as listed in a compiled program.
#[derive(Debug, Clone)]
pub enum Attribute {
    Tool(Arc<Tool>),
    Frame(Arc<Frame>),
    Speed(Arc<Speed>),
    Zone(Arc<Zone>),
    Command(Arc<Command>),
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Tool(a) => &a.name,
            Attribute::Frame(a) => &a.name,
            Attribute::Speed(a) => &a.name,
            Attribute::Zone(a) => &a.name,
            Attribute::Command(a) => &a.name,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Attribute::Tool(_) => "Tool",
            Attribute::Frame(_) => "Frame",
            Attribute::Speed(_) => "Speed",
            Attribute::Zone(_) => "Zone",
            Attribute::Command(c) => c.type_name(),
        }
    }

    /// Address of the shared instance, identity for deduplication.
    pub(crate) fn key(&self) -> usize {
        match self {
            Attribute::Tool(a) => Arc::as_ptr(a) as *const () as usize,
            Attribute::Frame(a) => Arc::as_ptr(a) as *const () as usize,
            Attribute::Speed(a) => Arc::as_ptr(a) as *const () as usize,
            Attribute::Zone(a) => Arc::as_ptr(a) as *const () as usize,
            Attribute::Command(a) => Arc::as_ptr(a) as *const () as usize,
        }
    }

    /// Copy of the attribute with another name. Command groups keep their children.
    pub(crate) fn renamed(&self, name: &str) -> Attribute {
        let name = name.to_string();
        match self {
            Attribute::Tool(a) => Attribute::Tool(Arc::new(Tool { name, ..(**a).clone() })),
            Attribute::Frame(a) => Attribute::Frame(Arc::new(Frame { name, ..(**a).clone() })),
            Attribute::Speed(a) => Attribute::Speed(Arc::new(Speed { name, ..(**a).clone() })),
            Attribute::Zone(a) => Attribute::Zone(Arc::new(Zone { name, ..(**a).clone() })),
            Attribute::Command(a) => {
                Attribute::Command(Arc::new(Command { name, ..(**a).clone() }))
            }
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_name(), self.name())
    }
}
