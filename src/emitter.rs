//! Code contract for manufacturer dialects: formatting of the commands attached to targets.
//! Full program emitters build on top of [`Program::commands_code`].

use std::collections::HashSet;
use std::fmt;

use crate::attributes::{Command, CommandKind};
use crate::program::Program;

/// Controller dialect of a robot arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manufacturer {
    Abb,
    Kuka,
    UR,
    Staubli,
    FrankaEmika,
    Fanuc,
    Other,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Manufacturer::Abb => "ABB",
            Manufacturer::Kuka => "KUKA",
            Manufacturer::UR => "UR",
            Manufacturer::Staubli => "Staubli",
            Manufacturer::FrankaEmika => "Franka Emika",
            Manufacturer::Fanuc => "Fanuc",
            Manufacturer::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Manufacturer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abb" => Ok(Manufacturer::Abb),
            "kuka" => Ok(Manufacturer::Kuka),
            "ur" | "universal robots" => Ok(Manufacturer::UR),
            "staubli" => Ok(Manufacturer::Staubli),
            "franka" | "franka emika" | "frankaemika" => Ok(Manufacturer::FrankaEmika),
            "fanuc" => Ok(Manufacturer::Fanuc),
            "other" => Ok(Manufacturer::Other),
            _ => Err(format!("unknown manufacturer '{s}'")),
        }
    }
}

/// Number formatting used in generated code. Always uses '.' as the decimal separator,
/// independent of any system locale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberFormat {
    pub decimals: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat { decimals: 3 }
    }
}

impl NumberFormat {
    pub fn number(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }
}

impl Command {
    /// Code of a leaf command in the given dialect, None if the command is not supported there.
    /// Groups have no code of their own, flatten them first.
    pub fn code(&self, manufacturer: Manufacturer, format: &NumberFormat) -> Option<String> {
        use Manufacturer::*;
        match (&self.kind, manufacturer) {
            (CommandKind::Wait { seconds }, Abb) => Some(format!("WaitTime {};", format.number(*seconds))),
            (CommandKind::Wait { seconds }, Kuka) => Some(format!("WAIT SEC {}", format.number(*seconds))),
            (CommandKind::Wait { seconds }, UR) => Some(format!("sleep({})", format.number(*seconds))),
            (CommandKind::Wait { seconds }, Staubli) => Some(format!("delay({})", format.number(*seconds))),
            (CommandKind::Wait { seconds }, Fanuc) => Some(format!("WAIT {}(sec) ;", format.number(*seconds))),

            (CommandKind::SetDigitalOutput { output, value }, Abb) => {
                Some(format!("SetDO {}, {};", output, if *value { 1 } else { 0 }))
            }
            (CommandKind::SetDigitalOutput { output, value }, Kuka) => {
                Some(format!("$OUT[{}] = {}", output, if *value { "TRUE" } else { "FALSE" }))
            }
            (CommandKind::SetDigitalOutput { output, value }, UR) => Some(format!(
                "set_standard_digital_out({}, {})",
                output,
                if *value { "True" } else { "False" }
            )),
            (CommandKind::SetDigitalOutput { output, value }, Fanuc) => {
                Some(format!("DO[{}]={} ;", output, if *value { "ON" } else { "OFF" }))
            }

            (CommandKind::SetAnalogOutput { output, value }, Abb) => {
                Some(format!("SetAO {}, {};", output, format.number(*value)))
            }
            (CommandKind::SetAnalogOutput { output, value }, Kuka) => {
                Some(format!("$ANOUT[{}] = {}", output, format.number(*value)))
            }
            (CommandKind::SetAnalogOutput { output, value }, UR) => Some(format!(
                "set_standard_analog_out({}, {})",
                output,
                format.number(*value)
            )),

            (CommandKind::Message(text), Abb) => Some(format!("TPWrite \"{}\";", text)),
            (CommandKind::Message(text), UR) => Some(format!("textmsg(\"{}\")", text)),
            (CommandKind::Message(text), Fanuc) => Some(format!("MESSAGE[{}] ;", text)),

            (CommandKind::Stop, Abb) => Some("Stop;".to_string()),
            (CommandKind::Stop, Kuka) => Some("HALT".to_string()),
            (CommandKind::Stop, UR) => Some("halt".to_string()),
            (CommandKind::Stop, Fanuc) => Some("PAUSE ;".to_string()),

            (CommandKind::Custom { code }, _) => code
                .iter()
                .find(|(m, _)| *m == manufacturer)
                .map(|(_, code)| code.clone()),

            _ => None,
        }
    }
}

/// Command code of one program target.
#[derive(Debug, Clone, Default)]
pub struct TargetCode {
    pub index: usize,
    pub group: usize,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommandsCode {
    pub targets: Vec<TargetCode>,
    pub warnings: Vec<String>,
}

impl Program {
    /// Code of the commands on every compiled target, in the dialect of the arm of its group.
    /// Commands not supported by a dialect are skipped with a warning.
    pub fn commands_code(&self, format: &NumberFormat) -> CommandsCode {
        let mut result = CommandsCode::default();
        let mut reported = HashSet::new();

        for system_target in &self.targets {
            for target in &system_target.program_targets {
                let manufacturer = self.robot_system.groups[target.group].arm.manufacturer;
                let mut code = TargetCode {
                    index: target.index,
                    group: target.group,
                    ..Default::default()
                };
                for command in &target.commands {
                    match command.code(manufacturer, format) {
                        Some(line) if command.run_before => code.before.push(line),
                        Some(line) => code.after.push(line),
                        None => {
                            if reported.insert((command.name.clone(), manufacturer)) {
                                result.warnings.push(format!(
                                    "{} {}: command not implemented for this manufacturer ({}), it has been skipped.",
                                    command.type_name(),
                                    command.name,
                                    manufacturer
                                ));
                            }
                        }
                    }
                }
                result.targets.push(code);
            }
        }
        result
    }
}
