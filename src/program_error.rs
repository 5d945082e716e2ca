//! Structural errors: a malformed robot system or program that cannot be attributed to any
//! particular target. Geometric problems are never reported this way; they travel as strings on
//! the kinematic solutions and end up in the program errors.

/// Error raised when constructing a program or a robot system.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramError {
    EmptyProgram,
    GroupCountMismatch { expected: usize, found: usize },
    ToolpathLengthMismatch { group: usize, expected: usize, found: usize },
    InvalidStepSize(f64),
    FrameCoupling(String),
    InvalidMechanism(String),
    TargetCountMismatch { expected: usize, found: usize },
    ThreadPool(String),
}

impl std::fmt::Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ProgramError::EmptyProgram =>
                write!(f, "The program has no targets"),
            ProgramError::GroupCountMismatch { expected, found } =>
                write!(f, "The robot system has {} mechanical groups but {} toolpaths were given",
                       expected, found),
            ProgramError::ToolpathLengthMismatch { group, expected, found } =>
                write!(f, "Toolpath of group {} has {} targets, expected {} as in the first toolpath",
                       group, found, expected),
            ProgramError::InvalidStepSize(step) =>
                write!(f, "Step size must be positive, {} given", step),
            ProgramError::FrameCoupling(ref msg) =>
                write!(f, "Frame coupling error: {}", msg),
            ProgramError::InvalidMechanism(ref msg) =>
                write!(f, "Invalid mechanism: {}", msg),
            ProgramError::TargetCountMismatch { expected, found } =>
                write!(f, "Expected one target per mechanical group ({}), found {}", expected, found),
            ProgramError::ThreadPool(ref msg) =>
                write!(f, "Unable to start collision check workers: {}", msg),
        }
    }
}

impl std::error::Error for ProgramError {}
