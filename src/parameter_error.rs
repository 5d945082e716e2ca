//! Error handling for robot cell loading

use std::io;

use crate::program_error::ProgramError;

/// Failures while reading a robot cell description.
#[derive(Debug)]
pub enum ParameterError {
    IoError(io::Error),
    ParseError(String),
    MissingField(String),
    InvalidLength { expected: usize, found: usize },
    KinematicsConfigurationError(String),
}

impl std::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ParameterError::IoError(ref err) => write!(f, "IO Error: {}", err),
            ParameterError::ParseError(ref msg) => write!(f, "Parse Error: {}", msg),
            ParameterError::MissingField(ref field) => write!(f, "Missing Field: {}", field),
            ParameterError::InvalidLength { expected, found } => {
                write!(f, "Invalid Length: expected {}, found {}", expected, found)
            }
            ParameterError::KinematicsConfigurationError(ref err) => {
                write!(f, "Kinematics Configuration Error: {}", err)
            }
        }
    }
}

impl std::error::Error for ParameterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParameterError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ParameterError {
    fn from(err: io::Error) -> Self {
        ParameterError::IoError(err)
    }
}

impl From<ProgramError> for ParameterError {
    fn from(err: ProgramError) -> Self {
        ParameterError::KinematicsConfigurationError(err.to_string())
    }
}
