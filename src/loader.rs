//! This module provides the `ProgramLoader` struct, responsible for reading machine definitions
//! from files and strings. Definitions are only ever read; nothing is written back.

use crate::parser::parse;
use crate::types::{MachineDefinition, TuringMachineError};
use std::fs;
use std::path::Path;

/// `ProgramLoader` is a utility struct for loading machine definitions.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single machine definition from the specified file path.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the `.tm` file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineDefinition)` if the file is successfully read and parsed.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::ParseError)` if the file content is not a valid definition.
    pub fn load_program(path: &Path) -> Result<MachineDefinition, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        log::debug!("loaded {} bytes from {}", content.len(), path.display());

        parse(&content)
    }

    /// Loads a single machine definition from the provided string content, e.g. piped input.
    pub fn load_program_from_string(content: &str) -> Result<MachineDefinition, TuringMachineError> {
        parse(content)
    }
}
