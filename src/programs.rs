//! This module provides the built-in catalog of example machines. The definitions are embedded
//! at compile time, parsed once on first use, and handed out as shared read-only
//! `Arc<MachineDefinition>`s. Callers create their own `TuringMachine` from them; the catalog
//! itself holds no run state.

use crate::types::{MachineDefinition, TuringMachineError};

use std::sync::Arc;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 7] = [
    include_str!("../programs/flip.tm"),
    include_str!("../programs/unary-increment.tm"),
    include_str!("../programs/match-0n1n.tm"),
    include_str!("../programs/even-ones.tm"),
    include_str!("../programs/palindrome.tm"),
    include_str!("../programs/binary-increment.tm"),
    include_str!("../programs/endless-sweep.tm"),
];

/// A parsed catalog entry together with its source text.
struct CatalogEntry {
    definition: Arc<MachineDefinition>,
    text: &'static str,
}

lazy_static::lazy_static! {
    static ref PROGRAMS: Vec<CatalogEntry> = load();
}

/// Parses every embedded program. Entries that fail to parse are logged and skipped.
fn load() -> Vec<CatalogEntry> {
    PROGRAM_TEXTS
        .iter()
        .filter_map(|&text| match crate::parser::parse(text) {
            Ok(definition) => Some(CatalogEntry {
                definition: Arc::new(definition),
                text,
            }),
            Err(e) => {
                log::error!("Failed to parse built-in program: {e}");
                None
            }
        })
        .collect()
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Arc<MachineDefinition>, TuringMachineError> {
        PROGRAMS
            .get(index)
            .map(|entry| entry.definition.clone())
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program index {} out of range", index))
            })
    }

    /// Get a program by its name
    pub fn get_program_by_name(name: &str) -> Result<Arc<MachineDefinition>, TuringMachineError> {
        PROGRAMS
            .iter()
            .find(|entry| entry.definition.name() == name)
            .map(|entry| entry.definition.clone())
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program '{}' not found", name))
            })
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        PROGRAMS
            .iter()
            .map(|entry| entry.definition.name().to_string())
            .collect()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        let definition = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: definition.name().to_string(),
            start_state: definition.start_state().to_string(),
            sample_input: definition.sample_input().to_string(),
            state_count: definition.states().len(),
            transition_count: definition.transitions().len(),
        })
    }

    /// Search for programs by name, case-insensitively
    pub fn search_programs(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.definition.name().to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }

    /// Get the original text of a program by its index
    pub fn get_program_text_by_index(index: usize) -> Result<&'static str, TuringMachineError> {
        PROGRAMS.get(index).map(|entry| entry.text).ok_or_else(|| {
            TuringMachineError::ValidationError(format!(
                "Program text index {} out of range",
                index
            ))
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub start_state: String,
    pub sample_input: String,
    pub state_count: usize,
    pub transition_count: usize,
}
