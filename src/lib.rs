//! This crate provides the core of a single-tape deterministic Turing machine interpreter.
//! It includes modules for describing machines, parsing them from text, validating them,
//! running them step by step on a growable tape, and a catalog of predefined machines.

pub mod analyzer;
pub mod loader;
pub mod machine;
pub mod oracle;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct from the machine module.
pub use machine::TuringMachine;
/// Re-exports the bounded halting oracle and its self-referential demo machine.
pub use oracle::{paradox, HaltingOracle, MachineFactory, Probe};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo` and `ProgramManager` from the programs module.
pub use programs::{ProgramInfo, ProgramManager};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the types describing machine definitions and their execution.
pub use types::{
    DefinitionBuilder, Direction, Halt, HaltReason, MachineDefinition, RunSummary, Step,
    StepResult, TraceEntry, Transition, TransitionKey, TuringMachineError, Verdict,
    BLANK_SYMBOL, DEFAULT_MAX_STEPS, DEFAULT_TAPE_PADDING, MAX_PROGRAM_SIZE,
};
