//! A bounded halting oracle.
//!
//! The oracle answers "does this machine halt on this input?" by building the machine and
//! running it under its step limit. Machines may consult the oracle while they are being
//! built, including about themselves. Every nested question goes one level deeper, and past
//! `depth_limit` the oracle gives up with [`TuringMachineError::DepthExceeded`]. The
//! self-referential [`paradox`] machine therefore ends in an error instead of a hang.

use std::collections::BTreeSet;

use crate::machine::TuringMachine;
use crate::types::{Direction, MachineDefinition, TuringMachineError, Verdict};

pub const DEFAULT_DEPTH_LIMIT: usize = 64;

/// Builds a machine for `input`, possibly asking `probe` about other machines first.
pub type MachineFactory = fn(&Probe, &str) -> Result<TuringMachine, TuringMachineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaltingOracle {
    depth_limit: usize,
}

impl Default for HaltingOracle {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH_LIMIT)
    }
}

impl HaltingOracle {
    pub fn new(depth_limit: usize) -> Self {
        Self { depth_limit }
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// Returns whether the machine built by `factory` halts on `input`.
    ///
    /// "Halts" means any verdict other than `StepLimitExceeded`; a stuck machine halts too.
    pub fn halts(&self, factory: MachineFactory, input: &str) -> Result<bool, TuringMachineError> {
        Probe {
            depth: 0,
            limit: self.depth_limit,
        }
        .halts(factory, input)
    }
}

/// The oracle as seen from inside a factory, one level below its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    depth: usize,
    limit: usize,
}

impl Probe {
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn halts(&self, factory: MachineFactory, input: &str) -> Result<bool, TuringMachineError> {
        if self.depth >= self.limit {
            log::warn!("halting oracle gave up at depth {}", self.depth);
            return Err(TuringMachineError::DepthExceeded(self.limit));
        }

        let nested = Probe {
            depth: self.depth + 1,
            limit: self.limit,
        };
        let mut machine = factory(&nested, input)?;
        let verdict = machine.run(None).verdict;

        log::debug!(
            "oracle depth {}: '{}' on {:?} -> {}",
            self.depth,
            machine.definition().name(),
            input,
            verdict
        );

        Ok(verdict != Verdict::StepLimitExceeded)
    }
}

/// The diagonal machine: asks the oracle whether it halts on `input`, then does the opposite.
pub fn paradox(probe: &Probe, input: &str) -> Result<TuringMachine, TuringMachineError> {
    let definition = if probe.halts(paradox, input)? {
        forever(input)?
    } else {
        at_once(input)?
    };

    Ok(TuringMachine::new(definition, input))
}

fn symbols_of(input: &str) -> BTreeSet<char> {
    let mut symbols: BTreeSet<char> = input.chars().collect();
    symbols.insert(crate::types::BLANK_SYMBOL);
    symbols
}

/// Walks right forever, whatever it reads.
fn forever(input: &str) -> Result<MachineDefinition, TuringMachineError> {
    let symbols = symbols_of(input);

    symbols
        .iter()
        .fold(
            MachineDefinition::builder("Paradox (loops)")
                .states(["walk", "halt"])
                .alphabet(symbols.iter().copied())
                .start("walk")
                .accept("halt"),
            |builder, &c| builder.transition("walk", c, "walk", c, Direction::Right),
        )
        .build()
}

/// Accepts on the first step, whatever it reads.
fn at_once(input: &str) -> Result<MachineDefinition, TuringMachineError> {
    let symbols = symbols_of(input);

    symbols
        .iter()
        .fold(
            MachineDefinition::builder("Paradox (halts)")
                .states(["start", "halt"])
                .alphabet(symbols.iter().copied())
                .start("start")
                .accept("halt"),
            |builder, &c| builder.transition("start", c, "halt", c, Direction::Stay),
        )
        .build()
}
