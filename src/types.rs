//! This module defines the core data structures and types used throughout the Turing Machine
//! interpreter, including machine definitions, transitions, step outcomes, verdicts and error types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

use crate::analyzer::{analyze, check_duplicate_transitions};
use crate::Rule;

/// The blank symbol used on the tape unless a definition overrides it.
pub const BLANK_SYMBOL: char = '_';
/// The default number of steps a machine may execute before it is forcibly halted.
pub const DEFAULT_MAX_STEPS: usize = 1000;
/// The default (and minimum) number of blank cells appended after the input on reset.
pub const DEFAULT_TAPE_PADDING: usize = 50;
/// The maximum allowed size for a machine definition text in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// Returns the signed head offset for this direction.
    pub fn offset(self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }

    /// Returns the short letter used in traces and definition files.
    pub fn as_char(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Stay => 'N',
        }
    }
}

impl TryFrom<char> for Direction {
    type Error = TuringMachineError;

    /// Supports 'L' or '<' for Left, 'R' or '>' for Right, and 'N', 'S' or '-' for Stay.
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'L' | '<' => Ok(Direction::Left),
            'R' | '>' => Ok(Direction::Right),
            'N' | 'S' | '-' => Ok(Direction::Stay),
            _ => Err(TuringMachineError::ValidationError(format!(
                "Unsupported direction: {c}"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The lookup key of the transition table: the current state and the symbol under the head.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionKey {
    pub state: String,
    pub symbol: char,
}

impl TransitionKey {
    pub fn new(state: impl Into<String>, symbol: char) -> Self {
        Self {
            state: state.into(),
            symbol,
        }
    }
}

/// The action taken when a `TransitionKey` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine moves to.
    pub next_state: String,
    /// The symbol written under the head.
    pub write: char,
    /// Where the head moves after writing.
    pub direction: Direction,
}

/// An immutable single-tape Turing machine definition.
///
/// A definition can only be obtained through [`DefinitionBuilder::build`], which validates it,
/// so every `MachineDefinition` in circulation is well formed. Fields are read through accessors
/// and never change afterwards, which lets many engines share one definition behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineDefinition {
    name: String,
    states: BTreeSet<String>,
    alphabet: BTreeSet<char>,
    blank: char,
    start_state: String,
    accept_state: String,
    reject_state: Option<String>,
    transitions: HashMap<TransitionKey, Transition>,
    max_steps: usize,
    tape_padding: usize,
    sample_input: String,
}

impl MachineDefinition {
    /// Starts building a definition with the given display name.
    pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn blank(&self) -> char {
        self.blank
    }

    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    pub fn accept_state(&self) -> &str {
        &self.accept_state
    }

    pub fn reject_state(&self) -> Option<&str> {
        self.reject_state.as_deref()
    }

    pub fn transitions(&self) -> &HashMap<TransitionKey, Transition> {
        &self.transitions
    }

    /// Looks up the transition for `state` reading `symbol`.
    ///
    /// A miss is not an error: the engine treats it as a halting condition.
    pub fn transition(&self, state: &str, symbol: char) -> Option<&Transition> {
        self.transitions.get(&TransitionKey::new(state, symbol))
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn tape_padding(&self) -> usize {
        self.tape_padding
    }

    /// An example input shipped with the definition, empty when none was given.
    pub fn sample_input(&self) -> &str {
        &self.sample_input
    }

    /// Returns true if `state` is the accept state or the (optional) reject state.
    pub fn is_terminal(&self, state: &str) -> bool {
        state == self.accept_state || self.reject_state.as_deref() == Some(state)
    }
}

/// Builder for [`MachineDefinition`].
///
/// Transitions are collected in insertion order so that duplicated keys can be reported
/// by `build` instead of silently overwriting each other.
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    name: String,
    states: BTreeSet<String>,
    alphabet: BTreeSet<char>,
    blank: char,
    start_state: Option<String>,
    accept_state: Option<String>,
    reject_state: Option<String>,
    transitions: Vec<(TransitionKey, Transition)>,
    max_steps: usize,
    tape_padding: usize,
    sample_input: String,
}

impl DefinitionBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: BTreeSet::new(),
            alphabet: BTreeSet::new(),
            blank: BLANK_SYMBOL,
            start_state: None,
            accept_state: None,
            reject_state: None,
            transitions: Vec::new(),
            max_steps: DEFAULT_MAX_STEPS,
            tape_padding: DEFAULT_TAPE_PADDING,
            sample_input: String::new(),
        }
    }

    /// Declares states. Can be called repeatedly; states accumulate.
    pub fn states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Declares tape symbols. Can be called repeatedly; symbols accumulate.
    pub fn alphabet<I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        self.alphabet.extend(symbols);
        self
    }

    pub fn blank(mut self, blank: char) -> Self {
        self.blank = blank;
        self
    }

    pub fn start(mut self, state: impl Into<String>) -> Self {
        self.start_state = Some(state.into());
        self
    }

    pub fn accept(mut self, state: impl Into<String>) -> Self {
        self.accept_state = Some(state.into());
        self
    }

    pub fn reject(mut self, state: impl Into<String>) -> Self {
        self.reject_state = Some(state.into());
        self
    }

    /// Adds the rule `(state, read) -> (next_state, write, direction)`.
    pub fn transition(
        mut self,
        state: impl Into<String>,
        read: char,
        next_state: impl Into<String>,
        write: char,
        direction: Direction,
    ) -> Self {
        self.transitions.push((
            TransitionKey::new(state, read),
            Transition {
                next_state: next_state.into(),
                write,
                direction,
            },
        ));
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn tape_padding(mut self, tape_padding: usize) -> Self {
        self.tape_padding = tape_padding;
        self
    }

    pub fn sample_input(mut self, input: impl Into<String>) -> Self {
        self.sample_input = input.into();
        self
    }

    /// Validates the collected parts and produces the immutable definition.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineDefinition)` if the definition is well formed.
    /// * `Err(TuringMachineError::ValidationError)` if a start or accept state is missing,
    ///   a `(state, symbol)` key is defined twice, or any analyzer check fails.
    pub fn build(self) -> Result<MachineDefinition, TuringMachineError> {
        let start_state = self.start_state.ok_or_else(|| {
            TuringMachineError::ValidationError("Missing start state".to_string())
        })?;
        let accept_state = self.accept_state.ok_or_else(|| {
            TuringMachineError::ValidationError("Missing accept state".to_string())
        })?;

        check_duplicate_transitions(&self.transitions)?;

        let definition = MachineDefinition {
            name: self.name,
            states: self.states,
            alphabet: self.alphabet,
            blank: self.blank,
            start_state,
            accept_state,
            reject_state: self.reject_state,
            transitions: self.transitions.into_iter().collect(),
            max_steps: self.max_steps,
            tape_padding: self.tape_padding,
            sample_input: self.sample_input,
        };

        analyze(&definition)?;

        Ok(definition)
    }
}

/// Represents the outcome of a single call to `TuringMachine::step`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A transition was executed and the machine is still running.
    Continue,
    /// The machine is halted; the payload says why this call did not continue.
    Halt(Halt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// A transition entered the accept state.
    Accept,
    /// A transition entered the reject state.
    Reject,
    /// The step limit was reached before this call could execute a transition.
    StepLimit,
    /// No rule exists for the current state and the symbol under the head.
    NoTransition { state: String, symbol: char },
    /// The machine had already halted; nothing changed.
    AlreadyHalted,
}

/// The result of `TuringMachine::step`: what happened plus a human readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub step: Step,
    pub message: String,
}

impl StepResult {
    /// Returns true if the machine can keep running after this step.
    pub fn continues(&self) -> bool {
        self.step == Step::Continue
    }
}

/// Why a machine stopped. Kept by the engine so the verdict can be derived later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    Accept,
    Reject,
    StepLimit,
    NoTransition,
}

/// The final classification of a halted run. Exactly one holds for any halted machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The machine is in its accept state.
    Accepted,
    /// The machine is in its reject state.
    Rejected,
    /// The step limit stopped a machine that never reached accept or reject.
    StepLimitExceeded,
    /// No transition matched in a state that is neither accept nor reject.
    StuckNoTransition,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::Accepted => "Accepted",
            Verdict::Rejected => "Rejected",
            Verdict::StepLimitExceeded => "Step limit exceeded",
            Verdict::StuckNoTransition => "Halted (no transition)",
        };
        f.write_str(text)
    }
}

/// One executed transition, recorded for display and auditing only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// The 1-based number of the step that executed this transition.
    pub step: usize,
    pub state: String,
    pub read: char,
    pub next_state: String,
    pub write: char,
    pub direction: Direction,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) -> ({}, {}, {})",
            self.state, self.read, self.next_state, self.write, self.direction
        )
    }
}

/// What `TuringMachine::run` returns: the verdict and every step message in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub verdict: Verdict,
    pub messages: Vec<String>,
}

/// Represents the errors that can occur while building, parsing or loading machines.
///
/// Running a machine never produces one of these: run-time outcomes are expressed by
/// [`Step`], [`Halt`] and [`Verdict`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// Indicates an error during the parsing of a machine definition.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a malformed machine definition.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to reading definition files.
    #[error("File error: {0}")]
    FileError(String),
    /// The halting oracle recursed deeper than its configured ceiling.
    #[error("Halting oracle exceeded its depth limit of {0}")]
    DepthExceeded(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flip_builder() -> DefinitionBuilder {
        MachineDefinition::builder("Flip")
            .states(["q0", "q1", "halt"])
            .alphabet(['0', '1', '_'])
            .start("q0")
            .accept("halt")
            .transition("q0", '0', "q1", '1', Direction::Right)
            .transition("q1", '_', "halt", '_', Direction::Stay)
    }

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let stay_json = serde_json::to_string(&Direction::Stay).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(stay_json, "\"Stay\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
    }

    #[test]
    fn test_direction_from_char() {
        assert_eq!(Direction::try_from('R').unwrap(), Direction::Right);
        assert_eq!(Direction::try_from('<').unwrap(), Direction::Left);
        assert_eq!(Direction::try_from('N').unwrap(), Direction::Stay);
        assert_eq!(Direction::try_from('S').unwrap(), Direction::Stay);
        assert!(Direction::try_from('X').is_err());
        assert_eq!(Direction::Left.offset(), -1);
        assert_eq!(Direction::Stay.offset(), 0);
    }

    #[test]
    fn test_build_definition() {
        let definition = flip_builder().build().unwrap();

        assert_eq!(definition.name(), "Flip");
        assert_eq!(definition.start_state(), "q0");
        assert_eq!(definition.accept_state(), "halt");
        assert_eq!(definition.reject_state(), None);
        assert_eq!(definition.max_steps(), DEFAULT_MAX_STEPS);
        assert_eq!(definition.tape_padding(), DEFAULT_TAPE_PADDING);
        assert_eq!(definition.blank(), BLANK_SYMBOL);
        assert_eq!(definition.transitions().len(), 2);
        assert_eq!(
            definition.transition("q0", '0'),
            Some(&Transition {
                next_state: "q1".into(),
                write: '1',
                direction: Direction::Right,
            })
        );
        assert_eq!(definition.transition("q0", '1'), None);
        assert!(definition.is_terminal("halt"));
        assert!(!definition.is_terminal("q1"));
    }

    #[test]
    fn test_build_rejects_duplicate_keys() {
        let error = flip_builder()
            .transition("q0", '0', "halt", '0', Direction::Stay)
            .build()
            .unwrap_err();

        assert!(matches!(error, TuringMachineError::ValidationError(_)));
        assert!(error.to_string().contains("(q0, 0)"));
    }

    #[test]
    fn test_build_requires_start_and_accept() {
        let error = MachineDefinition::builder("No start")
            .states(["a"])
            .accept("a")
            .build()
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing start state"
        );

        let error = MachineDefinition::builder("No accept")
            .states(["a"])
            .start("a")
            .build()
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing accept state"
        );
    }

    #[test]
    fn test_trace_entry_display() {
        let entry = TraceEntry {
            step: 1,
            state: "q0".into(),
            read: '0',
            next_state: "q1".into(),
            write: '1',
            direction: Direction::Right,
        };

        assert_eq!(entry.to_string(), "(q0, 0) -> (q1, 1, R)");
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::DepthExceeded(8);
        assert_eq!(
            error.to_string(),
            "Halting oracle exceeded its depth limit of 8"
        );
    }
}
