//! This module defines the `TuringMachine` struct, which executes a single-tape deterministic
//! Turing machine. It owns the run state (tape, head, current state, step counter, halt status
//! and transition trace) and reads the transition rules from a shared `MachineDefinition`.

use std::sync::Arc;

use crate::tape::Tape;
use crate::types::{
    Halt, HaltReason, MachineDefinition, RunSummary, Step, StepResult, TraceEntry, Verdict,
};

/// Represents a running single-tape Turing machine.
///
/// The definition is shared and read-only; everything else belongs to this instance alone.
/// Several machines can therefore run the same definition independently:
///
/// ```
/// use std::sync::Arc;
/// use tmengine::{Direction, MachineDefinition, TuringMachine, Verdict};
///
/// let definition = Arc::new(
///     MachineDefinition::builder("Flip")
///         .states(["q0", "q1", "halt"])
///         .alphabet(['0', '1', '_'])
///         .start("q0")
///         .accept("halt")
///         .transition("q0", '0', "q1", '1', Direction::Right)
///         .transition("q1", '_', "halt", '_', Direction::Stay)
///         .build()
///         .unwrap(),
/// );
///
/// let mut accepted = TuringMachine::new(definition.clone(), "0");
/// let mut stuck = TuringMachine::new(definition, "1");
///
/// assert_eq!(accepted.run(None).verdict, Verdict::Accepted);
/// assert_eq!(stuck.run(None).verdict, Verdict::StuckNoTransition);
/// ```
#[derive(Debug, Clone)]
pub struct TuringMachine {
    definition: Arc<MachineDefinition>,
    tape: Tape,
    head: isize,
    state: String,
    step_count: usize,
    step_limit: usize,
    halt: Option<HaltReason>,
    trace: Vec<TraceEntry>,
}

impl TuringMachine {
    /// Creates a new `TuringMachine` for `definition`, loaded with `input`.
    ///
    /// # Arguments
    ///
    /// * `definition` - The validated machine definition, owned or shared through an `Arc`.
    /// * `input` - The initial tape content. Any string is accepted, including the empty one.
    pub fn new(definition: impl Into<Arc<MachineDefinition>>, input: &str) -> Self {
        let definition = definition.into();

        let mut machine = Self {
            tape: Tape::new("", definition.blank(), 0),
            head: 0,
            state: definition.start_state().to_string(),
            step_count: 0,
            step_limit: definition.max_steps(),
            halt: None,
            trace: Vec::new(),
            definition,
        };
        machine.reset(input);
        machine
    }

    /// Resets the machine to its initial configuration with a new input.
    ///
    /// The tape becomes `input` followed by the definition's blank padding, the head returns
    /// to cell 0, the state to the start state, and the step counter, halt status and trace
    /// are cleared. The step limit is kept.
    pub fn reset(&mut self, input: &str) {
        let alphabet = self.definition.alphabet();
        if let Some(unknown) = input.chars().find(|c| !alphabet.contains(c)) {
            log::warn!(
                "input {input:?} contains symbol {unknown:?} outside the alphabet of '{}'",
                self.definition.name()
            );
        }

        self.tape = Tape::new(
            input,
            self.definition.blank(),
            self.definition.tape_padding(),
        );
        self.head = 0;
        self.state = self.definition.start_state().to_string();
        self.step_count = 0;
        self.halt = None;
        self.trace.clear();
    }

    /// Executes a single step of the machine's computation.
    ///
    /// In order: the step limit is enforced, an already halted machine is left untouched,
    /// the tape is extended under the head if needed, the symbol under the head is read and
    /// looked up, and on a hit the transition is recorded, applied and checked for entering
    /// the accept or reject state.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if a transition was executed and the machine is still running.
    /// * `Step::Halt(_)` otherwise, with the reason this call did not continue.
    pub fn step(&mut self) -> StepResult {
        if self.step_count >= self.step_limit {
            if self.halt.is_none() {
                log::info!(
                    "'{}' forced to halt after {} steps",
                    self.definition.name(),
                    self.step_count
                );
                self.halt = Some(HaltReason::StepLimit);
            }
            return StepResult {
                step: Step::Halt(Halt::StepLimit),
                message: format!("Step limit ({}) reached, forced halt", self.step_limit),
            };
        }

        if self.is_halted() {
            return StepResult {
                step: Step::Halt(Halt::AlreadyHalted),
                message: "Machine already halted".to_string(),
            };
        }

        let index = self.tape.materialize(self.head);
        self.head = index as isize;

        let symbol = self.tape.read(index);
        let transition = match self.definition.transition(&self.state, symbol) {
            Some(t) => t.clone(),
            None => {
                log::info!(
                    "'{}' has no transition for ({}, {}), halting",
                    self.definition.name(),
                    self.state,
                    symbol
                );
                self.halt = Some(HaltReason::NoTransition);
                return StepResult {
                    message: format!("No transition for ({}, {}), halted", self.state, symbol),
                    step: Step::Halt(Halt::NoTransition {
                        state: self.state.clone(),
                        symbol,
                    }),
                };
            }
        };

        self.trace.push(TraceEntry {
            step: self.step_count + 1,
            state: self.state.clone(),
            read: symbol,
            next_state: transition.next_state.clone(),
            write: transition.write,
            direction: transition.direction,
        });

        self.tape.write(index, transition.write);
        self.state = transition.next_state;
        self.head += transition.direction.offset();
        self.step_count += 1;

        let step = if self.state == self.definition.accept_state() {
            self.halt = Some(HaltReason::Accept);
            Step::Halt(Halt::Accept)
        } else if self.definition.reject_state() == Some(self.state.as_str()) {
            self.halt = Some(HaltReason::Reject);
            Step::Halt(Halt::Reject)
        } else {
            Step::Continue
        };

        let message = format!(
            "Step {}: State={}, Head={}, Tape={}",
            self.step_count,
            self.state,
            self.head,
            self.tape.trimmed()
        );
        log::debug!("{message}");

        if let Step::Halt(_) = step {
            log::info!("'{}' halted in state {}", self.definition.name(), self.state);
        }

        StepResult { step, message }
    }

    /// Runs the machine until a step does not continue.
    ///
    /// If `limit` is given it replaces this machine's step limit first (it stays in effect for
    /// later runs and resets). Termination is guaranteed by the step limit.
    ///
    /// # Returns
    ///
    /// The verdict of the halted machine and every step message in execution order.
    pub fn run(&mut self, limit: Option<usize>) -> RunSummary {
        if let Some(limit) = limit {
            self.step_limit = limit;
        }

        let mut messages = Vec::new();
        loop {
            let result = self.step();
            let continues = result.continues();
            messages.push(result.message);

            if !continues {
                break;
            }
        }

        RunSummary {
            verdict: self.classify(),
            messages,
        }
    }

    /// Returns the verdict of a halted machine, or `None` while it is still running.
    pub fn verdict(&self) -> Option<Verdict> {
        self.is_halted().then(|| self.classify())
    }

    /// Derives the verdict from the current state first and the halt reason second, so a
    /// machine sitting in its accept or reject state is classified by that state alone.
    fn classify(&self) -> Verdict {
        if self.is_accepted() {
            Verdict::Accepted
        } else if self.is_rejected() {
            Verdict::Rejected
        } else if self.halt == Some(HaltReason::StepLimit) {
            Verdict::StepLimitExceeded
        } else {
            Verdict::StuckNoTransition
        }
    }

    /// Returns true if the machine is in its accept state.
    pub fn is_accepted(&self) -> bool {
        self.state == self.definition.accept_state()
    }

    /// Returns true if the machine has a reject state and is in it.
    pub fn is_rejected(&self) -> bool {
        self.definition.reject_state() == Some(self.state.as_str())
    }

    /// Returns true once the machine has halted for any reason.
    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    /// Returns why the machine halted, if it has.
    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halt
    }

    /// Returns the current state of the machine.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the head position as an index into `tape()`.
    ///
    /// Between steps this can be `-1` or `tape().len()` after moving off either end; the
    /// next step extends the tape under it.
    pub fn head(&self) -> isize {
        self.head
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Returns the symbol under the head, or the blank symbol when the head is off the
    /// materialized tape.
    pub fn symbol(&self) -> char {
        if self.head < 0 {
            self.tape.blank()
        } else {
            self.tape.read(self.head as usize)
        }
    }

    /// Returns every transition executed since the last reset, in order.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Returns the total number of steps executed since the last reset.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    /// Replaces the step limit of this machine. The shared definition is not affected.
    pub fn set_step_limit(&mut self, limit: usize) {
        self.step_limit = limit;
    }

    pub fn definition(&self) -> &Arc<MachineDefinition> {
        &self.definition
    }
}
