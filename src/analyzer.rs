//! This module provides functions for analyzing machine definitions to detect common errors
//! and inconsistencies before execution. This includes checks for declared states and symbols,
//! distinct terminal states, reachable states, and duplicated transition keys.

use crate::types::{MachineDefinition, Transition, TransitionKey, TuringMachineError};
use std::collections::{BTreeSet, HashSet};

/// The smallest blank padding a tape may be seeded with.
pub const MIN_TAPE_PADDING: usize = 50;

/// Represents various errors that can be found during the analysis of a machine definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The same `(state, symbol)` pair has more than one transition.
    DuplicateTransitions(Vec<String>),
    /// The start, accept or reject state collide with each other.
    ConflictingStates(String),
    /// Transitions or the start/accept/reject settings reference undeclared states.
    UndefinedStates(Vec<String>),
    /// Transitions read or write symbols missing from the tape alphabet.
    UndefinedSymbols(Vec<char>),
    /// Declared states that cannot be reached from the start state.
    UnreachableStates(Vec<String>),
    /// Structural problems (no states, zero step limit, too little padding, ...).
    StructuralError(String),
}

impl From<AnalysisError> for TuringMachineError {
    /// Converts an `AnalysisError` into a `TuringMachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::DuplicateTransitions(keys) => TuringMachineError::ValidationError(
                format!("Duplicate transitions for: {}", keys.join(", ")),
            ),
            AnalysisError::ConflictingStates(msg) => TuringMachineError::ValidationError(msg),
            AnalysisError::UndefinedStates(states) => TuringMachineError::ValidationError(
                format!("Undeclared states referenced: {:?}", states),
            ),
            AnalysisError::UndefinedSymbols(symbols) => TuringMachineError::ValidationError(
                format!("Symbols missing from the tape alphabet: {:?}", symbols),
            ),
            AnalysisError::UnreachableStates(states) => TuringMachineError::ValidationError(
                format!("Unreachable states detected: {:?}", states),
            ),
            AnalysisError::StructuralError(msg) => TuringMachineError::ValidationError(msg),
        }
    }
}

/// Analyzes a `MachineDefinition` for structural and logical errors.
///
/// Every check runs; the first failure (in the order listed below) is returned.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(TuringMachineError::ValidationError)` if any validation rule is violated.
pub fn analyze(definition: &MachineDefinition) -> Result<(), TuringMachineError> {
    let errors = [
        check_structure,
        check_terminal_states,
        check_declared_states,
        check_symbols,
        check_unreachable_states,
    ]
    .iter()
    .filter_map(|f| f(definition).err())
    .collect::<Vec<_>>();

    if let Some(first_error) = errors.into_iter().next() {
        return Err(first_error.into());
    }

    warn_terminal_transitions(definition);

    Ok(())
}

/// Checks that no `(state, symbol)` key appears twice in a list of transitions.
///
/// The builder collects transitions as a list, so this runs before they are collapsed into
/// the lookup table where a duplicate would silently overwrite the earlier rule.
pub fn check_duplicate_transitions(
    transitions: &[(TransitionKey, Transition)],
) -> Result<(), TuringMachineError> {
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();

    for (key, _) in transitions {
        if !seen.insert(key) {
            duplicates.insert(format!("({}, {})", key.state, key.symbol));
        }
    }

    if !duplicates.is_empty() {
        return Err(AnalysisError::DuplicateTransitions(duplicates.into_iter().collect()).into());
    }

    Ok(())
}

/// Checks basic structural requirements of the definition.
fn check_structure(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    if definition.states().is_empty() {
        return Err(AnalysisError::StructuralError(
            "No states defined".to_string(),
        ));
    }

    if definition.max_steps() == 0 {
        return Err(AnalysisError::StructuralError(
            "Step limit must be positive".to_string(),
        ));
    }

    if definition.tape_padding() < MIN_TAPE_PADDING {
        return Err(AnalysisError::StructuralError(format!(
            "Tape padding ({}) must be at least {}",
            definition.tape_padding(),
            MIN_TAPE_PADDING
        )));
    }

    if !definition.alphabet().contains(&definition.blank()) {
        return Err(AnalysisError::StructuralError(format!(
            "Blank symbol '{}' is not part of the tape alphabet",
            definition.blank()
        )));
    }

    Ok(())
}

/// Checks that the start, accept and reject states are pairwise distinct.
///
/// A machine starting in a terminal state would be halted before its first step, and an
/// accept state doubling as reject state would make the verdict ambiguous.
fn check_terminal_states(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let start = definition.start_state();
    let accept = definition.accept_state();

    if start == accept {
        return Err(AnalysisError::ConflictingStates(format!(
            "Start state '{start}' cannot also be the accept state"
        )));
    }

    if let Some(reject) = definition.reject_state() {
        if reject == accept {
            return Err(AnalysisError::ConflictingStates(format!(
                "State '{reject}' cannot be both accept and reject state"
            )));
        }
        if reject == start {
            return Err(AnalysisError::ConflictingStates(format!(
                "Start state '{start}' cannot also be the reject state"
            )));
        }
    }

    Ok(())
}

/// Checks that every state mentioned anywhere in the definition is declared.
fn check_declared_states(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let declared = definition.states();

    let referenced = [definition.start_state(), definition.accept_state()]
        .into_iter()
        .chain(definition.reject_state())
        .chain(
            definition
                .transitions()
                .iter()
                .flat_map(|(key, t)| [key.state.as_str(), t.next_state.as_str()]),
        );

    let undefined: BTreeSet<String> = referenced
        .filter(|state| !declared.contains(*state))
        .map(str::to_string)
        .collect();

    if !undefined.is_empty() {
        return Err(AnalysisError::UndefinedStates(undefined.into_iter().collect()));
    }

    Ok(())
}

/// Checks that every symbol read or written by a transition belongs to the alphabet.
fn check_symbols(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let alphabet = definition.alphabet();

    let undefined: BTreeSet<char> = definition
        .transitions()
        .iter()
        .flat_map(|(key, t)| [key.symbol, t.write])
        .filter(|symbol| !alphabet.contains(symbol))
        .collect();

    if !undefined.is_empty() {
        return Err(AnalysisError::UndefinedSymbols(undefined.into_iter().collect()));
    }

    Ok(())
}

/// Checks for unreachable states by a depth-first traversal from the start state.
///
/// The accept and reject states are exempt: a machine may legitimately never reach them,
/// for example one that is meant to run into its step limit.
fn check_unreachable_states(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let mut visited = HashSet::new();
    let mut queue = vec![definition.start_state()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for (key, transition) in definition.transitions() {
            if key.state == state && !visited.contains(transition.next_state.as_str()) {
                queue.push(transition.next_state.as_str());
            }
        }
    }

    let mut unreachable: Vec<String> = definition
        .states()
        .iter()
        .filter(|state| !visited.contains(state.as_str()) && !definition.is_terminal(state))
        .cloned()
        .collect();

    if !unreachable.is_empty() {
        unreachable.sort();
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

/// Logs transitions leaving the accept or reject state. The engine halts on entering those
/// states, so such rules can never fire.
fn warn_terminal_transitions(definition: &MachineDefinition) {
    for key in definition.transitions().keys() {
        if definition.is_terminal(&key.state) {
            log::warn!(
                "'{}': transition ({}, {}) leaves a halting state and will never run",
                definition.name(),
                key.state,
                key.symbol
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DefinitionBuilder, Direction};

    fn base_builder() -> DefinitionBuilder {
        MachineDefinition::builder("Test Machine")
            .states(["start", "halt"])
            .alphabet(['a', 'b', '_'])
            .start("start")
            .accept("halt")
            .transition("start", 'a', "halt", 'b', Direction::Right)
    }

    fn validation_message(builder: DefinitionBuilder) -> String {
        match builder.build() {
            Err(TuringMachineError::ValidationError(msg)) => msg,
            other => panic!("Expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_definition() {
        assert!(base_builder().build().is_ok());
    }

    #[test]
    fn test_start_equals_accept() {
        let msg = validation_message(base_builder().start("halt"));
        assert_eq!(msg, "Start state 'halt' cannot also be the accept state");
    }

    #[test]
    fn test_reject_equals_accept() {
        let msg = validation_message(base_builder().reject("halt"));
        assert_eq!(msg, "State 'halt' cannot be both accept and reject state");
    }

    #[test]
    fn test_undeclared_states() {
        let msg = validation_message(
            base_builder()
                .reject("nope")
                .transition("start", 'b', "elsewhere", 'b', Direction::Left),
        );
        assert_eq!(
            msg,
            "Undeclared states referenced: [\"elsewhere\", \"nope\"]"
        );
    }

    #[test]
    fn test_undefined_symbols() {
        let msg = validation_message(base_builder().transition(
            "start",
            'c',
            "halt",
            'd',
            Direction::Stay,
        ));
        assert_eq!(msg, "Symbols missing from the tape alphabet: ['c', 'd']");
    }

    #[test]
    fn test_unreachable_states() {
        let error = MachineDefinition::builder("Unreachable")
            .states(["start", "middle", "island", "halt", "reject"])
            .alphabet(['a', '_'])
            .start("start")
            .accept("halt")
            .reject("reject")
            .transition("start", 'a', "middle", 'a', Direction::Right)
            .transition("middle", '_', "halt", '_', Direction::Stay)
            .transition("island", 'a', "middle", 'a', Direction::Stay)
            .build()
            .unwrap_err();

        assert_eq!(
            error,
            TuringMachineError::ValidationError(
                "Unreachable states detected: [\"island\"]".to_string()
            )
        );
    }

    #[test]
    fn test_unreachable_accept_is_allowed() {
        let definition = MachineDefinition::builder("Loop")
            .states(["loop", "halt"])
            .alphabet(['0', '_'])
            .start("loop")
            .accept("halt")
            .transition("loop", '0', "loop", '0', Direction::Right)
            .build();

        assert!(definition.is_ok());
    }

    #[test]
    fn test_structural_errors() {
        let msg = validation_message(base_builder().max_steps(0));
        assert_eq!(msg, "Step limit must be positive");

        let msg = validation_message(base_builder().tape_padding(10));
        assert_eq!(msg, "Tape padding (10) must be at least 50");

        let msg = validation_message(base_builder().blank('#'));
        assert_eq!(msg, "Blank symbol '#' is not part of the tape alphabet");

        let msg = validation_message(
            MachineDefinition::builder("Empty")
                .alphabet(['_'])
                .start("a")
                .accept("b"),
        );
        assert_eq!(msg, "No states defined");
    }

    #[test]
    fn test_duplicate_transitions() {
        let transitions = vec![
            (
                TransitionKey::new("s", 'a'),
                Transition {
                    next_state: "t".into(),
                    write: 'a',
                    direction: Direction::Right,
                },
            ),
            (
                TransitionKey::new("s", 'a'),
                Transition {
                    next_state: "u".into(),
                    write: 'b',
                    direction: Direction::Left,
                },
            ),
        ];

        let error = check_duplicate_transitions(&transitions).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Duplicate transitions for: (s, a)"
        );
        assert!(check_duplicate_transitions(&transitions[..1]).is_ok());
    }

    #[test]
    fn test_analysis_error_conversion() {
        let error: TuringMachineError =
            AnalysisError::UnreachableStates(vec!["x".to_string()]).into();

        assert!(matches!(error, TuringMachineError::ValidationError(_)));
        assert!(error.to_string().contains("Unreachable states"));
    }

    #[test]
    fn test_first_error_wins() {
        // Both the padding and the undeclared state are wrong; structure is checked first.
        let msg = validation_message(
            base_builder()
                .tape_padding(1)
                .transition("start", 'b', "ghost", 'b', Direction::Stay),
        );
        assert_eq!(msg, "Tape padding (1) must be at least 50");
    }
}
