//! This module provides the parser for machine definitions, utilizing the `pest` crate.
//! It defines the grammar for `.tm` files and functions to turn the parse tree into a validated
//! `MachineDefinition`.

use crate::types::{
    DefinitionBuilder, Direction, MachineDefinition, TuringMachineError, MAX_PROGRAM_SIZE,
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::{BTreeSet, HashSet};

/// Derives a `PestParser` for the machine grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DefinitionParser;

/// Parses the given input string into a `MachineDefinition`.
///
/// This is the main entry point for parsing machine definitions. It trims the input, parses
/// it using the `DefinitionParser`, and then builds the definition from the resulting parse
/// tree. The definition is validated by the builder before being returned.
///
/// When `states:` or `alphabet:` are omitted they are inferred from the rules, and `start:`
/// defaults to the first state block.
///
/// # Arguments
///
/// * `input` - A string slice containing the machine definition.
///
/// # Returns
///
/// * `Ok(MachineDefinition)` if the input is successfully parsed and validated.
/// * `Err(TuringMachineError::ParseError)` if there are any syntax errors.
/// * `Err(TuringMachineError::ValidationError)` if the definition fails validation.
pub fn parse(input: &str) -> Result<MachineDefinition, TuringMachineError> {
    if input.len() > MAX_PROGRAM_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Program is too large ({} bytes, limit is {} bytes)",
            input.len(),
            MAX_PROGRAM_SIZE
        )));
    }

    let root = DefinitionParser::parse(Rule::program, input.trim())
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| TuringMachineError::ValidationError("Empty program".to_string()))?;

    parse_program(root)
}

/// Collects the sections of a parsed program before they are handed to the builder.
#[derive(Default)]
struct Sections {
    name: Option<String>,
    states: Option<Vec<String>>,
    alphabet: Option<Vec<char>>,
    blank: Option<char>,
    start: Option<String>,
    accept: Option<String>,
    reject: Option<String>,
    max_steps: Option<usize>,
    padding: Option<usize>,
    input: Option<String>,
    rules: Vec<ParsedRule>,
}

/// A helper struct to temporarily hold a parsed rule.
struct ParsedRule {
    state: String,
    read: char,
    write: char,
    direction: Direction,
    next: String,
}

/// Parses the top-level structure of a program from a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<MachineDefinition, TuringMachineError> {
    let mut sections = Sections::default();
    let mut blocks: Vec<String> = Vec::new();
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => sections.name = Some(parse_inner_string(p)?.trim().to_string()),
            Rule::states => sections.states = Some(p.into_inner().map(as_string).collect()),
            Rule::alphabet => {
                sections.alphabet = Some(p.into_inner().map(|s| parse_symbol(s.as_str())).collect())
            }
            Rule::blank => sections.blank = Some(parse_symbol(&parse_inner_string(p)?)),
            Rule::start => sections.start = Some(parse_inner_string(p)?),
            Rule::accept => sections.accept = Some(parse_inner_string(p)?),
            Rule::reject => sections.reject = Some(parse_inner_string(p)?),
            Rule::max_steps => sections.max_steps = Some(parse_number(p)?),
            Rule::padding => sections.padding = Some(parse_number(p)?),
            Rule::input => {
                sections.input = Some(
                    p.into_inner()
                        .next()
                        .map(|s| s.as_str().trim_end().to_string())
                        .unwrap_or_default(),
                )
            }
            Rule::rules => parse_rules(p, &mut blocks, &mut sections.rules)?,
            _ => {} // Skip EOI
        }
    }

    let name = check_required_rule(sections.name, "name")?;
    let accept = check_required_rule(sections.accept, "accept")?;
    let start = match sections.start {
        Some(start) => start,
        None => check_required_rule(blocks.first().cloned(), "start")?,
    };
    let blank = sections.blank.unwrap_or(crate::types::BLANK_SYMBOL);

    let states = sections.states.unwrap_or_else(|| {
        infer_states(&blocks, &sections.rules, &start, &accept, sections.reject.as_deref())
    });
    let alphabet = sections
        .alphabet
        .unwrap_or_else(|| infer_alphabet(&sections.rules, blank));

    let mut builder: DefinitionBuilder = MachineDefinition::builder(name)
        .states(states)
        .alphabet(alphabet)
        .blank(blank)
        .start(start)
        .accept(accept);

    if let Some(reject) = sections.reject {
        builder = builder.reject(reject);
    }
    if let Some(max_steps) = sections.max_steps {
        builder = builder.max_steps(max_steps);
    }
    if let Some(padding) = sections.padding {
        builder = builder.tape_padding(padding);
    }
    if let Some(input) = sections.input {
        builder = builder.sample_input(input);
    }

    for rule in sections.rules {
        builder = builder.transition(rule.state, rule.read, rule.next, rule.write, rule.direction);
    }

    builder.build()
}

/// Parses the `rules:` section, recording the state blocks in order of appearance.
///
/// A state may only have one block; its rules are listed under it.
fn parse_rules(
    pair: Pair<Rule>,
    blocks: &mut Vec<String>,
    rules: &mut Vec<ParsedRule>,
) -> Result<(), TuringMachineError> {
    for block in pair.into_inner() {
        let span = block.as_span();
        let mut pairs = block.into_inner();
        let state = parse_string(&mut pairs)?;

        // Prevent duplicated state blocks
        if blocks.contains(&state) {
            return Err(parse_error(
                &format!("Duplicate state block: {state}"),
                span,
            ));
        }

        for action in pairs {
            rules.push(parse_action(&state, action)?);
        }

        blocks.push(state);
    }

    Ok(())
}

/// Parses a single action from a `Pair<Rule::action>`.
///
/// If the write symbol is omitted the machine writes back what it read.
fn parse_action(state: &str, pair: Pair<Rule>) -> Result<ParsedRule, TuringMachineError> {
    let mut pairs = pair.into_inner();
    let read = parse_symbol(&parse_string(&mut pairs)?);

    let write = match pairs.peek().map(|p| p.as_rule()) {
        Some(Rule::symbol) => parse_symbol(&parse_string(&mut pairs)?),
        _ => read,
    };

    let direction = parse_direction(next_pair(&mut pairs)?)?;
    let next = parse_string(&mut pairs)?;

    Ok(ParsedRule {
        state: state.to_string(),
        read,
        write,
        direction,
        next,
    })
}

/// Parses a single direction from a `Pair<Rule::direction>`.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, TuringMachineError> {
    let span = pair.as_span();
    pair.as_str()
        .chars()
        .next()
        .and_then(|c| Direction::try_from(c).ok())
        .ok_or_else(|| {
            parse_error(
                &format!("Unsupported direction: {}", pair.as_str()),
                span,
            )
        })
}

/// Parses a numeric section such as `max_steps:`.
fn parse_number(pair: Pair<Rule>) -> Result<usize, TuringMachineError> {
    let inner = next_pair(&mut pair.into_inner())?;
    let span = inner.as_span();
    inner
        .as_str()
        .parse::<usize>()
        .map_err(|e| parse_error(&format!("Invalid number: {e}"), span))
}

/// Parses a single character symbol from a string, handling quoted and unquoted symbols.
fn parse_symbol(input: &str) -> char {
    let unquoted = input
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(input);

    unquoted.chars().next().unwrap_or(crate::types::BLANK_SYMBOL)
}

/// Derives the state set from the state blocks, the rules and the terminal states.
fn infer_states(
    blocks: &[String],
    rules: &[ParsedRule],
    start: &str,
    accept: &str,
    reject: Option<&str>,
) -> Vec<String> {
    let mut states: BTreeSet<String> = blocks.iter().cloned().collect();
    states.extend(rules.iter().map(|r| r.next.clone()));
    states.extend([start, accept].into_iter().chain(reject).map(str::to_string));
    states.into_iter().collect()
}

/// Derives the alphabet from every symbol read or written, plus the blank symbol.
fn infer_alphabet(rules: &[ParsedRule], blank: char) -> Vec<char> {
    let mut alphabet: BTreeSet<char> = rules.iter().flat_map(|r| [r.read, r.write]).collect();
    alphabet.insert(blank);
    alphabet.into_iter().collect()
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, TuringMachineError> {
    pairs
        .next()
        .ok_or_else(|| TuringMachineError::ValidationError("Unexpected end of rule".to_string()))
}

fn as_string(pair: Pair<Rule>) -> String {
    pair.as_str().into()
}

/// Extracts the inner string content from a `Pair`.
fn parse_inner_string(pair: Pair<Rule>) -> Result<String, TuringMachineError> {
    parse_string(&mut pair.into_inner())
}

/// Extracts the string content from the current `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>) -> Result<String, TuringMachineError> {
    next_pair(pairs).map(as_string)
}

/// Checks if a given section has already been declared.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), TuringMachineError> {
    if matches!(rule, Rule::EOI) {
        return Ok(());
    }

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, TuringMachineError> {
    value.ok_or_else(|| TuringMachineError::ValidationError(format!("Missing '{name}' section")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transition;

    const FLIP: &str = r#"
name: Flip 0 to 1
states: q0, q1, halt
alphabet: 0, 1, _
start: q0
accept: halt
rules:
  q0:
    0 -> 1, R, q1
  q1:
    _ -> _, N, halt
"#;

    #[test]
    fn test_parse_simple_program() {
        let definition = parse(FLIP).unwrap();

        assert_eq!(definition.name(), "Flip 0 to 1");
        assert_eq!(definition.start_state(), "q0");
        assert_eq!(definition.accept_state(), "halt");
        assert_eq!(definition.reject_state(), None);
        assert_eq!(definition.states().len(), 3);
        assert_eq!(definition.alphabet().len(), 3);
        assert_eq!(
            definition.transition("q0", '0'),
            Some(&Transition {
                next_state: "q1".into(),
                write: '1',
                direction: Direction::Right,
            })
        );
    }

    #[test]
    fn test_parse_infers_states_and_alphabet() {
        let input = r#"
name: Inferred
accept: done
reject: no
rules:
  scan:
    a, R, scan      # keep scanning
    _, N, done
    b -> c, <, no
  done:
"#;

        let definition = parse(input).unwrap();

        assert_eq!(definition.start_state(), "scan");
        assert_eq!(definition.reject_state(), Some("no"));
        assert_eq!(
            definition.states().iter().cloned().collect::<Vec<_>>(),
            vec!["done", "no", "scan"]
        );
        assert_eq!(
            definition.alphabet().iter().copied().collect::<Vec<_>>(),
            vec!['_', 'a', 'b', 'c']
        );
        assert_eq!(definition.transition("scan", 'a').unwrap().write, 'a');
        assert_eq!(
            definition.transition("scan", 'b').unwrap().direction,
            Direction::Left
        );
    }

    #[test]
    fn test_parse_optional_settings() {
        let input = r#"
name: Settings
blank: '.'
max_steps: 25
padding: 64
input: 0011
accept: halt
rules:
  q0:
    . -> 'x', S, halt
"#;

        let definition = parse(input).unwrap();

        assert_eq!(definition.blank(), '.');
        assert_eq!(definition.max_steps(), 25);
        assert_eq!(definition.tape_padding(), 64);
        assert_eq!(definition.sample_input(), "0011");
        assert_eq!(definition.transition("q0", '.').unwrap().write, 'x');
    }

    #[test]
    fn test_parse_duplicate_section() {
        let input = r#"
name: First Name
name: Second Name
accept: halt
rules:
  q0:
    a -> b, R, halt
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, TuringMachineError::ParseError(_)));
        assert!(error
            .to_string()
            .contains("Duplicate \"name:\" declaration"));
    }

    #[test]
    fn test_parse_missing_name() {
        let input = r#"
accept: halt
rules:
  q0:
    a -> b, R, halt
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing 'name' section"
        );
    }

    #[test]
    fn test_parse_missing_accept() {
        let input = r#"
name: No Accept
rules:
  q0:
    a -> b, R, halt
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing 'accept' section"
        );
    }

    #[test]
    fn test_parse_missing_rules() {
        let input = r#"
name: Missing Rules
accept: halt
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, TuringMachineError::ParseError(_)));
    }

    #[test]
    fn test_parse_duplicate_state_block() {
        let input = r#"
name: Duplicate Block
accept: halt
rules:
  q0:
    a -> b, R, halt
  q0:
    b -> a, L, q0
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, TuringMachineError::ParseError(_)));
        assert!(error.to_string().contains("Duplicate state block: q0"));
    }

    #[test]
    fn test_parse_duplicate_transition() {
        let input = r#"
name: Duplicate Transition
accept: halt
rules:
  q0:
    a -> b, R, halt
    a -> c, L, halt
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Duplicate transitions for: (q0, a)"
        );
    }

    #[test]
    fn test_parse_unsupported_direction() {
        let input = r#"
name: Bad Direction
accept: halt
rules:
  q0:
    a -> b, X, halt
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, TuringMachineError::ParseError(_)));
    }

    #[test]
    fn test_parse_reports_analysis_errors() {
        let input = r#"
name: Undeclared
states: q0, halt
accept: halt
rules:
  q0:
    a -> b, R, elsewhere
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, TuringMachineError::ValidationError(_)));
        assert!(error.to_string().contains("elsewhere"));
    }

    #[test]
    fn test_parse_rejects_oversized_input() {
        let input = "#".repeat(MAX_PROGRAM_SIZE + 1);
        let error = parse(&input).unwrap_err();
        assert!(error.to_string().contains("too large"));
    }
}
