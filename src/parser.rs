//! This module provides the parser for machine definitions, utilizing the `pest` crate.
//! It defines the grammar for `.tm` files and functions to parse the input into a `Program` struct.

use crate::{
    analyzer::analyze,
    machine::TransitionTable,
    tape::Tape,
    types::{
        ChainError, Direction, Program, StateId, StateTransition, TapeTuple, Transition,
        TuringSymbol,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;
use std::sync::Arc;

/// Derives a `PestParser` for the machine grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct MachineParser;

/// The initial tape as written in the definition, before the initial state is known.
enum InitialTape {
    Tuple(u64, u64, TuringSymbol),
    Cells(Vec<TuringSymbol>, usize),
}

/// Parses the given input string into a `Program` struct.
///
/// This is the main entry point for parsing machine definitions. The first declared state
/// becomes the initial state. The parsed program is validated before being returned.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed and validated.
/// * `Err(ChainError::ParseError)` if there are any syntax errors.
/// * `Err(ChainError::ValidationError)` if the program fails validation.
pub fn parse(input: &str) -> Result<Program, ChainError> {
    let root = MachineParser::parse(Rule::program, input.trim())
        .map_err(|e| ChainError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| ChainError::ValidationError("Empty machine definition".to_string()))?;

    let program = parse_program(root)?;

    analyze(&program)?;

    Ok(program)
}

/// Parses the top-level sections of a definition from a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<Program, ChainError> {
    let mut name: Option<String> = None;
    let mut tape: Option<InitialTape> = None;
    let mut states: Option<Vec<StateTransition>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_inner_string(p)?.trim().to_string()),
            Rule::tuple => {
                check_exclusive_rule(tape.as_ref(), vec!["tuple", "tape"], span)?;
                tape = Some(parse_tuple(p)?);
            }
            Rule::tape => {
                check_exclusive_rule(tape.as_ref(), vec!["tuple", "tape"], span)?;
                tape = Some(parse_cells(p)?);
            }
            Rule::rules => states = Some(parse_states(p)?),
            _ => {}
        }
    }

    let name = check_required_rule(name, vec!["name"])?;
    let states = check_required_rule(states, vec!["rules"])?;
    let tape = check_required_rule(tape, vec!["tuple", "tape"])?;

    let initial_state = states
        .first()
        .map(|state| state.state)
        .ok_or_else(|| ChainError::ValidationError("No states defined".to_string()))?;

    let tape = match tape {
        InitialTape::Tuple(left, right, head) => TapeTuple::new(initial_state, left, right, head),
        InitialTape::Cells(cells, head) => Tape::from_cells(&cells, head)?.to_tuple(initial_state)?,
    };

    Ok(Program {
        name,
        table: Arc::new(TransitionTable::new(states)?),
        tape,
    })
}

/// Parses `tuple: left, right, head`.
fn parse_tuple(pair: Pair<Rule>) -> Result<InitialTape, ChainError> {
    let mut pairs = pair.into_inner();
    let left = parse_number(next_pair(&mut pairs)?)?;
    let right = parse_number(next_pair(&mut pairs)?)?;
    let head = parse_bit(next_pair(&mut pairs)?);

    Ok(InitialTape::Tuple(left, right, head))
}

/// Parses `tape: 1 0 [1] 1`. Exactly one cell may be bracketed.
fn parse_cells(pair: Pair<Rule>) -> Result<InitialTape, ChainError> {
    let mut cells = Vec::new();
    let mut head = None;

    // Rule: tape > [head_cell > bit | bit]
    for cell in pair.into_inner() {
        match cell.as_rule() {
            Rule::head_cell => {
                if head.is_some() {
                    return Err(parse_error("Only one head cell is allowed", cell.as_span()));
                }
                head = Some(cells.len());
                cells.push(parse_bit(next_pair(&mut cell.into_inner())?));
            }
            Rule::bit => cells.push(parse_bit(cell)),
            _ => {}
        }
    }

    Ok(InitialTape::Cells(cells, head.unwrap_or(0)))
}

/// Parses the `rules:` section. States keep their declaration order.
fn parse_states(pair: Pair<Rule>) -> Result<Vec<StateTransition>, ChainError> {
    let mut states = Vec::new();
    let mut declared = HashSet::new();

    for state_pair in pair.into_inner() {
        let span = state_pair.as_span();
        let state = parse_state(state_pair)?;

        if !declared.insert(state.state) {
            return Err(parse_error(
                &format!("Duplicate transition rule: {}", state.state),
                span,
            ));
        }

        states.push(state);
    }

    Ok(states)
}

/// Parses one state and requires exactly one action per read symbol.
fn parse_state(pair: Pair<Rule>) -> Result<StateTransition, ChainError> {
    let mut pairs = pair.into_inner();
    let state: StateId = parse_number(next_pair(&mut pairs)?)?;
    let mut actions: [Option<Transition>; 2] = [None, None];

    for action in pairs {
        let span = action.as_span();
        let (read, transition) = parse_action(action)?;

        let slot = &mut actions[read.index()];
        if slot.is_some() {
            return Err(parse_error(
                &format!("Duplicate action for {read} in state {state}"),
                span,
            ));
        }
        *slot = Some(transition);
    }

    match actions {
        [Some(on_zero), Some(on_one)] => Ok(StateTransition::new(state, on_zero, on_one)),
        [None, _] => Err(missing_action(state, TuringSymbol::Zero)),
        [_, None] => Err(missing_action(state, TuringSymbol::One)),
    }
}

/// Parses `read -> write, direction, next`. When `write` is omitted the read symbol is kept.
fn parse_action(pair: Pair<Rule>) -> Result<(TuringSymbol, Transition), ChainError> {
    let mut pairs = pair.into_inner();
    let read = parse_bit(next_pair(&mut pairs)?);

    let write = match pairs.peek().map(|p| p.as_rule()) {
        Some(Rule::write) => parse_bit(next_pair(&mut pairs)?),
        _ => read,
    };

    let direction = parse_direction(next_pair(&mut pairs)?)?;
    let next_state = parse_number(next_pair(&mut pairs)?)?;

    Ok((read, Transition::new(write, direction, next_state)))
}

/// Parses a single direction from a `Pair<Rule::direction>`.
///
/// Supports '<' or 'L' for Left and '>' or 'R' for Right.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, ChainError> {
    let span = pair.as_span();
    match pair.as_str() {
        "<" | "L" => Ok(Direction::Left),
        ">" | "R" => Ok(Direction::Right),
        _ => Err(parse_error(
            &format!("Unsupported direction: {}", pair.as_str()),
            span,
        )),
    }
}

fn parse_bit(pair: Pair<Rule>) -> TuringSymbol {
    TuringSymbol::from_bit(pair.as_str() == "1")
}

fn parse_number<T: std::str::FromStr>(pair: Pair<Rule>) -> Result<T, ChainError> {
    pair.as_str()
        .parse()
        .map_err(|_| parse_error(&format!("Number out of range: {}", pair.as_str()), pair.as_span()))
}

/// Extracts the inner string content from a `Pair`.
fn parse_inner_string(pair: Pair<Rule>) -> Result<String, ChainError> {
    Ok(next_pair(&mut pair.into_inner())?.as_str().into())
}

/// Returns the next pair; the grammar guarantees its presence.
fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>) -> Result<Pair<'i, Rule>, ChainError> {
    pairs
        .next()
        .ok_or_else(|| ChainError::ValidationError("Unexpected end of definition".to_string()))
}

/// Creates a `ChainError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> ChainError {
    ChainError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

fn missing_action(state: StateId, read: TuringSymbol) -> ChainError {
    ChainError::ValidationError(format!("State {state} has no action for {read}"))
}

/// Checks if a given rule has already been declared, ensuring uniqueness for top-level sections.
fn check_unique_rule(rule: Rule, span: Span, seen: &mut HashSet<Rule>) -> Result<(), ChainError> {
    if !matches!(rule, Rule::name | Rule::tuple | Rule::tape | Rule::rules) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if an exclusive rule (`tuple` vs. `tape`) has been violated.
fn check_exclusive_rule<T>(value: Option<T>, names: Vec<&str>, span: Span) -> Result<(), ChainError> {
    if value.is_some() {
        return Err(parse_error(
            &format!("Only one of {} is allowed", format_rules(names)),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required rule is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, names: Vec<&str>) -> Result<T, ChainError> {
    value.ok_or_else(|| {
        ChainError::ValidationError(format!("Missing {} section", format_rules(names)))
    })
}

/// Formats a list of rule names into a human-readable string for error messages.
fn format_rules(names: Vec<&str>) -> String {
    names
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use TuringSymbol::{One, Zero};

    #[test]
    fn test_parse_simple_program() {
        let input = r#"
name: Inverter
tuple: 5, 21, 1
rules:
  0:
    0 -> 1, R, 0
    1 -> 0, R, 0
"#;

        let program = parse(input).unwrap();
        assert_eq!(program.name, "Inverter");
        assert_eq!(program.initial_state(), 0);
        assert_eq!(program.tape, TapeTuple::new(0, 5, 21, One));
        assert_eq!(
            *program.table.get(0).unwrap().on(Zero),
            Transition::new(One, Direction::Right, 0)
        );
    }

    #[test]
    fn test_parse_raw_tape_and_comments() {
        let input = r#"
# Walks left writing ones.
name: Shuttle   # two states
tape: 1 0 [0] 1 1
rules:
  3:
    0 -> 1, <, 7
    1, >, 3
  7:
    0 -> 1, R, 3
    1 -> 1, L, 7
"#;

        let program = parse(input).unwrap();
        assert_eq!(program.name, "Shuttle");
        assert_eq!(program.initial_state(), 3);
        assert_eq!(program.tape, TapeTuple::new(3, 0b10, 0b11, Zero));
        assert_eq!(
            *program.table.get(3).unwrap().on(One),
            Transition::new(One, Direction::Right, 3)
        );
        let order: Vec<_> = program.table.iter().map(|s| s.state).collect();
        assert_eq!(order, vec![3, 7]);
    }

    #[test]
    fn test_parse_tape_defaults_head_to_first_cell() {
        let input = r#"
name: Default Head
tape: 1 1 0 1
rules:
  0:
    0 -> 1, R, 0
    1 -> 0, R, 0
"#;

        let program = parse(input).unwrap();
        assert_eq!(program.tape, TapeTuple::new(0, 0, 0b101, One));
    }

    #[test]
    fn test_parse_duplicate_section() {
        let input = r#"
name: First Name
name: Second Name
tuple: 0, 0, 0
rules:
  0:
    0 -> 1, R, 0
    1 -> 0, R, 0
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, ChainError::ParseError(_)));
        assert!(error.to_string().contains("Duplicate \"name:\" declaration"));
    }

    #[test]
    fn test_parse_exclusive_tuple_and_tape() {
        let input = r#"
name: Exclusive
tuple: 0, 0, 0
tape: [1]
rules:
  0:
    0 -> 1, R, 0
    1 -> 0, R, 0
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, ChainError::ParseError(_)));
        assert!(error
            .to_string()
            .contains("Only one of 'tuple' or 'tape' is allowed"));
    }

    #[test]
    fn test_parse_missing_sections() {
        let input = r#"
name: Missing Tape
rules:
  0:
    0 -> 1, R, 0
    1 -> 0, R, 0
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing 'tuple' or 'tape' section"
        );

        let error = parse("name: Missing Rules\ntuple: 1, 2, 0").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing 'rules' section"
        );
    }

    #[test]
    fn test_parse_duplicate_state() {
        let input = r#"
name: Duplicate State
tuple: 0, 0, 0
rules:
  0:
    0 -> 1, R, 0
    1 -> 0, R, 0
  0:
    0 -> 1, L, 0
    1 -> 0, L, 0
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, ChainError::ParseError(_)));
        assert!(error.to_string().contains("Duplicate transition rule: 0"));
    }

    #[test]
    fn test_parse_incomplete_state() {
        let input = r#"
name: Incomplete
tuple: 0, 0, 0
rules:
  0:
    0 -> 1, R, 0
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error,
            ChainError::ValidationError("State 0 has no action for 1".to_string())
        );
    }

    #[test]
    fn test_parse_duplicate_action() {
        let input = r#"
name: Duplicate Action
tuple: 0, 0, 0
rules:
  0:
    0 -> 1, R, 0
    0 -> 0, L, 0
    1 -> 0, R, 0
"#;
        let error = parse(input).unwrap_err();
        assert!(error.to_string().contains("Duplicate action for 0 in state 0"));
    }

    #[test]
    fn test_parse_two_head_cells() {
        let input = r#"
name: Two Heads
tape: [1] 0 [1]
rules:
  0:
    0 -> 1, R, 0
    1 -> 0, R, 0
"#;
        let error = parse(input).unwrap_err();
        assert!(error.to_string().contains("Only one head cell is allowed"));
    }

    #[test]
    fn test_parse_unsupported_direction() {
        let input = r#"
name: Bad Direction
tuple: 0, 0, 0
rules:
  0:
    0 -> 1, S, 0
    1 -> 0, R, 0
"#;
        assert!(matches!(parse(input), Err(ChainError::ParseError(_))));
    }

    #[test]
    fn test_parse_number_out_of_range() {
        let input = r#"
name: Too Wide
tuple: 18446744073709551616, 0, 0
rules:
  0:
    0 -> 1, R, 0
    1 -> 0, R, 0
"#;
        let error = parse(input).unwrap_err();
        assert!(error.to_string().contains("Number out of range"));
    }
}
