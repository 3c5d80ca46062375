//! This module provides functions for analyzing machine definitions to detect errors and
//! inconsistencies before execution: an empty table, an undeclared initial state, and
//! transitions into undeclared states. Unreachable states are reported but not rejected.

use crate::types::{ChainError, Program, StateId};
use std::collections::HashSet;

/// Represents the problems that can be found during the analysis of a machine definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// Indicates that the initial state is not declared in the table.
    InvalidStartState(StateId),
    /// Indicates that transitions reference states that are not declared in the table.
    UndefinedNextStates(Vec<String>),
    /// Indicates states that are declared but cannot be reached from the initial state.
    UnreachableStates(Vec<StateId>),
    /// Indicates structural problems with the definition.
    StructuralError(String),
}

impl From<AnalysisError> for ChainError {
    /// Converts an `AnalysisError` into a `ChainError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidStartState(state) => {
                ChainError::ValidationError(format!("Invalid start state: {}", state))
            }
            AnalysisError::UndefinedNextStates(transitions) => ChainError::ValidationError(
                format!("Transitions reference undefined states: {:?}", transitions),
            ),
            AnalysisError::UnreachableStates(states) => ChainError::ValidationError(format!(
                "Unreachable states detected: {:?}",
                states
            )),
            AnalysisError::StructuralError(msg) => ChainError::ValidationError(msg),
        }
    }
}

/// Analyzes a `Program` for structural and logical errors.
///
/// Unreachable states are logged as a warning and do not fail the analysis.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(ChainError::ValidationError)` for the first violated rule.
pub fn analyze(program: &Program) -> Result<(), ChainError> {
    let errors = [
        check_structure,
        check_valid_start_state,
        check_undefined_next_states,
    ]
    .iter()
    .filter_map(|f| f(program).err())
    .collect::<Vec<_>>();

    if let Some(first_error) = errors.into_iter().next() {
        return Err(first_error.into());
    }

    if let Err(AnalysisError::UnreachableStates(states)) = check_unreachable_states(program) {
        tracing::warn!(program = %program.name, ?states, "unreachable states");
    }

    Ok(())
}

/// Checks that the table declares at least one state.
fn check_structure(program: &Program) -> Result<(), AnalysisError> {
    if program.table.is_empty() {
        return Err(AnalysisError::StructuralError(
            "No states defined".to_string(),
        ));
    }

    Ok(())
}

/// Checks whether the initial state is declared in the table.
fn check_valid_start_state(program: &Program) -> Result<(), AnalysisError> {
    if !program.table.contains(program.initial_state()) {
        return Err(AnalysisError::InvalidStartState(program.initial_state()));
    }

    Ok(())
}

/// Checks that all `next_state` references point to declared states. A two-symbol machine
/// has no implicit halt state.
fn check_undefined_next_states(program: &Program) -> Result<(), AnalysisError> {
    let mut undefined_transitions = Vec::new();
    for state in program.table.iter() {
        for (read, transition) in state.transitions.iter().enumerate() {
            if !program.table.contains(transition.next_state) {
                undefined_transitions.push(format!(
                    "{}[{}] -> {}",
                    state.state, read, transition.next_state
                ));
            }
        }
    }

    if !undefined_transitions.is_empty() {
        return Err(AnalysisError::UndefinedNextStates(undefined_transitions));
    }

    Ok(())
}

/// Checks for unreachable states by a depth-first traversal from the initial state.
pub fn check_unreachable_states(program: &Program) -> Result<(), AnalysisError> {
    let mut visited = HashSet::new();
    let mut queue = vec![program.initial_state()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Ok(transitions) = program.table.get(state) {
            for transition in &transitions.transitions {
                if !visited.contains(&transition.next_state) {
                    queue.push(transition.next_state);
                }
            }
        }
    }

    let unreachable: Vec<StateId> = program
        .table
        .iter()
        .map(|state| state.state)
        .filter(|state| !visited.contains(state))
        .collect();

    if !unreachable.is_empty() {
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::TransitionTable;
    use crate::types::{Direction, StateTransition, TapeTuple, Transition, TuringSymbol};
    use std::sync::Arc;

    fn create_test_program(initial_state: StateId, states: Vec<StateTransition>) -> Program {
        Program {
            name: "Test Program".to_string(),
            table: Arc::new(TransitionTable::new(states).unwrap()),
            tape: TapeTuple::new(initial_state, 0, 0, TuringSymbol::Zero),
        }
    }

    fn state(id: StateId, on_zero: StateId, on_one: StateId) -> StateTransition {
        StateTransition::new(
            id,
            Transition::new(TuringSymbol::One, Direction::Right, on_zero),
            Transition::new(TuringSymbol::Zero, Direction::Left, on_one),
        )
    }

    #[test]
    fn test_valid_program() {
        let program = create_test_program(0, vec![state(0, 1, 0), state(1, 0, 1)]);
        assert!(analyze(&program).is_ok());
        assert!(check_unreachable_states(&program).is_ok());
    }

    #[test]
    fn test_empty_table() {
        let program = create_test_program(0, vec![]);
        assert_eq!(
            analyze(&program),
            Err(ChainError::ValidationError("No states defined".to_string()))
        );
    }

    #[test]
    fn test_invalid_start_state() {
        let program = create_test_program(5, vec![state(0, 0, 0)]);
        assert_eq!(
            check_valid_start_state(&program),
            Err(AnalysisError::InvalidStartState(5))
        );
        assert!(analyze(&program).is_err());
    }

    #[test]
    fn test_undefined_next_states() {
        let program = create_test_program(0, vec![state(0, 0, 3)]);
        assert_eq!(
            check_undefined_next_states(&program),
            Err(AnalysisError::UndefinedNextStates(vec!["0[1] -> 3".to_string()]))
        );

        let error = analyze(&program).unwrap_err();
        assert!(error
            .to_string()
            .contains("Transitions reference undefined states"));
    }

    #[test]
    fn test_unreachable_states_only_warn() {
        let program = create_test_program(0, vec![state(0, 0, 0), state(1, 0, 1), state(2, 1, 2)]);
        assert_eq!(
            check_unreachable_states(&program),
            Err(AnalysisError::UnreachableStates(vec![1, 2]))
        );
        assert!(analyze(&program).is_ok());
    }
}
