//! This module defines the two-symbol Turing machine, its transition table, and the
//! [`Machine`] trait every engine in the crate implements.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::tape::Tape;
use crate::types::{
    ChainError, Halt, StateId, StateTransition, Step, TapeTuple, TuringSymbol,
    MAX_EXECUTION_STEPS,
};

/// An engine that advances in elementary steps.
pub trait Machine {
    /// Executes one elementary step.
    fn step(&mut self) -> Step;

    /// Returns the number of elementary steps executed so far.
    fn step_count(&self) -> usize;
}

/// Read-only mapping from state id to its pair of transitions.
///
/// States keep their declaration order, which fixes the order of everything derived from
/// the table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionTable {
    states: IndexMap<StateId, StateTransition>,
}

impl TransitionTable {
    /// Creates a table, rejecting duplicate state ids.
    pub fn new(states: impl IntoIterator<Item = StateTransition>) -> Result<Self, ChainError> {
        let mut table = IndexMap::new();
        for state in states {
            if table.insert(state.state, state).is_some() {
                return Err(ChainError::ValidationError(format!(
                    "Duplicate state: {}",
                    state.state
                )));
            }
        }

        Ok(Self { states: table })
    }

    /// Looks up a state. An undeclared state is a configuration error.
    pub fn get(&self, state: StateId) -> Result<&StateTransition, ChainError> {
        self.states
            .get(&state)
            .ok_or(ChainError::UndefinedState(state))
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.states.contains_key(&state)
    }

    /// Iterates over the states in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &StateTransition> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Represents a two-symbol Turing machine.
///
/// The transition table is shared and never mutated; the tape and the current state are
/// owned and change on every step.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    state: StateId,
    tape: Tape,
    table: Arc<TransitionTable>,
    initial: TapeTuple,
    step_count: usize,
}

impl TuringMachine {
    /// Creates a machine in the configuration described by `tuple`.
    pub fn new(table: Arc<TransitionTable>, tuple: TapeTuple) -> Self {
        Self {
            state: tuple.state,
            tape: Tape::from_tuple(&tuple),
            table,
            initial: tuple,
            step_count: 0,
        }
    }

    /// Creates a machine from raw tape contents with the head on `cells[head]`.
    pub fn from_cells(
        table: Arc<TransitionTable>,
        state: StateId,
        cells: &[TuringSymbol],
        head: usize,
    ) -> Result<Self, ChainError> {
        let tape = Tape::from_cells(cells, head)?;
        let initial = tape.to_tuple(state)?;

        Ok(Self {
            state,
            tape,
            table,
            initial,
            step_count: 0,
        })
    }

    /// Executes a single step: read, write, move, change state.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` after a successful step.
    /// * `Step::Halt(Halt::Err(ChainError::UndefinedState))` if the current state is not in
    ///   the table. The machine is left untouched.
    pub fn step(&mut self) -> Step {
        let read = self.tape.head_symbol();
        let transition = match self.table.get(self.state) {
            Ok(state) => *state.on(read),
            Err(e) => return Step::Halt(Halt::Err(e)),
        };

        self.tape.write(transition.write);
        self.tape.shift(transition.direction);
        self.state = transition.next_state;
        self.step_count += 1;

        Step::Continue
    }

    /// Runs the machine until it halts or reaches `MAX_EXECUTION_STEPS`.
    pub fn run(&mut self) -> Step {
        for _ in 0..MAX_EXECUTION_STEPS {
            match self.step() {
                Step::Continue => continue,
                halt => return halt,
            }
        }

        Step::Halt(Halt::Ok)
    }

    /// Resets the machine to the configuration it was created with.
    pub fn reset(&mut self) {
        self.state = self.initial.state;
        self.tape = Tape::from_tuple(&self.initial);
        self.step_count = 0;
    }

    /// Returns the current state.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// Returns the tuple the machine was created with.
    pub fn initial(&self) -> &TapeTuple {
        &self.initial
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn table(&self) -> &Arc<TransitionTable> {
        &self.table
    }

    /// Returns the total number of steps executed.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// A machine is halted when its current state is not declared in the table.
    pub fn is_halted(&self) -> bool {
        !self.table.contains(self.state)
    }

    /// Returns the canonical tuple of the current configuration.
    pub fn tape_tuple(&self) -> Result<TapeTuple, ChainError> {
        self.tape.to_tuple(self.state)
    }

    /// Replaces the current configuration. The step count is kept.
    pub fn set_tape_tuple(&mut self, tuple: TapeTuple) {
        self.state = tuple.state;
        self.tape = Tape::from_tuple(&tuple);
    }
}

impl Machine for TuringMachine {
    fn step(&mut self) -> Step {
        TuringMachine::step(self)
    }

    fn step_count(&self) -> usize {
        self.step_count
    }
}

impl PartialEq for TuringMachine {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.tape == other.tape && self.table == other.table
    }
}

impl fmt::Display for TuringMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(tuple) = self.tape_tuple() {
            writeln!(f, "{}", tuple)?;
        }
        writeln!(f, "{}", self.tape)?;
        write!(f, "state: {}", self.state)
    }
}
