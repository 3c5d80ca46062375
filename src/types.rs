//! This module defines the core data structures shared by every engine and reducer in the
//! crate: Turing symbols and transitions, the canonical tape tuple, cyclic symbols, step
//! outcomes, and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::machine::{TransitionTable, TuringMachine};
use crate::Rule;

/// The maximum allowed size for a machine definition in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The maximum number of steps `run()` executes before giving up.
pub const MAX_EXECUTION_STEPS: usize = 10000;
/// The default upper bound on elementary steps spent waiting for one predicate cycle.
pub const DEFAULT_MAX_CYCLE_STEPS: usize = 1_000_000;

/// Maximum number of Turing cells a tape tuple may span when encoded as a tag tape.
pub const MAX_TAG_TAPE_CELLS: usize = 1 << 24;

/// Identifier of a Turing machine state.
pub type StateId = u32;

/// A cell value on the two-symbol Turing tape.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TuringSymbol {
    #[default]
    Zero,
    One,
}

impl TuringSymbol {
    /// Index of the transition selected when this symbol is read.
    pub fn index(self) -> usize {
        match self {
            TuringSymbol::Zero => 0,
            TuringSymbol::One => 1,
        }
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit {
            TuringSymbol::One
        } else {
            TuringSymbol::Zero
        }
    }

    pub fn is_one(self) -> bool {
        self == TuringSymbol::One
    }
}

impl fmt::Display for TuringSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Represents the directions a Turing machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

/// A single transition rule: what to write, where to move, and which state comes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub write: TuringSymbol,
    pub direction: Direction,
    pub next_state: StateId,
}

impl Transition {
    pub fn new(write: TuringSymbol, direction: Direction, next_state: StateId) -> Self {
        Self {
            write,
            direction,
            next_state,
        }
    }
}

/// A state together with its two transitions, indexed by the symbol read
/// (`Zero` selects `transitions[0]`, `One` selects `transitions[1]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateTransition {
    pub state: StateId,
    pub transitions: [Transition; 2],
}

impl StateTransition {
    pub fn new(state: StateId, on_zero: Transition, on_one: Transition) -> Self {
        Self {
            state,
            transitions: [on_zero, on_one],
        }
    }

    /// Returns the transition taken when `read` is under the head.
    pub fn on(&self, read: TuringSymbol) -> &Transition {
        &self.transitions[read.index()]
    }
}

/// Canonical finite encoding of a Turing configuration.
///
/// `left_number` reads the cells left of the head as a binary number whose least
/// significant bit is the cell next to the head. `right_number` gives the cell at
/// distance `d` to the right of the head the weight `2^(d-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TapeTuple {
    pub state: StateId,
    pub left_number: u64,
    pub right_number: u64,
    pub head: TuringSymbol,
}

impl TapeTuple {
    pub fn new(state: StateId, left_number: u64, right_number: u64, head: TuringSymbol) -> Self {
        Self {
            state,
            left_number,
            right_number,
            head,
        }
    }
}

impl fmt::Display for TapeTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(state {}, left {}, right {}, head {})",
            self.state, self.left_number, self.right_number, self.head
        )
    }
}

/// Represents a parsed machine definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The name of the machine.
    pub name: String,
    /// The transition table; the first declared state is the initial state.
    pub table: Arc<TransitionTable>,
    /// The initial configuration.
    pub tape: TapeTuple,
}

impl Program {
    pub fn initial_state(&self) -> StateId {
        self.tape.state
    }

    /// Builds a machine in the initial configuration.
    pub fn machine(&self) -> TuringMachine {
        TuringMachine::new(Arc::clone(&self.table), self.tape)
    }

    pub fn state_count(&self) -> usize {
        self.table.len()
    }
}

/// A cell value on a cyclic tag tape.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CyclicSymbol {
    #[default]
    No,
    Yes,
}

impl fmt::Display for CyclicSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CyclicSymbol::No => write!(f, "0"),
            CyclicSymbol::Yes => write!(f, "1"),
        }
    }
}

/// Represents the outcome of a single elementary step of any engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The engine performed a step and can continue.
    Continue,
    /// The engine cannot step any further.
    Halt(Halt),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// Normal terminal condition, e.g. a tag head symbol without a production.
    Ok,

    Err(ChainError),
}

/// Represents the errors raised by engines, reducers, the synchronizer and the loader.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// A state id was looked up that the transition table does not declare.
    #[error("Undefined state: {0}")]
    UndefinedState(StateId),
    /// A tag symbol was looked up that the alphabet or dictionary does not contain.
    #[error("Undefined symbol: {0}")]
    UndefinedSymbol(String),
    /// The model at the given synchronizer level halted while it still had steps to take.
    #[error("Level {0} halted")]
    Halted(usize),
    /// An encoding does not agree with the dictionary used to decode it.
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),
    /// An operation was called before its precondition held.
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),
    /// A level did not satisfy its step-completion predicate within the configured budget.
    #[error("Level {level} did not complete a cycle within {limit} steps")]
    StepLimitExceeded { level: usize, limit: usize },
    /// A registered transform or predicate received a model of an unexpected type.
    #[error("Level {0} received a model of an unexpected type")]
    LevelTypeMismatch(usize),
    /// A tape holds more cells than the target representation can express.
    #[error("Tape of {0} cells exceeds the representable size")]
    TapeOverflow(usize),
    /// Indicates an error during the parsing of a machine definition.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error during the validation of a machine definition.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}
