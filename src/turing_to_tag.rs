//! Reduction from a two-symbol Turing machine to a tag system with deletion number 2.
//!
//! A configuration `(k, left, right, head)` becomes the tag tape
//!
//! ```text
//! H_k:1 H_k:0 (L_k:1 L_k:0){left} (R_k:1 R_k:0){right}
//! ```
//!
//! with the leading `H_k:1` dropped when the head reads `0`. Because two symbols are deleted
//! per step, the digit of every symbol the tag system actually reads equals the head
//! symbol, and the left and right numbers are counted in unary. One Turing step takes a
//! full pass over the tape with the `:z` symbols and a second pass with the bare symbols;
//! the tape is back in the shape above once no bare or relay symbol is left.

use indexmap::IndexMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::machine::{TransitionTable, TuringMachine};
use crate::tag::{Production, TagSystem, TagTransition, DEFAULT_DELETION_NUMBER};
use crate::types::{
    ChainError, Direction, StateId, TapeTuple, TuringSymbol, MAX_TAG_TAPE_CELLS,
};

/// Which part of the Turing tape a tag symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Head,
    Left,
    Right,
}

impl Role {
    fn letter(self) -> char {
        match self {
            Role::Head => 'H',
            Role::Left => 'L',
            Role::Right => 'R',
        }
    }
}

/// The suffix of a tag symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// Produced in the first pass, expanded into a digit pair in the second.
    Bare,
    /// Settled symbol carrying the head digit it was read under.
    Digit(TuringSymbol),
    /// Carries a freshly written `1` across the head when the head moves left.
    Relay,
}

/// A tag symbol of the Turing encoding, rendered as `H_3:1`, `L_0` or `R_2*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSymbol {
    pub role: Role,
    pub state: StateId,
    pub mark: Mark,
}

impl CellSymbol {
    pub fn new(role: Role, state: StateId, mark: Mark) -> Self {
        Self { role, state, mark }
    }

    pub fn digit(role: Role, state: StateId, digit: TuringSymbol) -> Self {
        Self::new(role, state, Mark::Digit(digit))
    }

    pub fn bare(role: Role, state: StateId) -> Self {
        Self::new(role, state, Mark::Bare)
    }

    pub fn relay(state: StateId) -> Self {
        Self::new(Role::Right, state, Mark::Relay)
    }

    pub fn is_digit(&self) -> bool {
        matches!(self.mark, Mark::Digit(_))
    }

    /// The `:1`, `:0` pair that encodes one cell of this role.
    fn pair(role: Role, state: StateId) -> [Self; 2] {
        [
            Self::digit(role, state, TuringSymbol::One),
            Self::digit(role, state, TuringSymbol::Zero),
        ]
    }
}

impl fmt::Display for CellSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.role.letter(), self.state)?;
        match self.mark {
            Mark::Bare => Ok(()),
            Mark::Digit(digit) => write!(f, ":{}", digit),
            Mark::Relay => write!(f, "*"),
        }
    }
}

/// Builds the tag transition simulating `table`.
///
/// For every state `k` the alphabet is, in this order: `H_k:0 L_k:0 R_k:0 H_k:1 L_k:1
/// R_k:1 R_k* H_k L_k R_k`.
pub fn table_to_tag_transition(table: &TransitionTable) -> TagTransition<CellSymbol> {
    let mut transition = IndexMap::with_capacity(table.len() * 10);

    for state in table.iter() {
        let k = state.state;

        for read in [TuringSymbol::Zero, TuringSymbol::One] {
            let t = state.on(read);
            let next = t.next_state;

            let mut head: Production<CellSymbol> = Vec::new();
            if t.direction == Direction::Left && t.write.is_one() {
                head.extend([CellSymbol::relay(next); 2]);
            }
            if read == TuringSymbol::Zero {
                head.push(CellSymbol::bare(Role::Head, next));
            }
            head.push(CellSymbol::bare(Role::Head, next));
            if t.direction == Direction::Right && t.write.is_one() {
                head.extend([CellSymbol::bare(Role::Left, next); 2]);
            }
            transition.insert(CellSymbol::digit(Role::Head, k, read), head);

            // Moving right doubles the left number, moving left doubles the right one.
            let left_copies = if t.direction == Direction::Right { 4 } else { 1 };
            transition.insert(
                CellSymbol::digit(Role::Left, k, read),
                vec![CellSymbol::bare(Role::Left, next); left_copies],
            );

            let right_copies = if t.direction == Direction::Left { 4 } else { 1 };
            transition.insert(
                CellSymbol::digit(Role::Right, k, read),
                vec![CellSymbol::bare(Role::Right, next); right_copies],
            );
        }

        transition.insert(
            CellSymbol::relay(k),
            vec![CellSymbol::bare(Role::Right, k); 2],
        );
        for role in [Role::Head, Role::Left, Role::Right] {
            transition.insert(
                CellSymbol::bare(role, k),
                CellSymbol::pair(role, k).to_vec(),
            );
        }
    }

    transition
}

/// Encodes a tape tuple as a tag tape.
///
/// The encoding is unary in both tape numbers, so tuples spanning more than
/// `MAX_TAG_TAPE_CELLS` cells are rejected with `TapeOverflow`.
pub fn tape_tuple_to_tag_tape(tuple: &TapeTuple) -> Result<VecDeque<CellSymbol>, ChainError> {
    let k = tuple.state;
    let cells = tuple
        .left_number
        .checked_add(tuple.right_number)
        .and_then(|n| n.checked_add(1))
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n <= MAX_TAG_TAPE_CELLS)
        .ok_or_else(|| {
            let cells = tuple.left_number.saturating_add(tuple.right_number);
            ChainError::TapeOverflow(usize::try_from(cells).unwrap_or(usize::MAX))
        })?;
    let mut tape = VecDeque::with_capacity(2 * cells);

    tape.extend(CellSymbol::pair(Role::Head, k));
    for _ in 0..tuple.left_number {
        tape.extend(CellSymbol::pair(Role::Left, k));
    }
    for _ in 0..tuple.right_number {
        tape.extend(CellSymbol::pair(Role::Right, k));
    }

    if tuple.head == TuringSymbol::Zero {
        tape.pop_front();
    }

    Ok(tape)
}

/// Encodes the current configuration of a Turing machine as a tag tape.
pub fn machine_to_tag_tape(machine: &TuringMachine) -> Result<VecDeque<CellSymbol>, ChainError> {
    tape_tuple_to_tag_tape(&machine.tape_tuple()?)
}

/// Builds a tag system equivalent to the current configuration of `machine`.
pub fn machine_to_tag_system(machine: &TuringMachine) -> Result<TagSystem<CellSymbol>, ChainError> {
    let transition = table_to_tag_transition(machine.table());
    let tape = machine_to_tag_tape(machine)?;
    tracing::debug!(
        alphabet = transition.len(),
        tape = tape.len(),
        "encoded turing machine as tag system"
    );

    Ok(TagSystem::new(transition, DEFAULT_DELETION_NUMBER, tape))
}

/// Returns `true` once the tag system has finished simulating a Turing step, i.e. every
/// symbol on its tape is digit-tagged.
pub fn is_step_passed(tag: &TagSystem<CellSymbol>) -> bool {
    tag.tape().iter().all(CellSymbol::is_digit)
}

/// Decodes a settled tag tape back into a tape tuple.
///
/// Fails with `PreconditionViolated` unless every symbol is digit-tagged.
pub fn tag_tape_to_tape_tuple(tape: &VecDeque<CellSymbol>) -> Result<TapeTuple, ChainError> {
    if let Some(symbol) = tape.iter().find(|s| !s.is_digit()) {
        return Err(ChainError::PreconditionViolated(format!(
            "tag tape still holds transitional symbol {symbol}"
        )));
    }
    let Some(first) = tape.front() else {
        return Err(ChainError::PreconditionViolated(
            "tag tape is empty".to_string(),
        ));
    };
    let head = match (first.role, first.mark) {
        (Role::Head, Mark::Digit(head)) => head,
        _ => {
            return Err(ChainError::MalformedEncoding(format!(
                "tag tape starts with {first} instead of a head symbol"
            )))
        }
    };

    let state = first.state;
    let count = |role| {
        let zero = CellSymbol::digit(role, state, TuringSymbol::Zero);
        tape.iter().filter(|s| **s == zero).count() as u64
    };

    Ok(TapeTuple {
        state,
        left_number: count(Role::Left),
        right_number: count(Role::Right),
        head,
    })
}

/// Decodes a settled tag system into a Turing machine running `table`.
pub fn tag_system_to_machine(
    tag: &TagSystem<CellSymbol>,
    table: Arc<TransitionTable>,
) -> Result<TuringMachine, ChainError> {
    let tuple = tag_tape_to_tape_tuple(tag.tape())?;
    Ok(TuringMachine::new(table, tuple))
}
