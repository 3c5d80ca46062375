//! The two-symbol Turing tape.
//!
//! The tape is conceptually infinite and zero almost everywhere. Only a window of cells is
//! materialized: the window never keeps a `Zero` cell at an edge that the head has moved
//! away from, and it grows by one `Zero` cell whenever the head steps past an edge.

use std::collections::VecDeque;
use std::fmt;

use crate::types::{ChainError, Direction, StateId, TapeTuple, TuringSymbol};

/// Tape used by [`crate::TuringMachine`].
///
/// `head` is an absolute coordinate. `offset` is the absolute coordinate of the first
/// materialized cell, so `head - offset` is the index of the head inside `cells`.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: VecDeque<TuringSymbol>,
    head: isize,
    offset: isize,
}

impl Default for Tape {
    fn default() -> Self {
        Self {
            cells: VecDeque::from([TuringSymbol::Zero]),
            head: 0,
            offset: 0,
        }
    }
}

impl Tape {
    /// Builds the tape described by a tape tuple. The state is ignored.
    pub fn from_tuple(tuple: &TapeTuple) -> Self {
        let left_len = bit_length(tuple.left_number);
        let right_len = bit_length(tuple.right_number);
        let mut cells = VecDeque::with_capacity(left_len + right_len + 1);

        // Most significant bit lands furthest from the head.
        for bit in (0..left_len).rev() {
            cells.push_back(TuringSymbol::from_bit(tuple.left_number >> bit & 1 == 1));
        }
        cells.push_back(tuple.head);
        let mut right = tuple.right_number;
        for _ in 0..right_len {
            cells.push_back(TuringSymbol::from_bit(right & 1 == 1));
            right >>= 1;
        }

        Self {
            cells,
            head: left_len as isize,
            offset: 0,
        }
    }

    /// Builds a tape from raw cell contents with the head on `cells[head]`.
    ///
    /// Redundant `Zero` cells at either end are dropped. An empty slice is an all-zero tape.
    pub fn from_cells(cells: &[TuringSymbol], head: usize) -> Result<Self, ChainError> {
        if cells.is_empty() {
            return Ok(Self::default());
        }
        if head >= cells.len() {
            return Err(ChainError::ValidationError(format!(
                "Head position {} is outside of a tape with {} cells",
                head,
                cells.len()
            )));
        }

        let left = &cells[..head];
        let first_one = left.iter().position(|c| c.is_one()).unwrap_or(left.len());
        let right = &cells[head + 1..];
        let last_one = right.iter().rposition(|c| c.is_one()).map_or(0, |i| i + 1);

        let mut window: VecDeque<TuringSymbol> = left[first_one..].iter().copied().collect();
        let position = window.len() as isize;
        window.push_back(cells[head]);
        window.extend(right[..last_one].iter().copied());

        Ok(Self {
            cells: window,
            head: position,
            offset: 0,
        })
    }

    fn index(&self) -> usize {
        head_index(self.head, self.offset)
    }

    /// Returns the symbol currently under the head.
    pub fn head_symbol(&self) -> TuringSymbol {
        self.cells[self.index()]
    }

    /// Overwrites the symbol under the head.
    pub fn write(&mut self, symbol: TuringSymbol) {
        let index = self.index();
        self.cells[index] = symbol;
    }

    /// Moves the head one cell in `direction`, keeping the window canonical.
    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
        }
    }

    fn move_left(&mut self) {
        if self.index() + 1 == self.cells.len() && self.cells.back() == Some(&TuringSymbol::Zero)
        {
            self.cells.pop_back();
        }
        self.head -= 1;
        if self.head < self.offset {
            self.offset -= 1;
            self.cells.push_front(TuringSymbol::Zero);
        }
    }

    fn move_right(&mut self) {
        if self.head == self.offset && self.cells.front() == Some(&TuringSymbol::Zero) {
            self.cells.pop_front();
            self.offset += 1;
        }
        self.head += 1;
        if self.index() >= self.cells.len() {
            self.cells.push_back(TuringSymbol::Zero);
        }
    }

    /// Absolute head coordinate, relative to where the head started.
    pub fn head(&self) -> isize {
        self.head
    }

    /// Absolute coordinate of the first materialized cell.
    pub fn offset(&self) -> isize {
        self.offset
    }

    /// The materialized window.
    pub fn cells(&self) -> impl Iterator<Item = TuringSymbol> + '_ {
        self.cells.iter().copied()
    }

    /// Cells left of the head read as a binary number, nearest cell least significant.
    pub fn left_number(&self) -> Result<u64, ChainError> {
        let index = self.index();
        self.cells
            .iter()
            .take(index)
            .try_fold(0u64, |acc, cell| {
                acc.checked_mul(2).map(|acc| acc | cell.index() as u64)
            })
            .ok_or(ChainError::TapeOverflow(index))
    }

    /// Cells right of the head; the cell at distance `d` weighs `2^(d-1)`.
    pub fn right_number(&self) -> Result<u64, ChainError> {
        let index = self.index();
        let width = self.cells.len() - index - 1;
        self.cells
            .iter()
            .skip(index + 1)
            .enumerate()
            .filter(|(_, cell)| cell.is_one())
            .try_fold(0u64, |acc, (distance, _)| {
                1u64.checked_shl(distance as u32).map(|bit| acc | bit)
            })
            .ok_or(ChainError::TapeOverflow(width))
    }

    /// Returns the tape tuple of this tape in the given state.
    pub fn to_tuple(&self, state: StateId) -> Result<TapeTuple, ChainError> {
        Ok(TapeTuple {
            state,
            left_number: self.left_number()?,
            right_number: self.right_number()?,
            head: self.head_symbol(),
        })
    }

    /// Significant cells left of the head, the head cell, and significant cells right of it.
    fn canonical(&self) -> (Vec<TuringSymbol>, TuringSymbol, Vec<TuringSymbol>) {
        let index = self.index();
        let left: Vec<_> = self
            .cells
            .iter()
            .take(index)
            .skip_while(|c| !c.is_one())
            .copied()
            .collect();
        let mut right: Vec<_> = self.cells.iter().skip(index + 1).copied().collect();
        while right.last() == Some(&TuringSymbol::Zero) {
            right.pop();
        }
        (left, self.head_symbol(), right)
    }
}

impl PartialEq for Tape {
    /// Two tapes are equal when they represent the same infinite tape around the head,
    /// regardless of how far the head has travelled.
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Tape {}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            write!(f, "{} ", cell)?;
        }
        writeln!(f)?;
        write!(f, "{}^", "  ".repeat(self.index()))
    }
}

fn bit_length(number: u64) -> usize {
    (u64::BITS - number.leading_zeros()) as usize
}

fn head_index(head: isize, offset: isize) -> usize {
    (head - offset) as usize
}
