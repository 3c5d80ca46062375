//! Tag systems over an arbitrary finite alphabet.
//!
//! Each step reads the symbol at the front of the tape, appends that symbol's production
//! to the back, and deletes a fixed number of symbols from the front.

use indexmap::IndexMap;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::machine::Machine;
use crate::types::{Halt, Step, MAX_EXECUTION_STEPS};

/// The default number of symbols deleted per step.
pub const DEFAULT_DELETION_NUMBER: usize = 2;

/// An ordered sequence of symbols appended to the tape.
pub type Production<S> = Vec<S>;

/// Maps every non-halting symbol to its production. Keys keep their insertion order, which
/// is the enumeration order of the alphabet.
pub type TagTransition<S> = IndexMap<S, Production<S>>;

/// Represents a tag system.
#[derive(Debug, Clone)]
pub struct TagSystem<S> {
    transition: Arc<TagTransition<S>>,
    tape: VecDeque<S>,
    num: usize,
    step_count: usize,
}

impl<S> TagSystem<S>
where
    S: Clone + Eq + Hash,
{
    /// Creates a tag system deleting `num` symbols per step.
    pub fn new(
        transition: impl Into<Arc<TagTransition<S>>>,
        num: usize,
        tape: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            transition: transition.into(),
            tape: tape.into_iter().collect(),
            num,
            step_count: 0,
        }
    }

    /// Executes one step.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` after appending a production and deleting `num` symbols.
    /// * `Step::Halt(Halt::Ok)` if the tape is empty or its front symbol has no production.
    pub fn step(&mut self) -> Step {
        let transition = Arc::clone(&self.transition);
        let Some(production) = self.tape.front().and_then(|head| transition.get(head)) else {
            return Step::Halt(Halt::Ok);
        };

        // Deletion runs over the whole queue, so a short tape also loses appended symbols.
        self.tape.extend(production.iter().cloned());
        let count = self.num.min(self.tape.len());
        self.tape.drain(..count);
        self.step_count += 1;

        Step::Continue
    }

    /// Runs until the system halts or reaches `MAX_EXECUTION_STEPS`.
    pub fn run(&mut self) -> Step {
        for _ in 0..MAX_EXECUTION_STEPS {
            match self.step() {
                Step::Continue => continue,
                halt => return halt,
            }
        }

        Step::Halt(Halt::Ok)
    }

    /// The alphabet, in enumeration order: every symbol that owns a production.
    pub fn alphabet(&self) -> impl Iterator<Item = &S> {
        self.transition.keys()
    }

    /// Returns `true` if the front symbol has no production.
    pub fn is_halted(&self) -> bool {
        self.tape
            .front()
            .is_none_or(|head| !self.transition.contains_key(head))
    }

    pub fn transition(&self) -> &Arc<TagTransition<S>> {
        &self.transition
    }

    pub fn tape(&self) -> &VecDeque<S> {
        &self.tape
    }

    /// Number of symbols deleted per step.
    pub fn num(&self) -> usize {
        self.num
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}

impl<S> Machine for TagSystem<S>
where
    S: Clone + Eq + Hash,
{
    fn step(&mut self) -> Step {
        TagSystem::step(self)
    }

    fn step_count(&self) -> usize {
        self.step_count
    }
}

impl<S> PartialEq for TagSystem<S>
where
    S: Clone + Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        self.num == other.num && self.tape == other.tape && self.transition == other.transition
    }
}

impl<S: fmt::Display> fmt::Display for TagSystem<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, symbol) in self.tape.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", symbol)?;
        }
        write!(f, "]")
    }
}
