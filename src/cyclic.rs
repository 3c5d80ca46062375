//! Cyclic tag systems: a binary tape, one symbol consumed per step, and productions chosen
//! round-robin from a fixed list.

use std::collections::VecDeque;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use crate::machine::Machine;
use crate::types::{ChainError, CyclicSymbol, Halt, Step, MAX_EXECUTION_STEPS};

/// A production word of cyclic symbols. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CyclicTag(Vec<CyclicSymbol>);

impl CyclicTag {
    pub fn new(symbols: Vec<CyclicSymbol>) -> Self {
        Self(symbols)
    }

    /// A tag of `len` symbols with only position `index` set.
    pub fn one_hot(index: usize, len: usize) -> Self {
        Self(
            (0..len)
                .map(|i| if i == index { CyclicSymbol::Yes } else { CyclicSymbol::No })
                .collect(),
        )
    }

    pub fn into_inner(self) -> Vec<CyclicSymbol> {
        self.0
    }
}

impl Deref for CyclicTag {
    type Target = [CyclicSymbol];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<CyclicSymbol> for CyclicTag {
    fn from_iter<I: IntoIterator<Item = CyclicSymbol>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for CyclicTag {
    type Err = ChainError;

    /// Parses a string of `0` and `1`. Whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '0' => Ok(CyclicSymbol::No),
                '1' => Ok(CyclicSymbol::Yes),
                other => Err(ChainError::ValidationError(format!(
                    "Invalid cyclic symbol: {other}"
                ))),
            })
            .collect()
    }
}

impl fmt::Display for CyclicTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.0 {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

/// The list of production words together with the pointer to the next one.
///
/// The list is shared; each system advances its own pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicTransition {
    tags: Arc<Vec<CyclicTag>>,
    pointer: usize,
}

impl CyclicTransition {
    /// Creates a transition pointing at its first tag. The list must not be empty.
    pub fn new(tags: impl Into<Arc<Vec<CyclicTag>>>) -> Result<Self, ChainError> {
        let tags = tags.into();
        if tags.is_empty() {
            return Err(ChainError::ValidationError(
                "A cyclic transition needs at least one tag".to_string(),
            ));
        }

        Ok(Self { tags, pointer: 0 })
    }

    /// Returns the tag under the pointer and advances the pointer.
    fn advance(&mut self) -> &CyclicTag {
        let current = self.pointer;
        self.pointer = (self.pointer + 1) % self.tags.len();
        &self.tags[current]
    }

    pub fn tags(&self) -> &Arc<Vec<CyclicTag>> {
        &self.tags
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl fmt::Display for CyclicTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{i}: {tag}")?;
            if i == self.pointer {
                write!(f, " <<<")?;
            }
        }
        Ok(())
    }
}

/// Represents a cyclic tag system.
#[derive(Debug, Clone)]
pub struct CyclicTagSystem {
    transition: CyclicTransition,
    tape: VecDeque<CyclicSymbol>,
    step_count: usize,
}

impl CyclicTagSystem {
    pub fn new(transition: CyclicTransition, tape: impl IntoIterator<Item = CyclicSymbol>) -> Self {
        Self {
            transition,
            tape: tape.into_iter().collect(),
            step_count: 0,
        }
    }

    /// Executes one step: pop the front symbol, advance the pointer, and append the
    /// selected tag only if the popped symbol was `Yes`.
    ///
    /// Returns `Step::Halt(Halt::Ok)` on an empty tape.
    pub fn step(&mut self) -> Step {
        let Some(symbol) = self.tape.pop_front() else {
            return Step::Halt(Halt::Ok);
        };

        let tag = self.transition.advance();
        if symbol == CyclicSymbol::Yes {
            self.tape.extend(tag.iter().copied());
        }
        self.step_count += 1;

        Step::Continue
    }

    /// Runs until the tape is empty or `MAX_EXECUTION_STEPS` is reached.
    pub fn run(&mut self) -> Step {
        for _ in 0..MAX_EXECUTION_STEPS {
            match self.step() {
                Step::Continue => continue,
                halt => return halt,
            }
        }

        Step::Halt(Halt::Ok)
    }

    pub fn transition(&self) -> &CyclicTransition {
        &self.transition
    }

    pub fn tape(&self) -> &VecDeque<CyclicSymbol> {
        &self.tape
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}

impl Machine for CyclicTagSystem {
    fn step(&mut self) -> Step {
        CyclicTagSystem::step(self)
    }

    fn step_count(&self) -> usize {
        self.step_count
    }
}

impl PartialEq for CyclicTagSystem {
    fn eq(&self, other: &Self) -> bool {
        self.transition == other.transition && self.tape == other.tape
    }
}

impl fmt::Display for CyclicTagSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.tape {
            write!(f, "{} ", symbol)?;
        }
        writeln!(f)?;
        writeln!(f, "==============")?;
        writeln!(f, "{}", self.transition)?;
        write!(f, "==============")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> CyclicTag {
        s.parse().unwrap()
    }

    fn tape(system: &CyclicTagSystem) -> String {
        system.tape().iter().map(|s| s.to_string()).collect()
    }

    fn example() -> CyclicTagSystem {
        let transition = CyclicTransition::new(vec![tag("11"), tag("0011"), tag("1101")]).unwrap();
        CyclicTagSystem::new(transition, tag("011011101").into_inner())
    }

    #[test]
    fn test_round_robin_trace() {
        let mut system = example();
        let expected = [
            ("11011101", 1),
            ("10111010011", 2),
            ("01110100111101", 0),
            ("1110100111101", 1),
        ];

        for (tape_after, pointer) in expected {
            assert_eq!(system.step(), Step::Continue);
            assert_eq!(tape(&system), tape_after);
            assert_eq!(system.transition().pointer(), pointer);
        }
        assert_eq!(system.step_count(), 4);
    }

    #[test]
    fn test_pointer_advances_on_no() {
        let transition = CyclicTransition::new(vec![tag("1"), tag("")]).unwrap();
        let mut system = CyclicTagSystem::new(transition, tag("00").into_inner());

        system.step();
        assert_eq!(system.transition().pointer(), 1);
        system.step();
        assert_eq!(system.transition().pointer(), 0);
        assert!(system.tape().is_empty());
        assert_eq!(system.step(), Step::Halt(Halt::Ok));
    }

    #[test]
    fn test_empty_transition_is_rejected() {
        let result = CyclicTransition::new(Vec::<CyclicTag>::new());
        assert!(matches!(result, Err(ChainError::ValidationError(_))));
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(tag("1 0 1").len(), 3);
        assert_eq!(tag("").len(), 0);
        assert!("102".parse::<CyclicTag>().is_err());
        assert_eq!(CyclicTag::one_hot(1, 4), tag("0100"));
    }

    #[test]
    fn test_equality_ignores_step_count() {
        let mut stepped = example();
        stepped.step();
        stepped.step();
        stepped.step();

        let fresh_transition =
            CyclicTransition::new(vec![tag("11"), tag("0011"), tag("1101")]).unwrap();
        let fresh = CyclicTagSystem::new(fresh_transition, tag("01110100111101").into_inner());
        assert_eq!(stepped, fresh);

        stepped.step();
        assert_ne!(stepped, fresh);
    }

    #[test]
    fn test_display() {
        let system = example();
        let rendered = system.to_string();

        assert!(rendered.starts_with("0 1 1 0 1 1 1 0 1 \n"));
        assert!(rendered.contains("0: 11 <<<\n1: 0011\n2: 1101"));
    }
}
