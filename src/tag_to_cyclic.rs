//! Reduction from a tag system to a cyclic tag system, and its inverse.
//!
//! Every alphabet symbol becomes a one-hot word whose length is the alphabet size `A`. The
//! cyclic transition has `A × num` slots: one per symbol holding its encoded production,
//! followed by `A × (num − 1)` empty slots that consume the remaining deleted symbols.

use indexmap::IndexSet;
use std::fmt;
use std::hash::Hash;
use std::iter;

use crate::cyclic::{CyclicTag, CyclicTagSystem, CyclicTransition};
use crate::tag::{TagSystem, TagTransition};
use crate::types::{ChainError, CyclicSymbol};

/// The dictionary between a tag alphabet and one-hot cyclic words.
///
/// The position of a symbol in the alphabet is the position of its set bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHotEncoding<S: Hash + Eq> {
    alphabet: IndexSet<S>,
}

impl<S> OneHotEncoding<S>
where
    S: Clone + Eq + Hash + fmt::Debug,
{
    /// Creates a dictionary over `alphabet`. Repeated symbols keep their first position.
    pub fn new(alphabet: impl IntoIterator<Item = S>) -> Self {
        Self {
            alphabet: alphabet.into_iter().collect(),
        }
    }

    /// The dictionary of a tag system's alphabet, in enumeration order.
    pub fn from_tag_system(tag: &TagSystem<S>) -> Self {
        Self::new(tag.alphabet().cloned())
    }

    pub fn len(&self) -> usize {
        self.alphabet.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphabet.is_empty()
    }

    pub fn alphabet(&self) -> impl Iterator<Item = &S> {
        self.alphabet.iter()
    }

    /// Returns the one-hot word of `symbol`.
    pub fn encode(&self, symbol: &S) -> Result<CyclicTag, ChainError> {
        self.alphabet
            .get_index_of(symbol)
            .map(|index| CyclicTag::one_hot(index, self.len()))
            .ok_or_else(|| ChainError::UndefinedSymbol(format!("{symbol:?}")))
    }

    /// Concatenates the one-hot words of every symbol in `word`.
    pub fn encode_word<'a>(
        &self,
        word: impl IntoIterator<Item = &'a S>,
    ) -> Result<Vec<CyclicSymbol>, ChainError>
    where
        S: 'a,
    {
        let mut encoded = Vec::new();
        for symbol in word {
            encoded.extend(self.encode(symbol)?.into_inner());
        }
        Ok(encoded)
    }

    /// Maps a single one-hot chunk back to its symbol.
    pub fn decode(&self, chunk: &[CyclicSymbol]) -> Result<S, ChainError> {
        if chunk.len() != self.len() {
            return Err(ChainError::MalformedEncoding(format!(
                "chunk of {} symbols does not match an alphabet of {}",
                chunk.len(),
                self.len()
            )));
        }

        let mut set = chunk
            .iter()
            .enumerate()
            .filter(|(_, symbol)| **symbol == CyclicSymbol::Yes)
            .map(|(index, _)| index);
        match (set.next(), set.next()) {
            (Some(index), None) => self.alphabet.get_index(index).cloned().ok_or_else(|| {
                ChainError::MalformedEncoding(format!("no symbol at position {index}"))
            }),
            _ => Err(ChainError::MalformedEncoding(format!(
                "{} is not a one-hot word",
                CyclicTag::new(chunk.to_vec())
            ))),
        }
    }

    /// Splits `word` into chunks of the alphabet size and decodes each of them.
    pub fn decode_word(&self, word: &[CyclicSymbol]) -> Result<Vec<S>, ChainError> {
        if self.is_empty() {
            return Err(ChainError::MalformedEncoding(
                "cannot decode with an empty alphabet".to_string(),
            ));
        }
        if word.len() % self.len() != 0 {
            return Err(ChainError::MalformedEncoding(format!(
                "word of {} symbols is not a multiple of the alphabet size {}",
                word.len(),
                self.len()
            )));
        }

        word.chunks(self.len()).map(|chunk| self.decode(chunk)).collect()
    }
}

impl<S: Hash + Eq + fmt::Display> fmt::Display for OneHotEncoding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.alphabet.len();
        for (index, symbol) in self.alphabet.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{} -> {}", symbol, CyclicTag::one_hot(index, len))?;
        }
        Ok(())
    }
}

/// Builds the dictionary used by [`tag_to_cyclic`].
pub fn encoding<S>(tag: &TagSystem<S>) -> OneHotEncoding<S>
where
    S: Clone + Eq + Hash + fmt::Debug,
{
    OneHotEncoding::from_tag_system(tag)
}

/// Builds a cyclic tag system simulating `tag`.
///
/// Every symbol reachable from a production or the tape must own a production itself,
/// otherwise the result is `UndefinedSymbol`.
pub fn tag_to_cyclic<S>(tag: &TagSystem<S>) -> Result<CyclicTagSystem, ChainError>
where
    S: Clone + Eq + Hash + fmt::Debug,
{
    let encoding = encoding(tag);
    let padding = tag.num().checked_sub(1).ok_or_else(|| {
        ChainError::ValidationError("A tag system must delete at least one symbol".to_string())
    })?;

    let mut tags = Vec::with_capacity(encoding.len() * tag.num());
    for production in tag.transition().values() {
        tags.push(CyclicTag::new(encoding.encode_word(production)?));
    }
    tags.extend(iter::repeat(CyclicTag::default()).take(encoding.len() * padding));

    let tape = encoding.encode_word(tag.tape())?;
    tracing::debug!(
        alphabet = encoding.len(),
        slots = tags.len(),
        tape = tape.len(),
        "encoded tag system as cyclic tag system"
    );

    Ok(CyclicTagSystem::new(CyclicTransition::new(tags)?, tape))
}

/// Returns `true` once the pointer has completed a revolution, i.e. the cyclic system has
/// finished simulating one tag step.
pub fn is_tag_step_passed(cyclic: &CyclicTagSystem) -> bool {
    cyclic.transition().pointer() == 0
}

/// Rebuilds the tag transition encoded by `transition`, together with its deletion number.
pub fn cyclic_to_tag_transition<S>(
    transition: &CyclicTransition,
    encoding: &OneHotEncoding<S>,
) -> Result<(TagTransition<S>, usize), ChainError>
where
    S: Clone + Eq + Hash + fmt::Debug,
{
    let symbols = encoding.len();
    let slots = transition.tags();
    if symbols == 0 || slots.len() % symbols != 0 {
        return Err(ChainError::MalformedEncoding(format!(
            "{} slots cannot hold an alphabet of {}",
            slots.len(),
            symbols
        )));
    }

    let num = slots.len() / symbols;
    let empty = slots.iter().rev().take_while(|tag| tag.is_empty()).count();
    if empty < symbols * (num - 1) {
        return Err(ChainError::MalformedEncoding(format!(
            "expected {} trailing empty slots, found {}",
            symbols * (num - 1),
            empty
        )));
    }

    let mut tag_transition = TagTransition::<S>::with_capacity(symbols);
    for (symbol, slot) in encoding.alphabet().zip(slots.iter()) {
        tag_transition.insert(symbol.clone(), encoding.decode_word(slot)?);
    }

    Ok((tag_transition, num))
}

/// Rebuilds the tag system simulated by `cyclic`.
///
/// The pointer must be at the start of a revolution.
pub fn cyclic_to_tag<S>(
    cyclic: &CyclicTagSystem,
    encoding: &OneHotEncoding<S>,
) -> Result<TagSystem<S>, ChainError>
where
    S: Clone + Eq + Hash + fmt::Debug,
{
    if !is_tag_step_passed(cyclic) {
        return Err(ChainError::PreconditionViolated(format!(
            "cyclic pointer is at {} instead of 0",
            cyclic.transition().pointer()
        )));
    }

    let (transition, num) = cyclic_to_tag_transition(cyclic.transition(), encoding)?;
    let tape: Vec<_> = cyclic.tape().iter().copied().collect();
    let tape = encoding.decode_word(&tape)?;

    Ok(TagSystem::new(transition, num, tape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;
    use indexmap::IndexMap;
    use proptest::prelude::*;

    fn abc() -> TagTransition<char> {
        IndexMap::from([
            ('a', vec!['b', 'c']),
            ('b', vec!['a']),
            ('c', vec!['a', 'a', 'a', 'a']),
        ])
    }

    fn bits(symbols: impl IntoIterator<Item = CyclicSymbol>) -> String {
        symbols.into_iter().map(|s| s.to_string()).collect()
    }

    /// Steps `cyclic` through one full revolution and returns the steps taken.
    fn settle(cyclic: &mut CyclicTagSystem) -> usize {
        let mut steps = 0;
        loop {
            assert_eq!(cyclic.step(), Step::Continue);
            steps += 1;
            if is_tag_step_passed(cyclic) {
                return steps;
            }
        }
    }

    #[test]
    fn test_slots_and_tape() {
        let tag = TagSystem::new(abc(), 2, "aaa".chars());
        let cyclic = tag_to_cyclic(&tag).unwrap();
        let slots: Vec<_> = cyclic.transition().tags().iter().map(|t| t.to_string()).collect();

        assert_eq!(slots, ["010001", "100", "100100100100", "", "", ""]);
        assert_eq!(bits(cyclic.tape().iter().copied()), "100100100");
        assert!(is_tag_step_passed(&cyclic));
    }

    #[test]
    fn test_deletion_number_sets_padding() {
        let tag = TagSystem::new(abc(), 3, "aaa".chars());
        let cyclic = tag_to_cyclic(&tag).unwrap();

        assert_eq!(cyclic.transition().len(), 9);
        assert!(cyclic.transition().tags()[3..].iter().all(|t| t.is_empty()));

        let zero = TagSystem::new(abc(), 0, "aaa".chars());
        assert!(matches!(
            tag_to_cyclic(&zero),
            Err(ChainError::ValidationError(_))
        ));
    }

    #[test]
    fn test_encoding_dictionary() {
        let tag = TagSystem::new(abc(), 2, "a".chars());
        let encoding = encoding(&tag);

        assert_eq!(encoding.len(), 3);
        assert_eq!(encoding.encode(&'c').unwrap().to_string(), "001");
        assert_eq!(encoding.decode(&"010".parse::<CyclicTag>().unwrap()).unwrap(), 'b');
        assert_eq!(encoding.to_string(), "a -> 100\nb -> 010\nc -> 001");
        assert_eq!(
            encoding.encode(&'x'),
            Err(ChainError::UndefinedSymbol("'x'".to_string()))
        );
    }

    #[test]
    fn test_halting_symbol_cannot_be_encoded() {
        let transition = IndexMap::from([('a', vec!['h'])]);
        let tag = TagSystem::new(transition, 2, "aa".chars());

        assert!(matches!(
            tag_to_cyclic(&tag),
            Err(ChainError::UndefinedSymbol(_))
        ));
    }

    #[test]
    fn test_inverse() {
        for num in [1, 2, 3] {
            let tag = TagSystem::new(abc(), num, "abcca".chars());
            let cyclic = tag_to_cyclic(&tag).unwrap();

            assert_eq!(cyclic_to_tag(&cyclic, &encoding(&tag)).unwrap(), tag);
        }
    }

    #[test]
    fn test_one_tag_step_is_a_revolution() {
        let mut tag = TagSystem::new(abc(), 2, "aaa".chars());
        let mut cyclic = tag_to_cyclic(&tag).unwrap();
        let encoding = encoding(&tag);

        for _ in 0..5 {
            tag.step();
            assert_eq!(settle(&mut cyclic), 6);
            assert_eq!(cyclic_to_tag(&cyclic, &encoding).unwrap(), tag);
        }
    }

    #[test]
    fn test_decode_rejects_malformed_words() {
        let encoding = OneHotEncoding::new(['a', 'b']);

        let two_set: CyclicTag = "11".parse().unwrap();
        assert!(matches!(
            encoding.decode(&two_set),
            Err(ChainError::MalformedEncoding(_))
        ));
        let odd: CyclicTag = "100".parse().unwrap();
        assert!(matches!(
            encoding.decode_word(&odd),
            Err(ChainError::MalformedEncoding(_))
        ));
        assert!(matches!(
            OneHotEncoding::<char>::new([]).decode_word(&[]),
            Err(ChainError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_decode_rejects_malformed_transitions() {
        let encoding = OneHotEncoding::new(['a', 'b']);
        let tag = |s: &str| s.parse::<CyclicTag>().unwrap();

        let uneven = CyclicTransition::new(vec![tag("01"), tag("10"), tag("")]).unwrap();
        assert!(matches!(
            cyclic_to_tag_transition(&uneven, &encoding),
            Err(ChainError::MalformedEncoding(_))
        ));

        let unpadded =
            CyclicTransition::new(vec![tag("01"), tag("10"), tag(""), tag("01")]).unwrap();
        assert!(matches!(
            cyclic_to_tag_transition(&unpadded, &encoding),
            Err(ChainError::MalformedEncoding(_))
        ));

        let padded = CyclicTransition::new(vec![tag("01"), tag("10"), tag(""), tag("")]).unwrap();
        let (transition, num) = cyclic_to_tag_transition(&padded, &encoding).unwrap();
        assert_eq!(num, 2);
        assert_eq!(transition, IndexMap::from([('a', vec!['b']), ('b', vec!['a'])]));
    }

    #[test]
    fn test_decode_requires_completed_revolution() {
        let tag = TagSystem::new(abc(), 2, "aaa".chars());
        let mut cyclic = tag_to_cyclic(&tag).unwrap();
        cyclic.step();

        assert!(matches!(
            cyclic_to_tag(&cyclic, &encoding(&tag)),
            Err(ChainError::PreconditionViolated(_))
        ));
    }

    fn arb_tag_system() -> impl Strategy<Value = TagSystem<char>> {
        (1usize..=4, 1usize..=3).prop_flat_map(|(size, num)| {
            let symbol = proptest::sample::select(('a'..='d').take(size).collect::<Vec<_>>());
            (
                proptest::collection::vec(proptest::collection::vec(symbol.clone(), 0..4), size),
                proptest::collection::vec(symbol, 1..8),
            )
                .prop_map(move |(productions, tape)| {
                    let transition: TagTransition<char> =
                        ('a'..='d').zip(productions).collect();
                    TagSystem::new(transition, num, tape)
                })
        })
    }

    proptest! {
        #[test]
        fn encoding_is_invertible(tag in arb_tag_system()) {
            let cyclic = tag_to_cyclic(&tag).unwrap();
            prop_assert_eq!(cyclic_to_tag(&cyclic, &encoding(&tag)).unwrap(), tag);
        }

        #[test]
        fn revolutions_commute_with_tag_steps(mut tag in arb_tag_system()) {
            let mut cyclic = tag_to_cyclic(&tag).unwrap();
            let revolution = tag.alphabet().count() * tag.num();

            for _ in 0..6 {
                if tag.tape().len() < tag.num() {
                    break;
                }
                tag.step();
                prop_assert_eq!(settle(&mut cyclic), revolution);
                prop_assert_eq!(&cyclic, &tag_to_cyclic(&tag).unwrap());
            }
        }
    }
}
