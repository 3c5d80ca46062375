//! Transition tables and strategies shared by the unit tests.

use proptest::prelude::*;
use std::sync::Arc;

use crate::machine::TransitionTable;
use crate::types::{Direction, StateId, StateTransition, Transition, TuringSymbol};

use TuringSymbol::{One, Zero};

/// Flips every cell while walking right.
pub fn inverter() -> Arc<TransitionTable> {
    Arc::new(
        TransitionTable::new([StateTransition::new(
            0,
            Transition::new(One, Direction::Right, 0),
            Transition::new(Zero, Direction::Right, 0),
        )])
        .unwrap(),
    )
}

/// Two states that write ones while moving in both directions.
pub fn shuttle() -> Arc<TransitionTable> {
    Arc::new(
        TransitionTable::new([
            StateTransition::new(
                0,
                Transition::new(One, Direction::Left, 1),
                Transition::new(Zero, Direction::Right, 0),
            ),
            StateTransition::new(
                1,
                Transition::new(One, Direction::Right, 0),
                Transition::new(One, Direction::Left, 1),
            ),
        ])
        .unwrap(),
    )
}

fn arb_transition(states: StateId) -> impl Strategy<Value = Transition> {
    (any::<bool>(), any::<bool>(), 0..states).prop_map(|(write, right, next)| {
        let direction = if right { Direction::Right } else { Direction::Left };
        Transition::new(TuringSymbol::from_bit(write), direction, next)
    })
}

/// Total tables over `1..=max_states` states; every next state is declared.
pub fn arb_table(max_states: StateId) -> impl Strategy<Value = Arc<TransitionTable>> {
    (1..=max_states).prop_flat_map(|states| {
        proptest::collection::vec(
            (arb_transition(states), arb_transition(states)),
            states as usize,
        )
        .prop_map(|pairs| {
            let table = pairs
                .into_iter()
                .enumerate()
                .map(|(state, (on_zero, on_one))| {
                    StateTransition::new(state as StateId, on_zero, on_one)
                });
            Arc::new(TransitionTable::new(table).unwrap())
        })
    })
}
