//! This crate provides two-symbol Turing machines, tag systems and cyclic tag systems,
//! the reductions Turing → tag → cyclic tag between them, and a synchronizer that steps
//! a whole chain in lockstep and checks that every reduction commutes with execution.
//! It also includes a parser for machine definitions, an analyzer, and a catalogue of
//! embedded sample machines.

pub mod analyzer;
pub mod cyclic;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod synchronizer;
pub mod tag;
pub mod tag_to_cyclic;
pub mod tape;
pub mod turing_to_tag;
pub mod types;

#[cfg(test)]
mod testing;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the cyclic tag engine.
pub use cyclic::{CyclicTag, CyclicTagSystem, CyclicTransition};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the Turing engine and the trait shared by every engine.
pub use machine::{Machine, TransitionTable, TuringMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `MachineInfo`, `MachineCatalog`, and `MACHINES` from the programs module.
pub use programs::{MachineCatalog, MachineInfo, MACHINES};
/// Re-exports the synchronizer.
pub use synchronizer::{turing_chain, Model, SyncConfig, Synchronizer};
/// Re-exports the tag engine.
pub use tag::{Production, TagSystem, TagTransition, DEFAULT_DELETION_NUMBER};
/// Re-exports the tag → cyclic tag reduction.
pub use tag_to_cyclic::{cyclic_to_tag, is_tag_step_passed, tag_to_cyclic, OneHotEncoding};
/// Re-exports the windowed Turing tape.
pub use tape::Tape;
/// Re-exports the Turing → tag reduction.
pub use turing_to_tag::{
    is_step_passed, machine_to_tag_system, tag_tape_to_tape_tuple, CellSymbol, Mark, Role,
};
/// Re-exports the shared data types.
pub use types::{
    ChainError, CyclicSymbol, Direction, Halt, Program, StateId, StateTransition, Step,
    TapeTuple, Transition, TuringSymbol, DEFAULT_MAX_CYCLE_STEPS, MAX_EXECUTION_STEPS,
    MAX_PROGRAM_SIZE, MAX_TAG_TAPE_CELLS,
};
