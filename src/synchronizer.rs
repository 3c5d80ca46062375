//! Lockstep execution of a model and the chain of models derived from it.
//!
//! Level 0 is the base model. Every registered level `k + 1` is derived from level `k` by a
//! transform and comes with a predicate telling when it has finished simulating one step
//! of level `k`. Advancing steps the base once and every derived level just far enough to
//! catch up, so that re-deriving a level from the one above yields the same configuration.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

use crate::cyclic::CyclicTagSystem;
use crate::machine::{Machine, TuringMachine};
use crate::tag_to_cyclic::{encoding, is_tag_step_passed, tag_to_cyclic};
use crate::turing_to_tag::{is_step_passed, machine_to_tag_system, CellSymbol};
use crate::types::{ChainError, Halt, Step, DEFAULT_MAX_CYCLE_STEPS};

/// A model that can take part in a synchronized chain.
///
/// Implemented for every [`Machine`] with structural equality and a display form.
pub trait Model: Machine + fmt::Debug + fmt::Display + Any {
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against a model of any type.
    fn same_as(&self, other: &dyn Model) -> bool;
}

impl<T> Model for T
where
    T: Machine + PartialEq + fmt::Debug + fmt::Display + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_as(&self, other: &dyn Model) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Limits applied while advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of elementary steps a level may take to satisfy its predicate once.
    pub max_cycle_steps: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_cycle_steps: DEFAULT_MAX_CYCLE_STEPS,
        }
    }
}

type Transform = Box<dyn Fn(&dyn Model) -> Result<Box<dyn Model>, ChainError>>;
type InfoExtractor = Box<dyn Fn(&dyn Model) -> Result<Box<dyn Any>, ChainError>>;
type Predicate = Box<dyn Fn(&dyn Model) -> Result<bool, ChainError>>;

struct Level {
    transform: Transform,
    info: Option<InfoExtractor>,
    predicate: Predicate,
}

/// Drives a base model and its derived levels in lockstep.
pub struct Synchronizer {
    base: Box<dyn Model>,
    levels: Vec<Level>,
    derived: Vec<Box<dyn Model>>,
    infos: Vec<Option<Box<dyn Any>>>,
    config: SyncConfig,
    generated: bool,
}

impl Synchronizer {
    pub fn new(base: impl Model) -> Self {
        Self::with_config(base, SyncConfig::default())
    }

    pub fn with_config(base: impl Model, config: SyncConfig) -> Self {
        Self {
            base: Box::new(base),
            levels: Vec::new(),
            derived: Vec::new(),
            infos: Vec::new(),
            config,
            generated: false,
        }
    }

    /// Appends a level derived from the current last level.
    pub fn register<A, B, T, P>(&mut self, transform: T, predicate: P) -> &mut Self
    where
        A: Model,
        B: Model,
        T: Fn(&A) -> Result<B, ChainError> + 'static,
        P: Fn(&B) -> bool + 'static,
    {
        self.push_level::<A, B, T, P>(transform, None, predicate)
    }

    /// Like [`Synchronizer::register`], also keeping an artifact extracted from the source
    /// model whenever the level is generated.
    pub fn register_with_info<A, B, I, T, F, P>(
        &mut self,
        transform: T,
        info: F,
        predicate: P,
    ) -> &mut Self
    where
        A: Model,
        B: Model,
        I: Any,
        T: Fn(&A) -> Result<B, ChainError> + 'static,
        F: Fn(&A) -> I + 'static,
        P: Fn(&B) -> bool + 'static,
    {
        let source = self.levels.len();
        let info: InfoExtractor = Box::new(move |model: &dyn Model| {
            let model = downcast::<A>(model, source)?;
            Ok(Box::new(info(model)) as Box<dyn Any>)
        });
        self.push_level::<A, B, T, P>(transform, Some(info), predicate)
    }

    fn push_level<A, B, T, P>(
        &mut self,
        transform: T,
        info: Option<InfoExtractor>,
        predicate: P,
    ) -> &mut Self
    where
        A: Model,
        B: Model,
        T: Fn(&A) -> Result<B, ChainError> + 'static,
        P: Fn(&B) -> bool + 'static,
    {
        let source = self.levels.len();
        let target = source + 1;

        self.levels.push(Level {
            transform: Box::new(move |model: &dyn Model| {
                let derived = transform(downcast::<A>(model, source)?)?;
                Ok(Box::new(derived) as Box<dyn Model>)
            }),
            info,
            predicate: Box::new(move |model: &dyn Model| {
                Ok(predicate(downcast::<B>(model, target)?))
            }),
        });
        self.generated = false;
        self
    }

    /// Derives every level from the current configuration of the level above it.
    ///
    /// Replaces previously generated levels and artifacts.
    pub fn generate(&mut self) -> Result<(), ChainError> {
        let mut derived: Vec<Box<dyn Model>> = Vec::with_capacity(self.levels.len());
        let mut infos = Vec::with_capacity(self.levels.len());

        for level in &self.levels {
            let source: &dyn Model = derived.last().map_or(&*self.base, |model| &**model);
            let info = level.info.as_ref().map(|info| info(source)).transpose()?;
            let model = (level.transform)(source)?;
            infos.push(info);
            derived.push(model);
        }

        tracing::debug!(levels = derived.len(), "generated levels");
        self.derived = derived;
        self.infos = infos;
        self.generated = true;
        Ok(())
    }

    /// Steps the base once and every derived level through as many predicate cycles as
    /// the level above took elementary steps.
    ///
    /// Returns the elementary steps taken per level, base first.
    pub fn advance(&mut self) -> Result<Vec<usize>, ChainError> {
        self.ensure_generated()?;

        let mut counts = Vec::with_capacity(self.levels.len() + 1);
        step_model(&mut *self.base, 0)?;
        counts.push(1);

        let limit = self.config.max_cycle_steps;
        for (index, (level, model)) in self.levels.iter().zip(self.derived.iter_mut()).enumerate()
        {
            let number = index + 1;
            let mut steps = 0;

            for _ in 0..counts[index] {
                let mut cycle = 0;
                loop {
                    step_model(&mut **model, number)?;
                    cycle += 1;
                    if (level.predicate)(&**model)? {
                        break;
                    }
                    if cycle >= limit {
                        return Err(ChainError::StepLimitExceeded {
                            level: number,
                            limit,
                        });
                    }
                }
                tracing::trace!(level = number, steps = cycle, "completed predicate cycle");
                steps += cycle;
            }

            counts.push(steps);
        }

        tracing::debug!(?counts, "advanced levels");
        Ok(counts)
    }

    /// Re-derives every level from the current configuration of the level above it and
    /// reports, per derived level, whether the result equals the advanced instance.
    pub fn compare(&self) -> Result<Vec<bool>, ChainError> {
        self.ensure_generated()?;

        let mut source: &dyn Model = &*self.base;
        let mut matches = Vec::with_capacity(self.derived.len());
        for (level, instance) in self.levels.iter().zip(&self.derived) {
            let fresh = (level.transform)(source)?;
            matches.push(fresh.same_as(&**instance));
            source = &**instance;
        }

        Ok(matches)
    }

    fn ensure_generated(&self) -> Result<(), ChainError> {
        if self.generated {
            Ok(())
        } else {
            Err(ChainError::PreconditionViolated(
                "levels must be generated before they are advanced or compared".to_string(),
            ))
        }
    }

    /// Number of registered levels, not counting the base.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn base(&self) -> &dyn Model {
        &*self.base
    }

    /// Returns the model at `level`; 0 is the base.
    pub fn level(&self, level: usize) -> Option<&dyn Model> {
        match level {
            0 => Some(&*self.base),
            _ => self.derived.get(level - 1).map(|model| &**model),
        }
    }

    /// Returns the model at `level` if it has type `T`.
    pub fn model<T: Any>(&self, level: usize) -> Option<&T> {
        self.level(level)?.as_any().downcast_ref::<T>()
    }

    /// Iterates over the base and every generated level.
    pub fn models(&self) -> impl Iterator<Item = &dyn Model> {
        std::iter::once(&*self.base).chain(self.derived.iter().map(|model| &**model))
    }

    /// Returns the artifact extracted when `level` was generated, if it has type `I`.
    pub fn info<I: Any>(&self, level: usize) -> Option<&I> {
        self.infos
            .get(level.checked_sub(1)?)?
            .as_ref()?
            .downcast_ref::<I>()
    }
}

impl fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("base", &self.base)
            .field("derived", &self.derived)
            .field("levels", &self.levels.len())
            .field("config", &self.config)
            .field("generated", &self.generated)
            .finish()
    }
}

impl fmt::Display for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, model) in self.models().enumerate() {
            if index > 0 {
                writeln!(f)?;
                writeln!(f)?;
            }
            writeln!(f, "level {} ({} steps):", index, model.step_count())?;
            write!(f, "{}", model)?;
        }
        Ok(())
    }
}

fn downcast<T: Any>(model: &dyn Model, level: usize) -> Result<&T, ChainError> {
    model
        .as_any()
        .downcast_ref::<T>()
        .ok_or(ChainError::LevelTypeMismatch(level))
}

fn step_model(model: &mut dyn Model, level: usize) -> Result<(), ChainError> {
    match model.step() {
        Step::Continue => Ok(()),
        Step::Halt(Halt::Ok) => Err(ChainError::Halted(level)),
        Step::Halt(Halt::Err(e)) => Err(e),
    }
}

/// Builds the Turing → tag → cyclic tag chain over `machine`. Level 2 keeps the one-hot
/// dictionary of the tag alphabet as its artifact.
pub fn turing_chain(machine: TuringMachine, config: SyncConfig) -> Synchronizer {
    let mut sync = Synchronizer::with_config(machine, config);
    sync.register(machine_to_tag_system, is_step_passed)
        .register_with_info(
            tag_to_cyclic::<CellSymbol>,
            encoding::<CellSymbol>,
            |cyclic: &CyclicTagSystem| is_tag_step_passed(cyclic),
        );
    sync
}
