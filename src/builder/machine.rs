//! Builder for initializing state machines.

use crate::checkpoint::Snapshot;
use crate::core::table::{self, position};
use crate::core::{FsmError, State, StateId};
use crate::engine::{Fsm, Triple};
use crate::sync::{NoLock, StateLock};
use std::any::Any;
use std::marker::PhantomData;
use stillwater::validation::Validation;

/// Init parameters for an [`Fsm`], assembled with a fluent API.
///
/// # Example
///
/// ```rust
/// use tickfsm::{FsmBuilder, ParkingLotLock, State};
///
/// let states = [
///     State::new(1, ()).on_run(|_| Ok(())),
///     State::new(2, ()).on_run(|_| Ok(())),
/// ];
///
/// let fsm = FsmBuilder::new()
///     .states(&states)
///     .initial(1)
///     .strict()
///     .synchronized::<ParkingLotLock>()
///     .build()?;
///
/// assert_eq!(fsm.current_state().id(), 1);
/// # Ok::<(), tickfsm::FsmError>(())
/// ```
pub struct FsmBuilder<'t, 'd, D, L: StateLock = NoLock> {
    states: Option<&'t [State<D>]>,
    initial: Option<StateId>,
    setup_data: Option<&'d dyn Any>,
    resume: Option<Snapshot>,
    strict: bool,
    _lock: PhantomData<L>,
}

impl<'t, 'd, D> FsmBuilder<'t, 'd, D, NoLock> {
    /// Create a builder for a single-context machine.
    pub fn new() -> Self {
        Self {
            states: None,
            initial: None,
            setup_data: None,
            resume: None,
            strict: false,
            _lock: PhantomData,
        }
    }
}

impl<'t, 'd, D> Default for FsmBuilder<'t, 'd, D, NoLock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t, 'd, D, L: StateLock> FsmBuilder<'t, 'd, D, L> {
    /// Set the state table (required).
    pub fn states(mut self, states: &'t [State<D>]) -> Self {
        self.states = Some(states);
        self
    }

    /// Set the id of the initial state (required unless resuming).
    pub fn initial(mut self, id: StateId) -> Self {
        self.initial = Some(id);
        self
    }

    /// Pass a blob to every state's setup callback during init.
    pub fn setup_data<T: Any>(mut self, data: &'d T) -> Self {
        let data: &'d dyn Any = data;
        self.setup_data = Some(data);
        self
    }

    /// Validate the whole table before init and reject it on any violation.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Start from a snapshot instead of the initial state.
    pub fn resume(mut self, snapshot: Snapshot) -> Self {
        self.resume = Some(snapshot);
        self
    }

    /// Select the lock guarding the state triple.
    pub fn synchronized<M: StateLock>(self) -> FsmBuilder<'t, 'd, D, M> {
        FsmBuilder {
            states: self.states,
            initial: self.initial,
            setup_data: self.setup_data,
            resume: self.resume,
            strict: self.strict,
            _lock: PhantomData,
        }
    }

    /// Initialize the machine.
    pub fn build(self) -> Result<Fsm<'t, D, L>, FsmError> {
        let states = self
            .states
            .ok_or_else(|| FsmError::invalid("state table not specified"))?;

        if self.strict {
            let report = match self.initial {
                Some(initial) if self.resume.is_none() => {
                    table::validate_with_initial(states, initial)
                }
                _ => table::validate(states),
            };
            if let Validation::Failure(violations) = report {
                let details: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                return Err(FsmError::invalid(format!(
                    "invalid state table: {}",
                    details.join("; ")
                )));
            }
        }

        let Some(snapshot) = self.resume else {
            let initial = self
                .initial
                .ok_or_else(|| FsmError::invalid("initial state not specified"))?;
            return Fsm::init(states, initial, self.setup_data);
        };

        let locate = |id: StateId| {
            position(states, id).ok_or_else(|| {
                FsmError::invalid(format!("snapshot state {id} is not in the table"))
            })
        };
        let triple = Triple {
            current: locate(snapshot.current)?,
            previous: locate(snapshot.previous)?,
            next: locate(snapshot.next)?,
        };

        let fsm = Fsm::with_triple(states, triple, self.setup_data)?;
        fsm.restore_counters(snapshot.ticks, snapshot.transitions);
        Ok(fsm)
    }
}
