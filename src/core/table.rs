//! State table lookup and validation.
//!
//! The engine never enforces id uniqueness at init; lookups return the first
//! descriptor with a matching id. [`validate`] lets applications check a table
//! up front and reports every problem it finds in a single pass.

use super::state::{State, StateId};
use std::collections::HashMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Problems that make a state table unusable or ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableViolation {
    #[error("State table is empty")]
    Empty,

    #[error("State id {id} appears at positions {first} and {second}")]
    DuplicateId {
        id: StateId,
        first: usize,
        second: usize,
    },

    #[error("State {id} at position {index} has no run callback")]
    MissingRun { id: StateId, index: usize },

    #[error("Initial state {0} is not in the table")]
    UnknownInitial(StateId),
}

/// Accumulated table validation outcome.
pub type TableValidation = Validation<(), NonEmptyVec<TableViolation>>;

/// Position of the first state carrying `id`, by linear scan.
pub fn position<D>(states: &[State<D>], id: StateId) -> Option<usize> {
    states.iter().position(|state| state.id() == id)
}

/// Validate a whole table, accumulating ALL violations.
///
/// # Example
///
/// ```rust
/// use tickfsm::core::table::validate;
/// use tickfsm::State;
/// use stillwater::validation::Validation;
///
/// let states = [
///     State::new(1, ()).on_run(|_| Ok(())),
///     State::new(1, ()),
/// ];
///
/// match validate(&states) {
///     Validation::Failure(errors) => assert_eq!(errors.len(), 2),
///     Validation::Success(_) => panic!("table should be rejected"),
/// }
/// ```
pub fn validate<D>(states: &[State<D>]) -> TableValidation {
    let mut checks: Vec<TableValidation> = Vec::new();

    if states.is_empty() {
        checks.push(Validation::fail(TableViolation::Empty));
    }

    let mut seen: HashMap<StateId, usize> = HashMap::with_capacity(states.len());
    for (index, state) in states.iter().enumerate() {
        if let Some(&first) = seen.get(&state.id()) {
            checks.push(Validation::fail(TableViolation::DuplicateId {
                id: state.id(),
                first,
                second: index,
            }));
        } else {
            seen.insert(state.id(), index);
        }

        if !state.is_runnable() {
            checks.push(Validation::fail(TableViolation::MissingRun {
                id: state.id(),
                index,
            }));
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Validate a table together with the id the machine will start in.
pub fn validate_with_initial<D>(states: &[State<D>], initial: StateId) -> TableValidation {
    let mut checks = vec![validate(states)];

    if !states.is_empty() && position(states, initial).is_none() {
        checks.push(Validation::fail(TableViolation::UnknownInitial(initial)));
    }

    Validation::all_vec(checks).map(|_| ())
}
