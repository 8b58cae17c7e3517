//! Core engine types.
//!
//! This module contains the building blocks shared by the engine:
//! - State descriptors and their lifecycle callbacks
//! - The flat error taxonomy and callback result aggregation
//! - State table lookup and whole-table validation
//!
//! Nothing in this module allocates on behalf of the engine or touches the
//! synchronization capability.

mod error;
mod state;
pub mod table;

pub use error::{CallbackResult, ErrorKind, FsmError};
pub(crate) use error::combine;
pub use state::{Lifecycle, SetupFn, State, StateFn, StateId, StateOps};
pub use table::{TableValidation, TableViolation};
