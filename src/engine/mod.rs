//! The running machine.
//!
//! [`Fsm`] owns only its lock and three positions into the caller's table.
//! Transitions are requested from any context and applied lazily by the next
//! call to [`Fsm::run`], which the application drives from its main loop.

mod machine;

pub use machine::Fsm;
pub(crate) use machine::Triple;
