//! Builder API for ergonomic machine construction.
//!
//! [`FsmBuilder`] gathers the init parameters (table, initial state, setup
//! blob, lock type) and the [`state_ids!`](crate::state_ids) macro names the
//! numeric ids used by the table and by transition requests.

pub mod machine;
pub mod macros;

pub use machine::FsmBuilder;
