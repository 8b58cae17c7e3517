//! Tickfsm: a minimal cooperative finite state machine engine
//!
//! Tickfsm targets small and embedded systems. The application owns a static
//! table of states, each with `setup`/`enter`/`exit`/`run` callbacks, and
//! drives the machine by calling [`Fsm::run`] from its main loop or task.
//! Transitions are requested with [`Fsm::request_transition`], possibly from
//! another execution context, and applied lazily on the next tick.
//!
//! # Core Concepts
//!
//! - **State table**: borrowed `&[State<D>]`; the engine never allocates or
//!   frees descriptors
//! - **Deferred transitions**: at most one transition per tick, last request wins
//! - **Injected lock**: [`NoLock`] for single-context use, [`ParkingLotLock`]
//!   or a custom [`StateLock`] when shared
//!
//! # Example
//!
//! ```rust
//! use tickfsm::{state_ids, FsmBuilder, State};
//!
//! state_ids! {
//!     enum Mode {
//!         Idle = 1,
//!         Active = 2,
//!     }
//! }
//!
//! let states = [
//!     State::new(Mode::Idle.id(), ()).named("Idle").on_run(|_| Ok(())),
//!     State::new(Mode::Active.id(), ()).named("Active").on_run(|_| Ok(())),
//! ];
//!
//! let fsm = FsmBuilder::new()
//!     .states(&states)
//!     .initial(Mode::Idle.id())
//!     .build()?;
//!
//! fsm.request_transition(Mode::Active.id())?;
//! fsm.run()?;
//! assert_eq!(fsm.current_state().name(), "Active");
//! # Ok::<(), tickfsm::FsmError>(())
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod engine;
pub mod sync;

// Re-export commonly used types
pub use builder::FsmBuilder;
pub use checkpoint::{Snapshot, SnapshotError};
pub use crate::core::{CallbackResult, ErrorKind, FsmError, Lifecycle, State, StateId, StateOps};
pub use engine::Fsm;
pub use sync::{NoLock, ParkingLotLock, StateLock};
