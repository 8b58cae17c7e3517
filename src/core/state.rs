//! State descriptors and their lifecycle callbacks.
//!
//! A [`State`] is a plain record owned by the application: an id, an optional
//! diagnostic name, a [`StateOps`] callback set and opaque user data. The
//! engine only ever borrows descriptors, so the table is typically a `static`
//! or lives on the stack of the task that drives the machine.

use super::error::CallbackResult;
use std::any::Any;
use std::fmt;

/// Unique numeric identifier of a state within its table.
pub type StateId = u32;

/// Callback invoked once per state during init, with the caller's setup blob.
pub type SetupFn<D> = Box<dyn Fn(&State<D>, &dyn Any) -> CallbackResult + Send + Sync>;

/// Callback invoked on enter, exit, or every tick of a state.
pub type StateFn<D> = Box<dyn Fn(&State<D>) -> CallbackResult + Send + Sync>;

/// Point in a state's life at which a callback fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Setup,
    Enter,
    Exit,
    Run,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Run => "run",
        };
        f.write_str(name)
    }
}

/// Callback set of a single state.
///
/// `setup`, `enter` and `exit` are optional and behave as no-ops when absent.
/// `run` is mandatory; a state without it is rejected by
/// [`Fsm::init`](crate::Fsm::init).
pub struct StateOps<D> {
    pub setup: Option<SetupFn<D>>,
    pub enter: Option<StateFn<D>>,
    pub exit: Option<StateFn<D>>,
    pub run: Option<StateFn<D>>,
}

impl<D> StateOps<D> {
    /// Create an empty callback set.
    pub fn new() -> Self {
        Self {
            setup: None,
            enter: None,
            exit: None,
            run: None,
        }
    }
}

impl<D> Default for StateOps<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor of one FSM state.
///
/// Callbacks receive `&State<D>`. The table is shared with the engine and
/// possibly with other execution contexts, so user data that changes over
/// time must use interior mutability (atomics or a mutex).
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use tickfsm::State;
///
/// let blink = State::new(1, AtomicU32::new(0))
///     .named("Blink")
///     .on_run(|state| {
///         state.data().fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     });
///
/// assert_eq!(blink.id(), 1);
/// assert_eq!(blink.name(), "Blink");
/// ```
pub struct State<D = ()> {
    id: StateId,
    name: Option<&'static str>,
    ops: StateOps<D>,
    data: D,
}

impl<D> State<D> {
    /// Create a state with no callbacks.
    pub fn new(id: StateId, data: D) -> Self {
        Self::with_ops(id, StateOps::new(), data)
    }

    /// Create a state from a prepared callback set.
    pub fn with_ops(id: StateId, ops: StateOps<D>, data: D) -> Self {
        Self {
            id,
            name: None,
            ops,
            data,
        }
    }

    /// Attach a diagnostic name used in log output.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the callback run once during init with the setup blob.
    pub fn on_setup<F>(mut self, f: F) -> Self
    where
        F: Fn(&State<D>, &dyn Any) -> CallbackResult + Send + Sync + 'static,
    {
        self.ops.setup = Some(Box::new(f));
        self
    }

    /// Set the callback run when a transition enters this state.
    pub fn on_enter<F>(mut self, f: F) -> Self
    where
        F: Fn(&State<D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.ops.enter = Some(Box::new(f));
        self
    }

    /// Set the callback run when a transition leaves this state.
    pub fn on_exit<F>(mut self, f: F) -> Self
    where
        F: Fn(&State<D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.ops.exit = Some(Box::new(f));
        self
    }

    /// Set the mandatory callback run on every tick spent in this state.
    pub fn on_run<F>(mut self, f: F) -> Self
    where
        F: Fn(&State<D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.ops.run = Some(Box::new(f));
        self
    }

    /// Numeric id used for lookups.
    pub fn id(&self) -> StateId {
        self.id
    }

    /// Diagnostic name, or `"unnamed"` when none was attached.
    pub fn name(&self) -> &'static str {
        self.name.unwrap_or("unnamed")
    }

    /// User data attached at construction.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// The callback set.
    pub fn ops(&self) -> &StateOps<D> {
        &self.ops
    }

    /// Whether the mandatory run callback is present.
    pub fn is_runnable(&self) -> bool {
        self.ops.run.is_some()
    }

    /// Invoke one of the per-tick callbacks. Absent optional callbacks succeed.
    pub(crate) fn invoke(&self, phase: Lifecycle) -> CallbackResult {
        let callback = match phase {
            Lifecycle::Enter => &self.ops.enter,
            Lifecycle::Exit => &self.ops.exit,
            Lifecycle::Run => &self.ops.run,
            Lifecycle::Setup => return Ok(()),
        };
        callback.as_ref().map_or(Ok(()), |f| f(self))
    }

    pub(crate) fn setup(&self, data: &dyn Any) -> CallbackResult {
        self.ops.setup.as_ref().map_or(Ok(()), |f| f(self, data))
    }
}

impl<D: fmt::Debug> fmt::Debug for State<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("setup", &self.ops.setup.is_some())
            .field("enter", &self.ops.enter.is_some())
            .field("exit", &self.ops.exit.is_some())
            .field("run", &self.ops.run.is_some())
            .field("data", &self.data)
            .finish()
    }
}
