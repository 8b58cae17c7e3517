//! The FSM instance: init, tick, and deferred transition requests.

use crate::checkpoint::Snapshot;
use crate::core::table::position;
use crate::core::{combine, CallbackResult, FsmError, Lifecycle, State, StateId};
use crate::sync::{NoLock, StateLock};
use std::any::Any;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info, trace, warn};

/// Positions of the state triple inside the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Triple {
    pub current: usize,
    pub previous: usize,
    pub next: usize,
}

impl Triple {
    fn at(index: usize) -> Self {
        Self {
            current: index,
            previous: index,
            next: index,
        }
    }
}

/// A running finite state machine over a borrowed state table.
///
/// The table must outlive the machine (`'t`). The machine stores positions
/// into the table, so "same state" always means the same descriptor, never
/// merely an equal id.
///
/// All operations take `&self`: a machine shared between a task loop calling
/// [`run`](Fsm::run) and an interrupt or another task calling
/// [`request_transition`](Fsm::request_transition) needs a lock type other
/// than [`NoLock`].
///
/// # Example
///
/// ```rust
/// use tickfsm::{Fsm, NoLock, State};
///
/// let states = [
///     State::new(1, ()).named("Idle").on_run(|_| Ok(())),
///     State::new(2, ()).named("Active").on_run(|_| Ok(())),
/// ];
///
/// let fsm: Fsm<'_, (), NoLock> = Fsm::init(&states, 1, None)?;
/// fsm.request_transition(2)?;
/// assert_eq!(fsm.current_state().id(), 1);
///
/// fsm.run()?;
/// assert_eq!(fsm.current_state().id(), 2);
/// # Ok::<(), tickfsm::FsmError>(())
/// ```
pub struct Fsm<'t, D, L: StateLock = NoLock> {
    states: &'t [State<D>],
    current: AtomicUsize,
    previous: AtomicUsize,
    next: AtomicUsize,
    ticks: AtomicU64,
    transitions: AtomicU64,
    lock: L,
}

impl<'t, D, L: StateLock> Fsm<'t, D, L> {
    /// Initialize a machine starting in the state with id `initial`.
    ///
    /// Every state is checked for its run callback before any setup runs.
    /// When `setup_data` is given, each state's setup callback is then invoked
    /// with it in table order; the first failure aborts init and is returned
    /// unchanged. Setup already performed on earlier states is not undone.
    pub fn init(
        states: &'t [State<D>],
        initial: StateId,
        setup_data: Option<&dyn Any>,
    ) -> Result<Self, FsmError> {
        if states.is_empty() {
            return Err(FsmError::invalid("state table is empty"));
        }
        let start = position(states, initial).ok_or_else(|| {
            FsmError::invalid(format!("initial state {initial} is not in the table"))
        })?;

        Self::with_triple(states, Triple::at(start), setup_data)
    }

    pub(crate) fn with_triple(
        states: &'t [State<D>],
        triple: Triple,
        setup_data: Option<&dyn Any>,
    ) -> Result<Self, FsmError> {
        setup_states(states, setup_data)?;

        let lock = L::create().map_err(|err| {
            warn!(error = %err, "Failed to create state lock");
            FsmError::generic(format!("failed to create state lock: {err}"))
        })?;

        info!(
            states = states.len(),
            initial = states[triple.current].id(),
            "State machine initialized"
        );

        Ok(Self {
            states,
            current: AtomicUsize::new(triple.current),
            previous: AtomicUsize::new(triple.previous),
            next: AtomicUsize::new(triple.next),
            ticks: AtomicU64::new(0),
            transitions: AtomicU64::new(0),
            lock,
        })
    }

    pub(crate) fn restore_counters(&self, ticks: u64, transitions: u64) {
        self.ticks.store(ticks, Ordering::Relaxed);
        self.transitions.store(transitions, Ordering::Relaxed);
    }

    /// Execute one scheduler tick.
    ///
    /// Applies at most one pending transition (exit of the old state, then
    /// enter of the new one) and always calls the current state's run
    /// callback. Every callback due this tick fires even if an earlier one
    /// failed; the failures are folded into the returned error.
    pub fn run(&self) -> CallbackResult {
        let (active, left) = {
            let _guard = self.lock.acquire()?;
            let current = self.current.load(Ordering::Acquire);
            let next = self.next.load(Ordering::Acquire);
            if current != next {
                self.previous.store(current, Ordering::Release);
                self.current.store(next, Ordering::Release);
                (next, Some(current))
            } else {
                (current, None)
            }
        };

        let mut result = Ok(());
        let state = &self.states[active];

        if let Some(left) = left {
            let previous = &self.states[left];
            debug!(
                from = previous.id(),
                from_name = previous.name(),
                to = state.id(),
                to_name = state.name(),
                "Applying state transition"
            );
            self.transitions.fetch_add(1, Ordering::Relaxed);
            result = combine(result, invoke(previous, Lifecycle::Exit));
            result = combine(result, invoke(state, Lifecycle::Enter));
        }

        self.ticks.fetch_add(1, Ordering::Relaxed);
        combine(result, invoke(state, Lifecycle::Run))
    }

    /// Schedule a transition to the state with id `target`.
    ///
    /// The change is applied by the next [`run`](Fsm::run). Requesting the
    /// current state leaves any pending target untouched. Repeated requests
    /// before a tick overwrite each other; only the last one is applied.
    pub fn request_transition(&self, target: StateId) -> Result<(), FsmError> {
        let index = position(self.states, target).ok_or(FsmError::NotFound(target))?;

        let _guard = self.lock.acquire()?;
        if self.current.load(Ordering::Acquire) != index {
            self.next.store(index, Ordering::Release);
            trace!(state = target, "State transition requested");
        }
        Ok(())
    }

    /// The borrowed state table.
    pub fn states(&self) -> &'t [State<D>] {
        self.states
    }

    pub fn current_state(&self) -> &'t State<D> {
        &self.states[self.current.load(Ordering::Acquire)]
    }

    /// State left by the most recent transition, or the initial state.
    pub fn previous_state(&self) -> &'t State<D> {
        &self.states[self.previous.load(Ordering::Acquire)]
    }

    /// Target of the pending transition, if one is pending.
    ///
    /// Reads are not serialized with concurrent requests; the answer may be
    /// stale by the time it is inspected.
    pub fn pending_state(&self) -> Option<&'t State<D>> {
        let states = self.states;
        let next = self.next.load(Ordering::Acquire);
        (next != self.current.load(Ordering::Acquire)).then(|| &states[next])
    }

    /// Number of ticks executed by [`run`](Fsm::run).
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Number of transitions applied so far.
    pub fn transition_count(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }

    /// Capture the state triple and counters under the lock.
    pub fn snapshot(&self) -> Result<Snapshot, FsmError> {
        let triple = {
            let _guard = self.lock.acquire()?;
            Triple {
                current: self.current.load(Ordering::Acquire),
                previous: self.previous.load(Ordering::Acquire),
                next: self.next.load(Ordering::Acquire),
            }
        };

        Ok(Snapshot::new(
            self.states[triple.current].id(),
            self.states[triple.previous].id(),
            self.states[triple.next].id(),
            self.tick_count(),
            self.transition_count(),
        ))
    }
}

fn setup_states<D>(states: &[State<D>], setup_data: Option<&dyn Any>) -> CallbackResult {
    if let Some((index, state)) = states
        .iter()
        .enumerate()
        .find(|(_, state)| !state.is_runnable())
    {
        return Err(FsmError::invalid(format!(
            "state {} at position {index} has no run callback",
            state.id()
        )));
    }

    let Some(data) = setup_data else {
        return Ok(());
    };
    for state in states {
        state.setup(data).inspect_err(|err| {
            warn!(
                state = state.id(),
                phase = %Lifecycle::Setup,
                error = %err,
                "State setup failed"
            );
        })?;
    }
    Ok(())
}

fn invoke<D>(state: &State<D>, phase: Lifecycle) -> CallbackResult {
    state.invoke(phase).inspect_err(|err| {
        warn!(
            state = state.id(),
            name = state.name(),
            %phase,
            error = %err,
            "State callback failed"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use crate::sync::ParkingLotLock;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    fn tracked(id: StateId, name: &'static str, log: &Log) -> State<()> {
        let (enter, exit, run) = (log.clone(), log.clone(), log.clone());
        State::new(id, ())
            .named(name)
            .on_enter(move |s| {
                enter.lock().push(format!("{}.enter", s.name()));
                Ok(())
            })
            .on_exit(move |s| {
                exit.lock().push(format!("{}.exit", s.name()));
                Ok(())
            })
            .on_run(move |s| {
                run.lock().push(format!("{}.run", s.name()));
                Ok(())
            })
    }

    fn three_states(log: &Log) -> Vec<State<()>> {
        vec![
            tracked(1, "Idle", log),
            tracked(2, "Active", log),
            tracked(3, "Error", log),
        ]
    }

    fn drain(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.lock())
    }

    #[test]
    fn init_points_triple_at_initial_state() {
        let log = Log::default();
        let states = three_states(&log);

        let fsm: Fsm<'_, (), NoLock> = Fsm::init(&states, 2, None).unwrap();

        assert_eq!(fsm.current_state().id(), 2);
        assert_eq!(fsm.previous_state().id(), 2);
        assert!(fsm.pending_state().is_none());
        assert_eq!(fsm.tick_count(), 0);
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn init_rejects_empty_table() {
        let states: Vec<State<()>> = Vec::new();

        let result = Fsm::<(), NoLock>::init(&states, 1, None);

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::InvalidArgument));
    }

    #[test]
    fn init_rejects_unknown_initial_state() {
        let log = Log::default();
        let states = three_states(&log);

        let result = Fsm::<(), NoLock>::init(&states, 42, None);

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::InvalidArgument));
    }

    #[test]
    fn init_rejects_state_without_run() {
        let states = vec![State::new(1, ()).on_run(|_| Ok(())), State::new(2, ())];

        let result = Fsm::<(), NoLock>::init(&states, 1, None);

        assert!(matches!(result, Err(FsmError::InvalidArgument(_))));
    }

    #[test]
    fn missing_run_is_rejected_before_any_setup() {
        let log = Log::default();
        let hits = log.clone();
        let states = vec![
            State::new(1, ())
                .on_setup(move |_, _| {
                    hits.lock().push("setup-1".to_string());
                    Ok(())
                })
                .on_run(|_| Ok(())),
            State::new(2, ()).on_setup(|_, _| Ok(())),
        ];

        let result = Fsm::<(), NoLock>::init(&states, 1, Some(&()));

        assert!(matches!(result, Err(FsmError::InvalidArgument(_))));
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn setup_runs_once_per_state_in_table_order() {
        let log = Log::default();
        let states: Vec<State<()>> = (1..=3)
            .map(|id| {
                let log = log.clone();
                State::new(id, ())
                    .on_setup(move |s, blob| {
                        let tag = blob.downcast_ref::<&str>().copied().unwrap_or("?");
                        log.lock().push(format!("{tag}{}", s.id()));
                        Ok(())
                    })
                    .on_run(|_| Ok(()))
            })
            .collect();

        let fsm = Fsm::<(), NoLock>::init(&states, 1, Some(&"setup-")).unwrap();

        assert_eq!(drain(&log), vec!["setup-1", "setup-2", "setup-3"]);
        assert_eq!(fsm.current_state().id(), 1);
    }

    #[test]
    fn setup_skipped_without_setup_data() {
        let log = Log::default();
        let hits = log.clone();
        let states = vec![State::new(1, ())
            .on_setup(move |_, _| {
                hits.lock().push("setup".to_string());
                Ok(())
            })
            .on_run(|_| Ok(()))];

        Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        assert!(drain(&log).is_empty());
    }

    #[test]
    fn setup_failure_aborts_init_without_rollback() {
        let log = Log::default();
        let (first, third) = (log.clone(), log.clone());
        let states = vec![
            State::new(1, ())
                .on_setup(move |_, _| {
                    first.lock().push("setup-1".to_string());
                    Ok(())
                })
                .on_run(|_| Ok(())),
            State::new(2, ())
                .on_setup(|_, _| Err(FsmError::generic("sensor offline")))
                .on_run(|_| Ok(())),
            State::new(3, ())
                .on_setup(move |_, _| {
                    third.lock().push("setup-3".to_string());
                    Ok(())
                })
                .on_run(|_| Ok(())),
        ];

        let result = Fsm::<(), NoLock>::init(&states, 1, Some(&()));

        assert_eq!(result.err(), Some(FsmError::generic("sensor offline")));
        assert_eq!(drain(&log), vec!["setup-1"]);
    }

    #[test]
    fn lock_creation_failure_is_generic_error() {
        struct BrokenLock;

        impl StateLock for BrokenLock {
            type Guard<'a> = ();

            fn create() -> Result<Self, FsmError> {
                Err(FsmError::generic("no mutex available"))
            }

            fn acquire(&self) -> Result<Self::Guard<'_>, FsmError> {
                Ok(())
            }
        }

        let log = Log::default();
        let states = three_states(&log);

        let result = Fsm::<(), BrokenLock>::init(&states, 1, None);

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Generic));
    }

    #[test]
    fn transition_is_deferred_until_run() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(2).unwrap();

        assert_eq!(fsm.current_state().id(), 1);
        assert_eq!(fsm.pending_state().map(State::id), Some(2));
        assert!(drain(&log).is_empty());

        fsm.run().unwrap();

        assert_eq!(drain(&log), vec!["Idle.exit", "Active.enter", "Active.run"]);
        assert_eq!(fsm.current_state().id(), 2);
        assert_eq!(fsm.previous_state().id(), 1);
        assert!(fsm.pending_state().is_none());
        assert_eq!(fsm.transition_count(), 1);
    }

    #[test]
    fn stable_run_only_calls_run() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        for _ in 0..3 {
            fsm.run().unwrap();
        }

        assert_eq!(drain(&log), vec!["Idle.run", "Idle.run", "Idle.run"]);
        assert_eq!(fsm.tick_count(), 3);
        assert_eq!(fsm.transition_count(), 0);
    }

    #[test]
    fn self_transition_is_noop() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(1).unwrap();
        fsm.run().unwrap();

        assert_eq!(drain(&log), vec!["Idle.run"]);
        assert_eq!(fsm.current_state().id(), fsm.previous_state().id());
    }

    #[test]
    fn last_request_wins() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(2).unwrap();
        fsm.request_transition(3).unwrap();
        fsm.run().unwrap();

        assert_eq!(drain(&log), vec!["Idle.exit", "Error.enter", "Error.run"]);
        assert_eq!(fsm.current_state().id(), 3);
    }

    #[test]
    fn requesting_current_state_keeps_pending_target() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(2).unwrap();
        fsm.request_transition(1).unwrap();
        fsm.run().unwrap();

        assert_eq!(fsm.current_state().id(), 2);
    }

    #[test]
    fn unknown_target_is_not_found_and_leaves_pending() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(3).unwrap();

        assert_eq!(fsm.request_transition(99), Err(FsmError::NotFound(99)));
        assert_eq!(fsm.pending_state().map(State::id), Some(3));
    }

    #[test]
    fn one_transition_per_run() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(2).unwrap();
        fsm.run().unwrap();
        drain(&log);

        fsm.run().unwrap();

        assert_eq!(drain(&log), vec!["Active.run"]);
    }

    #[test]
    fn exit_failure_is_reported_but_tick_completes() {
        let log = Log::default();
        let (enter, run) = (log.clone(), log.clone());
        let states = vec![
            State::new(1, ())
                .on_exit(|_| Err(FsmError::generic("exit failed")))
                .on_run(|_| Ok(())),
            State::new(2, ())
                .on_enter(move |_| {
                    enter.lock().push("enter".to_string());
                    Ok(())
                })
                .on_run(move |_| {
                    run.lock().push("run".to_string());
                    Ok(())
                }),
        ];
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(2).unwrap();
        let result = fsm.run();

        assert_eq!(result, Err(FsmError::generic("exit failed")));
        assert_eq!(drain(&log), vec!["enter", "run"]);
        assert_eq!(fsm.current_state().id(), 2);

        assert_eq!(fsm.run(), Ok(()));
    }

    #[test]
    fn failing_run_keeps_machine_ticking() {
        let states = vec![State::new(1, ()).on_run(|_| Err(FsmError::generic("busy")))];
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        assert!(fsm.run().is_err());
        assert!(fsm.run().is_err());
        assert_eq!(fsm.tick_count(), 2);
    }

    #[test]
    fn acquire_failure_is_propagated() {
        struct RefusingLock;

        impl StateLock for RefusingLock {
            type Guard<'a> = ();

            fn create() -> Result<Self, FsmError> {
                Ok(RefusingLock)
            }

            fn acquire(&self) -> Result<Self::Guard<'_>, FsmError> {
                Err(FsmError::generic("mutex wait failed"))
            }
        }

        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), RefusingLock>::init(&states, 1, None).unwrap();

        assert_eq!(fsm.request_transition(2).map_err(|e| e.kind()), Err(ErrorKind::Generic));
        assert!(fsm.run().is_err());
        assert!(fsm.snapshot().is_err());
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn works_with_parking_lot_lock() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), ParkingLotLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(3).unwrap();
        fsm.run().unwrap();

        assert_eq!(fsm.current_state().id(), 3);
    }

    #[test]
    fn snapshot_reports_ids_and_counters() {
        let log = Log::default();
        let states = three_states(&log);
        let fsm = Fsm::<(), NoLock>::init(&states, 1, None).unwrap();

        fsm.request_transition(2).unwrap();
        fsm.run().unwrap();
        fsm.request_transition(3).unwrap();

        let snapshot = fsm.snapshot().unwrap();

        assert_eq!(snapshot.current, 2);
        assert_eq!(snapshot.previous, 1);
        assert_eq!(snapshot.next, 3);
        assert_eq!(snapshot.ticks, 1);
        assert_eq!(snapshot.transitions, 1);
    }
}
