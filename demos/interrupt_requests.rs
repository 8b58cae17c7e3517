//! Requests From Another Context
//!
//! This example shares a machine between a task loop and a thread that
//! plays the role of an interrupt handler.
//!
//! Key concepts:
//! - `ParkingLotLock` serializes requests against the tick's state swap
//! - Requests from the "interrupt" land on the next tick, never mid-tick
//! - Callbacks run outside the lock
//!
//! Run with: cargo run --example interrupt_requests

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tickfsm::{state_ids, Fsm, FsmBuilder, FsmError, ParkingLotLock, State};

state_ids! {
    enum Pump {
        Idle = 1,
        Pumping = 2,
        Alarm = 3,
    }
}

fn state(id: Pump, name: &'static str) -> State<()> {
    State::new(id.id(), ())
        .named(name)
        .on_enter(|s| {
            println!("  [task] entered {}", s.name());
            Ok(())
        })
        .on_exit(|s| {
            println!("  [task] left {}", s.name());
            Ok(())
        })
        .on_run(|_| Ok(()))
}

fn main() -> Result<(), FsmError> {
    println!("=== Requests From Another Context ===\n");

    let states = [
        state(Pump::Idle, "Idle"),
        state(Pump::Pumping, "Pumping"),
        state(Pump::Alarm, "Alarm"),
    ];

    let fsm: Fsm<'_, (), ParkingLotLock> = FsmBuilder::new()
        .states(&states)
        .initial(Pump::Idle.id())
        .synchronized::<ParkingLotLock>()
        .build()?;
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        let interrupt = scope.spawn(|| -> Result<(), FsmError> {
            for target in [Pump::Pumping, Pump::Alarm, Pump::Idle] {
                thread::sleep(Duration::from_millis(20));
                println!("  [irq] requesting {target:?}");
                fsm.request_transition(target.id())?;
            }
            done.store(true, Ordering::Release);
            Ok(())
        });

        while !done.load(Ordering::Acquire) {
            fsm.run()?;
            thread::sleep(Duration::from_millis(5));
        }

        interrupt
            .join()
            .map_err(|_| FsmError::generic("interrupt thread panicked"))?
    })?;

    // Apply whatever the last request left pending.
    fsm.run()?;

    println!("\nFinal state:         {}", fsm.current_state().name());
    println!("Ticks executed:      {}", fsm.tick_count());
    println!("Transitions applied: {}", fsm.transition_count());

    println!("\n=== Example Complete ===");
    Ok(())
}
