//! Snapshot and Resume
//!
//! This example checkpoints a machine and resumes it after a simulated reset.
//!
//! Key concepts:
//! - Snapshots capture the state triple and counters under the lock
//! - JSON for readability, binary for flash or EEPROM
//! - A pending transition survives the round trip
//!
//! Run with: cargo run --example snapshot_resume

use tickfsm::{state_ids, FsmBuilder, FsmError, Snapshot, State};

state_ids! {
    enum Boot {
        Init = 1,
        Ready = 2,
        Serving = 3,
    }
}

fn state(id: Boot, name: &'static str) -> State<()> {
    State::new(id.id(), ())
        .named(name)
        .on_enter(|s| {
            println!("  enter {}", s.name());
            Ok(())
        })
        .on_run(|_| Ok(()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Snapshot and Resume ===\n");

    let states = [
        state(Boot::Init, "Init"),
        state(Boot::Ready, "Ready"),
        state(Boot::Serving, "Serving"),
    ];

    let fsm = FsmBuilder::new()
        .states(&states)
        .initial(Boot::Init.id())
        .build()?;

    fsm.request_transition(Boot::Ready.id())?;
    fsm.run()?;
    fsm.run()?;
    fsm.request_transition(Boot::Serving.id())?;

    let snapshot = fsm.snapshot()?;
    println!("\nSnapshot as JSON:\n  {}", snapshot.to_json()?);

    let bytes = snapshot.to_binary()?;
    println!("Binary encoding: {} bytes", bytes.len());
    println!("Pending transition: {}\n", snapshot.has_pending_transition());

    drop(fsm);
    println!("-- simulated reset --\n");

    let restored = Snapshot::from_binary(&bytes)?;
    let resumed = FsmBuilder::new()
        .states(&states)
        .resume(restored)
        .build()?;

    println!("Resumed in:     {}", resumed.current_state().name());
    println!("Ticks restored: {}", resumed.tick_count());

    resumed.run()?;
    let current = Boot::try_from(resumed.current_state().id())?;
    println!("After one tick: {current:?}");

    if current != Boot::Serving {
        return Err(FsmError::generic("pending transition was lost").into());
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
