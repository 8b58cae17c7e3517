//! Traffic Light Tick Loop
//!
//! This example drives a cyclic state machine from a main loop.
//!
//! Key concepts:
//! - Static state table with per-state user data
//! - Setup blob distributed to every state during init
//! - Deferred transitions applied on the next tick
//! - Main loop deciding when to move on
//!
//! Run with: cargo run --example traffic_light

use std::sync::atomic::{AtomicU32, Ordering};
use tickfsm::{state_ids, FsmBuilder, FsmError, State};

state_ids! {
    enum Light {
        Red = 1,
        Green = 2,
        Amber = 3,
    }
}

/// Ticks spent in a state and how many it should last.
#[derive(Default)]
struct Dwell {
    elapsed: AtomicU32,
    limit: AtomicU32,
}

fn light(id: Light, name: &'static str) -> State<Dwell> {
    State::new(id.id(), Dwell::default())
        .named(name)
        .on_setup(|state, blob| {
            let durations = blob
                .downcast_ref::<[u32; 3]>()
                .ok_or_else(|| FsmError::generic("expected dwell durations"))?;
            let limit = durations[(state.id() - 1) as usize];
            state.data().limit.store(limit, Ordering::Relaxed);
            Ok(())
        })
        .on_enter(|state| {
            state.data().elapsed.store(0, Ordering::Relaxed);
            println!("  -> {}", state.name());
            Ok(())
        })
        .on_run(|state| {
            let elapsed = state.data().elapsed.fetch_add(1, Ordering::Relaxed) + 1;
            println!("     {} tick {elapsed}", state.name());
            Ok(())
        })
}

fn following(current: Light) -> Light {
    match current {
        Light::Red => Light::Green,
        Light::Green => Light::Amber,
        Light::Amber => Light::Red,
    }
}

fn main() -> Result<(), FsmError> {
    println!("=== Traffic Light Tick Loop ===\n");

    let states = [
        light(Light::Red, "Red"),
        light(Light::Green, "Green"),
        light(Light::Amber, "Amber"),
    ];
    let durations: [u32; 3] = [3, 4, 1];

    let fsm = FsmBuilder::new()
        .states(&states)
        .initial(Light::Red.id())
        .setup_data(&durations)
        .strict()
        .build()?;

    println!("Initial state: {}\n", fsm.current_state().name());

    for _ in 0..16 {
        fsm.run()?;

        let state = fsm.current_state();
        let dwell = state.data();
        if dwell.elapsed.load(Ordering::Relaxed) >= dwell.limit.load(Ordering::Relaxed) {
            let current = Light::try_from(state.id())?;
            fsm.request_transition(following(current).id())?;
        }
    }

    println!("\nTicks executed:      {}", fsm.tick_count());
    println!("Transitions applied: {}", fsm.transition_count());

    println!("\n=== Example Complete ===");
    Ok(())
}
