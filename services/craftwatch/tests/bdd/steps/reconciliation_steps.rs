//! BDD step definitions for reconciliation feature

use cucumber::{given, then, when};

use craftwatch::reconciler::MonitorState;

use crate::world::CraftwatchWorld;

#[given(expr = "the server was last seen {word}")]
fn last_seen(world: &mut CraftwatchWorld, state: String) {
    let online = match state.as_str() {
        "online" => true,
        "offline" => false,
        other => panic!("Unknown state: {}", other),
    };
    world.prior_state = Some(MonitorState {
        last_known_online: Some(online),
        last_reported_counts: None,
    });
}

#[when("the poll loop ticks once")]
async fn tick_once(world: &mut CraftwatchWorld) {
    world.tick().await;
}

#[when(expr = "the poll loop ticks {int} times")]
async fn tick_times(world: &mut CraftwatchWorld, times: usize) {
    for _ in 0..times {
        world.tick().await;
    }
}

#[then(expr = "the server is reported online with {int} of {int} players")]
fn reported_online(world: &mut CraftwatchWorld, online: u32, max: u32) {
    let result = world.last_tick().result;
    assert!(result.online, "expected online, got {:?}", result);
    assert_eq!((result.online_count, result.max_count), (online, max));
}

#[then("the server is reported offline with no players")]
fn reported_offline(world: &mut CraftwatchWorld) {
    let result = world.last_tick().result;
    assert!(!result.online, "expected offline, got {:?}", result);
    assert_eq!((result.online_count, result.max_count), (0, 0));
}

#[then("no transition is reported")]
fn no_transition(world: &mut CraftwatchWorld) {
    for (i, tick) in world.ticks.iter().enumerate() {
        assert!(
            !tick.result.transitioned,
            "tick {} unexpectedly transitioned",
            i + 1
        );
    }
}

#[then(expr = "tick {int} transitions to {word}")]
fn tick_transitions(world: &mut CraftwatchWorld, number: usize, state: String) {
    let result = world.tick_number(number).result;
    assert!(result.transitioned, "tick {} did not transition", number);
    assert_eq!(result.became_online, state == "online");
}

#[then(expr = "tick {int} does not transition")]
fn tick_does_not_transition(world: &mut CraftwatchWorld, number: usize) {
    assert!(!world.tick_number(number).result.transitioned);
}

#[then(expr = "the monitor state remembers the server as {word}")]
fn state_remembers(world: &mut CraftwatchWorld, state: String) {
    let reconciler = world.reconciler.as_ref().expect("no tick was run");
    assert_eq!(
        reconciler.state().last_known_online,
        Some(state == "online")
    );
}
