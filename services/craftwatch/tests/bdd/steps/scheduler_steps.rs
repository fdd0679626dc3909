//! BDD step definitions for poll loop feature

use std::time::Duration;

use cucumber::{then, when};
use tokio_util::sync::CancellationToken;

use craftwatch::scheduler::PollScheduler;

use crate::world::{CraftwatchWorld, SurfaceWrite};

#[when(expr = "the poll loop runs until {int} presence updates were attempted")]
async fn run_until(world: &mut CraftwatchWorld, limit: usize) {
    let cancel = CancellationToken::new();
    *world.surfaces.cancel_after.lock().unwrap() = Some((limit, cancel.clone()));

    let reconciler = world.take_reconciler();
    let updater = world.take_updater();
    let mut scheduler =
        PollScheduler::new(reconciler, updater, Duration::from_millis(10), cancel);

    tokio::time::timeout(Duration::from_secs(10), scheduler.run())
        .await
        .expect("poll loop did not stop after cancellation");
}

fn count(world: &CraftwatchWorld, predicate: fn(&SurfaceWrite) -> bool) -> usize {
    world
        .surfaces
        .snapshot()
        .iter()
        .filter(|w| predicate(w))
        .count()
}

#[then(expr = "{int} presence updates were attempted")]
fn presence_attempts(world: &mut CraftwatchWorld, expected: usize) {
    assert_eq!(
        count(world, |w| matches!(w, SurfaceWrite::Presence(..))),
        expected
    );
}

#[then(expr = "{int} topic updates were attempted")]
fn topic_attempts(world: &mut CraftwatchWorld, expected: usize) {
    assert_eq!(
        count(world, |w| matches!(w, SurfaceWrite::Topic(_))),
        expected
    );
}

#[then(expr = "the tick finished within {int} milliseconds")]
fn tick_bounded(world: &mut CraftwatchWorld, millis: u64) {
    let elapsed = world.last_tick().elapsed;
    assert!(
        elapsed < Duration::from_millis(millis),
        "tick took {:?}",
        elapsed
    );
}
