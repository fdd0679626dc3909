//! BDD step definitions for player names feature

use std::sync::atomic::Ordering;

use cucumber::{then, when};

use craftwatch::names;

use crate::world::CraftwatchWorld;

#[when("player names are resolved")]
async fn resolve_names(world: &mut CraftwatchWorld) {
    let prober = world.prober();
    let status = prober
        .probe_status()
        .await
        .expect("status probe should succeed");
    let admin = prober.probe_admin_query().await;
    world.names = Some(names::resolve(&status, admin.as_ref()));
}

#[when(expr = "the admin reply {string} is parsed")]
fn parse_reply(world: &mut CraftwatchWorld, reply: String) {
    world.names = Some(names::parse_player_list(&reply));
}

#[then(expr = "the names are {string}")]
fn names_are(world: &mut CraftwatchWorld, expected: String) {
    let names = world.names.as_ref().expect("names were not resolved");
    assert_eq!(names.join(", "), expected);
}

#[then("there are no names")]
fn no_names(world: &mut CraftwatchWorld) {
    let names = world.names.as_ref().expect("names were not resolved");
    assert!(names.is_empty(), "unexpected names {:?}", names);
}

#[then(expr = "the admin query was called {int} time(s)")]
fn admin_called(world: &mut CraftwatchWorld, times: usize) {
    let admin = world
        .admin_probe
        .as_ref()
        .expect("no admin query configured");
    assert_eq!(admin.calls.load(Ordering::SeqCst), times);
}
