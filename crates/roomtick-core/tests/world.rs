mod common;

use std::sync::Arc;

use common::{creep, mover, room, run, step};
use roomtick_core::{
    BodyPartType, CancelSource, CancelToken, Direction, EngineConfig, EngineError, MemoryStats,
    MemoryStore, ObjectId, ObjectIntent, Position, RecordingDeathProcessor, RoomEntity, RoomJob,
    RoomName, RoomObject, RoomState, SnapshotError, StatKind, Terrain, UserId, WorldRunner,
    RESOURCE_ENERGY,
};

fn named(name: &str, tick: u64) -> RoomState {
    RoomState::new(RoomName::from(name), tick, Terrain::plain(50))
}

async fn seed(store: &MemoryStore, rooms: &[RoomState]) {
    futures::future::join_all(rooms.iter().map(|room| store.seed(room))).await;
}

fn jobs(rooms: &[RoomState]) -> Vec<RoomJob> {
    rooms.iter().cloned().map(RoomJob::from_state).collect()
}

/// A room with a bit of everything: a swap, contention, a crash and a fight.
fn busy_room() -> RoomState {
    let mut state = room();
    state.terrain.set(Position::new(30, 30), roomtick_core::TerrainKind::Wall);
    state.insert(mover("a", "alice", 10, 10));
    state.insert(mover("b", "alice", 11, 10));
    state.insert(mover("c", "bob", 20, 21));
    state.insert(mover("d", "carol", 21, 20));
    state.insert(mover("e", "bob", 29, 30));
    state.insert(creep(
        "f",
        "alice",
        40,
        40,
        &[BodyPartType::Attack, BodyPartType::Move],
    ));
    state.insert(creep("g", "bob", 41, 40, &[BodyPartType::Attack]));
    step(&mut state, "a", Direction::Right);
    step(&mut state, "b", Direction::Left);
    step(&mut state, "c", Direction::TopRight);
    step(&mut state, "d", Direction::BottomLeft);
    step(&mut state, "e", Direction::Right);
    state.intents.push(
        UserId::from("alice"),
        ObjectId::from("f"),
        ObjectIntent::Attack { id: "g".into() },
    );
    state
}

#[test]
fn identical_input_gives_identical_output() {
    let state = busy_room();
    let first = run(&state);
    let second = run(&state);

    let encode = |r: &common::TickResult| serde_json::to_string(&r.batch).unwrap();
    assert_eq!(encode(&first), encode(&second));
    assert_eq!(first.deaths, second.deaths);
    assert_eq!(first.global, second.global);

    // Reloading the snapshot from JSON changes nothing either.
    let reloaded: RoomState =
        serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();
    assert_eq!(encode(&run(&reloaded)), encode(&first));
}

#[test]
fn one_document_per_object() {
    let state = busy_room();
    let result = run(&state);
    let mut ids: Vec<_> = result.batch.changes.iter().map(|c| c.id.clone()).collect();
    let before = ids.len();
    ids.dedup();
    assert_eq!(ids.len(), before);
}

#[test]
fn malformed_intent_records_do_not_fail_the_room() {
    let mut state = room();
    state.insert(mover("a", "alice", 10, 10));
    step(&mut state, "a", Direction::Right);

    let mut json = serde_json::to_value(&state).unwrap();
    let intents = &mut json["intents"];
    intents["alice"]["creeps"]["junk"] = serde_json::json!(42);
    intents["alice"]["objects"]["a"] = serde_json::json!({ "intent": "attack", "id": "x" });
    intents["mallory"] = serde_json::json!(7);

    let reloaded: RoomState = serde_json::from_value(json).expect("snapshot still loads");
    let result = run(&reloaded);
    assert_eq!(result.moved_to("a"), Some(Position::new(11, 10)));
    assert!(result.deaths.is_empty());
}

#[tokio::test]
async fn world_tick_commits_rooms_and_moves_travellers() {
    let mut origin = named("E0S0", 5);
    origin.insert(mover("traveller", "alice", 0, 0));
    step(&mut origin, "traveller", Direction::Left);
    let mut busy = named("E1S1", 5);
    busy.insert(mover("local", "bob", 10, 10));
    step(&mut busy, "local", Direction::Bottom);
    let destination = named("W0S0", 5);
    let rooms = vec![busy, destination, origin];

    let store = Arc::new(MemoryStore::new());
    seed(&store, &rooms).await;
    let config = EngineConfig {
        max_parallel_rooms: 2,
        ..EngineConfig::default()
    };
    let runner = WorldRunner::new(config, store.clone());

    let report = runner
        .run_tick(jobs(&rooms), &CancelToken::never())
        .await
        .unwrap();

    let names: Vec<_> = report.rooms.iter().map(|r| r.room.as_str()).collect();
    assert_eq!(names, vec!["E0S0", "E1S1", "W0S0"]);
    assert_eq!(report.global.len(), 1);

    let traveller = ObjectId::from("traveller");
    assert!(store
        .object(&RoomName::from("E0S0"), &traveller)
        .await
        .is_none());
    let arrived = store
        .object(&RoomName::from("W0S0"), &traveller)
        .await
        .expect("traveller arrived");
    assert_eq!(arrived.pos(), Position::new(49, 0));

    let local = store
        .object(&RoomName::from("E1S1"), &ObjectId::from("local"))
        .await
        .expect("local creep");
    assert_eq!(local.pos(), Position::new(10, 11));

    let stored = store.room(&RoomName::from("E1S1")).await.unwrap();
    assert_eq!(stored.last_tick, Some(5));
    let info = stored.info.expect("room info");
    assert!(info.active);
    assert!(stored.map_view.is_some());
}

#[tokio::test]
async fn killed_creep_leaves_a_tombstone_and_a_stat() {
    let mut state = named("E2S2", 12);
    state.insert(creep(
        "x",
        "alice",
        10,
        10,
        &[BodyPartType::Attack, BodyPartType::Attack],
    ));
    state.insert(creep("t", "bob", 11, 10, &[BodyPartType::Move]));
    state.intents.push(
        UserId::from("alice"),
        ObjectId::from("x"),
        ObjectIntent::Attack { id: "t".into() },
    );

    let store = Arc::new(MemoryStore::new());
    store.seed(&state).await;
    let stats = Arc::new(MemoryStats::new());
    let runner =
        WorldRunner::new(EngineConfig::default(), store.clone()).with_stats(stats.clone());

    let report = runner
        .run_tick(vec![RoomJob::from_state(state.clone())], &CancelToken::never())
        .await
        .unwrap();

    assert!(store.object(&state.room, &ObjectId::from("t")).await.is_none());
    let tomb = store
        .object(&state.room, &ObjectId::from("t-tomb-12"))
        .await
        .expect("tombstone");
    match tomb {
        RoomObject::Tombstone(t) => {
            assert!(t.killed);
            assert_eq!(t.pos, Position::new(11, 10));
            assert_eq!(t.store.get(RESOURCE_ENERGY), 6);
        }
        other => panic!("expected a tombstone, got {other:?}"),
    }

    let bob = UserId::from("bob");
    assert_eq!(stats.totals().await.get(&bob, StatKind::CreepsLost), 1);
    assert_eq!(report.rooms[0].stats.get(&bob, StatKind::CreepsLost), 1);
    assert_eq!(report.rooms[0].notifications.len(), 1);
}

#[tokio::test]
async fn recording_processor_leaves_crashed_creep_in_place() {
    let mut state = named("E3S3", 1);
    state.terrain.set(Position::new(11, 10), roomtick_core::TerrainKind::Wall);
    state.insert(mover("a", "alice", 10, 10));
    step(&mut state, "a", Direction::Right);

    let store = Arc::new(MemoryStore::new());
    store.seed(&state).await;
    let deaths = Arc::new(RecordingDeathProcessor::new());
    let runner = WorldRunner::new(EngineConfig::default(), store.clone())
        .with_death_processor(deaths.clone());

    runner
        .run_tick(vec![RoomJob::from_state(state.clone())], &CancelToken::never())
        .await
        .unwrap();

    let calls = deaths.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].violent);
    let kept = store.object(&state.room, &ObjectId::from("a")).await;
    assert_eq!(kept.map(|o| o.pos()), Some(Position::new(10, 10)));
}

#[tokio::test]
async fn cancelled_tick_commits_nothing() {
    let mut state = named("E4S4", 3);
    state.insert(mover("a", "alice", 10, 10));
    step(&mut state, "a", Direction::Right);

    let store = Arc::new(MemoryStore::new());
    store.seed(&state).await;
    let runner = WorldRunner::new(EngineConfig::default(), store.clone());

    let source = CancelSource::new();
    source.cancel();
    let result = runner
        .run_tick(vec![RoomJob::from_state(state.clone())], &source.token())
        .await;

    assert!(matches!(result, Err(EngineError::Cancelled)));
    let stored = store.room(&state.room).await.unwrap();
    assert_eq!(stored.last_tick, None);
    let a = store.object(&state.room, &ObjectId::from("a")).await.unwrap();
    assert_eq!(a.pos(), Position::new(10, 10));
}

#[tokio::test]
async fn malformed_snapshot_fails_the_tick() {
    let mut state = named("E5S5", 3);
    state
        .objects
        .insert(ObjectId::from("wrong"), mover("a", "alice", 10, 10));

    let store = Arc::new(MemoryStore::new());
    store.seed(&state).await;
    let runner = WorldRunner::new(EngineConfig::default(), store.clone());

    let result = runner
        .run_tick(vec![RoomJob::from_state(state)], &CancelToken::never())
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Snapshot(SnapshotError::KeyMismatch { .. }))
    ));
}
