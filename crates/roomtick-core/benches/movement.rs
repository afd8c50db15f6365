use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use roomtick_core::{
    BodyPart, BodyPartType, CancelToken, Creep, CreepIntent, Direction, EngineConfig,
    ExitTopology, GlobalMutationQueue, MoveIntent, ObjectId, Position, RecordingDeathProcessor,
    RoomName, RoomObject, RoomProcessorContext, RoomState, RoomStep, MovementStep, Store, Terrain,
    UserId,
};

/// `count` creeps packed row by row, each stepping in a direction picked
/// from its index, so swaps, trains and contention all show up.
fn crowded_room(count: usize) -> RoomState {
    let mut state = RoomState::new(RoomName::from("E5N5"), 1, Terrain::plain(50));
    let side = (count as f64).sqrt().ceil() as i32;
    let owner = UserId::from("bench");
    for i in 0..count {
        let id = ObjectId::new(format!("c{i:05}"));
        let pos = Position::new(1 + i as i32 % side, 1 + i as i32 / side);
        state.insert(RoomObject::Creep(Creep {
            id: id.clone(),
            name: id.to_string(),
            owner: owner.clone(),
            pos,
            hits: 100,
            hits_max: 100,
            fatigue: 0,
            body: vec![BodyPart::new(BodyPartType::Move)],
            store: Store::new(),
            ticks_to_live: Some(1500),
            spawning: false,
            notify_when_attacked: false,
            action_log: Default::default(),
        }));
        state.intents.set_creep(
            owner.clone(),
            id,
            CreepIntent {
                movement: Some(MoveIntent::Direction {
                    direction: Direction::ALL[(i * 7) % 8],
                }),
                pull: None,
            },
        );
    }
    state
}

fn bench_movement(c: &mut Criterion) {
    let config = EngineConfig::default();
    let exits = ExitTopology::new();
    let death = RecordingDeathProcessor::new();
    let queue = GlobalMutationQueue::new();
    let cancel = CancelToken::never();

    let mut group = c.benchmark_group("roomtick/movement");
    for &n in &[100usize, 1_000usize] {
        let state = crowded_room(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &state, |b, state| {
            b.iter(|| {
                let mut ctx = RoomProcessorContext::new(
                    state,
                    &exits,
                    &config,
                    &death,
                    queue.sink(state.room.clone()),
                );
                MovementStep.run(&mut ctx, &cancel).unwrap();
                black_box(ctx.buffer.len());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_movement);
criterion_main!(benches);
