#![allow(dead_code)]

use roomtick_core::{
    BodyPart, BodyPartType, CancelToken, Creep, CreepIntent, DeathRecord, Direction,
    EngineConfig, ExitTopology, GlobalEnvelope, GlobalMutationQueue, MoveIntent, ObjectChange,
    ObjectId, ObjectPatch, PendingChange, Pipeline, Position, PowerCreep, PullIntent,
    RecordingDeathProcessor, RoomBatch, RoomName, RoomObject, RoomProcessorContext, RoomState,
    Store, Structure, StructureKind, Terrain, TickStats, UserId,
};

pub const ROOM: &str = "E1S1";

pub fn room() -> RoomState {
    RoomState::new(RoomName::from(ROOM), 1000, Terrain::plain(50))
}

pub fn creep(id: &str, owner: &str, x: i32, y: i32, body: &[BodyPartType]) -> RoomObject {
    let body: Vec<BodyPart> = body.iter().copied().map(BodyPart::new).collect();
    let hits = body.len() as u32 * 100;
    RoomObject::Creep(Creep {
        id: ObjectId::from(id),
        name: id.to_string(),
        owner: UserId::from(owner),
        pos: Position::new(x, y),
        hits,
        hits_max: hits,
        fatigue: 0,
        body,
        store: Store::new(),
        ticks_to_live: Some(1000),
        spawning: false,
        notify_when_attacked: true,
        action_log: Default::default(),
    })
}

/// A creep with a single MOVE part.
pub fn mover(id: &str, owner: &str, x: i32, y: i32) -> RoomObject {
    creep(id, owner, x, y, &[BodyPartType::Move])
}

pub fn power_creep(id: &str, owner: &str, x: i32, y: i32) -> RoomObject {
    RoomObject::PowerCreep(PowerCreep {
        id: ObjectId::from(id),
        name: id.to_string(),
        owner: UserId::from(owner),
        pos: Position::new(x, y),
        hits: 1000,
        hits_max: 1000,
        store: Store::new(),
        notify_when_attacked: true,
        action_log: Default::default(),
    })
}

pub fn structure(id: &str, kind: StructureKind, x: i32, y: i32, hits: u32) -> RoomObject {
    RoomObject::Structure(Structure {
        id: ObjectId::from(id),
        pos: Position::new(x, y),
        hits,
        hits_max: hits,
        owner: None,
        store: Store::new(),
        notify_when_attacked: false,
        action_log: Default::default(),
        kind,
    })
}

pub fn step(state: &mut RoomState, id: &str, direction: Direction) {
    let owner = owner_of(state, id);
    let intent = state_intent(state, &owner, id);
    intent.movement = Some(MoveIntent::Direction { direction });
}

pub fn follow(state: &mut RoomState, id: &str, target: &str) {
    let owner = owner_of(state, id);
    let intent = state_intent(state, &owner, id);
    intent.movement = Some(MoveIntent::Follow {
        id: ObjectId::from(target),
    });
}

pub fn pull(state: &mut RoomState, puller: &str, pulled: &str) {
    let owner = owner_of(state, puller);
    let intent = state_intent(state, &owner, puller);
    intent.pull = Some(PullIntent {
        id: ObjectId::from(pulled),
    });
}

fn owner_of(state: &RoomState, id: &str) -> UserId {
    use roomtick_core::RoomEntity;
    state
        .object(&ObjectId::from(id))
        .and_then(|o| o.owner().cloned())
        .expect("intent issuer must be an owned object")
}

fn state_intent<'a>(state: &'a mut RoomState, owner: &UserId, id: &str) -> &'a mut CreepIntent {
    state
        .intents
        .user_mut(owner.clone())
        .creeps
        .entry(ObjectId::from(id))
        .or_default()
}

/// Everything one room tick produced, captured before the buffer is flushed.
#[derive(Debug)]
pub struct TickResult {
    pub batch: RoomBatch,
    pub deaths: Vec<DeathRecord>,
    pub global: Vec<GlobalEnvelope>,
    pub stats: TickStats,
    pub notified: usize,
}

impl TickResult {
    pub fn change(&self, id: &str) -> Option<&PendingChange> {
        let id = ObjectId::from(id);
        self.batch
            .changes
            .iter()
            .find(|c| c.id == id)
            .map(|c| &c.change)
    }

    pub fn patch(&self, id: &str) -> Option<&ObjectPatch> {
        match self.change(id)? {
            PendingChange::Patch { patch } => Some(patch),
            _ => None,
        }
    }

    pub fn moved_to(&self, id: &str) -> Option<Position> {
        self.patch(id).and_then(|p| p.pos)
    }

    pub fn position_patches(&self) -> usize {
        self.batch
            .changes
            .iter()
            .filter(|ObjectChange { change, .. }| {
                matches!(change, PendingChange::Patch { patch } if patch.pos.is_some())
            })
            .count()
    }

    pub fn removals(&self) -> Vec<ObjectId> {
        self.batch
            .changes
            .iter()
            .filter(|c| matches!(c.change, PendingChange::Remove))
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn died(&self, id: &str) -> Vec<&DeathRecord> {
        let id = ObjectId::from(id);
        self.deaths.iter().filter(|d| d.id == id).collect()
    }
}

pub fn run(state: &RoomState) -> TickResult {
    let exits = ExitTopology::from_grid(&state.room, &state.terrain);
    run_with(state, &exits)
}

/// Runs the standard pipeline against a recording death processor.
pub fn run_with(state: &RoomState, exits: &ExitTopology) -> TickResult {
    let config = EngineConfig::default();
    let death = RecordingDeathProcessor::new();
    let mut queue = GlobalMutationQueue::new();
    let mut ctx = RoomProcessorContext::new(
        state,
        exits,
        &config,
        &death,
        queue.sink(state.room.clone()),
    );
    Pipeline::standard()
        .execute(&mut ctx, &CancelToken::never())
        .expect("tick should run");

    let batch = ctx.buffer.batch();
    let stats = ctx.stats.clone();
    let notified = ctx.notifications.len();
    drop(ctx);

    TickResult {
        batch,
        deaths: death.calls(),
        global: queue.drain(),
        stats,
        notified,
    }
}
