//! Death handling for creeps and power creeps.
//!
//! Resolvers never build tombstones themselves. They call [`dispatch_death`],
//! which advances the object's tick state first and only then hands the
//! object to the configured [`DeathProcessor`]; an object that is already
//! dead or gone is skipped, so every object dies at most once per tick.

use std::sync::Mutex;

use crate::{
    EnergyLedger, EnergyReason, ObjectFate, ObjectId, RoomEntity, RoomEvent, RoomObject,
    RoomProcessorContext, StatKind, Tombstone, RESOURCE_ENERGY,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeathOptions {
    /// Killed by combat damage rather than by a movement crash.
    pub violent: bool,
}

/// Turns a dying object into its consequences: tombstones, drops, stats.
pub trait DeathProcessor: Send + Sync {
    fn process(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        object: &RoomObject,
        options: DeathOptions,
        ledger: &mut EnergyLedger,
    );
}

/// Kills `object` unless it already died or left the room this tick.
/// Returns whether the death processor ran.
///
/// Crashes start from an empty ledger; violent deaths receive whatever the
/// tick has credited to the object so far.
pub fn dispatch_death(
    ctx: &mut RoomProcessorContext<'_>,
    object: &RoomObject,
    options: DeathOptions,
) -> bool {
    let id = object.id().clone();
    let fate = if options.violent {
        ObjectFate::Killed
    } else {
        ObjectFate::Crashed
    };
    if !ctx.buffer.transition(&id, fate) {
        tracing::debug!(
            object = %id,
            fate = ?ctx.buffer.fate(&id),
            "Object already resolved this tick; death skipped"
        );
        return false;
    }

    let mut ledger = if options.violent {
        ctx.take_ledger(&id)
    } else {
        EnergyLedger::new()
    };
    let death = ctx.death;
    death.process(ctx, object, options, &mut ledger);
    true
}

/// Removes the body and leaves a tombstone holding the carried resources,
/// the ledger energy and a share of the body's spawn cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardDeathProcessor;

impl StandardDeathProcessor {
    fn tombstone_id(id: &ObjectId, tick: u64) -> ObjectId {
        ObjectId::new(format!("{id}-tomb-{tick}"))
    }
}

impl DeathProcessor for StandardDeathProcessor {
    fn process(
        &self,
        ctx: &mut RoomProcessorContext<'_>,
        object: &RoomObject,
        options: DeathOptions,
        ledger: &mut EnergyLedger,
    ) {
        let tick = ctx.state.tick;
        let config = ctx.config;
        let settings = &config.death;
        let (name, owner, mut store, parts) = match object {
            RoomObject::Creep(creep) => {
                let life = settings.creep_life_time.max(1);
                let ttl = creep.ticks_to_live.unwrap_or(life).min(life);
                let cost: u32 = creep.body.iter().map(|p| p.kind.cost()).sum();
                let reclaimed =
                    (cost as f64 * ttl as f64 / life as f64 * settings.corpse_rate).floor() as u32;
                ledger.credit(EnergyReason::Body, reclaimed);
                ctx.stats.inc(&creep.owner, StatKind::CreepsLost, 1);
                (
                    creep.name.clone(),
                    creep.owner.clone(),
                    creep.store.clone(),
                    creep.body.len() as u64,
                )
            }
            RoomObject::PowerCreep(creep) => (
                creep.name.clone(),
                creep.owner.clone(),
                creep.store.clone(),
                1,
            ),
            other => {
                ctx.buffer.remove(other.id());
                return;
            }
        };
        store.add(RESOURCE_ENERGY, ledger.total());

        let id = object.id();
        ctx.buffer.remove(id);
        ctx.buffer.upsert(RoomObject::Tombstone(Tombstone {
            id: Self::tombstone_id(id, tick),
            pos: object.pos(),
            creep_id: id.clone(),
            creep_name: name,
            owner: Some(owner),
            store,
            death_time: tick,
            decay_time: tick + parts.max(1) * settings.tombstone_decay_per_part,
            killed: options.violent,
        }));
        ctx.events.push(RoomEvent::ObjectDestroyed {
            object_id: id.clone(),
            object_type: object.type_name().to_string(),
        });
        tracing::debug!(object = %id, violent = options.violent, "Creep died");
    }
}

/// One call observed by [`RecordingDeathProcessor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeathRecord {
    pub id: ObjectId,
    pub violent: bool,
    pub ledger_energy: u32,
}

/// Records calls and changes nothing. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingDeathProcessor {
    calls: Mutex<Vec<DeathRecord>>,
}

impl RecordingDeathProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DeathRecord> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl DeathProcessor for RecordingDeathProcessor {
    fn process(
        &self,
        _ctx: &mut RoomProcessorContext<'_>,
        object: &RoomObject,
        options: DeathOptions,
        ledger: &mut EnergyLedger,
    ) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(DeathRecord {
                id: object.id().clone(),
                violent: options.violent,
                ledger_energy: ledger.total(),
            });
        }
    }
}
