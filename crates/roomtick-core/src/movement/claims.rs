//! Turns creep intents into movers: who wants to go where, and who drags
//! whom along.

use std::collections::BTreeMap;

use crate::{
    active_parts, BodyPartType, CreepIntent, MoveIntent, ObjectId, PendingView, Position,
    RoomEntity, RoomObject, RoomState, UserId,
};

/// Requested destination. `direct` moves name the tile itself and crash
/// into whatever blocks it; indirect (follow) moves just fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Target {
    pub to: Position,
    pub direct: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Mover {
    pub id: ObjectId,
    pub owner: Option<UserId>,
    pub power_creep: bool,
    pub from: Position,
    /// Destination from the mover's own intent, if it may act on it.
    pub own: Option<Target>,
    pub pulled_by: Option<ObjectId>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MovePlan {
    pub movers: BTreeMap<ObjectId, Mover>,
    /// puller -> pulled
    pub pulls: BTreeMap<ObjectId, ObjectId>,
}

impl MovePlan {
    pub fn collect(state: &RoomState, view: &PendingView<'_>) -> Self {
        let mut intents: BTreeMap<ObjectId, (&UserId, &CreepIntent)> = BTreeMap::new();
        for (user, id, intent) in state.intents.creep_intents() {
            let Some(object) = view.object(id) else {
                continue;
            };
            if object.owner() != Some(user) {
                tracing::debug!(object = %id, user = %user, "Ignoring creep intent for foreign object");
                continue;
            }
            intents.insert(id.clone(), (user, intent));
        }

        let mut plan = MovePlan::default();
        for (id, (_, intent)) in &intents {
            let Some(object) = view.object(id) else {
                continue;
            };
            let own = intent
                .movement
                .as_ref()
                .filter(|_| can_move_itself(&object))
                .and_then(|movement| own_target(view, object.pos(), movement));
            if own.is_some() {
                plan.movers.insert(id.clone(), mover(&object, own));
            }
        }

        plan.collect_pulls(view, &intents);
        plan
    }

    fn collect_pulls(
        &mut self,
        view: &PendingView<'_>,
        intents: &BTreeMap<ObjectId, (&UserId, &CreepIntent)>,
    ) {
        let mut pulled_by: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();
        for (puller, (_, intent)) in intents {
            let Some(pull) = &intent.pull else {
                continue;
            };
            let (Some(from), Some(target)) = (view.object(puller), view.object(&pull.id)) else {
                continue;
            };
            let valid = matches!(&*from, RoomObject::Creep(_))
                && matches!(&*target, RoomObject::Creep(_))
                && pull.id != *puller
                && from.pos().is_adjacent(target.pos())
                && !pulled_by.contains_key(&pull.id)
                && !self.closes_cycle(puller, &pull.id);
            if !valid {
                tracing::debug!(puller = %puller, pulled = %pull.id, "Ignoring invalid pull");
                continue;
            }
            self.pulls.insert(puller.clone(), pull.id.clone());
            pulled_by.insert(pull.id.clone(), puller.clone());
        }

        // A pulled object moves whenever its puller does, so chains are
        // added front to back until nothing changes.
        loop {
            let mut added = false;
            for (pulled, puller) in &pulled_by {
                if !self.movers.contains_key(puller) {
                    continue;
                }
                if let Some(existing) = self.movers.get_mut(pulled) {
                    if existing.pulled_by.is_none() {
                        existing.pulled_by = Some(puller.clone());
                        added = true;
                    }
                    continue;
                }
                if let Some(object) = view.object(pulled) {
                    let mut entry = mover(&object, None);
                    entry.pulled_by = Some(puller.clone());
                    self.movers.insert(pulled.clone(), entry);
                    added = true;
                }
            }
            if !added {
                break;
            }
        }
        self.pulls.retain(|puller, pulled| {
            self.movers
                .get(pulled)
                .is_some_and(|m| m.pulled_by.as_ref() == Some(puller))
        });
    }

    fn closes_cycle(&self, puller: &ObjectId, pulled: &ObjectId) -> bool {
        let mut cursor = pulled;
        while let Some(next) = self.pulls.get(cursor) {
            if next == puller {
                return true;
            }
            cursor = next;
        }
        false
    }
}

fn mover(object: &RoomObject, own: Option<Target>) -> Mover {
    Mover {
        id: object.id().clone(),
        owner: object.owner().cloned(),
        power_creep: matches!(object, RoomObject::PowerCreep(_)),
        from: object.pos(),
        own,
        pulled_by: None,
    }
}

/// Fatigue, spawning and body checks for moving under one's own power.
fn can_move_itself(object: &RoomObject) -> bool {
    match object {
        RoomObject::Creep(creep) => {
            creep.fatigue == 0
                && !creep.spawning
                && active_parts(&creep.body, BodyPartType::Move) > 0
        }
        RoomObject::PowerCreep(_) => true,
        _ => false,
    }
}

fn own_target(view: &PendingView<'_>, from: Position, movement: &MoveIntent) -> Option<Target> {
    match movement {
        MoveIntent::Direction { direction } => Some(Target {
            to: from.step(*direction),
            direct: true,
        }),
        MoveIntent::Follow { id } => {
            let to = view.position(id)?;
            from.is_adjacent(to).then_some(Target { to, direct: false })
        }
    }
}
