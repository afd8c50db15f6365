use serde::{Deserialize, Serialize};

use crate::{ActionLog, BodyPart, Position, RoomName, RoomObject, Store};

/// Partial update for one object. Every field is optional; merging two
/// patches runs a per-field merge function (plain fields: later value wins;
/// action logs: union).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatigue: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<BodyPart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_log: Option<ActionLog>,
}

fn merge_field<T>(slot: &mut Option<T>, later: Option<T>, combine: fn(&mut T, T)) {
    match (slot.as_mut(), later) {
        (_, None) => {}
        (Some(current), Some(value)) => combine(current, value),
        (None, Some(value)) => *slot = Some(value),
    }
}

fn replace<T>(current: &mut T, later: T) {
    *current = later;
}

impl ObjectPatch {
    pub fn position(pos: Position) -> Self {
        Self {
            pos: Some(pos),
            ..Self::default()
        }
    }

    pub fn hits(hits: u32) -> Self {
        Self {
            hits: Some(hits),
            ..Self::default()
        }
    }

    pub fn action(log: ActionLog) -> Self {
        Self {
            action_log: Some(log),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge(&mut self, later: ObjectPatch) {
        merge_field(&mut self.pos, later.pos, replace);
        merge_field(&mut self.room, later.room, replace);
        merge_field(&mut self.shard, later.shard, replace);
        merge_field(&mut self.hits, later.hits, replace);
        merge_field(&mut self.fatigue, later.fatigue, replace);
        merge_field(&mut self.body, later.body, replace);
        merge_field(&mut self.store, later.store, replace);
        merge_field(&mut self.action_log, later.action_log, ActionLog::merge);
    }

    /// Writes the patched fields into a full object. Fields the object kind
    /// does not carry are skipped. `room`/`shard` describe where the
    /// document lives and are handled by the store.
    pub fn apply_to(&self, object: &mut RoomObject) {
        match object {
            RoomObject::Creep(c) => {
                apply(&mut c.pos, &self.pos);
                apply(&mut c.hits, &self.hits);
                apply(&mut c.fatigue, &self.fatigue);
                apply(&mut c.body, &self.body);
                apply(&mut c.store, &self.store);
                apply(&mut c.action_log, &self.action_log);
            }
            RoomObject::PowerCreep(c) => {
                apply(&mut c.pos, &self.pos);
                apply(&mut c.hits, &self.hits);
                apply(&mut c.store, &self.store);
                apply(&mut c.action_log, &self.action_log);
            }
            RoomObject::Structure(s) => {
                apply(&mut s.hits, &self.hits);
                apply(&mut s.store, &self.store);
                apply(&mut s.action_log, &self.action_log);
            }
            RoomObject::Ruin(r) => apply(&mut r.store, &self.store),
            RoomObject::Tombstone(t) => apply(&mut t.store, &self.store),
            _ => {}
        }
    }
}

fn apply<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionKind;

    #[test]
    fn later_scalar_wins_and_action_logs_union() {
        let mut first = ObjectPatch {
            hits: Some(80),
            action_log: Some(ActionLog::single(ActionKind::Attacked, Position::new(1, 1))),
            ..ObjectPatch::default()
        };
        first.merge(ObjectPatch {
            hits: Some(40),
            fatigue: Some(0),
            action_log: Some(ActionLog::single(ActionKind::Attack, Position::new(2, 2))),
            ..ObjectPatch::default()
        });
        first.merge(ObjectPatch::position(Position::new(5, 5)));

        assert_eq!(first.hits, Some(40));
        assert_eq!(first.fatigue, Some(0));
        assert_eq!(first.pos, Some(Position::new(5, 5)));
        let log = first.action_log.unwrap();
        assert_eq!(log.get(ActionKind::Attacked), Some(Position::new(1, 1)));
        assert_eq!(log.get(ActionKind::Attack), Some(Position::new(2, 2)));
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let json = serde_json::to_value(ObjectPatch::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
        assert!(ObjectPatch::default().is_empty());
    }
}
