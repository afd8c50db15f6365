//! Cross-room mutations.
//!
//! Every room pipeline appends to one shared, unbounded queue; appends never
//! block, so no room waits on another. The runner drains the queue once all
//! rooms of the tick have finished and orders it by origin room and
//! per-room sequence, which keeps the result independent of task scheduling.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::ObjectPatch;
use crate::{ObjectId, RoomName, RoomObject, UserId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum GlobalMutation {
    PatchRoomObject { id: ObjectId, patch: ObjectPatch },
    UpsertRoomObject { room: RoomName, object: RoomObject },
    RemoveRoomObject { id: ObjectId },
    AdjustUserMoney { user: UserId, delta: i64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEnvelope {
    pub origin: RoomName,
    pub seq: u32,
    pub mutation: GlobalMutation,
}

/// Per-room appender. Clones share the queue but each room keeps its own
/// sequence counter.
#[derive(Clone, Debug)]
pub struct GlobalMutationSink {
    origin: RoomName,
    seq: u32,
    tx: mpsc::UnboundedSender<GlobalEnvelope>,
}

impl GlobalMutationSink {
    pub fn origin(&self) -> &RoomName {
        &self.origin
    }

    pub fn patch_room_object(&mut self, id: ObjectId, patch: ObjectPatch) {
        self.push(GlobalMutation::PatchRoomObject { id, patch });
    }

    pub fn upsert_room_object(&mut self, room: RoomName, object: RoomObject) {
        self.push(GlobalMutation::UpsertRoomObject { room, object });
    }

    pub fn remove_room_object(&mut self, id: ObjectId) {
        self.push(GlobalMutation::RemoveRoomObject { id });
    }

    pub fn adjust_user_money(&mut self, user: UserId, delta: i64) {
        self.push(GlobalMutation::AdjustUserMoney { user, delta });
    }

    fn push(&mut self, mutation: GlobalMutation) {
        let envelope = GlobalEnvelope {
            origin: self.origin.clone(),
            seq: self.seq,
            mutation,
        };
        self.seq += 1;
        if self.tx.send(envelope).is_err() {
            tracing::warn!(room = %self.origin, "Global mutation queue closed; mutation dropped");
        }
    }
}

/// Receiving end of the shared queue.
#[derive(Debug)]
pub struct GlobalMutationQueue {
    tx: mpsc::UnboundedSender<GlobalEnvelope>,
    rx: mpsc::UnboundedReceiver<GlobalEnvelope>,
}

impl GlobalMutationQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sink(&self, origin: RoomName) -> GlobalMutationSink {
        GlobalMutationSink {
            origin,
            seq: 0,
            tx: self.tx.clone(),
        }
    }

    /// Everything queued so far, in deterministic order.
    pub fn drain(&mut self) -> Vec<GlobalEnvelope> {
        let mut out = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            out.push(envelope);
        }
        out.sort_by(|a, b| a.origin.cmp(&b.origin).then(a.seq.cmp(&b.seq)));
        out
    }
}

impl Default for GlobalMutationQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_orders_by_origin_then_sequence() {
        let mut queue = GlobalMutationQueue::new();
        let mut east = queue.sink(RoomName::from("E1N1"));
        let mut west = queue.sink(RoomName::from("W1N1"));

        west.remove_room_object(ObjectId::from("w-0"));
        east.remove_room_object(ObjectId::from("e-0"));
        west.remove_room_object(ObjectId::from("w-1"));
        east.adjust_user_money(UserId::from("alice"), 5);

        let drained = queue.drain();
        let order: Vec<_> = drained
            .iter()
            .map(|e| (e.origin.as_str().to_string(), e.seq))
            .collect();
        assert_eq!(
            order,
            vec![
                ("E1N1".to_string(), 0),
                ("E1N1".to_string(), 1),
                ("W1N1".to_string(), 0),
                ("W1N1".to_string(), 1),
            ]
        );
        assert!(queue.drain().is_empty());
    }
}
