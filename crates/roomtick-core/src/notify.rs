use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ObjectId, Position, RoomName, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user: UserId,
    pub object: ObjectId,
    pub message: String,
}

/// Collects player notifications for one room tick. An object yields at most
/// one attack notification per tick however often it is hit.
#[derive(Clone, Debug, Default)]
pub struct NotificationSink {
    sent: BTreeMap<(UserId, ObjectId), Notification>,
}

impl NotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify_attacked(
        &mut self,
        user: &UserId,
        object: &ObjectId,
        kind: &str,
        room: &RoomName,
        pos: Position,
        attacker: Option<&UserId>,
    ) {
        let key = (user.clone(), object.clone());
        if self.sent.contains_key(&key) {
            return;
        }
        let by = attacker.map_or_else(|| "an unknown attacker".to_string(), |u| u.to_string());
        let message = format!(
            "Your {kind} {object} in room {room} at ({},{}) was attacked by {by}",
            pos.x, pos.y
        );
        self.sent.insert(
            key,
            Notification {
                user: user.clone(),
                object: object.clone(),
                message,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn into_vec(self) -> Vec<Notification> {
        self.sent.into_values().collect()
    }
}
