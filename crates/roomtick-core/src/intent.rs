//! Player intents for one tick.
//!
//! Intents arrive from untrusted player code, so nothing here may fail the
//! snapshot: maps decode entry by entry (a malformed entry is dropped),
//! compound creep fields decode leniently (a malformed field reads as absent)
//! and per-object records stay raw JSON until a step asks for them.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Direction, ObjectId, UserId};

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_map<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    let serde_json::Value::Object(entries) = serde_json::Value::deserialize(deserializer)? else {
        tracing::debug!("Ignoring malformed intent map");
        return Ok(BTreeMap::new());
    };

    let mut decoded = BTreeMap::new();
    for (key, value) in entries {
        let entry = serde_json::from_value(serde_json::Value::String(key.clone()))
            .and_then(|k| serde_json::from_value(value).map(|v| (k, v)));
        match entry {
            Ok((k, v)) => {
                decoded.insert(k, v);
            }
            Err(e) => tracing::debug!(key = %key, error = %e, "Ignoring malformed intent entry"),
        }
    }
    Ok(decoded)
}

/// A creep's single movement request for the tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveIntent {
    /// Step onto the adjacent tile in `direction`; the tile itself is the target.
    Direction { direction: Direction },
    /// Step onto the tile of an adjacent object (typically the puller).
    Follow { id: ObjectId },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullIntent {
    pub id: ObjectId,
}

/// Movement and other once-per-tick fields for one creep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreepIntent {
    #[serde(default, rename = "move", deserialize_with = "lenient")]
    pub movement: Option<MoveIntent>,
    #[serde(default, deserialize_with = "lenient")]
    pub pull: Option<PullIntent>,
}

/// Decoded per-object intent record. Kinds handled outside the simulation
/// core decode as `Other` and are skipped here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "camelCase")]
pub enum ObjectIntent {
    Attack { id: ObjectId },
    RangedAttack { id: ObjectId },
    RangedMassAttack,
    #[serde(other)]
    Other,
}

/// One undecoded intent record as submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawIntent(pub serde_json::Value);

impl RawIntent {
    pub fn decode(&self) -> Option<ObjectIntent> {
        match serde_json::from_value(self.0.clone()) {
            Ok(intent) => Some(intent),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed intent record");
                None
            }
        }
    }
}

impl From<ObjectIntent> for RawIntent {
    fn from(intent: ObjectIntent) -> Self {
        // Serializing a plain enum into a JSON value cannot fail.
        RawIntent(serde_json::to_value(intent).unwrap_or(serde_json::Value::Null))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserIntents {
    /// Every record issued per object, in submission order. Repeated kinds
    /// are all applied.
    #[serde(default, deserialize_with = "lenient_map")]
    pub objects: BTreeMap<ObjectId, Vec<RawIntent>>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub creeps: BTreeMap<ObjectId, CreepIntent>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentSnapshot {
    #[serde(deserialize_with = "lenient_map")]
    users: BTreeMap<UserId, UserIntents>,
}

impl IntentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_mut(&mut self, user: UserId) -> &mut UserIntents {
        self.users.entry(user).or_default()
    }

    pub fn set_creep(&mut self, user: UserId, object: ObjectId, intent: CreepIntent) {
        self.user_mut(user).creeps.insert(object, intent);
    }

    pub fn push(&mut self, user: UserId, object: ObjectId, intent: ObjectIntent) {
        self.user_mut(user)
            .objects
            .entry(object)
            .or_default()
            .push(intent.into());
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Creep intents ordered by user, then object id.
    pub fn creep_intents(&self) -> impl Iterator<Item = (&UserId, &ObjectId, &CreepIntent)> {
        self.users.iter().flat_map(|(user, intents)| {
            intents
                .creeps
                .iter()
                .map(move |(object, intent)| (user, object, intent))
        })
    }

    /// Decodable object intents ordered by user, object id, then submission.
    pub fn object_intents(&self) -> impl Iterator<Item = (&UserId, &ObjectId, ObjectIntent)> + '_ {
        self.users.iter().flat_map(|(user, intents)| {
            intents.objects.iter().flat_map(move |(object, records)| {
                records
                    .iter()
                    .filter_map(RawIntent::decode)
                    .map(move |intent| (user, object, intent))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_fields_decode_as_absent() {
        let json = serde_json::json!({
            "alice": {
                "creeps": {
                    "c1": { "move": { "direction": 42 }, "pull": { "id": "c2" } },
                    "c2": { "move": { "direction": 3 } }
                },
                "objects": {
                    "c1": [
                        { "intent": "attack", "id": "x" },
                        { "intent": "attack" },
                        { "intent": "upgradeController", "id": "ctrl" },
                        { "intent": "attack", "id": "y" }
                    ]
                }
            }
        });

        let intents: IntentSnapshot = serde_json::from_value(json).unwrap();
        let creeps: Vec<_> = intents.creep_intents().collect();
        assert_eq!(creeps.len(), 2);
        assert_eq!(creeps[0].2.movement, None);
        assert_eq!(creeps[0].2.pull, Some(PullIntent { id: "c2".into() }));
        assert_eq!(
            creeps[1].2.movement,
            Some(MoveIntent::Direction {
                direction: Direction::Right
            })
        );

        let decoded: Vec<_> = intents.object_intents().map(|(_, _, i)| i).collect();
        assert_eq!(
            decoded,
            vec![
                ObjectIntent::Attack { id: "x".into() },
                ObjectIntent::Other,
                ObjectIntent::Attack { id: "y".into() },
            ]
        );
    }

    #[test]
    fn malformed_records_are_dropped_whole() {
        let json = serde_json::json!({
            "alice": {
                "creeps": {
                    "c1": 42,
                    "c2": { "move": { "direction": 5 } }
                },
                "objects": {
                    "c1": { "intent": "attack", "id": "x" },
                    "c2": [{ "intent": "attack", "id": "y" }]
                }
            },
            "bob": "not a record",
            "carol": { "creeps": [1, 2, 3], "objects": null }
        });

        let intents: IntentSnapshot = serde_json::from_value(json).unwrap();
        let creeps: Vec<_> = intents.creep_intents().collect();
        assert_eq!(creeps.len(), 1);
        assert_eq!(creeps[0].1, &ObjectId::from("c2"));
        assert_eq!(
            creeps[0].2.movement,
            Some(MoveIntent::Direction {
                direction: Direction::Bottom
            })
        );

        let decoded: Vec<_> = intents
            .object_intents()
            .map(|(_, object, intent)| (object.clone(), intent))
            .collect();
        assert_eq!(
            decoded,
            vec![(ObjectId::from("c2"), ObjectIntent::Attack { id: "y".into() })]
        );
    }

    #[test]
    fn follow_move_decodes_from_id() {
        let intent: CreepIntent =
            serde_json::from_value(serde_json::json!({ "move": { "id": "puller" } })).unwrap();
        assert_eq!(
            intent.movement,
            Some(MoveIntent::Follow { id: "puller".into() })
        );
    }
}
