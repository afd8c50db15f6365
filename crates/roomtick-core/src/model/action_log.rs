use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Attack,
    Attacked,
    RangedAttack,
    RangedMassAttack,
    Heal,
    Healed,
    Harvest,
    Build,
    Repair,
    UpgradeController,
}

/// Per-object record of the actions it took (or suffered) this tick, shown to
/// clients as visual feedback.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLog(BTreeMap<ActionKind, Position>);

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(kind: ActionKind, at: Position) -> Self {
        let mut log = Self::new();
        log.record(kind, at);
        log
    }

    pub fn record(&mut self, kind: ActionKind, at: Position) {
        self.0.insert(kind, at);
    }

    pub fn get(&self, kind: ActionKind) -> Option<Position> {
        self.0.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union of both logs; entries from `later` replace ours.
    pub fn merge(&mut self, later: ActionLog) {
        self.0.extend(later.0);
    }
}
