use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{RoomName, StoreError, UserId};

/// Per-user counters collected during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    CreepsLost,
    CreepsProduced,
    SpawnsCreated,
    EnergyHarvested,
    EnergyControl,
    EnergyConstruction,
    EnergyCreeps,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    users: BTreeMap<UserId, BTreeMap<StatKind, u64>>,
}

impl TickStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&mut self, user: &UserId, kind: StatKind, amount: u64) {
        if amount == 0 {
            return;
        }
        *self
            .users
            .entry(user.clone())
            .or_default()
            .entry(kind)
            .or_default() += amount;
    }

    pub fn get(&self, user: &UserId, kind: StatKind) -> u64 {
        self.users
            .get(user)
            .and_then(|counters| counters.get(&kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Adds every counter of `other` into `self`.
    pub fn absorb(&mut self, other: &TickStats) {
        for (user, counters) in &other.users {
            for (kind, amount) in counters {
                self.inc(user, *kind, *amount);
            }
        }
    }
}

/// Destination for per-room tick statistics.
#[async_trait]
pub trait StatsSink: Send + Sync {
    async fn record(&self, room: &RoomName, tick: u64, stats: TickStats) -> Result<(), StoreError>;
}

/// Keeps running totals in memory.
#[derive(Debug, Default)]
pub struct MemoryStats {
    totals: Mutex<TickStats>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn totals(&self) -> TickStats {
        self.totals.lock().await.clone()
    }
}

#[async_trait]
impl StatsSink for MemoryStats {
    async fn record(&self, room: &RoomName, tick: u64, stats: TickStats) -> Result<(), StoreError> {
        if stats.is_empty() {
            return Ok(());
        }
        tracing::debug!(room = %room, tick, "Recording tick stats");
        self.totals.lock().await.absorb(&stats);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_stats_accumulate_across_rooms() {
        let sink = MemoryStats::new();
        let alice = UserId::from("alice");

        let mut first = TickStats::new();
        first.inc(&alice, StatKind::CreepsLost, 1);
        let mut second = TickStats::new();
        second.inc(&alice, StatKind::CreepsLost, 2);
        second.inc(&alice, StatKind::EnergyCreeps, 0);

        sink.record(&RoomName::from("W1N1"), 5, first).await.unwrap();
        sink.record(&RoomName::from("W2N1"), 5, second).await.unwrap();

        let totals = sink.totals().await;
        assert_eq!(totals.get(&alice, StatKind::CreepsLost), 3);
        assert_eq!(totals.get(&alice, StatKind::EnergyCreeps), 0);
    }
}
