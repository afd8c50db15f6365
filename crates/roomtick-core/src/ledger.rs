use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Why energy was credited to a dying object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnergyReason {
    /// Energy that earlier steps moved onto the object this tick.
    Carried,
    /// Energy reclaimed from the body on death.
    Body,
}

/// Per-object energy accumulator for one tick.
///
/// Steps that move energy around credit it here instead of patching the
/// store directly, so a death processor sees the same total the object
/// would have ended the tick with and folds it into one final document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyLedger {
    entries: BTreeMap<EnergyReason, u32>,
}

impl EnergyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(&mut self, reason: EnergyReason, amount: u32) {
        if amount == 0 {
            return;
        }
        let entry = self.entries.entry(reason).or_default();
        *entry = entry.saturating_add(amount);
    }

    pub fn get(&self, reason: EnergyReason) -> u32 {
        self.entries.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.entries.values().fold(0u32, |acc, v| acc.saturating_add(*v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credits_accumulate_per_reason() {
        let mut ledger = EnergyLedger::new();
        assert!(ledger.is_empty());

        ledger.credit(EnergyReason::Carried, 20);
        ledger.credit(EnergyReason::Carried, 5);
        ledger.credit(EnergyReason::Body, 12);
        ledger.credit(EnergyReason::Body, 0);

        assert_eq!(ledger.get(EnergyReason::Carried), 25);
        assert_eq!(ledger.total(), 37);
    }
}
