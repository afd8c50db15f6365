use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const RESOURCE_ENERGY: &str = "energy";

/// Resource amounts keyed by resource type. Zero entries are dropped so two
/// stores holding the same resources always compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store(BTreeMap<String, u32>);

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: &str, amount: u32) -> Self {
        self.set(resource, amount);
        self
    }

    pub fn get(&self, resource: &str) -> u32 {
        self.0.get(resource).copied().unwrap_or(0)
    }

    pub fn energy(&self) -> u32 {
        self.get(RESOURCE_ENERGY)
    }

    pub fn set(&mut self, resource: &str, amount: u32) {
        if amount == 0 {
            self.0.remove(resource);
        } else {
            self.0.insert(resource.to_string(), amount);
        }
    }

    pub fn add(&mut self, resource: &str, amount: u32) {
        let total = self.get(resource).saturating_add(amount);
        self.set(resource, total);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
