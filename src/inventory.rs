//! Inventory sources and the per-pass snapshot built from them

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::MaterialRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Player,
    Claim,
    Manual,
}

/// One place the user keeps things: a character, a claim's storage, a hand-kept tally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySource {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    pub enabled: bool,
    pub quantities: HashMap<MaterialRef, u64>,
}

impl InventorySource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            enabled: true,
            quantities: HashMap::new(),
        }
    }

    pub fn with(mut self, material: MaterialRef, quantity: u64) -> Self {
        let total = self.quantities.entry(material).or_default();
        *total = total.saturating_add(quantity);
        self
    }
}

/// Immutable view of what the user owns for one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub quantities: HashMap<MaterialRef, u64>,
    /// Replaces, never adds to, the aggregated quantity
    pub overrides: HashMap<MaterialRef, u64>,
    /// Materials the user has marked done
    pub checked_off: HashSet<MaterialRef>,
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum quantities over every enabled source
    pub fn aggregate<'a>(sources: impl IntoIterator<Item = &'a InventorySource>) -> Self {
        let mut quantities: HashMap<MaterialRef, u64> = HashMap::new();
        for source in sources.into_iter().filter(|s| s.enabled) {
            for (material, quantity) in &source.quantities {
                let total = quantities.entry(*material).or_default();
                *total = total.saturating_add(*quantity);
            }
        }
        Self {
            quantities,
            ..Self::default()
        }
    }

    pub fn with_quantity(mut self, material: MaterialRef, quantity: u64) -> Self {
        self.quantities.insert(material, quantity);
        self
    }

    pub fn with_override(mut self, material: MaterialRef, have: u64) -> Self {
        self.overrides.insert(material, have);
        self
    }

    pub fn with_checked_off(mut self, material: MaterialRef) -> Self {
        self.checked_off.insert(material);
        self
    }

    pub fn have(&self, material: MaterialRef) -> u64 {
        self.overrides
            .get(&material)
            .or_else(|| self.quantities.get(&material))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_checked_off(&self, material: MaterialRef) -> bool {
        self.checked_off.contains(&material)
    }
}
