//! TOML plan files: the crafting list plus the inventory to plan against

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{PlannerError, Result};
use crate::inventory::{InventorySnapshot, InventorySource, SourceKind};
use crate::models::{MaterialRef, RootEntry};

/// `10x item:12` or `3 x cargo:4 @ 201`
static ENTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*x\s*((?:item|cargo|building):\d+)(?:\s*@\s*(\d+))?\s*$")
        .expect("entry line pattern is valid")
});

#[derive(Debug, Deserialize)]
pub struct EntrySpec {
    pub material: MaterialRef,
    pub quantity: u64,
    #[serde(default)]
    pub recipe: Option<u32>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SourceSpec {
    pub id: String,
    pub name: Option<String>,
    pub kind: SourceKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub items: HashMap<MaterialRef, u64>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlanFile {
    /// Compact entry lines, see [`parse_entry_line`]
    pub entries: Vec<String>,
    pub checked_off: Vec<MaterialRef>,
    #[serde(rename = "entry")]
    pub entry_tables: Vec<EntrySpec>,
    #[serde(rename = "source")]
    pub sources: Vec<SourceSpec>,
    pub overrides: HashMap<MaterialRef, u64>,
}

/// Everything one resolution pass needs besides the catalog
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub entries: Vec<RootEntry>,
    pub sources: Vec<InventorySource>,
    pub inventory: InventorySnapshot,
}

/// Parse a compact entry line into (material, quantity, recipe)
pub fn parse_entry_line(line: &str) -> Result<(MaterialRef, u64, Option<u32>)> {
    let caps = ENTRY_LINE
        .captures(line)
        .ok_or_else(|| PlannerError::InvalidPlan(format!("cannot parse entry '{}'", line)))?;

    let quantity = caps[1]
        .parse::<u64>()
        .map_err(|_| PlannerError::InvalidPlan(format!("bad quantity in '{}'", line)))?;
    let material = caps[2].parse()?;
    let recipe = caps
        .get(3)
        .map(|m| m.as_str().parse::<u32>())
        .transpose()
        .map_err(|_| PlannerError::InvalidPlan(format!("bad recipe id in '{}'", line)))?;

    Ok((material, quantity, recipe))
}

impl FromStr for PlanFile {
    type Err = PlannerError;

    fn from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl PlanFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Turn the file into root entries and an aggregated inventory snapshot.
    ///
    /// Table entries are numbered first, then compact lines, both in file order.
    pub fn into_request(self) -> Result<PlanRequest> {
        let mut entries = Vec::with_capacity(self.entry_tables.len() + self.entries.len());

        for spec in self.entry_tables {
            let mut entry = RootEntry::new(entries.len() as u32 + 1, spec.material, spec.quantity);
            entry.recipe = spec.recipe;
            entry.label = spec.label;
            entries.push(entry);
        }
        for line in &self.entries {
            let (material, quantity, recipe) = parse_entry_line(line)?;
            let mut entry = RootEntry::new(entries.len() as u32 + 1, material, quantity);
            entry.recipe = recipe;
            entries.push(entry);
        }

        if let Some(entry) = entries.iter().find(|e| e.quantity == 0) {
            return Err(PlannerError::InvalidPlan(format!(
                "entry {} ({}) has zero quantity",
                entry.id, entry.material
            )));
        }

        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(self.sources.len());
        for spec in self.sources {
            if !seen.insert(spec.id.clone()) {
                return Err(PlannerError::InvalidPlan(format!("duplicate source id '{}'", spec.id)));
            }
            sources.push(InventorySource {
                name: spec.name.unwrap_or_else(|| spec.id.clone()),
                id: spec.id,
                kind: spec.kind,
                enabled: spec.enabled,
                quantities: spec.items,
            });
        }

        let mut inventory = InventorySnapshot::aggregate(&sources);
        inventory.overrides = self.overrides;
        inventory.checked_off = self.checked_off.into_iter().collect();

        Ok(PlanRequest {
            entries,
            sources,
            inventory,
        })
    }
}
