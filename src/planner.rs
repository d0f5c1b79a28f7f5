//! Full resolution pass: expand every entry, merge, reconcile

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::catalog::CatalogIndex;
use crate::expand::{DEFAULT_MAX_DEPTH, Expander};
use crate::flatten::flatten;
use crate::inventory::InventorySnapshot;
use crate::models::{MaterialRef, MaterialRequirement, RootEntry};
use crate::reconcile::reconcile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerOptions {
    pub max_depth: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub requirements: BTreeMap<MaterialRef, MaterialRequirement>,
    pub trees_expanded: usize,
    /// Branches cut by cycle detection, the depth cap or overflowing quantities
    pub truncated_branches: usize,
}

impl Resolution {
    pub fn get(&self, material: MaterialRef) -> Option<&MaterialRequirement> {
        self.requirements.get(&material)
    }

    pub fn is_complete(&self) -> bool {
        self.requirements.values().all(|r| r.is_complete)
    }

    /// Materials still short after inventory and coverage
    pub fn outstanding(&self) -> impl Iterator<Item = &MaterialRequirement> {
        self.requirements.values().filter(|r| !r.is_complete)
    }
}

/// Resolve a crafting list against a catalog and an inventory snapshot.
///
/// A pure function of its inputs; call it again from scratch whenever the list
/// or inventory changes.
pub fn resolve(
    catalog: &CatalogIndex,
    entries: &[RootEntry],
    inventory: &InventorySnapshot,
    options: PlannerOptions,
) -> Resolution {
    let expander = Expander::new(catalog).with_max_depth(options.max_depth);

    let mut roots = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.quantity == 0 {
            warn!("Skipping entry {} ({}) with zero quantity", entry.id, entry.material);
            continue;
        }
        let tree = expander.expand(entry.material, entry.quantity, entry.recipe);
        debug!(
            "Entry {}: {} x{} expanded to step {} with {} leaves",
            entry.id,
            tree.name,
            entry.quantity,
            tree.step,
            tree.leaf_count()
        );
        roots.push((entry.clone(), tree));
    }

    let truncated_branches: usize = roots.iter().map(|(_, tree)| tree.truncated_count()).sum();
    if truncated_branches > 0 {
        warn!("{} branches truncated during expansion", truncated_branches);
    }

    let flat = flatten(&roots);
    let requirements = reconcile(&flat, inventory);

    info!(
        "Resolved {} entries into {} materials",
        roots.len(),
        requirements.len()
    );

    Resolution {
        requirements,
        trees_expanded: roots.len(),
        truncated_branches,
    }
}
