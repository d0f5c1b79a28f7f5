//! Reconciling flat requirements against owned inventory
//!
//! Besides the plain `base_required - have` arithmetic this applies parent
//! coverage: owning a crafted intermediate means the ingredients that would have
//! gone into it no longer need gathering. Coverage only looks one level up, at
//! the direct parents recorded during flattening.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::flatten::FlatMaterial;
use crate::inventory::InventorySnapshot;
use crate::models::{MaterialRef, MaterialRequirement, ParentContribution};

/// Owned parent units assigned to each (parent, recipe) pair.
///
/// Each parent's usable units (capped at its own requirement) are handed out once,
/// lowest recipe id first, so a unit never covers ingredients twice.
fn allocate_parent_units(
    flat: &BTreeMap<MaterialRef, FlatMaterial>,
    inventory: &InventorySnapshot,
) -> HashMap<(MaterialRef, u32), u64> {
    let mut crafted: BTreeMap<MaterialRef, BTreeMap<u32, u64>> = BTreeMap::new();
    for material in flat.values() {
        for link in &material.parents {
            let quantity = crafted
                .entry(link.parent)
                .or_default()
                .entry(link.recipe_id)
                .or_default();
            *quantity = (*quantity).max(link.parent_quantity);
        }
    }

    let mut allocation = HashMap::new();
    for (parent, recipes) in crafted {
        let required = flat.get(&parent).map(|p| p.base_required).unwrap_or(0);
        let mut units = inventory.have(parent).min(required);
        for (recipe_id, quantity) in recipes {
            if units == 0 {
                break;
            }
            let used = units.min(quantity);
            allocation.insert((parent, recipe_id), used);
            units -= used;
        }
    }
    allocation
}

/// Child units no longer needed when `owned` of `crafted` parent units are already held.
///
/// `crafts` is what expansion actually scheduled, rounded up per occurrence. The
/// parent units still missing are crafted in one go, so every craft beyond that
/// is covered.
fn covered_units(
    crafts: u64,
    crafted: u64,
    owned: u64,
    output_quantity: u32,
    ingredient_quantity: u32,
) -> u64 {
    if owned == 0 || output_quantity == 0 {
        return 0;
    }
    let crafts_after = crafted.saturating_sub(owned).div_ceil(u64::from(output_quantity));
    crafts
        .saturating_sub(crafts_after)
        .saturating_mul(u64::from(ingredient_quantity))
}

pub fn reconcile(
    flat: &BTreeMap<MaterialRef, FlatMaterial>,
    inventory: &InventorySnapshot,
) -> BTreeMap<MaterialRef, MaterialRequirement> {
    let allocation = allocate_parent_units(flat, inventory);

    flat.values()
        .map(|material| {
            let have = inventory.have(material.material);
            let mut remaining = material.base_required.saturating_sub(have);
            let mut parent_contributions = Vec::new();

            for link in &material.parents {
                let Some(&owned) = allocation.get(&(link.parent, link.recipe_id)) else {
                    continue;
                };
                let coverage = covered_units(
                    link.crafts,
                    link.parent_quantity,
                    owned,
                    link.output_quantity,
                    link.ingredient_quantity,
                )
                .min(link.child_quantity)
                .min(remaining);

                if coverage == 0 {
                    continue;
                }
                remaining -= coverage;
                parent_contributions.push(ParentContribution {
                    parent: link.parent,
                    parent_name: link.parent_name.clone(),
                    parent_quantity_used: owned,
                    coverage,
                });
            }

            if inventory.is_checked_off(material.material) {
                debug!("{} checked off, forcing complete", material.name);
                remaining = 0;
            }

            let requirement = MaterialRequirement {
                material: material.material,
                name: material.name.clone(),
                tier: material.tier,
                step: material.step,
                profession: material.profession.clone(),
                base_required: material.base_required,
                have,
                remaining,
                is_complete: remaining == 0,
                parent_contributions,
                root_contributions: material.root_contributions.clone(),
                flags: material.flags.clone(),
            };
            (material.material, requirement)
        })
        .collect()
}
