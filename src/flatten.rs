//! Merging expanded trees into one record per material

use std::collections::BTreeMap;

use crate::expand::MaterialNode;
use crate::models::{LeafFlag, MaterialRef, RootContribution, RootEntry};

/// Ingredient relationship between a material and one of its parents, summed over
/// every occurrence of the same ingredient slot in the same parent recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub parent: MaterialRef,
    pub parent_name: String,
    pub recipe_id: u32,
    pub slot: usize,
    pub output_quantity: u32,
    pub ingredient_quantity: u32,
    /// Units of the parent crafted through this recipe
    pub parent_quantity: u64,
    /// Whole crafts behind `parent_quantity`, rounded up per occurrence
    pub crafts: u64,
    /// Units of the child those crafts consume
    pub child_quantity: u64,
}

/// A material's requirement across the whole request, before inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMaterial {
    pub material: MaterialRef,
    pub name: String,
    pub tier: Option<u32>,
    pub step: u32,
    pub profession: Option<String>,
    pub base_required: u64,
    pub root_contributions: Vec<RootContribution>,
    pub parents: Vec<ParentLink>,
    pub flags: Vec<LeafFlag>,
}

impl FlatMaterial {
    fn new(node: &MaterialNode) -> Self {
        Self {
            material: node.material,
            name: node.name.clone(),
            tier: node.tier,
            step: node.step,
            profession: None,
            base_required: 0,
            root_contributions: Vec::new(),
            parents: Vec::new(),
            flags: Vec::new(),
        }
    }

    fn attribute(&mut self, entry: &RootEntry, root_name: &str, quantity: u64) {
        match self.root_contributions.iter_mut().find(|c| c.root_id == entry.id) {
            Some(existing) => existing.contribution = existing.contribution.saturating_add(quantity),
            None => self.root_contributions.push(RootContribution {
                root_id: entry.id,
                name: root_name.to_string(),
                requested_quantity: entry.quantity,
                contribution: quantity,
            }),
        }
    }

    fn link(&mut self, parent: &MaterialNode, child: &MaterialNode) {
        let Some(recipe_id) = parent.recipe else {
            return;
        };
        let crafts = match parent.output_quantity {
            0 => 0,
            out => parent.quantity.div_ceil(u64::from(out)),
        };
        match self
            .parents
            .iter_mut()
            .find(|l| l.parent == parent.material && l.recipe_id == recipe_id && l.slot == child.slot)
        {
            Some(link) => {
                link.parent_quantity = link.parent_quantity.saturating_add(parent.quantity);
                link.crafts = link.crafts.saturating_add(crafts);
                link.child_quantity = link.child_quantity.saturating_add(child.quantity);
            }
            None => self.parents.push(ParentLink {
                parent: parent.material,
                parent_name: parent.name.clone(),
                recipe_id,
                slot: child.slot,
                output_quantity: parent.output_quantity,
                ingredient_quantity: child.per_craft,
                parent_quantity: parent.quantity,
                crafts,
                child_quantity: child.quantity,
            }),
        }
    }
}

/// Merge every tree into one record per material.
///
/// `base_required` sums every occurrence, `step` keeps the shallowest occurrence and
/// each occurrence is attributed to the root entry whose tree it came from.
pub fn flatten(roots: &[(RootEntry, MaterialNode)]) -> BTreeMap<MaterialRef, FlatMaterial> {
    let mut flat: BTreeMap<MaterialRef, FlatMaterial> = BTreeMap::new();

    for (entry, tree) in roots {
        let root_name = entry.label.clone().unwrap_or_else(|| tree.name.clone());

        tree.walk(&mut |node, parent| {
            let record = flat
                .entry(node.material)
                .or_insert_with(|| FlatMaterial::new(node));

            record.base_required = record.base_required.saturating_add(node.quantity);
            record.step = record.step.min(node.step);
            if record.profession.is_none() {
                record.profession = node.profession.clone();
            }
            if let Some(flag) = node.flag {
                if !record.flags.contains(&flag) {
                    record.flags.push(flag);
                    record.flags.sort();
                }
            }
            record.attribute(entry, &root_name, node.quantity);

            if let Some(parent) = parent {
                record.link(parent, node);
            }
        });
    }

    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::*;
    use crate::expand::Expander;

    fn expand_all(entries: Vec<RootEntry>) -> Vec<(RootEntry, MaterialNode)> {
        let catalog = workshop();
        let expander = Expander::new(&catalog);
        entries
            .into_iter()
            .map(|e| {
                let tree = expander.expand(e.material, e.quantity, e.recipe);
                (e, tree)
            })
            .collect()
    }

    #[test]
    fn test_same_material_from_two_entries_sums() {
        let roots = expand_all(vec![RootEntry::new(1, NAILS, 5), RootEntry::new(2, NAILS, 8)]);
        let flat = flatten(&roots);

        let nails = &flat[&NAILS];
        assert_eq!(nails.base_required, 13);
        assert_eq!(nails.root_contributions.len(), 2);
        assert_eq!(nails.root_contributions[0].root_id, 1);
        assert_eq!(nails.root_contributions[0].contribution, 5);
        assert_eq!(nails.root_contributions[1].root_id, 2);
        assert_eq!(nails.root_contributions[1].contribution, 8);
        assert_eq!(nails.root_contributions[1].name, "Nails");
    }

    #[test]
    fn test_repeated_material_in_one_tree_attributes_once_per_root() {
        let roots = expand_all(vec![RootEntry::new(7, SHED, 1).with_label("North shed")]);
        let flat = flatten(&roots);

        let plank = &flat[&PLANK];
        // 6 under the crates + 4 for the shed itself
        assert_eq!(plank.base_required, 10);
        assert_eq!(plank.root_contributions.len(), 1);
        assert_eq!(plank.root_contributions[0].contribution, 10);
        assert_eq!(plank.root_contributions[0].name, "North shed");
        assert_eq!(plank.root_contributions[0].requested_quantity, 1);
        // wood: 3 + 2 from the two plank occurrences
        assert_eq!(flat[&WOOD].base_required, 5);
    }

    #[test]
    fn test_step_keeps_shallowest_occurrence() {
        let roots = expand_all(vec![RootEntry::new(1, SHED, 1), RootEntry::new(2, ORE, 3)]);
        let flat = flatten(&roots);
        // ore is a leaf everywhere
        assert_eq!(flat[&ORE].step, 1);
        assert_eq!(flat[&PLANK].step, 2);
        assert_eq!(flat[&CRATE].step, 3);
        assert_eq!(flat[&SHED].step, 4);
    }

    #[test]
    fn test_parent_links_merge_per_parent_recipe() {
        let roots = expand_all(vec![RootEntry::new(1, SHED, 1), RootEntry::new(2, CRATE, 2)]);
        let flat = flatten(&roots);

        let plank = &flat[&PLANK];
        assert_eq!(plank.parents.len(), 2);
        let from_crate = plank.parents.iter().find(|l| l.parent == CRATE).unwrap();
        assert_eq!(from_crate.recipe_id, 102);
        assert_eq!(from_crate.parent_quantity, 4);
        assert_eq!(from_crate.crafts, 4);
        assert_eq!(from_crate.slot, 0);
        assert_eq!(from_crate.child_quantity, 12);
        assert_eq!(from_crate.ingredient_quantity, 3);
        assert_eq!(from_crate.output_quantity, 1);

        let wood = &flat[&WOOD];
        assert_eq!(wood.parents.len(), 1);
        assert_eq!(wood.parents[0].output_quantity, 2);
    }

    #[test]
    fn test_crafts_round_up_per_occurrence() {
        let roots = expand_all(vec![RootEntry::new(1, PLANK, 3), RootEntry::new(2, PLANK, 3)]);
        let flat = flatten(&roots);

        let link = &flat[&WOOD].parents[0];
        assert_eq!(link.parent_quantity, 6);
        // 2 crafts each, not 3 for the combined 6
        assert_eq!(link.crafts, 4);
        assert_eq!(link.child_quantity, 4);
    }

    #[test]
    fn test_repeated_ingredient_links_per_slot() {
        let mut catalog = workshop();
        catalog.insert_recipe(recipe(102, CRATE, 1, &[(PLANK, 2), (PLANK, 2)]));
        let entry = RootEntry::new(1, CRATE, 3);
        let tree = Expander::new(&catalog).expand(entry.material, entry.quantity, None);
        let flat = flatten(&[(entry, tree)]);

        let plank = &flat[&PLANK];
        assert_eq!(plank.base_required, 12);
        assert_eq!(plank.parents.len(), 2);
        for link in &plank.parents {
            assert_eq!(link.parent_quantity, 3);
            assert_eq!(link.child_quantity, 6);
        }
    }

    #[test]
    fn test_profession_comes_from_recipe() {
        let roots = expand_all(vec![RootEntry::new(1, CRATE, 1)]);
        let flat = flatten(&roots);
        assert_eq!(flat[&CRATE].profession.as_deref(), Some("Carpentry"));
        assert_eq!(flat[&NAILS].profession.as_deref(), Some("Smithing"));
        assert_eq!(flat[&ORE].profession, None);
    }

    #[test]
    fn test_contributions_conserve_base_required() {
        let roots = expand_all(vec![
            RootEntry::new(1, SHED, 2),
            RootEntry::new(2, CRATE, 3),
            RootEntry::new(3, PLANK, 7),
        ]);
        for material in flatten(&roots).values() {
            let total: u64 = material.root_contributions.iter().map(|c| c.contribution).sum();
            assert_eq!(total, material.base_required, "{}", material.name);
        }
    }
}
