//! Recursive expansion of one crafting-list entry into a production tree

use tracing::{debug, warn};

use crate::catalog::CatalogIndex;
use crate::models::{LeafFlag, MaterialRef, Recipe};

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// One material in an expanded production tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialNode {
    pub material: MaterialRef,
    pub name: String,
    /// Units needed here given every ancestor's demand
    pub quantity: u64,
    pub tier: Option<u32>,
    /// 1 for leaves, otherwise 1 + deepest child step
    pub step: u32,
    pub recipe: Option<u32>,
    /// Units one craft of `recipe` yields, 0 for leaves
    pub output_quantity: u32,
    /// Units the parent recipe consumes per craft, 0 for roots
    pub per_craft: u32,
    /// Position of this ingredient in the parent recipe
    pub slot: usize,
    pub profession: Option<String>,
    pub flag: Option<LeafFlag>,
    pub children: Vec<MaterialNode>,
}

impl MaterialNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order walk; the visitor gets each node with its parent
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a MaterialNode, Option<&'a MaterialNode>),
    {
        fn go<'a, F>(node: &'a MaterialNode, parent: Option<&'a MaterialNode>, visit: &mut F)
        where
            F: FnMut(&'a MaterialNode, Option<&'a MaterialNode>),
        {
            visit(node, parent);
            for child in &node.children {
                go(child, Some(node), visit);
            }
        }
        go(self, None, visit);
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |node, _| {
            if node.is_leaf() {
                count += 1;
            }
        });
        count
    }

    /// Number of branches cut short by a cycle, the depth cap or overflowing quantities
    pub fn truncated_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |node, _| {
            if matches!(node.flag, Some(LeafFlag::Cycle | LeafFlag::DepthLimit | LeafFlag::Overflow)) {
                count += 1;
            }
        });
        count
    }
}

/// Expands materials against a catalog
pub struct Expander<'a> {
    catalog: &'a CatalogIndex,
    max_depth: usize,
}

impl<'a> Expander<'a> {
    pub fn new(catalog: &'a CatalogIndex) -> Self {
        Self {
            catalog,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Expand `quantity` units of a material, optionally with a chosen recipe for the root.
    ///
    /// Never fails: unknown references, cycles, broken recipes and the depth cap all
    /// turn into flagged leaves so the rest of the list can still be planned.
    pub fn expand(
        &self,
        material: MaterialRef,
        quantity: u64,
        recipe_override: Option<u32>,
    ) -> MaterialNode {
        let mut ancestors = Vec::new();
        self.expand_recursive(material, quantity, recipe_override, &mut ancestors)
    }

    fn resolve_recipe(&self, material: MaterialRef, recipe_override: Option<u32>) -> Option<&'a Recipe> {
        if let Some(id) = recipe_override {
            match self.catalog.recipe(id) {
                Some(recipe) if recipe.output == material => return Some(recipe),
                Some(_) => warn!("Recipe {} does not produce {}, using default", id, material),
                None => warn!("Recipe {} not in catalog, using default for {}", id, material),
            }
        }
        self.catalog.default_recipe(material)
    }

    fn expand_recursive(
        &self,
        material: MaterialRef,
        quantity: u64,
        recipe_override: Option<u32>,
        ancestors: &mut Vec<MaterialRef>,
    ) -> MaterialNode {
        let record = match self.catalog.lookup(material) {
            Ok(record) => record,
            Err(e) => {
                warn!("{}; treating as a raw material", e);
                return leaf(material, material.to_string(), quantity, None, Some(LeafFlag::Unresolved));
            }
        };
        let name = record.name.clone();
        let tier = record.tier;

        if ancestors.contains(&material) {
            debug!("Cycle at {} ({}), truncating branch", name, material);
            return leaf(material, name, quantity, tier, Some(LeafFlag::Cycle));
        }

        if ancestors.len() >= self.max_depth {
            warn!("Depth limit {} reached at {}, truncating branch", self.max_depth, name);
            return leaf(material, name, quantity, tier, Some(LeafFlag::DepthLimit));
        }

        let recipe = match self.resolve_recipe(material, recipe_override) {
            Some(recipe) if recipe.expandable => recipe,
            _ => return leaf(material, name, quantity, tier, None),
        };

        if recipe.output_quantity == 0 {
            warn!("Recipe {} for {} has zero output", recipe.id, name);
            return leaf(material, name, quantity, tier, Some(LeafFlag::InvalidRecipe));
        }

        // Partial crafts are not possible, so round up to whole crafts
        let crafts = quantity.div_ceil(u64::from(recipe.output_quantity));

        let Some(demands) = recipe
            .ingredients
            .iter()
            .map(|i| crafts.checked_mul(u64::from(i.quantity)))
            .collect::<Option<Vec<u64>>>()
        else {
            warn!(
                "{} crafts of recipe {} for {} overflow ingredient quantities, truncating branch",
                crafts, recipe.id, name
            );
            return leaf(material, name, quantity, tier, Some(LeafFlag::Overflow));
        };

        ancestors.push(material);
        let mut children = Vec::with_capacity(recipe.ingredients.len());
        for (slot, (ingredient, child_quantity)) in recipe.ingredients.iter().zip(demands).enumerate() {
            if ingredient.quantity == 0 {
                warn!("Recipe {} lists {} with zero quantity, skipping", recipe.id, ingredient.material);
                continue;
            }
            let mut child = self.expand_recursive(ingredient.material, child_quantity, None, ancestors);
            child.per_craft = ingredient.quantity;
            child.slot = slot;
            children.push(child);
        }
        ancestors.pop();

        let step = 1 + children.iter().map(|c| c.step).max().unwrap_or(0);

        MaterialNode {
            material,
            name,
            quantity,
            tier,
            step,
            recipe: Some(recipe.id),
            output_quantity: recipe.output_quantity,
            per_craft: 0,
            slot: 0,
            profession: recipe.profession.clone(),
            flag: None,
            children,
        }
    }
}

fn leaf(
    material: MaterialRef,
    name: String,
    quantity: u64,
    tier: Option<u32>,
    flag: Option<LeafFlag>,
) -> MaterialNode {
    MaterialNode {
        material,
        name,
        quantity,
        tier,
        step: 1,
        recipe: None,
        output_quantity: 0,
        per_craft: 0,
        slot: 0,
        profession: None,
        flag,
        children: Vec::new(),
    }
}
