//! In-memory catalog index
//!
//! Read-only lookup from material reference to catalog record and from recipe id
//! to recipe. Built once from the SQLite store (or by hand in tests) and shared
//! by reference with every resolution pass.

use std::collections::{BTreeSet, HashMap};

use crate::error::{PlannerError, Result};
use crate::models::{CatalogRecord, MaterialRef, Recipe};

#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    records: HashMap<MaterialRef, CatalogRecord>,
    recipes: HashMap<u32, Recipe>,
    // kept sorted by recipe id
    producers: HashMap<MaterialRef, Vec<u32>>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_record(&mut self, record: CatalogRecord) {
        self.records.insert(record.reference, record);
    }

    pub fn insert_recipe(&mut self, recipe: Recipe) {
        if let Some(old) = self.recipes.get(&recipe.id) {
            if let Some(ids) = self.producers.get_mut(&old.output) {
                ids.retain(|id| *id != recipe.id);
            }
        }
        let ids = self.producers.entry(recipe.output).or_default();
        if let Err(pos) = ids.binary_search(&recipe.id) {
            ids.insert(pos, recipe.id);
        }
        self.recipes.insert(recipe.id, recipe);
    }

    pub fn lookup(&self, reference: MaterialRef) -> Result<&CatalogRecord> {
        self.records
            .get(&reference)
            .ok_or(PlannerError::NotFound(reference))
    }

    pub fn contains(&self, reference: MaterialRef) -> bool {
        self.records.contains_key(&reference)
    }

    pub fn recipe(&self, id: u32) -> Option<&Recipe> {
        self.recipes.get(&id)
    }

    /// All recipes producing the material, lowest id first
    pub fn recipes_for(&self, reference: MaterialRef) -> &[u32] {
        self.producers
            .get(&reference)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The recipe used when the user has not chosen one.
    ///
    /// An explicit default on the record wins if it exists and actually produces
    /// the material; otherwise the lowest-id producing recipe is used.
    pub fn default_recipe(&self, reference: MaterialRef) -> Option<&Recipe> {
        let explicit = self
            .records
            .get(&reference)
            .and_then(|r| r.default_recipe)
            .and_then(|id| self.recipes.get(&id))
            .filter(|recipe| recipe.output == reference);

        explicit.or_else(|| {
            self.recipes_for(reference)
                .first()
                .and_then(|id| self.recipes.get(id))
        })
    }

    /// Display name, falling back to the raw reference for unknown ids
    pub fn name_of(&self, reference: MaterialRef) -> String {
        self.records
            .get(&reference)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| reference.to_string())
    }

    pub fn records(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.values()
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check the catalog for data problems the expander will have to work around
    pub fn validate(&self) -> CatalogReport {
        let mut report = CatalogReport::default();

        let mut ids: Vec<_> = self.recipes.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            let recipe = &self.recipes[&id];
            if recipe.output_quantity == 0 {
                report.zero_output_recipes.push(id);
            }
            for ingredient in &recipe.ingredients {
                if ingredient.quantity == 0 {
                    report.zero_quantity_ingredients.push((id, ingredient.material));
                }
                if !self.records.contains_key(&ingredient.material) {
                    report.missing_references.insert(ingredient.material);
                }
            }
        }

        report.circular_dependencies = self.count_default_cycles();
        report
    }

    /// Count back edges in the graph formed by each material's default recipe
    fn count_default_cycles(&self) -> usize {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        fn visit(
            catalog: &CatalogIndex,
            node: MaterialRef,
            marks: &mut HashMap<MaterialRef, Mark>,
            cycles: &mut usize,
        ) {
            marks.insert(node, Mark::Active);
            if let Some(recipe) = catalog.default_recipe(node).filter(|r| r.expandable) {
                for ingredient in &recipe.ingredients {
                    match marks.get(&ingredient.material) {
                        Some(Mark::Active) => *cycles += 1,
                        Some(Mark::Done) => {}
                        None => visit(catalog, ingredient.material, marks, cycles),
                    }
                }
            }
            marks.insert(node, Mark::Done);
        }

        let mut starts: Vec<_> = self.producers.keys().copied().collect();
        starts.sort();

        let mut marks = HashMap::new();
        let mut cycles = 0;
        for start in starts {
            if !marks.contains_key(&start) {
                visit(self, start, &mut marks, &mut cycles);
            }
        }
        cycles
    }
}

/// Data-integrity findings; nothing here stops planning
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogReport {
    pub zero_output_recipes: Vec<u32>,
    pub zero_quantity_ingredients: Vec<(u32, MaterialRef)>,
    pub missing_references: BTreeSet<MaterialRef>,
    pub circular_dependencies: usize,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        self.zero_output_recipes.is_empty()
            && self.zero_quantity_ingredients.is_empty()
            && self.missing_references.is_empty()
            && self.circular_dependencies == 0
    }
}

impl std::fmt::Display for CatalogReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Catalog Validation ===")?;
        writeln!(f, "Recipes with zero output:      {}", self.zero_output_recipes.len())?;
        for id in &self.zero_output_recipes {
            writeln!(f, "  recipe {}", id)?;
        }
        writeln!(f, "Zero-quantity ingredients:     {}", self.zero_quantity_ingredients.len())?;
        for (id, material) in &self.zero_quantity_ingredients {
            writeln!(f, "  recipe {} -> {}", id, material)?;
        }
        writeln!(f, "Missing ingredient references: {}", self.missing_references.len())?;
        for material in &self.missing_references {
            writeln!(f, "  {}", material)?;
        }
        writeln!(f, "Circular dependencies:         {}", self.circular_dependencies)?;
        Ok(())
    }
}
